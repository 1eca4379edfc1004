use super::KeyResult;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState};

/// Events emitted by the list picker that the parent needs to handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListPickerEvent {
  /// An item was chosen (by index into the shown items)
  Selected(usize),
  /// Picker cancelled
  Cancelled,
}

/// Centered overlay picker over a list of labels.
///
/// Used for the department choice on the intake form and the status filter
/// on the admin board.
#[derive(Debug, Clone, Default)]
pub struct ListPicker {
  active: bool,
  items: Vec<String>,
  selected: usize,
  title: String,
}

impl ListPicker {
  pub fn new() -> Self {
    Self::default()
  }

  /// Check if picker is currently active
  pub fn is_active(&self) -> bool {
    self.active
  }

  /// Show the picker with the given items, preselecting `selected`
  pub fn show(&mut self, title: String, items: Vec<String>, selected: usize) {
    self.active = true;
    self.selected = selected.min(items.len().saturating_sub(1));
    self.items = items;
    self.title = title;
  }

  /// Hide the picker
  pub fn hide(&mut self) {
    self.active = false;
    self.items.clear();
    self.selected = 0;
  }

  /// Handle a key event
  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<ListPickerEvent> {
    if !self.active {
      return KeyResult::NotHandled;
    }

    match key.code {
      KeyCode::Esc | KeyCode::Char('q') => {
        self.hide();
        KeyResult::Event(ListPickerEvent::Cancelled)
      }
      KeyCode::Enter => {
        if self.items.get(self.selected).is_some() {
          let index = self.selected;
          self.hide();
          KeyResult::Event(ListPickerEvent::Selected(index))
        } else {
          self.hide();
          KeyResult::Event(ListPickerEvent::Cancelled)
        }
      }
      KeyCode::Char('j') | KeyCode::Down => {
        if !self.items.is_empty() {
          self.selected = (self.selected + 1) % self.items.len();
        }
        KeyResult::Handled
      }
      KeyCode::Char('k') | KeyCode::Up => {
        if !self.items.is_empty() {
          self.selected = if self.selected == 0 {
            self.items.len() - 1
          } else {
            self.selected - 1
          };
        }
        KeyResult::Handled
      }
      _ => KeyResult::Handled,
    }
  }

  /// Render the picker overlay if active
  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active || self.items.is_empty() {
      return;
    }

    // Calculate overlay dimensions
    let max_item_len = self.items.iter().map(|s| s.chars().count()).max().unwrap_or(10);
    let width = (max_item_len as u16 + 6).min(area.width.saturating_sub(4)).max(24);
    let height = (self.items.len() as u16 + 2)
      .min(area.height.saturating_sub(4))
      .max(3);

    // Center the overlay
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;

    let overlay_area = Rect::new(x, y, width, height);

    // Clear the area behind the overlay
    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(format!(" {} ", self.title));

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    if inner.height == 0 {
      return;
    }

    let items: Vec<ListItem> = self
      .items
      .iter()
      .map(|item| {
        let line = Line::from(vec![Span::styled(
          item.clone(),
          Style::default().fg(Color::Cyan),
        )]);
        ListItem::new(line)
      })
      .collect();

    let list =
      List::new(items).highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White));

    let mut state = ListState::default();
    state.select(Some(self.selected));

    frame.render_stateful_widget(list, inner, &mut state);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crossterm::event::KeyModifiers;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn picker_with(items: &[&str]) -> ListPicker {
    let mut picker = ListPicker::new();
    picker.show(
      "Department".to_string(),
      items.iter().map(|s| s.to_string()).collect(),
      0,
    );
    picker
  }

  #[test]
  fn test_inactive_passes_keys_through() {
    let mut picker = ListPicker::new();
    assert_eq!(picker.handle_key(key(KeyCode::Enter)), KeyResult::NotHandled);
  }

  #[test]
  fn test_select_second_item() {
    let mut picker = picker_with(&["Khoa Nội", "Khoa Ngoại"]);
    picker.handle_key(key(KeyCode::Down));
    let result = picker.handle_key(key(KeyCode::Enter));
    assert_eq!(result, KeyResult::Event(ListPickerEvent::Selected(1)));
    assert!(!picker.is_active());
  }

  #[test]
  fn test_navigation_wraps() {
    let mut picker = picker_with(&["a", "b"]);
    picker.handle_key(key(KeyCode::Up));
    let result = picker.handle_key(key(KeyCode::Enter));
    assert_eq!(result, KeyResult::Event(ListPickerEvent::Selected(1)));
  }

  #[test]
  fn test_escape_cancels() {
    let mut picker = picker_with(&["a"]);
    let result = picker.handle_key(key(KeyCode::Esc));
    assert_eq!(result, KeyResult::Event(ListPickerEvent::Cancelled));
    assert!(!picker.is_active());
  }

  #[test]
  fn test_show_preselects() {
    let mut picker = ListPicker::new();
    picker.show(
      "Filter".to_string(),
      vec!["All".to_string(), "Pending".to_string()],
      1,
    );
    let result = picker.handle_key(key(KeyCode::Enter));
    assert_eq!(result, KeyResult::Event(ListPickerEvent::Selected(1)));
  }
}
