use crate::app::AppContext;
use crate::feedback::FeedbackRecord;
use crate::ui::components::{InputResult, TextInput};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{status_color, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::RecordDetailView;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

/// Public lookup: find earlier submissions by contact number.
///
/// The result list is a pure derivation over the cache, recomputed on every
/// render, so a refresh or a just-submitted record shows up without any
/// extra plumbing. "Not yet searched" and "searched, no matches" are
/// distinct states.
pub struct LookupView {
  ctx: AppContext,
  input: TextInput,
  editing: bool,
  /// The submitted query; `None` until the first search.
  query: Option<String>,
  list_state: ListState,
}

impl LookupView {
  pub fn new(ctx: AppContext) -> Self {
    Self {
      ctx,
      input: TextInput::new(),
      editing: true,
      query: None,
      list_state: ListState::default(),
    }
  }

  fn results(&self) -> Option<Vec<FeedbackRecord>> {
    self
      .query
      .as_ref()
      .map(|q| self.ctx.cache.borrow().lookup(q))
  }

  fn render_results(&mut self, frame: &mut Frame, area: Rect) {
    let results = self.results();

    let title = match &results {
      None => " Tra cứu góp ý ".to_string(),
      Some(records) => format!(" Tra cứu góp ý ({}) ", records.len()),
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(2), // Input + hint
        Constraint::Min(1),    // Results
      ])
      .split(inner);

    // Search input line
    let cursor = if self.editing { "_" } else { "" };
    let input_line = Line::from(vec![
      Span::styled("Số điện thoại: ", Style::default().fg(Color::DarkGray)),
      Span::raw(self.input.value().to_string()),
      Span::styled(cursor, Style::default().fg(Color::Yellow)),
    ]);
    frame.render_widget(Paragraph::new(input_line), chunks[0]);

    match results {
      None => {
        let hint = Paragraph::new("Nhập số điện thoại đã dùng khi gửi góp ý, rồi nhấn Enter.")
          .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(hint, chunks[1]);
      }
      Some(records) if records.is_empty() => {
        let empty = Paragraph::new("Không tìm thấy góp ý nào cho số điện thoại này.")
          .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, chunks[1]);
      }
      Some(records) => {
        ensure_valid_selection(&mut self.list_state, records.len());

        let items: Vec<ListItem> = records
          .iter()
          .map(|record| {
            let line = Line::from(vec![
              Span::styled(
                format!("{:<8}", record.id),
                Style::default().fg(Color::Cyan),
              ),
              Span::raw(format!("{:<12}", record.submission_date)),
              Span::styled(
                format!("{:<14}", record.status.label()),
                Style::default().fg(status_color(record.status)),
              ),
              Span::raw(truncate(&record.content, 50)),
            ]);
            ListItem::new(line)
          })
          .collect();

        let list = List::new(items)
          .highlight_style(
            Style::default()
              .bg(Color::DarkGray)
              .add_modifier(Modifier::BOLD),
          )
          .highlight_symbol("> ");

        frame.render_stateful_widget(list, chunks[1], &mut self.list_state);
      }
    }
  }
}

impl View for LookupView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    if self.editing {
      match self.input.handle_key(key) {
        InputResult::Submitted(value) => {
          self.query = Some(value);
          self.editing = false;
          self.list_state = ListState::default();
        }
        InputResult::Cancelled => return ViewAction::Pop,
        InputResult::Consumed | InputResult::NotHandled => {}
      }
      return ViewAction::None;
    }

    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.list_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.list_state.select_previous(),
      KeyCode::Char('/') | KeyCode::Char('e') => {
        self.editing = true;
      }
      KeyCode::Enter => {
        if let (Some(idx), Some(records)) = (self.list_state.selected(), self.results()) {
          if let Some(record) = records.get(idx) {
            return ViewAction::Push(Box::new(RecordDetailView::public(
              self.ctx.clone(),
              record.id.clone(),
            )));
          }
        }
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => return ViewAction::NotHandled,
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    self.render_results(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    "Tra cứu".to_string()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("/", "edit number").with_priority(20),
      ShortcutInfo::new("q", "back").with_priority(30),
    ]
  }
}
