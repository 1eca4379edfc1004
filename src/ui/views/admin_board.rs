use crate::app::AppContext;
use crate::cache::StatusFilter;
use crate::feedback::FeedbackRecord;
use crate::ui::components::{KeyResult, ListPicker, ListPickerEvent};
use crate::ui::ensure_valid_selection;
use crate::ui::renderfns::{status_color, truncate};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::RecordDetailView;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

/// Admin board: the filtered record list backing the review console.
///
/// The list is recomputed from the cache on every render; the reconciliation
/// loop keeps the cache moving underneath it and `r` forces a cycle.
pub struct AdminBoardView {
  ctx: AppContext,
  filter: StatusFilter,
  list_state: ListState,
  picker: ListPicker,
}

impl AdminBoardView {
  pub fn new(ctx: AppContext) -> Self {
    Self {
      ctx,
      filter: StatusFilter::All,
      list_state: ListState::default(),
      picker: ListPicker::new(),
    }
  }

  fn records(&self) -> Vec<FeedbackRecord> {
    self.ctx.cache.borrow().filtered(self.filter)
  }

  fn open_filter_picker(&mut self) {
    let options = StatusFilter::options();
    let selected = options.iter().position(|f| *f == self.filter).unwrap_or(0);
    self.picker.show(
      "Lọc theo trạng thái".to_string(),
      options.iter().map(|f| f.label().to_string()).collect(),
      selected,
    );
  }

  fn render_list(&mut self, frame: &mut Frame, area: Rect) {
    let records = self.records();
    ensure_valid_selection(&mut self.list_state, records.len());

    let sync = self.ctx.sync.borrow();
    let title = if sync.initial_load() {
      format!(" Phản ánh [{}] (loading...) ", self.filter.label())
    } else {
      format!(" Phản ánh [{}] ({}) ", self.filter.label(), records.len())
    };
    let initial_load = sync.initial_load();
    drop(sync);

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if records.is_empty() {
      let content = if initial_load {
        "Đang tải dữ liệu từ kho lưu trữ..."
      } else {
        "Không có phản ánh nào cho bộ lọc này."
      };
      let paragraph = Paragraph::new(content)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

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
            format!("{:<14}", truncate(record.status.label(), 14)),
            Style::default().fg(status_color(record.status)),
          ),
          Span::raw(format!("{:<24}", truncate(&record.department, 22))),
          Span::raw(truncate(&record.content, 40)),
        ]);
        ListItem::new(line)
      })
      .collect();

    let list = List::new(items)
      .block(block)
      .highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut self.list_state);
  }
}

impl View for AdminBoardView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match self.picker.handle_key(key) {
      KeyResult::Event(ListPickerEvent::Selected(index)) => {
        if let Some(filter) = StatusFilter::options().get(index) {
          self.filter = *filter;
          self.list_state = ListState::default();
        }
        return ViewAction::None;
      }
      KeyResult::Event(ListPickerEvent::Cancelled) | KeyResult::Handled => {
        return ViewAction::None;
      }
      KeyResult::NotHandled => {}
    }

    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.list_state.select_next(),
      KeyCode::Char('k') | KeyCode::Up => self.list_state.select_previous(),
      KeyCode::Char('f') => self.open_filter_picker(),
      KeyCode::Char('r') => self.ctx.sync.borrow_mut().request_refresh(),
      KeyCode::Enter => {
        if let Some(idx) = self.list_state.selected() {
          if let Some(record) = self.records().get(idx) {
            return ViewAction::Push(Box::new(RecordDetailView::admin(
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
    self.render_list(frame, area);
    self.picker.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    format!("Quản trị [{}]", self.filter.label())
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("f", "filter").with_priority(20),
      ShortcutInfo::new("r", "refresh").with_priority(25),
      ShortcutInfo::new("q", "back").with_priority(30),
    ]
  }
}
