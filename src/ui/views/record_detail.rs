use crate::app::AppContext;
use crate::feedback::FeedbackRecord;
use crate::op::AsyncOp;
use crate::ui::components::{InputResult, TextInput};
use crate::ui::renderfns::{format_local, status_color};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

/// One record, opened from the board (admin) or from a lookup (read-only).
///
/// The record itself is read from the cache on every render, so a reply
/// applied here (or arriving via refresh) shows up without re-opening the
/// view. The admin composer sends the reply through the store first and only
/// echoes it into the cache once the store confirmed it; a failed update
/// leaves the displayed record untouched.
pub struct RecordDetailView {
  ctx: AppContext,
  record_id: String,
  admin: bool,
  reply: TextInput,
  composing: bool,
  suggest_op: AsyncOp<String>,
  update_op: AsyncOp<(FeedbackRecord, bool)>,
  notice: Option<String>,
}

impl RecordDetailView {
  pub fn admin(ctx: AppContext, record_id: String) -> Self {
    Self::new(ctx, record_id, true)
  }

  pub fn public(ctx: AppContext, record_id: String) -> Self {
    Self::new(ctx, record_id, false)
  }

  fn new(ctx: AppContext, record_id: String, admin: bool) -> Self {
    Self {
      ctx,
      record_id,
      admin,
      reply: TextInput::new(),
      composing: false,
      suggest_op: AsyncOp::idle(),
      update_op: AsyncOp::idle(),
      notice: None,
    }
  }

  fn record(&self) -> Option<FeedbackRecord> {
    self.ctx.cache.borrow().get(&self.record_id)
  }

  fn start_suggestion(&mut self, record: &FeedbackRecord) {
    if self.suggest_op.is_running() {
      return;
    }
    let suggester = self.ctx.suggester.clone();
    let content = record.content.clone();
    let department = record.department.clone();
    self
      .suggest_op
      .start(async move { suggester.suggest(&content, &department).await });
  }

  fn send_reply(&mut self, record: FeedbackRecord) {
    if self.update_op.is_running() {
      return;
    }

    let text = self.reply.value().trim().to_string();
    if text.is_empty() {
      self.notice = Some("Nội dung phản hồi đang trống.".to_string());
      return;
    }

    self.notice = None;
    let updated = record.with_reply(text);
    let store = self.ctx.store.clone();
    self.update_op.start(async move {
      let ok = store.update(&updated).await;
      (updated, ok)
    });
  }

  fn handle_admin_key(&mut self, key: KeyEvent, record: FeedbackRecord) -> ViewAction {
    if self.composing {
      match self.reply.handle_key(key) {
        InputResult::Submitted(_) => self.send_reply(record),
        InputResult::Cancelled => self.composing = false,
        InputResult::Consumed | InputResult::NotHandled => {}
      }
      return ViewAction::None;
    }

    match key.code {
      KeyCode::Char('i') | KeyCode::Enter if !record.has_reply() => {
        self.composing = true;
      }
      KeyCode::Char('s') if !record.has_reply() => {
        self.start_suggestion(&record);
      }
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => return ViewAction::NotHandled,
    }
    ViewAction::None
  }

  fn render_detail(&self, frame: &mut Frame, area: Rect, record: &FeedbackRecord) {
    let title = if self.update_op.is_running() {
      format!(" {} (đang gửi phản hồi...) ", record.id)
    } else {
      format!(" {} ", record.id)
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let label = |text: &str| Span::styled(format!("{:<16}", text), Style::default().fg(Color::DarkGray));

    let mut lines = vec![
      Line::from(vec![label("Họ và tên"), Span::raw(record.submitter_name.clone())]),
      Line::from(vec![label("Số điện thoại"), Span::raw(record.contact_number.clone())]),
      Line::from(vec![label("Khoa"), Span::raw(record.department.clone())]),
      Line::from(vec![
        label("Thời gian"),
        Span::raw(format!(
          "{} {}",
          record.submission_date, record.submission_time
        )),
      ]),
      Line::from(vec![
        label("Trạng thái"),
        Span::styled(
          record.status.label().to_string(),
          Style::default().fg(status_color(record.status)),
        ),
      ]),
      Line::from(vec![
        label("Đính kèm"),
        Span::raw(format!("{} ảnh", record.attachments.len())),
      ]),
      Line::raw(""),
      Line::from(Span::styled("Nội dung:", Style::default().fg(Color::DarkGray))),
      Line::raw(record.content.clone()),
      Line::raw(""),
    ];

    match (&record.admin_reply, record.replied_at) {
      (Some(reply), replied_at) => {
        lines.push(Line::from(Span::styled(
          "Phản hồi của bệnh viện:",
          Style::default().fg(Color::Green),
        )));
        lines.push(Line::raw(reply.clone()));
        if let Some(at) = replied_at {
          lines.push(Line::from(Span::styled(
            format!("({})", format_local(at)),
            Style::default().fg(Color::DarkGray),
          )));
        }
      }
      (None, _) if self.admin => {
        lines.push(Line::from(Span::styled(
          "Phản hồi:",
          Style::default().fg(Color::Yellow),
        )));
        let cursor = if self.composing { "_" } else { "" };
        lines.push(Line::from(vec![
          Span::raw(self.reply.value().to_string()),
          Span::styled(cursor, Style::default().fg(Color::Yellow)),
        ]));
        lines.push(Line::raw(""));
        let hint = if self.composing {
          "Enter gửi   Esc dừng soạn"
        } else {
          "i soạn phản hồi   s gợi ý AI"
        };
        lines.push(Line::from(Span::styled(
          hint,
          Style::default().fg(Color::DarkGray),
        )));
        if self.suggest_op.is_running() {
          lines.push(Line::from(Span::styled(
            "Đang lấy gợi ý...",
            Style::default().fg(Color::Yellow),
          )));
        }
      }
      (None, _) => {
        lines.push(Line::from(Span::styled(
          "Góp ý đang được xử lý. Vui lòng quay lại sau.",
          Style::default().fg(Color::Yellow),
        )));
      }
    }

    if let Some(notice) = &self.notice {
      lines.push(Line::raw(""));
      lines.push(Line::from(Span::styled(
        notice.clone(),
        Style::default().fg(Color::Red),
      )));
    }

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
  }
}

impl View for RecordDetailView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    let record = match self.record() {
      Some(record) => record,
      None => {
        // Record fell out of the cache (dropped by a refresh); only
        // backing out makes sense.
        return match key.code {
          KeyCode::Char('q') | KeyCode::Esc => ViewAction::Pop,
          _ => ViewAction::NotHandled,
        };
      }
    };

    if self.update_op.is_running() {
      return ViewAction::None;
    }

    if self.admin {
      self.handle_admin_key(key, record)
    } else {
      match key.code {
        KeyCode::Char('q') | KeyCode::Esc => ViewAction::Pop,
        _ => ViewAction::NotHandled,
      }
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    match self.record() {
      Some(record) => self.render_detail(frame, area, &record),
      None => {
        let block = Block::default()
          .title(format!(" {} ", self.record_id))
          .title_alignment(Alignment::Center)
          .borders(Borders::ALL)
          .border_style(Style::default().fg(Color::Blue));
        let paragraph = Paragraph::new("Phản ánh này không còn trong danh sách.")
          .block(block)
          .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(paragraph, area);
      }
    }
  }

  fn breadcrumb_label(&self) -> String {
    self.record_id.clone()
  }

  fn tick(&mut self) {
    if let Some(text) = self.suggest_op.poll() {
      // The suggestion fills the editor; it still goes through the admin
      // before anything is sent.
      self.reply.set_value(text);
      self.composing = true;
    }

    if let Some((updated, ok)) = self.update_op.poll() {
      if ok {
        self.ctx.sync.borrow_mut().apply_optimistic(updated);
        self.composing = false;
        self.reply.clear();
        self.notice = None;
      } else {
        self.notice = Some("Gửi phản hồi thất bại. Vui lòng thử lại.".to_string());
      }
    }
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    if self.admin {
      vec![
        ShortcutInfo::new("i", "reply").with_priority(10),
        ShortcutInfo::new("s", "suggest").with_priority(20),
        ShortcutInfo::new("q", "back").with_priority(30),
      ]
    } else {
      vec![ShortcutInfo::new("q", "back").with_priority(30)]
    }
  }
}
