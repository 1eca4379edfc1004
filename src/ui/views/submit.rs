use crate::app::AppContext;
use crate::feedback::{attachments, FeedbackRecord};
use crate::op::AsyncOp;
use crate::ui::components::{InputResult, KeyResult, ListPicker, ListPickerEvent, TextInput};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

/// Fields of the intake form, in focus order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
  Name,
  Contact,
  Department,
  Content,
  Attachment1,
  Attachment2,
}

const FIELD_ORDER: [Field; 6] = [
  Field::Name,
  Field::Contact,
  Field::Department,
  Field::Content,
  Field::Attachment1,
  Field::Attachment2,
];

/// Public intake form: capture a feedback record and submit it to the store.
///
/// Browse mode moves between fields; Enter edits the focused field (or opens
/// the department picker). On a confirmed submit the record is echoed into
/// the cache optimistically, so the success screen and any later lookup see
/// it immediately.
pub struct SubmitView {
  ctx: AppContext,
  name: TextInput,
  contact: TextInput,
  content: TextInput,
  attachment1: TextInput,
  attachment2: TextInput,
  department: Option<usize>,
  focus: Field,
  editing: bool,
  picker: ListPicker,
  submit_op: AsyncOp<(FeedbackRecord, bool)>,
  notice: Option<String>,
  submitted: Option<FeedbackRecord>,
}

impl SubmitView {
  pub fn new(ctx: AppContext) -> Self {
    Self {
      ctx,
      name: TextInput::new(),
      contact: TextInput::new(),
      content: TextInput::new(),
      attachment1: TextInput::new(),
      attachment2: TextInput::new(),
      department: None,
      focus: Field::Name,
      editing: false,
      picker: ListPicker::new(),
      submit_op: AsyncOp::idle(),
      notice: None,
      submitted: None,
    }
  }

  fn reset_form(&mut self) {
    self.name.clear();
    self.contact.clear();
    self.content.clear();
    self.attachment1.clear();
    self.attachment2.clear();
    self.department = None;
    self.focus = Field::Name;
    self.editing = false;
    self.notice = None;
    self.submitted = None;
  }

  fn field_input(&mut self, field: Field) -> Option<&mut TextInput> {
    match field {
      Field::Name => Some(&mut self.name),
      Field::Contact => Some(&mut self.contact),
      Field::Content => Some(&mut self.content),
      Field::Attachment1 => Some(&mut self.attachment1),
      Field::Attachment2 => Some(&mut self.attachment2),
      Field::Department => None,
    }
  }

  fn move_focus(&mut self, delta: i32) {
    let current = FIELD_ORDER.iter().position(|f| *f == self.focus).unwrap_or(0);
    let len = FIELD_ORDER.len() as i32;
    let next = (current as i32 + delta).rem_euclid(len) as usize;
    self.focus = FIELD_ORDER[next];
  }

  fn department_name(&self) -> Option<&str> {
    self
      .department
      .and_then(|i| self.ctx.config.departments.get(i))
      .map(|s| s.as_str())
  }

  fn open_department_picker(&mut self) {
    self.picker.show(
      "Chọn khoa".to_string(),
      self.ctx.config.departments.clone(),
      self.department.unwrap_or(0),
    );
  }

  fn attachment_paths(&self) -> Vec<String> {
    [&self.attachment1, &self.attachment2]
      .iter()
      .map(|i| i.value().trim().to_string())
      .filter(|v| !v.is_empty())
      .collect()
  }

  fn try_submit(&mut self) {
    if self.submit_op.is_running() {
      return;
    }

    let name = self.name.value().trim().to_string();
    let contact = self.contact.value().trim().to_string();
    let content = self.content.value().trim().to_string();
    let department = match self.department_name() {
      Some(d) => d.to_string(),
      None => {
        self.notice = Some("Vui lòng chọn khoa.".to_string());
        return;
      }
    };

    if name.is_empty() || contact.is_empty() || content.is_empty() {
      self.notice = Some("Vui lòng điền họ tên, số điện thoại và nội dung.".to_string());
      return;
    }

    let encoded = match attachments::encode_all(&self.attachment_paths()) {
      Ok(encoded) => encoded,
      Err(e) => {
        self.notice = Some(format!("Không đọc được ảnh đính kèm: {}", e));
        return;
      }
    };

    let record = FeedbackRecord::new_submission(name, contact, department, content, encoded);

    self.notice = None;
    let store = self.ctx.store.clone();
    self.submit_op.start(async move {
      let ok = store.create(&record).await;
      (record, ok)
    });
  }

  fn handle_browse_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down | KeyCode::Tab => self.move_focus(1),
      KeyCode::Char('k') | KeyCode::Up | KeyCode::BackTab => self.move_focus(-1),
      KeyCode::Enter | KeyCode::Char('i') => {
        if self.focus == Field::Department {
          self.open_department_picker();
        } else {
          self.editing = true;
        }
      }
      KeyCode::Char('s') => self.try_submit(),
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Pop,
      _ => return ViewAction::NotHandled,
    }
    ViewAction::None
  }

  fn handle_edit_key(&mut self, key: KeyEvent) -> ViewAction {
    let field = self.focus;
    if let Some(input) = self.field_input(field) {
      match input.handle_key(key) {
        InputResult::Submitted(_) => {
          // Commit the field and step to the next one.
          self.editing = false;
          self.move_focus(1);
        }
        InputResult::Cancelled => self.editing = false,
        InputResult::Consumed | InputResult::NotHandled => {}
      }
    } else {
      self.editing = false;
    }
    ViewAction::None
  }

  fn render_form(&mut self, frame: &mut Frame, area: Rect) {
    let title = if self.submit_op.is_running() {
      " Gửi góp ý (đang gửi...) "
    } else {
      " Gửi góp ý "
    };

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines = vec![
      self.field_line("Họ và tên", Field::Name, self.name.display()),
      self.field_line("Số điện thoại", Field::Contact, self.contact.display()),
      self.field_line(
        "Khoa",
        Field::Department,
        self
          .department_name()
          .map(str::to_string)
          .unwrap_or_else(|| "(chọn khoa)".to_string()),
      ),
      self.field_line("Nội dung", Field::Content, self.content.display()),
      self.field_line("Ảnh 1 (đường dẫn)", Field::Attachment1, self.attachment1.display()),
      self.field_line("Ảnh 2 (đường dẫn)", Field::Attachment2, self.attachment2.display()),
      Line::raw(""),
      Line::from(Span::styled(
        "j/k di chuyển   Enter sửa   s gửi",
        Style::default().fg(Color::DarkGray),
      )),
    ];

    if let Some(notice) = &self.notice {
      lines.push(Line::raw(""));
      lines.push(Line::from(Span::styled(
        notice.clone(),
        Style::default().fg(Color::Red),
      )));
    }

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, inner);
  }

  fn field_line(&self, label: &str, field: Field, value: String) -> Line<'static> {
    let focused = self.focus == field;
    let marker = if focused { "> " } else { "  " };
    let label_style = if focused {
      Style::default().fg(Color::Cyan).bold()
    } else {
      Style::default().fg(Color::DarkGray)
    };

    let mut spans = vec![
      Span::styled(marker.to_string(), Style::default().fg(Color::Cyan)),
      Span::styled(format!("{:<20}", label), label_style),
      Span::raw(value),
    ];
    if focused && self.editing {
      spans.push(Span::styled("_", Style::default().fg(Color::Yellow)));
    }

    Line::from(spans)
  }

  fn render_success(&self, frame: &mut Frame, area: Rect, record: &FeedbackRecord) {
    let block = Block::default()
      .title(" Đã gửi góp ý ")
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Green));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines = vec![
      Line::raw(""),
      Line::from(Span::styled(
        "Cảm ơn quý khách. Góp ý đã được ghi nhận.",
        Style::default().fg(Color::Green),
      )),
      Line::raw(""),
      Line::from(vec![
        Span::styled("Mã tra cứu: ", Style::default().fg(Color::DarkGray)),
        Span::styled(record.id.clone(), Style::default().fg(Color::Cyan).bold()),
      ]),
      Line::from(vec![
        Span::styled("Số điện thoại: ", Style::default().fg(Color::DarkGray)),
        Span::raw(record.contact_number.clone()),
      ]),
      Line::raw(""),
      Line::from(Span::styled(
        "n gửi góp ý khác   q quay lại",
        Style::default().fg(Color::DarkGray),
      )),
    ];

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
  }
}

impl View for SubmitView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    // Department picker gets the keys while open.
    match self.picker.handle_key(key) {
      KeyResult::Event(ListPickerEvent::Selected(index)) => {
        self.department = Some(index);
        return ViewAction::None;
      }
      KeyResult::Event(ListPickerEvent::Cancelled) | KeyResult::Handled => {
        return ViewAction::None;
      }
      KeyResult::NotHandled => {}
    }

    if self.submitted.is_some() {
      return match key.code {
        KeyCode::Char('n') => {
          self.reset_form();
          ViewAction::None
        }
        KeyCode::Char('q') | KeyCode::Esc => ViewAction::Pop,
        _ => ViewAction::NotHandled,
      };
    }

    if self.submit_op.is_running() {
      // The form is frozen while the store call is in flight.
      return ViewAction::None;
    }

    if self.editing {
      self.handle_edit_key(key)
    } else {
      self.handle_browse_key(key)
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    if let Some(record) = self.submitted.clone() {
      self.render_success(frame, area, &record);
    } else {
      self.render_form(frame, area);
    }
    self.picker.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    "Gửi góp ý".to_string()
  }

  fn tick(&mut self) {
    if let Some((record, ok)) = self.submit_op.poll() {
      if ok {
        // Visible to every view right away; the next refresh cycle
        // confirms it from the remote side.
        self.ctx.sync.borrow_mut().apply_optimistic(record.clone());
        self.submitted = Some(record);
        self.notice = None;
      } else {
        self.notice = Some("Gửi góp ý thất bại. Vui lòng thử lại.".to_string());
      }
    }
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new(":", "command").with_priority(10),
      ShortcutInfo::new("s", "send").with_priority(20),
      ShortcutInfo::new("q", "back").with_priority(30),
    ]
  }
}
