use crate::app::AppContext;
use crate::ui::components::{InputResult, TextInput};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::AdminBoardView;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

/// Gate in front of the review console: a fixed credential check against
/// configuration. On success the login view is replaced by the board so
/// backing out of the board does not land on the login form again.
pub struct AdminLoginView {
  ctx: AppContext,
  username: TextInput,
  password: TextInput,
  on_password: bool,
  notice: Option<String>,
}

impl AdminLoginView {
  pub fn new(ctx: AppContext) -> Self {
    Self {
      ctx,
      username: TextInput::new(),
      password: TextInput::masked(),
      on_password: false,
      notice: None,
    }
  }

  fn attempt_login(&mut self) -> ViewAction {
    let admin = &self.ctx.config.admin;
    if self.username.value() == admin.username && self.password.value() == admin.password {
      tracing::info!(username = %admin.username, "admin login");
      return ViewAction::Replace(Box::new(AdminBoardView::new(self.ctx.clone())));
    }

    self.notice = Some("Sai tên đăng nhập hoặc mật khẩu.".to_string());
    self.password.clear();
    ViewAction::None
  }
}

impl View for AdminLoginView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Tab | KeyCode::BackTab | KeyCode::Down | KeyCode::Up => {
        self.on_password = !self.on_password;
        return ViewAction::None;
      }
      _ => {}
    }

    let input = if self.on_password {
      &mut self.password
    } else {
      &mut self.username
    };

    match input.handle_key(key) {
      InputResult::Submitted(_) => {
        if self.on_password {
          self.attempt_login()
        } else {
          self.on_password = true;
          ViewAction::None
        }
      }
      InputResult::Cancelled => ViewAction::Pop,
      InputResult::Consumed => ViewAction::None,
      InputResult::NotHandled => ViewAction::NotHandled,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(" Đăng nhập quản trị ")
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let field = |label: &str, value: String, focused: bool| {
      let marker = if focused { "> " } else { "  " };
      let mut spans = vec![
        Span::styled(marker.to_string(), Style::default().fg(Color::Cyan)),
        Span::styled(
          format!("{:<14}", label),
          if focused {
            Style::default().fg(Color::Cyan).bold()
          } else {
            Style::default().fg(Color::DarkGray)
          },
        ),
        Span::raw(value),
      ];
      if focused {
        spans.push(Span::styled("_", Style::default().fg(Color::Yellow)));
      }
      Line::from(spans)
    };

    let mut lines = vec![
      Line::raw(""),
      field("Tài khoản", self.username.display(), !self.on_password),
      field("Mật khẩu", self.password.display(), self.on_password),
      Line::raw(""),
      Line::from(Span::styled(
        "Tab chuyển ô   Enter đăng nhập   Esc quay lại",
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

    frame.render_widget(Paragraph::new(lines), inner);
  }

  fn breadcrumb_label(&self) -> String {
    "Đăng nhập".to_string()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![ShortcutInfo::new("Esc", "back").with_priority(30)]
  }
}
