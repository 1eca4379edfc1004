use crate::cache::{FeedbackCache, SharedCache};
use crate::config::Config;
use crate::event::{Event, EventHandler};
use crate::snapshot::{NoopSnapshot, SnapshotStore, SqliteSnapshot};
use crate::store::StoreClient;
use crate::suggest::ReplySuggester;
use crate::sync::Reconciler;
use crate::ui::components::{CommandEvent, CommandInput, KeyResult};
use crate::ui::renderfns::{draw_footer, draw_header};
use crate::ui::view::{View, ViewAction};
use crate::ui::views::{AdminLoginView, LookupView, SubmitView};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::cell::RefCell;
use std::io::stdout;
use std::rc::Rc;
use std::time::Duration;

const DEFAULT_TITLE: &str = "Bệnh viện Đa khoa Ninh Thuận";

/// Everything a view needs, injected at construction.
///
/// The cache and the reconciler are explicitly owned here and shared by
/// handle; nothing in the application reaches for ambient globals.
#[derive(Clone)]
pub struct AppContext {
  pub config: Rc<Config>,
  pub cache: SharedCache,
  pub sync: Rc<RefCell<Reconciler>>,
  pub store: StoreClient,
  pub suggester: ReplySuggester,
}

/// Main application state
pub struct App {
  ctx: AppContext,
  /// Navigation stack - root is always at index 0
  view_stack: Vec<Box<dyn View>>,
  /// Global `:` command palette
  command: CommandInput,
  /// Whether to quit
  should_quit: bool,
}

impl App {
  pub fn new(config: Config, start_admin: bool) -> Result<Self> {
    let endpoint = config.store_url()?;
    let store = StoreClient::new(endpoint.clone());
    let cache = FeedbackCache::shared();

    let snapshot: Rc<dyn SnapshotStore> = if config.store.snapshot {
      Rc::new(SqliteSnapshot::open(&endpoint)?)
    } else {
      Rc::new(NoopSnapshot)
    };

    let sync = Rc::new(RefCell::new(Reconciler::new(
      store.clone(),
      cache.clone(),
      snapshot,
      Duration::from_secs(config.store.refresh_interval_secs),
    )));

    let suggester = ReplySuggester::new(config.suggestion.model.clone());

    let ctx = AppContext {
      config: Rc::new(config),
      cache,
      sync,
      store,
      suggester,
    };

    let root: Box<dyn View> = if start_admin {
      Box::new(AdminLoginView::new(ctx.clone()))
    } else {
      Box::new(SubmitView::new(ctx.clone()))
    };

    Ok(Self {
      ctx,
      view_stack: vec![root],
      command: CommandInput::new(),
      should_quit: false,
    })
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    // Create event handler
    let mut events = EventHandler::new(Duration::from_millis(250));

    // Main loop
    while !self.should_quit {
      // Draw UI
      terminal.draw(|frame| self.draw(frame))?;

      // Handle events
      if let Some(event) = events.next().await {
        match event {
          Event::Key(key) => self.handle_key(key),
          Event::Tick => self.tick(),
        }
      }
    }

    // Cleanup terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
  }

  fn tick(&mut self) {
    // Drive the reconciliation loop, then let the current view observe its
    // own in-flight operations.
    self.ctx.sync.borrow_mut().tick();
    if let Some(view) = self.view_stack.last_mut() {
      view.tick();
    }
  }

  fn handle_key(&mut self, key: crossterm::event::KeyEvent) {
    // Ctrl-C always quits
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    // The command palette, while open, owns the keyboard.
    if self.command.is_active() {
      if let KeyResult::Event(CommandEvent::Submitted(cmd)) = self.command.handle_key(key) {
        self.execute_command(&cmd);
      }
      return;
    }

    let action = match self.view_stack.last_mut() {
      Some(view) => view.handle_key(key),
      None => ViewAction::NotHandled,
    };

    match action {
      ViewAction::None => {}
      ViewAction::Push(view) => self.view_stack.push(view),
      ViewAction::Replace(view) => {
        if let Some(top) = self.view_stack.last_mut() {
          *top = view;
        }
      }
      ViewAction::Pop => {
        if self.view_stack.len() > 1 {
          self.view_stack.pop();
        } else {
          self.should_quit = true;
        }
      }
      ViewAction::NotHandled => {
        // Global fallbacks for keys no view claimed.
        if key.code == KeyCode::Char(':') {
          self.command.activate();
        }
      }
    }
  }

  fn execute_command(&mut self, cmd: &str) {
    match cmd {
      "submit" => self.reset_root(Box::new(SubmitView::new(self.ctx.clone()))),
      "lookup" => self.reset_root(Box::new(LookupView::new(self.ctx.clone()))),
      "admin" => self.reset_root(Box::new(AdminLoginView::new(self.ctx.clone()))),
      "refresh" => self.ctx.sync.borrow_mut().request_refresh(),
      "quit" => self.should_quit = true,
      _ => {
        // Unknown command
      }
    }
  }

  fn reset_root(&mut self, view: Box<dyn View>) {
    self.view_stack.clear();
    self.view_stack.push(view);
  }

  fn draw(&mut self, frame: &mut Frame) {
    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(1), // Header
        Constraint::Min(1),    // Main content
        Constraint::Length(1), // Footer
      ])
      .split(frame.area());

    let title = self
      .ctx
      .config
      .title
      .clone()
      .unwrap_or_else(|| DEFAULT_TITLE.to_string());
    let sync_status = self.ctx.sync.borrow().status_line();
    let shortcuts = self
      .view_stack
      .last()
      .map(|v| v.shortcuts())
      .unwrap_or_default();

    draw_header(
      frame,
      chunks[0],
      &title,
      &self.ctx.config.store.url,
      &sync_status,
      &shortcuts,
    );

    if let Some(view) = self.view_stack.last_mut() {
      view.render(frame, chunks[1]);
    }

    // The palette overlays the content area.
    self.command.render_overlay(frame, chunks[1]);

    let breadcrumb: Vec<String> = self
      .view_stack
      .iter()
      .map(|v| v.breadcrumb_label())
      .collect();
    draw_footer(frame, chunks[2], &breadcrumb);
  }
}
