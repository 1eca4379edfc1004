use crossterm::event::{self, Event as CrosstermEvent, KeyEvent};
use std::time::Duration;
use tokio::sync::mpsc;

/// Input to the application loop: a key press or the periodic tick that
/// drives async-op polling and the reconciliation loop.
#[derive(Debug)]
pub enum Event {
  Key(KeyEvent),
  Tick,
}

/// Terminal event pump.
///
/// A spawned task polls crossterm with the tick rate as the timeout, so a
/// quiet terminal still produces a steady stream of ticks. The task exits
/// when the receiver side is dropped.
pub struct EventHandler {
  rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
  pub fn new(tick_rate: Duration) -> Self {
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
      loop {
        let event = match read_terminal(tick_rate) {
          Some(event) => event,
          None => continue,
        };
        if tx.send(event).is_err() {
          break;
        }
      }
    });

    Self { rx }
  }

  /// Receive the next event.
  pub async fn next(&mut self) -> Option<Event> {
    self.rx.recv().await
  }
}

/// Wait up to `timeout` for terminal input; a timeout becomes a tick.
fn read_terminal(timeout: Duration) -> Option<Event> {
  if !event::poll(timeout).unwrap_or(false) {
    return Some(Event::Tick);
  }

  match event::read() {
    Ok(CrosstermEvent::Key(key)) => Some(Event::Key(key)),
    // A tick is enough for a resize; the next draw picks up the new size.
    Ok(CrosstermEvent::Resize(_, _)) => Some(Event::Tick),
    _ => None,
  }
}
