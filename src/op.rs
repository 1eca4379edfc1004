//! One-shot async operations observed by cooperative polling.
//!
//! Network calls are the only suspension points in this application. Each
//! one runs as a spawned task that delivers its result through an unbounded
//! channel, and the owning view or loop observes the completion by calling
//! `poll()` from the UI tick. Starting a new operation while one is in
//! flight drops the old receiver, so a stale completion is discarded rather
//! than observed out of order.

use std::future::Future;
use tokio::sync::mpsc;

/// A single in-flight async operation producing a `T`.
///
/// Unlike a cached query this is strictly one-shot: the result is handed out
/// exactly once by `poll()` and the op returns to idle.
#[derive(Debug)]
pub struct AsyncOp<T> {
  receiver: Option<mpsc::UnboundedReceiver<T>>,
}

impl<T> Default for AsyncOp<T> {
  fn default() -> Self {
    Self { receiver: None }
  }
}

impl<T: Send + 'static> AsyncOp<T> {
  pub fn idle() -> Self {
    Self::default()
  }

  /// Whether an operation is currently in flight.
  pub fn is_running(&self) -> bool {
    self.receiver.is_some()
  }

  /// Spawn `future` and start observing it.
  ///
  /// Any previously running operation is abandoned: its task keeps running
  /// (in-flight calls are never cancelled) but its completion will never be
  /// observed.
  pub fn start<Fut>(&mut self, future: Fut)
  where
    Fut: Future<Output = T> + Send + 'static,
  {
    let (tx, rx) = mpsc::unbounded_channel();
    self.receiver = Some(rx);

    tokio::spawn(async move {
      let result = future.await;
      // Receiver dropped means nobody is listening anymore.
      let _ = tx.send(result);
    });
  }

  /// Observe a completion, if one has arrived.
  ///
  /// Returns the result exactly once; afterwards the op is idle again.
  pub fn poll(&mut self) -> Option<T> {
    let receiver = self.receiver.as_mut()?;

    match receiver.try_recv() {
      Ok(result) => {
        self.receiver = None;
        Some(result)
      }
      Err(mpsc::error::TryRecvError::Empty) => None,
      Err(mpsc::error::TryRecvError::Disconnected) => {
        // Task panicked or was torn down without sending.
        self.receiver = None;
        None
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::time::Duration;

  #[tokio::test]
  async fn test_poll_delivers_result_once() {
    let mut op = AsyncOp::idle();
    assert!(!op.is_running());

    op.start(async { 42 });
    assert!(op.is_running());

    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(op.poll(), Some(42));
    assert!(!op.is_running());
    assert_eq!(op.poll(), None);
  }

  #[tokio::test]
  async fn test_poll_before_completion_is_none() {
    let mut op = AsyncOp::idle();
    op.start(async {
      tokio::time::sleep(Duration::from_millis(100)).await;
      1
    });

    assert_eq!(op.poll(), None);
    assert!(op.is_running());
  }

  #[tokio::test]
  async fn test_restart_discards_stale_completion() {
    let mut op = AsyncOp::idle();
    op.start(async {
      tokio::time::sleep(Duration::from_millis(20)).await;
      1
    });

    // Replace before the first completes; its result must never surface.
    op.start(async {
      tokio::time::sleep(Duration::from_millis(40)).await;
      2
    });

    tokio::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(op.poll(), Some(2));
    assert_eq!(op.poll(), None);
  }
}
