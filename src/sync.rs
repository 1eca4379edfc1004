//! The reconciliation loop keeping the cache eventually consistent with the
//! remote store.
//!
//! Every 120 seconds (configurable) a full snapshot is fetched and replaces
//! the cache wholesale. Writes are echoed into the cache optimistically as
//! soon as the store confirms them, so a submitter or admin sees their own
//! change without waiting for the next cycle.
//!
//! Accepted race: a refresh that was already in flight when an optimistic
//! write landed can replace the cache with a snapshot that predates the
//! write. No generation counters order completions; the last completion to
//! be observed wins, and the following cycle converges on remote state.

use crate::cache::SharedCache;
use crate::feedback::FeedbackRecord;
use crate::op::AsyncOp;
use crate::snapshot::SnapshotStore;
use crate::store::{StoreClient, StoreError};
use chrono::{DateTime, Local};
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Outcome of the most recently completed refresh cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
  /// The remote snapshot was applied to the cache.
  Applied { at: DateTime<Local> },
  /// The fetch failed; the cache was left untouched for this cycle.
  NoData { at: DateTime<Local> },
}

/// Periodic refresh driver and write-through point for optimistic updates.
///
/// Owned by the application and ticked from the UI event loop; dropping the
/// application tears the timer down with it. An in-flight fetch is never
/// cancelled, so a late completion still applies whenever it is observed.
pub struct Reconciler {
  store: StoreClient,
  cache: SharedCache,
  snapshot: Rc<dyn SnapshotStore>,
  interval: Duration,
  refresh: AsyncOp<Result<Vec<FeedbackRecord>, StoreError>>,
  cycle_started: Option<Instant>,
  last_outcome: Option<CycleOutcome>,
}

impl Reconciler {
  /// Build the reconciler, prime the cache from the local snapshot, and
  /// start the first refresh cycle.
  pub fn new(
    store: StoreClient,
    cache: SharedCache,
    snapshot: Rc<dyn SnapshotStore>,
    interval: Duration,
  ) -> Self {
    let mut reconciler = Self {
      store,
      cache,
      snapshot,
      interval,
      refresh: AsyncOp::idle(),
      cycle_started: None,
      last_outcome: None,
    };

    reconciler.prime_from_snapshot();
    reconciler.start_refresh();
    reconciler
  }

  /// Pre-fill the cache from local durability, for offline starts. A
  /// missing or unreadable snapshot just means starting empty.
  fn prime_from_snapshot(&mut self) {
    match self.snapshot.load() {
      Ok(Some(records)) => {
        tracing::info!(count = records.len(), "primed cache from local snapshot");
        self.cache.borrow_mut().replace_all(records);
      }
      Ok(None) => {}
      Err(e) => {
        tracing::warn!(error = %e, "failed to load local snapshot");
      }
    }
  }

  /// Whether the first refresh cycle is still pending; the UI shows a
  /// loading indicator for its duration.
  pub fn initial_load(&self) -> bool {
    self.last_outcome.is_none() && self.refresh.is_running()
  }

  pub fn is_refreshing(&self) -> bool {
    self.refresh.is_running()
  }

  pub fn last_outcome(&self) -> Option<CycleOutcome> {
    self.last_outcome
  }

  /// One line of sync state for the header.
  pub fn status_line(&self) -> String {
    if self.is_refreshing() {
      return "syncing...".to_string();
    }
    match self.last_outcome {
      Some(CycleOutcome::Applied { at }) => format!("synced {}", at.format("%H:%M")),
      Some(CycleOutcome::NoData { at }) => format!("no data at {}", at.format("%H:%M")),
      None => "idle".to_string(),
    }
  }

  /// Start an immediate refresh cycle, resetting the interval clock.
  ///
  /// A no-op while a cycle is already in flight.
  pub fn request_refresh(&mut self) {
    if self.refresh.is_running() {
      return;
    }
    self.start_refresh();
  }

  fn start_refresh(&mut self) {
    self.cycle_started = Some(Instant::now());
    let store = self.store.clone();
    self.refresh.start(async move { store.fetch_all().await });
  }

  /// Drive the loop: observe a completed fetch and apply it, then start the
  /// next cycle once the interval has elapsed. Called on every UI tick.
  ///
  /// Returns `true` if the cache changed.
  pub fn tick(&mut self) -> bool {
    let mut changed = false;

    if let Some(result) = self.refresh.poll() {
      match result {
        Ok(records) => {
          tracing::debug!(count = records.len(), "refresh cycle applied");
          self.cache.borrow_mut().replace_all(records);
          self.write_through();
          self.last_outcome = Some(CycleOutcome::Applied { at: Local::now() });
          changed = true;
        }
        Err(e) => {
          // Degrade silently: the cache keeps its last good state and the
          // next interval retries.
          tracing::warn!(error = %e, "refresh cycle failed, keeping cached records");
          self.last_outcome = Some(CycleOutcome::NoData { at: Local::now() });
        }
      }
    }

    if !self.refresh.is_running() && self.interval_elapsed() {
      self.start_refresh();
    }

    changed
  }

  /// Echo a store-confirmed write into the cache immediately.
  pub fn apply_optimistic(&mut self, record: FeedbackRecord) {
    self.cache.borrow_mut().upsert_optimistic(record);
    self.write_through();
  }

  fn write_through(&self) {
    let records = self.cache.borrow().snapshot();
    if let Err(e) = self.snapshot.store(&records) {
      tracing::warn!(error = %e, "failed to write local snapshot");
    }
  }

  fn interval_elapsed(&self) -> bool {
    match self.cycle_started {
      Some(started) => started.elapsed() >= self.interval,
      None => true,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::{FeedbackCache, StatusFilter};
  use crate::snapshot::{NoopSnapshot, SqliteSnapshot};
  use rusqlite::Connection;
  use url::Url;

  fn record(id: &str) -> FeedbackRecord {
    let mut r = FeedbackRecord::new_submission(
      "Nguyễn Văn A".to_string(),
      "0911222333".to_string(),
      "Khoa Nội".to_string(),
      "Phòng chờ quá đông".to_string(),
      Vec::new(),
    );
    r.id = id.to_string();
    r
  }

  fn unreachable_store() -> StoreClient {
    // Nothing listens here; fetches fail fast with a transport error.
    StoreClient::new(Url::parse("http://127.0.0.1:9/exec").unwrap())
  }

  async fn settle(reconciler: &mut Reconciler) {
    for _ in 0..100 {
      reconciler.tick();
      if reconciler.last_outcome().is_some() {
        return;
      }
      tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("refresh cycle never completed");
  }

  #[tokio::test]
  async fn test_failed_fetch_leaves_cache_unchanged() {
    let cache = FeedbackCache::shared();
    cache.borrow_mut().replace_all(vec![record("AAA111")]);

    let mut reconciler = Reconciler::new(
      unreachable_store(),
      cache.clone(),
      Rc::new(NoopSnapshot),
      Duration::from_secs(120),
    );
    assert!(reconciler.initial_load());

    settle(&mut reconciler).await;

    // The cycle failed but the cache kept its previous contents, the
    // failure is observable, and the loop is still alive.
    assert!(matches!(
      reconciler.last_outcome(),
      Some(CycleOutcome::NoData { .. })
    ));
    assert_eq!(cache.borrow().len(), 1);
    assert!(!reconciler.initial_load());
    reconciler.tick();
  }

  #[tokio::test]
  async fn test_optimistic_write_visible_synchronously() {
    let cache = FeedbackCache::shared();
    let mut reconciler = Reconciler::new(
      unreachable_store(),
      cache.clone(),
      Rc::new(NoopSnapshot),
      Duration::from_secs(120),
    );

    reconciler.apply_optimistic(record("NEW001"));

    // Visible to views before any network round trip completes.
    let view = cache.borrow().filtered(StatusFilter::All);
    assert_eq!(view.len(), 1);
    assert_eq!(view[0].id, "NEW001");
  }

  #[tokio::test]
  async fn test_optimistic_write_hits_snapshot() {
    let endpoint = Url::parse("http://127.0.0.1:9/exec").unwrap();
    let snapshot = Rc::new(
      SqliteSnapshot::with_connection(Connection::open_in_memory().unwrap(), &endpoint).unwrap(),
    );

    let cache = FeedbackCache::shared();
    let mut reconciler = Reconciler::new(
      StoreClient::new(endpoint),
      cache,
      snapshot.clone(),
      Duration::from_secs(120),
    );

    reconciler.apply_optimistic(record("NEW001"));

    let stored = snapshot.load().unwrap().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, "NEW001");
  }

  #[tokio::test]
  async fn test_request_refresh_noop_while_running() {
    let cache = FeedbackCache::shared();
    let mut reconciler = Reconciler::new(
      unreachable_store(),
      cache,
      Rc::new(NoopSnapshot),
      Duration::from_secs(120),
    );

    assert!(reconciler.is_refreshing());
    reconciler.request_refresh();
    assert!(reconciler.is_refreshing());

    settle(&mut reconciler).await;

    // After the cycle settles a manual refresh starts a new one.
    reconciler.request_refresh();
    assert!(reconciler.is_refreshing());
  }

  #[tokio::test]
  async fn test_primes_cache_from_snapshot() {
    let endpoint = Url::parse("http://127.0.0.1:9/exec").unwrap();
    let conn = Connection::open_in_memory().unwrap();
    let snapshot = SqliteSnapshot::with_connection(conn, &endpoint).unwrap();
    snapshot.store(&[record("OLD001")]).unwrap();

    let cache = FeedbackCache::shared();
    let _reconciler = Reconciler::new(
      StoreClient::new(endpoint),
      cache.clone(),
      Rc::new(snapshot),
      Duration::from_secs(120),
    );

    assert_eq!(cache.borrow().len(), 1);
    assert!(cache.borrow().get("OLD001").is_some());
  }
}
