//! Optional local durability for the record cache.
//!
//! The cache itself is purely in-memory; this module persists the last known
//! record list to SQLite so a restart (or an offline start) can pre-fill the
//! cache before the first refresh lands. Rows are scoped by a SHA-256 hash
//! of the endpoint URL so snapshots from distinct stores never mix.

use chrono::{DateTime, Utc};
use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::sync::Mutex;
use url::Url;

use crate::feedback::FeedbackRecord;

/// Storage backend for the cache snapshot.
pub trait SnapshotStore {
  /// Load the last stored snapshot, if any. `None` means no snapshot exists
  /// for this scope yet.
  fn load(&self) -> Result<Option<Vec<FeedbackRecord>>>;

  /// Replace the stored snapshot with `records`.
  fn store(&self, records: &[FeedbackRecord]) -> Result<()>;
}

/// Backend used when snapshotting is disabled; every operation is a no-op.
pub struct NoopSnapshot;

impl SnapshotStore for NoopSnapshot {
  fn load(&self) -> Result<Option<Vec<FeedbackRecord>>> {
    Ok(None)
  }

  fn store(&self, _records: &[FeedbackRecord]) -> Result<()> {
    Ok(())
  }
}

/// SQLite-backed snapshot store.
pub struct SqliteSnapshot {
  conn: Mutex<Connection>,
  scope: String,
}

const SNAPSHOT_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS record_snapshot (
    scope TEXT NOT NULL,
    record_id TEXT NOT NULL,
    data BLOB NOT NULL,
    position INTEGER NOT NULL,
    stored_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope, record_id)
);

CREATE INDEX IF NOT EXISTS idx_record_snapshot_scope
    ON record_snapshot(scope, position);
"#;

impl SqliteSnapshot {
  /// Open (or create) the snapshot database at the default location.
  pub fn open(endpoint: &Url) -> Result<Self> {
    let path = Self::default_path()?;

    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create snapshot directory: {}", e))?;
    }

    let conn = Connection::open(&path).map_err(|e| {
      eyre!(
        "Failed to open snapshot database at {}: {}",
        path.display(),
        e
      )
    })?;

    Self::with_connection(conn, endpoint)
  }

  /// Build a store over an existing connection (in-memory in tests).
  pub fn with_connection(conn: Connection, endpoint: &Url) -> Result<Self> {
    conn
      .execute_batch(SNAPSHOT_SCHEMA)
      .map_err(|e| eyre!("Failed to run snapshot migrations: {}", e))?;

    Ok(Self {
      conn: Mutex::new(conn),
      scope: scope_hash(endpoint),
    })
  }

  fn default_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("gopy").join("snapshot.db"))
  }
}

/// Stable, fixed-length scope key for an endpoint URL.
fn scope_hash(endpoint: &Url) -> String {
  let mut hasher = Sha256::new();
  hasher.update(endpoint.as_str().as_bytes());
  hex::encode(hasher.finalize())
}

impl SnapshotStore for SqliteSnapshot {
  fn load(&self) -> Result<Option<Vec<FeedbackRecord>>> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let mut stmt = conn
      .prepare("SELECT data FROM record_snapshot WHERE scope = ? ORDER BY position")
      .map_err(|e| eyre!("Failed to prepare snapshot load: {}", e))?;

    let rows = stmt
      .query_map(params![self.scope], |row| row.get::<_, Vec<u8>>(0))
      .map_err(|e| eyre!("Failed to query snapshot: {}", e))?;

    let mut records = Vec::new();
    let mut any_row = false;
    for row in rows {
      any_row = true;
      let data = row.map_err(|e| eyre!("Failed to read snapshot row: {}", e))?;
      let record: FeedbackRecord = serde_json::from_slice(&data)
        .map_err(|e| eyre!("Corrupt snapshot row, ignoring snapshot: {}", e))?;
      records.push(record);
    }

    if any_row {
      Ok(Some(records))
    } else {
      Ok(None)
    }
  }

  fn store(&self, records: &[FeedbackRecord]) -> Result<()> {
    let mut conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let stored_at: DateTime<Utc> = Utc::now();
    let tx = conn
      .transaction()
      .map_err(|e| eyre!("Failed to begin snapshot transaction: {}", e))?;

    tx.execute(
      "DELETE FROM record_snapshot WHERE scope = ?",
      params![self.scope],
    )
    .map_err(|e| eyre!("Failed to clear old snapshot: {}", e))?;

    for (position, record) in records.iter().enumerate() {
      let data =
        serde_json::to_vec(record).map_err(|e| eyre!("Failed to serialize record: {}", e))?;

      tx.execute(
        "INSERT INTO record_snapshot (scope, record_id, data, position, stored_at)
         VALUES (?, ?, ?, ?, ?)",
        params![
          self.scope,
          record.id,
          data,
          position as i64,
          stored_at.to_rfc3339()
        ],
      )
      .map_err(|e| eyre!("Failed to store snapshot row: {}", e))?;
    }

    tx.commit()
      .map_err(|e| eyre!("Failed to commit snapshot: {}", e))?;

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn endpoint() -> Url {
    Url::parse("https://script.example.com/macros/s/abc/exec").unwrap()
  }

  fn in_memory(url: &Url) -> SqliteSnapshot {
    SqliteSnapshot::with_connection(Connection::open_in_memory().unwrap(), url).unwrap()
  }

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

  #[test]
  fn test_empty_store_loads_none() {
    let store = in_memory(&endpoint());
    assert!(store.load().unwrap().is_none());
  }

  #[test]
  fn test_store_then_load_round_trip() {
    let store = in_memory(&endpoint());
    let records = vec![record("AAA111"), record("BBB222")];

    store.store(&records).unwrap();

    let loaded = store.load().unwrap().unwrap();
    assert_eq!(loaded, records);
  }

  #[test]
  fn test_store_replaces_previous_snapshot() {
    let store = in_memory(&endpoint());
    store.store(&[record("AAA111"), record("BBB222")]).unwrap();
    store.store(&[record("CCC333")]).unwrap();

    let loaded = store.load().unwrap().unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].id, "CCC333");
  }

  #[test]
  fn test_empty_snapshot_is_distinct_from_missing() {
    let store = in_memory(&endpoint());
    store.store(&[record("AAA111")]).unwrap();
    store.store(&[]).unwrap();

    // An explicitly stored empty list clears the scope; with no rows left
    // a later load reports "no snapshot" rather than resurrecting old data.
    assert!(store.load().unwrap().is_none());
  }

  #[test]
  fn test_scope_hash_separates_endpoints() {
    let a = scope_hash(&Url::parse("https://one.example.com/exec").unwrap());
    let b = scope_hash(&Url::parse("https://two.example.com/exec").unwrap());
    assert_ne!(a, b);
    assert_eq!(a.len(), 64);
  }

  #[test]
  fn test_noop_store_discards() {
    let store = NoopSnapshot;
    store.store(&[record("AAA111")]).unwrap();
    assert!(store.load().unwrap().is_none());
  }
}
