//! The in-memory record cache and its derived query views.
//!
//! The cache is the single source of truth for everything the UI renders.
//! Data flows in one direction on each side: remote snapshot → cache on
//! refresh, cache → remote on submit/update (with an optimistic local echo).
//! It is owned by the application and handed to views as an explicit
//! [`SharedCache`] handle; all access happens synchronously on the UI thread
//! between suspension points, so `Rc<RefCell<_>>` is all the sharing we need.

use crate::feedback::{FeedbackRecord, FeedbackStatus};
use std::cell::RefCell;
use std::rc::Rc;

/// Handle under which the cache is injected into views.
pub type SharedCache = Rc<RefCell<FeedbackCache>>;

/// Status filter for the admin board view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
  #[default]
  All,
  Only(FeedbackStatus),
}

impl StatusFilter {
  /// Every selectable filter, in picker order.
  pub fn options() -> Vec<StatusFilter> {
    let mut options = vec![StatusFilter::All];
    options.extend(FeedbackStatus::ALL.iter().map(|s| StatusFilter::Only(*s)));
    options
  }

  pub fn label(self) -> &'static str {
    match self {
      StatusFilter::All => "All",
      StatusFilter::Only(status) => status.label(),
    }
  }

  fn matches(self, record: &FeedbackRecord) -> bool {
    match self {
      StatusFilter::All => true,
      StatusFilter::Only(status) => record.status == status,
    }
  }
}

/// In-memory collection of all known feedback records.
#[derive(Debug, Default)]
pub struct FeedbackCache {
  records: Vec<FeedbackRecord>,
}

impl FeedbackCache {
  pub fn new() -> Self {
    Self::default()
  }

  /// Create the shared handle views are given.
  pub fn shared() -> SharedCache {
    Rc::new(RefCell::new(Self::new()))
  }

  /// Number of records currently known.
  pub fn len(&self) -> usize {
    self.records.len()
  }

  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }

  /// Wholesale replacement with a remote snapshot.
  pub fn replace_all(&mut self, records: Vec<FeedbackRecord>) {
    self.records = records;
  }

  /// Apply a locally confirmed write before the next refresh echoes it back.
  ///
  /// A new id goes to the front of the internal order; an existing id is
  /// replaced in place. Either way the record is visible to every view as
  /// soon as this returns.
  pub fn upsert_optimistic(&mut self, record: FeedbackRecord) {
    match self.records.iter_mut().find(|r| r.id == record.id) {
      Some(existing) => *existing = record,
      None => self.records.insert(0, record),
    }
  }

  /// Find one record by id.
  pub fn get(&self, id: &str) -> Option<FeedbackRecord> {
    self.records.iter().find(|r| r.id == id).cloned()
  }

  /// A full snapshot of the cache, for the durability write-through.
  pub fn snapshot(&self) -> Vec<FeedbackRecord> {
    self.records.clone()
  }

  /// Admin view: records matching the filter, newest first.
  pub fn filtered(&self, filter: StatusFilter) -> Vec<FeedbackRecord> {
    let mut matched: Vec<FeedbackRecord> = self
      .records
      .iter()
      .filter(|r| filter.matches(r))
      .cloned()
      .collect();
    sort_newest_first(&mut matched);
    matched
  }

  /// Lookup view: whitespace-insensitive exact match on contact number,
  /// newest first.
  pub fn lookup(&self, contact_query: &str) -> Vec<FeedbackRecord> {
    let query = normalize_contact(contact_query);
    if query.is_empty() {
      return Vec::new();
    }

    let mut matched: Vec<FeedbackRecord> = self
      .records
      .iter()
      .filter(|r| normalize_contact(&r.contact_number) == query)
      .cloned()
      .collect();
    sort_newest_first(&mut matched);
    matched
  }
}

fn sort_newest_first(records: &mut [FeedbackRecord]) {
  records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

/// Strip all whitespace from a contact number before comparison.
fn normalize_contact(s: &str) -> String {
  s.chars().filter(|c| !c.is_whitespace()).collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::{Duration, Utc};

  fn record(id: &str, contact: &str, age_minutes: i64) -> FeedbackRecord {
    let mut r = FeedbackRecord::new_submission(
      "Nguyễn Văn A".to_string(),
      contact.to_string(),
      "Khoa Nội".to_string(),
      "Phòng chờ quá đông".to_string(),
      Vec::new(),
    );
    r.id = id.to_string();
    r.created_at = Utc::now() - Duration::minutes(age_minutes);
    r
  }

  #[test]
  fn test_replace_all_is_exact() {
    let mut cache = FeedbackCache::new();
    cache.upsert_optimistic(record("OLD001", "0900000000", 0));

    let snapshot = vec![
      record("AAA111", "0901111111", 10),
      record("BBB222", "0902222222", 5),
    ];
    cache.replace_all(snapshot.clone());

    let view = cache.filtered(StatusFilter::All);
    assert_eq!(view.len(), 2);
    // Reordered newest-first, nothing added or dropped.
    assert_eq!(view[0].id, "BBB222");
    assert_eq!(view[1].id, "AAA111");
  }

  #[test]
  fn test_upsert_inserts_new_at_front() {
    let mut cache = FeedbackCache::new();
    cache.replace_all(vec![record("AAA111", "0901111111", 10)]);

    cache.upsert_optimistic(record("NEW001", "0911222333", 0));

    // Visible to views synchronously, before any network confirmation.
    let view = cache.filtered(StatusFilter::All);
    assert_eq!(view.len(), 2);
    assert_eq!(view[0].id, "NEW001");
  }

  #[test]
  fn test_upsert_replaces_existing_id() {
    let mut cache = FeedbackCache::new();
    let original = record("AAA111", "0901111111", 10);
    cache.replace_all(vec![original.clone()]);

    let replied = original.with_reply("Chúng tôi đã ghi nhận.".to_string());
    cache.upsert_optimistic(replied);

    assert_eq!(cache.len(), 1);
    let stored = cache.get("AAA111").unwrap();
    assert_eq!(stored.status, FeedbackStatus::Resolved);
    assert_eq!(stored.admin_reply.as_deref(), Some("Chúng tôi đã ghi nhận."));
  }

  #[test]
  fn test_filtered_by_status() {
    let mut cache = FeedbackCache::new();
    let pending = record("AAA111", "0901111111", 10);
    let resolved = record("BBB222", "0902222222", 5).with_reply("Đã tiếp nhận.".to_string());
    cache.replace_all(vec![pending, resolved]);

    let pending_only = cache.filtered(StatusFilter::Only(FeedbackStatus::Pending));
    assert_eq!(pending_only.len(), 1);
    assert_eq!(pending_only[0].id, "AAA111");

    let resolved_only = cache.filtered(StatusFilter::Only(FeedbackStatus::Resolved));
    assert_eq!(resolved_only.len(), 1);
    assert_eq!(resolved_only[0].id, "BBB222");

    assert_eq!(cache.filtered(StatusFilter::All).len(), 2);
  }

  #[test]
  fn test_lookup_is_whitespace_insensitive() {
    let mut cache = FeedbackCache::new();
    cache.replace_all(vec![
      record("AAA111", "0901234567", 10),
      record("BBB222", "0901234568", 5),
    ]);

    let hits = cache.lookup("090 123 4567");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "AAA111");

    assert!(cache.lookup("0909999999").is_empty());
  }

  #[test]
  fn test_lookup_empty_query_matches_nothing() {
    let mut cache = FeedbackCache::new();
    cache.replace_all(vec![record("AAA111", "0901234567", 10)]);

    assert!(cache.lookup("").is_empty());
    assert!(cache.lookup("   ").is_empty());
  }

  #[test]
  fn test_lookup_sorted_newest_first() {
    let mut cache = FeedbackCache::new();
    cache.replace_all(vec![
      record("AAA111", "0901234567", 30),
      record("BBB222", "0901234567", 5),
      record("CCC333", "0901234567", 15),
    ]);

    let hits = cache.lookup("0901234567");
    let ids: Vec<&str> = hits.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["BBB222", "CCC333", "AAA111"]);
  }

  #[test]
  fn test_filter_options_cover_taxonomy() {
    let options = StatusFilter::options();
    assert_eq!(options.len(), 5);
    assert_eq!(options[0], StatusFilter::All);
    assert_eq!(options[0].label(), "All");
  }
}
