use chrono::{DateTime, Local, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::attachments::MAX_ATTACHMENTS;

/// Lifecycle state of a feedback record.
///
/// Records start out `Pending` and move to `Resolved` when an admin reply is
/// recorded. `InProgress` and `Rejected` are part of the taxonomy (they can
/// arrive from the remote store) but no current flow sets them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeedbackStatus {
  Pending,
  InProgress,
  Resolved,
  Rejected,
}

impl FeedbackStatus {
  pub const ALL: [FeedbackStatus; 4] = [
    FeedbackStatus::Pending,
    FeedbackStatus::InProgress,
    FeedbackStatus::Resolved,
    FeedbackStatus::Rejected,
  ];

  /// Human-readable label for list and detail rendering.
  pub fn label(self) -> &'static str {
    match self {
      FeedbackStatus::Pending => "Pending",
      FeedbackStatus::InProgress => "In progress",
      FeedbackStatus::Resolved => "Resolved",
      FeedbackStatus::Rejected => "Rejected",
    }
  }
}

/// One feedback submission and its lifecycle state.
///
/// Everything captured at submission time is immutable afterwards; the only
/// meaningful mutation is the admin reply, which goes through
/// [`FeedbackRecord::with_reply`] so the status/reply invariant cannot be
/// violated piecemeal. Wire encoding is camelCase JSON, matching what the
/// script endpoint stores and returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRecord {
  pub id: String,
  pub submitter_name: String,
  pub contact_number: String,
  pub department: String,
  pub submission_date: String,
  pub submission_time: String,
  pub content: String,
  #[serde(default)]
  pub attachments: Vec<String>,
  pub status: FeedbackStatus,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub admin_reply: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub replied_at: Option<DateTime<Utc>>,
  pub created_at: DateTime<Utc>,
}

impl FeedbackRecord {
  /// Build a fresh public submission.
  ///
  /// Assigns a client-generated id, stamps the submission date/time from
  /// local time, and starts the record as `Pending` with no reply.
  /// Attachments beyond the intake limit are dropped.
  pub fn new_submission(
    submitter_name: String,
    contact_number: String,
    department: String,
    content: String,
    mut attachments: Vec<String>,
  ) -> Self {
    attachments.truncate(MAX_ATTACHMENTS);
    let now = Local::now();

    Self {
      id: generate_id(),
      submitter_name,
      contact_number,
      department,
      submission_date: now.format("%Y-%m-%d").to_string(),
      submission_time: now.format("%H:%M").to_string(),
      content,
      attachments,
      status: FeedbackStatus::Pending,
      admin_reply: None,
      replied_at: None,
      created_at: Utc::now(),
    }
  }

  /// Record the admin reply, moving the record to `Resolved`.
  ///
  /// This is the only way a reply enters a record, which keeps the invariant
  /// that `Resolved` and a present reply always travel together.
  pub fn with_reply(mut self, reply: String) -> Self {
    self.admin_reply = Some(reply);
    self.replied_at = Some(Utc::now());
    self.status = FeedbackStatus::Resolved;
    self
  }

  /// Whether a reply has been recorded.
  pub fn has_reply(&self) -> bool {
    self.admin_reply.is_some()
  }
}

const ID_LEN: usize = 6;
const ID_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Generate a short record id: 6 characters of uppercase base-36.
///
/// Uniqueness is not verified against the remote store; the id space
/// (~2.2 billion values) is treated as collision-free for the write rate this
/// system sees, and the store itself is the final arbiter.
pub fn generate_id() -> String {
  let mut rng = rand::thread_rng();
  (0..ID_LEN)
    .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sample_submission() -> FeedbackRecord {
    FeedbackRecord::new_submission(
      "Nguyễn Văn A".to_string(),
      "0911222333".to_string(),
      "Khoa Nội".to_string(),
      "Phòng chờ quá đông".to_string(),
      Vec::new(),
    )
  }

  #[test]
  fn test_generate_id_shape() {
    let id = generate_id();
    assert_eq!(id.len(), ID_LEN);
    assert!(id.bytes().all(|b| ID_ALPHABET.contains(&b)));
  }

  #[test]
  fn test_generate_id_varies() {
    let ids: std::collections::HashSet<String> = (0..32).map(|_| generate_id()).collect();
    assert!(ids.len() > 1);
  }

  #[test]
  fn test_new_submission_starts_pending() {
    let record = sample_submission();
    assert_eq!(record.status, FeedbackStatus::Pending);
    assert_eq!(record.admin_reply, None);
    assert_eq!(record.replied_at, None);
    assert!(!record.has_reply());
  }

  #[test]
  fn test_new_submission_caps_attachments() {
    let record = FeedbackRecord::new_submission(
      "A".to_string(),
      "0900000000".to_string(),
      "Khoa Nhi".to_string(),
      "x".to_string(),
      vec!["a".to_string(), "b".to_string(), "c".to_string()],
    );
    assert_eq!(record.attachments.len(), MAX_ATTACHMENTS);
    assert_eq!(record.attachments, vec!["a".to_string(), "b".to_string()]);
  }

  #[test]
  fn test_with_reply_resolves() {
    let record = sample_submission();
    let id = record.id.clone();
    let created_at = record.created_at;

    let replied = record.with_reply("Chúng tôi đã ghi nhận.".to_string());

    assert_eq!(replied.id, id);
    assert_eq!(replied.created_at, created_at);
    assert_eq!(replied.status, FeedbackStatus::Resolved);
    assert_eq!(replied.admin_reply.as_deref(), Some("Chúng tôi đã ghi nhận."));
    assert!(replied.replied_at.is_some());
  }

  #[test]
  fn test_resolved_iff_reply_present() {
    let pending = sample_submission();
    assert!(pending.status != FeedbackStatus::Resolved && pending.admin_reply.is_none());

    let replied = pending.with_reply("Đã tiếp nhận.".to_string());
    assert!(replied.status == FeedbackStatus::Resolved && replied.admin_reply.is_some());
  }

  #[test]
  fn test_wire_field_names() {
    let record = sample_submission();
    let value = serde_json::to_value(&record).unwrap();
    let obj = value.as_object().unwrap();

    assert!(obj.contains_key("submitterName"));
    assert!(obj.contains_key("contactNumber"));
    assert!(obj.contains_key("submissionDate"));
    assert!(obj.contains_key("submissionTime"));
    assert!(obj.contains_key("createdAt"));
    assert_eq!(value["status"], "PENDING");
    // No reply yet: the optional fields stay off the wire entirely.
    assert!(!obj.contains_key("adminReply"));
    assert!(!obj.contains_key("repliedAt"));
  }

  #[test]
  fn test_wire_status_values() {
    assert_eq!(
      serde_json::to_value(FeedbackStatus::InProgress).unwrap(),
      "IN_PROGRESS"
    );
    assert_eq!(
      serde_json::from_str::<FeedbackStatus>("\"REJECTED\"").unwrap(),
      FeedbackStatus::Rejected
    );
  }

  #[test]
  fn test_deserialize_remote_payload() {
    // A resolved record the way the script endpoint returns it; attachments
    // may be missing entirely on older rows.
    let json = r#"{
      "id": "K7Q2ZD",
      "submitterName": "Trần Thị B",
      "contactNumber": "0901234567",
      "department": "Khoa Sản",
      "submissionDate": "2026-08-01",
      "submissionTime": "09:45",
      "content": "Nhân viên hướng dẫn rất tận tình",
      "status": "RESOLVED",
      "adminReply": "Cảm ơn quý khách.",
      "repliedAt": "2026-08-02T03:12:00Z",
      "createdAt": "2026-08-01T02:45:00Z"
    }"#;

    let record: FeedbackRecord = serde_json::from_str(json).unwrap();
    assert_eq!(record.id, "K7Q2ZD");
    assert_eq!(record.attachments, Vec::<String>::new());
    assert_eq!(record.status, FeedbackStatus::Resolved);
    assert_eq!(record.admin_reply.as_deref(), Some("Cảm ơn quý khách."));
    assert!(record.replied_at.is_some());
  }
}
