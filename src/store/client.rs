use crate::feedback::FeedbackRecord;
use reqwest::StatusCode;
use serde::Serialize;
use url::Url;

/// Why a store call failed.
///
/// The distinction only survives into the logs; callers see a failed
/// `fetch_all` or a `false` from the write operations.
#[derive(Debug)]
pub enum StoreError {
  /// The request never completed (DNS, connect, TLS, mid-body drop).
  Transport(reqwest::Error),
  /// The endpoint answered with a non-success status.
  Rejection(StatusCode),
  /// The endpoint answered 2xx but the body was not a record array.
  Malformed(String),
}

impl std::fmt::Display for StoreError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      StoreError::Transport(e) => write!(f, "transport failure: {}", e),
      StoreError::Rejection(status) => write!(f, "remote rejection: HTTP {}", status),
      StoreError::Malformed(e) => write!(f, "malformed response: {}", e),
    }
  }
}

impl std::error::Error for StoreError {}

/// Envelope for the endpoint's write operations.
#[derive(Serialize)]
struct WriteEnvelope<'a> {
  action: &'static str,
  feedback: &'a FeedbackRecord,
}

/// Thin client for the script endpoint that backs the feedback store.
///
/// Every operation is a single attempt: no retries, no configured timeout.
/// Success of a write is judged solely by the HTTP status; the response body
/// is never inspected. The client holds no state beyond the connection pool.
#[derive(Clone)]
pub struct StoreClient {
  http: reqwest::Client,
  endpoint: Url,
}

impl StoreClient {
  pub fn new(endpoint: Url) -> Self {
    Self {
      http: reqwest::Client::new(),
      endpoint,
    }
  }

  /// Fetch the full record listing.
  ///
  /// The error carries the failure class for logging; the reconciliation
  /// loop collapses it to a skipped cycle.
  pub async fn fetch_all(&self) -> Result<Vec<FeedbackRecord>, StoreError> {
    let response = self
      .http
      .get(self.endpoint.clone())
      .send()
      .await
      .map_err(StoreError::Transport)?;

    let status = response.status();
    if !status.is_success() {
      return Err(StoreError::Rejection(status));
    }

    response
      .json::<Vec<FeedbackRecord>>()
      .await
      .map_err(|e| StoreError::Malformed(e.to_string()))
  }

  /// Submit a new record. True iff the endpoint accepted the write.
  pub async fn create(&self, record: &FeedbackRecord) -> bool {
    self.write("SUBMIT", record).await
  }

  /// Update an existing record. Same contract as [`StoreClient::create`].
  pub async fn update(&self, record: &FeedbackRecord) -> bool {
    self.write("UPDATE", record).await
  }

  async fn write(&self, action: &'static str, record: &FeedbackRecord) -> bool {
    let envelope = WriteEnvelope {
      action,
      feedback: record,
    };

    let result = self
      .http
      .post(self.endpoint.clone())
      .json(&envelope)
      .send()
      .await;

    match result {
      Ok(response) => {
        let status = response.status();
        if status.is_success() {
          true
        } else {
          tracing::warn!(%action, record_id = %record.id, %status, "store rejected write");
          false
        }
      }
      Err(e) => {
        tracing::warn!(%action, record_id = %record.id, error = %e, "store write transport failure");
        false
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::feedback::FeedbackRecord;

  fn sample() -> FeedbackRecord {
    FeedbackRecord::new_submission(
      "Nguyễn Văn A".to_string(),
      "0911222333".to_string(),
      "Khoa Nội".to_string(),
      "Phòng chờ quá đông".to_string(),
      Vec::new(),
    )
  }

  #[test]
  fn test_write_envelope_shape() {
    let record = sample();
    let envelope = WriteEnvelope {
      action: "SUBMIT",
      feedback: &record,
    };

    let value = serde_json::to_value(&envelope).unwrap();
    assert_eq!(value["action"], "SUBMIT");
    assert_eq!(value["feedback"]["id"], record.id);
    assert_eq!(value["feedback"]["status"], "PENDING");
  }

  #[test]
  fn test_store_error_display() {
    let e = StoreError::Rejection(StatusCode::BAD_GATEWAY);
    assert_eq!(e.to_string(), "remote rejection: HTTP 502 Bad Gateway");

    let e = StoreError::Malformed("expected an array".to_string());
    assert!(e.to_string().starts_with("malformed response:"));
  }
}
