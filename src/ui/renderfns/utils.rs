use crate::feedback::FeedbackStatus;
use chrono::{DateTime, Local, Utc};
use ratatui::prelude::Color;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", cut)
  }
}

/// Display color for a record's lifecycle status
pub fn status_color(status: FeedbackStatus) -> Color {
  match status {
    FeedbackStatus::Pending => Color::Red,
    FeedbackStatus::InProgress => Color::Yellow,
    FeedbackStatus::Resolved => Color::Green,
    FeedbackStatus::Rejected => Color::DarkGray,
  }
}

/// Render a stored UTC instant in local time the way the review console
/// shows dates.
pub fn format_local(instant: DateTime<Utc>) -> String {
  instant
    .with_timezone(&Local)
    .format("%d/%m/%Y %H:%M")
    .to_string()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_truncate_short_string() {
    assert_eq!(truncate("hello", 10), "hello");
  }

  #[test]
  fn test_truncate_exact_length() {
    assert_eq!(truncate("hello", 5), "hello");
  }

  #[test]
  fn test_truncate_long_string() {
    assert_eq!(truncate("hello world", 8), "hello...");
  }

  #[test]
  fn test_truncate_multibyte() {
    // Must cut on character boundaries, not bytes.
    assert_eq!(truncate("Phòng chờ quá đông", 10), "Phòng c...");
  }

  #[test]
  fn test_status_colors() {
    assert_eq!(status_color(FeedbackStatus::Pending), Color::Red);
    assert_eq!(status_color(FeedbackStatus::Resolved), Color::Green);
    assert_eq!(status_color(FeedbackStatus::InProgress), Color::Yellow);
    assert_eq!(status_color(FeedbackStatus::Rejected), Color::DarkGray);
  }
}
