//! Feedback domain model: the record type, its status lifecycle, and the
//! inline attachment encoding used by the intake flow.

pub mod attachments;
pub mod types;

pub use types::{generate_id, FeedbackRecord, FeedbackStatus};
