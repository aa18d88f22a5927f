//! Scheduler error taxonomy.
//!
//! Only failures that a synchronous caller can act on live here. Transient
//! delivery failures are recorded on the affected dose or follow-up and
//! surfaced through logs; a stale response-marking call is a logged no-op
//! and deliberately has no variant.

use crate::store::{FollowUpId, PatientId, ReminderId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("patient {0} not found")]
    PatientNotFound(PatientId),

    #[error("reminder {0} not found")]
    ReminderNotFound(ReminderId),

    #[error("follow-up {0} not found")]
    FollowUpNotFound(FollowUpId),

    /// Malformed input rejected at the boundary (bad time slot, unknown
    /// visit type, empty medication name).
    #[error("invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    #[error("failed to deliver message to {recipient}")]
    DeliveryFailed { recipient: String },
}

impl SchedulerError {
    pub fn invalid_input(field: &'static str, reason: impl Into<String>) -> Self {
        SchedulerError::InvalidInput {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
