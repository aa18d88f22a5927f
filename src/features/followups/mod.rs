//! # Follow-ups Feature
//!
//! One-shot, visit-triggered patient check-ins with an escalation path for
//! messages nobody answers.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Failed sends are held for operator resend instead of retried
//! - 1.0.0: Initial release with per-visit-type delays and escalation

pub mod escalation;
pub mod model;
pub mod service;

pub use escalation::{EscalationMonitor, ESCALATION_REASON};
pub use model::{FollowUp, VisitType};
pub use service::{FollowUpService, FollowUpView};
