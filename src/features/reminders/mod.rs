//! # Reminders Feature
//!
//! Medication reminder schedules, their concrete dose instances, and the
//! materializer that keeps a rolling dose horizon expanded.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Typed time slots replace the JSON-encoded time list
//! - 1.0.0: Initial release with adherence counters and dose expansion

pub mod dose;
pub mod materializer;
pub mod model;
pub mod service;

pub use dose::{DoseInstance, DoseStatus, PatientResponse};
pub use materializer::DoseMaterializer;
pub use model::{Frequency, Reminder, ReminderStatus};
pub use service::{NewReminder, ReminderService, ReminderUpdate, ReminderView};
