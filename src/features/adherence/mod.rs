//! # Adherence Feature
//!
//! Turning patient replies into dose outcomes, and dose outcomes into the
//! adherence figures clinicians act on.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.4.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.0.0: Initial release with response matching, windowed reports and
//!   dashboard counters

pub mod report;
pub mod tracker;

pub use report::{
    AdherenceAggregator, AdherenceLevel, DashboardStats, FollowUpStats, MedicationAdherence,
    PatientAdherenceReport,
};
pub use tracker::ResponseTracker;
