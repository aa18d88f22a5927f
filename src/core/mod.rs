//! # Core Module
//!
//! Configuration, clock abstraction and error taxonomy shared by every
//! scheduler component.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

pub mod clock;
pub mod config;
pub mod error;

// Re-export commonly used items
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::SchedulerConfig;
pub use error::{Result, SchedulerError};
