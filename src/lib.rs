// Core layer - clock, configuration and error types
pub mod core;

// Store layer - repository traits and the in-memory implementation
pub mod store;

// Messaging layer - outbound delivery channel
pub mod messaging;

// Features layer - all feature modules
pub mod features;

// Runtime layer - the background tick loops
pub mod runtime;

// Re-export core items
pub use core::{Clock, ManualClock, SchedulerConfig, SchedulerError, SystemClock};

// Re-export feature items
pub use features::{
    // Adherence
    adherence::{AdherenceAggregator, AdherenceLevel, ResponseTracker},
    // Dispatch
    dispatch::{BatchOutcome, Dispatcher, DueWorkSelector},
    // Follow-ups
    followups::{EscalationMonitor, FollowUpService, VisitType},
    // Reminders
    reminders::{DoseMaterializer, Frequency, ReminderService},
};

// Re-export runtime
pub use runtime::SchedulerRuntime;
