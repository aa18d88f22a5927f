//! Feature layer: each submodule owns one slice of scheduler behavior and
//! carries its own version header and changelog.

pub mod adherence;
pub mod dispatch;
pub mod followups;
pub mod reminders;
