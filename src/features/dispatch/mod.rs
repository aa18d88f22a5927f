//! # Dispatch Feature
//!
//! The send pipeline: selecting due work, rendering message templates and
//! recording delivery outcomes. Doses retry up to the reminder's attempt
//! cap; follow-ups are one-shot and park on failure.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.3.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.0.0: Initial release with tolerance-band selection and batch isolation

pub mod dispatcher;
pub mod selector;
pub mod templates;

pub use dispatcher::{BatchOutcome, Dispatcher};
pub use selector::DueWorkSelector;
