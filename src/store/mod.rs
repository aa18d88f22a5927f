//! # Store Module
//!
//! Repository traits the scheduler is written against, plus the entity key
//! types. The scheduler never owns persistence: an implementation is
//! injected (in-memory for tests and demo mode, a durable store in
//! production). Patient records live outside the scheduler entirely and are
//! reached through the read-only [`PatientDirectory`].
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

pub mod memory;

pub use memory::{MemoryPatientDirectory, MemoryStore};

use crate::features::followups::FollowUp;
use crate::features::reminders::{DoseInstance, Reminder};
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! id_type {
    ($name:ident) => {
        /// Stable opaque key.
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(PatientId);
id_type!(ReminderId);
id_type!(DoseId);
id_type!(FollowUpId);

/// The slice of an externally-owned patient record the scheduler needs:
/// a display name for message rendering and a contact address for delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientProfile {
    pub id: PatientId,
    pub name: String,
    pub contact: String,
}

/// Read-only view into the external patient store. The scheduler never
/// mutates patient records.
pub trait PatientDirectory: Send + Sync {
    fn find(&self, id: PatientId) -> Option<PatientProfile>;
}

/// Closure applied to a record under the store's per-record lock.
///
/// All mutations flow through `update` methods so that an implementation can
/// serialize concurrent writes to the same record (tick processing and
/// inbound patient responses may touch the same dose or reminder).
pub type Mutation<'a, T> = Box<dyn FnOnce(&mut T) + Send + 'a>;

pub trait ReminderStore: Send + Sync {
    /// Persist a new reminder, assigning its id. Returns the stored copy.
    fn insert(&self, reminder: Reminder) -> Reminder;
    fn get(&self, id: ReminderId) -> Option<Reminder>;
    /// Apply `mutate` atomically to the record. Returns false when the id
    /// is unknown.
    fn update(&self, id: ReminderId, mutate: Mutation<'_, Reminder>) -> bool;
    fn by_patient(&self, patient: PatientId) -> Vec<Reminder>;
    /// Reminders with status Active and the enabled flag set.
    fn active(&self) -> Vec<Reminder>;
}

pub trait DoseStore: Send + Sync {
    fn insert(&self, dose: DoseInstance) -> DoseInstance;
    fn get(&self, id: DoseId) -> Option<DoseInstance>;
    fn update(&self, id: DoseId, mutate: Mutation<'_, DoseInstance>) -> bool;
    fn by_reminder(&self, reminder: ReminderId) -> Vec<DoseInstance>;
    /// Doses still awaiting a successful send (Scheduled or Failed).
    fn pending(&self) -> Vec<DoseInstance>;
    /// Doses scheduled inside `[from, to)`, for reports and dashboards.
    fn in_window(
        &self,
        from: chrono::NaiveDateTime,
        to: chrono::NaiveDateTime,
    ) -> Vec<DoseInstance>;
}

pub trait FollowUpStore: Send + Sync {
    fn insert(&self, follow_up: FollowUp) -> FollowUp;
    fn get(&self, id: FollowUpId) -> Option<FollowUp>;
    fn update(&self, id: FollowUpId, mutate: Mutation<'_, FollowUp>) -> bool;
    fn remove(&self, id: FollowUpId) -> bool;
    fn by_patient(&self, patient: PatientId) -> Vec<FollowUp>;
    /// Follow-ups not yet sent.
    fn unsent(&self) -> Vec<FollowUp>;
    /// Follow-ups sent but not yet responded to.
    fn awaiting_response(&self) -> Vec<FollowUp>;
    fn all(&self) -> Vec<FollowUp>;
}
