//! In-memory store backed by `DashMap`.
//!
//! Reference implementation of the repository traits for tests and demo
//! mode. `DashMap`'s entry lock makes each `update` call atomic per record,
//! which is the serialization guarantee the traits require.

use super::{
    DoseId, FollowUpId, Mutation, PatientDirectory, PatientId, PatientProfile, ReminderId,
};
use crate::features::followups::FollowUp;
use crate::features::reminders::{DoseInstance, Reminder, ReminderStatus};
use chrono::NaiveDateTime;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct MemoryStore {
    reminders: DashMap<u64, Reminder>,
    doses: DashMap<u64, DoseInstance>,
    follow_ups: DashMap<u64, FollowUp>,
    next_reminder_id: AtomicU64,
    next_dose_id: AtomicU64,
    next_follow_up_id: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }
}

impl super::ReminderStore for MemoryStore {
    fn insert(&self, mut reminder: Reminder) -> Reminder {
        let id = self.next_reminder_id.fetch_add(1, Ordering::Relaxed) + 1;
        reminder.id = ReminderId(id);
        self.reminders.insert(id, reminder.clone());
        reminder
    }

    fn get(&self, id: ReminderId) -> Option<Reminder> {
        self.reminders.get(&id.0).map(|r| r.clone())
    }

    fn update(&self, id: ReminderId, mutate: Mutation<'_, Reminder>) -> bool {
        match self.reminders.get_mut(&id.0) {
            Some(mut entry) => {
                mutate(&mut entry);
                true
            }
            None => false,
        }
    }

    fn by_patient(&self, patient: PatientId) -> Vec<Reminder> {
        self.reminders
            .iter()
            .filter(|r| r.patient_id == patient)
            .map(|r| r.clone())
            .collect()
    }

    fn active(&self) -> Vec<Reminder> {
        self.reminders
            .iter()
            .filter(|r| r.status == ReminderStatus::Active && r.enabled)
            .map(|r| r.clone())
            .collect()
    }
}

impl super::DoseStore for MemoryStore {
    fn insert(&self, mut dose: DoseInstance) -> DoseInstance {
        let id = self.next_dose_id.fetch_add(1, Ordering::Relaxed) + 1;
        dose.id = DoseId(id);
        self.doses.insert(id, dose.clone());
        dose
    }

    fn get(&self, id: DoseId) -> Option<DoseInstance> {
        self.doses.get(&id.0).map(|d| d.clone())
    }

    fn update(&self, id: DoseId, mutate: Mutation<'_, DoseInstance>) -> bool {
        match self.doses.get_mut(&id.0) {
            Some(mut entry) => {
                mutate(&mut entry);
                true
            }
            None => false,
        }
    }

    fn by_reminder(&self, reminder: ReminderId) -> Vec<DoseInstance> {
        let mut doses: Vec<DoseInstance> = self
            .doses
            .iter()
            .filter(|d| d.reminder_id == reminder)
            .map(|d| d.clone())
            .collect();
        doses.sort_by_key(|d| d.scheduled_at);
        doses
    }

    fn pending(&self) -> Vec<DoseInstance> {
        let mut doses: Vec<DoseInstance> = self
            .doses
            .iter()
            .filter(|d| d.is_awaiting_send())
            .map(|d| d.clone())
            .collect();
        doses.sort_by_key(|d| d.scheduled_at);
        doses
    }

    fn in_window(&self, from: NaiveDateTime, to: NaiveDateTime) -> Vec<DoseInstance> {
        self.doses
            .iter()
            .filter(|d| d.scheduled_at >= from && d.scheduled_at < to)
            .map(|d| d.clone())
            .collect()
    }
}

impl super::FollowUpStore for MemoryStore {
    fn insert(&self, mut follow_up: FollowUp) -> FollowUp {
        let id = self.next_follow_up_id.fetch_add(1, Ordering::Relaxed) + 1;
        follow_up.id = FollowUpId(id);
        self.follow_ups.insert(id, follow_up.clone());
        follow_up
    }

    fn get(&self, id: FollowUpId) -> Option<FollowUp> {
        self.follow_ups.get(&id.0).map(|f| f.clone())
    }

    fn update(&self, id: FollowUpId, mutate: Mutation<'_, FollowUp>) -> bool {
        match self.follow_ups.get_mut(&id.0) {
            Some(mut entry) => {
                mutate(&mut entry);
                true
            }
            None => false,
        }
    }

    fn remove(&self, id: FollowUpId) -> bool {
        self.follow_ups.remove(&id.0).is_some()
    }

    fn by_patient(&self, patient: PatientId) -> Vec<FollowUp> {
        let mut follow_ups: Vec<FollowUp> = self
            .follow_ups
            .iter()
            .filter(|f| f.patient_id == patient)
            .map(|f| f.clone())
            .collect();
        follow_ups.sort_by_key(|f| f.created_at);
        follow_ups
    }

    fn unsent(&self) -> Vec<FollowUp> {
        self.follow_ups
            .iter()
            .filter(|f| !f.sent)
            .map(|f| f.clone())
            .collect()
    }

    fn awaiting_response(&self) -> Vec<FollowUp> {
        self.follow_ups
            .iter()
            .filter(|f| f.sent && !f.responded)
            .map(|f| f.clone())
            .collect()
    }

    fn all(&self) -> Vec<FollowUp> {
        self.follow_ups.iter().map(|f| f.clone()).collect()
    }
}

/// In-memory patient directory for tests and demo mode.
#[derive(Default)]
pub struct MemoryPatientDirectory {
    patients: DashMap<u64, PatientProfile>,
    next_id: AtomicU64,
}

impl MemoryPatientDirectory {
    pub fn new() -> Self {
        MemoryPatientDirectory::default()
    }

    pub fn add(&self, name: impl Into<String>, contact: impl Into<String>) -> PatientId {
        let id = PatientId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        self.patients.insert(
            id.0,
            PatientProfile {
                id,
                name: name.into(),
                contact: contact.into(),
            },
        );
        id
    }
}

impl PatientDirectory for MemoryPatientDirectory {
    fn find(&self, id: PatientId) -> Option<PatientProfile> {
        self.patients.get(&id.0).map(|p| p.clone())
    }
}
