//! Reminder management operations consumed by the web layer.

use crate::core::{Clock, Result, SchedulerConfig, SchedulerError};
use crate::features::adherence::AdherenceLevel;
use crate::features::reminders::{
    DoseMaterializer, Frequency, Reminder, ReminderStatus,
};
use crate::store::{
    DoseStore, PatientDirectory, PatientId, ReminderId, ReminderStore,
};
use chrono::{NaiveDateTime, NaiveTime};
use log::info;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Creation request. Slot strings are `HH:MM`; when omitted the frequency
/// defaults apply.
#[derive(Debug, Clone, Deserialize)]
pub struct NewReminder {
    pub patient_id: PatientId,
    pub medication_name: String,
    pub dosage: String,
    pub frequency: Frequency,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub slots: Option<Vec<String>>,
    pub special_instructions: Option<String>,
    pub max_attempts_per_dose: Option<u32>,
    pub created_by: String,
}

/// Partial update; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReminderUpdate {
    pub slots: Option<Vec<String>>,
    pub enabled: Option<bool>,
    pub special_instructions: Option<String>,
    pub end: Option<NaiveDateTime>,
}

/// Display-ready projection of a reminder for patient-facing lists.
#[derive(Debug, Clone, Serialize)]
pub struct ReminderView {
    pub id: ReminderId,
    pub medication_name: String,
    pub dosage: String,
    pub frequency: &'static str,
    pub slots: Vec<String>,
    pub status: &'static str,
    pub enabled: bool,
    pub next_due: Option<NaiveDateTime>,
    pub doses_scheduled: u32,
    pub doses_taken: u32,
    pub doses_missed: u32,
    pub adherence_percentage: f64,
    pub adherence_level: &'static str,
}

impl ReminderView {
    fn from_reminder(reminder: &Reminder) -> Self {
        ReminderView {
            id: reminder.id,
            medication_name: reminder.medication_name.clone(),
            dosage: reminder.dosage.clone(),
            frequency: reminder.frequency.display_name(),
            slots: reminder
                .effective_slots()
                .iter()
                .map(|s| s.format("%H:%M").to_string())
                .collect(),
            status: reminder.status.display_name(),
            enabled: reminder.enabled,
            next_due: reminder.next_due,
            doses_scheduled: reminder.doses_scheduled,
            doses_taken: reminder.doses_taken,
            doses_missed: reminder.doses_missed,
            adherence_percentage: reminder.adherence_percentage,
            adherence_level: reminder.adherence_level().display_name(),
        }
    }
}

/// Parse `HH:MM` slot strings, rejecting anything malformed at the boundary.
pub fn parse_slots(raw: &[String]) -> Result<Vec<NaiveTime>> {
    raw.iter()
        .map(|s| {
            NaiveTime::parse_from_str(s.trim(), "%H:%M")
                .map_err(|_| SchedulerError::invalid_input("slot", format!("unparseable time {s:?}")))
        })
        .collect()
}

pub struct ReminderService {
    reminders: Arc<dyn ReminderStore>,
    doses: Arc<dyn DoseStore>,
    patients: Arc<dyn PatientDirectory>,
    materializer: Arc<DoseMaterializer>,
    clock: Arc<dyn Clock>,
    config: SchedulerConfig,
}

impl ReminderService {
    pub fn new(
        reminders: Arc<dyn ReminderStore>,
        doses: Arc<dyn DoseStore>,
        patients: Arc<dyn PatientDirectory>,
        materializer: Arc<DoseMaterializer>,
        clock: Arc<dyn Clock>,
        config: SchedulerConfig,
    ) -> Self {
        ReminderService {
            reminders,
            doses,
            patients,
            materializer,
            clock,
            config,
        }
    }

    /// Create a reminder, materialize its initial dose horizon and cache
    /// the next-due time.
    pub fn create_reminder(&self, new: NewReminder) -> Result<Reminder> {
        if new.medication_name.trim().is_empty() {
            return Err(SchedulerError::invalid_input(
                "medication_name",
                "must not be empty",
            ));
        }
        let patient = self
            .patients
            .find(new.patient_id)
            .ok_or(SchedulerError::PatientNotFound(new.patient_id))?;

        let now = self.clock.now();
        let slots = match &new.slots {
            Some(raw) => parse_slots(raw)?,
            None => Vec::new(),
        };

        let mut reminder = Reminder::new(
            new.patient_id,
            new.medication_name,
            new.dosage,
            new.frequency,
            new.start.unwrap_or(now),
            new.max_attempts_per_dose
                .unwrap_or(self.config.default_max_attempts),
            new.created_by,
            now,
        );
        reminder.slots = slots;
        reminder.end = new.end;
        reminder.special_instructions = new.special_instructions;
        reminder.next_due = reminder.next_due_after(now);

        let reminder = self.reminders.insert(reminder);
        self.materializer.materialize(reminder.id)?;

        info!(
            "created reminder {} for {}: {} ({})",
            reminder.id,
            patient.name,
            reminder.medication_name,
            reminder.frequency.display_name()
        );
        // Re-read so the caller sees the materializer's counter updates.
        Ok(self.reminders.get(reminder.id).unwrap_or(reminder))
    }

    /// Update slot times, enabled flag, instructions or end date.
    /// Slot/start changes re-materialize the horizon.
    pub fn update_reminder(&self, id: ReminderId, update: ReminderUpdate) -> Result<Reminder> {
        let slots = match &update.slots {
            Some(raw) => Some(parse_slots(raw)?),
            None => None,
        };
        let now = self.clock.now();
        let slots_changed = slots.is_some();

        let found = self.reminders.update(
            id,
            Box::new(move |r| {
                if let Some(slots) = slots {
                    r.slots = slots;
                }
                if let Some(enabled) = update.enabled {
                    r.enabled = enabled;
                }
                if let Some(instructions) = update.special_instructions {
                    r.special_instructions = Some(instructions);
                }
                if let Some(end) = update.end {
                    r.end = Some(end);
                }
                r.next_due = r.next_due_after(now);
            }),
        );
        if !found {
            return Err(SchedulerError::ReminderNotFound(id));
        }
        if slots_changed {
            self.materializer.materialize(id)?;
        }
        self.reminders
            .get(id)
            .ok_or(SchedulerError::ReminderNotFound(id))
    }

    /// Cancel a reminder and every dose still open under it. History is
    /// retained; nothing is deleted.
    pub fn cancel_reminder(&self, id: ReminderId) -> Result<()> {
        let found = self.reminders.update(
            id,
            Box::new(|r| {
                r.status = ReminderStatus::Cancelled;
                r.enabled = false;
            }),
        );
        if !found {
            return Err(SchedulerError::ReminderNotFound(id));
        }
        for dose in self.doses.by_reminder(id) {
            if !dose.status.is_terminal() {
                self.doses.update(dose.id, Box::new(|d| d.cancel()));
            }
        }
        info!("cancelled reminder {id}");
        Ok(())
    }

    pub fn patient_reminders(&self, patient: PatientId) -> Vec<ReminderView> {
        self.reminders
            .by_patient(patient)
            .iter()
            .map(ReminderView::from_reminder)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ManualClock;
    use crate::features::reminders::DoseStatus;
    use crate::store::{MemoryPatientDirectory, MemoryStore};
    use chrono::NaiveDate;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    struct Fixture {
        store: Arc<MemoryStore>,
        patients: Arc<MemoryPatientDirectory>,
        service: ReminderService,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let patients = Arc::new(MemoryPatientDirectory::new());
        let clock = Arc::new(ManualClock::new(at(6, 0)));
        let config = SchedulerConfig::default();
        let materializer = Arc::new(DoseMaterializer::new(
            store.clone(),
            store.clone(),
            clock.clone(),
            config.clone(),
        ));
        let service = ReminderService::new(
            store.clone(),
            store.clone(),
            patients.clone(),
            materializer,
            clock,
            config,
        );
        Fixture {
            store,
            patients,
            service,
        }
    }

    fn new_reminder(patient: PatientId) -> NewReminder {
        NewReminder {
            patient_id: patient,
            medication_name: "Metformin".into(),
            dosage: "500mg".into(),
            frequency: Frequency::TwiceDaily,
            start: None,
            end: None,
            slots: None,
            special_instructions: None,
            max_attempts_per_dose: None,
            created_by: "dr-lee".into(),
        }
    }

    #[test]
    fn create_applies_defaults_and_materializes() {
        let f = fixture();
        let patient = f.patients.add("Asha Rao", "+15550100");

        let reminder = f.service.create_reminder(new_reminder(patient)).unwrap();
        assert_eq!(reminder.effective_slots().len(), 2);
        assert_eq!(reminder.doses_scheduled, 14);
        assert_eq!(reminder.next_due, Some(at(8, 0)));
        assert_eq!(reminder.max_attempts_per_dose, 3);
    }

    #[test]
    fn create_rejects_unknown_patient() {
        let f = fixture();
        let result = f.service.create_reminder(new_reminder(PatientId(42)));
        assert!(matches!(result, Err(SchedulerError::PatientNotFound(_))));
    }

    #[test]
    fn create_rejects_malformed_slot() {
        let f = fixture();
        let patient = f.patients.add("Asha Rao", "+15550100");
        let mut new = new_reminder(patient);
        new.slots = Some(vec!["8 o'clock".into()]);
        assert!(matches!(
            f.service.create_reminder(new),
            Err(SchedulerError::InvalidInput { field: "slot", .. })
        ));
    }

    #[test]
    fn update_times_rematerializes_and_recomputes_next_due() {
        let f = fixture();
        let patient = f.patients.add("Asha Rao", "+15550100");
        let reminder = f.service.create_reminder(new_reminder(patient)).unwrap();

        let updated = f
            .service
            .update_reminder(
                reminder.id,
                ReminderUpdate {
                    slots: Some(vec!["09:30".into(), "21:30".into()]),
                    ..ReminderUpdate::default()
                },
            )
            .unwrap();

        assert_eq!(updated.next_due, Some(at(9, 30)));
        // New slots materialized alongside the originals.
        assert!(updated.doses_scheduled > 14);
    }

    #[test]
    fn cancel_closes_open_doses() {
        let f = fixture();
        let patient = f.patients.add("Asha Rao", "+15550100");
        let reminder = f.service.create_reminder(new_reminder(patient)).unwrap();

        f.service.cancel_reminder(reminder.id).unwrap();

        let stored = ReminderStore::get(&*f.store, reminder.id).unwrap();
        assert_eq!(stored.status, ReminderStatus::Cancelled);
        assert!(f
            .store
            .by_reminder(reminder.id)
            .iter()
            .all(|d| d.status == DoseStatus::Cancelled));
    }

    #[test]
    fn views_carry_display_fields() {
        let f = fixture();
        let patient = f.patients.add("Asha Rao", "+15550100");
        f.service.create_reminder(new_reminder(patient)).unwrap();

        let views = f.service.patient_reminders(patient);
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].frequency, "Twice Daily");
        assert_eq!(views[0].slots, vec!["08:00", "20:00"]);
        assert_eq!(views[0].adherence_level, "Very Poor");
    }
}
