//! Response tracker: applies inbound patient replies to open doses.
//!
//! A reply only ever matches the most recent open dose of the named
//! medication inside the response lookback window. Replies that arrive too
//! late to match anything are logged and dropped; the dose they meant will
//! age out as missed rather than flip state hours after the fact.

use crate::core::{Clock, SchedulerConfig};
use crate::features::reminders::DoseInstance;
use crate::store::{DoseId, DoseStore, PatientId, ReminderId, ReminderStore};
use chrono::{Duration, NaiveDateTime};
use log::{info, warn};
use std::sync::Arc;

pub struct ResponseTracker {
    reminders: Arc<dyn ReminderStore>,
    doses: Arc<dyn DoseStore>,
    clock: Arc<dyn Clock>,
    config: SchedulerConfig,
}

impl ResponseTracker {
    pub fn new(
        reminders: Arc<dyn ReminderStore>,
        doses: Arc<dyn DoseStore>,
        clock: Arc<dyn Clock>,
        config: SchedulerConfig,
    ) -> Self {
        ResponseTracker {
            reminders,
            doses,
            clock,
            config,
        }
    }

    /// Patient reported the medication taken, optionally at an explicit
    /// time and with side-effect notes. Returns the dose the reply was
    /// applied to, or None when no open dose matched.
    pub fn mark_taken(
        &self,
        patient_id: PatientId,
        medication: &str,
        taken_at: Option<NaiveDateTime>,
        side_effects: Option<String>,
    ) -> Option<DoseId> {
        let now = self.clock.now();
        let (dose, reminder_id) = self.matching_dose(patient_id, medication, now)?;

        let at = taken_at.unwrap_or(now);
        let tolerance = self.config.on_time_tolerance_minutes;
        self.doses.update(
            dose.id,
            Box::new(move |d| {
                d.record_taken(at, tolerance);
                if side_effects.as_deref().is_some_and(|s| !s.trim().is_empty()) {
                    d.side_effects = side_effects;
                }
            }),
        );
        self.refresh_counters(reminder_id);
        info!(
            "patient {patient_id} took {medication}: dose {} at {at}",
            dose.id
        );
        Some(dose.id)
    }

    /// Patient reported the dose missed.
    pub fn mark_missed(&self, patient_id: PatientId, medication: &str) -> Option<DoseId> {
        let now = self.clock.now();
        let (dose, reminder_id) = self.matching_dose(patient_id, medication, now)?;

        self.doses
            .update(dose.id, Box::new(move |d| d.record_missed(now)));
        self.refresh_counters(reminder_id);
        info!("patient {patient_id} missed {medication}: dose {}", dose.id);
        Some(dose.id)
    }

    /// The most recent open dose of the named medication whose slot is
    /// inside the lookback window. Doses still in the future only match
    /// once a reminder for them went out.
    fn matching_dose(
        &self,
        patient_id: PatientId,
        medication: &str,
        now: NaiveDateTime,
    ) -> Option<(DoseInstance, ReminderId)> {
        let cutoff = now - Duration::hours(self.config.response_lookback_hours);
        let mut best: Option<(DoseInstance, ReminderId)> = None;

        for reminder in self.reminders.by_patient(patient_id) {
            if !reminder.medication_name.eq_ignore_ascii_case(medication) {
                continue;
            }
            for dose in self.doses.by_reminder(reminder.id) {
                if !dose.is_open() || dose.scheduled_at < cutoff {
                    continue;
                }
                if dose.scheduled_at > now && dose.sent_at.is_none() {
                    continue;
                }
                if best
                    .as_ref()
                    .map_or(true, |(b, _)| dose.scheduled_at > b.scheduled_at)
                {
                    best = Some((dose, reminder.id));
                }
            }
        }

        if best.is_none() {
            warn!(
                "no open dose of {medication} for patient {patient_id} within \
                 the last {}h; reply dropped",
                self.config.response_lookback_hours
            );
        }
        best
    }

    /// Recompute the reminder's lifetime counters from its dose history.
    fn refresh_counters(&self, reminder_id: ReminderId) {
        let doses = self.doses.by_reminder(reminder_id);
        let scheduled = doses.len() as u32;
        let taken = doses.iter().filter(|d| d.is_taken()).count() as u32;
        let missed = doses.iter().filter(|d| d.is_missed()).count() as u32;

        self.reminders.update(
            reminder_id,
            Box::new(move |r| {
                r.doses_scheduled = scheduled;
                r.doses_taken = taken;
                r.doses_missed = missed;
                r.recalculate_adherence();
            }),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ManualClock;
    use crate::features::reminders::{DoseStatus, Frequency, PatientResponse, Reminder};
    use crate::store::MemoryStore;
    use chrono::NaiveDate;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    struct Fixture {
        store: Arc<MemoryStore>,
        clock: Arc<ManualClock>,
        tracker: ResponseTracker,
    }

    fn fixture(now: NaiveDateTime) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(now));
        let tracker = ResponseTracker::new(
            store.clone(),
            store.clone(),
            clock.clone(),
            SchedulerConfig::default(),
        );
        Fixture {
            store,
            clock,
            tracker,
        }
    }

    fn seed_reminder(store: &MemoryStore, patient: PatientId, name: &str) -> ReminderId {
        ReminderStore::insert(
            store,
            Reminder::new(
                patient,
                name,
                "500mg",
                Frequency::TwiceDaily,
                at(0, 0),
                3,
                "dr-lee",
                at(0, 0),
            ),
        )
        .id
    }

    fn seed_sent_dose(store: &MemoryStore, reminder: ReminderId, slot: NaiveDateTime) -> DoseId {
        let mut dose = DoseInstance::new(reminder, slot, at(0, 0));
        dose.record_sent(slot);
        DoseStore::insert(store, dose).id
    }

    #[test]
    fn taken_reply_matches_the_most_recent_open_dose() {
        let patient = PatientId(1);
        let f = fixture(at(12, 30));
        let reminder = seed_reminder(&f.store, patient, "Metformin");
        seed_sent_dose(&f.store, reminder, at(8, 0));
        let noon = seed_sent_dose(&f.store, reminder, at(12, 0));

        let matched = f.tracker.mark_taken(patient, "Metformin", None, None);
        assert_eq!(matched, Some(noon));

        let dose = DoseStore::get(&*f.store, noon).unwrap();
        assert_eq!(dose.status, DoseStatus::Taken);
        assert_eq!(dose.response, Some(PatientResponse::TakenLate));
        assert_eq!(dose.minutes_late, 30);
    }

    #[test]
    fn medication_name_matching_is_case_insensitive() {
        let patient = PatientId(1);
        let f = fixture(at(8, 10));
        let reminder = seed_reminder(&f.store, patient, "Metformin");
        let dose = seed_sent_dose(&f.store, reminder, at(8, 0));

        assert_eq!(
            f.tracker.mark_taken(patient, "METFORMIN", None, None),
            Some(dose)
        );
    }

    #[test]
    fn stale_replies_are_dropped() {
        let patient = PatientId(1);
        let f = fixture(at(8, 10));
        let reminder = seed_reminder(&f.store, patient, "Metformin");
        let dose = seed_sent_dose(&f.store, reminder, at(8, 0));

        // Five hours later the 4-hour lookback has closed.
        f.clock.set(at(13, 10));
        assert_eq!(f.tracker.mark_taken(patient, "Metformin", None, None), None);
        assert_eq!(
            DoseStore::get(&*f.store, dose).unwrap().status,
            DoseStatus::Sent
        );
    }

    #[test]
    fn unsent_future_doses_never_match() {
        let patient = PatientId(1);
        let f = fixture(at(19, 0));
        let reminder = seed_reminder(&f.store, patient, "Metformin");
        // Tonight's dose is materialized but no reminder has gone out.
        DoseStore::insert(&*f.store, DoseInstance::new(reminder, at(20, 0), at(0, 0)));

        assert_eq!(f.tracker.mark_taken(patient, "Metformin", None, None), None);
    }

    #[test]
    fn marking_updates_reminder_counters() {
        let patient = PatientId(1);
        let f = fixture(at(12, 5));
        let reminder = seed_reminder(&f.store, patient, "Metformin");
        seed_sent_dose(&f.store, reminder, at(8, 0));
        seed_sent_dose(&f.store, reminder, at(12, 0));

        f.tracker.mark_taken(patient, "Metformin", None, None);
        let stored = ReminderStore::get(&*f.store, reminder).unwrap();
        assert_eq!(stored.doses_scheduled, 2);
        assert_eq!(stored.doses_taken, 1);
        assert_eq!(stored.adherence_percentage, 50.0);
    }

    #[test]
    fn missed_reply_records_the_outcome() {
        let patient = PatientId(1);
        let f = fixture(at(9, 0));
        let reminder = seed_reminder(&f.store, patient, "Metformin");
        let dose = seed_sent_dose(&f.store, reminder, at(8, 0));

        assert_eq!(f.tracker.mark_missed(patient, "Metformin"), Some(dose));
        let stored = DoseStore::get(&*f.store, dose).unwrap();
        assert_eq!(stored.status, DoseStatus::Missed);
        assert_eq!(stored.response, Some(PatientResponse::Missed));

        let reminder = ReminderStore::get(&*f.store, reminder).unwrap();
        assert_eq!(reminder.doses_missed, 1);
    }

    #[test]
    fn side_effects_are_attached_to_the_dose() {
        let patient = PatientId(1);
        let f = fixture(at(8, 10));
        let reminder = seed_reminder(&f.store, patient, "Metformin");
        let dose = seed_sent_dose(&f.store, reminder, at(8, 0));

        f.tracker
            .mark_taken(patient, "Metformin", None, Some("mild nausea".into()));
        assert_eq!(
            DoseStore::get(&*f.store, dose).unwrap().side_effects.as_deref(),
            Some("mild nausea")
        );
    }
}
