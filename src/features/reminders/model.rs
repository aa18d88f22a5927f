//! Reminder entity: a recurring medication schedule with adherence counters.

use crate::features::adherence::AdherenceLevel;
use crate::store::{PatientId, ReminderId};
use chrono::{Duration, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// How often a medication is taken. The nominal daily-dose count is for
/// display and estimation only; scheduling always works off the concrete
/// time-of-day slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Frequency {
    OnceDaily,
    TwiceDaily,
    ThriceDaily,
    FourTimesDaily,
    FiveTimesDaily,
    SixTimesDaily,
    EveryOtherDay,
    Weekly,
    AsNeeded,
    Custom,
}

impl Frequency {
    pub fn display_name(&self) -> &'static str {
        match self {
            Frequency::OnceDaily => "Once Daily",
            Frequency::TwiceDaily => "Twice Daily",
            Frequency::ThriceDaily => "Three Times Daily",
            Frequency::FourTimesDaily => "Four Times Daily",
            Frequency::FiveTimesDaily => "Five Times Daily",
            Frequency::SixTimesDaily => "Six Times Daily",
            Frequency::EveryOtherDay => "Every Other Day",
            Frequency::Weekly => "Weekly",
            Frequency::AsNeeded => "As Needed",
            Frequency::Custom => "Custom Schedule",
        }
    }

    /// Nominal doses per day, for dashboards and supply estimates.
    pub fn nominal_daily_doses(&self) -> f64 {
        match self {
            Frequency::OnceDaily => 1.0,
            Frequency::TwiceDaily => 2.0,
            Frequency::ThriceDaily => 3.0,
            Frequency::FourTimesDaily => 4.0,
            Frequency::FiveTimesDaily => 5.0,
            Frequency::SixTimesDaily => 6.0,
            Frequency::EveryOtherDay => 0.5,
            Frequency::Weekly => 0.14,
            Frequency::AsNeeded | Frequency::Custom => 0.0,
        }
    }

    /// Slot set used when a reminder is created without explicit times.
    pub fn default_slots(&self) -> Vec<NaiveTime> {
        let hours: &[u32] = match self {
            Frequency::OnceDaily => &[8],
            Frequency::TwiceDaily => &[8, 20],
            Frequency::ThriceDaily => &[8, 14, 20],
            Frequency::FourTimesDaily => &[8, 12, 16, 20],
            _ => &[8],
        };
        hours.iter().map(|&h| at_hour(h)).collect()
    }
}

fn at_hour(hour: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReminderStatus {
    Active,
    Paused,
    Completed,
    Cancelled,
    Expired,
}

impl ReminderStatus {
    pub fn display_name(&self) -> &'static str {
        match self {
            ReminderStatus::Active => "Active",
            ReminderStatus::Paused => "Paused",
            ReminderStatus::Completed => "Completed",
            ReminderStatus::Cancelled => "Cancelled",
            ReminderStatus::Expired => "Expired",
        }
    }
}

/// A recurring medication schedule for one patient.
///
/// Reminders are never deleted; cancellation and expiry are status
/// transitions so adherence history stays attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reminder {
    pub id: ReminderId,
    pub patient_id: PatientId,
    pub medication_name: String,
    pub dosage: String,
    pub frequency: Frequency,
    /// Time-of-day slots; empty means "use the frequency defaults".
    pub slots: Vec<NaiveTime>,
    pub start: NaiveDateTime,
    pub end: Option<NaiveDateTime>,
    pub enabled: bool,
    pub status: ReminderStatus,
    pub special_instructions: Option<String>,
    /// Send attempt cap per dose; retries stop once reached.
    pub max_attempts_per_dose: u32,
    pub last_sent: Option<NaiveDateTime>,
    /// Cached, advisory only: the dose store is authoritative for due work.
    pub next_due: Option<NaiveDateTime>,
    pub doses_scheduled: u32,
    pub doses_taken: u32,
    pub doses_missed: u32,
    pub adherence_percentage: f64,
    pub created_by: String,
    pub created_at: NaiveDateTime,
}

impl Reminder {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        patient_id: PatientId,
        medication_name: impl Into<String>,
        dosage: impl Into<String>,
        frequency: Frequency,
        start: NaiveDateTime,
        max_attempts_per_dose: u32,
        created_by: impl Into<String>,
        created_at: NaiveDateTime,
    ) -> Self {
        Reminder {
            id: ReminderId(0),
            patient_id,
            medication_name: medication_name.into(),
            dosage: dosage.into(),
            frequency,
            slots: Vec::new(),
            start,
            end: None,
            enabled: true,
            status: ReminderStatus::Active,
            special_instructions: None,
            max_attempts_per_dose,
            last_sent: None,
            next_due: None,
            doses_scheduled: 0,
            doses_taken: 0,
            doses_missed: 0,
            adherence_percentage: 0.0,
            created_by: created_by.into(),
            created_at,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == ReminderStatus::Active && self.enabled
    }

    pub fn is_expired(&self, now: NaiveDateTime) -> bool {
        self.end.is_some_and(|end| now > end)
    }

    /// The slots this reminder actually fires on: explicit times when set,
    /// otherwise the frequency defaults, always in ascending order.
    pub fn effective_slots(&self) -> Vec<NaiveTime> {
        let mut slots = if self.slots.is_empty() {
            self.frequency.default_slots()
        } else {
            self.slots.clone()
        };
        slots.sort();
        slots.dedup();
        slots
    }

    /// Earliest slot strictly after `now` today, or the earliest slot
    /// tomorrow. None only when the reminder has no slots at all.
    pub fn next_due_after(&self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        let slots = self.effective_slots();
        let today = now.date();
        slots
            .iter()
            .map(|&slot| today.and_time(slot))
            .find(|&candidate| candidate > now)
            .or_else(|| {
                slots
                    .first()
                    .map(|&slot| (today + Duration::days(1)).and_time(slot))
            })
    }

    pub fn recalculate_adherence(&mut self) {
        self.adherence_percentage = if self.doses_scheduled > 0 {
            f64::from(self.doses_taken) / f64::from(self.doses_scheduled) * 100.0
        } else {
            0.0
        };
    }

    pub fn adherence_level(&self) -> AdherenceLevel {
        AdherenceLevel::from_percentage(self.adherence_percentage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn reminder() -> Reminder {
        Reminder::new(
            crate::store::PatientId(1),
            "Metformin",
            "500mg",
            Frequency::TwiceDaily,
            at(0, 0),
            3,
            "dr-lee",
            at(0, 0),
        )
    }

    #[test]
    fn default_slots_follow_frequency() {
        assert_eq!(
            Frequency::TwiceDaily.default_slots(),
            vec![at_hour(8), at_hour(20)]
        );
        assert_eq!(
            Frequency::ThriceDaily.default_slots(),
            vec![at_hour(8), at_hour(14), at_hour(20)]
        );
        assert_eq!(
            Frequency::FourTimesDaily.default_slots(),
            vec![at_hour(8), at_hour(12), at_hour(16), at_hour(20)]
        );
        // Irregular frequencies fall back to a single morning slot.
        assert_eq!(Frequency::Weekly.default_slots(), vec![at_hour(8)]);
    }

    #[test]
    fn next_due_picks_later_slot_today() {
        let r = reminder();
        assert_eq!(r.next_due_after(at(9, 0)), Some(at(20, 0)));
    }

    #[test]
    fn next_due_rolls_to_tomorrow() {
        let r = reminder();
        let next = r.next_due_after(at(21, 0)).unwrap();
        assert_eq!(next.date(), at(0, 0).date() + Duration::days(1));
        assert_eq!(next.time(), at_hour(8));
    }

    #[test]
    fn next_due_excludes_the_current_instant() {
        let r = reminder();
        // At exactly 20:00 the same-day slot is not "after now".
        let next = r.next_due_after(at(20, 0)).unwrap();
        assert_eq!(next.time(), at_hour(8));
    }

    #[test]
    fn adherence_percentage_tracks_counters() {
        let mut r = reminder();
        r.doses_scheduled = 8;
        r.doses_taken = 6;
        r.recalculate_adherence();
        assert_eq!(r.adherence_percentage, 75.0);

        r.doses_scheduled = 0;
        r.recalculate_adherence();
        assert_eq!(r.adherence_percentage, 0.0);
    }

    #[test]
    fn active_requires_status_and_enabled() {
        let mut r = reminder();
        assert!(r.is_active());
        r.enabled = false;
        assert!(!r.is_active());
        r.enabled = true;
        r.status = ReminderStatus::Paused;
        assert!(!r.is_active());
    }

    #[test]
    fn expiry_only_past_end_date() {
        let mut r = reminder();
        assert!(!r.is_expired(at(12, 0)));
        r.end = Some(at(10, 0));
        assert!(r.is_expired(at(12, 0)));
        assert!(!r.is_expired(at(9, 0)));
    }
}
