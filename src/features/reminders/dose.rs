//! Dose instances: one concrete expected dose of a reminder.
//!
//! The state machine is Scheduled → Sent → {Taken | Missed | Delayed |
//! Skipped | Cancelled}, with Scheduled → Failed on delivery errors.
//! Terminal statuses are frozen: the transition helpers refuse to touch a
//! dose once it reaches one.

use crate::store::{DoseId, ReminderId};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DoseStatus {
    Scheduled,
    Sent,
    Failed,
    Taken,
    Missed,
    Delayed,
    Skipped,
    Cancelled,
}

impl DoseStatus {
    pub fn display_name(&self) -> &'static str {
        match self {
            DoseStatus::Scheduled => "Scheduled",
            DoseStatus::Sent => "Reminder Sent",
            DoseStatus::Failed => "Failed to Send",
            DoseStatus::Taken => "Dose Taken",
            DoseStatus::Missed => "Dose Missed",
            DoseStatus::Delayed => "Dose Delayed",
            DoseStatus::Skipped => "Dose Skipped",
            DoseStatus::Cancelled => "Cancelled",
        }
    }

    /// Terminal statuses never transition again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DoseStatus::Taken | DoseStatus::Missed | DoseStatus::Skipped | DoseStatus::Cancelled
        )
    }
}

/// How the patient answered the reminder for this dose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatientResponse {
    TakenOnTime,
    TakenLate,
    Missed,
    SkippedIntentionally,
    Delayed,
    DoubleDose,
    NoResponse,
}

impl PatientResponse {
    pub fn display_name(&self) -> &'static str {
        match self {
            PatientResponse::TakenOnTime => "Taken on Time",
            PatientResponse::TakenLate => "Taken Late",
            PatientResponse::Missed => "Missed",
            PatientResponse::SkippedIntentionally => "Skipped Intentionally",
            PatientResponse::Delayed => "Delayed",
            PatientResponse::DoubleDose => "Double Dose Taken",
            PatientResponse::NoResponse => "No Response",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoseInstance {
    pub id: DoseId,
    pub reminder_id: ReminderId,
    pub scheduled_at: NaiveDateTime,
    pub sent_at: Option<NaiveDateTime>,
    pub responded_at: Option<NaiveDateTime>,
    pub status: DoseStatus,
    pub response: Option<PatientResponse>,
    /// Send attempts so far, successful or not.
    pub attempts: u32,
    /// Minutes past the slot when a taken outcome was recorded; 0 on time.
    pub minutes_late: i64,
    pub side_effects: Option<String>,
    pub created_at: NaiveDateTime,
}

impl DoseInstance {
    pub fn new(reminder_id: ReminderId, scheduled_at: NaiveDateTime, now: NaiveDateTime) -> Self {
        DoseInstance {
            id: DoseId(0),
            reminder_id,
            scheduled_at,
            sent_at: None,
            responded_at: None,
            status: DoseStatus::Scheduled,
            response: None,
            attempts: 0,
            minutes_late: 0,
            side_effects: None,
            created_at: now,
        }
    }

    /// Still waiting for a successful send.
    pub fn is_awaiting_send(&self) -> bool {
        matches!(self.status, DoseStatus::Scheduled | DoseStatus::Failed)
    }

    /// Open for a patient response (sent or not yet resolved).
    pub fn is_open(&self) -> bool {
        matches!(self.status, DoseStatus::Scheduled | DoseStatus::Sent)
    }

    pub fn is_taken(&self) -> bool {
        self.status == DoseStatus::Taken
            || matches!(
                self.response,
                Some(PatientResponse::TakenOnTime) | Some(PatientResponse::TakenLate)
            )
    }

    pub fn is_missed(&self) -> bool {
        self.status == DoseStatus::Missed || self.response == Some(PatientResponse::Missed)
    }

    /// A reminder for this dose went out.
    pub fn record_sent(&mut self, at: NaiveDateTime) {
        if self.status.is_terminal() {
            return;
        }
        self.status = DoseStatus::Sent;
        self.sent_at = Some(at);
        self.attempts += 1;
    }

    /// Delivery failed; the dose stays eligible for retry while attempts
    /// remain under the reminder's cap.
    pub fn record_send_failure(&mut self) {
        if self.status.is_terminal() {
            return;
        }
        self.status = DoseStatus::Failed;
        self.attempts += 1;
    }

    /// Patient reported the dose taken. On time means within
    /// `on_time_tolerance_minutes` of the slot in either direction.
    pub fn record_taken(&mut self, at: NaiveDateTime, on_time_tolerance_minutes: i64) {
        if self.status.is_terminal() {
            return;
        }
        let offset = (at - self.scheduled_at).num_minutes();
        self.status = DoseStatus::Taken;
        self.responded_at = Some(at);
        if offset.abs() <= on_time_tolerance_minutes {
            self.response = Some(PatientResponse::TakenOnTime);
            self.minutes_late = 0;
        } else {
            self.response = Some(PatientResponse::TakenLate);
            self.minutes_late = offset.max(0);
        }
    }

    /// Patient reported the dose missed.
    pub fn record_missed(&mut self, at: NaiveDateTime) {
        if self.status.is_terminal() {
            return;
        }
        self.status = DoseStatus::Missed;
        self.response = Some(PatientResponse::Missed);
        self.responded_at = Some(at);
    }

    pub fn cancel(&mut self) {
        if self.status.is_terminal() {
            return;
        }
        self.status = DoseStatus::Cancelled;
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

    fn dose() -> DoseInstance {
        DoseInstance::new(ReminderId(1), at(8, 0), at(6, 0))
    }

    #[test]
    fn taken_within_tolerance_is_on_time() {
        let mut d = dose();
        d.record_taken(at(8, 10), 15);
        assert_eq!(d.status, DoseStatus::Taken);
        assert_eq!(d.response, Some(PatientResponse::TakenOnTime));
        assert_eq!(d.minutes_late, 0);
    }

    #[test]
    fn taken_past_tolerance_records_minutes_late() {
        let mut d = dose();
        d.record_taken(at(8, 40), 15);
        assert_eq!(d.response, Some(PatientResponse::TakenLate));
        assert_eq!(d.minutes_late, 40);
    }

    #[test]
    fn taken_early_never_goes_negative() {
        let mut d = dose();
        // 30 minutes early: late by definition (outside tolerance) but
        // minutes_late clamps at zero.
        d.record_taken(at(7, 30), 15);
        assert_eq!(d.response, Some(PatientResponse::TakenLate));
        assert_eq!(d.minutes_late, 0);
    }

    #[test]
    fn send_failure_keeps_dose_retryable() {
        let mut d = dose();
        d.record_send_failure();
        assert_eq!(d.status, DoseStatus::Failed);
        assert_eq!(d.attempts, 1);
        assert!(d.is_awaiting_send());
    }

    #[test]
    fn terminal_status_is_frozen() {
        let mut d = dose();
        d.record_taken(at(8, 5), 15);
        let frozen = d.clone();

        d.record_missed(at(9, 0));
        d.record_sent(at(9, 0));
        d.record_send_failure();
        d.cancel();

        assert_eq!(d.status, frozen.status);
        assert_eq!(d.response, frozen.response);
        assert_eq!(d.attempts, frozen.attempts);
    }

    #[test]
    fn sent_then_missed_counts_as_missed() {
        let mut d = dose();
        d.record_sent(at(8, 0));
        d.record_missed(at(10, 0));
        assert!(d.is_missed());
        assert!(!d.is_taken());
    }
}
