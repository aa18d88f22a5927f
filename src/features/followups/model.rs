//! Follow-up entity: a one-shot, visit-triggered patient check-in.

use crate::core::SchedulerError;
use crate::store::{FollowUpId, PatientId};
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Kind of clinical visit that triggered the follow-up. Each carries the
/// default delay between the visit and the check-in message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisitType {
    RoutineCheckup,
    NewMedication,
    PostSurgery,
    ChronicCare,
    EmergencyFollowUp,
    LabResults,
    WellnessCheck,
}

impl VisitType {
    pub const ALL: [VisitType; 7] = [
        VisitType::RoutineCheckup,
        VisitType::NewMedication,
        VisitType::PostSurgery,
        VisitType::ChronicCare,
        VisitType::EmergencyFollowUp,
        VisitType::LabResults,
        VisitType::WellnessCheck,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            VisitType::RoutineCheckup => "Routine Checkup",
            VisitType::NewMedication => "New Medication",
            VisitType::PostSurgery => "Post Surgery",
            VisitType::ChronicCare => "Chronic Care",
            VisitType::EmergencyFollowUp => "Emergency Follow-up",
            VisitType::LabResults => "Lab Results",
            VisitType::WellnessCheck => "Wellness Check",
        }
    }

    /// Hours between the visit and the scheduled check-in.
    pub fn default_delay_hours(&self) -> i64 {
        match self {
            VisitType::RoutineCheckup => 24,
            VisitType::NewMedication => 24,
            VisitType::PostSurgery => 12,
            VisitType::ChronicCare => 72,
            VisitType::EmergencyFollowUp => 6,
            VisitType::LabResults => 48,
            VisitType::WellnessCheck => 168,
        }
    }

    /// Stable identifier used as the template id on sent follow-ups.
    pub fn as_str(&self) -> &'static str {
        match self {
            VisitType::RoutineCheckup => "ROUTINE_CHECKUP",
            VisitType::NewMedication => "NEW_MEDICATION",
            VisitType::PostSurgery => "POST_SURGERY",
            VisitType::ChronicCare => "CHRONIC_CARE",
            VisitType::EmergencyFollowUp => "EMERGENCY_FOLLOWUP",
            VisitType::LabResults => "LAB_RESULTS",
            VisitType::WellnessCheck => "WELLNESS_CHECK",
        }
    }
}

impl FromStr for VisitType {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VisitType::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                SchedulerError::invalid_input("visit_type", format!("unknown visit type {s:?}"))
            })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowUp {
    pub id: FollowUpId,
    pub patient_id: PatientId,
    pub visit_type: VisitType,
    pub visit_at: NaiveDateTime,
    pub scheduled_at: NaiveDateTime,
    pub sent: bool,
    pub sent_at: Option<NaiveDateTime>,
    pub responded: bool,
    pub responded_at: Option<NaiveDateTime>,
    /// Free-text classification of the patient's reply.
    pub response_note: Option<String>,
    /// Set when a send failed; blocks reselection until an operator resends.
    pub delivery_failed: bool,
    pub escalated: bool,
    pub escalated_at: Option<NaiveDateTime>,
    pub escalation_reason: Option<String>,
    pub template_used: Option<String>,
    pub created_by: String,
    pub created_at: NaiveDateTime,
}

impl FollowUp {
    pub fn new(
        patient_id: PatientId,
        visit_type: VisitType,
        visit_at: NaiveDateTime,
        delay_hours: i64,
        created_by: impl Into<String>,
    ) -> Self {
        FollowUp {
            id: FollowUpId(0),
            patient_id,
            visit_type,
            visit_at,
            scheduled_at: visit_at + Duration::hours(delay_hours),
            sent: false,
            sent_at: None,
            responded: false,
            responded_at: None,
            response_note: None,
            delivery_failed: false,
            escalated: false,
            escalated_at: None,
            escalation_reason: None,
            template_used: None,
            created_by: created_by.into(),
            created_at: visit_at,
        }
    }

    pub fn is_overdue(&self, now: NaiveDateTime) -> bool {
        !self.sent && now > self.scheduled_at
    }

    /// Sent, unanswered, not yet escalated, and past the grace window.
    pub fn needs_escalation(&self, now: NaiveDateTime, grace_hours: i64) -> bool {
        match self.sent_at {
            Some(sent_at) if self.sent && !self.responded && !self.escalated => {
                now > sent_at + Duration::hours(grace_hours)
            }
            _ => false,
        }
    }

    pub fn record_sent(&mut self, at: NaiveDateTime) {
        self.sent = true;
        self.sent_at = Some(at);
        self.delivery_failed = false;
        self.template_used = Some(self.visit_type.as_str().to_string());
    }

    pub fn record_send_failure(&mut self) {
        self.delivery_failed = true;
    }

    pub fn record_response(&mut self, at: NaiveDateTime, note: Option<String>) {
        self.responded = true;
        if self.responded_at.is_none() {
            self.responded_at = Some(at);
        }
        if note.is_some() {
            self.response_note = note;
        }
    }

    /// Mark escalated; returns false when the flag was already set so the
    /// monitor fires at most once per follow-up.
    pub fn escalate(&mut self, at: NaiveDateTime, reason: &str) -> bool {
        if self.escalated {
            return false;
        }
        self.escalated = true;
        self.escalated_at = Some(at);
        self.escalation_reason = Some(reason.to_string());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn follow_up() -> FollowUp {
        FollowUp::new(
            PatientId(1),
            VisitType::PostSurgery,
            at(10, 9),
            VisitType::PostSurgery.default_delay_hours(),
            "dr-lee",
        )
    }

    #[test]
    fn post_surgery_schedules_twelve_hours_out() {
        let f = follow_up();
        assert_eq!(f.scheduled_at, at(10, 21));
    }

    #[test]
    fn overdue_when_unsent_past_schedule() {
        let f = follow_up();
        assert!(!f.is_overdue(at(10, 21)));
        assert!(f.is_overdue(at(10, 22)));

        let mut sent = follow_up();
        sent.record_sent(at(10, 21));
        assert!(!sent.is_overdue(at(10, 22)));
    }

    #[test]
    fn escalation_needs_sent_unanswered_and_grace_elapsed() {
        let mut f = follow_up();
        assert!(!f.needs_escalation(at(14, 0), 48));

        f.record_sent(at(10, 21));
        assert!(!f.needs_escalation(at(12, 21), 48));
        assert!(f.needs_escalation(at(12, 22), 48));

        let mut responded = f.clone();
        responded.record_response(at(11, 0), None);
        assert!(!responded.needs_escalation(at(13, 0), 48));

        f.escalate(at(12, 22), "No response after 48 hours");
        assert!(!f.needs_escalation(at(13, 0), 48));
    }

    #[test]
    fn escalate_fires_once() {
        let mut f = follow_up();
        f.record_sent(at(10, 21));
        assert!(f.escalate(at(12, 22), "No response after 48 hours"));
        assert!(!f.escalate(at(12, 23), "No response after 48 hours"));
        assert_eq!(f.escalated_at, Some(at(12, 22)));
    }

    #[test]
    fn visit_type_parses_from_wire_strings() {
        assert_eq!(
            "POST_SURGERY".parse::<VisitType>().unwrap(),
            VisitType::PostSurgery
        );
        assert_eq!(
            "lab_results".parse::<VisitType>().unwrap(),
            VisitType::LabResults
        );
        assert!("HOUSE_CALL".parse::<VisitType>().is_err());
    }

    #[test]
    fn successful_resend_clears_delivery_failure() {
        let mut f = follow_up();
        f.record_send_failure();
        assert!(f.delivery_failed);
        f.record_sent(at(10, 22));
        assert!(!f.delivery_failed);
        assert_eq!(f.template_used.as_deref(), Some("POST_SURGERY"));
    }
}
