//! Follow-up management operations consumed by the web layer.

use crate::core::{Clock, Result, SchedulerConfig, SchedulerError};
use crate::features::dispatch::templates;
use crate::features::followups::{FollowUp, VisitType};
use crate::messaging::MessageSender;
use crate::store::{FollowUpId, FollowUpStore, PatientDirectory, PatientId};
use chrono::NaiveDateTime;
use log::{info, warn};
use serde::Serialize;
use std::sync::Arc;

/// Display-ready projection of a follow-up.
#[derive(Debug, Clone, Serialize)]
pub struct FollowUpView {
    pub id: FollowUpId,
    pub visit_type: &'static str,
    pub visit_at: NaiveDateTime,
    pub scheduled_at: NaiveDateTime,
    pub sent: bool,
    pub responded: bool,
    pub escalated: bool,
    pub overdue: bool,
}

pub struct FollowUpService {
    follow_ups: Arc<dyn FollowUpStore>,
    patients: Arc<dyn PatientDirectory>,
    sender: Arc<dyn MessageSender>,
    clock: Arc<dyn Clock>,
    #[allow(dead_code)]
    config: SchedulerConfig,
}

impl FollowUpService {
    pub fn new(
        follow_ups: Arc<dyn FollowUpStore>,
        patients: Arc<dyn PatientDirectory>,
        sender: Arc<dyn MessageSender>,
        clock: Arc<dyn Clock>,
        config: SchedulerConfig,
    ) -> Self {
        FollowUpService {
            follow_ups,
            patients,
            sender,
            clock,
            config,
        }
    }

    /// Schedule a check-in after a visit. The delay defaults from the visit
    /// type unless a custom delay is given.
    pub fn schedule(
        &self,
        patient_id: PatientId,
        visit_type: VisitType,
        custom_delay_hours: Option<i64>,
        created_by: &str,
    ) -> Result<FollowUp> {
        let patient = self
            .patients
            .find(patient_id)
            .ok_or(SchedulerError::PatientNotFound(patient_id))?;
        if custom_delay_hours.is_some_and(|h| h < 0) {
            return Err(SchedulerError::invalid_input(
                "custom_delay_hours",
                "must not be negative",
            ));
        }

        let now = self.clock.now();
        let delay = custom_delay_hours.unwrap_or_else(|| visit_type.default_delay_hours());
        let follow_up = self
            .follow_ups
            .insert(FollowUp::new(patient_id, visit_type, now, delay, created_by));

        info!(
            "scheduled {} follow-up {} for {} at {}",
            visit_type.display_name(),
            follow_up.id,
            patient.name,
            follow_up.scheduled_at
        );
        Ok(follow_up)
    }

    /// Operational hook: create a follow-up due now and dispatch it in the
    /// same call. A failed send is recorded on the record (delivery_failed),
    /// not returned as an error.
    pub async fn send_immediate(
        &self,
        patient_id: PatientId,
        visit_type: VisitType,
        created_by: &str,
    ) -> Result<FollowUp> {
        let patient = self
            .patients
            .find(patient_id)
            .ok_or(SchedulerError::PatientNotFound(patient_id))?;

        let now = self.clock.now();
        let follow_up =
            self.follow_ups
                .insert(FollowUp::new(patient_id, visit_type, now, 0, created_by));

        let body = templates::follow_up(visit_type, &patient.name);
        let delivered = self.sender.send(&patient.contact, &patient.name, &body).await;
        let sent_at = self.clock.now();
        self.follow_ups.update(
            follow_up.id,
            Box::new(move |f| {
                if delivered {
                    f.record_sent(sent_at);
                } else {
                    f.record_send_failure();
                }
            }),
        );
        if delivered {
            info!("immediate follow-up {} sent to {}", follow_up.id, patient.name);
        } else {
            warn!(
                "immediate follow-up {} to {} failed to deliver",
                follow_up.id, patient.name
            );
        }
        self.follow_ups
            .get(follow_up.id)
            .ok_or(SchedulerError::FollowUpNotFound(follow_up.id))
    }

    /// Apply an inbound patient reply: every sent-and-unanswered follow-up
    /// for the patient is marked responded. Returns how many were closed.
    pub fn mark_responded(&self, patient_id: PatientId, note: &str) -> usize {
        let now = self.clock.now();
        let mut closed = 0;
        for follow_up in self.follow_ups.awaiting_response() {
            if follow_up.patient_id != patient_id {
                continue;
            }
            let note = Some(note.to_string()).filter(|n| !n.trim().is_empty());
            self.follow_ups.update(
                follow_up.id,
                Box::new(move |f| f.record_response(now, note)),
            );
            closed += 1;
        }
        info!("patient {patient_id} responded; closed {closed} follow-up(s)");
        closed
    }

    /// Move a follow-up to a new time, resetting its sent state so the
    /// selector picks it up again.
    pub fn reschedule(&self, id: FollowUpId, at: NaiveDateTime) -> Result<FollowUp> {
        let found = self.follow_ups.update(
            id,
            Box::new(move |f| {
                f.scheduled_at = at;
                f.sent = false;
                f.sent_at = None;
                f.delivery_failed = false;
            }),
        );
        if !found {
            return Err(SchedulerError::FollowUpNotFound(id));
        }
        self.follow_ups
            .get(id)
            .ok_or(SchedulerError::FollowUpNotFound(id))
    }

    /// Clear the delivery-failed flag so the next follow-up tick retries
    /// the send. Failed follow-ups are never retried automatically.
    pub fn resend(&self, id: FollowUpId) -> Result<FollowUp> {
        let found = self
            .follow_ups
            .update(id, Box::new(|f| f.delivery_failed = false));
        if !found {
            return Err(SchedulerError::FollowUpNotFound(id));
        }
        self.follow_ups
            .get(id)
            .ok_or(SchedulerError::FollowUpNotFound(id))
    }

    /// Housekeeping: drop a follow-up outright.
    pub fn cancel(&self, id: FollowUpId) -> Result<()> {
        if self.follow_ups.remove(id) {
            Ok(())
        } else {
            Err(SchedulerError::FollowUpNotFound(id))
        }
    }

    pub fn patient_follow_ups(&self, patient_id: PatientId) -> Vec<FollowUpView> {
        let now = self.clock.now();
        self.follow_ups
            .by_patient(patient_id)
            .iter()
            .map(|f| FollowUpView {
                id: f.id,
                visit_type: f.visit_type.display_name(),
                visit_at: f.visit_at,
                scheduled_at: f.scheduled_at,
                sent: f.sent,
                responded: f.responded,
                escalated: f.escalated,
                overdue: f.is_overdue(now),
            })
            .collect()
    }
}
