//! Escalation monitor: urgent notice for follow-ups nobody answered.
//!
//! Runs on its own slower tick over the same follow-up store. Each
//! follow-up escalates at most once; the escalated flag guards repeat
//! ticks, and the escalation send itself is never retried.

use crate::core::{Clock, SchedulerConfig};
use crate::features::dispatch::templates;
use crate::messaging::MessageSender;
use crate::store::{FollowUpStore, PatientDirectory};
use log::{error, info, warn};
use std::sync::Arc;

pub const ESCALATION_REASON: &str = "No response after 48 hours";

pub struct EscalationMonitor {
    follow_ups: Arc<dyn FollowUpStore>,
    patients: Arc<dyn PatientDirectory>,
    sender: Arc<dyn MessageSender>,
    clock: Arc<dyn Clock>,
    config: SchedulerConfig,
}

impl EscalationMonitor {
    pub fn new(
        follow_ups: Arc<dyn FollowUpStore>,
        patients: Arc<dyn PatientDirectory>,
        sender: Arc<dyn MessageSender>,
        clock: Arc<dyn Clock>,
        config: SchedulerConfig,
    ) -> Self {
        EscalationMonitor {
            follow_ups,
            patients,
            sender,
            clock,
            config,
        }
    }

    /// One escalation sweep. Returns the number of follow-ups escalated.
    /// Per-item failures are logged and never abort the sweep.
    pub async fn run_once(&self) -> usize {
        let now = self.clock.now();
        let grace = self.config.escalation_grace_hours;
        let mut escalated = 0;

        for follow_up in self.follow_ups.awaiting_response() {
            if !follow_up.needs_escalation(now, grace) {
                continue;
            }
            let patient = match self.patients.find(follow_up.patient_id) {
                Some(patient) => patient,
                None => {
                    error!(
                        "follow-up {} references unknown patient {}",
                        follow_up.id, follow_up.patient_id
                    );
                    continue;
                }
            };

            let body = templates::escalation(&patient.name);
            let delivered = self.sender.send(&patient.contact, &patient.name, &body).await;
            if !delivered {
                // Escalation is one-shot: record it even when delivery
                // failed so the patient is not paged on every sweep.
                warn!(
                    "escalation message for follow-up {} to {} failed to deliver",
                    follow_up.id, patient.name
                );
            }

            let at = self.clock.now();
            self.follow_ups.update(
                follow_up.id,
                Box::new(move |f| {
                    f.escalate(at, ESCALATION_REASON);
                }),
            );
            info!("escalated follow-up {} for {}", follow_up.id, patient.name);
            escalated += 1;
        }
        escalated
    }
}
