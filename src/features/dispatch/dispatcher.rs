//! Dispatcher: turns due work into rendered messages and records outcomes.
//!
//! Each processing pass is a bounded batch. A single item's failure —
//! render, send or store write — is logged and the batch continues; nothing
//! propagates to the tick driver.

use crate::core::{Clock, Result, SchedulerConfig, SchedulerError};
use crate::features::dispatch::{templates, DueWorkSelector};
use crate::features::followups::FollowUp;
use crate::features::reminders::DoseInstance;
use crate::messaging::MessageSender;
use crate::store::{
    DoseStore, FollowUpStore, PatientDirectory, ReminderId, ReminderStore,
};
use log::{debug, error, info, warn};
use std::collections::HashSet;
use std::sync::Arc;

/// What one processing pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub selected: usize,
    pub sent: usize,
    pub failed: usize,
}

pub struct Dispatcher {
    reminders: Arc<dyn ReminderStore>,
    doses: Arc<dyn DoseStore>,
    follow_ups: Arc<dyn FollowUpStore>,
    patients: Arc<dyn PatientDirectory>,
    sender: Arc<dyn MessageSender>,
    selector: DueWorkSelector,
    clock: Arc<dyn Clock>,
    #[allow(dead_code)]
    config: SchedulerConfig,
}

impl Dispatcher {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        reminders: Arc<dyn ReminderStore>,
        doses: Arc<dyn DoseStore>,
        follow_ups: Arc<dyn FollowUpStore>,
        patients: Arc<dyn PatientDirectory>,
        sender: Arc<dyn MessageSender>,
        selector: DueWorkSelector,
        clock: Arc<dyn Clock>,
        config: SchedulerConfig,
    ) -> Self {
        Dispatcher {
            reminders,
            doses,
            follow_ups,
            patients,
            sender,
            selector,
            clock,
            config,
        }
    }

    /// Process every due dose. Also usable as the manual "trigger now"
    /// hook for operational testing.
    pub async fn process_due_doses(&self) -> BatchOutcome {
        let due = self.selector.due_doses();
        let mut outcome = BatchOutcome {
            selected: due.len(),
            ..BatchOutcome::default()
        };
        if !due.is_empty() {
            debug!("processing {} due dose(s)", due.len());
        }

        let mut touched: HashSet<ReminderId> = HashSet::new();
        for dose in due {
            touched.insert(dose.reminder_id);
            match self.dispatch_dose(&dose).await {
                Ok(true) => outcome.sent += 1,
                Ok(false) => outcome.failed += 1,
                Err(e) => {
                    error!("dose {} dispatch error: {e}", dose.id);
                    outcome.failed += 1;
                }
            }
        }

        // Refresh the advisory next-due cache for every reminder touched.
        let now = self.clock.now();
        for reminder_id in touched {
            self.reminders.update(
                reminder_id,
                Box::new(move |r| r.next_due = r.next_due_after(now)),
            );
        }
        outcome
    }

    /// Process every due follow-up. Failed sends are parked for operator
    /// resend; only doses get automatic retries.
    pub async fn process_due_follow_ups(&self) -> BatchOutcome {
        let due = self.selector.due_follow_ups();
        let mut outcome = BatchOutcome {
            selected: due.len(),
            ..BatchOutcome::default()
        };
        if !due.is_empty() {
            debug!("processing {} due follow-up(s)", due.len());
        }

        for follow_up in due {
            match self.dispatch_follow_up(&follow_up).await {
                Ok(true) => outcome.sent += 1,
                Ok(false) => outcome.failed += 1,
                Err(e) => {
                    error!("follow-up {} dispatch error: {e}", follow_up.id);
                    outcome.failed += 1;
                }
            }
        }
        outcome
    }

    async fn dispatch_dose(&self, dose: &DoseInstance) -> Result<bool> {
        // A dangling reminder reference is a bug upstream, not a user error.
        let reminder = self
            .reminders
            .get(dose.reminder_id)
            .ok_or(SchedulerError::ReminderNotFound(dose.reminder_id))?;
        let patient = self
            .patients
            .find(reminder.patient_id)
            .ok_or(SchedulerError::PatientNotFound(reminder.patient_id))?;

        let body = templates::dose_reminder(&patient.name, &reminder, dose.scheduled_at);
        let delivered = self.sender.send(&patient.contact, &patient.name, &body).await;
        let now = self.clock.now();

        if delivered {
            self.doses
                .update(dose.id, Box::new(move |d| d.record_sent(now)));
            self.reminders.update(
                reminder.id,
                Box::new(move |r| r.last_sent = Some(now)),
            );
            info!(
                "dose reminder sent to {} for {} (attempt {})",
                patient.name,
                reminder.medication_name,
                dose.attempts + 1
            );
        } else {
            self.doses
                .update(dose.id, Box::new(|d| d.record_send_failure()));
            warn!(
                "dose reminder to {} for {} failed (attempt {} of {})",
                patient.name,
                reminder.medication_name,
                dose.attempts + 1,
                reminder.max_attempts_per_dose
            );
        }
        Ok(delivered)
    }

    async fn dispatch_follow_up(&self, follow_up: &FollowUp) -> Result<bool> {
        let patient = self
            .patients
            .find(follow_up.patient_id)
            .ok_or(SchedulerError::PatientNotFound(follow_up.patient_id))?;

        let body = templates::follow_up(follow_up.visit_type, &patient.name);
        let delivered = self.sender.send(&patient.contact, &patient.name, &body).await;
        let now = self.clock.now();

        self.follow_ups.update(
            follow_up.id,
            Box::new(move |f| {
                if delivered {
                    f.record_sent(now);
                } else {
                    f.record_send_failure();
                }
            }),
        );
        if delivered {
            info!(
                "{} follow-up sent to {}",
                follow_up.visit_type.display_name(),
                patient.name
            );
        } else {
            warn!(
                "follow-up {} to {} failed to deliver; held for operator resend",
                follow_up.id, patient.name
            );
        }
        Ok(delivered)
    }
}
