//! Due-work selection.
//!
//! Pure queries over the stores: which doses and which follow-ups should a
//! tick process right now. Already-sent doses are excluded by status, so a
//! dose is never reselected for the same slot once delivered.

use crate::core::{Clock, SchedulerConfig};
use crate::features::followups::FollowUp;
use crate::features::reminders::DoseInstance;
use crate::store::{DoseStore, FollowUpStore, ReminderStore};
use std::sync::Arc;

pub struct DueWorkSelector {
    reminders: Arc<dyn ReminderStore>,
    doses: Arc<dyn DoseStore>,
    follow_ups: Arc<dyn FollowUpStore>,
    clock: Arc<dyn Clock>,
    config: SchedulerConfig,
}

impl DueWorkSelector {
    pub fn new(
        reminders: Arc<dyn ReminderStore>,
        doses: Arc<dyn DoseStore>,
        follow_ups: Arc<dyn FollowUpStore>,
        clock: Arc<dyn Clock>,
        config: SchedulerConfig,
    ) -> Self {
        DueWorkSelector {
            reminders,
            doses,
            follow_ups,
            clock,
            config,
        }
    }

    /// Doses to attempt this tick: Scheduled doses inside the tolerance
    /// band around their slot, plus overdue Scheduled/Failed doses with
    /// send attempts remaining (retry candidates).
    pub fn due_doses(&self) -> Vec<DoseInstance> {
        let now = self.clock.now();
        let tolerance = self.config.due_tolerance_minutes;

        self.doses
            .pending()
            .into_iter()
            .filter(|dose| {
                let max_attempts = self
                    .reminders
                    .get(dose.reminder_id)
                    .map(|r| r.max_attempts_per_dose)
                    .unwrap_or(self.config.default_max_attempts);
                if dose.attempts >= max_attempts {
                    return false;
                }
                let offset_minutes = (dose.scheduled_at - now).num_minutes();
                offset_minutes.abs() <= tolerance || now > dose.scheduled_at
            })
            .collect()
    }

    /// Follow-ups to send this tick: unsent, past their scheduled time,
    /// and not parked by a previous delivery failure.
    pub fn due_follow_ups(&self) -> Vec<FollowUp> {
        let now = self.clock.now();
        let mut due: Vec<FollowUp> = self
            .follow_ups
            .unsent()
            .into_iter()
            .filter(|f| !f.delivery_failed && f.scheduled_at <= now)
            .collect();
        due.sort_by_key(|f| f.scheduled_at);
        due
    }
}
