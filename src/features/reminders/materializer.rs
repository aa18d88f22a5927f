//! Dose materializer: expands reminders into concrete dose instances.
//!
//! Runs on reminder creation and slot changes, and opportunistically on the
//! dose tick so the rolling horizon stays full. Re-running over an
//! overlapping horizon is idempotent: a slot already materialized for the
//! same day (within the due tolerance band) is never created twice.

use crate::core::{Clock, Result, SchedulerConfig, SchedulerError};
use crate::features::reminders::{DoseInstance, Reminder, ReminderStatus};
use crate::store::{DoseStore, ReminderId, ReminderStore};
use chrono::Duration;
use log::{debug, info};
use std::sync::Arc;

pub struct DoseMaterializer {
    reminders: Arc<dyn ReminderStore>,
    doses: Arc<dyn DoseStore>,
    clock: Arc<dyn Clock>,
    config: SchedulerConfig,
}

impl DoseMaterializer {
    pub fn new(
        reminders: Arc<dyn ReminderStore>,
        doses: Arc<dyn DoseStore>,
        clock: Arc<dyn Clock>,
        config: SchedulerConfig,
    ) -> Self {
        DoseMaterializer {
            reminders,
            doses,
            clock,
            config,
        }
    }

    /// Expand one reminder over the rolling horizon. Returns the number of
    /// dose instances created. A missing reminder id is a caller bug and
    /// surfaces as NotFound.
    pub fn materialize(&self, reminder_id: ReminderId) -> Result<usize> {
        let reminder = self
            .reminders
            .get(reminder_id)
            .ok_or(SchedulerError::ReminderNotFound(reminder_id))?;
        if !reminder.is_active() {
            return Ok(0);
        }

        let now = self.clock.now();
        let created = self.expand(&reminder, now);
        if created > 0 {
            let added = created as u32;
            self.reminders.update(
                reminder_id,
                Box::new(move |r| {
                    r.doses_scheduled += added;
                    r.recalculate_adherence();
                }),
            );
            debug!(
                "materialized {} dose(s) for reminder {} ({})",
                created, reminder_id, reminder.medication_name
            );
        }
        Ok(created)
    }

    /// Keep the horizon full for every active reminder; reminders past
    /// their end date are flipped to Expired instead.
    pub fn top_up(&self) -> usize {
        let now = self.clock.now();
        let mut created = 0;
        for reminder in self.reminders.active() {
            if reminder.is_expired(now) {
                self.reminders.update(
                    reminder.id,
                    Box::new(|r| r.status = ReminderStatus::Expired),
                );
                info!(
                    "reminder {} ({}) passed its end date, marking expired",
                    reminder.id, reminder.medication_name
                );
                continue;
            }
            created += self.materialize(reminder.id).unwrap_or(0);
        }
        created
    }

    fn expand(&self, reminder: &Reminder, now: chrono::NaiveDateTime) -> usize {
        let from = reminder.start.max(now);
        let slots = reminder.effective_slots();
        let existing = self.doses.by_reminder(reminder.id);
        let band = self.config.due_tolerance_minutes;

        let mut created = 0;
        for day in 0..self.config.horizon_days {
            let date = from.date() + Duration::days(day);
            for &slot in &slots {
                let at = date.and_time(slot);
                if at <= now || at < reminder.start {
                    continue;
                }
                if reminder.end.is_some_and(|end| at >= end) {
                    continue;
                }
                let already = existing.iter().any(|d| {
                    d.scheduled_at.date() == at.date()
                        && (d.scheduled_at - at).num_minutes().abs() <= band
                });
                if already {
                    continue;
                }
                self.doses
                    .insert(DoseInstance::new(reminder.id, at, now));
                created += 1;
            }
        }
        created
    }
}
