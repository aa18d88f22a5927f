//! Adherence reports and dashboard aggregates.
//!
//! Read-only rollups over the stores. Nothing here mutates a record; the
//! per-reminder counters are maintained by the response tracker and the
//! materializer, and the aggregator recomputes windowed figures from the
//! dose history on every call.

use crate::core::{Clock, SchedulerConfig};
use crate::store::{DoseStore, FollowUpStore, PatientId, ReminderId, ReminderStore};
use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use std::sync::Arc;

/// Coarse adherence band used on dashboards and in clinician summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AdherenceLevel {
    Excellent,
    Good,
    Fair,
    Poor,
    VeryPoor,
}

impl AdherenceLevel {
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage >= 90.0 {
            AdherenceLevel::Excellent
        } else if percentage >= 80.0 {
            AdherenceLevel::Good
        } else if percentage >= 70.0 {
            AdherenceLevel::Fair
        } else if percentage >= 50.0 {
            AdherenceLevel::Poor
        } else {
            AdherenceLevel::VeryPoor
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            AdherenceLevel::Excellent => "Excellent",
            AdherenceLevel::Good => "Good",
            AdherenceLevel::Fair => "Fair",
            AdherenceLevel::Poor => "Poor",
            AdherenceLevel::VeryPoor => "Very Poor",
        }
    }
}

/// Windowed adherence for one medication.
#[derive(Debug, Clone, Serialize)]
pub struct MedicationAdherence {
    pub reminder_id: ReminderId,
    pub medication_name: String,
    pub dosage: String,
    pub scheduled: u32,
    pub taken: u32,
    pub missed: u32,
    pub adherence_percentage: f64,
    pub level: &'static str,
}

/// Per-patient adherence over a trailing window.
#[derive(Debug, Clone, Serialize)]
pub struct PatientAdherenceReport {
    pub patient_id: PatientId,
    pub window_start: NaiveDateTime,
    pub window_end: NaiveDateTime,
    pub scheduled: u32,
    pub taken: u32,
    pub missed: u32,
    pub adherence_percentage: f64,
    pub level: &'static str,
    pub medications: Vec<MedicationAdherence>,
}

/// Scheduler-wide counters for the operations dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub active_reminders: usize,
    pub due_now: usize,
    pub sent_today: usize,
    pub taken_today: usize,
    pub missed_today: usize,
}

/// Follow-up pipeline counters.
#[derive(Debug, Clone, Serialize)]
pub struct FollowUpStats {
    pub total_scheduled: usize,
    pub sent_today: usize,
    pub pending: usize,
    pub escalated_today: usize,
    /// Percentage of sent follow-ups answered, over all time.
    pub response_rate: f64,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn percentage(taken: u32, scheduled: u32) -> f64 {
    if scheduled > 0 {
        round2(f64::from(taken) / f64::from(scheduled) * 100.0)
    } else {
        0.0
    }
}

pub struct AdherenceAggregator {
    reminders: Arc<dyn ReminderStore>,
    doses: Arc<dyn DoseStore>,
    follow_ups: Arc<dyn FollowUpStore>,
    clock: Arc<dyn Clock>,
    config: SchedulerConfig,
}

impl AdherenceAggregator {
    pub fn new(
        reminders: Arc<dyn ReminderStore>,
        doses: Arc<dyn DoseStore>,
        follow_ups: Arc<dyn FollowUpStore>,
        clock: Arc<dyn Clock>,
        config: SchedulerConfig,
    ) -> Self {
        AdherenceAggregator {
            reminders,
            doses,
            follow_ups,
            clock,
            config,
        }
    }

    /// Adherence for one patient over the trailing `days` window, with a
    /// per-medication breakdown. Only doses whose slot falls inside the
    /// window count; open doses in the window count as scheduled but
    /// neither taken nor missed.
    pub fn patient_report(&self, patient_id: PatientId, days: i64) -> PatientAdherenceReport {
        let window_end = self.clock.now();
        let window_start = window_end - Duration::days(days.max(0));

        let mut medications = Vec::new();
        let mut scheduled = 0;
        let mut taken = 0;
        let mut missed = 0;

        for reminder in self.reminders.by_patient(patient_id) {
            let doses: Vec<_> = self
                .doses
                .by_reminder(reminder.id)
                .into_iter()
                .filter(|d| d.scheduled_at >= window_start && d.scheduled_at < window_end)
                .collect();
            if doses.is_empty() {
                continue;
            }

            let med_scheduled = doses.len() as u32;
            let med_taken = doses.iter().filter(|d| d.is_taken()).count() as u32;
            let med_missed = doses.iter().filter(|d| d.is_missed()).count() as u32;
            scheduled += med_scheduled;
            taken += med_taken;
            missed += med_missed;

            let med_percentage = percentage(med_taken, med_scheduled);
            medications.push(MedicationAdherence {
                reminder_id: reminder.id,
                medication_name: reminder.medication_name.clone(),
                dosage: reminder.dosage.clone(),
                scheduled: med_scheduled,
                taken: med_taken,
                missed: med_missed,
                adherence_percentage: med_percentage,
                level: AdherenceLevel::from_percentage(med_percentage).display_name(),
            });
        }

        let overall = percentage(taken, scheduled);
        PatientAdherenceReport {
            patient_id,
            window_start,
            window_end,
            scheduled,
            taken,
            missed,
            adherence_percentage: overall,
            level: AdherenceLevel::from_percentage(overall).display_name(),
            medications,
        }
    }

    /// Counters for the operations dashboard. "Today" is the clock's
    /// current calendar day; "due now" follows the same tolerance band the
    /// selector uses.
    pub fn dashboard_stats(&self) -> DashboardStats {
        let now = self.clock.now();
        let day_start = now.date().and_hms_opt(0, 0, 0).unwrap_or(now);
        let day_end = day_start + Duration::days(1);
        let tolerance = Duration::minutes(self.config.due_tolerance_minutes);

        let due_now = self
            .doses
            .pending()
            .iter()
            .filter(|d| d.scheduled_at <= now + tolerance)
            .count();

        let today = self.doses.in_window(day_start, day_end);
        DashboardStats {
            active_reminders: self.reminders.active().len(),
            due_now,
            sent_today: today.iter().filter(|d| d.sent_at.is_some()).count(),
            taken_today: today.iter().filter(|d| d.is_taken()).count(),
            missed_today: today.iter().filter(|d| d.is_missed()).count(),
        }
    }

    pub fn follow_up_stats(&self) -> FollowUpStats {
        let today = self.clock.now().date();
        let all = self.follow_ups.all();

        let sent = all.iter().filter(|f| f.sent).count();
        let responded = all.iter().filter(|f| f.responded).count();
        FollowUpStats {
            total_scheduled: all.len(),
            sent_today: all
                .iter()
                .filter(|f| f.sent_at.is_some_and(|at| at.date() == today))
                .count(),
            pending: all.len() - sent,
            escalated_today: all
                .iter()
                .filter(|f| f.escalated_at.is_some_and(|at| at.date() == today))
                .count(),
            response_rate: percentage(responded as u32, sent as u32),
        }
    }
}
