//! # Scheduler Runtime
//!
//! The three background loops: the dose tick (horizon top-up plus due-dose
//! dispatch), the follow-up tick and the escalation sweep. Each loop runs
//! on its own interval and winds down on the shared shutdown signal.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

use crate::core::SchedulerConfig;
use crate::features::dispatch::Dispatcher;
use crate::features::followups::EscalationMonitor;
use crate::features::reminders::DoseMaterializer;
use log::{debug, error, info};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

pub struct SchedulerRuntime {
    shutdown: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl SchedulerRuntime {
    /// Spawn the background loops. Every loop runs one pass immediately so
    /// a restart never waits a full tick to catch up.
    pub fn start(
        materializer: Arc<DoseMaterializer>,
        dispatcher: Arc<Dispatcher>,
        monitor: Arc<EscalationMonitor>,
        config: &SchedulerConfig,
    ) -> Self {
        let (shutdown, _) = watch::channel(false);

        let dose_dispatcher = dispatcher.clone();
        let mut dose_rx = shutdown.subscribe();
        let dose_tick = config.dose_tick;
        let dose_loop = tokio::spawn(async move {
            let mut tick = tokio::time::interval(dose_tick);
            loop {
                tokio::select! {
                    _ = tick.tick() => {
                        let created = materializer.top_up();
                        if created > 0 {
                            debug!("dose tick materialized {created} dose(s)");
                        }
                        let outcome = dose_dispatcher.process_due_doses().await;
                        if outcome.selected > 0 {
                            info!(
                                "dose tick: {} selected, {} sent, {} failed",
                                outcome.selected, outcome.sent, outcome.failed
                            );
                        }
                    }
                    _ = dose_rx.changed() => break,
                }
            }
            info!("dose loop stopped");
        });

        let mut follow_up_rx = shutdown.subscribe();
        let follow_up_tick = config.follow_up_tick;
        let follow_up_loop = tokio::spawn(async move {
            let mut tick = tokio::time::interval(follow_up_tick);
            loop {
                tokio::select! {
                    _ = tick.tick() => {
                        let outcome = dispatcher.process_due_follow_ups().await;
                        if outcome.selected > 0 {
                            info!(
                                "follow-up tick: {} selected, {} sent, {} failed",
                                outcome.selected, outcome.sent, outcome.failed
                            );
                        }
                    }
                    _ = follow_up_rx.changed() => break,
                }
            }
            info!("follow-up loop stopped");
        });

        let mut escalation_rx = shutdown.subscribe();
        let escalation_tick = config.escalation_tick;
        let escalation_loop = tokio::spawn(async move {
            let mut tick = tokio::time::interval(escalation_tick);
            loop {
                tokio::select! {
                    _ = tick.tick() => {
                        let escalated = monitor.run_once().await;
                        if escalated > 0 {
                            info!("escalation sweep escalated {escalated} follow-up(s)");
                        }
                    }
                    _ = escalation_rx.changed() => break,
                }
            }
            info!("escalation loop stopped");
        });

        info!("scheduler runtime started");
        SchedulerRuntime {
            shutdown,
            handles: vec![dose_loop, follow_up_loop, escalation_loop],
        }
    }

    /// Signal every loop to stop and wait for them to drain.
    pub async fn shutdown(self) {
        if self.shutdown.send(true).is_err() {
            error!("scheduler loops already gone at shutdown");
        }
        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("scheduler loop panicked: {e}");
            }
        }
        info!("scheduler runtime stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ManualClock, SchedulerConfig};
    use crate::features::dispatch::DueWorkSelector;
    use crate::features::reminders::{DoseInstance, Frequency, Reminder};
    use crate::messaging::RecordingSender;
    use crate::store::{
        DoseStore, MemoryPatientDirectory, MemoryStore, ReminderStore,
    };
    use chrono::NaiveDate;
    use std::time::Duration;

    #[tokio::test]
    async fn loops_process_due_work_and_stop_on_shutdown() {
        let now = NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let store = Arc::new(MemoryStore::new());
        let patients = Arc::new(MemoryPatientDirectory::new());
        let sender = Arc::new(RecordingSender::new());
        let clock = Arc::new(ManualClock::new(now));
        let mut config = SchedulerConfig::default();
        config.dose_tick = Duration::from_millis(10);
        config.follow_up_tick = Duration::from_millis(10);
        config.escalation_tick = Duration::from_millis(10);

        let patient = patients.add("Asha Rao", "+15550100");
        let reminder = ReminderStore::insert(
            &*store,
            Reminder::new(
                patient,
                "Metformin",
                "500mg",
                Frequency::OnceDaily,
                now,
                3,
                "dr-lee",
                now,
            ),
        );
        DoseStore::insert(&*store, DoseInstance::new(reminder.id, now, now));

        let materializer = Arc::new(DoseMaterializer::new(
            store.clone(),
            store.clone(),
            clock.clone(),
            config.clone(),
        ));
        let selector = DueWorkSelector::new(
            store.clone(),
            store.clone(),
            store.clone(),
            clock.clone(),
            config.clone(),
        );
        let dispatcher = Arc::new(Dispatcher::new(
            store.clone(),
            store.clone(),
            store.clone(),
            patients.clone(),
            sender.clone(),
            selector,
            clock.clone(),
            config.clone(),
        ));
        let monitor = Arc::new(EscalationMonitor::new(
            store.clone(),
            patients.clone(),
            sender.clone(),
            clock.clone(),
            config.clone(),
        ));

        let runtime = SchedulerRuntime::start(materializer, dispatcher, monitor, &config);
        tokio::time::sleep(Duration::from_millis(60)).await;
        runtime.shutdown().await;

        assert!(sender.sent_count() >= 1);
        assert!(sender
            .sent()
            .iter()
            .any(|m| m.body.contains("Metformin")));
    }
}
