use anyhow::Result;
use dotenvy::dotenv;
use log::info;
use std::sync::Arc;

use carepulse::core::{SchedulerConfig, SystemClock};
use carepulse::features::adherence::AdherenceAggregator;
use carepulse::features::dispatch::{Dispatcher, DueWorkSelector};
use carepulse::features::followups::EscalationMonitor;
use carepulse::features::reminders::{DoseMaterializer, Frequency, NewReminder, ReminderService};
use carepulse::messaging::ConsoleSender;
use carepulse::runtime::SchedulerRuntime;
use carepulse::store::{MemoryPatientDirectory, MemoryStore};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = SchedulerConfig::from_env();
    info!("starting carepulse scheduler: {config:?}");

    let store = Arc::new(MemoryStore::new());
    let patients = Arc::new(MemoryPatientDirectory::new());
    let sender = Arc::new(ConsoleSender);
    let clock = Arc::new(SystemClock);

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

    // Demo mode: the in-memory store starts empty, so seed one patient and
    // one reminder to make the console output visible.
    if std::env::var("DEMO_SEED").is_ok() {
        let reminders = ReminderService::new(
            store.clone(),
            store.clone(),
            patients.clone(),
            materializer.clone(),
            clock.clone(),
            config.clone(),
        );
        let patient = patients.add("Demo Patient", "demo@example.org");
        let reminder = reminders.create_reminder(NewReminder {
            patient_id: patient,
            medication_name: "Metformin".into(),
            dosage: "500mg".into(),
            frequency: Frequency::TwiceDaily,
            start: None,
            end: None,
            slots: None,
            special_instructions: Some("Take with food".into()),
            max_attempts_per_dose: None,
            created_by: "demo".into(),
        })?;
        info!(
            "seeded demo reminder {} ({} doses scheduled)",
            reminder.id, reminder.doses_scheduled
        );
    }

    let runtime = SchedulerRuntime::start(materializer, dispatcher, monitor, &config);

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");
    runtime.shutdown().await;

    // Final snapshot for the operator log.
    let aggregator = AdherenceAggregator::new(
        store.clone(),
        store.clone(),
        store.clone(),
        clock,
        config,
    );
    info!(
        "final dashboard: {}",
        serde_json::to_string(&aggregator.dashboard_stats())?
    );
    Ok(())
}
