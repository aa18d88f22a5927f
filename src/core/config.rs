//! Scheduler configuration.
//!
//! Every timing window the scheduler uses is tunable through the
//! environment; the defaults match the behavior of the original deployment
//! (5-minute dose tick, 15-minute follow-up tick, hourly escalation sweep,
//! 48-hour escalation grace, 7-day materialization horizon).

use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Interval between due-dose processing passes.
    pub dose_tick: Duration,
    /// Interval between due-follow-up processing passes.
    pub follow_up_tick: Duration,
    /// Interval between escalation sweeps.
    pub escalation_tick: Duration,
    /// A Scheduled dose is due when within this many minutes of its slot.
    pub due_tolerance_minutes: i64,
    /// A response within this many minutes of the slot counts as on time.
    pub on_time_tolerance_minutes: i64,
    /// How far back a patient reply can match an open dose.
    pub response_lookback_hours: i64,
    /// Hours after a follow-up send with no reply before escalation.
    pub escalation_grace_hours: i64,
    /// How many days of doses the materializer keeps ahead.
    pub horizon_days: i64,
    /// Default per-dose send attempt cap for new reminders.
    pub default_max_attempts: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            dose_tick: Duration::from_secs(300),
            follow_up_tick: Duration::from_secs(900),
            escalation_tick: Duration::from_secs(3600),
            due_tolerance_minutes: 5,
            on_time_tolerance_minutes: 15,
            response_lookback_hours: 4,
            escalation_grace_hours: 48,
            horizon_days: 7,
            default_max_attempts: 3,
        }
    }
}

impl SchedulerConfig {
    /// Build a config from environment variables, falling back to defaults
    /// for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = SchedulerConfig::default();
        SchedulerConfig {
            dose_tick: env_secs("DOSE_TICK_SECS", defaults.dose_tick),
            follow_up_tick: env_secs("FOLLOW_UP_TICK_SECS", defaults.follow_up_tick),
            escalation_tick: env_secs("ESCALATION_TICK_SECS", defaults.escalation_tick),
            due_tolerance_minutes: env_i64("DUE_TOLERANCE_MINUTES", defaults.due_tolerance_minutes),
            on_time_tolerance_minutes: env_i64(
                "ON_TIME_TOLERANCE_MINUTES",
                defaults.on_time_tolerance_minutes,
            ),
            response_lookback_hours: env_i64(
                "RESPONSE_LOOKBACK_HOURS",
                defaults.response_lookback_hours,
            ),
            escalation_grace_hours: env_i64(
                "ESCALATION_GRACE_HOURS",
                defaults.escalation_grace_hours,
            ),
            horizon_days: env_i64("HORIZON_DAYS", defaults.horizon_days),
            default_max_attempts: env_u32("DEFAULT_MAX_ATTEMPTS", defaults.default_max_attempts),
        }
    }
}

fn env_secs(key: &str, default: Duration) -> Duration {
    match env::var(key).ok().and_then(|v| v.parse::<u64>().ok()) {
        Some(secs) => Duration::from_secs(secs),
        None => default,
    }
}

fn env_i64(key: &str, default: i64) -> i64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_windows() {
        let config = SchedulerConfig::default();
        assert_eq!(config.dose_tick, Duration::from_secs(300));
        assert_eq!(config.follow_up_tick, Duration::from_secs(900));
        assert_eq!(config.escalation_tick, Duration::from_secs(3600));
        assert_eq!(config.due_tolerance_minutes, 5);
        assert_eq!(config.on_time_tolerance_minutes, 15);
        assert_eq!(config.response_lookback_hours, 4);
        assert_eq!(config.escalation_grace_hours, 48);
        assert_eq!(config.horizon_days, 7);
        assert_eq!(config.default_max_attempts, 3);
    }
}
