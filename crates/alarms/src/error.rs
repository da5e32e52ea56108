use thiserror::Error;

use upkeep_core::UpkeepError;

/// Errors raised by the alarm engine and its collaborators.
#[derive(Debug, Error)]
pub enum AlarmError {
    #[error("repository error: {0}")]
    Repository(String),

    #[error("event recording failed: {0}")]
    EventRecord(String),

    #[error("machine not found: {0}")]
    MachineNotFound(String),

    #[error("alarm not found: {machine_id}/{alarm_id}")]
    AlarmNotFound { machine_id: String, alarm_id: String },

    #[error("stale accumulation for {machine_id}/{alarm_id}: checkpoint would not advance")]
    StaleCheckpoint { machine_id: String, alarm_id: String },

    #[error("invalid cron expression '{expression}': {reason}")]
    InvalidCron { expression: String, reason: String },

    #[error("invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error(transparent)]
    Invalid(#[from] UpkeepError),
}
