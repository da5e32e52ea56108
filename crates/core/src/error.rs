use thiserror::Error;

#[derive(Error, Debug)]
pub enum UpkeepError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Invalid usage schedule: {0}")]
    InvalidSchedule(String),

    #[error("Invalid alarm '{alarm_id}': {reason}")]
    InvalidAlarm { alarm_id: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),
}
