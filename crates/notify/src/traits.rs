//! Notifier traits and shared error types.

use std::collections::HashMap;

/// Errors that can occur during notification delivery.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Delivery rejected: {0}")]
    Rejected(String),

    #[error("No channel delivered the notification ({failed} failed)")]
    NoChannelDelivered { failed: usize },
}

/// A notification ready for delivery.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Notification {
    pub subject: String,
    pub body: String,
    /// Additional metadata (machine id, alarm id).
    pub metadata: HashMap<String, String>,
}

impl Notification {
    /// Plain-text notice that an alarm's maintenance interval was reached.
    pub fn maintenance_due(machine_id: &str, alarm_id: &str, title: &str) -> Self {
        Self {
            subject: format!("Maintenance due: {title}"),
            body: format!(
                "Machine {machine_id} reached the usage threshold for \"{title}\" (alarm {alarm_id})."
            ),
            metadata: HashMap::from([
                ("machine_id".to_string(), machine_id.to_string()),
                ("alarm_id".to_string(), alarm_id.to_string()),
                ("event".to_string(), "maintenance_due".to_string()),
            ]),
        }
    }
}

/// A single delivery channel.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a notification through this channel.
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;

    /// Human-readable name for this channel (e.g., "webhook", "log").
    fn channel_name(&self) -> &str;
}

/// What the alarm engine calls when a maintenance alarm fires.
///
/// Best effort from the engine's point of view: an `Err` is logged and
/// reported, never retried as a fresh trigger.
#[async_trait::async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn notify_maintenance_due(
        &self,
        machine_id: &str,
        alarm_id: &str,
        title: &str,
    ) -> Result<(), NotifyError>;
}

/// Result of dispatching a notification to a single channel.
#[derive(Debug)]
pub struct DispatchResult {
    pub channel: String,
    pub success: bool,
    pub error: Option<String>,
    pub duration_ms: u64,
}
