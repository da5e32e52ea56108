//! Channel that only writes the notice to the tracing log.

use crate::traits::{Notification, Notifier, NotifyError};

/// Always succeeds; useful as a default channel and in local setups.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        tracing::info!(
            machine_id = notification.metadata.get("machine_id").map(String::as_str).unwrap_or(""),
            alarm_id = notification.metadata.get("alarm_id").map(String::as_str).unwrap_or(""),
            subject = %notification.subject,
            "maintenance notice"
        );
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "log"
    }
}
