//! Routes maintenance notices to configured channels.
//!
//! The dispatcher delivers every notification to all configured channels.
//! Individual channel failures don't block other channels.

use crate::traits::{DispatchResult, Notification, NotificationDispatcher, Notifier, NotifyError};

/// Dispatches notifications to multiple channels.
pub struct Dispatcher {
    channels: Vec<Box<dyn Notifier>>,
}

impl Dispatcher {
    /// Create a dispatcher with channels shared across all machines.
    pub fn with_defaults(channels: Vec<Box<dyn Notifier>>) -> Self {
        Self { channels }
    }

    /// Dispatch a notification about a machine to every channel.
    pub async fn dispatch(
        &self,
        machine_id: &str,
        notification: &Notification,
    ) -> Vec<DispatchResult> {
        let channels = &self.channels;

        if channels.is_empty() {
            tracing::debug!(machine_id, "No notification channels configured");
            return Vec::new();
        }

        let mut results = Vec::with_capacity(channels.len());

        for channel in channels {
            let start = std::time::Instant::now();
            let result = channel.send(notification).await;
            let duration_ms = start.elapsed().as_millis() as u64;

            let (success, error) = match result {
                Ok(()) => {
                    tracing::debug!(
                        machine_id,
                        channel = channel.channel_name(),
                        duration_ms,
                        "Notification delivered"
                    );
                    (true, None)
                }
                Err(e) => {
                    tracing::warn!(
                        machine_id,
                        channel = channel.channel_name(),
                        error = %e,
                        duration_ms,
                        "Notification delivery failed"
                    );
                    (false, Some(e.to_string()))
                }
            };

            results.push(DispatchResult {
                channel: channel.channel_name().to_string(),
                success,
                error,
                duration_ms,
            });
        }

        results
    }
}

#[async_trait::async_trait]
impl NotificationDispatcher for Dispatcher {
    /// Succeeds when at least one channel delivered, or when none are configured.
    async fn notify_maintenance_due(
        &self,
        machine_id: &str,
        alarm_id: &str,
        title: &str,
    ) -> Result<(), NotifyError> {
        let notification = Notification::maintenance_due(machine_id, alarm_id, title);
        let results = self.dispatch(machine_id, &notification).await;

        if results.is_empty() || results.iter().any(|r| r.success) {
            Ok(())
        } else {
            Err(NotifyError::NoChannelDelivered {
                failed: results.len(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct MockNotifier {
        name: String,
        send_count: Arc<AtomicUsize>,
        should_fail: bool,
    }

    #[async_trait::async_trait]
    impl Notifier for MockNotifier {
        async fn send(&self, _notification: &Notification) -> Result<(), NotifyError> {
            self.send_count.fetch_add(1, Ordering::SeqCst);
            if self.should_fail {
                Err(NotifyError::Config("mock failure".to_string()))
            } else {
                Ok(())
            }
        }
        fn channel_name(&self) -> &str {
            &self.name
        }
    }

    fn mock(name: &str, count: &Arc<AtomicUsize>, should_fail: bool) -> Box<dyn Notifier> {
        Box::new(MockNotifier {
            name: name.to_string(),
            send_count: count.clone(),
            should_fail,
        })
    }

    #[tokio::test]
    async fn dispatch_to_all_default_channels() {
        let count_a = Arc::new(AtomicUsize::new(0));
        let count_b = Arc::new(AtomicUsize::new(0));
        let dispatcher = Dispatcher::with_defaults(vec![
            mock("a", &count_a, false),
            mock("b", &count_b, false),
        ]);

        let notification = Notification::maintenance_due("press-1", "oil", "Oil change");
        let results = dispatcher.dispatch("press-1", &notification).await;
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.success));
        assert_eq!(count_a.load(Ordering::SeqCst), 1);
        assert_eq!(count_b.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn partial_failure_doesnt_block() {
        let count = Arc::new(AtomicUsize::new(0));
        let dispatcher = Dispatcher::with_defaults(vec![
            mock("fail", &Arc::new(AtomicUsize::new(0)), true),
            mock("ok", &count, false),
        ]);

        let result = dispatcher
            .notify_maintenance_due("press-1", "oil", "Oil change")
            .await;
        assert!(result.is_ok());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn all_channels_failing_is_an_error() {
        let count = Arc::new(AtomicUsize::new(0));
        let dispatcher = Dispatcher::with_defaults(vec![
            mock("a", &count, true),
            mock("b", &count, true),
        ]);

        let err = dispatcher
            .notify_maintenance_due("press-1", "oil", "Oil change")
            .await
            .unwrap_err();
        assert!(matches!(err, NotifyError::NoChannelDelivered { failed: 2 }));
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn no_channels_is_ok() {
        let dispatcher = Dispatcher::with_defaults(Vec::new());
        assert!(dispatcher
            .notify_maintenance_due("nonexistent", "a", "t")
            .await
            .is_ok());
    }
}
