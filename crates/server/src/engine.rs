//! Wires the maintenance engine from configuration.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use upkeep_alarms::{CronServiceConfig, EventHistory, InMemoryMachineStore, MaintenanceCronService};
use upkeep_core::config::NotifyConfig;
use upkeep_core::{Config, SystemClock};
use upkeep_notify::{Dispatcher, LogNotifier, Notifier, WebhookNotifier};

use crate::state::AppState;

/// Build the store, audit history, notification channels and service.
pub fn build(config: &Config) -> anyhow::Result<AppState> {
    let store = Arc::new(load_store(config.server.seed_file.as_deref())?);
    let history = Arc::new(EventHistory::new());
    let notifications = Arc::new(build_dispatcher(&config.notify)?);

    let service = MaintenanceCronService::new(
        CronServiceConfig::from(&config.maintenance),
        Arc::new(SystemClock),
        store.clone(),
        history.clone(),
        notifications,
    )
    .context("invalid MAINTENANCE_TIMEZONE")?;

    Ok(AppState {
        service: Arc::new(service),
        store,
        history,
    })
}

fn load_store(seed_file: Option<&Path>) -> anyhow::Result<InMemoryMachineStore> {
    let Some(path) = seed_file else {
        warn!("no seed file configured, starting with an empty machine store");
        return Ok(InMemoryMachineStore::new());
    };

    let store = InMemoryMachineStore::from_json_file(path)
        .with_context(|| format!("failed to load machines from {}", path.display()))?;
    let machines = store.machines();
    let alarms: usize = machines.iter().map(|m| m.alarms.len()).sum();
    info!(
        path = %path.display(),
        machines = machines.len(),
        alarms,
        "seeded machine store"
    );
    Ok(store)
}

fn build_dispatcher(config: &NotifyConfig) -> anyhow::Result<Dispatcher> {
    let mut channels: Vec<Box<dyn Notifier>> = vec![Box::new(LogNotifier)];
    if let Some(url) = &config.webhook_url {
        let webhook = WebhookNotifier::new(url.clone()).context("invalid NOTIFY_WEBHOOK_URL")?;
        info!(url = %webhook.url(), "webhook notifications enabled");
        channels.push(Box::new(webhook));
    }
    Ok(Dispatcher::with_defaults(channels))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn builds_from_seed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id":"press-1","name":"Press","usageSchedule":{{"dailyHours":8,"operatingDays":["Mon","Tue"]}},
                "alarms":[{{"id":"oil","title":"Oil","intervalHours":40,
                "lastAccumulationCheckpoint":"2024-01-01T00:00:00Z"}}]}}]"#
        )
        .unwrap();

        let mut config = Config::from_env();
        config.server.seed_file = Some(file.path().to_path_buf());
        config.maintenance.timezone = "UTC".into();
        config.notify.webhook_url = None;

        let state = build(&config).unwrap();
        assert!(state.store.machine("press-1").is_some());
    }

    #[test]
    fn missing_seed_file_is_an_error() {
        let mut config = Config::from_env();
        config.server.seed_file = Some("/nonexistent/machines.json".into());
        config.maintenance.timezone = "UTC".into();
        assert!(build(&config).is_err());
    }

    #[test]
    fn bad_webhook_url_is_rejected() {
        let config = NotifyConfig {
            webhook_url: Some("ftp://example.com".into()),
        };
        assert!(build_dispatcher(&config).is_err());
    }
}
