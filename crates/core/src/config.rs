use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_u16(key: &str, default: u16) -> u16 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    match env_opt(key).map(|v| v.to_ascii_lowercase()) {
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => true,
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => false,
        _ => default,
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub maintenance: MaintenanceConfig,
    pub notify: NotifyConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig::from_env(),
            maintenance: MaintenanceConfig::from_env(),
            notify: NotifyConfig::from_env(),
        }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded:");
        tracing::info!("  server:      {}:{}", self.server.host, self.server.port);
        tracing::info!(
            "  schedule:    cron='{}' tz={} autostart={}",
            self.maintenance.cron,
            self.maintenance.timezone,
            self.maintenance.autostart
        );
        tracing::info!(
            "  engine:      reset_on_trigger={} deadline={}s concurrency={}",
            self.maintenance.reset_on_trigger,
            self.maintenance.pass_deadline_secs,
            self.maintenance.max_concurrent_machines
        );
        tracing::info!(
            "  notify:      webhook={}",
            if self.notify.webhook_url.is_some() { "configured" } else { "(none)" }
        );
        tracing::info!(
            "  seed:        {}",
            self.server
                .seed_file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(none)".to_string())
        );
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
    /// JSON file of machines loaded into the in-memory store at boot.
    pub seed_file: Option<PathBuf>,
}

impl ServerConfig {
    fn from_env() -> Self {
        Self {
            host: env_or("UPKEEP_HOST", "0.0.0.0"),
            port: env_u16("UPKEEP_PORT", 3010),
            cors_origin: env_or("CORS_ORIGIN", "*"),
            seed_file: env_opt("UPKEEP_SEED_FILE").map(PathBuf::from),
        }
    }
}

// ── Maintenance engine ────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceConfig {
    /// 5- or 6-field cron expression for the periodic pass.
    pub cron: String,
    /// IANA timezone used for the schedule and for weekday boundaries.
    pub timezone: String,
    /// Default for alarms that do not set `resetOnTrigger` themselves.
    pub reset_on_trigger: bool,
    pub pass_deadline_secs: u64,
    pub max_concurrent_machines: usize,
    /// Arm the schedule as soon as the server boots.
    pub autostart: bool,
}

impl MaintenanceConfig {
    fn from_env() -> Self {
        Self {
            cron: env_or("MAINTENANCE_CRON", "0 * * * *"),
            timezone: env_or("MAINTENANCE_TIMEZONE", "UTC"),
            reset_on_trigger: env_bool("MAINTENANCE_RESET_ON_TRIGGER", true),
            pass_deadline_secs: env_u64("MAINTENANCE_PASS_DEADLINE_SECS", 600),
            max_concurrent_machines: env_usize("MAINTENANCE_MAX_CONCURRENCY", 4).max(1),
            autostart: env_bool("MAINTENANCE_AUTOSTART", true),
        }
    }
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            cron: "0 * * * *".to_string(),
            timezone: "UTC".to_string(),
            reset_on_trigger: true,
            pass_deadline_secs: 600,
            max_concurrent_machines: 4,
            autostart: true,
        }
    }
}

// ── Notifications ─────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    pub webhook_url: Option<String>,
}

impl NotifyConfig {
    fn from_env() -> Self {
        Self {
            webhook_url: env_opt("NOTIFY_WEBHOOK_URL"),
        }
    }
}
