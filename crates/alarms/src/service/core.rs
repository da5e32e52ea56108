use std::sync::atomic::{AtomicBool, AtomicU64};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use tokio::sync::Mutex as AsyncMutex;
use tracing::info;

use upkeep_core::config::MaintenanceConfig;
use upkeep_core::Clock;
use upkeep_notify::NotificationDispatcher;

use crate::accumulator::UsageAccumulator;
use crate::error::AlarmError;
use crate::evaluator::AlarmEvaluator;
use crate::repository::{EventRecorder, MachineRepository};
use crate::schedule::parse_timezone;
use crate::trigger::AlarmTriggerDispatcher;

use super::lifecycle::TimerHandle;
use super::status::RunStats;

/// Settings consumed at construction.
#[derive(Debug, Clone)]
pub struct CronServiceConfig {
    /// 5- or 6-field cron expression, validated by `start()`.
    pub schedule: String,
    /// IANA timezone for the schedule and for weekday boundaries.
    pub timezone: String,
    pub default_reset_on_trigger: bool,
    /// Upper bound on one pass; the run-lock is released when it elapses.
    pub pass_deadline: Duration,
    pub max_concurrent_machines: usize,
}

impl Default for CronServiceConfig {
    fn default() -> Self {
        Self::from(&MaintenanceConfig::default())
    }
}

impl From<&MaintenanceConfig> for CronServiceConfig {
    fn from(config: &MaintenanceConfig) -> Self {
        Self {
            schedule: config.cron.clone(),
            timezone: config.timezone.clone(),
            default_reset_on_trigger: config.reset_on_trigger,
            pass_deadline: Duration::from_secs(config.pass_deadline_secs.max(1)),
            max_concurrent_machines: config.max_concurrent_machines.max(1),
        }
    }
}

/// The maintenance engine. One instance owns one run-lock, so the timer and
/// manual triggers can never interleave two passes.
///
/// Lifecycle: `Stopped → Scheduled` via [`start`](Self::start), a timer fire or
/// [`trigger`](Self::trigger) moves to `Running` and back, and
/// [`stop`](Self::stop) returns to `Stopped` after draining the in-flight pass.
pub struct MaintenanceCronService {
    pub(super) config: CronServiceConfig,
    pub(super) clock: Arc<dyn Clock>,
    pub(super) repository: Arc<dyn MachineRepository>,
    pub(super) accumulator: UsageAccumulator,
    pub(super) evaluator: AlarmEvaluator,
    pub(super) dispatcher: AlarmTriggerDispatcher,
    /// Held for the whole duration of a pass.
    pub(super) run_lock: AsyncMutex<()>,
    /// Mirrors the run-lock for status reads without touching it.
    pub(super) running: AtomicBool,
    /// Bumped by every `stop()`. A pass that sees it change leaves machines
    /// it has not started for the next pass.
    pub(super) stop_generation: AtomicU64,
    pub(super) timer: Mutex<Option<TimerHandle>>,
    pub(super) stats: RwLock<RunStats>,
}

impl MaintenanceCronService {
    /// Build the service. Fails only on an unknown timezone; the cron
    /// expression is checked when the schedule is armed.
    pub fn new(
        config: CronServiceConfig,
        clock: Arc<dyn Clock>,
        repository: Arc<dyn MachineRepository>,
        events: Arc<dyn EventRecorder>,
        notifications: Arc<dyn NotificationDispatcher>,
    ) -> Result<Self, AlarmError> {
        let tz = parse_timezone(&config.timezone)?;
        let dispatcher = AlarmTriggerDispatcher::new(
            Arc::clone(&repository),
            events,
            notifications,
            config.default_reset_on_trigger,
        );

        info!(
            schedule = %config.schedule,
            timezone = %tz.name(),
            reset_on_trigger = config.default_reset_on_trigger,
            max_concurrent_machines = config.max_concurrent_machines,
            "maintenance service created"
        );

        Ok(Self {
            accumulator: UsageAccumulator::new(tz),
            evaluator: AlarmEvaluator::new(config.default_reset_on_trigger),
            dispatcher,
            config,
            clock,
            repository,
            run_lock: AsyncMutex::new(()),
            running: AtomicBool::new(false),
            stop_generation: AtomicU64::new(0),
            timer: Mutex::new(None),
            stats: RwLock::new(RunStats::default()),
        })
    }

    pub fn config(&self) -> &CronServiceConfig {
        &self.config
    }
}
