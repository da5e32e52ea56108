use std::sync::atomic::Ordering;

use chrono::{DateTime, Utc};
use serde::Serialize;

use upkeep_core::RunResult;

use super::MaintenanceCronService;

/// Coarse lifecycle state reported to operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceState {
    Stopped,
    Scheduled,
    /// A pass holds the run-lock right now.
    Running,
}

/// Snapshot returned by [`MaintenanceCronService::status`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CronServiceStatus {
    pub state: ServiceState,
    /// Whether the periodic timer is armed, independent of a running pass.
    pub scheduled: bool,
    pub schedule: String,
    pub timezone: String,
    pub last_run_at: Option<DateTime<Utc>>,
    pub last_run: Option<RunResult>,
    /// Best-effort estimate; `None` while stopped.
    pub next_run_at: Option<DateTime<Utc>>,
    pub total_runs: u64,
    pub total_skipped: u64,
    pub total_triggered: u64,
    pub avg_duration_ms: f64,
}

/// Counters over completed and skipped passes.
#[derive(Debug, Clone, Default)]
pub(crate) struct RunStats {
    pub(crate) last_run: Option<RunResult>,
    pub(crate) total_runs: u64,
    pub(crate) total_skipped: u64,
    pub(crate) total_triggered: u64,
    pub(crate) avg_duration_ms: f64,
}

impl RunStats {
    pub(crate) fn record_run(&mut self, result: &RunResult) {
        self.total_runs += 1;
        self.total_triggered += result.alarms_triggered as u64;

        // Incremental mean: new_avg = prev_avg + (duration - prev_avg) / count
        let duration = result.duration_ms as f64;
        self.avg_duration_ms = if self.total_runs == 1 {
            duration
        } else {
            self.avg_duration_ms + (duration - self.avg_duration_ms) / self.total_runs as f64
        };

        self.last_run = Some(result.clone());
    }

    pub(crate) fn record_skip(&mut self) {
        self.total_skipped += 1;
    }
}

impl MaintenanceCronService {
    pub fn status(&self) -> CronServiceStatus {
        let armed = self.armed_schedule();
        let state = match (self.is_running(), armed.is_some()) {
            (true, _) => ServiceState::Running,
            (false, true) => ServiceState::Scheduled,
            (false, false) => ServiceState::Stopped,
        };
        let next_run_at = armed
            .as_ref()
            .and_then(|schedule| schedule.next_after(self.clock.now()));

        let stats = self.stats.read().expect("run stats lock poisoned");
        CronServiceStatus {
            state,
            scheduled: armed.is_some(),
            schedule: self.config.schedule.clone(),
            timezone: self.accumulator.timezone().name().to_string(),
            last_run_at: stats.last_run.as_ref().map(|r| r.finished_at),
            last_run: stats.last_run.clone(),
            next_run_at,
            total_runs: stats.total_runs,
            total_skipped: stats.total_skipped,
            total_triggered: stats.total_triggered,
            avg_duration_ms: stats.avg_duration_ms,
        }
    }

    /// Whether a pass currently holds the run-lock.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}
