//! Summaries of a single maintenance pass.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::machine::{AlarmId, MachineId};

/// What started a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunTrigger {
    Scheduled,
    Manual,
}

/// A problem attributed to one machine (and optionally one alarm).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunError {
    pub machine_id: MachineId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alarm_id: Option<AlarmId>,
    pub message: String,
}

impl RunError {
    pub fn machine(machine_id: impl Into<MachineId>, message: impl Into<String>) -> Self {
        Self {
            machine_id: machine_id.into(),
            alarm_id: None,
            message: message.into(),
        }
    }

    pub fn alarm(
        machine_id: impl Into<MachineId>,
        alarm_id: impl Into<AlarmId>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            machine_id: machine_id.into(),
            alarm_id: Some(alarm_id.into()),
            message: message.into(),
        }
    }
}

/// Counters and diagnostics for one pass over all machines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    pub run_id: Uuid,
    pub trigger: RunTrigger,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub machines_processed: usize,
    pub alarms_evaluated: usize,
    pub alarms_triggered: usize,
    /// Per-machine failures; the affected alarm state was left untouched.
    pub errors: Vec<RunError>,
    /// Alarms that fired but whose notification could not be delivered.
    pub notification_failures: Vec<RunError>,
    /// Machines or alarms skipped because their configuration is invalid.
    pub skipped: Vec<RunError>,
    pub deadline_exceeded: bool,
    /// A stop request arrived mid-run and remaining machines were not started.
    pub stopped_early: bool,
}

impl RunResult {
    pub fn begin(trigger: RunTrigger, started_at: DateTime<Utc>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            trigger,
            started_at,
            finished_at: started_at,
            duration_ms: 0,
            machines_processed: 0,
            alarms_evaluated: 0,
            alarms_triggered: 0,
            errors: Vec::new(),
            notification_failures: Vec::new(),
            skipped: Vec::new(),
            deadline_exceeded: false,
            stopped_early: false,
        }
    }

    pub fn finish(&mut self, finished_at: DateTime<Utc>, duration_ms: u64) {
        self.finished_at = finished_at;
        self.duration_ms = duration_ms;
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.notification_failures.is_empty() && !self.deadline_exceeded
    }
}

/// Result of asking the engine to run a pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    Success(RunResult),
    /// Another pass held the run-lock; nothing was processed.
    Skipped { reason: String },
    PartialFailure(RunResult),
}

impl RunOutcome {
    pub fn from_result(result: RunResult) -> Self {
        if result.is_clean() {
            RunOutcome::Success(result)
        } else {
            RunOutcome::PartialFailure(result)
        }
    }

    pub fn result(&self) -> Option<&RunResult> {
        match self {
            RunOutcome::Success(r) | RunOutcome::PartialFailure(r) => Some(r),
            RunOutcome::Skipped { .. } => None,
        }
    }

    pub fn was_skipped(&self) -> bool {
        matches!(self, RunOutcome::Skipped { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            RunOutcome::Success(_) => "success",
            RunOutcome::Skipped { .. } => "skipped",
            RunOutcome::PartialFailure(_) => "partial_failure",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_result_is_success() {
        let result = RunResult::begin(RunTrigger::Manual, Utc::now());
        assert_eq!(RunOutcome::from_result(result).label(), "success");
    }

    #[test]
    fn notification_failure_makes_partial() {
        let mut result = RunResult::begin(RunTrigger::Scheduled, Utc::now());
        result
            .notification_failures
            .push(RunError::alarm("m1", "a1", "smtp down"));
        let outcome = RunOutcome::from_result(result);
        assert!(matches!(outcome, RunOutcome::PartialFailure(_)));
        assert!(outcome.result().is_some());
    }

    #[test]
    fn skipped_alarms_alone_do_not_fail_the_run() {
        let mut result = RunResult::begin(RunTrigger::Scheduled, Utc::now());
        result
            .skipped
            .push(RunError::alarm("m1", "a1", "interval hours must be positive"));
        assert!(matches!(RunOutcome::from_result(result), RunOutcome::Success(_)));
    }

    #[test]
    fn skipped_serializes_with_tag() {
        let outcome = RunOutcome::Skipped {
            reason: "already running".into(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["outcome"], "skipped");
        assert_eq!(json["reason"], "already running");
        assert!(outcome.was_skipped());
    }
}
