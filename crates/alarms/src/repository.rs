//! Persistence collaborators consumed by the engine.
//!
//! Each write is a single call so implementations can apply it as one
//! atomic read-modify-write against their store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use upkeep_core::{Machine, MachineEvent, MaintenanceAlarm};

use crate::error::AlarmError;

/// Source of machines and sink for alarm bookkeeping.
#[async_trait]
pub trait MachineRepository: Send + Sync {
    /// Active machines that own at least one active alarm.
    async fn list_active_machines_with_active_alarms(&self) -> Result<Vec<Machine>, AlarmError>;

    /// Add `additional_hours` to the stored total and move the checkpoint
    /// from `expected_checkpoint` to `new_checkpoint`, returning the alarm as
    /// stored afterwards.
    ///
    /// The hours are applied to whatever total is stored at write time, so a
    /// clear that landed after the machine was listed survives. A stored
    /// checkpoint other than `expected_checkpoint` means another writer
    /// already counted part of this window: fail with
    /// [`AlarmError::StaleCheckpoint`] and change nothing.
    async fn update_alarm_accumulation(
        &self,
        machine_id: &str,
        alarm_id: &str,
        additional_hours: f64,
        expected_checkpoint: DateTime<Utc>,
        new_checkpoint: DateTime<Utc>,
    ) -> Result<MaintenanceAlarm, AlarmError>;

    /// Commit trigger bookkeeping: `last_triggered_at`, `times_triggered + 1`,
    /// the hours marker, and a reset to zero when `reset_accumulated`.
    async fn record_alarm_trigger(
        &self,
        machine_id: &str,
        alarm_id: &str,
        triggered_at: DateTime<Utc>,
        reset_accumulated: bool,
        hours_at_trigger: f64,
    ) -> Result<(), AlarmError>;
}

/// Durable audit trail of fired alarms.
#[async_trait]
pub trait EventRecorder: Send + Sync {
    async fn record_machine_event(&self, event: &MachineEvent) -> Result<(), AlarmError>;
}
