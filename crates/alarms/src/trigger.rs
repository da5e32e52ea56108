//! Side effects of a confirmed crossing.
//!
//! Order matters: the audit event is recorded first and nothing else happens
//! if that fails, so the next pass retries the same crossing. Bookkeeping is
//! committed in one repository call once the event exists; if that call
//! fails, the retry rebuilds an event with the same id. The notification
//! goes out last; its failure is reported but never undoes the trigger.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use upkeep_core::{Machine, MachineEvent, MaintenanceAlarm};
use upkeep_notify::NotificationDispatcher;

use crate::error::AlarmError;
use crate::repository::{EventRecorder, MachineRepository};

/// What a successful dispatch did.
#[derive(Debug, Clone)]
pub struct DispatchReport {
    pub event: MachineEvent,
    pub reset: bool,
    /// Set when the notification could not be delivered.
    pub notification_error: Option<String>,
}

pub struct AlarmTriggerDispatcher {
    repository: Arc<dyn MachineRepository>,
    events: Arc<dyn EventRecorder>,
    notifications: Arc<dyn NotificationDispatcher>,
    default_reset_on_trigger: bool,
}

impl AlarmTriggerDispatcher {
    pub fn new(
        repository: Arc<dyn MachineRepository>,
        events: Arc<dyn EventRecorder>,
        notifications: Arc<dyn NotificationDispatcher>,
        default_reset_on_trigger: bool,
    ) -> Self {
        Self {
            repository,
            events,
            notifications,
            default_reset_on_trigger,
        }
    }

    /// Fire `alarm`. Only call after the evaluator reported a crossing.
    pub async fn dispatch(
        &self,
        machine: &Machine,
        alarm: &MaintenanceAlarm,
        now: DateTime<Utc>,
    ) -> Result<DispatchReport, AlarmError> {
        let event = MachineEvent::maintenance_due(machine, alarm, now);
        self.events.record_machine_event(&event).await?;

        let reset = alarm.resets_on_trigger(self.default_reset_on_trigger);
        self.repository
            .record_alarm_trigger(&machine.id, &alarm.id, now, reset, alarm.accumulated_hours)
            .await?;

        info!(
            machine_id = %machine.id,
            alarm_id = %alarm.id,
            accumulated_hours = alarm.accumulated_hours,
            interval_hours = alarm.interval_hours,
            reset,
            "maintenance alarm triggered"
        );

        let notification_error = match self
            .notifications
            .notify_maintenance_due(&machine.id, &alarm.id, &alarm.title)
            .await
        {
            Ok(()) => None,
            Err(e) => {
                warn!(
                    machine_id = %machine.id,
                    alarm_id = %alarm.id,
                    error = %e,
                    "maintenance notification failed"
                );
                Some(e.to_string())
            }
        };

        Ok(DispatchReport {
            event,
            reset,
            notification_error,
        })
    }
}
