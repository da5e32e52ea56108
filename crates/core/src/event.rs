//! Audit record written when a maintenance alarm fires.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::machine::{AlarmId, Machine, MachineId, MaintenanceAlarm};

/// Immutable proof that an alarm trigger was handled.
///
/// The id is derived from the machine, the alarm and the trigger ordinal, so
/// a retried trigger produces the same id as the attempt it repeats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineEvent {
    pub id: Uuid,
    pub machine_id: MachineId,
    pub alarm_id: AlarmId,
    pub alarm_title: String,
    pub triggered_at: DateTime<Utc>,
    pub accumulated_hours_at_trigger: f64,
    pub interval_hours: f64,
}

impl MachineEvent {
    pub fn maintenance_due(
        machine: &Machine,
        alarm: &MaintenanceAlarm,
        triggered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Self::trigger_id(&machine.id, &alarm.id, alarm.times_triggered + 1),
            machine_id: machine.id.clone(),
            alarm_id: alarm.id.clone(),
            alarm_title: alarm.title.clone(),
            triggered_at,
            accumulated_hours_at_trigger: alarm.accumulated_hours,
            interval_hours: alarm.interval_hours,
        }
    }

    /// Stable id of the `ordinal`-th trigger of an alarm.
    pub fn trigger_id(machine_id: &str, alarm_id: &str, ordinal: u32) -> Uuid {
        let key = format!("{machine_id}/{alarm_id}/{ordinal}");
        Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    use crate::machine::UsageSchedule;

    fn fixture(times_triggered: u32) -> (Machine, MaintenanceAlarm) {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut alarm = MaintenanceAlarm::new("oil", "Oil change", 40.0, at).with_accumulated_hours(40.0);
        alarm.times_triggered = times_triggered;
        let machine = Machine::new("press-1", "Press", UsageSchedule::weekdays(8.0));
        (machine, alarm)
    }

    #[test]
    fn retried_trigger_keeps_its_id() {
        let (machine, alarm) = fixture(2);
        let now = Utc.with_ymd_and_hms(2024, 1, 8, 0, 0, 0).unwrap();
        let first = MachineEvent::maintenance_due(&machine, &alarm, now);
        let retry = MachineEvent::maintenance_due(&machine, &alarm, now + Duration::hours(1));
        assert_eq!(first.id, retry.id);
        assert_eq!(first.id, MachineEvent::trigger_id("press-1", "oil", 3));
    }

    #[test]
    fn each_trigger_ordinal_gets_a_new_id() {
        let (machine, first) = fixture(0);
        let (_, second) = fixture(1);
        let now = Utc.with_ymd_and_hms(2024, 1, 8, 0, 0, 0).unwrap();
        assert_ne!(
            MachineEvent::maintenance_due(&machine, &first, now).id,
            MachineEvent::maintenance_due(&machine, &second, now).id
        );
        assert_ne!(
            MachineEvent::trigger_id("press-1", "oil", 1),
            MachineEvent::trigger_id("press-2", "oil", 1)
        );
    }
}
