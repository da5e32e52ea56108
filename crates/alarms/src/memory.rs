//! Process-local [`MachineRepository`].
//!
//! Every write happens under one write-lock acquisition, so each repository
//! call is an atomic read-modify-write even when admin edits race a pass.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use upkeep_core::{Machine, MaintenanceAlarm, UpkeepError};

use crate::error::AlarmError;
use crate::repository::MachineRepository;

#[derive(Default)]
pub struct InMemoryMachineStore {
    machines: RwLock<BTreeMap<String, Machine>>,
}

impl InMemoryMachineStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_machines(machines: impl IntoIterator<Item = Machine>) -> Self {
        Self {
            machines: RwLock::new(machines.into_iter().map(|m| (m.id.clone(), m)).collect()),
        }
    }

    /// Load a JSON array of machines.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, AlarmError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(UpkeepError::from)?;
        let machines: Vec<Machine> = serde_json::from_str(&content).map_err(UpkeepError::from)?;
        Ok(Self::from_machines(machines))
    }

    /// Insert or replace a machine.
    pub fn upsert_machine(&self, machine: Machine) {
        self.machines
            .write()
            .expect("machine store lock poisoned")
            .insert(machine.id.clone(), machine);
    }

    pub fn machine(&self, machine_id: &str) -> Option<Machine> {
        self.machines
            .read()
            .expect("machine store lock poisoned")
            .get(machine_id)
            .cloned()
    }

    pub fn machines(&self) -> Vec<Machine> {
        self.machines
            .read()
            .expect("machine store lock poisoned")
            .values()
            .cloned()
            .collect()
    }

    /// Human acknowledgement of completed maintenance: zero the counter and
    /// drop the last-trigger marker so the next crossing fires.
    pub fn clear_alarm(&self, machine_id: &str, alarm_id: &str) -> Result<(), AlarmError> {
        self.with_alarm(machine_id, alarm_id, |alarm| {
            alarm.accumulated_hours = 0.0;
            alarm.hours_at_last_trigger = None;
            Ok(())
        })
    }

    fn with_alarm<T, F>(&self, machine_id: &str, alarm_id: &str, f: F) -> Result<T, AlarmError>
    where
        F: FnOnce(&mut MaintenanceAlarm) -> Result<T, AlarmError>,
    {
        let mut guard = self.machines.write().expect("machine store lock poisoned");
        let machine = guard
            .get_mut(machine_id)
            .ok_or_else(|| AlarmError::MachineNotFound(machine_id.to_string()))?;
        let alarm = machine
            .alarm_mut(alarm_id)
            .ok_or_else(|| AlarmError::AlarmNotFound {
                machine_id: machine_id.to_string(),
                alarm_id: alarm_id.to_string(),
            })?;
        f(alarm)
    }
}

#[async_trait]
impl MachineRepository for InMemoryMachineStore {
    async fn list_active_machines_with_active_alarms(&self) -> Result<Vec<Machine>, AlarmError> {
        let guard = self.machines.read().expect("machine store lock poisoned");
        Ok(guard
            .values()
            .filter(|m| m.is_active && m.active_alarms().next().is_some())
            .cloned()
            .collect())
    }

    async fn update_alarm_accumulation(
        &self,
        machine_id: &str,
        alarm_id: &str,
        additional_hours: f64,
        expected_checkpoint: DateTime<Utc>,
        new_checkpoint: DateTime<Utc>,
    ) -> Result<MaintenanceAlarm, AlarmError> {
        self.with_alarm(machine_id, alarm_id, |alarm| {
            if alarm.last_accumulation_checkpoint != expected_checkpoint
                || new_checkpoint <= expected_checkpoint
            {
                return Err(AlarmError::StaleCheckpoint {
                    machine_id: machine_id.to_string(),
                    alarm_id: alarm_id.to_string(),
                });
            }
            alarm.accumulated_hours = (alarm.accumulated_hours + additional_hours.max(0.0)).max(0.0);
            alarm.last_accumulation_checkpoint = new_checkpoint;
            Ok(alarm.clone())
        })
    }

    async fn record_alarm_trigger(
        &self,
        machine_id: &str,
        alarm_id: &str,
        triggered_at: DateTime<Utc>,
        reset_accumulated: bool,
        hours_at_trigger: f64,
    ) -> Result<(), AlarmError> {
        self.with_alarm(machine_id, alarm_id, |alarm| {
            alarm.last_triggered_at = Some(triggered_at);
            alarm.times_triggered = alarm.times_triggered.saturating_add(1);
            alarm.hours_at_last_trigger = Some(hours_at_trigger);
            if reset_accumulated {
                alarm.accumulated_hours = 0.0;
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use chrono::{Duration, TimeZone};
    use upkeep_core::UsageSchedule;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn store() -> InMemoryMachineStore {
        InMemoryMachineStore::from_machines(vec![
            Machine::new("press", "Press", UsageSchedule::weekdays(8.0))
                .with_alarm(MaintenanceAlarm::new("oil", "Oil", 40.0, t0())),
            Machine::new("idle", "Idle", UsageSchedule::weekdays(8.0))
                .with_alarm(MaintenanceAlarm::new("oil", "Oil", 40.0, t0()).inactive()),
            {
                let mut m = Machine::new("retired", "Retired", UsageSchedule::weekdays(8.0))
                    .with_alarm(MaintenanceAlarm::new("oil", "Oil", 40.0, t0()));
                m.is_active = false;
                m
            },
        ])
    }

    #[tokio::test]
    async fn lists_only_active_machines_with_active_alarms() {
        let machines = store().list_active_machines_with_active_alarms().await.unwrap();
        let ids: Vec<_> = machines.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["press"]);
    }

    #[tokio::test]
    async fn accumulation_rejects_already_counted_window() {
        let store = store();
        let stored = store
            .update_alarm_accumulation("press", "oil", 8.0, t0(), t0() + Duration::days(1))
            .await
            .unwrap();
        assert_eq!(stored.accumulated_hours, 8.0);
        assert_eq!(stored.last_accumulation_checkpoint, t0() + Duration::days(1));

        // A second writer still holding the old checkpoint would count Monday twice.
        let err = store
            .update_alarm_accumulation("press", "oil", 8.0, t0(), t0() + Duration::days(2))
            .await
            .unwrap_err();
        assert!(matches!(err, AlarmError::StaleCheckpoint { .. }));

        let err = store
            .update_alarm_accumulation(
                "press",
                "oil",
                8.0,
                t0() + Duration::days(1),
                t0() + Duration::days(1),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AlarmError::StaleCheckpoint { .. }));
        assert_eq!(store.machine("press").unwrap().alarms[0].accumulated_hours, 8.0);
    }

    #[tokio::test]
    async fn accumulation_adds_to_the_stored_total() {
        let store = store();
        store
            .record_alarm_trigger("press", "oil", t0(), false, 45.0)
            .await
            .unwrap();
        store
            .update_alarm_accumulation("press", "oil", 45.0, t0(), t0() + Duration::hours(1))
            .await
            .unwrap();

        // A clear between listing and writing must not be overwritten.
        store.clear_alarm("press", "oil").unwrap();
        let stored = store
            .update_alarm_accumulation(
                "press",
                "oil",
                1.0,
                t0() + Duration::hours(1),
                t0() + Duration::hours(2),
            )
            .await
            .unwrap();
        assert_eq!(stored.accumulated_hours, 1.0);
        assert_eq!(stored.hours_at_last_trigger, None);
    }

    #[tokio::test]
    async fn unknown_ids_are_reported() {
        let store = store();
        let err = store
            .record_alarm_trigger("nope", "oil", t0(), true, 1.0)
            .await
            .unwrap_err();
        assert!(matches!(err, AlarmError::MachineNotFound(_)));

        let err = store
            .record_alarm_trigger("press", "nope", t0(), true, 1.0)
            .await
            .unwrap_err();
        assert!(matches!(err, AlarmError::AlarmNotFound { .. }));
    }

    #[tokio::test]
    async fn clear_alarm_rearms_counter() {
        let store = store();
        store
            .record_alarm_trigger("press", "oil", t0(), false, 45.0)
            .await
            .unwrap();
        store.clear_alarm("press", "oil").unwrap();

        let alarm = store.machine("press").unwrap().alarms[0].clone();
        assert_eq!(alarm.accumulated_hours, 0.0);
        assert_eq!(alarm.hours_at_last_trigger, None);
        assert_eq!(alarm.times_triggered, 1);

        let evaluator = crate::evaluator::AlarmEvaluator::new(false);
        let recrossed = alarm.with_accumulated_hours(40.0);
        assert!(evaluator.evaluate(&recrossed).crossed);
    }

    #[test]
    fn loads_seed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id":"lathe","usageSchedule":{{"dailyHours":6,"operatingDays":["Mon"]}},
                "alarms":[{{"id":"belt","title":"Belt","intervalHours":100,
                "lastAccumulationCheckpoint":"2024-01-01T00:00:00Z"}}]}}]"#
        )
        .unwrap();

        let store = InMemoryMachineStore::from_json_file(file.path()).unwrap();
        let lathe = store.machine("lathe").unwrap();
        assert_eq!(lathe.usage_schedule.daily_hours, 6.0);
        assert_eq!(lathe.alarms[0].interval_hours, 100.0);
    }

    #[test]
    fn malformed_seed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(InMemoryMachineStore::from_json_file(file.path()).is_err());
    }
}
