//! In-memory audit history of fired alarms.
//!
//! Stores per-machine events capped at a configurable maximum (default 500)
//! with FIFO eviction. An event whose id is already held for its machine is
//! ignored, so a retried trigger is recorded once. Uses `std::sync::RwLock`;
//! the lock is never held across an await point.

use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use upkeep_core::MachineEvent;

use crate::error::AlarmError;
use crate::repository::EventRecorder;

/// Filters for [`EventHistory::query`].
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventQuery {
    pub alarm_id: Option<String>,
    /// Only events at or after this instant.
    pub since: Option<DateTime<Utc>>,
    /// Maximum number of events to return (default 100).
    pub limit: Option<u32>,
}

pub struct EventHistory {
    events: RwLock<HashMap<String, VecDeque<MachineEvent>>>,
    max_events_per_machine: usize,
}

impl EventHistory {
    pub fn new() -> Self {
        Self::with_max_events(500)
    }

    pub fn with_max_events(max: usize) -> Self {
        Self {
            events: RwLock::new(HashMap::new()),
            max_events_per_machine: max.max(1),
        }
    }

    /// Append an event. Returns `false` when an event with the same id is
    /// already held for the machine.
    pub fn push(&self, event: MachineEvent) -> bool {
        let mut guard = self.events.write().expect("event history lock poisoned");
        let deque = guard.entry(event.machine_id.clone()).or_default();
        if deque.iter().any(|e| e.id == event.id) {
            debug!(machine_id = %event.machine_id, event_id = %event.id, "duplicate audit event ignored");
            return false;
        }
        deque.push_back(event);
        while deque.len() > self.max_events_per_machine {
            if let Some(evicted) = deque.pop_front() {
                debug!(
                    machine_id = %evicted.machine_id,
                    event_id = %evicted.id,
                    "audit event evicted"
                );
            }
        }
        true
    }

    /// Events for a machine, newest first.
    pub fn query(&self, machine_id: &str, params: &EventQuery) -> Vec<MachineEvent> {
        let guard = self.events.read().expect("event history lock poisoned");
        let Some(deque) = guard.get(machine_id) else {
            return Vec::new();
        };

        let limit = params.limit.unwrap_or(100) as usize;

        deque
            .iter()
            .rev()
            .filter(|e| params.alarm_id.as_deref().map_or(true, |id| e.alarm_id == id))
            .filter(|e| params.since.map_or(true, |s| e.triggered_at >= s))
            .take(limit)
            .cloned()
            .collect()
    }

    /// Total events currently held across all machines.
    pub fn len(&self) -> usize {
        self.events
            .read()
            .expect("event history lock poisoned")
            .values()
            .map(VecDeque::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self, machine_id: &str) {
        let mut guard = self.events.write().expect("event history lock poisoned");
        guard.remove(machine_id);
    }
}

impl Default for EventHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventRecorder for EventHistory {
    async fn record_machine_event(&self, event: &MachineEvent) -> Result<(), AlarmError> {
        self.push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t(h: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::hours(h)
    }

    // One trigger per hour since t(0), so each event has its own ordinal.
    fn event(machine: &str, alarm: &str, at: DateTime<Utc>) -> MachineEvent {
        let machine = upkeep_core::Machine::new(machine, machine, Default::default());
        let mut alarm = upkeep_core::MaintenanceAlarm::new(alarm, alarm, 10.0, at).with_accumulated_hours(10.0);
        alarm.times_triggered = (at - t(0)).num_hours() as u32;
        MachineEvent::maintenance_due(&machine, &alarm, at)
    }

    #[test]
    fn query_returns_newest_first() {
        let history = EventHistory::new();
        history.push(event("m1", "a", t(1)));
        history.push(event("m1", "a", t(2)));
        history.push(event("m1", "a", t(3)));

        let events = history.query("m1", &EventQuery::default());
        let times: Vec<_> = events.iter().map(|e| e.triggered_at).collect();
        assert_eq!(times, vec![t(3), t(2), t(1)]);
    }

    #[test]
    fn evicts_oldest_beyond_cap() {
        let history = EventHistory::with_max_events(2);
        history.push(event("m1", "a", t(1)));
        history.push(event("m1", "a", t(2)));
        history.push(event("m1", "a", t(3)));

        let events = history.query("m1", &EventQuery::default());
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].triggered_at, t(2));
    }

    #[test]
    fn same_trigger_is_recorded_once() {
        let history = EventHistory::new();
        assert!(history.push(event("m1", "a", t(1))));
        let mut retry = event("m1", "a", t(1));
        retry.triggered_at = t(2);
        assert!(!history.push(retry));

        let events = history.query("m1", &EventQuery::default());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].triggered_at, t(1));

        // The same ordinal on another machine is a different trigger.
        assert!(history.push(event("m2", "a", t(1))));
    }

    #[test]
    fn filters_by_alarm_since_and_limit() {
        let history = EventHistory::new();
        history.push(event("m1", "oil", t(1)));
        history.push(event("m1", "belt", t(2)));
        history.push(event("m1", "oil", t(3)));
        history.push(event("m1", "oil", t(4)));

        let oil = history.query(
            "m1",
            &EventQuery {
                alarm_id: Some("oil".into()),
                since: Some(t(2)),
                limit: Some(1),
            },
        );
        assert_eq!(oil.len(), 1);
        assert_eq!(oil[0].triggered_at, t(4));
    }

    #[test]
    fn machines_are_isolated() {
        let history = EventHistory::new();
        history.push(event("m1", "a", t(1)));
        history.push(event("m2", "a", t(1)));
        history.clear("m1");
        assert!(history.query("m1", &EventQuery::default()).is_empty());
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn records_through_trait() {
        let history = EventHistory::new();
        history
            .record_machine_event(&event("m1", "a", t(1)))
            .await
            .unwrap();
        assert!(!history.is_empty());
    }

    #[tokio::test]
    async fn duplicate_through_trait_is_ok() {
        let history = EventHistory::new();
        let event = event("m1", "a", t(1));
        history.record_machine_event(&event).await.unwrap();
        history.record_machine_event(&event).await.unwrap();
        assert_eq!(history.len(), 1);
    }
}
