//! Threshold evaluation with one-trigger-per-crossing semantics.
//!
//! A crossing is `accumulated_hours >= interval_hours`. With reset-on-trigger
//! the counter drops to zero after firing, so every crossing observed is new.
//! Without reset the counter keeps growing and the alarm fires once, then
//! stays handled until a human clears it. A clear drops the
//! `hours_at_last_trigger` marker; a counter found below the marker also
//! re-arms the alarm.

use serde::Serialize;

use upkeep_core::MaintenanceAlarm;

/// Why an alarm did or did not fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlarmStatus {
    Inactive,
    /// Non-positive or non-finite interval; never fires.
    Invalid,
    /// Below the threshold.
    Pending,
    Crossed,
    /// Overdue, but this crossing was already dispatched.
    AlreadyHandled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Evaluation {
    pub crossed: bool,
    pub status: AlarmStatus,
}

impl Evaluation {
    fn of(status: AlarmStatus) -> Self {
        Self {
            crossed: status == AlarmStatus::Crossed,
            status,
        }
    }
}

/// Decides whether an alarm's current state is a new crossing.
#[derive(Debug, Clone, Copy)]
pub struct AlarmEvaluator {
    default_reset_on_trigger: bool,
}

impl AlarmEvaluator {
    pub fn new(default_reset_on_trigger: bool) -> Self {
        Self {
            default_reset_on_trigger,
        }
    }

    pub fn evaluate(&self, alarm: &MaintenanceAlarm) -> Evaluation {
        if !alarm.is_active {
            return Evaluation::of(AlarmStatus::Inactive);
        }
        if !alarm.interval_hours.is_finite() || alarm.interval_hours <= 0.0 {
            return Evaluation::of(AlarmStatus::Invalid);
        }
        if alarm.accumulated_hours < alarm.interval_hours {
            return Evaluation::of(AlarmStatus::Pending);
        }
        if alarm.resets_on_trigger(self.default_reset_on_trigger) {
            return Evaluation::of(AlarmStatus::Crossed);
        }

        let handled = match alarm.hours_at_last_trigger {
            None => false,
            // Lowered below the marker: someone reset the counter.
            Some(marker) if alarm.accumulated_hours < marker => false,
            Some(_) => true,
        };

        if handled {
            Evaluation::of(AlarmStatus::AlreadyHandled)
        } else {
            Evaluation::of(AlarmStatus::Crossed)
        }
    }
}

impl Default for AlarmEvaluator {
    fn default() -> Self {
        Self::new(true)
    }
}
