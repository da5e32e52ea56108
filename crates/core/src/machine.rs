//! Machines, their usage schedules, and the maintenance alarms they own.

use chrono::{DateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::UpkeepError;

pub type MachineId = String;
pub type AlarmId = String;

/// How many hours a machine runs per day, and on which weekdays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSchedule {
    /// Operating hours on each operating day.
    pub daily_hours: f64,
    /// Weekdays on which the machine runs. Empty means it never accrues.
    #[serde(default)]
    pub operating_days: Vec<Weekday>,
}

impl UsageSchedule {
    pub fn new(daily_hours: f64, operating_days: impl IntoIterator<Item = Weekday>) -> Self {
        Self {
            daily_hours,
            operating_days: operating_days.into_iter().collect(),
        }
    }

    /// Monday through Friday.
    pub fn weekdays(daily_hours: f64) -> Self {
        Self::new(
            daily_hours,
            [
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ],
        )
    }

    pub fn operates_on(&self, day: Weekday) -> bool {
        self.operating_days.contains(&day)
    }

    /// Whether this schedule can ever add hours.
    pub fn accrues(&self) -> bool {
        self.daily_hours > 0.0 && !self.operating_days.is_empty()
    }

    pub fn validate(&self) -> Result<(), UpkeepError> {
        if !self.daily_hours.is_finite() || self.daily_hours < 0.0 {
            return Err(UpkeepError::InvalidSchedule(format!(
                "daily hours must be a non-negative number, got {}",
                self.daily_hours
            )));
        }
        if self.daily_hours > 24.0 {
            return Err(UpkeepError::InvalidSchedule(format!(
                "daily hours cannot exceed 24, got {}",
                self.daily_hours
            )));
        }
        Ok(())
    }
}

impl Default for UsageSchedule {
    fn default() -> Self {
        Self {
            daily_hours: 0.0,
            operating_days: Vec::new(),
        }
    }
}

/// A usage-based maintenance threshold attached to a machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceAlarm {
    pub id: AlarmId,
    pub title: String,
    /// Threshold at which the alarm fires.
    pub interval_hours: f64,
    /// Operating hours folded in since the last reset.
    #[serde(default)]
    pub accumulated_hours: f64,
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// `None` inherits the engine-wide default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_on_trigger: Option<bool>,
    /// Point up to which elapsed usage has been counted.
    pub last_accumulation_checkpoint: DateTime<Utc>,
    #[serde(default)]
    pub last_triggered_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub times_triggered: u32,
    /// Accumulated hours recorded at the last trigger.
    #[serde(default)]
    pub hours_at_last_trigger: Option<f64>,
}

fn default_true() -> bool {
    true
}

impl MaintenanceAlarm {
    pub fn new(
        id: impl Into<AlarmId>,
        title: impl Into<String>,
        interval_hours: f64,
        checkpoint: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            interval_hours,
            accumulated_hours: 0.0,
            is_active: true,
            reset_on_trigger: None,
            last_accumulation_checkpoint: checkpoint,
            last_triggered_at: None,
            times_triggered: 0,
            hours_at_last_trigger: None,
        }
    }

    pub fn with_reset_on_trigger(mut self, reset: bool) -> Self {
        self.reset_on_trigger = Some(reset);
        self
    }

    pub fn with_accumulated_hours(mut self, hours: f64) -> Self {
        self.accumulated_hours = hours;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Resolve the reset flag against an engine default.
    pub fn resets_on_trigger(&self, default: bool) -> bool {
        self.reset_on_trigger.unwrap_or(default)
    }

    pub fn is_overdue(&self) -> bool {
        self.accumulated_hours >= self.interval_hours
    }

    pub fn hours_remaining(&self) -> f64 {
        (self.interval_hours - self.accumulated_hours).max(0.0)
    }

    /// Progress toward the threshold, capped at 100.
    pub fn progress_percent(&self) -> f64 {
        if self.interval_hours <= 0.0 {
            return 0.0;
        }
        (self.accumulated_hours / self.interval_hours * 100.0).min(100.0)
    }

    pub fn validate(&self) -> Result<(), UpkeepError> {
        if !self.interval_hours.is_finite() || self.interval_hours <= 0.0 {
            return Err(UpkeepError::InvalidAlarm {
                alarm_id: self.id.clone(),
                reason: format!("interval hours must be positive, got {}", self.interval_hours),
            });
        }
        if !self.accumulated_hours.is_finite() || self.accumulated_hours < 0.0 {
            return Err(UpkeepError::InvalidAlarm {
                alarm_id: self.id.clone(),
                reason: format!(
                    "accumulated hours must be non-negative, got {}",
                    self.accumulated_hours
                ),
            });
        }
        Ok(())
    }
}

/// A piece of equipment whose usage drives maintenance alarms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Machine {
    pub id: MachineId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub usage_schedule: UsageSchedule,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub alarms: Vec<MaintenanceAlarm>,
}

impl Machine {
    pub fn new(id: impl Into<MachineId>, name: impl Into<String>, schedule: UsageSchedule) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            usage_schedule: schedule,
            is_active: true,
            alarms: Vec::new(),
        }
    }

    pub fn with_alarm(mut self, alarm: MaintenanceAlarm) -> Self {
        self.alarms.push(alarm);
        self
    }

    pub fn active_alarms(&self) -> impl Iterator<Item = &MaintenanceAlarm> {
        self.alarms.iter().filter(|a| a.is_active)
    }

    pub fn alarm(&self, alarm_id: &str) -> Option<&MaintenanceAlarm> {
        self.alarms.iter().find(|a| a.id == alarm_id)
    }

    pub fn alarm_mut(&mut self, alarm_id: &str) -> Option<&mut MaintenanceAlarm> {
        self.alarms.iter_mut().find(|a| a.id == alarm_id)
    }
}
