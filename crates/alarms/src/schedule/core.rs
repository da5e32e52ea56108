//! [`CronSchedule`]: a validated cron expression bound to a timezone.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use cron::Schedule;

use crate::error::AlarmError;

use super::cron::{normalize_cron, parse_timezone};

#[derive(Clone)]
pub struct CronSchedule {
    /// Expression as configured, before normalization.
    expression: String,
    schedule: Schedule,
    tz: Tz,
}

impl CronSchedule {
    /// Parse `expression` (5 or 6 fields) and `timezone` (IANA name, empty = UTC).
    pub fn parse(expression: &str, timezone: &str) -> Result<Self, AlarmError> {
        let tz = parse_timezone(timezone)?;
        Self::with_timezone(expression, tz)
    }

    pub fn with_timezone(expression: &str, tz: Tz) -> Result<Self, AlarmError> {
        let normalized = normalize_cron(expression);
        if normalized.is_empty() {
            return Err(AlarmError::InvalidCron {
                expression: expression.to_string(),
                reason: "expression is empty".to_string(),
            });
        }
        let schedule = Schedule::from_str(&normalized).map_err(|e| AlarmError::InvalidCron {
            expression: expression.to_string(),
            reason: e.to_string(),
        })?;
        // A syntactically valid expression can still never fire (e.g. Feb 30).
        if schedule.upcoming(tz).next().is_none() {
            return Err(AlarmError::InvalidCron {
                expression: expression.to_string(),
                reason: "expression never fires".to_string(),
            });
        }
        Ok(Self {
            expression: expression.trim().to_string(),
            schedule,
            tz,
        })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// First fire time strictly after `after`.
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.schedule
            .after(&after.with_timezone(&self.tz))
            .next()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// The next `count` fire times after `after`.
    pub fn upcoming(&self, after: DateTime<Utc>, count: usize) -> Vec<DateTime<Utc>> {
        self.schedule
            .after(&after.with_timezone(&self.tz))
            .take(count)
            .map(|dt| dt.with_timezone(&Utc))
            .collect()
    }
}

impl fmt::Debug for CronSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CronSchedule")
            .field("expression", &self.expression)
            .field("timezone", &self.tz.name())
            .finish()
    }
}
