//! Converts a usage schedule plus elapsed wall-clock time into operating hours.
//!
//! The window `[checkpoint, now)` is cut at local midnights in the configured
//! timezone. Each piece contributes `daily_hours` scaled by the fraction of
//! that local day it covers, but only if the local weekday is an operating
//! day. Scaling by the real length of the local day keeps DST days summing
//! to exactly `daily_hours`.

use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use upkeep_core::{MaintenanceAlarm, UsageSchedule};

/// Outcome of folding elapsed time into an alarm.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Accumulation {
    /// `now` is not after the checkpoint; nothing may be written.
    Unchanged,
    /// `additional_hours` accrued between the alarm's checkpoint and `checkpoint`.
    Advanced {
        additional_hours: f64,
        checkpoint: DateTime<Utc>,
    },
}

impl Accumulation {
    pub fn additional_hours(&self) -> f64 {
        match self {
            Accumulation::Unchanged => 0.0,
            Accumulation::Advanced {
                additional_hours, ..
            } => *additional_hours,
        }
    }
}

/// Computes operating hours between checkpoints in a fixed timezone.
#[derive(Debug, Clone, Copy)]
pub struct UsageAccumulator {
    tz: Tz,
}

impl UsageAccumulator {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn utc() -> Self {
        Self { tz: Tz::UTC }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Hours accrued by `alarm` since its checkpoint, up to `now`.
    pub fn accumulate(
        &self,
        schedule: &UsageSchedule,
        alarm: &MaintenanceAlarm,
        now: DateTime<Utc>,
    ) -> Accumulation {
        let checkpoint = alarm.last_accumulation_checkpoint;
        if now <= checkpoint {
            return Accumulation::Unchanged;
        }

        Accumulation::Advanced {
            additional_hours: self.operating_hours_between(schedule, checkpoint, now),
            checkpoint: now,
        }
    }

    /// Operating hours in `[from, to)`. Never negative.
    pub fn operating_hours_between(
        &self,
        schedule: &UsageSchedule,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> f64 {
        if to <= from || !schedule.accrues() {
            return 0.0;
        }

        let mut total = 0.0;
        let mut cursor = from;

        while cursor < to {
            let day = cursor.with_timezone(&self.tz).date_naive();
            let Some(next_day) = day.succ_opt() else {
                break;
            };
            let day_start = self.start_of_day(day);
            let next_day_start = self.start_of_day(next_day);
            let segment_end = next_day_start.min(to);
            if segment_end <= cursor {
                break;
            }

            if schedule.operates_on(day.weekday()) {
                let day_ms = (next_day_start - day_start).num_milliseconds();
                if day_ms > 0 {
                    let segment_ms = (segment_end - cursor).num_milliseconds();
                    total += schedule.daily_hours * segment_ms as f64 / day_ms as f64;
                }
            }

            cursor = segment_end;
        }

        total.max(0.0)
    }

    /// First instant of `day` in the configured timezone.
    fn start_of_day(&self, day: NaiveDate) -> DateTime<Utc> {
        let midnight = day.and_time(NaiveTime::MIN);
        match self.tz.from_local_datetime(&midnight) {
            LocalResult::Single(t) => t.with_timezone(&Utc),
            LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
            // Midnight falls in a DST gap: the day starts once clocks jump.
            LocalResult::None => self
                .tz
                .from_local_datetime(&(midnight + Duration::hours(1)))
                .earliest()
                .map(|t| t.with_timezone(&Utc))
                .unwrap_or_else(|| Utc.from_utc_datetime(&midnight)),
        }
    }
}

impl Default for UsageAccumulator {
    fn default() -> Self {
        Self::utc()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn alarm_at(checkpoint: DateTime<Utc>) -> MaintenanceAlarm {
        MaintenanceAlarm::new("oil", "Oil change", 40.0, checkpoint)
    }

    // 2024-01-01 is a Monday.

    #[test]
    fn full_work_week_accrues_five_days() {
        let acc = UsageAccumulator::utc();
        let schedule = UsageSchedule::weekdays(8.0);
        let alarm = alarm_at(utc(2024, 1, 1, 0, 0));

        let result = acc.accumulate(&schedule, &alarm, utc(2024, 1, 8, 0, 0));
        assert_eq!(
            result,
            Accumulation::Advanced {
                additional_hours: 40.0,
                checkpoint: utc(2024, 1, 8, 0, 0),
            }
        );
    }

    #[test]
    fn same_day_is_prorated() {
        let acc = UsageAccumulator::utc();
        let schedule = UsageSchedule::weekdays(8.0);
        let alarm = alarm_at(utc(2024, 1, 1, 0, 0));

        let result = acc.accumulate(&schedule, &alarm, utc(2024, 1, 1, 12, 0));
        assert_eq!(result.additional_hours(), 4.0);
    }

    #[test]
    fn partial_days_at_both_ends_skip_weekend() {
        let acc = UsageAccumulator::utc();
        let schedule = UsageSchedule::weekdays(8.0);
        // Friday noon to Monday noon: half of Friday and half of Monday.
        let hours = acc.operating_hours_between(&schedule, utc(2024, 1, 5, 12, 0), utc(2024, 1, 8, 12, 0));
        assert_eq!(hours, 8.0);
    }

    #[test]
    fn non_operating_same_day_accrues_nothing() {
        let acc = UsageAccumulator::utc();
        let schedule = UsageSchedule::weekdays(8.0);
        // Saturday morning to Saturday evening.
        let hours = acc.operating_hours_between(&schedule, utc(2024, 1, 6, 6, 0), utc(2024, 1, 6, 18, 0));
        assert_eq!(hours, 0.0);
    }

    #[test]
    fn zero_hours_or_no_days_never_accrue() {
        let acc = UsageAccumulator::utc();
        let from = utc(2024, 1, 1, 0, 0);
        let to = utc(2025, 1, 1, 0, 0);
        assert_eq!(acc.operating_hours_between(&UsageSchedule::weekdays(0.0), from, to), 0.0);
        assert_eq!(acc.operating_hours_between(&UsageSchedule::new(8.0, []), from, to), 0.0);

        let result = acc.accumulate(&UsageSchedule::new(8.0, []), &alarm_at(from), to);
        assert_eq!(result.additional_hours(), 0.0);
    }

    #[test]
    fn clock_skew_leaves_checkpoint_alone() {
        let acc = UsageAccumulator::utc();
        let schedule = UsageSchedule::weekdays(8.0);
        let checkpoint = utc(2024, 1, 3, 12, 0);
        let alarm = alarm_at(checkpoint).with_accumulated_hours(12.0);

        let result = acc.accumulate(&schedule, &alarm, checkpoint - Duration::hours(2));
        assert_eq!(result, Accumulation::Unchanged);
        assert_eq!(result.additional_hours(), 0.0);

        assert_eq!(acc.accumulate(&schedule, &alarm, checkpoint), Accumulation::Unchanged);
    }

    #[test]
    fn advanced_window_ends_at_now() {
        let acc = UsageAccumulator::utc();
        let schedule = UsageSchedule::new(10.0, [Weekday::Mon]);
        let mut alarm = alarm_at(utc(2024, 1, 1, 0, 0)).with_accumulated_hours(5.0);

        let now = utc(2024, 1, 1, 12, 0);
        let result = acc.accumulate(&schedule, &alarm, now);
        assert_eq!(
            result,
            Accumulation::Advanced {
                additional_hours: 5.0,
                checkpoint: now,
            }
        );
        alarm.last_accumulation_checkpoint = now;

        // Re-running with the same `now` must not count the window twice.
        let again = acc.accumulate(&schedule, &alarm, now);
        assert_eq!(again, Accumulation::Unchanged);
    }

    #[test]
    fn successive_windows_sum_to_one_window() {
        let acc = UsageAccumulator::utc();
        let schedule = UsageSchedule::weekdays(7.5);
        let start = utc(2024, 1, 1, 9, 0);
        let mid = utc(2024, 1, 4, 15, 0);
        let end = utc(2024, 1, 10, 3, 0);

        let split = acc.operating_hours_between(&schedule, start, mid)
            + acc.operating_hours_between(&schedule, mid, end);
        let whole = acc.operating_hours_between(&schedule, start, end);
        assert!((split - whole).abs() < 1e-9, "split={split} whole={whole}");
    }

    #[test]
    fn weekday_boundaries_follow_configured_timezone() {
        let acc = UsageAccumulator::new(chrono_tz::America::New_York);
        let schedule = UsageSchedule::new(8.0, [Weekday::Mon]);
        // Monday 2024-01-08 00:00 to Tuesday 00:00 in New York (UTC-5).
        let hours = acc.operating_hours_between(&schedule, utc(2024, 1, 8, 5, 0), utc(2024, 1, 9, 5, 0));
        assert_eq!(hours, 8.0);

        // The same UTC window measured in UTC only covers 19h of Monday.
        let utc_hours = UsageAccumulator::utc().operating_hours_between(
            &schedule,
            utc(2024, 1, 8, 5, 0),
            utc(2024, 1, 9, 5, 0),
        );
        assert!(utc_hours < 8.0);
    }

    #[test]
    fn short_dst_day_still_counts_full_daily_hours() {
        let acc = UsageAccumulator::new(chrono_tz::Europe::Berlin);
        // 2024-03-31 (Sunday) is 23 hours long in Berlin.
        let schedule = UsageSchedule::new(10.0, [Weekday::Sun]);
        let from = utc(2024, 3, 30, 23, 0); // 00:00 CET
        let to = utc(2024, 3, 31, 22, 0); // 00:00 CEST next day
        assert_eq!(acc.operating_hours_between(&schedule, from, to), 10.0);
    }

    #[test]
    fn long_gaps_accumulate_every_operating_day() {
        let acc = UsageAccumulator::utc();
        let schedule = UsageSchedule::new(1.0, [Weekday::Wed]);
        // 52 full weeks starting Monday 2024-01-01.
        let from = utc(2024, 1, 1, 0, 0);
        let to = from + Duration::weeks(52);
        assert_eq!(acc.operating_hours_between(&schedule, from, to), 52.0);
    }
}
