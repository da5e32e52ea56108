//! Tests for the schedule module.

use chrono::{DateTime, TimeZone, Timelike, Utc};

use crate::error::AlarmError;
use crate::schedule::{normalize_cron, parse_timezone, CronSchedule};

fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

// -- normalize_cron ----------------------------------------------------

#[test]
fn normalize_cron_5_to_6_fields() {
    assert_eq!(normalize_cron("*/15 * * * *"), "0 */15 * * * *");
    assert_eq!(normalize_cron("0 6 * * 1-5"), "0 0 6 * * 1-5");
}

#[test]
fn normalize_cron_already_6_fields() {
    assert_eq!(normalize_cron("0 */15 * * * *"), "0 */15 * * * *");
}

#[test]
fn normalize_cron_trims_whitespace() {
    assert_eq!(normalize_cron("  */5 * * * *  "), "0 */5 * * * *");
}

// -- parse_timezone ----------------------------------------------------

#[test]
fn parse_timezone_accepts_iana_names() {
    assert_eq!(parse_timezone("Europe/Berlin").unwrap(), chrono_tz::Europe::Berlin);
    assert_eq!(parse_timezone("").unwrap(), chrono_tz::Tz::UTC);
}

#[test]
fn parse_timezone_rejects_unknown() {
    assert!(matches!(
        parse_timezone("Mars/Olympus"),
        Err(AlarmError::InvalidTimezone(_))
    ));
}

// -- CronSchedule ------------------------------------------------------

#[test]
fn hourly_schedule_fires_on_the_hour() {
    let schedule = CronSchedule::parse("0 * * * *", "UTC").unwrap();
    assert_eq!(schedule.next_after(utc(2024, 1, 1, 10, 15)), Some(utc(2024, 1, 1, 11, 0)));
}

#[test]
fn next_after_is_strictly_after() {
    let schedule = CronSchedule::parse("0 * * * *", "UTC").unwrap();
    assert_eq!(schedule.next_after(utc(2024, 1, 1, 11, 0)), Some(utc(2024, 1, 1, 12, 0)));
}

#[test]
fn schedule_follows_local_time() {
    // 06:00 in Berlin is 05:00 UTC in winter and 04:00 UTC in summer.
    let schedule = CronSchedule::parse("0 6 * * *", "Europe/Berlin").unwrap();
    let winter = schedule.next_after(utc(2024, 1, 10, 0, 0)).unwrap();
    assert_eq!(winter.hour(), 5);
    let summer = schedule.next_after(utc(2024, 7, 10, 0, 0)).unwrap();
    assert_eq!(summer.hour(), 4);
}

#[test]
fn upcoming_lists_consecutive_fires() {
    let schedule = CronSchedule::parse("*/30 * * * *", "UTC").unwrap();
    let fires = schedule.upcoming(utc(2024, 1, 1, 0, 5), 3);
    assert_eq!(
        fires,
        vec![utc(2024, 1, 1, 0, 30), utc(2024, 1, 1, 1, 0), utc(2024, 1, 1, 1, 30)]
    );
}

#[test]
fn invalid_expressions_are_rejected() {
    for expr in ["", "not a cron", "61 * * * *", "* * *"] {
        let err = CronSchedule::parse(expr, "UTC").unwrap_err();
        assert!(matches!(err, AlarmError::InvalidCron { .. }), "{expr}: {err}");
    }
}

#[test]
fn invalid_timezone_is_rejected() {
    assert!(matches!(
        CronSchedule::parse("0 * * * *", "Nowhere/City"),
        Err(AlarmError::InvalidTimezone(_))
    ));
}

#[test]
fn keeps_configured_expression() {
    let schedule = CronSchedule::parse(" 0 * * * * ", "UTC").unwrap();
    assert_eq!(schedule.expression(), "0 * * * *");
}
