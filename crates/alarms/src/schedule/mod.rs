//! Cron timing for the periodic maintenance pass.
//!
//! Expressions use the standard 5-field form (`min hour dom month dow`) or
//! the 6-field form with seconds. They are evaluated in an IANA timezone so
//! "every day at 06:00" means local 06:00 across DST changes.

mod core;
pub(crate) mod cron;

#[cfg(test)]
mod tests;

pub use self::core::CronSchedule;
pub use self::cron::{normalize_cron, parse_timezone};
