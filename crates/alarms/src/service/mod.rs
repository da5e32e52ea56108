//! Cron-driven maintenance pass runner.
//!
//! Split into focused submodules:
//! - `core`: service struct, configuration, and constructor
//! - `execution`: a single pass over all machines under the run-lock
//! - `lifecycle`: arming and disarming the periodic timer
//! - `status`: counters and the status snapshot served to operators

mod core;
mod execution;
mod lifecycle;
mod status;

pub use self::core::{CronServiceConfig, MaintenanceCronService};
pub use self::lifecycle::StartOutcome;
pub use self::status::{CronServiceStatus, ServiceState};
