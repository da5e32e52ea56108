//! Usage-based maintenance alarm engine.
//!
//! This crate provides:
//! - Conversion of a machine's usage schedule into accrued operating hours
//! - Threshold evaluation with one-trigger-per-crossing semantics
//! - Trigger side effects (audit event, bookkeeping, notification)
//! - A cron-driven service that runs passes over all machines, guarded by a
//!   single run-lock, with manual trigger and graceful stop
//! - In-memory collaborator implementations for local setups and tests

pub mod accumulator;
pub mod error;
pub mod evaluator;
pub mod history;
pub mod memory;
pub mod repository;
pub mod schedule;
pub mod service;
pub mod trigger;

pub use accumulator::{Accumulation, UsageAccumulator};
pub use error::AlarmError;
pub use evaluator::{AlarmEvaluator, AlarmStatus, Evaluation};
pub use history::{EventHistory, EventQuery};
pub use memory::InMemoryMachineStore;
pub use repository::{EventRecorder, MachineRepository};
pub use schedule::CronSchedule;
pub use service::{
    CronServiceConfig, CronServiceStatus, MaintenanceCronService, ServiceState, StartOutcome,
};
pub use trigger::{AlarmTriggerDispatcher, DispatchReport};
