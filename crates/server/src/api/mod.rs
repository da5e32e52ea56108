//! Admin API endpoint modules.
//!
//! Each sub-module owns a single responsibility area.
//! Shared response types live here in mod.rs.

mod cron_jobs;
pub mod doc;
mod health;
mod machines;

use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use upkeep_alarms::AlarmError;

// ── Shared types ─────────────────────────────────────────────────

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

pub(crate) type ApiError = (StatusCode, Json<ErrorResponse>);

pub(crate) fn api_error(status: StatusCode, error: impl ToString) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
}

/// Map engine errors onto HTTP statuses.
pub(crate) fn alarm_error(e: AlarmError) -> ApiError {
    let status = match &e {
        AlarmError::MachineNotFound(_) | AlarmError::AlarmNotFound { .. } => StatusCode::NOT_FOUND,
        AlarmError::InvalidCron { .. } | AlarmError::InvalidTimezone(_) | AlarmError::Invalid(_) => {
            StatusCode::BAD_REQUEST
        }
        AlarmError::StaleCheckpoint { .. } => StatusCode::CONFLICT,
        AlarmError::Repository(_) | AlarmError::EventRecord(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    api_error(status, e)
}

// ── Re-exports ───────────────────────────────────────────────────
// Preserves flat `api::foo` import paths used by route registration.

pub use cron_jobs::{cron_jobs_start, cron_jobs_status, cron_jobs_stop, cron_jobs_trigger};
pub use health::health;
pub use machines::{machine_alarm_clear, machine_events, machines_list};
