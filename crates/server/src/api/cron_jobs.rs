//! Operator control of the maintenance schedule.
//!
//! SRP: trigger, inspect, arm and disarm the periodic pass.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use upkeep_alarms::{CronServiceStatus, StartOutcome};
use upkeep_core::{RunError, RunOutcome};

use crate::state::AppState;

use super::{alarm_error, ApiError};

/// Summary of a manual pass.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TriggerResponse {
    pub outcome: String,
    pub run_id: String,
    pub machines_processed: usize,
    pub alarms_evaluated: usize,
    pub alarms_triggered: usize,
    pub execution_time_ms: u64,
    pub timestamp: DateTime<Utc>,
    pub deadline_exceeded: bool,
    pub stopped_early: bool,
    #[schema(value_type = Vec<Object>)]
    pub errors: Vec<RunError>,
    #[schema(value_type = Vec<Object>)]
    pub notification_failures: Vec<RunError>,
    #[schema(value_type = Vec<Object>)]
    pub skipped: Vec<RunError>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SkippedResponse {
    pub skipped: bool,
    pub reason: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StartResponse {
    pub started: bool,
    pub already_running: bool,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StopResponse {
    pub stopped: bool,
    pub was_scheduled: bool,
}

#[utoipa::path(
    post,
    path = "/admin/cron-jobs/trigger",
    tag = "Maintenance",
    responses(
        (status = 200, description = "Pass executed", body = TriggerResponse),
        (status = 409, description = "A pass is already running", body = SkippedResponse)
    )
)]
pub async fn cron_jobs_trigger(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TriggerResponse>, (StatusCode, Json<SkippedResponse>)> {
    info!("manual maintenance pass requested");
    let outcome = state.service.trigger().await;
    let label = outcome.label().to_string();
    match outcome {
        RunOutcome::Skipped { reason } => Err((
            StatusCode::CONFLICT,
            Json(SkippedResponse {
                skipped: true,
                reason,
            }),
        )),
        RunOutcome::Success(r) | RunOutcome::PartialFailure(r) => Ok(Json(TriggerResponse {
            outcome: label,
            run_id: r.run_id.to_string(),
            machines_processed: r.machines_processed,
            alarms_evaluated: r.alarms_evaluated,
            alarms_triggered: r.alarms_triggered,
            execution_time_ms: r.duration_ms,
            timestamp: r.finished_at,
            deadline_exceeded: r.deadline_exceeded,
            stopped_early: r.stopped_early,
            errors: r.errors,
            notification_failures: r.notification_failures,
            skipped: r.skipped,
        })),
    }
}

#[utoipa::path(
    get,
    path = "/admin/cron-jobs/status",
    tag = "Maintenance",
    responses(
        (status = 200, description = "Scheduler state, last run and next fire time", body = Object)
    )
)]
pub async fn cron_jobs_status(State(state): State<Arc<AppState>>) -> Json<CronServiceStatus> {
    Json(state.service.status())
}

#[utoipa::path(
    post,
    path = "/admin/cron-jobs/start",
    tag = "Maintenance",
    responses(
        (status = 200, description = "Schedule armed (or already armed)", body = StartResponse),
        (status = 400, description = "Malformed schedule", body = super::ErrorResponse)
    )
)]
pub async fn cron_jobs_start(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StartResponse>, ApiError> {
    let outcome = state.service.start().map_err(alarm_error)?;
    Ok(Json(StartResponse {
        started: true,
        already_running: outcome == StartOutcome::AlreadyRunning,
    }))
}

#[utoipa::path(
    post,
    path = "/admin/cron-jobs/stop",
    tag = "Maintenance",
    responses(
        (status = 200, description = "Schedule disarmed after the in-flight pass finished", body = StopResponse)
    )
)]
pub async fn cron_jobs_stop(State(state): State<Arc<AppState>>) -> Json<StopResponse> {
    let was_scheduled = state.service.stop().await;
    Json(StopResponse {
        stopped: true,
        was_scheduled,
    })
}
