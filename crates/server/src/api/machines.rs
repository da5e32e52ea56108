//! Operator view of machines, alarm progress and audit history.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use upkeep_alarms::EventQuery;
use upkeep_core::{Machine, MachineEvent, MaintenanceAlarm};

use crate::state::AppState;

use super::{alarm_error, api_error, ApiError};

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AlarmSummary {
    pub id: String,
    pub title: String,
    pub is_active: bool,
    pub interval_hours: f64,
    pub accumulated_hours: f64,
    pub hours_remaining: f64,
    pub progress_percent: f64,
    pub is_overdue: bool,
    pub times_triggered: u32,
    pub last_triggered_at: Option<DateTime<Utc>>,
    pub last_accumulation_checkpoint: DateTime<Utc>,
}

impl From<&MaintenanceAlarm> for AlarmSummary {
    fn from(alarm: &MaintenanceAlarm) -> Self {
        Self {
            id: alarm.id.clone(),
            title: alarm.title.clone(),
            is_active: alarm.is_active,
            interval_hours: alarm.interval_hours,
            accumulated_hours: alarm.accumulated_hours,
            hours_remaining: alarm.hours_remaining(),
            progress_percent: alarm.progress_percent(),
            is_overdue: alarm.is_overdue(),
            times_triggered: alarm.times_triggered,
            last_triggered_at: alarm.last_triggered_at,
            last_accumulation_checkpoint: alarm.last_accumulation_checkpoint,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MachineSummary {
    pub id: String,
    pub name: String,
    pub is_active: bool,
    pub daily_hours: f64,
    pub alarms: Vec<AlarmSummary>,
}

impl From<&Machine> for MachineSummary {
    fn from(machine: &Machine) -> Self {
        Self {
            id: machine.id.clone(),
            name: machine.name.clone(),
            is_active: machine.is_active,
            daily_hours: machine.usage_schedule.daily_hours,
            alarms: machine.alarms.iter().map(AlarmSummary::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClearResponse {
    pub cleared: bool,
    pub alarm: AlarmSummary,
}

#[utoipa::path(
    get,
    path = "/admin/machines",
    tag = "Machines",
    responses(
        (status = 200, description = "All machines with alarm progress", body = Vec<MachineSummary>)
    )
)]
pub async fn machines_list(State(state): State<Arc<AppState>>) -> Json<Vec<MachineSummary>> {
    Json(state.store.machines().iter().map(MachineSummary::from).collect())
}

#[utoipa::path(
    get,
    path = "/admin/machines/{id}/events",
    tag = "Machines",
    params(
        ("id" = String, Path, description = "Machine ID"),
        ("alarmId" = Option<String>, Query, description = "Only events of this alarm"),
        ("since" = Option<String>, Query, description = "RFC 3339 lower bound on trigger time"),
        ("limit" = Option<u32>, Query, description = "Maximum events to return (default 100)")
    ),
    responses(
        (status = 200, description = "Maintenance events, newest first", body = Vec<Object>),
        (status = 404, description = "Machine not found", body = super::ErrorResponse)
    )
)]
pub async fn machine_events(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<EventQuery>,
) -> Result<Json<Vec<MachineEvent>>, ApiError> {
    if state.store.machine(&id).is_none() {
        return Err(api_error(StatusCode::NOT_FOUND, format!("machine not found: {id}")));
    }
    Ok(Json(state.history.query(&id, &params)))
}

#[utoipa::path(
    post,
    path = "/admin/machines/{id}/alarms/{alarm_id}/clear",
    tag = "Machines",
    params(
        ("id" = String, Path, description = "Machine ID"),
        ("alarm_id" = String, Path, description = "Alarm ID")
    ),
    responses(
        (status = 200, description = "Maintenance acknowledged, counter cleared", body = ClearResponse),
        (status = 404, description = "Machine or alarm not found", body = super::ErrorResponse)
    )
)]
pub async fn machine_alarm_clear(
    State(state): State<Arc<AppState>>,
    Path((id, alarm_id)): Path<(String, String)>,
) -> Result<Json<ClearResponse>, ApiError> {
    state.store.clear_alarm(&id, &alarm_id).map_err(alarm_error)?;
    info!(machine_id = %id, alarm_id = %alarm_id, "maintenance acknowledged, alarm cleared");

    let machine = state.store.machine(&id);
    let alarm = machine
        .as_ref()
        .and_then(|m| m.alarm(&alarm_id))
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("alarm not found: {id}/{alarm_id}")))?;
    Ok(Json(ClearResponse {
        cleared: true,
        alarm: AlarmSummary::from(alarm),
    }))
}
