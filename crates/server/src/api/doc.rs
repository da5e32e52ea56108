//! OpenAPI documentation aggregator.
//!
//! Collects all `#[utoipa::path]`-annotated handlers and `ToSchema`-derived
//! types into a single OpenAPI 3.1 document, served via Scalar UI at `/docs`.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "upkeep admin API",
        version = "0.1.0",
        description = "Usage-based maintenance alarms: schedule control, manual passes, and alarm history.",
    ),
    tags(
        (name = "Health", description = "Server liveness"),
        (name = "Maintenance", description = "Trigger, inspect, start and stop the maintenance schedule"),
        (name = "Machines", description = "Machine alarm progress, audit events and maintenance acknowledgement"),
    ),
    paths(
        crate::api::health::health,
        crate::api::cron_jobs::cron_jobs_trigger,
        crate::api::cron_jobs::cron_jobs_status,
        crate::api::cron_jobs::cron_jobs_start,
        crate::api::cron_jobs::cron_jobs_stop,
        crate::api::machines::machines_list,
        crate::api::machines::machine_events,
        crate::api::machines::machine_alarm_clear,
    ),
    components(schemas(
        crate::api::ErrorResponse,
        crate::api::health::HealthResponse,
        crate::api::cron_jobs::TriggerResponse,
        crate::api::cron_jobs::SkippedResponse,
        crate::api::cron_jobs::StartResponse,
        crate::api::cron_jobs::StopResponse,
        crate::api::machines::AlarmSummary,
        crate::api::machines::MachineSummary,
        crate::api::machines::ClearResponse,
    ))
)]
pub struct ApiDoc;
