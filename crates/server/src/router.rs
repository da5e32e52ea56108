//! HTTP router construction.
//!
//! Assembles the admin routes, middleware, and OpenAPI docs into a single `Router`.

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::api;
use crate::state::AppState;

/// Build the complete application router with all routes and middleware.
pub fn build_router(state: Arc<AppState>, cors_origin: &str) -> Router {
    Router::new()
        .route("/health", get(api::health))
        // Maintenance schedule control
        .route("/admin/cron-jobs/trigger", post(api::cron_jobs_trigger))
        .route("/admin/cron-jobs/status", get(api::cron_jobs_status))
        .route("/admin/cron-jobs/start", post(api::cron_jobs_start))
        .route("/admin/cron-jobs/stop", post(api::cron_jobs_stop))
        // Machines and alarm history
        .route("/admin/machines", get(api::machines_list))
        .route("/admin/machines/{id}/events", get(api::machine_events))
        .route(
            "/admin/machines/{id}/alarms/{alarm_id}/clear",
            post(api::machine_alarm_clear),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origin))
        .with_state(state)
        .merge(Scalar::with_url("/docs", api::doc::ApiDoc::openapi()))
}

fn cors_layer(origin: &str) -> CorsLayer {
    if origin == "*" {
        return CorsLayer::permissive();
    }
    match origin.parse::<HeaderValue>() {
        Ok(value) => CorsLayer::new()
            .allow_origin(value)
            .allow_methods(Any)
            .allow_headers(Any),
        Err(e) => {
            warn!(origin, error = %e, "invalid CORS origin, cross-origin requests disabled");
            CorsLayer::new()
        }
    }
}
