mod api;
mod cli;
mod engine;
mod router;
mod state;

use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use tracing::info;

use upkeep_alarms::CronSchedule;
use upkeep_core::Config;

use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    upkeep_core::config::load_dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env();
    cli.apply(&mut config);

    match cli.command.clone().unwrap_or_default() {
        Command::Serve { .. } => serve(config).await,
        Command::RunOnce => run_once(&config).await,
        Command::Schedule { count } => print_schedule(&config, count),
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    config.log_summary();

    let state = Arc::new(engine::build(&config)?);
    if config.maintenance.autostart {
        state
            .service
            .start()
            .with_context(|| format!("invalid MAINTENANCE_CRON '{}'", config.maintenance.cron))?;
    } else {
        info!("autostart disabled, schedule stays stopped until POST /admin/cron-jobs/start");
    }

    let app = router::build_router(state.clone(), &config.server.cors_origin);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Listening on {}", addr);
    info!("API docs at http://{}/docs", addr);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shutting down, waiting for any in-flight maintenance pass");
    state.service.stop().await;
    info!("shutdown complete");
    Ok(())
}

async fn run_once(config: &Config) -> anyhow::Result<()> {
    let state = engine::build(config)?;
    let outcome = state.service.trigger().await;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

fn print_schedule(config: &Config, count: usize) -> anyhow::Result<()> {
    let schedule = CronSchedule::parse(&config.maintenance.cron, &config.maintenance.timezone)?;
    println!("{} ({})", schedule.expression(), schedule.timezone());
    for at in schedule.upcoming(Utc::now(), count) {
        println!("  {}  ({})", at.to_rfc3339(), at.with_timezone(&schedule.timezone()));
    }
    Ok(())
}

/// Wait for SIGINT or SIGTERM (Unix) or Ctrl+C (cross-platform fallback).
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigint = signal(SignalKind::interrupt()).expect("failed to register SIGINT");
        let mut sigterm = signal(SignalKind::terminate()).expect("failed to register SIGTERM");
        tokio::select! {
            _ = sigint.recv() => {}
            _ = sigterm.recv() => {}
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl_c");
    }
}
