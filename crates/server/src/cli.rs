//! CLI argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use upkeep_core::Config;

/// Usage-based maintenance alarm engine.
#[derive(Parser, Debug)]
#[command(name = "upkeep", version, about)]
pub struct Cli {
    /// JSON file of machines loaded into the in-memory store.
    #[arg(long, global = true, env = "UPKEEP_SEED_FILE")]
    pub seed_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Start the admin HTTP server (default).
    Serve {
        /// Port to bind, overrides UPKEEP_PORT.
        #[arg(long)]
        port: Option<u16>,

        /// Do not arm the schedule at boot; use POST /admin/cron-jobs/start.
        #[arg(long)]
        no_autostart: bool,
    },
    /// Run a single maintenance pass, print the result as JSON, and exit.
    RunOnce,
    /// Print the next fire times of the configured schedule.
    Schedule {
        #[arg(long, default_value_t = 5)]
        count: usize,
    },
}

impl Default for Command {
    fn default() -> Self {
        Command::Serve {
            port: None,
            no_autostart: false,
        }
    }
}

impl Cli {
    /// Fold command-line overrides into the environment-derived config.
    pub fn apply(&self, config: &mut Config) {
        if let Some(seed) = &self.seed_file {
            config.server.seed_file = Some(seed.clone());
        }
        if let Some(Command::Serve { port, no_autostart }) = &self.command {
            if let Some(port) = port {
                config.server.port = *port;
            }
            if *no_autostart {
                config.maintenance.autostart = false;
            }
        }
    }
}
