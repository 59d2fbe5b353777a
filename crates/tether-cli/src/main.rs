//! Tether CLI: config validation and scripted break scenarios.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "tether")]
#[command(version, about = "Tether: break logic for physically-simulated tethers")]
struct Cli {
    /// Log filter (overridden by RUST_LOG).
    #[arg(long, global = true, default_value = "warn")]
    log: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a tether config file.
    Validate {
        /// Path to tether config (TOML).
        path: String,
    },

    /// Run scripted break scenarios on the kinematic backend.
    Run {
        /// Which scenario to run (distance, pluck, release-pop, suppressed,
        /// gate, startup-retry, all).
        #[arg(short, long, default_value = "all")]
        scenario: String,

        /// Base config (TOML). Defaults are used when omitted.
        #[arg(short, long)]
        config: Option<String>,

        /// Print reports as JSON instead of a summary.
        #[arg(long)]
        json: bool,

        /// Forward every tether event to the log.
        #[arg(long)]
        trace_events: bool,
    },

    /// Print the default config as TOML.
    Defaults {
        /// Preset to print (default, planar_toy, rigid).
        #[arg(short, long, default_value = "default")]
        preset: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Validate { path } => commands::validate(&path),
        Commands::Run {
            scenario,
            config,
            json,
            trace_events,
        } => commands::run(&scenario, config.as_deref(), json, trace_events),
        Commands::Defaults { preset } => commands::defaults(&preset),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
