//! lastmile: wireless and fiber feasibility checks
//!
//! One-shot checks from the command line, or a long-running bot speaking
//! line-delimited JSON on stdin/stdout for a chat bridge.

use clap::{Parser, Subcommand};
use lastmile_core::config::Config;
use lastmile_core::error::exit_codes;
use lastmile_telemetry::TelemetryConfig;
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;

/// Last-mile feasibility checks
#[derive(Parser)]
#[command(name = "lastmile")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file (defaults to lastmile.toml lookup)
    #[arg(short, long, global = true, env = "LASTMILE_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Also write logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check feasibility at a coordinate
    Check {
        /// Latitude in degrees
        #[arg(allow_negative_numbers = true)]
        latitude: f64,

        /// Longitude in degrees
        #[arg(allow_negative_numbers = true)]
        longitude: f64,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Include facility details
        #[arg(short, long)]
        detailed: bool,
    },

    /// Parse a message (pair, map URL or short link) and check it
    CheckText {
        /// Message text
        text: String,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Include facility details
        #[arg(short, long)]
        detailed: bool,
    },

    /// Run the bot over JSON lines on stdin/stdout
    Serve,

    /// Load configured facility sources and show what was found
    Inspect {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {e}", "Error:".red().bold());
            return ExitCode::from(exit_codes::CONFIG_ERROR as u8);
        }
    };

    let log_level = if cli.verbose {
        "debug".to_string()
    } else {
        config.schema.general.log_level.clone()
    };
    let _telemetry = match lastmile_telemetry::init_with_config(TelemetryConfig {
        log_level,
        json: cli.log_json,
        log_file: cli.log_file.clone(),
        ..TelemetryConfig::default()
    }) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{} {e}", "Error:".red().bold());
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Commands::Check {
            latitude,
            longitude,
            json,
            detailed,
        } => commands::check::run(&config, latitude, longitude, json, detailed).await,
        Commands::CheckText { text, json, detailed } => {
            commands::check::run_text(&config, &text, json, detailed).await
        }
        Commands::Serve => commands::serve::run(&config).await,
        Commands::Inspect { json } => commands::inspect::run(&config, json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<lastmile_core::Error>() {
                Some(err) if cli.log_json => {
                    eprintln!("{}", serde_json::to_string(&err.to_report()).unwrap_or_else(|_| err.to_string()));
                }
                _ => eprintln!("{} {e}", "Error:".red().bold()),
            }
            ExitCode::from(commands::exit_code(&e) as u8)
        }
    }
}
