use clap::{Parser, Subcommand};
use std::path::Path;
use tracing_subscriber::EnvFilter;

use cloudfield::cli::commands::{self, GodAction};
use cloudfield::config::simulation::SimulationConfig;
use cloudfield::weather::WeatherState;

#[derive(Parser)]
#[command(name = "cloudfield")]
#[command(about = "A procedural local-weather simulation of independent cloud cells")]
#[command(version)]
struct Cli {
    /// Path to the configuration file (defaults apply if it does not exist)
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the simulation in real time, streaming events as JSON lines
    Run {
        /// Stop after this many ticks
        #[arg(short, long)]
        ticks: Option<u64>,
    },

    /// Simulate headlessly, then print the field or a single cell
    Inspect {
        /// Number of ticks to simulate first
        #[arg(short, long, default_value_t = 600)]
        ticks: u64,

        /// Cell index to show in detail
        #[arg(long)]
        cell: Option<usize>,
    },

    /// Simulate headlessly, then report local weather at a surface point
    Query {
        /// Latitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Longitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Number of ticks to simulate first
        #[arg(short, long, default_value_t = 600)]
        ticks: u64,
    },

    /// Apply a debug override, simulate, and print the outcome
    God {
        #[command(subcommand)]
        action: GodCommand,

        /// Number of ticks to simulate after the override
        #[arg(short, long, default_value_t = 100, global = true)]
        ticks: u64,
    },
}

#[derive(Subcommand)]
enum GodCommand {
    /// Force every storm-capable cell into a storm
    Storm,
    /// Clear every cell
    Clear,
    /// Force one cell into a state
    Set {
        /// Cell index (out-of-range values are ignored)
        #[arg(allow_hyphen_values = true)]
        index: i64,
        /// clear, cloudy, rain or storm
        state: WeatherState,
    },
}

fn init_logging(config: &SimulationConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if config.log_format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match SimulationConfig::from_file_or_default(Path::new(&cli.config)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            std::process::exit(1);
        }
    };
    init_logging(&config);

    let result = match cli.command {
        Commands::Run { ticks } => commands::run_simulation(&config, ticks).await,
        Commands::Inspect { ticks, cell } => commands::inspect(&config, ticks, cell),
        Commands::Query { lat, lon, ticks } => commands::query(&config, ticks, lat, lon),
        Commands::God { action, ticks } => {
            let action = match action {
                GodCommand::Storm => GodAction::Storm,
                GodCommand::Clear => GodAction::Clear,
                GodCommand::Set { index, state } => GodAction::Set { index, state },
            };
            commands::god(&config, &action, ticks)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
