//! midi-pad - MIDI control surface to virtual Xbox 360 controller
//!
//! Commands: `debug` prints decoded MIDI traffic, `start` maps it onto a
//! virtual gamepad, `calibrate` is reserved, `list-ports` and `mappings`
//! describe the environment and the compiled-in table.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use midi_pad::config::{AppConfig, DEFAULT_CONFIG_PATH};
use midi_pad::gamepad::{open_backend, BackendKind};
use midi_pad::input::PortSelector;
use midi_pad::mapping::MappingTable;
use midi_pad::{session, sniffer};

/// midi-pad - drive a virtual Xbox 360 controller from a MIDI device
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// MIDI input port to use (index or name substring)
    #[arg(short = 'c', long = "controller", global = true)]
    controller: Option<String>,

    /// Path to configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Virtual gamepad backend
    #[arg(long, global = true, value_enum)]
    backend: Option<BackendKind>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, global = true, env = "LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print decoded MIDI messages from the input port
    Debug,
    /// Calibrate controls (not implemented)
    Calibrate,
    /// Map MIDI input onto the virtual gamepad
    Start,
    /// List available MIDI input ports
    ListPorts,
    /// Show the compiled-in mapping table
    Mappings,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let config = AppConfig::load_or_default(&args.config).await?;

    let log_level = args.log_level.clone().unwrap_or_else(|| config.log_level.clone());
    init_logging(&log_level)?;

    let selector: PortSelector = match &args.controller {
        Some(controller) => controller.parse().unwrap_or_default(),
        None => config.input_selector(),
    };

    match args.command {
        Command::Debug => sniffer::run_debug(&selector).await?,
        Command::Calibrate => {
            warn!("Calibration is not implemented");
        }
        Command::Start => {
            info!("Starting midi-pad...");
            let backend = args.backend.unwrap_or(config.gamepad.backend);
            let gamepad = open_backend(backend)?;
            session::run_live(&selector, gamepad).await?;
            info!("midi-pad shutdown complete");
        }
        Command::ListPorts => sniffer::list_ports_formatted()?,
        Command::Mappings => print_mappings(&MappingTable::default()),
    }

    Ok(())
}

fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .init();

    Ok(())
}

fn print_mappings(table: &MappingTable) {
    use colored::*;

    println!("\n{}", "=== Compiled-in Mappings ===".bold().cyan());
    println!("  Total rules: {}", table.len().to_string().green());

    for rule in table.rules() {
        println!(
            "  {:<16} ch:{:<2} #{:<3} => {}",
            rule.kind.to_string().yellow(),
            rule.channel,
            rule.number,
            rule.action.to_string().green()
        );
    }
    println!();
}
