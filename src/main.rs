//! MIDI Letters - turn MIDI notes into keystrokes

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use midi_letters::config::{AppConfig, ConfigStore, FileConfigStore, ReloadGate};
use midi_letters::injector::{self, ConsoleInjector, KeystrokeInjector};
use midi_letters::input::{self, NoteSource};
use midi_letters::paths::AppPaths;
use midi_letters::pipeline::{self, Pipeline};

/// MIDI Letters - type text by playing a MIDI keyboard
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML, or JSON with a .json extension)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// List available MIDI input ports and exit
    #[arg(long)]
    list_ports: bool,

    /// MIDI input device index, overriding the configuration file
    #[arg(short, long)]
    device: Option<i64>,

    /// Log keystrokes instead of sending them to the OS
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();

    init_logging(&args.log_level)?;

    // Handle list ports
    if args.list_ports {
        input::print_ports(&input::discover_input_ports()?);
        return Ok(());
    }

    let paths = AppPaths::detect(args.config.as_deref());
    info!(
        "Configuration file: {} ({})",
        paths.config.display(),
        if paths.is_local { "local" } else { "user config directory" }
    );

    let config = AppConfig::load_or_create(&paths.config)?;

    let ports = input::discover_input_ports()?;
    input::print_ports(&ports);

    let device_index = args.device.unwrap_or(config.midi_device_index);
    let port = input::select_port(&ports, device_index)?.clone();

    info!("Using MIDI input device index: {} ({})", port.index, port.name);
    info!("Enharmonic Mode: {}", config.mode);
    info!("Tap Mode: {}", config.tap_mode);

    let mut source = NoteSource::connect(port.index)?;

    let backend: Box<dyn KeystrokeInjector> = if args.dry_run {
        Box::new(ConsoleInjector::new("dry-run"))
    } else {
        injector::platform()
    };
    info!("Keystroke backend: {}", backend.name());

    let store = FileConfigStore::new(&paths.config);
    let gate = ReloadGate::default().with_observed(store.modified().ok());
    let mut session = Pipeline::new(config, store, gate, backend);

    info!("Listening on '{}'. Press Ctrl+C to exit.", source.port_name());
    let handled = pipeline::run(&mut session, source.events(), shutdown_signal()).await;
    match session.last_note() {
        Some(note) => info!("Processed {} notes, last resolved MIDI {}", handled, note),
        None => info!("Processed {} notes", handled),
    }

    info!("MIDI Letters shutdown complete");
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

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");
}
