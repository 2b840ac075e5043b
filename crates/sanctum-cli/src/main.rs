//! Sanctum CLI -- the main entry point.
//!
//! Provides commands for running the interactive shell, listing installed
//! apps and reporting system status.

mod repl;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sanctum_system::config::DEFAULT_CONFIG_PATH;
use sanctum_system::{Bridge, SimulatedTransport, System, SystemConfig};
use tracing_subscriber::EnvFilter;

/// Sanctum: a desktop environment kernel you can drive from a terminal.
#[derive(Parser)]
#[command(name = "sanctum", version, about)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Keep all state in memory for this run.
    #[arg(long, global = true)]
    ephemeral: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Boot the system and open an interactive shell on an app.
    Run {
        /// App to attach to after boot.
        #[arg(long, default_value = "system.terminal")]
        app: String,
    },
    /// List installed apps.
    Apps,
    /// Boot, print a status report and shut down.
    Status {
        /// Print the full state snapshot as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let (config, fallback) = SystemConfig::try_load(&cli.config);
    let mut config = config.with_env_overrides();
    if cli.ephemeral {
        config.storage.in_memory = true;
    }

    init_tracing(&config.logging.level);
    report_config(&cli.config, fallback.as_deref());

    match cli.command {
        Commands::Run { app } => repl::cmd_run(config, &app).await,
        Commands::Apps => cmd_apps(config).await,
        Commands::Status { json } => cmd_status(config, json).await,
    }
}

/// Initialize the tracing subscriber with the given default log level.
fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

/// Emit the config load outcome through the installed subscriber.
fn report_config(path: &str, fallback: Option<&str>) {
    match fallback {
        Some(reason) => tracing::warn!(path, "{reason}"),
        None => tracing::debug!(path, "config loaded"),
    }
}

/// Open and boot a system on the simulated host.
pub(crate) async fn boot_system(config: SystemConfig) -> System {
    let bridge = Bridge::new(Arc::new(SimulatedTransport::new()));
    let mut system = System::open(config, bridge).await;
    system.boot().await;
    system
}

async fn cmd_apps(config: SystemConfig) -> Result<()> {
    let mut system = boot_system(config).await;

    println!();
    for app in system.registry().installed() {
        let kind = if app.is_system() { "system" } else { "user" };
        println!("  {:<20} {:<10} v{:<8} {}", app.id, kind, app.version, app.name);
    }
    println!();

    system.shutdown();
    Ok(())
}

async fn cmd_status(config: SystemConfig, json: bool) -> Result<()> {
    let storage = if config.storage.in_memory {
        "in memory".to_owned()
    } else {
        config.storage.path.display().to_string()
    };
    let mut system = boot_system(config).await;
    let state = system.state();

    if json {
        let rendered =
            serde_json::to_string_pretty(&state).context("failed to serialize system state")?;
        println!("{rendered}");
        system.shutdown();
        return Ok(());
    }

    println!("Sanctum Status");
    println!("==============");
    println!();
    println!("  Version:          {}", state.system_info.version);
    println!("  Platform:         {}", state.system_info.platform);
    println!("  Storage:          {storage}");
    match state.system_info.battery {
        Some(battery) => println!(
            "  Battery:          {:.0}%{}",
            battery.level * 100.0,
            if battery.is_charging { " (charging)" } else { "" }
        ),
        None => println!("  Battery:          unavailable"),
    }
    println!("  Displays:         {}", state.displays.len());
    println!("  Apps installed:   {}", state.apps.len());
    println!("  Processes:        {}", state.processes.len());
    println!("  Windows:          {}", state.windows.len());
    println!("  Notifications:    {}", state.notifications.len());
    println!();

    system.shutdown();
    Ok(())
}
