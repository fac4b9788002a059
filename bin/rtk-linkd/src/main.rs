//! ---
//! rtk_section: "01-driver-core"
//! rtk_subsection: "binary"
//! rtk_type: "source"
//! rtk_scope: "code"
//! rtk_description: "Binary entrypoint for the RTK-Link daemon."
//! rtk_version: "v0.0.0-prealpha"
//! rtk_owner: "tbd"
//! ---
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use rtk_link_common::config::{AppConfig, Mode};
use rtk_link_common::logging::init_tracing;
use rtk_link_driver::LinkDriver;
use rtk_link_msg::{BusTransport, InMemoryTransport, NavBus};
use rtk_link_proto::{
    DeviceTransport, ProtocolChannel, SbpChannel, ScriptedChannel, ScriptedTransport,
    SerialTransport,
};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{debug, info};

mod sim;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "RTK-Link daemon",
    long_about = None
)]
struct Cli {
    #[arg(long, value_name = "FILE", help = "Path to configuration file")]
    config: Option<PathBuf>,

    #[arg(long, value_enum, help = "Override application mode")]
    mode: Option<CliMode>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliMode {
    Production,
    Simulation,
}

impl From<CliMode> for Mode {
    fn from(value: CliMode) -> Self {
        match value {
            CliMode::Production => Mode::Production,
            CliMode::Simulation => Mode::Simulation,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Run the receiver bridge")]
    Run,
    #[command(about = "Validate the configuration and exit")]
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut candidates = Vec::new();
    if let Some(path) = &cli.config {
        candidates.push(path.clone());
    }
    candidates.push(PathBuf::from("configs/example.prod.toml"));
    candidates.push(PathBuf::from("configs/example.sim.toml"));

    let loaded = AppConfig::load_with_source(&candidates)?;
    let mut config = loaded.config;
    if let Some(mode) = cli.mode {
        config.mode = mode.into();
        config.validate()?;
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            init_tracing("rtk-linkd", &config.logging)?;
            info!(config_path = %loaded.source.display(), mode = ?config.mode, "configuration loaded");
            run_daemon(config).await?;
        }
        Commands::CheckConfig => {
            println!(
                "Configuration OK\n  source: {}\n  mode: {:?}\n  device: {}@{}\n  frame: {}\n  poll: {}us\n  nav rate: [{}, {}] Hz\n  rtk rate: [{}, {}] Hz",
                loaded.source.display(),
                config.mode,
                config.device.port,
                config.device.baud,
                config.link.frame_id,
                config.link.poll_interval.as_micros(),
                config.rates.nav_min_hz,
                config.rates.nav_max_hz,
                config.rates.rtk_min_hz,
                config.rates.rtk_max_hz,
            );
        }
    }

    Ok(())
}

async fn run_daemon(config: AppConfig) -> Result<()> {
    let bus = NavBus::new();
    let bus_out = Arc::new(InMemoryTransport::new());
    bus.register_transport(bus_out.clone());

    let (aux_shutdown, _) = broadcast::channel::<()>(4);

    let (transport, channel): (Box<dyn DeviceTransport>, Box<dyn ProtocolChannel>) =
        if config.mode.is_simulation() {
            let (channel, feed) = ScriptedChannel::new();
            let _ = sim::spawn_feeder(feed, aux_shutdown.subscribe());
            info!("simulation mode: scripted receiver backend active");
            (Box::new(ScriptedTransport::new()), Box::new(channel))
        } else {
            (
                Box::new(SerialTransport::new(
                    config.device.port.clone(),
                    config.device.baud,
                )),
                Box::new(SbpChannel::new()),
            )
        };

    let _ = spawn_bus_drain(bus_out, aux_shutdown.subscribe());

    let handle = LinkDriver::new(&config, transport, channel, bus.clone()).start();

    info!(mode = ?config.mode, "daemon running; waiting for termination signal");
    signal::ctrl_c().await?;
    info!("ctrl-c received; shutting down");

    let _ = aux_shutdown.send(());
    handle.shutdown().await?;

    let metrics = bus.metrics();
    info!(
        published = metrics.published,
        dropped = metrics.dropped,
        "outbound bus totals"
    );
    Ok(())
}

/// Drain the in-process bus so the queue stays bounded, tracing every
/// message for operators tailing the log.
fn spawn_bus_drain(
    transport: Arc<InMemoryTransport>,
    mut shutdown: broadcast::Receiver<()>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(10));
        loop {
            tokio::select! {
                _ = shutdown.recv() => break,
                _ = interval.tick() => {
                    while let Some(message) = transport.recv() {
                        debug!(
                            stream = %message.stream,
                            kind = message.payload.kind(),
                            id = %message.id,
                            "bus message"
                        );
                    }
                }
            }
        }
    })
}
