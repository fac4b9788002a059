//! ---
//! rtk_section: "01-driver-core"
//! rtk_subsection: "module"
//! rtk_type: "source"
//! rtk_scope: "code"
//! rtk_description: "Connection lifecycle and telemetry pipeline."
//! rtk_version: "v0.0.0-prealpha"
//! rtk_owner: "tbd"
//! ---
use std::sync::Arc;

use anyhow::Result;
use rtk_link_common::config::AppConfig;
use rtk_link_msg::NavBus;
use rtk_link_proto::{DeviceTransport, ProtocolChannel};
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::info;

use crate::connection::{ConnectionState, Link};
use crate::health::{HealthMonitor, HealthSnapshot};
use crate::poll::PollLoop;

/// Driver entrypoint: owns the link and spawns the poll loop.
pub struct LinkDriver {
    link: Arc<Mutex<Link>>,
    health: Arc<HealthMonitor>,
    poll_interval: std::time::Duration,
    reopen_after_io_failures: u32,
}

impl LinkDriver {
    /// Assemble a driver over the given protocol/transport backends and
    /// outbound bus. The connection starts closed; the poll loop opens it
    /// lazily once started.
    pub fn new(
        config: &AppConfig,
        transport: Box<dyn DeviceTransport>,
        channel: Box<dyn ProtocolChannel>,
        bus: NavBus,
    ) -> Self {
        let health = Arc::new(HealthMonitor::new(&config.rates));
        let link = Arc::new(Mutex::new(Link::new(
            transport,
            channel,
            bus,
            health.clone(),
            &config.link.frame_id,
        )));
        Self {
            link,
            health,
            poll_interval: config.link.poll_interval,
            reopen_after_io_failures: config.link.reopen_after_io_failures,
        }
    }

    /// Spawn the poll loop and return a handle for lifecycle control.
    /// Must be called from within a tokio runtime.
    pub fn start(self) -> DriverHandle {
        let (shutdown_tx, shutdown_rx) = broadcast::channel(4);
        let task = PollLoop {
            link: self.link.clone(),
            health: self.health.clone(),
            poll_interval: self.poll_interval,
            reopen_after_io_failures: self.reopen_after_io_failures,
            shutdown: shutdown_rx,
        }
        .spawn();
        info!(
            poll_interval_us = self.poll_interval.as_micros() as u64,
            "poll loop started"
        );
        DriverHandle {
            shutdown: shutdown_tx,
            task,
            link: self.link,
            health: self.health,
        }
    }
}

/// Handle returned from driver startup, shared with diagnostics callers.
pub struct DriverHandle {
    shutdown: broadcast::Sender<()>,
    task: JoinHandle<()>,
    link: Arc<Mutex<Link>>,
    health: Arc<HealthMonitor>,
}

impl DriverHandle {
    /// Open the connection now instead of waiting for the poll loop.
    pub async fn open(&self) -> Result<()> {
        self.link.lock().await.open()
    }

    /// Close the connection; the poll loop will lazily reopen it unless
    /// shut down first.
    pub async fn close(&self) {
        self.link.lock().await.close();
    }

    /// Current connection state.
    pub async fn connection_state(&self) -> ConnectionState {
        self.link.lock().await.state()
    }

    /// Named health check for the external diagnostics aggregator.
    ///
    /// Attempts a reopen first, exactly like the periodic refresh, so a
    /// dead link reports as disconnected.
    pub async fn diagnostics(&self) -> HealthSnapshot {
        let mut link = self.link.lock().await;
        link.ensure_open();
        self.health.summarize(link.state(), link.counters())
    }

    /// Stop the poll loop, then close the connection.
    pub async fn shutdown(self) -> Result<()> {
        let _ = self.shutdown.send(());
        self.task
            .await
            .map_err(|err| anyhow::anyhow!("poll task join failure: {}", err))?;
        self.link.lock().await.close();
        info!("driver shutdown complete");
        Ok(())
    }
}
