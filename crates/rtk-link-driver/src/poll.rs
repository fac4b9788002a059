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
use std::time::Duration;

use rtk_link_common::time::{jitter_us, monotonic_now};
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, trace, warn};

use crate::connection::Link;
use crate::health::{HealthMonitor, HealthSnapshot, HealthStatus};
use crate::scheduling::RateLimiter;

/// The recurring task driving the connection/telemetry pipeline.
///
/// Shutdown is only checked outside the exclusion lock so a concurrent
/// close request can never deadlock against a terminating loop.
pub(crate) struct PollLoop {
    pub(crate) link: Arc<Mutex<Link>>,
    pub(crate) health: Arc<HealthMonitor>,
    pub(crate) poll_interval: Duration,
    pub(crate) reopen_after_io_failures: u32,
    pub(crate) shutdown: broadcast::Receiver<()>,
}

impl PollLoop {
    pub(crate) fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        let mut limiter = RateLimiter::new(self.poll_interval);
        let mut last_status = HealthStatus::Ok;
        loop {
            tokio::select! {
                _ = self.shutdown.recv() => {
                    debug!("poll loop shutdown signal received");
                    break;
                }
                instant = limiter.tick() => {
                    let scheduled_at = instant.into_std();
                    self.spin_once().await;
                    let snapshot = self.diagnostics_update().await;
                    self.log_status_transition(&snapshot, last_status);
                    last_status = snapshot.status;
                    trace!(
                        lag_us = jitter_us(
                            monotonic_now().duration_since(scheduled_at),
                            Duration::ZERO
                        ),
                        "poll cycle complete"
                    );
                }
            }
        }
    }

    /// One pipeline cycle: lazily reconnect, then one decode pass.
    async fn spin_once(&self) {
        let mut link = self.link.lock().await;
        if !link.ensure_open() {
            // retried without backoff on the next cycle
            return;
        }

        match link.process_once() {
            Ok(dispatched) => {
                link.note_io_success();
                if dispatched > 0 {
                    trace!(dispatched, "decode pass dispatched records");
                }
            }
            Err(err) => {
                let consecutive = link.note_io_failure();
                warn!(
                    error = %err,
                    io_failures = link.counters().io_failures,
                    "decode pass failed"
                );
                if self.reopen_after_io_failures > 0
                    && consecutive >= self.reopen_after_io_failures
                {
                    warn!(consecutive, "sustained decode failures; closing link for reopen");
                    link.close();
                }
            }
        }
    }

    /// Refresh the health summary, attempting a reopen first so a dead
    /// link is reported as disconnected rather than silently stale.
    async fn diagnostics_update(&self) -> HealthSnapshot {
        let mut link = self.link.lock().await;
        link.ensure_open();
        self.health.summarize(link.state(), link.counters())
    }

    fn log_status_transition(&self, snapshot: &HealthSnapshot, last_status: HealthStatus) {
        if snapshot.status == last_status {
            return;
        }
        match snapshot.status {
            HealthStatus::Ok => debug!(message = %snapshot.message, "link health recovered"),
            HealthStatus::Warning => warn!(
                message = %snapshot.message,
                io_failures = snapshot.counters.io_failures,
                "link health degraded"
            ),
            HealthStatus::Error => error!(
                message = %snapshot.message,
                open_failures = snapshot.counters.open_failures,
                "link health error"
            ),
        }
    }
}
