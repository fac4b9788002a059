//! ---
//! rtk_section: "01-driver-core"
//! rtk_subsection: "module"
//! rtk_type: "source"
//! rtk_scope: "code"
//! rtk_description: "Connection lifecycle and telemetry pipeline."
//! rtk_version: "v0.0.0-prealpha"
//! rtk_owner: "tbd"
//! ---
use std::collections::VecDeque;
use std::time::Instant;

use parking_lot::Mutex;
use rtk_link_common::config::RateBoundsConfig;
use serde::Serialize;

use crate::connection::{ConnectionState, FailureCounters};

/// Hardware identifier attached to every health summary.
pub const HARDWARE_ID: &str = "rtk-gnss-receiver";

/// Aggregated severity of a [`HealthSnapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// Link is connected and counters are stable.
    Ok,
    /// The I/O failure count increased since the previous summary.
    Warning,
    /// Disconnected, or the open failure count increased.
    Error,
}

/// Structured status returned to the external diagnostics aggregator.
#[derive(Debug, Clone, Serialize)]
pub struct HealthSnapshot {
    /// Hardware identifier of the monitored device.
    pub hardware_id: &'static str,
    /// Aggregated severity.
    pub status: HealthStatus,
    /// Human-readable summary line.
    pub message: String,
    /// Connection state at summary time.
    pub state: ConnectionState,
    /// Cumulative failure counters.
    pub counters: FailureCounters,
    /// Whether the observed publish rates sit inside their bounds.
    pub frequency_ok: bool,
}

/// Sliding window of publish timestamps compared against [min, max] Hz
/// bounds with a fractional tolerance.
pub(crate) struct RateWindow {
    min_hz: f64,
    max_hz: f64,
    tolerance: f64,
    capacity: usize,
    ticks: VecDeque<Instant>,
}

impl RateWindow {
    pub(crate) fn new(min_hz: f64, max_hz: f64, tolerance: f64, capacity: usize) -> Self {
        Self {
            min_hz,
            max_hz,
            tolerance,
            capacity,
            ticks: VecDeque::with_capacity(capacity),
        }
    }

    pub(crate) fn record(&mut self, now: Instant) {
        if self.ticks.len() == self.capacity {
            self.ticks.pop_front();
        }
        self.ticks.push_back(now);
    }

    /// Observed rate over the window, once two samples are available.
    pub(crate) fn frequency_hz(&self) -> Option<f64> {
        let first = self.ticks.front()?;
        let last = self.ticks.back()?;
        let span = last.duration_since(*first).as_secs_f64();
        if self.ticks.len() < 2 || span <= 0.0 {
            return None;
        }
        Some((self.ticks.len() - 1) as f64 / span)
    }

    /// `None` until the window holds enough samples to have an opinion.
    pub(crate) fn within_bounds(&self) -> Option<bool> {
        self.frequency_hz().map(|hz| {
            hz >= self.min_hz * (1.0 - self.tolerance) && hz <= self.max_hz * (1.0 + self.tolerance)
        })
    }
}

/// Aggregates failure counters, connection state, and publish rates into
/// periodic diagnostic summaries.
///
/// The only persistent state is the counter values seen by the previous
/// summary, which drive the Warning/Error escalation on increases.
pub struct HealthMonitor {
    nav_rate: Mutex<RateWindow>,
    rtk_rate: Mutex<RateWindow>,
    last_counters: Mutex<Option<FailureCounters>>,
}

impl HealthMonitor {
    /// Build a monitor from the configured rate bounds.
    pub fn new(rates: &RateBoundsConfig) -> Self {
        Self {
            nav_rate: Mutex::new(RateWindow::new(
                rates.nav_min_hz,
                rates.nav_max_hz,
                rates.tolerance,
                rates.window,
            )),
            rtk_rate: Mutex::new(RateWindow::new(
                rates.rtk_min_hz,
                rates.rtk_max_hz,
                rates.tolerance,
                rates.window,
            )),
            last_counters: Mutex::new(None),
        }
    }

    /// Record one published time/fix message.
    pub fn tick_nav(&self) {
        self.nav_rate.lock().record(Instant::now());
    }

    /// Record one published relative-odometry message.
    pub fn tick_rtk(&self) {
        self.rtk_rate.lock().record(Instant::now());
    }

    fn frequency_ok(&self) -> bool {
        // A class that has not ticked yet gets no vote; a rover without a
        // base station must not flag the link unhealthy.
        self.nav_rate.lock().within_bounds().unwrap_or(true)
            && self.rtk_rate.lock().within_bounds().unwrap_or(true)
    }

    /// Produce a snapshot for the diagnostics surface.
    ///
    /// A Closed link is an Error regardless of counters and leaves the
    /// previous-counter memory untouched, so escalations fire on the first
    /// summary after reconnecting.
    pub fn summarize(&self, state: ConnectionState, counters: FailureCounters) -> HealthSnapshot {
        let frequency_ok = self.frequency_ok();

        if state == ConnectionState::Closed {
            return HealthSnapshot {
                hardware_id: HARDWARE_ID,
                status: HealthStatus::Error,
                message: "disconnected".to_owned(),
                state,
                counters,
                frequency_ok,
            };
        }

        let mut status = HealthStatus::Ok;
        let mut message = "receiver link status ok".to_owned();

        let mut last = self.last_counters.lock();
        if let Some(previous) = *last {
            if counters.io_failures > previous.io_failures {
                status = HealthStatus::Warning;
                message = "i/o failure count increased".to_owned();
            }
            if counters.open_failures > previous.open_failures {
                status = HealthStatus::Error;
                message = "open failure count increased".to_owned();
            }
        }
        *last = Some(counters);

        HealthSnapshot {
            hardware_id: HARDWARE_ID,
            status,
            message,
            state,
            counters,
            frequency_ok,
        }
    }
}
