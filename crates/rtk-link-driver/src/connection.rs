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

use anyhow::{Context, Result};
use rtk_link_msg::{streams, NavBus, NavPayload, Publisher};
use rtk_link_proto::{
    DecodedRecord, DeviceTransport, ProtoError, ProtocolChannel, RecordKind,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::health::HealthMonitor;
use crate::translate;

/// Lifecycle state of the receiver connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No device handle held; decode passes are not permitted.
    Closed,
    /// Device handle held, handlers registered, endpoints live.
    Open,
}

/// Cumulative failure counters; monotonically non-decreasing for the
/// process lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FailureCounters {
    /// Decode passes that reported an error.
    pub io_failures: u64,
    /// Transport open attempts that failed.
    pub open_failures: u64,
}

struct Endpoints {
    time: Publisher,
    fix: Publisher,
    rtk: Publisher,
}

/// Connection state machine plus everything a decode pass touches.
///
/// `Link` has no locking of its own: the driver wraps it in the single
/// exclusion lock, and every method here assumes the caller holds it.
pub struct Link {
    transport: Box<dyn DeviceTransport>,
    channel: Box<dyn ProtocolChannel>,
    state: ConnectionState,
    counters: FailureCounters,
    consecutive_io_failures: u32,
    endpoints: Option<Endpoints>,
    bus: NavBus,
    health: Arc<HealthMonitor>,
    frame_id: Arc<str>,
}

impl Link {
    /// Assemble a closed link over the given backends.
    pub fn new(
        transport: Box<dyn DeviceTransport>,
        channel: Box<dyn ProtocolChannel>,
        bus: NavBus,
        health: Arc<HealthMonitor>,
        frame_id: &str,
    ) -> Self {
        Self {
            transport,
            channel,
            state: ConnectionState::Closed,
            counters: FailureCounters::default(),
            consecutive_io_failures: 0,
            endpoints: None,
            bus,
            health,
            frame_id: Arc::from(frame_id),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Current counter values.
    pub fn counters(&self) -> FailureCounters {
        self.counters
    }

    /// Acquire the device handle, register record handlers, and create the
    /// publication endpoints. A no-op when already open. On failure the
    /// open-failure counter increments and the link stays closed.
    pub fn open(&mut self) -> Result<()> {
        if self.state == ConnectionState::Open {
            return Ok(());
        }

        if let Err(err) = self.transport.open() {
            self.counters.open_failures += 1;
            debug!(device = %self.transport.describe(), error = %err, "transport open failed");
            return Err(err).with_context(|| {
                format!("failed to open receiver transport {}", self.transport.describe())
            });
        }

        let endpoints = self.register_handlers();
        debug!(
            time = endpoints.time.stream(),
            fix = endpoints.fix.stream(),
            rtk = endpoints.rtk.stream(),
            "publication endpoints established"
        );
        self.endpoints = Some(endpoints);
        self.state = ConnectionState::Open;
        info!(device = %self.transport.describe(), "receiver link opened");
        Ok(())
    }

    /// Release the device handle and tear down handlers and endpoints.
    /// A no-op when already closed.
    pub fn close(&mut self) {
        if self.state == ConnectionState::Closed {
            return;
        }
        self.state = ConnectionState::Closed;
        self.transport.close();
        self.channel.clear_handlers();
        self.endpoints = None;
        info!(device = %self.transport.describe(), "receiver link closed");
    }

    /// True if the link is open after this call. Used by the poll loop to
    /// lazily reconnect every cycle until an open succeeds; no backoff.
    pub fn ensure_open(&mut self) -> bool {
        if self.state == ConnectionState::Open {
            return true;
        }
        self.open().is_ok()
    }

    /// Drive one decode pass over the current connection. Handlers run
    /// synchronously inside this call, on the caller's task.
    pub fn process_once(&mut self) -> std::result::Result<usize, ProtoError> {
        let Self {
            transport, channel, ..
        } = self;
        channel.process_once(&mut |buf| transport.read(buf))
    }

    /// Account a failed decode pass; returns the consecutive-failure count.
    pub fn note_io_failure(&mut self) -> u32 {
        self.counters.io_failures += 1;
        self.consecutive_io_failures += 1;
        self.consecutive_io_failures
    }

    /// Account a clean decode pass.
    pub fn note_io_success(&mut self) {
        self.consecutive_io_failures = 0;
    }

    /// Wire the four record handlers. Each is a closure owning clones of
    /// its publisher, the health monitor, and the frame id, so it can run
    /// inside the decode pass with nothing to recover from a context
    /// pointer.
    fn register_handlers(&mut self) -> Endpoints {
        let time = self.bus.publisher(streams::TIME);
        let fix = self.bus.publisher(streams::FIX);
        let rtk = self.bus.publisher(streams::RTK);

        self.channel.register(
            RecordKind::Heartbeat,
            Box::new(move |event| {
                if let DecodedRecord::Heartbeat(heartbeat) = &event.record {
                    if heartbeat.has_error() {
                        warn!(
                            sender = event.sender,
                            flags = heartbeat.flags,
                            "receiver heartbeat reports an error condition"
                        );
                    }
                }
            }),
        );

        let publisher = time.clone();
        let health = self.health.clone();
        let frame_id = self.frame_id.clone();
        self.channel.register(
            RecordKind::GpsTime,
            Box::new(move |event| {
                if let DecodedRecord::GpsTime(record) = &event.record {
                    publisher.publish(NavPayload::TimeReference(translate::time_reference(
                        record, &frame_id,
                    )));
                    health.tick_nav();
                }
            }),
        );

        let publisher = fix.clone();
        let health = self.health.clone();
        let frame_id = self.frame_id.clone();
        self.channel.register(
            RecordKind::PositionLlh,
            Box::new(move |event| {
                if let DecodedRecord::PositionLlh(record) = &event.record {
                    publisher.publish(NavPayload::PositionFix(translate::position_fix(
                        record, &frame_id,
                    )));
                    health.tick_nav();
                }
            }),
        );

        let publisher = rtk.clone();
        let health = self.health.clone();
        let frame_id = self.frame_id.clone();
        self.channel.register(
            RecordKind::BaselineNed,
            Box::new(move |event| {
                if let DecodedRecord::BaselineNed(record) = &event.record {
                    publisher.publish(NavPayload::RelativeOdometry(translate::relative_odometry(
                        record, &frame_id,
                    )));
                    health.tick_rtk();
                }
            }),
        );

        Endpoints { time, fix, rtk }
    }
}
