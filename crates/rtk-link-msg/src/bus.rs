//! ---
//! rtk_section: "02-messaging-data-model"
//! rtk_subsection: "module"
//! rtk_type: "source"
//! rtk_scope: "code"
//! rtk_description: "Outbound message schema and bus primitives."
//! rtk_version: "v0.0.0-prealpha"
//! rtk_owner: "tbd"
//! ---
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::transport::BusTransport;
use crate::types::{NavMessage, NavPayload};

/// Snapshot of bus counters used by diagnostics and tests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BusMetrics {
    /// Number of messages successfully handed to transports.
    pub published: u64,
    /// Number of messages dropped due to transport errors.
    pub dropped: u64,
}

struct Counters {
    published: AtomicU64,
    dropped: AtomicU64,
}

impl Counters {
    fn new() -> Self {
        Self {
            published: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    fn snapshot(&self) -> BusMetrics {
        BusMetrics {
            published: self.published.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

struct BusInner {
    transports: RwLock<Vec<Arc<dyn BusTransport>>>,
    counters: Counters,
}

/// Fans published messages out to every registered transport.
#[derive(Clone)]
pub struct NavBus {
    inner: Arc<BusInner>,
}

impl NavBus {
    /// Construct a bus with no transports registered yet.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BusInner {
                transports: RwLock::new(Vec::new()),
                counters: Counters::new(),
            }),
        }
    }

    /// Register a transport for publish operations.
    pub fn register_transport<T>(&self, transport: Arc<T>)
    where
        T: BusTransport + 'static,
    {
        self.inner
            .transports
            .write()
            .push(transport as Arc<dyn BusTransport>);
    }

    /// Create a publication endpoint bound to `stream`.
    pub fn publisher(&self, stream: impl Into<String>) -> Publisher {
        Publisher {
            inner: self.inner.clone(),
            stream: stream.into(),
        }
    }

    /// Return the current counter snapshot.
    pub fn metrics(&self) -> BusMetrics {
        self.inner.counters.snapshot()
    }
}

impl Default for NavBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Publication endpoint for a single stream.
///
/// Endpoints are created when the driver opens its connection and dropped
/// when it closes; they hold no per-endpoint state beyond the stream name.
#[derive(Clone)]
pub struct Publisher {
    inner: Arc<BusInner>,
    stream: String,
}

impl Publisher {
    /// Stream this endpoint publishes on.
    pub fn stream(&self) -> &str {
        &self.stream
    }

    /// Publish a payload to all registered transports, fire-and-forget.
    pub fn publish(&self, payload: NavPayload) {
        let message = NavMessage::new(self.stream.clone(), payload);
        for transport in self.inner.transports.read().iter() {
            if let Err(err) = transport.send(message.clone()) {
                tracing::warn!(transport = transport.name(), stream = %self.stream, error = %err, "transport send failed");
                self.inner.counters.dropped.fetch_add(1, Ordering::Relaxed);
            } else {
                self.inner
                    .counters
                    .published
                    .fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}
