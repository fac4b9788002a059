//! ---
//! rtk_section: "02-messaging-data-model"
//! rtk_subsection: "module"
//! rtk_type: "source"
//! rtk_scope: "code"
//! rtk_description: "Outbound message schema and bus primitives."
//! rtk_version: "v0.0.0-prealpha"
//! rtk_owner: "tbd"
//! ---
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::{BusError, NavMessage, Result};

/// Transport abstraction used by the outbound bus.
///
/// Publishing is fire-and-forget: the bus counts and logs send failures
/// but never propagates them to the publishing handler.
pub trait BusTransport: Send + Sync {
    /// Send a message into the transport.
    fn send(&self, msg: NavMessage) -> Result<()>;
    /// Receive the next message from the transport, if available.
    fn recv(&self) -> Option<NavMessage>;
    /// Human-readable transport name for logging.
    fn name(&self) -> &'static str;
}

/// In-memory transport backed by a mutex protected queue.
#[derive(Clone, Default)]
pub struct InMemoryTransport {
    queue: Arc<Mutex<VecDeque<NavMessage>>>,
}

impl InMemoryTransport {
    /// Create a new in-memory transport channel.
    pub fn new() -> Self {
        Self::default()
    }
}

impl BusTransport for InMemoryTransport {
    fn send(&self, msg: NavMessage) -> Result<()> {
        let mut guard = self.queue.lock().expect("queue poisoned");
        guard.push_back(msg);
        Ok(())
    }

    fn recv(&self) -> Option<NavMessage> {
        let mut guard = self.queue.lock().expect("queue poisoned");
        guard.pop_front()
    }

    fn name(&self) -> &'static str {
        "in_memory"
    }
}

/// Placeholder UDP transport for the host middleware socket backend.
pub struct UdpTransport;

impl BusTransport for UdpTransport {
    fn send(&self, _msg: NavMessage) -> Result<()> {
        Err(BusError::Unimplemented("udp transport"))
    }

    fn recv(&self) -> Option<NavMessage> {
        None
    }

    fn name(&self) -> &'static str {
        "udp"
    }
}
