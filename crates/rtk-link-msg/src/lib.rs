//! ---
//! rtk_section: "02-messaging-data-model"
//! rtk_subsection: "module"
//! rtk_type: "source"
//! rtk_scope: "code"
//! rtk_description: "Outbound message schema and bus primitives."
//! rtk_version: "v0.0.0-prealpha"
//! rtk_owner: "tbd"
//! ---
#![warn(missing_docs)]

pub mod bus;
pub mod transport;
pub mod types;

/// Shared result type for bus operations.
pub type Result<T> = std::result::Result<T, BusError>;

/// Lightweight error enumeration for the outbound bus.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    /// Raised when a transport backend is not yet implemented.
    #[error("bus transport not yet implemented: {0}")]
    Unimplemented(&'static str),
    /// Wrapper for IO errors encountered during send operations.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Wrapper for JSON serialization or deserialization problems.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub use bus::{BusMetrics, NavBus, Publisher};
pub use transport::{BusTransport, InMemoryTransport, UdpTransport};
pub use types::{
    streams, NavHeader, NavMessage, NavPayload, PositionFix, RelativeOdometry, TimeReference,
    SCHEMA_VERSION,
};
