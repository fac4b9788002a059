//! ---
//! rtk_section: "05-device-protocol"
//! rtk_subsection: "module"
//! rtk_type: "source"
//! rtk_scope: "code"
//! rtk_description: "Receiver protocol records and channel/transport seams."
//! rtk_version: "v0.0.0-prealpha"
//! rtk_owner: "tbd"
//! ---
#![warn(missing_docs)]
//! Protocol boundary for the RTK-Link driver.
//!
//! The wire framing and checksum validation of the receiver's SBP-class
//! protocol live below this crate; what crosses the boundary is a stream of
//! already-validated, typed records. This crate defines that record model,
//! the [`ProtocolChannel`] decode seam, the [`DeviceTransport`] byte-source
//! seam, and in-memory implementations of both for simulation and tests.

pub mod channel;
pub mod records;
pub mod sbp;
pub mod scripted;
pub mod transport;

/// Shared result type for protocol operations.
pub type Result<T> = std::result::Result<T, ProtoError>;

/// Errors crossing the protocol boundary.
#[derive(Debug, thiserror::Error)]
pub enum ProtoError {
    /// Raised when a backend is not yet linked into the build.
    #[error("protocol backend not yet implemented: {0}")]
    Unimplemented(&'static str),
    /// Wrapper for IO errors reported by a transport or a decode pass.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub use channel::{ProtocolChannel, ReadFn, RecordHandler};
pub use records::{
    BaselineNedRecord, DecodedRecord, GpsTimeRecord, HeartbeatRecord, PositionLlhRecord,
    RecordEvent, RecordKind,
};
pub use sbp::SbpChannel;
pub use scripted::{ScriptFeed, ScriptedChannel, ScriptedTransport};
pub use transport::{DeviceTransport, SerialTransport};
