//! ---
//! rtk_section: "05-device-protocol"
//! rtk_subsection: "module"
//! rtk_type: "source"
//! rtk_scope: "code"
//! rtk_description: "Receiver protocol records and channel/transport seams."
//! rtk_version: "v0.0.0-prealpha"
//! rtk_owner: "tbd"
//! ---
use crate::records::{RecordEvent, RecordKind};
use crate::Result;

/// Callback invoked synchronously for each dispatched record.
///
/// Handlers are registered as closures owning their captures, so there is no
/// opaque context pointer to recover (and no null-context branch to guard).
pub type RecordHandler = Box<dyn FnMut(&RecordEvent) + Send>;

/// Read primitive a channel pulls raw bytes through during a decode pass.
///
/// Returns the number of bytes read; `Ok(0)` means no data was available
/// before the transport's read timeout elapsed.
pub type ReadFn<'a> = &'a mut dyn FnMut(&mut [u8]) -> std::io::Result<usize>;

/// Decode seam over the receiver's framed telemetry protocol.
///
/// Implementations own frame reassembly and checksum validation; malformed
/// or truncated frames are rejected internally and never reach a handler.
pub trait ProtocolChannel: Send {
    /// Register the handler invoked for records of `kind`, replacing any
    /// previous registration for that kind.
    fn register(&mut self, kind: RecordKind, handler: RecordHandler);

    /// Drop every registered handler.
    fn clear_handlers(&mut self);

    /// Drive one decode pass, pulling bytes through `read` and invoking
    /// registered handlers synchronously for each completed record.
    ///
    /// Returns the number of records dispatched. An error means the pass
    /// failed mid-stream; already-dispatched records stay dispatched.
    fn process_once(&mut self, read: ReadFn<'_>) -> Result<usize>;
}
