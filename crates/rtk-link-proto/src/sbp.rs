//! ---
//! rtk_section: "05-device-protocol"
//! rtk_subsection: "module"
//! rtk_type: "source"
//! rtk_scope: "code"
//! rtk_description: "Receiver protocol records and channel/transport seams."
//! rtk_version: "v0.0.0-prealpha"
//! rtk_owner: "tbd"
//! ---
use crate::channel::{ProtocolChannel, ReadFn, RecordHandler};
use crate::records::RecordKind;
use crate::{ProtoError, Result};

/// Placeholder for the vendor SBP frame decoder.
///
/// Frame reassembly and CRC validation belong to the external decoder
/// library; this type marks the seam where it links in. Until then every
/// decode pass reports `Unimplemented`, which the driver accounts as an
/// I/O failure and surfaces through diagnostics.
#[derive(Debug, Default)]
pub struct SbpChannel;

impl SbpChannel {
    /// Construct the placeholder channel.
    pub fn new() -> Self {
        Self
    }
}

impl ProtocolChannel for SbpChannel {
    fn register(&mut self, _kind: RecordKind, _handler: RecordHandler) {}

    fn clear_handlers(&mut self) {}

    fn process_once(&mut self, _read: ReadFn<'_>) -> Result<usize> {
        Err(ProtoError::Unimplemented("sbp decoder backend"))
    }
}
