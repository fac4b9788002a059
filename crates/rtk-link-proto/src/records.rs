//! ---
//! rtk_section: "05-device-protocol"
//! rtk_subsection: "module"
//! rtk_type: "source"
//! rtk_scope: "code"
//! rtk_description: "Receiver protocol records and channel/transport seams."
//! rtk_version: "v0.0.0-prealpha"
//! rtk_owner: "tbd"
//! ---
use serde::{Deserialize, Serialize};

/// Discriminant used to register handlers with a [`crate::ProtocolChannel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    /// Periodic receiver liveness/status record.
    Heartbeat,
    /// GPS time-of-week record.
    GpsTime,
    /// Absolute geodetic position record.
    PositionLlh,
    /// Baseline vector between rover and base station.
    BaselineNed,
}

/// A decoded, length-validated record produced below the framing boundary.
///
/// Instances are created per dispatch and consumed immediately by the
/// handler; nothing in this workspace retains them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum DecodedRecord {
    /// Receiver heartbeat.
    Heartbeat(HeartbeatRecord),
    /// GPS time.
    GpsTime(GpsTimeRecord),
    /// Geodetic position.
    PositionLlh(PositionLlhRecord),
    /// RTK baseline in the local NED frame.
    BaselineNed(BaselineNedRecord),
}

impl DecodedRecord {
    /// Discriminant of this record, for handler lookup.
    pub fn kind(&self) -> RecordKind {
        match self {
            DecodedRecord::Heartbeat(_) => RecordKind::Heartbeat,
            DecodedRecord::GpsTime(_) => RecordKind::GpsTime,
            DecodedRecord::PositionLlh(_) => RecordKind::PositionLlh,
            DecodedRecord::BaselineNed(_) => RecordKind::BaselineNed,
        }
    }
}

/// Receiver liveness record; carries an error bitfield.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartbeatRecord {
    /// Status flags; bit 0 reports a receiver-side error condition.
    pub flags: u32,
}

impl HeartbeatRecord {
    /// Bit signalling a receiver-side error.
    pub const ERROR_MASK: u32 = 1;

    /// True when the receiver reports an error condition.
    pub fn has_error(&self) -> bool {
        self.flags & Self::ERROR_MASK != 0
    }
}

/// GPS time record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpsTimeRecord {
    /// GPS week number.
    pub wn: u16,
    /// Time of week in milliseconds.
    pub tow_ms: u32,
    /// Nanosecond residual of the time of week.
    pub ns: i32,
    /// Time source flags.
    pub flags: u8,
}

/// Absolute geodetic position record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionLlhRecord {
    /// Time of week in milliseconds.
    pub tow_ms: u32,
    /// Latitude in degrees.
    pub lat_deg: f64,
    /// Longitude in degrees.
    pub lon_deg: f64,
    /// Height above the ellipsoid in meters.
    pub height_m: f64,
    /// Horizontal accuracy estimate.
    pub h_accuracy: f64,
    /// Vertical accuracy estimate.
    pub v_accuracy: f64,
    /// Number of satellites used in the solution.
    pub n_sats: u8,
    /// Fix-quality flags.
    pub flags: u8,
}

/// Baseline vector between rover and base station, local NED frame,
/// millimeter units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaselineNedRecord {
    /// Time of week in milliseconds.
    pub tow_ms: u32,
    /// North offset in millimeters.
    pub n_mm: i32,
    /// East offset in millimeters.
    pub e_mm: i32,
    /// Down offset in millimeters.
    pub d_mm: i32,
    /// Horizontal accuracy estimate.
    pub h_accuracy: f64,
    /// Vertical accuracy estimate.
    pub v_accuracy: f64,
    /// Number of satellites used in the solution.
    pub n_sats: u8,
    /// Fix-quality flags; 1 indicates an RTK fixed solution.
    pub flags: u8,
}

/// What a registered handler receives per dispatched record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordEvent {
    /// Identifier of the sending device.
    pub sender: u16,
    /// The decoded record.
    pub record: DecodedRecord,
}
