//! ---
//! rtk_section: "02-messaging-data-model"
//! rtk_subsection: "module"
//! rtk_type: "source"
//! rtk_scope: "code"
//! rtk_description: "Outbound message schema and bus primitives."
//! rtk_version: "v0.0.0-prealpha"
//! rtk_owner: "tbd"
//! ---
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use uuid::Uuid;

/// Schema version broadcast alongside every message payload.
pub const SCHEMA_VERSION: u16 = 1;

/// Stream names the driver publishes on.
pub mod streams {
    /// Time-reference stream.
    pub const TIME: &str = "gps/time";
    /// Absolute-position-fix stream.
    pub const FIX: &str = "gps/fix";
    /// Relative-odometry (RTK baseline) stream.
    pub const RTK: &str = "gps/rtkfix";
}

/// Header stamped onto every outbound navigation message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavHeader {
    /// Coordinate-frame label for downstream consumers.
    pub frame_id: String,
    /// Capture timestamp: time of receipt, not device time.
    pub stamp: DateTime<Utc>,
}

impl NavHeader {
    /// Stamp a header with the current wall clock.
    pub fn now(frame_id: impl Into<String>) -> Self {
        Self {
            frame_id: frame_id.into(),
            stamp: Utc::now(),
        }
    }
}

/// External time reference derived from the receiver's GPS time records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeReference {
    /// Message header.
    pub header: NavHeader,
    /// Reference time, seconds component. Carries the receiver's
    /// time-of-week field verbatim.
    pub time_ref_sec: u32,
    /// Source label of the time reference.
    pub source: String,
}

/// Absolute geodetic fix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionFix {
    /// Message header.
    pub header: NavHeader,
    /// Fix status; [`PositionFix::STATUS_FIX`] until a fix-quality
    /// mapping is specified.
    pub status: i8,
    /// Constellation service; [`PositionFix::SERVICE_GPS`].
    pub service: u16,
    /// Latitude in degrees.
    pub latitude_deg: f64,
    /// Longitude in degrees.
    pub longitude_deg: f64,
    /// Height above the ellipsoid in meters.
    pub altitude_m: f64,
}

impl PositionFix {
    /// Unaugmented fix.
    pub const STATUS_FIX: i8 = 0;
    /// GPS constellation service bit.
    pub const SERVICE_GPS: u16 = 1;
}

/// Relative position of the rover with respect to the base station,
/// expressed in the local ENU frame.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelativeOdometry {
    /// Message header.
    pub header: NavHeader,
    /// Frame the relative position is expressed for.
    pub child_frame_id: String,
    /// Position offset in meters: x = east, y = north, z = up.
    pub position_m: [f64; 3],
    /// Row-major 6x6 pose covariance (x, y, z, roll, pitch, yaw).
    #[serde_as(as = "[_; 36]")]
    pub pose_covariance: [f64; 36],
    /// Row-major 6x6 twist covariance; the receiver supplies no velocity
    /// estimate, so every diagonal stays at the unknown value.
    #[serde_as(as = "[_; 36]")]
    pub twist_covariance: [f64; 36],
}

impl RelativeOdometry {
    /// Diagonal index of x in a row-major 6x6 covariance matrix.
    pub const COV_X: usize = 0;
    /// Diagonal index of y.
    pub const COV_Y: usize = 7;
    /// Diagonal index of z.
    pub const COV_Z: usize = 14;
    /// Diagonal index of roll.
    pub const COV_ROLL: usize = 21;
    /// Diagonal index of pitch.
    pub const COV_PITCH: usize = 28;
    /// Diagonal index of yaw.
    pub const COV_YAW: usize = 35;
}

/// Payload carried by a [`NavMessage`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum NavPayload {
    /// Time reference derived from a GPS time record.
    TimeReference(TimeReference),
    /// Absolute geodetic fix.
    PositionFix(PositionFix),
    /// RTK baseline odometry.
    RelativeOdometry(RelativeOdometry),
}

impl NavPayload {
    /// Convenience accessor returning the payload kind as a static string.
    pub fn kind(&self) -> &'static str {
        match self {
            NavPayload::TimeReference(_) => "time_reference",
            NavPayload::PositionFix(_) => "position_fix",
            NavPayload::RelativeOdometry(_) => "relative_odometry",
        }
    }
}

/// Bus envelope wrapping every published payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavMessage {
    /// Unique identifier for deduplication and tracing.
    pub id: Uuid,
    /// Version of the schema used by the payload.
    pub schema_version: u16,
    /// Stream the message was published on.
    pub stream: String,
    /// Timestamp when the envelope was created.
    pub timestamp: DateTime<Utc>,
    /// Actual payload carried by the message.
    pub payload: NavPayload,
}

impl NavMessage {
    /// Construct a new envelope around the provided payload.
    pub fn new(stream: impl Into<String>, payload: NavPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            schema_version: SCHEMA_VERSION,
            stream: stream.into(),
            timestamp: Utc::now(),
            payload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_odometry() -> RelativeOdometry {
        let mut pose_covariance = [0.0; 36];
        pose_covariance[RelativeOdometry::COV_X] = 0.0004;
        pose_covariance[RelativeOdometry::COV_Y] = 0.0004;
        pose_covariance[RelativeOdometry::COV_Z] = 0.0025;
        RelativeOdometry {
            header: NavHeader::now("gps"),
            child_frame_id: "base_station".to_owned(),
            position_m: [2.0, 1.0, 0.5],
            pose_covariance,
            twist_covariance: [1.0e3; 36],
        }
    }

    #[test]
    fn envelope_preserves_payload_through_json() {
        let message = NavMessage::new(
            streams::RTK,
            NavPayload::RelativeOdometry(sample_odometry()),
        );
        let json = serde_json::to_string(&message).expect("serialize");
        let back: NavMessage = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, message);
        assert_eq!(back.stream, "gps/rtkfix");
        assert_eq!(back.payload.kind(), "relative_odometry");
    }

    #[test]
    fn fix_placeholders_are_stable() {
        assert_eq!(PositionFix::STATUS_FIX, 0);
        assert_eq!(PositionFix::SERVICE_GPS, 1);
    }

    #[test]
    fn covariance_indices_address_the_diagonal() {
        for (slot, index) in [
            RelativeOdometry::COV_X,
            RelativeOdometry::COV_Y,
            RelativeOdometry::COV_Z,
            RelativeOdometry::COV_ROLL,
            RelativeOdometry::COV_PITCH,
            RelativeOdometry::COV_YAW,
        ]
        .into_iter()
        .enumerate()
        {
            assert_eq!(index, slot * 7);
        }
    }
}
