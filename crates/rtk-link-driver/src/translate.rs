//! ---
//! rtk_section: "01-driver-core"
//! rtk_subsection: "module"
//! rtk_type: "source"
//! rtk_scope: "code"
//! rtk_description: "Connection lifecycle and telemetry pipeline."
//! rtk_version: "v0.0.0-prealpha"
//! rtk_owner: "tbd"
//! ---
//! Record-to-message conversions.
//!
//! One pure mapping per decoded record tag. Publication and health ticks
//! belong to the callers; nothing here has side effects beyond message
//! construction.

use rtk_link_msg::{NavHeader, PositionFix, RelativeOdometry, TimeReference};
use rtk_link_proto::{BaselineNedRecord, GpsTimeRecord, PositionLlhRecord};

/// Covariance stand-in when the receiver supplies no usable estimate.
pub const UNKNOWN_COVARIANCE: f64 = 1.0e3;

/// Fix-quality flag value reporting an RTK fixed solution.
pub const RTK_FIXED_FLAG: u8 = 1;

/// Accuracy fields are trusted only with strictly more satellites than this.
pub const MIN_SATS_FOR_ACCURACY: u8 = 4;

/// Source label stamped onto every time reference.
const TIME_SOURCE: &str = "gps";

/// Map a GPS time record to a time reference.
///
/// The receiver's time-of-week field is carried verbatim in the seconds
/// component; the header stamp is the time of receipt, not device time.
pub fn time_reference(record: &GpsTimeRecord, frame_id: &str) -> TimeReference {
    TimeReference {
        header: NavHeader::now(frame_id),
        time_ref_sec: record.tow_ms,
        source: TIME_SOURCE.to_owned(),
    }
}

/// Map a geodetic position record to an absolute fix.
///
/// Latitude/longitude/height are already in degrees/degrees/meters and are
/// copied verbatim. Status and service stay at their placeholder values
/// until a fix-quality mapping is specified.
pub fn position_fix(record: &PositionLlhRecord, frame_id: &str) -> PositionFix {
    PositionFix {
        header: NavHeader::now(frame_id),
        status: PositionFix::STATUS_FIX,
        service: PositionFix::SERVICE_GPS,
        latitude_deg: record.lat_deg,
        longitude_deg: record.lon_deg,
        altitude_m: record.height_m,
    }
}

/// Map a baseline record to relative odometry.
///
/// Converts millimeters to meters and NED to ENU (x = east, y = north,
/// z = up). Position covariance comes from the accuracy fields only for an
/// RTK fixed solution with enough satellites; orientation and twist
/// diagonals are always the unknown value since the receiver estimates
/// neither.
pub fn relative_odometry(record: &BaselineNedRecord, frame_id: &str) -> RelativeOdometry {
    let position_m = [
        f64::from(record.e_mm) / 1000.0,
        f64::from(record.n_mm) / 1000.0,
        -f64::from(record.d_mm) / 1000.0,
    ];

    let (h_covariance, v_covariance) =
        if record.flags == RTK_FIXED_FLAG && record.n_sats > MIN_SATS_FOR_ACCURACY {
            (
                record.h_accuracy * record.h_accuracy,
                record.v_accuracy * record.v_accuracy,
            )
        } else {
            (UNKNOWN_COVARIANCE, UNKNOWN_COVARIANCE)
        };

    let mut pose_covariance = [0.0; 36];
    pose_covariance[RelativeOdometry::COV_X] = h_covariance;
    pose_covariance[RelativeOdometry::COV_Y] = h_covariance;
    pose_covariance[RelativeOdometry::COV_Z] = v_covariance;
    pose_covariance[RelativeOdometry::COV_ROLL] = UNKNOWN_COVARIANCE;
    pose_covariance[RelativeOdometry::COV_PITCH] = UNKNOWN_COVARIANCE;
    pose_covariance[RelativeOdometry::COV_YAW] = UNKNOWN_COVARIANCE;

    let mut twist_covariance = [0.0; 36];
    twist_covariance[RelativeOdometry::COV_X] = UNKNOWN_COVARIANCE;
    twist_covariance[RelativeOdometry::COV_Y] = UNKNOWN_COVARIANCE;
    twist_covariance[RelativeOdometry::COV_Z] = UNKNOWN_COVARIANCE;
    twist_covariance[RelativeOdometry::COV_ROLL] = UNKNOWN_COVARIANCE;
    twist_covariance[RelativeOdometry::COV_PITCH] = UNKNOWN_COVARIANCE;
    twist_covariance[RelativeOdometry::COV_YAW] = UNKNOWN_COVARIANCE;

    RelativeOdometry {
        header: NavHeader::now(frame_id),
        child_frame_id: frame_id.to_owned(),
        position_m,
        pose_covariance,
        twist_covariance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn baseline(n_mm: i32, e_mm: i32, d_mm: i32, flags: u8, n_sats: u8) -> BaselineNedRecord {
        BaselineNedRecord {
            tow_ms: 100,
            n_mm,
            e_mm,
            d_mm,
            h_accuracy: 0.02,
            v_accuracy: 0.05,
            n_sats,
            flags,
        }
    }

    #[test]
    fn time_reference_carries_time_of_week_verbatim() {
        let record = GpsTimeRecord {
            wn: 2200,
            tow_ms: 443_521_000,
            ns: 170,
            flags: 1,
        };
        let msg = time_reference(&record, "gps");
        assert_eq!(msg.time_ref_sec, 443_521_000);
        assert_eq!(msg.source, "gps");
        assert_eq!(msg.header.frame_id, "gps");
    }

    #[test]
    fn position_fix_copies_coordinates_and_keeps_placeholders() {
        let record = PositionLlhRecord {
            tow_ms: 100,
            lat_deg: 37.7749,
            lon_deg: -122.4194,
            height_m: 16.25,
            h_accuracy: 0.0,
            v_accuracy: 0.0,
            n_sats: 9,
            flags: 0,
        };
        let msg = position_fix(&record, "gps_antenna");
        assert_eq!(msg.latitude_deg, 37.7749);
        assert_eq!(msg.longitude_deg, -122.4194);
        assert_eq!(msg.altitude_m, 16.25);
        assert_eq!(msg.status, PositionFix::STATUS_FIX);
        assert_eq!(msg.service, PositionFix::SERVICE_GPS);
        assert_eq!(msg.header.frame_id, "gps_antenna");
    }

    #[test]
    fn baseline_converts_units_and_frame_exactly() {
        let msg = relative_odometry(&baseline(1000, 2000, -500, 0, 9), "gps");
        assert_eq!(msg.position_m, [2.0, 1.0, 0.5]);
    }

    #[test]
    fn good_fix_uses_squared_accuracy_for_covariance() {
        let msg = relative_odometry(&baseline(0, 0, 0, 1, 5), "gps");
        assert_eq!(msg.pose_covariance[RelativeOdometry::COV_X], 0.0004);
        assert_eq!(msg.pose_covariance[RelativeOdometry::COV_Y], 0.0004);
        assert_eq!(msg.pose_covariance[RelativeOdometry::COV_Z], 0.0025);
    }

    #[test]
    fn poor_fix_falls_back_to_unknown_covariance() {
        for record in [
            baseline(0, 0, 0, 0, 9), // not an RTK fixed solution
            baseline(0, 0, 0, 1, 4), // too few satellites
            baseline(0, 0, 0, 2, 9), // float solution flag
        ] {
            let msg = relative_odometry(&record, "gps");
            assert_eq!(msg.pose_covariance[RelativeOdometry::COV_X], 1000.0);
            assert_eq!(msg.pose_covariance[RelativeOdometry::COV_Y], 1000.0);
            assert_eq!(msg.pose_covariance[RelativeOdometry::COV_Z], 1000.0);
        }
    }

    #[test]
    fn orientation_and_twist_stay_unknown_regardless_of_fix() {
        let msg = relative_odometry(&baseline(0, 0, 0, 1, 9), "gps");
        for index in [
            RelativeOdometry::COV_ROLL,
            RelativeOdometry::COV_PITCH,
            RelativeOdometry::COV_YAW,
        ] {
            assert_eq!(msg.pose_covariance[index], UNKNOWN_COVARIANCE);
        }
        for index in [
            RelativeOdometry::COV_X,
            RelativeOdometry::COV_Y,
            RelativeOdometry::COV_Z,
            RelativeOdometry::COV_ROLL,
            RelativeOdometry::COV_PITCH,
            RelativeOdometry::COV_YAW,
        ] {
            assert_eq!(msg.twist_covariance[index], UNKNOWN_COVARIANCE);
        }
    }
}
