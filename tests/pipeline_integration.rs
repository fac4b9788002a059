//! ---
//! rtk_section: "15-testing-qa"
//! rtk_subsection: "module"
//! rtk_type: "source"
//! rtk_scope: "code"
//! rtk_description: "End-to-end pipeline integration suite."
//! rtk_version: "v0.0.0-prealpha"
//! rtk_owner: "tbd"
//! ---
use std::sync::Arc;
use std::time::Duration;

use rtk_link_common::config::{AppConfig, Mode};
use rtk_link_driver::{ConnectionState, LinkDriver};
use rtk_link_msg::{BusTransport, InMemoryTransport, NavBus, NavMessage, NavPayload, RelativeOdometry};
use rtk_link_proto::{
    BaselineNedRecord, DecodedRecord, GpsTimeRecord, HeartbeatRecord, PositionLlhRecord,
    ScriptedChannel, ScriptedTransport,
};

fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.mode = Mode::Simulation;
    config.link.poll_interval = Duration::from_millis(1);
    config
}

async fn drain_until(
    out: &InMemoryTransport,
    sink: &mut Vec<NavMessage>,
    expected: usize,
) {
    for _ in 0..500 {
        while let Some(message) = out.recv() {
            sink.push(message);
        }
        if sink.len() >= expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("expected {} bus messages, saw {}", expected, sink.len());
}

#[tokio::test]
async fn records_flow_from_feed_to_bus() {
    let (channel, feed) = ScriptedChannel::new();
    let transport = ScriptedTransport::new();
    let probe = transport.clone();
    let bus = NavBus::new();
    let out = Arc::new(InMemoryTransport::new());
    bus.register_transport(out.clone());

    let handle = LinkDriver::new(
        &test_config(),
        Box::new(transport),
        Box::new(channel),
        bus.clone(),
    )
    .start();

    feed.push(
        1,
        DecodedRecord::GpsTime(GpsTimeRecord {
            wn: 2310,
            tow_ms: 443_521_000,
            ns: 0,
            flags: 1,
        }),
    );
    feed.push(
        1,
        DecodedRecord::PositionLlh(PositionLlhRecord {
            tow_ms: 100,
            lat_deg: 59.3293,
            lon_deg: 18.0686,
            height_m: 28.5,
            h_accuracy: 0.8,
            v_accuracy: 1.2,
            n_sats: 11,
            flags: 0,
        }),
    );
    feed.push(
        1,
        DecodedRecord::BaselineNed(BaselineNedRecord {
            tow_ms: 100,
            n_mm: 1000,
            e_mm: 2000,
            d_mm: -500,
            h_accuracy: 0.02,
            v_accuracy: 0.05,
            n_sats: 7,
            flags: 1,
        }),
    );
    // error-flagged heartbeat: logged, never published
    feed.push(1, DecodedRecord::Heartbeat(HeartbeatRecord { flags: 1 }));

    let mut messages = Vec::new();
    drain_until(&out, &mut messages, 3).await;
    assert_eq!(messages.len(), 3);

    let streams: Vec<&str> = messages.iter().map(|m| m.stream.as_str()).collect();
    assert_eq!(streams, vec!["gps/time", "gps/fix", "gps/rtkfix"]);

    match &messages[0].payload {
        NavPayload::TimeReference(time_ref) => {
            assert_eq!(time_ref.time_ref_sec, 443_521_000);
            assert_eq!(time_ref.source, "gps");
            assert_eq!(time_ref.header.frame_id, "gps");
        }
        other => panic!("unexpected payload on gps/time: {}", other.kind()),
    }

    match &messages[2].payload {
        NavPayload::RelativeOdometry(odometry) => {
            assert_eq!(odometry.position_m, [2.0, 1.0, 0.5]);
            assert_eq!(odometry.pose_covariance[RelativeOdometry::COV_X], 0.0004);
            assert_eq!(odometry.pose_covariance[RelativeOdometry::COV_Z], 0.0025);
        }
        other => panic!("unexpected payload on gps/rtkfix: {}", other.kind()),
    }

    let snapshot = handle.diagnostics().await;
    assert_eq!(snapshot.state, ConnectionState::Open);
    assert_eq!(snapshot.counters.io_failures, 0);

    handle.shutdown().await.expect("shutdown");
    assert!(!probe.is_open());
    assert!(probe.close_count() >= 1);
}

#[tokio::test]
async fn explicit_close_is_reopened_by_the_poll_loop() {
    let (channel, feed) = ScriptedChannel::new();
    let transport = ScriptedTransport::new();
    let probe = transport.clone();
    let bus = NavBus::new();
    let out = Arc::new(InMemoryTransport::new());
    bus.register_transport(out.clone());

    let handle = LinkDriver::new(
        &test_config(),
        Box::new(transport),
        Box::new(channel),
        bus,
    )
    .start();

    // wait for the lazy open
    for _ in 0..500 {
        if probe.is_open() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    assert!(probe.is_open());

    handle.close().await;

    // the loop reconnects on a later cycle and dispatch resumes
    for _ in 0..500 {
        if probe.open_count() >= 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    assert!(probe.open_count() >= 2);

    feed.push(
        1,
        DecodedRecord::GpsTime(GpsTimeRecord {
            wn: 1,
            tow_ms: 1,
            ns: 0,
            flags: 0,
        }),
    );
    let mut messages = Vec::new();
    drain_until(&out, &mut messages, 1).await;
    assert_eq!(messages[0].stream, "gps/time");

    handle.shutdown().await.expect("shutdown");
}
