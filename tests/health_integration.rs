//! ---
//! rtk_section: "15-testing-qa"
//! rtk_subsection: "module"
//! rtk_type: "source"
//! rtk_scope: "code"
//! rtk_description: "Link-health and failure-policy integration suite."
//! rtk_version: "v0.0.0-prealpha"
//! rtk_owner: "tbd"
//! ---
use std::sync::Arc;
use std::time::Duration;

use rtk_link_common::config::{AppConfig, Mode};
use rtk_link_driver::{ConnectionState, DriverHandle, HealthStatus, LinkDriver};
use rtk_link_msg::{InMemoryTransport, NavBus};
use rtk_link_proto::{ScriptFeed, ScriptedChannel, ScriptedTransport};

fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.mode = Mode::Simulation;
    config.link.poll_interval = Duration::from_millis(1);
    config
}

struct Rig {
    handle: DriverHandle,
    feed: ScriptFeed,
    probe: ScriptedTransport,
}

fn start_rig(config: AppConfig) -> Rig {
    let (channel, feed) = ScriptedChannel::new();
    let transport = ScriptedTransport::new();
    let probe = transport.clone();
    let bus = NavBus::new();
    bus.register_transport(Arc::new(InMemoryTransport::new()));
    let handle =
        LinkDriver::new(&config, Box::new(transport), Box::new(channel), bus).start();
    Rig {
        handle,
        feed,
        probe,
    }
}

#[tokio::test]
async fn unopenable_link_reports_disconnected() {
    let (channel, _feed) = ScriptedChannel::new();
    let transport = ScriptedTransport::new();
    transport.refuse_next_opens(u32::MAX);
    let bus = NavBus::new();
    bus.register_transport(Arc::new(InMemoryTransport::new()));
    let handle =
        LinkDriver::new(&test_config(), Box::new(transport), Box::new(channel), bus).start();

    tokio::time::sleep(Duration::from_millis(50)).await;
    let snapshot = handle.diagnostics().await;
    assert_eq!(snapshot.status, HealthStatus::Error);
    assert_eq!(snapshot.message, "disconnected");
    assert_eq!(snapshot.state, ConnectionState::Closed);
    assert!(snapshot.counters.open_failures >= 1);

    handle.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn decode_failures_surface_and_clear() {
    let rig = start_rig(test_config());

    // wait for the lazy open, then fail exactly one decode pass
    for _ in 0..500 {
        if rig.probe.is_open() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    rig.feed.inject_io_error();

    let mut recovered = None;
    for _ in 0..500 {
        let snapshot = rig.handle.diagnostics().await;
        if snapshot.counters.io_failures >= 1 && snapshot.status == HealthStatus::Ok {
            recovered = Some(snapshot);
            break;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    let snapshot = recovered.expect("io failure recorded and status settled back to ok");
    assert_eq!(snapshot.state, ConnectionState::Open);
    assert_eq!(snapshot.counters.open_failures, 0);

    rig.handle.shutdown().await.expect("shutdown");
}

#[tokio::test]
async fn sustained_decode_failures_trigger_the_reopen_policy() {
    let mut config = test_config();
    config.link.reopen_after_io_failures = 3;
    let rig = start_rig(config);

    for _ in 0..500 {
        if rig.probe.is_open() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    rig.probe.set_read_failure(true);

    // the link should close after three consecutive failures and be
    // reopened lazily on a later cycle
    for _ in 0..500 {
        if rig.probe.open_count() >= 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    assert!(rig.probe.open_count() >= 2);
    assert!(rig.probe.close_count() >= 1);

    rig.probe.set_read_failure(false);
    let mut settled = false;
    for _ in 0..500 {
        let snapshot = rig.handle.diagnostics().await;
        if snapshot.status == HealthStatus::Ok && snapshot.state == ConnectionState::Open {
            assert!(snapshot.counters.io_failures >= 3);
            settled = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    assert!(settled, "link never settled back to ok after reads recovered");

    rig.handle.shutdown().await.expect("shutdown");
}
