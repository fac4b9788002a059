//! ---
//! rtk_section: "01-driver-core"
//! rtk_subsection: "module"
//! rtk_type: "source"
//! rtk_scope: "code"
//! rtk_description: "Synthetic receiver feed for simulation mode."
//! rtk_version: "v0.0.0-prealpha"
//! rtk_owner: "tbd"
//! ---
use std::time::Duration;

use rtk_link_proto::{
    BaselineNedRecord, DecodedRecord, GpsTimeRecord, HeartbeatRecord, PositionLlhRecord,
    ScriptFeed,
};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::debug;

const SIM_SENDER: u16 = 0x42;
const FEED_INTERVAL: Duration = Duration::from_millis(30);
// cycles between baseline records (~2 Hz) and heartbeats (~1 Hz)
const BASELINE_EVERY: u64 = 16;
const HEARTBEAT_EVERY: u64 = 33;

/// Push a deterministic stream of records into the scripted channel at
/// rates matching a live receiver: time and fix every cycle, baselines
/// and heartbeats at their slower cadences.
pub fn spawn_feeder(feed: ScriptFeed, mut shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(FEED_INTERVAL);
        let mut cycle: u64 = 0;
        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    debug!("simulation feeder shutdown");
                    break;
                }
                _ = interval.tick() => {
                    cycle += 1;
                    push_cycle(&feed, cycle);
                }
            }
        }
    })
}

fn push_cycle(feed: &ScriptFeed, cycle: u64) {
    let tow_ms = (cycle * FEED_INTERVAL.as_millis() as u64) as u32;

    feed.push(
        SIM_SENDER,
        DecodedRecord::GpsTime(GpsTimeRecord {
            wn: 2310,
            tow_ms,
            ns: 0,
            flags: 1,
        }),
    );

    // slow drift around a fixed survey point
    let wander = (cycle % 200) as f64 * 1.0e-7;
    feed.push(
        SIM_SENDER,
        DecodedRecord::PositionLlh(PositionLlhRecord {
            tow_ms,
            lat_deg: 59.3293 + wander,
            lon_deg: 18.0686 - wander,
            height_m: 28.5,
            h_accuracy: 0.8,
            v_accuracy: 1.2,
            n_sats: 11,
            flags: 0,
        }),
    );

    if cycle % BASELINE_EVERY == 0 {
        let sweep = (cycle % 1000) as i32;
        feed.push(
            SIM_SENDER,
            DecodedRecord::BaselineNed(BaselineNedRecord {
                tow_ms,
                n_mm: 1_000 + sweep,
                e_mm: 2_000 - sweep,
                d_mm: -500,
                h_accuracy: 0.02,
                v_accuracy: 0.05,
                n_sats: 7,
                flags: 1,
            }),
        );
    }

    if cycle % HEARTBEAT_EVERY == 0 {
        feed.push(
            SIM_SENDER,
            DecodedRecord::Heartbeat(HeartbeatRecord { flags: 0 }),
        );
    }
}
