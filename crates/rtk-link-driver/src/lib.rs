//! ---
//! rtk_section: "01-driver-core"
//! rtk_subsection: "module"
//! rtk_type: "source"
//! rtk_scope: "code"
//! rtk_description: "Connection lifecycle and telemetry pipeline."
//! rtk_version: "v0.0.0-prealpha"
//! rtk_owner: "tbd"
//! ---
//! Connection/telemetry pipeline for the RTK-Link receiver bridge.
//!
//! One background task polls the receiver at a fixed cadence: it lazily
//! (re)opens the connection, drives a decode pass through the protocol
//! channel, lets the registered handlers translate and publish records,
//! and refreshes the link-health summary. All connection state sits behind
//! a single exclusion lock shared with explicit open/close requests and
//! diagnostics queries.

pub mod connection;
pub mod driver;
pub mod health;
pub mod poll;
pub mod scheduling;
pub mod translate;

pub use connection::{ConnectionState, FailureCounters, Link};
pub use driver::{DriverHandle, LinkDriver};
pub use health::{HealthMonitor, HealthSnapshot, HealthStatus};
pub use scheduling::RateLimiter;
