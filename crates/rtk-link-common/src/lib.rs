//! ---
//! rtk_section: "01-driver-core"
//! rtk_subsection: "module"
//! rtk_type: "source"
//! rtk_scope: "code"
//! rtk_description: "Shared primitives and utilities for the driver runtime."
//! rtk_version: "v0.0.0-prealpha"
//! rtk_owner: "tbd"
//! ---
//! Core shared primitives for the RTK-Link workspace.
//! This crate exposes configuration loading, logging setup, and timing
//! utilities consumed across the workspace.

pub mod config;
pub mod logging;
pub mod time;

pub use config::{
    AppConfig, DeviceConfig, LinkConfig, LoadedAppConfig, LoggingConfig, Mode, RateBoundsConfig,
};
pub use logging::{init_tracing, LogFormat};
