//! ---
//! rtk_section: "01-driver-core"
//! rtk_subsection: "module"
//! rtk_type: "source"
//! rtk_scope: "code"
//! rtk_description: "Shared primitives and utilities for the driver runtime."
//! rtk_version: "v0.0.0-prealpha"
//! rtk_owner: "tbd"
//! ---
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMicroSeconds};
use tracing::debug;

use crate::logging::LogFormat;

fn default_mode() -> Mode {
    Mode::Production
}

fn default_port() -> String {
    "/dev/ttyUSB0".to_owned()
}

fn default_baud() -> u32 {
    115_200
}

fn default_frame_id() -> String {
    "gps".to_owned()
}

// 2000 decode passes per second keeps the decoder's internal queue drained.
fn default_poll_interval() -> Duration {
    Duration::from_micros(500)
}

fn default_nav_min_hz() -> f64 {
    20.0
}

fn default_nav_max_hz() -> f64 {
    80.0
}

fn default_rtk_min_hz() -> f64 {
    0.5
}

fn default_rtk_max_hz() -> f64 {
    10.0
}

fn default_rate_tolerance() -> f64 {
    0.1
}

fn default_rate_window() -> usize {
    10
}

fn default_logging_directory() -> PathBuf {
    PathBuf::from("target/logs")
}

fn default_log_format() -> LogFormat {
    LogFormat::StructuredJson
}

/// Primary configuration object for the RTK-Link runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_mode")]
    pub mode: Mode,
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub link: LinkConfig,
    #[serde(default)]
    pub rates: RateBoundsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Metadata describing where an [`AppConfig`] was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedAppConfig {
    pub config: AppConfig,
    pub source: PathBuf,
}

impl AppConfig {
    pub const ENV_CONFIG_PATH: &str = "RTK_LINK_CONFIG";

    /// Load configuration from disk, respecting the `RTK_LINK_CONFIG` override.
    pub fn load<P: AsRef<Path>>(candidates: &[P]) -> Result<Self> {
        Ok(Self::load_with_source(candidates)?.config)
    }

    /// Load configuration from disk together with the effective source path.
    pub fn load_with_source<P: AsRef<Path>>(candidates: &[P]) -> Result<LoadedAppConfig> {
        if let Ok(env_path) = std::env::var(Self::ENV_CONFIG_PATH) {
            if !env_path.trim().is_empty() {
                let path = PathBuf::from(env_path);
                let config = Self::from_path(path.clone())?;
                return Ok(LoadedAppConfig {
                    config,
                    source: path,
                });
            }
        }

        for candidate in candidates {
            if candidate.as_ref().exists() {
                let path = candidate.as_ref().to_path_buf();
                let config = Self::from_path(path.clone())?;
                return Ok(LoadedAppConfig {
                    config,
                    source: path,
                });
            }
        }

        Err(anyhow!(
            "no configuration files found. inspected: {}",
            candidates
                .iter()
                .map(|p| p.as_ref().display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ))
    }

    fn from_path(path: PathBuf) -> Result<Self> {
        debug!(config_path = %path.display(), "loading configuration");
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        let config = toml::from_str::<AppConfig>(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints that serde defaults cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.mode == Mode::Production && self.device.port.trim().is_empty() {
            return Err(anyhow!("device.port must not be empty in production mode"));
        }
        if self.device.baud == 0 {
            return Err(anyhow!("device.baud must be greater than zero"));
        }
        if self.link.poll_interval.is_zero() {
            return Err(anyhow!("link.poll_interval_us must be greater than zero"));
        }
        if self.link.frame_id.trim().is_empty() {
            return Err(anyhow!("link.frame_id must not be empty"));
        }
        self.rates.validate()?;
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            device: DeviceConfig::default(),
            link: LinkConfig::default(),
            rates: RateBoundsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Operating mode of the daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Talk to real receiver hardware over the configured transport.
    Production,
    /// Drive the pipeline from the scripted in-memory backend.
    Simulation,
}

impl Mode {
    pub fn is_simulation(&self) -> bool {
        matches!(self, Mode::Simulation)
    }
}

/// Receiver transport endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Serial device path of the receiver (e.g. `/dev/ttyUSB0`).
    #[serde(default = "default_port")]
    pub port: String,
    /// Serial baud rate.
    #[serde(default = "default_baud")]
    pub baud: u32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            baud: default_baud(),
        }
    }
}

/// Connection and poll-loop behaviour.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkConfig {
    /// Coordinate-frame label stamped onto every outbound message.
    #[serde(default = "default_frame_id")]
    pub frame_id: String,
    /// Delay between decode passes.
    #[serde_as(as = "DurationMicroSeconds<u64>")]
    #[serde(default = "default_poll_interval", rename = "poll_interval_us")]
    pub poll_interval: Duration,
    /// Close and lazily reopen the link after this many consecutive decode
    /// failures. Zero disables the policy.
    #[serde(default)]
    pub reopen_after_io_failures: u32,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            frame_id: default_frame_id(),
            poll_interval: default_poll_interval(),
            reopen_after_io_failures: 0,
        }
    }
}

/// Expected publish-rate bounds for the two telemetry classes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateBoundsConfig {
    /// Minimum expected rate for time/fix telemetry, in Hz.
    #[serde(default = "default_nav_min_hz")]
    pub nav_min_hz: f64,
    /// Maximum expected rate for time/fix telemetry, in Hz.
    #[serde(default = "default_nav_max_hz")]
    pub nav_max_hz: f64,
    /// Minimum expected rate for relative-position telemetry, in Hz.
    #[serde(default = "default_rtk_min_hz")]
    pub rtk_min_hz: f64,
    /// Maximum expected rate for relative-position telemetry, in Hz.
    #[serde(default = "default_rtk_max_hz")]
    pub rtk_max_hz: f64,
    /// Fractional slack applied to both bounds.
    #[serde(default = "default_rate_tolerance")]
    pub tolerance: f64,
    /// Number of tick timestamps retained per rate window.
    #[serde(default = "default_rate_window")]
    pub window: usize,
}

impl RateBoundsConfig {
    pub fn validate(&self) -> Result<()> {
        if self.nav_min_hz >= self.nav_max_hz {
            return Err(anyhow!("rates.nav_min_hz must be below rates.nav_max_hz"));
        }
        if self.rtk_min_hz >= self.rtk_max_hz {
            return Err(anyhow!("rates.rtk_min_hz must be below rates.rtk_max_hz"));
        }
        if self.tolerance < 0.0 {
            return Err(anyhow!("rates.tolerance must not be negative"));
        }
        if self.window < 2 {
            return Err(anyhow!("rates.window must hold at least two samples"));
        }
        Ok(())
    }
}

impl Default for RateBoundsConfig {
    fn default() -> Self {
        Self {
            nav_min_hz: default_nav_min_hz(),
            nav_max_hz: default_nav_max_hz(),
            rtk_min_hz: default_rtk_min_hz(),
            rtk_max_hz: default_rtk_max_hz(),
            tolerance: default_rate_tolerance(),
            window: default_rate_window(),
        }
    }
}

/// Logging sink settings consumed by [`crate::logging::init_tracing`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Directory for rolling log files.
    #[serde(default = "default_logging_directory")]
    pub directory: PathBuf,
    /// Stdout layer format.
    #[serde(default = "default_log_format")]
    pub format: LogFormat,
    /// Log file prefix; defaults to the service name.
    #[serde(default)]
    pub file_prefix: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_logging_directory(),
            format: default_log_format(),
            file_prefix: None,
        }
    }
}
