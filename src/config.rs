//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files, plus the
//! small set of command-line overrides. Every field has a sensible default
//! except the serial port, which must always be supplied explicitly so a
//! session can never silently attach to the wrong device.

use serde::Deserialize;
use serde::de::Error;
use std::fs;
use std::path::Path;

use crate::error::{PidScopeError, Result};

/// Configuration file consulted when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// One-line usage string shown with every command-line error.
const USAGE: &str = "usage: pid-scope --port <device> [--output <file>] [--config <file>]";

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub serial: SerialConfig,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub render: RenderConfig,
}

/// Serial transport settings
#[derive(Debug, Deserialize, Clone)]
pub struct SerialConfig {
    /// Device the controller is attached to, e.g. `/dev/ttyUSB0`.
    /// Required; there is no default.
    #[serde(default)]
    pub port: String,

    /// Line rate of the controller's debug UART
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Upper bound on a single line read; an expired read yields an empty line
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// CSV log settings
#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    /// File that receives one row per accepted sample
    #[serde(default = "default_log_path")]
    pub path: String,
}

/// Collection session settings
#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    /// The session ends cleanly once this many samples have been accepted
    #[serde(default = "default_max_samples")]
    pub max_samples: u64,

    /// Divisor applied to the Kp/Ki/Kd wire values; legacy firmware
    /// transmits gains scaled by 10
    #[serde(default = "default_gain_scale")]
    pub gain_scale: u32,

    /// Scheduling tick of the collector loop, independent of the device's
    /// own sample rate
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

/// Live chart settings
#[derive(Debug, Deserialize, Clone)]
pub struct RenderConfig {
    /// Disable to run headless (log only)
    #[serde(default = "default_render_enabled")]
    pub enabled: bool,

    /// Fixed lower edge of the chart's y axis
    #[serde(default = "default_y_min")]
    pub y_min: f64,

    /// Fixed upper edge of the chart's y axis
    #[serde(default = "default_y_max")]
    pub y_max: f64,

    /// Minimum x-axis width in samples, so early data is not compressed
    #[serde(default = "default_min_window")]
    pub min_window: u64,
}

/// Command-line overrides, merged on top of the file-based configuration.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub port: Option<String>,
    pub output: Option<String>,
    pub config: Option<String>,
}

impl CliArgs {
    /// Scan argv-style arguments.
    ///
    /// Only three flags exist; anything else is a configuration error so a
    /// typo cannot start a session against the wrong device or file.
    pub fn parse<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut parsed = Self::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--port" => parsed.port = Some(flag_value(&arg, args.next())?),
                "--output" => parsed.output = Some(flag_value(&arg, args.next())?),
                "--config" => parsed.config = Some(flag_value(&arg, args.next())?),
                _ => {
                    return Err(config_error(format!("unknown flag '{}' ({})", arg, USAGE)));
                }
            }
        }

        Ok(parsed)
    }
}

fn flag_value(flag: &str, value: Option<String>) -> Result<String> {
    value.ok_or_else(|| config_error(format!("flag '{}' requires a value ({})", flag, USAGE)))
}

fn config_error(message: impl std::fmt::Display) -> PidScopeError {
    PidScopeError::Config(toml::de::Error::custom(message))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the TOML configuration file
    ///
    /// # Returns
    ///
    /// Returns the parsed and validated configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, contains invalid TOML,
    /// or fails validation.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use pid_scope::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), pid_scope::error::PidScopeError>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Self::parse_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Build the effective configuration for a session.
    ///
    /// Starts from `--config` if given, otherwise from
    /// [`DEFAULT_CONFIG_PATH`] when that file exists, otherwise from
    /// built-in defaults. CLI overrides are applied before validation, so
    /// `--port` alone is enough to run without any file at all.
    pub fn resolve(args: &CliArgs) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::parse_file(path)?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::parse_file(DEFAULT_CONFIG_PATH)?
            }
            None => Self::default(),
        };

        if let Some(port) = &args.port {
            config.serial.port = port.clone();
        }
        if let Some(output) = &args.output {
            config.log.path = output.clone();
        }

        config.validate()?;
        Ok(config)
    }

    fn parse_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.serial.port.is_empty() {
            return Err(config_error(
                "no serial port configured; set [serial] port or pass --port",
            ));
        }

        if self.serial.baud_rate == 0 {
            return Err(config_error("baud_rate must be greater than 0"));
        }

        if self.serial.timeout_ms == 0 || self.serial.timeout_ms > 60_000 {
            return Err(config_error("timeout_ms must be between 1 and 60000"));
        }

        if self.log.path.is_empty() {
            return Err(config_error("log path cannot be empty"));
        }

        if self.session.max_samples == 0 || self.session.max_samples > 1_000_000 {
            return Err(config_error("max_samples must be between 1 and 1000000"));
        }

        if self.session.gain_scale == 0 {
            return Err(config_error("gain_scale must be greater than 0"));
        }

        if self.session.tick_interval_ms == 0 || self.session.tick_interval_ms > 10_000 {
            return Err(config_error("tick_interval_ms must be between 1 and 10000"));
        }

        if self.render.y_min >= self.render.y_max {
            return Err(config_error("y_min must be less than y_max"));
        }

        Ok(())
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: String::new(),
            baud_rate: default_baud_rate(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            path: default_log_path(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_samples: default_max_samples(),
            gain_scale: default_gain_scale(),
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            enabled: default_render_enabled(),
            y_min: default_y_min(),
            y_max: default_y_max(),
            min_window: default_min_window(),
        }
    }
}

// Default value functions
fn default_baud_rate() -> u32 {
    9600
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_log_path() -> String {
    "pid_data.csv".to_string()
}

fn default_max_samples() -> u64 {
    1000
}

fn default_gain_scale() -> u32 {
    1
}

fn default_tick_interval_ms() -> u64 {
    200
}

fn default_render_enabled() -> bool {
    true
}

fn default_y_min() -> f64 {
    0.0
}

fn default_y_max() -> f64 {
    60.0
}

fn default_min_window() -> u64 {
    100
}
