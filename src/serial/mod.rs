//! # Serial Transport Module
//!
//! Line-oriented reads from the motor controller's debug UART.
//!
//! This module handles:
//! - Opening the serial port 8N1 at the configured baud rate
//! - Buffered line reads bounded by the configured timeout
//! - Mapping a dead port (EOF) to a transport error
//!
//! Reconnection is deliberately out of scope: when the port goes away the
//! session ends and the log stays intact.

pub mod line_reader;

use std::io;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::timeout;
use tokio_serial::SerialPortBuilderExt;
use tracing::info;

use crate::config::SerialConfig;
use crate::error::{PidScopeError, Result};
use line_reader::LineRead;

/// Serial connection to the motor controller's debug UART.
pub struct TelemetryPort {
    /// Buffered reader over the serial stream
    reader: BufReader<tokio_serial::SerialStream>,
    /// Device path (e.g., /dev/ttyUSB0)
    device_path: String,
    /// Bound on a single line read
    read_timeout: Duration,
}

impl std::fmt::Debug for TelemetryPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryPort")
            .field("device_path", &self.device_path)
            .field("read_timeout", &self.read_timeout)
            .finish_non_exhaustive()
    }
}

impl TelemetryPort {
    /// Open the configured device.
    ///
    /// Must be called from within a tokio runtime; the stream registers
    /// with the runtime's reactor.
    ///
    /// # Arguments
    ///
    /// * `config` - Serial transport settings (device, baud rate, timeout)
    ///
    /// # Returns
    ///
    /// * `Result<TelemetryPort>` - Connected serial port or error
    ///
    /// # Errors
    ///
    /// Returns [`PidScopeError::Serial`] if the device cannot be opened.
    pub fn open(config: &SerialConfig) -> Result<Self> {
        let port = Self::open_port(&config.port, config.baud_rate)?;
        info!("Opened {} at {} baud", config.port, config.baud_rate);

        Ok(Self {
            reader: BufReader::new(port),
            device_path: config.port.clone(),
            read_timeout: Duration::from_millis(config.timeout_ms),
        })
    }

    /// Open a serial port with the controller's line settings (8N1, no
    /// flow control)
    ///
    /// # Arguments
    ///
    /// * `path` - Device path (e.g., "/dev/ttyUSB0")
    /// * `baud_rate` - Line rate in baud
    ///
    /// # Returns
    ///
    /// * `Result<SerialStream>` - Opened serial port
    fn open_port(path: &str, baud_rate: u32) -> Result<tokio_serial::SerialStream> {
        let port = tokio_serial::new(path, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| PidScopeError::Serial(format!("Failed to open {}: {}", path, e)))?;

        Ok(port)
    }

    /// Get the device path of the opened serial port
    ///
    /// # Returns
    ///
    /// * `&str` - Reference to the device path string
    pub fn device_path(&self) -> &str {
        &self.device_path
    }
}

#[async_trait]
impl LineRead for TelemetryPort {
    /// Read up to the next `\n`.
    ///
    /// An expired timeout yields an empty line; any partial bytes are
    /// discarded, and the remainder of that line then fails the marker
    /// check downstream and is skipped. A read of zero bytes means the
    /// port is gone, which is fatal: reconnection is not attempted.
    async fn read_line(&mut self) -> io::Result<Vec<u8>> {
        let mut line = Vec::new();

        match timeout(self.read_timeout, self.reader.read_until(b'\n', &mut line)).await {
            Err(_) => Ok(Vec::new()),
            Ok(Ok(0)) => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "serial port closed",
            )),
            Ok(Ok(_)) => Ok(line),
            Ok(Err(e)) => Err(e),
        }
    }
}
