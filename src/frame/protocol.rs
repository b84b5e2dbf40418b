//! # Wire Protocol Constants and Types
//!
//! Core definitions for the controller's telemetry line format.
//!
//! A telemetry line is whitespace-delimited ASCII:
//!
//! ```text
//! DB <setpoint> <actual> <kp> <ki> <kd>
//! ```
//!
//! where every field after the marker is a base-10 integer. Lines that do
//! not start with the marker are legitimate pass-through output from the
//! device (boot messages and the like), not protocol errors.

/// Marker token identifying a telemetry line (first space-delimited field)
pub const FRAME_MARKER: &[u8] = b"DB";

/// Number of numeric fields that must follow the marker
pub const FRAME_VALUE_COUNT: usize = 5;

/// One decoded telemetry frame, before a sequence number is assigned.
///
/// Produced by the frame parser; the collector loop turns it into a
/// [`Sample`] once it accepts the reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    /// Commanded process value (RPM)
    pub setpoint: i64,

    /// Measured process value (RPM)
    pub actual: i64,

    /// Loop error, `setpoint - actual`; derived, not transmitted
    pub error: i64,

    /// Proportional gain, already divided by the configured gain scale
    pub kp: f64,

    /// Integral gain, already divided by the configured gain scale
    pub ki: f64,

    /// Derivative gain, already divided by the configured gain scale
    pub kd: f64,
}

impl Reading {
    /// Build a reading from decoded wire values, deriving the loop error.
    pub fn new(setpoint: i64, actual: i64, kp: f64, ki: f64, kd: f64) -> Self {
        Self {
            setpoint,
            actual,
            error: setpoint - actual,
            kp,
            ki,
            kd,
        }
    }
}

/// One accepted telemetry record.
///
/// A `Sample` exists only if its raw line passed the marker check and all
/// five numeric fields decoded; the sequence number is assigned by the
/// collector loop (one per accepted reading, never the device's own clock).
/// Samples are immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Session-local sequence number, dense over accepted samples (1-based)
    pub sequence: u64,

    /// Commanded process value (RPM)
    pub setpoint: i64,

    /// Measured process value (RPM)
    pub actual: i64,

    /// Loop error, `setpoint - actual`
    pub error: i64,

    /// Proportional gain
    pub kp: f64,

    /// Integral gain
    pub ki: f64,

    /// Derivative gain
    pub kd: f64,
}

impl Sample {
    /// Attach a sequence number to an accepted reading.
    pub fn from_reading(sequence: u64, reading: Reading) -> Self {
        Self {
            sequence,
            setpoint: reading.setpoint,
            actual: reading.actual,
            error: reading.error,
            kp: reading.kp,
            ki: reading.ki,
            kd: reading.kd,
        }
    }
}

/// Outcome of decoding one raw line.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedLine {
    /// The line carried the telemetry marker and every field decoded
    Reading(Reading),

    /// Any line without the marker, kept verbatim for diagnostic logging
    Passthrough(Vec<u8>),
}
