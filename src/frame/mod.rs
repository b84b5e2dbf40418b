//! # Telemetry Frame Module
//!
//! Implementation of the line-oriented debug protocol the motor controller
//! firmware prints over its UART.
//!
//! This module handles:
//! - Frame recognition (the `DB` marker check)
//! - Decoding the five numeric fields into a typed reading
//! - Gain scaling for firmware variants that transmit gains pre-scaled ×10
//! - Routing non-telemetry lines (boot logs, prompts) to pass-through

pub mod protocol;
pub mod parser;

pub use parser::decode_line;
pub use protocol::{DecodedLine, Reading, Sample};
