//! # PID Scope Library
//!
//! Watch a serial PID control loop tune itself, live.
//!
//! This library provides the host-side pipeline for the `DB`-framed debug
//! stream an embedded motor controller prints over UART: frame decoding,
//! the in-memory measurement series, durable CSV logging, and the live
//! chart adapter.

pub mod config;
pub mod error;
pub mod frame;
pub mod series;
pub mod sink;
pub mod serial;
pub mod render;
pub mod collector;
