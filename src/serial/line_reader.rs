//! Trait abstraction for the telemetry line source to enable testing

use async_trait::async_trait;
use std::io;

/// One-line-at-a-time byte source with a bounded read timeout.
///
/// Implementations return an empty vec when the timeout expires and an
/// error when the underlying source is gone for good.
#[async_trait]
pub trait LineRead: Send {
    /// Read one newline-delimited line, terminator included when present.
    async fn read_line(&mut self) -> io::Result<Vec<u8>>;
}
