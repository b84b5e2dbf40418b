//! # Collector Loop
//!
//! Session state machine driving the telemetry pipeline: on a fixed
//! scheduling tick it pulls one line from the transport, decodes it,
//! appends accepted samples to the series buffer and the CSV log, and
//! pushes a snapshot to the render sink. The tick runs on its own clock,
//! independent of the device's sample rate; ticks with nothing to read
//! simply expire.

use std::io;

use tokio::sync::watch;
use tokio::time::{interval, Duration};
use tracing::{debug, info, trace};

use crate::config::SessionConfig;
use crate::error::{PidScopeError, Result};
use crate::frame::{decode_line, DecodedLine, Sample};
use crate::render::RenderSink;
use crate::serial::line_reader::LineRead;
use crate::series::SeriesBuffer;
use crate::sink::CsvSink;

/// Lifecycle of one collection session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Constructed; the log header has not been written yet
    Idle,
    /// Ticking: reading, decoding, logging, rendering
    Running,
    /// Session over; a collector cannot be restarted
    Terminated,
}

/// Counters reported when a session ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionSummary {
    /// Accepted samples; equals the last assigned sequence number
    pub samples: u64,
    /// Lines carrying the frame marker that failed numeric decode
    pub rejected: u64,
    /// Non-telemetry device output forwarded to the diagnostic log
    pub passthrough: u64,
    /// Reads that expired with no data
    pub timeouts: u64,
}

/// What a finished tick asks the loop to do next.
enum TickFlow {
    Continue,
    CapReached,
}

/// Drives one collection session from `Idle` to `Terminated`.
pub struct Collector<T: LineRead, R: RenderSink> {
    options: SessionConfig,
    transport: T,
    sink: CsvSink,
    render: R,
    buffer: SeriesBuffer,
    state: SessionState,
    summary: SessionSummary,
}

impl<T: LineRead, R: RenderSink> Collector<T, R> {
    /// Build an idle collector. [`Collector::run`] writes the log header
    /// and starts ticking.
    pub fn new(options: &SessionConfig, transport: T, sink: CsvSink, render: R) -> Self {
        Self {
            options: options.clone(),
            transport,
            sink,
            render,
            buffer: SeriesBuffer::new(options.max_samples as usize),
            state: SessionState::Idle,
            summary: SessionSummary::default(),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Read-only view of the series collected so far.
    pub fn buffer(&self) -> &SeriesBuffer {
        &self.buffer
    }

    /// Drive the session to completion.
    ///
    /// Returns when the sample cap is reached, the shutdown flag flips,
    /// Ctrl+C arrives, or a fatal transport/log error occurs. The log is
    /// closed on every exit path before this returns, and one final
    /// snapshot is pushed so the display reflects the whole session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session already ran, if the log header or a
    /// row cannot be written, or if the transport fails mid-session.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) -> Result<SessionSummary> {
        if self.state != SessionState::Idle {
            return Err(PidScopeError::Io(io::Error::new(
                io::ErrorKind::Other,
                "collector session already ran",
            )));
        }

        if let Err(e) = self.sink.write_header() {
            self.state = SessionState::Terminated;
            let _ = self.sink.close();
            return Err(e);
        }

        self.state = SessionState::Running;
        info!("Session running: logging to {}", self.sink.path().display());

        let mut ticker = interval(Duration::from_millis(self.options.tick_interval_ms));

        let outcome = loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.tick().await {
                        Ok(TickFlow::Continue) => {}
                        Ok(TickFlow::CapReached) => {
                            info!(
                                "Sample cap of {} reached, ending session",
                                self.options.max_samples
                            );
                            break Ok(());
                        }
                        Err(e) => break Err(e),
                    }
                }

                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Shutdown requested, ending session");
                        break Ok(());
                    }
                }

                _ = tokio::signal::ctrl_c() => {
                    info!("Received Ctrl+C, ending session");
                    break Ok(());
                }
            }
        };

        self.state = SessionState::Terminated;
        let closed = self.sink.close();
        // One last snapshot so the chart shows the complete session; the
        // terminating tick itself never renders.
        self.render.render(self.buffer.snapshot());

        outcome?;
        closed?;
        Ok(self.summary)
    }

    /// One scheduling tick: read a line, decode it, dispatch the outcome,
    /// then refresh the display.
    async fn tick(&mut self) -> Result<TickFlow> {
        let line = self
            .transport
            .read_line()
            .await
            .map_err(|e| PidScopeError::Serial(format!("telemetry read failed: {}", e)))?;

        match decode_line(&line, self.options.gain_scale) {
            Ok(DecodedLine::Reading(reading)) => {
                self.summary.samples += 1;
                let sample = Sample::from_reading(self.summary.samples, reading);
                self.buffer.append(sample);
                self.sink.append(&sample)?;

                if self.summary.samples >= self.options.max_samples {
                    return Ok(TickFlow::CapReached);
                }
            }
            Ok(DecodedLine::Passthrough(bytes)) => {
                let text = String::from_utf8_lossy(&bytes);
                let text = text.trim();
                if text.is_empty() {
                    self.summary.timeouts += 1;
                    trace!("read expired with no data");
                } else {
                    self.summary.passthrough += 1;
                    info!(target: "device", "{}", text);
                }
            }
            Err(e) => {
                self.summary.rejected += 1;
                debug!("Skipping malformed frame: {}", e);
            }
        }

        self.render.render(self.buffer.snapshot());
        Ok(TickFlow::Continue)
    }
}
