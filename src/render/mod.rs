//! # Render Adapter
//!
//! Seam between the collector loop and the display. The collector only
//! ever talks to a [`RenderSink`]; the live chart receives owned snapshots
//! over a channel, so the loop never blocks on the UI and the UI never
//! observes a half-built series.

pub mod chart;

use std::sync::mpsc::{self, Receiver, Sender};

use crate::frame::Sample;

/// Consumer of series snapshots, invoked once per non-terminating tick
/// and once more when the session ends.
pub trait RenderSink {
    /// Accept a consistent point-in-time copy of the series, oldest first.
    fn render(&mut self, snapshot: Vec<Sample>);
}

/// Sends snapshots to the chart thread.
///
/// Send failures are ignored: a closed window just means nobody is
/// watching anymore, and the session keeps logging regardless.
pub struct ChartSink {
    tx: Sender<Vec<Sample>>,
}

impl RenderSink for ChartSink {
    fn render(&mut self, snapshot: Vec<Sample>) {
        let _ = self.tx.send(snapshot);
    }
}

/// Discards every snapshot; used for headless sessions.
pub struct NullRender;

impl RenderSink for NullRender {
    fn render(&mut self, _snapshot: Vec<Sample>) {}
}

/// Channel pair connecting the collector to the chart: the sink half goes
/// to the collector, the receiver half to [`chart::ScopeApp`].
pub fn channel_render() -> (ChartSink, Receiver<Vec<Sample>>) {
    let (tx, rx) = mpsc::channel();
    (ChartSink { tx }, rx)
}
