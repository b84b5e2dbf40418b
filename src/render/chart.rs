//! # Live Chart
//!
//! eframe application that shows the session as a rolling multi-series
//! line chart: one series per telemetry field, sample sequence on the x
//! axis, y axis fixed to the configured span. Every frame redraws from the
//! newest full snapshot; the chart never patches the plot incrementally,
//! so it tolerates the collector outpacing the repaint rate.

use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::Duration;

use egui::Color32;
use egui_plot::{Legend, Line, Plot, PlotBounds, PlotPoints};

use crate::config::Config;
use crate::frame::Sample;

/// Repaint self-scheduling period while the collector is still feeding us.
const REPAINT_INTERVAL: Duration = Duration::from_millis(100);

/// Series labels, in draw order matching [`series_points`].
const SERIES_NAMES: [&str; 6] = ["setpoint", "actual rpm", "error", "Kp", "Ki", "Kd"];

/// Chart application state.
pub struct ScopeApp {
    /// Snapshot feed from the collector
    rx: Receiver<Vec<Sample>>,
    /// Newest snapshot received so far
    snapshot: Vec<Sample>,
    /// Set once the collector hangs up; the last snapshot stays on screen
    session_over: bool,
    /// Shown in the status strip
    log_path: String,
    y_min: f64,
    y_max: f64,
    min_window: u64,
}

impl ScopeApp {
    pub fn new(rx: Receiver<Vec<Sample>>, config: &Config) -> Self {
        Self {
            rx,
            snapshot: Vec::new(),
            session_over: false,
            log_path: config.log.path.clone(),
            y_min: config.render.y_min,
            y_max: config.render.y_max,
            min_window: config.render.min_window,
        }
    }

    /// Keep only the newest pending snapshot; a disconnected channel means
    /// the collector is done.
    fn drain_snapshots(&mut self) {
        loop {
            match self.rx.try_recv() {
                Ok(snapshot) => self.snapshot = snapshot,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.session_over = true;
                    break;
                }
            }
        }
    }

    fn render_plot(&self, ui: &mut egui::Ui) {
        let x_max = x_axis_max(&self.snapshot, self.min_window);

        Plot::new("pid_series")
            .legend(Legend::default())
            .x_axis_label("sample")
            .y_axis_label("value")
            .show(ui, |plot_ui| {
                plot_ui.set_plot_bounds(PlotBounds::from_min_max(
                    [0.0, self.y_min],
                    [x_max, self.y_max],
                ));
                plot_ui.set_auto_bounds(egui::Vec2b::new(false, false));

                for (name, points) in SERIES_NAMES.iter().zip(series_points(&self.snapshot)) {
                    plot_ui.line(Line::new(*name, PlotPoints::from(points)));
                }
            });
    }
}

impl eframe::App for ScopeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_snapshots();

        egui::TopBottomPanel::bottom("session_status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if self.session_over {
                    ui.colored_label(Color32::from_rgb(100, 255, 100), "session complete");
                } else {
                    ui.colored_label(Color32::from_rgb(255, 255, 100), "collecting");
                }
                ui.separator();
                ui.label(format!("{} samples", self.snapshot.len()));
                ui.separator();
                ui.label(format!("log: {}", self.log_path));
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.render_plot(ui);
        });

        if !self.session_over {
            ctx.request_repaint_after(REPAINT_INTERVAL);
        }
    }
}

/// Open the chart window and block until it is closed.
pub fn run_chart(rx: Receiver<Vec<Sample>>, config: &Config) -> eframe::Result<()> {
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1024.0, 640.0])
            .with_min_inner_size([640.0, 400.0])
            .with_title("PID Scope"),
        ..Default::default()
    };

    let app = ScopeApp::new(rx, config);
    eframe::run_native(
        "PID Scope",
        native_options,
        Box::new(move |_cc| Ok(Box::new(app))),
    )
}

/// Grow the x range with the newest sample, but never shrink it below the
/// configured minimum window, so early samples are not squeezed together.
fn x_axis_max(snapshot: &[Sample], min_window: u64) -> f64 {
    let last = snapshot.last().map_or(0, |s| s.sequence);
    min_window.max(last) as f64
}

/// Split a snapshot into per-field plot points, one vec per series in
/// [`SERIES_NAMES`] order.
fn series_points(snapshot: &[Sample]) -> [Vec<[f64; 2]>; 6] {
    let mut series: [Vec<[f64; 2]>; 6] =
        std::array::from_fn(|_| Vec::with_capacity(snapshot.len()));

    for sample in snapshot {
        let x = sample.sequence as f64;
        series[0].push([x, sample.setpoint as f64]);
        series[1].push([x, sample.actual as f64]);
        series[2].push([x, sample.error as f64]);
        series[3].push([x, sample.kp]);
        series[4].push([x, sample.ki]);
        series[5].push([x, sample.kd]);
    }

    series
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Reading;

    #[test]
    fn test_series_points_split_fields_by_sequence() {
        let snapshot = vec![
            Sample::from_reading(1, Reading::new(40, 38, 5.0, 1.0, 0.5)),
            Sample::from_reading(2, Reading::new(41, 40, 5.0, 1.0, 0.5)),
        ];

        let series = series_points(&snapshot);

        assert_eq!(series[0], vec![[1.0, 40.0], [2.0, 41.0]]); // setpoint
        assert_eq!(series[1], vec![[1.0, 38.0], [2.0, 40.0]]); // actual
        assert_eq!(series[2], vec![[1.0, 2.0], [2.0, 1.0]]); // error
        assert_eq!(series[3], vec![[1.0, 5.0], [2.0, 5.0]]); // Kp
        assert_eq!(series[5], vec![[1.0, 0.5], [2.0, 0.5]]); // Kd
    }

    #[test]
    fn test_series_points_empty_snapshot() {
        let series = series_points(&[]);
        assert!(series.iter().all(|s| s.is_empty()));
    }

    #[test]
    fn test_x_axis_holds_minimum_window_early_on() {
        let snapshot = vec![Sample::from_reading(3, Reading::new(40, 38, 5.0, 1.0, 0.5))];

        assert_eq!(x_axis_max(&[], 100), 100.0);
        assert_eq!(x_axis_max(&snapshot, 100), 100.0);
    }

    #[test]
    fn test_x_axis_follows_newest_sample_past_the_window() {
        let snapshot = vec![Sample::from_reading(250, Reading::new(40, 38, 5.0, 1.0, 0.5))];

        assert_eq!(x_axis_max(&snapshot, 100), 250.0);
    }
}
