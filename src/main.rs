//! # PID Scope
//!
//! Live telemetry collector for a serial PID control loop.
//!
//! The embedded motor controller prints a `DB`-framed debug record over
//! its UART on every control-loop pass. This binary reads that stream,
//! logs every accepted sample to CSV, and drives a live chart of the
//! setpoint, the measured speed, the error, and the gains.
//!
//! The windowing event loop has to own the main thread, so the collector
//! runs on a dedicated thread with its own tokio runtime and hands
//! snapshots to the chart over a channel. Closing the window, reaching the
//! sample cap, or Ctrl+C all end the session with the log flushed.

use std::sync::mpsc::{sync_channel, SyncSender};
use std::thread;

use anyhow::{anyhow, Result};
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pid_scope::collector::{Collector, SessionSummary};
use pid_scope::config::{CliArgs, Config};
use pid_scope::render::{self, chart, ChartSink, NullRender};
use pid_scope::serial::TelemetryPort;
use pid_scope::sink::CsvSink;

fn main() -> Result<()> {
    // Initialize logging; the guard must outlive main or buffered
    // lines are lost on exit.
    let (stdout_writer, _guard) = tracing_appender::non_blocking(std::io::stdout());
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(stdout_writer)
        .init();

    info!("PID Scope v{} starting...", env!("CARGO_PKG_VERSION"));

    let args = CliArgs::parse(std::env::args().skip(1))?;
    let config = Config::resolve(&args)?;

    if config.render.enabled {
        run_with_chart(config)
    } else {
        run_headless(config)
    }
}

/// Drive the collector on a background thread while the chart owns the
/// main thread.
fn run_with_chart(config: Config) -> Result<()> {
    let (render_sink, snapshot_rx) = render::channel_render();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    // The collector signals once the transport and log are open, so open
    // failures surface on the terminal instead of behind an empty window.
    let (ready_tx, ready_rx) = sync_channel::<()>(1);

    let collector_config = config.clone();
    let collector = thread::spawn(move || {
        collect_session(collector_config, render_sink, shutdown_rx, ready_tx)
    });

    if ready_rx.recv().is_err() {
        // Init failed before the session could start; the join carries
        // the reason.
        join_collector(collector)?;
        return Err(anyhow!("collector exited before the session started"));
    }

    let chart_result = chart::run_chart(snapshot_rx, &config);

    // Window closed (or refused to open): end the session if it is still
    // running, then report how it went.
    let _ = shutdown_tx.send(true);
    let summary = join_collector(collector)?;
    log_summary(&summary);

    chart_result.map_err(|e| anyhow!("chart window failed: {}", e))
}

/// Run the collector on the main thread with no chart; the sample cap or
/// Ctrl+C ends the session.
fn run_headless(config: Config) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let summary = runtime.block_on(async {
        let transport = TelemetryPort::open(&config.serial)?;
        let sink = CsvSink::create(&config.log.path)?;
        info!("Press Ctrl+C to stop");

        // Held so the shutdown arm stays quiet; Ctrl+C is the only early
        // exit in headless mode.
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut collector = Collector::new(&config.session, transport, sink, NullRender);
        collector.run(shutdown_rx).await
    })?;

    log_summary(&summary);
    Ok(())
}

/// Open the transport and log, then run the session to completion on a
/// dedicated runtime. `ready` fires once both resources are open.
fn collect_session(
    config: Config,
    render: ChartSink,
    shutdown: watch::Receiver<bool>,
    ready: SyncSender<()>,
) -> Result<SessionSummary> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        let transport = TelemetryPort::open(&config.serial)?;
        let sink = CsvSink::create(&config.log.path)?;
        let _ = ready.send(());

        let mut collector = Collector::new(&config.session, transport, sink, render);
        collector.run(shutdown).await.map_err(Into::into)
    })
}

fn join_collector(handle: thread::JoinHandle<Result<SessionSummary>>) -> Result<SessionSummary> {
    handle
        .join()
        .unwrap_or_else(|_| Err(anyhow!("collector thread panicked")))
}

fn log_summary(summary: &SessionSummary) {
    info!(
        "Session closed: {} samples accepted, {} frames rejected, {} pass-through lines, {} empty reads",
        summary.samples, summary.rejected, summary.passthrough, summary.timeouts
    );
}
