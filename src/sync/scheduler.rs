//! Fixed-delay cycle loop and shutdown signalling

use crate::output::{CycleReport, ReportSink};
use crate::sync::Coordinator;
use crate::SyncError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info};

/// Runs sync cycles with a fixed delay between the end of one and the start
/// of the next
///
/// Cycles never overlap. A failed cycle is logged and the loop keeps going.
pub struct Scheduler {
    coordinator: Coordinator,
    sinks: Vec<Arc<dyn ReportSink>>,
    interval: Duration,
    run_on_start: bool,
}

impl Scheduler {
    pub fn new(coordinator: Coordinator, interval: Duration, run_on_start: bool) -> Self {
        Self {
            coordinator,
            sinks: Vec::new(),
            interval,
            run_on_start,
        }
    }

    /// Adds a sink that receives every cycle report
    pub fn with_sink(mut self, sink: Arc<dyn ReportSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Runs a single cycle and publishes its report
    pub async fn run_once(&self) -> Result<CycleReport, SyncError> {
        let report = self.coordinator.run_cycle().await?;
        for sink in &self.sinks {
            if let Err(e) = sink.publish(&report) {
                error!("Failed to publish cycle report: {}", e);
            }
        }
        Ok(report)
    }

    /// Loops until `shutdown` turns true
    ///
    /// A stop request is honoured between cycles; an in-flight cycle runs to
    /// completion.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "Scheduler started: {} sources, {}s between cycles",
            self.coordinator.sources().len(),
            self.interval.as_secs()
        );

        let mut first = true;
        loop {
            if *shutdown.borrow() {
                break;
            }

            if !(first && self.run_on_start) {
                tokio::select! {
                    _ = tokio::time::sleep(self.interval) => {}
                    changed = shutdown.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        continue;
                    }
                }
            }
            first = false;

            if let Err(e) = self.run_once().await {
                error!("Sync cycle failed: {}", e);
            }
        }

        info!("Scheduler stopped");
    }
}

/// Creates the stop channel shared by the scheduler and the signal listener
pub fn shutdown_channel() -> (watch::Sender<bool>, watch::Receiver<bool>) {
    watch::channel(false)
}

/// Waits for CTRL+C or SIGTERM, then requests a stop
pub async fn wait_for_signal(shutdown_tx: watch::Sender<bool>) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for CTRL+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received CTRL+C, stopping after the current cycle"),
        _ = terminate => info!("Received SIGTERM, stopping after the current cycle"),
    }

    if shutdown_tx.send(true).is_err() {
        error!("Scheduler already stopped");
    }
}
