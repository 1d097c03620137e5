// Signal handling module
//
// Supported signals:
// - SIGTERM: Graceful shutdown
// - SIGINT:  Graceful shutdown (Ctrl+C)

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

use crate::logger;

/// Shutdown request shared between the signal task and the accept loop
#[derive(Default)]
pub struct ShutdownSignal {
    notify: Notify,
    requested: AtomicBool,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark shutdown as requested and wake the accept loop
    pub fn trigger(&self) {
        self.requested.store(true, Ordering::SeqCst);
        // notify_one keeps a permit if the loop is not currently waiting
        self.notify.notify_one();
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Resolves once `trigger` has been called
    pub async fn wait(&self) {
        if self.is_requested() {
            return;
        }
        self.notify.notified().await;
    }
}

/// Start signal handlers (Unix)
///
/// Registration happens before this returns, so a failure is reported to the caller.
#[cfg(unix)]
pub fn start_signal_handler(shutdown: Arc<ShutdownSignal>) -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    logger::log_info(&format!(
        "Signal handlers registered (SIGTERM, SIGINT), pid {}",
        std::process::id()
    ));

    tokio::spawn(async move {
        let name = tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        };
        logger::log_info(&format!("{name} received, initiating graceful shutdown"));
        shutdown.trigger();
    });

    Ok(())
}

/// Windows fallback - only handles Ctrl+C
#[cfg(not(unix))]
pub fn start_signal_handler(shutdown: Arc<ShutdownSignal>) -> std::io::Result<()> {
    tokio::spawn(async move {
        if let Ok(()) = tokio::signal::ctrl_c().await {
            logger::log_info("Ctrl+C received, initiating graceful shutdown");
            shutdown.trigger();
        }
    });
    Ok(())
}
