//! One-way cancellation latch and the interrupt listener that raises it.

use std::future::Future;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;
use tracing::{info, warn};

/// Process-wide cancellation signal.
///
/// Cloning yields another handle to the same latch. Once raised it stays
/// raised. Workers poll [`is_raised`](Self::is_raised) between iterations;
/// long-lived tasks can await [`wait`](Self::wait) instead.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    raised: AtomicBool,
    notify: Notify,
}

impl ShutdownSignal {
    /// Creates a lowered signal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the signal. Returns `true` only for the call that raised it.
    pub fn raise(&self) -> bool {
        let first = !self.inner.raised.swap(true, Ordering::SeqCst);
        if first {
            self.inner.notify.notify_waiters();
        }
        first
    }

    /// Returns whether the signal has been raised.
    #[must_use]
    pub fn is_raised(&self) -> bool {
        self.inner.raised.load(Ordering::SeqCst)
    }

    /// Completes once the signal is raised.
    pub async fn wait(&self) {
        loop {
            // Register before checking so a concurrent raise is not missed.
            let notified = self.inner.notify.notified();
            if self.is_raised() {
                return;
            }
            notified.await;
        }
    }
}

/// Waits for Ctrl-C and raises `signal`.
pub async fn listen_for_interrupt(signal: ShutdownSignal) {
    raise_on(tokio::signal::ctrl_c(), signal).await;
}

/// Waits for `interrupt` to resolve and raises `signal` on success.
///
/// If the interrupt source itself fails (e.g. the handler cannot be
/// installed) the failure is logged and the signal is left lowered.
pub async fn raise_on<F>(interrupt: F, signal: ShutdownSignal)
where
    F: Future<Output = io::Result<()>>,
{
    match interrupt.await {
        Ok(()) => {
            info!("shutting down");
            signal.raise();
        }
        Err(e) => warn!(error = %e, "failed to listen for interrupt"),
    }
}
