//! Process-wide cancellation broadcast to every worker and the display loop

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;

/// Token for cancelling workers and the display loop.
///
/// Clones share state: `cancel()` on any clone is observed by all of them,
/// both through [`ShutdownSignal::is_cancelled`] and by tasks parked in
/// [`ShutdownSignal::cancelled`].
#[derive(Clone)]
pub struct ShutdownSignal {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Creates a new, uncancelled signal
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            rx,
        }
    }

    /// Cancels every holder of this signal
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Checks if the signal has been cancelled
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Completes once [`ShutdownSignal::cancel`] has been called
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        // The sender lives in `self`, so `wait_for` cannot observe a closed channel
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShutdownSignal")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
