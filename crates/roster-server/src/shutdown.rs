//! Shutdown coordination.
//!
//! Both halves are built on `tokio::sync::watch`: [`ShutdownSignal`]
//! watches a flag, [`ConnectionTracker`] watches the number of open
//! connections. Waiters never miss an update because a watch receiver
//! always sees the latest value first.

use std::sync::Arc;

use tokio::sync::watch;

/// Fires once; every clone observes it.
///
/// ```rust
/// use roster_server::ShutdownSignal;
///
/// let shutdown = ShutdownSignal::new();
/// let observer = shutdown.clone();
///
/// shutdown.trigger();
/// assert!(observer.is_shutdown());
/// ```
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    flag: Arc<watch::Sender<bool>>,
}

impl ShutdownSignal {
    /// An untriggered signal.
    #[must_use]
    pub fn new() -> Self {
        let (flag, _) = watch::channel(false);
        Self {
            flag: Arc::new(flag),
        }
    }

    /// Fires the signal. Later calls do nothing.
    pub fn trigger(&self) {
        self.flag.send_if_modified(|fired| !std::mem::replace(fired, true));
    }

    /// Whether the signal has fired.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        *self.flag.borrow()
    }

    /// Resolves once the signal has fired.
    pub async fn recv(&self) {
        let mut fired = self.flag.subscribe();
        // Errors only when the sender is gone, and `self` holds it.
        let _ = fired.wait_for(|fired| *fired).await;
    }

    /// A signal fired by SIGTERM or SIGINT (Ctrl+C elsewhere).
    ///
    /// Spawns the listener, so it needs a running tokio runtime. If the
    /// handlers cannot be installed that is logged and only
    /// [`trigger`](Self::trigger) fires the signal.
    #[must_use]
    pub fn with_os_signals() -> Self {
        let signal = Self::new();
        let fire = signal.clone();
        tokio::spawn(async move {
            if let Err(error) = os_signal().await {
                tracing::error!(error = %error, "cannot listen for shutdown signals");
                return;
            }
            fire.trigger();
        });
        signal
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
async fn os_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut term = signal(SignalKind::terminate())?;
    let mut int = signal(SignalKind::interrupt())?;
    let name = tokio::select! {
        _ = term.recv() => "SIGTERM",
        _ = int.recv() => "SIGINT",
    };
    tracing::info!(signal = name, "shutdown requested");
    Ok(())
}

#[cfg(not(unix))]
async fn os_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await?;
    tracing::info!(signal = "ctrl-c", "shutdown requested");
    Ok(())
}

/// Number of open connections, for draining.
///
/// ```rust
/// use roster_server::ConnectionTracker;
///
/// let tracker = ConnectionTracker::new();
/// let token = tracker.acquire();
/// assert_eq!(tracker.active_connections(), 1);
///
/// drop(token);
/// assert_eq!(tracker.active_connections(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct ConnectionTracker {
    open: Arc<watch::Sender<usize>>,
}

impl ConnectionTracker {
    /// No open connections.
    #[must_use]
    pub fn new() -> Self {
        let (open, _) = watch::channel(0);
        Self {
            open: Arc::new(open),
        }
    }

    /// Counts a connection until the token drops.
    #[must_use]
    pub fn acquire(&self) -> ConnectionToken {
        self.open.send_modify(|open| *open += 1);
        ConnectionToken {
            open: Arc::clone(&self.open),
        }
    }

    /// Currently open connections.
    #[must_use]
    pub fn active_connections(&self) -> usize {
        *self.open.borrow()
    }

    /// Resolves when the count reaches zero.
    pub async fn wait_for_drain(&self) {
        let mut open = self.open.subscribe();
        let _ = open.wait_for(|open| *open == 0).await;
    }
}

impl Default for ConnectionTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Keeps one connection counted.
#[derive(Debug)]
pub struct ConnectionToken {
    open: Arc<watch::Sender<usize>>,
}

impl Drop for ConnectionToken {
    fn drop(&mut self) {
        self.open.send_modify(|open| *open = open.saturating_sub(1));
    }
}
