//! Blocking wait for user interruption.

use async_trait::async_trait;
use tokio::signal;

/// Suspends the run until it should shut down.
#[async_trait]
pub trait Interrupt: Send + Sync {
    async fn wait(&self);
}

/// Waits for Ctrl-C (SIGINT), or SIGTERM on Unix.
#[derive(Debug, Clone, Default)]
pub struct CtrlC;

#[async_trait]
impl Interrupt for CtrlC {
    async fn wait(&self) {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal as unix_signal, SignalKind};

            match unix_signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = signal::ctrl_c() => {}
                        _ = sigterm.recv() => {}
                    }
                    return;
                }
                Err(e) => {
                    tracing::warn!("Failed to install SIGTERM handler: {}", e);
                }
            }
        }

        if let Err(e) = signal::ctrl_c().await {
            // Without a signal handler there is nothing to wait for.
            tracing::warn!("Failed to listen for Ctrl-C: {}", e);
        }
    }
}
