//! Background workers for expiry cleanup and dirty-session flushing,
//! modeled on the teacher's worker-thread-per-concern layout.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;

use crate::context::manager::ContextManager;

pub async fn run_cleanup_sweeper(manager: Arc<ContextManager>, interval: Duration, shutdown: Arc<Notify>) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let removed = manager.sweep_expired().await;
                if removed > 0 {
                    tracing::debug!(removed, "cleanup sweeper evicted expired sessions");
                }
            }
            _ = shutdown.notified() => {
                tracing::info!("cleanup sweeper shutting down");
                return;
            }
        }
    }
}

pub async fn run_persistence_flusher(manager: Arc<ContextManager>, interval: Duration, shutdown: Arc<Notify>) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                manager.flush_dirty().await;
            }
            _ = shutdown.notified() => {
                tracing::info!("persistence flusher shutting down");
                return;
            }
        }
    }
}
