//! Samples the context manager's held memory on an interval and fires
//! warn/critical callbacks as usage approaches `max_memory_mb`.

use std::sync::Arc;
use std::time::Duration;

use sysinfo::{Pid, System};
use tokio::sync::Notify;

use crate::context::manager::ContextManager;

pub struct MemoryMonitor {
    interval: Duration,
    warn_threshold: f64,
    critical_threshold: f64,
    max_memory_mb: usize,
}

impl MemoryMonitor {
    pub fn new(interval: Duration, warn_threshold: f64, critical_threshold: f64, max_memory_mb: usize) -> Self {
        Self { interval, warn_threshold, critical_threshold, max_memory_mb }
    }

    /// Runs until `shutdown` is notified. On crossing the critical
    /// threshold it forces a cleanup sweep and logs a compaction
    /// request; crossing the warn threshold only logs.
    pub async fn run(self, manager: Arc<ContextManager>, shutdown: Arc<Notify>) {
        let mut sys = System::new_all();
        let pid = Pid::from_u32(std::process::id());
        let mut ticker = tokio::time::interval(self.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    sys.refresh_process(pid);
                    let used_mb = sys
                        .process(pid)
                        .map(|p| p.memory() / 1024 / 1024)
                        .unwrap_or(0) as f64;
                    let ratio = if self.max_memory_mb == 0 { 0.0 } else { used_mb / self.max_memory_mb as f64 };

                    if ratio >= self.critical_threshold {
                        tracing::error!(used_mb, ratio, "memory usage above critical threshold, forcing sweep");
                        manager.force_sweep().await;
                    } else if ratio >= self.warn_threshold {
                        tracing::warn!(used_mb, ratio, "memory usage above warn threshold");
                    }
                }
                _ = shutdown.notified() => {
                    tracing::info!("memory monitor shutting down");
                    return;
                }
            }
        }
    }
}
