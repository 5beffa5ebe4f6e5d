//! Per-provider health tracking: a background ticker probes each
//! provider and flips a health flag on consecutive failures; an
//! exponential moving average tracks the live success rate.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// EMA smoothing factor for `success_rate`. Recent outcomes dominate
/// without a single blip flipping the average.
const SUCCESS_RATE_ALPHA: f64 = 0.2;

pub struct ProviderHealth {
    healthy: AtomicBool,
    consecutive_failures: AtomicU64,
    success_rate_bits: AtomicU64,
}

impl ProviderHealth {
    pub fn new() -> Self {
        Self {
            healthy: AtomicBool::new(true),
            consecutive_failures: AtomicU64::new(0),
            success_rate_bits: AtomicU64::new(1.0f64.to_bits()),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Relaxed)
    }

    pub fn success_rate(&self) -> f64 {
        f64::from_bits(self.success_rate_bits.load(Ordering::Relaxed))
    }

    /// `failure_threshold` is the number of consecutive failures
    /// before `is_healthy` flips to false; any success immediately
    /// flips it back to true.
    pub fn record(&self, success: bool, failure_threshold: u64) {
        self.update_success_rate(success);

        if success {
            self.consecutive_failures.store(0, Ordering::Relaxed);
            self.healthy.store(true, Ordering::Relaxed);
            return;
        }

        let failures = self.consecutive_failures.fetch_add(1, Ordering::Relaxed) + 1;
        if failures >= failure_threshold {
            self.healthy.store(false, Ordering::Relaxed);
        }
    }

    fn update_success_rate(&self, success: bool) {
        let observation = if success { 1.0 } else { 0.0 };
        loop {
            let current_bits = self.success_rate_bits.load(Ordering::Relaxed);
            let current = f64::from_bits(current_bits);
            let updated = current + SUCCESS_RATE_ALPHA * (observation - current);
            if self
                .success_rate_bits
                .compare_exchange(
                    current_bits,
                    updated.to_bits(),
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                )
                .is_ok()
            {
                return;
            }
        }
    }
}

impl Default for ProviderHealth {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs the health-check ticker for every registered provider until
/// `shutdown` is notified.
pub async fn run_health_ticker(
    providers: Vec<(String, Arc<dyn super::provider::Provider>, Arc<ProviderHealth>)>,
    interval: std::time::Duration,
    timeout: std::time::Duration,
    shutdown: Arc<tokio::sync::Notify>,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                for (name, provider, health) in &providers {
                    let outcome = tokio::time::timeout(timeout, provider.validate_connection()).await;
                    let success = matches!(outcome, Ok(Ok(())));
                    if !success {
                        tracing::debug!(provider = %name, "health probe failed");
                    }
                    health.record(success, 1);
                }
            }
            _ = shutdown.notified() => {
                tracing::info!("health ticker shutting down");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flips_unhealthy_after_threshold() {
        let health = ProviderHealth::new();
        health.record(false, 2);
        assert!(health.is_healthy());
        health.record(false, 2);
        assert!(!health.is_healthy());
    }

    #[test]
    fn success_immediately_restores_health() {
        let health = ProviderHealth::new();
        health.record(false, 1);
        assert!(!health.is_healthy());
        health.record(true, 1);
        assert!(health.is_healthy());
    }

    #[test]
    fn success_rate_moves_toward_observations() {
        let health = ProviderHealth::new();
        for _ in 0..20 {
            health.record(false, 1000);
        }
        assert!(health.success_rate() < 0.1);
    }
}
