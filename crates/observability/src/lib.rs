use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

static TRACING_INIT: OnceCell<()> = OnceCell::new();

#[derive(Debug, Default)]
pub struct AppMetrics {
    requests_total: AtomicU64,
    rule_replies_total: AtomicU64,
    generative_replies_total: AtomicU64,
    generative_fallback_total: AtomicU64,
    rejected_total: AtomicU64,
    total_latency_millis: AtomicU64,
    latency_samples: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub rule_replies_total: u64,
    pub generative_replies_total: u64,
    pub generative_fallback_total: u64,
    pub rejected_total: u64,
    pub avg_latency_millis: f64,
}

impl AppMetrics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_request(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_rule_reply(&self) {
        self.rule_replies_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_generative_reply(&self) {
        self.generative_replies_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Generative backend was tried but produced nothing usable.
    pub fn inc_generative_fallback(&self) {
        self.generative_fallback_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_rejected(&self) {
        self.rejected_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn observe_latency(&self, duration: Duration) {
        self.total_latency_millis
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
        self.latency_samples.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let latency = self.total_latency_millis.load(Ordering::Relaxed);
        let samples = self.latency_samples.load(Ordering::Relaxed);

        MetricsSnapshot {
            requests_total: self.requests_total.load(Ordering::Relaxed),
            rule_replies_total: self.rule_replies_total.load(Ordering::Relaxed),
            generative_replies_total: self.generative_replies_total.load(Ordering::Relaxed),
            generative_fallback_total: self.generative_fallback_total.load(Ordering::Relaxed),
            rejected_total: self.rejected_total.load(Ordering::Relaxed),
            avg_latency_millis: if samples == 0 {
                0.0
            } else {
                latency as f64 / samples as f64
            },
        }
    }
}

pub fn init_tracing(service_name: &str) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}=info,footprint_api=info,footprint_agents=info,footprint_generative=info",
                service_name
            ))
        });

        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .with_span_list(true)
            .init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_averages_latency_over_samples() {
        let metrics = AppMetrics::default();
        assert_eq!(metrics.snapshot().avg_latency_millis, 0.0);

        metrics.inc_request();
        metrics.inc_request();
        metrics.inc_rule_reply();
        metrics.inc_generative_fallback();
        metrics.observe_latency(Duration::from_millis(30));
        metrics.observe_latency(Duration::from_millis(10));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.requests_total, 2);
        assert_eq!(snapshot.rule_replies_total, 1);
        assert_eq!(snapshot.generative_fallback_total, 1);
        assert_eq!(snapshot.avg_latency_millis, 20.0);
    }

    #[test]
    fn average_ignores_requests_without_a_latency_sample() {
        let metrics = AppMetrics::default();
        metrics.inc_request();
        metrics.inc_request();
        metrics.inc_request();
        metrics.observe_latency(Duration::from_millis(30));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.requests_total, 3);
        assert_eq!(snapshot.avg_latency_millis, 30.0);
    }
}
