//! Simulation metrics.

use std::collections::VecDeque;

/// Simulation metrics.
#[derive(Debug, Clone)]
pub struct SimulationMetrics {
    /// Total transactions submitted.
    pub total_transactions: u64,
    /// Accepted transactions.
    pub accepted: u64,
    /// Transactions refused by the overdraft limit.
    pub rejected: u64,
    /// Transactions that failed for any other reason.
    pub failed: u64,
    /// Latency samples (us).
    latency_samples: VecDeque<u64>,
    /// Maximum samples to keep.
    max_samples: usize,
}

impl SimulationMetrics {
    /// Create new metrics.
    pub fn new() -> Self {
        Self {
            total_transactions: 0,
            accepted: 0,
            rejected: 0,
            failed: 0,
            latency_samples: VecDeque::with_capacity(10000),
            max_samples: 10000,
        }
    }

    /// Record an accepted transaction.
    pub fn record_accepted(&mut self, latency_us: u64) {
        self.total_transactions += 1;
        self.accepted += 1;
        self.push_sample(latency_us);
    }

    /// Record a transaction refused by the limit.
    pub fn record_rejected(&mut self, latency_us: u64) {
        self.total_transactions += 1;
        self.rejected += 1;
        self.push_sample(latency_us);
    }

    /// Record a failed transaction.
    pub fn record_failure(&mut self) {
        self.total_transactions += 1;
        self.failed += 1;
    }

    fn push_sample(&mut self, latency_us: u64) {
        if self.latency_samples.len() >= self.max_samples {
            self.latency_samples.pop_front();
        }
        self.latency_samples.push_back(latency_us);
    }

    /// Get average latency in us.
    pub fn average_latency_us(&self) -> u64 {
        if self.latency_samples.is_empty() {
            return 0;
        }

        let sum: u64 = self.latency_samples.iter().sum();
        sum / self.latency_samples.len() as u64
    }

    /// Get p50 latency.
    pub fn p50_latency_us(&self) -> u64 {
        self.percentile_latency(50)
    }

    /// Get p99 latency.
    pub fn p99_latency_us(&self) -> u64 {
        self.percentile_latency(99)
    }

    fn percentile_latency(&self, percentile: usize) -> u64 {
        if self.latency_samples.is_empty() {
            return 0;
        }

        let mut sorted: Vec<_> = self.latency_samples.iter().copied().collect();
        sorted.sort_unstable();

        let idx = (sorted.len() * percentile / 100).min(sorted.len() - 1);
        sorted[idx]
    }

    /// Share of submissions that were accepted.
    pub fn acceptance_rate(&self) -> f64 {
        if self.total_transactions == 0 {
            return 0.0;
        }

        self.accepted as f64 / self.total_transactions as f64
    }

    /// Get throughput (transactions per second).
    pub fn throughput(&self, duration_secs: f64) -> f64 {
        if duration_secs <= 0.0 {
            return 0.0;
        }

        self.total_transactions as f64 / duration_secs
    }
}

impl Default for SimulationMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics() {
        let mut metrics = SimulationMetrics::new();

        metrics.record_accepted(100);
        metrics.record_accepted(200);
        metrics.record_rejected(150);
        metrics.record_failure();

        assert_eq!(metrics.total_transactions, 4);
        assert_eq!(metrics.accepted, 2);
        assert_eq!(metrics.rejected, 1);
        assert_eq!(metrics.failed, 1);
        assert_eq!(metrics.average_latency_us(), 150);
        assert_eq!(metrics.p50_latency_us(), 150);
        assert_eq!(metrics.p99_latency_us(), 200);
        assert_eq!(metrics.acceptance_rate(), 0.5);
        assert_eq!(metrics.throughput(2.0), 2.0);
    }
}
