//! Per-module profiling: throughput estimators and worker counters.
//!
//! Every inbound/outbound frame updates a [`RateEstimator`] keyed by
//! `(direction, topic)`. Updates are O(1) and happen only on the owning
//! worker thread; other threads read consistent [`StatsSnapshot`]s. When
//! profiling is disabled for a module the per-topic estimators are skipped
//! entirely and only the plain atomic counters remain.

use crate::queue::QueueStats;
use crate::topic::Topic;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};

/// Direction of a frame relative to the profiled module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Frames consumed by the module.
    In,
    /// Frames emitted by the module.
    Out,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::In => write!(f, "in"),
            Direction::Out => write!(f, "out"),
        }
    }
}

/// Robust sample-rate estimator: cumulative rate since the first sample
/// plus a windowed moving average over recent inter-arrival gaps.
#[derive(Debug, Clone)]
pub struct RateEstimator {
    count: u64,
    first: Option<f64>,
    last: Option<f64>,
    gaps: VecDeque<f64>,
    gap_sum: f64,
    window: usize,
}

impl RateEstimator {
    /// Create an estimator with the given moving-average window length.
    pub fn new(window: usize) -> Self {
        Self {
            count: 0,
            first: None,
            last: None,
            gaps: VecDeque::with_capacity(window),
            gap_sum: 0.0,
            window: window.max(1),
        }
    }

    /// Record a sample observed at timestamp `t` (seconds).
    #[inline]
    pub fn push(&mut self, t: f64) {
        if let Some(last) = self.last {
            let gap = t - last;
            if gap >= 0.0 {
                if self.gaps.len() == self.window {
                    if let Some(old) = self.gaps.pop_front() {
                        self.gap_sum -= old;
                    }
                }
                self.gaps.push_back(gap);
                self.gap_sum += gap;
            }
        } else {
            self.first = Some(t);
        }
        self.last = Some(t);
        self.count += 1;
    }

    /// Number of samples recorded.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Samples per second over the whole observation span.
    pub fn cumulative_rate(&self) -> f64 {
        match (self.first, self.last) {
            (Some(first), Some(last)) if last > first && self.count > 1 => {
                (self.count - 1) as f64 / (last - first)
            }
            _ => 0.0,
        }
    }

    /// Samples per second over the moving window.
    pub fn moving_rate(&self) -> f64 {
        if self.gaps.is_empty() || self.gap_sum <= 0.0 {
            return 0.0;
        }
        self.gaps.len() as f64 / self.gap_sum
    }
}

/// Read-only view of one estimator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateSnapshot {
    pub count: u64,
    pub cumulative_rate: f64,
    pub moving_rate: f64,
}

/// Read-only view of one module's statistics.
#[derive(Debug, Clone, Default)]
pub struct StatsSnapshot {
    /// Throughput per `(direction, topic key)`. Empty when profiling is
    /// disabled for the module.
    pub rates: HashMap<(Direction, String), RateSnapshot>,
    /// `on_update` failures recorded by the worker.
    pub update_errors: u64,
    /// End-of-stream messages received from upstream modules.
    pub eos_received: u64,
    /// Ingress queue counters (sinks and processors only).
    pub queue: Option<QueueStats>,
}

impl StatsSnapshot {
    /// Rate snapshot for one direction/topic key, if recorded.
    pub fn rate(&self, direction: Direction, topic_key: &str) -> Option<&RateSnapshot> {
        self.rates.get(&(direction, topic_key.to_string()))
    }
}

/// Statistics store owned by one module's worker.
pub struct ModuleStats {
    enabled: bool,
    window: usize,
    rates: Mutex<HashMap<(Direction, String), RateEstimator>>,
    update_errors: AtomicU64,
    eos_received: AtomicU64,
}

impl ModuleStats {
    /// Create a store; `enabled` gates the per-topic estimators.
    pub fn new(enabled: bool, window: usize) -> Self {
        Self {
            enabled,
            window,
            rates: Mutex::new(HashMap::new()),
            update_errors: AtomicU64::new(0),
            eos_received: AtomicU64::new(0),
        }
    }

    /// Record one frame flowing through the module.
    #[inline]
    pub fn record_frame(&self, direction: Direction, topic: &Topic, timestamp: f64) {
        if !self.enabled {
            return;
        }
        let mut rates = self.rates.lock();
        rates
            .entry((direction, topic.key()))
            .or_insert_with(|| RateEstimator::new(self.window))
            .push(timestamp);
    }

    /// Record a failed `on_update`.
    #[inline]
    pub fn record_error(&self) {
        self.update_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a received end-of-stream message.
    #[inline]
    pub fn record_eos(&self) {
        self.eos_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Consistent snapshot for observers on other threads.
    pub fn snapshot(&self) -> StatsSnapshot {
        let rates = self
            .rates
            .lock()
            .iter()
            .map(|(key, est)| {
                (
                    key.clone(),
                    RateSnapshot {
                        count: est.count(),
                        cumulative_rate: est.cumulative_rate(),
                        moving_rate: est.moving_rate(),
                    },
                )
            })
            .collect();
        StatsSnapshot {
            rates,
            update_errors: self.update_errors.load(Ordering::Relaxed),
            eos_received: self.eos_received.load(Ordering::Relaxed),
            queue: None,
        }
    }
}
