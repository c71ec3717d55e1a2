//! Sink ingress queue with optional age-based dropout.
//!
//! Each sink and processor owns exactly one `IngressQueue`: many producers
//! push, the module's worker pops. The queue is the only mutable structure
//! shared between modules, so the whole head-scan / dropout / enqueue
//! sequence runs under one lock and the head test stays atomic with the
//! pop.
//!
//! With a dropout threshold of `Δ` seconds, pushing a frame first sheds
//! queued frames older than `Δ` relative to the new frame's timestamp.
//! Control deliveries are never dropped. Without a threshold the queue is
//! unbounded: producers outrun consumers only at memory cost and never
//! block.

use crate::frame::Delivery;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters published by an ingress queue.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueueStats {
    /// Deliveries enqueued (including ones later dropped).
    pub pushed: u64,
    /// Deliveries handed to the consumer.
    pub popped: u64,
    /// Frames shed by the dropout policy.
    pub skipped: u64,
    /// Mean queue length observed at enqueue time.
    pub average_size: f64,
    /// Fraction of enqueued frames that were shed.
    pub frame_skip_rate: f64,
}

struct Inner {
    items: VecDeque<Delivery>,
    unblocked: bool,
    /// Running sum/count of queue length sampled at each push.
    size_sum: u64,
    size_samples: u64,
}

/// Bounded-in-spirit FIFO between a module's upstream producers and its
/// worker.
pub struct IngressQueue {
    inner: Mutex<Inner>,
    cond: Condvar,
    dropout: Option<f64>,
    pushed: AtomicU64,
    popped: AtomicU64,
    skipped: AtomicU64,
}

impl IngressQueue {
    /// Create a queue; `dropout` is the age threshold in seconds, or `None`
    /// for no shedding.
    pub fn new(dropout: Option<f64>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                items: VecDeque::new(),
                unblocked: false,
                size_sum: 0,
                size_samples: 0,
            }),
            cond: Condvar::new(),
            dropout,
            pushed: AtomicU64::new(0),
            popped: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
        }
    }

    /// Enqueue a delivery, applying the dropout policy first.
    pub fn push(&self, delivery: Delivery) {
        let mut inner = self.inner.lock();

        if let (Some(max_age), Some(frame_time)) = (self.dropout, delivery.timestamp()) {
            // Shed stale head frames; an EOS at the head stops the scan
            // because control messages must survive.
            loop {
                let stale = match inner.items.front() {
                    Some(Delivery::Frame(head)) => frame_time - head.timestamp > max_age,
                    _ => false,
                };
                if !stale {
                    break;
                }
                inner.items.pop_front();
                self.skipped.fetch_add(1, Ordering::Relaxed);
            }
        }

        inner.items.push_back(delivery);
        inner.size_sum += inner.items.len() as u64;
        inner.size_samples += 1;
        self.pushed.fetch_add(1, Ordering::Relaxed);
        drop(inner);
        self.cond.notify_one();
    }

    /// Block until a delivery is available. Returns `None` once the queue
    /// has been unblocked and drained.
    pub fn pop(&self) -> Option<Delivery> {
        let mut inner = self.inner.lock();
        loop {
            if let Some(delivery) = inner.items.pop_front() {
                self.popped.fetch_add(1, Ordering::Relaxed);
                return Some(delivery);
            }
            if inner.unblocked {
                return None;
            }
            self.cond.wait(&mut inner);
        }
    }

    /// Non-blocking pop; `None` when the queue is currently empty.
    pub fn try_pop(&self) -> Option<Delivery> {
        let mut inner = self.inner.lock();
        let delivery = inner.items.pop_front();
        if delivery.is_some() {
            self.popped.fetch_add(1, Ordering::Relaxed);
        }
        delivery
    }

    /// Wake a pending [`pop`](Self::pop) and make future pops on an empty
    /// queue return `None`. Idempotent and safe from any thread.
    pub fn unblock(&self) {
        let mut inner = self.inner.lock();
        inner.unblocked = true;
        drop(inner);
        self.cond.notify_all();
    }

    /// Current number of queued deliveries.
    pub fn len(&self) -> usize {
        self.inner.lock().items.len()
    }

    /// Whether the queue is currently empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the queue counters.
    pub fn stats(&self) -> QueueStats {
        let (size_sum, size_samples) = {
            let inner = self.inner.lock();
            (inner.size_sum, inner.size_samples)
        };
        let pushed = self.pushed.load(Ordering::Relaxed);
        let skipped = self.skipped.load(Ordering::Relaxed);
        QueueStats {
            pushed,
            popped: self.popped.load(Ordering::Relaxed),
            skipped,
            average_size: if size_samples == 0 {
                0.0
            } else {
                size_sum as f64 / size_samples as f64
            },
            frame_skip_rate: if pushed == 0 {
                0.0
            } else {
                skipped as f64 / pushed as f64
            },
        }
    }
}
