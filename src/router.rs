//! Edge router: fan-out from one emitting module to its observers.
//!
//! Each source and processor gets a router built by `Pipeline::start()` and
//! frozen from then on. Emission stamps the frame with the owner's uuid,
//! wraps it in a shared handle and pushes that handle to every observer
//! whose filter matches the frame topic. A sink registered under several
//! matching filters receives the same shared instance once per filter.
//!
//! End-of-stream bypasses the filters entirely and is deduplicated so each
//! distinct downstream module observes exactly one EOS from this router,
//! no matter how many edges connect the two.

use crate::frame::{Delivery, Frame};
use crate::queue::IngressQueue;
use crate::stats::{Direction, ModuleStats};
use crate::topic::Topic;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// One downstream ingress queue reachable from a router.
#[derive(Clone)]
pub(crate) struct Endpoint {
    /// Uuid of the downstream module (EOS dedup key).
    pub module: Uuid,
    pub queue: Arc<IngressQueue>,
}

/// Frozen observer table of one emitting module.
pub(crate) struct Router {
    owner: Uuid,
    /// `(edge filter, endpoint)` pairs, one per outgoing edge.
    observers: Vec<(Topic, Endpoint)>,
    eos_sent: AtomicBool,
    stats: Arc<ModuleStats>,
}

impl Router {
    pub(crate) fn new(
        owner: Uuid,
        observers: Vec<(Topic, Endpoint)>,
        stats: Arc<ModuleStats>,
    ) -> Self {
        Self {
            owner,
            observers,
            eos_sent: AtomicBool::new(false),
            stats,
        }
    }

    /// Uuid stamped onto emitted frames.
    pub(crate) fn owner(&self) -> Uuid {
        self.owner
    }

    /// Stamp and fan a frame out to every matching observer.
    pub(crate) fn emit(&self, mut frame: Frame) {
        frame.source = Some(self.owner);
        self.stats
            .record_frame(Direction::Out, &frame.topic, frame.timestamp);
        let shared = Arc::new(frame);
        for (filter, endpoint) in &self.observers {
            if filter.matches(&shared.topic) {
                endpoint.queue.push(Delivery::Frame(shared.clone()));
            }
        }
    }

    /// Deliver end-of-stream to every distinct downstream module, once.
    /// Idempotent: repeated calls are no-ops.
    pub(crate) fn emit_eos(&self) {
        if self.eos_sent.swap(true, Ordering::SeqCst) {
            return;
        }
        let mut seen = HashSet::new();
        for (_, endpoint) in &self.observers {
            if seen.insert(endpoint.module) {
                endpoint.queue.push(Delivery::Eos { source: self.owner });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DataKind;

    fn router_with(observers: Vec<(Topic, Endpoint)>) -> Router {
        Router::new(
            Uuid::new_v4(),
            observers,
            Arc::new(ModuleStats::new(true, 8)),
        )
    }

    fn endpoint(queue: &Arc<IngressQueue>) -> Endpoint {
        Endpoint {
            module: Uuid::new_v4(),
            queue: queue.clone(),
        }
    }

    #[test]
    fn test_emit_stamps_owner() {
        let queue = Arc::new(IngressQueue::new(None));
        let router = router_with(vec![(Topic::any(), endpoint(&queue))]);
        router.emit(Frame::new(Topic::any(), 1i64));

        match queue.try_pop() {
            Some(Delivery::Frame(frame)) => assert_eq!(frame.source, Some(router.owner())),
            other => panic!("expected a frame delivery, got {:?}", other),
        }
    }

    #[test]
    fn test_emit_respects_filters() {
        let ints = Arc::new(IngressQueue::new(None));
        let bools = Arc::new(IngressQueue::new(None));
        let router = router_with(vec![
            (Topic::of_kind(DataKind::Int), endpoint(&ints)),
            (Topic::of_kind(DataKind::Bool), endpoint(&bools)),
        ]);

        router.emit(Frame::new(Topic::named("random", DataKind::Int), 3i64));
        assert_eq!(ints.len(), 1);
        assert!(bools.is_empty());
    }

    #[test]
    fn test_same_sink_under_two_filters_gets_frame_twice() {
        let queue = Arc::new(IngressQueue::new(None));
        let sink = Uuid::new_v4();
        let router = router_with(vec![
            (
                Topic::any(),
                Endpoint {
                    module: sink,
                    queue: queue.clone(),
                },
            ),
            (
                Topic::of_kind(DataKind::Int),
                Endpoint {
                    module: sink,
                    queue: queue.clone(),
                },
            ),
        ]);

        router.emit(Frame::new(Topic::named("random", DataKind::Int), 3i64));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_eos_bypasses_filters_and_dedups() {
        let queue = Arc::new(IngressQueue::new(None));
        let sink = Uuid::new_v4();
        let router = router_with(vec![
            (
                Topic::of_kind(DataKind::Bool),
                Endpoint {
                    module: sink,
                    queue: queue.clone(),
                },
            ),
            (
                Topic::of_kind(DataKind::Int),
                Endpoint {
                    module: sink,
                    queue: queue.clone(),
                },
            ),
        ]);

        router.emit_eos();
        // Bypasses the bool/int filters, but only one EOS for the one sink.
        assert_eq!(queue.len(), 1);
        assert!(matches!(queue.try_pop(), Some(Delivery::Eos { .. })));
    }

    #[test]
    fn test_eos_is_emitted_once() {
        let queue = Arc::new(IngressQueue::new(None));
        let router = router_with(vec![(Topic::any(), endpoint(&queue))]);
        router.emit_eos();
        router.emit_eos();
        assert_eq!(queue.len(), 1);
    }
}
