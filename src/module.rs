//! Module abstraction: the three flavors of pipeline node.
//!
//! Concrete modules implement exactly one of [`Source`], [`Sink`] or
//! [`Processor`]. The runtime owns the module for its whole life: it calls
//! `on_start` during pipeline startup, drives `on_update` from the module's
//! dedicated worker thread, and calls `on_stop` when the worker exits. The
//! three hooks of one module never run concurrently.
//!
//! Hook failures are reported as [`PipelineError`](crate::error::PipelineError)
//! values, never panics; what happens next is governed by the module's
//! [`ErrorPolicy`](crate::config::ErrorPolicy).

use crate::error::PipelineResult;
use crate::frame::{Frame, SharedFrame};
use crate::topic::Topic;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// The role a module plays in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Produces frames; in-degree 0, out-degree >= 1.
    Source,
    /// Consumes and re-emits frames; both degrees >= 1.
    Processor,
    /// Consumes frames; out-degree 0, in-degree >= 1.
    Sink,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Source => write!(f, "source"),
            Role::Processor => write!(f, "processor"),
            Role::Sink => write!(f, "sink"),
        }
    }
}

/// Outcome of one source update.
#[derive(Debug)]
pub enum SourceUpdate {
    /// Emit this frame to the source's observers.
    Emit(Frame),
    /// Nothing to emit right now; the worker loops again.
    Idle,
    /// The source is exhausted; the worker stops the module and emits
    /// end-of-stream.
    Finished,
}

/// Handle passed to [`Source::on_update`] for cooperative waiting.
///
/// The only sanctioned way for a source to suspend: sleeping through the
/// context wakes immediately when the module is stopped, so a pipeline
/// never waits out a rate timer during shutdown.
pub struct SourceContext {
    active: Arc<AtomicBool>,
    stop_rx: Receiver<()>,
}

impl SourceContext {
    pub(crate) fn new(active: Arc<AtomicBool>, stop_rx: Receiver<()>) -> Self {
        Self { active, stop_rx }
    }

    /// Whether the module is still supposed to run.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Sleep until `deadline` on the monotonic clock. Returns `true` when
    /// the deadline was reached, `false` when the sleep was interrupted by
    /// a stop request (or the module is already stopping).
    pub fn sleep_until(&self, deadline: Instant) -> bool {
        if !self.is_active() {
            return false;
        }
        match self.stop_rx.recv_deadline(deadline) {
            Err(RecvTimeoutError::Timeout) => true,
            // A stop token or a torn-down pipeline both mean "wake up now".
            Ok(()) | Err(RecvTimeoutError::Disconnected) => false,
        }
    }

    /// Relative-duration variant of [`sleep_until`](Self::sleep_until).
    pub fn sleep_for(&self, duration: Duration) -> bool {
        self.sleep_until(Instant::now() + duration)
    }
}

/// A frame producer. One worker thread drives `on_update` in a loop while
/// the module is active.
pub trait Source: Send {
    /// Class name of this module (stable across instances).
    fn name(&self) -> &str;

    /// Topics this source may emit. Defaults to the any-topic.
    fn output_topics(&self) -> Vec<Topic> {
        vec![Topic::any()]
    }

    /// Called once on the starting thread before the worker spawns.
    fn on_start(&mut self) -> PipelineResult<()> {
        Ok(())
    }

    /// Produce the next frame, wait, or declare exhaustion.
    fn on_update(&mut self, ctx: &SourceContext) -> PipelineResult<SourceUpdate>;

    /// Called once after the worker loop exits.
    fn on_stop(&mut self) {}
}

/// A frame consumer. The worker blocks on the module's ingress queue and
/// feeds dequeued frames to `on_update`; control messages are handled by
/// the worker and are never visible here.
pub trait Sink: Send {
    /// Class name of this module (stable across instances).
    fn name(&self) -> &str;

    /// Topics this sink accepts. Defaults to the any-topic.
    fn input_topics(&self) -> Vec<Topic> {
        vec![Topic::any()]
    }

    /// Called once on the starting thread before the worker spawns.
    fn on_start(&mut self) -> PipelineResult<()> {
        Ok(())
    }

    /// Consume one frame.
    fn on_update(&mut self, frame: &SharedFrame) -> PipelineResult<()>;

    /// Called once after the worker loop exits.
    fn on_stop(&mut self) {}
}

/// A consumer that may re-emit: a sink toward its upstream, a source toward
/// its downstream. Returned frames are routed onward stamped with the
/// processor's own uuid.
pub trait Processor: Send {
    /// Class name of this module (stable across instances).
    fn name(&self) -> &str;

    /// Topics this processor accepts. Defaults to the any-topic.
    fn input_topics(&self) -> Vec<Topic> {
        vec![Topic::any()]
    }

    /// Topics this processor may emit. Defaults to the any-topic.
    fn output_topics(&self) -> Vec<Topic> {
        vec![Topic::any()]
    }

    /// Called once on the starting thread before the worker spawns.
    fn on_start(&mut self) -> PipelineResult<()> {
        Ok(())
    }

    /// Consume one frame, optionally producing an outgoing one.
    fn on_update(&mut self, frame: &SharedFrame) -> PipelineResult<Option<Frame>>;

    /// Called once after the worker loop exits.
    fn on_stop(&mut self) {}
}

/// A module of any flavor, as stored in the graph before startup.
pub enum Module {
    Source(Box<dyn Source>),
    Processor(Box<dyn Processor>),
    Sink(Box<dyn Sink>),
}

impl Module {
    /// The role tag of this module.
    pub fn role(&self) -> Role {
        match self {
            Module::Source(_) => Role::Source,
            Module::Processor(_) => Role::Processor,
            Module::Sink(_) => Role::Sink,
        }
    }

    /// Class name of the wrapped module.
    pub fn name(&self) -> &str {
        match self {
            Module::Source(m) => m.name(),
            Module::Processor(m) => m.name(),
            Module::Sink(m) => m.name(),
        }
    }

    /// Declared input topics (empty for sources).
    pub fn input_topics(&self) -> Vec<Topic> {
        match self {
            Module::Source(_) => Vec::new(),
            Module::Processor(m) => m.input_topics(),
            Module::Sink(m) => m.input_topics(),
        }
    }

    /// Declared output topics (empty for sinks).
    pub fn output_topics(&self) -> Vec<Topic> {
        match self {
            Module::Source(m) => m.output_topics(),
            Module::Processor(m) => m.output_topics(),
            Module::Sink(_) => Vec::new(),
        }
    }
}

impl std::fmt::Debug for Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Module::{}({})", self.role(), self.name())
    }
}
