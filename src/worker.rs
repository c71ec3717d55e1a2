//! Per-module worker threads.
//!
//! Every module runs on exactly one dedicated thread, so `on_start`,
//! `on_update` and `on_stop` of a single module never race each other.
//! Workers communicate only through ingress queues and the stop channel;
//! errors never cross threads as panics — they are logged, counted, and the
//! final verdict is recorded in the module's handle for `Pipeline::join()`.
//!
//! Shutdown paths:
//! - a source exits when its flag is cleared or its `on_update` reports
//!   exhaustion, then emits end-of-stream exactly once;
//! - a sink exits when every observed upstream has signalled EOS, or when
//!   its queue is unblocked externally;
//! - a processor behaves like a sink on its input side and like a source
//!   toward its downstream (its own EOS is re-emitted on exit).

use crate::config::ErrorPolicy;
use crate::error::PipelineError;
use crate::frame::Delivery;
use crate::module::{Processor, Sink, Source, SourceContext, SourceUpdate};
use crate::queue::IngressQueue;
use crate::router::Router;
use crate::stats::{Direction, ModuleStats};
use crossbeam_channel::{bounded, Sender};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use uuid::Uuid;

/// Final verdict of a worker, read by `Pipeline::join()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum WorkerStatus {
    Completed,
    Failed(String),
}

/// Runtime handle to a started module.
pub(crate) struct ModuleHandle {
    pub name: String,
    pub uuid: Uuid,
    active: Arc<AtomicBool>,
    stop_tx: Sender<()>,
    queue: Option<Arc<IngressQueue>>,
    stats: Arc<ModuleStats>,
    status: Arc<Mutex<Option<WorkerStatus>>>,
    thread: Option<JoinHandle<()>>,
}

impl ModuleHandle {
    /// Whether the module's worker is still supposed to run.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Request a stop without waiting. Idempotent and safe from any thread:
    /// clears the active flag, wakes a sleeping source, unblocks a blocked
    /// dequeue.
    pub fn request_stop(&self) {
        tracing::debug!(module = %self.name, uuid = %self.uuid, "stop requested");
        self.active.store(false, Ordering::SeqCst);
        let _ = self.stop_tx.try_send(());
        if let Some(queue) = &self.queue {
            queue.unblock();
        }
    }

    /// Wait for the worker thread to exit.
    pub fn join(&mut self) {
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                self.active.store(false, Ordering::SeqCst);
                let mut status = self.status.lock();
                *status = Some(WorkerStatus::Failed("worker thread panicked".into()));
            }
        }
    }

    /// Final verdict, available after the worker exited.
    pub fn status(&self) -> Option<WorkerStatus> {
        self.status.lock().clone()
    }

    /// Profiling store of this module.
    pub fn stats(&self) -> &Arc<ModuleStats> {
        &self.stats
    }

    /// Ingress queue (sinks and processors).
    pub fn queue(&self) -> Option<&Arc<IngressQueue>> {
        self.queue.as_ref()
    }
}

/// Shared pieces of every worker loop.
struct WorkerCore {
    name: String,
    policy: ErrorPolicy,
    stats: Arc<ModuleStats>,
    active: Arc<AtomicBool>,
    failure: Option<String>,
}

impl WorkerCore {
    /// Handle a failed `on_update`. Returns `false` when the worker must
    /// stop (fail-fast policy).
    fn handle_update_error(&mut self, err: PipelineError) -> bool {
        self.stats.record_error();
        match self.policy {
            ErrorPolicy::Resume => {
                tracing::error!(module = %self.name, error = %err, "on_update failed, skipping frame");
                true
            }
            ErrorPolicy::FailFast => {
                tracing::error!(module = %self.name, error = %err, "on_update failed, stopping module");
                self.failure = Some(err.to_string());
                false
            }
        }
    }

    fn finish(self, status: &Mutex<Option<WorkerStatus>>) {
        self.active.store(false, Ordering::SeqCst);
        let verdict = match self.failure {
            Some(message) => WorkerStatus::Failed(message),
            None => WorkerStatus::Completed,
        };
        *status.lock() = Some(verdict);
        tracing::info!(module = %self.name, "worker exiting");
    }
}

/// EOS bookkeeping for consuming modules.
struct EosAccounting {
    /// Upstream uuid -> still alive. Seeded from direct predecessors.
    observed: HashMap<Uuid, bool>,
}

impl EosAccounting {
    /// Mark `source` as drained. Returns `true` once every observed
    /// upstream has signalled EOS.
    fn mark(&mut self, source: Uuid) -> bool {
        if let Some(alive) = self.observed.get_mut(&source) {
            *alive = false;
        }
        self.observed.values().all(|alive| !alive)
    }
}

/// Spawn the worker of a source module.
pub(crate) fn spawn_source(
    name: String,
    uuid: Uuid,
    mut source: Box<dyn Source>,
    router: Arc<Router>,
    policy: ErrorPolicy,
    stats: Arc<ModuleStats>,
) -> ModuleHandle {
    let active = Arc::new(AtomicBool::new(true));
    let (stop_tx, stop_rx) = bounded(1);
    let status = Arc::new(Mutex::new(None));

    let mut core = WorkerCore {
        name: name.clone(),
        policy,
        stats: stats.clone(),
        active: active.clone(),
        failure: None,
    };
    let ctx = SourceContext::new(active.clone(), stop_rx);
    let worker_status = status.clone();

    let thread = std::thread::spawn(move || {
        tracing::info!(module = %core.name, "source worker started");
        while core.active.load(Ordering::SeqCst) {
            match source.on_update(&ctx) {
                Ok(SourceUpdate::Emit(frame)) => router.emit(frame),
                Ok(SourceUpdate::Idle) => {}
                Ok(SourceUpdate::Finished) => {
                    tracing::info!(module = %core.name, "source exhausted");
                    break;
                }
                Err(err) => {
                    if !core.handle_update_error(err) {
                        break;
                    }
                }
            }
        }
        core.active.store(false, Ordering::SeqCst);
        router.emit_eos();
        source.on_stop();
        core.finish(&worker_status);
    });

    ModuleHandle {
        name,
        uuid,
        active,
        stop_tx,
        queue: None,
        stats,
        status,
        thread: Some(thread),
    }
}

/// Spawn the worker of a sink module.
pub(crate) fn spawn_sink(
    name: String,
    uuid: Uuid,
    mut sink: Box<dyn Sink>,
    queue: Arc<IngressQueue>,
    observed_sources: HashMap<Uuid, bool>,
    policy: ErrorPolicy,
    stats: Arc<ModuleStats>,
) -> ModuleHandle {
    let active = Arc::new(AtomicBool::new(true));
    let (stop_tx, _stop_rx) = bounded(1);
    let status = Arc::new(Mutex::new(None));

    let mut core = WorkerCore {
        name: name.clone(),
        policy,
        stats: stats.clone(),
        active: active.clone(),
        failure: None,
    };
    let mut eos = EosAccounting {
        observed: observed_sources,
    };
    let worker_queue = queue.clone();
    let worker_status = status.clone();

    let thread = std::thread::spawn(move || {
        tracing::info!(module = %core.name, "sink worker started");
        while core.active.load(Ordering::SeqCst) {
            match worker_queue.pop() {
                None => break,
                Some(Delivery::Frame(frame)) => {
                    core.stats
                        .record_frame(Direction::In, &frame.topic, frame.timestamp);
                    if let Err(err) = sink.on_update(&frame) {
                        if !core.handle_update_error(err) {
                            break;
                        }
                    }
                }
                Some(Delivery::Eos { source }) => {
                    core.stats.record_eos();
                    if eos.mark(source) {
                        tracing::info!(module = %core.name, "all upstream sources drained");
                        break;
                    }
                }
            }
        }
        core.active.store(false, Ordering::SeqCst);
        sink.on_stop();
        core.finish(&worker_status);
    });

    ModuleHandle {
        name,
        uuid,
        active,
        stop_tx,
        queue: Some(queue),
        stats,
        status,
        thread: Some(thread),
    }
}

/// Spawn the worker of a processor module.
pub(crate) fn spawn_processor(
    name: String,
    uuid: Uuid,
    mut processor: Box<dyn Processor>,
    queue: Arc<IngressQueue>,
    observed_sources: HashMap<Uuid, bool>,
    router: Arc<Router>,
    policy: ErrorPolicy,
    stats: Arc<ModuleStats>,
) -> ModuleHandle {
    let active = Arc::new(AtomicBool::new(true));
    let (stop_tx, _stop_rx) = bounded(1);
    let status = Arc::new(Mutex::new(None));

    let mut core = WorkerCore {
        name: name.clone(),
        policy,
        stats: stats.clone(),
        active: active.clone(),
        failure: None,
    };
    let mut eos = EosAccounting {
        observed: observed_sources,
    };
    let worker_queue = queue.clone();
    let worker_status = status.clone();

    let thread = std::thread::spawn(move || {
        tracing::info!(module = %core.name, "processor worker started");
        while core.active.load(Ordering::SeqCst) {
            match worker_queue.pop() {
                None => break,
                Some(Delivery::Frame(frame)) => {
                    core.stats
                        .record_frame(Direction::In, &frame.topic, frame.timestamp);
                    match processor.on_update(&frame) {
                        Ok(Some(out)) => router.emit(out),
                        Ok(None) => {}
                        Err(err) => {
                            if !core.handle_update_error(err) {
                                break;
                            }
                        }
                    }
                }
                Some(Delivery::Eos { source }) => {
                    core.stats.record_eos();
                    if eos.mark(source) {
                        tracing::info!(module = %core.name, "all upstream sources drained");
                        break;
                    }
                }
            }
        }
        core.active.store(false, Ordering::SeqCst);
        // The processor is a source to its own downstream.
        router.emit_eos();
        processor.on_stop();
        core.finish(&worker_status);
    });

    ModuleHandle {
        name,
        uuid,
        active,
        stop_tx,
        queue: Some(queue),
        stats,
        status,
        thread: Some(thread),
    }
}
