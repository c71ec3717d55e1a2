//! The pipeline: a typed DAG of modules and its execution engine.
//!
//! Applications declare modules, wire them with topic-filtered edges and
//! call [`Pipeline::start`]. The pipeline then owns everything: it builds
//! one ingress queue per consumer, one frozen router per emitter, and one
//! worker thread per module, started in reverse topological order (sinks
//! first, sources last) so no frame is ever emitted into a consumer that
//! is not yet ready.
//!
//! [`Pipeline::stop`] only signals the sources; end-of-stream then drains
//! the rest of the graph on its own. [`Pipeline::join`] waits for every
//! worker and reports the first recorded failure. A pipeline runs at most
//! once — after it has stopped it cannot be restarted.

use crate::config::{ModuleConfig, PipelineConfig};
use crate::error::{PipelineError, PipelineResult};
use crate::graph::{degrees, is_weakly_connected, topo_order, EdgeRec};
use crate::id::{EdgeId, NodeId};
use crate::module::{Module, Processor, Role, Sink, Source};
use crate::queue::IngressQueue;
use crate::router::{Endpoint, Router};
use crate::stats::{ModuleStats, StatsSnapshot};
use crate::topic::Topic;
use crate::worker::{self, ModuleHandle, WorkerStatus};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Lifecycle state of a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Graph under construction; nothing runs yet.
    Idle,
    /// Workers running.
    Active,
    /// All workers exited (or startup failed). Not restartable.
    Stopped,
}

/// One module's entry in the per-pipeline statistics report.
#[derive(Debug, Clone)]
pub struct ModuleReport {
    pub node: NodeId,
    pub name: String,
    pub uuid: Uuid,
    pub role: Role,
    pub active: bool,
    pub stats: StatsSnapshot,
}

/// A slot holding a module and, once started, its runtime handle.
struct NodeSlot {
    /// Taken by `start()` when the worker is spawned.
    module: Option<Module>,
    name: String,
    uuid: Uuid,
    role: Role,
    config: ModuleConfig,
    input_topics: Vec<Topic>,
    output_topics: Vec<Topic>,
    handle: Option<ModuleHandle>,
}

/// The module graph and its execution engine.
pub struct Pipeline {
    config: PipelineConfig,
    nodes: Vec<NodeSlot>,
    edges: Vec<EdgeRec>,
    state: PipelineState,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    pub fn new() -> Self {
        Self::with_config(PipelineConfig::default())
    }

    pub fn with_config(config: PipelineConfig) -> Self {
        Self {
            config,
            nodes: Vec::new(),
            edges: Vec::new(),
            state: PipelineState::Idle,
        }
    }

    // ── Graph building ──

    /// Add a source module with default options.
    pub fn add_source<S: Source + 'static>(&mut self, source: S) -> NodeId {
        self.add_module(Module::Source(Box::new(source)), ModuleConfig::default())
    }

    /// Add a source module with explicit options.
    pub fn add_source_with<S: Source + 'static>(&mut self, source: S, config: ModuleConfig) -> NodeId {
        self.add_module(Module::Source(Box::new(source)), config)
    }

    /// Add a processor module with default options.
    pub fn add_processor<P: Processor + 'static>(&mut self, processor: P) -> NodeId {
        self.add_module(Module::Processor(Box::new(processor)), ModuleConfig::default())
    }

    /// Add a processor module with explicit options.
    pub fn add_processor_with<P: Processor + 'static>(
        &mut self,
        processor: P,
        config: ModuleConfig,
    ) -> NodeId {
        self.add_module(Module::Processor(Box::new(processor)), config)
    }

    /// Add a sink module with default options.
    pub fn add_sink<S: Sink + 'static>(&mut self, sink: S) -> NodeId {
        self.add_module(Module::Sink(Box::new(sink)), ModuleConfig::default())
    }

    /// Add a sink module with explicit options.
    pub fn add_sink_with<S: Sink + 'static>(&mut self, sink: S, config: ModuleConfig) -> NodeId {
        self.add_module(Module::Sink(Box::new(sink)), config)
    }

    /// Add pre-boxed modules of any flavor, dispatching on role.
    pub fn add(&mut self, modules: impl IntoIterator<Item = Module>) -> Vec<NodeId> {
        modules
            .into_iter()
            .map(|module| self.add_module(module, ModuleConfig::default()))
            .collect()
    }

    fn add_module(&mut self, module: Module, config: ModuleConfig) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeSlot {
            name: module.name().to_string(),
            uuid: Uuid::new_v4(),
            role: module.role(),
            input_topics: module.input_topics(),
            output_topics: module.output_topics(),
            module: Some(module),
            config,
            handle: None,
        });
        id
    }

    /// Connect `from` to `to` over the unfiltered cross product of their
    /// declared topics.
    pub fn connect(&mut self, from: NodeId, to: NodeId) -> PipelineResult<EdgeId> {
        self.connect_with(from, to, None)
    }

    /// Connect `from` to `to`, delivering only frames matching `filter`.
    pub fn connect_filtered(
        &mut self,
        from: NodeId,
        to: NodeId,
        filter: Topic,
    ) -> PipelineResult<EdgeId> {
        self.connect_with(from, to, Some(filter))
    }

    fn connect_with(
        &mut self,
        from: NodeId,
        to: NodeId,
        filter: Option<Topic>,
    ) -> PipelineResult<EdgeId> {
        if self.state != PipelineState::Idle {
            return Err(PipelineError::InvalidGraph(
                "the graph is frozen once the pipeline has started".into(),
            ));
        }
        let (Some(from_slot), Some(to_slot)) =
            (self.nodes.get(from.index()), self.nodes.get(to.index()))
        else {
            return Err(PipelineError::InvalidGraph(format!(
                "connect: unknown node ({:?} -> {:?})",
                from, to
            )));
        };
        if from == to {
            return Err(PipelineError::InvalidGraph(format!(
                "cannot connect '{}' to itself",
                from_slot.name
            )));
        }
        if from_slot.role == Role::Sink {
            return Err(PipelineError::InvalidGraph(format!(
                "'{}' is a sink and cannot have outgoing edges",
                from_slot.name
            )));
        }
        if to_slot.role == Role::Source {
            return Err(PipelineError::InvalidGraph(format!(
                "'{}' is a source and cannot have incoming edges",
                to_slot.name
            )));
        }

        let compatible = match &filter {
            Some(topic) => {
                if topic.name.is_some() && topic.dtype.is_none() {
                    return Err(PipelineError::InvalidTopic(
                        "edge filter has a name without a dtype".into(),
                    ));
                }
                from_slot.output_topics.iter().any(|o| o.matches(topic))
                    && to_slot.input_topics.iter().any(|i| topic.matches(i))
            }
            None => from_slot
                .output_topics
                .iter()
                .any(|o| to_slot.input_topics.iter().any(|i| o.matches(i))),
        };
        if !compatible {
            return Err(PipelineError::NoCompatibleTopic {
                from: from_slot.name.clone(),
                to: to_slot.name.clone(),
            });
        }

        let id = EdgeId(self.edges.len() as u32);
        self.edges.push(EdgeRec {
            id,
            from,
            to,
            filter,
        });
        Ok(id)
    }

    // ── Validation ──

    /// Check the structural invariants of the graph. Fatal precondition:
    /// a violation means the graph cannot run.
    pub fn check_pipeline(&self) -> PipelineResult<()> {
        let has_source = self.nodes.iter().any(|slot| slot.role == Role::Source);
        let has_sink = self.nodes.iter().any(|slot| slot.role == Role::Sink);
        if !has_source || !has_sink {
            return Err(PipelineError::InvalidGraph(
                "a pipeline needs at least one source and one sink".into(),
            ));
        }

        if !is_weakly_connected(self.nodes.len(), &self.edges) {
            return Err(PipelineError::InvalidGraph(
                "the graph is not weakly connected: some modules are unreachable".into(),
            ));
        }

        for (slot, (in_degree, out_degree)) in self
            .nodes
            .iter()
            .zip(degrees(self.nodes.len(), &self.edges))
        {
            let ok = match slot.role {
                Role::Source => in_degree == 0 && out_degree >= 1,
                Role::Processor => in_degree >= 1 && out_degree >= 1,
                Role::Sink => in_degree >= 1 && out_degree == 0,
            };
            if !ok {
                return Err(PipelineError::InvalidGraph(format!(
                    "{} '{}' has in-degree {} and out-degree {}",
                    slot.role, slot.name, in_degree, out_degree
                )));
            }
        }

        if topo_order(self.nodes.len(), &self.edges).is_none() {
            return Err(PipelineError::InvalidGraph(
                "the graph contains a cycle".into(),
            ));
        }
        Ok(())
    }

    // ── Lifecycle ──

    /// Validate the graph, then bring every module up in reverse
    /// topological order and spawn its worker.
    pub fn start(&mut self) -> PipelineResult<()> {
        match self.state {
            PipelineState::Idle => {}
            PipelineState::Active => {
                return Err(PipelineError::InvalidGraph(
                    "pipeline is already running".into(),
                ))
            }
            PipelineState::Stopped => return Err(PipelineError::AlreadyStopped),
        }
        self.check_pipeline()?;
        let order = topo_order(self.nodes.len(), &self.edges)
            .ok_or_else(|| PipelineError::InvalidGraph("the graph contains a cycle".into()))?;

        let node_count = self.nodes.len();

        // Ingress queues for every consumer.
        let queues: Vec<Option<Arc<IngressQueue>>> = self
            .nodes
            .iter()
            .map(|slot| match slot.role {
                Role::Source => None,
                _ => {
                    let dropout = slot.config.dropout.or(self.config.default_dropout);
                    Some(Arc::new(IngressQueue::new(dropout)))
                }
            })
            .collect();

        // One stats store per module.
        let stats: Vec<Arc<ModuleStats>> = self
            .nodes
            .iter()
            .map(|slot| {
                Arc::new(ModuleStats::new(
                    self.config.profiling && slot.config.profiling,
                    self.config.stats_window,
                ))
            })
            .collect();

        // Observer tables, one entry per outgoing edge, then frozen into
        // routers for every emitting module.
        let mut observer_lists: Vec<Vec<(Topic, Endpoint)>> = vec![Vec::new(); node_count];
        for edge in &self.edges {
            if let Some(queue) = &queues[edge.to.index()] {
                observer_lists[edge.from.index()].push((
                    edge.filter.clone().unwrap_or_else(Topic::any),
                    Endpoint {
                        module: self.nodes[edge.to.index()].uuid,
                        queue: queue.clone(),
                    },
                ));
            }
        }
        let routers: Vec<Option<Arc<Router>>> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(idx, slot)| match slot.role {
                Role::Sink => None,
                _ => Some(Arc::new(Router::new(
                    slot.uuid,
                    std::mem::take(&mut observer_lists[idx]),
                    stats[idx].clone(),
                ))),
            })
            .collect();

        // EOS accounting seeds: direct predecessors of every consumer.
        let mut observed: Vec<HashMap<Uuid, bool>> = vec![HashMap::new(); node_count];
        for edge in &self.edges {
            observed[edge.to.index()].insert(self.nodes[edge.from.index()].uuid, true);
        }

        // Reverse topological startup: sinks come up before the modules
        // that feed them.
        for &idx in order.iter().rev() {
            let slot = &mut self.nodes[idx];
            let Some(mut module) = slot.module.take() else {
                return Err(PipelineError::InvalidGraph(format!(
                    "module '{}' is no longer available",
                    slot.name
                )));
            };

            let hook = match &mut module {
                Module::Source(m) => m.on_start(),
                Module::Processor(m) => m.on_start(),
                Module::Sink(m) => m.on_start(),
            };
            if let Err(err) = hook {
                let name = slot.name.clone();
                tracing::error!(module = %name, error = %err, "on_start failed");
                if let Some(router) = &routers[idx] {
                    router.emit_eos();
                }
                self.teardown_started();
                self.state = PipelineState::Stopped;
                return Err(PipelineError::ModuleStartup {
                    module: name,
                    message: err.to_string(),
                });
            }

            let name = slot.name.clone();
            let uuid = slot.uuid;
            let policy = slot.config.error_policy;
            let module_stats = stats[idx].clone();
            let handle = match module {
                Module::Source(source) => {
                    let router = Self::expect_router(&routers[idx], &name)?;
                    worker::spawn_source(name, uuid, source, router, policy, module_stats)
                }
                Module::Processor(processor) => {
                    let router = Self::expect_router(&routers[idx], &name)?;
                    let queue = Self::expect_queue(&queues[idx], &name)?;
                    worker::spawn_processor(
                        name,
                        uuid,
                        processor,
                        queue,
                        std::mem::take(&mut observed[idx]),
                        router,
                        policy,
                        module_stats,
                    )
                }
                Module::Sink(sink) => {
                    let queue = Self::expect_queue(&queues[idx], &name)?;
                    worker::spawn_sink(
                        name,
                        uuid,
                        sink,
                        queue,
                        std::mem::take(&mut observed[idx]),
                        policy,
                        module_stats,
                    )
                }
            };
            self.nodes[idx].handle = Some(handle);
        }

        self.state = PipelineState::Active;
        tracing::info!(modules = self.nodes.len(), edges = self.edges.len(), "pipeline started");
        Ok(())
    }

    fn expect_router(router: &Option<Arc<Router>>, name: &str) -> PipelineResult<Arc<Router>> {
        router.clone().ok_or_else(|| {
            PipelineError::InvalidGraph(format!("emitting module '{}' has no router", name))
        })
    }

    fn expect_queue(queue: &Option<Arc<IngressQueue>>, name: &str) -> PipelineResult<Arc<IngressQueue>> {
        queue.clone().ok_or_else(|| {
            PipelineError::InvalidGraph(format!("consuming module '{}' has no queue", name))
        })
    }

    fn teardown_started(&mut self) {
        for slot in &self.nodes {
            if let Some(handle) = &slot.handle {
                handle.request_stop();
            }
        }
        for slot in &mut self.nodes {
            if let Some(handle) = &mut slot.handle {
                handle.join();
            }
        }
    }

    /// Signal every source to stop. End-of-stream then drains the rest of
    /// the graph. Idempotent; a no-op after natural drain.
    pub fn stop(&mut self) {
        if self.state != PipelineState::Active {
            return;
        }
        tracing::info!("stopping pipeline");
        for slot in &self.nodes {
            if slot.role == Role::Source {
                if let Some(handle) = &slot.handle {
                    handle.request_stop();
                }
            }
        }
    }

    /// Request a stop of one specific module without waiting.
    pub fn stop_module(&self, id: NodeId) {
        if let Some(handle) = self.nodes.get(id.index()).and_then(|slot| slot.handle.as_ref()) {
            handle.request_stop();
        }
    }

    /// Wait for every worker to exit and surface the first recorded
    /// failure. After `join()` the pipeline is `Stopped` for good.
    pub fn join(&mut self) -> PipelineResult<()> {
        if self.state == PipelineState::Idle {
            return Ok(());
        }
        for slot in &mut self.nodes {
            if let Some(handle) = &mut slot.handle {
                handle.join();
            }
        }
        self.state = PipelineState::Stopped;

        for slot in &self.nodes {
            if let Some(handle) = &slot.handle {
                if let Some(WorkerStatus::Failed(message)) = handle.status() {
                    return Err(PipelineError::ModuleRuntime {
                        module: slot.name.clone(),
                        message,
                    });
                }
            }
        }
        Ok(())
    }

    // ── Introspection ──

    /// Current lifecycle state.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Number of modules in the graph.
    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    /// Names of the modules whose workers are still running.
    pub fn active_modules(&self) -> Vec<String> {
        self.nodes
            .iter()
            .filter(|slot| slot.handle.as_ref().is_some_and(ModuleHandle::is_active))
            .map(|slot| slot.name.clone())
            .collect()
    }

    /// Stable uuid of a module (available before start).
    pub fn node_uuid(&self, id: NodeId) -> Option<Uuid> {
        self.nodes.get(id.index()).map(|slot| slot.uuid)
    }

    /// Whether one module's worker is currently running.
    pub fn is_module_active(&self, id: NodeId) -> bool {
        self.nodes
            .get(id.index())
            .and_then(|slot| slot.handle.as_ref())
            .is_some_and(ModuleHandle::is_active)
    }

    /// Statistics snapshot of one module (after start).
    pub fn module_stats(&self, id: NodeId) -> Option<StatsSnapshot> {
        let slot = self.nodes.get(id.index())?;
        let handle = slot.handle.as_ref()?;
        let mut snapshot = handle.stats().snapshot();
        snapshot.queue = handle.queue().map(|queue| queue.stats());
        Some(snapshot)
    }

    /// Statistics report over all started modules.
    pub fn stats(&self) -> Vec<ModuleReport> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| {
                let handle = slot.handle.as_ref()?;
                let mut snapshot = handle.stats().snapshot();
                snapshot.queue = handle.queue().map(|queue| queue.stats());
                Some(ModuleReport {
                    node: NodeId(idx as u32),
                    name: slot.name.clone(),
                    uuid: slot.uuid,
                    role: slot.role,
                    active: handle.is_active(),
                    stats: snapshot,
                })
            })
            .collect()
    }
}
