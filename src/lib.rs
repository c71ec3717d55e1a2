//! # sensorpipe: multi-sensor dataflow pipelines
//!
//! A runtime for directed acyclic graphs of long-lived modules that
//! produce, transform and consume timestamped frames. Applications declare
//! modules (sources, processors, sinks), wire them with topic-filtered
//! edges, and the runtime schedules each module on its own worker thread,
//! delivers frames, propagates end-of-stream and tears the graph down
//! cleanly.
//!
//! ## Architecture
//!
//! - **Frames & topics**: immutable records routed by partially-specified
//!   `(name, dtype, source)` topics with wildcard matching
//! - **Workers**: one thread per module; communication only through
//!   per-sink ingress queues (with optional age-based dropout)
//! - **Control plane**: end-of-stream accounting per sink; stopping the
//!   sources drains the whole graph
//! - **Rate control**: absolute-deadline fixed-rate sources and
//!   speed-scaled replay of recorded streams
//!
//! ## Example
//!
//! ```no_run
//! use sensorpipe::modules::{random_source, ListSink, PassthroughProcessor};
//! use sensorpipe::Pipeline;
//!
//! fn main() -> sensorpipe::PipelineResult<()> {
//!     let mut pipeline = Pipeline::new();
//!
//!     let sink = ListSink::new();
//!     let frames = sink.handle();
//!
//!     let src = pipeline.add_source(random_source(60.0));
//!     let pass = pipeline.add_processor(PassthroughProcessor::new());
//!     let out = pipeline.add_sink(sink);
//!     pipeline.connect(src, pass)?;
//!     pipeline.connect(pass, out)?;
//!
//!     pipeline.start()?;
//!     std::thread::sleep(std::time::Duration::from_millis(500));
//!     pipeline.stop();
//!     pipeline.join()?;
//!
//!     println!("collected {} frames", frames.len());
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod frame;
pub mod id;
pub mod module;
pub mod modules;
pub mod pipeline;
pub mod queue;
pub mod stats;
pub mod topic;
pub mod types;

mod graph;
mod router;
mod worker;

// Re-export commonly used types
pub use codec::{FrameCodec, JsonLinesCodec, Record, RecordingMeta};
pub use config::{ErrorPolicy, ModuleConfig, PipelineConfig};
pub use error::{PipelineError, PipelineResult};
pub use frame::{now_timestamp, Delivery, Frame, SharedFrame};
pub use id::{EdgeId, NodeId};
pub use module::{Module, Processor, Role, Sink, Source, SourceContext, SourceUpdate};
pub use pipeline::{ModuleReport, Pipeline, PipelineState};
pub use queue::QueueStats;
pub use stats::{Direction, RateSnapshot, StatsSnapshot};
pub use topic::Topic;
pub use types::{DataKind, Value};
