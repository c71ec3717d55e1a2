//! Built-in modules: rate-controlled synthetic sources, collection sinks,
//! record/replay and a passthrough processor.
//!
//! These cover what the engine itself ships; device adapters and signal
//! processing belong to applications and implement the same traits.

pub mod fixed_rate;
pub mod list_sink;
pub mod passthrough;
pub mod random;
pub mod recording;
pub mod replay;

pub use fixed_rate::{FixedRateSource, FrameGenerator};
pub use list_sink::{ListHandle, ListSink};
pub use passthrough::PassthroughProcessor;
pub use random::{random_array_source, random_source, RandomArrayGenerator, RandomIntGenerator};
pub use recording::RecordingSink;
pub use replay::ReplaySource;
