//! Error handling for the pipeline runtime.
//!
//! All fallible operations in the crate return [`PipelineResult`]. Graph
//! construction errors ([`PipelineError::NoCompatibleTopic`],
//! [`PipelineError::InvalidTopic`], [`PipelineError::InvalidGraph`]) are
//! fatal preconditions raised from `connect()` or `check_pipeline()` and are
//! never retried. Worker-side failures never cross threads as panics; they
//! are recorded on the owning module and surfaced from `start()` (startup)
//! or `join()` (runtime).

use thiserror::Error;

/// Main error type for pipeline operations.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// No declared output topic of the upstream module matches the edge
    /// filter and the downstream module's declared inputs.
    #[error("no compatible topic from '{from}' to '{to}'")]
    NoCompatibleTopic { from: String, to: String },

    /// A topic violated a structural rule (e.g. a name without a dtype).
    #[error("invalid topic: {0}")]
    InvalidTopic(String),

    /// The graph failed validation (missing source/sink, cycle, orphan
    /// node, disconnected component, mutation of a running pipeline).
    #[error("invalid graph: {0}")]
    InvalidGraph(String),

    /// A module's `on_start` hook failed; the pipeline was torn down.
    #[error("module '{module}' failed to start: {message}")]
    ModuleStartup { module: String, message: String },

    /// A module's worker recorded a fatal runtime failure.
    #[error("module '{module}' failed at runtime: {message}")]
    ModuleRuntime { module: String, message: String },

    /// `start()` was called on a pipeline that has already run to
    /// completion. Pipelines are not restartable.
    #[error("pipeline already stopped")]
    AlreadyStopped,

    /// Errors raised by user module hooks.
    #[error("module error: {0}")]
    Module(String),

    /// Encoding/decoding failure in a frame codec.
    #[error("codec error: {0}")]
    Codec(String),

    /// IO errors (recording files, replay streams).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Create a module hook error from any displayable value.
    pub fn module(message: impl std::fmt::Display) -> Self {
        PipelineError::Module(message.to_string())
    }

    /// Create a codec error from any displayable value.
    pub fn codec(message: impl std::fmt::Display) -> Self {
        PipelineError::Codec(message.to_string())
    }
}

/// Result type alias for pipeline operations.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PipelineError::NoCompatibleTopic {
            from: "Camera".into(),
            to: "Encoder".into(),
        };
        assert_eq!(err.to_string(), "no compatible topic from 'Camera' to 'Encoder'");
    }

    #[test]
    fn test_module_error_helper() {
        let err = PipelineError::module("device unplugged");
        assert!(err.to_string().contains("device unplugged"));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: PipelineError = io.into();
        assert!(matches!(err, PipelineError::Io(_)));
    }
}
