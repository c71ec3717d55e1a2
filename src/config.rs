//! Runtime configuration for pipelines and individual modules.
//!
//! Both types are serde-ready so applications can persist them alongside
//! their own settings; the crate itself never touches the filesystem for
//! configuration.

use serde::{Deserialize, Serialize};

/// How a worker reacts when a module's `on_update` hook fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ErrorPolicy {
    /// Log the failure, count it, skip the frame and keep running.
    #[default]
    Resume,
    /// Stop the module on the first failure (sources and processors emit
    /// end-of-stream before exiting).
    FailFast,
}

/// Per-module runtime options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleConfig {
    /// Age-based dropout threshold for this module's ingress queue, in
    /// seconds. `None` disables dropout (nothing is ever dropped).
    /// Meaningful for sinks and processors only.
    pub dropout: Option<f64>,
    /// Whether per-topic throughput estimators run for this module.
    pub profiling: bool,
    /// Reaction to `on_update` failures.
    pub error_policy: ErrorPolicy,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            dropout: None,
            profiling: true,
            error_policy: ErrorPolicy::default(),
        }
    }
}

impl ModuleConfig {
    /// Config with an age-based dropout threshold in seconds.
    pub fn with_dropout(seconds: f64) -> Self {
        Self {
            dropout: Some(seconds),
            ..Self::default()
        }
    }

    /// Set the error policy.
    pub fn error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    /// Enable or disable profiling.
    pub fn profiling(mut self, enabled: bool) -> Self {
        self.profiling = enabled;
        self
    }
}

/// Pipeline-wide defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Master switch for per-topic throughput estimators. A module profiles
    /// only when both this and its own `ModuleConfig::profiling` are set.
    pub profiling: bool,
    /// Window length (in inter-arrival gaps) of the moving-average rate
    /// estimators.
    pub stats_window: usize,
    /// Dropout applied to ingress queues whose `ModuleConfig` does not set
    /// its own threshold.
    pub default_dropout: Option<f64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            profiling: true,
            stats_window: 50,
            default_dropout: None,
        }
    }
}
