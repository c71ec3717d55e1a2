//! Topics: the routing key of the pipeline.
//!
//! A topic is a partially-specified `(name, dtype, source)` triple. Two
//! topics match when every field defined on both sides is equal; a field
//! left undefined on either side is a wildcard. The relation is reflexive
//! and symmetric but deliberately not transitive: `(name="a", int)` and
//! `(name="b", int)` both match the kind-only topic `(int)` without
//! matching each other.
//!
//! Structural rule: a topic may not carry a name without a dtype — a name
//! always refines a declared type.

use crate::error::{PipelineError, PipelineResult};
use crate::types::DataKind;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Routing key for frames and edge filters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Topic {
    /// Stream name within a dtype (e.g. `"random"`). Requires `dtype`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Payload kind of frames carrying this topic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dtype: Option<DataKind>,
    /// Restrict to frames emitted by one specific module.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Uuid>,
}

impl Topic {
    /// The fully-undefined topic. Matches everything.
    pub fn any() -> Self {
        Topic::default()
    }

    /// Build a topic from optional fields, enforcing the name-requires-dtype
    /// rule.
    pub fn new(
        name: Option<String>,
        dtype: Option<DataKind>,
        source: Option<Uuid>,
    ) -> PipelineResult<Self> {
        if let (Some(name), None) = (&name, &dtype) {
            return Err(PipelineError::InvalidTopic(format!(
                "name '{}' given without a dtype",
                name
            )));
        }
        Ok(Topic { name, dtype, source })
    }

    /// Topic specifying only a payload kind.
    pub fn of_kind(dtype: DataKind) -> Self {
        Topic {
            name: None,
            dtype: Some(dtype),
            source: None,
        }
    }

    /// Fully-named topic. Infallible because both name and dtype are given.
    pub fn named(name: impl Into<String>, dtype: DataKind) -> Self {
        Topic {
            name: Some(name.into()),
            dtype: Some(dtype),
            source: None,
        }
    }

    /// Topic restricted to one emitting module.
    pub fn from_source(source: Uuid) -> Self {
        Topic {
            name: None,
            dtype: None,
            source: Some(source),
        }
    }

    /// Add a source restriction to this topic.
    pub fn with_source(mut self, source: Uuid) -> Self {
        self.source = Some(source);
        self
    }

    /// Whether this is the any-topic (all fields undefined).
    pub fn is_any(&self) -> bool {
        self.name.is_none() && self.dtype.is_none() && self.source.is_none()
    }

    /// Wildcard match: each field must be undefined on either side or equal.
    pub fn matches(&self, other: &Topic) -> bool {
        fn field<T: PartialEq>(a: &Option<T>, b: &Option<T>) -> bool {
            match (a, b) {
                (Some(a), Some(b)) => a == b,
                _ => true,
            }
        }
        field(&self.name, &other.name)
            && field(&self.dtype, &other.dtype)
            && field(&self.source, &other.source)
    }

    /// Stable display key used by the profiling maps.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_any() {
            return write!(f, "*");
        }
        match (&self.name, &self.dtype) {
            (Some(name), Some(dtype)) => write!(f, "{}:{}", name, dtype)?,
            (None, Some(dtype)) => write!(f, "*:{}", dtype)?,
            _ => write!(f, "*")?,
        }
        if let Some(source) = &self.source {
            write!(f, "@{}", source)?;
        }
        Ok(())
    }
}
