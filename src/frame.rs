//! Frames: the primary data transfer unit of the pipeline.
//!
//! A frame is an immutable, timestamped, topic-tagged record. Frames are
//! built by sources and processors, stamped with the emitting module's uuid
//! by the router, and shared read-only downstream as [`SharedFrame`] handles
//! — fan-out to several sinks clones the `Arc`, never the payload.
//!
//! End-of-stream is not a frame. It travels through the same per-sink
//! queues as a distinguished [`Delivery`] message so that ordinary sink
//! code can never observe a control message.

use crate::topic::Topic;
use crate::types::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Attribute key used by event frames for their label.
pub const ATTR_LABEL: &str = "label";
/// Attribute key used by event frames for their duration in seconds.
pub const ATTR_DURATION: &str = "duration";

/// Wall-clock seconds since the Unix epoch.
pub fn now_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// A timestamped, topic-tagged record flowing through the graph.
///
/// Immutable once emitted: the router hands out shared handles, so a module
/// that wants to alter a received frame must build a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Wall-clock seconds since the Unix epoch, assigned at construction
    /// unless overridden.
    pub timestamp: f64,
    /// Routing key of this frame.
    pub topic: Topic,
    /// Uuid of the emitting module, stamped by the router on emit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Uuid>,
    /// Opaque payload.
    pub value: Value,
    /// Wall-clock emit time stamped by replay sources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playback_timestamp: Option<f64>,
    /// Additional open attributes (event labels, durations, ...).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, Value>,
}

impl Frame {
    /// Create a frame stamped with the current wall-clock time.
    pub fn new(topic: Topic, value: impl Into<Value>) -> Self {
        Self {
            timestamp: now_timestamp(),
            topic,
            source: None,
            value: value.into(),
            playback_timestamp: None,
            attrs: BTreeMap::new(),
        }
    }

    /// Override the construction timestamp.
    pub fn with_timestamp(mut self, timestamp: f64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Attach an open attribute.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Create an event frame: a frame extended with a label and a duration
    /// in seconds, stored as open attributes.
    pub fn event(
        topic: Topic,
        value: impl Into<Value>,
        label: impl Into<String>,
        duration: f64,
    ) -> Self {
        Self::new(topic, value)
            .with_attr(ATTR_LABEL, label.into())
            .with_attr(ATTR_DURATION, duration)
    }

    /// Event label, when this frame carries one.
    pub fn label(&self) -> Option<&str> {
        self.attrs.get(ATTR_LABEL).and_then(Value::as_text)
    }

    /// Event duration in seconds, when this frame carries one.
    pub fn duration(&self) -> Option<f64> {
        self.attrs.get(ATTR_DURATION).and_then(Value::as_float)
    }
}

/// Cheap shared handle to an emitted frame.
pub type SharedFrame = Arc<Frame>;

/// A message delivered into a sink's ingress queue.
///
/// Control flow shares the queue with data so per-edge FIFO ordering covers
/// both, but the two arms stay distinct types: sink `on_update` hooks only
/// ever receive the `Frame` arm.
#[derive(Debug, Clone)]
pub enum Delivery {
    /// An emitted data frame.
    Frame(SharedFrame),
    /// End-of-stream from the identified upstream module.
    Eos { source: Uuid },
}

impl Delivery {
    /// The frame timestamp for data deliveries.
    pub fn timestamp(&self) -> Option<f64> {
        match self {
            Delivery::Frame(frame) => Some(frame.timestamp),
            Delivery::Eos { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DataKind;

    #[test]
    fn test_frame_default_timestamp() {
        let before = now_timestamp();
        let frame = Frame::new(Topic::any(), 1i64);
        let after = now_timestamp();
        assert!(frame.timestamp >= before && frame.timestamp <= after);
        assert!(frame.source.is_none());
    }

    #[test]
    fn test_frame_with_timestamp() {
        let frame = Frame::new(Topic::any(), 1i64).with_timestamp(123.25);
        assert_eq!(frame.timestamp, 123.25);
    }

    #[test]
    fn test_event_frame() {
        let frame = Frame::event(
            Topic::named("gesture", DataKind::Text),
            "swipe",
            "swipe-left",
            0.4,
        );
        assert_eq!(frame.label(), Some("swipe-left"));
        assert_eq!(frame.duration(), Some(0.4));
    }

    #[test]
    fn test_frame_serde_preserves_fields() {
        let frame = Frame::new(Topic::named("random", DataKind::Int), 7i64)
            .with_timestamp(42.0625);
        let json = serde_json::to_string(&frame).unwrap();
        let back: Frame = serde_json::from_str(&json).unwrap();
        assert_eq!(back.timestamp, 42.0625);
        assert_eq!(back.topic, frame.topic);
        assert_eq!(back.value, frame.value);
    }

    #[test]
    fn test_delivery_timestamp() {
        let frame = Arc::new(Frame::new(Topic::any(), 0i64).with_timestamp(5.0));
        assert_eq!(Delivery::Frame(frame).timestamp(), Some(5.0));
        assert_eq!(
            Delivery::Eos {
                source: Uuid::new_v4()
            }
            .timestamp(),
            None
        );
    }
}
