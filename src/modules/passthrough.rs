//! Identity processor: forwards every frame unchanged.
//!
//! Useful as a fan-in/fan-out junction and as the minimal processor in
//! demos and tests. The forwarded frame is a fresh copy, so the shared
//! original stays untouched; the router re-stamps it with this processor's
//! uuid.

use crate::error::PipelineResult;
use crate::frame::{Frame, SharedFrame};
use crate::module::Processor;

#[derive(Debug, Default)]
pub struct PassthroughProcessor;

impl PassthroughProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl Processor for PassthroughProcessor {
    fn name(&self) -> &str {
        "Passthrough"
    }

    fn on_update(&mut self, frame: &SharedFrame) -> PipelineResult<Option<Frame>> {
        Ok(Some(frame.as_ref().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topic::Topic;
    use std::sync::Arc;

    #[test]
    fn test_forwards_unchanged() {
        let mut processor = PassthroughProcessor::new();
        let frame = Arc::new(Frame::new(Topic::any(), 5i64).with_timestamp(1.5));
        let out = processor.on_update(&frame).unwrap().unwrap();
        assert_eq!(out.timestamp, 1.5);
        assert_eq!(out.value.as_int(), Some(5));
    }
}
