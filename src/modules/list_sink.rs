//! Collecting sink: appends received frames to a shared list.
//!
//! The sink itself moves into the pipeline; observers keep a cloned
//! [`ListHandle`] to inspect the collected frames during and after the run.

use crate::error::PipelineResult;
use crate::frame::SharedFrame;
use crate::module::Sink;
use parking_lot::Mutex;
use std::sync::Arc;

/// Shared view of the frames a [`ListSink`] has collected.
#[derive(Clone, Default)]
pub struct ListHandle {
    frames: Arc<Mutex<Vec<SharedFrame>>>,
}

impl ListHandle {
    /// Number of collected frames.
    pub fn len(&self) -> usize {
        self.frames.lock().len()
    }

    /// Whether nothing has been collected yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clone out the collected frames.
    pub fn frames(&self) -> Vec<SharedFrame> {
        self.frames.lock().clone()
    }

    /// Collected frame timestamps, in arrival order.
    pub fn timestamps(&self) -> Vec<f64> {
        self.frames.lock().iter().map(|f| f.timestamp).collect()
    }
}

/// Sink that appends every received frame to a shared list.
#[derive(Default)]
pub struct ListSink {
    frames: Arc<Mutex<Vec<SharedFrame>>>,
}

impl ListSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle for observing the collected frames from outside the pipeline.
    pub fn handle(&self) -> ListHandle {
        ListHandle {
            frames: self.frames.clone(),
        }
    }
}

impl Sink for ListSink {
    fn name(&self) -> &str {
        "ListSink"
    }

    fn on_update(&mut self, frame: &SharedFrame) -> PipelineResult<()> {
        self.frames.lock().push(frame.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Frame;
    use crate::topic::Topic;

    #[test]
    fn test_collects_frames_in_order() {
        let mut sink = ListSink::new();
        let handle = sink.handle();
        assert!(handle.is_empty());

        for k in 0..3 {
            let frame = Arc::new(Frame::new(Topic::any(), k as i64).with_timestamp(k as f64));
            sink.on_update(&frame).unwrap();
        }

        assert_eq!(handle.len(), 3);
        assert_eq!(handle.timestamps(), vec![0.0, 1.0, 2.0]);
        assert_eq!(handle.frames()[1].value.as_int(), Some(1));
    }
}
