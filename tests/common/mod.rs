//! Common test utilities and helpers

#![allow(dead_code)] // Test utilities may not all be used in every test file

use sensorpipe::{
    DataKind, Frame, PipelineResult, SharedFrame, Sink, Source, SourceContext, SourceUpdate, Topic,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Assert two floats are approximately equal
pub fn assert_float_eq(a: f64, b: f64, epsilon: f64) {
    assert!(
        (a - b).abs() < epsilon,
        "Expected {} to be approximately equal to {} (epsilon: {})",
        a,
        b,
        epsilon
    );
}

/// Mean of consecutive differences of a series.
pub fn mean_diff(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let span = values[values.len() - 1] - values[0];
    span / (values.len() - 1) as f64
}

/// Source that emits `count` integer frames as fast as possible, then
/// finishes. Declares an int and a bool output topic but only ever emits
/// ints, so filtered edges can legally deliver nothing.
pub struct BurstSource {
    emitted: u64,
    count: u64,
}

impl BurstSource {
    pub fn new(count: u64) -> Self {
        Self { emitted: 0, count }
    }
}

impl Source for BurstSource {
    fn name(&self) -> &str {
        "BurstSource"
    }

    fn output_topics(&self) -> Vec<Topic> {
        vec![
            Topic::named("random", DataKind::Int),
            Topic::named("flag", DataKind::Bool),
        ]
    }

    fn on_update(&mut self, _ctx: &SourceContext) -> PipelineResult<SourceUpdate> {
        if self.emitted == self.count {
            return Ok(SourceUpdate::Finished);
        }
        self.emitted += 1;
        Ok(SourceUpdate::Emit(Frame::new(
            Topic::named("random", DataKind::Int),
            self.emitted as i64,
        )))
    }
}

/// Sink that sleeps on every frame, for backpressure/dropout scenarios.
pub struct SlowSink {
    delay: Duration,
    delivered: Arc<AtomicUsize>,
}

impl SlowSink {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            delivered: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn counter(&self) -> Arc<AtomicUsize> {
        self.delivered.clone()
    }
}

impl Sink for SlowSink {
    fn name(&self) -> &str {
        "SlowSink"
    }

    fn on_update(&mut self, _frame: &SharedFrame) -> PipelineResult<()> {
        std::thread::sleep(self.delay);
        self.delivered.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
