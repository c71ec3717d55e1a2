//! Synthetic random-frame generators for demos, benchmarks and tests.

use crate::frame::Frame;
use crate::modules::fixed_rate::{FixedRateSource, FrameGenerator};
use crate::topic::Topic;
use crate::types::{DataKind, Value};

/// Emits random integers on the `random:int` topic.
pub struct RandomIntGenerator {
    topic: Topic,
    upper: i64,
}

impl RandomIntGenerator {
    /// Generate integers in `0..upper`.
    pub fn new(upper: i64) -> Self {
        Self {
            topic: Topic::named("random", DataKind::Int),
            upper: upper.max(1),
        }
    }
}

impl Default for RandomIntGenerator {
    fn default() -> Self {
        Self::new(100)
    }
}

impl FrameGenerator for RandomIntGenerator {
    fn name(&self) -> &str {
        "RandomSource"
    }

    fn output_topics(&self) -> Vec<Topic> {
        vec![self.topic.clone()]
    }

    fn generate(&mut self) -> Option<Frame> {
        Some(Frame::new(
            self.topic.clone(),
            Value::Int(fastrand::i64(0..self.upper)),
        ))
    }
}

/// Emits random float vectors on the `random:float[]` topic.
pub struct RandomArrayGenerator {
    topic: Topic,
    len: usize,
}

impl RandomArrayGenerator {
    /// Generate vectors of `len` uniform floats in `[0, 1)`.
    pub fn new(len: usize) -> Self {
        Self {
            topic: Topic::named("random", DataKind::FloatArray),
            len,
        }
    }
}

impl FrameGenerator for RandomArrayGenerator {
    fn name(&self) -> &str {
        "RandomArraySource"
    }

    fn output_topics(&self) -> Vec<Topic> {
        vec![self.topic.clone()]
    }

    fn generate(&mut self) -> Option<Frame> {
        let samples: Vec<f64> = (0..self.len).map(|_| fastrand::f64()).collect();
        Some(Frame::new(self.topic.clone(), Value::FloatArray(samples)))
    }
}

/// A fixed-rate source of random integers.
pub fn random_source(rate: f64) -> FixedRateSource<RandomIntGenerator> {
    FixedRateSource::new(RandomIntGenerator::default(), rate)
}

/// A fixed-rate source of random float vectors.
pub fn random_array_source(rate: f64, len: usize) -> FixedRateSource<RandomArrayGenerator> {
    FixedRateSource::new(RandomArrayGenerator::new(len), rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_generator_topic_and_range() {
        let mut generator = RandomIntGenerator::new(10);
        for _ in 0..100 {
            let frame = generator.generate().unwrap();
            assert_eq!(frame.topic, Topic::named("random", DataKind::Int));
            let value = frame.value.as_int().unwrap();
            assert!((0..10).contains(&value));
        }
    }

    #[test]
    fn test_array_generator_shape() {
        let mut generator = RandomArrayGenerator::new(16);
        let frame = generator.generate().unwrap();
        assert_eq!(frame.value.as_float_array().unwrap().len(), 16);
        assert_eq!(frame.topic.dtype, Some(DataKind::FloatArray));
    }

    #[test]
    fn test_generators_never_exhaust() {
        let mut generator = RandomIntGenerator::default();
        for _ in 0..1000 {
            assert!(generator.generate().is_some());
        }
    }
}
