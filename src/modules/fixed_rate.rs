//! Fixed-rate source: emits generated frames on an absolute-deadline
//! schedule.
//!
//! The schedule is `t_0 = now, t_{k+1} = t_k + T` on the monotonic clock,
//! so sleep inaccuracies never accumulate as drift: a late wake shortens
//! the next sleep instead of shifting the whole timeline. When the worker
//! falls more than one period behind it stops sleeping and logs a lag
//! warning until it has caught up. A rate of `f64::INFINITY` disables
//! pacing entirely.

use crate::error::PipelineResult;
use crate::frame::Frame;
use crate::module::{Source, SourceContext, SourceUpdate};
use crate::topic::Topic;
use std::time::{Duration, Instant};

/// Supplies the frames a [`FixedRateSource`] emits.
pub trait FrameGenerator: Send {
    /// Class name reported by the wrapping source.
    fn name(&self) -> &str;

    /// Topics the generated frames may carry.
    fn output_topics(&self) -> Vec<Topic>;

    /// Produce the next frame; `None` means the generator is exhausted.
    fn generate(&mut self) -> Option<Frame>;
}

/// A source that drives a [`FrameGenerator`] at a fixed rate.
pub struct FixedRateSource<G: FrameGenerator> {
    generator: G,
    period: Option<Duration>,
    next_deadline: Option<Instant>,
    lagging: bool,
}

impl<G: FrameGenerator> FixedRateSource<G> {
    /// Wrap `generator`, emitting at `rate` frames per second.
    /// `f64::INFINITY` emits as fast as possible.
    pub fn new(generator: G, rate: f64) -> Self {
        assert!(rate > 0.0, "rate must be positive");
        let period = rate.is_finite().then(|| Duration::from_secs_f64(1.0 / rate));
        Self {
            generator,
            period,
            next_deadline: None,
            lagging: false,
        }
    }

    /// The wrapped generator.
    pub fn generator(&self) -> &G {
        &self.generator
    }
}

impl<G: FrameGenerator> Source for FixedRateSource<G> {
    fn name(&self) -> &str {
        self.generator.name()
    }

    fn output_topics(&self) -> Vec<Topic> {
        self.generator.output_topics()
    }

    fn on_update(&mut self, ctx: &SourceContext) -> PipelineResult<SourceUpdate> {
        if let Some(period) = self.period {
            let now = Instant::now();
            let deadline = self.next_deadline.unwrap_or(now);
            if now < deadline {
                self.lagging = false;
                if !ctx.sleep_until(deadline) {
                    return Ok(SourceUpdate::Idle);
                }
            } else if self.next_deadline.is_some() && !self.lagging {
                tracing::warn!(
                    module = %self.generator.name(),
                    lag_us = now.duration_since(deadline).as_micros() as u64,
                    "fixed-rate source fell behind its schedule"
                );
                self.lagging = true;
            }
            self.next_deadline = Some(deadline + period);
        }

        match self.generator.generate() {
            Some(frame) => Ok(SourceUpdate::Emit(frame)),
            None => Ok(SourceUpdate::Finished),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DataKind;
    use crossbeam_channel::bounded;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    struct Counter {
        remaining: u64,
    }

    impl FrameGenerator for Counter {
        fn name(&self) -> &str {
            "Counter"
        }
        fn output_topics(&self) -> Vec<Topic> {
            vec![Topic::named("count", DataKind::Int)]
        }
        fn generate(&mut self) -> Option<Frame> {
            if self.remaining == 0 {
                return None;
            }
            self.remaining -= 1;
            Some(Frame::new(Topic::named("count", DataKind::Int), 1i64))
        }
    }

    fn ctx() -> (SourceContext, crossbeam_channel::Sender<()>) {
        let (tx, rx) = bounded(1);
        (SourceContext::new(Arc::new(AtomicBool::new(true)), rx), tx)
    }

    #[test]
    fn test_emits_at_configured_rate() {
        let mut source = FixedRateSource::new(Counter { remaining: 100 }, 100.0);
        let (ctx, _stop) = ctx();

        let start = Instant::now();
        let mut emitted = 0;
        while start.elapsed() < Duration::from_millis(100) {
            match source.on_update(&ctx).unwrap() {
                SourceUpdate::Emit(_) => emitted += 1,
                SourceUpdate::Idle => {}
                SourceUpdate::Finished => break,
            }
        }
        // 100 ms at 100 Hz: ~10 frames plus the immediate first emission.
        assert!((8..=13).contains(&emitted), "emitted {}", emitted);
    }

    #[test]
    fn test_infinite_rate_never_sleeps() {
        let mut source = FixedRateSource::new(Counter { remaining: 1000 }, f64::INFINITY);
        let (ctx, _stop) = ctx();

        let start = Instant::now();
        for _ in 0..1000 {
            match source.on_update(&ctx).unwrap() {
                SourceUpdate::Emit(_) => {}
                other => panic!("unexpected {:?}", other),
            }
        }
        assert!(start.elapsed() < Duration::from_millis(500));
    }

    #[test]
    fn test_exhaustion_reports_finished() {
        let mut source = FixedRateSource::new(Counter { remaining: 2 }, f64::INFINITY);
        let (ctx, _stop) = ctx();
        assert!(matches!(source.on_update(&ctx).unwrap(), SourceUpdate::Emit(_)));
        assert!(matches!(source.on_update(&ctx).unwrap(), SourceUpdate::Emit(_)));
        assert!(matches!(
            source.on_update(&ctx).unwrap(),
            SourceUpdate::Finished
        ));
    }

    #[test]
    #[should_panic(expected = "rate must be positive")]
    fn test_rejects_nonpositive_rate() {
        let _ = FixedRateSource::new(Counter { remaining: 0 }, 0.0);
    }
}
