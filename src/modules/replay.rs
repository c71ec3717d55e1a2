//! Replay source: re-emits a recorded frame stream at a playback speed.
//!
//! With speed `s`, the recorded inter-frame interval `Δ` is reproduced as
//! `Δ / s`, measured against the actual previous emit time so decode cost
//! does not stretch the timeline. `f64::INFINITY` replays as fast as
//! possible. Every emitted frame keeps its recorded timestamp and gains a
//! `playback_timestamp` stamped at emit time; exhaustion of the recording
//! stops the module and propagates end-of-stream.

use crate::codec::{FrameCodec, JsonLinesCodec, Record};
use crate::error::PipelineResult;
use crate::frame::now_timestamp;
use crate::module::{Source, SourceContext, SourceUpdate};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::{Duration, Instant};

/// Source that replays a recorded stream.
pub struct ReplaySource {
    reader: Box<dyn BufRead + Send>,
    codec: Box<dyn FrameCodec>,
    speed: f64,
    last_recorded: Option<f64>,
    last_emit: Option<Instant>,
}

impl ReplaySource {
    /// Replay a file recorded with the bundled JSON Lines codec.
    pub fn open(path: impl AsRef<Path>, speed: f64) -> PipelineResult<Self> {
        let file = File::open(path)?;
        Ok(Self::from_reader(
            Box::new(BufReader::new(file)),
            Box::new(JsonLinesCodec::new()),
            speed,
        ))
    }

    /// Replay a file with an explicit codec.
    pub fn open_with(
        path: impl AsRef<Path>,
        codec: Box<dyn FrameCodec>,
        speed: f64,
    ) -> PipelineResult<Self> {
        let file = File::open(path)?;
        Ok(Self::from_reader(Box::new(BufReader::new(file)), codec, speed))
    }

    /// Replay from any buffered reader (in-memory buffers in tests).
    pub fn from_reader(
        reader: Box<dyn BufRead + Send>,
        codec: Box<dyn FrameCodec>,
        speed: f64,
    ) -> Self {
        assert!(speed > 0.0, "playback speed must be positive");
        Self {
            reader,
            codec,
            speed,
            last_recorded: None,
            last_emit: None,
        }
    }

    /// Playback speed multiplier.
    pub fn speed(&self) -> f64 {
        self.speed
    }
}

impl Source for ReplaySource {
    fn name(&self) -> &str {
        "ReplaySource"
    }

    fn on_update(&mut self, ctx: &SourceContext) -> PipelineResult<SourceUpdate> {
        loop {
            let frame = match self.codec.decode(self.reader.as_mut())? {
                None => return Ok(SourceUpdate::Finished),
                Some(Record::Meta(_)) => continue,
                Some(Record::Frame(frame)) => frame,
            };

            if self.speed.is_finite() {
                if let (Some(last_recorded), Some(last_emit)) = (self.last_recorded, self.last_emit)
                {
                    let interval = (frame.timestamp - last_recorded).max(0.0) / self.speed;
                    let deadline = last_emit + Duration::from_secs_f64(interval);
                    if Instant::now() < deadline && !ctx.sleep_until(deadline) {
                        return Ok(SourceUpdate::Idle);
                    }
                }
            }

            self.last_recorded = Some(frame.timestamp);
            self.last_emit = Some(Instant::now());
            let mut frame = frame;
            frame.playback_timestamp = Some(now_timestamp());
            return Ok(SourceUpdate::Emit(frame));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::RecordingMeta;
    use crate::frame::Frame;
    use crate::topic::Topic;
    use crate::types::DataKind;
    use crossbeam_channel::bounded;
    use std::io::Cursor;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    fn recording(timestamps: &[f64]) -> Vec<u8> {
        let mut codec = JsonLinesCodec::new();
        let mut bytes = Vec::new();
        for &t in timestamps {
            let frame = Frame::new(Topic::named("random", DataKind::Int), 1i64).with_timestamp(t);
            codec.encode(&Record::Frame(frame), &mut bytes).unwrap();
        }
        let mut meta = RecordingMeta::new("test");
        meta.frame_count = timestamps.len() as u64;
        codec.encode(&Record::Meta(meta), &mut bytes).unwrap();
        bytes
    }

    fn ctx() -> (SourceContext, crossbeam_channel::Sender<()>) {
        let (tx, rx) = bounded(1);
        (SourceContext::new(Arc::new(AtomicBool::new(true)), rx), tx)
    }

    fn replay(timestamps: &[f64], speed: f64) -> ReplaySource {
        ReplaySource::from_reader(
            Box::new(Cursor::new(recording(timestamps))),
            Box::new(JsonLinesCodec::new()),
            speed,
        )
    }

    #[test]
    fn test_replays_all_frames_then_finishes() {
        let mut source = replay(&[0.0, 0.01, 0.02], f64::INFINITY);
        let (ctx, _stop) = ctx();

        let mut seen = Vec::new();
        loop {
            match source.on_update(&ctx).unwrap() {
                SourceUpdate::Emit(frame) => seen.push(frame.timestamp),
                SourceUpdate::Finished => break,
                SourceUpdate::Idle => {}
            }
        }
        assert_eq!(seen, vec![0.0, 0.01, 0.02]);
    }

    #[test]
    fn test_stamps_playback_timestamp() {
        let mut source = replay(&[5.0], f64::INFINITY);
        let (ctx, _stop) = ctx();

        match source.on_update(&ctx).unwrap() {
            SourceUpdate::Emit(frame) => {
                assert_eq!(frame.timestamp, 5.0);
                let playback = frame.playback_timestamp.unwrap();
                assert!((playback - now_timestamp()).abs() < 5.0);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_speed_scales_intervals() {
        // 100 ms of recording at 2x speed: ~50 ms of wall clock.
        let mut source = replay(&[0.0, 0.05, 0.1], 2.0);
        let (ctx, _stop) = ctx();

        let start = Instant::now();
        let mut emitted = 0;
        loop {
            match source.on_update(&ctx).unwrap() {
                SourceUpdate::Emit(_) => emitted += 1,
                SourceUpdate::Finished => break,
                SourceUpdate::Idle => {}
            }
        }
        let elapsed = start.elapsed();
        assert_eq!(emitted, 3);
        assert!(elapsed >= Duration::from_millis(45), "elapsed {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(200), "elapsed {:?}", elapsed);
    }

    #[test]
    fn test_meta_records_are_skipped() {
        let mut source = replay(&[], f64::INFINITY);
        let (ctx, _stop) = ctx();
        assert!(matches!(
            source.on_update(&ctx).unwrap(),
            SourceUpdate::Finished
        ));
    }

    #[test]
    #[should_panic(expected = "playback speed must be positive")]
    fn test_rejects_nonpositive_speed() {
        let _ = replay(&[], 0.0);
    }
}
