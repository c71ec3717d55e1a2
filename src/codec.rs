//! Wire format for recording and replaying frame streams.
//!
//! A recording is a sequence of self-delimited records: every frame becomes
//! one [`Record::Frame`]; a finalizing [`Record::Meta`] carries the session
//! metadata. The codec preserves `timestamp`, `topic`, `source` and `value`
//! exactly, so a replayed stream reproduces the recorded timeline.
//!
//! [`JsonLinesCodec`] is the bundled implementation (one JSON object per
//! line); alternative codecs implement [`FrameCodec`] and plug into
//! `RecordingSink`/`ReplaySource` unchanged.

use crate::error::{PipelineError, PipelineResult};
use crate::frame::Frame;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::BufRead;

/// Metadata describing a recorded session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingMeta {
    /// Name/title of the recording.
    pub name: String,
    /// When the recording was made.
    pub recorded_at: DateTime<Utc>,
    /// Number of frames recorded.
    pub frame_count: u64,
}

impl RecordingMeta {
    /// Create metadata stamped with the current time.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            recorded_at: Utc::now(),
            frame_count: 0,
        }
    }
}

/// One record of a recorded stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Record {
    /// A recorded data frame.
    Frame(Frame),
    /// Session metadata, written when the recording is finalized.
    Meta(RecordingMeta),
}

/// Encode/decode of self-delimited records.
pub trait FrameCodec: Send {
    /// Append one self-delimited record to `out`.
    fn encode(&mut self, record: &Record, out: &mut Vec<u8>) -> PipelineResult<()>;

    /// Decode the next record from `input`; `None` at end of stream.
    fn decode(&mut self, input: &mut dyn BufRead) -> PipelineResult<Option<Record>>;
}

/// One JSON object per line, newline-delimited.
#[derive(Debug, Default)]
pub struct JsonLinesCodec {
    line: String,
}

impl JsonLinesCodec {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FrameCodec for JsonLinesCodec {
    fn encode(&mut self, record: &Record, out: &mut Vec<u8>) -> PipelineResult<()> {
        serde_json::to_writer(&mut *out, record).map_err(PipelineError::codec)?;
        out.push(b'\n');
        Ok(())
    }

    fn decode(&mut self, input: &mut dyn BufRead) -> PipelineResult<Option<Record>> {
        loop {
            self.line.clear();
            let read = input.read_line(&mut self.line)?;
            if read == 0 {
                return Ok(None);
            }
            let line = self.line.trim();
            if line.is_empty() {
                continue;
            }
            return serde_json::from_str(line)
                .map(Some)
                .map_err(PipelineError::codec);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topic::Topic;
    use crate::types::DataKind;
    use std::io::Cursor;

    fn round_trip(records: &[Record]) -> Vec<Record> {
        let mut codec = JsonLinesCodec::new();
        let mut bytes = Vec::new();
        for record in records {
            codec.encode(record, &mut bytes).unwrap();
        }
        let mut cursor = Cursor::new(bytes);
        let mut out = Vec::new();
        while let Some(record) = codec.decode(&mut cursor).unwrap() {
            out.push(record);
        }
        out
    }

    #[test]
    fn test_frame_round_trip_preserves_fields() {
        let frame = Frame::new(Topic::named("random", DataKind::Int), 17i64)
            .with_timestamp(1234.5625);
        let decoded = round_trip(&[Record::Frame(frame.clone())]);
        match &decoded[0] {
            Record::Frame(back) => {
                assert_eq!(back.timestamp, frame.timestamp);
                assert_eq!(back.topic, frame.topic);
                assert_eq!(back.value, frame.value);
            }
            other => panic!("expected frame, got {:?}", other),
        }
    }

    #[test]
    fn test_meta_round_trip() {
        let mut meta = RecordingMeta::new("bench run");
        meta.frame_count = 42;
        let decoded = round_trip(&[Record::Meta(meta)]);
        match &decoded[0] {
            Record::Meta(back) => {
                assert_eq!(back.name, "bench run");
                assert_eq!(back.frame_count, 42);
            }
            other => panic!("expected meta, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_skips_blank_lines() {
        let mut codec = JsonLinesCodec::new();
        let mut bytes = Vec::new();
        codec
            .encode(&Record::Frame(Frame::new(Topic::any(), 1i64)), &mut bytes)
            .unwrap();
        bytes.extend_from_slice(b"\n\n");
        codec
            .encode(&Record::Frame(Frame::new(Topic::any(), 2i64)), &mut bytes)
            .unwrap();

        let mut cursor = Cursor::new(bytes);
        let mut count = 0;
        while codec.decode(&mut cursor).unwrap().is_some() {
            count += 1;
        }
        assert_eq!(count, 2);
    }

    #[test]
    fn test_decode_reports_garbage() {
        let mut codec = JsonLinesCodec::new();
        let mut cursor = Cursor::new(b"not json\n".to_vec());
        assert!(matches!(
            codec.decode(&mut cursor),
            Err(PipelineError::Codec(_))
        ));
    }
}
