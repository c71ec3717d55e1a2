//! Recording sink: persists every received frame through a [`FrameCodec`].
//!
//! Frames are written as they arrive; `on_stop` appends the session
//! metadata record and flushes. The default codec is
//! [`JsonLinesCodec`](crate::codec::JsonLinesCodec), producing one JSON
//! object per line.

use crate::codec::{FrameCodec, JsonLinesCodec, Record, RecordingMeta};
use crate::error::PipelineResult;
use crate::frame::SharedFrame;
use crate::module::Sink;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Sink that encodes received frames into a writer.
pub struct RecordingSink {
    writer: BufWriter<Box<dyn Write + Send>>,
    codec: Box<dyn FrameCodec>,
    meta: RecordingMeta,
    buf: Vec<u8>,
}

impl RecordingSink {
    /// Record to a file with the bundled JSON Lines codec.
    pub fn create(path: impl AsRef<Path>) -> PipelineResult<Self> {
        Self::create_with(path, Box::new(JsonLinesCodec::new()))
    }

    /// Record to a file with an explicit codec.
    pub fn create_with(path: impl AsRef<Path>, codec: Box<dyn FrameCodec>) -> PipelineResult<Self> {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "recording".into());
        let file = File::create(path)?;
        Ok(Self::from_writer(Box::new(file), codec, name))
    }

    /// Record into any writer (in-memory buffers in tests).
    pub fn from_writer(
        writer: Box<dyn Write + Send>,
        codec: Box<dyn FrameCodec>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            writer: BufWriter::new(writer),
            codec,
            meta: RecordingMeta::new(name),
            buf: Vec::new(),
        }
    }

    /// Number of frames written so far.
    pub fn frame_count(&self) -> u64 {
        self.meta.frame_count
    }
}

impl Sink for RecordingSink {
    fn name(&self) -> &str {
        "RecordingSink"
    }

    fn on_update(&mut self, frame: &SharedFrame) -> PipelineResult<()> {
        self.buf.clear();
        self.codec
            .encode(&Record::Frame(frame.as_ref().clone()), &mut self.buf)?;
        self.writer.write_all(&self.buf)?;
        self.meta.frame_count += 1;
        Ok(())
    }

    fn on_stop(&mut self) {
        self.buf.clear();
        let finalize = self
            .codec
            .encode(&Record::Meta(self.meta.clone()), &mut self.buf)
            .and_then(|()| self.writer.write_all(&self.buf).map_err(Into::into))
            .and_then(|()| self.writer.flush().map_err(Into::into));
        if let Err(err) = finalize {
            tracing::warn!(error = %err, "failed to finalize recording");
        } else {
            tracing::info!(frames = self.meta.frame_count, "recording finalized");
        }
    }
}
