use crate::audio::timeline::AudioTimeline;
use crate::encode::segment::Segment;
use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{WeaveError, WeaveResult};
use crate::render::backend::Frame;
use std::path::PathBuf;

/// Configuration provided to a [`FrameSink`] when a segment begins.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SinkConfig {
    /// Segment index (the scene's operation counter).
    pub index: u64,
    pub canvas: Canvas,
    pub fps: Fps,
}

/// Half-open range of segment indices, `start..end`; `end = None` is unbounded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SegmentRange {
    pub start: u64,
    pub end: Option<u64>,
}

impl SegmentRange {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn new(start: Option<u64>, end: Option<u64>) -> Self {
        Self {
            start: start.unwrap_or(0),
            end,
        }
    }

    pub fn contains(&self, index: u64) -> bool {
        index >= self.start && self.end.is_none_or(|e| index < e)
    }
}

/// End-of-run inputs handed to [`FrameSink::finish`].
#[derive(Clone, Copy, Debug)]
pub struct FinishRequest<'a> {
    /// Mixed audio, when any sound was registered.
    pub audio: Option<&'a AudioTimeline>,
    /// Segment indices that belong in the final video.
    pub range: SegmentRange,
    /// Scene time at which the assembled video begins; earlier audio is cut.
    pub start_secs: f64,
    /// Length of the assembled video in seconds, used to pad the audio track.
    pub duration_secs: f64,
}

/// Receives frames segment by segment, in strict order.
///
/// Ordering contract: `begin_segment`, any number of `push_frame`, then exactly one of
/// `end_segment` or `abort_segment`. Segments never overlap.
pub trait FrameSink {
    fn begin_segment(&mut self, cfg: SinkConfig) -> WeaveResult<()>;

    fn push_frame(&mut self, frame: &Frame) -> WeaveResult<()>;

    /// Close the current segment. `Ok(None)` when it received no frames.
    fn end_segment(&mut self) -> WeaveResult<Option<Segment>>;

    /// Drop the current segment without producing output.
    fn abort_segment(&mut self);

    /// Called for operations that run in skip mode; no segment is produced for `index`.
    fn skip_segment(&mut self, _index: u64) -> WeaveResult<()> {
        Ok(())
    }

    /// Assemble the final deliverable. Returns its path, if one was produced.
    fn finish(&mut self, _req: FinishRequest<'_>) -> WeaveResult<Option<PathBuf>> {
        Ok(None)
    }
}

/// Captured segment for [`InMemorySink`].
#[derive(Clone, Debug)]
pub struct CapturedSegment {
    pub config: SinkConfig,
    pub frames: Vec<Frame>,
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    current: Option<CapturedSegment>,
    segments: Vec<CapturedSegment>,
    skipped: Vec<u64>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Completed segments in order.
    pub fn segments(&self) -> &[CapturedSegment] {
        &self.segments
    }

    /// Indices reported through `skip_segment`.
    pub fn skipped(&self) -> &[u64] {
        &self.skipped
    }

    /// Total frames across completed segments.
    pub fn frame_count(&self) -> usize {
        self.segments.iter().map(|s| s.frames.len()).sum()
    }
}

impl FrameSink for InMemorySink {
    fn begin_segment(&mut self, cfg: SinkConfig) -> WeaveResult<()> {
        if self.current.is_some() {
            return Err(WeaveError::render("segment already open"));
        }
        self.current = Some(CapturedSegment {
            config: cfg,
            frames: Vec::new(),
        });
        Ok(())
    }

    fn push_frame(&mut self, frame: &Frame) -> WeaveResult<()> {
        let Some(cur) = self.current.as_mut() else {
            return Err(WeaveError::render("no open segment"));
        };
        cur.frames.push(frame.clone());
        Ok(())
    }

    fn end_segment(&mut self) -> WeaveResult<Option<Segment>> {
        let Some(cur) = self.current.take() else {
            return Err(WeaveError::render("no open segment"));
        };
        if cur.frames.is_empty() {
            return Ok(None);
        }
        let seg = Segment {
            index: cur.config.index,
            path: PathBuf::new(),
            frames: cur.frames.len() as u64,
        };
        self.segments.push(cur);
        Ok(Some(seg))
    }

    fn abort_segment(&mut self) {
        self.current = None;
    }

    fn skip_segment(&mut self, index: u64) -> WeaveResult<()> {
        self.skipped.push(index);
        Ok(())
    }
}

/// Sink that discards every frame.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl FrameSink for NullSink {
    fn begin_segment(&mut self, _cfg: SinkConfig) -> WeaveResult<()> {
        Ok(())
    }

    fn push_frame(&mut self, _frame: &Frame) -> WeaveResult<()> {
        Ok(())
    }

    fn end_segment(&mut self) -> WeaveResult<Option<Segment>> {
        Ok(None)
    }

    fn abort_segment(&mut self) {}
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
