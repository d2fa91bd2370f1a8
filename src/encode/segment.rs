use crate::encode::tool::{EncodeSpec, EncoderPipe, MediaTool};
use crate::foundation::core::{Canvas, Fps, Rgba8};
use crate::foundation::error::{WeaveError, WeaveResult};
use crate::render::backend::Frame;
use std::path::{Path, PathBuf};

/// A materialized segment: the complete output of one `play`/`wait` operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    /// Operation index, strictly increasing in invocation order from 0.
    pub index: u64,
    /// Final file path (empty for in-memory sinks).
    pub path: PathBuf,
    /// Number of frames written.
    pub frames: u64,
}

/// Encoding parameters shared by every segment of one scene.
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentFormat {
    pub canvas: Canvas,
    pub fps: Fps,
    /// File extension including the dot, e.g. `.mp4`.
    pub extension: String,
    pub keep_alpha: bool,
    pub background: Rgba8,
}

/// Final and temporary paths of segment `index`: `NNNNN.ext` and `NNNNN_temp.ext`.
pub fn segment_paths(dir: &Path, index: u64, extension: &str) -> (PathBuf, PathBuf) {
    (
        dir.join(format!("{index:05}{extension}")),
        dir.join(format!("{index:05}_temp{extension}")),
    )
}

/// One encoder process bound to one segment.
///
/// Output goes to a temporary path and is renamed to the final path only when the encoder exits
/// cleanly, so a file at the final path is always complete.
pub struct SegmentEncoder {
    index: u64,
    final_path: PathBuf,
    temp_path: PathBuf,
    pipe: Option<Box<dyn EncoderPipe>>,
    frames: u64,
    broken: Option<String>,
}

impl SegmentEncoder {
    #[tracing::instrument(skip(tool, format), fields(ext = %format.extension))]
    pub fn open(
        tool: &dyn MediaTool,
        dir: &Path,
        index: u64,
        format: &SegmentFormat,
    ) -> WeaveResult<Self> {
        let (final_path, temp_path) = segment_paths(dir, index, &format.extension);
        remove_if_exists(index, &final_path)?;
        remove_if_exists(index, &temp_path)?;

        let spec = EncodeSpec {
            canvas: format.canvas,
            fps: format.fps,
            out_path: temp_path.clone(),
            keep_alpha: format.keep_alpha,
            background: format.background,
        };
        let pipe = tool
            .spawn_encoder(&spec)
            .map_err(|e| WeaveError::encoding(index, e.to_string()))?;
        tracing::debug!(path = %temp_path.display(), "segment encoder started");

        Ok(Self {
            index,
            final_path,
            temp_path,
            pipe: Some(pipe),
            frames: 0,
            broken: None,
        })
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn is_broken(&self) -> bool {
        self.broken.is_some()
    }

    /// Append one frame.
    ///
    /// A failing pipe (e.g. the encoder died mid-stream) marks the segment broken; later frames
    /// are discarded and `close` reports the failure.
    pub fn write(&mut self, frame: &Frame) -> WeaveResult<()> {
        if self.broken.is_some() {
            return Ok(());
        }
        let Some(pipe) = self.pipe.as_mut() else {
            return Err(WeaveError::encoding(self.index, "segment is already closed"));
        };
        match pipe.write_frame(frame) {
            Ok(()) => {
                self.frames += 1;
                Ok(())
            }
            Err(e @ WeaveError::InvalidArgument(_)) => Err(e),
            Err(e) => {
                tracing::warn!(index = self.index, error = %e, "encoder stopped accepting frames");
                self.broken = Some(e.to_string());
                Ok(())
            }
        }
    }

    /// Close the stream, wait for the encoder and move the output into place.
    pub fn close(mut self) -> WeaveResult<Segment> {
        let Some(pipe) = self.pipe.take() else {
            return Err(WeaveError::encoding(self.index, "segment is already closed"));
        };
        let exit = pipe.close();
        let failure = match (exit, self.broken.take()) {
            (Ok(exit), None) if exit.success => None,
            (Ok(exit), broken) => Some(match broken {
                Some(b) if exit.success => b,
                Some(b) => format!("{b}; {}", exit.detail),
                None => exit.detail,
            }),
            (Err(e), _) => Some(e.to_string()),
        };

        if let Some(message) = failure {
            let _ = std::fs::remove_file(&self.temp_path);
            return Err(WeaveError::encoding(self.index, message));
        }

        if !self.temp_path.exists() {
            return Err(WeaveError::encoding(
                self.index,
                format!(
                    "encoder reported success but wrote no file at '{}'",
                    self.temp_path.display()
                ),
            ));
        }
        std::fs::rename(&self.temp_path, &self.final_path).map_err(|e| {
            WeaveError::encoding(
                self.index,
                format!(
                    "failed to move '{}' to '{}': {e}",
                    self.temp_path.display(),
                    self.final_path.display()
                ),
            )
        })?;

        Ok(Segment {
            index: self.index,
            path: self.final_path.clone(),
            frames: self.frames,
        })
    }

    /// Stop the encoder and discard its output.
    pub fn abort(mut self) {
        if let Some(pipe) = self.pipe.take() {
            let _ = pipe.close();
        }
        let _ = std::fs::remove_file(&self.temp_path);
        tracing::debug!(index = self.index, "segment aborted");
    }
}

fn remove_if_exists(index: u64, path: &Path) -> WeaveResult<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(WeaveError::encoding(
            index,
            format!("failed to remove stale '{}': {e}", path.display()),
        )),
    }
}

impl Drop for SegmentEncoder {
    fn drop(&mut self) {
        // Dropped without close/abort (e.g. an error unwound the caller): reap the process.
        if let Some(pipe) = self.pipe.take() {
            let _ = pipe.close();
            let _ = std::fs::remove_file(&self.temp_path);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/segment.rs"]
mod tests;
