use crate::foundation::core::{Canvas, Fps, Rgba8};
use crate::foundation::error::WeaveResult;
use crate::render::backend::Frame;
use std::path::{Path, PathBuf};

/// Parameters for one raw-frame encoder process.
#[derive(Clone, Debug, PartialEq)]
pub struct EncodeSpec {
    /// Frame resolution.
    pub canvas: Canvas,
    /// Input and output frame rate.
    pub fps: Fps,
    /// File the encoder writes.
    pub out_path: PathBuf,
    /// Keep the alpha channel (`.mov`); otherwise frames are flattened over `background`.
    pub keep_alpha: bool,
    /// Flattening color for opaque outputs (straight alpha).
    pub background: Rgba8,
}

/// How an external process ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipeExit {
    /// `true` for a zero exit status.
    pub success: bool,
    /// Exit status and trimmed stderr, for messages.
    pub detail: String,
}

impl PipeExit {
    pub fn ok() -> Self {
        Self {
            success: true,
            detail: String::new(),
        }
    }

    pub fn failed(detail: impl Into<String>) -> Self {
        Self {
            success: false,
            detail: detail.into(),
        }
    }
}

/// Write end of a running encoder.
///
/// `write_frame` blocks while the consumer is behind; there is no buffering beyond the OS pipe.
pub trait EncoderPipe {
    fn write_frame(&mut self, frame: &Frame) -> WeaveResult<()>;

    /// Close the input stream and wait for the process to exit.
    fn close(self: Box<Self>) -> WeaveResult<PipeExit>;
}

/// External encoder/muxer boundary. Nothing else in the pipeline touches process handles.
pub trait MediaTool {
    /// Start an encoder consuming raw frames and writing `spec.out_path`.
    fn spawn_encoder(&self, spec: &EncodeSpec) -> WeaveResult<Box<dyn EncoderPipe>>;

    /// Losslessly join the files listed in `manifest` into `out`.
    fn concat(&self, manifest: &Path, out: &Path) -> WeaveResult<PipeExit>;

    /// Combine the video stream of `video` with `audio` into `out`.
    fn mux_audio(&self, video: &Path, audio: &Path, out: &Path, bitrate: &str)
    -> WeaveResult<PipeExit>;
}
