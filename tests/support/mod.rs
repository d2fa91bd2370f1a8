#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::rc::Rc;

use sceneweave::encode::tool::{EncodeSpec, EncoderPipe, MediaTool, PipeExit};
use sceneweave::{Canvas, Frame, Item, Renderer, Rgba8, WeaveResult};

/// In-process stand-in for ffmpeg.
///
/// Each encoded frame becomes one byte (the red channel of pixel 0); concat joins files in
/// manifest order; muxing appends `+audio` and keeps a copy of the WAV in `muxed_audio`.
/// Segments whose file name starts with one of
/// `fail_prefixes` exit with a failure status.
#[derive(Clone, Default)]
pub struct FakeTool {
    pub fail_prefixes: Vec<String>,
    pub spawned: Rc<RefCell<Vec<PathBuf>>>,
    pub concats: Rc<Cell<usize>>,
    pub muxed_audio: Rc<RefCell<Vec<u8>>>,
}

impl FakeTool {
    pub fn failing(prefix: &str) -> Self {
        Self {
            fail_prefixes: vec![prefix.to_owned()],
            ..Self::default()
        }
    }
}

struct FakePipe {
    file: std::fs::File,
    fail: bool,
}

impl EncoderPipe for FakePipe {
    fn write_frame(&mut self, frame: &Frame) -> WeaveResult<()> {
        self.file
            .write_all(&frame.data[..1])
            .map_err(anyhow::Error::from)?;
        Ok(())
    }

    fn close(self: Box<Self>) -> WeaveResult<PipeExit> {
        Ok(if self.fail {
            PipeExit::failed("exit status: 1\nfake encoder crashed")
        } else {
            PipeExit::ok()
        })
    }
}

impl MediaTool for FakeTool {
    fn spawn_encoder(&self, spec: &EncodeSpec) -> WeaveResult<Box<dyn EncoderPipe>> {
        let name = spec
            .out_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let fail = self.fail_prefixes.iter().any(|p| name.starts_with(p));
        self.spawned.borrow_mut().push(spec.out_path.clone());
        let file = std::fs::File::create(&spec.out_path).map_err(anyhow::Error::from)?;
        Ok(Box::new(FakePipe { file, fail }))
    }

    fn concat(&self, manifest: &Path, out: &Path) -> WeaveResult<PipeExit> {
        self.concats.set(self.concats.get() + 1);
        let mut bytes = Vec::new();
        let listing = std::fs::read_to_string(manifest).map_err(anyhow::Error::from)?;
        for line in listing.lines() {
            let path = line
                .strip_prefix("file '")
                .and_then(|l| l.strip_suffix('\''))
                .unwrap_or(line);
            bytes.extend(std::fs::read(path).map_err(anyhow::Error::from)?);
        }
        std::fs::write(out, bytes).map_err(anyhow::Error::from)?;
        Ok(PipeExit::ok())
    }

    fn mux_audio(
        &self,
        video: &Path,
        audio: &Path,
        out: &Path,
        _bitrate: &str,
    ) -> WeaveResult<PipeExit> {
        assert!(audio.exists(), "audio track must be exported before muxing");
        *self.muxed_audio.borrow_mut() = std::fs::read(audio).map_err(anyhow::Error::from)?;
        let mut bytes = std::fs::read(video).map_err(anyhow::Error::from)?;
        bytes.extend_from_slice(b"+audio");
        std::fs::write(out, bytes).map_err(anyhow::Error::from)?;
        Ok(PipeExit::ok())
    }
}

/// Renderer that only counts calls and stamps the first item's x position into pixel 0.
pub struct CountingRenderer {
    pub canvas: Canvas,
    pub calls: Rc<Cell<usize>>,
}

impl CountingRenderer {
    pub fn new(canvas: Canvas) -> (Self, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));
        (
            Self {
                canvas,
                calls: calls.clone(),
            },
            calls,
        )
    }
}

impl Renderer for CountingRenderer {
    fn canvas(&self) -> Canvas {
        self.canvas
    }

    fn render(&mut self, items: &[Item], background: Option<&Frame>) -> WeaveResult<Frame> {
        self.calls.set(self.calls.get() + 1);
        let mut frame = match background {
            Some(bg) => bg.clone(),
            None => Frame::solid(self.canvas, Rgba8::BLACK),
        };
        if let Some(first) = items.first() {
            frame.data[0] = first.state().position().x.round().clamp(0.0, 255.0) as u8;
        }
        Ok(frame)
    }
}

pub fn ffmpeg_tools_available() -> bool {
    let ok = |tool: &str| {
        Command::new(tool)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    };
    ok("ffmpeg") && ok("ffprobe")
}

/// Duration and first audible instant, in seconds, of a 48 kHz stereo 16-bit WAV.
pub fn wav_timing(bytes: &[u8]) -> (f64, Option<f64>) {
    let data_len = u32::from_le_bytes(bytes[40..44].try_into().unwrap()) as usize;
    let frame_bytes = 2 * 2;
    let onset = bytes[44..44 + data_len]
        .chunks_exact(frame_bytes)
        .position(|f| f.iter().any(|&b| b != 0))
        .map(|frame| frame as f64 / 48_000.0);
    ((data_len / frame_bytes) as f64 / 48_000.0, onset)
}
