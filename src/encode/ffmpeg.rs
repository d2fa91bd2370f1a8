use crate::encode::tool::{EncodeSpec, EncoderPipe, MediaTool, PipeExit};
use crate::foundation::core::Fps;
use crate::foundation::error::{WeaveError, WeaveResult};
use crate::render::backend::Frame;
use crate::render::composite::{flatten_to_opaque_rgba8, unpremultiply_in_place};
use std::io::Read;
use std::path::Path;
use std::process::{Child, ChildStdin, Command, Stdio};

/// [`MediaTool`] backed by the system `ffmpeg` binary.
#[derive(Clone, Debug)]
pub struct FfmpegTool {
    program: String,
}

impl Default for FfmpegTool {
    fn default() -> Self {
        Self {
            program: "ffmpeg".to_owned(),
        }
    }
}

impl FfmpegTool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific executable instead of `ffmpeg` from `PATH`.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self) -> Command {
        Command::new(&self.program)
    }

    fn run(&self, mut cmd: Command, what: &str) -> WeaveResult<PipeExit> {
        tracing::debug!(?cmd, "running {what}");
        let out = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                WeaveError::assembly(format!(
                    "failed to spawn {} for {what} (is it installed and on PATH?): {e}",
                    self.program
                ))
            })?;
        if out.status.success() {
            Ok(PipeExit::ok())
        } else {
            let stderr = String::from_utf8_lossy(&out.stderr);
            Ok(PipeExit::failed(format!(
                "{what} exited with status {}: {}",
                out.status,
                stderr.trim()
            )))
        }
    }
}

impl MediaTool for FfmpegTool {
    fn spawn_encoder(&self, spec: &EncodeSpec) -> WeaveResult<Box<dyn EncoderPipe>> {
        spec.canvas.validate()?;
        ensure_parent_dir(&spec.out_path)?;

        let mut cmd = self.command();
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        cmd.args([
            "-y",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", spec.canvas.width, spec.canvas.height),
        ]);
        push_input_fps(&mut cmd, spec.fps);
        cmd.args(["-i", "pipe:0", "-an"]);

        if spec.keep_alpha {
            cmd.args(["-vcodec", "qtrle"]);
        } else {
            cmd.args([
                "-c:v",
                "libx264",
                "-pix_fmt",
                "yuv420p",
                "-movflags",
                "+faststart",
            ]);
        }
        cmd.arg(&spec.out_path);

        let mut child = cmd.spawn().map_err(|e| {
            WeaveError::render(format!(
                "failed to spawn {} (is it installed and on PATH?): {e}",
                self.program
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| WeaveError::render("failed to open encoder stdin (unexpected)"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| WeaveError::render("failed to open encoder stderr (unexpected)"))?;
        let stderr_drain = std::thread::spawn(move || {
            let mut stderr_bytes = Vec::new();
            stderr.read_to_end(&mut stderr_bytes)?;
            Ok(stderr_bytes)
        });

        Ok(Box::new(FfmpegPipe {
            spec: spec.clone(),
            child,
            stdin: Some(stdin),
            stderr_drain: Some(stderr_drain),
            scratch: vec![0u8; spec.canvas.frame_byte_len()],
        }))
    }

    fn concat(&self, manifest: &Path, out: &Path) -> WeaveResult<PipeExit> {
        ensure_parent_dir(out)?;
        let mut cmd = self.command();
        cmd.args(["-y", "-f", "concat", "-safe", "0", "-i"])
            .arg(manifest)
            .args([
                "-loglevel",
                "error",
                "-c",
                "copy",
                "-an",
                "-fflags",
                "+bitexact",
            ])
            .arg(out);
        self.run(cmd, "concat")
    }

    fn mux_audio(
        &self,
        video: &Path,
        audio: &Path,
        out: &Path,
        bitrate: &str,
    ) -> WeaveResult<PipeExit> {
        let mut cmd = self.command();
        cmd.arg("-i")
            .arg(video)
            .arg("-i")
            .arg(audio)
            .args([
                "-y", "-c:v", "copy", "-c:a", "aac", "-b:a", bitrate, "-map", "0:v:0", "-map",
                "1:a:0", "-loglevel", "error",
            ])
            .arg(out);
        self.run(cmd, "mux")
    }
}

/// Running `ffmpeg` encoder fed through its stdin.
pub struct FfmpegPipe {
    spec: EncodeSpec,
    child: Child,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,
    scratch: Vec<u8>,
}

impl EncoderPipe for FfmpegPipe {
    fn write_frame(&mut self, frame: &Frame) -> WeaveResult<()> {
        if frame.width != self.spec.canvas.width || frame.height != self.spec.canvas.height {
            return Err(WeaveError::invalid_argument(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, self.spec.canvas.width, self.spec.canvas.height
            )));
        }
        if frame.data.len() != self.scratch.len() {
            return Err(WeaveError::invalid_argument(
                "frame.data size mismatch with width*height*4",
            ));
        }

        // ffmpeg reads straight alpha; opaque outputs are flattened first.
        if self.spec.keep_alpha {
            self.scratch.copy_from_slice(&frame.data);
            if frame.premultiplied {
                unpremultiply_in_place(&mut self.scratch);
            }
        } else if frame.premultiplied {
            flatten_to_opaque_rgba8(
                &mut self.scratch,
                &frame.data,
                self.spec.background.to_array(),
            )?;
        } else {
            self.scratch.copy_from_slice(&frame.data);
        }

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(WeaveError::render("encoder input is already closed"));
        };

        use std::io::Write as _;
        stdin.write_all(&self.scratch).map_err(|e| {
            WeaveError::render(format!("failed to write frame to encoder stdin: {e}"))
        })?;
        Ok(())
    }

    fn close(mut self: Box<Self>) -> WeaveResult<PipeExit> {
        drop(self.stdin.take());

        let status = self.child.wait().map_err(|e| {
            WeaveError::render(format!("failed to wait for encoder to finish: {e}"))
        })?;
        let stderr_bytes = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| WeaveError::render("encoder stderr drain thread panicked"))?
                .map_err(|e| WeaveError::render(format!("encoder stderr read failed: {e}")))?,
            None => Vec::new(),
        };

        if status.success() {
            Ok(PipeExit::ok())
        } else {
            let stderr = String::from_utf8_lossy(&stderr_bytes);
            Ok(PipeExit::failed(format!(
                "encoder exited with status {}: {}",
                status,
                stderr.trim()
            )))
        }
    }
}

fn push_input_fps(cmd: &mut Command, fps: Fps) {
    // For rawvideo input, `-r` before `-i` sets the input framerate.
    cmd.args(["-r", &format!("{}/{}", fps.num, fps.den)]);
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> WeaveResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    std::process::Command::new("ffmpeg")
        .arg("-version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
