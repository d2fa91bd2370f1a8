use crate::encode::assemble::Assembler;
use crate::encode::segment::{Segment, SegmentEncoder, SegmentFormat, segment_paths};
use crate::encode::sink::{FinishRequest, FrameSink, SinkConfig};
use crate::encode::tool::MediaTool;
use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{WeaveError, WeaveResult};
use crate::render::backend::Frame;
use crate::scene::config::{SceneConfig, WriterConfig};
use std::path::{Path, PathBuf};

/// On-disk layout for one scene.
///
/// ```text
/// <media_dir>/<H>p<FPS>/<scene><ext>
/// <media_dir>/<H>p<FPS>/partial_movie_files/<scene>/NNNNN<ext>
/// <media_dir>/<H>p<FPS>/partial_movie_files/<scene>/partial_movie_file_list.txt
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoviePaths {
    pub movie_dir: PathBuf,
    pub movie: PathBuf,
    pub partial_dir: PathBuf,
    pub manifest: PathBuf,
    /// Transient audio export, removed after muxing.
    pub audio: PathBuf,
}

impl MoviePaths {
    pub fn new(media_dir: &Path, scene: &str, canvas: Canvas, fps: Fps, extension: &str) -> Self {
        let movie_dir = media_dir.join(format!("{}p{}", canvas.height, fps_label(fps)));
        let partial_dir = movie_dir.join("partial_movie_files").join(scene);
        Self {
            movie: movie_dir.join(format!("{scene}{extension}")),
            audio: movie_dir.join(format!("{scene}.wav")),
            manifest: partial_dir.join("partial_movie_file_list.txt"),
            partial_dir,
            movie_dir,
        }
    }
}

fn fps_label(fps: Fps) -> String {
    if fps.den == 1 {
        fps.num.to_string()
    } else {
        format!("{:.2}", fps.as_f64())
    }
}

/// [`FrameSink`] that encodes each segment to its own file and assembles the movie at the end.
///
/// The encoder for a segment is started on its first frame, so operations that produce no frames
/// leave no file behind.
pub struct MovieWriter {
    cfg: WriterConfig,
    paths: MoviePaths,
    format: SegmentFormat,
    tool: Box<dyn MediaTool>,
    pending: Option<SinkConfig>,
    active: Option<SegmentEncoder>,
    completed: Vec<Segment>,
}

impl MovieWriter {
    pub fn new(
        scene: &SceneConfig,
        cfg: WriterConfig,
        tool: Box<dyn MediaTool>,
    ) -> WeaveResult<Self> {
        scene.validate()?;
        cfg.validate()?;
        let paths = MoviePaths::new(
            &cfg.media_dir,
            &scene.name,
            scene.canvas,
            scene.fps,
            &cfg.movie_extension,
        );
        let format = SegmentFormat {
            canvas: scene.canvas,
            fps: scene.fps,
            extension: cfg.movie_extension.clone(),
            keep_alpha: cfg.keeps_alpha(),
            background: scene.background,
        };
        Ok(Self {
            cfg,
            paths,
            format,
            tool,
            pending: None,
            active: None,
            completed: Vec::new(),
        })
    }

    pub fn paths(&self) -> &MoviePaths {
        &self.paths
    }

    /// Segments materialized so far, in order.
    pub fn completed(&self) -> &[Segment] {
        &self.completed
    }

    fn remove_stale(&self, index: u64) -> WeaveResult<()> {
        let (final_path, _) = segment_paths(&self.paths.partial_dir, index, &self.format.extension);
        match std::fs::remove_file(&final_path) {
            Ok(()) => {
                tracing::debug!(path = %final_path.display(), "removed stale segment");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(WeaveError::encoding(
                index,
                format!("failed to remove stale '{}': {e}", final_path.display()),
            )),
        }
    }
}

impl FrameSink for MovieWriter {
    fn begin_segment(&mut self, cfg: SinkConfig) -> WeaveResult<()> {
        if self.pending.is_some() || self.active.is_some() {
            return Err(WeaveError::render("segment already open"));
        }
        if cfg.canvas != self.format.canvas || cfg.fps != self.format.fps {
            return Err(WeaveError::invalid_argument(format!(
                "segment {} format {}x{}@{} does not match writer {}x{}@{}",
                cfg.index,
                cfg.canvas.width,
                cfg.canvas.height,
                cfg.fps,
                self.format.canvas.width,
                self.format.canvas.height,
                self.format.fps
            )));
        }
        self.remove_stale(cfg.index)?;
        self.pending = Some(cfg);
        Ok(())
    }

    fn push_frame(&mut self, frame: &Frame) -> WeaveResult<()> {
        if self.active.is_none() {
            let Some(cfg) = self.pending.take() else {
                return Err(WeaveError::render("no open segment"));
            };
            std::fs::create_dir_all(&self.paths.partial_dir).map_err(|e| {
                WeaveError::encoding(
                    cfg.index,
                    format!(
                        "failed to create '{}': {e}",
                        self.paths.partial_dir.display()
                    ),
                )
            })?;
            self.active = Some(SegmentEncoder::open(
                self.tool.as_ref(),
                &self.paths.partial_dir,
                cfg.index,
                &self.format,
            )?);
        }
        match self.active.as_mut() {
            Some(enc) => enc.write(frame),
            None => Err(WeaveError::render("no open segment")),
        }
    }

    fn end_segment(&mut self) -> WeaveResult<Option<Segment>> {
        self.pending = None;
        let Some(enc) = self.active.take() else {
            return Ok(None);
        };
        let seg = enc.close()?;
        tracing::debug!(
            index = seg.index,
            frames = seg.frames,
            path = %seg.path.display(),
            "segment written"
        );
        self.completed.push(seg.clone());
        Ok(Some(seg))
    }

    fn abort_segment(&mut self) {
        self.pending = None;
        if let Some(enc) = self.active.take() {
            enc.abort();
        }
    }

    fn skip_segment(&mut self, index: u64) -> WeaveResult<()> {
        self.remove_stale(index)
    }

    #[tracing::instrument(skip(self, req), fields(movie = %self.paths.movie.display()))]
    fn finish(&mut self, req: FinishRequest<'_>) -> WeaveResult<Option<PathBuf>> {
        let assembler = Assembler::new(
            self.tool.as_ref(),
            &self.paths.partial_dir,
            &self.cfg.movie_extension,
            &self.paths.manifest,
        );
        let segments = assembler.list_segments(req.range)?;
        let Some(movie) = assembler.concatenate(req.range, &self.paths.movie)? else {
            return Ok(None);
        };

        if let Some(audio) = req.audio
            && audio.includes_sound()
        {
            audio
                .starting_at(req.start_secs)
                .export_wav(&self.paths.audio, req.duration_secs)
                .map_err(|e| WeaveError::assembly(format!("audio export failed: {e}")))?;
            assembler.mux_audio(&movie, &self.paths.audio, &self.cfg.audio_bitrate)?;
        }

        if !self.cfg.keep_partial_files {
            for (_, path) in segments {
                if let Err(e) = std::fs::remove_file(&path) {
                    tracing::warn!(path = %path.display(), error = %e, "could not remove segment");
                }
            }
        }
        Ok(Some(movie))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/writer.rs"]
mod tests;
