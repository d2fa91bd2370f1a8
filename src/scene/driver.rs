use crate::animation::anim::Animation;
use crate::animation::scheduler::{Batch, partition_moving};
use crate::animation::time::TimeProgression;
use crate::audio::clip::AudioClip;
use crate::audio::decode::SoundResolver;
use crate::audio::timeline::AudioTimeline;
use crate::encode::ffmpeg::FfmpegTool;
use crate::encode::segment::Segment;
use crate::encode::sink::{FinishRequest, FrameSink, SegmentRange, SinkConfig};
use crate::encode::writer::MovieWriter;
use crate::foundation::error::{WeaveError, WeaveResult};
use crate::foundation::rng::Rng64;
use crate::render::backend::{Frame, Renderer};
use crate::render::composite::unpremultiply_in_place;
use crate::render::cpu::{CpuRenderer, CpuRendererOpts};
use crate::scene::config::{SceneConfig, WriterConfig};
use crate::scene::graph::SceneGraph;
use crate::scene::item::Item;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};

/// Outcome of a scene run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderReport {
    /// Operations played (`play` and `wait` calls), including skipped ones.
    pub num_plays: u64,
    /// Segments that were materialized, in order.
    pub segments: Vec<Segment>,
    /// Indices of segments dropped because their encoder failed.
    pub failed_segments: Vec<u64>,
    /// Final movie, when one was assembled.
    pub output: Option<PathBuf>,
    /// `true` when the run stopped at `end_at_animation`.
    pub ended_early: bool,
    /// Logical scene duration in seconds.
    pub duration_secs: f64,
}

type StopCondition<'a> = &'a mut dyn FnMut(&Scene) -> bool;

/// Drives a scene: owns the item list, clock, audio track and the frame sink.
///
/// Every `play`/`wait` call is one operation and one segment. Operations run strictly in
/// sequence on the calling thread; the only blocking point is the sink's frame write.
pub struct Scene {
    config: SceneConfig,
    graph: SceneGraph,
    renderer: Box<dyn Renderer>,
    sink: Box<dyn FrameSink>,
    sounds: Option<Box<dyn SoundResolver>>,
    audio: AudioTimeline,
    time: f64,
    num_plays: u64,
    skip: bool,
    original_skip: Option<bool>,
    terminated: bool,
    writing: bool,
    segment_error: Option<WeaveError>,
    /// Scene time covered by encoded operations, first start to last end.
    encoded_span: Option<(f64, f64)>,
    rng: Rng64,
    last_animated: Vec<Item>,
    report: RenderReport,
}

impl Scene {
    pub fn new(
        config: SceneConfig,
        renderer: Box<dyn Renderer>,
        sink: Box<dyn FrameSink>,
    ) -> WeaveResult<Self> {
        config.validate()?;
        if renderer.canvas() != config.canvas {
            return Err(WeaveError::invalid_argument(format!(
                "renderer canvas {}x{} does not match scene canvas {}x{}",
                renderer.canvas().width,
                renderer.canvas().height,
                config.canvas.width,
                config.canvas.height
            )));
        }
        let skip = config.skip_animations || config.start_at_animation.is_some_and(|n| n > 0);
        let rng = Rng64::new(config.random_seed.unwrap_or(0));
        Ok(Self {
            config,
            graph: SceneGraph::new(),
            renderer,
            sink,
            sounds: None,
            audio: AudioTimeline::new(),
            time: 0.0,
            num_plays: 0,
            skip,
            original_skip: None,
            terminated: false,
            writing: false,
            segment_error: None,
            encoded_span: None,
            rng,
            last_animated: Vec::new(),
            report: RenderReport::default(),
        })
    }

    /// Scene rendered with [`CpuRenderer`] into a [`MovieWriter`] driving system `ffmpeg`.
    pub fn with_movie_writer(config: SceneConfig, writer: WriterConfig) -> WeaveResult<Self> {
        let renderer = CpuRenderer::new(CpuRendererOpts {
            canvas: config.canvas,
            background: config.background,
        })?;
        let sink = MovieWriter::new(&config, writer, Box::new(FfmpegTool::new()))?;
        Self::new(config, Box::new(renderer), Box::new(sink))
    }

    pub fn with_sound_resolver(mut self, resolver: Box<dyn SoundResolver>) -> Self {
        self.sounds = Some(resolver);
        self
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    /// Current top-level items, back to front.
    pub fn items(&self) -> &[Item] {
        self.graph.items()
    }

    /// Logical scene time in seconds.
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn num_plays(&self) -> u64 {
        self.num_plays
    }

    pub fn is_skipping(&self) -> bool {
        self.skip
    }

    pub fn audio(&self) -> &AudioTimeline {
        &self.audio
    }

    /// Deterministic generator seeded from `random_seed`.
    pub fn rng(&mut self) -> &mut Rng64 {
        &mut self.rng
    }

    /// Targets of the most recent `play`.
    pub fn last_animated(&self) -> &[Item] {
        &self.last_animated
    }

    pub fn report(&self) -> &RenderReport {
        &self.report
    }

    pub fn add(&mut self, items: &[Item]) {
        self.graph.add(items);
    }

    pub fn remove(&mut self, items: &[Item]) {
        self.graph.remove(items);
    }

    pub fn bring_to_front(&mut self, items: &[Item]) {
        self.graph.bring_to_front(items);
    }

    pub fn bring_to_back(&mut self, items: &[Item]) {
        self.graph.bring_to_back(items);
    }

    pub fn clear(&mut self) {
        self.graph.clear();
    }

    /// Skip the following operations until [`Self::revert_to_original_skipping_status`].
    pub fn force_skipping(&mut self) {
        self.original_skip = Some(self.skip);
        self.skip = true;
    }

    pub fn revert_to_original_skipping_status(&mut self) {
        if let Some(original) = self.original_skip.take()
            && !self.terminated
        {
            self.skip = original;
        }
    }

    /// Play `animations` together for the longest run time among them.
    ///
    /// The batch is validated before anything changes; an invalid batch opens no segment and
    /// does not count as an operation.
    #[tracing::instrument(skip_all, fields(index = self.num_plays, count = animations.len()))]
    pub fn play(&mut self, animations: Vec<Box<dyn Animation>>) -> WeaveResult<()> {
        if animations.is_empty() {
            return self.run_operation(|scene| {
                tracing::warn!(index = scene.num_plays, "play called with no animations");
                Ok(())
            });
        }
        let mut batch = Batch::new(animations)?;
        self.run_operation(move |scene| scene.play_batch(&mut batch))
    }

    /// Hold for `duration` seconds, running updaters.
    #[tracing::instrument(skip(self), fields(index = self.num_plays))]
    pub fn wait(&mut self, duration: f64) -> WeaveResult<()> {
        validate_duration(duration)?;
        self.run_operation(|scene| scene.hold(duration, None))
    }

    /// Hold until `stop` returns `true` (checked after every step) or `max_time` elapses.
    #[tracing::instrument(skip(self, stop), fields(index = self.num_plays))]
    pub fn wait_until(
        &mut self,
        mut stop: impl FnMut(&Scene) -> bool,
        max_time: f64,
    ) -> WeaveResult<()> {
        validate_duration(max_time)?;
        self.run_operation(|scene| scene.hold(max_time, Some(&mut stop)))
    }

    /// Place `clip` at the current scene time plus `time_offset`.
    pub fn add_sound(
        &mut self,
        clip: &AudioClip,
        time_offset: f64,
        gain: Option<f64>,
    ) -> WeaveResult<()> {
        self.add_sound_ducked(clip, time_offset, gain, None)
    }

    /// Like [`Self::add_sound`], also lowering the existing track under the clip by
    /// `gain_to_background` dB.
    pub fn add_sound_ducked(
        &mut self,
        clip: &AudioClip,
        time_offset: f64,
        gain: Option<f64>,
        gain_to_background: Option<f64>,
    ) -> WeaveResult<()> {
        let start = self.time + time_offset;
        self.audio
            .overlay_ducked(clip, start, gain, gain_to_background)
    }

    /// Resolve `name` through the configured [`SoundResolver`] and place it.
    pub fn add_sound_file(
        &mut self,
        name: &str,
        time_offset: f64,
        gain: Option<f64>,
        gain_to_background: Option<f64>,
    ) -> WeaveResult<()> {
        let Some(resolver) = self.sounds.as_ref() else {
            return Err(WeaveError::invalid_argument(format!(
                "cannot add sound '{name}': no sound resolver configured"
            )));
        };
        let clip = resolver.resolve(name)?;
        self.add_sound_ducked(&clip, time_offset, gain, gain_to_background)
    }

    /// Render the full current scene.
    pub fn capture_frame(&mut self) -> WeaveResult<Frame> {
        let members = self.graph.family_members();
        self.renderer.render(&members, None)
    }

    /// Run `construct`, then [`Self::finish`].
    ///
    /// Reaching `end_at_animation` stops construction early; everything encoded so far is still
    /// assembled.
    pub fn run(
        &mut self,
        construct: impl FnOnce(&mut Scene) -> WeaveResult<()>,
    ) -> WeaveResult<RenderReport> {
        match construct(self) {
            Ok(()) => {}
            Err(e) if e.is_early_termination() => {
                tracing::info!(num_plays = self.num_plays, "scene ended early");
                self.report.ended_early = true;
            }
            Err(e) => return Err(e),
        }
        self.finish()
    }

    /// Save the last frame if configured, assemble the movie and mux audio.
    #[tracing::instrument(skip_all, fields(scene = %self.config.name))]
    pub fn finish(&mut self) -> WeaveResult<RenderReport> {
        if let Some(path) = self.config.last_frame_path.clone() {
            let frame = self.capture_frame()?;
            save_png(&path, &frame)?;
            tracing::info!(path = %path.display(), "last frame saved");
        }

        let (start, end) = self.encoded_span.unwrap_or((0.0, self.time));
        let req = FinishRequest {
            audio: self.audio.includes_sound().then_some(&self.audio),
            range: SegmentRange::new(
                self.config.start_at_animation,
                self.config.end_at_animation,
            ),
            start_secs: start,
            duration_secs: end - start,
        };
        match self.sink.finish(req) {
            Ok(Some(path)) => {
                tracing::info!("File ready at {}", path.display());
                self.report.output = Some(path);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::error!(error = %e, "assembly failed, no output produced");
                return Err(e);
            }
        }

        tracing::info!("Played {} animations", self.num_plays);
        self.report.num_plays = self.num_plays;
        self.report.duration_secs = self.time;
        Ok(self.report.clone())
    }

    fn update_skipping_status(&mut self) -> WeaveResult<()> {
        if let Some(start) = self.config.start_at_animation
            && self.num_plays == start
            && !self.terminated
        {
            self.skip = false;
        }
        if let Some(end) = self.config.end_at_animation
            && self.num_plays >= end
        {
            self.skip = true;
            self.terminated = true;
            return Err(WeaveError::EarlyTermination);
        }
        Ok(())
    }

    /// One operation = one segment: open, run `body`, close.
    fn run_operation(
        &mut self,
        body: impl FnOnce(&mut Self) -> WeaveResult<()>,
    ) -> WeaveResult<()> {
        self.update_skipping_status()?;
        let index = self.num_plays;
        self.writing = !self.skip;
        self.segment_error = None;

        let opened = if self.writing {
            self.sink.begin_segment(SinkConfig {
                index,
                canvas: self.config.canvas,
                fps: self.config.fps,
            })
        } else {
            self.sink.skip_segment(index)
        };
        match opened {
            Ok(()) => {}
            // The operation still runs; its frames are dropped and the segment is reported
            // as failed when it closes.
            Err(e @ WeaveError::Encoding { .. }) if self.writing => self.segment_error = Some(e),
            Err(e @ WeaveError::Encoding { .. }) => {
                tracing::warn!(index, error = %e, "could not clear skipped segment");
            }
            Err(e) => return Err(e),
        }
        let started_at = self.time;

        if let Err(e) = body(self) {
            if self.writing {
                self.sink.abort_segment();
            }
            self.writing = false;
            return Err(e);
        }

        if self.writing {
            let (first, _) = self.encoded_span.unwrap_or((started_at, started_at));
            self.encoded_span = Some((first, self.time));
            let closed = match self.segment_error.take() {
                Some(e) => {
                    self.sink.abort_segment();
                    Err(e)
                }
                None => self.sink.end_segment(),
            };
            match closed {
                Ok(Some(seg)) => self.report.segments.push(seg),
                Ok(None) => {}
                Err(e @ WeaveError::Encoding { .. }) => {
                    tracing::error!(index, error = %e, "segment dropped, continuing without it");
                    self.report.failed_segments.push(index);
                }
                Err(e) => {
                    self.writing = false;
                    return Err(e);
                }
            }
        }

        self.writing = false;
        self.num_plays += 1;
        Ok(())
    }

    fn play_batch(&mut self, batch: &mut Batch) -> WeaveResult<()> {
        batch.begin_all()?;
        let targets = batch.targets();
        for target in &targets {
            if !self.graph.contains(target) {
                self.graph.add(std::slice::from_ref(target));
            }
        }

        let run_time = batch.run_time();
        if self.writing {
            let members = self.graph.family_members();
            let (fixed, moving) = partition_moving(&members, &targets);
            let background = self.renderer.render(&fixed, None)?;
            let progression = TimeProgression::new(run_time, self.config.fps);
            let bar = self.progress(
                progression.frame_count(),
                format!("Animation {}: {}", self.num_plays, batch.label()),
            );
            let start = self.time;
            let mut last_t = 0.0;
            for t in progression {
                let dt = t - last_t;
                last_t = t;
                batch.step(t, dt)?;
                self.update_items(dt);
                let frame = self.renderer.render(&moving, Some(&background))?;
                self.emit(&frame)?;
                self.time = start + t;
                bar.inc(1);
            }
            bar.finish_and_clear();
        } else {
            batch.step(run_time, run_time)?;
            self.time += run_time;
        }

        let removed = batch.finish_all()?;
        self.graph.remove(&removed);
        self.last_animated = targets;
        // Skipped batches never stepped the updaters, so catch them up in one go.
        self.update_items(if self.writing { 0.0 } else { run_time });
        Ok(())
    }

    fn hold(&mut self, duration: f64, mut stop: Option<StopCondition<'_>>) -> WeaveResult<()> {
        self.update_items(0.0);
        let fps = self.config.fps;
        let members = self.graph.family_members();
        let stepping = stop.is_some()
            || self.config.always_update
            || members.iter().any(Item::has_updaters);

        if stepping && (self.writing || stop.is_some()) {
            let (fixed, moving) = partition_moving(&members, &[]);
            let background = if self.writing {
                Some(self.renderer.render(&fixed, None)?)
            } else {
                None
            };
            let progression = TimeProgression::new(duration, fps);
            let bar = self.progress(
                progression.frame_count(),
                format!("Waiting {}", self.num_plays),
            );
            let dt = fps.frame_duration_secs();
            let start = self.time;
            for t in progression {
                self.update_items(dt);
                if let Some(bg) = background.as_ref() {
                    let frame = self.renderer.render(&moving, Some(bg))?;
                    self.emit(&frame)?;
                }
                self.time = start + t;
                bar.inc(1);
                if let Some(stop) = stop.as_mut()
                    && stop(self)
                {
                    tracing::debug!(at = self.time, "wait condition met");
                    break;
                }
            }
            bar.finish_and_clear();
        } else if stepping {
            self.update_items(duration);
            self.time += duration;
        } else if self.writing {
            // Nothing changes: render once and repeat the frame.
            let frame = self.renderer.render(&members, None)?;
            let n = fps.secs_to_frames_ceil(duration);
            let bar = self.progress(n, format!("Waiting {}", self.num_plays));
            for _ in 0..n {
                self.emit(&frame)?;
                bar.inc(1);
            }
            bar.finish_and_clear();
            self.time += fps.frames_to_secs(n);
        } else {
            self.time += duration;
        }
        Ok(())
    }

    fn update_items(&self, dt: f64) {
        for item in self.graph.items() {
            item.update(dt);
        }
    }

    /// Forward one frame to the open segment. After an encoding failure the rest of the
    /// segment's frames are dropped while the operation keeps advancing state.
    fn emit(&mut self, frame: &Frame) -> WeaveResult<()> {
        if !self.writing || self.segment_error.is_some() {
            return Ok(());
        }
        match self.sink.push_frame(frame) {
            Ok(()) => Ok(()),
            Err(e @ WeaveError::Encoding { .. }) => {
                self.segment_error = Some(e);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn progress(&self, len: u64, message: String) -> ProgressBar {
        if !self.config.show_progress || !self.writing {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{msg} [{bar:40.cyan/blue}] {pos}/{len} {elapsed_precise}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb.set_message(message);
        pb
    }
}

fn validate_duration(duration: f64) -> WeaveResult<()> {
    if !duration.is_finite() || duration < 0.0 {
        return Err(WeaveError::invalid_argument(format!(
            "duration must be finite and >= 0, got {duration}"
        )));
    }
    Ok(())
}

/// Save `frame` as a straight-alpha PNG.
pub fn save_png(path: &Path, frame: &Frame) -> WeaveResult<()> {
    use anyhow::Context as _;

    let mut data = frame.data.clone();
    if frame.premultiplied {
        unpremultiply_in_place(&mut data);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create image directory '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        path,
        &data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("failed to write png '{}'", path.display()))?;
    Ok(())
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("name", &self.config.name)
            .field("items", &self.graph.len())
            .field("time", &self.time)
            .field("num_plays", &self.num_plays)
            .field("skip", &self.skip)
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/driver.rs"]
mod tests;
