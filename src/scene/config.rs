use crate::foundation::core::{Canvas, Fps, Quality, Rgba8};
use crate::foundation::error::{WeaveError, WeaveResult};
use std::path::PathBuf;

/// Scene-level settings.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Used for the movie file name and the partial-segment directory.
    pub name: String,
    pub canvas: Canvas,
    pub fps: Fps,
    /// Straight-alpha background color. Alpha 0 gives transparent `.mov` output.
    pub background: Rgba8,
    /// Start in skip mode: advance state and time without producing frames.
    pub skip_animations: bool,
    /// Step `wait` frame by frame even when nothing has updaters.
    pub always_update: bool,
    /// Seed for [`crate::scene::driver::Scene::rng`]. `None` uses seed 0.
    pub random_seed: Option<u64>,
    /// Skip every operation before this index.
    pub start_at_animation: Option<u64>,
    /// End the run once this many operations have been played.
    pub end_at_animation: Option<u64>,
    /// Draw a progress bar per operation.
    pub show_progress: bool,
    /// Save the final frame as PNG here when the scene finishes.
    pub last_frame_path: Option<PathBuf>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            name: "Scene".to_owned(),
            canvas: Quality::Low.canvas(),
            fps: Fps { num: 30, den: 1 },
            background: Rgba8::BLACK,
            skip_animations: false,
            always_update: false,
            random_seed: Some(0),
            start_at_animation: None,
            end_at_animation: None,
            show_progress: false,
            last_frame_path: None,
        }
    }
}

impl SceneConfig {
    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.canvas = quality.canvas();
        self.fps = quality.fps();
        self
    }

    pub fn validate(&self) -> WeaveResult<()> {
        if self.name.trim().is_empty() {
            return Err(WeaveError::invalid_argument("scene name must not be empty"));
        }
        if self.name.contains(['/', '\\']) {
            return Err(WeaveError::invalid_argument(format!(
                "scene name '{}' must not contain path separators",
                self.name
            )));
        }
        self.canvas.validate()?;
        Fps::new(self.fps.num, self.fps.den)?;
        if let (Some(start), Some(end)) = (self.start_at_animation, self.end_at_animation)
            && end <= start
        {
            return Err(WeaveError::invalid_argument(format!(
                "end_at_animation ({end}) must be greater than start_at_animation ({start})"
            )));
        }
        Ok(())
    }
}

/// Movie writer settings.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct WriterConfig {
    /// Root of the output tree.
    pub media_dir: PathBuf,
    /// `.mp4` (flattened, libx264) or `.mov` (alpha kept, qtrle).
    pub movie_extension: String,
    /// AAC bitrate used when muxing audio.
    pub audio_bitrate: String,
    /// Keep segment files after a successful assembly.
    pub keep_partial_files: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            media_dir: PathBuf::from("media"),
            movie_extension: ".mp4".to_owned(),
            audio_bitrate: "320k".to_owned(),
            keep_partial_files: true,
        }
    }
}

impl WriterConfig {
    pub const EXTENSIONS: [&'static str; 2] = [".mp4", ".mov"];

    pub fn validate(&self) -> WeaveResult<()> {
        if !Self::EXTENSIONS.contains(&self.movie_extension.as_str()) {
            return Err(WeaveError::invalid_argument(format!(
                "unsupported movie extension '{}' (expected one of {:?})",
                self.movie_extension,
                Self::EXTENSIONS
            )));
        }
        if self.audio_bitrate.trim().is_empty() {
            return Err(WeaveError::invalid_argument("audio_bitrate must not be empty"));
        }
        Ok(())
    }

    /// `.mov` output keeps the alpha channel.
    pub fn keeps_alpha(&self) -> bool {
        self.movie_extension == ".mov"
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/config.rs"]
mod tests;
