use crate::audio::clip::{AudioClip, secs_to_frames};
use crate::audio::wav::write_wav_pcm16;
use crate::foundation::error::{WeaveError, WeaveResult};
use crate::foundation::math::db_to_amplitude;
use std::path::Path;

/// Sample rate of the mixed master track.
pub const MIX_SAMPLE_RATE: u32 = 48_000;
/// Channel count of the mixed master track.
pub const MIX_CHANNELS: u16 = 2;

/// Master audio track built by overlaying timed clips.
///
/// Mixing is additive; the track only grows, so its duration always covers every placement made
/// so far.
#[derive(Clone, Debug, Default)]
pub struct AudioTimeline {
    samples: Vec<f32>,
    placements: usize,
}

impl AudioTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` once any clip has been overlaid.
    pub fn includes_sound(&self) -> bool {
        self.placements > 0
    }

    pub fn placements(&self) -> usize {
        self.placements
    }

    /// Interleaved stereo samples at [`MIX_SAMPLE_RATE`].
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn frames(&self) -> usize {
        self.samples.len() / usize::from(MIX_CHANNELS)
    }

    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / f64::from(MIX_SAMPLE_RATE)
    }

    /// Extend with trailing silence so the track lasts at least `secs`.
    pub fn pad_to(&mut self, secs: f64) {
        self.ensure_frames(secs_to_frames(secs, MIX_SAMPLE_RATE));
    }

    /// The track from `start` seconds on, shifted so `start` becomes time zero.
    pub fn starting_at(&self, start: f64) -> Self {
        let ch = usize::from(MIX_CHANNELS);
        let head = (secs_to_frames(start, MIX_SAMPLE_RATE) * ch).min(self.samples.len());
        Self {
            samples: self.samples[head..].to_vec(),
            placements: self.placements,
        }
    }

    /// Mix `clip` in at `start` seconds, optionally scaled by `gain_db`.
    pub fn overlay(
        &mut self,
        clip: &AudioClip,
        start: f64,
        gain_db: Option<f64>,
    ) -> WeaveResult<()> {
        self.overlay_ducked(clip, start, gain_db, None)
    }

    /// Like [`Self::overlay`], also attenuating the existing track under the clip's span by
    /// `gain_to_background` dB.
    #[tracing::instrument(skip(self, clip), fields(clip_secs = clip.duration_secs()))]
    pub fn overlay_ducked(
        &mut self,
        clip: &AudioClip,
        start: f64,
        gain_db: Option<f64>,
        gain_to_background: Option<f64>,
    ) -> WeaveResult<()> {
        if !start.is_finite() || start < 0.0 {
            return Err(WeaveError::invalid_argument(format!(
                "audio start time must be >= 0, got {start}"
            )));
        }
        for (label, g) in [("gain", gain_db), ("gain_to_background", gain_to_background)] {
            if let Some(g) = g
                && !g.is_finite()
            {
                return Err(WeaveError::invalid_argument(format!(
                    "audio {label} must be finite, got {g}"
                )));
            }
        }

        let clip = clip.to_layout(MIX_SAMPLE_RATE, MIX_CHANNELS)?;
        let start_frame = secs_to_frames(start, MIX_SAMPLE_RATE);
        let end_frame = start_frame + clip.frames();
        self.ensure_frames(end_frame);

        let ch = usize::from(MIX_CHANNELS);
        let span = &mut self.samples[start_frame * ch..end_frame * ch];
        if let Some(bg) = gain_to_background {
            let amp = db_to_amplitude(bg);
            span.iter_mut().for_each(|s| *s *= amp);
        }
        let amp = gain_db.map(db_to_amplitude).unwrap_or(1.0);
        for (dst, src) in span.iter_mut().zip(clip.samples.iter()) {
            *dst += src * amp;
        }
        self.placements += 1;
        tracing::debug!(start, end = end_frame as f64 / f64::from(MIX_SAMPLE_RATE), "sound placed");
        Ok(())
    }

    /// Write the track as 16-bit PCM WAV, padded with silence to at least `final_secs`.
    ///
    /// Samples are clamped to `[-1, 1]`.
    pub fn export_wav(&self, path: &Path, final_secs: f64) -> WeaveResult<()> {
        let mut padded = self.clone();
        padded.pad_to(final_secs);
        write_wav_pcm16(path, &padded.samples, MIX_SAMPLE_RATE, MIX_CHANNELS)
    }

    fn ensure_frames(&mut self, frames: usize) {
        let want = frames * usize::from(MIX_CHANNELS);
        if self.samples.len() < want {
            self.samples.resize(want, 0.0);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/timeline.rs"]
mod tests;
