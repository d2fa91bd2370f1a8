use crate::foundation::error::{WeaveError, WeaveResult};
use crate::foundation::math::db_to_amplitude;
use std::sync::Arc;

/// Decoded PCM clip, interleaved `f32` samples.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioClip {
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Arc<Vec<f32>>,
}

impl AudioClip {
    pub fn new(sample_rate: u32, channels: u16, samples: Vec<f32>) -> WeaveResult<Self> {
        if sample_rate == 0 {
            return Err(WeaveError::invalid_argument(
                "audio clip sample_rate must be non-zero",
            ));
        }
        if channels == 0 {
            return Err(WeaveError::invalid_argument(
                "audio clip channels must be non-zero",
            ));
        }
        if !samples.len().is_multiple_of(usize::from(channels)) {
            return Err(WeaveError::invalid_argument(format!(
                "audio clip has {} samples, not a multiple of {channels} channels",
                samples.len()
            )));
        }
        Ok(Self {
            sample_rate,
            channels,
            samples: Arc::new(samples),
        })
    }

    /// Silent clip lasting `secs` (rounded to whole sample frames).
    pub fn silence(secs: f64, sample_rate: u32, channels: u16) -> WeaveResult<Self> {
        let frames = secs_to_frames(secs, sample_rate);
        Self::new(
            sample_rate,
            channels,
            vec![0.0; frames * usize::from(channels)],
        )
    }

    /// Sine tone, mostly for tests and demos.
    pub fn tone(freq_hz: f64, secs: f64, sample_rate: u32, amplitude: f32) -> WeaveResult<Self> {
        let frames = secs_to_frames(secs, sample_rate);
        let mut samples = Vec::with_capacity(frames);
        for i in 0..frames {
            let t = i as f64 / f64::from(sample_rate);
            samples.push(amplitude * (std::f64::consts::TAU * freq_hz * t).sin() as f32);
        }
        Self::new(sample_rate, 1, samples)
    }

    /// Number of sample frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.samples.len() / usize::from(self.channels)
    }

    pub fn duration_secs(&self) -> f64 {
        self.frames() as f64 / f64::from(self.sample_rate)
    }

    /// Copy with every sample scaled by `db` decibels.
    pub fn with_gain_db(&self, db: f64) -> Self {
        let amp = db_to_amplitude(db);
        Self {
            sample_rate: self.sample_rate,
            channels: self.channels,
            samples: Arc::new(self.samples.iter().map(|s| s * amp).collect()),
        }
    }

    /// Convert to `sample_rate`/`channels` with linear resampling.
    ///
    /// Mono is duplicated to every output channel; other layouts map channel `c` to
    /// `c % source_channels`, except stereo-or-wider to mono, which averages.
    pub fn to_layout(&self, sample_rate: u32, channels: u16) -> WeaveResult<Self> {
        if sample_rate == 0 || channels == 0 {
            return Err(WeaveError::invalid_argument(
                "target sample_rate/channels must be non-zero",
            ));
        }
        if sample_rate == self.sample_rate && channels == self.channels {
            return Ok(self.clone());
        }

        let src_ch = usize::from(self.channels);
        let dst_ch = usize::from(channels);
        let src_frames = self.frames();
        let ratio = f64::from(self.sample_rate) / f64::from(sample_rate);
        let dst_frames = ((src_frames as f64) / ratio).round() as usize;

        let read = |frame: usize, ch: usize| -> f32 {
            let base = frame * src_ch;
            if dst_ch == 1 && src_ch > 1 {
                self.samples[base..base + src_ch].iter().sum::<f32>() / src_ch as f32
            } else {
                self.samples[base + ch % src_ch]
            }
        };

        let mut out = Vec::with_capacity(dst_frames * dst_ch);
        for i in 0..dst_frames {
            let pos = i as f64 * ratio;
            let f0 = (pos.floor() as usize).min(src_frames.saturating_sub(1));
            let f1 = (f0 + 1).min(src_frames.saturating_sub(1));
            let frac = (pos - f0 as f64).clamp(0.0, 1.0) as f32;
            for ch in 0..dst_ch {
                let v0 = read(f0, ch);
                let v1 = read(f1, ch);
                out.push(v0 + (v1 - v0) * frac);
            }
        }
        Self::new(sample_rate, channels, out)
    }
}

pub(crate) fn secs_to_frames(secs: f64, sample_rate: u32) -> usize {
    if !secs.is_finite() || secs <= 0.0 {
        return 0;
    }
    (secs * f64::from(sample_rate)).round() as usize
}

#[cfg(test)]
#[path = "../../tests/unit/audio/clip.rs"]
mod tests;
