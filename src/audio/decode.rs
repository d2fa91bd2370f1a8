use crate::audio::clip::AudioClip;
use crate::foundation::error::{WeaveError, WeaveResult};
use std::path::{Path, PathBuf};

/// Resolves a sound identifier to decoded PCM.
pub trait SoundResolver {
    fn resolve(&self, name: &str) -> WeaveResult<AudioClip>;
}

/// Resolver that looks up files under `root` and decodes them with `ffmpeg`.
#[derive(Clone, Debug)]
pub struct FfmpegSoundResolver {
    root: PathBuf,
    sample_rate: u32,
}

impl FfmpegSoundResolver {
    /// Extensions tried, in order, when `name` does not exist as given.
    pub const EXTENSIONS: [&'static str; 3] = ["", ".wav", ".mp3"];

    pub fn new(root: impl Into<PathBuf>, sample_rate: u32) -> Self {
        Self {
            root: root.into(),
            sample_rate,
        }
    }

    /// First existing candidate for `name`.
    pub fn locate(&self, name: &str) -> WeaveResult<PathBuf> {
        let base = if Path::new(name).is_absolute() {
            PathBuf::from(name)
        } else {
            self.root.join(name)
        };
        for ext in Self::EXTENSIONS {
            let mut candidate = base.clone().into_os_string();
            candidate.push(ext);
            let candidate = PathBuf::from(candidate);
            if candidate.is_file() {
                return Ok(candidate);
            }
        }
        Err(WeaveError::invalid_argument(format!(
            "sound '{name}' not found under '{}'",
            self.root.display()
        )))
    }
}

impl SoundResolver for FfmpegSoundResolver {
    fn resolve(&self, name: &str) -> WeaveResult<AudioClip> {
        let path = self.locate(name)?;
        decode_audio_f32_stereo(&path, self.sample_rate)
    }
}

/// Decode any audio file `ffmpeg` understands to interleaved stereo `f32`.
pub fn decode_audio_f32_stereo(path: &Path, sample_rate: u32) -> WeaveResult<AudioClip> {
    let out = std::process::Command::new("ffmpeg")
        .args(["-v", "error", "-i"])
        .arg(path)
        .args([
            "-vn",
            "-f",
            "f32le",
            "-acodec",
            "pcm_f32le",
            "-ac",
            "2",
            "-ar",
            &sample_rate.to_string(),
            "pipe:1",
        ])
        .output()
        .map_err(|e| WeaveError::render(format!("failed to run ffmpeg for audio decode: {e}")))?;

    if !out.status.success() {
        let msg = String::from_utf8_lossy(&out.stderr);
        return Err(WeaveError::invalid_argument(format!(
            "ffmpeg audio decode failed for '{}': {}",
            path.display(),
            msg.trim()
        )));
    }

    if !out.stdout.len().is_multiple_of(8) {
        return Err(WeaveError::render(
            "decoded audio byte length is not aligned to stereo f32 frames",
        ));
    }
    let mut pcm = Vec::<f32>::with_capacity(out.stdout.len() / 4);
    for chunk in out.stdout.chunks_exact(4) {
        pcm.push(f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
    }
    AudioClip::new(sample_rate, 2, pcm)
}

#[cfg(test)]
#[path = "../../tests/unit/audio/decode.rs"]
mod tests;
