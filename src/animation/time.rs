use crate::foundation::core::Fps;

/// Sample timestamps for one `play`/`wait` operation: `k / fps` for `k = 1..=n`, where `n`
/// covers `duration` rounding partial frames up.
///
/// Each operation builds its own progression, starting again from zero.
#[derive(Clone, Debug)]
pub struct TimeProgression {
    fps: Fps,
    next: u64,
    len: u64,
}

impl TimeProgression {
    pub fn new(duration: f64, fps: Fps) -> Self {
        Self {
            fps,
            next: 1,
            len: fps.secs_to_frames_ceil(duration),
        }
    }

    /// Total number of timestamps, including any already yielded.
    pub fn frame_count(&self) -> u64 {
        self.len
    }
}

impl Iterator for TimeProgression {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        if self.next > self.len {
            return None;
        }
        let t = self.fps.timestamp(self.next);
        self.next += 1;
        Some(t)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rem = (self.len + 1).saturating_sub(self.next) as usize;
        (rem, Some(rem))
    }
}

impl ExactSizeIterator for TimeProgression {}

#[cfg(test)]
#[path = "../../tests/unit/animation/time.rs"]
mod tests;
