//! Audio clips, the mixed master timeline and WAV export.

/// Decoded PCM clips and layout conversion.
pub mod clip;
/// Sound lookup and `ffmpeg` decoding.
pub mod decode;
/// Master track mixing.
pub mod timeline;
/// 16-bit PCM WAV encoding.
pub mod wav;
