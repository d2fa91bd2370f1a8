//! Segment encoding, frame sinks and final assembly.

/// Segment concatenation and audio muxing.
pub mod assemble;
/// `ffmpeg`-backed media tool.
pub mod ffmpeg;
/// One encoder process per segment, with atomic materialization.
pub mod segment;
/// Frame sink trait and built-in sinks.
pub mod sink;
/// External encoder/muxer boundary.
pub mod tool;
/// Movie writer: segment files plus final assembly.
pub mod writer;
