//! sceneweave plays programmatic animation scenes into video.
//!
//! A [`Scene`] owns an ordered list of [`Item`]s and a logical clock. Every `play` or `wait`
//! call is one operation: its frames are rendered on the calling thread and streamed into one
//! segment of the active [`FrameSink`]. When the scene finishes, the [`MovieWriter`] sink
//! concatenates the surviving segments and muxes the mixed audio track.
//!
//! - Build items and animations in Rust, or load a declarative [`Script`]
//! - Render with the `vello_cpu` backend ([`CpuRenderer`])
//! - Encode through system `ffmpeg` ([`FfmpegTool`])
#![forbid(unsafe_code)]

mod foundation;

/// Animations, rate functions and the batch scheduler.
pub mod animation;
/// Audio clips and the mixed master track.
pub mod audio;
/// Segment encoding and final assembly.
pub mod encode;
/// Frames, the renderer contract and the CPU backend.
pub mod render;
/// Scene graph, items and the scene driver.
pub mod scene;
/// Declarative JSON scripts.
pub mod script;

pub use crate::foundation::core::{Affine, Canvas, Fps, Quality, Rgba8, Transform2D, Vec2};
pub use crate::foundation::error::{WeaveError, WeaveResult};
pub use crate::foundation::rng::Rng64;

pub use crate::animation::anim::{Animation, Lerp};
pub use crate::animation::ease::RateFunc;
pub use crate::animation::transform::Transform;
pub use crate::audio::clip::AudioClip;
pub use crate::audio::decode::{FfmpegSoundResolver, SoundResolver};
pub use crate::audio::timeline::AudioTimeline;
pub use crate::encode::ffmpeg::FfmpegTool;
pub use crate::encode::sink::{FrameSink, InMemorySink, NullSink, SinkConfig};
pub use crate::encode::tool::MediaTool;
pub use crate::encode::writer::MovieWriter;
pub use crate::render::backend::{Frame, Renderer};
pub use crate::render::cpu::{CpuRenderer, CpuRendererOpts};
pub use crate::scene::config::{SceneConfig, WriterConfig};
pub use crate::scene::driver::{RenderReport, Scene};
pub use crate::scene::item::{Item, ItemId, ItemState, Shape, Updater};
pub use crate::script::model::Script;
