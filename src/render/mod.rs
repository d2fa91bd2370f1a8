//! Rendering collaborators: frame type, renderer trait and the `vello_cpu` backend.

/// Frame buffer type and the [`backend::Renderer`] contract.
pub mod backend;
/// Premultiplied RGBA8 compositing helpers.
pub mod composite;
/// CPU renderer powered by `vello_cpu`.
pub mod cpu;
