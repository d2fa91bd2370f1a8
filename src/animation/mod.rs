//! Animations, rate functions and the batch scheduler.

/// Interpolation trait and the animation lifecycle contract.
pub mod anim;
/// Rate functions.
pub mod ease;
/// Batch lifecycle and moving/static partitioning.
pub mod scheduler;
/// Per-operation timestamp sequences.
pub mod time;
/// Family-wide transforms and the stock animations built on them.
pub mod transform;
