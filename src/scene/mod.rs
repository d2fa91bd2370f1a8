//! Scene graph, items and the scene driver.

/// Scene and writer configuration.
pub mod config;
/// Scene driver: `play`, `wait`, sounds and final assembly.
pub mod driver;
/// Ordered top-level item list with family-aware restructuring.
pub mod graph;
/// Items, render state and updaters.
pub mod item;
