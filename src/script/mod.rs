//! Declarative JSON scenes: item declarations plus an ordered list of operations.

pub mod model;
pub mod run;
