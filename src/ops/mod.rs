pub mod adjustments;
pub mod pipeline;
pub mod strategy;

pub use pipeline::{render, AdjustmentState};
pub use strategy::{AdjustmentStrategy, FastStrategy, ProcessingStrategy, SlowStrategy};
