//! Sketch-to-image generation pipeline.

mod generate;

pub use generate::{Config, Generated, Pipeline};
