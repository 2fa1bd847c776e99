//! # Swarm Renderer
//!
//! Instanced point rendering of the color swarm, reading the simulation's
//! storage buffers in place.

pub mod renderer;

pub use renderer::*;
