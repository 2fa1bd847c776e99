//! # Swarm Simulation
//!
//! Runs the color swarm one tick at a time on a [`ComputeBackend`]: a rayon
//! CPU backend that executes the reference kernel directly, and a wgpu
//! compute backend running the same law in WGSL.

pub mod backend;
pub mod cpu;
pub mod error;
pub mod gpu;
pub mod params;
pub mod simulation;

pub use backend::*;
pub use cpu::*;
pub use error::*;
pub use gpu::*;
pub use params::*;
pub use simulation::*;
