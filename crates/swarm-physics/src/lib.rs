//! # Swarm Physics
//!
//! Backend-independent core of the color swarm: particle records, the grid
//! that stores them, double-buffered state, the pairwise force law and the
//! pointer adapter. The CPU kernel in [`forces`] is the reference the GPU
//! kernel is checked against.

pub mod config;
pub mod constants;
pub mod forces;
pub mod grid;
pub mod particle;
pub mod pointer;
pub mod state;

pub use config::*;
pub use constants::*;
pub use forces::*;
pub use grid::*;
pub use particle::*;
pub use pointer::*;
pub use state::*;
