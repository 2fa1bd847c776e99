//! Error taxonomy of the simulation
//!
//! Everything here is fatal for the run. Numeric degeneracy inside the kernel
//! is not an error; it is absorbed by the velocity stabilization.

use swarm_physics::StateError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    State(#[from] StateError),

    #[error("a {side}x{side} grid needs {bytes} bytes per buffer, backend limit is {limit}")]
    Allocation { side: u32, bytes: u64, limit: u64 },

    #[error("no compatible GPU adapter found")]
    NoAdapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to create GPU device: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),

    #[error("GPU out of memory while allocating particle buffers: {0}")]
    OutOfMemory(String),

    #[error("failed to build the step pipeline: {0}")]
    Pipeline(String),

    #[error("step dispatch rejected by the backend: {0}")]
    Dispatch(String),

    #[error("failed to read particle state back: {0}")]
    Readback(String),
}
