//! The seam between the step orchestration and whatever runs the kernel

use swarm_physics::{ForceConfig, GridLayout, ParticleBuffers, ParticleRecord, PointerInput};

use crate::SimulationError;

/// Everything one kernel invocation reads besides the current state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepInputs {
    pub config: ForceConfig,
    pub pointer: PointerInput,
}

/// A data-parallel executor owning a double-buffered particle state.
///
/// `dispatch` binds the current half as input and the next half as output,
/// runs one lane per grid cell and returns once every write has landed (or
/// is ordered before any later use of the buffers). It never flips parity;
/// that is `swap`'s job.
pub trait ComputeBackend {
    fn name(&self) -> &'static str;

    fn layout(&self) -> GridLayout;

    fn dispatch(&mut self, inputs: &StepInputs) -> Result<(), SimulationError>;

    fn swap(&mut self);

    /// Rewrites both halves from `seed`; parity is irrelevant afterwards
    fn reseed(&mut self, seed: &dyn Fn(u32) -> Option<ParticleRecord>) -> Result<(), SimulationError>;

    /// Host copy of the current half
    fn snapshot(&self) -> Result<ParticleBuffers, SimulationError>;
}
