//! Multi-threaded CPU backend
//!
//! Each grid cell is one rayon task running [`step_particle`] against the
//! shared current half. Lanes only ever write their own cell of the next
//! half, so no synchronization is needed inside a dispatch.

use rayon::prelude::*;
use swarm_physics::{
    create_state, step_particle, GridLayout, ParticleBuffers, ParticleRecord, ParticleState,
};

use crate::{ComputeBackend, SimulationError, StepInputs};

pub struct CpuBackend {
    layout: GridLayout,
    state: ParticleState,
}

impl CpuBackend {
    pub fn new(
        layout: GridLayout,
        seed: impl Fn(u32) -> Option<ParticleRecord>,
    ) -> Result<Self, SimulationError> {
        let state = create_state(&layout, seed)?;
        log::info!(
            "CPU backend ready: {} particles, {} worker threads",
            layout.count(),
            rayon::current_num_threads()
        );
        Ok(Self { layout, state })
    }

    pub fn state(&self) -> &ParticleState {
        &self.state
    }

    /// Direct access to the write side, for injecting state between steps
    pub fn next_mut(&mut self) -> &mut ParticleBuffers {
        self.state.next_mut()
    }
}

impl ComputeBackend for CpuBackend {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn layout(&self) -> GridLayout {
        self.layout
    }

    fn dispatch(&mut self, inputs: &StepInputs) -> Result<(), SimulationError> {
        let layout = self.layout;
        let (current, next) = self.state.split();

        next.transforms
            .par_iter_mut()
            .zip(next.colors.par_iter_mut())
            .zip(next.properties.par_iter_mut())
            .enumerate()
            .filter(|(index, _)| layout.is_active(*index))
            .for_each(|(index, ((transform, color), properties))| {
                *transform =
                    step_particle(index, current, &layout, &inputs.pointer, &inputs.config);
                *color = current.colors[index];
                *properties = current.properties[index];
            });

        Ok(())
    }

    fn swap(&mut self) {
        self.state.swap();
    }

    fn reseed(&mut self, seed: &dyn Fn(u32) -> Option<ParticleRecord>) -> Result<(), SimulationError> {
        self.state = create_state(&self.layout, seed)?;
        Ok(())
    }

    fn snapshot(&self) -> Result<ParticleBuffers, SimulationError> {
        Ok(self.state.current().clone())
    }
}
