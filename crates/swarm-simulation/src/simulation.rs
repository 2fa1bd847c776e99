//! Step orchestration
//!
//! A [`Simulation`] owns one backend and advances it one tick per
//! [`Simulation::step`]. Steps are strictly sequential through `&mut self`;
//! a failed dispatch leaves the published state and the frame counter as
//! they were.

use swarm_physics::{
    ForceConfig, GridLayout, ParticleBuffers, PointerInput, SimulationConfig, config_seed,
};

use crate::{ComputeBackend, CpuBackend, GpuBackend, SimulationError, StepInputs};

pub struct Simulation<B: ComputeBackend> {
    backend: B,
    config: SimulationConfig,
    frame: u64,
}

impl<B: ComputeBackend> Simulation<B> {
    pub fn new(backend: B, config: SimulationConfig) -> Self {
        let layout = backend.layout();
        log::info!(
            "Simulation ready on {} backend: {} particles, {}x{} grid, {} boundary",
            backend.name(),
            layout.count(),
            layout.side(),
            layout.side(),
            config.force.boundary.label()
        );
        Self {
            backend,
            config,
            frame: 0,
        }
    }

    /// Advance by exactly one tick
    pub fn step(&mut self, pointer: PointerInput) -> Result<(), SimulationError> {
        let inputs = StepInputs {
            config: self.config.force,
            pointer,
        };

        if let Err(error) = self.backend.dispatch(&inputs) {
            log::error!("Step {} failed: {}", self.frame + 1, error);
            return Err(error);
        }
        self.backend.swap();
        self.frame += 1;

        if pointer.is_engaged() {
            log::trace!(
                "Step {} done (pointer {:.3}, {:.3}, strength {})",
                self.frame,
                pointer.x,
                pointer.y,
                pointer.strength
            );
        } else {
            log::trace!("Step {} done", self.frame);
        }
        Ok(())
    }

    /// Host copy of the published state
    pub fn read(&self) -> Result<ParticleBuffers, SimulationError> {
        self.backend.snapshot()
    }

    /// Reseed both halves to the creation layout and restart the frame count
    pub fn reset(&mut self) -> Result<(), SimulationError> {
        self.backend.reseed(&config_seed(&self.config))?;
        self.frame = 0;
        log::info!("Simulation reset");
        Ok(())
    }

    /// Takes effect on the next step. The population is fixed at creation.
    pub fn set_config(&mut self, force: ForceConfig) {
        if force != self.config.force {
            log::debug!("Force config updated: {:?}", force);
        }
        self.config.force = force;
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Completed steps since creation or the last reset
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn layout(&self) -> GridLayout {
        self.backend.layout()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl Simulation<CpuBackend> {
    pub fn cpu(config: SimulationConfig) -> Result<Self, SimulationError> {
        let backend = CpuBackend::new(GridLayout::new(config.particle_count), config_seed(&config))?;
        Ok(Self::new(backend, config))
    }
}

impl Simulation<GpuBackend> {
    pub fn gpu(
        device: wgpu::Device,
        queue: wgpu::Queue,
        config: SimulationConfig,
    ) -> Result<Self, SimulationError> {
        let backend = GpuBackend::new(
            device,
            queue,
            GridLayout::new(config.particle_count),
            config_seed(&config),
        )?;
        Ok(Self::new(backend, config))
    }
}
