//! Runtime configuration of the force law and the population

use crate::constants::*;

/// What happens when a particle leaves `[-BOUNDS, BOUNDS]` on an axis
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundaryMode {
    /// Clamp to the wall and negate that velocity component
    #[default]
    Reflect = 0,
    /// Teleport to the opposite edge, keeping the overshoot and the velocity
    Wrap = 1,
}

impl BoundaryMode {
    pub fn toggled(self) -> Self {
        match self {
            BoundaryMode::Reflect => BoundaryMode::Wrap,
            BoundaryMode::Wrap => BoundaryMode::Reflect,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BoundaryMode::Reflect => "reflect",
            BoundaryMode::Wrap => "wrap",
        }
    }
}

/// Which radius feeds the repulsion exponent
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RadiusMode {
    /// Always [`ForceConfig::fixed_radius`], ignoring the Properties record
    #[default]
    Fixed = 0,
    /// The radius stored in the particle's Properties record
    PerParticle = 1,
}

/// Constants of the pairwise force law, handed to the kernel on every dispatch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceConfig {
    pub friction: f32,
    pub stiffness: f32,
    pub attraction_scale: f32,
    pub attraction_exponent: f32,
    pub distance_scale: f32,
    pub repulsion_exponent: f32,
    pub fixed_radius: f32,
    pub color_coupling: f32,
    pub pointer_scale: f32,
    pub max_speed: f32,
    pub bounds: f32,
    pub boundary: BoundaryMode,
    pub radius_mode: RadiusMode,
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            friction: FRICTION,
            stiffness: STIFFNESS,
            attraction_scale: ATTRACTION_SCALE,
            attraction_exponent: ATTRACTION_EXPONENT,
            distance_scale: DISTANCE_SCALE,
            repulsion_exponent: REPULSION_EXPONENT,
            fixed_radius: FIXED_RADIUS,
            color_coupling: COLOR_COUPLING,
            pointer_scale: POINTER_SCALE,
            max_speed: MAX_SPEED,
            bounds: BOUNDS,
            boundary: BoundaryMode::default(),
            radius_mode: RadiusMode::default(),
        }
    }
}

impl ForceConfig {
    /// Radius that enters the repulsion exponent for a particle whose
    /// Properties record stores `particle_radius`
    pub fn repulsion_radius(&self, particle_radius: f32) -> f32 {
        match self.radius_mode {
            RadiusMode::Fixed => self.fixed_radius,
            RadiusMode::PerParticle => particle_radius,
        }
    }
}

/// Everything needed to create a simulation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationConfig {
    pub particle_count: u32,
    /// Uniform gravity strength written into every Properties record
    pub gravity: f32,
    /// Uniform radius written into every Properties record
    pub radius: f32,
    pub force: ForceConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            particle_count: DEFAULT_PARTICLE_COUNT,
            gravity: DEFAULT_GRAVITY,
            radius: DEFAULT_RADIUS,
            force: ForceConfig::default(),
        }
    }
}
