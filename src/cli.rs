use clap::{Parser, ValueEnum};
use swarm_physics::{
    BoundaryMode, DEFAULT_GRAVITY, DEFAULT_PARTICLE_COUNT, ForceConfig, FRICTION, MAX_SPEED,
    POINTER_SCALE, RadiusMode, STIFFNESS, SimulationConfig,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Boundary {
    Reflect,
    Wrap,
}

impl From<Boundary> for BoundaryMode {
    fn from(boundary: Boundary) -> Self {
        match boundary {
            Boundary::Reflect => BoundaryMode::Reflect,
            Boundary::Wrap => BoundaryMode::Wrap,
        }
    }
}

/// Interactive GPU particle swarm
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Number of particles
    #[arg(short, long, default_value_t = DEFAULT_PARTICLE_COUNT)]
    pub particles: u32,

    /// Velocity damping applied every step
    #[arg(long, default_value_t = FRICTION)]
    pub friction: f32,

    /// What happens at the edge of the domain
    #[arg(long, value_enum, default_value_t = Boundary::Reflect)]
    pub boundary: Boundary,

    /// Strength of the pointer attractor/repeller
    #[arg(long, default_value_t = POINTER_SCALE)]
    pub pointer_scale: f32,

    /// Base stiffness of the short-range repulsion
    #[arg(long, default_value_t = STIFFNESS)]
    pub stiffness: f32,

    /// Gravity written into every particle
    #[arg(long, default_value_t = DEFAULT_GRAVITY)]
    pub gravity: f32,

    /// Per-component velocity limit
    #[arg(long, default_value_t = MAX_SPEED)]
    pub max_speed: f32,

    /// Use each particle's own radius in the repulsion exponent
    #[arg(long)]
    pub per_particle_radius: bool,
}

impl Args {
    pub fn simulation_config(&self) -> SimulationConfig {
        let radius_mode = if self.per_particle_radius {
            RadiusMode::PerParticle
        } else {
            RadiusMode::Fixed
        };

        SimulationConfig {
            particle_count: self.particles,
            gravity: self.gravity,
            force: ForceConfig {
                friction: self.friction,
                stiffness: self.stiffness,
                pointer_scale: self.pointer_scale,
                max_speed: self.max_speed,
                boundary: self.boundary.into(),
                radius_mode,
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_simulation_defaults() {
        let args = Args::try_parse_from(["chroma-swarm"]).unwrap();
        assert_eq!(args.simulation_config(), SimulationConfig::default());
    }

    #[test]
    fn test_flags_override_config() {
        let args = Args::try_parse_from([
            "chroma-swarm",
            "--particles",
            "512",
            "--friction",
            "0.5",
            "--boundary",
            "wrap",
            "--per-particle-radius",
        ])
        .unwrap();
        let config = args.simulation_config();

        assert_eq!(config.particle_count, 512);
        assert_eq!(config.force.friction, 0.5);
        assert_eq!(config.force.boundary, BoundaryMode::Wrap);
        assert_eq!(config.force.radius_mode, RadiusMode::PerParticle);
        assert_eq!(config.force.stiffness, STIFFNESS);
    }

    #[test]
    fn test_unknown_boundary_rejected() {
        assert!(Args::try_parse_from(["chroma-swarm", "--boundary", "bounce"]).is_err());
    }
}
