//! Constants of the pairwise force law and the default population
//!
//! These are the stock values of [`crate::ForceConfig`] and
//! [`crate::SimulationConfig`]. The kernel never reads them directly; they are
//! copied into the configuration that is passed in at dispatch time.

/// Default number of particles
pub const DEFAULT_PARTICLE_COUNT: u32 = 20_000;

/// Velocity damping applied every step
pub const FRICTION: f32 = 0.9;

/// Multiplier of the repulsion term ("base stiffness")
pub const STIFFNESS: f32 = 100_000.0;

/// Multiplier of the attraction term
pub const ATTRACTION_SCALE: f32 = 2.5;

/// Exponent of the attraction term, `linear^0.2 - 1`
pub const ATTRACTION_EXPONENT: f32 = 0.2;

/// Squared distances are divided by this before the square root
pub const DISTANCE_SCALE: f32 = 8.0;

/// Numerator of the repulsion exponent, `(2 - linear)^(200 / radius)`
pub const REPULSION_EXPONENT: f32 = 200.0;

/// Radius used by the repulsion exponent unless per-particle radii are enabled
pub const FIXED_RADIUS: f32 = 1.0;

/// Scale of the color modulation, `cos(..) * 0.1`
pub const COLOR_COUPLING: f32 = 0.1;

/// Pointer influence scale
pub const POINTER_SCALE: f32 = 0.01;

/// Per-component speed limit applied after damping.
/// NaN components are reset to zero, infinities clamp to the limit.
pub const MAX_SPEED: f32 = 0.05;

/// Half extent of the square simulation domain, `[-1, 1]`
pub const BOUNDS: f32 = 1.0;

/// Gravity strength assigned to every particle at creation
pub const DEFAULT_GRAVITY: f32 = 0.000_01;

/// Radius assigned to every particle at creation
pub const DEFAULT_RADIUS: f32 = 1.0;

/// Radius of the seeding circle
pub const SEED_RADIUS: f32 = 0.5;
