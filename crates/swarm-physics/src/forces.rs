//! Pairwise force law and per-particle integration
//!
//! NOTE: This is the reference implementation used by the CPU backend and by
//! tests. The GPU backend runs the same law in `swarm_step.wgsl`; the two must
//! be kept in sync.

use glam::{Vec2, Vec3};

use crate::config::{BoundaryMode, ForceConfig};
use crate::grid::GridLayout;
use crate::particle::{Color, Transform};
use crate::pointer::PointerInput;
use crate::state::ParticleBuffers;

/// Signed force magnitude for an offset `direction` between two points.
///
/// Negative values attract (the `linear^0.2 - 1` term dominates far away),
/// positive values repel. The repulsion term grows as `(2 - linear)^(200 /
/// radius)` and overflows `f32` for most in-domain distances; the result is
/// then `+inf`, which the velocity stabilization later absorbs.
pub fn force_magnitude(direction: Vec2, radius: f32, config: &ForceConfig) -> f32 {
    let linear = (direction.length_squared() / config.distance_scale).sqrt();
    let attraction = linear.powf(config.attraction_exponent) - 1.0;
    let repulsion = (2.0 - linear).powf(config.repulsion_exponent / radius);
    attraction * config.attraction_scale + repulsion * config.stiffness
}

/// Periodic modulation of the force by color dissimilarity.
///
/// The other color is rotated by channel order (`gbr + brg`) before being
/// compared with the own color, a cheap stand-in for a real color distance.
pub fn color_affinity(own: &Color, other: &Color, config: &ForceConfig) -> f32 {
    let other = other.rgb();
    let rotated = Vec3::new(other.y, other.z, other.x) + Vec3::new(other.z, other.x, other.y);
    (rotated - own.rgb()).length().cos() * config.color_coupling
}

/// Velocity change that particle `j` induces on particle `i`.
///
/// Coincident particles (including `i == j`) contribute exactly zero.
pub fn pair_velocity_delta(
    position: Vec2,
    color: &Color,
    gravity: f32,
    radius: f32,
    other_position: Vec2,
    other_color: &Color,
    config: &ForceConfig,
) -> Vec2 {
    let direction = position - other_position;
    if direction == Vec2::ZERO {
        return Vec2::ZERO;
    }

    let magnitude = force_magnitude(direction, radius, config);
    let affinity = color_affinity(color, other_color, config);
    direction * (magnitude * gravity) * affinity
}

/// Velocity change induced by the pointer, zero when it is not engaged
pub fn pointer_velocity_delta(
    position: Vec2,
    radius: f32,
    pointer: &PointerInput,
    config: &ForceConfig,
) -> Vec2 {
    if pointer.strength == 0.0 {
        return Vec2::ZERO;
    }

    let offset = position - pointer.position();
    let distance = offset.length();
    if distance == 0.0 {
        return Vec2::ZERO;
    }

    let magnitude = force_magnitude(offset, radius, config);
    (offset / distance) * magnitude * pointer.strength * config.pointer_scale
}

/// Resets NaN components to zero and clamps each component to
/// `[-max_speed, max_speed]`, which also catches infinities.
pub fn stabilize_velocity(velocity: Vec2, max_speed: f32) -> Vec2 {
    let limit = |v: f32| {
        if v.is_nan() {
            0.0
        } else {
            v.clamp(-max_speed, max_speed)
        }
    };
    Vec2::new(limit(velocity.x), limit(velocity.y))
}

/// Applies the boundary policy to one axis
pub fn apply_boundary_axis(position: f32, velocity: f32, bounds: f32, mode: BoundaryMode) -> (f32, f32) {
    match mode {
        BoundaryMode::Reflect => {
            if position > bounds {
                (bounds, -velocity)
            } else if position < -bounds {
                (-bounds, -velocity)
            } else {
                (position, velocity)
            }
        }
        BoundaryMode::Wrap => {
            if position > bounds || position < -bounds {
                let span = 2.0 * bounds;
                ((position + bounds).rem_euclid(span) - bounds, velocity)
            } else {
                (position, velocity)
            }
        }
    }
}

/// Applies the boundary policy to both axes independently
pub fn apply_boundary(position: Vec2, velocity: Vec2, config: &ForceConfig) -> (Vec2, Vec2) {
    let (px, vx) = apply_boundary_axis(position.x, velocity.x, config.bounds, config.boundary);
    let (py, vy) = apply_boundary_axis(position.y, velocity.y, config.bounds, config.boundary);
    (Vec2::new(px, py), Vec2::new(vx, vy))
}

/// Damping, stabilization, position update and boundary handling for a
/// particle that accumulated `velocity_delta` this step
pub fn integrate(transform: &Transform, velocity_delta: Vec2, config: &ForceConfig) -> Transform {
    let velocity = (transform.velocity() + velocity_delta) * config.friction;
    let velocity = stabilize_velocity(velocity, config.max_speed);
    let position = transform.position() + velocity;
    let (position, velocity) = apply_boundary(position, velocity, config);
    Transform::new(position, velocity)
}

/// Next Transform of particle `index`, reading the whole current state.
///
/// This is one kernel lane: a sequential scan over every live particle, no
/// writes to shared state.
pub fn step_particle(
    index: usize,
    current: &ParticleBuffers,
    layout: &GridLayout,
    pointer: &PointerInput,
    config: &ForceConfig,
) -> Transform {
    let transform = &current.transforms[index];
    let color = &current.colors[index];
    let properties = &current.properties[index];

    let position = transform.position();
    let radius = config.repulsion_radius(properties.radius);

    let count = layout.count() as usize;
    let mut velocity_delta = Vec2::ZERO;
    for (other, other_color) in current.transforms[..count]
        .iter()
        .zip(&current.colors[..count])
    {
        velocity_delta += pair_velocity_delta(
            position,
            color,
            properties.gravity,
            radius,
            other.position(),
            other_color,
            config,
        );
    }

    velocity_delta += pointer_velocity_delta(position, radius, pointer, config);

    integrate(transform, velocity_delta, config)
}

/// Sum of squared velocities over the live particles
pub fn kinetic_energy(buffers: &ParticleBuffers, layout: &GridLayout) -> f32 {
    buffers.transforms[..layout.count() as usize]
        .iter()
        .map(|t| t.velocity().length_squared())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RadiusMode;
    use crate::particle::{ring_seed, Properties};
    use crate::state::create_state;

    const EPSILON: f32 = 1e-6;

    #[test]
    fn test_force_magnitude_far_field() {
        // Without stiffness only the attraction term is left
        let config = ForceConfig {
            stiffness: 0.0,
            repulsion_exponent: 1.0,
            ..Default::default()
        };
        // |d|^2 / 8 = 1 -> linear = 1 -> 1^0.2 - 1 = 0
        let direction = Vec2::new(8.0_f32.sqrt(), 0.0);
        assert!(force_magnitude(direction, 1.0, &config).abs() < EPSILON);

        // linear = 0.5 -> attraction is negative
        let direction = Vec2::new(0.5 * 8.0_f32.sqrt(), 0.0);
        let expected = (0.5_f32.powf(0.2) - 1.0) * 2.5;
        assert!((force_magnitude(direction, 1.0, &config) - expected).abs() < EPSILON);
    }

    #[test]
    fn test_force_magnitude_repulsion_term() {
        let config = ForceConfig {
            attraction_scale: 0.0,
            stiffness: 1.0,
            ..Default::default()
        };
        // linear = 1 -> (2 - 1)^200 = 1
        let direction = Vec2::new(0.0, 8.0_f32.sqrt());
        assert!((force_magnitude(direction, 1.0, &config) - 1.0).abs() < 1e-4);

        // Default stiffness overflows f32 at short range
        let config = ForceConfig::default();
        assert!(force_magnitude(Vec2::new(0.1, 0.0), 1.0, &config).is_infinite());
    }

    #[test]
    fn test_color_affinity_rotation() {
        let config = ForceConfig::default();
        let red = Color::rgba(1.0, 0.0, 0.0, 1.0);
        // gbr + brg of red = (0 + 0, 0 + 1, 1 + 0) = (0, 1, 1); minus red = (-1, 1, 1)
        let expected = 3.0_f32.sqrt().cos() * 0.1;
        assert!((color_affinity(&red, &red, &config) - expected).abs() < EPSILON);

        let black = Color::rgba(0.0, 0.0, 0.0, 1.0);
        assert!((color_affinity(&black, &black, &config) - 0.1).abs() < EPSILON);
    }

    #[test]
    fn test_self_pair_contributes_zero() {
        let config = ForceConfig::default();
        let color = Color::from_hue(0.2);
        let position = Vec2::new(0.3, -0.2);
        let delta = pair_velocity_delta(position, &color, 1.0, 1.0, position, &color, &config);
        assert_eq!(delta, Vec2::ZERO);
    }

    #[test]
    fn test_pointer_disengaged_is_zero() {
        let config = ForceConfig::default();
        let pointer = PointerInput::new(0.0, 0.0, 0.0);
        assert_eq!(
            pointer_velocity_delta(Vec2::new(0.5, 0.5), 1.0, &pointer, &config),
            Vec2::ZERO
        );
    }

    #[test]
    fn test_pointer_force_direction_and_scale() {
        let config = ForceConfig {
            stiffness: 0.0,
            repulsion_exponent: 1.0,
            ..Default::default()
        };
        let position = Vec2::new(0.5, 0.0);
        let pointer = PointerInput::new(-0.5, 0.0, 1.0);

        let offset = Vec2::new(1.0, 0.0);
        let expected = force_magnitude(offset, 1.0, &config) * 0.01;
        let delta = pointer_velocity_delta(position, 1.0, &pointer, &config);
        assert!((delta.x - expected).abs() < EPSILON);
        assert_eq!(delta.y, 0.0);

        let repel = PointerInput::new(-0.5, 0.0, -1.0);
        let reversed = pointer_velocity_delta(position, 1.0, &repel, &config);
        assert!((reversed.x + expected).abs() < EPSILON);
    }

    #[test]
    fn test_pointer_on_particle_is_zero() {
        let config = ForceConfig::default();
        let pointer = PointerInput::new(0.25, 0.25, 1.0);
        let delta = pointer_velocity_delta(Vec2::new(0.25, 0.25), 1.0, &pointer, &config);
        assert_eq!(delta, Vec2::ZERO);
    }

    #[test]
    fn test_stabilize_velocity() {
        let v = stabilize_velocity(Vec2::new(f32::NAN, f32::INFINITY), 0.05);
        assert_eq!(v, Vec2::new(0.0, 0.05));
        let v = stabilize_velocity(Vec2::new(f32::NEG_INFINITY, 0.01), 0.05);
        assert_eq!(v, Vec2::new(-0.05, 0.01));
    }

    #[test]
    fn test_reflect_boundary_clamps_and_flips() {
        let (p, v) = apply_boundary_axis(1.5, 0.2, 1.0, BoundaryMode::Reflect);
        assert_eq!(p, 1.0);
        assert_eq!(v, -0.2);

        let (p, v) = apply_boundary_axis(-1.25, -0.3, 1.0, BoundaryMode::Reflect);
        assert_eq!(p, -1.0);
        assert_eq!(v, 0.3);

        let (p, v) = apply_boundary_axis(0.75, 0.3, 1.0, BoundaryMode::Reflect);
        assert_eq!((p, v), (0.75, 0.3));
    }

    #[test]
    fn test_wrap_boundary_teleports() {
        let (p, v) = apply_boundary_axis(1.5, 0.2, 1.0, BoundaryMode::Wrap);
        assert!((p + 0.5).abs() < EPSILON);
        assert_eq!(v, 0.2);

        let (p, v) = apply_boundary_axis(-1.25, -0.3, 1.0, BoundaryMode::Wrap);
        assert!((p - 0.75).abs() < EPSILON);
        assert_eq!(v, -0.3);

        // The wall itself is inside the domain
        let (p, _) = apply_boundary_axis(1.0, 0.2, 1.0, BoundaryMode::Wrap);
        assert_eq!(p, 1.0);
    }

    #[test]
    fn test_axes_handled_independently() {
        let config = ForceConfig::default();
        let (p, v) = apply_boundary(Vec2::new(1.5, 0.5), Vec2::new(0.1, 0.1), &config);
        assert_eq!(p, Vec2::new(1.0, 0.5));
        assert_eq!(v, Vec2::new(-0.1, 0.1));
    }

    #[test]
    fn test_single_particle_decays_geometrically() {
        let layout = GridLayout::new(1);
        let config = ForceConfig::default();
        let pointer = PointerInput::default();
        let mut state = create_state(&layout, |i| ring_seed(i, 1, 1.0e-5, 1.0)).unwrap();

        state.for_each_mut(|buffers| {
            buffers.transforms[0] = Transform::new(Vec2::new(0.0, 0.5), Vec2::new(0.01, 0.0));
        });

        let mut previous = 0.01_f32;
        for _ in 0..50 {
            let next = step_particle(0, state.current(), &layout, &pointer, &config);
            state.next_mut().transforms[0] = next;
            state.swap();

            let speed = state.current().transforms[0].velocity().length();
            assert!(speed < previous, "speed must strictly decrease");
            assert!(speed > 0.0);
            assert!((speed / previous - 0.9).abs() < 1e-4);
            previous = speed;
        }
    }

    #[test]
    fn test_radius_modes_diverge() {
        let layout = GridLayout::new(2);
        let seed = |i: u32| {
            ring_seed(i, 2, 1.0e-5, 1.0).map(|mut record| {
                record.properties = Properties::new(1.0e-5, 4.0);
                record
            })
        };
        let state = create_state(&layout, seed).unwrap();
        let pointer = PointerInput::default();

        // Keep the repulsion term finite for both exponents (20 and 20 / 4)
        let fixed = ForceConfig {
            stiffness: 1.0,
            repulsion_exponent: 20.0,
            max_speed: f32::MAX,
            ..Default::default()
        };
        let per_particle = ForceConfig {
            radius_mode: RadiusMode::PerParticle,
            ..fixed
        };

        let a = step_particle(0, state.current(), &layout, &pointer, &fixed);
        let b = step_particle(0, state.current(), &layout, &pointer, &per_particle);
        assert!(a.velocity().is_finite() && b.velocity().is_finite());
        assert_ne!(a.velocity(), b.velocity());
    }
}
