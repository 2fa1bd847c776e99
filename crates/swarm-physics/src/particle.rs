//! Per-particle records and the creation-time seeding rule
//!
//! Every record is four `f32`s so each buffer maps onto an array of
//! `vec4<f32>` in WGSL.

use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

use crate::config::SimulationConfig;
use crate::constants::SEED_RADIUS;

/// Position and velocity, the only record rewritten every step
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Transform {
    pub position: [f32; 2],
    pub velocity: [f32; 2],
}

impl Transform {
    pub fn new(position: Vec2, velocity: Vec2) -> Self {
        Self {
            position: position.to_array(),
            velocity: velocity.to_array(),
        }
    }

    pub fn position(&self) -> Vec2 {
        Vec2::from_array(self.position)
    }

    pub fn velocity(&self) -> Vec2 {
        Vec2::from_array(self.velocity)
    }
}

/// RGBA color, constant after creation
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn rgb(&self) -> Vec3 {
        Vec3::new(self.r, self.g, self.b)
    }

    /// Fully saturated, full value color at `hue` in `[0, 1)`
    pub fn from_hue(hue: f32) -> Self {
        let h = hue.rem_euclid(1.0) * 6.0;
        let x = 1.0 - ((h % 2.0) - 1.0).abs();
        let (r, g, b) = match h as u32 {
            0 => (1.0, x, 0.0),
            1 => (x, 1.0, 0.0),
            2 => (0.0, 1.0, x),
            3 => (0.0, x, 1.0),
            4 => (x, 0.0, 1.0),
            _ => (1.0, 0.0, x),
        };
        Self::rgba(r, g, b, 1.0)
    }
}

/// Physical properties, constant after creation
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Properties {
    pub gravity: f32,
    pub radius: f32,
    pub _unused: [f32; 2],
}

impl Properties {
    pub fn new(gravity: f32, radius: f32) -> Self {
        Self {
            gravity,
            radius,
            _unused: [0.0; 2],
        }
    }
}

/// One particle across the three buffers
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ParticleRecord {
    pub transform: Transform,
    pub color: Color,
    pub properties: Properties,
}

/// Creation-time layout: particles spread evenly on a circle of radius 0.5,
/// at rest, with colors spread evenly across hue.
///
/// Returns `None` outside `[0, count)` so it can seed a whole grid directly.
pub fn ring_seed(index: u32, count: u32, gravity: f32, radius: f32) -> Option<ParticleRecord> {
    if index >= count {
        return None;
    }

    let fraction = index as f32 / count as f32;
    let angle = std::f32::consts::TAU * fraction;
    let position = Vec2::new(angle.sin(), angle.cos()) * SEED_RADIUS;

    Some(ParticleRecord {
        transform: Transform::new(position, Vec2::ZERO),
        color: Color::from_hue(fraction),
        properties: Properties::new(gravity, radius),
    })
}

/// [`ring_seed`] bound to a configuration
pub fn config_seed(config: &SimulationConfig) -> impl Fn(u32) -> Option<ParticleRecord> + '_ {
    move |index| ring_seed(index, config.particle_count, config.gravity, config.radius)
}
