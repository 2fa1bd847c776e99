//! Uniform block shared with `swarm_step.wgsl`

use bytemuck::{Pod, Zeroable};
use swarm_physics::{ForceConfig, GridLayout, PointerInput};

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct SimParams {
    // Group 1: Grid
    // x: particle_count, y: grid_side, z: boundary_mode, w: radius_mode
    pub grid: [u32; 4],

    // Group 2: Force law
    // x: attraction_scale, y: attraction_exponent, z: stiffness, w: distance_scale
    pub force: [f32; 4],

    // Group 3: Shape
    // x: repulsion_exponent, y: fixed_radius, z: color_coupling, w: padding
    pub shape: [f32; 4],

    // Group 4: Integration
    // x: friction, y: max_speed, z: bounds, w: padding
    pub integration: [f32; 4],

    // Group 5: Pointer
    // x, y: position, z: strength, w: pointer_scale
    pub pointer: [f32; 4],
}

impl SimParams {
    pub fn new(layout: &GridLayout, config: &ForceConfig, pointer: &PointerInput) -> Self {
        Self {
            grid: [
                layout.count(),
                layout.side(),
                config.boundary as u32,
                config.radius_mode as u32,
            ],
            force: [
                config.attraction_scale,
                config.attraction_exponent,
                config.stiffness,
                config.distance_scale,
            ],
            shape: [
                config.repulsion_exponent,
                config.fixed_radius,
                config.color_coupling,
                0.0,
            ],
            integration: [config.friction, config.max_speed, config.bounds, 0.0],
            pointer: [pointer.x, pointer.y, pointer.strength, config.pointer_scale],
        }
    }
}
