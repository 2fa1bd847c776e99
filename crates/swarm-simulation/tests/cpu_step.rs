//! End-to-end behavior of the CPU backend through the orchestrator

use glam::Vec2;
use swarm_physics::{
    BoundaryMode, Color, ForceConfig, GridLayout, ParticleRecord, PointerInput, Properties,
    SEED_RADIUS, SimulationConfig, Transform, kinetic_energy, ring_seed,
};
use swarm_simulation::{ComputeBackend, CpuBackend, Simulation};

const GRAVITY: f32 = 1.0e-5;

/// Four particles at the quadrant points of the seeding circle
fn quadrant_simulation(force: ForceConfig) -> Simulation<CpuBackend> {
    let config = SimulationConfig {
        particle_count: 4,
        gravity: GRAVITY,
        force,
        ..Default::default()
    };
    let backend = CpuBackend::new(GridLayout::new(4), |i| ring_seed(i, 4, GRAVITY, 1.0)).unwrap();
    Simulation::new(backend, config)
}

#[test]
fn test_quadrants_seeded_on_circle() {
    let simulation = quadrant_simulation(ForceConfig::default());
    let state = simulation.read().unwrap();
    for transform in &state.transforms[..4] {
        assert!((transform.position().length() - SEED_RADIUS).abs() < 1e-6);
        assert_eq!(transform.velocity(), Vec2::ZERO);
    }
}

#[test]
fn test_quadrant_energy_settles() {
    let force = ForceConfig::default();
    let mut simulation = quadrant_simulation(force);
    let layout = simulation.layout();

    let mut energies = Vec::with_capacity(100);
    for step in 0..100 {
        simulation.step(PointerInput::default()).unwrap();

        let state = simulation.read().unwrap();
        for transform in &state.transforms[..4] {
            let position = transform.position();
            let velocity = transform.velocity();
            assert!(position.is_finite() && velocity.is_finite(), "step {step}");
            assert!(position.abs().max_element() <= force.bounds, "step {step}");
            assert!(velocity.abs().max_element() <= force.max_speed, "step {step}");
        }

        let energy = kinetic_energy(&state, &layout);
        assert!(energy.is_finite(), "step {step}");
        energies.push(energy);
    }
    assert_eq!(simulation.frame(), 100);

    // Non-increasing once the initial transient has passed
    for (step, pair) in energies.windows(2).enumerate().skip(10) {
        assert!(
            pair[1] <= pair[0] + 1e-9,
            "energy rose after step {}: {} -> {}",
            step + 1,
            pair[0],
            pair[1]
        );
    }
}

#[test]
fn test_inactive_cells_stay_zero() {
    // Three particles on a 2x2 grid leave cell 3 inactive
    let config = SimulationConfig {
        particle_count: 3,
        ..Default::default()
    };
    let seed = |i: u32| ring_seed(i, 3, GRAVITY, 1.0);
    let backend = CpuBackend::new(GridLayout::new(3), seed).unwrap();
    let mut simulation = Simulation::new(backend, config);

    for _ in 0..10 {
        simulation.step(PointerInput::new(0.1, 0.1, 1.0)).unwrap();
    }

    let state = simulation.read().unwrap();
    assert_eq!(state.len(), 4);
    assert_eq!(state.record(3), ParticleRecord::default());
}

#[test]
fn test_single_particle_only_decays() {
    let config = SimulationConfig {
        particle_count: 1,
        ..Default::default()
    };
    let seed = |i: u32| {
        (i == 0).then(|| ParticleRecord {
            transform: Transform::new(Vec2::ZERO, Vec2::new(0.01, -0.02)),
            color: Color::from_hue(0.0),
            properties: Properties::new(1.0e-5, 1.0),
        })
    };
    let backend = CpuBackend::new(GridLayout::new(1), seed).unwrap();
    let mut simulation = Simulation::new(backend, config);

    let mut speed = 0.02_f32.hypot(0.01);
    for _ in 0..20 {
        simulation.step(PointerInput::default()).unwrap();
        let next = simulation.read().unwrap().transforms[0].velocity().length();
        assert!(next < speed && next > 0.0);
        assert!((next / speed - 0.9).abs() < 1e-4);
        speed = next;
    }
}

/// One particle at the right edge moving outward, undamped
fn edge_simulation() -> Simulation<CpuBackend> {
    let config = SimulationConfig {
        particle_count: 1,
        ..Default::default()
    };
    let seed = |i: u32| {
        (i == 0).then(|| ParticleRecord {
            transform: Transform::new(Vec2::new(0.99, 0.0), Vec2::new(0.03, 0.0)),
            color: Color::from_hue(0.0),
            properties: Properties::new(GRAVITY, 1.0),
        })
    };
    let backend = CpuBackend::new(GridLayout::new(1), seed).unwrap();
    let mut simulation = Simulation::new(backend, config);
    let force = ForceConfig {
        friction: 1.0,
        ..simulation.config().force
    };
    simulation.set_config(force);
    simulation
}

#[test]
fn test_edge_crossing_reflects_by_default() {
    let mut simulation = edge_simulation();
    assert_eq!(simulation.config().force.boundary, BoundaryMode::Reflect);

    simulation.step(PointerInput::default()).unwrap();
    let transform = simulation.read().unwrap().transforms[0];
    assert_eq!(transform.position(), Vec2::new(1.0, 0.0));
    assert!((transform.velocity().x + 0.03).abs() < 1e-6);
}

#[test]
fn test_boundary_toggle_at_runtime() {
    let mut simulation = edge_simulation();
    let toggled = ForceConfig {
        boundary: simulation.config().force.boundary.toggled(),
        ..simulation.config().force
    };
    assert_eq!(toggled.boundary, BoundaryMode::Wrap);
    simulation.set_config(toggled);

    simulation.step(PointerInput::default()).unwrap();
    let transform = simulation.read().unwrap().transforms[0];
    // 0.99 + 0.03 leaves through the right edge and re-enters on the left
    assert!((transform.position().x + 0.98).abs() < 1e-5);
    assert_eq!(transform.position().y, 0.0);
    assert!((transform.velocity().x - 0.03).abs() < 1e-6);
    assert_eq!(simulation.backend().layout().side(), 2);
}
