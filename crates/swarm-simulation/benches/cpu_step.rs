use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use swarm_physics::{PointerInput, SimulationConfig};
use swarm_simulation::Simulation;

fn bench_cpu_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("cpu_step");
    group.sample_size(20);

    for count in [256_u32, 1024, 4096] {
        let config = SimulationConfig {
            particle_count: count,
            ..Default::default()
        };
        let mut simulation = Simulation::cpu(config).expect("failed to create simulation");
        let pointer = PointerInput::new(0.1, -0.2, 1.0);

        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| simulation.step(pointer).expect("step failed"))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_cpu_step);
criterion_main!(benches);
