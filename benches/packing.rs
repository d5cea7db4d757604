//! Benchmarks for layout fitness and generation breeding.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use tray_packer::{
    Catalogue, Container, EvolutionConfig, EvolutionEngine, FitnessEvaluator, ItemDescriptor,
    compute::LayoutRng,
    schema::FitnessWeights,
};

fn catalogue(classes: u32) -> Catalogue {
    let container = Container::new(300, 300, 120).unwrap();
    Catalogue::from_items(
        container,
        (0..classes).map(|i| (ItemDescriptor::card(40 + i * 10, 30 + i * 5, 1), 50)),
    )
    .unwrap()
}

fn bench_fitness(c: &mut Criterion) {
    let mut group = c.benchmark_group("fitness");

    for classes in [2, 8, 32] {
        let catalogue = catalogue(classes);
        let evaluator = FitnessEvaluator::new(&catalogue, FitnessWeights::default(), 1);
        let mut rng = LayoutRng::new(42);
        let solution = rng.random_solution(catalogue.len(), 4, catalogue.container());

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{} classes", classes)),
            &classes,
            |b, _| {
                b.iter(|| evaluator.evaluate(black_box(&solution)));
            },
        );
    }

    group.finish();
}

fn bench_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("generation");
    group.sample_size(20);

    for parallel in [false, true] {
        for population in [100, 400] {
            let config = EvolutionConfig::default()
                .with_population_size(population)
                .with_seed(42)
                .with_parallel(parallel);
            let mut engine = EvolutionEngine::new(catalogue(8), config).unwrap();
            engine.initialize();
            engine.evaluate_population();

            let label = if parallel { "parallel" } else { "sequential" };
            group.bench_with_input(
                BenchmarkId::new(label, population),
                &population,
                |b, _| {
                    b.iter(|| {
                        engine.step_generation();
                        engine.evaluate_population();
                    });
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, bench_fitness, bench_generation);
criterion_main!(benches);
