//! Criterion benchmarks for the genetic operators and the GA loop.
//!
//! Evaluation is stubbed so only search overhead is measured.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use flagtune::harness::Outcome;
use flagtune::params::{Catalog, Configuration};
use flagtune::search::genetic::{GaConfig, GaRunner};
use flagtune::search::Evaluator;
use flagtune::CancelToken;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn catalog(n: usize) -> Catalog {
    let declarations: Vec<String> = (0..n).map(|i| format!("f{i} = false (bool)")).collect();
    Catalog::new(&declarations).expect("generated catalog parses")
}

/// One second per disabled flag.
struct CountDisabled;

impl Evaluator for CountDisabled {
    fn evaluate(&self, configuration: &Configuration) -> Outcome {
        Outcome::Measured((configuration.len() - configuration.to_argument_list().len()) as f64)
    }
}

fn bench_mutate(c: &mut Criterion) {
    let mut group = c.benchmark_group("mutate");
    for n in [28usize, 256] {
        let template = catalog(n).fresh();
        group.bench_with_input(BenchmarkId::from_parameter(n), &template, |b, t| {
            let mut rng = StdRng::seed_from_u64(42);
            b.iter(|| {
                let mut c = t.clone();
                c.mutate(&mut rng).expect("booleans mutate");
                black_box(c)
            })
        });
    }
    group.finish();
}

fn bench_crossover(c: &mut Criterion) {
    let mut group = c.benchmark_group("crossover");
    for n in [28usize, 256] {
        let mut rng = StdRng::seed_from_u64(7);
        let a = catalog(n).fresh();
        let mut b_parent = catalog(n).fresh();
        b_parent.mutate(&mut rng).expect("booleans mutate");
        group.bench_with_input(
            BenchmarkId::from_parameter(n),
            &(a, b_parent),
            |b, (x, y)| b.iter(|| black_box(Configuration::crossover(x, y, &mut rng))),
        );
    }
    group.finish();
}

fn bench_ga_loop(c: &mut Criterion) {
    let mut group = c.benchmark_group("ga_loop");
    group.sample_size(10);

    for (n, pop, gen) in [(28usize, 10usize, 6usize), (256, 50, 20)] {
        let catalog = catalog(n);
        let config = GaConfig::default()
            .with_population_size(pop)
            .with_generations(gen)
            .with_seed(42);
        let cancel = CancelToken::new();
        group.bench_with_input(
            BenchmarkId::new(format!("n{}_p{}_g{}", n, pop, gen), n),
            &(catalog, config),
            |b, (cat, cfg)| {
                b.iter(|| {
                    let result = GaRunner::run(black_box(cat), &CountDisabled, f64::MAX, cfg, &cancel);
                    black_box(result)
                })
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_mutate, bench_crossover, bench_ga_loop);
criterion_main!(benches);
