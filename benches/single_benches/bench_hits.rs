use super::params::*;
use criterion::{BenchmarkId, Criterion, Throughput};
use dsi_progress_logger::ProgressLogger;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use webgraph_hits::algo::hits::*;

pub fn bench_log_sum(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0);
    let values = (0..1_000_000)
        .map(|_| rng.random_range(-20.0f32..0.0))
        .collect::<Vec<_>>();

    let mut group = c.benchmark_group("Log-domain sum");
    group.throughput(Throughput::Elements(values.len() as u64));
    group.bench_function("sum_log_probs", |b| {
        b.iter(|| values.iter().copied().collect::<LogSum>().value())
    });
    group.finish();
}

pub fn bench_hits(c: &mut Criterion) {
    let mut group = c.benchmark_group("HITS iteration");
    group.sampling_mode(criterion::SamplingMode::Flat);
    group.sample_size(NUM_SAMPLES);
    for (num_nodes, num_arcs) in BENCH_GRAPHS {
        let mut rng = StdRng::seed_from_u64(0);
        let arcs = (0..num_arcs)
            .map(|_| {
                (
                    rng.random_range(0..num_nodes),
                    rng.random_range(0..num_nodes),
                )
            })
            .collect::<Vec<_>>();
        let base = tempfile::tempdir().unwrap();
        build_from_arcs(
            num_nodes,
            arcs,
            iteration_dir(base.path(), 0),
            &HashPartitioner,
            NUM_PARTITIONS,
            &mut Option::<ProgressLogger>::None,
        )
        .unwrap();

        let parameter = format!("{} nodes, {} arcs", num_nodes, num_arcs);
        group.throughput(Throughput::Elements(num_arcs as u64));

        for (name, schimmy, combiner) in [
            ("Schimmy", true, false),
            ("Schimmy with combiners", true, true),
            ("Shuffled structure", false, false),
        ] {
            let hits = HitsBuilder::new(base.path(), num_nodes)
                .with_num_partitions(NUM_PARTITIONS)
                .with_schimmy(schimmy)
                .with_combiner(combiner)
                .with_in_mapper_combiner(combiner)
                .with_verify_assignment(false)
                .build()
                .unwrap();
            group.bench_with_input(BenchmarkId::new(name, &parameter), &hits, |b, hits| {
                b.iter(|| {
                    hits.run(0, 1, &mut Option::<ProgressLogger>::None)
                        .unwrap()
                })
            });
        }
    }
    group.finish();
}
