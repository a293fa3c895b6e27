pub const NUM_SAMPLES: usize = 10;
/// Pairs of (number of nodes, number of arcs) of the random graphs.
pub const BENCH_GRAPHS: [(usize, usize); 2] = [(10_000, 100_000), (100_000, 1_000_000)];
pub const NUM_PARTITIONS: usize = 16;
