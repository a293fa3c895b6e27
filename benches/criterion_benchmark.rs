use criterion::{criterion_group, criterion_main};

mod single_benches;
use single_benches::*;

criterion_group!(benches, bench_log_sum, bench_hits);
criterion_main!(benches);
