mod params;

mod bench_hits;
pub use bench_hits::*;
