//! Benchmark-only crate for chaosgen. See `benches/`.
