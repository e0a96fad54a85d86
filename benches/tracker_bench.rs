//! Benchmarks for the tracking engine.
//!
//! Run with: cargo bench
//!
//! A tracker runs once per analysis hop, so its whole budget is a slice of
//! the hop duration. Reference hop deadlines at 48kHz:
//!   - 256 samples  = 5.33ms
//!   - 512 samples  = 10.67ms
//!   - 1024 samples = 21.33ms
//!
//! Benchmark groups:
//!   - tracking/*   Assignment solvers on synthetic cost matrices
//!   - scenarios/*  Full process_frame + prune over peak sequences

use criterion::{criterion_group, criterion_main};

mod scenarios;
mod tracking;

/// Polyphonies commonly configured for resynthesis banks.
pub const POLYPHONIES: &[usize] = &[4, 16, 64];

criterion_group!(
    benches,
    // Solvers in isolation
    tracking::bench_solvers,
    // Whole frames
    scenarios::bench_frames,
);
criterion_main!(benches);
