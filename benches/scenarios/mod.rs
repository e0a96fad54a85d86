//! Real-world scenario benchmarks.
//!
//! Steady harmonic stacks and noisy, churning peak lists fed through the
//! full tracker.

mod frames;

pub use frames::bench_frames;
