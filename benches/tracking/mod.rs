//! Benchmarks for the assignment solvers.

mod solver;

pub use solver::bench_solvers;
