//! Greedy vs Hungarian on the same gated cost matrix.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_partials::{
    tracking::solver::{AssignmentSolver, CostMatrix, Matching, Solver},
    Strategy,
};

use crate::POLYPHONIES;

/// Banded matrix: each track can reach its own peak and the two neighbours,
/// roughly what drifting harmonics look like after gating.
fn banded_costs(n: usize) -> CostMatrix {
    let mut costs = CostMatrix::with_capacity(n, n);
    costs.reshape(n, n);
    for row in 0..n {
        for col in row.saturating_sub(1)..(row + 2).min(n) {
            let spread = ((row * 31 + col * 17) % 13) as f32 / 13.0;
            costs.set(row, col, Some(0.05 + 0.4 * spread));
        }
    }
    costs
}

pub fn bench_solvers(c: &mut Criterion) {
    let mut group = c.benchmark_group("tracking/solver");

    for &n in POLYPHONIES {
        let costs = banded_costs(n);
        let mut matching = Matching::with_capacity(n, n);

        for strategy in [Strategy::Greedy, Strategy::Optimal] {
            let mut solver = Solver::for_strategy(strategy, n, n);
            let name = format!("{strategy:?}").to_lowercase();
            group.bench_with_input(BenchmarkId::new(name, n), &n, |b, _| {
                b.iter(|| {
                    solver.solve(black_box(&costs), &mut matching);
                })
            });
        }
    }

    group.finish();
}
