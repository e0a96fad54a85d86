use super::{AssignmentSolver, CostMatrix, Matching};

#[derive(Debug, Clone, Copy)]
struct Edge {
    cost: f32,
    row: usize,
    col: usize,
}

/// Lowest-cost-first matching over the gateable pairs.
///
/// Ties fall to the lower row (track), then the lower column (peak).
#[derive(Debug, Clone)]
pub struct GreedySolver {
    edges: Vec<Edge>,
}

impl GreedySolver {
    pub fn with_capacity(max_rows: usize, max_cols: usize) -> Self {
        Self {
            edges: Vec::with_capacity(max_rows * max_cols),
        }
    }
}

impl AssignmentSolver for GreedySolver {
    fn solve(&mut self, costs: &CostMatrix, matching: &mut Matching) {
        matching.reset(costs.rows(), costs.cols());

        self.edges.clear();
        for row in 0..costs.rows() {
            for col in 0..costs.cols() {
                if let Some(cost) = costs.get(row, col) {
                    self.edges.push(Edge { cost, row, col });
                }
            }
        }

        // Unstable sort works in place; the full key keeps it deterministic.
        self.edges.sort_unstable_by(|a, b| {
            a.cost
                .total_cmp(&b.cost)
                .then(a.row.cmp(&b.row))
                .then(a.col.cmp(&b.col))
        });

        for edge in &self.edges {
            if !matching.is_row_matched(edge.row) && !matching.is_col_matched(edge.col) {
                matching.assign(edge.row, edge.col);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::solver::test_support::matrix;

    fn solve(costs: &CostMatrix) -> Matching {
        let mut solver = GreedySolver::with_capacity(costs.rows(), costs.cols());
        let mut matching = Matching::with_capacity(costs.rows(), costs.cols());
        solver.solve(costs, &mut matching);
        matching
    }

    #[test]
    fn takes_cheapest_pair_first() {
        let costs = matrix(&[
            &[Some(0.5), Some(0.1)],
            &[Some(0.2), Some(0.3)],
        ]);
        let matching = solve(&costs);
        assert_eq!(matching.col_for_row(0), Some(1));
        assert_eq!(matching.col_for_row(1), Some(0));
    }

    #[test]
    fn lower_track_wins_a_tie() {
        let costs = matrix(&[&[Some(0.2)], &[Some(0.2)]]);
        let matching = solve(&costs);
        assert_eq!(matching.col_for_row(0), Some(0));
        assert!(!matching.is_row_matched(1));
    }

    #[test]
    fn ungateable_pairs_stay_unmatched() {
        let costs = matrix(&[&[None, Some(0.4)], &[None, None]]);
        let matching = solve(&costs);
        assert_eq!(matching.col_for_row(0), Some(1));
        assert!(!matching.is_row_matched(1));
        assert!(!matching.is_col_matched(0));
    }

    #[test]
    fn locally_cheapest_choice_can_block_a_second_match() {
        // Track 0 grabs peak 0, leaving track 1 with nothing eligible.
        let costs = matrix(&[
            &[Some(0.1), Some(0.4)],
            &[Some(0.3), None],
        ]);
        let matching = solve(&costs);
        assert_eq!(matching.len(), 1);
        assert_eq!(matching.col_for_row(0), Some(0));
    }
}
