//! Track ↔ peak assignment.
//!
//! Rows are live tracks, columns are this frame's peaks. Both solvers read
//! the same `CostMatrix`, filled from `MatchGate::cost`, and write into a
//! `Matching` sized at configure time.

pub mod greedy;
pub mod hungarian;

pub use greedy::GreedySolver;
pub use hungarian::HungarianSolver;

use crate::engine::config::Strategy;

/// Row-major gated costs. `None` marks an ineligible pair.
#[derive(Debug, Clone)]
pub struct CostMatrix {
    rows: usize,
    cols: usize,
    cells: Vec<Option<f32>>,
}

impl CostMatrix {
    pub fn with_capacity(max_rows: usize, max_cols: usize) -> Self {
        Self {
            rows: 0,
            cols: 0,
            cells: Vec::with_capacity(max_rows * max_cols),
        }
    }

    /// Set the frame's dimensions and mark every pair ineligible.
    pub fn reshape(&mut self, rows: usize, cols: usize) {
        debug_assert!(rows * cols <= self.cells.capacity());
        self.rows = rows;
        self.cols = cols;
        self.cells.clear();
        self.cells.resize(rows * cols, None);
    }

    pub fn set(&mut self, row: usize, col: usize, cost: Option<f32>) {
        self.cells[row * self.cols + col] = cost;
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        self.cells[row * self.cols + col]
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }
}

/// One-to-one pairing of rows and columns.
#[derive(Debug, Clone, Default)]
pub struct Matching {
    row_to_col: Vec<Option<usize>>,
    col_to_row: Vec<Option<usize>>,
}

impl Matching {
    pub fn with_capacity(max_rows: usize, max_cols: usize) -> Self {
        Self {
            row_to_col: Vec::with_capacity(max_rows),
            col_to_row: Vec::with_capacity(max_cols),
        }
    }

    pub fn reset(&mut self, rows: usize, cols: usize) {
        self.row_to_col.clear();
        self.row_to_col.resize(rows, None);
        self.col_to_row.clear();
        self.col_to_row.resize(cols, None);
    }

    pub fn assign(&mut self, row: usize, col: usize) {
        debug_assert!(self.row_to_col[row].is_none(), "row {row} matched twice");
        debug_assert!(self.col_to_row[col].is_none(), "column {col} matched twice");
        self.row_to_col[row] = Some(col);
        self.col_to_row[col] = Some(row);
    }

    pub fn col_for_row(&self, row: usize) -> Option<usize> {
        self.row_to_col.get(row).copied().flatten()
    }

    pub fn row_for_col(&self, col: usize) -> Option<usize> {
        self.col_to_row.get(col).copied().flatten()
    }

    pub fn is_row_matched(&self, row: usize) -> bool {
        self.col_for_row(row).is_some()
    }

    pub fn is_col_matched(&self, col: usize) -> bool {
        self.row_for_col(col).is_some()
    }

    /// Number of matched pairs.
    pub fn len(&self) -> usize {
        self.row_to_col.iter().filter(|c| c.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sum of the costs of the matched pairs.
    pub fn total_cost(&self, costs: &CostMatrix) -> f32 {
        self.row_to_col
            .iter()
            .enumerate()
            .filter_map(|(row, col)| col.and_then(|col| costs.get(row, col)))
            .sum()
    }
}

pub trait AssignmentSolver {
    /// Fill `matching` from `costs`. Implementations reset `matching` first
    /// and only pair cells that hold a cost.
    fn solve(&mut self, costs: &CostMatrix, matching: &mut Matching);
}

/// The configured strategy with its scratch storage.
pub enum Solver {
    Greedy(GreedySolver),
    Optimal(HungarianSolver),
}

impl Solver {
    pub fn for_strategy(strategy: Strategy, max_rows: usize, max_cols: usize) -> Self {
        match strategy {
            Strategy::Greedy => Solver::Greedy(GreedySolver::with_capacity(max_rows, max_cols)),
            Strategy::Optimal => Solver::Optimal(HungarianSolver::with_capacity(max_rows, max_cols)),
        }
    }

    pub fn strategy(&self) -> Strategy {
        match self {
            Solver::Greedy(_) => Strategy::Greedy,
            Solver::Optimal(_) => Strategy::Optimal,
        }
    }
}

impl AssignmentSolver for Solver {
    fn solve(&mut self, costs: &CostMatrix, matching: &mut Matching) {
        match self {
            Solver::Greedy(solver) => solver.solve(costs, matching),
            Solver::Optimal(solver) => solver.solve(costs, matching),
        }
    }
}
