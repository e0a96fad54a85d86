use super::{AssignmentSolver, CostMatrix, Matching};

/// Cost given to ineligible pairs. Larger than any sum of real costs (each
/// at most 1.0), so the solver only picks one when nothing else fits.
const FORBIDDEN: f64 = 1.0e6;

/// Per-row bias added to eligible cells. Among equal-cost matchings the one
/// using lower rows wins, i.e. the lower track takes the tie.
const TIE_BIAS: f64 = 1.0e-9;

/// Minimum-cost assignment (Kuhn-Munkres with potentials), O(n^3).
///
/// The matrix is treated as square with side `max(rows, cols)`; padding
/// cells cost zero and forbidden cells cost `FORBIDDEN`. Assignments that
/// land on padding or forbidden cells are dropped, which leaves a
/// maximum-cardinality matching of eligible pairs at minimum total cost.
///
/// All scratch vectors are 1-indexed with index 0 as the dummy source column
/// and are sized once for the largest frame the tracker is configured for.
#[derive(Debug, Clone)]
pub struct HungarianSolver {
    /// Row potentials
    u: Vec<f64>,
    /// Column potentials
    v: Vec<f64>,
    /// `p[j]`: row assigned to column `j` (0 = none)
    p: Vec<usize>,
    /// `way[j]`: previous column on the augmenting path
    way: Vec<usize>,
    min_val: Vec<f64>,
    used: Vec<bool>,
}

impl HungarianSolver {
    pub fn with_capacity(max_rows: usize, max_cols: usize) -> Self {
        let size = max_rows.max(max_cols) + 1;
        Self {
            u: Vec::with_capacity(size),
            v: Vec::with_capacity(size),
            p: Vec::with_capacity(size),
            way: Vec::with_capacity(size),
            min_val: Vec::with_capacity(size),
            used: Vec::with_capacity(size),
        }
    }

    fn prepare(&mut self, n: usize) {
        for buffer in [&mut self.u, &mut self.v, &mut self.min_val] {
            buffer.clear();
            buffer.resize(n + 1, 0.0);
        }
        for buffer in [&mut self.p, &mut self.way] {
            buffer.clear();
            buffer.resize(n + 1, 0);
        }
        self.used.clear();
        self.used.resize(n + 1, false);
    }
}

/// Square-padded cost for 1-indexed `(i, j)`.
fn padded_cost(costs: &CostMatrix, i: usize, j: usize) -> f64 {
    let (row, col) = (i - 1, j - 1);
    if row >= costs.rows() || col >= costs.cols() {
        return 0.0;
    }
    match costs.get(row, col) {
        Some(cost) => cost as f64 + TIE_BIAS * row as f64,
        None => FORBIDDEN,
    }
}

impl AssignmentSolver for HungarianSolver {
    fn solve(&mut self, costs: &CostMatrix, matching: &mut Matching) {
        matching.reset(costs.rows(), costs.cols());
        if costs.rows() == 0 || costs.cols() == 0 {
            return;
        }

        let n = costs.rows().max(costs.cols());
        self.prepare(n);

        for i in 1..=n {
            // Column 0 is the dummy source pointing at the row being inserted
            self.p[0] = i;
            let mut j0 = 0;
            self.min_val.fill(f64::INFINITY);
            self.used.fill(false);

            // Shortest augmenting path, Dijkstra-style over reduced costs
            loop {
                self.used[j0] = true;
                let i0 = self.p[j0];
                let mut delta = f64::INFINITY;
                let mut j1 = 0;

                for j in 1..=n {
                    if self.used[j] {
                        continue;
                    }
                    let reduced = padded_cost(costs, i0, j) - self.u[i0] - self.v[j];
                    if reduced < self.min_val[j] {
                        self.min_val[j] = reduced;
                        self.way[j] = j0;
                    }
                    if self.min_val[j] < delta {
                        delta = self.min_val[j];
                        j1 = j;
                    }
                }

                for j in 0..=n {
                    if self.used[j] {
                        self.u[self.p[j]] += delta;
                        self.v[j] -= delta;
                    } else {
                        self.min_val[j] -= delta;
                    }
                }

                j0 = j1;
                if self.p[j0] == 0 {
                    break;
                }
            }

            // Flip the path back to the source
            loop {
                let j1 = self.way[j0];
                self.p[j0] = self.p[j1];
                j0 = j1;
                if j0 == 0 {
                    break;
                }
            }
        }

        for j in 1..=n {
            let i = self.p[j];
            if i == 0 || i > costs.rows() || j > costs.cols() {
                continue;
            }
            let (row, col) = (i - 1, j - 1);
            if costs.get(row, col).is_some() {
                matching.assign(row, col);
            }
        }
    }
}
