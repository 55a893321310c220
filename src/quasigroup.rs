use std::fmt;

use rand::Rng;
use rand::seq::SliceRandom;
use tracing::trace;

use crate::error::{QuasigroupError, Result};

/// Largest supported order. Cell values are stored as `u16`.
pub const MAX_ORDER: usize = 1 << 16;

/// Upper bound (inclusive) on the number of random column swaps and of
/// random row swaps applied by [`Quasigroup::randomize`].
const MAX_RANDOM_SWAPS: usize = 20;

/// Which identity law currently holds for the table.
///
/// This is the sequencing guard of the normalization pipeline: each step
/// checks the state left behind by the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopState {
    /// No identity property is tracked.
    #[default]
    None,
    /// Row and column of the unit are both the identity sequence.
    FullLoop,
    /// Only a one-sided identity survives a deliberate row permutation.
    LeftLoopOnly,
}

impl LoopState {
    /// Marker character used by the grid rendering.
    pub fn marker(self) -> Option<char> {
        match self {
            LoopState::None => None,
            LoopState::FullLoop => Some('F'),
            LoopState::LeftLoopOnly => Some('L'),
        }
    }
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoopState::None => "no loop",
            LoopState::FullLoop => "full loop",
            LoopState::LeftLoopOnly => "left loop",
        };
        f.write_str(name)
    }
}

/// A finite quasigroup of order `n`, given by its operation table.
///
/// `get(i, j)` is `i ∘ j`. Every row and every column of the table is a
/// permutation of `{0..n-1}`; all constructors check this and every
/// transformation preserves it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quasigroup {
    n: usize,
    cells: Vec<u16>,
    label: char,
    loop_state: LoopState,
}

impl Quasigroup {
    /// Creates the cyclic quasigroup `Z_n`: `i ∘ j = (i + j) mod n`.
    ///
    /// # Panics
    /// Panics if `n == 0` or `n > MAX_ORDER`.
    pub fn new_cyclic(n: usize) -> Self {
        assert!((1..=MAX_ORDER).contains(&n), "n must be in range 1..=65536");
        let cells = (0..n)
            .flat_map(|r| (0..n).map(move |c| ((r + c) % n) as u16))
            .collect();
        Self {
            n,
            cells,
            label: 'Q',
            loop_state: LoopState::None,
        }
    }

    /// Builds a quasigroup from rows of 0-based values.
    ///
    /// Fails with [`QuasigroupError::MalformedInput`] when the rows are
    /// ragged or do not form a square, and with
    /// [`QuasigroupError::InvalidQuasigroup`] when the grid is not Latin.
    pub fn from_rows<R: AsRef<[i64]>>(rows: &[R]) -> Result<Self> {
        Self::from_numbered_rows(rows, |r| r + 1)
    }

    /// Like [`Quasigroup::from_rows`], with `line_of(r)` giving the source
    /// line reported for row `r` in [`QuasigroupError::MalformedInput`].
    pub(crate) fn from_numbered_rows<R: AsRef<[i64]>>(
        rows: &[R],
        line_of: impl Fn(usize) -> usize,
    ) -> Result<Self> {
        let n = rows.first().map(|row| row.as_ref().len()).unwrap_or(0);
        if n == 0 {
            return Err(QuasigroupError::MalformedInput {
                line: 1,
                reason: "no table rows".into(),
            });
        }
        if n > MAX_ORDER {
            return Err(QuasigroupError::MalformedInput {
                line: line_of(0),
                reason: format!("order {} exceeds {}", n, MAX_ORDER),
            });
        }

        // Shape is settled before the n * n cell buffer is allocated.
        for (r, row) in rows.iter().enumerate() {
            let len = row.as_ref().len();
            if len != n {
                return Err(QuasigroupError::MalformedInput {
                    line: line_of(r),
                    reason: format!("row has {} values, expected {}", len, n),
                });
            }
        }
        if rows.len() != n {
            return Err(QuasigroupError::MalformedInput {
                line: line_of(rows.len() - 1),
                reason: format!("table has {} rows, expected {}", rows.len(), n),
            });
        }

        let mut cells = Vec::with_capacity(n * n);
        for (r, row) in rows.iter().enumerate() {
            for (c, &v) in row.as_ref().iter().enumerate() {
                if !(0..n as i64).contains(&v) {
                    return Err(QuasigroupError::InvalidQuasigroup(format!(
                        "value {} at ({}, {}) is outside 0..{}",
                        v, r, c, n
                    )));
                }
                cells.push(v as u16);
            }
        }

        let q = Self {
            n,
            cells,
            label: 'Q',
            loop_state: LoopState::None,
        };
        q.validate()?;
        Ok(q)
    }

    /// Checks the quasigroup law.
    ///
    /// Every row and every column must hold each value of `{0..n-1}`
    /// exactly once. Columns are checked as well as rows, so a grid whose
    /// rows are permutations but whose columns repeat a value is rejected.
    pub fn validate(&self) -> Result<()> {
        let n = self.n;
        let mut seen = vec![false; n];
        for r in 0..n {
            seen.fill(false);
            for c in 0..n {
                let v = self.get(r, c) as usize;
                if v >= n {
                    return Err(QuasigroupError::InvalidQuasigroup(format!(
                        "value {} in row {} is outside 0..{}",
                        v, r, n
                    )));
                }
                if seen[v] {
                    return Err(QuasigroupError::InvalidQuasigroup(format!(
                        "row {} repeats value {}",
                        r, v
                    )));
                }
                seen[v] = true;
            }
        }
        for c in 0..n {
            seen.fill(false);
            for r in 0..n {
                let v = self.get(r, c) as usize;
                if seen[v] {
                    return Err(QuasigroupError::InvalidQuasigroup(format!(
                        "column {} repeats value {}",
                        c, v
                    )));
                }
                seen[v] = true;
            }
        }
        Ok(())
    }

    /// Returns the order of the quasigroup.
    pub fn order(&self) -> usize {
        self.n
    }

    /// Returns `r ∘ c`.
    ///
    /// # Panics
    /// Panics if `r >= n` or `c >= n`.
    pub fn get(&self, r: usize, c: usize) -> u16 {
        assert!(r < self.n && c < self.n, "index out of bounds");
        self.cells[r * self.n + c]
    }

    /// Returns row `r` as a slice.
    pub fn row(&self, r: usize) -> &[u16] {
        &self.cells[r * self.n..(r + 1) * self.n]
    }

    /// Returns column `c` as an owned vector.
    pub fn column(&self, c: usize) -> Vec<u16> {
        (0..self.n).map(|r| self.get(r, c)).collect()
    }

    /// Returns the cells as a flat slice in row-major order.
    pub fn cells(&self) -> &[u16] {
        &self.cells
    }

    /// Display tag of this quasigroup.
    pub fn label(&self) -> char {
        self.label
    }

    /// Replaces the display tag.
    pub fn set_label(&mut self, label: char) {
        self.label = label;
    }

    /// Identity law left behind by the last normalization step.
    pub fn loop_state(&self) -> LoopState {
        self.loop_state
    }

    pub(crate) fn set_loop_state(&mut self, state: LoopState) {
        self.loop_state = state;
    }

    /// True if row `unit` and column `unit` are both `0, 1, ..., n-1`.
    pub fn is_loop(&self, unit: usize) -> bool {
        unit < self.n
            && (0..self.n).all(|i| {
                self.get(unit, i) as usize == i && self.get(i, unit) as usize == i
            })
    }

    /// True if row `unit` is the identity sequence but column `unit` is not.
    pub fn is_left_loop(&self, unit: usize) -> bool {
        unit < self.n
            && (0..self.n).all(|i| self.get(unit, i) as usize == i)
            && (0..self.n).any(|i| self.get(i, unit) as usize != i)
    }

    /// Exchanges columns `i` and `j` in every row.
    ///
    /// # Panics
    /// Panics if `i >= n` or `j >= n`.
    pub fn swap_columns(&mut self, i: usize, j: usize) {
        assert!(i < self.n && j < self.n, "column index out of bounds");
        if i == j {
            return;
        }
        for row in self.cells.chunks_exact_mut(self.n) {
            row.swap(i, j);
        }
    }

    /// Exchanges rows `i` and `j`.
    ///
    /// # Panics
    /// Panics if `i >= n` or `j >= n`.
    pub fn swap_rows(&mut self, i: usize, j: usize) {
        assert!(i < self.n && j < self.n, "row index out of bounds");
        if i == j {
            return;
        }
        let n = self.n;
        let (lo, hi) = if i < j { (i, j) } else { (j, i) };
        let (head, tail) = self.cells.split_at_mut(hi * n);
        head[lo * n..(lo + 1) * n].swap_with_slice(&mut tail[..n]);
    }

    /// Replaces every value `v` with `σ(v)` for a uniformly random
    /// permutation `σ` of `{0..n-1}`.
    pub fn relabel_elements<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let mut sigma: Vec<u16> = (0..self.n).map(|v| v as u16).collect();
        sigma.shuffle(rng);
        for v in self.cells.iter_mut() {
            *v = sigma[*v as usize];
        }
    }

    /// Scrambles the table in place: up to 20 random column swaps, then up
    /// to 20 random row swaps, then one relabeling.
    pub fn randomize<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let n = self.n;

        let column_swaps = rng.random_range(0..=MAX_RANDOM_SWAPS);
        for _ in 0..column_swaps {
            let i = rng.random_range(0..n);
            let j = rng.random_range(0..n);
            self.swap_columns(i, j);
        }

        let row_swaps = rng.random_range(0..=MAX_RANDOM_SWAPS);
        for _ in 0..row_swaps {
            let i = rng.random_range(0..n);
            let j = rng.random_range(0..n);
            self.swap_rows(i, j);
        }

        self.relabel_elements(rng);
        trace!(column_swaps, row_swaps, "randomized quasigroup");
    }

    /// Reorders rows so that new row `k` is old row `order[k]`.
    pub(crate) fn permute_rows(&mut self, order: &[usize]) {
        let n = self.n;
        let mut cells = Vec::with_capacity(self.cells.len());
        for &r in order {
            cells.extend_from_slice(&self.cells[r * n..(r + 1) * n]);
        }
        self.cells = cells;
    }

    /// Reorders columns so that new column `k` is old column `order[k]`.
    pub(crate) fn permute_columns(&mut self, order: &[usize]) {
        let n = self.n;
        let mut cells = Vec::with_capacity(self.cells.len());
        for row in self.cells.chunks_exact(n) {
            cells.extend(order.iter().map(|&c| row[c]));
        }
        self.cells = cells;
    }
}

impl fmt::Display for Quasigroup {
    /// Aligned grid with row and column headers. The corner holds the
    /// label followed by the loop marker.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn line(f: &mut fmt::Formatter<'_>, values: impl Iterator<Item = usize>) -> fmt::Result {
            for (k, v) in values.enumerate() {
                if k > 0 {
                    f.write_str(" ")?;
                }
                write!(f, " {:2}", v)?;
            }
            Ok(())
        }

        let mut corner = String::from(self.label);
        if let Some(m) = self.loop_state.marker() {
            corner.push(m);
        }
        write!(f, "{:<2}│", corner)?;
        line(f, 0..self.n)?;
        write!(f, "\n──│{}", "─".repeat(4 * self.n))?;
        for r in 0..self.n {
            write!(f, "\n{:2}│", r)?;
            line(f, self.row(r).iter().map(|&v| v as usize))?;
        }
        Ok(())
    }
}
