//! Normalization of a quasigroup into a 2-simple form.
//!
//! The pipeline runs three steps on a private copy:
//!
//! 1. [`Quasigroup::make_loop`] sorts rows and columns so that the unit
//!    element becomes a two-sided identity.
//! 2. [`Quasigroup::isotope`] rotates rows `1..n` to break the right
//!    identity.
//! 3. [`Quasigroup::reduce_to_2simple`] exchanges the unit column with the
//!    first fixed point of that column.
//!
//! Each step checks the [`LoopState`] left by the previous one, so steps
//! cannot run out of order or twice.

use tracing::debug;

use crate::error::{QuasigroupError, Result};
use crate::{LoopState, Quasigroup};

/// Unit element used by [`Quasigroup::create_simple`].
pub const DEFAULT_UNIT: usize = 0;

/// Label given to a derived simple quasigroup.
pub const SIMPLE_LABEL: char = 'S';

impl Quasigroup {
    /// Turns the table into a loop with identity `unit`.
    ///
    /// Rows are reordered by the values of column `unit`, then columns by
    /// the values of the new row `unit`. Afterwards row `unit` and column
    /// `unit` both read `0, 1, ..., n-1`. Both keys are permutations, so
    /// the result is fully determined by the input table.
    ///
    /// Fails with [`QuasigroupError::UnitOutOfRange`] if `unit >= n`,
    /// leaving the table untouched.
    pub fn make_loop(&mut self, unit: usize) -> Result<()> {
        self.require_unit(unit, "make_loop")?;

        let mut rows: Vec<usize> = (0..self.order()).collect();
        rows.sort_by_key(|&r| self.get(r, unit));
        self.permute_rows(&rows);

        let mut cols: Vec<usize> = (0..self.order()).collect();
        cols.sort_by_key(|&c| self.get(unit, c));
        self.permute_columns(&cols);

        self.set_loop_state(LoopState::FullLoop);
        debug!(order = self.order(), unit, "made loop");
        Ok(())
    }

    /// Derives a left loop from a full loop by exchanging rows 0 and 1.
    ///
    /// Row 1 becomes the identity sequence while column 1 no longer is
    /// (for orders above 2). Requires [`LoopState::FullLoop`]; on failure
    /// the table is left untouched.
    pub fn make_left_loop(&mut self) -> Result<()> {
        self.require(LoopState::FullLoop, "make_left_loop")?;
        if self.order() > 1 {
            self.swap_rows(0, 1);
        }
        self.set_loop_state(LoopState::LeftLoopOnly);
        Ok(())
    }

    /// Left-rotates rows `1..n` by one position: row 1 takes row 2, row 2
    /// takes row 3, and the last row takes the old row 1. Row 0 is kept.
    ///
    /// Requires [`LoopState::FullLoop`]; on failure the table is left
    /// untouched.
    pub fn isotope(&mut self) -> Result<()> {
        self.require(LoopState::FullLoop, "isotope")?;

        let n = self.order();
        if n > 2 {
            let rows: Vec<usize> = std::iter::once(0)
                .chain(2..n)
                .chain(std::iter::once(1))
                .collect();
            self.permute_rows(&rows);
        }

        self.set_loop_state(LoopState::LeftLoopOnly);
        debug!(order = n, "rotated rows into isotope");
        Ok(())
    }

    /// Swaps column `unit` with column `x`, where `x` is the smallest row
    /// index other than `unit` with `x ∘ unit = x`.
    ///
    /// Requires [`LoopState::LeftLoopOnly`] and `unit < n`; on either
    /// failure nothing is mutated. When no such `x` exists the state drops to
    /// [`LoopState::None`] and [`QuasigroupError::NoReduction`] is
    /// returned. That outcome is a property of the input, not a fault.
    pub fn reduce_to_2simple(&mut self, unit: usize) -> Result<()> {
        self.require_unit(unit, "reduce_to_2simple")?;
        self.require(LoopState::LeftLoopOnly, "reduce_to_2simple")?;

        let n = self.order();
        let fixed = (0..n)
            .filter(|&x| x != unit)
            .find(|&x| self.get(x, unit) as usize == x);

        self.set_loop_state(LoopState::None);
        let Some(x) = fixed else {
            return Err(QuasigroupError::NoReduction { unit });
        };

        self.swap_columns(unit, x);
        debug!(order = n, unit, fixed_point = x, "reduced to 2-simple");
        Ok(())
    }

    /// Derives the 2-simple quasigroup of `self`.
    ///
    /// Works on a copy, so `self` is never modified. Returns `None` when a
    /// step fails, most commonly because the rotated unit column has no
    /// fixed point. The returned quasigroup carries the label `'S'`.
    pub fn create_simple(&self) -> Option<Quasigroup> {
        let mut b = self.clone();
        match b.run_pipeline(DEFAULT_UNIT) {
            Ok(()) => {
                b.set_label(SIMPLE_LABEL);
                Some(b)
            }
            Err(e) => {
                debug!(order = self.order(), error = %e, "no simple form");
                None
            }
        }
    }

    fn run_pipeline(&mut self, unit: usize) -> Result<()> {
        self.make_loop(unit)?;
        self.isotope()?;
        self.reduce_to_2simple(unit)
    }

    fn require_unit(&self, unit: usize, step: &'static str) -> Result<()> {
        if unit < self.order() {
            Ok(())
        } else {
            Err(QuasigroupError::UnitOutOfRange {
                step,
                unit,
                order: self.order(),
            })
        }
    }

    fn require(&self, required: LoopState, step: &'static str) -> Result<()> {
        if self.loop_state() == required {
            Ok(())
        } else {
            Err(QuasigroupError::StepPrecondition {
                step,
                required,
                found: self.loop_state(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quasigroup::tests::assert_latin;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn scrambled(n: usize, seed: u64) -> Quasigroup {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let mut q = Quasigroup::new_cyclic(n);
        q.randomize(&mut rng);
        q
    }

    fn sample_tables() -> Vec<Quasigroup> {
        let mut tables = vec![
            Quasigroup::new_cyclic(10),
            Quasigroup::from_rows(&[
                [2i64, 0, 1, 3],
                [3, 1, 0, 2],
                [0, 2, 3, 1],
                [1, 3, 2, 0],
            ])
            .unwrap(),
        ];
        tables.extend((0..8).map(|seed| scrambled(10, seed)));
        tables
    }

    fn assert_loop(q: &Quasigroup) {
        let n = q.order();
        let identity: Vec<u16> = (0..n).map(|v| v as u16).collect();
        assert_eq!(q.row(0), identity.as_slice(), "row 0 is not the identity:\n{}", q);
        for i in 0..n {
            assert_eq!(q.get(i, 0) as usize, i, "column 0 breaks at row {}:\n{}", i, q);
        }
    }

    #[test]
    fn make_loop_sets_identity_row_and_column() {
        for mut q in sample_tables() {
            q.make_loop(DEFAULT_UNIT).unwrap();
            assert_loop(&q);
            assert_latin(&q);
            assert!(q.is_loop(0));
            assert_eq!(q.loop_state(), LoopState::FullLoop);
        }
    }

    #[test]
    fn make_loop_keeps_cyclic_table() {
        let cyclic = Quasigroup::new_cyclic(4);
        let mut q = cyclic.clone();
        q.make_loop(DEFAULT_UNIT).unwrap();
        assert_eq!(q.cells(), cyclic.cells());
    }

    #[test]
    fn make_loop_with_other_unit() {
        let mut q = scrambled(7, 11);
        q.make_loop(3).unwrap();
        assert!(q.is_loop(3));
        assert_latin(&q);
    }

    #[test]
    fn make_loop_rejects_unit_out_of_range() {
        let mut q = scrambled(3, 4);
        let before = q.clone();
        let err = q.make_loop(3).unwrap_err();
        assert!(
            matches!(
                err,
                QuasigroupError::UnitOutOfRange {
                    unit: 3,
                    order: 3,
                    ..
                }
            ),
            "{err}"
        );
        assert_eq!(q, before);
    }

    #[test]
    fn reduce_rejects_unit_out_of_range() {
        let mut q = Quasigroup::new_cyclic(4);
        q.make_loop(DEFAULT_UNIT).unwrap();
        q.isotope().unwrap();
        let before = q.clone();
        let err = q.reduce_to_2simple(5).unwrap_err();
        assert!(
            matches!(err, QuasigroupError::UnitOutOfRange { unit: 5, .. }),
            "{err}"
        );
        assert_eq!(q, before);
        assert_eq!(q.loop_state(), LoopState::LeftLoopOnly);
    }

    #[test]
    fn left_loop_breaks_right_identity() {
        for mut q in sample_tables() {
            q.make_loop(DEFAULT_UNIT).unwrap();
            q.make_left_loop().unwrap();

            let n = q.order();
            let identity: Vec<u16> = (0..n).map(|v| v as u16).collect();
            assert_eq!(q.row(1), identity.as_slice());
            assert!(
                (0..n).any(|i| q.get(i, 1) as usize != i),
                "column 1 still the identity:\n{}",
                q
            );
            assert!(q.is_left_loop(1));
            assert_eq!(q.loop_state(), LoopState::LeftLoopOnly);
            assert_latin(&q);
        }
    }

    #[test]
    fn left_loop_requires_full_loop() {
        let mut q = scrambled(5, 1);
        let before = q.clone();
        let err = q.make_left_loop().unwrap_err();
        assert!(matches!(err, QuasigroupError::StepPrecondition { .. }), "{err}");
        assert_eq!(q, before);
    }

    #[test]
    fn isotope_rotates_rows_after_zero() {
        let mut q = Quasigroup::new_cyclic(5);
        q.make_loop(DEFAULT_UNIT).unwrap();
        let before = q.clone();
        q.isotope().unwrap();

        assert_eq!(q.row(0), before.row(0));
        for i in 1..4 {
            assert_eq!(q.row(i), before.row(i + 1));
        }
        assert_eq!(q.row(4), before.row(1));
        assert_eq!(q.loop_state(), LoopState::LeftLoopOnly);
        assert_latin(&q);
    }

    #[test]
    fn isotope_requires_full_loop() {
        let mut q = scrambled(6, 2);
        let before = q.clone();
        let err = q.isotope().unwrap_err();
        assert!(
            matches!(
                err,
                QuasigroupError::StepPrecondition {
                    required: LoopState::FullLoop,
                    found: LoopState::None,
                    ..
                }
            ),
            "{err}"
        );
        assert_eq!(q, before);
    }

    #[test]
    fn isotope_cannot_run_twice() {
        let mut q = Quasigroup::new_cyclic(6);
        q.make_loop(DEFAULT_UNIT).unwrap();
        q.isotope().unwrap();
        let before = q.clone();
        assert!(q.isotope().is_err());
        assert_eq!(q, before);
    }

    #[test]
    fn reduce_requires_left_loop() {
        let mut q = Quasigroup::new_cyclic(4);
        q.make_loop(DEFAULT_UNIT).unwrap();
        let before = q.clone();
        let err = q.reduce_to_2simple(DEFAULT_UNIT).unwrap_err();
        assert!(matches!(err, QuasigroupError::StepPrecondition { .. }), "{err}");
        assert_eq!(q, before);
    }

    #[test]
    fn reduce_swaps_unit_column_with_fixed_point() {
        let mut q = Quasigroup::new_cyclic(2);
        q.make_loop(DEFAULT_UNIT).unwrap();
        q.isotope().unwrap();
        q.reduce_to_2simple(DEFAULT_UNIT).unwrap();
        assert_eq!(q.row(0), &[1, 0]);
        assert_eq!(q.row(1), &[0, 1]);
        assert_eq!(q.loop_state(), LoopState::None);
    }

    #[test]
    fn reduce_after_left_loop_finds_first_fixed_point() {
        // After swapping rows 0 and 1 of a loop, column 0 reads 1, 0, 2, ...
        // so the first fixed point past the unit is row 2.
        let mut q = Quasigroup::new_cyclic(5);
        q.make_loop(DEFAULT_UNIT).unwrap();
        q.make_left_loop().unwrap();
        let before = q.clone();
        q.reduce_to_2simple(DEFAULT_UNIT).unwrap();
        assert_eq!(q.column(0), before.column(2));
        assert_eq!(q.column(2), before.column(0));
        assert_latin(&q);
    }

    #[test]
    fn reduce_on_rotated_rows_with_last_unit() {
        // Z_5 after the row rotation: row i (1 <= i <= 3) holds old row
        // i + 1, so column 4 reads (i + 1 + 4) mod 5 = i there. The first
        // fixed point of column 4 is row 1.
        let mut q = Quasigroup::new_cyclic(5);
        q.make_loop(DEFAULT_UNIT).unwrap();
        q.isotope().unwrap();
        assert_eq!(q.column(4), vec![4, 1, 2, 3, 0]);
        let before = q.clone();

        q.reduce_to_2simple(4).unwrap();

        assert_eq!(q.column(4), before.column(1));
        assert_eq!(q.column(1), before.column(4));
        for c in [0, 2, 3] {
            assert_eq!(q.column(c), before.column(c));
        }
        assert_eq!(q.row(0), &[0, 4, 2, 3, 1]);
        assert_eq!(q.row(1), &[2, 1, 4, 0, 3]);
        assert_eq!(q.loop_state(), LoopState::None);
        assert_latin(&q);
    }

    #[test]
    fn reduce_on_left_loop_table_with_fixed_point_at_row_one() {
        // Column 0 reads 0, 1, 3, 2: the first fixed point past the unit is row 1.
        let mut q = Quasigroup::from_rows(&[
            [0i64, 1, 2, 3],
            [1, 0, 3, 2],
            [3, 2, 1, 0],
            [2, 3, 0, 1],
        ])
        .unwrap();
        q.set_loop_state(LoopState::LeftLoopOnly);

        q.reduce_to_2simple(DEFAULT_UNIT).unwrap();

        assert_eq!(q.row(0), &[1, 0, 2, 3]);
        assert_eq!(q.row(1), &[0, 1, 3, 2]);
        assert_eq!(q.row(2), &[2, 3, 1, 0]);
        assert_eq!(q.row(3), &[3, 2, 0, 1]);
        assert_eq!(q.loop_state(), LoopState::None);
        assert_latin(&q);
    }

    #[test]
    fn reduce_without_fixed_point_resets_state() {
        let mut q = Quasigroup::new_cyclic(6);
        q.make_loop(DEFAULT_UNIT).unwrap();
        q.isotope().unwrap();
        let cells = q.cells().to_vec();
        let err = q.reduce_to_2simple(DEFAULT_UNIT).unwrap_err();
        assert!(matches!(err, QuasigroupError::NoReduction { unit: 0 }), "{err}");
        assert_eq!(q.loop_state(), LoopState::None);
        assert_eq!(q.cells(), cells.as_slice());
    }

    #[test]
    fn create_simple_labels_result() {
        let q = Quasigroup::new_cyclic(2);
        let s = q.create_simple().expect("Z_2 has a simple form");
        assert_eq!(s.label(), SIMPLE_LABEL);
        assert_eq!(s.loop_state(), LoopState::None);
        assert_latin(&s);
    }

    #[test]
    fn create_simple_aborts_without_fixed_point() {
        for seed in 0..4 {
            let q = scrambled(8, seed);
            assert!(q.create_simple().is_none());
        }
    }

    #[test]
    fn create_simple_leaves_source_untouched() {
        let q = scrambled(9, 5);
        let before = q.clone();
        let _ = q.create_simple();
        assert_eq!(q, before);

        let q = Quasigroup::new_cyclic(2);
        let before = q.clone();
        let _ = q.create_simple();
        assert_eq!(q, before);
    }

    #[test]
    fn create_simple_is_deterministic() {
        for n in 1..=6 {
            let q = scrambled(n, n as u64);
            assert_eq!(q.create_simple(), q.create_simple());
        }
    }
}
