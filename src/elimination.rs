//! Exact Gauss-Jordan elimination over an augmented [`SymbolicMatrix`].
//!
//! Columns 0 and 1 hold the free symbols and are never used as pivots. Round
//! `i` pivots on row `i`, column `i + 2`, so a matrix with `R` rows runs
//! `R - 1` rounds and its last row ends up expressed purely in terms of the
//! free columns.

use crate::{
    algebra::{ops, Expression, SymbolicMatrix},
    derivation::DerivationError,
};
use log::{debug, trace};
use std::fmt::{self, Display, Formatter};

/// The number of leading columns which are never pivoted on.
pub const FREE_COLUMNS: usize = 2;

/// A snapshot of the matrix, reported as a derivation progresses.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Step<'a> {
    Initial(&'a SymbolicMatrix),
    Normalised {
        round: usize,
        matrix: &'a SymbolicMatrix,
    },
    Eliminated {
        round: usize,
        matrix: &'a SymbolicMatrix,
    },
    BackSubstituted {
        round: usize,
        matrix: &'a SymbolicMatrix,
    },
}

impl<'a> Step<'a> {
    pub fn matrix(&self) -> &'a SymbolicMatrix {
        match *self {
            Step::Initial(matrix)
            | Step::Normalised { matrix, .. }
            | Step::Eliminated { matrix, .. }
            | Step::BackSubstituted { matrix, .. } => matrix,
        }
    }

    pub fn round(&self) -> Option<usize> {
        match *self {
            Step::Initial(_) => None,
            Step::Normalised { round, .. }
            | Step::Eliminated { round, .. }
            | Step::BackSubstituted { round, .. } => Some(round),
        }
    }
}

impl<'a> Display for Step<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Step::Initial(_) => writeln!(f, "Initial Matrix")?,
            Step::Normalised { round, .. } => {
                writeln!(f, "Round {}: normalised", round)?
            },
            Step::Eliminated { round, .. } => {
                writeln!(f, "Round {}: eliminated", round)?
            },
            Step::BackSubstituted { round, .. } => {
                writeln!(f, "Round {}: back-substituted", round)?
            },
        }

        write!(f, "{}", self.matrix())
    }
}

/// The pivot column used by a particular round.
pub fn pivot_column(round: usize) -> usize { round + FREE_COLUMNS }

/// The pivot columns, in order, for a matrix with `rows` rows.
pub fn pivot_schedule(rows: usize) -> Vec<usize> {
    (0..rows.saturating_sub(1)).map(pivot_column).collect()
}

/// Reduce `matrix` so its pivot columns form an identity block.
pub fn eliminate(matrix: &mut SymbolicMatrix) -> Result<(), DerivationError> {
    eliminate_with(matrix, |_| {})
}

/// Reduce `matrix`, reporting the state after every step to `on_step`.
pub fn eliminate_with<F>(
    matrix: &mut SymbolicMatrix,
    mut on_step: F,
) -> Result<(), DerivationError>
where
    F: FnMut(Step<'_>),
{
    forward_eliminate_with(matrix, &mut on_step)?;
    back_substitute_with(matrix, &mut on_step)?;

    Ok(())
}

/// Run the forward rounds, leaving the matrix in row echelon form with unit
/// pivots.
pub fn forward_eliminate(
    matrix: &mut SymbolicMatrix,
) -> Result<(), DerivationError> {
    forward_eliminate_with(matrix, |_| {})
}

pub fn forward_eliminate_with<F>(
    matrix: &mut SymbolicMatrix,
    mut on_step: F,
) -> Result<(), DerivationError>
where
    F: FnMut(Step<'_>),
{
    check_shape(matrix)?;

    let schedule = pivot_schedule(matrix.num_rows());

    for (round, pivot) in schedule.into_iter().enumerate() {
        normalise(matrix, round, pivot)?;
        debug!("Round {} normalised:\n{}", round, matrix);
        on_step(Step::Normalised {
            round,
            matrix: &*matrix,
        });

        let pivot_row = matrix.row(round).to_vec();
        for row in round + 1..matrix.num_rows() {
            subtract_multiple(matrix, row, &pivot_row, pivot)?;
        }
        debug!("Round {} eliminated:\n{}", round, matrix);
        on_step(Step::Eliminated {
            round,
            matrix: &*matrix,
        });
    }

    Ok(())
}

/// Clear the entries above each pivot of a matrix which has already been
/// through [`forward_eliminate()`].
///
/// The last row is never modified.
pub fn back_substitute(
    matrix: &mut SymbolicMatrix,
) -> Result<(), DerivationError> {
    back_substitute_with(matrix, |_| {})
}

pub fn back_substitute_with<F>(
    matrix: &mut SymbolicMatrix,
    mut on_step: F,
) -> Result<(), DerivationError>
where
    F: FnMut(Step<'_>),
{
    check_shape(matrix)?;

    let schedule = pivot_schedule(matrix.num_rows());

    for (round, pivot) in schedule.into_iter().enumerate().rev() {
        let pivot_row = matrix.row(round).to_vec();
        for row in 0..round {
            subtract_multiple(matrix, row, &pivot_row, pivot)?;
        }
        debug!("Round {} back-substituted:\n{}", round, matrix);
        on_step(Step::BackSubstituted {
            round,
            matrix: &*matrix,
        });
    }

    Ok(())
}

fn check_shape(matrix: &SymbolicMatrix) -> Result<(), DerivationError> {
    let rows = matrix.num_rows();
    let columns = matrix.num_columns();

    if rows > 0 && columns < rows + 1 {
        Err(DerivationError::MalformedMatrix { rows, columns })
    } else {
        Ok(())
    }
}

/// Divide the pivot row through by its pivot.
fn normalise(
    matrix: &mut SymbolicMatrix,
    round: usize,
    pivot: usize,
) -> Result<(), DerivationError> {
    let pivot_value = ops::simplify(&matrix[(round, pivot)])?;
    trace!("Round {} pivots on column {} = {}", round, pivot, pivot_value);

    if pivot_value.is_zero() {
        return Err(DerivationError::IllPosedOrder {
            round,
            column: pivot,
        });
    }

    if !pivot_value.is_one() {
        for column in (0..matrix.num_columns()).filter(|&c| c != pivot) {
            let entry = &mut matrix[(round, column)];
            *entry = ops::simplify(&(entry.clone() / pivot_value.clone()))?;
        }
    }

    matrix[(round, pivot)] = Expression::one();

    Ok(())
}

/// `row -= pivot_row * row[pivot]`, leaving a zero in the pivot column.
fn subtract_multiple(
    matrix: &mut SymbolicMatrix,
    row: usize,
    pivot_row: &[Expression],
    pivot: usize,
) -> Result<(), DerivationError> {
    let factor = matrix[(row, pivot)].clone();

    if factor.is_zero() {
        return Ok(());
    }

    for (column, pivot_entry) in pivot_row.iter().enumerate() {
        if column == pivot || pivot_entry.is_zero() {
            continue;
        }

        let entry = &mut matrix[(row, column)];
        let updated = entry.clone() - pivot_entry.clone() * factor.clone();
        *entry = ops::simplify(&updated)?;
    }

    matrix[(row, pivot)] = Expression::zero();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{algebra::Matrix, builder::build, derivation::Variant};

    fn matrix(rows: &[&[&str]]) -> SymbolicMatrix {
        let rows = rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|src| {
                        let expr: Expression = src.parse().unwrap();
                        ops::simplify(&expr).unwrap()
                    })
                    .collect()
            })
            .collect();

        Matrix::from_rows(rows).unwrap()
    }

    fn transcript(order: usize, variant: Variant) -> Vec<SymbolicMatrix> {
        let mut matrix = build(order, variant).unwrap();
        let mut snapshots = Vec::new();

        forward_eliminate_with(&mut matrix, |step| {
            snapshots.push(step.matrix().clone())
        })
        .unwrap();

        snapshots
    }

    #[test]
    fn schedule_skips_the_free_columns() {
        assert_eq!(pivot_schedule(4), [2, 3, 4]);
        assert_eq!(pivot_schedule(2), [2]);
        assert!(pivot_schedule(1).is_empty());
        assert!(pivot_schedule(0).is_empty());
    }

    #[test]
    fn second_order_stencil_by_hand() {
        let should_be = vec![
            matrix(&[
                &["-f_0/4 + f_2/4", "-f'_0*h/2", "1"],
                &["-f_0 + f_1", "-f'_0*h", "1"],
            ]),
            matrix(&[
                &["-f_0/4 + f_2/4", "-f'_0*h/2", "1"],
                &["-3*f_0/4 + f_1 - f_2/4", "-f'_0*h/2", "0"],
            ]),
        ];

        let got = transcript(2, Variant::Stencil);

        assert_eq!(got, should_be);
    }

    #[test]
    fn second_order_multistep_by_hand() {
        let should_be = vec![
            matrix(&[
                &["-a_2/2", "-a_0/2", "1", "-2"],
                &["a_1", "a_0", "-1", "1"],
                &["a_n", "a_0", "1", "1"],
            ]),
            matrix(&[
                &["-a_2/2", "-a_0/2", "1", "-2"],
                &["a_1 - a_2/2", "a_0/2", "0", "-1"],
                &["a_2/2 + a_n", "3*a_0/2", "0", "3"],
            ]),
            matrix(&[
                &["-a_2/2", "-a_0/2", "1", "-2"],
                &["-a_1 + a_2/2", "-a_0/2", "0", "1"],
                &["a_2/2 + a_n", "3*a_0/2", "0", "3"],
            ]),
            matrix(&[
                &["-a_2/2", "-a_0/2", "1", "-2"],
                &["-a_1 + a_2/2", "-a_0/2", "0", "1"],
                &["3*a_1 - a_2 + a_n", "3*a_0", "0", "0"],
            ]),
        ];

        let got = transcript(2, Variant::Multistep);

        assert_eq!(got, should_be);
    }

    #[test]
    fn back_substitution_clears_above_the_pivots() {
        let mut got = build(2, Variant::Multistep).unwrap();
        forward_eliminate(&mut got).unwrap();
        let last_row = got.row(2).to_vec();

        back_substitute(&mut got).unwrap();

        let should_be = matrix(&[
            &["-2*a_1 + a_2/2", "-3*a_0/2", "1", "0"],
            &["-a_1 + a_2/2", "-a_0/2", "0", "1"],
            &["3*a_1 - a_2 + a_n", "3*a_0", "0", "0"],
        ]);
        assert_eq!(got, should_be);
        assert_eq!(got.row(2), last_row.as_slice());
    }

    #[test]
    fn pivot_columns_form_an_identity_block() {
        for variant in [Variant::Stencil, Variant::Multistep] {
            for order in 2..=8 {
                let mut matrix = build(order, variant).unwrap();

                eliminate(&mut matrix).unwrap();

                for (round, pivot) in
                    pivot_schedule(matrix.num_rows()).into_iter().enumerate()
                {
                    for (row, entry) in matrix.column(pivot).enumerate() {
                        let should_be = if row == round {
                            Expression::one()
                        } else {
                            Expression::zero()
                        };
                        assert_eq!(
                            *entry, should_be,
                            "order {} {}, M[{}][{}]",
                            order, variant, row, pivot
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn eliminating_twice_changes_nothing() {
        for variant in [Variant::Stencil, Variant::Multistep] {
            let mut reduced = build(5, variant).unwrap();
            eliminate(&mut reduced).unwrap();
            let mut again = reduced.clone();

            eliminate(&mut again).unwrap();

            assert_eq!(again, reduced);
        }
    }

    #[test]
    fn duplicated_rows_are_ill_posed() {
        let mut matrix = build(3, Variant::Stencil).unwrap();
        for column in 0..matrix.num_columns() {
            matrix[(1, column)] = matrix[(0, column)].clone();
        }

        let got = eliminate(&mut matrix);

        assert_eq!(
            got,
            Err(DerivationError::IllPosedOrder {
                round: 1,
                column: 3
            })
        );
    }

    #[test]
    fn a_zero_first_pivot_is_ill_posed() {
        let mut matrix = build(3, Variant::Multistep).unwrap();
        matrix[(0, 2)] = Expression::zero();

        let got = eliminate(&mut matrix);

        assert_eq!(
            got,
            Err(DerivationError::IllPosedOrder {
                round: 0,
                column: 2
            })
        );
    }

    #[test]
    fn too_few_columns_is_malformed() {
        let mut matrix = Matrix::init(3, 3, |_, _| Expression::one());

        let got = eliminate(&mut matrix);

        assert_eq!(
            got,
            Err(DerivationError::MalformedMatrix {
                rows: 3,
                columns: 3
            })
        );
    }

    #[test]
    fn steps_render_with_a_heading() {
        let matrix = Matrix::from([[Expression::one(), Expression::zero()]]);

        let got = Step::Eliminated {
            round: 3,
            matrix: &matrix,
        }
        .to_string();

        assert_eq!(got, "Round 3: eliminated\n[\n1\t0\t\n]");
    }
}
