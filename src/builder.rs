//! Construction of the augmented Taylor-constraint matrix.
//!
//! Row `i` of a stencil matrix expands `f_{N-i} - f_0` as a Taylor series
//! around the origin with offset `t = i - N`:
//!
//! ```text
//! [ f_{N-i} - f_0,  f'_0*h*t,  t^2,  t^3, ...,  t^N ]
//! ```
//!
//! The unknown higher-order terms are the power columns, so eliminating them
//! leaves a relationship between the samples and `f'_0`. Multistep matrices
//! follow the same pattern, with an extra row relating the samples to the
//! next value, `a_n`.

use crate::{
    algebra::{ops, Expression, Matrix, SymbolicMatrix},
    derivation::{DerivationError, Variant},
};
use log::debug;

/// The smallest order with a non-trivial constraint system.
pub const MINIMUM_ORDER: usize = 2;

/// Build the initial augmented matrix for a formula of the given order.
pub fn build(
    order: usize,
    variant: Variant,
) -> Result<SymbolicMatrix, DerivationError> {
    if order < MINIMUM_ORDER {
        return Err(DerivationError::InvalidOrder {
            order,
            minimum: MINIMUM_ORDER,
        });
    }

    let (rows, columns) = variant.dimensions(order);
    let matrix = Matrix::try_init(rows, columns, |row, column| {
        let entry = match variant {
            Variant::Stencil => stencil_entry(order, row, column),
            Variant::Multistep => multistep_entry(order, row, column),
        };
        ops::simplify(&entry)
    })?;

    debug!("Initial matrix for order {} {}:\n{}", order, variant, matrix);

    Ok(matrix)
}

/// The Taylor offset of a row, `t = row - order`.
fn offset(order: usize, row: usize) -> i64 { row as i64 - order as i64 }

fn stencil_entry(order: usize, row: usize, column: usize) -> Expression {
    let variant = Variant::Stencil;
    let t = offset(order, row);

    match column {
        0 => {
            Expression::Symbol(variant.sample(order - row))
                - Expression::Symbol(variant.sample(0))
        },
        1 => {
            Expression::Symbol(variant.target())
                * Expression::symbol("h")
                * Expression::integer(t)
        },
        power => Expression::integer(t).pow(power as i64),
    }
}

fn multistep_entry(order: usize, row: usize, column: usize) -> Expression {
    let variant = Variant::Multistep;

    if row == order {
        return match column {
            0 => Expression::Symbol(variant.target()),
            1 => Expression::Symbol(variant.sample(0)),
            _ => Expression::one(),
        };
    }

    match column {
        0 => Expression::Symbol(variant.sample(order - row)),
        1 => Expression::Symbol(variant.sample(0)),
        power => {
            Expression::integer(offset(order, row)).pow(power as i64 - 1)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test]
    fn second_order_stencil_layout() {
        let should_be = matrix(&[
            &["-f_0 + f_2", "-2*f'_0*h", "4"],
            &["-f_0 + f_1", "-f'_0*h", "1"],
        ]);

        let got = build(2, Variant::Stencil).unwrap();

        assert_eq!(got, should_be);
    }

    #[test]
    fn second_order_multistep_layout() {
        let should_be = matrix(&[
            &["a_2", "a_0", "-2", "4"],
            &["a_1", "a_0", "-1", "1"],
            &["a_n", "a_0", "1", "1"],
        ]);

        let got = build(2, Variant::Multistep).unwrap();

        assert_eq!(got, should_be);
    }

    #[test]
    fn power_columns_hold_powers_of_the_offset() {
        let got = build(4, Variant::Stencil).unwrap();

        assert_eq!(got.num_rows(), 4);
        assert_eq!(got.num_columns(), 5);
        assert_eq!(got[(0, 4)], Expression::integer(256));
        assert_eq!(got[(1, 3)], Expression::integer(-27));
        assert_eq!(got[(3, 2)], Expression::integer(1));
    }

    #[test]
    fn matrix_dimensions_follow_the_variant() {
        for order in MINIMUM_ORDER..=6 {
            let stencil = build(order, Variant::Stencil).unwrap();
            let multistep = build(order, Variant::Multistep).unwrap();

            assert_eq!(
                (stencil.num_rows(), stencil.num_columns()),
                (order, order + 1)
            );
            assert_eq!(
                (multistep.num_rows(), multistep.num_columns()),
                (order + 1, order + 2)
            );
        }
    }

    #[test]
    fn building_is_deterministic() {
        let first = build(5, Variant::Multistep).unwrap();
        let second = build(5, Variant::Multistep).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn low_orders_are_rejected() {
        let got = build(1, Variant::Stencil);

        assert_eq!(
            got,
            Err(DerivationError::InvalidOrder {
                order: 1,
                minimum: MINIMUM_ORDER
            })
        );
    }
}
