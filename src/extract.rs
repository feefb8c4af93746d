//! Reading the final formula out of a reduced matrix.

use crate::{
    algebra::{ops, Expression, Symbol, SymbolicMatrix},
    derivation::DerivationError,
};

/// How the two free-column entries combine into the formula.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Combination {
    /// `a / b * scale`
    Ratio,
    /// `b - a + scale`
    Affine,
}

/// Where to find the formula in a reduced matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRule {
    pub row: usize,
    pub column_a: usize,
    pub column_b: usize,
    pub scale: Symbol,
    pub combination: Combination,
}

/// Combine two entries of a reduced matrix into a simplified formula.
pub fn extract(
    matrix: &SymbolicMatrix,
    rule: &ExtractionRule,
) -> Result<Expression, DerivationError> {
    let a = lookup(matrix, rule.row, rule.column_a)?.clone();
    let b = lookup(matrix, rule.row, rule.column_b)?.clone();
    let scale = Expression::Symbol(rule.scale.clone());

    let combined = match rule.combination {
        Combination::Ratio => {
            if ops::simplify(&b)?.is_zero() {
                return Err(DerivationError::DivisionByZero {
                    row: rule.row,
                    column: rule.column_b,
                });
            }

            a / b * scale
        },
        Combination::Affine => b - a + scale,
    };

    ops::simplify(&combined).map_err(DerivationError::from)
}

fn lookup(
    matrix: &SymbolicMatrix,
    row: usize,
    column: usize,
) -> Result<&Expression, DerivationError> {
    matrix
        .get(row, column)
        .ok_or(DerivationError::IndexOutOfBounds { row, column })
}
