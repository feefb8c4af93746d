//! [`Expression`] operations.

use crate::algebra::{canonical::RationalFunction, Expression, Symbol};
use num_traits::ToPrimitive;
use smol_str::SmolStr;

/// Errors raised by exact arithmetic.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArithmeticError {
    #[error("attempted to divide by an expression which is identically zero")]
    DivisionByZero,
}

/// Errors raised while evaluating an [`Expression`] numerically.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvaluationError {
    #[error("no value was provided for \"{name}\"")]
    UnknownSymbol { name: SmolStr },
    #[error("division by zero")]
    DivisionByZero,
}

/// Put an expression into its canonical closed form.
///
/// Like terms are collected, rational coefficients are reduced, and every
/// fractional coefficient or negative power ends up in a single denominator.
///
/// Quotients by multi-term polynomials are not reduced by their common
/// factors, so two equivalent expressions may still simplify to different
/// trees. Use [`equivalent()`] to compare them.
pub fn simplify(expr: &Expression) -> Result<Expression, ArithmeticError> {
    RationalFunction::from_expression(expr).map(|rf| rf.to_expression())
}

/// Check whether two expressions are algebraically equal.
pub fn equivalent(
    left: &Expression,
    right: &Expression,
) -> Result<bool, ArithmeticError> {
    let left = RationalFunction::from_expression(left)?;
    let right = RationalFunction::from_expression(right)?;

    Ok(left.add(&right.neg())?.is_zero())
}

/// Replace all references to a [`Symbol`] with an [`Expression`].
pub fn substitute(
    expression: &Expression,
    symbol: &Symbol,
    value: &Expression,
) -> Expression {
    match expression {
        Expression::Symbol(s) => {
            if s == symbol {
                value.clone()
            } else {
                Expression::Symbol(s.clone())
            }
        },
        Expression::Rational(r) => Expression::Rational(r.clone()),
        Expression::Sum(terms) => terms
            .iter()
            .map(|term| substitute(term, symbol, value))
            .fold(Expression::zero(), |acc, term| acc + term),
        Expression::Product(factors) => factors
            .iter()
            .map(|factor| substitute(factor, symbol, value))
            .fold(Expression::one(), |acc, factor| acc * factor),
        Expression::Power { base, exponent } => {
            substitute(base, symbol, value).pow(*exponent)
        },
        Expression::Quotient {
            numerator,
            denominator,
        } => {
            substitute(numerator, symbol, value)
                / substitute(denominator, symbol, value)
        },
    }
}

/// Calculate an [`Expression`]'s partial derivative with respect to a
/// particular [`Symbol`].
///
/// The result is not simplified.
pub fn partial_derivative(expr: &Expression, symbol: &Symbol) -> Expression {
    if !expr.depends_on(symbol) {
        return Expression::zero();
    }

    match expr {
        Expression::Symbol(_) => Expression::one(),
        Expression::Rational(_) => Expression::zero(),
        Expression::Sum(terms) => terms
            .iter()
            .map(|term| partial_derivative(term, symbol))
            .fold(Expression::zero(), |acc, term| acc + term),
        Expression::Product(factors) => {
            // The product rule, one factor at a time
            let mut sum = Expression::zero();

            for (i, factor) in factors.iter().enumerate() {
                let d_factor = partial_derivative(factor, symbol);
                let others = factors
                    .iter()
                    .enumerate()
                    .filter(|(j, _)| *j != i)
                    .map(|(_, f)| f.clone())
                    .fold(Expression::one(), |acc, f| acc * f);

                sum = sum + d_factor * others;
            }

            sum
        },
        Expression::Power { base, exponent } => {
            // d(u^n) = n * u^(n-1) * du
            let d_base = partial_derivative(base, symbol);
            Expression::integer(*exponent)
                * Expression::clone(base).pow(exponent - 1)
                * d_base
        },
        Expression::Quotient {
            numerator,
            denominator,
        } => {
            // The quotient rule
            let d_numerator = partial_derivative(numerator, symbol);
            let d_denominator = partial_derivative(denominator, symbol);
            let numerator = Expression::clone(numerator);
            let denominator = Expression::clone(denominator);

            (d_numerator * denominator.clone() - numerator * d_denominator)
                / denominator.pow(2)
        },
    }
}

/// Evaluate an expression to a floating point number, looking up the value
/// of each [`Symbol`] with `lookup_value`.
pub fn evaluate<F>(
    expr: &Expression,
    lookup_value: &F,
) -> Result<f64, EvaluationError>
where
    F: Fn(&Symbol) -> Option<f64>,
{
    match expr {
        Expression::Rational(r) => Ok(r.to_f64().unwrap_or(f64::NAN)),
        Expression::Symbol(s) => {
            lookup_value(s).ok_or_else(|| EvaluationError::UnknownSymbol {
                name: s.name().into(),
            })
        },
        Expression::Sum(terms) => terms
            .iter()
            .try_fold(0.0, |acc, term| Ok(acc + evaluate(term, lookup_value)?)),
        Expression::Product(factors) => {
            factors.iter().try_fold(1.0, |acc, factor| {
                Ok(acc * evaluate(factor, lookup_value)?)
            })
        },
        Expression::Power { base, exponent } => {
            let base = evaluate(base, lookup_value)?;
            if base == 0.0 && *exponent < 0 {
                return Err(EvaluationError::DivisionByZero);
            }
            match i32::try_from(*exponent) {
                Ok(exponent) => Ok(base.powi(exponent)),
                Err(_) => Ok(base.powf(*exponent as f64)),
            }
        },
        Expression::Quotient {
            numerator,
            denominator,
        } => {
            let denominator = evaluate(denominator, lookup_value)?;
            if denominator == 0.0 {
                return Err(EvaluationError::DivisionByZero);
            }
            Ok(evaluate(numerator, lookup_value)? / denominator)
        },
    }
}
