use crate::{
    algebra::{
        ops::{self, ArithmeticError},
        Expression, Symbol,
    },
    builder,
    elimination::{self, Step},
    extract::{self, Combination, ExtractionRule},
};
use log::info;
use std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
};

/// Everything that can go wrong while deriving a formula.
///
/// Each of these is terminal for the run, there are no partial results.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DerivationError {
    #[error("order {order} is not supported, it must be at least {minimum}")]
    InvalidOrder { order: usize, minimum: usize },
    #[error(
        "the constraint system is singular, round {round} found a zero pivot \
         in column {column}"
    )]
    IllPosedOrder { round: usize, column: usize },
    #[error(
        "the denominator at row {row}, column {column} is identically zero"
    )]
    DivisionByZero { row: usize, column: usize },
    #[error(
        "a matrix with {rows} rows needs at least {} columns, found {columns}",
        .rows + 1
    )]
    MalformedMatrix { rows: usize, columns: usize },
    #[error("there is no entry at row {row}, column {column}")]
    IndexOutOfBounds { row: usize, column: usize },
    #[error("exact arithmetic failed")]
    Arithmetic(#[from] ArithmeticError),
}

/// Which family of coefficients to derive.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Variant {
    /// A one-sided finite-difference approximation of `f'_0` from the samples
    /// `f_0, f_1, ..., f_N`, where `f_k = f(-k*h)`.
    Stencil,
    /// Predictor coefficients which extrapolate `a_n` from the previous
    /// values `a_0, a_1, ..., a_N`.
    Multistep,
}

impl Variant {
    /// The `(rows, columns)` of the augmented matrix for this order.
    pub fn dimensions(self, order: usize) -> (usize, usize) {
        match self {
            Variant::Stencil => (order, order + 1),
            Variant::Multistep => (order + 1, order + 2),
        }
    }

    /// The `k`'th sample symbol (`f_k` or `a_k`).
    pub fn sample(self, k: usize) -> Symbol {
        match self {
            Variant::Stencil => Symbol::named(format!("f_{}", k)),
            Variant::Multistep => Symbol::named(format!("a_{}", k)),
        }
    }

    /// Every sample symbol a formula of this order may use.
    pub fn samples(self, order: usize) -> Vec<Symbol> {
        (0..=order).map(|k| self.sample(k)).collect()
    }

    /// The symbol the final formula solves for.
    pub fn target(self) -> Symbol {
        match self {
            Variant::Stencil => Symbol::named("f'_0"),
            Variant::Multistep => Symbol::named("a_n"),
        }
    }

    /// How the formula is read out of a reduced matrix with `rows` rows.
    pub fn extraction_rule(self, rows: usize) -> ExtractionRule {
        let combination = match self {
            Variant::Stencil => Combination::Ratio,
            Variant::Multistep => Combination::Affine,
        };

        ExtractionRule {
            row: rows.saturating_sub(1),
            column_a: 0,
            column_b: 1,
            scale: self.target(),
            combination,
        }
    }
}

impl Display for Variant {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Stencil => write!(f, "stencil"),
            Variant::Multistep => write!(f, "multistep"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "\"{0}\" is not a known variant, expected \"stencil\" or \"multistep\""
)]
pub struct UnknownVariant(pub String);

impl FromStr for Variant {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stencil" => Ok(Variant::Stencil),
            "multistep" => Ok(Variant::Multistep),
            _ => Err(UnknownVariant(s.to_string())),
        }
    }
}

/// The inputs for a single derivation run.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Config {
    pub order: usize,
    pub variant: Variant,
}

impl Config {
    pub fn new(order: usize, variant: Variant) -> Self {
        Config { order, variant }
    }

    pub fn stencil(order: usize) -> Self {
        Config::new(order, Variant::Stencil)
    }

    pub fn multistep(order: usize) -> Self {
        Config::new(order, Variant::Multistep)
    }
}

impl Default for Config {
    fn default() -> Self { Config::stencil(4) }
}

/// A derived closed-form formula.
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    order: usize,
    variant: Variant,
    expression: Expression,
}

impl Formula {
    pub fn variant(&self) -> Variant { self.variant }

    /// The simplified formula for [`Variant::target()`].
    pub fn expression(&self) -> &Expression { &self.expression }

    pub fn samples(&self) -> Vec<Symbol> { self.variant.samples(self.order) }

    /// The exact coefficient multiplying `sample` in the formula.
    pub fn weight(
        &self,
        sample: &Symbol,
    ) -> Result<Expression, ArithmeticError> {
        ops::simplify(&ops::partial_derivative(&self.expression, sample))
    }

    pub fn weights(
        &self,
    ) -> Result<Vec<(Symbol, Expression)>, ArithmeticError> {
        self.samples()
            .into_iter()
            .map(|sample| {
                let weight = self.weight(&sample)?;
                Ok((sample, weight))
            })
            .collect()
    }
}

impl Display for Formula {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expression)
    }
}

/// Derive the formula described by `config`.
pub fn derive(config: &Config) -> Result<Formula, DerivationError> {
    derive_with(config, |_| {})
}

/// Derive the formula described by `config`, passing the matrix to
/// `on_step` after it is built and after every stage of elimination.
pub fn derive_with<F>(
    config: &Config,
    mut on_step: F,
) -> Result<Formula, DerivationError>
where
    F: FnMut(Step<'_>),
{
    let Config { order, variant } = *config;
    info!("Deriving the order {} {} formula", order, variant);

    let mut matrix = builder::build(order, variant)?;
    on_step(Step::Initial(&matrix));

    elimination::eliminate_with(&mut matrix, &mut on_step)?;

    let rule = variant.extraction_rule(matrix.num_rows());
    let expression = extract::extract(&matrix, &rule)?;
    info!("{} = {}", variant.target(), expression);

    Ok(Formula {
        order,
        variant,
        expression,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::ops::{evaluate, substitute};
    use approx::assert_relative_eq;
    use nalgebra::{DMatrix, DVector};

    fn expr(src: &str) -> Expression { src.parse().unwrap() }

    #[test]
    fn fourth_order_stencil() {
        let got = derive(&Config::stencil(4)).unwrap();

        assert_eq!(
            got.to_string(),
            "(25*f_0 - 48*f_1 + 36*f_2 - 16*f_3 + 3*f_4)/(12*h)"
        );
    }

    #[test]
    fn fourth_order_stencil_weights() {
        let formula = derive(&Config::stencil(4)).unwrap();
        let h = Expression::symbol("h");
        // the forward-difference convention negates every weight
        let forward = [
            Expression::fraction(-25, 12),
            Expression::integer(4),
            Expression::integer(-3),
            Expression::fraction(4, 3),
            Expression::fraction(-1, 4),
        ];

        let weights = formula.weights().unwrap();

        assert_eq!(weights.len(), forward.len());
        for ((sample, weight), forward) in weights.iter().zip(forward.iter()) {
            let should_be = -forward.clone() / h.clone();
            assert!(
                ops::equivalent(weight, &should_be).unwrap(),
                "{} has weight {}, not {}",
                sample,
                weight,
                should_be
            );
        }
    }

    #[test]
    fn second_order_stencil() {
        let got = derive(&Config::stencil(2)).unwrap();

        assert_eq!(got.to_string(), "(3*f_0 - 4*f_1 + f_2)/(2*h)");
    }

    #[test]
    fn fifth_order_multistep() {
        let got = derive(&Config::multistep(5)).unwrap();

        assert_eq!(
            got.to_string(),
            "6*a_0 - 15*a_1 + 20*a_2 - 15*a_3 + 6*a_4 - a_5"
        );
    }

    #[test]
    fn second_order_multistep() {
        let got = derive(&Config::multistep(2)).unwrap();

        assert_eq!(got.to_string(), "3*a_0 - 3*a_1 + a_2");
    }

    #[test]
    fn multistep_weights_are_consistent() {
        for order in 2..=7 {
            let formula = derive(&Config::multistep(order)).unwrap();
            let c = Expression::symbol("c");

            // a constant sequence has to extrapolate to the same constant
            let mut got = formula.expression().clone();
            for sample in formula.samples() {
                got = substitute(&got, &sample, &c);
            }

            assert!(
                ops::equivalent(&got, &c).unwrap(),
                "order {}: {} != c",
                order,
                got
            );
        }
    }

    #[test]
    fn multistep_reproduces_polynomials_exactly() {
        let formula = derive(&Config::multistep(5)).unwrap();
        // p(t) = 2t^5 - t^3 + 7, sampled at a_k = p(-k) and extrapolated to
        // a_n = p(1)
        let p = |t: i64| 2 * t.pow(5) - t.pow(3) + 7;

        let mut got = formula.expression().clone();
        for (k, sample) in formula.samples().iter().enumerate() {
            let value = Expression::integer(p(-(k as i64)));
            got = substitute(&got, sample, &value);
        }

        assert_eq!(ops::simplify(&got).unwrap(), Expression::integer(p(1)));
    }

    #[test]
    fn orders_below_two_are_rejected() {
        for variant in [Variant::Stencil, Variant::Multistep] {
            for order in 0..2 {
                let got = derive(&Config::new(order, variant));

                assert_eq!(
                    got,
                    Err(DerivationError::InvalidOrder { order, minimum: 2 })
                );
            }
        }
    }

    #[test]
    fn observer_sees_every_step() {
        let mut steps = Vec::new();

        derive_with(&Config::stencil(3), |step| {
            steps.push(step.to_string().lines().next().unwrap().to_string())
        })
        .unwrap();

        assert_eq!(
            steps,
            [
                "Initial Matrix",
                "Round 0: normalised",
                "Round 0: eliminated",
                "Round 1: normalised",
                "Round 1: eliminated",
                "Round 1: back-substituted",
                "Round 0: back-substituted",
            ]
        );
    }

    /// Solve the moment conditions `sum_k w_k (-k)^m = [m == 1]` numerically
    /// and make sure they agree with the exact weights (with `h = 1`).
    #[test]
    fn stencil_weights_match_a_numeric_vandermonde_solve() {
        for order in 2..=6 {
            let formula = derive(&Config::stencil(order)).unwrap();
            let n = order + 1;

            let vandermonde = DMatrix::from_fn(n, n, |m, k| {
                (-(k as f64)).powi(m as i32)
            });
            let mut rhs = DVector::zeros(n);
            rhs[1] = 1.0;
            let numeric = vandermonde.lu().solve(&rhs).unwrap();

            let h_is_one = |s: &Symbol| {
                if s.name() == "h" {
                    Some(1.0)
                } else {
                    None
                }
            };
            for (k, (_, weight)) in
                formula.weights().unwrap().iter().enumerate()
            {
                let exact = evaluate(weight, &h_is_one).unwrap();
                assert_relative_eq!(exact, numeric[k], epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn variants_parse_from_strings() {
        assert_eq!("stencil".parse::<Variant>(), Ok(Variant::Stencil));
        assert_eq!(
            " Multistep".parse::<Variant>(),
            Ok(Variant::Multistep)
        );
        assert_eq!(
            "adams".parse::<Variant>(),
            Err(UnknownVariant("adams".to_string()))
        );
    }

    #[test]
    fn formulas_can_be_parsed_back() {
        let formula = derive(&Config::stencil(3)).unwrap();

        let round_tripped = expr(&formula.to_string());

        let got = ops::simplify(&round_tripped).unwrap();
        assert_eq!(&got, formula.expression());
    }
}
