//! The normal form behind [`crate::algebra::ops::simplify()`].
//!
//! Every expression we can build is a rational function: a quotient of two
//! Laurent polynomials (sums of `c * x^i * y^j * ...` where `c` is an exact
//! rational and the exponents may be negative). Dividing by a single term is
//! always exact in that representation, which covers everything the
//! elimination engine does because its pivots are constants.
//!
//! Quotients by genuine multi-term polynomials are kept as they are, after
//! pulling out common monomial factors and making the denominator monic. We
//! don't attempt multivariate GCDs.

use crate::algebra::{ops::ArithmeticError, Expression, Symbol};
use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};
use std::collections::BTreeMap;

/// A product of symbols raised to (possibly negative) integer powers.
#[derive(Debug, Default, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct Monomial {
    powers: BTreeMap<Symbol, i64>,
}

impl Monomial {
    pub(crate) fn one() -> Self { Monomial::default() }

    pub(crate) fn symbol(symbol: Symbol) -> Self {
        let mut powers = BTreeMap::new();
        powers.insert(symbol, 1);
        Monomial { powers }
    }

    pub(crate) fn is_one(&self) -> bool { self.powers.is_empty() }

    fn mul(&self, other: &Monomial) -> Monomial {
        let mut powers = self.powers.clone();

        for (symbol, exponent) in &other.powers {
            let entry = powers.entry(symbol.clone()).or_insert(0);
            *entry += exponent;
            if *entry == 0 {
                powers.remove(symbol);
            }
        }

        Monomial { powers }
    }

    fn inverse(&self) -> Monomial {
        Monomial {
            powers: self
                .powers
                .iter()
                .map(|(symbol, exponent)| (symbol.clone(), -exponent))
                .collect(),
        }
    }

    fn degree(&self) -> i64 { self.powers.values().sum() }

    fn exponent_of(&self, symbol: &Symbol) -> i64 {
        self.powers.get(symbol).copied().unwrap_or(0)
    }

    fn to_factors(&self) -> Vec<Expression> {
        self.powers
            .iter()
            .map(|(symbol, &exponent)| {
                Expression::Symbol(symbol.clone()).pow(exponent)
            })
            .collect()
    }
}

/// A Laurent polynomial with exact rational coefficients.
///
/// Zero coefficients are never stored, so the zero polynomial has no terms.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct Polynomial {
    terms: BTreeMap<Monomial, BigRational>,
}

impl Polynomial {
    pub(crate) fn zero() -> Self { Polynomial::default() }

    pub(crate) fn constant(value: BigRational) -> Self {
        Polynomial::term(Monomial::one(), value)
    }

    pub(crate) fn term(monomial: Monomial, coefficient: BigRational) -> Self {
        let mut terms = BTreeMap::new();
        if !coefficient.is_zero() {
            terms.insert(monomial, coefficient);
        }
        Polynomial { terms }
    }

    pub(crate) fn is_zero(&self) -> bool { self.terms.is_empty() }

    pub(crate) fn len(&self) -> usize { self.terms.len() }

    /// The value of this polynomial if it doesn't depend on any symbols.
    pub(crate) fn as_constant(&self) -> Option<BigRational> {
        match self.terms.len() {
            0 => Some(BigRational::zero()),
            1 => self.terms.get(&Monomial::one()).cloned(),
            _ => None,
        }
    }

    fn leading(&self) -> Option<(&Monomial, &BigRational)> {
        self.terms.iter().next()
    }

    pub(crate) fn add(&self, other: &Polynomial) -> Polynomial {
        let mut terms = self.terms.clone();

        for (monomial, coefficient) in &other.terms {
            let sum = match terms.get(monomial) {
                Some(existing) => existing + coefficient,
                None => coefficient.clone(),
            };

            if sum.is_zero() {
                terms.remove(monomial);
            } else {
                terms.insert(monomial.clone(), sum);
            }
        }

        Polynomial { terms }
    }

    pub(crate) fn neg(&self) -> Polynomial {
        self.scale(&-BigRational::one())
    }

    pub(crate) fn scale(&self, factor: &BigRational) -> Polynomial {
        if factor.is_zero() {
            return Polynomial::zero();
        }

        Polynomial {
            terms: self
                .terms
                .iter()
                .map(|(m, c)| (m.clone(), c * factor))
                .collect(),
        }
    }

    fn mul_monomial(&self, monomial: &Monomial) -> Polynomial {
        Polynomial {
            terms: self
                .terms
                .iter()
                .map(|(m, c)| (m.mul(monomial), c.clone()))
                .collect(),
        }
    }

    pub(crate) fn mul(&self, other: &Polynomial) -> Polynomial {
        let mut product = Polynomial::zero();

        for (m, c) in &other.terms {
            product = product.add(&self.mul_monomial(m).scale(c));
        }

        product
    }

    /// The largest monomial which divides every term (exponents may be
    /// negative).
    fn common_monomial(&self) -> Monomial {
        let mut symbols: Vec<&Symbol> = self
            .terms
            .keys()
            .flat_map(|m| m.powers.keys())
            .collect();
        symbols.sort();
        symbols.dedup();

        let powers = symbols
            .into_iter()
            .filter_map(|symbol| {
                let lowest = self
                    .terms
                    .keys()
                    .map(|m| m.exponent_of(symbol))
                    .min()
                    .unwrap_or(0);

                if lowest == 0 {
                    None
                } else {
                    Some((symbol.clone(), lowest))
                }
            })
            .collect();

        Monomial { powers }
    }

    /// If `self == k * m * divisor` for some constant `k` and monomial `m`,
    /// return `k * m`.
    fn single_term_quotient(
        &self,
        divisor: &Polynomial,
    ) -> Option<(Monomial, BigRational)> {
        if self.len() != divisor.len() {
            return None;
        }
        let (lead_monomial, lead_coefficient) = divisor.leading()?;

        self.terms.iter().find_map(|(m, c)| {
            let monomial = m.mul(&lead_monomial.inverse());
            let coefficient = c / lead_coefficient;
            let candidate = divisor.mul_monomial(&monomial).scale(&coefficient);

            if &candidate == self {
                Some((monomial, coefficient))
            } else {
                None
            }
        })
    }

    /// The factor which clears every rational coefficient and negative
    /// exponent across all the provided polynomials.
    fn clearing_factor(polynomials: &[&Polynomial]) -> (BigInt, Monomial) {
        let mut denominator = BigInt::one();
        let mut powers = BTreeMap::new();

        for (monomial, coefficient) in
            polynomials.iter().flat_map(|p| p.terms.iter())
        {
            denominator = denominator.lcm(coefficient.denom());

            for (symbol, &exponent) in &monomial.powers {
                if exponent < 0 {
                    let entry = powers.entry(symbol.clone()).or_insert(0);
                    *entry = std::cmp::max(*entry, -exponent);
                }
            }
        }

        (denominator, Monomial { powers })
    }

    /// Render the terms as a sum, highest degree first and ties broken by
    /// monomial order.
    fn to_sum(&self) -> Expression {
        let mut ordered: Vec<_> = self.terms.iter().collect();
        ordered.sort_by(|(left, _), (right, _)| {
            right.degree().cmp(&left.degree()).then_with(|| left.cmp(right))
        });

        let mut terms: Vec<Expression> = ordered
            .into_iter()
            .map(|(monomial, coefficient)| render_term(monomial, coefficient))
            .collect();

        match terms.len() {
            0 => Expression::zero(),
            1 => terms.remove(0),
            _ => Expression::Sum(terms),
        }
    }
}

fn render_term(monomial: &Monomial, coefficient: &BigRational) -> Expression {
    let mut factors = monomial.to_factors();

    if factors.is_empty() {
        return Expression::Rational(coefficient.clone());
    }

    if !coefficient.is_one() {
        factors.insert(0, Expression::Rational(coefficient.clone()));
    }

    match factors.len() {
        1 => factors.remove(0),
        _ => Expression::Product(factors),
    }
}

/// A quotient of two [`Polynomial`]s, kept normalised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RationalFunction {
    numerator: Polynomial,
    denominator: Polynomial,
}

impl RationalFunction {
    pub(crate) fn zero() -> Self {
        RationalFunction::from(Polynomial::zero())
    }

    pub(crate) fn new(
        numerator: Polynomial,
        denominator: Polynomial,
    ) -> Result<Self, ArithmeticError> {
        if denominator.is_zero() {
            return Err(ArithmeticError::DivisionByZero);
        }
        if numerator.is_zero() {
            return Ok(RationalFunction::zero());
        }

        // monomials are units in a Laurent ring, so they can always be moved
        // into the numerator
        let common = denominator.common_monomial().inverse();
        let numerator = numerator.mul_monomial(&common);
        let denominator = denominator.mul_monomial(&common);

        if let Some(constant) = denominator.as_constant() {
            let scale = BigRational::one() / constant;
            return Ok(RationalFunction::from(numerator.scale(&scale)));
        }

        if let Some((monomial, coefficient)) =
            numerator.single_term_quotient(&denominator)
        {
            return Ok(RationalFunction::from(Polynomial::term(
                monomial,
                coefficient,
            )));
        }

        let lead = denominator
            .leading()
            .map(|(_, c)| c.clone())
            .expect("The denominator is non-zero");
        let scale = BigRational::one() / lead;

        Ok(RationalFunction {
            numerator: numerator.scale(&scale),
            denominator: denominator.scale(&scale),
        })
    }

    pub(crate) fn is_zero(&self) -> bool { self.numerator.is_zero() }

    pub(crate) fn add(
        &self,
        other: &RationalFunction,
    ) -> Result<Self, ArithmeticError> {
        if self.denominator == other.denominator {
            return RationalFunction::new(
                self.numerator.add(&other.numerator),
                self.denominator.clone(),
            );
        }

        RationalFunction::new(
            self.numerator
                .mul(&other.denominator)
                .add(&other.numerator.mul(&self.denominator)),
            self.denominator.mul(&other.denominator),
        )
    }

    pub(crate) fn neg(&self) -> Self {
        RationalFunction {
            numerator: self.numerator.neg(),
            denominator: self.denominator.clone(),
        }
    }

    pub(crate) fn mul(
        &self,
        other: &RationalFunction,
    ) -> Result<Self, ArithmeticError> {
        RationalFunction::new(
            self.numerator.mul(&other.numerator),
            self.denominator.mul(&other.denominator),
        )
    }

    pub(crate) fn recip(&self) -> Result<Self, ArithmeticError> {
        RationalFunction::new(self.denominator.clone(), self.numerator.clone())
    }

    pub(crate) fn div(
        &self,
        other: &RationalFunction,
    ) -> Result<Self, ArithmeticError> {
        self.mul(&other.recip()?)
    }

    pub(crate) fn pow(&self, exponent: i64) -> Result<Self, ArithmeticError> {
        let mut base =
            if exponent < 0 { self.recip()? } else { self.clone() };
        let mut result = RationalFunction::from(Polynomial::constant(
            BigRational::one(),
        ));

        // exponentiation by squaring
        let mut remaining = exponent.unsigned_abs();
        while remaining > 0 {
            if remaining & 1 == 1 {
                result = result.mul(&base)?;
            }
            remaining >>= 1;
            if remaining > 0 {
                base = base.mul(&base)?;
            }
        }

        Ok(result)
    }

    /// Convert an arbitrary [`Expression`] tree into normal form.
    pub(crate) fn from_expression(
        expr: &Expression,
    ) -> Result<Self, ArithmeticError> {
        match expr {
            Expression::Rational(r) => {
                Ok(RationalFunction::from(Polynomial::constant(r.clone())))
            },
            Expression::Symbol(s) => {
                let monomial = Monomial::symbol(s.clone());
                Ok(RationalFunction::from(Polynomial::term(
                    monomial,
                    BigRational::one(),
                )))
            },
            Expression::Sum(terms) => {
                terms.iter().try_fold(RationalFunction::zero(), |acc, term| {
                    acc.add(&RationalFunction::from_expression(term)?)
                })
            },
            Expression::Product(factors) => {
                let one = RationalFunction::from(Polynomial::constant(
                    BigRational::one(),
                ));
                factors.iter().try_fold(one, |acc, factor| {
                    acc.mul(&RationalFunction::from_expression(factor)?)
                })
            },
            Expression::Power { base, exponent } => {
                RationalFunction::from_expression(base)?.pow(*exponent)
            },
            Expression::Quotient {
                numerator,
                denominator,
            } => RationalFunction::from_expression(numerator)?
                .div(&RationalFunction::from_expression(denominator)?),
        }
    }

    /// Convert back to an [`Expression`], gathering every fractional
    /// coefficient and negative power into a single denominator.
    pub(crate) fn to_expression(&self) -> Expression {
        if let (Some(numerator), Some(denominator)) =
            (self.numerator.as_constant(), self.denominator.as_constant())
        {
            return Expression::Rational(numerator / denominator);
        }

        let (scale, monomial) = Polynomial::clearing_factor(&[
            &self.numerator,
            &self.denominator,
        ]);
        let scale = BigRational::from_integer(scale);

        let numerator = self.numerator.mul_monomial(&monomial).scale(&scale);
        let denominator =
            self.denominator.mul_monomial(&monomial).scale(&scale);

        match denominator.as_constant() {
            Some(c) if c.is_one() => numerator.to_sum(),
            Some(c) if c.is_negative() => Expression::Quotient {
                numerator: Box::new(numerator.neg().to_sum()),
                denominator: Box::new(Expression::Rational(-c)),
            },
            _ => Expression::Quotient {
                numerator: Box::new(numerator.to_sum()),
                denominator: Box::new(denominator.to_sum()),
            },
        }
    }
}

impl From<Polynomial> for RationalFunction {
    fn from(numerator: Polynomial) -> Self {
        RationalFunction {
            numerator,
            denominator: Polynomial::constant(BigRational::one()),
        }
    }
}
