use crate::algebra::ops::{self, ArithmeticError};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};
use smol_str::SmolStr;
use std::{
    cmp::Ordering,
    fmt::{self, Display, Formatter},
    ops::{Add, Div, Mul, Neg, Sub},
};

/// An exact symbolic expression.
///
/// Operator overloads fold rational constants as they go and flatten nested
/// sums and products, but anything involving a [`Symbol`] is left as a tree
/// until [`ops::simplify()`] puts it into canonical form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    Rational(BigRational),
    Symbol(Symbol),
    Sum(Vec<Expression>),
    Product(Vec<Expression>),
    /// A base raised to an integer power.
    Power {
        base: Box<Expression>,
        exponent: i64,
    },
    Quotient {
        numerator: Box<Expression>,
        denominator: Box<Expression>,
    },
}

impl Expression {
    pub fn zero() -> Self { Expression::Rational(BigRational::zero()) }

    pub fn one() -> Self { Expression::Rational(BigRational::one()) }

    pub fn integer(value: i64) -> Self {
        Expression::Rational(BigRational::from_integer(BigInt::from(value)))
    }

    /// Create the exact fraction `numerator/denominator`.
    ///
    /// # Panics
    ///
    /// If `denominator` is zero.
    pub fn fraction(numerator: i64, denominator: i64) -> Self {
        assert_ne!(denominator, 0, "A fraction can't have a zero denominator");
        Expression::Rational(BigRational::new(
            BigInt::from(numerator),
            BigInt::from(denominator),
        ))
    }

    pub fn symbol<S: Into<SmolStr>>(name: S) -> Self {
        Expression::Symbol(Symbol::named(name))
    }

    pub fn as_rational(&self) -> Option<&BigRational> {
        match self {
            Expression::Rational(r) => Some(r),
            _ => None,
        }
    }

    /// Is this the rational constant `0`?
    ///
    /// This is a structural check. Use [`ops::simplify()`] first if the
    /// expression may not be in canonical form.
    pub fn is_zero(&self) -> bool {
        self.as_rational().map(Zero::is_zero).unwrap_or(false)
    }

    pub fn is_one(&self) -> bool {
        self.as_rational().map(One::is_one).unwrap_or(false)
    }

    pub fn pow(self, exponent: i64) -> Expression {
        match (self, exponent) {
            (_, 0) => Expression::one(),
            (base, 1) => base,
            (Expression::Rational(r), n) if n > 0 => {
                Expression::Rational(num_traits::pow(r, n as usize))
            },
            (base, exponent) => Expression::Power {
                base: Box::new(base),
                exponent,
            },
        }
    }

    /// Divide by `divisor`, rejecting divisors which are identically zero.
    pub fn checked_div(
        self,
        divisor: Expression,
    ) -> Result<Expression, ArithmeticError> {
        if ops::simplify(&divisor)?.is_zero() {
            return Err(ArithmeticError::DivisionByZero);
        }

        Ok(self / divisor)
    }

    /// Iterate over every [`Symbol`] this expression mentions.
    pub fn symbols(&self) -> Box<dyn Iterator<Item = &Symbol> + '_> {
        match self {
            Expression::Rational(_) => Box::new(std::iter::empty()),
            Expression::Symbol(s) => Box::new(std::iter::once(s)),
            Expression::Sum(items) | Expression::Product(items) => {
                Box::new(items.iter().flat_map(|item| item.symbols()))
            },
            Expression::Power { base, .. } => base.symbols(),
            Expression::Quotient {
                numerator,
                denominator,
            } => Box::new(numerator.symbols().chain(denominator.symbols())),
        }
    }

    pub fn depends_on(&self, symbol: &Symbol) -> bool {
        self.symbols().any(|s| s == symbol)
    }

    /// Does this expression contain a quotient or a negative power?
    fn contains_division(&self) -> bool {
        match self {
            Expression::Rational(_) | Expression::Symbol(_) => false,
            Expression::Sum(items) | Expression::Product(items) => {
                items.iter().any(Expression::contains_division)
            },
            Expression::Power { base, exponent } => {
                *exponent < 0 || base.contains_division()
            },
            Expression::Quotient { .. } => true,
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Expression::Sum(_) => 1,
            _ if self.is_negative_term() => 2,
            Expression::Rational(r) if !r.is_integer() => 3,
            Expression::Product(_) | Expression::Quotient { .. } => 3,
            Expression::Power { .. } => 4,
            Expression::Rational(_) | Expression::Symbol(_) => 5,
        }
    }

    /// Does this term print with a leading minus sign?
    fn is_negative_term(&self) -> bool {
        match self {
            Expression::Rational(r) => r.is_negative(),
            Expression::Product(factors) => factors
                .first()
                .and_then(Expression::as_rational)
                .map(Signed::is_negative)
                .unwrap_or(false),
            Expression::Quotient { numerator, .. } => {
                numerator.is_negative_term()
            },
            _ => false,
        }
    }

    /// The same term without its leading minus sign.
    fn abs_term(&self) -> Expression {
        match self {
            Expression::Rational(r) => Expression::Rational(r.abs()),
            Expression::Product(factors) => {
                let mut factors = factors.clone();
                if let Some(Expression::Rational(r)) = factors.first_mut() {
                    *r = r.abs();
                }
                if factors.first().map(Expression::is_one).unwrap_or(false)
                    && factors.len() > 1
                {
                    factors.remove(0);
                }

                match factors.len() {
                    1 => factors.remove(0),
                    _ => Expression::Product(factors),
                }
            },
            Expression::Quotient {
                numerator,
                denominator,
            } => Expression::Quotient {
                numerator: Box::new(numerator.abs_term()),
                denominator: denominator.clone(),
            },
            other => other.clone(),
        }
    }
}

/// A named unknown (e.g. `f_3`, `f'_0`, or `h`).
///
/// Symbols are ordered "naturally", so embedded numbers compare by value and
/// `a_2 < a_10 < a_n`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Symbol {
    name: SmolStr,
}

impl Symbol {
    pub fn named<S: Into<SmolStr>>(name: S) -> Self {
        Symbol { name: name.into() }
    }

    pub fn name(&self) -> &str { &self.name }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl PartialOrd for Symbol {
    fn partial_cmp(&self, other: &Symbol) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Symbol {
    fn cmp(&self, other: &Symbol) -> Ordering {
        natural_cmp(&self.name, &other.name)
            .then_with(|| self.name.cmp(&other.name))
    }
}

/// Compare two strings, treating each run of ASCII digits as a number.
fn natural_cmp(left: &str, right: &str) -> Ordering {
    let mut left = Chunks(left);
    let mut right = Chunks(right);

    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => {
                let ordering = match (l.parse::<BigInt>(), r.parse::<BigInt>())
                {
                    (Ok(l), Ok(r)) => l.cmp(&r),
                    _ => l.cmp(r),
                };

                if ordering != Ordering::Equal {
                    return ordering;
                }
            },
        }
    }
}

/// Splits a string into alternating runs of digits and non-digits.
struct Chunks<'a>(&'a str);

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let first = self.0.chars().next()?;
        let digits = first.is_ascii_digit();
        let end = self
            .0
            .char_indices()
            .find(|(_, c)| c.is_ascii_digit() != digits)
            .map(|(ix, _)| ix)
            .unwrap_or(self.0.len());

        let (chunk, rest) = self.0.split_at(end);
        self.0 = rest;
        Some(chunk)
    }
}

// define some operator overloads to make constructing an expression easier.

impl Add for Expression {
    type Output = Expression;

    fn add(self, rhs: Expression) -> Expression {
        match (self, rhs) {
            (Expression::Rational(l), Expression::Rational(r)) => {
                Expression::Rational(l + r)
            },
            (l, r) if l.is_zero() => r,
            (l, r) if r.is_zero() => l,
            (Expression::Sum(mut l), Expression::Sum(r)) => {
                l.extend(r);
                Expression::Sum(l)
            },
            (Expression::Sum(mut l), r) => {
                l.push(r);
                Expression::Sum(l)
            },
            (l, Expression::Sum(mut r)) => {
                r.insert(0, l);
                Expression::Sum(r)
            },
            (l, r) => Expression::Sum(vec![l, r]),
        }
    }
}

impl Sub for Expression {
    type Output = Expression;

    fn sub(self, rhs: Expression) -> Expression { self + -rhs }
}

impl Mul for Expression {
    type Output = Expression;

    fn mul(self, rhs: Expression) -> Expression {
        match (self, rhs) {
            (Expression::Rational(l), Expression::Rational(r)) => {
                Expression::Rational(l * r)
            },
            // a zero can't absorb a factor which may itself divide by zero
            (l, r) if l.is_zero() && !r.contains_division() => {
                Expression::zero()
            },
            (l, r) if r.is_zero() && !l.contains_division() => {
                Expression::zero()
            },
            (l, r) if l.is_one() => r,
            (l, r) if r.is_one() => l,
            (Expression::Product(mut l), Expression::Product(r)) => {
                l.extend(r);
                Expression::Product(l)
            },
            (Expression::Product(mut l), r) => {
                l.push(r);
                Expression::Product(l)
            },
            (l, Expression::Product(mut r)) => {
                r.insert(0, l);
                Expression::Product(r)
            },
            (l, r) => Expression::Product(vec![l, r]),
        }
    }
}

impl Div for Expression {
    type Output = Expression;

    /// Build `self / rhs`.
    ///
    /// Nothing is checked here, a zero denominator is only reported when the
    /// quotient gets simplified. See [`Expression::checked_div()`].
    fn div(self, rhs: Expression) -> Expression {
        match (self, rhs) {
            (Expression::Rational(l), Expression::Rational(r))
                if !r.is_zero() =>
            {
                Expression::Rational(l / r)
            },
            (l, r) if r.is_one() => l,
            (l, r) => Expression::Quotient {
                numerator: Box::new(l),
                denominator: Box::new(r),
            },
        }
    }
}

impl Neg for Expression {
    type Output = Expression;

    fn neg(self) -> Self::Output {
        match self {
            Expression::Rational(r) => Expression::Rational(-r),
            Expression::Product(mut factors) => {
                match factors.first_mut() {
                    Some(Expression::Rational(r)) => *r = -r.clone(),
                    _ => factors.insert(0, Expression::integer(-1)),
                }
                if factors[0].is_one() {
                    factors.remove(0);
                }

                match factors.len() {
                    1 => factors.remove(0),
                    _ => Expression::Product(factors),
                }
            },
            other => Expression::Product(vec![Expression::integer(-1), other]),
        }
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Rational(r) => {
                if r.is_integer() {
                    write!(f, "{}", r.numer())
                } else {
                    write!(f, "{}/{}", r.numer(), r.denom())
                }
            },
            Expression::Symbol(s) => write!(f, "{}", s),
            Expression::Sum(terms) => {
                for (i, term) in terms.iter().enumerate() {
                    if i == 0 {
                        write!(f, "{}", term)?;
                    } else if term.is_negative_term() {
                        write!(f, " - ")?;
                        write_operand(&term.abs_term(), 1, f)?;
                    } else {
                        write!(f, " + ")?;
                        write_operand(term, 0, f)?;
                    }
                }
                Ok(())
            },
            Expression::Product(factors) => {
                if self.is_negative_term() {
                    write!(f, "-")?;
                    return write_operand(&self.abs_term(), 2, f);
                }

                for (i, factor) in factors.iter().enumerate() {
                    if i > 0 {
                        write!(f, "*")?;
                    }
                    write_operand(factor, 3, f)?;
                }
                Ok(())
            },
            Expression::Power { base, exponent } => {
                write_operand(base, 4, f)?;
                write!(f, "^{}", exponent)
            },
            Expression::Quotient {
                numerator,
                denominator,
            } => {
                write_operand(numerator, 1, f)?;
                write!(f, "/")?;
                write_operand(denominator, 3, f)
            },
        }
    }
}

/// Write an operand, wrapping it in parentheses when it binds no tighter than
/// `threshold`.
fn write_operand(
    expr: &Expression,
    threshold: u8,
    f: &mut Formatter<'_>,
) -> fmt::Result {
    if expr.precedence() <= threshold {
        write!(f, "({})", expr)
    } else {
        write!(f, "{}", expr)
    }
}
