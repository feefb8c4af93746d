use crate::algebra::Expression;
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::Num;
use std::{iter::Peekable, ops::Range, str::FromStr};

/// Parse an [`Expression`] tree from some text.
pub fn parse(s: &str) -> Result<Expression, ParseError> {
    Parser::new(s).parse()
}

impl FromStr for Expression {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> { parse(s) }
}

/// A simple recursive descent parser (`LL(1)`) for converting a string into an
/// expression tree.
///
/// The grammar:
///
/// ```text
/// expression     := term (("+" | "-") term)*
///
/// term           := unary (("*" | "/") unary)*
///
/// unary          := "-" unary
///                 | power
///
/// power          := factor ("^" "-"? NUMBER)?
///
/// factor         := IDENTIFIER
///                 | "(" expression ")"
///                 | NUMBER
/// ```
///
/// Numbers are read exactly, so `0.25` becomes the rational `1/4`.
#[derive(Debug, Clone)]
pub(crate) struct Parser<'a> {
    tokens: Peekable<Lexer<'a>>,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(src: &'a str) -> Self {
        Parser {
            tokens: Lexer::new(src).peekable(),
        }
    }

    pub(crate) fn parse(mut self) -> Result<Expression, ParseError> {
        let expr = self.expression()?;

        match self.tokens.next() {
            None => Ok(expr),
            Some(Ok(token)) => Err(ParseError::TrailingInput {
                found: token.kind,
                span: token.span,
            }),
            Some(Err(e)) => Err(e),
        }
    }

    fn peek(&mut self) -> Option<TokenKind> {
        self.tokens
            .peek()
            .and_then(|result| result.as_ref().ok())
            .map(|tok| tok.kind)
    }

    fn advance(&mut self) -> Result<Token<'a>, ParseError> {
        match self.tokens.next() {
            Some(result) => result,
            None => Err(ParseError::UnexpectedEndOfInput),
        }
    }

    fn expression(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.term()?;

        loop {
            match self.peek() {
                Some(TokenKind::Plus) => {
                    let _ = self.advance()?;
                    left = left + self.term()?;
                },
                Some(TokenKind::Minus) => {
                    let _ = self.advance()?;
                    left = left - self.term()?;
                },
                _ => return Ok(left),
            }
        }
    }

    fn term(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.unary()?;

        loop {
            match self.peek() {
                Some(TokenKind::Times) => {
                    let _ = self.advance()?;
                    left = left * self.unary()?;
                },
                Some(TokenKind::Divide) => {
                    let _ = self.advance()?;
                    left = left / self.unary()?;
                },
                _ => return Ok(left),
            }
        }
    }

    fn unary(&mut self) -> Result<Expression, ParseError> {
        if self.peek() == Some(TokenKind::Minus) {
            let _ = self.advance()?;
            let operand = self.unary()?;
            return Ok(-operand);
        }

        self.power()
    }

    fn power(&mut self) -> Result<Expression, ParseError> {
        let base = self.factor()?;

        if self.peek() != Some(TokenKind::Caret) {
            return Ok(base);
        }
        let _ = self.advance()?;

        let negative = self.peek() == Some(TokenKind::Minus);
        if negative {
            let _ = self.advance()?;
        }

        let token = self.advance()?;
        if token.kind != TokenKind::Number {
            return Err(ParseError::UnexpectedToken {
                found: token.kind,
                span: token.span,
                expected: &[TokenKind::Number],
            });
        }

        let exponent: i64 =
            token.text.parse().map_err(|_| ParseError::InvalidExponent {
                span: token.span.clone(),
            })?;

        Ok(base.pow(if negative { -exponent } else { exponent }))
    }

    fn factor(&mut self) -> Result<Expression, ParseError> {
        let expected = &[
            TokenKind::Number,
            TokenKind::Identifier,
            TokenKind::Minus,
            TokenKind::OpenParen,
        ];

        match self.peek() {
            Some(TokenKind::Number) => {
                return self.number();
            },
            Some(TokenKind::Identifier) => {
                let ident = self.advance()?;
                return Ok(Expression::symbol(ident.text));
            },
            Some(TokenKind::OpenParen) => {
                let _ = self.advance()?;
                let expr = self.expression()?;
                let close_paren = self.advance()?;

                if close_paren.kind == TokenKind::CloseParen {
                    return Ok(expr);
                } else {
                    return Err(ParseError::UnexpectedToken {
                        found: close_paren.kind,
                        span: close_paren.span,
                        expected: &[TokenKind::CloseParen],
                    });
                }
            },
            _ => {},
        }

        // we couldn't parse the factor, return a nice error
        match self.tokens.next() {
            Some(Ok(Token { span, kind, .. })) => {
                Err(ParseError::UnexpectedToken {
                    found: kind,
                    expected,
                    span,
                })
            },
            Some(Err(e)) => Err(e),
            None => Err(ParseError::UnexpectedEndOfInput),
        }
    }

    fn number(&mut self) -> Result<Expression, ParseError> {
        let token = self
            .tokens
            .next()
            .ok_or(ParseError::UnexpectedEndOfInput)??;

        debug_assert_eq!(token.kind, TokenKind::Number);
        Ok(Expression::Rational(exact_decimal(token.text)))
    }
}

/// Read a decimal literal like `31`, `31.` or `3.14` as an exact rational.
fn exact_decimal(text: &str) -> BigRational {
    let (whole, fraction) = match text.find('.') {
        Some(ix) => (&text[..ix], &text[ix + 1..]),
        None => (text, ""),
    };

    let digits = format!("{}{}", whole, fraction);
    let numerator = BigInt::from_str_radix(&digits, 10)
        .expect("Guaranteed correct by the lexer");
    let denominator = num_traits::pow(BigInt::from(10), fraction.len());

    BigRational::new(numerator, denominator)
}

/// Possible errors that may occur while parsing.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid character {character:?} at index {index}")]
    InvalidCharacter { character: char, index: usize },
    #[error("unexpected end of input")]
    UnexpectedEndOfInput,
    #[error("found a {found:?} at {span:?} but expected one of {expected:?}")]
    UnexpectedToken {
        found: TokenKind,
        span: Range<usize>,
        expected: &'static [TokenKind],
    },
    #[error("the exponent at {span:?} doesn't fit in an integer")]
    InvalidExponent { span: Range<usize> },
    #[error("unexpected {found:?} at {span:?} after the end of the expression")]
    TrailingInput { found: TokenKind, span: Range<usize> },
}

/// Splits the source text into [`Token`]s, skipping whitespace.
#[derive(Debug, Clone, PartialEq)]
struct Lexer<'a> {
    src: &'a str,
    cursor: usize,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self { Lexer { src, cursor: 0 } }

    fn current(&self) -> Option<char> {
        self.src[self.cursor..].chars().next()
    }

    fn bump(&mut self) {
        if let Some(c) = self.current() {
            self.cursor += c.len_utf8();
        }
    }

    fn bump_while<P>(&mut self, predicate: P)
    where
        P: Fn(char) -> bool,
    {
        while self.current().map_or(false, &predicate) {
            self.bump();
        }
    }

    fn token(&self, start: usize, kind: TokenKind) -> Token<'a> {
        Token::from_text(self.src, start..self.cursor, kind)
    }

    fn lex_token(&mut self, first: char) -> Result<Token<'a>, ParseError> {
        let start = self.cursor;
        self.bump();

        let kind = match first {
            '(' => TokenKind::OpenParen,
            ')' => TokenKind::CloseParen,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Times,
            '/' => TokenKind::Divide,
            '^' => TokenKind::Caret,
            '0'..='9' => {
                self.bump_while(|c| c.is_ascii_digit());
                if self.current() == Some('.') {
                    self.bump();
                    self.bump_while(|c| c.is_ascii_digit());
                }
                TokenKind::Number
            },
            // primes are allowed so we can write derivatives like f'_0
            '_' | 'a'..='z' | 'A'..='Z' => {
                self.bump_while(|c| {
                    c.is_alphanumeric() || c == '_' || c == '\''
                });
                TokenKind::Identifier
            },
            character => {
                return Err(ParseError::InvalidCharacter {
                    character,
                    index: start,
                })
            },
        };

        Ok(self.token(start, kind))
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token<'a>, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.bump_while(char::is_whitespace);
        let first = self.current()?;

        Some(self.lex_token(first))
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Token<'a> {
    text: &'a str,
    span: Range<usize>,
    kind: TokenKind,
}

impl<'a> Token<'a> {
    fn from_text(
        original_source: &'a str,
        span: Range<usize>,
        kind: TokenKind,
    ) -> Self {
        Token {
            text: &original_source[span.clone()],
            span,
            kind,
        }
    }
}

/// The kinds of token that can appear in an [`Expression`]'s text form.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum TokenKind {
    Identifier,
    Number,
    OpenParen,
    CloseParen,
    Plus,
    Minus,
    Times,
    Divide,
    Caret,
}
