//! The symbolic algebra system.

mod canonical;
mod expr;
mod matrix;
pub mod ops;
mod parse;

pub use expr::{Expression, Symbol};
pub use matrix::{Matrix, RaggedRows};
pub use ops::{ArithmeticError, EvaluationError};
pub use parse::{parse, ParseError, TokenKind};

/// The augmented matrix a derivation works on.
pub type SymbolicMatrix = Matrix<Expression>;
