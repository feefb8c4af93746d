//! Exact symbolic derivation of finite-difference stencils and multistep
//! (predictor) coefficients of arbitrary order.
//!
//! A formula is derived in three stages:
//!
//! 1. [`builder::build()`] lays out the Taylor constraints as an augmented
//!    matrix of exact [`algebra::Expression`]s
//! 2. [`elimination::eliminate()`] reduces the matrix with Gauss-Jordan
//!    elimination over the rationals
//! 3. [`extract::extract()`] reads the closed form out of the last row
//!
//! ```rust
//! use stencils::{derive, Config};
//!
//! let formula = derive(&Config::stencil(2)).unwrap();
//!
//! assert_eq!(formula.to_string(), "(3*f_0 - 4*f_1 + f_2)/(2*h)");
//! ```

#[cfg(test)]
#[macro_use]
extern crate pretty_assertions;

pub mod algebra;
pub mod builder;
mod derivation;
pub mod elimination;
pub mod extract;

pub use derivation::{
    derive, derive_with, Config, DerivationError, Formula, UnknownVariant,
    Variant,
};
pub use elimination::Step;
