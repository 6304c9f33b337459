//! Top-level error type and pass-result alias, modeled on
//! `plotnik-compiler`'s `Error`/`PassResult`.

use crate::diagnostics::Diagnostics;
use thiserror::Error;

/// Conditions that make it impossible to produce even a partial result.
/// Ordinary user-facing compile errors are not represented here: they live
/// in a stage's [`Diagnostics`] and are surfaced through `PassResult`'s
/// `Ok((value, diagnostics))` arm with `diagnostics.has_errors()` set.
#[derive(Debug, Error)]
pub enum Error {
    #[error("fixed-point analysis did not converge within the iteration budget")]
    FuelExhausted,
    #[error("recursion limit exceeded while compiling nested control flow")]
    RecursionLimitExceeded,
    #[error("compilation failed with {} error(s)", .0.error_count())]
    CompileFailed(Diagnostics),
    #[error("internal compiler error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// A pipeline stage's result: the happy path always carries its
/// diagnostics (warnings survive success), while `Error` is reserved for
/// conditions that prevent producing a result at all.
pub type PassResult<T> = std::result::Result<(T, Diagnostics), Error>;
