//! Error type returned by [`super::generate`].
//!
//! Almost everything codegen touches has already been validated by the type
//! checker, so most invariant violations are `unreachable!()` rather than a
//! variant here. This type exists for the one thing the checker can't have
//! validated: the shape of the `IrArena` handed in at the public boundary.

use std::fmt;

#[derive(Debug)]
pub enum CodeGenError {
    /// An internal invariant the codegen relies on didn't hold, e.g. the
    /// item passed to [`super::generate`] has no body.
    Logic(String),
}

impl fmt::Display for CodeGenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodeGenError::Logic(msg) => write!(f, "codegen error: {msg}"),
        }
    }
}

impl std::error::Error for CodeGenError {}
