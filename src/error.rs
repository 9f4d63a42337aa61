//! Fatal diagnostics raised by the generator.
//!
//! Undefined behavior detected while evaluating an expression is never an
//! `Err` here — it lives on [`crate::value::TypedValue`] as a [`crate::value::UbCode`]
//! and is resolved by the expression constructor's rebuild step. Anything
//! that reaches [`GenError`] is a programmer error: invalid IR, an
//! unsupported type tag, or a malformed CLI/config/environment input.

use std::io;
use thiserror::Error;

use crate::types::ScalarKind;

/// Fatal error variants produced while building or emitting a program.
#[derive(Debug, Error)]
pub enum GenError {
    /// A node constructor observed IR that should be structurally
    /// impossible: a null/missing child, a variant mismatch, or a UB code
    /// that survived past the rebuild step.
    #[error("invalid IR in {node}: {detail}")]
    InvalidIr {
        /// Name of the node kind that detected the problem.
        node: &'static str,
        /// Human-readable description of the inconsistency.
        detail: String,
    },

    /// A scalar type tag was used somewhere it isn't supported (e.g. a
    /// bit-field declared on a non-integer base type).
    #[error("unsupported scalar type: {0:?}")]
    UnsupportedType(ScalarKind),

    /// The seed string, `--std` value, or JSON configuration failed to
    /// parse or validate.
    #[error("bad configuration: {0}")]
    BadConfig(String),

    /// Output directory could not be created or written to.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The JSON configuration file was not valid JSON, or didn't match the
    /// expected shape.
    #[error("invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl GenError {
    /// Build an [`GenError::InvalidIr`] with a formatted detail message.
    pub fn invalid_ir(node: &'static str, detail: impl Into<String>) -> Self {
        Self::InvalidIr {
            node,
            detail: detail.into(),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GenError>;
