//! Error types for sqltree-sql
//!
//! Statement construction knows exactly two failure modes. A
//! [`Error::StructuralInconsistency`] means a production matched by the
//! grammar arrived with none of its expected alternative children populated;
//! this is a grammar/builder contract violation and aborts the enclosing
//! build. An [`Error::UnsupportedConstruct`] means the input is syntactically
//! valid but intentionally rejected by this layer. Neither is recoverable:
//! there is no retry, no partial result and no silent default substitution.

use crate::cst::Span;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The result type for all builder entry points
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while constructing an AST from a CST
#[derive(Debug, Error, Clone, PartialEq, Serialize, Deserialize)]
pub enum Error {
    /// A production has none of its expected alternative children. Always a
    /// grammar/builder mismatch, never expected on valid input.
    #[error("structural inconsistency at {span}: {message}")]
    StructuralInconsistency { message: String, span: Span },

    /// A syntactically valid but intentionally unsupported combination.
    #[error("unsupported construct at {span}: {message}")]
    UnsupportedConstruct { message: String, span: Span },
}

impl Error {
    /// Create a structural inconsistency error
    pub fn structural(message: impl Into<String>, span: Span) -> Self {
        Error::StructuralInconsistency {
            message: message.into(),
            span,
        }
    }

    /// Create an unsupported construct error
    pub fn unsupported(message: impl Into<String>, span: Span) -> Self {
        Error::UnsupportedConstruct {
            message: message.into(),
            span,
        }
    }

    /// The source span the error points at
    pub fn span(&self) -> Span {
        match self {
            Error::StructuralInconsistency { span, .. } => *span,
            Error::UnsupportedConstruct { span, .. } => *span,
        }
    }
}
