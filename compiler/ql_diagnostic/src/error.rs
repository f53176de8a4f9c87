//! The error type shared by the walker and the evaluator.
//!
//! Every error carries `{kind, message, backtrace}`. The kind is structured
//! so callers can match on it, the message is what the client sees, and the
//! backtrace points at the term that raised it.

use std::fmt;

use ql_ir::{Backtrace, DatumType, TermKind};

/// Coarse error classes.
///
/// Structural and construction errors are raised before evaluation starts;
/// the remaining classes are raised while a query runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Ill-formed tree (write placement, sort directions, depth, options).
    Structural,
    /// Operand count or shape rejected when a term is constructed.
    Construction,
    /// An operand had the wrong type at runtime.
    Type,
    /// An operand had an illegal value at runtime.
    Value,
    /// The execution environment cancelled the query.
    Interrupted,
    /// Broken internal contract.
    Internal,
}

/// Structured error kind.
///
/// `Display` produces the user-facing message.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ErrorKind {
    // Structural
    #[error(
        "{term} is not allowed here: cannot nest writes or meta operations in stream \
         operations or other writes. Use FOR_EACH instead."
    )]
    WriteNotAllowed { term: TermKind },
    #[error("{term} may only be used as an argument to ORDER_BY.")]
    SortDirectionOutsideOrderBy { term: TermKind },
    #[error("Duplicate optional argument `{name}` on {term}.")]
    DuplicateOptArg { term: TermKind, name: String },
    #[error("Maximum expression depth of {limit} exceeded.")]
    MaxDepthExceeded { limit: usize },

    // Construction
    #[error("Expected {expected} but found {got}.")]
    ArityMismatch {
        term: TermKind,
        expected: String,
        got: usize,
    },
    #[error("{reason}")]
    InvalidOperand { term: TermKind, reason: String },

    // Type
    #[error("Expected type {expected} but found {got}.")]
    TypeMismatch { expected: String, got: String },
    #[error("Cannot perform {op} on {left} and {right}.")]
    BinaryTypeMismatch {
        op: TermKind,
        left: DatumType,
        right: DatumType,
    },
    #[error("Expected type FUNCTION but found {type_name}.")]
    NotCallable { type_name: String },
    #[error("Number not an integer: {value}.")]
    NotAnInteger { value: String },

    // Value
    #[error("Cannot divide by zero.")]
    DivisionByZero,
    #[error("Cannot take a number modulo 0.")]
    ModuloByZero,
    #[error("Non-finite number: {value}.")]
    NonFiniteNumber { value: String },
    #[error("Number not an integer (out of exact range): {value}.")]
    IntegerOutOfRange { value: String },
    #[error("Expected {expected} {} but found {got}.", arguments(.expected))]
    WrongArgCount { expected: usize, got: usize },
    #[error("Unrecognized variable {var}.")]
    UndefinedVariable { var: i64 },
    #[error("Maximum function call depth of {limit} exceeded.")]
    CallDepthExceeded { limit: usize },
    #[error("{message}")]
    Custom { message: String },

    // Interrupted
    #[error("Query interrupted.")]
    Interrupted,

    // Internal
    #[error("{term} is not supported by this evaluator.")]
    Unsupported { term: TermKind },
    #[error("Internal error: {message}.")]
    Internal { message: String },
}

#[expect(
    clippy::trivially_copy_pass_by_ref,
    reason = "error format arguments receive fields by reference"
)]
fn arguments(count: &usize) -> &'static str {
    if *count == 1 {
        "argument"
    } else {
        "arguments"
    }
}

impl ErrorKind {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::WriteNotAllowed { .. }
            | Self::SortDirectionOutsideOrderBy { .. }
            | Self::DuplicateOptArg { .. }
            | Self::MaxDepthExceeded { .. } => ErrorCategory::Structural,

            Self::ArityMismatch { .. } | Self::InvalidOperand { .. } => {
                ErrorCategory::Construction
            }

            Self::TypeMismatch { .. }
            | Self::BinaryTypeMismatch { .. }
            | Self::NotCallable { .. }
            | Self::NotAnInteger { .. } => ErrorCategory::Type,

            Self::DivisionByZero
            | Self::ModuloByZero
            | Self::NonFiniteNumber { .. }
            | Self::IntegerOutOfRange { .. }
            | Self::WrongArgCount { .. }
            | Self::UndefinedVariable { .. }
            | Self::CallDepthExceeded { .. }
            | Self::Custom { .. } => ErrorCategory::Value,

            Self::Interrupted => ErrorCategory::Interrupted,

            Self::Unsupported { .. } | Self::Internal { .. } => ErrorCategory::Internal,
        }
    }
}

/// A query error with its position.
#[derive(Clone, Debug, PartialEq)]
pub struct QlError {
    pub kind: ErrorKind,
    /// User-facing message. Equals `kind.to_string()` for constructor-built errors.
    pub message: String,
    /// Path to the term that raised the error, once known.
    pub backtrace: Option<Backtrace>,
}

/// Result alias used across the front end.
pub type QlResult<T> = Result<T, QlError>;

impl QlError {
    /// Build an error from a kind; the message is the kind's `Display`.
    pub fn new(kind: ErrorKind) -> Self {
        let message = kind.to_string();
        Self {
            kind,
            message,
            backtrace: None,
        }
    }

    #[inline]
    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }

    #[inline]
    pub fn is_interrupt(&self) -> bool {
        matches!(self.kind, ErrorKind::Interrupted)
    }

    #[inline]
    pub fn backtrace(&self) -> Option<&Backtrace> {
        self.backtrace.as_ref()
    }

    /// Attach a backtrace, replacing any existing one.
    #[must_use]
    pub fn with_backtrace(mut self, backtrace: Backtrace) -> Self {
        self.backtrace = Some(backtrace);
        self
    }

    /// Attach `backtrace` only if the error has none yet.
    ///
    /// Used when an error crosses a term boundary: the innermost position
    /// wins, outer terms only fill in a missing one.
    #[must_use]
    pub fn or_backtrace(mut self, backtrace: Option<&Backtrace>) -> Self {
        if self.backtrace.is_none() {
            self.backtrace = backtrace.cloned();
        }
        self
    }
}

impl fmt::Display for QlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for QlError {}

impl From<ErrorKind> for QlError {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}
