//! Centralized error constructors.
//!
//! One function per error kind. Each builds the structured kind and the
//! message together so the two never drift apart. Callers attach the
//! backtrace of the term that raised the error.

use ql_ir::{Datum, DatumType, TermKind};

use crate::error::{ErrorKind, QlError};

// Structural Errors

/// A write or meta operation in a position where writes are forbidden.
#[cold]
pub fn write_not_allowed(term: TermKind) -> QlError {
    QlError::new(ErrorKind::WriteNotAllowed { term })
}

/// `ASC`/`DESC` outside of `ORDER_BY`.
#[cold]
pub fn sort_direction_outside_order_by(term: TermKind) -> QlError {
    QlError::new(ErrorKind::SortDirectionOutsideOrderBy { term })
}

#[cold]
pub fn duplicate_optarg(term: TermKind, name: &str) -> QlError {
    QlError::new(ErrorKind::DuplicateOptArg {
        term,
        name: name.to_string(),
    })
}

#[cold]
pub fn max_depth_exceeded(limit: usize) -> QlError {
    QlError::new(ErrorKind::MaxDepthExceeded { limit })
}

// Construction Errors

/// Operand count outside a term's argument specification.
///
/// `expected` is the human-readable requirement, e.g. `"3 arguments"` or
/// `"at least 2 arguments"`.
#[cold]
pub fn arity_mismatch(term: TermKind, expected: impl Into<String>, got: usize) -> QlError {
    QlError::new(ErrorKind::ArityMismatch {
        term,
        expected: expected.into(),
        got,
    })
}

#[cold]
pub fn invalid_operand(term: TermKind, reason: impl Into<String>) -> QlError {
    QlError::new(ErrorKind::InvalidOperand {
        term,
        reason: reason.into(),
    })
}

// Type Errors

#[cold]
pub fn type_mismatch(expected: &str, got: &str) -> QlError {
    QlError::new(ErrorKind::TypeMismatch {
        expected: expected.to_string(),
        got: got.to_string(),
    })
}

/// Operands of a binary operator whose type pairing it does not support.
#[cold]
pub fn binary_type_mismatch(op: TermKind, left: DatumType, right: DatumType) -> QlError {
    QlError::new(ErrorKind::BinaryTypeMismatch { op, left, right })
}

#[cold]
pub fn not_callable(type_name: &str) -> QlError {
    QlError::new(ErrorKind::NotCallable {
        type_name: type_name.to_string(),
    })
}

#[cold]
pub fn not_an_integer(value: f64) -> QlError {
    QlError::new(ErrorKind::NotAnInteger {
        value: Datum::Number(value).to_string(),
    })
}

// Value Errors

#[cold]
pub fn division_by_zero() -> QlError {
    QlError::new(ErrorKind::DivisionByZero)
}

#[cold]
pub fn modulo_by_zero() -> QlError {
    QlError::new(ErrorKind::ModuloByZero)
}

#[cold]
pub fn non_finite_number(value: f64) -> QlError {
    QlError::new(ErrorKind::NonFiniteNumber {
        value: Datum::Number(value).to_string(),
    })
}

#[cold]
pub fn integer_out_of_range(value: f64) -> QlError {
    QlError::new(ErrorKind::IntegerOutOfRange {
        value: Datum::Number(value).to_string(),
    })
}

/// A function invoked with the wrong number of arguments.
#[cold]
pub fn wrong_arg_count(expected: usize, got: usize) -> QlError {
    QlError::new(ErrorKind::WrongArgCount { expected, got })
}

#[cold]
pub fn undefined_variable(var: i64) -> QlError {
    QlError::new(ErrorKind::UndefinedVariable { var })
}

#[cold]
pub fn call_depth_exceeded(limit: usize) -> QlError {
    QlError::new(ErrorKind::CallDepthExceeded { limit })
}

/// Free-form runtime error, typically raised by an execution environment.
#[cold]
pub fn custom(message: impl Into<String>) -> QlError {
    QlError::new(ErrorKind::Custom {
        message: message.into(),
    })
}

// Interrupts

#[cold]
pub fn interrupted() -> QlError {
    QlError::new(ErrorKind::Interrupted)
}

// Internal Errors

#[cold]
pub fn unsupported_term(term: TermKind) -> QlError {
    QlError::new(ErrorKind::Unsupported { term })
}

#[cold]
pub fn internal(message: impl Into<String>) -> QlError {
    QlError::new(ErrorKind::Internal {
        message: message.into(),
    })
}
