//! Runtime values: datums and functions.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use ql_diagnostic::{errors, QlError};
use ql_ir::{Datum, TermId};

/// Variable identifier assigned by the client (non-negative) or by a term
/// rewrite (negative).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub i64);

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Variable bindings captured by a term function when it is created.
pub type Bindings = Arc<FxHashMap<VarId, Value>>;

/// Host function callable from a query.
pub type NativeFn = fn(&[Datum]) -> Result<Datum, QlError>;

/// A callable value.
#[derive(Clone, Debug)]
pub enum FuncValue {
    /// A `FUNC` term: `body` is evaluated in `captured` extended by the
    /// parameters, never in the caller's bindings.
    Term {
        params: SmallVec<[VarId; 4]>,
        body: TermId,
        captured: Bindings,
    },
    /// A function provided by the execution environment.
    Native {
        name: &'static str,
        arity: usize,
        func: NativeFn,
    },
}

impl FuncValue {
    pub fn native(name: &'static str, arity: usize, func: NativeFn) -> Self {
        FuncValue::Native { name, arity, func }
    }

    /// Number of arguments the function must be called with.
    pub fn arity(&self) -> usize {
        match self {
            FuncValue::Term { params, .. } => params.len(),
            FuncValue::Native { arity, .. } => *arity,
        }
    }
}

impl PartialEq for FuncValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                FuncValue::Term {
                    params,
                    body,
                    captured,
                },
                FuncValue::Term {
                    params: other_params,
                    body: other_body,
                    captured: other_captured,
                },
            ) => params == other_params && body == other_body && captured == other_captured,
            (
                FuncValue::Native { name, arity, .. },
                FuncValue::Native {
                    name: other_name,
                    arity: other_arity,
                    ..
                },
            ) => name == other_name && arity == other_arity,
            _ => false,
        }
    }
}

/// Result of evaluating a term.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Datum(Datum),
    Func(FuncValue),
}

impl Value {
    /// Type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Datum(datum) => datum.type_name(),
            Value::Func(_) => "FUNCTION",
        }
    }

    /// Datum truthiness; functions are truthy.
    #[inline]
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Datum(datum) => datum.is_truthy(),
            Value::Func(_) => true,
        }
    }

    pub fn as_datum(&self) -> Option<&Datum> {
        match self {
            Value::Datum(datum) => Some(datum),
            Value::Func(_) => None,
        }
    }

    /// The datum, or a type error for a function.
    pub fn into_datum(self) -> Result<Datum, QlError> {
        match self {
            Value::Datum(datum) => Ok(datum),
            Value::Func(_) => Err(errors::type_mismatch("DATUM", "FUNCTION")),
        }
    }
}

impl From<Datum> for Value {
    fn from(datum: Datum) -> Self {
        Value::Datum(datum)
    }
}

impl From<FuncValue> for Value {
    fn from(func: FuncValue) -> Self {
        Value::Func(func)
    }
}

/// Result of evaluation.
pub type EvalResult = Result<Value, QlError>;
