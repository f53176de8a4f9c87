//! The execution environment seam.
//!
//! Evaluators never recurse into operands themselves: every operand goes
//! through [`Environment::evaluate`], so the environment decides how (and
//! whether) a term is evaluated, can suspend on I/O, and can cancel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ql_diagnostic::{errors, QlError};
use ql_ir::{Datum, TermId};

use crate::query::Query;
use crate::value::{Bindings, EvalResult, FuncValue, Value, VarId};

/// Capabilities the evaluators require from their host.
///
/// Implementations must evaluate terms only when asked, in the order asked.
pub trait Environment {
    /// Evaluate `term` of `query`.
    ///
    /// The reference behavior is [`eval_term`](crate::eval_term).
    fn evaluate(&mut self, query: &Query, term: TermId) -> EvalResult;

    /// Call `func` with already evaluated arguments.
    ///
    /// Callers have checked `args.len() == func.arity()`.
    fn invoke(&mut self, query: &Query, func: &FuncValue, args: Vec<Datum>) -> EvalResult;

    /// Look up a variable binding.
    fn resolve_variable(&mut self, var: VarId) -> EvalResult;

    /// Bindings visible right now, captured by a `FUNC` when it is evaluated.
    ///
    /// Environments without variables of their own capture nothing.
    fn capture(&self) -> Bindings {
        Bindings::default()
    }

    fn is_truthy(&self, value: &Value) -> bool {
        value.is_truthy()
    }
}

/// Shared cancellation flag.
///
/// Clones observe the same flag, so another thread can interrupt a running
/// evaluation.
#[derive(Clone, Debug, Default)]
pub struct Interruptor(Arc<AtomicBool>);

impl Interruptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interrupt(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_interrupted(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// `Err(Interrupted)` once [`interrupt`](Self::interrupt) was called.
    #[inline]
    pub fn check(&self) -> Result<(), QlError> {
        if self.is_interrupted() {
            Err(errors::interrupted())
        } else {
            Ok(())
        }
    }
}
