//! Test modules relocated from implementation files.
//!
//! Evaluator tests go through [`compile`](crate::compile) and
//! [`Query::run`](crate::Query::run), so every tree here is well formed.

mod compile_tests;

use ql_ir::{Datum, TermId, TermKind, TermTree};

use crate::environment::Environment;
use crate::eval::eval_term;
use crate::query::Query;
use crate::scoped::ScopedEnv;
use crate::value::{Bindings, EvalResult, FuncValue, Value, VarId};

/// Environment that records every term it is asked to evaluate.
struct CountingEnv {
    inner: ScopedEnv,
    evaluated: Vec<TermId>,
}

impl CountingEnv {
    fn new() -> Self {
        Self {
            inner: ScopedEnv::new(),
            evaluated: Vec::new(),
        }
    }

    fn was_evaluated(&self, id: TermId) -> bool {
        self.evaluated.contains(&id)
    }
}

impl Environment for CountingEnv {
    fn evaluate(&mut self, query: &Query, term: TermId) -> EvalResult {
        self.evaluated.push(term);
        eval_term(query, term, self)
    }

    fn invoke(&mut self, query: &Query, func: &FuncValue, args: Vec<Datum>) -> EvalResult {
        self.inner.invoke(query, func, args)
    }

    fn resolve_variable(&mut self, var: VarId) -> EvalResult {
        self.inner.resolve_variable(var)
    }

    fn capture(&self) -> Bindings {
        self.inner.capture()
    }
}

/// `FUNC([params...], body)`
fn push_func(tree: &mut TermTree, params: &[i32], body: TermId) -> TermId {
    let ids: Vec<TermId> = params.iter().map(|&p| tree.push_datum(p)).collect();
    let params = tree.push(TermKind::MakeArray, &ids);
    tree.push(TermKind::Func, &[params, body])
}

/// `VAR(var)`
fn push_var(tree: &mut TermTree, var: i32) -> TermId {
    let id = tree.push_datum(var);
    tree.push(TermKind::Var, &[id])
}

fn datum(value: impl Into<Datum>) -> Value {
    Value::Datum(value.into())
}
