//! Reference execution environment.
//!
//! [`ScopedEnv`] keeps variable bindings on a scope stack, evaluates
//! operands with [`eval_term`] and honors an [`Interruptor`] before every
//! operand.
//!
//! Scoping is lexical: a `FUNC` captures the bindings visible where it is
//! evaluated, and its body later runs in those bindings plus its parameters,
//! never in the caller's.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use ql_diagnostic::errors;
use ql_ir::{ensure_sufficient_stack, Datum, TermId};

use crate::config::EvalConfig;
use crate::environment::{Environment, Interruptor};
use crate::eval::eval_term;
use crate::query::Query;
use crate::value::{Bindings, EvalResult, FuncValue, NativeFn, Value, VarId};

/// Scope-stack environment used by [`Query::run`] in tests and embedders
/// without their own execution layer.
#[derive(Debug)]
pub struct ScopedEnv {
    scopes: Vec<Bindings>,
    interruptor: Interruptor,
    config: EvalConfig,
    call_depth: usize,
}

impl ScopedEnv {
    /// Environment with the default configuration and no bindings.
    pub fn new() -> Self {
        ScopedEnvBuilder::new().build()
    }

    pub fn builder() -> ScopedEnvBuilder {
        ScopedEnvBuilder::new()
    }

    /// Bind `var` in the innermost scope, shadowing outer bindings.
    pub fn bind(&mut self, var: VarId, value: impl Into<Value>) {
        if let Some(scope) = self.scopes.last_mut() {
            Arc::make_mut(scope).insert(var, value.into());
        }
    }

    pub fn interruptor(&self) -> &Interruptor {
        &self.interruptor
    }

    pub fn config(&self) -> &EvalConfig {
        &self.config
    }

    /// Number of term-function calls currently active.
    pub fn call_depth(&self) -> usize {
        self.call_depth
    }

    fn call_term(
        &mut self,
        query: &Query,
        params: &[VarId],
        body: TermId,
        captured: &Bindings,
        args: Vec<Datum>,
    ) -> EvalResult {
        if self.call_depth >= self.config.max_call_depth {
            return Err(errors::call_depth_exceeded(self.config.max_call_depth));
        }

        let scope: FxHashMap<VarId, Value> = params
            .iter()
            .copied()
            .zip(args.into_iter().map(Value::Datum))
            .collect();
        let caller = std::mem::replace(
            &mut self.scopes,
            vec![Arc::clone(captured), Arc::new(scope)],
        );
        self.call_depth += 1;

        let result = self.evaluate(query, body);

        self.call_depth -= 1;
        self.scopes = caller;
        result
    }
}

impl Default for ScopedEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for ScopedEnv {
    fn evaluate(&mut self, query: &Query, term: TermId) -> EvalResult {
        self.interruptor.check()?;
        ensure_sufficient_stack(|| eval_term(query, term, self))
    }

    fn invoke(&mut self, query: &Query, func: &FuncValue, args: Vec<Datum>) -> EvalResult {
        match func {
            FuncValue::Term {
                params,
                body,
                captured,
            } => self.call_term(query, params, *body, captured, args),
            FuncValue::Native { func, .. } => func(&args).map(Value::Datum),
        }
    }

    fn resolve_variable(&mut self, var: VarId) -> EvalResult {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(&var))
            .cloned()
            .ok_or_else(|| errors::undefined_variable(var.0))
    }

    /// All visible bindings flattened, inner scopes shadowing outer ones.
    fn capture(&self) -> Bindings {
        match self.scopes.as_slice() {
            [] => Bindings::default(),
            [only] => Arc::clone(only),
            scopes => {
                let mut flat = FxHashMap::default();
                for scope in scopes {
                    flat.extend(scope.iter().map(|(var, value)| (*var, value.clone())));
                }
                Arc::new(flat)
            }
        }
    }
}

/// Builder for [`ScopedEnv`].
#[derive(Debug, Default)]
pub struct ScopedEnvBuilder {
    globals: FxHashMap<VarId, Value>,
    interruptor: Option<Interruptor>,
    config: EvalConfig,
}

impl ScopedEnvBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn config(mut self, config: EvalConfig) -> Self {
        self.config = config;
        self
    }

    /// Share an existing cancellation flag instead of creating a fresh one.
    #[must_use]
    pub fn interruptor(mut self, interruptor: Interruptor) -> Self {
        self.interruptor = Some(interruptor);
        self
    }

    /// Bind a variable in the outermost scope.
    #[must_use]
    pub fn bind(mut self, var: VarId, value: impl Into<Value>) -> Self {
        self.globals.insert(var, value.into());
        self
    }

    /// Bind a variable to a host function.
    #[must_use]
    pub fn native(self, var: VarId, name: &'static str, arity: usize, func: NativeFn) -> Self {
        self.bind(var, FuncValue::native(name, arity, func))
    }

    pub fn build(self) -> ScopedEnv {
        ScopedEnv {
            scopes: vec![Arc::new(self.globals)],
            interruptor: self.interruptor.unwrap_or_default(),
            config: self.config,
            call_depth: 0,
        }
    }
}
