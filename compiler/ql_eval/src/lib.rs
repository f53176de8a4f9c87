//! QL Eval - term construction and evaluation for the query front end.
//!
//! # Pipeline
//!
//! ```text
//! TermTree --compile--> Query --run(env)--> Value
//! ```
//!
//! [`compile`] annotates and validates a deserialized tree, checks operand
//! counts and expands rewritten terms. The resulting [`Query`] is immutable
//! and can be shared across threads. [`Query::run`] evaluates it against an
//! [`Environment`], which supplies variables, function invocation and
//! cancellation.
//!
//! # Evaluators
//!
//! - [`control`]: `BRANCH`, `FUNCALL`, `ALL`, `ANY`
//! - [`arith`]: `ADD`, `SUB`, `MUL`, `DIV`, `MOD`
//! - [`compare`]: `EQ`, `NE`, `LT`, `LE`, `GT`, `GE`, `NOT`
//!
//! Every evaluator reaches its operands through [`Environment::evaluate`]
//! and never evaluates an operand it does not need.

pub mod arith;
pub mod compare;
mod compile;
mod config;
pub mod control;
mod environment;
mod eval;
mod query;
mod scoped;
mod value;

#[cfg(test)]
mod tests;

use std::sync::Once;

pub use compile::{arg_spec, compile, compile_with, ArgSpec};
pub use config::{CompileOptions, EvalConfig, MAX_CALL_DEPTH_ENV};
pub use environment::{Environment, Interruptor};
pub use eval::eval_term;
pub use query::Query;
pub use scoped::{ScopedEnv, ScopedEnvBuilder};
pub use value::{Bindings, EvalResult, FuncValue, NativeFn, Value, VarId};

static TRACING_INIT: Once = Once::new();

/// Initialize tracing output.
///
/// Safe to call more than once. Does nothing unless `RUST_LOG` is set, e.g.
/// `RUST_LOG=ql_walker=debug,ql_eval=trace`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
