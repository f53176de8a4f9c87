//! Control flow: branch, function application and short-circuit logic.
//!
//! Operands are evaluated strictly left to right and only when needed. An
//! operand that is skipped is never handed to the environment, so its side
//! effects and errors never happen.

use ql_diagnostic::errors;
use ql_ir::{Datum, TermId};

use crate::environment::Environment;
use crate::eval::{eval_datum_operand, eval_operand};
use crate::query::Query;
use crate::value::{EvalResult, Value};

/// `BRANCH(cond, then, else)`.
pub fn eval_branch<E: Environment + ?Sized>(
    query: &Query,
    id: TermId,
    env: &mut E,
) -> EvalResult {
    let &[cond, then_branch, else_branch] = query.tree().args(id) else {
        return Err(query.error_at(id, errors::internal("BRANCH requires 3 operands")));
    };

    let cond_val = eval_operand(query, id, cond, env)?;
    if env.is_truthy(&cond_val) {
        eval_operand(query, id, then_branch, env)
    } else {
        eval_operand(query, id, else_branch, env)
    }
}

/// `FUNCALL(args..., func)`.
///
/// Arguments are evaluated before the function operand.
pub fn eval_funcall<E: Environment + ?Sized>(
    query: &Query,
    id: TermId,
    env: &mut E,
) -> EvalResult {
    let Some((&func_term, arg_terms)) = query.tree().args(id).split_last() else {
        let err = errors::internal("FUNCALL requires a function operand");
        return Err(query.error_at(id, err));
    };

    let mut args = Vec::with_capacity(arg_terms.len());
    for &arg in arg_terms {
        args.push(eval_datum_operand(query, id, arg, env)?);
    }

    let func = match eval_operand(query, id, func_term, env)? {
        Value::Func(func) => func,
        other @ Value::Datum(_) => {
            return Err(query.error_at(id, errors::not_callable(other.type_name())));
        }
    };
    if func.arity() != args.len() {
        return Err(query.error_at(id, errors::wrong_arg_count(func.arity(), args.len())));
    }

    tracing::trace!(term = id.raw(), args = args.len(), "invoking function");
    env.invoke(query, &func, args)
        .map_err(|err| query.error_at(id, err))
}

/// `ALL(...)`: the first falsy operand, else the last operand, else `true`.
pub fn eval_all<E: Environment + ?Sized>(
    query: &Query,
    id: TermId,
    env: &mut E,
) -> EvalResult {
    let mut last = Value::Datum(Datum::Bool(true));
    for &arg in query.tree().args(id) {
        let value = eval_operand(query, id, arg, env)?;
        if !env.is_truthy(&value) {
            return Ok(value);
        }
        last = value;
    }
    Ok(last)
}

/// `ANY(...)`: the first truthy operand, else the last operand, else `false`.
pub fn eval_any<E: Environment + ?Sized>(
    query: &Query,
    id: TermId,
    env: &mut E,
) -> EvalResult {
    let mut last = Value::Datum(Datum::Bool(false));
    for &arg in query.tree().args(id) {
        let value = eval_operand(query, id, arg, env)?;
        if env.is_truthy(&value) {
            return Ok(value);
        }
        last = value;
    }
    Ok(last)
}
