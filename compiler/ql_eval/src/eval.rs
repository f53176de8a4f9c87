//! Per-kind evaluation dispatch.

use std::sync::Arc;

use smallvec::SmallVec;

use ql_diagnostic::{errors, QlError};
use ql_ir::{Datum, TermId, TermKind, TermTree};

use crate::arith::{as_int, eval_arith, eval_mod};
use crate::compare::{eval_compare, eval_not};
use crate::control::{eval_all, eval_any, eval_branch, eval_funcall};
use crate::environment::Environment;
use crate::query::Query;
use crate::value::{EvalResult, FuncValue, Value, VarId};

/// Evaluate one term.
///
/// Rewritten terms evaluate their expansion. Kinds that belong to the
/// external execution layer (tables, streams, writes) are `Unsupported`.
/// Any error leaving this function carries a backtrace: its own if it had
/// one, otherwise the term's. A `TermId` from another tree is an internal
/// error without a backtrace.
#[tracing::instrument(level = "trace", skip_all, fields(term = id.raw()))]
pub fn eval_term<E: Environment + ?Sized>(query: &Query, id: TermId, env: &mut E) -> EvalResult {
    let id = query.resolve(id);
    let tree = query.tree();
    if !tree.contains(id) {
        return Err(errors::internal(format!("term {id:?} is not in the query")));
    }
    let kind = tree.kind(id);

    let result = match kind {
        TermKind::Datum => tree
            .datum(id)
            .cloned()
            .map(Value::Datum)
            .ok_or_else(|| errors::internal("DATUM term without a literal")),
        TermKind::MakeArray => eval_make_array(query, id, env),
        TermKind::MakeObj => eval_make_obj(query, id, env),
        TermKind::Var => var_id(tree, id).and_then(|var| env.resolve_variable(var)),
        TermKind::Func => func_parts(tree, id).map(|(params, body)| {
            Value::Func(FuncValue::Term {
                params,
                body,
                captured: env.capture(),
            })
        }),

        TermKind::Branch => eval_branch(query, id, env),
        TermKind::Funcall => eval_funcall(query, id, env),
        TermKind::All => eval_all(query, id, env),
        TermKind::Any => eval_any(query, id, env),

        TermKind::Not => eval_not(query, id, env),
        TermKind::Eq
        | TermKind::Ne
        | TermKind::Lt
        | TermKind::Le
        | TermKind::Gt
        | TermKind::Ge => eval_compare(query, id, kind, env),

        TermKind::Add | TermKind::Sub | TermKind::Mul | TermKind::Div => {
            eval_arith(query, id, kind, env)
        }
        TermKind::Mod => eval_mod(query, id, env),

        TermKind::ImplicitVar
        | TermKind::Db
        | TermKind::Table
        | TermKind::Get
        | TermKind::Filter
        | TermKind::Map
        | TermKind::ConcatMap
        | TermKind::Reduce
        | TermKind::OrderBy
        | TermKind::Asc
        | TermKind::Desc
        | TermKind::ForEach
        | TermKind::Insert
        | TermKind::Update
        | TermKind::Delete
        | TermKind::Replace
        | TermKind::DbCreate
        | TermKind::DbDrop
        | TermKind::TableCreate
        | TermKind::TableDrop => Err(errors::unsupported_term(kind)),
    };

    result.map_err(|err| query.error_at(id, err))
}

/// Evaluate operand `arg` of `parent` through the environment.
///
/// Errors without a position get the parent's backtrace; errors that have
/// one, and interrupts, pass through unchanged otherwise.
#[inline]
pub(crate) fn eval_operand<E: Environment + ?Sized>(
    query: &Query,
    parent: TermId,
    arg: TermId,
    env: &mut E,
) -> EvalResult {
    env.evaluate(query, arg)
        .map_err(|err| query.error_at(parent, err))
}

/// [`eval_operand`] for positions that only accept datums.
pub(crate) fn eval_datum_operand<E: Environment + ?Sized>(
    query: &Query,
    parent: TermId,
    arg: TermId,
    env: &mut E,
) -> Result<Datum, QlError> {
    eval_operand(query, parent, arg, env)?
        .into_datum()
        .map_err(|err| query.error_at(parent, err))
}

fn eval_make_array<E: Environment + ?Sized>(
    query: &Query,
    id: TermId,
    env: &mut E,
) -> EvalResult {
    let args = query.tree().args(id);
    let mut items = Vec::with_capacity(args.len());
    for &arg in args {
        items.push(eval_datum_operand(query, id, arg, env)?);
    }
    Ok(Value::Datum(Datum::from(items)))
}

fn eval_make_obj<E: Environment + ?Sized>(
    query: &Query,
    id: TermId,
    env: &mut E,
) -> EvalResult {
    let opts = query.tree().optargs(id);
    let mut entries = Vec::with_capacity(opts.len());
    for opt in opts {
        let value = eval_datum_operand(query, id, opt.value, env)?;
        entries.push((Arc::clone(&opt.name), value));
    }
    Ok(Value::Datum(Datum::object(entries)))
}

/// Variable id held by the operand of a `VAR` term.
pub(crate) fn var_id(tree: &TermTree, id: TermId) -> Result<VarId, QlError> {
    match tree.args(id) {
        [operand] => literal_var_id(tree, *operand).ok_or_else(|| {
            errors::invalid_operand(TermKind::Var, "Variable id must be an integer.")
        }),
        args => Err(errors::arity_mismatch(TermKind::Var, "1 argument", args.len())),
    }
}

/// Parameters and body of a `FUNC` term.
pub(crate) fn func_parts(
    tree: &TermTree,
    id: TermId,
) -> Result<(SmallVec<[VarId; 4]>, TermId), QlError> {
    let &[params, body] = tree.args(id) else {
        return Err(errors::arity_mismatch(
            TermKind::Func,
            "2 arguments",
            tree.args(id).len(),
        ));
    };
    if tree.kind(params) != TermKind::MakeArray {
        return Err(errors::invalid_operand(
            TermKind::Func,
            "Function parameters must be a MAKE_ARRAY of variable ids.",
        ));
    }
    let params = tree
        .args(params)
        .iter()
        .map(|&param| literal_var_id(tree, param))
        .collect::<Option<SmallVec<[VarId; 4]>>>()
        .ok_or_else(|| {
            errors::invalid_operand(TermKind::Func, "Function parameter ids must be integers.")
        })?;
    Ok((params, body))
}

fn literal_var_id(tree: &TermTree, id: TermId) -> Option<VarId> {
    if tree.kind(id) != TermKind::Datum {
        return None;
    }
    let n = tree.datum(id)?.as_number()?;
    as_int(n).ok().map(VarId)
}
