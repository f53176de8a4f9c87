//! Comparison predicates and `NOT`.
//!
//! Predicates compare adjacent operands left to right and stop at the first
//! pair that fails, leaving the remaining operands unevaluated.

use std::cmp::Ordering;

use ql_diagnostic::errors;
use ql_ir::{Datum, TermId, TermKind};

use crate::environment::Environment;
use crate::eval::{eval_datum_operand, eval_operand};
use crate::query::Query;
use crate::value::{EvalResult, Value};

/// `EQ/NE/LT/LE/GT/GE(a, b, ...)`.
pub fn eval_compare<E: Environment + ?Sized>(
    query: &Query,
    id: TermId,
    op: TermKind,
    env: &mut E,
) -> EvalResult {
    let Some((&first, rest)) = query.tree().args(id).split_first() else {
        let err = errors::arity_mismatch(op, "2 or more arguments", 0);
        return Err(query.error_at(id, err));
    };

    // `NE` is `NOT(EQ(...))` once compiled; evaluated directly it negates
    // the equality chain.
    let (pred, negate) = match op {
        TermKind::Ne => (TermKind::Eq, true),
        other => (other, false),
    };

    let mut lhs = eval_datum_operand(query, id, first, env)?;
    for &arg in rest {
        let rhs = eval_datum_operand(query, id, arg, env)?;
        let holds = compare(pred, &lhs, &rhs).ok_or_else(|| {
            query.error_at(id, errors::internal(format!("{op} is not a comparison")))
        })?;
        if !holds {
            return Ok(Value::Datum(Datum::Bool(negate)));
        }
        lhs = rhs;
    }
    Ok(Value::Datum(Datum::Bool(!negate)))
}

/// `NOT(x)`: the negated truthiness of `x`.
pub fn eval_not<E: Environment + ?Sized>(query: &Query, id: TermId, env: &mut E) -> EvalResult {
    let &[operand] = query.tree().args(id) else {
        let got = query.tree().args(id).len();
        return Err(query.error_at(id, errors::arity_mismatch(TermKind::Not, "1 argument", got)));
    };
    let value = eval_operand(query, id, operand, env)?;
    Ok(Value::Datum(Datum::Bool(!env.is_truthy(&value))))
}

/// Whether `pred` holds between `lhs` and `rhs`; `None` for non-predicates.
pub fn compare(pred: TermKind, lhs: &Datum, rhs: &Datum) -> Option<bool> {
    let ord = lhs.cmp_datum(rhs);
    let holds = match pred {
        TermKind::Eq => ord == Ordering::Equal,
        TermKind::Ne => ord != Ordering::Equal,
        TermKind::Lt => ord == Ordering::Less,
        TermKind::Le => ord != Ordering::Greater,
        TermKind::Gt => ord == Ordering::Greater,
        TermKind::Ge => ord != Ordering::Less,
        _ => return None,
    };
    Some(holds)
}
