//! Arithmetic: polymorphic `+`, numeric `- * /`, and integer modulo.
//!
//! `ADD/SUB/MUL/DIV` reduce left to right over their operands. Every result
//! must be finite; overflow to infinity is an error, never a value.

use std::sync::Arc;

use ql_diagnostic::{errors, QlError};
use ql_ir::{Datum, TermId, TermKind};

use crate::environment::Environment;
use crate::eval::eval_datum_operand;
use crate::query::Query;
use crate::value::{EvalResult, Value};

/// Largest magnitude at which every integer is exactly representable (2^53).
pub const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

/// `ADD/SUB/MUL/DIV(a, b, ...)`.
pub fn eval_arith<E: Environment + ?Sized>(
    query: &Query,
    id: TermId,
    op: TermKind,
    env: &mut E,
) -> EvalResult {
    let Some((&first, rest)) = query.tree().args(id).split_first() else {
        let err = errors::arity_mismatch(op, "2 or more arguments", 0);
        return Err(query.error_at(id, err));
    };

    let mut acc = eval_datum_operand(query, id, first, env)?;
    for &arg in rest {
        let rhs = eval_datum_operand(query, id, arg, env)?;
        acc = evaluate_binary(op, acc, rhs).map_err(|err| query.error_at(id, err))?;
    }
    Ok(Value::Datum(acc))
}

/// `MOD(dividend, divisor)`.
pub fn eval_mod<E: Environment + ?Sized>(query: &Query, id: TermId, env: &mut E) -> EvalResult {
    let &[lhs, rhs] = query.tree().args(id) else {
        let got = query.tree().args(id).len();
        let err = errors::arity_mismatch(TermKind::Mod, "2 arguments", got);
        return Err(query.error_at(id, err));
    };

    let dividend = eval_datum_operand(query, id, lhs, env)?;
    let divisor = eval_datum_operand(query, id, rhs, env)?;
    modulo(&dividend, &divisor)
        .map(Value::Datum)
        .map_err(|err| query.error_at(id, err))
}

/// Apply one arithmetic step.
///
/// `ADD` accepts number+number, string+string and array+array; any other
/// pairing names both types. `SUB/MUL/DIV` accept numbers only.
pub fn evaluate_binary(op: TermKind, lhs: Datum, rhs: Datum) -> Result<Datum, QlError> {
    match (op, lhs, rhs) {
        (TermKind::Add, Datum::Number(a), Datum::Number(b)) => finite(a + b),
        (TermKind::Add, Datum::String(a), Datum::String(b)) => {
            let mut joined = String::with_capacity(a.len() + b.len());
            joined.push_str(&a);
            joined.push_str(&b);
            Ok(Datum::String(Arc::from(joined)))
        }
        (TermKind::Add, Datum::Array(a), Datum::Array(b)) => {
            Ok(Datum::Array(a.iter().chain(b.iter()).cloned().collect()))
        }
        (TermKind::Add, lhs, rhs) => Err(errors::binary_type_mismatch(
            TermKind::Add,
            lhs.datum_type(),
            rhs.datum_type(),
        )),
        (op, lhs, rhs) => {
            let a = expect_number(&lhs)?;
            let b = expect_number(&rhs)?;
            match op {
                TermKind::Sub => finite(a - b),
                TermKind::Mul => finite(a * b),
                TermKind::Div if b == 0.0 => Err(errors::division_by_zero()),
                TermKind::Div => finite(a / b),
                _ => Err(errors::internal(format!("{op} is not an arithmetic operator"))),
            }
        }
    }
}

/// Truncating modulo: the result takes the sign of the dividend.
pub fn modulo(dividend: &Datum, divisor: &Datum) -> Result<Datum, QlError> {
    let i0 = as_int(expect_number(dividend)?)?;
    let i1 = as_int(expect_number(divisor)?)?;
    if i1 == 0 {
        return Err(errors::modulo_by_zero());
    }
    Ok(Datum::Number(int_to_number(i0 % i1)))
}

/// Convert a number to an exactly representable integer.
pub fn as_int(n: f64) -> Result<i64, QlError> {
    if !n.is_finite() || n.fract() != 0.0 {
        return Err(errors::not_an_integer(n));
    }
    if n.abs() > MAX_EXACT_INT {
        return Err(errors::integer_out_of_range(n));
    }
    #[expect(
        clippy::cast_possible_truncation,
        reason = "integral and within ±2^53, so the cast is exact"
    )]
    let int = n as i64;
    Ok(int)
}

#[expect(
    clippy::cast_precision_loss,
    reason = "modulo of values within ±2^53 stays within ±2^53"
)]
fn int_to_number(i: i64) -> f64 {
    i as f64
}

fn expect_number(datum: &Datum) -> Result<f64, QlError> {
    datum
        .as_number()
        .ok_or_else(|| errors::type_mismatch("NUMBER", datum.type_name()))
}

fn finite(n: f64) -> Result<Datum, QlError> {
    if n.is_finite() {
        Ok(Datum::Number(n))
    } else {
        Err(errors::non_finite_number(n))
    }
}
