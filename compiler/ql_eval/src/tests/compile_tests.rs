//! Tests for query compilation: arity checks and rewrites.
//!
//! Relocated from `compile.rs` per coding guidelines (>200 lines).

#![expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

use pretty_assertions::assert_eq;

use ql_diagnostic::{ErrorCategory, ErrorKind};
use ql_ir::{Backtrace, Datum, Frame, TermId, TermKind, TermTree};
use ql_walker::WalkerConfig;

use super::{datum, push_func, push_var};
use crate::{
    arg_spec, compile, compile_with, eval_term, ArgSpec, CompileOptions, Query, ScopedEnv,
};

fn bt(frames: &[u32]) -> Backtrace {
    Backtrace::from_frames(frames.iter().map(|&i| Frame::Pos(i)))
}

#[test]
fn arg_spec_descriptions() {
    assert_eq!(arg_spec(TermKind::Branch).describe(), "3 arguments");
    assert_eq!(arg_spec(TermKind::Not).describe(), "1 argument");
    assert_eq!(arg_spec(TermKind::Table).describe(), "between 1 and 2 arguments");
    assert_eq!(arg_spec(TermKind::Add).describe(), "2 or more arguments");
    assert!(arg_spec(TermKind::All).accepts(0));
    assert!(!ArgSpec::exactly(2).accepts(3));
}

#[test]
fn branch_with_two_operands_fails_to_compile() {
    // [BRANCH(true, 1)]
    let mut tree = TermTree::new();
    let cond = tree.push_datum(true);
    let then_branch = tree.push_datum(1);
    let branch = tree.push(TermKind::Branch, &[cond, then_branch]);
    let root = tree.push(TermKind::MakeArray, &[branch]);

    let err = compile(tree, root).unwrap_err();
    assert_eq!(err.message, "Expected 3 arguments but found 2.");
    assert_eq!(err.category(), ErrorCategory::Construction);
    assert_eq!(err.backtrace(), Some(&bt(&[0])));
}

#[test]
fn arity_errors_are_reported_parents_first() {
    // MOD(ADD(1), 2, 3): both terms are wrong, the MOD is reported.
    let mut tree = TermTree::new();
    let one = tree.push_datum(1);
    let add = tree.push(TermKind::Add, &[one]);
    let two = tree.push_datum(2);
    let three = tree.push_datum(3);
    let root = tree.push(TermKind::Mod, &[add, two, three]);

    let err = compile(tree, root).unwrap_err();
    assert_eq!(
        err.kind,
        ErrorKind::ArityMismatch {
            term: TermKind::Mod,
            expected: "2 arguments".to_string(),
            got: 3,
        }
    );
    assert_eq!(err.backtrace(), Some(&Backtrace::root()));
}

#[test]
fn var_id_must_be_an_integer() {
    let mut tree = TermTree::new();
    let zero = tree.push_datum(0);
    let id = tree.push_datum(1.5);
    let var = tree.push(TermKind::Var, &[id]);
    let root = tree.push(TermKind::MakeArray, &[zero, var]);

    let err = compile(tree, root).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Construction);
    assert_eq!(err.message, "Variable id must be an integer.");
    assert_eq!(err.backtrace(), Some(&bt(&[1])));
}

#[test]
fn func_params_must_be_an_array_literal() {
    let mut tree = TermTree::new();
    let params = tree.push_datum(1);
    let body = tree.push_datum(0);
    let root = tree.push(TermKind::Func, &[params, body]);

    let err = compile(tree, root).unwrap_err();
    assert!(matches!(
        err.kind,
        ErrorKind::InvalidOperand {
            term: TermKind::Func,
            ..
        }
    ));
}

#[test]
fn write_in_predicate_fails_to_compile() {
    // FILTER(TABLE("t"), FUNC([1], DELETE(TABLE("u"))))
    let mut tree = TermTree::new();
    let t = tree.push_datum("t");
    let table = tree.push(TermKind::Table, &[t]);
    let u = tree.push_datum("u");
    let inner = tree.push(TermKind::Table, &[u]);
    let delete = tree.push(TermKind::Delete, &[inner]);
    let func = push_func(&mut tree, &[1], delete);
    let root = tree.push(TermKind::Filter, &[table, func]);

    let err = compile(tree, root).unwrap_err();
    assert_eq!(err.kind, ErrorKind::WriteNotAllowed { term: TermKind::Delete });
    assert_eq!(err.category(), ErrorCategory::Structural);
    assert_eq!(err.backtrace(), Some(&bt(&[1, 1])));
}

#[test]
fn depth_limit_comes_from_options() {
    // NOT(NOT(NOT(true)))
    let mut tree = TermTree::new();
    let mut id = tree.push_datum(true);
    for _ in 0..3 {
        id = tree.push(TermKind::Not, &[id]);
    }
    let options = CompileOptions::default().with_walker(WalkerConfig::default().with_max_depth(2));

    let err = compile_with(tree, id, &options).unwrap_err();
    assert_eq!(err.kind, ErrorKind::MaxDepthExceeded { limit: 2 });
    assert_eq!(err.backtrace(), Some(&bt(&[0, 0, 0])));
}

#[test]
fn ne_is_rewritten_to_not_eq() {
    let mut tree = TermTree::new();
    let one = tree.push_datum(1);
    let two = tree.push_datum(2);
    let root = tree.push(TermKind::Ne, &[one, two]);
    let query = compile(tree, root).unwrap();

    let not = query.rewritten(root).unwrap();
    assert_eq!(query.tree().kind(not), TermKind::Not);
    let eq = query.tree().args(not)[0];
    assert_eq!(query.tree().kind(eq), TermKind::Eq);
    assert_eq!(query.tree().args(eq), &[one, two]);

    // The expansion takes the place of the NE.
    assert_eq!(query.backtrace(not), Some(&Backtrace::root()));
    assert_eq!(query.backtrace(eq), Some(&bt(&[0])));
    assert_eq!(query.backtrace(one), Some(&bt(&[0])));

    assert_eq!(query.run(&mut ScopedEnv::new()).unwrap(), datum(true));
}

#[test]
fn error_inside_rewrite_points_into_original_term() {
    // [0, NE(1, FUNC([1], 1))]
    let mut tree = TermTree::new();
    let zero = tree.push_datum(0);
    let one = tree.push_datum(1);
    let body = tree.push_datum(1);
    let func = push_func(&mut tree, &[1], body);
    let ne = tree.push(TermKind::Ne, &[one, func]);
    let root = tree.push(TermKind::MakeArray, &[zero, ne]);
    let query = compile(tree, root).unwrap();

    let err = query.run(&mut ScopedEnv::new()).unwrap_err();
    assert_eq!(err.message, "Expected type DATUM but found FUNCTION.");
    let backtrace = err.backtrace().unwrap();
    assert!(backtrace.starts_with(&bt(&[1])));
}

#[test]
fn delete_is_rewritten_to_replace_with_null() {
    // DELETE(TABLE("t"), durability: "soft")
    let mut tree = TermTree::new();
    let name = tree.push_datum("t");
    let table = tree.push(TermKind::Table, &[name]);
    let soft = tree.push_datum("soft");
    let root = tree.push_with_optargs(TermKind::Delete, &[table], [("durability", soft)]);
    let query = compile(tree, root).unwrap();

    let replace = query.rewritten(root).unwrap();
    let tree = query.tree();
    assert_eq!(tree.kind(replace), TermKind::Replace);
    assert_eq!(tree.optarg(replace, "durability"), Some(soft));

    let &[selection, func] = tree.args(replace) else {
        panic!("REPLACE should have two operands");
    };
    assert_eq!(selection, table);
    assert_eq!(tree.kind(func), TermKind::Func);
    let &[params, body] = tree.args(func) else {
        panic!("FUNC should have two operands");
    };
    let param = tree.args(params)[0];
    assert_eq!(tree.datum(param), Some(&Datum::from(-2)));
    assert_eq!(tree.datum(body), Some(&Datum::Null));

    assert_eq!(query.backtrace(replace), Some(&Backtrace::root()));
    assert_eq!(query.backtrace(func), Some(&bt(&[1])));
    assert_eq!(query.backtrace(body), Some(&bt(&[1, 1])));
    // Shared operands keep their original positions.
    assert_eq!(query.backtrace(table), Some(&bt(&[0])));
    assert_eq!(
        query.backtrace(soft),
        Some(&Backtrace::root().child(Frame::opt("durability")))
    );
}

#[test]
fn rewrites_get_distinct_variables() {
    // [DELETE(TABLE("a")), DELETE(TABLE("b"))]
    let mut tree = TermTree::new();
    let mut deletes = Vec::new();
    for name in ["a", "b"] {
        let name = tree.push_datum(name);
        let table = tree.push(TermKind::Table, &[name]);
        deletes.push(tree.push(TermKind::Delete, &[table]));
    }
    let root = tree.push(TermKind::MakeArray, &deletes);
    let query = compile(tree, root).unwrap();

    let param_of = |delete: TermId| {
        let tree = query.tree();
        let func = tree.args(query.rewritten(delete).unwrap())[1];
        let params = tree.args(func)[0];
        tree.datum(tree.args(params)[0]).cloned()
    };
    assert_eq!(param_of(deletes[0]), Some(Datum::from(-2)));
    assert_eq!(param_of(deletes[1]), Some(Datum::from(-3)));
}

#[test]
fn external_terms_are_unsupported_at_runtime() {
    let mut tree = TermTree::new();
    let name = tree.push_datum("t");
    let table = tree.push(TermKind::Table, &[name]);
    let root = tree.push(TermKind::Delete, &[table]);
    let query = compile(tree, root).unwrap();

    let err = query.run(&mut ScopedEnv::new()).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Unsupported { term: TermKind::Replace });
    assert_eq!(err.category(), ErrorCategory::Internal);
    assert_eq!(err.backtrace(), Some(&Backtrace::root()));
}

#[test]
fn compiled_query_is_shareable() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Query>();

    // [VAR(1), 2]
    let mut tree = TermTree::new();
    let var = push_var(&mut tree, 1);
    let two = tree.push_datum(2);
    let root = tree.push(TermKind::MakeArray, &[var, two]);
    let query = compile(tree, root).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let query = query.clone();
            std::thread::spawn(move || {
                let mut env = ScopedEnv::builder().bind(crate::VarId(1), Datum::from(i)).build();
                query.run(&mut env).unwrap()
            })
        })
        .collect();
    for (i, handle) in (0..4).zip(handles) {
        let expected = Datum::array([Datum::from(i), Datum::from(2)]);
        assert_eq!(handle.join().unwrap(), datum(expected));
    }
}

#[test]
fn wide_array_literal_compiles_and_runs() {
    let mut tree = TermTree::new();
    let items: Vec<TermId> = (0..70_000).map(|i| tree.push_datum(i)).collect();
    let root = tree.push(TermKind::MakeArray, &items);
    let query = compile(tree, root).unwrap();

    assert_eq!(query.backtrace(items[69_999]), Some(&bt(&[69_999])));
    let value = query.run(&mut ScopedEnv::new()).unwrap();
    let array = value.as_datum().and_then(Datum::as_array).unwrap();
    assert_eq!(array.len(), 70_000);
    assert_eq!(array[69_999], Datum::from(69_999));
}

#[test]
fn foreign_term_id_is_an_internal_error() {
    let mut tree = TermTree::new();
    let root = tree.push_datum(1);
    let query = compile(tree, root).unwrap();

    let err = eval_term(&query, TermId::new(999), &mut ScopedEnv::new()).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Internal);
    assert_eq!(err.backtrace(), None);
    assert_eq!(eval_term(&query, root, &mut ScopedEnv::new()).unwrap(), datum(1));
}
