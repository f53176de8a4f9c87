//! Query construction: annotate, check arities, expand rewrites.
//!
//! Compilation takes ownership of a deserialized [`TermTree`] and produces a
//! frozen [`Query`]:
//!
//! 1. [`fill_in_backtraces`](ql_walker::fill_in_backtraces_with) assigns
//!    positions and checks well-formedness.
//! 2. Every reachable term is checked against its kind's [`ArgSpec`], parents
//!    before children.
//! 3. Terms defined in terms of others are expanded. The expansion is
//!    appended to the arena, shares the original operands, and inherits the
//!    original term's position through
//!    [`propagate_backtraces`](ql_walker::propagate_backtraces).

use std::sync::Arc;

use rustc_hash::FxHashMap;

use ql_diagnostic::{errors, QlError};
use ql_ir::{ensure_sufficient_stack, BacktraceTable, Datum, TermId, TermKind, TermTree};
use ql_walker::{fill_in_backtraces_with, propagate_backtraces};

use crate::config::CompileOptions;
use crate::eval::{func_parts, var_id};
use crate::query::Query;

/// Accepted number of positional operands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArgSpec {
    pub min: usize,
    /// `None` for no upper bound.
    pub max: Option<usize>,
}

impl ArgSpec {
    pub const fn exactly(n: usize) -> Self {
        Self {
            min: n,
            max: Some(n),
        }
    }

    pub const fn at_least(n: usize) -> Self {
        Self { min: n, max: None }
    }

    pub const fn between(min: usize, max: usize) -> Self {
        Self {
            min,
            max: Some(max),
        }
    }

    #[inline]
    pub fn accepts(self, n: usize) -> bool {
        n >= self.min && self.max.is_none_or(|max| n <= max)
    }

    /// Human-readable requirement, e.g. `"3 arguments"`.
    pub fn describe(self) -> String {
        let noun = |n: usize| if n == 1 { "argument" } else { "arguments" };
        match self.max {
            Some(max) if max == self.min => format!("{max} {}", noun(max)),
            Some(max) => format!("between {} and {max} {}", self.min, noun(max)),
            None => format!("{} or more {}", self.min, noun(2)),
        }
    }
}

/// Argument specification of each operator kind.
pub fn arg_spec(kind: TermKind) -> ArgSpec {
    match kind {
        TermKind::Datum | TermKind::MakeObj | TermKind::ImplicitVar => ArgSpec::exactly(0),
        TermKind::MakeArray | TermKind::All | TermKind::Any => ArgSpec::at_least(0),

        TermKind::Var
        | TermKind::Not
        | TermKind::Db
        | TermKind::Asc
        | TermKind::Desc
        | TermKind::Delete
        | TermKind::DbCreate
        | TermKind::DbDrop => ArgSpec::exactly(1),

        TermKind::Func
        | TermKind::Mod
        | TermKind::Get
        | TermKind::Filter
        | TermKind::Map
        | TermKind::ConcatMap
        | TermKind::Reduce
        | TermKind::ForEach
        | TermKind::Insert
        | TermKind::Update
        | TermKind::Replace => ArgSpec::exactly(2),

        TermKind::Branch => ArgSpec::exactly(3),

        TermKind::Funcall | TermKind::OrderBy => ArgSpec::at_least(1),

        TermKind::Eq
        | TermKind::Ne
        | TermKind::Lt
        | TermKind::Le
        | TermKind::Gt
        | TermKind::Ge
        | TermKind::Add
        | TermKind::Sub
        | TermKind::Mul
        | TermKind::Div => ArgSpec::at_least(2),

        TermKind::Table | TermKind::TableCreate | TermKind::TableDrop => ArgSpec::between(1, 2),
    }
}

/// First variable id handed out to rewrites; counts down from here.
const FIRST_GENSYM: i64 = -2;

/// Compile `tree` rooted at `root` with default options.
pub fn compile(tree: TermTree, root: TermId) -> Result<Query, QlError> {
    compile_with(tree, root, &CompileOptions::default())
}

/// Compile `tree` rooted at `root`.
#[tracing::instrument(level = "debug", skip_all, fields(root = root.raw(), terms = tree.len()))]
pub fn compile_with(
    mut tree: TermTree,
    root: TermId,
    options: &CompileOptions,
) -> Result<Query, QlError> {
    let mut backtraces = BacktraceTable::with_capacity(tree.len());
    fill_in_backtraces_with(&tree, root, &mut backtraces, &options.walker)?;
    check_term(&tree, root, &backtraces)?;

    let mut expander = Expander {
        tree: &mut tree,
        backtraces: &mut backtraces,
        rewrites: FxHashMap::default(),
        next_var: FIRST_GENSYM,
    };
    expander.expand_all();
    let rewrites = expander.rewrites;

    tracing::debug!(terms = tree.len(), rewrites = rewrites.len(), "query compiled");
    Ok(Query::new(tree, backtraces, rewrites, root))
}

/// Arity and operand-shape checks, parents before children.
fn check_term(tree: &TermTree, id: TermId, backtraces: &BacktraceTable) -> Result<(), QlError> {
    check_shape(tree, id).map_err(|err| err.or_backtrace(backtraces.get(id)))?;
    for (_, child) in tree.children(id) {
        ensure_sufficient_stack(|| check_term(tree, child, backtraces))?;
    }
    Ok(())
}

fn check_shape(tree: &TermTree, id: TermId) -> Result<(), QlError> {
    let kind = tree.kind(id);
    let spec = arg_spec(kind);
    let got = tree.args(id).len();
    if !spec.accepts(got) {
        return Err(errors::arity_mismatch(kind, spec.describe(), got));
    }
    match kind {
        TermKind::Var => var_id(tree, id).map(drop),
        TermKind::Func => func_parts(tree, id).map(drop),
        _ => Ok(()),
    }
}

struct Expander<'a> {
    tree: &'a mut TermTree,
    backtraces: &'a mut BacktraceTable,
    rewrites: FxHashMap<TermId, TermId>,
    next_var: i64,
}

impl Expander<'_> {
    /// Expand every annotated term that has a rewrite, in id order.
    fn expand_all(&mut self) {
        let candidates: Vec<TermId> = self
            .backtraces
            .iter()
            .map(|(id, _)| id)
            .filter(|&id| matches!(self.tree.kind(id), TermKind::Ne | TermKind::Delete))
            .collect();

        for id in candidates {
            let kind = self.tree.kind(id);
            let expansion = match kind {
                TermKind::Ne => self.expand_ne(id),
                TermKind::Delete => self.expand_delete(id),
                _ => continue,
            };
            if let Some(bt) = self.backtraces.get(id).cloned() {
                propagate_backtraces(&*self.tree, expansion, &bt, &mut *self.backtraces);
            }
            tracing::debug!(
                term = id.raw(),
                from = %kind,
                to = %self.tree.kind(expansion),
                "rewrote term"
            );
            self.rewrites.insert(id, expansion);
        }
    }

    /// `NE(a, b, ...)` => `NOT(EQ(a, b, ...))`
    fn expand_ne(&mut self, id: TermId) -> TermId {
        let operands = self.tree.args(id).to_vec();
        let eq = self.tree.push(TermKind::Eq, &operands);
        self.tree.push(TermKind::Not, &[eq])
    }

    /// `DELETE(sel, opts...)` => `REPLACE(sel, FUNC([v], null), opts...)`
    fn expand_delete(&mut self, id: TermId) -> TermId {
        let operands = self.tree.args(id).to_vec();
        let optargs: Vec<_> = self
            .tree
            .optargs(id)
            .iter()
            .map(|opt| (Arc::clone(&opt.name), opt.value))
            .collect();

        let var = self.gensym();
        let param = self.tree.push_datum(var);
        let params = self.tree.push(TermKind::MakeArray, &[param]);
        let null = self.tree.push_datum(Datum::Null);
        let func = self.tree.push(TermKind::Func, &[params, null]);

        let mut replace_args = operands;
        replace_args.push(func);
        self.tree.push_with_optargs(TermKind::Replace, &replace_args, optargs)
    }

    /// Fresh variable id that cannot collide with client-assigned ones.
    #[expect(
        clippy::cast_precision_loss,
        reason = "generated ids stay far inside the exact integer range"
    )]
    fn gensym(&mut self) -> f64 {
        let var = self.next_var;
        self.next_var -= 1;
        var as f64
    }
}
