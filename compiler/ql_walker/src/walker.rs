//! Backtrace annotation.
//!
//! A single depth-first pass assigns every term its root-relative
//! [`Backtrace`] and validates the tree on the way down. Children are visited
//! in [`TermTree::children`] order: positional operands, then named options
//! sorted by name.
//!
//! # Checks
//!
//! Per term, after its backtrace is recorded:
//!
//! 1. not annotated before, and `DATUM` terms are well formed (internal)
//! 2. nesting within [`WalkerConfig::max_depth`]
//! 3. `ASC`/`DESC` directly under `ORDER_BY`
//! 4. write and meta operations only where the placement table allows them
//! 5. no duplicate named options
//!
//! The first violation aborts the walk. Its error carries the backtrace of
//! the offending term and nothing below that term is annotated.

use ql_diagnostic::{errors, QlError};
use ql_ir::{ensure_sufficient_stack, Backtrace, BacktraceTable, TermId, TermKind, TermTree};

use crate::config::WalkerConfig;
use crate::policy::{slot_policy, ROOT_POLICY};

/// Annotate the tree under `root` with the default configuration.
///
/// `table` must not yet hold a backtrace for any term reachable from
/// `root`; annotating a term twice is an internal error.
pub fn fill_in_backtraces(
    tree: &TermTree,
    root: TermId,
    table: &mut BacktraceTable,
) -> Result<(), QlError> {
    fill_in_backtraces_with(tree, root, table, &WalkerConfig::default())
}

/// Annotate the tree under `root` with an explicit configuration.
#[tracing::instrument(
    level = "debug",
    skip_all,
    fields(root = root.raw(), terms = tree.len(), max_depth = config.max_depth)
)]
pub fn fill_in_backtraces_with(
    tree: &TermTree,
    root: TermId,
    table: &mut BacktraceTable,
    config: &WalkerConfig,
) -> Result<(), QlError> {
    if !tree.contains(root) {
        return Err(errors::internal(format!("root {root:?} is not in the term tree"))
            .with_backtrace(Backtrace::root()));
    }

    let before = table.len();
    let mut walker = Walker {
        tree,
        table,
        max_depth: config.max_depth,
    };
    walker.walk(root, Backtrace::root(), None, ROOT_POLICY.resolve(true))?;

    tracing::debug!(annotated = walker.table.len() - before, "backtraces filled in");
    Ok(())
}

struct Walker<'a> {
    tree: &'a TermTree,
    table: &'a mut BacktraceTable,
    max_depth: usize,
}

impl Walker<'_> {
    fn walk(
        &mut self,
        id: TermId,
        bt: Backtrace,
        parent: Option<TermKind>,
        writes_allowed: bool,
    ) -> Result<(), QlError> {
        let tree = self.tree;
        let kind = tree.kind(id);

        if !self.table.insert_if_absent(id, bt.clone()) {
            return Err(
                errors::internal(format!("{kind} term {id:?} was annotated twice"))
                    .with_backtrace(bt),
            );
        }
        if let Err(err) = self.check(id, kind, bt.len(), parent, writes_allowed) {
            tracing::trace!(term = %kind, backtrace = %bt, "ill-formed term");
            return Err(err.with_backtrace(bt));
        }

        for (frame, child) in tree.children(id) {
            let allowed = slot_policy(kind, &frame).resolve(writes_allowed);
            let child_bt = bt.child(frame);
            ensure_sufficient_stack(|| self.walk(child, child_bt, Some(kind), allowed))?;
        }
        Ok(())
    }

    fn check(
        &self,
        id: TermId,
        kind: TermKind,
        depth: usize,
        parent: Option<TermKind>,
        writes_allowed: bool,
    ) -> Result<(), QlError> {
        if kind == TermKind::Datum
            && (self.tree.datum(id).is_none() || !self.tree.args(id).is_empty())
        {
            return Err(errors::internal(
                "DATUM term must hold a literal and no operands",
            ));
        }
        if depth > self.max_depth {
            return Err(errors::max_depth_exceeded(self.max_depth));
        }
        if kind.is_sort_direction() && parent != Some(TermKind::OrderBy) {
            return Err(errors::sort_direction_outside_order_by(kind));
        }
        if kind.is_write() && !writes_allowed {
            return Err(errors::write_not_allowed(kind));
        }
        // Options are sorted by name, so duplicates are adjacent.
        if let Some(pair) = self
            .tree
            .optargs(id)
            .windows(2)
            .find(|pair| pair[0].name == pair[1].name)
        {
            return Err(errors::duplicate_optarg(kind, &pair[0].name));
        }
        Ok(())
    }
}
