//! Backtrace propagation into rewritten subtrees.
//!
//! When a term is expanded into a replacement subtree after annotation, the
//! new terms have no backtrace. Propagation hands them the position of the
//! term they replace, so errors raised inside the expansion still point at
//! the user's original syntax.

use ql_ir::{ensure_sufficient_stack, Backtrace, BacktraceTable, TermId, TermTree};

/// Give every unannotated term under `root` the backtrace `bt` extended by
/// its path from `root`.
///
/// Descent stops at any term that already has a backtrace; such terms and
/// everything below them are left untouched. Returns the number of terms
/// annotated, so a second call on the same subtree returns 0.
#[tracing::instrument(level = "debug", skip_all, fields(root = root.raw(), frames = bt.len()))]
pub fn propagate_backtraces(
    tree: &TermTree,
    root: TermId,
    bt: &Backtrace,
    table: &mut BacktraceTable,
) -> usize {
    let annotated = propagate(tree, root, bt.clone(), table);
    tracing::debug!(annotated, "backtraces propagated");
    annotated
}

fn propagate(tree: &TermTree, id: TermId, bt: Backtrace, table: &mut BacktraceTable) -> usize {
    if table.contains(id) {
        return 0;
    }
    let children: Vec<_> = tree
        .children(id)
        .map(|(frame, child)| (bt.child(frame), child))
        .collect();
    table.insert_if_absent(id, bt);

    let mut annotated = 1;
    for (child_bt, child) in children {
        annotated += ensure_sufficient_stack(|| propagate(tree, child, child_bt, table));
    }
    annotated
}
