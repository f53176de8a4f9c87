//! A compiled, shareable query.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use ql_diagnostic::QlError;
use ql_ir::{Backtrace, BacktraceTable, SharedTree, TermId, TermTree};

use crate::environment::Environment;
use crate::value::EvalResult;

/// An annotated, validated and rewritten term tree.
///
/// Every part is immutable and reference-counted: cloning a `Query` is cheap
/// and clones can be evaluated concurrently from different threads.
#[derive(Clone, Debug)]
pub struct Query {
    tree: SharedTree,
    backtraces: Arc<BacktraceTable>,
    rewrites: Arc<FxHashMap<TermId, TermId>>,
    root: TermId,
}

impl Query {
    pub(crate) fn new(
        tree: TermTree,
        backtraces: BacktraceTable,
        rewrites: FxHashMap<TermId, TermId>,
        root: TermId,
    ) -> Self {
        Self {
            tree: Arc::new(tree),
            backtraces: Arc::new(backtraces),
            rewrites: Arc::new(rewrites),
            root,
        }
    }

    #[inline]
    pub fn root(&self) -> TermId {
        self.root
    }

    #[inline]
    pub fn tree(&self) -> &TermTree {
        &self.tree
    }

    #[inline]
    pub fn backtraces(&self) -> &BacktraceTable {
        &self.backtraces
    }

    #[inline]
    pub fn backtrace(&self, id: TermId) -> Option<&Backtrace> {
        self.backtraces.get(id)
    }

    /// The expansion `id` was rewritten to, if any.
    #[inline]
    pub fn rewritten(&self, id: TermId) -> Option<TermId> {
        self.rewrites.get(&id).copied()
    }

    /// The term evaluated in place of `id`.
    #[inline]
    pub fn resolve(&self, id: TermId) -> TermId {
        self.rewritten(id).unwrap_or(id)
    }

    /// Attach the backtrace of `id` to `err` unless it already has one.
    #[inline]
    pub fn error_at(&self, id: TermId, err: QlError) -> QlError {
        err.or_backtrace(self.backtrace(id))
    }

    /// Evaluate the root term.
    pub fn run<E: Environment + ?Sized>(&self, env: &mut E) -> EvalResult {
        env.evaluate(self, self.root)
    }
}
