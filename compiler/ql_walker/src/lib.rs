//! QL Walker - positions and well-formedness for query term trees.
//!
//! - [`fill_in_backtraces`]: annotate a freshly deserialized tree and check
//!   write placement, sort directions, nesting depth and named options
//! - [`propagate_backtraces`]: annotate a rewritten subtree with the position
//!   of the term it replaces
//!
//! Both walks read the [`TermTree`](ql_ir::TermTree) and write only to the
//! out-of-band [`BacktraceTable`](ql_ir::BacktraceTable).

mod config;
mod policy;
mod propagate;
mod walker;

pub use config::{WalkerConfig, MAX_DEPTH_ENV};
pub use policy::{slot_policy, WritePolicy, ROOT_POLICY};
pub use propagate::propagate_backtraces;
pub use walker::{fill_in_backtraces, fill_in_backtraces_with};
