//! QL IR - term tree, datum and backtrace types for the query front end.
//!
//! - [`Datum`]: immutable JSON-like values
//! - [`TermTree`]: append-only arena of query terms addressed by [`TermId`]
//! - [`Backtrace`]/[`Frame`]: root-relative term paths for diagnostics
//! - [`BacktraceTable`]: out-of-band `TermId -> Backtrace` side-table
//!
//! # Design
//!
//! - **Flatten everything**: no `Box<Term>`; operands are `TermId` ranges
//! - **No in-place position data**: backtraces live beside the tree, so a
//!   subtree shared by a rewrite is never mutated

mod backtrace;
mod datum;
mod stack;
mod term;
mod tree;

pub use backtrace::{Backtrace, BacktraceTable, Frame};
pub use datum::{Datum, DatumObject, DatumType};
pub use stack::ensure_sufficient_stack;
pub use term::{DatumId, OptArg, OptArgRange, TermId, TermKind, TermRange};
pub use tree::{SharedTree, TermTree};
