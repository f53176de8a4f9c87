//! QL Diagnostic - error taxonomy for the query front end.
//!
//! Every failure, whether found while annotating the tree, constructing
//! terms or evaluating them, is a [`QlError`] carrying a structured
//! [`ErrorKind`], the client-facing message and, once known, the
//! [`Backtrace`](ql_ir::Backtrace) of the term that raised it.
//!
//! Construct errors through the functions in [`errors`].

mod error;
pub mod errors;

pub use error::{ErrorCategory, ErrorKind, QlError, QlResult};
