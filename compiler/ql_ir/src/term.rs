//! Term identifiers, ranges and the closed set of operator kinds.
//!
//! Terms live in a [`TermTree`](crate::TermTree) arena and refer to each
//! other by [`TermId`] rather than by pointer, so a rewrite can share an
//! operand with the term it replaces without copying or mutating it.

use std::fmt;
use std::sync::Arc;

/// Index into the term arena.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TermId(u32);

impl TermId {
    #[inline]
    pub const fn new(index: u32) -> Self {
        TermId(index)
    }

    /// Index into the arena's parallel arrays.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for TermId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TermId({})", self.0)
    }
}

/// Index into the datum pool of a term arena.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub struct DatumId(u32);

impl DatumId {
    #[inline]
    pub const fn new(index: u32) -> Self {
        DatumId(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Range of positional operands in the flat argument list.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct TermRange {
    pub start: u32,
    pub len: u32,
}

impl TermRange {
    pub const EMPTY: TermRange = TermRange { start: 0, len: 0 };

    #[inline]
    pub const fn new(start: u32, len: u32) -> Self {
        TermRange { start, len }
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub const fn len(&self) -> usize {
        self.len as usize
    }
}

impl fmt::Debug for TermRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TermRange({}..{})", self.start, self.start + self.len)
    }
}

/// Range of named options in the flat option list.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Default)]
pub struct OptArgRange {
    pub start: u32,
    pub len: u32,
}

impl OptArgRange {
    pub const EMPTY: OptArgRange = OptArgRange { start: 0, len: 0 };

    #[inline]
    pub const fn new(start: u32, len: u32) -> Self {
        OptArgRange { start, len }
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub const fn len(&self) -> usize {
        self.len as usize
    }
}

/// A named option attached to a term.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct OptArg {
    pub name: Arc<str>,
    pub value: TermId,
}

/// Operator kinds understood by the front end.
///
/// Kinds with no evaluator in this workspace (table access, stream
/// transforms, writes) are still walked and validated.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TermKind {
    // Literals and constructors
    Datum,
    MakeArray,
    MakeObj,

    // Variables and functions
    Var,
    ImplicitVar,
    Func,
    Funcall,

    // Control
    Branch,
    All,
    Any,
    Not,

    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,

    // Data access and streams
    Db,
    Table,
    Get,
    Filter,
    Map,
    ConcatMap,
    Reduce,
    OrderBy,
    Asc,
    Desc,
    ForEach,

    // Writes
    Insert,
    Update,
    Delete,
    Replace,

    // Meta operations
    DbCreate,
    DbDrop,
    TableCreate,
    TableDrop,
}

impl TermKind {
    /// Upper-case wire name of the operator.
    pub const fn name(self) -> &'static str {
        match self {
            TermKind::Datum => "DATUM",
            TermKind::MakeArray => "MAKE_ARRAY",
            TermKind::MakeObj => "MAKE_OBJ",
            TermKind::Var => "VAR",
            TermKind::ImplicitVar => "IMPLICIT_VAR",
            TermKind::Func => "FUNC",
            TermKind::Funcall => "FUNCALL",
            TermKind::Branch => "BRANCH",
            TermKind::All => "ALL",
            TermKind::Any => "ANY",
            TermKind::Not => "NOT",
            TermKind::Eq => "EQ",
            TermKind::Ne => "NE",
            TermKind::Lt => "LT",
            TermKind::Le => "LE",
            TermKind::Gt => "GT",
            TermKind::Ge => "GE",
            TermKind::Add => "ADD",
            TermKind::Sub => "SUB",
            TermKind::Mul => "MUL",
            TermKind::Div => "DIV",
            TermKind::Mod => "MOD",
            TermKind::Db => "DB",
            TermKind::Table => "TABLE",
            TermKind::Get => "GET",
            TermKind::Filter => "FILTER",
            TermKind::Map => "MAP",
            TermKind::ConcatMap => "CONCAT_MAP",
            TermKind::Reduce => "REDUCE",
            TermKind::OrderBy => "ORDER_BY",
            TermKind::Asc => "ASC",
            TermKind::Desc => "DESC",
            TermKind::ForEach => "FOR_EACH",
            TermKind::Insert => "INSERT",
            TermKind::Update => "UPDATE",
            TermKind::Delete => "DELETE",
            TermKind::Replace => "REPLACE",
            TermKind::DbCreate => "DB_CREATE",
            TermKind::DbDrop => "DB_DROP",
            TermKind::TableCreate => "TABLE_CREATE",
            TermKind::TableDrop => "TABLE_DROP",
        }
    }

    /// Whether this operator mutates stored data or schema.
    ///
    /// Meta operations (database/table creation and removal) are subject to
    /// the same placement rules as document writes.
    pub const fn is_write(self) -> bool {
        matches!(
            self,
            TermKind::Insert
                | TermKind::Update
                | TermKind::Delete
                | TermKind::Replace
                | TermKind::DbCreate
                | TermKind::DbDrop
                | TermKind::TableCreate
                | TermKind::TableDrop
        )
    }

    /// Sort direction markers, only legal directly under `ORDER_BY`.
    pub const fn is_sort_direction(self) -> bool {
        matches!(self, TermKind::Asc | TermKind::Desc)
    }
}

impl fmt::Display for TermKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn term_id_round_trips_index() {
        let id = TermId::new(42);
        assert_eq!(id.index(), 42);
        assert_eq!(id.raw(), 42);
        assert_eq!(format!("{id:?}"), "TermId(42)");
    }

    #[test]
    fn ranges_report_length() {
        assert!(TermRange::EMPTY.is_empty());
        assert_eq!(TermRange::new(3, 4).len(), 4);
        assert_eq!(format!("{:?}", TermRange::new(3, 4)), "TermRange(3..7)");
        assert!(OptArgRange::default().is_empty());
    }

    #[test]
    fn write_kinds() {
        for kind in [
            TermKind::Insert,
            TermKind::Update,
            TermKind::Delete,
            TermKind::Replace,
            TermKind::TableCreate,
            TermKind::DbDrop,
        ] {
            assert!(kind.is_write(), "{kind} should be a write");
        }
        for kind in [TermKind::Filter, TermKind::ForEach, TermKind::Funcall, TermKind::Table] {
            assert!(!kind.is_write(), "{kind} should not be a write");
        }
    }

    #[test]
    fn names_are_wire_names() {
        assert_eq!(TermKind::ConcatMap.name(), "CONCAT_MAP");
        assert_eq!(TermKind::ForEach.to_string(), "FOR_EACH");
        assert!(TermKind::Asc.is_sort_direction());
        assert!(!TermKind::OrderBy.is_sort_direction());
    }
}
