//! Per-kind write-placement table.
//!
//! Each operator declares, for each of its child slots, whether write and
//! meta operations may appear in that slot's subtree. The table is an
//! exhaustive match so adding a [`TermKind`] forces a decision here.

use ql_ir::{Frame, TermKind};

/// Write permission for one child slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WritePolicy {
    /// Writes are permitted regardless of the parent context.
    Allowed,
    /// Writes are forbidden in the slot and its whole subtree.
    Disallowed,
    /// The slot takes the parent's context.
    Inherit,
}

impl WritePolicy {
    /// The context a child slot is visited with.
    #[inline]
    pub fn resolve(self, parent_allows: bool) -> bool {
        match self {
            WritePolicy::Allowed => true,
            WritePolicy::Disallowed => false,
            WritePolicy::Inherit => parent_allows,
        }
    }
}

/// Policy of the query root's (virtual) slot.
pub const ROOT_POLICY: WritePolicy = WritePolicy::Allowed;

/// Write policy for `slot` of a term of kind `kind`.
///
/// Stream transforms and writes let their input sequence (operand 0) inherit
/// the parent context; their functions and options may not write.
pub fn slot_policy(kind: TermKind, slot: &Frame) -> WritePolicy {
    match kind {
        TermKind::Filter
        | TermKind::Map
        | TermKind::ConcatMap
        | TermKind::Reduce
        | TermKind::OrderBy
        | TermKind::Insert
        | TermKind::Update
        | TermKind::Replace => match slot {
            Frame::Pos(0) => WritePolicy::Inherit,
            Frame::Pos(_) | Frame::Opt(_) => WritePolicy::Disallowed,
        },

        TermKind::Delete => match slot {
            Frame::Pos(_) => WritePolicy::Inherit,
            Frame::Opt(_) => WritePolicy::Disallowed,
        },

        TermKind::Datum
        | TermKind::MakeArray
        | TermKind::MakeObj
        | TermKind::Var
        | TermKind::ImplicitVar
        | TermKind::Func
        | TermKind::Funcall
        | TermKind::Branch
        | TermKind::All
        | TermKind::Any
        | TermKind::Not
        | TermKind::Eq
        | TermKind::Ne
        | TermKind::Lt
        | TermKind::Le
        | TermKind::Gt
        | TermKind::Ge
        | TermKind::Add
        | TermKind::Sub
        | TermKind::Mul
        | TermKind::Div
        | TermKind::Mod
        | TermKind::Db
        | TermKind::Table
        | TermKind::Get
        | TermKind::Asc
        | TermKind::Desc
        | TermKind::ForEach
        | TermKind::DbCreate
        | TermKind::DbDrop
        | TermKind::TableCreate
        | TermKind::TableDrop => WritePolicy::Inherit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_combines_with_parent() {
        assert!(WritePolicy::Allowed.resolve(false));
        assert!(!WritePolicy::Disallowed.resolve(true));
        assert!(WritePolicy::Inherit.resolve(true));
        assert!(!WritePolicy::Inherit.resolve(false));
        assert!(ROOT_POLICY.resolve(false));
    }

    #[test]
    fn stream_functions_forbid_writes() {
        for kind in [TermKind::Filter, TermKind::Map, TermKind::ConcatMap, TermKind::Reduce] {
            assert_eq!(slot_policy(kind, &Frame::Pos(0)), WritePolicy::Inherit);
            assert_eq!(slot_policy(kind, &Frame::Pos(1)), WritePolicy::Disallowed);
            assert_eq!(slot_policy(kind, &Frame::opt("default")), WritePolicy::Disallowed);
        }
    }

    #[test]
    fn writes_forbid_nested_writes_outside_selection() {
        assert_eq!(slot_policy(TermKind::Insert, &Frame::Pos(0)), WritePolicy::Inherit);
        assert_eq!(slot_policy(TermKind::Insert, &Frame::Pos(1)), WritePolicy::Disallowed);
        assert_eq!(slot_policy(TermKind::Update, &Frame::Pos(1)), WritePolicy::Disallowed);
        assert_eq!(slot_policy(TermKind::Delete, &Frame::Pos(0)), WritePolicy::Inherit);
        assert_eq!(
            slot_policy(TermKind::Delete, &Frame::opt("durability")),
            WritePolicy::Disallowed
        );
    }

    #[test]
    fn sequencing_terms_inherit() {
        for kind in [TermKind::ForEach, TermKind::Funcall, TermKind::Branch, TermKind::MakeArray] {
            assert_eq!(slot_policy(kind, &Frame::Pos(1)), WritePolicy::Inherit);
        }
    }
}
