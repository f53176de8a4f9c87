//! The term arena.
//!
//! [`TermTree`] uses struct-of-arrays layout: `kinds`, `args`, `optargs` and
//! `datums` are parallel arrays indexed by [`TermId`]. Operand lists and named
//! options are flattened into shared pools addressed by ranges.
//!
//! The arena is append-only. Terms are never removed or edited after they
//! are pushed; rewrites append new terms that may reference existing ones.

use std::sync::Arc;

use crate::backtrace::Frame;
use crate::datum::Datum;
use crate::term::{DatumId, OptArg, OptArgRange, TermId, TermKind, TermRange};

/// A term arena shared between concurrent evaluations.
pub type SharedTree = Arc<TermTree>;

/// Convert an arena length to `u32`.
///
/// # Panics
/// Panics if the arena outgrows `u32` indices.
#[inline]
pub(crate) fn to_u32(len: usize, what: &str) -> u32 {
    u32::try_from(len).unwrap_or_else(|_| panic!("too many {what} for u32 index"))
}

/// Arena holding every term of one query.
#[derive(Clone, Debug, Default)]
pub struct TermTree {
    kinds: Vec<TermKind>,
    args: Vec<TermRange>,
    optargs: Vec<OptArgRange>,
    datums: Vec<Option<DatumId>>,
    arg_lists: Vec<TermId>,
    opt_lists: Vec<OptArg>,
    datum_pool: Vec<Datum>,
}

impl TermTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arena pre-sized for roughly `terms` nodes.
    pub fn with_capacity(terms: usize) -> Self {
        Self {
            kinds: Vec::with_capacity(terms),
            args: Vec::with_capacity(terms),
            optargs: Vec::with_capacity(terms),
            datums: Vec::with_capacity(terms),
            arg_lists: Vec::with_capacity(terms),
            opt_lists: Vec::new(),
            datum_pool: Vec::new(),
        }
    }

    /// Push a `DATUM` literal.
    pub fn push_datum(&mut self, datum: impl Into<Datum>) -> TermId {
        let datum_id = DatumId::new(to_u32(self.datum_pool.len(), "datums"));
        self.datum_pool.push(datum.into());
        self.push_node(TermKind::Datum, TermRange::EMPTY, OptArgRange::EMPTY, Some(datum_id))
    }

    /// Push a term with positional operands only.
    pub fn push(&mut self, kind: TermKind, args: &[TermId]) -> TermId {
        let range = self.push_arg_list(args);
        self.push_node(kind, range, OptArgRange::EMPTY, None)
    }

    /// Push a term with positional operands and named options.
    ///
    /// Options are stored sorted by name, which is the order the walker
    /// visits them in. Duplicate names are kept (in insertion order) so the
    /// walker can report them.
    pub fn push_with_optargs<K: Into<Arc<str>>>(
        &mut self,
        kind: TermKind,
        args: &[TermId],
        optargs: impl IntoIterator<Item = (K, TermId)>,
    ) -> TermId {
        let range = self.push_arg_list(args);
        let mut opts: Vec<OptArg> = optargs
            .into_iter()
            .map(|(name, value)| OptArg {
                name: name.into(),
                value,
            })
            .collect();
        opts.sort_by(|a, b| a.name.as_bytes().cmp(b.name.as_bytes()));
        let opt_range = if opts.is_empty() {
            OptArgRange::EMPTY
        } else {
            let start = to_u32(self.opt_lists.len(), "named options");
            let len = to_u32(opts.len(), "named options");
            self.opt_lists.extend(opts);
            OptArgRange::new(start, len)
        };
        self.push_node(kind, range, opt_range, None)
    }

    fn push_arg_list(&mut self, args: &[TermId]) -> TermRange {
        if args.is_empty() {
            return TermRange::EMPTY;
        }
        let start = to_u32(self.arg_lists.len(), "operand lists");
        self.arg_lists.extend_from_slice(args);
        TermRange::new(start, to_u32(args.len(), "operands"))
    }

    fn push_node(
        &mut self,
        kind: TermKind,
        args: TermRange,
        optargs: OptArgRange,
        datum: Option<DatumId>,
    ) -> TermId {
        let id = TermId::new(to_u32(self.kinds.len(), "terms"));
        debug_assert!(
            self.range_args(args)
                .iter()
                .chain(self.range_optargs(optargs).iter().map(|o| &o.value))
                .all(|child| *child < id),
            "operands must be pushed before the term that uses them"
        );
        self.kinds.push(kind);
        self.args.push(args);
        self.optargs.push(optargs);
        self.datums.push(datum);
        id
    }

    fn range_args(&self, range: TermRange) -> &[TermId] {
        let start = range.start as usize;
        &self.arg_lists[start..start + range.len()]
    }

    fn range_optargs(&self, range: OptArgRange) -> &[OptArg] {
        let start = range.start as usize;
        &self.opt_lists[start..start + range.len()]
    }

    #[inline]
    pub fn kind(&self, id: TermId) -> TermKind {
        self.kinds[id.index()]
    }

    /// Positional operands in evaluation order.
    #[inline]
    pub fn args(&self, id: TermId) -> &[TermId] {
        self.range_args(self.args[id.index()])
    }

    /// Named options, sorted by name.
    #[inline]
    pub fn optargs(&self, id: TermId) -> &[OptArg] {
        self.range_optargs(self.optargs[id.index()])
    }

    /// Look up a named option by name.
    pub fn optarg(&self, id: TermId, name: &str) -> Option<TermId> {
        self.optargs(id)
            .iter()
            .find(|opt| &*opt.name == name)
            .map(|opt| opt.value)
    }

    /// The literal of a `DATUM` term.
    #[inline]
    pub fn datum(&self, id: TermId) -> Option<&Datum> {
        self.datums[id.index()].map(|d| &self.datum_pool[d.index()])
    }

    /// Children in walk order: positional operands, then named options.
    pub fn children(&self, id: TermId) -> impl Iterator<Item = (Frame, TermId)> + '_ {
        let positional = self
            .args(id)
            .iter()
            .zip(0u32..)
            .map(|(child, index)| (Frame::Pos(index), *child));
        let named = self
            .optargs(id)
            .iter()
            .map(|opt| (Frame::Opt(Arc::clone(&opt.name)), opt.value));
        positional.chain(named)
    }

    #[inline]
    pub fn contains(&self, id: TermId) -> bool {
        id.index() < self.kinds.len()
    }

    /// Number of terms in the arena.
    #[inline]
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn push_and_read_back() {
        let mut tree = TermTree::new();
        let one = tree.push_datum(1);
        let two = tree.push_datum(2);
        let add = tree.push(TermKind::Add, &[one, two]);

        assert_eq!(tree.len(), 3);
        assert_eq!(tree.kind(add), TermKind::Add);
        assert_eq!(tree.args(add), &[one, two]);
        assert_eq!(tree.datum(one), Some(&Datum::from(1)));
        assert_eq!(tree.datum(add), None);
        assert!(tree.optargs(add).is_empty());
    }

    #[test]
    fn optargs_are_sorted_by_name() {
        let mut tree = TermTree::new();
        let table = tree.push(TermKind::Table, &[]);
        let a = tree.push_datum("x");
        let b = tree.push_datum(true);
        let insert = tree.push_with_optargs(
            TermKind::Insert,
            &[table],
            [("return_changes", b), ("durability", a)],
        );

        let names: Vec<&str> = tree.optargs(insert).iter().map(|o| &*o.name).collect();
        assert_eq!(names, vec!["durability", "return_changes"]);
        assert_eq!(tree.optarg(insert, "return_changes"), Some(b));
        assert_eq!(tree.optarg(insert, "missing"), None);
    }

    #[test]
    fn children_visit_positional_then_named() {
        let mut tree = TermTree::new();
        let seq = tree.push(TermKind::Table, &[]);
        let pred = tree.push_datum(true);
        let default = tree.push_datum(false);
        let filter = tree.push_with_optargs(TermKind::Filter, &[seq, pred], [("default", default)]);

        let children: Vec<_> = tree.children(filter).collect();
        assert_eq!(
            children,
            vec![
                (Frame::Pos(0), seq),
                (Frame::Pos(1), pred),
                (Frame::opt("default"), default),
            ]
        );
    }

    #[test]
    fn operands_can_be_shared() {
        let mut tree = TermTree::new();
        let x = tree.push_datum(5);
        let first = tree.push(TermKind::Add, &[x, x]);
        let second = tree.push(TermKind::Mul, &[x, first]);
        assert_eq!(tree.args(first), &[x, x]);
        assert_eq!(tree.args(second)[0], x);
    }

    #[test]
    fn terms_accept_more_than_u16_operands() {
        let mut tree = TermTree::new();
        let items: Vec<TermId> = (0..70_000).map(|i| tree.push_datum(i)).collect();
        let array = tree.push(TermKind::MakeArray, &items);
        assert_eq!(tree.args(array).len(), 70_000);
        assert_eq!(tree.args(array)[69_999], items[69_999]);

        let names: Vec<String> = (0..70_000).map(|i| format!("k{i}")).collect();
        let value = tree.push_datum(true);
        let obj = tree.push_with_optargs(
            TermKind::MakeObj,
            &[],
            names.iter().map(|name| (name.as_str(), value)),
        );
        assert_eq!(tree.optargs(obj).len(), 70_000);
        assert_eq!(tree.optarg(obj, "k69999"), Some(value));
    }
}
