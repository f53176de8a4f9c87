//! Backtraces: root-relative paths to terms.
//!
//! A [`Backtrace`] is the sequence of [`Frame`]s traversed from the query
//! root to a term. The error-reporting layer renders it against the user's
//! original query to underline the offending sub-expression.
//!
//! Backtraces are stored out-of-band in a [`BacktraceTable`] keyed by
//! [`TermId`], never on the terms themselves, so subtrees shared by a rewrite
//! stay immutable.

use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::datum::write_quoted;
use crate::TermId;

/// One step in a backtrace.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Frame {
    /// Zero-based positional operand index.
    Pos(u32),
    /// Named option label.
    Opt(Arc<str>),
}

impl Frame {
    pub fn opt(name: impl Into<Arc<str>>) -> Self {
        Frame::Opt(name.into())
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frame::Pos(index) => write!(f, "{index}"),
            Frame::Opt(name) => write_quoted(f, name),
        }
    }
}

/// Ordered path of frames from the root. The root's backtrace is empty.
///
/// Two backtraces are equal iff their frames are equal element-wise.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Backtrace {
    frames: SmallVec<[Frame; 8]>,
}

impl Backtrace {
    /// The empty backtrace of a query root.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_frames(frames: impl IntoIterator<Item = Frame>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    #[inline]
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// This backtrace extended by one frame.
    #[must_use]
    pub fn child(&self, frame: Frame) -> Self {
        let mut frames = SmallVec::with_capacity(self.frames.len() + 1);
        frames.extend(self.frames.iter().cloned());
        frames.push(frame);
        Self { frames }
    }

    /// This backtrace extended by a relative path.
    #[must_use]
    pub fn join(&self, path: &[Frame]) -> Self {
        let mut frames = self.frames.clone();
        frames.extend(path.iter().cloned());
        Self { frames }
    }

    pub fn starts_with(&self, prefix: &Backtrace) -> bool {
        self.frames.starts_with(&prefix.frames)
    }
}

impl fmt::Display for Backtrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, frame) in self.frames.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{frame}")?;
        }
        f.write_str("]")
    }
}

/// Side-table mapping terms to their backtraces.
///
/// Entries are set at most once: [`insert_if_absent`](Self::insert_if_absent)
/// never replaces an existing backtrace.
#[derive(Clone, Debug, Default)]
pub struct BacktraceTable {
    entries: Vec<Option<Backtrace>>,
    filled: usize,
}

impl BacktraceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table pre-sized for an arena of `terms` nodes.
    pub fn with_capacity(terms: usize) -> Self {
        Self {
            entries: Vec::with_capacity(terms),
            filled: 0,
        }
    }

    #[inline]
    pub fn get(&self, id: TermId) -> Option<&Backtrace> {
        self.entries.get(id.index()).and_then(Option::as_ref)
    }

    #[inline]
    pub fn contains(&self, id: TermId) -> bool {
        self.get(id).is_some()
    }

    /// Record `backtrace` for `id` unless it already has one.
    ///
    /// Returns `true` if the entry was written.
    pub fn insert_if_absent(&mut self, id: TermId, backtrace: Backtrace) -> bool {
        let index = id.index();
        if index >= self.entries.len() {
            self.entries.resize(index + 1, None);
        }
        let slot = &mut self.entries[index];
        if slot.is_some() {
            return false;
        }
        *slot = Some(backtrace);
        self.filled += 1;
        true
    }

    /// Number of annotated terms.
    #[inline]
    pub fn len(&self) -> usize {
        self.filled
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }

    /// Annotated terms in id order.
    pub fn iter(&self) -> impl Iterator<Item = (TermId, &Backtrace)> {
        self.entries.iter().enumerate().filter_map(|(i, entry)| {
            let bt = entry.as_ref()?;
            let raw = u32::try_from(i).ok()?;
            Some((TermId::new(raw), bt))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn child_and_join_extend_in_order() {
        let bt = Backtrace::root().child(Frame::Pos(1)).child(Frame::opt("default"));
        assert_eq!(bt.frames(), &[Frame::Pos(1), Frame::opt("default")]);

        let joined = bt.join(&[Frame::Pos(0), Frame::Pos(2)]);
        assert_eq!(joined.len(), 4);
        assert!(joined.starts_with(&bt));
        assert!(!bt.starts_with(&joined));
    }

    #[test]
    fn equality_is_elementwise() {
        let a = Backtrace::from_frames([Frame::Pos(0), Frame::Pos(1)]);
        let b = Backtrace::root().child(Frame::Pos(0)).child(Frame::Pos(1));
        let c = Backtrace::from_frames([Frame::Pos(1), Frame::Pos(0)]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn display_renders_list() {
        let bt = Backtrace::from_frames([Frame::Pos(1), Frame::opt("index"), Frame::Pos(0)]);
        assert_eq!(bt.to_string(), r#"[1, "index", 0]"#);
        assert_eq!(Backtrace::root().to_string(), "[]");
    }

    #[test]
    fn table_never_overwrites() {
        let mut table = BacktraceTable::new();
        let id = TermId::new(3);
        assert!(table.insert_if_absent(id, Backtrace::from_frames([Frame::Pos(0)])));
        assert!(!table.insert_if_absent(id, Backtrace::from_frames([Frame::Pos(9)])));
        assert_eq!(table.get(id), Some(&Backtrace::from_frames([Frame::Pos(0)])));
        assert_eq!(table.len(), 1);
        assert!(!table.contains(TermId::new(0)));
        assert!(!table.contains(TermId::new(100)));
    }

    #[test]
    fn table_iterates_in_id_order() {
        let mut table = BacktraceTable::with_capacity(4);
        table.insert_if_absent(TermId::new(2), Backtrace::root());
        table.insert_if_absent(TermId::new(0), Backtrace::root().child(Frame::Pos(0)));
        let ids: Vec<_> = table.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![TermId::new(0), TermId::new(2)]);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serializes_as_flat_list() {
        let bt = Backtrace::from_frames([Frame::Pos(1), Frame::opt("default")]);
        let json = serde_json::to_string(&bt).unwrap_or_default();
        assert_eq!(json, r#"[1,"default"]"#);
    }
}
