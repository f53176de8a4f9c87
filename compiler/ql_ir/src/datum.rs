//! Immutable, JSON-like query values.
//!
//! Strings, arrays and objects sit behind `Arc` so cloning a datum is O(1)
//! and datums can be handed to concurrent evaluations of the same query.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// The type of a datum.
///
/// Variants are declared in alphabetical order of their names so the derived
/// `Ord` is the cross-type ordering used by [`Datum::cmp_datum`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DatumType {
    Array,
    Bool,
    Null,
    Number,
    Object,
    String,
}

impl DatumType {
    /// Upper-case name used in user-facing messages.
    pub const fn name(self) -> &'static str {
        match self {
            DatumType::Array => "ARRAY",
            DatumType::Bool => "BOOL",
            DatumType::Null => "NULL",
            DatumType::Number => "NUMBER",
            DatumType::Object => "OBJECT",
            DatumType::String => "STRING",
        }
    }
}

impl fmt::Display for DatumType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Object representation: keys are kept sorted.
pub type DatumObject = BTreeMap<Arc<str>, Datum>;

/// An immutable query value.
#[derive(Clone, Debug, PartialEq)]
pub enum Datum {
    Null,
    Bool(bool),
    Number(f64),
    String(Arc<str>),
    Array(Arc<[Datum]>),
    Object(Arc<DatumObject>),
}

impl Datum {
    /// Create a number datum.
    #[inline]
    pub const fn number(n: f64) -> Self {
        Datum::Number(n)
    }

    /// Create a string datum.
    pub fn string(s: impl Into<Arc<str>>) -> Self {
        Datum::String(s.into())
    }

    /// Create an array datum from its elements.
    pub fn array(items: impl IntoIterator<Item = Datum>) -> Self {
        Datum::Array(items.into_iter().collect())
    }

    /// Create an object datum from key/value pairs. Later keys win.
    pub fn object<K: Into<Arc<str>>>(entries: impl IntoIterator<Item = (K, Datum)>) -> Self {
        Datum::Object(Arc::new(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    pub fn datum_type(&self) -> DatumType {
        match self {
            Datum::Null => DatumType::Null,
            Datum::Bool(_) => DatumType::Bool,
            Datum::Number(_) => DatumType::Number,
            Datum::String(_) => DatumType::String,
            Datum::Array(_) => DatumType::Array,
            Datum::Object(_) => DatumType::Object,
        }
    }

    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.datum_type().name()
    }

    /// Only `false` and `null` are falsy. Zero, `""` and `[]` are truthy.
    #[inline]
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Datum::Null | Datum::Bool(false))
    }

    #[inline]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Datum::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Datum::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Datum::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Datum]> {
        match self {
            Datum::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&DatumObject> {
        match self {
            Datum::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Total order over datums.
    ///
    /// Different types order by type name; equal types order by value.
    /// Arrays compare element-wise, objects by their sorted entries.
    pub fn cmp_datum(&self, other: &Datum) -> Ordering {
        match (self, other) {
            (Datum::Null, Datum::Null) => Ordering::Equal,
            (Datum::Bool(a), Datum::Bool(b)) => a.cmp(b),
            // Non-finite numbers are rejected before they become datums.
            (Datum::Number(a), Datum::Number(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (Datum::String(a), Datum::String(b)) => a.as_bytes().cmp(b.as_bytes()),
            (Datum::Array(a), Datum::Array(b)) => cmp_seq(a.iter(), b.iter()),
            (Datum::Object(a), Datum::Object(b)) => {
                let mut left = a.iter();
                let mut right = b.iter();
                loop {
                    match (left.next(), right.next()) {
                        (None, None) => return Ordering::Equal,
                        (None, Some(_)) => return Ordering::Less,
                        (Some(_), None) => return Ordering::Greater,
                        (Some((ka, va)), Some((kb, vb))) => {
                            let ord = ka
                                .as_bytes()
                                .cmp(kb.as_bytes())
                                .then_with(|| va.cmp_datum(vb));
                            if ord != Ordering::Equal {
                                return ord;
                            }
                        }
                    }
                }
            }
            _ => self.datum_type().cmp(&other.datum_type()),
        }
    }
}

fn cmp_seq<'a>(
    mut left: impl Iterator<Item = &'a Datum>,
    mut right: impl Iterator<Item = &'a Datum>,
) -> Ordering {
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(a), Some(b)) => {
                let ord = a.cmp_datum(b);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

impl From<bool> for Datum {
    fn from(b: bool) -> Self {
        Datum::Bool(b)
    }
}

impl From<f64> for Datum {
    fn from(n: f64) -> Self {
        Datum::Number(n)
    }
}

impl From<i32> for Datum {
    fn from(n: i32) -> Self {
        Datum::Number(f64::from(n))
    }
}

impl From<&str> for Datum {
    fn from(s: &str) -> Self {
        Datum::String(Arc::from(s))
    }
}

impl From<Vec<Datum>> for Datum {
    fn from(items: Vec<Datum>) -> Self {
        Datum::Array(Arc::from(items))
    }
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datum::Null => f.write_str("null"),
            Datum::Bool(b) => write!(f, "{b}"),
            Datum::Number(n) => write_number(f, *n),
            Datum::String(s) => write_quoted(f, s),
            Datum::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Datum::Object(obj) => {
                f.write_str("{")?;
                for (i, (key, value)) in obj.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write_quoted(f, key)?;
                    write!(f, ": {value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

/// Very large and very small magnitudes use exponent notation.
fn write_number(f: &mut fmt::Formatter<'_>, n: f64) -> fmt::Result {
    let magnitude = n.abs();
    if magnitude >= 1e21 || (magnitude > 0.0 && magnitude < 1e-6) {
        write!(f, "{n:e}")
    } else {
        write!(f, "{n}")
    }
}

/// Write a JSON-style quoted string.
pub(crate) fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("\"")?;
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c if c.is_control() => write!(f, "\\u{:04x}", u32::from(c))?,
            c => write!(f, "{c}")?,
        }
    }
    f.write_str("\"")
}
