//! Field labels and the comparison capability used for tie-breaking.
//!
//! A record field is named by a [`FieldLabel`]: either a positional index
//! or an interned text name. The engine never inspects the text itself;
//! callers supply a [`LabelResolver`] so that name tokens can be compared
//! by their raw bytes. The resulting total order is used *only* to break
//! ties deterministically, never to decide graph structure.

use std::cmp::Ordering;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Interned token standing in for the text of a field name.
///
/// Tokens are opaque: two tokens are the same name iff they are equal, and
/// only a [`LabelResolver`] can recover the underlying bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NameToken(u32);

impl NameToken {
    /// Wrap an externally managed intern id.
    pub fn from_raw(raw: u32) -> Self {
        NameToken(raw)
    }

    /// The underlying intern id.
    pub fn into_raw(self) -> u32 {
        self.0
    }
}

/// One field of a record: a positional index or an interned name.
///
/// Equality is exact identity. The tie-break order (integer labels first,
/// then by value; names by raw byte content) lives in the internal
/// comparator and needs a [`LabelResolver`] for the name case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldLabel {
    /// Positional / list index.
    Index(u64),
    /// Text field name, interned elsewhere.
    Name(NameToken),
}

/// Capability to resolve a [`NameToken`] back to its raw, unescaped bytes.
///
/// Passed explicitly into [`Graph::sort`](crate::Graph::sort) so the engine
/// carries no hidden global interner state and is trivially testable with
/// synthetic labels.
pub trait LabelResolver {
    /// Raw unescaped bytes of the interned name.
    fn name_bytes(&self, token: NameToken) -> &[u8];
}

/// Comparator over labels.
///
/// Index labels sort before name labels; indices numerically; names by raw
/// bytes.
pub(crate) struct LabelCmp<'r, R: LabelResolver> {
    resolver: &'r R,
}

impl<'r, R: LabelResolver> LabelCmp<'r, R> {
    pub(crate) fn new(resolver: &'r R) -> Self {
        LabelCmp { resolver }
    }

    pub(crate) fn labels(&self, a: FieldLabel, b: FieldLabel) -> Ordering {
        match (a, b) {
            (FieldLabel::Index(x), FieldLabel::Index(y)) => x.cmp(&y),
            (FieldLabel::Index(_), FieldLabel::Name(_)) => Ordering::Less,
            (FieldLabel::Name(_), FieldLabel::Index(_)) => Ordering::Greater,
            (FieldLabel::Name(x), FieldLabel::Name(y)) => self
                .resolver
                .name_bytes(x)
                .cmp(self.resolver.name_bytes(y)),
        }
    }
}

/// Minimal string interner implementing [`LabelResolver`].
///
/// For callers that do not already manage a name table, and for tests.
#[derive(Debug, Default)]
pub struct StringInterner {
    by_name: FxHashMap<String, NameToken>,
    names: Vec<String>,
}

impl StringInterner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a name, returning the same token for repeated calls.
    pub fn intern(&mut self, name: &str) -> NameToken {
        if let Some(&token) = self.by_name.get(name) {
            return token;
        }
        let token = NameToken(self.names.len() as u32);
        self.names.push(name.to_owned());
        self.by_name.insert(name.to_owned(), token);
        token
    }

    /// Intern a name and wrap it as a [`FieldLabel`].
    pub fn label(&mut self, name: &str) -> FieldLabel {
        FieldLabel::Name(self.intern(name))
    }

    /// The interned text of `token`.
    ///
    /// # Panics
    /// Panics if `token` did not come from this interner.
    pub fn resolve(&self, token: NameToken) -> &str {
        &self.names[token.0 as usize]
    }
}

impl LabelResolver for StringInterner {
    fn name_bytes(&self, token: NameToken) -> &[u8] {
        self.names[token.0 as usize].as_bytes()
    }
}
