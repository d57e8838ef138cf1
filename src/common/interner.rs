//! String interning for identifier names.
//!
//! The type engine never stores name strings inline; records, enums, fields,
//! and function parameters carry a `StringId` and resolve it through the
//! interner when a diagnostic or the printer needs the text. Anonymous
//! aggregates receive engine-assigned names that begin with `(` so that
//! "is this record anonymous" is a one-byte test on the interned name.

use rustc_hash::FxHashMap;

use crate::common::source::Span;

/// Interned identifier handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StringId(u32);

impl StringId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Maps identifier text to stable IDs and back.
#[derive(Debug, Default)]
pub struct StringInterner {
    strings: Vec<String>,
    ids: FxHashMap<String, StringId>,
}

impl StringInterner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `s`, returning the existing ID if it was seen before.
    pub fn intern(&mut self, s: &str) -> StringId {
        if let Some(&id) = self.ids.get(s) {
            return id;
        }
        let id = StringId(self.strings.len() as u32);
        self.strings.push(s.to_owned());
        self.ids.insert(s.to_owned(), id);
        id
    }

    /// Assign a name to an anonymous struct/union/enum. The name starts with
    /// `(` (no C identifier can) and embeds the declaration site so two
    /// distinct anonymous aggregates never collide.
    pub fn intern_anonymous(&mut self, tag: &str, tok: Span) -> StringId {
        let name = format!("(unnamed {} at {}:{})", tag, tok.file_id, tok.start);
        self.intern(&name)
    }

    pub fn lookup(&self, id: StringId) -> &str {
        &self.strings[id.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_dedup() {
        let mut interner = StringInterner::new();
        let a = interner.intern("foo");
        let b = interner.intern("bar");
        let c = interner.intern("foo");
        assert_eq!(a, c);
        assert_ne!(a, b);
        assert_eq!(interner.lookup(a), "foo");
        assert_eq!(interner.lookup(b), "bar");
    }

    #[test]
    fn test_anonymous_names_start_with_paren() {
        let mut interner = StringInterner::new();
        let id = interner.intern_anonymous("struct", Span::new(42, 48, 1));
        assert!(interner.lookup(id).starts_with('('));
        let other = interner.intern_anonymous("struct", Span::new(99, 105, 1));
        assert_ne!(id, other);
    }
}
