//! Type qualifiers and the qualifier builder.
//!
//! The four ABI-relevant qualifiers live in a bit set; `register` rides
//! along as a fifth bit because function parameters carry it through type
//! construction, but it is storage-class information and every merge
//! operation except plain union strips it.

use bitflags::bitflags;

use crate::common::error::{DiagnosticEngine, DiagnosticKind};
use crate::common::interner::StringInterner;
use crate::common::source::Span;
use crate::types::CType;

bitflags! {
    /// Qualifier bit set attached to every type value.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Qualifiers: u8 {
        const CONST    = 1 << 0;
        const VOLATILE = 1 << 1;
        const RESTRICT = 1 << 2;
        const ATOMIC   = 1 << 3;
        /// Storage class, not a real qualifier. Kept only for function
        /// parameters; stripped by `typeof` and by all merges but union.
        const REGISTER = 1 << 4;
    }
}

impl Qualifiers {
    const REAL: Qualifiers = Qualifiers::CONST
        .union(Qualifiers::VOLATILE)
        .union(Qualifiers::RESTRICT)
        .union(Qualifiers::ATOMIC);

    /// Whether any real qualifier (not `register`) is set.
    pub fn any(self) -> bool {
        self.intersects(Qualifiers::REAL)
    }

    /// `self ⊇ other`, ignoring `register` on both sides.
    pub fn has_quals(self, other: Qualifiers) -> bool {
        self.contains(other & Qualifiers::REAL)
    }

    /// Union of const and volatile only; the conditional operator's result
    /// type merges nothing else.
    pub fn merge_cv(self, other: Qualifiers) -> Qualifiers {
        (self | other) & (Qualifiers::CONST | Qualifiers::VOLATILE)
    }

    /// Union of all four real qualifiers, for `typeof` unwrapping.
    pub fn merge_all(self, other: Qualifiers) -> Qualifiers {
        (self | other) & Qualifiers::REAL
    }

    /// What a `typeof` operand passes on: everything but `register`.
    pub fn inherit_from_typeof(self) -> Qualifiers {
        self & Qualifiers::REAL
    }
}

/// Accumulates qualifier tokens for one declaration and applies them at
/// `finish`, validating the combinations C rejects. Each qualifier
/// remembers the span of its first occurrence for diagnostics.
#[derive(Debug, Default)]
pub struct QualifierBuilder {
    pub const_tok: Option<Span>,
    pub volatile_tok: Option<Span>,
    pub restrict_tok: Option<Span>,
    pub atomic_tok: Option<Span>,
    pub register_tok: Option<Span>,
}

impl QualifierBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one qualifier keyword. Re-qualification is legal in C99 and
    /// later, so duplicates are silently collapsed onto the first token.
    pub fn add(&mut self, qual: Qualifiers, tok: Span) {
        let slot = if qual == Qualifiers::CONST {
            &mut self.const_tok
        } else if qual == Qualifiers::VOLATILE {
            &mut self.volatile_tok
        } else if qual == Qualifiers::RESTRICT {
            &mut self.restrict_tok
        } else if qual == Qualifiers::ATOMIC {
            &mut self.atomic_tok
        } else if qual == Qualifiers::REGISTER {
            &mut self.register_tok
        } else {
            return;
        };
        if slot.is_none() {
            *slot = Some(tok);
        }
    }

    /// Apply the collected qualifiers to `ty`, diagnosing misuse. Invalid
    /// qualifiers are reported and dropped; the rest are set.
    pub fn finish(
        &self,
        ty: &mut CType,
        interner: &StringInterner,
        diags: &mut DiagnosticEngine,
    ) {
        let mut quals = ty.qualifiers;

        if self.const_tok.is_some() {
            quals |= Qualifiers::CONST;
        }
        if self.volatile_tok.is_some() {
            quals |= Qualifiers::VOLATILE;
        }
        if let Some(tok) = self.restrict_tok {
            if ty.is_ptr() {
                quals |= Qualifiers::RESTRICT;
            } else {
                diags.emit_str(DiagnosticKind::RestrictNonPointer, tok, &ty.dump(interner));
            }
        }
        if let Some(tok) = self.atomic_tok {
            if ty.is_array() {
                diags.emit_str(DiagnosticKind::AtomicArray, tok, &ty.dump(interner));
            } else if ty.is_func() {
                diags.emit_str(DiagnosticKind::AtomicFunc, tok, &ty.dump(interner));
            } else if !ty.is_complete() {
                diags.emit_str(DiagnosticKind::AtomicIncomplete, tok, &ty.dump(interner));
            } else {
                quals |= Qualifiers::ATOMIC;
            }
        }
        if self.register_tok.is_some() {
            quals |= Qualifiers::REGISTER;
        }

        ty.set_qualifiers(quals);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Specifier;

    #[test]
    fn test_merge_cv_drops_restrict_and_atomic() {
        let a = Qualifiers::CONST | Qualifiers::RESTRICT;
        let b = Qualifiers::VOLATILE | Qualifiers::ATOMIC;
        assert_eq!(a.merge_cv(b), Qualifiers::CONST | Qualifiers::VOLATILE);
    }

    #[test]
    fn test_merge_all_strips_register() {
        let a = Qualifiers::CONST | Qualifiers::REGISTER;
        let b = Qualifiers::ATOMIC;
        let merged = a.merge_all(b);
        assert_eq!(merged, Qualifiers::CONST | Qualifiers::ATOMIC);
        assert!(!merged.contains(Qualifiers::REGISTER));
    }

    #[test]
    fn test_has_quals_ignores_register() {
        let a = Qualifiers::CONST | Qualifiers::VOLATILE;
        let b = Qualifiers::CONST | Qualifiers::REGISTER;
        assert!(a.has_quals(b));
        assert!(!b.has_quals(a));
    }

    #[test]
    fn test_restrict_requires_pointer() {
        let interner = StringInterner::new();
        let mut diags = DiagnosticEngine::new();
        let mut builder = QualifierBuilder::new();
        builder.add(Qualifiers::RESTRICT, Span::dummy());

        let mut ty = CType::new(Specifier::Int);
        builder.finish(&mut ty, &interner, &mut diags);
        assert!(diags.seen(DiagnosticKind::RestrictNonPointer));
        assert!(!ty.qualifiers.contains(Qualifiers::RESTRICT));

        let mut diags = DiagnosticEngine::new();
        let mut ptr = CType::pointer_to(CType::new(Specifier::Int));
        builder.finish(&mut ptr, &interner, &mut diags);
        assert!(!diags.has_errors());
        assert!(ptr.qualifiers.contains(Qualifiers::RESTRICT));
    }

    #[test]
    fn test_atomic_rejects_incomplete_and_array() {
        let interner = StringInterner::new();
        let mut builder = QualifierBuilder::new();
        builder.add(Qualifiers::ATOMIC, Span::dummy());

        let mut diags = DiagnosticEngine::new();
        let mut void_ty = CType::new(Specifier::Void);
        builder.finish(&mut void_ty, &interner, &mut diags);
        assert!(diags.seen(DiagnosticKind::AtomicIncomplete));
        assert!(!void_ty.qualifiers.contains(Qualifiers::ATOMIC));

        let mut diags = DiagnosticEngine::new();
        let mut arr = CType::array(CType::new(Specifier::Int), 4);
        builder.finish(&mut arr, &interner, &mut diags);
        assert!(diags.seen(DiagnosticKind::AtomicArray));
    }
}
