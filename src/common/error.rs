//! Structured diagnostic infrastructure for the type engine.
//!
//! Provides a `DiagnosticEngine` that collects errors, warnings, and notes
//! keyed to source spans and renders them in GCC-compatible
//! `severity: message` format. Every diagnostic the engine can raise is
//! named by a `DiagnosticKind`; the kind selects the default severity and
//! the message template, so call sites never format message text themselves.
//!
//! Most diagnostics are non-fatal: the engine reports, repairs what it can,
//! and keeps going. The handful of conditions that abort the current
//! declaration (`_BitInt` bounds, arrays of incomplete element type) are
//! signaled through `TypeError` and propagate with `?`.

use thiserror::Error;

use crate::common::source::Span;

/// Fatal failures that abort the current declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TypeError {
    /// A diagnostic was emitted and the declaration cannot produce a type.
    #[error("parsing failed")]
    ParsingFailed,
    /// Sentinel returned by the specifier builder in suppressed mode; no
    /// diagnostic was emitted.
    #[error("cannot combine declaration specifiers")]
    CannotCombine,
}

/// Every diagnostic the type engine can raise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    // Qualifier misuse
    RestrictNonPointer,
    AtomicArray,
    AtomicFunc,
    AtomicIncomplete,
    QualOnRetType,
    QualifierNonOutermostArray,
    // Combined-type validity
    ArrayIncompleteElem,
    ArrayFuncElem,
    StaticNonOutermostArray,
    FuncCannotReturnArray,
    FuncCannotReturnFunc,
    // Specifier builder
    CannotCombineSpec,
    SpecFromTypedef,
    DuplicateDeclSpec,
    InvalidTypeof,
    MissingTypeSpecifier,
    PlainComplex,
    ComplexInt,
    // _BitInt bounds
    SignedBitIntTooSmall,
    UnsignedBitIntTooSmall,
    BitIntTooBig,
    // Target capability
    TypeNotSupportedOnTarget,
}

impl DiagnosticKind {
    fn severity(self) -> Severity {
        match self {
            DiagnosticKind::QualOnRetType
            | DiagnosticKind::DuplicateDeclSpec
            | DiagnosticKind::MissingTypeSpecifier
            | DiagnosticKind::PlainComplex
            | DiagnosticKind::ComplexInt => Severity::Warning,
            DiagnosticKind::SpecFromTypedef => Severity::Note,
            _ => Severity::Error,
        }
    }

    fn message(self, context: Option<&str>) -> String {
        let ctx = context.unwrap_or("");
        match self {
            DiagnosticKind::RestrictNonPointer => {
                format!("restrict requires a pointer ('{}' is invalid)", ctx)
            }
            DiagnosticKind::AtomicArray => {
                format!("_Atomic cannot be applied to array type '{}'", ctx)
            }
            DiagnosticKind::AtomicFunc => {
                format!("_Atomic cannot be applied to function type '{}'", ctx)
            }
            DiagnosticKind::AtomicIncomplete => {
                format!("_Atomic cannot be applied to incomplete type '{}'", ctx)
            }
            DiagnosticKind::QualOnRetType => {
                format!("'{}' qualifier on return type has no effect", ctx)
            }
            DiagnosticKind::QualifierNonOutermostArray => {
                "type qualifiers are only allowed in the outermost array dimension".to_string()
            }
            DiagnosticKind::ArrayIncompleteElem => {
                format!("array has incomplete element type '{}'", ctx)
            }
            DiagnosticKind::ArrayFuncElem => {
                "array cannot have element type of function".to_string()
            }
            DiagnosticKind::StaticNonOutermostArray => {
                "'static' is only allowed in the outermost array dimension".to_string()
            }
            DiagnosticKind::FuncCannotReturnArray => {
                format!("function cannot return array type '{}'", ctx)
            }
            DiagnosticKind::FuncCannotReturnFunc => {
                format!("function cannot return function type '{}'", ctx)
            }
            DiagnosticKind::CannotCombineSpec => {
                format!("cannot combine with previous '{}' declaration specifier", ctx)
            }
            DiagnosticKind::SpecFromTypedef => {
                format!("previous type comes from typedef '{}'", ctx)
            }
            DiagnosticKind::DuplicateDeclSpec => {
                format!("duplicate '{}' declaration specifier", ctx)
            }
            DiagnosticKind::InvalidTypeof => {
                "'typeof' cannot be combined with other type specifiers".to_string()
            }
            DiagnosticKind::MissingTypeSpecifier => {
                "type specifier missing, defaults to 'int'".to_string()
            }
            DiagnosticKind::PlainComplex => {
                "plain '_Complex' requires a type specifier; assuming '_Complex double'"
                    .to_string()
            }
            DiagnosticKind::ComplexInt => {
                "complex integer types are a GNU extension".to_string()
            }
            DiagnosticKind::SignedBitIntTooSmall => {
                "signed _BitInt must have a bit size of at least 2".to_string()
            }
            DiagnosticKind::UnsignedBitIntTooSmall => {
                "unsigned _BitInt must have a bit size of at least 1".to_string()
            }
            DiagnosticKind::BitIntTooBig => {
                "_BitInt of bit sizes greater than 128 are not supported".to_string()
            }
            DiagnosticKind::TypeNotSupportedOnTarget => {
                format!("'{}' is not supported on this target", ctx)
            }
        }
    }
}

/// Severity level for a diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Note => write!(f, "note"),
        }
    }
}

/// A single emitted diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub message: String,
    pub span: Span,
}

/// Collects and renders type-engine diagnostics.
///
/// Diagnostics are printed to stderr as soon as they are emitted, matching
/// GCC behavior, and retained so the parser (and tests) can inspect what
/// was raised. After each declaration the caller checks `has_errors()` to
/// decide whether to continue.
#[derive(Debug, Default)]
pub struct DiagnosticEngine {
    error_count: usize,
    warning_count: usize,
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit a diagnostic with no extra context string.
    pub fn emit(&mut self, kind: DiagnosticKind, tok: Span) {
        self.emit_inner(kind, tok, None);
    }

    /// Emit a diagnostic whose message embeds `context` (a type rendering,
    /// a specifier name, a typedef name).
    pub fn emit_str(&mut self, kind: DiagnosticKind, tok: Span, context: &str) {
        self.emit_inner(kind, tok, Some(context));
    }

    fn emit_inner(&mut self, kind: DiagnosticKind, tok: Span, context: Option<&str>) {
        let severity = kind.severity();
        let diag = Diagnostic {
            kind,
            severity,
            message: kind.message(context),
            span: tok,
        };
        self.render(&diag);
        match severity {
            Severity::Error => self.error_count += 1,
            Severity::Warning => self.warning_count += 1,
            Severity::Note => {}
        }
        self.diagnostics.push(diag);
    }

    fn render(&self, diag: &Diagnostic) {
        eprintln!("{}: {}", diag.severity, diag.message);
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn warning_count(&self) -> usize {
        self.warning_count
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Whether a diagnostic of `kind` has been emitted.
    pub fn seen(&self, kind: DiagnosticKind) -> bool {
        self.diagnostics.iter().any(|d| d.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_classification() {
        let mut diags = DiagnosticEngine::new();
        diags.emit_str(DiagnosticKind::CannotCombineSpec, Span::dummy(), "long");
        diags.emit(DiagnosticKind::MissingTypeSpecifier, Span::dummy());
        assert_eq!(diags.error_count(), 1);
        assert_eq!(diags.warning_count(), 1);
        assert!(diags.has_errors());
        assert!(diags.seen(DiagnosticKind::CannotCombineSpec));
        assert!(!diags.seen(DiagnosticKind::PlainComplex));
    }

    #[test]
    fn test_message_context_splicing() {
        let mut diags = DiagnosticEngine::new();
        diags.emit_str(DiagnosticKind::DuplicateDeclSpec, Span::dummy(), "signed");
        assert_eq!(
            diags.diagnostics()[0].message,
            "duplicate 'signed' declaration specifier"
        );
    }
}
