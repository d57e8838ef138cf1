//! C type representation and ABI layout engine.
//!
//! Models every type the C language can construct, answers semantic queries
//! about them (category predicates, integer promotion, structural equality),
//! computes their ABI layout (size, alignment, field offsets) for a given
//! target, and provides the builders that assemble a fully-qualified type
//! from the stream of declaration specifiers a parser emits.
//!
//! The engine is single-threaded by design: it runs inside the parser,
//! which holds all parsing state. Type values are cheap to clone; their
//! heap payloads are shared behind `Rc`. Record and enum payloads are
//! completed in place exactly once, by the parser, before any other
//! observer sees them.

// Compiler functions naturally accumulate parameters (context, types, spans, flags).
// Refactoring every one into a struct would add boilerplate without improving clarity.
#![allow(clippy::too_many_arguments)]

pub mod common;
pub mod types;

pub use common::error::{DiagnosticEngine, DiagnosticKind, Severity, TypeError};
pub use common::interner::{StringId, StringInterner};
pub use common::lang_opts::{CompilerKind, Env, LangOpts, Standard};
pub use common::source::Span;
pub use common::target::{Abi, Arch, Os, Target};
pub use types::builder::{TypeBuilder, TypeKeyword};
pub use types::qualifiers::{QualifierBuilder, Qualifiers};
pub use types::{CType, Specifier};
