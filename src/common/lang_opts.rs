//! Language dialect options consulted by the type engine.
//!
//! `LangOpts` captures what the *user asked to compile as*: the C standard
//! revision, which compiler's quirks to emulate, and ABI-affecting flags
//! like `-fshort-enums`. `Env` bundles the options with the `Target`
//! descriptor; layout and equality take an `&Env` and nothing else.

use crate::common::target::Target;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Standard {
    C89,
    C99,
    C11,
    C17,
    C23,
}

/// Which compiler's dialect-specific behavior to reproduce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompilerKind {
    Gcc,
    Clang,
    Msvc,
}

#[derive(Debug, Clone, Copy)]
pub struct LangOpts {
    pub standard: Standard,
    pub emulate: CompilerKind,
    /// `-fshort-enums`: pack every enum into the smallest tag that fits.
    pub short_enums: bool,
}

impl Default for LangOpts {
    fn default() -> Self {
        Self {
            standard: Standard::C17,
            emulate: CompilerKind::Gcc,
            short_enums: false,
        }
    }
}

/// Read-only inputs of every layout/equality computation.
#[derive(Debug, Clone, Copy)]
pub struct Env {
    pub target: Target,
    pub opts: LangOpts,
}

impl Env {
    pub fn new(target: Target, opts: LangOpts) -> Self {
        Self { target, opts }
    }

    pub fn x86_64_linux_gnu() -> Self {
        Self::new(Target::x86_64_linux_gnu(), LangOpts::default())
    }

    pub fn msvc(&self) -> bool {
        self.opts.emulate == CompilerKind::Msvc
    }

    pub fn gcc(&self) -> bool {
        self.opts.emulate == CompilerKind::Gcc
    }

    pub fn clang(&self) -> bool {
        self.opts.emulate == CompilerKind::Clang
    }
}
