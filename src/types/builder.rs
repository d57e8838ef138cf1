//! The declaration-specifier state machine.
//!
//! C lets declaration specifiers appear in any order and in many
//! near-synonymous combinations (`signed long long int`, `long int signed
//! long`, `_Complex unsigned __int128`). The parser feeds each keyword to
//! `TypeBuilder::combine` as it sees it; the builder tracks the accumulated
//! state as the product of base × width × sign × complex, diagnoses
//! impossible transitions against what is already set, and materializes the
//! final type in `finish`.
//!
//! `combine_typedef` runs in a restartable "try" mode: when the builder is
//! put in `error_on_invalid` mode it emits nothing and returns a sentinel
//! error, so the parser can probe whether an identifier can serve as a type
//! specifier here and fall back to treating it as a declarator name.
//!
//! This module also hosts the checked constructors for derived types
//! (arrays, functions), which enforce the combined-type validity rules and
//! perform best-effort repair where the language allows it.

use std::rc::Rc;

use crate::common::error::{DiagnosticEngine, DiagnosticKind, TypeError};
use crate::common::interner::{StringId, StringInterner};
use crate::common::lang_opts::Env;
use crate::common::source::Span;
use crate::types::{
    ArrayType, BitIntInfo, CType, NodeRef, Param, QualHandling, QualifierBuilder, Qualifiers,
    Signedness, Specifier,
};

/// One atomic type-specifier keyword from the declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKeyword {
    Void,
    Bool,
    Char,
    Short,
    Int,
    Long,
    Signed,
    Unsigned,
    Int128,
    /// `_BitInt(N)`; the width expression is evaluated by the parser.
    /// Bounds are checked in `finish`.
    BitInt(i64),
    Float,
    Double,
    Fp16,
    Float80,
    Float128,
    Complex,
}

fn keyword_name(kw: TypeKeyword) -> &'static str {
    match kw {
        TypeKeyword::Void => "void",
        TypeKeyword::Bool => "_Bool",
        TypeKeyword::Char => "char",
        TypeKeyword::Short => "short",
        TypeKeyword::Int => "int",
        TypeKeyword::Long => "long",
        TypeKeyword::Signed => "signed",
        TypeKeyword::Unsigned => "unsigned",
        TypeKeyword::Int128 => "__int128",
        TypeKeyword::BitInt(_) => "_BitInt",
        TypeKeyword::Float => "float",
        TypeKeyword::Double => "double",
        TypeKeyword::Fp16 => "__fp16",
        TypeKeyword::Float80 => "__float80",
        TypeKeyword::Float128 => "__float128",
        TypeKeyword::Complex => "_Complex",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Width {
    Short,
    Long,
    LongLong,
}

fn width_name(w: Width) -> &'static str {
    match w {
        Width::Short => "short",
        Width::Long => "long",
        Width::LongLong => "long long",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sign {
    Signed,
    Unsigned,
}

fn sign_name(s: Sign) -> &'static str {
    match s {
        Sign::Signed => "signed",
        Sign::Unsigned => "unsigned",
    }
}

#[derive(Debug, Clone)]
enum Base {
    Void(Span),
    Bool(Span),
    Char(Span),
    Int(Span),
    Int128(Span),
    BitInt(i64, Span),
    Float(Span),
    Double(Span),
    Fp16(Span),
    Float80(Span),
    Float128(Span),
    /// Resolved typedef reference.
    Typedef(CType, Span),
    /// `typeof(...)` operand, already wrapped by the parser.
    Typeof(CType, Span),
    /// A parser-built specifier: struct/union/enum reference, `nullptr_t`.
    Other(CType, Span),
}

/// Accumulates declaration specifiers and yields a type at `finish`.
#[derive(Debug, Default)]
pub struct TypeBuilder {
    base: Option<Base>,
    width: Option<(Width, Span)>,
    sign: Option<(Sign, Span)>,
    complex: Option<Span>,
    typedef_name: Option<StringId>,
    pub qual: QualifierBuilder,
    /// Suppressed mode: return `TypeError::CannotCombine` instead of
    /// emitting diagnostics. Used by the typedef probe.
    pub error_on_invalid: bool,
}

impl TypeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn cannot_combine(
        &self,
        prev: &str,
        tok: Span,
        interner: &StringInterner,
        diags: &mut DiagnosticEngine,
    ) -> Result<(), TypeError> {
        if self.error_on_invalid {
            return Err(TypeError::CannotCombine);
        }
        diags.emit_str(DiagnosticKind::CannotCombineSpec, tok, prev);
        if let (Some(Base::Typedef(_, td_tok)), Some(name)) = (&self.base, self.typedef_name) {
            diags.emit_str(DiagnosticKind::SpecFromTypedef, *td_tok, interner.lookup(name));
        }
        Ok(())
    }

    /// Exact repetition of a specifier. Clang emulation tolerates it with a
    /// warning; everyone else treats it as cannot-combine.
    fn duplicate(
        &self,
        spec: &str,
        tok: Span,
        env: &Env,
        diags: &mut DiagnosticEngine,
    ) -> Result<(), TypeError> {
        if self.error_on_invalid {
            return Err(TypeError::CannotCombine);
        }
        if env.clang() {
            diags.emit_str(DiagnosticKind::DuplicateDeclSpec, tok, spec);
        } else {
            diags.emit_str(DiagnosticKind::CannotCombineSpec, tok, spec);
        }
        Ok(())
    }

    fn base_desc(&self, interner: &StringInterner) -> String {
        match &self.base {
            Some(Base::Void(_)) => "void".into(),
            Some(Base::Bool(_)) => "_Bool".into(),
            Some(Base::Char(_)) => "char".into(),
            Some(Base::Int(_)) => "int".into(),
            Some(Base::Int128(_)) => "__int128".into(),
            Some(Base::BitInt(..)) => "_BitInt".into(),
            Some(Base::Float(_)) => "float".into(),
            Some(Base::Double(_)) => "double".into(),
            Some(Base::Fp16(_)) => "__fp16".into(),
            Some(Base::Float80(_)) => "__float80".into(),
            Some(Base::Float128(_)) => "__float128".into(),
            Some(Base::Typedef(_, _)) => self
                .typedef_name
                .map(|n| interner.lookup(n).to_string())
                .unwrap_or_else(|| "typedef".into()),
            Some(Base::Typeof(_, _)) => "typeof".into(),
            Some(Base::Other(_, _)) => "type specifier".into(),
            None => String::new(),
        }
    }

    fn state_desc(&self, interner: &StringInterner) -> String {
        if self.base.is_some() {
            return self.base_desc(interner);
        }
        if let Some((w, _)) = self.width {
            return width_name(w).into();
        }
        if let Some((s, _)) = self.sign {
            return sign_name(s).into();
        }
        if self.complex.is_some() {
            return "_Complex".into();
        }
        String::new()
    }

    /// Feed one specifier keyword.
    pub fn combine(
        &mut self,
        kw: TypeKeyword,
        tok: Span,
        env: &Env,
        interner: &StringInterner,
        diags: &mut DiagnosticEngine,
    ) -> Result<(), TypeError> {
        match kw {
            TypeKeyword::Signed => self.combine_sign(Sign::Signed, tok, env, interner, diags),
            TypeKeyword::Unsigned => self.combine_sign(Sign::Unsigned, tok, env, interner, diags),
            TypeKeyword::Short => self.combine_short(tok, env, interner, diags),
            TypeKeyword::Long => self.combine_long(tok, env, interner, diags),
            TypeKeyword::Complex => self.combine_complex(tok, env, interner, diags),
            _ => self.combine_base(kw, tok, env, interner, diags),
        }
    }

    fn combine_sign(
        &mut self,
        sign: Sign,
        tok: Span,
        env: &Env,
        interner: &StringInterner,
        diags: &mut DiagnosticEngine,
    ) -> Result<(), TypeError> {
        if let Some((prev, _)) = self.sign {
            return if prev == sign {
                self.duplicate(sign_name(sign), tok, env, diags)
            } else {
                self.cannot_combine(sign_name(prev), tok, interner, diags)
            };
        }
        if let Some(base) = &self.base {
            match base {
                Base::Char(_) | Base::Int(_) | Base::Int128(_) | Base::BitInt(..) => {}
                _ => {
                    let desc = self.base_desc(interner);
                    return self.cannot_combine(&desc, tok, interner, diags);
                }
            }
        }
        self.sign = Some((sign, tok));
        Ok(())
    }

    fn combine_short(
        &mut self,
        tok: Span,
        env: &Env,
        interner: &StringInterner,
        diags: &mut DiagnosticEngine,
    ) -> Result<(), TypeError> {
        match self.width {
            Some((Width::Short, _)) => return self.duplicate("short", tok, env, diags),
            Some((w, _)) => return self.cannot_combine(width_name(w), tok, interner, diags),
            None => {}
        }
        if let Some(base) = &self.base {
            match base {
                Base::Int(_) => {}
                _ => {
                    let desc = self.base_desc(interner);
                    return self.cannot_combine(&desc, tok, interner, diags);
                }
            }
        }
        self.width = Some((Width::Short, tok));
        Ok(())
    }

    fn combine_long(
        &mut self,
        tok: Span,
        _env: &Env,
        interner: &StringInterner,
        diags: &mut DiagnosticEngine,
    ) -> Result<(), TypeError> {
        match self.width {
            Some((Width::Short, _)) => return self.cannot_combine("short", tok, interner, diags),
            Some((Width::LongLong, _)) => {
                return self.cannot_combine("long long", tok, interner, diags)
            }
            Some((Width::Long, _)) => {
                // `long long`; only integers go that wide
                if matches!(self.base, Some(Base::Double(_))) {
                    return self.cannot_combine("long double", tok, interner, diags);
                }
                self.width = Some((Width::LongLong, tok));
                return Ok(());
            }
            None => {}
        }
        if let Some(base) = &self.base {
            match base {
                Base::Int(_) | Base::Double(_) => {}
                _ => {
                    let desc = self.base_desc(interner);
                    return self.cannot_combine(&desc, tok, interner, diags);
                }
            }
        }
        self.width = Some((Width::Long, tok));
        Ok(())
    }

    fn combine_complex(
        &mut self,
        tok: Span,
        env: &Env,
        interner: &StringInterner,
        diags: &mut DiagnosticEngine,
    ) -> Result<(), TypeError> {
        if self.complex.is_some() {
            return self.duplicate("_Complex", tok, env, diags);
        }
        if let Some(base) = &self.base {
            match base {
                Base::Void(_)
                | Base::Bool(_)
                | Base::Typedef(_, _)
                | Base::Typeof(_, _)
                | Base::Other(_, _) => {
                    let desc = self.base_desc(interner);
                    return self.cannot_combine(&desc, tok, interner, diags);
                }
                _ => {}
            }
        }
        self.complex = Some(tok);
        Ok(())
    }

    fn combine_base(
        &mut self,
        kw: TypeKeyword,
        tok: Span,
        env: &Env,
        interner: &StringInterner,
        diags: &mut DiagnosticEngine,
    ) -> Result<(), TypeError> {
        if let Some(base) = &self.base {
            let same = matches!(
                (base, kw),
                (Base::Void(_), TypeKeyword::Void)
                    | (Base::Bool(_), TypeKeyword::Bool)
                    | (Base::Char(_), TypeKeyword::Char)
                    | (Base::Int(_), TypeKeyword::Int)
                    | (Base::Int128(_), TypeKeyword::Int128)
                    | (Base::BitInt(..), TypeKeyword::BitInt(_))
                    | (Base::Float(_), TypeKeyword::Float)
                    | (Base::Double(_), TypeKeyword::Double)
                    | (Base::Fp16(_), TypeKeyword::Fp16)
                    | (Base::Float80(_), TypeKeyword::Float80)
                    | (Base::Float128(_), TypeKeyword::Float128)
            );
            return if same {
                self.duplicate(keyword_name(kw), tok, env, diags)
            } else {
                let desc = self.base_desc(interner);
                self.cannot_combine(&desc, tok, interner, diags)
            };
        }

        let width = self.width.map(|(w, _)| w);
        let sign = self.sign.map(|(s, _)| s);
        let conflict: Option<&'static str> = match kw {
            TypeKeyword::Void | TypeKeyword::Bool => width
                .map(width_name)
                .or(sign.map(sign_name))
                .or(self.complex.map(|_| "_Complex")),
            TypeKeyword::Char => width.map(width_name),
            TypeKeyword::Int => None,
            TypeKeyword::Int128 | TypeKeyword::BitInt(_) => width.map(width_name),
            TypeKeyword::Float => width.map(width_name).or(sign.map(sign_name)),
            TypeKeyword::Double => match width {
                Some(Width::Short) => Some("short"),
                Some(Width::LongLong) => Some("long long"),
                _ => None,
            }
            .or(sign.map(sign_name)),
            TypeKeyword::Fp16 | TypeKeyword::Float80 | TypeKeyword::Float128 => {
                width.map(width_name).or(sign.map(sign_name))
            }
            // handled by the dedicated combiners
            TypeKeyword::Short
            | TypeKeyword::Long
            | TypeKeyword::Signed
            | TypeKeyword::Unsigned
            | TypeKeyword::Complex => None,
        };
        if let Some(prev) = conflict {
            return self.cannot_combine(prev, tok, interner, diags);
        }

        if kw == TypeKeyword::Int128 && !env.target.int128_supported() && !self.error_on_invalid
        {
            // diagnosed but accepted; layout still knows its size
            diags.emit_str(DiagnosticKind::TypeNotSupportedOnTarget, tok, "__int128");
        }

        self.base = Some(match kw {
            TypeKeyword::Void => Base::Void(tok),
            TypeKeyword::Bool => Base::Bool(tok),
            TypeKeyword::Char => Base::Char(tok),
            TypeKeyword::Int => Base::Int(tok),
            TypeKeyword::Int128 => Base::Int128(tok),
            TypeKeyword::BitInt(bits) => Base::BitInt(bits, tok),
            TypeKeyword::Float => Base::Float(tok),
            TypeKeyword::Double => Base::Double(tok),
            TypeKeyword::Fp16 => Base::Fp16(tok),
            TypeKeyword::Float80 => Base::Float80(tok),
            TypeKeyword::Float128 => Base::Float128(tok),
            _ => unreachable!("dispatched in combine"),
        });
        Ok(())
    }

    /// Install a `typeof(...)` operand, already wrapped by the parser in a
    /// `TypeofType`/`TypeofExpr` specifier. `typeof(nullptr)` collapses to
    /// plain `nullptr_t`.
    pub fn combine_from_typeof(
        &mut self,
        ty: CType,
        tok: Span,
        diags: &mut DiagnosticEngine,
    ) -> Result<(), TypeError> {
        if self.base.is_some()
            || self.width.is_some()
            || self.sign.is_some()
            || self.complex.is_some()
        {
            if self.error_on_invalid {
                return Err(TypeError::CannotCombine);
            }
            diags.emit(DiagnosticKind::InvalidTypeof, tok);
            return Ok(());
        }
        let mut wrapped = if ty.is_nullptr() {
            CType::new(Specifier::NullptrT)
        } else {
            ty
        };
        wrapped.qualifiers = wrapped.qualifiers.inherit_from_typeof();
        self.base = Some(Base::Typeof(wrapped, tok));
        Ok(())
    }

    /// Try to use a typedef as the type specifier. Never diagnoses: returns
    /// false when the typedef cannot combine with what is already set, so
    /// the parser can fall back to treating the identifier as a declarator
    /// name.
    pub fn combine_typedef(&mut self, ty: CType, name: StringId, name_tok: Span) -> bool {
        if self.base.is_some()
            || self.width.is_some()
            || self.sign.is_some()
            || self.complex.is_some()
        {
            return false;
        }
        self.typedef_name = Some(name);
        self.base = Some(Base::Typedef(ty, name_tok));
        true
    }

    /// Install a parser-built specifier: struct/union/enum reference or
    /// `nullptr_t`.
    pub fn combine_type(
        &mut self,
        ty: CType,
        tok: Span,
        interner: &StringInterner,
        diags: &mut DiagnosticEngine,
    ) -> Result<(), TypeError> {
        if self.base.is_some()
            || self.width.is_some()
            || self.sign.is_some()
            || self.complex.is_some()
        {
            let desc = self.state_desc(interner);
            return self.cannot_combine(&desc, tok, interner, diags);
        }
        self.base = Some(Base::Other(ty, tok));
        Ok(())
    }

    fn int_specifier(&self) -> Specifier {
        let unsigned = matches!(self.sign, Some((Sign::Unsigned, _)));
        match self.width.map(|(w, _)| w) {
            Some(Width::Short) => {
                if unsigned {
                    Specifier::UShort
                } else {
                    Specifier::Short
                }
            }
            Some(Width::Long) => {
                if unsigned {
                    Specifier::ULong
                } else {
                    Specifier::Long
                }
            }
            Some(Width::LongLong) => {
                if unsigned {
                    Specifier::ULongLong
                } else {
                    Specifier::LongLong
                }
            }
            None => {
                if unsigned {
                    Specifier::UInt
                } else {
                    Specifier::Int
                }
            }
        }
    }

    fn finish_bit_int(
        &self,
        bits: i64,
        tok: Span,
        diags: &mut DiagnosticEngine,
    ) -> Result<Specifier, TypeError> {
        let unsigned = matches!(self.sign, Some((Sign::Unsigned, _)));
        if unsigned {
            if bits < 1 {
                diags.emit(DiagnosticKind::UnsignedBitIntTooSmall, tok);
                return Err(TypeError::ParsingFailed);
            }
        } else if bits < 2 {
            diags.emit(DiagnosticKind::SignedBitIntTooSmall, tok);
            return Err(TypeError::ParsingFailed);
        }
        if bits > 128 {
            diags.emit(DiagnosticKind::BitIntTooBig, tok);
            return Err(TypeError::ParsingFailed);
        }
        Ok(Specifier::BitInt(BitIntInfo {
            bits: bits as u8,
            signedness: if unsigned {
                Signedness::Unsigned
            } else {
                Signedness::Signed
            },
        }))
    }

    /// Materialize the accumulated specifiers into a type and apply the
    /// qualifier builder.
    pub fn finish(
        &self,
        env: &Env,
        interner: &StringInterner,
        diags: &mut DiagnosticEngine,
    ) -> Result<CType, TypeError> {
        let mut ty = match &self.base {
            Some(Base::Typedef(td, _)) => rebuild_array_spine(td),
            Some(Base::Typeof(t, _)) | Some(Base::Other(t, _)) => t.clone(),
            Some(Base::Void(_)) => CType::VOID,
            Some(Base::Bool(_)) => CType::new(Specifier::Bool),
            Some(Base::Char(_)) => CType::new(match self.sign.map(|(s, _)| s) {
                Some(Sign::Signed) => Specifier::SChar,
                Some(Sign::Unsigned) => Specifier::UChar,
                None => Specifier::Char,
            }),
            Some(Base::Int128(_)) => CType::new(
                if matches!(self.sign, Some((Sign::Unsigned, _))) {
                    Specifier::UInt128
                } else {
                    Specifier::Int128
                },
            ),
            Some(Base::BitInt(bits, tok)) => {
                CType::new(self.finish_bit_int(*bits, *tok, diags)?)
            }
            Some(Base::Float(_)) => CType::new(Specifier::Float),
            Some(Base::Double(_)) => CType::new(
                if matches!(self.width, Some((Width::Long, _))) {
                    Specifier::LongDouble
                } else {
                    Specifier::Double
                },
            ),
            Some(Base::Fp16(_)) => CType::new(Specifier::Fp16),
            Some(Base::Float80(_)) => CType::new(Specifier::Float80),
            Some(Base::Float128(_)) => CType::new(Specifier::Float128),
            Some(Base::Int(_)) => CType::new(self.int_specifier()),
            None => {
                if self.width.is_none() && self.sign.is_none() {
                    match self.complex {
                        Some(tok) => {
                            diags.emit(DiagnosticKind::PlainComplex, tok);
                            CType::new(Specifier::Double)
                        }
                        None => {
                            diags.emit(DiagnosticKind::MissingTypeSpecifier, Span::dummy());
                            CType::INT
                        }
                    }
                } else {
                    CType::new(self.int_specifier())
                }
            }
        };

        if let Some(complex_tok) = self.complex {
            if ty.specifier.is_integer() {
                diags.emit(DiagnosticKind::ComplexInt, complex_tok);
            }
            ty = ty.make_complex();
        }

        self.qual.finish(&mut ty, interner, diags);
        if ty.is_array() {
            ty = push_quals_to_element(&ty);
        }
        Ok(ty)
    }
}

/// Clone an array spine with fresh payloads so later qualifier application
/// does not alias the typedef's own payload. `typeof`/attributed wrappers
/// pass through unchanged.
fn rebuild_array_spine(ty: &CType) -> CType {
    let mut out = ty.clone();
    out.specifier = match &ty.specifier {
        Specifier::Array(a) => Specifier::Array(Rc::new(ArrayType {
            len: a.len,
            elem: rebuild_array_spine(&a.elem),
        })),
        Specifier::StaticArray(a) => Specifier::StaticArray(Rc::new(ArrayType {
            len: a.len,
            elem: rebuild_array_spine(&a.elem),
        })),
        Specifier::IncompleteArray(s) => {
            Specifier::IncompleteArray(Rc::new(rebuild_array_spine(s)))
        }
        other => other.clone(),
    };
    out
}

/// C semantics: a qualified array is an array of qualified elements.
fn push_quals_to_element(ty: &CType) -> CType {
    fn apply(ty: &CType, quals: Qualifiers) -> CType {
        let mut out = ty.clone();
        match &ty.specifier {
            Specifier::Array(a) => {
                out.specifier = Specifier::Array(Rc::new(ArrayType {
                    len: a.len,
                    elem: apply(&a.elem, quals),
                }));
            }
            Specifier::StaticArray(a) => {
                out.specifier = Specifier::StaticArray(Rc::new(ArrayType {
                    len: a.len,
                    elem: apply(&a.elem, quals),
                }));
            }
            Specifier::IncompleteArray(s) => {
                out.specifier = Specifier::IncompleteArray(Rc::new(apply(s, quals)));
            }
            _ => {
                out.qualifiers = out.qualifiers.merge_all(quals);
            }
        }
        out
    }
    if !ty.qualifiers.any() {
        return ty.clone();
    }
    apply(ty, ty.qualifiers)
}

/// Function type flavors a declarator can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuncKind {
    Prototype,
    Variadic,
    OldStyle,
}

fn check_array_elem(
    elem: &CType,
    tok: Span,
    interner: &StringInterner,
    diags: &mut DiagnosticEngine,
) -> Result<(), TypeError> {
    if elem.is_func() {
        diags.emit(DiagnosticKind::ArrayFuncElem, tok);
        return Ok(());
    }
    if !elem.is_complete() {
        diags.emit_str(DiagnosticKind::ArrayIncompleteElem, tok, &elem.dump(interner));
        return Err(TypeError::ParsingFailed);
    }
    if matches!(
        elem.canonicalize(QualHandling::Standard).specifier,
        Specifier::StaticArray(_)
    ) {
        diags.emit(DiagnosticKind::StaticNonOutermostArray, tok);
    }
    if elem.is_array() && elem.qualifiers.any() {
        diags.emit(DiagnosticKind::QualifierNonOutermostArray, tok);
    }
    Ok(())
}

/// Construct a fixed-length array, enforcing element validity. Arrays of
/// incomplete element type abort the declaration.
pub fn build_array(
    elem: CType,
    len: u64,
    tok: Span,
    interner: &StringInterner,
    diags: &mut DiagnosticEngine,
) -> Result<CType, TypeError> {
    check_array_elem(&elem, tok, interner, diags)?;
    Ok(CType::array(elem, len))
}

/// `[static N]` parameter array.
pub fn build_static_array(
    elem: CType,
    len: u64,
    tok: Span,
    interner: &StringInterner,
    diags: &mut DiagnosticEngine,
) -> Result<CType, TypeError> {
    check_array_elem(&elem, tok, interner, diags)?;
    Ok(CType::static_array(elem, len))
}

pub fn build_incomplete_array(
    elem: CType,
    tok: Span,
    interner: &StringInterner,
    diags: &mut DiagnosticEngine,
) -> Result<CType, TypeError> {
    check_array_elem(&elem, tok, interner, diags)?;
    Ok(CType::incomplete_array(elem))
}

pub fn build_variable_len_array(
    elem: CType,
    node: NodeRef,
    tok: Span,
    interner: &StringInterner,
    diags: &mut DiagnosticEngine,
) -> Result<CType, TypeError> {
    check_array_elem(&elem, tok, interner, diags)?;
    Ok(CType::variable_len_array(elem, node))
}

/// `[*]` in a prototype.
pub fn build_unspecified_variable_len_array(
    elem: CType,
    tok: Span,
    interner: &StringInterner,
    diags: &mut DiagnosticEngine,
) -> Result<CType, TypeError> {
    check_array_elem(&elem, tok, interner, diags)?;
    Ok(CType::unspecified_variable_len_array(elem))
}

fn first_qual_name(quals: Qualifiers) -> &'static str {
    if quals.contains(Qualifiers::CONST) {
        "const"
    } else if quals.contains(Qualifiers::VOLATILE) {
        "volatile"
    } else {
        "restrict"
    }
}

/// Construct a function type. Diagnoses returns of arrays and functions,
/// and strips (with a warning) const/volatile/restrict from the return
/// type; `_Atomic` returns are legal and kept.
pub fn build_func(
    kind: FuncKind,
    mut return_type: CType,
    params: Vec<Param>,
    tok: Span,
    interner: &StringInterner,
    diags: &mut DiagnosticEngine,
) -> CType {
    if return_type.is_array() {
        diags.emit_str(
            DiagnosticKind::FuncCannotReturnArray,
            tok,
            &return_type.dump(interner),
        );
    } else if return_type.is_func() {
        diags.emit_str(
            DiagnosticKind::FuncCannotReturnFunc,
            tok,
            &return_type.dump(interner),
        );
    }
    let cvr = Qualifiers::CONST | Qualifiers::VOLATILE | Qualifiers::RESTRICT;
    if return_type.qualifiers.intersects(cvr) {
        diags.emit_str(
            DiagnosticKind::QualOnRetType,
            tok,
            first_qual_name(return_type.qualifiers),
        );
        return_type.qualifiers &= !cvr;
    }
    match kind {
        FuncKind::Prototype => CType::func(return_type, params),
        FuncKind::Variadic => CType::var_args_func(return_type, params),
        FuncKind::OldStyle => CType::old_style_func(return_type, params),
    }
}
