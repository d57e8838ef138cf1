//! The C type value and its algebra.
//!
//! A type is a small `(specifier, qualifiers)` pair. The specifier is one
//! closed enum over every distinct type shape the engine can represent;
//! derived shapes (pointers, arrays, functions, records, wrappers) carry
//! their payload behind an `Rc` so the pair stays cheap to clone.
//!
//! `typeof(...)` and attributed wrappers are first-class specifiers; every
//! query unwraps them transparently via `canonicalize`. Array-to-pointer
//! decay is represented as a paired "decayed" specifier per array kind, so
//! decaying never loses the original type.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use crate::common::interner::StringId;
use crate::common::lang_opts::Env;
use crate::common::source::Span;

pub mod builder;
pub mod layout;
pub mod printer;
pub mod qualifiers;
pub mod record_layout;

pub use qualifiers::{QualifierBuilder, Qualifiers};

/// Opaque handle to an AST expression node owned by the parser. The engine
/// stores it for VLA sizes and `typeof` expressions but never looks inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeRef(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signedness {
    Signed,
    Unsigned,
}

/// Width and signedness of a `_BitInt(N)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitIntInfo {
    pub bits: u8,
    pub signedness: Signedness,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub ty: CType,
    pub name: Option<StringId>,
    pub name_tok: Span,
}

#[derive(Debug, Clone)]
pub struct FuncType {
    pub return_type: CType,
    pub params: Vec<Param>,
}

#[derive(Debug, Clone)]
pub struct ArrayType {
    pub len: u64,
    pub elem: CType,
}

/// Payload for types that hang off an expression: VLAs and `typeof(expr)`.
#[derive(Debug, Clone)]
pub struct ExprType {
    pub node: NodeRef,
    pub ty: CType,
}

/// Bit-level placement of a record field, written once during layout
/// finalization. An unnamed bitfield stores the MAX sentinel in both slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FieldLayout {
    pub offset_bits: u64,
    pub size_bits: u64,
}

impl FieldLayout {
    pub const UNNAMED_BITFIELD: FieldLayout = FieldLayout {
        offset_bits: u64::MAX,
        size_bits: u64::MAX,
    };

    pub fn is_unnamed_bitfield(self) -> bool {
        self == Self::UNNAMED_BITFIELD
    }
}

#[derive(Debug, Clone)]
pub struct Field {
    pub ty: CType,
    pub name: Option<StringId>,
    pub name_tok: Span,
    pub bit_width: Option<u32>,
    pub layout: FieldLayout,
}

/// Record layout numbers, all in bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeLayout {
    pub size_bits: u64,
    pub field_alignment_bits: u32,
    pub pointer_alignment_bits: u32,
    /// MSVC `aligned` carry-over; 8 everywhere else.
    pub required_alignment_bits: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Struct,
    Union,
}

#[derive(Debug)]
pub struct RecordDef {
    pub fields: Vec<Field>,
    pub layout: TypeLayout,
    pub attributes: Vec<Attribute>,
    /// Per-field attribute lists, parallel to `fields`, populated only when
    /// some field carries attributes.
    pub field_attributes: Option<Vec<Vec<Attribute>>>,
}

/// A struct or union. Created incomplete when the tag is first referenced
/// and completed in place exactly once when the definition is parsed. The
/// parser holds the sole reference until completion, so every other
/// observer only ever sees the payload after `define`.
#[derive(Debug)]
pub struct Record {
    pub kind: RecordKind,
    pub name: StringId,
    def: RefCell<Option<RecordDef>>,
}

impl Record {
    pub fn new(kind: RecordKind, name: StringId) -> Rc<Record> {
        Rc::new(Record {
            kind,
            name,
            def: RefCell::new(None),
        })
    }

    /// One-shot completion.
    pub fn define(&self, def: RecordDef) {
        let mut slot = self.def.borrow_mut();
        debug_assert!(slot.is_none(), "record completed twice");
        *slot = Some(def);
    }

    pub fn is_complete(&self) -> bool {
        self.def.borrow().is_some()
    }

    pub fn layout(&self) -> Option<TypeLayout> {
        self.def.borrow().as_ref().map(|d| d.layout)
    }

    pub fn fields(&self) -> Option<Ref<'_, [Field]>> {
        Ref::filter_map(self.def.borrow(), |d| {
            d.as_ref().map(|d| d.fields.as_slice())
        })
        .ok()
    }

    pub fn attributes(&self) -> Vec<Attribute> {
        self.def
            .borrow()
            .as_ref()
            .map(|d| d.attributes.clone())
            .unwrap_or_default()
    }

    /// Bit offset and type of a named field, recursing into anonymous
    /// struct/union members.
    pub fn field_offset_bits(&self, name: StringId) -> Option<(u64, CType)> {
        let def = self.def.borrow();
        let def = def.as_ref()?;
        for field in &def.fields {
            if field.layout.is_unnamed_bitfield() {
                continue;
            }
            if field.name == Some(name) {
                return Some((field.layout.offset_bits, field.ty.clone()));
            }
            if field.name.is_none() {
                if let Some(record) = field.ty.get_record() {
                    if let Some((inner, ty)) = record.field_offset_bits(name) {
                        return Some((field.layout.offset_bits + inner, ty));
                    }
                }
            }
        }
        None
    }
}

#[derive(Debug, Clone)]
pub struct Enumerator {
    pub name: StringId,
    pub name_tok: Span,
    pub value: i64,
}

/// An enum tag. `fixed` enums (`enum e : short`) know their tag type from
/// creation; others receive it at `define` time.
#[derive(Debug)]
pub struct EnumType {
    pub name: StringId,
    pub fixed: bool,
    tag: RefCell<Option<CType>>,
    enumerators: RefCell<Option<Vec<Enumerator>>>,
}

impl EnumType {
    pub fn new_incomplete(name: StringId) -> Rc<EnumType> {
        Rc::new(EnumType {
            name,
            fixed: false,
            tag: RefCell::new(None),
            enumerators: RefCell::new(None),
        })
    }

    pub fn new_fixed(name: StringId, tag: CType) -> Rc<EnumType> {
        Rc::new(EnumType {
            name,
            fixed: true,
            tag: RefCell::new(Some(tag)),
            enumerators: RefCell::new(None),
        })
    }

    /// One-shot completion. Fixed enums keep their declared tag type.
    pub fn define(&self, tag: CType, enumerators: Vec<Enumerator>) {
        let mut slot = self.enumerators.borrow_mut();
        debug_assert!(slot.is_none(), "enum completed twice");
        *slot = Some(enumerators);
        let mut tag_slot = self.tag.borrow_mut();
        if tag_slot.is_none() {
            *tag_slot = Some(tag);
        }
    }

    pub fn is_complete(&self) -> bool {
        self.enumerators.borrow().is_some()
    }

    pub fn tag_type(&self) -> Option<CType> {
        self.tag.borrow().clone()
    }

    pub fn enumerators(&self) -> Option<Ref<'_, [Enumerator]>> {
        Ref::filter_map(self.enumerators.borrow(), |e| {
            e.as_ref().map(|e| e.as_slice())
        })
        .ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrTag {
    Aligned,
    Packed,
}

/// The attributes the engine itself interprets; attribute syntax is parsed
/// upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    /// `aligned(N)`, or bare `aligned` when `alignment` is None.
    Aligned { alignment: Option<u64> },
    Packed,
}

impl Attribute {
    pub fn tag(&self) -> AttrTag {
        match self {
            Attribute::Aligned { .. } => AttrTag::Aligned,
            Attribute::Packed => AttrTag::Packed,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AttributedType {
    pub attributes: Vec<Attribute>,
    pub base: CType,
}

/// Every distinct type shape the engine can represent.
#[derive(Debug, Clone)]
pub enum Specifier {
    /// Poison type produced after an unrecoverable declaration error.
    Invalid,
    Void,
    Bool,
    /// C23 `nullptr_t`.
    NullptrT,
    /// Hidden first argument of `__builtin_va_start`.
    SpecialVaStart,

    // integers
    Char,
    SChar,
    UChar,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    LongLong,
    ULongLong,
    Int128,
    UInt128,

    // complex integers (GNU extension)
    ComplexChar,
    ComplexSChar,
    ComplexUChar,
    ComplexShort,
    ComplexUShort,
    ComplexInt,
    ComplexUInt,
    ComplexLong,
    ComplexULong,
    ComplexLongLong,
    ComplexULongLong,
    ComplexInt128,
    ComplexUInt128,

    // bit-precise integers
    BitInt(BitIntInfo),
    ComplexBitInt(BitIntInfo),

    // floating
    Fp16,
    Float,
    Double,
    LongDouble,
    Float80,
    Float128,
    ComplexFp16,
    ComplexFloat,
    ComplexDouble,
    ComplexLongDouble,
    ComplexFloat80,
    ComplexFloat128,

    Pointer(Rc<CType>),

    // array kinds, each paired with its decayed counterpart
    Array(Rc<ArrayType>),
    DecayedArray(Rc<ArrayType>),
    StaticArray(Rc<ArrayType>),
    DecayedStaticArray(Rc<ArrayType>),
    IncompleteArray(Rc<CType>),
    DecayedIncompleteArray(Rc<CType>),
    VariableLenArray(Rc<ExprType>),
    DecayedVariableLenArray(Rc<ExprType>),
    UnspecifiedVariableLenArray(Rc<CType>),
    DecayedUnspecifiedVariableLenArray(Rc<CType>),
    Vector(Rc<ArrayType>),
    DecayedVector(Rc<ArrayType>),

    // functions
    Func(Rc<FuncType>),
    VarArgsFunc(Rc<FuncType>),
    OldStyleFunc(Rc<FuncType>),

    // aggregates
    Struct(Rc<Record>),
    Union(Rc<Record>),
    Enum(Rc<EnumType>),

    // reference wrappers
    TypeofType(Rc<CType>),
    DecayedTypeofType(Rc<CType>),
    TypeofExpr(Rc<ExprType>),
    DecayedTypeofExpr(Rc<ExprType>),
    Attributed(Rc<AttributedType>),
}

impl Specifier {
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            Specifier::Bool
                | Specifier::Char
                | Specifier::SChar
                | Specifier::UChar
                | Specifier::Short
                | Specifier::UShort
                | Specifier::Int
                | Specifier::UInt
                | Specifier::Long
                | Specifier::ULong
                | Specifier::LongLong
                | Specifier::ULongLong
                | Specifier::Int128
                | Specifier::UInt128
                | Specifier::ComplexChar
                | Specifier::ComplexSChar
                | Specifier::ComplexUChar
                | Specifier::ComplexShort
                | Specifier::ComplexUShort
                | Specifier::ComplexInt
                | Specifier::ComplexUInt
                | Specifier::ComplexLong
                | Specifier::ComplexULong
                | Specifier::ComplexLongLong
                | Specifier::ComplexULongLong
                | Specifier::ComplexInt128
                | Specifier::ComplexUInt128
                | Specifier::BitInt(_)
                | Specifier::ComplexBitInt(_)
                | Specifier::Enum(_)
        )
    }

    pub fn is_float(&self) -> bool {
        matches!(
            self,
            Specifier::Fp16
                | Specifier::Float
                | Specifier::Double
                | Specifier::LongDouble
                | Specifier::Float80
                | Specifier::Float128
                | Specifier::ComplexFp16
                | Specifier::ComplexFloat
                | Specifier::ComplexDouble
                | Specifier::ComplexLongDouble
                | Specifier::ComplexFloat80
                | Specifier::ComplexFloat128
        )
    }

    pub fn is_complex(&self) -> bool {
        matches!(
            self,
            Specifier::ComplexChar
                | Specifier::ComplexSChar
                | Specifier::ComplexUChar
                | Specifier::ComplexShort
                | Specifier::ComplexUShort
                | Specifier::ComplexInt
                | Specifier::ComplexUInt
                | Specifier::ComplexLong
                | Specifier::ComplexULong
                | Specifier::ComplexLongLong
                | Specifier::ComplexULongLong
                | Specifier::ComplexInt128
                | Specifier::ComplexUInt128
                | Specifier::ComplexBitInt(_)
                | Specifier::ComplexFp16
                | Specifier::ComplexFloat
                | Specifier::ComplexDouble
                | Specifier::ComplexLongDouble
                | Specifier::ComplexFloat80
                | Specifier::ComplexFloat128
        )
    }

    pub fn is_array_kind(&self) -> bool {
        matches!(
            self,
            Specifier::Array(_)
                | Specifier::StaticArray(_)
                | Specifier::IncompleteArray(_)
                | Specifier::VariableLenArray(_)
                | Specifier::UnspecifiedVariableLenArray(_)
                | Specifier::Vector(_)
        )
    }

    pub fn is_decayed_kind(&self) -> bool {
        matches!(
            self,
            Specifier::DecayedArray(_)
                | Specifier::DecayedStaticArray(_)
                | Specifier::DecayedIncompleteArray(_)
                | Specifier::DecayedVariableLenArray(_)
                | Specifier::DecayedUnspecifiedVariableLenArray(_)
                | Specifier::DecayedVector(_)
        )
    }

    pub fn is_func_kind(&self) -> bool {
        matches!(
            self,
            Specifier::Func(_) | Specifier::VarArgsFunc(_) | Specifier::OldStyleFunc(_)
        )
    }

    /// The decayed counterpart of an array specifier.
    pub fn decayed(&self) -> Option<Specifier> {
        Some(match self {
            Specifier::Array(a) => Specifier::DecayedArray(a.clone()),
            Specifier::StaticArray(a) => Specifier::DecayedStaticArray(a.clone()),
            Specifier::IncompleteArray(s) => Specifier::DecayedIncompleteArray(s.clone()),
            Specifier::VariableLenArray(e) => Specifier::DecayedVariableLenArray(e.clone()),
            Specifier::UnspecifiedVariableLenArray(s) => {
                Specifier::DecayedUnspecifiedVariableLenArray(s.clone())
            }
            Specifier::Vector(a) => Specifier::DecayedVector(a.clone()),
            _ => return None,
        })
    }

    /// Reverse of `decayed`.
    pub fn undecayed(&self) -> Option<Specifier> {
        Some(match self {
            Specifier::DecayedArray(a) => Specifier::Array(a.clone()),
            Specifier::DecayedStaticArray(a) => Specifier::StaticArray(a.clone()),
            Specifier::DecayedIncompleteArray(s) => Specifier::IncompleteArray(s.clone()),
            Specifier::DecayedVariableLenArray(e) => Specifier::VariableLenArray(e.clone()),
            Specifier::DecayedUnspecifiedVariableLenArray(s) => {
                Specifier::UnspecifiedVariableLenArray(s.clone())
            }
            Specifier::DecayedVector(a) => Specifier::Vector(a.clone()),
            _ => return None,
        })
    }
}

/// How `canonicalize` treats qualifiers accumulated from wrappers when the
/// underlying type turns out to be a pointer or array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualHandling {
    /// Discard them: they qualified the `typeof` expression, not the
    /// element.
    Standard,
    /// Keep them on the unwrapped type, so `elem_type` can fold them into
    /// the element.
    PreserveQuals,
}

/// A C type: a specifier tag plus qualifier bits.
#[derive(Debug, Clone)]
pub struct CType {
    pub specifier: Specifier,
    pub qualifiers: Qualifiers,
}

impl CType {
    pub const INVALID: CType = CType::new(Specifier::Invalid);
    pub const VOID: CType = CType::new(Specifier::Void);
    pub const INT: CType = CType::new(Specifier::Int);

    pub const fn new(specifier: Specifier) -> CType {
        CType {
            specifier,
            qualifiers: Qualifiers::empty(),
        }
    }

    pub fn set_qualifiers(&mut self, quals: Qualifiers) {
        self.qualifiers = quals;
    }

    pub fn pointer_to(elem: CType) -> CType {
        CType::new(Specifier::Pointer(Rc::new(elem)))
    }

    pub fn array(elem: CType, len: u64) -> CType {
        CType::new(Specifier::Array(Rc::new(ArrayType { len, elem })))
    }

    pub fn static_array(elem: CType, len: u64) -> CType {
        CType::new(Specifier::StaticArray(Rc::new(ArrayType { len, elem })))
    }

    pub fn incomplete_array(elem: CType) -> CType {
        CType::new(Specifier::IncompleteArray(Rc::new(elem)))
    }

    pub fn variable_len_array(elem: CType, node: NodeRef) -> CType {
        CType::new(Specifier::VariableLenArray(Rc::new(ExprType {
            node,
            ty: elem,
        })))
    }

    pub fn unspecified_variable_len_array(elem: CType) -> CType {
        CType::new(Specifier::UnspecifiedVariableLenArray(Rc::new(elem)))
    }

    pub fn vector(elem: CType, len: u64) -> CType {
        CType::new(Specifier::Vector(Rc::new(ArrayType { len, elem })))
    }

    pub fn func(return_type: CType, params: Vec<Param>) -> CType {
        CType::new(Specifier::Func(Rc::new(FuncType {
            return_type,
            params,
        })))
    }

    pub fn var_args_func(return_type: CType, params: Vec<Param>) -> CType {
        CType::new(Specifier::VarArgsFunc(Rc::new(FuncType {
            return_type,
            params,
        })))
    }

    pub fn old_style_func(return_type: CType, params: Vec<Param>) -> CType {
        CType::new(Specifier::OldStyleFunc(Rc::new(FuncType {
            return_type,
            params,
        })))
    }

    pub fn typeof_type(ty: CType) -> CType {
        CType::new(Specifier::TypeofType(Rc::new(ty)))
    }

    pub fn typeof_expr(node: NodeRef, ty: CType) -> CType {
        CType::new(Specifier::TypeofExpr(Rc::new(ExprType { node, ty })))
    }

    pub fn record(record: Rc<Record>) -> CType {
        match record.kind {
            RecordKind::Struct => CType::new(Specifier::Struct(record)),
            RecordKind::Union => CType::new(Specifier::Union(record)),
        }
    }

    pub fn enumeration(e: Rc<EnumType>) -> CType {
        CType::new(Specifier::Enum(e))
    }

    fn is_wrapped(&self) -> bool {
        matches!(
            self.specifier,
            Specifier::TypeofType(_)
                | Specifier::TypeofExpr(_)
                | Specifier::DecayedTypeofType(_)
                | Specifier::DecayedTypeofExpr(_)
                | Specifier::Attributed(_)
        )
    }

    /// Strip `typeof` and attributed wrappers, merging accumulated
    /// qualifiers according to `mode`. A decayed `typeof` decays the
    /// unwrapped type. Terminates because every wrapper strictly shrinks
    /// the wrapper chain.
    pub fn canonicalize(&self, mode: QualHandling) -> CType {
        if !self.is_wrapped() {
            return self.clone();
        }
        let mut quals = Qualifiers::empty();
        let mut decay_pending = false;
        let mut ty = self.clone();
        loop {
            let wrapper_quals = ty.qualifiers;
            let next = match &ty.specifier {
                Specifier::TypeofType(sub) => Some(((**sub).clone(), false)),
                Specifier::DecayedTypeofType(sub) => Some(((**sub).clone(), true)),
                Specifier::TypeofExpr(e) => Some((e.ty.clone(), false)),
                Specifier::DecayedTypeofExpr(e) => Some((e.ty.clone(), true)),
                Specifier::Attributed(a) => Some((a.base.clone(), false)),
                _ => None,
            };
            match next {
                Some((inner, decays)) => {
                    quals = quals.merge_all(wrapper_quals);
                    decay_pending |= decays;
                    ty = inner;
                }
                None => break,
            }
        }
        if decay_pending {
            if let Some(decayed) = ty.specifier.decayed() {
                ty.specifier = decayed;
            }
        }
        let discard = mode == QualHandling::Standard
            && (ty.specifier.is_array_kind()
                || ty.specifier.is_decayed_kind()
                || matches!(ty.specifier, Specifier::Pointer(_)));
        if !discard {
            ty.qualifiers = ty.qualifiers.merge_all(quals);
        }
        ty
    }

    fn canon(&self) -> CType {
        self.canonicalize(QualHandling::Standard)
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self.canon().specifier, Specifier::Invalid)
    }

    pub fn is_void(&self) -> bool {
        matches!(self.canon().specifier, Specifier::Void)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self.canon().specifier, Specifier::Bool)
    }

    pub fn is_nullptr(&self) -> bool {
        matches!(self.canon().specifier, Specifier::NullptrT)
    }

    pub fn is_int(&self) -> bool {
        self.canon().specifier.is_integer()
    }

    pub fn is_float(&self) -> bool {
        self.canon().specifier.is_float()
    }

    /// Pointers proper plus decayed arrays.
    pub fn is_ptr(&self) -> bool {
        let canon = self.canon();
        matches!(canon.specifier, Specifier::Pointer(_)) || canon.specifier.is_decayed_kind()
    }

    pub fn is_func(&self) -> bool {
        self.canon().specifier.is_func_kind()
    }

    pub fn is_array(&self) -> bool {
        self.canon().specifier.is_array_kind()
    }

    pub fn is_record(&self) -> bool {
        matches!(
            self.canon().specifier,
            Specifier::Struct(_) | Specifier::Union(_)
        )
    }

    pub fn is_enum(&self) -> bool {
        matches!(self.canon().specifier, Specifier::Enum(_))
    }

    pub fn is_scalar(&self) -> bool {
        self.is_int() || self.is_float() || self.is_ptr() || self.is_nullptr()
    }

    /// Whether this type went through array-to-pointer decay.
    pub fn is_decayed(&self) -> bool {
        self.canon().specifier.is_decayed_kind()
    }

    pub fn is_complex(&self) -> bool {
        self.canon().specifier.is_complex()
    }

    pub fn is_real(&self) -> bool {
        !self.is_complex()
    }

    /// Anonymous aggregates carry engine-assigned names starting with `(`.
    pub fn is_anonymous_record(&self, interner: &crate::common::interner::StringInterner) -> bool {
        match self.get_record() {
            Some(record) => interner.lookup(record.name).starts_with('('),
            None => false,
        }
    }

    pub fn is_complete(&self) -> bool {
        match &self.canon().specifier {
            Specifier::Void => false,
            Specifier::Struct(r) | Specifier::Union(r) => r.is_complete(),
            Specifier::Enum(e) => e.is_complete() || e.fixed,
            Specifier::IncompleteArray(_) => false,
            _ => true,
        }
    }

    /// The pointee or element type. For typeof-wrapped arrays and pointers
    /// the wrapper's qualifiers are folded into the element.
    pub fn elem_type(&self) -> CType {
        match &self.specifier {
            Specifier::Pointer(sub)
            | Specifier::UnspecifiedVariableLenArray(sub)
            | Specifier::DecayedUnspecifiedVariableLenArray(sub)
            | Specifier::IncompleteArray(sub)
            | Specifier::DecayedIncompleteArray(sub) => (**sub).clone(),
            Specifier::Array(a)
            | Specifier::DecayedArray(a)
            | Specifier::StaticArray(a)
            | Specifier::DecayedStaticArray(a)
            | Specifier::Vector(a)
            | Specifier::DecayedVector(a) => a.elem.clone(),
            Specifier::VariableLenArray(e) | Specifier::DecayedVariableLenArray(e) => {
                e.ty.clone()
            }
            Specifier::TypeofType(_)
            | Specifier::TypeofExpr(_)
            | Specifier::DecayedTypeofType(_)
            | Specifier::DecayedTypeofExpr(_) => {
                let canon = self.canonicalize(QualHandling::PreserveQuals);
                let mut elem = canon.elem_type();
                elem.qualifiers = elem.qualifiers.merge_all(canon.qualifiers);
                elem
            }
            Specifier::Attributed(a) => a.base.elem_type(),
            Specifier::Invalid => CType::INVALID,
            _ => {
                debug_assert!(false, "elem_type on non-element type");
                CType::INVALID
            }
        }
    }

    pub fn func_type(&self) -> Option<Rc<FuncType>> {
        match &self.canon().specifier {
            Specifier::Func(f) | Specifier::VarArgsFunc(f) | Specifier::OldStyleFunc(f) => {
                Some(f.clone())
            }
            _ => None,
        }
    }

    pub fn return_type(&self) -> Option<CType> {
        self.func_type().map(|f| f.return_type.clone())
    }

    pub fn params(&self) -> Option<Vec<Param>> {
        self.func_type().map(|f| f.params.clone())
    }

    pub fn array_len(&self) -> Option<u64> {
        match &self.canon().specifier {
            Specifier::Array(a)
            | Specifier::DecayedArray(a)
            | Specifier::StaticArray(a)
            | Specifier::DecayedStaticArray(a)
            | Specifier::Vector(a)
            | Specifier::DecayedVector(a) => Some(a.len),
            _ => None,
        }
    }

    pub fn get_record(&self) -> Option<Rc<Record>> {
        match &self.canon().specifier {
            Specifier::Struct(r) | Specifier::Union(r) => Some(r.clone()),
            _ => None,
        }
    }

    pub fn get_enum(&self) -> Option<Rc<EnumType>> {
        match &self.canon().specifier {
            Specifier::Enum(e) => Some(e.clone()),
            _ => None,
        }
    }

    /// Array-to-pointer decay: a pure tag change, the payload is shared.
    pub fn decay_array(&self) -> CType {
        let mut ty = self.clone();
        ty.specifier = match &self.specifier {
            Specifier::TypeofType(sub) => Specifier::DecayedTypeofType(sub.clone()),
            Specifier::TypeofExpr(e) => Specifier::DecayedTypeofExpr(e.clone()),
            Specifier::Attributed(a) => Specifier::Attributed(Rc::new(AttributedType {
                attributes: a.attributes.clone(),
                base: a.base.decay_array(),
            })),
            other => match other.decayed() {
                Some(d) => d,
                None => {
                    debug_assert!(false, "decay of non-array type");
                    other.clone()
                }
            },
        };
        ty
    }

    /// Reverse of `decay_array`.
    pub fn original_type_of_decayed_array(&self) -> CType {
        let mut ty = self.clone();
        ty.specifier = match &self.specifier {
            Specifier::DecayedTypeofType(sub) => Specifier::TypeofType(sub.clone()),
            Specifier::DecayedTypeofExpr(e) => Specifier::TypeofExpr(e.clone()),
            Specifier::Attributed(a) => Specifier::Attributed(Rc::new(AttributedType {
                attributes: a.attributes.clone(),
                base: a.base.original_type_of_decayed_array(),
            })),
            other => match other.undecayed() {
                Some(u) => u,
                None => {
                    debug_assert!(false, "undecay of non-decayed type");
                    other.clone()
                }
            },
        };
        ty
    }

    /// Map a complex type to its real companion. Canonicalizes first, so
    /// typeof/attributed wrappers are dropped.
    pub fn make_real(&self) -> CType {
        let mut ty = self.canon();
        ty.specifier = match ty.specifier {
            Specifier::ComplexChar => Specifier::Char,
            Specifier::ComplexSChar => Specifier::SChar,
            Specifier::ComplexUChar => Specifier::UChar,
            Specifier::ComplexShort => Specifier::Short,
            Specifier::ComplexUShort => Specifier::UShort,
            Specifier::ComplexInt => Specifier::Int,
            Specifier::ComplexUInt => Specifier::UInt,
            Specifier::ComplexLong => Specifier::Long,
            Specifier::ComplexULong => Specifier::ULong,
            Specifier::ComplexLongLong => Specifier::LongLong,
            Specifier::ComplexULongLong => Specifier::ULongLong,
            Specifier::ComplexInt128 => Specifier::Int128,
            Specifier::ComplexUInt128 => Specifier::UInt128,
            Specifier::ComplexBitInt(i) => Specifier::BitInt(i),
            Specifier::ComplexFp16 => Specifier::Fp16,
            Specifier::ComplexFloat => Specifier::Float,
            Specifier::ComplexDouble => Specifier::Double,
            Specifier::ComplexLongDouble => Specifier::LongDouble,
            Specifier::ComplexFloat80 => Specifier::Float80,
            Specifier::ComplexFloat128 => Specifier::Float128,
            other => other,
        };
        ty
    }

    /// Map a real integer or floating type to its complex companion.
    /// Canonicalizes first, so typeof/attributed wrappers are dropped.
    pub fn make_complex(&self) -> CType {
        let mut ty = self.canon();
        ty.specifier = match ty.specifier {
            Specifier::Char => Specifier::ComplexChar,
            Specifier::SChar => Specifier::ComplexSChar,
            Specifier::UChar => Specifier::ComplexUChar,
            Specifier::Short => Specifier::ComplexShort,
            Specifier::UShort => Specifier::ComplexUShort,
            Specifier::Int => Specifier::ComplexInt,
            Specifier::UInt => Specifier::ComplexUInt,
            Specifier::Long => Specifier::ComplexLong,
            Specifier::ULong => Specifier::ComplexULong,
            Specifier::LongLong => Specifier::ComplexLongLong,
            Specifier::ULongLong => Specifier::ComplexULongLong,
            Specifier::Int128 => Specifier::ComplexInt128,
            Specifier::UInt128 => Specifier::ComplexUInt128,
            Specifier::BitInt(i) => Specifier::ComplexBitInt(i),
            Specifier::Fp16 => Specifier::ComplexFp16,
            Specifier::Float => Specifier::ComplexFloat,
            Specifier::Double => Specifier::ComplexDouble,
            Specifier::LongDouble => Specifier::ComplexLongDouble,
            Specifier::Float80 => Specifier::ComplexFloat80,
            Specifier::Float128 => Specifier::ComplexFloat128,
            other => other,
        };
        ty
    }

    /// Wrap `self` in an attributed node carrying `attributes`. An existing
    /// outer attributed wrapper contributes its attributes in front.
    pub fn with_attributes(&self, attributes: Vec<Attribute>) -> CType {
        if attributes.is_empty() {
            return self.clone();
        }
        let (mut all, base) = match &self.specifier {
            Specifier::Attributed(a) => (a.attributes.clone(), a.base.clone()),
            _ => (Vec::new(), self.clone()),
        };
        all.extend(attributes);
        let mut ty = CType::new(Specifier::Attributed(Rc::new(AttributedType {
            attributes: all,
            base,
        })));
        ty.qualifiers = self.qualifiers;
        ty
    }

    /// Attributes of the nearest attributed wrapper, looking through
    /// `typeof`.
    pub fn get_attributes(&self) -> Vec<Attribute> {
        match &self.specifier {
            Specifier::Attributed(a) => a.attributes.clone(),
            Specifier::TypeofType(sub) | Specifier::DecayedTypeofType(sub) => {
                sub.get_attributes()
            }
            Specifier::TypeofExpr(e) | Specifier::DecayedTypeofExpr(e) => e.ty.get_attributes(),
            _ => Vec::new(),
        }
    }

    pub fn get_attribute(&self, tag: AttrTag) -> Option<Attribute> {
        self.get_attributes().into_iter().find(|a| a.tag() == tag)
    }

    pub fn has_attribute(&self, tag: AttrTag) -> bool {
        self.get_attribute(tag).is_some()
    }

    /// Structural equality on canonicalized operands.
    ///
    /// Alignment must agree; the categories must be compatible (pointer
    /// with pointer or decayed array, function with function, array with
    /// array, otherwise identical specifier); `_Atomic` must always match;
    /// const/volatile only when `check_qualifiers`. Records and enums
    /// compare by payload identity.
    pub fn eql(&self, other: &CType, env: &Env, check_qualifiers: bool) -> bool {
        let a = self.canon();
        let b = other.canon();

        if a.align_of(env) != b.align_of(env) {
            return false;
        }

        let compatible = (a.is_ptr() && b.is_ptr())
            || (a.is_func() && b.is_func())
            || (a.is_array() && b.is_array())
            || std::mem::discriminant(&a.specifier) == std::mem::discriminant(&b.specifier);
        if !compatible {
            return false;
        }

        if a.qualifiers.contains(Qualifiers::ATOMIC) != b.qualifiers.contains(Qualifiers::ATOMIC)
        {
            return false;
        }
        if check_qualifiers {
            let cv = Qualifiers::CONST | Qualifiers::VOLATILE;
            if (a.qualifiers & cv) != (b.qualifiers & cv) {
                return false;
            }
        }

        if a.is_ptr() {
            return a.elem_type().eql(&b.elem_type(), env, check_qualifiers);
        }
        if a.is_func() {
            // prototype/variadic/K&R kinds do not mix
            if std::mem::discriminant(&a.specifier) != std::mem::discriminant(&b.specifier) {
                return false;
            }
            let (fa, fb) = match (a.func_type(), b.func_type()) {
                (Some(fa), Some(fb)) => (fa, fb),
                _ => return false,
            };
            if fa.params.len() != fb.params.len() {
                return false;
            }
            // return type qualifiers are not part of the function type
            if !fa.return_type.eql(&fb.return_type, env, false) {
                return false;
            }
            let cv = Qualifiers::CONST | Qualifiers::VOLATILE;
            for (pa, pb) in fa.params.iter().zip(fb.params.iter()) {
                let mut ta = pa.ty.clone();
                let mut tb = pb.ty.clone();
                ta.qualifiers &= !cv;
                tb.qualifiers &= !cv;
                if !ta.eql(&tb, env, check_qualifiers) {
                    return false;
                }
            }
            return true;
        }
        if a.is_array() {
            if let (Some(x), Some(y)) = (a.array_len(), b.array_len()) {
                if x != y {
                    return false;
                }
            }
            return a.elem_type().eql(&b.elem_type(), env, check_qualifiers);
        }

        match (&a.specifier, &b.specifier) {
            (Specifier::Struct(ra), Specifier::Struct(rb))
            | (Specifier::Union(ra), Specifier::Union(rb)) => Rc::ptr_eq(ra, rb),
            (Specifier::Enum(ea), Specifier::Enum(eb)) => Rc::ptr_eq(ea, eb),
            (Specifier::BitInt(x), Specifier::BitInt(y))
            | (Specifier::ComplexBitInt(x), Specifier::ComplexBitInt(y)) => x == y,
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::interner::StringInterner;

    fn env() -> Env {
        Env::x86_64_linux_gnu()
    }

    #[test]
    fn test_decay_round_trip() {
        let arr = CType::array(CType::INT, 5);
        let decayed = arr.decay_array();
        assert!(matches!(decayed.specifier, Specifier::DecayedArray(_)));
        assert!(decayed.is_ptr());
        assert!(decayed.is_decayed());
        let back = decayed.original_type_of_decayed_array();
        assert!(matches!(back.specifier, Specifier::Array(_)));
        assert!(back.is_array());
        assert_eq!(back.array_len(), Some(5));
    }

    #[test]
    fn test_decay_all_array_kinds() {
        let kinds = vec![
            CType::array(CType::INT, 3),
            CType::static_array(CType::INT, 3),
            CType::incomplete_array(CType::INT),
            CType::variable_len_array(CType::INT, NodeRef(0)),
            CType::unspecified_variable_len_array(CType::INT),
            CType::vector(CType::INT, 4),
        ];
        for ty in kinds {
            let decayed = ty.decay_array();
            assert!(decayed.is_decayed());
            let back = decayed.original_type_of_decayed_array();
            assert!(back.is_array());
            assert!(
                std::mem::discriminant(&back.specifier)
                    == std::mem::discriminant(&ty.specifier)
            );
        }
    }

    #[test]
    fn test_real_complex_round_trip() {
        let types = vec![
            CType::new(Specifier::Char),
            CType::new(Specifier::UShort),
            CType::new(Specifier::Int),
            CType::new(Specifier::ULongLong),
            CType::new(Specifier::Int128),
            CType::new(Specifier::Float),
            CType::new(Specifier::Double),
            CType::new(Specifier::LongDouble),
            CType::new(Specifier::Float128),
            CType::new(Specifier::BitInt(BitIntInfo {
                bits: 17,
                signedness: Signedness::Signed,
            })),
        ];
        for ty in types {
            let complex = ty.make_complex();
            assert!(complex.is_complex());
            let real = complex.make_real();
            assert!(real.is_real());
            assert!(
                std::mem::discriminant(&real.specifier)
                    == std::mem::discriminant(&ty.specifier)
            );
        }
    }

    #[test]
    fn test_canonicalize_through_typeof_chain() {
        let mut inner = CType::INT;
        inner.qualifiers = Qualifiers::VOLATILE;
        let mut wrapped = CType::typeof_type(CType::typeof_type(inner));
        wrapped.qualifiers = Qualifiers::CONST;
        let canon = wrapped.canonicalize(QualHandling::Standard);
        assert!(matches!(canon.specifier, Specifier::Int));
        assert!(canon.qualifiers.contains(Qualifiers::CONST));
        assert!(canon.qualifiers.contains(Qualifiers::VOLATILE));
    }

    #[test]
    fn test_canonicalize_standard_discards_quals_on_array() {
        let arr = CType::array(CType::INT, 4);
        let mut wrapped = CType::typeof_type(arr);
        wrapped.qualifiers = Qualifiers::CONST;
        let canon = wrapped.canonicalize(QualHandling::Standard);
        assert!(canon.is_array());
        assert!(!canon.qualifiers.contains(Qualifiers::CONST));
        let preserved = wrapped.canonicalize(QualHandling::PreserveQuals);
        assert!(preserved.qualifiers.contains(Qualifiers::CONST));
    }

    #[test]
    fn test_elem_type_propagates_typeof_quals() {
        // typeof(const int[4]): const lives on the element
        let mut const_int = CType::INT;
        const_int.qualifiers = Qualifiers::CONST;
        let arr = CType::array(const_int, 4);
        let wrapped = CType::typeof_type(arr);
        let elem = wrapped.elem_type();
        assert!(matches!(elem.specifier, Specifier::Int));
        assert!(elem.qualifiers.contains(Qualifiers::CONST));

        // const typeof(int[4]): const lives on the wrapper, still reaches
        // the element
        let mut wrapped = CType::typeof_type(CType::array(CType::INT, 4));
        wrapped.qualifiers = Qualifiers::CONST;
        let elem = wrapped.elem_type();
        assert!(matches!(elem.specifier, Specifier::Int));
        assert!(elem.qualifiers.contains(Qualifiers::CONST));
    }

    #[test]
    fn test_predicates_unwrap_wrappers() {
        let ptr = CType::pointer_to(CType::INT);
        let wrapped = CType::typeof_type(ptr.clone());
        assert!(wrapped.is_ptr());
        assert!(wrapped.is_scalar());
        assert!(!wrapped.is_int());
        let attributed = ptr.with_attributes(vec![Attribute::Packed]);
        assert!(attributed.is_ptr());
    }

    #[test]
    fn test_is_scalar_matches_definition() {
        let samples = vec![
            CType::INT,
            CType::new(Specifier::Double),
            CType::pointer_to(CType::VOID),
            CType::new(Specifier::NullptrT),
            CType::new(Specifier::Bool),
        ];
        for ty in samples {
            assert_eq!(
                ty.is_scalar(),
                ty.is_int() || ty.is_float() || ty.is_ptr() || ty.is_nullptr()
            );
            assert!(ty.is_scalar());
        }
        assert!(!CType::VOID.is_scalar());
        assert!(!CType::array(CType::INT, 2).is_scalar());
    }

    #[test]
    fn test_record_one_shot_completion() {
        let mut interner = StringInterner::new();
        let name = interner.intern("point");
        let record = Record::new(RecordKind::Struct, name);
        let ty = CType::record(record.clone());
        assert!(!ty.is_complete());

        record.define(RecordDef {
            fields: Vec::new(),
            layout: TypeLayout {
                size_bits: 0,
                field_alignment_bits: 8,
                pointer_alignment_bits: 8,
                required_alignment_bits: 8,
            },
            attributes: Vec::new(),
            field_attributes: None,
        });
        // the same payload observed through the previously created type
        assert!(ty.is_complete());
    }

    #[test]
    fn test_anonymous_record_detection() {
        let mut interner = StringInterner::new();
        let anon = Record::new(
            RecordKind::Struct,
            interner.intern_anonymous("struct", Span::dummy()),
        );
        let named = Record::new(RecordKind::Struct, interner.intern("s"));
        assert!(CType::record(anon).is_anonymous_record(&interner));
        assert!(!CType::record(named).is_anonymous_record(&interner));
    }

    #[test]
    fn test_eql_pointer_and_qualifiers() {
        let env = env();
        let a = CType::pointer_to(CType::INT);
        let b = CType::pointer_to(CType::INT);
        assert!(a.eql(&b, &env, true));

        let mut const_int = CType::INT;
        const_int.qualifiers = Qualifiers::CONST;
        let c = CType::pointer_to(const_int);
        assert!(!a.eql(&c, &env, true));
        assert!(a.eql(&c, &env, false));
    }

    #[test]
    fn test_eql_decayed_array_matches_pointer() {
        let env = env();
        let ptr = CType::pointer_to(CType::INT);
        let decayed = CType::array(CType::INT, 8).decay_array();
        assert!(ptr.eql(&decayed, &env, true));
    }

    #[test]
    fn test_eql_functions() {
        let env = env();
        let param = |ty: CType| Param {
            ty,
            name: None,
            name_tok: Span::dummy(),
        };
        let f1 = CType::func(CType::INT, vec![param(CType::INT)]);
        let f2 = CType::func(CType::INT, vec![param(CType::INT)]);
        assert!(f1.eql(&f2, &env, true));

        // top-level parameter const is not part of the function type
        let mut const_int = CType::INT;
        const_int.qualifiers = Qualifiers::CONST;
        let f3 = CType::func(CType::INT, vec![param(const_int)]);
        assert!(f1.eql(&f3, &env, true));

        let f4 = CType::var_args_func(CType::INT, vec![param(CType::INT)]);
        assert!(!f1.eql(&f4, &env, true));

        let f5 = CType::func(CType::INT, vec![]);
        assert!(!f1.eql(&f5, &env, true));
    }

    #[test]
    fn test_eql_records_by_identity() {
        let env = env();
        let mut interner = StringInterner::new();
        let name = interner.intern("s");
        let r1 = Record::new(RecordKind::Struct, name);
        let r2 = Record::new(RecordKind::Struct, name);
        let t1 = CType::record(r1.clone());
        let t1b = CType::record(r1);
        let t2 = CType::record(r2);
        assert!(t1.eql(&t1b, &env, true));
        assert!(!t1.eql(&t2, &env, true));
    }

    #[test]
    fn test_eql_reflexive_symmetric_through_typeof() {
        let env = env();
        let ty = CType::pointer_to(CType::array(CType::INT, 3));
        let wrapped = CType::typeof_type(ty.clone());
        assert!(ty.eql(&ty, &env, true));
        assert!(ty.eql(&wrapped, &env, true));
        assert!(wrapped.eql(&ty, &env, true));
    }

    #[test]
    fn test_attribute_lookup_through_typeof() {
        let ty = CType::INT.with_attributes(vec![Attribute::Aligned {
            alignment: Some(16),
        }]);
        let wrapped = CType::typeof_type(ty);
        assert!(wrapped.has_attribute(AttrTag::Aligned));
        assert!(!wrapped.has_attribute(AttrTag::Packed));
        match wrapped.get_attribute(AttrTag::Aligned) {
            Some(Attribute::Aligned { alignment }) => assert_eq!(alignment, Some(16)),
            other => panic!("unexpected attribute {:?}", other),
        }
    }

    #[test]
    fn test_with_attributes_merges_existing() {
        let ty = CType::INT
            .with_attributes(vec![Attribute::Packed])
            .with_attributes(vec![Attribute::Aligned { alignment: Some(4) }]);
        let attrs = ty.get_attributes();
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs[0].tag(), AttrTag::Packed);
        assert_eq!(attrs[1].tag(), AttrTag::Aligned);
    }

    #[test]
    fn test_field_lookup_through_anonymous_member() {
        let mut interner = StringInterner::new();
        let inner = Record::new(
            RecordKind::Struct,
            interner.intern_anonymous("struct", Span::dummy()),
        );
        let x = interner.intern("x");
        inner.define(RecordDef {
            fields: vec![Field {
                ty: CType::INT,
                name: Some(x),
                name_tok: Span::dummy(),
                bit_width: None,
                layout: FieldLayout {
                    offset_bits: 0,
                    size_bits: 32,
                },
            }],
            layout: TypeLayout {
                size_bits: 32,
                field_alignment_bits: 32,
                pointer_alignment_bits: 32,
                required_alignment_bits: 8,
            },
            attributes: Vec::new(),
            field_attributes: None,
        });

        let outer = Record::new(RecordKind::Struct, interner.intern("outer"));
        outer.define(RecordDef {
            fields: vec![
                Field {
                    ty: CType::new(Specifier::Long),
                    name: Some(interner.intern("head")),
                    name_tok: Span::dummy(),
                    bit_width: None,
                    layout: FieldLayout {
                        offset_bits: 0,
                        size_bits: 64,
                    },
                },
                Field {
                    ty: CType::record(inner),
                    name: None,
                    name_tok: Span::dummy(),
                    bit_width: None,
                    layout: FieldLayout {
                        offset_bits: 64,
                        size_bits: 32,
                    },
                },
            ],
            layout: TypeLayout {
                size_bits: 128,
                field_alignment_bits: 64,
                pointer_alignment_bits: 64,
                required_alignment_bits: 8,
            },
            attributes: Vec::new(),
            field_attributes: None,
        });

        let (offset, ty) = outer.field_offset_bits(x).expect("field found");
        assert_eq!(offset, 64);
        assert!(matches!(ty.specifier, Specifier::Int));
    }
}
