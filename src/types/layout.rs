//! Size, alignment, and integer-range computation.
//!
//! Everything here is a pure function of the type value and the `Env`
//! (target descriptor + language options): no allocation, no diagnostics.
//! Unknown sizes (incomplete types, VLAs) come back as `None`.
//!
//! Primitive sizes route through `Target`; the dialect-specific edge cases
//! (MSVC `_Bool`, MSVC array padding, GCC enum alignment, AVR and s390x
//! quirks) are all here, keyed off `Env`.

use crate::common::lang_opts::Env;
use crate::types::{AttrTag, Attribute, CType, Specifier};

/// Result of comparing two type sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeCompare {
    Lt,
    Gt,
    Eq,
    Indeterminate,
}

/// Align `value` up to the next multiple of `align` (a power of two; 0
/// passes the value through).
pub fn align_up(value: u64, align: u64) -> u64 {
    if align == 0 {
        return value;
    }
    let mask = align - 1;
    match value.checked_add(mask) {
        Some(v) => v & !mask,
        None => value,
    }
}

/// Largest `aligned(N)` in an attribute list; bare `aligned` means the
/// target's default attribute alignment.
pub fn annotation_alignment(attrs: &[Attribute], env: &Env) -> Option<u64> {
    let mut best: Option<u64> = None;
    for attr in attrs {
        if let Attribute::Aligned { alignment } = attr {
            let req = alignment.unwrap_or_else(|| env.target.default_aligned_alignment());
            best = Some(best.map_or(req, |b| b.max(req)));
        }
    }
    best
}

impl CType {
    /// Size in bytes, or `None` when the size is unknown at compile time.
    pub fn size_of(&self, env: &Env) -> Option<u64> {
        let canon = self.canon();
        let t = &env.target;
        match &canon.specifier {
            Specifier::Invalid => None,
            // GNU extension: sizeof(void) is 1
            Specifier::Void => Some(1),
            Specifier::Bool => Some(1),
            Specifier::NullptrT | Specifier::SpecialVaStart => Some(t.pointer_size()),

            Specifier::Char | Specifier::SChar | Specifier::UChar => Some(1),
            Specifier::Short | Specifier::UShort => Some(2),
            Specifier::Int | Specifier::UInt => Some(t.int_size()),
            Specifier::Long | Specifier::ULong => Some(t.long_size()),
            Specifier::LongLong | Specifier::ULongLong => Some(8),
            Specifier::Int128 | Specifier::UInt128 => Some(16),
            Specifier::BitInt(info) => {
                let bytes = (u64::from(info.bits) + 7) / 8;
                Some(align_up(bytes, canon.align_of(env)))
            }

            Specifier::Fp16 => Some(2),
            Specifier::Float => Some(4),
            Specifier::Double => Some(t.double_size()),
            Specifier::LongDouble => Some(t.long_double_layout().0),
            Specifier::Float80 | Specifier::Float128 => Some(16),

            _ if canon.specifier.is_complex() => {
                canon.make_real().size_of(env).map(|s| 2 * s)
            }

            Specifier::Pointer(_) => Some(t.pointer_size()),
            _ if canon.specifier.is_decayed_kind() => Some(t.pointer_size()),

            Specifier::Array(a) | Specifier::StaticArray(a) => {
                let elem = a.elem.size_of(env)?;
                let raw = elem.checked_mul(a.len)?;
                if env.msvc() {
                    // MSVC does not pad array size up to the alignment, so
                    // a flexible tail can have a byte-exact size.
                    Some(raw)
                } else {
                    Some(align_up(raw, canon.align_of(env)))
                }
            }
            Specifier::Vector(a) => {
                let elem = a.elem.size_of(env)?;
                elem.checked_mul(a.len)
            }
            Specifier::IncompleteArray(_) => {
                if env.msvc() {
                    Some(0)
                } else {
                    None
                }
            }
            Specifier::VariableLenArray(_) | Specifier::UnspecifiedVariableLenArray(_) => None,

            Specifier::Func(_) | Specifier::VarArgsFunc(_) | Specifier::OldStyleFunc(_) => {
                Some(1)
            }

            Specifier::Struct(r) | Specifier::Union(r) => r.layout().map(|l| l.size_bits / 8),
            Specifier::Enum(e) => e.tag_type().and_then(|tag| tag.size_of(env)),

            _ => None,
        }
    }

    /// Size in bits. Equals `8 * size_of` except for `_Bool`, `_BitInt`,
    /// and the extended-precision floats whose bit sizes are defined
    /// directly.
    pub fn bit_size_of(&self, env: &Env) -> Option<u64> {
        let canon = self.canon();
        match &canon.specifier {
            // MSVC gives _Bool a full byte of value bits
            Specifier::Bool => Some(if env.msvc() { 8 } else { 1 }),
            Specifier::BitInt(info) => Some(u64::from(info.bits)),
            Specifier::LongDouble => Some(env.target.long_double_layout().2),
            Specifier::Float80 => Some(80),
            _ => canon.size_of(env).map(|s| s * 8),
        }
    }

    /// ABI alignment in bytes. Incomplete records and enums report 0.
    pub fn align_of(&self, env: &Env) -> u64 {
        let requested = self.requested_alignment(env);
        let canon = self.canon();
        let t = &env.target;
        match &canon.specifier {
            Specifier::Struct(r) | Specifier::Union(r) => match r.layout() {
                Some(layout) => {
                    let natural = u64::from(layout.field_alignment_bits) / 8;
                    match requested {
                        // MSVC lets the attribute replace the computed value
                        Some(req) if env.msvc() => req,
                        Some(req) => req.max(natural),
                        None => natural,
                    }
                }
                None => 0,
            },
            Specifier::Enum(e) => match e.tag_type() {
                None => 0,
                Some(tag) => {
                    let natural = tag.align_of(env);
                    match requested {
                        // GCC ignores `aligned` on enums entirely
                        Some(req) if !env.gcc() => req,
                        _ => natural,
                    }
                }
            },
            _ => {
                if let Some(req) = requested {
                    return req;
                }
                match &canon.specifier {
                    Specifier::Invalid | Specifier::Void => 1,
                    Specifier::Bool
                    | Specifier::Char
                    | Specifier::SChar
                    | Specifier::UChar => t.scalar_align(1),
                    Specifier::Short | Specifier::UShort => t.scalar_align(2),
                    Specifier::Int | Specifier::UInt => t.scalar_align(t.int_size()),
                    Specifier::Long | Specifier::ULong => t.scalar_align(t.long_size()),
                    Specifier::LongLong | Specifier::ULongLong => t.scalar_align(8),
                    Specifier::Int128 | Specifier::UInt128 => t.int128_align(),
                    Specifier::BitInt(info) => {
                        let bytes = (u64::from(info.bits) + 7) / 8;
                        bytes.next_power_of_two().clamp(1, t.max_int_align())
                    }
                    Specifier::Fp16 => t.scalar_align(2),
                    Specifier::Float => t.scalar_align(4),
                    Specifier::Double => t.scalar_align(t.double_size()),
                    Specifier::LongDouble => t.long_double_layout().1,
                    Specifier::Float80 | Specifier::Float128 => {
                        if t.arch == crate::common::target::Arch::Avr {
                            1
                        } else {
                            16
                        }
                    }
                    _ if canon.specifier.is_complex() => canon.make_real().align_of(env),
                    Specifier::Pointer(_)
                    | Specifier::NullptrT
                    | Specifier::SpecialVaStart => t.pointer_align(),
                    _ if canon.specifier.is_decayed_kind() => t.pointer_align(),
                    Specifier::Array(a) | Specifier::StaticArray(a) => a.elem.align_of(env),
                    Specifier::IncompleteArray(sub)
                    | Specifier::UnspecifiedVariableLenArray(sub) => sub.align_of(env),
                    Specifier::VariableLenArray(e) => e.ty.align_of(env),
                    Specifier::Vector(_) => {
                        let size = canon.size_of(env).unwrap_or(1).max(1);
                        size.next_power_of_two()
                    }
                    Specifier::Func(_)
                    | Specifier::VarArgsFunc(_)
                    | Specifier::OldStyleFunc(_) => t.func_align(),
                    // records, enums, and wrappers handled above
                    _ => 1,
                }
            }
        }
    }

    /// Alignment demanded by an `aligned` attribute on this type, if any.
    pub fn requested_alignment(&self, env: &Env) -> Option<u64> {
        annotation_alignment(&self.get_attributes(), env)
    }

    pub fn size_compare(&self, other: &CType, env: &Env) -> SizeCompare {
        match (self.size_of(env), other.size_of(env)) {
            (Some(a), Some(b)) if a < b => SizeCompare::Lt,
            (Some(a), Some(b)) if a > b => SizeCompare::Gt,
            (Some(_), Some(_)) => SizeCompare::Eq,
            _ => SizeCompare::Indeterminate,
        }
    }

    /// Whether `_Alignas`/`alignof` may be applied to this type.
    pub fn alignable(&self) -> bool {
        self.is_array() || self.is_complete() || self.is_void()
    }

    fn int_width_signedness(&self, env: &Env) -> Option<(u32, bool)> {
        let canon = self.canon();
        let t = &env.target;
        match &canon.specifier {
            Specifier::Bool => Some((1, false)),
            Specifier::Char => Some((8, t.char_signed())),
            Specifier::SChar => Some((8, true)),
            Specifier::UChar => Some((8, false)),
            Specifier::Short => Some((16, true)),
            Specifier::UShort => Some((16, false)),
            Specifier::Int => Some((t.int_size() as u32 * 8, true)),
            Specifier::UInt => Some((t.int_size() as u32 * 8, false)),
            Specifier::Long => Some((t.long_size() as u32 * 8, true)),
            Specifier::ULong => Some((t.long_size() as u32 * 8, false)),
            Specifier::LongLong => Some((64, true)),
            Specifier::ULongLong => Some((64, false)),
            Specifier::Int128 => Some((128, true)),
            Specifier::UInt128 => Some((128, false)),
            Specifier::BitInt(info) => Some((
                u32::from(info.bits),
                info.signedness == crate::types::Signedness::Signed,
            )),
            Specifier::Enum(e) => e.tag_type()?.int_width_signedness(env),
            _ => None,
        }
    }

    /// Smallest representable value of an integer type.
    pub fn min_int(&self, env: &Env) -> Option<i128> {
        let (width, signed) = self.int_width_signedness(env)?;
        Some(if !signed {
            0
        } else if width >= 128 {
            i128::MIN
        } else {
            -(1i128 << (width - 1))
        })
    }

    /// Largest representable value of an integer type.
    pub fn max_int(&self, env: &Env) -> Option<u128> {
        let (width, signed) = self.int_width_signedness(env)?;
        Some(if signed {
            if width <= 1 {
                0
            } else {
                u128::MAX >> (129 - width)
            }
        } else if width >= 128 {
            u128::MAX
        } else {
            (1u128 << width) - 1
        })
    }

    /// C integer promotion. Types at least as wide as `int`, complex
    /// integers, and `_BitInt` pass through unchanged; enums promote as
    /// their tag type; an incomplete enum promotes as `int`.
    pub fn integer_promotion(&self, env: &Env) -> CType {
        let canon = self.canon();
        match &canon.specifier {
            Specifier::Bool
            | Specifier::Char
            | Specifier::SChar
            | Specifier::UChar
            | Specifier::Short => CType::INT,
            Specifier::UShort => {
                if env.target.int_size() == 2 {
                    CType::new(Specifier::UInt)
                } else {
                    CType::INT
                }
            }
            Specifier::Enum(e) => match e.tag_type() {
                Some(tag) => tag.integer_promotion(env),
                None => CType::INT,
            },
            _ => canon,
        }
    }

    pub fn enum_is_packed(&self, env: &Env) -> bool {
        env.opts.short_enums
            || env.target.packs_all_enums()
            || self.has_attribute(AttrTag::Packed)
    }
}
