//! Struct and union layout finalization.
//!
//! Invoked by the parser once a record's member list is complete, before
//! any `sizeof`/`alignof` query is allowed. Writes each field's
//! `{offset_bits, size_bits}` slot in place and returns the record's
//! `TypeLayout`. All arithmetic is in bits.
//!
//! Bitfields follow the GCC rules: a bitfield is placed in the
//! naturally-aligned storage unit of its declared type that contains the
//! current bit cursor, and only moves to a fresh unit when it would not
//! fit. A zero-width bitfield forces the cursor to the declared type's
//! next boundary. Under `packed`, bitfields form a contiguous bit stream
//! and ordinary fields fall on the next byte.

use crate::common::lang_opts::Env;
use crate::types::layout::{align_up, annotation_alignment};
use crate::types::{
    Attribute, Field, FieldLayout, QualHandling, RecordKind, Specifier, TypeLayout,
};

/// Lay out `fields` and return the record's layout. Field layout slots are
/// written in place; unnamed bitfields get the MAX sentinel.
pub fn compute(
    kind: RecordKind,
    fields: &mut [Field],
    attributes: &[Attribute],
    env: &Env,
) -> TypeLayout {
    match kind {
        RecordKind::Struct => compute_struct(fields, attributes, env),
        RecordKind::Union => compute_union(fields, attributes, env),
    }
}

fn field_alignment_bits(field: &Field, packed: bool, env: &Env) -> (u64, u64) {
    let natural = field.ty.align_of(env).max(1) * 8;
    let explicit = field.ty.requested_alignment(env).map(|a| a * 8);
    let aligned = match explicit {
        // an explicit aligned attribute on the field overrides packing
        Some(explicit) => natural.max(explicit),
        None if packed => natural.min(8),
        None => natural,
    };
    (natural, aligned)
}

fn compute_struct(fields: &mut [Field], attributes: &[Attribute], env: &Env) -> TypeLayout {
    let packed = attributes.iter().any(|a| matches!(a, Attribute::Packed));
    let ignore_bitfield_align = env.target.ignore_nonzero_sized_bitfield_type_alignment();

    let mut offset: u64 = 0; // next free bit
    let mut max_align: u64 = 8;

    for field in fields.iter_mut() {
        let (natural_bits, align_bits) = field_alignment_bits(field, packed, env);
        let storage_bits = field.ty.size_of(env).unwrap_or(0) * 8;

        if let Some(bw) = field.bit_width {
            let bw = u64::from(bw);
            if bw == 0 {
                // force the next boundary of the declared type
                offset = align_up(offset, natural_bits);
                field.layout = FieldLayout::UNNAMED_BITFIELD;
                continue;
            }
            if !ignore_bitfield_align {
                max_align = max_align.max(align_bits);
            }
            let place = if packed {
                offset
            } else {
                let unit_start = offset & !(align_bits - 1);
                if (offset - unit_start) + bw <= storage_bits {
                    offset
                } else {
                    align_up(offset, align_bits)
                }
            };
            field.layout = if field.name.is_none() {
                FieldLayout::UNNAMED_BITFIELD
            } else {
                FieldLayout {
                    offset_bits: place,
                    size_bits: bw,
                }
            };
            offset = place + bw;
        } else {
            offset = align_up(offset, 8);
            max_align = max_align.max(align_bits);
            offset = align_up(offset, align_bits);
            let flexible = matches!(
                field.ty.canonicalize(QualHandling::Standard).specifier,
                Specifier::IncompleteArray(_)
            );
            field.layout = FieldLayout {
                offset_bits: offset,
                size_bits: if flexible { 0 } else { storage_bits },
            };
            if !flexible {
                offset += storage_bits;
            }
        }
    }

    let requested = annotation_alignment(attributes, env).map(|a| a * 8);
    if let Some(req) = requested {
        max_align = max_align.max(req);
    }
    let size_bits = align_up(offset, max_align);

    TypeLayout {
        size_bits,
        field_alignment_bits: max_align as u32,
        pointer_alignment_bits: max_align as u32,
        required_alignment_bits: if env.msvc() {
            requested.unwrap_or(8) as u32
        } else {
            8
        },
    }
}

fn compute_union(fields: &mut [Field], attributes: &[Attribute], env: &Env) -> TypeLayout {
    let packed = attributes.iter().any(|a| matches!(a, Attribute::Packed));

    let mut max_size: u64 = 0;
    let mut max_align: u64 = 8;

    for field in fields.iter_mut() {
        let (_, align_bits) = field_alignment_bits(field, packed, env);
        let storage_bits = field.ty.size_of(env).unwrap_or(0) * 8;
        max_align = max_align.max(align_bits);

        match field.bit_width {
            Some(0) => {
                field.layout = FieldLayout::UNNAMED_BITFIELD;
            }
            Some(bw) => {
                field.layout = if field.name.is_none() {
                    FieldLayout::UNNAMED_BITFIELD
                } else {
                    FieldLayout {
                        offset_bits: 0,
                        size_bits: u64::from(bw),
                    }
                };
                max_size = max_size.max(storage_bits);
            }
            None => {
                field.layout = FieldLayout {
                    offset_bits: 0,
                    size_bits: storage_bits,
                };
                max_size = max_size.max(storage_bits);
            }
        }
    }

    let requested = annotation_alignment(attributes, env).map(|a| a * 8);
    if let Some(req) = requested {
        max_align = max_align.max(req);
    }
    let size_bits = align_up(max_size, max_align);

    TypeLayout {
        size_bits,
        field_alignment_bits: max_align as u32,
        pointer_alignment_bits: max_align as u32,
        required_alignment_bits: if env.msvc() {
            requested.unwrap_or(8) as u32
        } else {
            8
        },
    }
}
