//! Type rendering in C declarator syntax, plus the diagnostic dump.
//!
//! C declarator syntax is inside-out: the declared name sits in the middle
//! of the type (`int (*x)[3]`). The printer therefore works as a
//! prologue/epilogue sandwich around the name: the prologue emits
//! everything left of the name (base type, stars, opening parens), the
//! epilogue everything right of it (array brackets, parameter lists,
//! closing parens).
//!
//! `_Atomic`-qualified types short-circuit into the `_Atomic(T)`
//! qualified-specifier form, which needs no sandwich.

use std::fmt::{self, Write};

use crate::common::interner::StringInterner;
use crate::types::{CType, QualHandling, Qualifiers, Specifier};

fn write_quals<W: Write>(quals: Qualifiers, w: &mut W) -> fmt::Result {
    if quals.contains(Qualifiers::CONST) {
        w.write_str("const ")?;
    }
    if quals.contains(Qualifiers::VOLATILE) {
        w.write_str("volatile ")?;
    }
    if quals.contains(Qualifiers::RESTRICT) {
        w.write_str("restrict ")?;
    }
    Ok(())
}

/// Qualifiers after a `*`; returns whether anything was written.
fn write_ptr_quals<W: Write>(quals: Qualifiers, w: &mut W) -> Result<bool, fmt::Error> {
    let mut wrote = false;
    for (flag, name) in [
        (Qualifiers::CONST, "const"),
        (Qualifiers::VOLATILE, "volatile"),
        (Qualifiers::RESTRICT, "restrict"),
    ] {
        if quals.contains(flag) {
            if wrote {
                w.write_char(' ')?;
            }
            w.write_str(name)?;
            wrote = true;
        }
    }
    Ok(wrote)
}

fn scalar_name(spec: &Specifier) -> Option<&'static str> {
    Some(match spec {
        Specifier::Invalid => "invalid",
        Specifier::Void => "void",
        Specifier::Bool => "_Bool",
        Specifier::NullptrT => "nullptr_t",
        Specifier::SpecialVaStart => "__builtin_va_start",
        Specifier::Char => "char",
        Specifier::SChar => "signed char",
        Specifier::UChar => "unsigned char",
        Specifier::Short => "short",
        Specifier::UShort => "unsigned short",
        Specifier::Int => "int",
        Specifier::UInt => "unsigned int",
        Specifier::Long => "long",
        Specifier::ULong => "unsigned long",
        Specifier::LongLong => "long long",
        Specifier::ULongLong => "unsigned long long",
        Specifier::Int128 => "__int128",
        Specifier::UInt128 => "unsigned __int128",
        Specifier::ComplexChar => "_Complex char",
        Specifier::ComplexSChar => "_Complex signed char",
        Specifier::ComplexUChar => "_Complex unsigned char",
        Specifier::ComplexShort => "_Complex short",
        Specifier::ComplexUShort => "_Complex unsigned short",
        Specifier::ComplexInt => "_Complex int",
        Specifier::ComplexUInt => "_Complex unsigned int",
        Specifier::ComplexLong => "_Complex long",
        Specifier::ComplexULong => "_Complex unsigned long",
        Specifier::ComplexLongLong => "_Complex long long",
        Specifier::ComplexULongLong => "_Complex unsigned long long",
        Specifier::ComplexInt128 => "_Complex __int128",
        Specifier::ComplexUInt128 => "_Complex unsigned __int128",
        Specifier::Fp16 => "__fp16",
        Specifier::Float => "float",
        Specifier::Double => "double",
        Specifier::LongDouble => "long double",
        Specifier::Float80 => "__float80",
        Specifier::Float128 => "__float128",
        Specifier::ComplexFp16 => "_Complex __fp16",
        Specifier::ComplexFloat => "_Complex float",
        Specifier::ComplexDouble => "_Complex double",
        Specifier::ComplexLongDouble => "_Complex long double",
        Specifier::ComplexFloat80 => "_Complex __float80",
        Specifier::ComplexFloat128 => "_Complex __float128",
        _ => return None,
    })
}

impl CType {
    /// Render the type in C declarator syntax without a declared name.
    pub fn print<W: Write>(&self, interner: &StringInterner, w: &mut W) -> fmt::Result {
        self.print_named(None, interner, w)
    }

    /// Render the type in C declarator syntax around a declared name.
    pub fn print_named<W: Write>(
        &self,
        name: Option<&str>,
        interner: &StringInterner,
        w: &mut W,
    ) -> fmt::Result {
        let needs_space = self.print_prologue(interner, w)?;
        if let Some(name) = name {
            if needs_space {
                w.write_char(' ')?;
            }
            w.write_str(name)?;
        }
        self.print_epilogue(interner, w)
    }

    /// Everything left of the declared name. Returns whether a name would
    /// need a separating space.
    fn print_prologue<W: Write>(
        &self,
        interner: &StringInterner,
        w: &mut W,
    ) -> Result<bool, fmt::Error> {
        if self.qualifiers.contains(Qualifiers::ATOMIC) {
            write_quals(self.qualifiers & !Qualifiers::ATOMIC, w)?;
            w.write_str("_Atomic(")?;
            let mut inner = self.clone();
            inner.qualifiers = Qualifiers::empty();
            inner.print(interner, w)?;
            w.write_char(')')?;
            return Ok(true);
        }

        match &self.specifier {
            _ if self.specifier.is_decayed_kind() => self.print_pointer_prologue(interner, w),
            Specifier::Pointer(_) => self.print_pointer_prologue(interner, w),
            // array qualifiers have no spelling of their own; they live on
            // the element
            Specifier::Array(a) | Specifier::StaticArray(a) => {
                a.elem.print_prologue(interner, w)
            }
            Specifier::IncompleteArray(sub) | Specifier::UnspecifiedVariableLenArray(sub) => {
                sub.print_prologue(interner, w)
            }
            Specifier::VariableLenArray(e) => e.ty.print_prologue(interner, w),
            Specifier::Vector(a) => {
                let mut elem = String::new();
                a.elem.print(interner, &mut elem)?;
                write_quals(self.qualifiers, w)?;
                write!(
                    w,
                    "{} __attribute__((__vector_size__({} * sizeof({}))))",
                    elem, a.len, elem
                )?;
                Ok(true)
            }
            Specifier::Func(f) | Specifier::VarArgsFunc(f) | Specifier::OldStyleFunc(f) => {
                f.return_type.print_prologue(interner, w)
            }
            Specifier::Struct(r) => {
                write_quals(self.qualifiers, w)?;
                write!(w, "struct {}", interner.lookup(r.name))?;
                Ok(true)
            }
            Specifier::Union(r) => {
                write_quals(self.qualifiers, w)?;
                write!(w, "union {}", interner.lookup(r.name))?;
                Ok(true)
            }
            Specifier::Enum(e) => {
                write_quals(self.qualifiers, w)?;
                write!(w, "enum {}", interner.lookup(e.name))?;
                Ok(true)
            }
            Specifier::BitInt(info) => {
                write_quals(self.qualifiers, w)?;
                if info.signedness == crate::types::Signedness::Unsigned {
                    w.write_str("unsigned ")?;
                }
                write!(w, "_BitInt({})", info.bits)?;
                Ok(true)
            }
            Specifier::ComplexBitInt(info) => {
                write_quals(self.qualifiers, w)?;
                w.write_str("_Complex ")?;
                if info.signedness == crate::types::Signedness::Unsigned {
                    w.write_str("unsigned ")?;
                }
                write!(w, "_BitInt({})", info.bits)?;
                Ok(true)
            }
            Specifier::TypeofType(_)
            | Specifier::TypeofExpr(_)
            | Specifier::DecayedTypeofType(_)
            | Specifier::DecayedTypeofExpr(_) => self
                .canonicalize(QualHandling::Standard)
                .print_prologue(interner, w),
            Specifier::Attributed(a) => a.base.print_prologue(interner, w),
            other => {
                write_quals(self.qualifiers, w)?;
                match scalar_name(other) {
                    Some(name) => w.write_str(name)?,
                    None => w.write_str("invalid")?,
                }
                Ok(true)
            }
        }
    }

    fn print_pointer_prologue<W: Write>(
        &self,
        interner: &StringInterner,
        w: &mut W,
    ) -> Result<bool, fmt::Error> {
        let elem = self.elem_type();
        let elem_needs_space = elem.print_prologue(interner, w)?;
        if elem.is_func() || elem.is_array() {
            w.write_char('(')?;
        } else if elem_needs_space {
            w.write_char(' ')?;
        }
        w.write_char('*')?;
        write_ptr_quals(self.qualifiers, w)
    }

    /// Everything right of the declared name.
    fn print_epilogue<W: Write>(&self, interner: &StringInterner, w: &mut W) -> fmt::Result {
        if self.qualifiers.contains(Qualifiers::ATOMIC) {
            return Ok(());
        }

        match &self.specifier {
            _ if self.specifier.is_decayed_kind() => self.print_pointer_epilogue(interner, w),
            Specifier::Pointer(_) => self.print_pointer_epilogue(interner, w),
            Specifier::Array(a) => {
                write!(w, "[{}]", a.len)?;
                a.elem.print_epilogue(interner, w)
            }
            Specifier::StaticArray(a) => {
                write!(w, "[static {}]", a.len)?;
                a.elem.print_epilogue(interner, w)
            }
            Specifier::IncompleteArray(sub) => {
                w.write_str("[]")?;
                sub.print_epilogue(interner, w)
            }
            Specifier::UnspecifiedVariableLenArray(sub) => {
                w.write_str("[*]")?;
                sub.print_epilogue(interner, w)
            }
            Specifier::VariableLenArray(e) => {
                w.write_str("[<expr>]")?;
                e.ty.print_epilogue(interner, w)
            }
            Specifier::Vector(a) => {
                let mut elem = String::new();
                a.elem.print(interner, &mut elem)?;
                write!(w, " /* vector of {} '{}' values */", a.len, elem)
            }
            Specifier::Func(f) | Specifier::VarArgsFunc(f) | Specifier::OldStyleFunc(f) => {
                w.write_char('(')?;
                if f.params.is_empty() {
                    match &self.specifier {
                        Specifier::Func(_) => w.write_str("void")?,
                        Specifier::VarArgsFunc(_) => w.write_str("...")?,
                        _ => {}
                    }
                } else {
                    for (i, param) in f.params.iter().enumerate() {
                        if i > 0 {
                            w.write_str(", ")?;
                        }
                        param.ty.print(interner, w)?;
                    }
                    if matches!(self.specifier, Specifier::VarArgsFunc(_)) {
                        w.write_str(", ...")?;
                    }
                }
                w.write_char(')')?;
                f.return_type.print_epilogue(interner, w)
            }
            Specifier::TypeofType(_)
            | Specifier::TypeofExpr(_)
            | Specifier::DecayedTypeofType(_)
            | Specifier::DecayedTypeofExpr(_) => self
                .canonicalize(QualHandling::Standard)
                .print_epilogue(interner, w),
            Specifier::Attributed(a) => a.base.print_epilogue(interner, w),
            _ => Ok(()),
        }
    }

    fn print_pointer_epilogue<W: Write>(
        &self,
        interner: &StringInterner,
        w: &mut W,
    ) -> fmt::Result {
        let elem = self.elem_type();
        if elem.is_func() || elem.is_array() {
            w.write_char(')')?;
        }
        elem.print_epilogue(interner, w)
    }

    /// Diagnostic rendering: like `print`, but decay and reference
    /// wrappers stay visible.
    pub fn dump(&self, interner: &StringInterner) -> String {
        let mut out = String::new();
        let _ = self.dump_into(interner, &mut out);
        out
    }

    fn dump_into(&self, interner: &StringInterner, out: &mut String) -> fmt::Result {
        match &self.specifier {
            Specifier::TypeofType(sub) => {
                write_quals(self.qualifiers, out)?;
                out.write_str("typeof(")?;
                sub.dump_into(interner, out)?;
                out.write_char(')')
            }
            Specifier::TypeofExpr(e) => {
                write_quals(self.qualifiers, out)?;
                out.write_str("typeof(<expr>: ")?;
                e.ty.dump_into(interner, out)?;
                out.write_char(')')
            }
            Specifier::DecayedTypeofType(sub) => {
                write_quals(self.qualifiers, out)?;
                out.write_str("decayed typeof(")?;
                sub.dump_into(interner, out)?;
                out.write_char(')')
            }
            Specifier::DecayedTypeofExpr(e) => {
                write_quals(self.qualifiers, out)?;
                out.write_str("decayed typeof(<expr>: ")?;
                e.ty.dump_into(interner, out)?;
                out.write_char(')')
            }
            Specifier::Attributed(a) => {
                out.write_str("attributed(")?;
                a.base.dump_into(interner, out)?;
                out.write_char(')')
            }
            _ if self.specifier.is_decayed_kind() => {
                out.write_str("decayed ")?;
                self.original_type_of_decayed_array().dump_into(interner, out)
            }
            _ => self.print(interner, out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::source::Span;
    use crate::types::{NodeRef, Param, Record, RecordKind};

    fn render(ty: &CType) -> String {
        ty.dump(&StringInterner::new())
    }

    fn render_named(ty: &CType, name: &str) -> String {
        let mut out = String::new();
        ty.print_named(Some(name), &StringInterner::new(), &mut out)
            .expect("printing succeeds");
        out
    }

    #[test]
    fn test_scalars() {
        assert_eq!(render(&CType::INT), "int");
        assert_eq!(render(&CType::new(Specifier::ULongLong)), "unsigned long long");
        assert_eq!(render(&CType::new(Specifier::ComplexUShort)), "_Complex unsigned short");
        let mut c = CType::INT;
        c.qualifiers = Qualifiers::CONST | Qualifiers::VOLATILE;
        assert_eq!(render(&c), "const volatile int");
    }

    #[test]
    fn test_pointers() {
        let p = CType::pointer_to(CType::INT);
        assert_eq!(render_named(&p, "x"), "int *x");

        let mut const_int = CType::INT;
        const_int.qualifiers = Qualifiers::CONST;
        assert_eq!(
            render_named(&CType::pointer_to(const_int), "x"),
            "const int *x"
        );

        let mut const_ptr = CType::pointer_to(CType::INT);
        const_ptr.qualifiers = Qualifiers::CONST;
        assert_eq!(render_named(&const_ptr, "x"), "int *const x");

        let pp = CType::pointer_to(CType::pointer_to(CType::new(Specifier::Char)));
        assert_eq!(render_named(&pp, "argv"), "char **argv");
    }

    #[test]
    fn test_arrays() {
        assert_eq!(render_named(&CType::array(CType::INT, 5), "a"), "int a[5]");
        let matrix = CType::array(CType::array(CType::INT, 4), 3);
        assert_eq!(render_named(&matrix, "m"), "int m[3][4]");
        assert_eq!(
            render_named(&CType::incomplete_array(CType::INT), "a"),
            "int a[]"
        );
        assert_eq!(
            render_named(&CType::static_array(CType::INT, 5), "a"),
            "int a[static 5]"
        );
        assert_eq!(
            render_named(&CType::unspecified_variable_len_array(CType::INT), "a"),
            "int a[*]"
        );
        assert_eq!(
            render_named(&CType::variable_len_array(CType::INT, NodeRef(7)), "a"),
            "int a[<expr>]"
        );
    }

    #[test]
    fn test_pointer_array_mix() {
        // array of pointers
        let arr_of_ptr = CType::array(CType::pointer_to(CType::INT), 3);
        assert_eq!(render_named(&arr_of_ptr, "x"), "int *x[3]");
        // pointer to array
        let ptr_to_arr = CType::pointer_to(CType::array(CType::INT, 3));
        assert_eq!(render_named(&ptr_to_arr, "x"), "int (*x)[3]");
    }

    #[test]
    fn test_functions() {
        let param = |ty: CType| Param {
            ty,
            name: None,
            name_tok: Span::dummy(),
        };
        let f = CType::func(
            CType::INT,
            vec![param(CType::INT), param(CType::new(Specifier::Double))],
        );
        assert_eq!(render_named(&f, "f"), "int f(int, double)");

        let v = CType::var_args_func(CType::INT, vec![param(CType::INT)]);
        assert_eq!(render_named(&v, "printf_ish"), "int printf_ish(int, ...)");

        let none = CType::func(CType::VOID, Vec::new());
        assert_eq!(render_named(&none, "f"), "void f(void)");

        let kr = CType::old_style_func(CType::INT, Vec::new());
        assert_eq!(render_named(&kr, "f"), "int f()");

        let fptr = CType::pointer_to(CType::func(CType::INT, vec![param(CType::INT)]));
        assert_eq!(render_named(&fptr, "cb"), "int (*cb)(int)");
    }

    #[test]
    fn test_atomic_rendering() {
        let mut atomic_int = CType::INT;
        atomic_int.qualifiers = Qualifiers::ATOMIC;
        assert_eq!(render_named(&atomic_int, "x"), "_Atomic(int) x");

        let mut both = CType::INT;
        both.qualifiers = Qualifiers::ATOMIC | Qualifiers::CONST;
        assert_eq!(render_named(&both, "x"), "const _Atomic(int) x");
    }

    #[test]
    fn test_vector_rendering() {
        let v = CType::vector(CType::INT, 4);
        assert_eq!(
            render(&v),
            "int __attribute__((__vector_size__(4 * sizeof(int)))) /* vector of 4 'int' values */"
        );
    }

    #[test]
    fn test_record_rendering() {
        let mut interner = StringInterner::new();
        let r = Record::new(RecordKind::Struct, interner.intern("point"));
        let ty = CType::record(r);
        let mut out = String::new();
        ty.print_named(Some("p"), &interner, &mut out).expect("prints");
        assert_eq!(out, "struct point p");
    }

    #[test]
    fn test_bit_int_rendering() {
        use crate::types::{BitIntInfo, Signedness};
        let b = CType::new(Specifier::BitInt(BitIntInfo {
            bits: 7,
            signedness: Signedness::Unsigned,
        }));
        assert_eq!(render(&b), "unsigned _BitInt(7)");
    }

    #[test]
    fn test_dump_keeps_wrappers_visible() {
        let interner = StringInterner::new();
        let decayed = CType::array(CType::INT, 5).decay_array();
        assert_eq!(decayed.dump(&interner), "decayed int[5]");

        let wrapped = CType::typeof_type(CType::INT);
        assert_eq!(wrapped.dump(&interner), "typeof(int)");

        // print renders through the wrapper
        let mut out = String::new();
        wrapped.print(&interner, &mut out).expect("prints");
        assert_eq!(out, "int");
    }
}
