//! Target information: sizes, alignments, and ABI quirks per architecture.
//!
//! The layout engine never hard-codes a primitive size; everything routes
//! through the `Target` descriptor so the same type values can be laid out
//! for any supported triple. Dialect behavior that follows the *emulated
//! compiler* rather than the hardware (MSVC `_Bool`, GCC enum alignment)
//! lives in `LangOpts`, not here.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arch {
    X86,
    X86_64,
    Arm,
    AArch64,
    Riscv64,
    Sparc64,
    S390x,
    Avr,
    Wasm32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    Linux,
    Windows,
    MacOs,
    Ios,
    Freestanding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Abi {
    Gnu,
    Musl,
    Msvc,
    Eabi,
    Unknown,
}

/// Describes the compilation target. All quantities are bytes unless the
/// method name says bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    pub arch: Arch,
    pub os: Os,
    pub abi: Abi,
}

impl Target {
    pub fn new(arch: Arch, os: Os, abi: Abi) -> Self {
        Self { arch, os, abi }
    }

    pub fn x86_64_linux_gnu() -> Self {
        Self::new(Arch::X86_64, Os::Linux, Abi::Gnu)
    }

    pub fn i586_linux_gnu() -> Self {
        Self::new(Arch::X86, Os::Linux, Abi::Gnu)
    }

    pub fn x86_64_windows_msvc() -> Self {
        Self::new(Arch::X86_64, Os::Windows, Abi::Msvc)
    }

    pub fn armv7_linux_gnu() -> Self {
        Self::new(Arch::Arm, Os::Linux, Abi::Gnu)
    }

    pub fn armv7_ios() -> Self {
        Self::new(Arch::Arm, Os::Ios, Abi::Unknown)
    }

    pub fn aarch64_linux_gnu() -> Self {
        Self::new(Arch::AArch64, Os::Linux, Abi::Gnu)
    }

    pub fn riscv64_linux_gnu() -> Self {
        Self::new(Arch::Riscv64, Os::Linux, Abi::Gnu)
    }

    pub fn sparc64_linux_gnu() -> Self {
        Self::new(Arch::Sparc64, Os::Linux, Abi::Gnu)
    }

    pub fn s390x_linux_gnu() -> Self {
        Self::new(Arch::S390x, Os::Linux, Abi::Gnu)
    }

    pub fn avr_freestanding() -> Self {
        Self::new(Arch::Avr, Os::Freestanding, Abi::Unknown)
    }

    pub fn wasm32_freestanding() -> Self {
        Self::new(Arch::Wasm32, Os::Freestanding, Abi::Unknown)
    }

    pub fn is_64_bit(&self) -> bool {
        matches!(
            self.arch,
            Arch::X86_64 | Arch::AArch64 | Arch::Riscv64 | Arch::Sparc64 | Arch::S390x
        )
    }

    pub fn pointer_size(&self) -> u64 {
        match self.arch {
            Arch::Avr => 2,
            _ if self.is_64_bit() => 8,
            _ => 4,
        }
    }

    /// AVR addresses have no alignment requirement at all.
    pub fn pointer_align(&self) -> u64 {
        if self.arch == Arch::Avr {
            1
        } else {
            self.pointer_size()
        }
    }

    pub fn int_size(&self) -> u64 {
        if self.arch == Arch::Avr {
            2
        } else {
            4
        }
    }

    pub fn long_size(&self) -> u64 {
        if self.os == Os::Windows {
            4
        } else if self.is_64_bit() {
            8
        } else {
            4
        }
    }

    pub fn double_size(&self) -> u64 {
        if self.arch == Arch::Avr {
            4
        } else {
            8
        }
    }

    /// `(size, alignment, significant bits)` of `long double`.
    pub fn long_double_layout(&self) -> (u64, u64, u64) {
        match self.arch {
            Arch::X86_64 => {
                if self.os == Os::Windows {
                    (8, 8, 64)
                } else {
                    (16, 16, 80)
                }
            }
            Arch::X86 => {
                if self.abi == Abi::Msvc {
                    (8, 8, 64)
                } else {
                    (12, 4, 80)
                }
            }
            Arch::Arm => (8, 8, 64),
            Arch::AArch64 => {
                if matches!(self.os, Os::MacOs | Os::Ios) {
                    (8, 8, 64)
                } else {
                    (16, 16, 128)
                }
            }
            Arch::Riscv64 | Arch::Sparc64 | Arch::Wasm32 => (16, 16, 128),
            Arch::S390x => (16, 8, 128),
            Arch::Avr => (8, 1, 64),
        }
    }

    /// Whether plain `char` behaves as a signed type on this target.
    pub fn char_signed(&self) -> bool {
        match self.arch {
            Arch::Arm | Arch::AArch64 => matches!(self.os, Os::Ios | Os::MacOs | Os::Windows),
            Arch::S390x => false,
            _ => true,
        }
    }

    /// `__int128` needs 64-bit registers, except wasm32 which provides it
    /// in its own way.
    pub fn int128_supported(&self) -> bool {
        self.is_64_bit() || self.arch == Arch::Wasm32
    }

    pub fn int128_align(&self) -> u64 {
        if self.arch == Arch::S390x && self.os == Os::Linux && self.abi == Abi::Gnu {
            8
        } else {
            16
        }
    }

    /// Upper bound for `_BitInt` alignment on this target.
    pub fn max_int_align(&self) -> u64 {
        match self.arch {
            Arch::Avr => 1,
            Arch::X86 | Arch::Arm => 8,
            _ => 16,
        }
    }

    /// Alignment of functions themselves (not function pointers).
    pub fn func_align(&self) -> u64 {
        match self.arch {
            Arch::Arm | Arch::AArch64 | Arch::Sparc64 => 4,
            Arch::Riscv64 => 2,
            _ => 1,
        }
    }

    /// Natural alignment for an integer or floating scalar of `size` bytes.
    /// The i386 System V ABI caps 8-byte scalars (long long, double) at 4.
    pub fn scalar_align(&self, size: u64) -> u64 {
        if self.arch == Arch::Avr {
            return 1;
        }
        if self.arch == Arch::X86 && self.os != Os::Windows && size >= 8 {
            return 4;
        }
        size.max(1)
    }

    /// Alignment implied by `__attribute__((aligned))` with no argument.
    pub fn default_aligned_alignment(&self) -> u64 {
        match self.arch {
            Arch::Avr => 1,
            Arch::Arm => 8,
            _ => 16,
        }
    }

    /// ARMv7 iOS and AVR lay out bitfields without letting the declared
    /// type's alignment bump the enclosing record.
    pub fn ignore_nonzero_sized_bitfield_type_alignment(&self) -> bool {
        (self.arch == Arch::Arm && self.os == Os::Ios) || self.arch == Arch::Avr
    }

    /// AVR packs every enum into the smallest tag that fits.
    pub fn packs_all_enums(&self) -> bool {
        self.arch == Arch::Avr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_sizes() {
        assert_eq!(Target::x86_64_linux_gnu().pointer_size(), 8);
        assert_eq!(Target::i586_linux_gnu().pointer_size(), 4);
        assert_eq!(Target::avr_freestanding().pointer_size(), 2);
        assert_eq!(Target::avr_freestanding().pointer_align(), 1);
    }

    #[test]
    fn test_i386_scalar_align_cap() {
        let t = Target::i586_linux_gnu();
        assert_eq!(t.scalar_align(8), 4);
        assert_eq!(t.scalar_align(4), 4);
        let t64 = Target::x86_64_linux_gnu();
        assert_eq!(t64.scalar_align(8), 8);
    }

    #[test]
    fn test_char_signedness() {
        assert!(Target::x86_64_linux_gnu().char_signed());
        assert!(Target::armv7_ios().char_signed());
        assert!(!Target::armv7_linux_gnu().char_signed());
        assert!(!Target::aarch64_linux_gnu().char_signed());
        assert!(!Target::s390x_linux_gnu().char_signed());
    }

    #[test]
    fn test_int128_support() {
        assert!(Target::x86_64_linux_gnu().int128_supported());
        assert!(Target::wasm32_freestanding().int128_supported());
        assert!(!Target::i586_linux_gnu().int128_supported());
        assert_eq!(Target::s390x_linux_gnu().int128_align(), 8);
        assert_eq!(Target::x86_64_linux_gnu().int128_align(), 16);
    }

    #[test]
    fn test_function_alignment() {
        assert_eq!(Target::armv7_linux_gnu().func_align(), 4);
        assert_eq!(Target::aarch64_linux_gnu().func_align(), 4);
        assert_eq!(Target::sparc64_linux_gnu().func_align(), 4);
        assert_eq!(Target::riscv64_linux_gnu().func_align(), 2);
        assert_eq!(Target::x86_64_linux_gnu().func_align(), 1);
    }
}
