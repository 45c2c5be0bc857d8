//! Status register layout and condition-code evaluation.
//!
//! ```text
//! 15 14 13 12 11 10  9  8  7  6  5  4  3  2  1  0
//! T1 T0  S  M  .  I2 I1 I0 .  .  .  X  N  Z  V  C
//! ```
//!
//! T0 and M only exist from the 68020 on (see [`ProcessorModel::sr_mask`]).
//!
//! [`ProcessorModel::sr_mask`]: crate::model::ProcessorModel::sr_mask

/// Carry flag.
pub const C: u8 = 0x1;
/// Overflow flag.
pub const V: u8 = 0x2;
/// Zero flag.
pub const Z: u8 = 0x4;
/// Negative flag.
pub const N: u8 = 0x8;

/// Trace on every instruction.
pub const T1: u16 = 0x8000;
/// Supervisor mode.
pub const S: u16 = 0x2000;
/// Master/interrupt stack select (68020+).
pub const M: u16 = 0x1000;

/// Packed status fields.
///
/// Kept apart so microcode can touch the condition codes without recomposing
/// the whole word; [`StatusRegister::to_word`] and
/// [`StatusRegister::from_word`] convert to the architectural layout.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusRegister {
    /// T1 T0 S M, bits 15-12.
    pub ttsm: u8,
    /// Interrupt priority mask, bits 10-8.
    pub iii: u8,
    /// Extend flag, bit 4.
    pub x: u8,
    /// N Z V C, bits 3-0.
    pub nzvc: u8,
}

impl StatusRegister {
    #[must_use]
    pub const fn to_word(self) -> u16 {
        (self.ttsm as u16) << 12 | (self.iii as u16) << 8 | (self.x as u16) << 4 | self.nzvc as u16
    }

    /// Split an already-masked status word.
    #[must_use]
    pub const fn from_word(word: u16) -> Self {
        Self {
            ttsm: (word >> 12) as u8,
            iii: (word >> 8 & 0x7) as u8,
            x: (word >> 4 & 0x1) as u8,
            nzvc: (word & 0xF) as u8,
        }
    }

    /// The condition code byte: `...X NZVC`.
    #[must_use]
    pub const fn ccr(self) -> u8 {
        self.x << 4 | self.nzvc
    }

    #[must_use]
    pub const fn supervisor(self) -> bool {
        self.to_word() & S != 0
    }

    #[must_use]
    pub const fn master(self) -> bool {
        self.to_word() & M != 0
    }

    #[must_use]
    pub const fn trace(self) -> bool {
        self.to_word() & T1 != 0
    }

    /// Set or clear one of the N/Z/V/C bits.
    pub fn set_flag(&mut self, flag: u8, on: bool) {
        if on {
            self.nzvc |= flag;
        } else {
            self.nzvc &= !flag;
        }
    }

    /// Set X and C together, as every carry-producing operation does.
    pub fn set_carry_and_extend(&mut self, carry: bool) {
        self.set_flag(C, carry);
        self.x = u8::from(carry);
    }
}

/// Evaluate one of the sixteen 68k condition codes against an N/Z/V/C nibble.
#[must_use]
pub fn test_conditional(cc: u8, nzvc: u8) -> bool {
    let n = nzvc & N != 0;
    let z = nzvc & Z != 0;
    let v = nzvc & V != 0;
    let c = nzvc & C != 0;

    match cc & 0xF {
        0x0 => true,        // T
        0x1 => false,       // F
        0x2 => !c && !z,    // HI
        0x3 => c || z,      // LS
        0x4 => !c,          // CC
        0x5 => c,           // CS
        0x6 => !z,          // NE
        0x7 => z,           // EQ
        0x8 => !v,          // VC
        0x9 => v,           // VS
        0xA => !n,          // PL
        0xB => n,           // MI
        0xC => n == v,      // GE
        0xD => n != v,      // LT
        0xE => !z && n == v, // GT
        _ => z || n != v,   // LE
    }
}
