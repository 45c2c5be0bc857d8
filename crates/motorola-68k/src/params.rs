//! Operand parameter record passed from decode to microcode.

/// Operand size. `Unsized` marks instructions with nothing to commit, and is
/// also how microcode cancels the commit (quotient overflow).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum OpSize {
    Byte,
    Word,
    Long,
    #[default]
    Unsized,
}

impl OpSize {
    /// Decode the common `00/01/10` size field at bits 7-6.
    #[must_use]
    pub const fn from_bits(bits: u16) -> Option<Self> {
        match bits & 3 {
            0 => Some(Self::Byte),
            1 => Some(Self::Word),
            2 => Some(Self::Long),
            _ => None,
        }
    }

    /// Decode the MOVE size field at bits 13-12 (`01` byte, `11` word, `10`
    /// long).
    #[must_use]
    pub const fn from_move_bits(bits: u16) -> Option<Self> {
        match bits & 3 {
            1 => Some(Self::Byte),
            3 => Some(Self::Word),
            2 => Some(Self::Long),
            _ => None,
        }
    }

    #[must_use]
    pub const fn bytes(self) -> u32 {
        match self {
            Self::Byte => 1,
            Self::Word => 2,
            Self::Long => 4,
            Self::Unsized => 0,
        }
    }

    #[must_use]
    pub const fn bits(self) -> u32 {
        self.bytes() * 8
    }

    #[must_use]
    pub const fn mask(self) -> u32 {
        match self {
            Self::Byte => 0xFF,
            Self::Word => 0xFFFF,
            Self::Long | Self::Unsized => 0xFFFF_FFFF,
        }
    }

    #[must_use]
    pub const fn sign_bit(self) -> u32 {
        match self {
            Self::Byte => 0x80,
            Self::Word => 0x8000,
            Self::Long | Self::Unsized => 0x8000_0000,
        }
    }

    #[must_use]
    pub const fn zero_extend(self, value: u32) -> u32 {
        value & self.mask()
    }

    #[must_use]
    pub const fn sign_extend(self, value: u32) -> u32 {
        match self {
            Self::Byte => value as u8 as i8 as i32 as u32,
            Self::Word => value as u16 as i16 as i32 as u32,
            Self::Long | Self::Unsized => value,
        }
    }

    #[must_use]
    pub const fn is_negative(self, value: u32) -> bool {
        value & self.sign_bit() != 0
    }

    /// Replace the low `self` bytes of `old` with `value`.
    #[must_use]
    pub const fn merge(self, old: u32, value: u32) -> u32 {
        (old & !self.mask()) | (value & self.mask())
    }
}

/// Decoded operands for one instruction. Built fresh per step.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OpParams {
    /// Source operand (or immediate / extension word).
    pub first: u32,
    /// Destination operand as read, or a condition code.
    pub second: u32,
    /// Value to commit.
    pub result: u32,
    pub size: OpSize,
    /// Effective address, when the instruction references memory or a
    /// branch target.
    pub address: u32,
    /// Register index (0-15, D then A) the instruction writes, when it names
    /// one directly.
    pub target: u32,
}

impl OpParams {
    #[must_use]
    pub fn sized(size: OpSize) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    /// `target` as a register-file index.
    #[must_use]
    pub const fn target_index(&self) -> usize {
        (self.target & 15) as usize
    }
}
