//! Operation outcomes and their exception vectors.

use thiserror::Error;

/// Every way an instruction can end other than normal completion.
///
/// Microcode, operand fetch and memory helpers all report through this type;
/// the emulator turns it into a guest-visible exception.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Fault {
    #[error("bus error")]
    BusError,
    #[error("address error")]
    AddressError,
    #[error("illegal instruction")]
    IllegalInstruction,
    #[error("privilege violation")]
    PrivilegeViolation,
    #[error("CHK out of bounds")]
    ChkException,
    #[error("integer divide by zero")]
    DivisionByZero,
    #[error("TRAPV / TRAPcc taken")]
    OverflowTrap,
    #[error("RTE stack frame format error")]
    FormatError,
    #[error("line 1010 emulator")]
    LineA,
    #[error("line 1111 emulator")]
    LineF,
    /// Not an exception: the opcode has been replaced and the next step runs
    /// the substitute.
    #[error("breakpoint")]
    Breakpoint,
    /// TRAP #n, n in 0..16.
    #[error("TRAP #{0}")]
    Trap(u8),
}

/// Result of one operation-semantics call.
pub type OpResult = Result<(), Fault>;

/// Stack frame layout used to deliver an exception.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFormat {
    /// SR, PC, format/offset: 8 bytes.
    Short,
    /// Format 0 plus the faulting instruction address: 12 bytes.
    SixWord,
}

/// Architectural vector numbers.
pub mod vector {
    pub const RESET_SSP: u8 = 0;
    pub const RESET_PC: u8 = 1;
    pub const BUS_ERROR: u8 = 2;
    pub const ADDRESS_ERROR: u8 = 3;
    pub const ILLEGAL_INSTRUCTION: u8 = 4;
    pub const ZERO_DIVIDE: u8 = 5;
    pub const CHK: u8 = 6;
    pub const TRAPV: u8 = 7;
    pub const PRIVILEGE_VIOLATION: u8 = 8;
    pub const TRACE: u8 = 9;
    pub const LINE_A: u8 = 10;
    pub const LINE_F: u8 = 11;
    pub const FORMAT_ERROR: u8 = 14;
    pub const AUTOVECTOR_BASE: u8 = 24;
    pub const TRAP_BASE: u8 = 32;
}

impl Fault {
    /// Vector number delivered for this fault; `None` for breakpoints.
    #[must_use]
    pub const fn vector(self) -> Option<u8> {
        Some(match self {
            Self::BusError => vector::BUS_ERROR,
            Self::AddressError => vector::ADDRESS_ERROR,
            Self::IllegalInstruction => vector::ILLEGAL_INSTRUCTION,
            Self::PrivilegeViolation => vector::PRIVILEGE_VIOLATION,
            Self::ChkException => vector::CHK,
            Self::DivisionByZero => vector::ZERO_DIVIDE,
            Self::OverflowTrap => vector::TRAPV,
            Self::FormatError => vector::FORMAT_ERROR,
            Self::LineA => vector::LINE_A,
            Self::LineF => vector::LINE_F,
            Self::Trap(n) => vector::TRAP_BASE + (n & 0xF),
            Self::Breakpoint => return None,
        })
    }

    /// Byte offset of the vector from VBR.
    #[must_use]
    pub const fn vector_offset(self) -> Option<u16> {
        match self.vector() {
            Some(v) => Some(v as u16 * 4),
            None => None,
        }
    }

    /// Instruction-completion traps stack a six-word frame carrying the
    /// address of the instruction that raised them.
    #[must_use]
    pub const fn frame_format(self) -> FrameFormat {
        match self {
            Self::ChkException | Self::DivisionByZero | Self::OverflowTrap => FrameFormat::SixWord,
            _ => FrameFormat::Short,
        }
    }

    /// Whether the stacked PC points back at the faulting instruction rather
    /// than past it.
    #[must_use]
    pub const fn restarts_instruction(self) -> bool {
        !matches!(
            self,
            Self::ChkException | Self::DivisionByZero | Self::OverflowTrap | Self::Trap(_) | Self::Breakpoint
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{Fault, FrameFormat};

    #[test]
    fn trap_vectors_start_at_32() {
        assert_eq!(Fault::Trap(0).vector(), Some(32));
        assert_eq!(Fault::Trap(15).vector_offset(), Some(0xBC));
    }

    #[test]
    fn fixed_vectors_match_the_exception_table() {
        assert_eq!(Fault::AddressError.vector_offset(), Some(0x0C));
        assert_eq!(Fault::IllegalInstruction.vector_offset(), Some(0x10));
        assert_eq!(Fault::PrivilegeViolation.vector_offset(), Some(0x20));
        assert_eq!(Fault::LineF.vector_offset(), Some(0x2C));
        assert_eq!(Fault::Breakpoint.vector(), None);
    }

    #[test]
    fn completion_traps_use_six_word_frames() {
        assert_eq!(Fault::DivisionByZero.frame_format(), FrameFormat::SixWord);
        assert_eq!(Fault::Trap(3).frame_format(), FrameFormat::Short);
        assert!(Fault::IllegalInstruction.restarts_instruction());
        assert!(!Fault::Trap(1).restarts_instruction());
    }

    #[test]
    fn faults_render_for_logs() {
        assert_eq!(Fault::Trap(2).to_string(), "TRAP #2");
        assert_eq!(Fault::DivisionByZero.to_string(), "integer divide by zero");
    }
}
