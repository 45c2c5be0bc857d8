//! Effective addressing.
//!
//! Resolution consumes extension words from the instruction stream and
//! applies the (An)+ / -(An) side effects; reading and writing the resolved
//! [`Location`] is separate so read-modify-write instructions resolve once.

use crate::fault::Fault;
use crate::memory::Memory;
use crate::params::OpSize;
use crate::state::ProcessorState;

/// The twelve 68k addressing modes, from the 6-bit mode/register field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddrMode {
    /// Dn
    DataReg(u8),
    /// An
    AddrReg(u8),
    /// (An)
    AddrInd(u8),
    /// (An)+
    AddrIndPostInc(u8),
    /// -(An)
    AddrIndPreDec(u8),
    /// (d16,An)
    AddrIndDisp(u8),
    /// (d8,An,Xn) and the 68020 full extension formats
    AddrIndIndex(u8),
    /// (xxx).W
    AbsShort,
    /// (xxx).L
    AbsLong,
    /// (d16,PC)
    PcDisp,
    /// (d8,PC,Xn)
    PcIndex,
    /// #imm
    Immediate,
}

impl AddrMode {
    /// Decode a mode field (bits 5-3) and register field (bits 2-0).
    #[must_use]
    pub const fn decode(mode: u8, reg: u8) -> Option<Self> {
        let reg = reg & 7;
        Some(match mode & 7 {
            0 => Self::DataReg(reg),
            1 => Self::AddrReg(reg),
            2 => Self::AddrInd(reg),
            3 => Self::AddrIndPostInc(reg),
            4 => Self::AddrIndPreDec(reg),
            5 => Self::AddrIndDisp(reg),
            6 => Self::AddrIndIndex(reg),
            _ => match reg {
                0 => Self::AbsShort,
                1 => Self::AbsLong,
                2 => Self::PcDisp,
                3 => Self::PcIndex,
                4 => Self::Immediate,
                _ => return None,
            },
        })
    }

    /// Decode the low six bits of an opcode.
    #[must_use]
    pub const fn from_opcode(opcode: u16) -> Option<Self> {
        Self::decode((opcode >> 3) as u8 & 7, opcode as u8 & 7)
    }

    #[must_use]
    pub const fn is_data(self) -> bool {
        !matches!(self, Self::AddrReg(_))
    }

    #[must_use]
    pub const fn is_memory(self) -> bool {
        !matches!(self, Self::DataReg(_) | Self::AddrReg(_))
    }

    #[must_use]
    pub const fn is_control(self) -> bool {
        matches!(
            self,
            Self::AddrInd(_)
                | Self::AddrIndDisp(_)
                | Self::AddrIndIndex(_)
                | Self::AbsShort
                | Self::AbsLong
                | Self::PcDisp
                | Self::PcIndex
        )
    }

    #[must_use]
    pub const fn is_alterable(self) -> bool {
        !matches!(self, Self::PcDisp | Self::PcIndex | Self::Immediate)
    }

    #[must_use]
    pub const fn is_data_alterable(self) -> bool {
        self.is_data() && self.is_alterable()
    }

    #[must_use]
    pub const fn is_memory_alterable(self) -> bool {
        self.is_memory() && self.is_alterable()
    }

    #[must_use]
    pub const fn is_control_alterable(self) -> bool {
        self.is_control() && self.is_alterable()
    }

    #[must_use]
    pub const fn is_pc_relative(self) -> bool {
        matches!(self, Self::PcDisp | Self::PcIndex)
    }
}

/// Where an operand lives once its addressing mode has been resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    DataReg(usize),
    AddrReg(usize),
    /// Data-space memory.
    Memory(u32),
    /// PC-relative operand, read from program space.
    Program(u32),
    Immediate(u32),
}

impl Location {
    /// Memory address of the operand, for the control addressing modes.
    #[must_use]
    pub const fn address(self) -> Option<u32> {
        match self {
            Self::Memory(addr) | Self::Program(addr) => Some(addr),
            _ => None,
        }
    }
}

/// Resolve `mode` for an operand of `size`, consuming extension words.
pub(crate) fn resolve<M: Memory>(s: &mut ProcessorState<M>, mode: AddrMode, size: OpSize) -> Result<Location, Fault> {
    Ok(match mode {
        AddrMode::DataReg(r) => Location::DataReg(usize::from(r)),
        AddrMode::AddrReg(r) => Location::AddrReg(usize::from(r)),
        AddrMode::AddrInd(r) => Location::Memory(s.regs.a[usize::from(r)]),
        AddrMode::AddrIndPostInc(r) => {
            let r = usize::from(r);
            let addr = s.regs.a[r];
            s.regs.a[r] = addr.wrapping_add(step(r, size));
            Location::Memory(addr)
        }
        AddrMode::AddrIndPreDec(r) => {
            let r = usize::from(r);
            let addr = s.regs.a[r].wrapping_sub(step(r, size));
            s.regs.a[r] = addr;
            Location::Memory(addr)
        }
        AddrMode::AddrIndDisp(r) => {
            let disp = s.fetch_instruction_word()? as i16;
            Location::Memory(s.regs.a[usize::from(r)].wrapping_add_signed(i32::from(disp)))
        }
        AddrMode::AddrIndIndex(r) => {
            let base = s.regs.a[usize::from(r)];
            Location::Memory(indexed(s, Some(base))?)
        }
        AddrMode::AbsShort => Location::Memory(s.fetch_instruction_word()? as i16 as u32),
        AddrMode::AbsLong => Location::Memory(s.fetch_instruction_long()?),
        AddrMode::PcDisp => {
            let base = s.pc();
            let disp = s.fetch_instruction_word()? as i16;
            Location::Program(base.wrapping_add_signed(i32::from(disp)))
        }
        AddrMode::PcIndex => Location::Program(indexed(s, None)?),
        AddrMode::Immediate => Location::Immediate(match size {
            OpSize::Byte => u32::from(s.fetch_instruction_word()? & 0xFF),
            OpSize::Word => u32::from(s.fetch_instruction_word()?),
            OpSize::Long | OpSize::Unsized => s.fetch_instruction_long()?,
        }),
    })
}

/// Byte access through A7 moves it by two to keep the stack even.
fn step(reg: usize, size: OpSize) -> u32 {
    if reg == 7 && size == OpSize::Byte { 2 } else { size.bytes() }
}

/// `(d8,An,Xn)` / `(d8,PC,Xn)`, plus the 68020 scale factor and full
/// extension word (base/outer displacements, memory indirection).
///
/// `base` is `None` for the PC-relative form, whose base is the address of
/// the extension word.
fn indexed<M: Memory>(s: &mut ProcessorState<M>, base: Option<u32>) -> Result<u32, Fault> {
    let base = base.unwrap_or(s.pc());
    let ext = s.fetch_instruction_word()?;
    let extended = s.model >= crate::model::ProcessorModel::Mc68020;

    let index = {
        let xn = s.regs.general(usize::from(ext >> 12));
        let xn = if ext & 0x0800 != 0 { xn } else { OpSize::Word.sign_extend(xn) };
        let scale = if extended { (ext >> 9) & 3 } else { 0 };
        xn << scale
    };

    if !extended || ext & 0x0100 == 0 {
        let disp = i32::from(ext as u8 as i8);
        return Ok(base.wrapping_add_signed(disp).wrapping_add(index));
    }

    let base = if ext & 0x0080 != 0 { 0 } else { base };
    let index = if ext & 0x0040 != 0 { 0 } else { index };

    let base_disp = match (ext >> 4) & 3 {
        1 => 0,
        2 => OpSize::Word.sign_extend(u32::from(s.fetch_instruction_word()?)),
        3 => s.fetch_instruction_long()?,
        _ => return Err(Fault::IllegalInstruction),
    };

    let index_suppressed = ext & 0x0040 != 0;
    let selection = ext & 7;
    if selection == 4 || (index_suppressed && selection > 4) {
        return Err(Fault::IllegalInstruction);
    }

    let outer_disp = match selection & 3 {
        2 => OpSize::Word.sign_extend(u32::from(s.fetch_instruction_word()?)),
        3 => s.fetch_instruction_long()?,
        _ => 0,
    };

    let address = base.wrapping_add(base_disp);
    match selection {
        0 => Ok(address.wrapping_add(index)),
        1..=3 => {
            let pointer = s.read_mem(address.wrapping_add(index), OpSize::Long)?;
            Ok(pointer.wrapping_add(outer_disp))
        }
        _ => {
            let pointer = s.read_mem(address, OpSize::Long)?;
            Ok(pointer.wrapping_add(index).wrapping_add(outer_disp))
        }
    }
}

/// Read an operand. Register operands are returned whole; callers mask by
/// size where it matters.
pub(crate) fn read<M: Memory>(s: &mut ProcessorState<M>, loc: Location, size: OpSize) -> Result<u32, Fault> {
    match loc {
        Location::DataReg(r) => Ok(s.regs.d[r]),
        Location::AddrReg(r) => Ok(s.regs.a[r]),
        Location::Memory(addr) => s.read_mem(addr, size),
        Location::Program(addr) => {
            let fc = s.program_space();
            s.read_mem_in(addr, size, fc)
        }
        Location::Immediate(value) => Ok(value),
    }
}

/// Commit a result. Data registers keep their bits above `size`; address
/// registers always take the sign-extended long.
pub(crate) fn write<M: Memory>(s: &mut ProcessorState<M>, loc: Location, size: OpSize, value: u32) -> Result<(), Fault> {
    match loc {
        Location::DataReg(r) => {
            s.regs.d[r] = size.merge(s.regs.d[r], value);
            Ok(())
        }
        Location::AddrReg(r) => {
            s.regs.a[r] = size.sign_extend(value);
            Ok(())
        }
        Location::Memory(addr) => s.write_mem(addr, size, value),
        Location::Program(_) | Location::Immediate(_) => Err(Fault::IllegalInstruction),
    }
}
