//! One instruction: gate, fetch operands, run semantics, commit, update flags.

use crate::decode::{self, CcrUpdate, Form, Instruction};
use crate::ea::{self, AddrMode, Location};
use crate::fault::{Fault, OpResult};
use crate::flags::{C, N, V, Z};
use crate::memory::Memory;
use crate::microcode;
use crate::params::{OpParams, OpSize};
use crate::state::ProcessorState;

/// Execute the instruction whose opcode is in `s.opcode`. PC must already
/// point past the opcode word.
pub(crate) fn execute<M: Memory>(s: &mut ProcessorState<M>) -> OpResult {
    let instr = decode::lookup(s.opcode).ok_or(Fault::IllegalInstruction)?;

    if s.model < instr.since {
        return Err(Fault::IllegalInstruction);
    }
    if !s.is_supervisor() && instr.is_privileged_on(s.model) {
        return Err(Fault::PrivilegeViolation);
    }

    let mut pb = OpParams::sized(instr.size);
    let dest = fetch_operands(s, &instr, &mut pb)?;

    microcode::run(instr.op, s, &mut pb)?;

    // Unsized: nothing to commit, or the semantics cancelled the commit.
    if pb.size == OpSize::Unsized {
        return Ok(());
    }

    if instr.commit {
        if let Some(dest) = dest {
            ea::write(s, dest, pb.size, pb.result)?;
        }
    }

    update_ccr(s, instr.ccr, &pb);
    Ok(())
}

fn reg9(opcode: u16) -> usize {
    usize::from((opcode >> 9) & 7)
}

fn reg0(opcode: u16) -> usize {
    usize::from(opcode & 7)
}

fn ea_mode(opcode: u16) -> Result<AddrMode, Fault> {
    AddrMode::from_opcode(opcode).ok_or(Fault::IllegalInstruction)
}

/// Resolve and read an operand, keeping only `size` bits.
fn read_operand<M: Memory>(s: &mut ProcessorState<M>, mode: AddrMode, size: OpSize) -> Result<(Location, u32), Fault> {
    let loc = ea::resolve(s, mode, size)?;
    let value = ea::read(s, loc, size)?;
    Ok((loc, size.zero_extend(value)))
}

/// Address of a memory operand without reading it.
fn operand_address<M: Memory>(s: &mut ProcessorState<M>, mode: AddrMode, size: OpSize) -> Result<u32, Fault> {
    ea::resolve(s, mode, size)?
        .address()
        .ok_or(Fault::IllegalInstruction)
}

/// Fill `pb` for `instr` and return where the result is committed.
fn fetch_operands<M: Memory>(
    s: &mut ProcessorState<M>,
    instr: &Instruction,
    pb: &mut OpParams,
) -> Result<Option<Location>, Fault> {
    let opcode = s.opcode;
    let size = instr.size;

    let dest = match instr.form {
        Form::Implied => None,
        Form::ImmWord => {
            pb.first = u32::from(s.fetch_instruction_word()?);
            None
        }
        Form::ImmSignedWord => {
            pb.first = OpSize::Word.sign_extend(u32::from(s.fetch_instruction_word()?));
            None
        }
        Form::Control => {
            pb.first = u32::from(s.fetch_instruction_word()?);
            pb.second = u32::from(opcode & 1);
            None
        }
        Form::ImmEa => {
            let (_, imm) = read_operand(s, AddrMode::Immediate, size)?;
            pb.first = imm;
            let (loc, value) = read_operand(s, ea_mode(opcode)?, size)?;
            pb.second = value;
            Some(loc)
        }
        Form::BitDynamic | Form::BitStatic => {
            let number = if instr.form == Form::BitDynamic {
                s.regs.d[reg9(opcode)]
            } else {
                u32::from(s.fetch_instruction_word()?)
            };
            let (loc, value) = read_operand(s, ea_mode(opcode)?, size)?;
            pb.first = number & (size.bits() - 1);
            pb.second = value;
            Some(loc)
        }
        Form::Movep => {
            let disp = OpSize::Word.sign_extend(u32::from(s.fetch_instruction_word()?));
            pb.address = s.regs.a[reg0(opcode)].wrapping_add(disp);
            pb.target = reg9(opcode) as u32;
            None
        }
        Form::Moves => {
            pb.first = u32::from(s.fetch_instruction_word()?);
            pb.address = operand_address(s, ea_mode(opcode)?, size)?;
            None
        }
        Form::Move => {
            let (_, value) = read_operand(s, ea_mode(opcode)?, size)?;
            pb.first = value;
            let dst = AddrMode::decode((opcode >> 6) as u8, (opcode >> 9) as u8).ok_or(Fault::IllegalInstruction)?;
            Some(ea::resolve(s, dst, size)?)
        }
        Form::MoveAddr => {
            let (_, value) = read_operand(s, ea_mode(opcode)?, size)?;
            pb.first = size.sign_extend(value);
            pb.size = OpSize::Long;
            Some(Location::AddrReg(reg9(opcode)))
        }
        Form::Unary => {
            let (loc, value) = read_operand(s, ea_mode(opcode)?, size)?;
            pb.second = value;
            Some(loc)
        }
        Form::EaRead => {
            let (_, value) = read_operand(s, ea_mode(opcode)?, size)?;
            pb.first = value;
            None
        }
        Form::EaWrite => Some(ea::resolve(s, ea_mode(opcode)?, size)?),
        Form::Condition => {
            pb.second = u32::from((opcode >> 8) & 0xF);
            Some(ea::resolve(s, ea_mode(opcode)?, size)?)
        }
        Form::EaAddress => {
            pb.address = operand_address(s, ea_mode(opcode)?, OpSize::Long)?;
            None
        }
        Form::Lea => {
            pb.address = operand_address(s, ea_mode(opcode)?, OpSize::Long)?;
            Some(Location::AddrReg(reg9(opcode)))
        }
        Form::DataReg => {
            pb.second = s.regs.d[reg0(opcode)];
            pb.target = reg0(opcode) as u32;
            Some(Location::DataReg(reg0(opcode)))
        }
        Form::AddrReg => {
            pb.target = 8 + reg0(opcode) as u32;
            None
        }
        Form::Link => {
            pb.target = 8 + reg0(opcode) as u32;
            pb.first = OpSize::Word.sign_extend(u32::from(s.fetch_instruction_word()?));
            None
        }
        Form::LinkLong => {
            pb.target = 8 + reg0(opcode) as u32;
            pb.first = s.fetch_instruction_long()?;
            None
        }
        Form::Vector => {
            pb.first = u32::from(opcode & 0xF);
            None
        }
        Form::MovemToMem => {
            pb.first = u32::from(s.fetch_instruction_word()?);
            match ea_mode(opcode)? {
                AddrMode::AddrIndPreDec(r) => {
                    pb.address = s.regs.a[usize::from(r)];
                    pb.target = 8 + u32::from(r);
                    pb.second = 1;
                }
                mode => pb.address = operand_address(s, mode, size)?,
            }
            None
        }
        Form::MovemToRegs => {
            pb.first = u32::from(s.fetch_instruction_word()?);
            match ea_mode(opcode)? {
                AddrMode::AddrIndPostInc(r) => {
                    pb.address = s.regs.a[usize::from(r)];
                    pb.target = 8 + u32::from(r);
                    pb.second = 1;
                }
                mode => pb.address = operand_address(s, mode, size)?,
            }
            None
        }
        Form::MulDivLong => {
            pb.first = u32::from(s.fetch_instruction_word()?);
            let (_, value) = read_operand(s, ea_mode(opcode)?, OpSize::Long)?;
            pb.second = value;
            None
        }
        Form::EaToReg => {
            let (_, value) = read_operand(s, ea_mode(opcode)?, size)?;
            pb.first = value;
            pb.second = s.regs.d[reg9(opcode)];
            Some(Location::DataReg(reg9(opcode)))
        }
        Form::RegToEa => {
            pb.first = size.zero_extend(s.regs.d[reg9(opcode)]);
            let (loc, value) = read_operand(s, ea_mode(opcode)?, size)?;
            pb.second = value;
            Some(loc)
        }
        Form::EaToAddr => {
            let (_, value) = read_operand(s, ea_mode(opcode)?, size)?;
            pb.first = size.sign_extend(value);
            pb.second = s.regs.a[reg9(opcode)];
            pb.size = OpSize::Long;
            Some(Location::AddrReg(reg9(opcode)))
        }
        Form::Quick => {
            pb.first = match (opcode >> 9) & 7 {
                0 => 8,
                n => u32::from(n),
            };
            let (loc, value) = read_operand(s, ea_mode(opcode)?, size)?;
            pb.second = value;
            Some(loc)
        }
        Form::DecrementBranch => {
            pb.second = u32::from((opcode >> 8) & 0xF);
            pb.target = reg0(opcode) as u32;
            let base = s.pc();
            let disp = OpSize::Word.sign_extend(u32::from(s.fetch_instruction_word()?));
            pb.address = base.wrapping_add(disp);
            None
        }
        Form::TrapCondition => {
            pb.second = u32::from((opcode >> 8) & 0xF);
            match opcode & 7 {
                2 => pb.first = u32::from(s.fetch_instruction_word()?),
                3 => pb.first = s.fetch_instruction_long()?,
                _ => {}
            }
            None
        }
        Form::Branch => {
            pb.second = u32::from((opcode >> 8) & 0xF);
            let base = s.pc();
            let disp = match opcode as u8 {
                0 => OpSize::Word.sign_extend(u32::from(s.fetch_instruction_word()?)),
                0xFF if s.model >= crate::model::ProcessorModel::Mc68020 => s.fetch_instruction_long()?,
                d => OpSize::Byte.sign_extend(u32::from(d)),
            };
            pb.address = base.wrapping_add(disp);
            None
        }
        Form::MoveQuick => {
            pb.first = OpSize::Byte.sign_extend(u32::from(opcode & 0xFF));
            Some(Location::DataReg(reg9(opcode)))
        }
        Form::Extended => {
            let (rx, ry) = (reg9(opcode), reg0(opcode));
            if opcode & 0x0008 == 0 {
                pb.first = size.zero_extend(s.regs.d[ry]);
                pb.second = size.zero_extend(s.regs.d[rx]);
                Some(Location::DataReg(rx))
            } else {
                let (_, src) = read_operand(s, AddrMode::AddrIndPreDec(ry as u8), size)?;
                let (loc, dst) = read_operand(s, AddrMode::AddrIndPreDec(rx as u8), size)?;
                pb.first = src;
                pb.second = dst;
                Some(loc)
            }
        }
        Form::CompareMemory => {
            let (_, src) = read_operand(s, AddrMode::AddrIndPostInc(reg0(opcode) as u8), size)?;
            let (_, dst) = read_operand(s, AddrMode::AddrIndPostInc(reg9(opcode) as u8), size)?;
            pb.first = src;
            pb.second = dst;
            None
        }
        Form::Exchange => {
            let (rx, ry) = (reg9(opcode) as u32, reg0(opcode) as u32);
            (pb.first, pb.second) = match (opcode >> 3) & 0x1F {
                0x08 => (rx, ry),
                0x09 => (8 + rx, 8 + ry),
                _ => (rx, 8 + ry),
            };
            None
        }
        Form::ShiftRegister => {
            pb.first = if opcode & 0x0020 != 0 {
                s.regs.d[reg9(opcode)] % 64
            } else {
                match (opcode >> 9) & 7 {
                    0 => 8,
                    n => u32::from(n),
                }
            };
            pb.second = size.zero_extend(s.regs.d[reg0(opcode)]);
            Some(Location::DataReg(reg0(opcode)))
        }
        Form::ShiftMemory => {
            pb.first = 1;
            let (loc, value) = read_operand(s, ea_mode(opcode)?, OpSize::Word)?;
            pb.second = value;
            Some(loc)
        }
    };

    Ok(dest)
}

/// Derive N/Z/V/C/X from the parameter record.
pub(crate) fn update_ccr<M: Memory>(s: &mut ProcessorState<M>, update: CcrUpdate, pb: &OpParams) {
    let size = pb.size;
    let src = size.zero_extend(pb.first);
    let dst = size.zero_extend(pb.second);
    let res = size.zero_extend(pb.result);

    let sm = size.is_negative(src);
    let dm = size.is_negative(dst);
    let rm = size.is_negative(res);
    let zero = res == 0;

    let sr = &mut s.sr;
    match update {
        CcrUpdate::None => {}
        CcrUpdate::Logic => {
            sr.set_flag(N, rm);
            sr.set_flag(Z, zero);
            sr.set_flag(V, false);
            sr.set_flag(C, false);
        }
        CcrUpdate::Add | CcrUpdate::AddExtended => {
            let overflow = (sm && dm && !rm) || (!sm && !dm && rm);
            let carry = (sm && dm) || (!rm && dm) || (sm && !rm);
            sr.set_flag(N, rm);
            if update == CcrUpdate::Add {
                sr.set_flag(Z, zero);
            } else if !zero {
                sr.set_flag(Z, false);
            }
            sr.set_flag(V, overflow);
            sr.set_carry_and_extend(carry);
        }
        CcrUpdate::Sub | CcrUpdate::SubExtended | CcrUpdate::Compare => {
            let overflow = (!sm && dm && !rm) || (sm && !dm && rm);
            let carry = (sm && !dm) || (rm && !dm) || (sm && rm);
            sr.set_flag(N, rm);
            if update == CcrUpdate::SubExtended {
                if !zero {
                    sr.set_flag(Z, false);
                }
            } else {
                sr.set_flag(Z, zero);
            }
            sr.set_flag(V, overflow);
            if update == CcrUpdate::Compare {
                sr.set_flag(C, carry);
            } else {
                sr.set_carry_and_extend(carry);
            }
        }
        CcrUpdate::Quotient => {
            sr.set_flag(N, pb.result & 0x8000 != 0);
            sr.set_flag(Z, pb.result & 0xFFFF == 0);
            sr.set_flag(V, false);
            sr.set_flag(C, false);
        }
        CcrUpdate::BitZ => {
            sr.set_flag(Z, (pb.second >> (pb.first & 31)) & 1 == 0);
        }
    }
}
