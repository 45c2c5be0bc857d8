//! Register-list, peripheral, alternate-space and control-register moves,
//! plus the status-register transfers.

use log::debug;

use crate::fault::{Fault, OpResult};
use crate::memory::{Access, FunctionCode, Memory};
use crate::model::{ControlRegister, ProcessorModel};
use crate::params::OpParams;
use crate::state::ProcessorState;

/// MOVEM registers to memory. `pb.second == 1` marks the -(An) form, which
/// walks the mask from A7 down to D0 at descending addresses.
pub(super) fn movem_to_mem<M: Memory>(s: &mut ProcessorState<M>, pb: &mut OpParams) -> OpResult {
    let mask = pb.first as u16;
    let size = pb.size;
    let step = size.bytes();
    let mut addr = pb.address;

    if pb.second == 0 {
        for reg in (0..16).filter(|r| mask & (1 << r) != 0) {
            let value = s.regs.general(reg);
            s.write_mem(addr, size, value)?;
            addr = addr.wrapping_add(step);
        }
        return Ok(());
    }

    let an = pb.target_index();
    // From the 68020 a stored An is its already-decremented value.
    let final_an = addr.wrapping_sub(step * mask.count_ones());

    for bit in (0..16).filter(|b| mask & (1 << b) != 0) {
        let reg = 15 - bit;
        addr = addr.wrapping_sub(step);
        let value = if reg == an && s.model >= ProcessorModel::Mc68020 {
            final_an
        } else {
            s.regs.general(reg)
        };
        s.write_mem(addr, size, value)?;
    }
    s.regs.set_general(an, addr);
    Ok(())
}

/// MOVEM memory to registers. Word loads sign-extend into the whole
/// register; the (An)+ form leaves An after the last load.
pub(super) fn movem_to_regs<M: Memory>(s: &mut ProcessorState<M>, pb: &mut OpParams) -> OpResult {
    let mask = pb.first as u16;
    let size = pb.size;
    let mut addr = pb.address;

    for reg in (0..16).filter(|r| mask & (1 << r) != 0) {
        let value = s.read_mem(addr, size)?;
        s.regs.set_general(reg, size.sign_extend(value));
        addr = addr.wrapping_add(size.bytes());
    }

    if pb.second == 1 {
        s.regs.set_general(pb.target_index(), addr);
    }
    Ok(())
}

/// MOVEP: bytes of Dn at alternate addresses, high byte first.
pub(super) fn movep<M: Memory>(s: &mut ProcessorState<M>, pb: &mut OpParams, to_memory: bool) -> OpResult {
    let count = pb.size.bytes() as usize;
    let reg = pb.target_index();
    let fc = s.data_space();
    let access = if to_memory { Access::Write } else { Access::Read };

    let span = (2 * count - 1) as u32;
    let run = s.mem.translate(pb.address, span, fc, access).ok_or(Fault::BusError)?;

    if to_memory {
        let bytes = s.regs.d[reg].to_be_bytes();
        for (i, byte) in bytes[4 - count..].iter().enumerate() {
            run[2 * i] = *byte;
        }
    } else {
        let value = (0..count).fold(0u32, |acc, i| acc << 8 | u32::from(run[2 * i]));
        s.regs.d[reg] = pb.size.merge(s.regs.d[reg], value);
    }
    Ok(())
}

/// MOVES: access the address space named by SFC (reads) or DFC (writes).
pub(super) fn moves<M: Memory>(s: &mut ProcessorState<M>, pb: &mut OpParams) -> OpResult {
    let ext = pb.first;
    let reg = (ext >> 12) as usize & 15;
    let size = pb.size;

    if ext & 0x0800 != 0 {
        let fc = FunctionCode::from_bits(s.regs.dfc);
        let value = s.regs.general(reg);
        return s.write_mem_in(pb.address, size, value, fc);
    }

    let fc = FunctionCode::from_bits(s.regs.sfc);
    let value = s.read_mem_in(pb.address, size, fc)?;
    if reg >= 8 {
        s.regs.set_general(reg, size.sign_extend(value));
    } else {
        s.regs.d[reg] = size.merge(s.regs.d[reg], value);
    }
    Ok(())
}

/// MOVEC. `pb.second` is 1 for Rn -> control register.
pub(super) fn movec<M: Memory>(s: &mut ProcessorState<M>, pb: &mut OpParams) -> OpResult {
    let ext = pb.first as u16;
    let id = ext & 0x0FFF;

    let Some(info) = ControlRegister::for_model(id, s.model) else {
        debug!("MOVEC: no control register {id:03X} on {:?}", s.model);
        s.regs.pc = s.regs.pc.wrapping_sub(4);
        return Err(Fault::IllegalInstruction);
    };

    let reg = usize::from(ext >> 12);

    // Bring the banked stack pointers up to date with A7.
    s.save_sp();
    if pb.second == 1 {
        let mut value = s.regs.general(reg);
        if info.only_3_bits {
            value &= 7;
        }
        *s.regs.control_mut(info.register) = value;
        s.load_sp();
    } else {
        let value = s.regs.control(info.register);
        s.regs.set_general(reg, value);
    }
    Ok(())
}

pub(super) fn move_from_sr<M: Memory>(s: &ProcessorState<M>, pb: &mut OpParams) {
    pb.result = u32::from(s.get_sr());
}

pub(super) fn move_from_ccr<M: Memory>(s: &ProcessorState<M>, pb: &mut OpParams) {
    pb.result = u32::from(s.get_ccr());
}

pub(super) fn move_to_ccr<M: Memory>(s: &mut ProcessorState<M>, pb: &mut OpParams) {
    s.set_ccr(pb.first as u8);
}

pub(super) fn move_to_sr<M: Memory>(s: &mut ProcessorState<M>, pb: &mut OpParams) {
    s.set_sr(pb.first as u16);
}

pub(super) fn move_to_usp<M: Memory>(s: &mut ProcessorState<M>, pb: &mut OpParams) {
    s.regs.usp = s.regs.general(pb.target_index());
}

pub(super) fn move_from_usp<M: Memory>(s: &mut ProcessorState<M>, pb: &mut OpParams) {
    let usp = s.regs.usp;
    s.regs.set_general(pb.target_index(), usp);
}

pub(super) fn exg<M: Memory>(s: &mut ProcessorState<M>, pb: &mut OpParams) {
    let (x, y) = (pb.first as usize, pb.second as usize);
    let (vx, vy) = (s.regs.general(x), s.regs.general(y));
    s.regs.set_general(x, vy);
    s.regs.set_general(y, vx);
}

pub(super) fn lea(pb: &mut OpParams) {
    pb.result = pb.address;
}
