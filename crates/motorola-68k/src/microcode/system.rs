//! Status-register immediates, traps, CHK, breakpoints and STOP.

use log::info;

use crate::fault::{Fault, OpResult};
use crate::flags::{N, V, test_conditional};
use crate::memory::Memory;
use crate::params::OpParams;
use crate::state::{ProcessorState, RunCondition};

/// ILLEGAL, executed in place of a breakpoint nobody services.
const ILLEGAL_OPCODE: u16 = 0x4AFC;

pub(super) fn ori_to_ccr<M: Memory>(s: &mut ProcessorState<M>, pb: &mut OpParams) {
    s.set_ccr(s.get_ccr() | pb.first as u8);
}

pub(super) fn andi_to_ccr<M: Memory>(s: &mut ProcessorState<M>, pb: &mut OpParams) {
    s.set_ccr(s.get_ccr() & pb.first as u8);
}

pub(super) fn eori_to_ccr<M: Memory>(s: &mut ProcessorState<M>, pb: &mut OpParams) {
    s.set_ccr(s.get_ccr() ^ pb.first as u8);
}

pub(super) fn ori_to_sr<M: Memory>(s: &mut ProcessorState<M>, pb: &mut OpParams) {
    s.set_sr(s.get_sr() | pb.first as u16);
}

pub(super) fn andi_to_sr<M: Memory>(s: &mut ProcessorState<M>, pb: &mut OpParams) {
    s.set_sr(s.get_sr() & pb.first as u16);
}

pub(super) fn eori_to_sr<M: Memory>(s: &mut ProcessorState<M>, pb: &mut OpParams) {
    s.set_sr(s.get_sr() ^ pb.first as u16);
}

/// CHK: trap when Dn is negative or above the bound. Only N is defined.
pub(super) fn chk<M: Memory>(s: &mut ProcessorState<M>, pb: &mut OpParams) -> OpResult {
    let size = pb.size;
    let value = size.sign_extend(pb.second) as i32;
    let bound = size.sign_extend(pb.first) as i32;

    if value < 0 {
        s.sr.set_flag(N, true);
        return Err(Fault::ChkException);
    }
    if value > bound {
        s.sr.set_flag(N, false);
        return Err(Fault::ChkException);
    }
    Ok(())
}

pub(super) fn trap(pb: &mut OpParams) -> OpResult {
    Err(Fault::Trap(pb.first as u8 & 0xF))
}

pub(super) fn trapv<M: Memory>(s: &mut ProcessorState<M>) -> OpResult {
    if s.sr.nzvc & V != 0 {
        return Err(Fault::OverflowTrap);
    }
    Ok(())
}

pub(super) fn trapcc<M: Memory>(s: &mut ProcessorState<M>, pb: &mut OpParams) -> OpResult {
    if test_conditional(pb.second as u8, s.sr.nzvc) {
        return Err(Fault::OverflowTrap);
    }
    Ok(())
}

/// BKPT: rewind to the breakpoint and let the host pick the opcode that
/// runs in its place.
pub(super) fn bkpt<M: Memory>(s: &mut ProcessorState<M>, pb: &mut OpParams) -> OpResult {
    s.regs.pc = s.regs.pc.wrapping_sub(2);
    s.opcode = ILLEGAL_OPCODE;
    if let Some(opcode) = s.call_breakpoint_handler(pb.first as u8 & 7) {
        s.opcode = opcode;
    }
    Err(Fault::Breakpoint)
}

pub(super) fn stop<M: Memory>(s: &mut ProcessorState<M>, pb: &mut OpParams) {
    if pb.first == 0xFFFF {
        info!("STOP #$FFFF at {:08X}: finished", s.regs.pc.wrapping_sub(4));
        s.condition = RunCondition::Finished;
        return;
    }
    s.set_sr(pb.first as u16);
    s.condition = RunCondition::Stopped;
}
