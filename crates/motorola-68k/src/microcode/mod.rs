//! Operation semantics.
//!
//! Each routine reads the operands that [`crate::dispatch`] fetched into the
//! parameter record and leaves a result (and, for the instructions that own
//! their flags, updated condition codes). Routines that touch memory, the
//! stack or the run condition report faults through [`OpResult`].

mod arith;
mod bcd;
mod bits;
mod flow;
mod logic;
mod moves;
mod muldiv;
mod shifts;
mod system;

use crate::decode::Op;
use crate::fault::{Fault, OpResult};
use crate::memory::Memory;
use crate::params::OpParams;
use crate::state::ProcessorState;

use shifts::Shift;

/// Run the semantics of `op` against `s`.
pub(crate) fn run<M: Memory>(op: Op, s: &mut ProcessorState<M>, pb: &mut OpParams) -> OpResult {
    match op {
        Op::OriToCcr => system::ori_to_ccr(s, pb),
        Op::OriToSr => system::ori_to_sr(s, pb),
        Op::AndiToCcr => system::andi_to_ccr(s, pb),
        Op::AndiToSr => system::andi_to_sr(s, pb),
        Op::EoriToCcr => system::eori_to_ccr(s, pb),
        Op::EoriToSr => system::eori_to_sr(s, pb),

        Op::Or => logic::or(pb),
        Op::And => logic::and(pb),
        Op::Eor => logic::eor(pb),
        Op::Not => logic::not(pb),
        Op::Clr => logic::clr(pb),
        Op::Move | Op::Tst => logic::copy(pb),
        Op::Swap => logic::swap(pb),
        Op::ExtW => logic::ext_w(pb),
        Op::ExtL => logic::ext_l(pb),
        Op::Extb => logic::extb(pb),
        Op::Tas => logic::tas(s, pb),

        Op::Add => arith::add(pb),
        Op::Sub | Op::Cmp => arith::sub(pb),
        Op::Addx => arith::addx(s, pb),
        Op::Subx => arith::subx(s, pb),
        Op::Neg => arith::neg(pb),
        Op::Negx => arith::negx(s, pb),

        Op::Abcd => bcd::abcd(s, pb),
        Op::Sbcd => bcd::sbcd(s, pb),
        Op::Nbcd => bcd::nbcd(s, pb),

        Op::Btst => bits::btst(pb),
        Op::Bchg => bits::bchg(pb),
        Op::Bclr => bits::bclr(pb),
        Op::Bset => bits::bset(pb),

        Op::Mulu => muldiv::mulu(pb),
        Op::Muls => muldiv::muls(pb),
        Op::Divu => muldiv::divu(pb)?,
        Op::Divs => muldiv::divs(pb)?,
        Op::Mull => muldiv::mull(s, pb),
        Op::Divl => muldiv::divl(s, pb)?,

        Op::Asl => shifts::shift(s, pb, Shift::Asl),
        Op::Asr => shifts::shift(s, pb, Shift::Asr),
        Op::Lsl => shifts::shift(s, pb, Shift::Lsl),
        Op::Lsr => shifts::shift(s, pb, Shift::Lsr),
        Op::Roxl => shifts::shift(s, pb, Shift::Roxl),
        Op::Roxr => shifts::shift(s, pb, Shift::Roxr),
        Op::Rol => shifts::shift(s, pb, Shift::Rol),
        Op::Ror => shifts::shift(s, pb, Shift::Ror),

        Op::MovepToReg => moves::movep(s, pb, false)?,
        Op::MovepToMem => moves::movep(s, pb, true)?,
        Op::Moves => moves::moves(s, pb)?,
        Op::Movec => moves::movec(s, pb)?,
        Op::MovemToMem => moves::movem_to_mem(s, pb)?,
        Op::MovemToRegs => moves::movem_to_regs(s, pb)?,
        Op::MoveFromSr => moves::move_from_sr(s, pb),
        Op::MoveFromCcr => moves::move_from_ccr(s, pb),
        Op::MoveToCcr => moves::move_to_ccr(s, pb),
        Op::MoveToSr => moves::move_to_sr(s, pb),
        Op::MoveToUsp => moves::move_to_usp(s, pb),
        Op::MoveFromUsp => moves::move_from_usp(s, pb),
        Op::Exg => moves::exg(s, pb),
        Op::Lea => moves::lea(pb),

        Op::Bcc => flow::bcc(s, pb),
        Op::Bsr => flow::bsr(s, pb)?,
        Op::Dbcc => flow::dbcc(s, pb),
        Op::Scc => flow::scc(s, pb),
        Op::Jmp => flow::jmp(s, pb),
        Op::Jsr => flow::jsr(s, pb)?,
        Op::Rts => flow::rts(s)?,
        Op::Rtr => flow::rtr(s)?,
        Op::Rtd => flow::rtd(s, pb)?,
        Op::Rte => flow::rte(s)?,
        Op::Link => flow::link(s, pb)?,
        Op::Unlk => flow::unlk(s, pb)?,
        Op::Pea => flow::pea(s, pb)?,

        Op::Chk => system::chk(s, pb)?,
        Op::Trap => system::trap(pb)?,
        Op::Trapv => system::trapv(s)?,
        Op::Trapcc => system::trapcc(s, pb)?,
        Op::Bkpt => system::bkpt(s, pb)?,
        Op::Stop => system::stop(s, pb),
        Op::Reset => s.mem.reset(),
        Op::Nop => {}
        Op::Illegal => return Err(Fault::IllegalInstruction),
        Op::LineA => return Err(Fault::LineA),
        Op::LineF => return Err(Fault::LineF),
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    //! Single-instruction harness shared by the semantics tests.

    use crate::dispatch;
    use crate::fault::OpResult;
    use crate::memory::FlatMemory;
    use crate::model::ProcessorModel;
    use crate::state::ProcessorState;

    pub const CODE: u32 = 0x1000;
    pub const STACK: u32 = 0x8000;

    pub fn cpu(model: ProcessorModel) -> ProcessorState<FlatMemory> {
        let mut s = ProcessorState::new(model, FlatMemory::new(0x1_0000));
        s.set_sr(0x2700);
        s.regs.a[7] = STACK;
        s
    }

    /// Load `code` at [`CODE`] and execute its first instruction.
    pub fn exec(s: &mut ProcessorState<FlatMemory>, code: &[u16]) -> OpResult {
        let bytes: Vec<u8> = code.iter().flat_map(|w| w.to_be_bytes()).collect();
        assert!(s.mem.load(CODE, &bytes));
        s.regs.pc = CODE;
        s.prefetch_instruction_word().expect("opcode fetch");
        s.regs.pc += 2;
        dispatch::execute(s)
    }
}
