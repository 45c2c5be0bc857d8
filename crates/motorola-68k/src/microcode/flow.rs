//! Branches, subroutine linkage and stack frames.

use crate::fault::{Fault, OpResult};
use crate::flags::test_conditional;
use crate::memory::Memory;
use crate::params::{OpParams, OpSize};
use crate::state::ProcessorState;

fn condition<M: Memory>(s: &ProcessorState<M>, pb: &OpParams) -> bool {
    test_conditional(pb.second as u8, s.sr.nzvc)
}

/// Bcc and BRA (condition T).
pub(super) fn bcc<M: Memory>(s: &mut ProcessorState<M>, pb: &mut OpParams) {
    if condition(s, pb) {
        s.regs.pc = pb.address;
    }
}

pub(super) fn bsr<M: Memory>(s: &mut ProcessorState<M>, pb: &mut OpParams) -> OpResult {
    s.push_long(s.regs.pc)?;
    s.regs.pc = pb.address;
    Ok(())
}

/// DBcc: when the condition is false, decrement the low word of Dn and
/// branch unless it wrapped to -1.
pub(super) fn dbcc<M: Memory>(s: &mut ProcessorState<M>, pb: &mut OpParams) {
    if condition(s, pb) {
        return;
    }
    let reg = pb.target_index();
    let counter = (s.regs.d[reg] as u16).wrapping_sub(1);
    s.regs.d[reg] = OpSize::Word.merge(s.regs.d[reg], u32::from(counter));
    if counter != 0xFFFF {
        s.regs.pc = pb.address;
    }
}

pub(super) fn scc<M: Memory>(s: &mut ProcessorState<M>, pb: &mut OpParams) {
    pb.result = if condition(s, pb) { 0xFF } else { 0 };
}

pub(super) fn jmp<M: Memory>(s: &mut ProcessorState<M>, pb: &mut OpParams) {
    s.regs.pc = pb.address;
}

pub(super) fn jsr<M: Memory>(s: &mut ProcessorState<M>, pb: &mut OpParams) -> OpResult {
    s.push_long(s.regs.pc)?;
    s.regs.pc = pb.address;
    Ok(())
}

pub(super) fn rts<M: Memory>(s: &mut ProcessorState<M>) -> OpResult {
    s.regs.pc = s.pop_long()?;
    Ok(())
}

pub(super) fn rtr<M: Memory>(s: &mut ProcessorState<M>) -> OpResult {
    let ccr = s.pop_word()?;
    s.set_ccr(ccr as u8);
    s.regs.pc = s.pop_long()?;
    Ok(())
}

pub(super) fn rtd<M: Memory>(s: &mut ProcessorState<M>, pb: &mut OpParams) -> OpResult {
    s.regs.pc = s.pop_long()?;
    s.regs.a[7] = s.regs.a[7].wrapping_add(pb.first);
    Ok(())
}

/// Return from exception: the format nibble at SP+6 picks the frame size.
pub(super) fn rte<M: Memory>(s: &mut ProcessorState<M>) -> OpResult {
    let sp = s.regs.a[7];
    let format = s.read_mem(sp.wrapping_add(6), OpSize::Word)? >> 12;
    let frame_size = match format {
        0 => 8,
        2 => 12,
        _ => return Err(Fault::FormatError),
    };

    let sr = s.read_mem(sp, OpSize::Word)?;
    let pc = s.read_mem(sp.wrapping_add(2), OpSize::Long)?;

    s.regs.a[7] = sp.wrapping_add(frame_size);
    s.regs.pc = pc;
    s.set_sr(sr as u16);
    Ok(())
}

pub(super) fn link<M: Memory>(s: &mut ProcessorState<M>, pb: &mut OpParams) -> OpResult {
    let reg = pb.target_index();
    s.push_long(s.regs.general(reg))?;
    let sp = s.regs.a[7];
    s.regs.set_general(reg, sp);
    s.regs.a[7] = s.regs.a[7].wrapping_add(pb.first);
    Ok(())
}

pub(super) fn unlk<M: Memory>(s: &mut ProcessorState<M>, pb: &mut OpParams) -> OpResult {
    let reg = pb.target_index();
    s.regs.a[7] = s.regs.general(reg);
    let value = s.pop_long()?;
    s.regs.set_general(reg, value);
    Ok(())
}

pub(super) fn pea<M: Memory>(s: &mut ProcessorState<M>, pb: &mut OpParams) -> OpResult {
    s.push_long(pb.address)
}

#[cfg(test)]
mod tests {
    use crate::fault::Fault;
    use crate::flags::Z;
    use crate::microcode::testing::{CODE, STACK, cpu, exec};
    use crate::model::ProcessorModel;

    #[test]
    fn bsr_pushes_return_address() {
        let mut s = cpu(ProcessorModel::Mc68000);
        // BSR.W +$20
        assert_eq!(exec(&mut s, &[0x6100, 0x0020]), Ok(()));
        assert_eq!(s.pc(), CODE + 2 + 0x20);
        assert_eq!(s.regs.a[7], STACK - 4);
        assert_eq!(s.read_mem(STACK - 4, crate::params::OpSize::Long), Ok(CODE + 4));
    }

    #[test]
    fn bcc_not_taken_falls_through() {
        let mut s = cpu(ProcessorModel::Mc68000);
        // BEQ.S +4 with Z clear
        assert_eq!(exec(&mut s, &[0x6704]), Ok(()));
        assert_eq!(s.pc(), CODE + 2);

        s.set_ccr(Z);
        assert_eq!(exec(&mut s, &[0x6704]), Ok(()));
        assert_eq!(s.pc(), CODE + 6);
    }

    #[test]
    fn dbf_counts_down_the_low_word() {
        let mut s = cpu(ProcessorModel::Mc68000);
        s.regs.d[0] = 0x1234_0001;
        // DBF D0,-2
        assert_eq!(exec(&mut s, &[0x51C8, 0xFFFE]), Ok(()));
        assert_eq!(s.regs.d[0], 0x1234_0000);
        assert_eq!(s.pc(), CODE);

        assert_eq!(exec(&mut s, &[0x51C8, 0xFFFE]), Ok(()));
        assert_eq!(s.regs.d[0], 0x1234_FFFF);
        assert_eq!(s.pc(), CODE + 4);
    }

    #[test]
    fn scc_writes_all_ones_or_zero() {
        let mut s = cpu(ProcessorModel::Mc68000);
        s.regs.d[1] = 0xFFFF_FF00;
        // ST D1
        assert_eq!(exec(&mut s, &[0x50C1]), Ok(()));
        assert_eq!(s.regs.d[1], 0xFFFF_FFFF);
        // SF D1
        assert_eq!(exec(&mut s, &[0x51C1]), Ok(()));
        assert_eq!(s.regs.d[1], 0xFFFF_FF00);
    }

    #[test]
    fn jsr_and_rts() {
        let mut s = cpu(ProcessorModel::Mc68000);
        // JSR $2000.W
        assert_eq!(exec(&mut s, &[0x4EB8, 0x2000]), Ok(()));
        assert_eq!(s.pc(), 0x2000);
        // RTS
        assert_eq!(exec(&mut s, &[0x4E75]), Ok(()));
        assert_eq!(s.pc(), CODE + 4);
        assert_eq!(s.regs.a[7], STACK);
    }

    #[test]
    fn rtr_restores_ccr_only() {
        let mut s = cpu(ProcessorModel::Mc68000);
        s.regs.a[7] = STACK - 6;
        assert!(s.mem.load(STACK - 6, &[0xA7, 0xFF, 0x00, 0x00, 0x30, 0x00]));
        // RTR
        assert_eq!(exec(&mut s, &[0x4E77]), Ok(()));
        assert_eq!(s.get_sr(), 0x271F);
        assert_eq!(s.pc(), 0x3000);
    }

    #[test]
    fn rtd_deallocates_arguments() {
        let mut s = cpu(ProcessorModel::Mc68010);
        s.regs.a[7] = STACK - 4;
        assert!(s.mem.load(STACK - 4, &[0x00, 0x00, 0x30, 0x00]));
        // RTD #8
        assert_eq!(exec(&mut s, &[0x4E74, 0x0008]), Ok(()));
        assert_eq!(s.regs.a[7], STACK + 8);
        assert_eq!(s.pc(), 0x3000);
    }

    #[test]
    fn link_then_unlk_restores_frame() {
        let mut s = cpu(ProcessorModel::Mc68000);
        s.regs.a[6] = 0xDEAD_BEEF;
        // LINK A6,#-16
        assert_eq!(exec(&mut s, &[0x4E56, 0xFFF0]), Ok(()));
        assert_eq!(s.regs.a[6], STACK - 4);
        assert_eq!(s.regs.a[7], STACK - 4 - 16);
        // UNLK A6
        assert_eq!(exec(&mut s, &[0x4E5E]), Ok(()));
        assert_eq!(s.regs.a[6], 0xDEAD_BEEF);
        assert_eq!(s.regs.a[7], STACK);
    }

    #[test]
    fn link_long_on_68020() {
        let mut s = cpu(ProcessorModel::Mc68020);
        // LINK.L A5,#-$10000
        assert_eq!(exec(&mut s, &[0x480D, 0xFFFF, 0x0000]), Ok(()));
        assert_eq!(s.regs.a[7], (STACK - 4).wrapping_sub(0x1_0000));
    }

    #[test]
    fn rte_pops_format_0_and_rejects_unknown_formats() {
        let mut s = cpu(ProcessorModel::Mc68010);
        s.regs.a[7] = STACK - 8;
        assert!(s.mem.load(STACK - 8, &[0x00, 0x04, 0x00, 0x00, 0x30, 0x00, 0x00, 0x10]));
        // RTE to user mode
        assert_eq!(exec(&mut s, &[0x4E73]), Ok(()));
        assert_eq!(s.pc(), 0x3000);
        assert_eq!(s.get_sr(), 0x0004);
        assert_eq!(s.regs.isp, STACK);

        let mut s = cpu(ProcessorModel::Mc68010);
        s.regs.a[7] = STACK - 8;
        assert!(s.mem.load(STACK - 8, &[0x27, 0x00, 0x00, 0x00, 0x30, 0x00, 0x90, 0x10]));
        assert_eq!(exec(&mut s, &[0x4E73]), Err(Fault::FormatError));
    }

    #[test]
    fn rte_pops_six_word_frame() {
        let mut s = cpu(ProcessorModel::Mc68020);
        s.regs.a[7] = STACK - 12;
        assert!(s.mem.load(
            STACK - 12,
            &[0x27, 0x00, 0x00, 0x00, 0x30, 0x00, 0x20, 0x14, 0x00, 0x00, 0x10, 0x00]
        ));
        assert_eq!(exec(&mut s, &[0x4E73]), Ok(()));
        assert_eq!(s.regs.a[7], STACK);
        assert_eq!(s.pc(), 0x3000);
    }

    #[test]
    fn pea_pushes_effective_address() {
        let mut s = cpu(ProcessorModel::Mc68000);
        s.regs.a[0] = 0x1234;
        // PEA (8,A0)
        assert_eq!(exec(&mut s, &[0x4868, 0x0008]), Ok(()));
        assert_eq!(s.read_mem(STACK - 4, crate::params::OpSize::Long), Ok(0x123C));
    }
}
