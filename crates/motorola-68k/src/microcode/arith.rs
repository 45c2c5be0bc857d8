//! Binary add/subtract family. Flags are derived afterwards from the
//! operands and result (see `dispatch::update_ccr`).

use crate::memory::Memory;
use crate::params::OpParams;
use crate::state::ProcessorState;

pub(super) fn add(pb: &mut OpParams) {
    pb.result = pb.second.wrapping_add(pb.first);
}

/// `second - first`; also CMP.
pub(super) fn sub(pb: &mut OpParams) {
    pb.result = pb.second.wrapping_sub(pb.first);
}

pub(super) fn addx<M: Memory>(s: &ProcessorState<M>, pb: &mut OpParams) {
    pb.result = pb.second.wrapping_add(pb.first).wrapping_add(u32::from(s.sr.x));
}

pub(super) fn subx<M: Memory>(s: &ProcessorState<M>, pb: &mut OpParams) {
    pb.result = pb.second.wrapping_sub(pb.first).wrapping_sub(u32::from(s.sr.x));
}

/// `0 - operand`, arranged as a subtraction so the common flag rules apply.
pub(super) fn neg(pb: &mut OpParams) {
    pb.first = pb.second;
    pb.second = 0;
    pb.result = 0u32.wrapping_sub(pb.first);
}

pub(super) fn negx<M: Memory>(s: &ProcessorState<M>, pb: &mut OpParams) {
    pb.first = pb.second;
    pb.second = 0;
    pb.result = 0u32.wrapping_sub(pb.first).wrapping_sub(u32::from(s.sr.x));
}

#[cfg(test)]
mod tests {
    use crate::flags::{C, N, V, Z};
    use crate::microcode::testing::{cpu, exec};
    use crate::model::ProcessorModel;

    #[test]
    fn addi_long_overflow() {
        let mut s = cpu(ProcessorModel::Mc68000);
        s.regs.d[2] = 0x7FFF_FFFF;
        // ADDI.L #1,D2
        assert_eq!(exec(&mut s, &[0x0682, 0x0000, 0x0001]), Ok(()));
        assert_eq!(s.regs.d[2], 0x8000_0000);
        assert_eq!(s.get_ccr(), N | V);
    }

    #[test]
    fn neg_zero_clears_carry() {
        let mut s = cpu(ProcessorModel::Mc68000);
        s.set_ccr(0x1F);
        // NEG.W D0
        assert_eq!(exec(&mut s, &[0x4440]), Ok(()));
        assert_eq!(s.get_ccr(), Z);
    }

    #[test]
    fn neg_byte_sets_borrow() {
        let mut s = cpu(ProcessorModel::Mc68000);
        s.regs.d[0] = 0x0000_0001;
        // NEG.B D0
        assert_eq!(exec(&mut s, &[0x4400]), Ok(()));
        assert_eq!(s.regs.d[0], 0x0000_00FF);
        assert_eq!(s.get_ccr(), 0x10 | N | C);
    }

    #[test]
    fn addx_chains_through_extend() {
        let mut s = cpu(ProcessorModel::Mc68000);
        s.set_ccr(0x10 | Z);
        s.regs.d[0] = 0xFF;
        s.regs.d[1] = 0x00;
        // ADDX.B D0,D1: 0 + FF + 1 = 0 carry, Z kept
        assert_eq!(exec(&mut s, &[0xD300]), Ok(()));
        assert_eq!(s.regs.d[1] & 0xFF, 0);
        assert_eq!(s.get_ccr(), 0x10 | Z | C);
    }

    #[test]
    fn negx_uses_extend() {
        let mut s = cpu(ProcessorModel::Mc68000);
        s.set_ccr(0x10);
        // NEGX.L D3 with D3 = 0: 0 - 0 - 1
        assert_eq!(exec(&mut s, &[0x4083]), Ok(()));
        assert_eq!(s.regs.d[3], 0xFFFF_FFFF);
        assert_eq!(s.get_ccr(), 0x10 | N | C);
    }

    #[test]
    fn addq_to_address_register_is_long_and_flagless() {
        let mut s = cpu(ProcessorModel::Mc68000);
        s.regs.a[0] = 0xFFFF_FFFF;
        // ADDQ.W #1,A0
        assert_eq!(exec(&mut s, &[0x5248]), Ok(()));
        assert_eq!(s.regs.a[0], 0);
        assert_eq!(s.get_ccr(), 0);
    }

    #[test]
    fn suba_word_sign_extends_source() {
        let mut s = cpu(ProcessorModel::Mc68000);
        s.regs.a[1] = 0x1000;
        s.regs.d[0] = 0xFFFF;
        // SUBA.W D0,A1: 0x1000 - (-1)
        assert_eq!(exec(&mut s, &[0x92C0]), Ok(()));
        assert_eq!(s.regs.a[1], 0x1001);
    }

    #[test]
    fn cmpa_compares_full_address_register() {
        let mut s = cpu(ProcessorModel::Mc68000);
        s.regs.a[0] = 0x0001_0000;
        s.regs.d[1] = 0x0001_0000;
        // CMPA.L D1,A0
        assert_eq!(exec(&mut s, &[0xB1C1]), Ok(()));
        assert_eq!(s.get_ccr(), Z);
        assert_eq!(s.regs.a[0], 0x0001_0000);
    }
}
