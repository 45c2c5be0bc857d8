//! Packed BCD arithmetic. These instructions own their flags: the decimal
//! carry comes back from the adjust step and feeds X and C directly.

use crate::flags::{N, V, Z};
use crate::memory::Memory;
use crate::params::OpParams;
use crate::state::ProcessorState;

/// `dst + src + extend` in packed BCD. Returns (result, carry, overflow).
fn bcd_add(src: u8, dst: u8, extend: u8) -> (u8, bool, bool) {
    let low_sum = (dst & 0x0F) + (src & 0x0F) + extend;
    let low_adjust: u16 = if low_sum > 9 { 6 } else { 0 };
    let binary = u16::from(dst) + u16::from(src) + u16::from(extend);

    let low_carry = (low_sum + if low_sum > 9 { 6 } else { 0 }) >> 4;
    let carry = (dst >> 4) + (src >> 4) + low_carry > 9;

    let result = binary + low_adjust + if carry { 0x60 } else { 0 };

    // V: the adjust turned bit 7 on.
    let overflow = !binary & result & 0x80 != 0;

    (result as u8, carry, overflow)
}

/// `dst - src - extend` in packed BCD. Returns (result, borrow, overflow).
fn bcd_sub(dst: u8, src: u8, extend: u8) -> (u8, bool, bool) {
    let binary = dst.wrapping_sub(src).wrapping_sub(extend);
    let mut result = binary;

    let low_borrow = (dst & 0x0F) < (src & 0x0F).saturating_add(extend);
    if low_borrow {
        result = result.wrapping_sub(6);
    }

    let high_borrow = (dst >> 4) < (src >> 4) + u8::from(low_borrow);
    if high_borrow {
        result = result.wrapping_sub(0x60);
    }

    let borrow = high_borrow || (low_borrow && binary < 6);

    // V: the adjust turned bit 7 off.
    let overflow = binary & !result & 0x80 != 0;

    (result, borrow, overflow)
}

fn set_flags<M: Memory>(s: &mut ProcessorState<M>, result: u8, carry: bool, overflow: bool) {
    s.sr.set_carry_and_extend(carry);
    if result != 0 {
        s.sr.set_flag(Z, false);
    }
    s.sr.set_flag(N, result & 0x80 != 0);
    s.sr.set_flag(V, overflow);
}

pub(super) fn abcd<M: Memory>(s: &mut ProcessorState<M>, pb: &mut OpParams) {
    let (result, carry, overflow) = bcd_add(pb.first as u8, pb.second as u8, s.sr.x);
    set_flags(s, result, carry, overflow);
    pb.result = u32::from(result);
}

pub(super) fn sbcd<M: Memory>(s: &mut ProcessorState<M>, pb: &mut OpParams) {
    let (result, borrow, overflow) = bcd_sub(pb.second as u8, pb.first as u8, s.sr.x);
    set_flags(s, result, borrow, overflow);
    pb.result = u32::from(result);
}

pub(super) fn nbcd<M: Memory>(s: &mut ProcessorState<M>, pb: &mut OpParams) {
    let (result, borrow, overflow) = bcd_sub(0, pb.second as u8, s.sr.x);
    set_flags(s, result, borrow, overflow);
    pb.result = u32::from(result);
}

#[cfg(test)]
mod tests {
    use super::{bcd_add, bcd_sub};
    use crate::flags::{C, Z};
    use crate::microcode::testing::{cpu, exec};
    use crate::model::ProcessorModel;

    #[test]
    fn add_carries_between_digits() {
        assert_eq!(bcd_add(0x01, 0x09, 0), (0x10, false, false));
        assert_eq!(bcd_add(0x01, 0x99, 0), (0x00, true, false));
        assert_eq!(bcd_add(0x45, 0x38, 1).0, 0x84);
    }

    #[test]
    fn sub_borrows_between_digits() {
        assert_eq!(bcd_sub(0x10, 0x01, 0), (0x09, false, false));
        assert_eq!(bcd_sub(0x00, 0x01, 0).0, 0x99);
        assert!(bcd_sub(0x00, 0x01, 0).1);
    }

    #[test]
    fn abcd_registers() {
        let mut s = cpu(ProcessorModel::Mc68000);
        s.set_ccr(Z);
        s.regs.d[0] = 0x01;
        s.regs.d[1] = 0x99;
        // ABCD D0,D1
        assert_eq!(exec(&mut s, &[0xC300]), Ok(()));
        assert_eq!(s.regs.d[1], 0x00);
        // Zero result leaves Z as it was.
        assert_eq!(s.get_ccr(), 0x10 | Z | C);
    }

    #[test]
    fn abcd_low_digit_adjust_leaves_carry_clear() {
        let mut s = cpu(ProcessorModel::Mc68000);
        s.set_ccr(Z);
        s.regs.d[0] = 0x01;
        s.regs.d[1] = 0x09;
        // ABCD D0,D1
        assert_eq!(exec(&mut s, &[0xC300]), Ok(()));
        assert_eq!(s.regs.d[1], 0x10);
        assert_eq!(s.get_ccr() & (0x10 | C), 0);
        assert_eq!(s.get_ccr() & Z, 0);
    }

    #[test]
    fn sbcd_predecrement() {
        let mut s = cpu(ProcessorModel::Mc68000);
        s.regs.a[0] = 0x2001;
        s.regs.a[1] = 0x3001;
        assert!(s.mem.load(0x2000, &[0x05]));
        assert!(s.mem.load(0x3000, &[0x23]));
        // SBCD -(A0),-(A1)
        assert_eq!(exec(&mut s, &[0x8308]), Ok(()));
        assert_eq!(s.mem.as_slice()[0x3000], 0x18);
        assert_eq!((s.regs.a[0], s.regs.a[1]), (0x2000, 0x3000));
    }

    #[test]
    fn nbcd_is_tens_complement() {
        let mut s = cpu(ProcessorModel::Mc68000);
        s.regs.d[0] = 0x25;
        // NBCD D0
        assert_eq!(exec(&mut s, &[0x4800]), Ok(()));
        assert_eq!(s.regs.d[0], 0x75);
        assert_eq!(s.get_ccr() & C, C);
    }
}
