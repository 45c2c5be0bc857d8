//! Multiply and divide.
//!
//! The word forms flow through the usual commit path: the product or the
//! `remainder:quotient` pair is a long result in Dn. The 68020 long forms
//! name their registers in an extension word and write them directly.

use crate::fault::{Fault, OpResult};
use crate::flags::{C, N, V, Z};
use crate::memory::Memory;
use crate::params::{OpParams, OpSize};
use crate::state::ProcessorState;

pub(super) fn mulu(pb: &mut OpParams) {
    pb.result = (pb.second & 0xFFFF) * (pb.first & 0xFFFF);
    pb.size = OpSize::Long;
}

pub(super) fn muls(pb: &mut OpParams) {
    let product = i32::from(pb.second as i16) * i32::from(pb.first as i16);
    pb.result = product as u32;
    pb.size = OpSize::Long;
}

/// DIVU.W: 32-bit dividend in Dn, 16-bit divisor.
pub(super) fn divu(pb: &mut OpParams) -> OpResult {
    let divisor = pb.first & 0xFFFF;
    if divisor == 0 {
        pb.size = OpSize::Unsized;
        return Err(Fault::DivisionByZero);
    }

    let quotient = pb.second / divisor;
    if quotient > 0xFFFF {
        // Overflow: operands and flags stay as they were.
        pb.size = OpSize::Unsized;
        return Ok(());
    }

    let remainder = pb.second % divisor;
    pb.result = remainder << 16 | quotient;
    pb.size = OpSize::Long;
    Ok(())
}

/// DIVS.W. The remainder takes the sign of the dividend.
pub(super) fn divs(pb: &mut OpParams) -> OpResult {
    let divisor = i64::from(pb.first as i16);
    if divisor == 0 {
        pb.size = OpSize::Unsized;
        return Err(Fault::DivisionByZero);
    }

    let dividend = i64::from(pb.second as i32);
    let quotient = dividend / divisor;
    if i16::try_from(quotient).is_err() {
        pb.size = OpSize::Unsized;
        return Ok(());
    }

    let remainder = dividend % divisor;
    pb.result = (remainder as u32 & 0xFFFF) << 16 | (quotient as u32 & 0xFFFF);
    pb.size = OpSize::Long;
    Ok(())
}

/// Fields of the MULL/DIVL extension word.
struct LongForm {
    /// Dl (multiply) / Dq (divide), bits 14-12.
    low: usize,
    /// Dh / Dr, bits 2-0.
    high: usize,
    signed: bool,
    /// 64-bit product / dividend.
    quad: bool,
}

impl LongForm {
    fn decode(ext: u32) -> Self {
        Self {
            low: (ext >> 12) as usize & 7,
            high: ext as usize & 7,
            signed: ext & 0x0800 != 0,
            quad: ext & 0x0400 != 0,
        }
    }
}

/// MULU.L / MULS.L, 32x32 to 32 or 64 bits.
pub(super) fn mull<M: Memory>(s: &mut ProcessorState<M>, pb: &mut OpParams) {
    let form = LongForm::decode(pb.first);
    let multiplicand = s.regs.d[form.low];

    let (product, fits) = if form.signed {
        let product = i64::from(multiplicand as i32) * i64::from(pb.second as i32);
        (product as u64, i32::try_from(product).is_ok())
    } else {
        let product = u64::from(multiplicand) * u64::from(pb.second);
        (product, product >> 32 == 0)
    };

    let low = product as u32;
    if form.quad {
        s.regs.d[form.high] = (product >> 32) as u32;
        s.regs.d[form.low] = low;
        s.sr.set_flag(N, product >> 63 != 0);
        s.sr.set_flag(Z, product == 0);
        s.sr.set_flag(V, false);
    } else {
        s.regs.d[form.low] = low;
        s.sr.set_flag(N, low >> 31 != 0);
        s.sr.set_flag(Z, low == 0);
        s.sr.set_flag(V, !fits);
    }
    s.sr.set_flag(C, false);
}

/// DIVU.L / DIVS.L with a 32- or 64-bit dividend. Dr receives the
/// remainder, then Dq the quotient (so Dr == Dq keeps only the quotient).
pub(super) fn divl<M: Memory>(s: &mut ProcessorState<M>, pb: &mut OpParams) -> OpResult {
    let form = LongForm::decode(pb.first);
    if pb.second == 0 {
        return Err(Fault::DivisionByZero);
    }

    let low = s.regs.d[form.low];
    let high = s.regs.d[form.high];

    let (quotient, remainder) = if form.signed {
        let dividend = if form.quad {
            i128::from((u64::from(high) << 32 | u64::from(low)) as i64)
        } else {
            i128::from(low as i32)
        };
        let divisor = i128::from(pb.second as i32);
        let quotient = dividend / divisor;
        let Ok(quotient) = i32::try_from(quotient) else {
            return Ok(());
        };
        (quotient as u32, (dividend % divisor) as u32)
    } else {
        let dividend = if form.quad { u64::from(high) << 32 | u64::from(low) } else { u64::from(low) };
        let divisor = u64::from(pb.second);
        let Ok(quotient) = u32::try_from(dividend / divisor) else {
            return Ok(());
        };
        (quotient, (dividend % divisor) as u32)
    };

    s.regs.d[form.high] = remainder;
    s.regs.d[form.low] = quotient;
    s.sr.set_flag(N, quotient >> 31 != 0);
    s.sr.set_flag(Z, quotient == 0);
    s.sr.set_flag(V, false);
    s.sr.set_flag(C, false);
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::fault::Fault;
    use crate::flags::{C, N, V, Z};
    use crate::microcode::testing::{cpu, exec};
    use crate::model::ProcessorModel;

    #[test]
    fn divu_by_zero_commits_nothing() {
        let mut s = cpu(ProcessorModel::Mc68000);
        s.regs.d[0] = 10;
        s.regs.d[1] = 0;
        s.set_ccr(0x1F);
        // DIVU.W D1,D0
        assert_eq!(exec(&mut s, &[0x80C1]), Err(Fault::DivisionByZero));
        assert_eq!(s.regs.d[0], 10);
        assert_eq!(s.get_ccr(), 0x1F);
    }

    #[test]
    fn divu_packs_remainder_and_quotient() {
        let mut s = cpu(ProcessorModel::Mc68000);
        s.regs.d[0] = 100_003;
        s.regs.d[1] = 10;
        assert_eq!(exec(&mut s, &[0x80C1]), Ok(()));
        assert_eq!(s.regs.d[0], 3 << 16 | 10_000);
        assert_eq!(s.get_ccr(), 0);
    }

    #[test]
    fn divs_overflow_leaves_destination_and_flags() {
        let mut s = cpu(ProcessorModel::Mc68000);
        s.regs.d[0] = 0x1_0000;
        s.regs.d[1] = 1;
        s.set_ccr(Z);
        // DIVS.W D1,D0
        assert_eq!(exec(&mut s, &[0x81C1]), Ok(()));
        assert_eq!(s.regs.d[0], 0x1_0000);
        assert_eq!(s.get_ccr(), Z);
    }

    #[test]
    fn divs_remainder_follows_dividend_sign() {
        let mut s = cpu(ProcessorModel::Mc68000);
        s.regs.d[0] = (-7i32) as u32;
        s.regs.d[1] = 2;
        assert_eq!(exec(&mut s, &[0x81C1]), Ok(()));
        // quotient -3 ($FFFD), remainder -1 ($FFFF)
        assert_eq!(s.regs.d[0], 0xFFFF_FFFD);
        assert_eq!(s.get_ccr(), N);
    }

    #[test]
    fn muls_word_is_signed_long_result() {
        let mut s = cpu(ProcessorModel::Mc68000);
        s.regs.d[0] = 0xFFFF; // -1
        s.regs.d[1] = 0x0002;
        // MULS.W D1,D0
        assert_eq!(exec(&mut s, &[0xC1C1]), Ok(()));
        assert_eq!(s.regs.d[0], 0xFFFF_FFFE);
        assert_eq!(s.get_ccr(), N);
    }

    #[test]
    fn mulu_long_64_bit_product() {
        let mut s = cpu(ProcessorModel::Mc68020);
        s.regs.d[0] = 0xFFFF_FFFF;
        s.regs.d[1] = 2;
        // MULU.L D1,D2:D0
        assert_eq!(exec(&mut s, &[0x4C01, 0x0402]), Ok(()));
        assert_eq!((s.regs.d[2], s.regs.d[0]), (1, 0xFFFF_FFFE));
        assert_eq!(s.get_ccr() & (V | C), 0);
    }

    #[test]
    fn muls_long_32_bit_overflow_sets_v() {
        let mut s = cpu(ProcessorModel::Mc68020);
        s.regs.d[0] = 0x4000_0000;
        s.regs.d[1] = 4;
        // MULS.L D1,D0
        assert_eq!(exec(&mut s, &[0x4C01, 0x0800]), Ok(()));
        assert_eq!(s.regs.d[0], 0);
        assert_eq!(s.get_ccr(), Z | V);
    }

    #[test]
    fn divu_long_64_bit_dividend() {
        let mut s = cpu(ProcessorModel::Mc68020);
        s.regs.d[1] = 1; // high
        s.regs.d[0] = 5; // low
        s.regs.d[2] = 2;
        // DIVU.L D2,D1:D0
        assert_eq!(exec(&mut s, &[0x4C42, 0x0401]), Ok(()));
        assert_eq!(s.regs.d[0], 0x8000_0002);
        assert_eq!(s.regs.d[1], 1);
        assert_eq!(s.get_ccr(), N);
    }

    #[test]
    fn divs_long_by_zero_traps() {
        let mut s = cpu(ProcessorModel::Mc68020);
        s.regs.d[0] = 5;
        // DIVS.L D2,D0 with D2 = 0
        assert_eq!(exec(&mut s, &[0x4C42, 0x0800]), Err(Fault::DivisionByZero));
        assert_eq!(s.regs.d[0], 5);
    }
}
