//! Shifts and rotates, register and memory forms.
//!
//! Everything is widened to 64 bits so counts up to 63 (Dn modulo 64) never
//! overflow the shift operator.

use crate::flags::{C, N, V, Z};
use crate::memory::Memory;
use crate::params::OpParams;
use crate::state::ProcessorState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Shift {
    Asl,
    Asr,
    Lsl,
    Lsr,
    Roxl,
    Roxr,
    Rol,
    Ror,
}

impl Shift {
    fn through_extend(self) -> bool {
        matches!(self, Self::Roxl | Self::Roxr)
    }

    /// ROL/ROR leave X alone.
    fn sets_extend(self) -> bool {
        !matches!(self, Self::Rol | Self::Ror)
    }
}

/// `pb.second` shifted by `pb.first` (0-63) at `pb.size`.
pub(super) fn shift<M: Memory>(s: &mut ProcessorState<M>, pb: &mut OpParams, kind: Shift) {
    let bits = u64::from(pb.size.bits());
    let mask = u64::from(pb.size.mask());
    let msb = 1u64 << (bits - 1);
    let data = u64::from(pb.second) & mask;
    let count = u64::from(pb.first);
    let extend = s.sr.x != 0;

    if count == 0 {
        pb.result = data as u32;
        s.sr.set_flag(N, data & msb != 0);
        s.sr.set_flag(Z, data == 0);
        s.sr.set_flag(V, false);
        s.sr.set_flag(C, kind.through_extend() && extend);
        return;
    }

    let (result, carry, overflow) = match kind {
        Shift::Asl | Shift::Lsl => {
            let shifted = data << count;
            let carry = (shifted >> bits) & 1 != 0;
            let overflow = kind == Shift::Asl && {
                if count >= bits {
                    data != 0
                } else {
                    // The top count+1 bits must agree for the sign to survive.
                    let top = mask & !(mask >> (count + 1));
                    let seen = data & top;
                    seen != 0 && seen != top
                }
            };
            (shifted & mask, carry, overflow)
        }
        Shift::Lsr => {
            let carry = (data >> (count - 1)) & 1 != 0;
            (data >> count, carry, false)
        }
        Shift::Asr => {
            let signed = if data & msb != 0 { (data | !mask) as i64 } else { data as i64 };
            let carry = (signed >> (count - 1)) & 1 != 0;
            ((signed >> count) as u64 & mask, carry, false)
        }
        Shift::Rol => {
            let n = count % bits;
            let result = ((data << n) | (data >> (bits - n))) & mask;
            (result, result & 1 != 0, false)
        }
        Shift::Ror => {
            let n = count % bits;
            let result = ((data >> n) | (data << (bits - n))) & mask;
            (result, result & msb != 0, false)
        }
        Shift::Roxl | Shift::Roxr => {
            let width = bits + 1;
            let full = (1u64 << width) - 1;
            let n = count % width;
            let value = u64::from(extend) << bits | data;
            let rotated = if kind == Shift::Roxl {
                ((value << n) | (value >> (width - n))) & full
            } else {
                ((value >> n) | (value << (width - n))) & full
            };
            (rotated & mask, rotated >> bits != 0, false)
        }
    };

    pb.result = result as u32;
    s.sr.set_flag(N, result & msb != 0);
    s.sr.set_flag(Z, result == 0);
    s.sr.set_flag(V, overflow);
    if kind.sets_extend() {
        s.sr.set_carry_and_extend(carry);
    } else {
        s.sr.set_flag(C, carry);
    }
}
