//! Logical operations, data movement within registers, sign extension.

use crate::flags::{C, N, V, Z};
use crate::memory::Memory;
use crate::params::OpParams;
use crate::state::ProcessorState;

pub(super) fn or(pb: &mut OpParams) {
    pb.result = pb.first | pb.second;
}

pub(super) fn and(pb: &mut OpParams) {
    pb.result = pb.first & pb.second;
}

pub(super) fn eor(pb: &mut OpParams) {
    pb.result = pb.first ^ pb.second;
}

pub(super) fn not(pb: &mut OpParams) {
    pb.result = !pb.second;
}

pub(super) fn clr(pb: &mut OpParams) {
    pb.result = 0;
}

/// MOVE, MOVEA, MOVEQ and TST: the source is the result.
pub(super) fn copy(pb: &mut OpParams) {
    pb.result = pb.first;
}

pub(super) fn swap(pb: &mut OpParams) {
    pb.result = pb.second.rotate_left(16);
}

pub(super) fn ext_w(pb: &mut OpParams) {
    pb.result = u32::from(pb.second as u8 as i8 as i16 as u16);
}

pub(super) fn ext_l(pb: &mut OpParams) {
    pb.result = pb.second as u16 as i16 as i32 as u32;
}

pub(super) fn extb(pb: &mut OpParams) {
    pb.result = pb.second as u8 as i8 as i32 as u32;
}

/// Test the byte, then set its top bit.
pub(super) fn tas<M: Memory>(s: &mut ProcessorState<M>, pb: &mut OpParams) {
    let value = pb.second & 0xFF;
    s.sr.set_flag(N, value & 0x80 != 0);
    s.sr.set_flag(Z, value == 0);
    s.sr.set_flag(V, false);
    s.sr.set_flag(C, false);
    pb.result = value | 0x80;
}
