//! Single-bit test and modify. The bit number arrives already reduced
//! modulo the operand width, and Z reflects the bit before modification.

use crate::params::OpParams;

pub(super) fn btst(pb: &mut OpParams) {
    pb.result = pb.second;
}

pub(super) fn bchg(pb: &mut OpParams) {
    pb.result = pb.second ^ (1 << pb.first);
}

pub(super) fn bclr(pb: &mut OpParams) {
    pb.result = pb.second & !(1 << pb.first);
}

pub(super) fn bset(pb: &mut OpParams) {
    pb.result = pb.second | (1 << pb.first);
}
