//! Opcode decode.
//!
//! Every one of the 65 536 opcode words maps to an [`Instruction`]
//! descriptor (or to nothing, for illegal encodings). The table is built
//! once on first use and shared by every emulator in the process.
//!
//! A descriptor says which semantics routine runs ([`Op`]), how its operands
//! are fetched and where the result goes ([`Form`]), how the condition codes
//! are derived afterwards ([`CcrUpdate`]) and which models / privilege level
//! may execute it.

use std::sync::OnceLock;

use crate::ea::AddrMode;
use crate::model::ProcessorModel;
use crate::params::OpSize;

/// Semantics routine selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Op {
    OriToCcr,
    OriToSr,
    AndiToCcr,
    AndiToSr,
    EoriToCcr,
    EoriToSr,
    Or,
    And,
    Eor,
    Not,
    Add,
    Sub,
    Cmp,
    Addx,
    Subx,
    Neg,
    Negx,
    Clr,
    Move,
    Tst,
    Btst,
    Bchg,
    Bclr,
    Bset,
    MovepToReg,
    MovepToMem,
    Moves,
    Movec,
    MoveFromSr,
    MoveFromCcr,
    MoveToCcr,
    MoveToSr,
    MoveToUsp,
    MoveFromUsp,
    Abcd,
    Sbcd,
    Nbcd,
    Swap,
    ExtW,
    ExtL,
    Extb,
    Link,
    Unlk,
    Pea,
    Lea,
    MovemToMem,
    MovemToRegs,
    Tas,
    Illegal,
    Reset,
    Nop,
    Stop,
    Rte,
    Rtd,
    Rts,
    Trapv,
    Rtr,
    Trap,
    Trapcc,
    Bkpt,
    Jsr,
    Jmp,
    Chk,
    Mulu,
    Muls,
    Divu,
    Divs,
    Mull,
    Divl,
    Scc,
    Dbcc,
    Bcc,
    Bsr,
    Exg,
    Asl,
    Asr,
    Lsl,
    Lsr,
    Roxl,
    Roxr,
    Rol,
    Ror,
    LineA,
    LineF,
}

/// Operand layout: what is fetched into the parameter record and where the
/// result is committed. Field positions are read from the opcode at fetch
/// time (`reg9` = bits 11-9, `ea` = bits 5-0, `reg0` = bits 2-0).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Form {
    /// No operands.
    Implied,
    /// first = extension word.
    ImmWord,
    /// first = sign-extended extension word.
    ImmSignedWord,
    /// first = MOVEC extension word, second = direction (1 = to control).
    Control,
    /// first = #imm, second = ea; result to ea.
    ImmEa,
    /// first = Dn(reg9) bit number, second = ea.
    BitDynamic,
    /// first = #imm bit number, second = ea.
    BitStatic,
    /// address = (d16,An(reg0)), target = Dn(reg9).
    Movep,
    /// first = extension word, address = ea.
    Moves,
    /// first = source ea; result to destination ea (bits 11-6).
    Move,
    /// first = sign-extended source ea; result to An(reg9).
    MoveAddr,
    /// second = ea; result to ea.
    Unary,
    /// first = ea.
    EaRead,
    /// result to ea, nothing read.
    EaWrite,
    /// second = condition (bits 11-8); result to ea.
    Condition,
    /// address = control ea.
    EaAddress,
    /// address = control ea; result to An(reg9).
    Lea,
    /// second = Dn(reg0), target = reg0; result to Dn(reg0).
    DataReg,
    /// target = An(reg0).
    AddrReg,
    /// target = An(reg0), first = 16-bit displacement.
    Link,
    /// target = An(reg0), first = 32-bit displacement.
    LinkLong,
    /// first = low four opcode bits.
    Vector,
    /// first = register mask, address = ea, target = An for -(An).
    MovemToMem,
    /// first = register mask, address = ea, target = An for (An)+.
    MovemToRegs,
    /// first = extension word, second = ea (long).
    MulDivLong,
    /// first = ea, second = Dn(reg9); result to Dn(reg9).
    EaToReg,
    /// first = Dn(reg9), second = ea; result to ea.
    RegToEa,
    /// first = sign-extended ea, second = An(reg9); result to An(reg9).
    EaToAddr,
    /// first = 1-8 from reg9, second = ea; result to ea.
    Quick,
    /// second = condition, target = Dn(reg0), address = branch target.
    DecrementBranch,
    /// second = condition; skips 0-2 operand words.
    TrapCondition,
    /// second = condition, address = branch target.
    Branch,
    /// first = sign-extended low byte; result to Dn(reg9).
    MoveQuick,
    /// Dy,Dx or -(Ay),-(Ax): first = y, second = x; result to x.
    Extended,
    /// (Ay)+,(Ax)+: first = y, second = x.
    CompareMemory,
    /// first, second = register indices to swap.
    Exchange,
    /// first = shift count, second = Dn(reg0); result to Dn(reg0).
    ShiftRegister,
    /// first = 1, second = ea word; result to ea.
    ShiftMemory,
}

/// How N/Z/V/C/X are derived from the parameter record after a successful
/// operation. `None` means the semantics routine owns the flags (or the
/// instruction leaves them alone).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CcrUpdate {
    None,
    /// N, Z from result; V, C cleared.
    Logic,
    Add,
    /// ADDX: Z only ever cleared.
    AddExtended,
    Sub,
    SubExtended,
    /// Like Sub, but X untouched.
    Compare,
    /// N, Z from the low (quotient) word; V, C cleared.
    Quotient,
    /// Z = tested bit clear.
    BitZ,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Instruction {
    pub op: Op,
    pub form: Form,
    pub size: OpSize,
    pub ccr: CcrUpdate,
    /// Result is written back to the form's destination.
    pub commit: bool,
    /// First model that implements the encoding.
    pub since: ProcessorModel,
    /// Supervisor-only from this model on.
    pub privileged_since: Option<ProcessorModel>,
}

impl Instruction {
    const fn new(op: Op, form: Form, size: OpSize) -> Self {
        Self {
            op,
            form,
            size,
            ccr: CcrUpdate::None,
            commit: false,
            since: ProcessorModel::Mc68000,
            privileged_since: None,
        }
    }

    const fn ccr(mut self, ccr: CcrUpdate) -> Self {
        self.ccr = ccr;
        self
    }

    const fn commit(mut self) -> Self {
        self.commit = true;
        self
    }

    const fn since(mut self, model: ProcessorModel) -> Self {
        self.since = model;
        self
    }

    const fn privileged(self) -> Self {
        self.privileged_since(ProcessorModel::Mc68000)
    }

    const fn privileged_since(mut self, model: ProcessorModel) -> Self {
        self.privileged_since = Some(model);
        self
    }

    /// Whether `model` in user mode must take a privilege violation.
    pub fn is_privileged_on(&self, model: ProcessorModel) -> bool {
        self.privileged_since.is_some_and(|since| model >= since)
    }
}

use CcrUpdate as Ccr;
use Instruction as I;
use OpSize::{Byte, Long, Unsized, Word};
use ProcessorModel::{Mc68010, Mc68020};

static TABLE: OnceLock<Box<[Option<Instruction>]>> = OnceLock::new();

/// Descriptor for `opcode`, or `None` if the encoding is illegal on every
/// model.
pub(crate) fn lookup(opcode: u16) -> Option<Instruction> {
    let table = TABLE.get_or_init(|| (0..=u16::MAX).map(decode).collect());
    table.get(usize::from(opcode)).copied().flatten()
}

/// Build the descriptor for one opcode word.
pub(crate) fn decode(op: u16) -> Option<Instruction> {
    match op >> 12 {
        0x0 => decode_line_0(op),
        0x1..=0x3 => decode_move(op),
        0x4 => decode_line_4(op),
        0x5 => decode_line_5(op),
        0x6 => Some(decode_branch(op)),
        0x7 => decode_moveq(op),
        0x8 => decode_line_8(op),
        0x9 | 0xD => decode_add_sub(op),
        0xA => Some(I::new(Op::LineA, Form::Implied, Unsized)),
        0xB => decode_line_b(op),
        0xC => decode_line_c(op),
        0xE => decode_shift(op),
        _ => Some(I::new(Op::LineF, Form::Implied, Unsized)),
    }
}

fn ea(op: u16) -> Option<AddrMode> {
    AddrMode::from_opcode(op)
}

fn is_register_pair(mode: AddrMode) -> bool {
    matches!(mode, AddrMode::DataReg(_) | AddrMode::AddrReg(_))
}

/// ORI/ANDI/SUBI/ADDI/EORI/CMPI/BTST#/MOVEP/bit ops/MOVES.
fn decode_line_0(op: u16) -> Option<Instruction> {
    match op {
        0x003C => return Some(I::new(Op::OriToCcr, Form::ImmWord, Byte)),
        0x007C => return Some(I::new(Op::OriToSr, Form::ImmWord, Word).privileged()),
        0x023C => return Some(I::new(Op::AndiToCcr, Form::ImmWord, Byte)),
        0x027C => return Some(I::new(Op::AndiToSr, Form::ImmWord, Word).privileged()),
        0x0A3C => return Some(I::new(Op::EoriToCcr, Form::ImmWord, Byte)),
        0x0A7C => return Some(I::new(Op::EoriToSr, Form::ImmWord, Word).privileged()),
        _ => {}
    }

    let mode = ea(op)?;

    if op & 0x0100 != 0 {
        if let AddrMode::AddrReg(_) = mode {
            let size = if op & 0x0040 != 0 { Long } else { Word };
            let kind = if op & 0x0080 != 0 { Op::MovepToMem } else { Op::MovepToReg };
            return Some(I::new(kind, Form::Movep, size));
        }
        return bit_op(op, mode, Form::BitDynamic);
    }

    match (op >> 9) & 7 {
        0 => immediate_op(op, Op::Or, mode, Ccr::Logic),
        1 => immediate_op(op, Op::And, mode, Ccr::Logic),
        2 => immediate_op(op, Op::Sub, mode, Ccr::Sub),
        3 => immediate_op(op, Op::Add, mode, Ccr::Add),
        4 => bit_op(op, mode, Form::BitStatic),
        5 => immediate_op(op, Op::Eor, mode, Ccr::Logic),
        6 => {
            let size = OpSize::from_bits(op >> 6)?;
            let since = if mode.is_data_alterable() {
                ProcessorModel::Mc68000
            } else if mode.is_pc_relative() {
                Mc68020
            } else {
                return None;
            };
            Some(I::new(Op::Cmp, Form::ImmEa, size).ccr(Ccr::Compare).since(since))
        }
        _ => {
            let size = OpSize::from_bits(op >> 6)?;
            if !mode.is_memory_alterable() {
                return None;
            }
            Some(I::new(Op::Moves, Form::Moves, size).since(Mc68010).privileged())
        }
    }
}

fn immediate_op(op: u16, kind: Op, mode: AddrMode, ccr: CcrUpdate) -> Option<Instruction> {
    let size = OpSize::from_bits(op >> 6)?;
    if !mode.is_data_alterable() {
        return None;
    }
    Some(I::new(kind, Form::ImmEa, size).ccr(ccr).commit())
}

fn bit_op(op: u16, mode: AddrMode, form: Form) -> Option<Instruction> {
    let kind = match (op >> 6) & 3 {
        0 => Op::Btst,
        1 => Op::Bchg,
        2 => Op::Bclr,
        _ => Op::Bset,
    };

    let valid = match (kind, form) {
        (Op::Btst, Form::BitDynamic) => mode.is_data(),
        (Op::Btst, _) => mode.is_data() && mode != AddrMode::Immediate,
        _ => mode.is_data_alterable(),
    };
    if !valid {
        return None;
    }

    let size = if matches!(mode, AddrMode::DataReg(_)) { Long } else { Byte };
    let instruction = I::new(kind, form, size).ccr(Ccr::BitZ);
    Some(if kind == Op::Btst { instruction } else { instruction.commit() })
}

/// MOVE and MOVEA.
fn decode_move(op: u16) -> Option<Instruction> {
    let size = OpSize::from_move_bits(op >> 12)?;
    let src = ea(op)?;
    let dst = AddrMode::decode((op >> 6) as u8, (op >> 9) as u8)?;

    if size == Byte && matches!(src, AddrMode::AddrReg(_)) {
        return None;
    }

    if let AddrMode::AddrReg(_) = dst {
        if size == Byte {
            return None;
        }
        return Some(I::new(Op::Move, Form::MoveAddr, size).commit());
    }

    if !dst.is_data_alterable() {
        return None;
    }
    Some(I::new(Op::Move, Form::Move, size).ccr(Ccr::Logic).commit())
}

/// Miscellaneous: the 0100 line.
fn decode_line_4(op: u16) -> Option<Instruction> {
    match op {
        0x4AFC => return Some(I::new(Op::Illegal, Form::Implied, Unsized)),
        0x4E70 => return Some(I::new(Op::Reset, Form::Implied, Unsized).privileged()),
        0x4E71 => return Some(I::new(Op::Nop, Form::Implied, Unsized)),
        0x4E72 => return Some(I::new(Op::Stop, Form::ImmWord, Unsized).privileged()),
        0x4E73 => return Some(I::new(Op::Rte, Form::Implied, Unsized).privileged()),
        0x4E74 => return Some(I::new(Op::Rtd, Form::ImmSignedWord, Unsized).since(Mc68010)),
        0x4E75 => return Some(I::new(Op::Rts, Form::Implied, Unsized)),
        0x4E76 => return Some(I::new(Op::Trapv, Form::Implied, Unsized)),
        0x4E77 => return Some(I::new(Op::Rtr, Form::Implied, Unsized)),
        0x4E7A | 0x4E7B => {
            return Some(I::new(Op::Movec, Form::Control, Unsized).since(Mc68010).privileged());
        }
        _ => {}
    }

    match op & 0xFFF8 {
        0x4808 => return Some(I::new(Op::Link, Form::LinkLong, Unsized).since(Mc68020)),
        0x4840 => return Some(I::new(Op::Swap, Form::DataReg, Long).ccr(Ccr::Logic).commit()),
        0x4848 => return Some(I::new(Op::Bkpt, Form::Vector, Unsized).since(Mc68010)),
        0x4880 => return Some(I::new(Op::ExtW, Form::DataReg, Word).ccr(Ccr::Logic).commit()),
        0x48C0 => return Some(I::new(Op::ExtL, Form::DataReg, Long).ccr(Ccr::Logic).commit()),
        0x49C0 => {
            return Some(I::new(Op::Extb, Form::DataReg, Long).ccr(Ccr::Logic).commit().since(Mc68020));
        }
        0x4E50 => return Some(I::new(Op::Link, Form::Link, Unsized)),
        0x4E58 => return Some(I::new(Op::Unlk, Form::AddrReg, Unsized)),
        0x4E60 => return Some(I::new(Op::MoveToUsp, Form::AddrReg, Unsized).privileged()),
        0x4E68 => return Some(I::new(Op::MoveFromUsp, Form::AddrReg, Unsized).privileged()),
        _ => {}
    }

    if op & 0xFFF0 == 0x4E40 {
        return Some(I::new(Op::Trap, Form::Vector, Unsized));
    }

    let mode = ea(op)?;

    if op & 0x0100 != 0 {
        return match (op >> 6) & 3 {
            3 if mode.is_control() => Some(I::new(Op::Lea, Form::Lea, Long).commit()),
            2 if mode.is_data() => Some(I::new(Op::Chk, Form::EaToReg, Word)),
            0 if mode.is_data() => Some(I::new(Op::Chk, Form::EaToReg, Long).since(Mc68020)),
            _ => None,
        };
    }

    let size = OpSize::from_bits(op >> 6);
    match (op >> 6) & 0x3F {
        0x00..=0x02 if mode.is_data_alterable() => {
            Some(I::new(Op::Negx, Form::Unary, size?).ccr(Ccr::SubExtended).commit())
        }
        0x03 if mode.is_data_alterable() => {
            Some(I::new(Op::MoveFromSr, Form::EaWrite, Word).commit().privileged_since(Mc68010))
        }
        0x08..=0x0A if mode.is_data_alterable() => {
            Some(I::new(Op::Clr, Form::EaWrite, size?).ccr(Ccr::Logic).commit())
        }
        0x0B if mode.is_data_alterable() => {
            Some(I::new(Op::MoveFromCcr, Form::EaWrite, Word).commit().since(Mc68010))
        }
        0x10..=0x12 if mode.is_data_alterable() => Some(I::new(Op::Neg, Form::Unary, size?).ccr(Ccr::Sub).commit()),
        0x13 if mode.is_data() => Some(I::new(Op::MoveToCcr, Form::EaRead, Word)),
        0x18..=0x1A if mode.is_data_alterable() => Some(I::new(Op::Not, Form::Unary, size?).ccr(Ccr::Logic).commit()),
        0x1B if mode.is_data() => Some(I::new(Op::MoveToSr, Form::EaRead, Word).privileged()),
        0x20 if mode.is_data_alterable() => Some(I::new(Op::Nbcd, Form::Unary, Byte).commit()),
        0x21 if mode.is_control() => Some(I::new(Op::Pea, Form::EaAddress, Long)),
        0x22 | 0x23 if mode.is_control_alterable() || matches!(mode, AddrMode::AddrIndPreDec(_)) => {
            let size = if op & 0x0040 != 0 { Long } else { Word };
            Some(I::new(Op::MovemToMem, Form::MovemToMem, size))
        }
        0x28..=0x2A => {
            let size = size?;
            let since = match mode {
                AddrMode::AddrReg(_) if size == Byte => return None,
                AddrMode::AddrReg(_) | AddrMode::PcDisp | AddrMode::PcIndex | AddrMode::Immediate => Mc68020,
                _ => ProcessorModel::Mc68000,
            };
            Some(I::new(Op::Tst, Form::EaRead, size).ccr(Ccr::Logic).since(since))
        }
        0x2B if mode.is_data_alterable() => Some(I::new(Op::Tas, Form::Unary, Byte).commit()),
        0x30 if mode.is_data() => Some(I::new(Op::Mull, Form::MulDivLong, Long).since(Mc68020)),
        0x31 if mode.is_data() => Some(I::new(Op::Divl, Form::MulDivLong, Long).since(Mc68020)),
        0x32 | 0x33 if mode.is_control() || matches!(mode, AddrMode::AddrIndPostInc(_)) => {
            let size = if op & 0x0040 != 0 { Long } else { Word };
            Some(I::new(Op::MovemToRegs, Form::MovemToRegs, size))
        }
        0x3A if mode.is_control() => Some(I::new(Op::Jsr, Form::EaAddress, Unsized)),
        0x3B if mode.is_control() => Some(I::new(Op::Jmp, Form::EaAddress, Unsized)),
        _ => None,
    }
}

/// ADDQ/SUBQ/Scc/DBcc/TRAPcc.
fn decode_line_5(op: u16) -> Option<Instruction> {
    if (op >> 6) & 3 == 3 {
        let mode_bits = (op >> 3) & 7;
        let reg = op & 7;
        if mode_bits == 1 {
            return Some(I::new(Op::Dbcc, Form::DecrementBranch, Word));
        }
        if mode_bits == 7 && (2..=4).contains(&reg) {
            return Some(I::new(Op::Trapcc, Form::TrapCondition, Unsized).since(Mc68020));
        }
        let mode = ea(op)?;
        if !mode.is_data_alterable() {
            return None;
        }
        return Some(I::new(Op::Scc, Form::Condition, Byte).commit());
    }

    let size = OpSize::from_bits(op >> 6)?;
    let mode = ea(op)?;
    let (kind, ccr) = if op & 0x0100 == 0 { (Op::Add, Ccr::Add) } else { (Op::Sub, Ccr::Sub) };

    match mode {
        AddrMode::AddrReg(_) if size == Byte => None,
        // Address register destinations take the whole register, flags
        // untouched.
        AddrMode::AddrReg(_) => Some(I::new(kind, Form::Quick, Long).commit()),
        _ if mode.is_data_alterable() => Some(I::new(kind, Form::Quick, size).ccr(ccr).commit()),
        _ => None,
    }
}

/// BRA/BSR/Bcc.
fn decode_branch(op: u16) -> Instruction {
    let kind = if (op >> 8) & 0xF == 1 { Op::Bsr } else { Op::Bcc };
    I::new(kind, Form::Branch, Unsized)
}

fn decode_moveq(op: u16) -> Option<Instruction> {
    if op & 0x0100 != 0 {
        return None;
    }
    Some(I::new(Op::Move, Form::MoveQuick, Long).ccr(Ccr::Logic).commit())
}

/// OR/DIVU/DIVS/SBCD.
fn decode_line_8(op: u16) -> Option<Instruction> {
    let mode = ea(op)?;
    match (op >> 6) & 7 {
        3 => divide(Op::Divu, mode),
        7 => divide(Op::Divs, mode),
        4 if is_register_pair(mode) => Some(I::new(Op::Sbcd, Form::Extended, Byte).commit()),
        // PACK/UNPK
        5 | 6 if is_register_pair(mode) => None,
        _ => logic_op(op, Op::Or, mode),
    }
}

fn divide(kind: Op, mode: AddrMode) -> Option<Instruction> {
    mode.is_data()
        .then(|| I::new(kind, Form::EaToReg, Word).ccr(Ccr::Quotient).commit())
}

fn logic_op(op: u16, kind: Op, mode: AddrMode) -> Option<Instruction> {
    let size = OpSize::from_bits(op >> 6)?;
    let form = if op & 0x0100 == 0 {
        if !mode.is_data() {
            return None;
        }
        Form::EaToReg
    } else {
        if !mode.is_memory_alterable() {
            return None;
        }
        Form::RegToEa
    };
    Some(I::new(kind, form, size).ccr(Ccr::Logic).commit())
}

/// ADD/ADDA/ADDX and SUB/SUBA/SUBX.
fn decode_add_sub(op: u16) -> Option<Instruction> {
    let add = op >> 12 == 0xD;
    let mode = ea(op)?;
    let opmode = (op >> 6) & 7;

    match opmode {
        3 | 7 => {
            let size = if opmode == 3 { Word } else { Long };
            let kind = if add { Op::Add } else { Op::Sub };
            Some(I::new(kind, Form::EaToAddr, size).commit())
        }
        4..=6 if is_register_pair(mode) => {
            let size = OpSize::from_bits(opmode)?;
            let (kind, ccr) = if add {
                (Op::Addx, Ccr::AddExtended)
            } else {
                (Op::Subx, Ccr::SubExtended)
            };
            Some(I::new(kind, Form::Extended, size).ccr(ccr).commit())
        }
        _ => {
            let size = OpSize::from_bits(opmode)?;
            let (kind, ccr) = if add { (Op::Add, Ccr::Add) } else { (Op::Sub, Ccr::Sub) };
            let form = if opmode < 4 {
                if size == Byte && matches!(mode, AddrMode::AddrReg(_)) {
                    return None;
                }
                Form::EaToReg
            } else {
                if !mode.is_memory_alterable() {
                    return None;
                }
                Form::RegToEa
            };
            Some(I::new(kind, form, size).ccr(ccr).commit())
        }
    }
}

/// CMP/CMPA/CMPM/EOR.
fn decode_line_b(op: u16) -> Option<Instruction> {
    let mode = ea(op)?;
    let opmode = (op >> 6) & 7;

    match opmode {
        3 | 7 => {
            let size = if opmode == 3 { Word } else { Long };
            Some(I::new(Op::Cmp, Form::EaToAddr, size).ccr(Ccr::Compare))
        }
        0..=2 => {
            let size = OpSize::from_bits(opmode)?;
            if size == Byte && matches!(mode, AddrMode::AddrReg(_)) {
                return None;
            }
            Some(I::new(Op::Cmp, Form::EaToReg, size).ccr(Ccr::Compare))
        }
        _ => {
            let size = OpSize::from_bits(opmode)?;
            if let AddrMode::AddrReg(_) = mode {
                return Some(I::new(Op::Cmp, Form::CompareMemory, size).ccr(Ccr::Compare));
            }
            if !mode.is_data_alterable() {
                return None;
            }
            Some(I::new(Op::Eor, Form::RegToEa, size).ccr(Ccr::Logic).commit())
        }
    }
}

/// AND/MULU/MULS/ABCD/EXG.
fn decode_line_c(op: u16) -> Option<Instruction> {
    let mode = ea(op)?;
    match ((op >> 6) & 7, mode) {
        (3, _) if mode.is_data() => Some(I::new(Op::Mulu, Form::EaToReg, Word).ccr(Ccr::Logic).commit()),
        (7, _) if mode.is_data() => Some(I::new(Op::Muls, Form::EaToReg, Word).ccr(Ccr::Logic).commit()),
        (3 | 7, _) => None,
        (4, _) if is_register_pair(mode) => Some(I::new(Op::Abcd, Form::Extended, Byte).commit()),
        (5, AddrMode::DataReg(_) | AddrMode::AddrReg(_)) | (6, AddrMode::AddrReg(_)) => {
            Some(I::new(Op::Exg, Form::Exchange, Unsized))
        }
        _ => logic_op(op, Op::And, mode),
    }
}

/// ASd/LSd/ROXd/ROd, register and memory forms.
fn decode_shift(op: u16) -> Option<Instruction> {
    let left = op & 0x0100 != 0;
    let kind = |ty: u16| match (ty & 3, left) {
        (0, false) => Op::Asr,
        (0, true) => Op::Asl,
        (1, false) => Op::Lsr,
        (1, true) => Op::Lsl,
        (2, false) => Op::Roxr,
        (2, true) => Op::Roxl,
        (_, false) => Op::Ror,
        (_, true) => Op::Rol,
    };

    if (op >> 6) & 3 == 3 {
        // Bit field instructions live at 1110 1xxx 11.
        if op & 0x0800 != 0 {
            return None;
        }
        let mode = ea(op)?;
        if !mode.is_memory_alterable() {
            return None;
        }
        return Some(I::new(kind(op >> 9), Form::ShiftMemory, Word).commit());
    }

    let size = OpSize::from_bits(op >> 6)?;
    Some(I::new(kind(op >> 3), Form::ShiftRegister, size).commit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op_of(opcode: u16) -> Option<Op> {
        lookup(opcode).map(|i| i.op)
    }

    #[test]
    fn table_agrees_with_direct_decode() {
        for opcode in [0x4E71, 0x0000, 0xD081, 0x4AFC, 0xFFFF, 0x7001] {
            assert_eq!(lookup(opcode), decode(opcode));
        }
    }

    #[test]
    fn common_opcodes() {
        assert_eq!(op_of(0x4E71), Some(Op::Nop));
        assert_eq!(op_of(0x4E75), Some(Op::Rts));
        assert_eq!(op_of(0x7001), Some(Op::Move)); // MOVEQ #1,D0
        assert_eq!(op_of(0x2200), Some(Op::Move)); // MOVE.L D0,D1
        assert_eq!(op_of(0xD081), Some(Op::Add)); // ADD.L D1,D0
        assert_eq!(op_of(0x4840), Some(Op::Swap));
        assert_eq!(op_of(0x4848), Some(Op::Bkpt));
        assert_eq!(op_of(0x4E4F), Some(Op::Trap));
        assert_eq!(op_of(0x48E7), Some(Op::MovemToMem)); // MOVEM.L -(A7)
        assert_eq!(op_of(0x4CDF), Some(Op::MovemToRegs)); // MOVEM.L (A7)+
        assert_eq!(op_of(0xC141), Some(Op::Exg));
        assert_eq!(op_of(0xC101), Some(Op::Abcd));
        assert_eq!(op_of(0x80C1), Some(Op::Divu));
        assert_eq!(op_of(0x0188), Some(Op::MovepToMem)); // MOVEP.W D0,(d16,A0)
        assert_eq!(op_of(0xE388), Some(Op::Lsl)); // LSL.L #1,D0
        assert_eq!(op_of(0xE1D0), Some(Op::Asl)); // ASL (A0)
        assert_eq!(op_of(0x51C8), Some(Op::Dbcc)); // DBF D0
        assert_eq!(op_of(0x6100), Some(Op::Bsr));
    }

    #[test]
    fn illegal_encodings_decode_to_nothing() {
        assert_eq!(lookup(0x4E78), None);
        assert_eq!(lookup(0x1040), None); // MOVE.B A0,D0
        assert_eq!(lookup(0x7100), None); // MOVEQ with bit 8
        assert_eq!(lookup(0x0A7D), None); // EORI to SR with a bad EA is not data alterable
        assert_eq!(lookup(0xE8C0), None); // bit field
        assert_eq!(lookup(0x4EC0), None); // JMP D0
    }

    #[test]
    fn line_a_and_f_are_their_own_traps() {
        assert_eq!(op_of(0xA000), Some(Op::LineA));
        assert_eq!(op_of(0xF200), Some(Op::LineF));
    }

    #[test]
    fn model_and_privilege_gating() {
        let movec = lookup(0x4E7A).expect("MOVEC decodes");
        assert_eq!(movec.since, Mc68010);
        assert!(movec.is_privileged_on(Mc68010));

        let move_from_sr = lookup(0x40C0).expect("MOVE from SR decodes");
        assert!(!move_from_sr.is_privileged_on(ProcessorModel::Mc68000));
        assert!(move_from_sr.is_privileged_on(Mc68010));

        assert_eq!(lookup(0x49C0).map(|i| i.since), Some(Mc68020)); // EXTB.L
        assert_eq!(lookup(0x4A48).map(|i| i.since), Some(Mc68020)); // TST.W A0
        assert_eq!(lookup(0x4A08), None); // TST.B A0
    }

    #[test]
    fn quick_arithmetic_on_address_registers_is_long_without_flags() {
        let addq = lookup(0x5248).expect("ADDQ.W #1,A0 decodes");
        assert_eq!(addq.size, Long);
        assert_eq!(addq.ccr, CcrUpdate::None);
    }
}
