//! Processor model identifiers and the control-register capability table.
//!
//! Models are ordered so decode and MOVEC gating can be written as
//! "at least 68010" / "before 68040" comparisons.

/// Selected Motorola 68k family member.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ProcessorModel {
    /// Motorola MC68000.
    #[default]
    Mc68000,
    /// Motorola MC68010.
    Mc68010,
    /// Motorola MC68020.
    Mc68020,
    /// Motorola MC68030.
    Mc68030,
    /// Motorola MC68040 (integer unit only).
    Mc68040,
}

impl ProcessorModel {
    /// Every model, oldest first.
    pub const ALL: [Self; 5] = [
        Self::Mc68000,
        Self::Mc68010,
        Self::Mc68020,
        Self::Mc68030,
        Self::Mc68040,
    ];

    /// Bits of the status register that exist on this model.
    ///
    /// `T1 . S . . I2 I1 I0 . . . X N Z V C` everywhere; the 68020 adds
    /// T0 (bit 14) and M (bit 12).
    #[must_use]
    pub const fn sr_mask(self) -> u16 {
        match self {
            Self::Mc68000 | Self::Mc68010 => 0xA71F,
            Self::Mc68020 | Self::Mc68030 | Self::Mc68040 => 0xF71F,
        }
    }

    /// Whether the master/interrupt stack split (the M bit) exists.
    #[must_use]
    pub const fn has_master_stack(self) -> bool {
        matches!(self, Self::Mc68020 | Self::Mc68030 | Self::Mc68040)
    }

    /// Word and long data accesses must be even before the 68020.
    #[must_use]
    pub const fn requires_aligned_data(self) -> bool {
        matches!(self, Self::Mc68000 | Self::Mc68010)
    }
}

/// A MOVEC-addressable control register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlRegister {
    /// Source function code.
    Sfc,
    /// Destination function code.
    Dfc,
    /// Cache control register.
    Cacr,
    /// MMU translation control.
    Tc,
    /// Instruction transparent translation 0.
    Itt0,
    /// Instruction transparent translation 1.
    Itt1,
    /// Data transparent translation 0.
    Dtt0,
    /// Data transparent translation 1.
    Dtt1,
    /// User stack pointer.
    Usp,
    /// Vector base register.
    Vbr,
    /// Cache address register.
    Caar,
    /// Master stack pointer.
    Msp,
    /// Interrupt stack pointer.
    Isp,
    /// MMU status register.
    Mmusr,
    /// User root pointer.
    Urp,
    /// Supervisor root pointer.
    Srp,
}

/// Where a control register exists, and how many of its bits are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlRegisterInfo {
    pub register: ControlRegister,
    /// First model that has the register.
    pub since: ProcessorModel,
    /// First model that no longer has it.
    pub removed_in: Option<ProcessorModel>,
    /// Only bits 0-2 are significant (function-code registers).
    pub only_3_bits: bool,
}

const fn info(
    register: ControlRegister,
    since: ProcessorModel,
    removed_in: Option<ProcessorModel>,
    only_3_bits: bool,
) -> ControlRegisterInfo {
    ControlRegisterInfo {
        register,
        since,
        removed_in,
        only_3_bits,
    }
}

/// MOVEC register table, indexed by `(id >> 8 | id) & 0xF` for ids
/// `0x000-0x007` and `0x800-0x807`.
///
/// USP and VBR carry no model floor of their own: MOVEC itself is 68010+.
pub const CONTROL_REGISTERS: [ControlRegisterInfo; 16] = {
    use ControlRegister as R;
    use ProcessorModel as P;
    [
        info(R::Sfc, P::Mc68010, None, true),
        info(R::Dfc, P::Mc68010, None, true),
        info(R::Cacr, P::Mc68020, None, false),
        info(R::Tc, P::Mc68040, None, false),
        info(R::Itt0, P::Mc68040, None, false),
        info(R::Itt1, P::Mc68040, None, false),
        info(R::Dtt0, P::Mc68040, None, false),
        info(R::Dtt1, P::Mc68040, None, false),
        info(R::Usp, P::Mc68000, None, false),
        info(R::Vbr, P::Mc68000, None, false),
        info(R::Caar, P::Mc68020, Some(P::Mc68040), false),
        info(R::Msp, P::Mc68020, None, false),
        info(R::Isp, P::Mc68020, None, false),
        info(R::Mmusr, P::Mc68040, None, false),
        info(R::Urp, P::Mc68040, None, false),
        info(R::Srp, P::Mc68040, None, false),
    ]
};

impl ControlRegister {
    /// Look up a 12-bit MOVEC register id, whatever the model.
    #[must_use]
    pub fn lookup(id: u16) -> Option<ControlRegisterInfo> {
        if id & !0x807 != 0 {
            return None;
        }
        let index = usize::from((id >> 8 | id) & 0xF);
        CONTROL_REGISTERS.get(index).copied()
    }

    /// Look up a MOVEC register id and check it exists on `model`.
    #[must_use]
    pub fn for_model(id: u16, model: ProcessorModel) -> Option<ControlRegisterInfo> {
        Self::lookup(id).filter(|cr| cr.exists_on(model))
    }
}

impl ControlRegisterInfo {
    /// Whether `model` is neither too early nor too late for this register.
    #[must_use]
    pub fn exists_on(&self, model: ProcessorModel) -> bool {
        let too_early = model < self.since;
        let too_late = self.removed_in.is_some_and(|end| model >= end);
        !too_early && !too_late
    }
}
