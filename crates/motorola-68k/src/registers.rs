//! 68k register file.
//!
//! - D0-D7, A0-A7: general registers; A7 is whichever stack pointer S (and M
//!   on the 68020+) currently selects
//! - USP / ISP / MSP: banked stack pointers; the active one is stale while
//!   it lives in A7 (see `ProcessorState::save_sp`)
//! - PC: program counter
//! - SFC, DFC, VBR, CACR, CAAR and the 68040 MMU registers: MOVEC targets

use crate::model::ControlRegister;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Registers {
    /// Data registers D0-D7.
    pub d: [u32; 8],
    /// Address registers A0-A7.
    pub a: [u32; 8],
    /// Program counter.
    pub pc: u32,
    /// User stack pointer.
    pub usp: u32,
    /// Interrupt (supervisor) stack pointer; the only supervisor stack before
    /// the 68020.
    pub isp: u32,
    /// Master stack pointer (68020+).
    pub msp: u32,
    /// Source function code (68010+).
    pub sfc: u32,
    /// Destination function code (68010+).
    pub dfc: u32,
    /// Vector base register (68010+).
    pub vbr: u32,
    /// Cache control register (68020+).
    pub cacr: u32,
    /// Cache address register (68020/68030).
    pub caar: u32,
    /// MMU translation control (68040).
    pub tc: u32,
    /// Instruction transparent translation 0 (68040).
    pub itt0: u32,
    /// Instruction transparent translation 1 (68040).
    pub itt1: u32,
    /// Data transparent translation 0 (68040).
    pub dtt0: u32,
    /// Data transparent translation 1 (68040).
    pub dtt1: u32,
    /// MMU status register (68040).
    pub mmusr: u32,
    /// User root pointer (68040).
    pub urp: u32,
    /// Supervisor root pointer (68040).
    pub srp: u32,
}

impl Registers {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            d: [0; 8],
            a: [0; 8],
            pc: 0,
            usp: 0,
            isp: 0,
            msp: 0,
            sfc: 0,
            dfc: 0,
            vbr: 0,
            cacr: 0,
            caar: 0,
            tc: 0,
            itt0: 0,
            itt1: 0,
            dtt0: 0,
            dtt1: 0,
            mmusr: 0,
            urp: 0,
            srp: 0,
        }
    }

    /// General register by MOVEM/MOVEC index: 0-7 are D0-D7, 8-15 are A0-A7.
    #[must_use]
    pub fn general(&self, index: usize) -> u32 {
        let index = index & 15;
        if index < 8 { self.d[index] } else { self.a[index - 8] }
    }

    pub fn set_general(&mut self, index: usize, value: u32) {
        let index = index & 15;
        if index < 8 {
            self.d[index] = value;
        } else {
            self.a[index - 8] = value;
        }
    }

    /// Control register storage. Stack pointers here are the banked copies.
    #[must_use]
    pub fn control(&self, cr: ControlRegister) -> u32 {
        match cr {
            ControlRegister::Sfc => self.sfc,
            ControlRegister::Dfc => self.dfc,
            ControlRegister::Cacr => self.cacr,
            ControlRegister::Tc => self.tc,
            ControlRegister::Itt0 => self.itt0,
            ControlRegister::Itt1 => self.itt1,
            ControlRegister::Dtt0 => self.dtt0,
            ControlRegister::Dtt1 => self.dtt1,
            ControlRegister::Usp => self.usp,
            ControlRegister::Vbr => self.vbr,
            ControlRegister::Caar => self.caar,
            ControlRegister::Msp => self.msp,
            ControlRegister::Isp => self.isp,
            ControlRegister::Mmusr => self.mmusr,
            ControlRegister::Urp => self.urp,
            ControlRegister::Srp => self.srp,
        }
    }

    pub fn control_mut(&mut self, cr: ControlRegister) -> &mut u32 {
        match cr {
            ControlRegister::Sfc => &mut self.sfc,
            ControlRegister::Dfc => &mut self.dfc,
            ControlRegister::Cacr => &mut self.cacr,
            ControlRegister::Tc => &mut self.tc,
            ControlRegister::Itt0 => &mut self.itt0,
            ControlRegister::Itt1 => &mut self.itt1,
            ControlRegister::Dtt0 => &mut self.dtt0,
            ControlRegister::Dtt1 => &mut self.dtt1,
            ControlRegister::Usp => &mut self.usp,
            ControlRegister::Vbr => &mut self.vbr,
            ControlRegister::Caar => &mut self.caar,
            ControlRegister::Msp => &mut self.msp,
            ControlRegister::Isp => &mut self.isp,
            ControlRegister::Mmusr => &mut self.mmusr,
            ControlRegister::Urp => &mut self.urp,
            ControlRegister::Srp => &mut self.srp,
        }
    }
}
