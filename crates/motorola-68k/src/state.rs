//! Processor state: registers, status, run condition and the memory the CPU
//! is wired to.
//!
//! Everything here is architectural plumbing shared by decode, microcode and
//! the instruction loop: status-word composition with stack-pointer banking,
//! data and instruction fetches with the 68k alignment rules, and the two
//! basic exception stack frames.

use log::debug;

use crate::fault::{Fault, OpResult};
use crate::flags::{M, S, StatusRegister};
use crate::memory::{FunctionCode, Memory};
use crate::model::ProcessorModel;
use crate::params::OpSize;
use crate::registers::Registers;

/// Host hook for BKPT: receives the breakpoint vector (0-7) and returns the
/// opcode to execute in place of the breakpoint.
pub type BreakpointHandler<M> = Box<dyn FnMut(&mut ProcessorState<M>, u8) -> u16>;

/// What the instruction loop is doing.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RunCondition {
    /// Constructed but never reset.
    #[default]
    Startup,
    /// Executing instructions.
    Running,
    /// Double fault. Only a reset leaves this state.
    Halted,
    /// STOP with a normal immediate; an interrupt resumes.
    Stopped,
    /// STOP #$FFFF: the guest asked the host to shut down.
    Finished,
}

pub struct ProcessorState<M: Memory> {
    pub regs: Registers,
    /// Written through [`Self::set_sr`] so A7 stays banked.
    pub(crate) sr: StatusRegister,
    pub model: ProcessorModel,
    pub condition: RunCondition,
    /// Opcode of the instruction about to execute.
    pub opcode: u16,
    pub mem: M,
    bkpt: Option<BreakpointHandler<M>>,
}

impl<M: Memory> std::fmt::Debug for ProcessorState<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessorState")
            .field("regs", &self.regs)
            .field("sr", &format_args!("{:04X}", self.get_sr()))
            .field("model", &self.model)
            .field("condition", &self.condition)
            .field("opcode", &format_args!("{:04X}", self.opcode))
            .field("bkpt", &self.bkpt.is_some())
            .finish_non_exhaustive()
    }
}

impl<M: Memory> ProcessorState<M> {
    /// All registers zero, status word zero, condition [`RunCondition::Startup`].
    pub fn new(model: ProcessorModel, mem: M) -> Self {
        Self {
            regs: Registers::new(),
            sr: StatusRegister::default(),
            model,
            condition: RunCondition::Startup,
            opcode: 0,
            mem,
            bkpt: None,
        }
    }

    /// Install or remove the BKPT hook.
    pub fn set_breakpoint_handler(&mut self, handler: Option<BreakpointHandler<M>>) {
        self.bkpt = handler;
    }

    #[must_use]
    pub fn has_breakpoint_handler(&self) -> bool {
        self.bkpt.is_some()
    }

    /// Run the breakpoint handler, if any, for `vector`.
    pub(crate) fn call_breakpoint_handler(&mut self, vector: u8) -> Option<u16> {
        let mut handler = self.bkpt.take()?;
        let opcode = handler(self, vector);
        // A handler that installed a replacement keeps it.
        if self.bkpt.is_none() {
            self.bkpt = Some(handler);
        }
        Some(opcode)
    }

    #[must_use]
    pub fn pc(&self) -> u32 {
        self.regs.pc
    }

    #[must_use]
    pub fn is_supervisor(&self) -> bool {
        self.sr.supervisor()
    }

    #[must_use]
    pub fn data_space(&self) -> FunctionCode {
        FunctionCode::from_flags(self.is_supervisor(), false)
    }

    #[must_use]
    pub fn program_space(&self) -> FunctionCode {
        FunctionCode::from_flags(self.is_supervisor(), true)
    }

    #[must_use]
    pub fn get_ccr(&self) -> u8 {
        self.sr.ccr()
    }

    #[must_use]
    pub fn get_sr(&self) -> u16 {
        self.sr.to_word()
    }

    pub fn set_ccr(&mut self, ccr: u8) {
        self.sr.x = ccr >> 4 & 1;
        self.sr.nzvc = ccr & 0xF;
    }

    /// Write the whole status word. Bits the model lacks are dropped, and A7
    /// is re-banked if S or M changed.
    pub fn set_sr(&mut self, sr: u16) {
        let sr = sr & self.model.sr_mask();

        self.save_sp();
        self.sr = StatusRegister::from_word(sr);
        self.load_sp();
    }

    /// Store A7 into the stack pointer the current mode selects.
    pub fn save_sp(&mut self) {
        let sp = self.regs.a[7];
        *self.active_stack_slot() = sp;
    }

    /// Reload A7 from the stack pointer the current mode selects.
    pub fn load_sp(&mut self) {
        self.regs.a[7] = *self.active_stack_slot();
    }

    fn active_stack_slot(&mut self) -> &mut u32 {
        let sr = self.sr.to_word();
        if sr & S == 0 {
            &mut self.regs.usp
        } else if self.model.has_master_stack() && sr & M != 0 {
            &mut self.regs.msp
        } else {
            &mut self.regs.isp
        }
    }

    /// Misaligned for a word/long data access on this model.
    #[must_use]
    pub fn badly_aligned_data(&self, addr: u32) -> bool {
        self.model.requires_aligned_data() && addr & 1 != 0
    }

    /// Read from the current data space.
    pub fn read_mem(&mut self, addr: u32, size: OpSize) -> Result<u32, Fault> {
        let fc = self.data_space();
        self.read_mem_in(addr, size, fc)
    }

    /// Write to the current data space.
    pub fn write_mem(&mut self, addr: u32, size: OpSize, value: u32) -> OpResult {
        let fc = self.data_space();
        self.write_mem_in(addr, size, value, fc)
    }

    pub(crate) fn read_mem_in(&mut self, addr: u32, size: OpSize, fc: FunctionCode) -> Result<u32, Fault> {
        if size != OpSize::Byte && self.badly_aligned_data(addr) {
            return Err(Fault::AddressError);
        }

        let value = match size {
            OpSize::Byte => self.mem.get_byte(addr, fc).map(u32::from),
            OpSize::Word => self.mem.get_word(addr, fc).map(u32::from),
            OpSize::Long => self.mem.get_long(addr, fc),
            OpSize::Unsized => Some(0),
        };

        value.ok_or(Fault::BusError)
    }

    pub(crate) fn write_mem_in(&mut self, addr: u32, size: OpSize, value: u32, fc: FunctionCode) -> OpResult {
        if size != OpSize::Byte && self.badly_aligned_data(addr) {
            return Err(Fault::AddressError);
        }

        let ok = match size {
            OpSize::Byte => self.mem.put_byte(addr, value as u8, fc),
            OpSize::Word => self.mem.put_word(addr, value as u16, fc),
            OpSize::Long => self.mem.put_long(addr, value, fc),
            OpSize::Unsized => true,
        };

        if ok { Ok(()) } else { Err(Fault::BusError) }
    }

    /// Load the opcode at PC into [`Self::opcode`] without moving PC.
    pub fn prefetch_instruction_word(&mut self) -> OpResult {
        self.opcode = self.instruction_word_at(self.regs.pc)?;
        Ok(())
    }

    /// Read the extension word at PC and step past it.
    pub fn fetch_instruction_word(&mut self) -> Result<u16, Fault> {
        let word = self.instruction_word_at(self.regs.pc)?;
        self.regs.pc = self.regs.pc.wrapping_add(2);
        Ok(word)
    }

    /// Read two extension words at PC as one long and step past them.
    pub fn fetch_instruction_long(&mut self) -> Result<u32, Fault> {
        let hi = self.fetch_instruction_word()?;
        let lo = self.fetch_instruction_word()?;
        Ok(u32::from(hi) << 16 | u32::from(lo))
    }

    fn instruction_word_at(&mut self, addr: u32) -> Result<u16, Fault> {
        if addr & 1 != 0 {
            return Err(Fault::AddressError);
        }
        let fc = self.program_space();
        self.mem.get_instruction_word(addr, fc).ok_or(Fault::BusError)
    }

    /// Pre-decrement A7 by 2 and store a word.
    pub fn push_word(&mut self, value: u16) -> OpResult {
        let sp = self.regs.a[7].wrapping_sub(2);
        self.write_mem(sp, OpSize::Word, u32::from(value))?;
        self.regs.a[7] = sp;
        Ok(())
    }

    /// Pre-decrement A7 by 4 and store a long.
    pub fn push_long(&mut self, value: u32) -> OpResult {
        let sp = self.regs.a[7].wrapping_sub(4);
        self.write_mem(sp, OpSize::Long, value)?;
        self.regs.a[7] = sp;
        Ok(())
    }

    /// Load a word from A7 and post-increment it by 2.
    pub fn pop_word(&mut self) -> Result<u16, Fault> {
        let sp = self.regs.a[7];
        let value = self.read_mem(sp, OpSize::Word)?;
        self.regs.a[7] = sp.wrapping_add(2);
        Ok(value as u16)
    }

    /// Load a long from A7 and post-increment it by 4.
    pub fn pop_long(&mut self) -> Result<u32, Fault> {
        let sp = self.regs.a[7];
        let value = self.read_mem(sp, OpSize::Long)?;
        self.regs.a[7] = sp.wrapping_add(4);
        Ok(value)
    }

    /// Deliver an exception with the four-word frame
    /// `SR, PC, 0000 | vector_offset`.
    ///
    /// On failure PC is untouched and the fault that stopped delivery is
    /// returned; the caller treats that as a double fault.
    pub fn take_exception_format_0(&mut self, vector_offset: u16) -> OpResult {
        self.take_exception(0, vector_offset, None)
    }

    /// Deliver an exception with the six-word frame
    /// `SR, PC, 2000 | vector_offset, instruction address`.
    pub fn take_exception_format_2(&mut self, vector_offset: u16, instruction_address: u32) -> OpResult {
        self.take_exception(2, vector_offset, Some(instruction_address))
    }

    fn take_exception(&mut self, format: u16, vector_offset: u16, instruction_address: Option<u32>) -> OpResult {
        const FC: FunctionCode = FunctionCode::SupervisorData;

        let saved_sr = self.get_sr();

        // Clear T1/T0, set S.
        self.set_sr((saved_sr & 0x3FFF) | S);

        let sp = self.regs.a[7];
        if self.badly_aligned_data(sp) {
            return Err(Fault::AddressError);
        }

        let size = if instruction_address.is_some() { 12 } else { 8 };
        let sp = sp.wrapping_sub(size);
        self.regs.a[7] = sp;

        let format_and_offset = format << 12 | vector_offset;

        let mut ok = self.mem.put_word(sp, saved_sr, FC)
            & self.mem.put_long(sp.wrapping_add(2), self.regs.pc, FC)
            & self.mem.put_word(sp.wrapping_add(6), format_and_offset, FC);
        if let Some(addr) = instruction_address {
            ok &= self.mem.put_long(sp.wrapping_add(8), addr, FC);
        }
        if !ok {
            return Err(Fault::BusError);
        }

        let vbr = self.regs.vbr;
        if self.badly_aligned_data(vbr) {
            return Err(Fault::AddressError);
        }

        let handler = self
            .mem
            .get_long(vbr.wrapping_add(u32::from(vector_offset)), FC)
            .ok_or(Fault::BusError)?;

        debug!(
            "exception: vector {} format {format} SR {saved_sr:04X} PC {:08X} -> {handler:08X}",
            vector_offset / 4,
            self.regs.pc
        );

        self.regs.pc = handler;
        self.prefetch_instruction_word()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::FlatMemory;

    fn state(model: ProcessorModel) -> ProcessorState<FlatMemory> {
        ProcessorState::new(model, FlatMemory::new(0x1_0000))
    }

    #[test]
    fn set_sr_drops_bits_the_model_lacks() {
        let mut s = state(ProcessorModel::Mc68000);
        s.set_sr(0xFFFF);
        assert_eq!(s.get_sr(), 0xA71F);

        let mut s = state(ProcessorModel::Mc68030);
        s.set_sr(0xFFFF);
        assert_eq!(s.get_sr(), 0xF71F);
    }

    #[test]
    fn leaving_supervisor_mode_banks_the_stack_pointers() {
        let mut s = state(ProcessorModel::Mc68000);
        s.set_sr(0x2700);
        s.regs.usp = 0x1000;
        s.regs.a[7] = 0x8000;

        s.set_sr(0x0000);
        assert_eq!(s.regs.a[7], 0x1000);
        assert_eq!(s.regs.isp, 0x8000);

        s.regs.a[7] = 0x0FF0;
        s.set_sr(0x2000);
        assert_eq!(s.regs.a[7], 0x8000);
        assert_eq!(s.regs.usp, 0x0FF0);
    }

    #[test]
    fn unmasked_master_bit_still_selects_isp_before_68020() {
        let mut s = state(ProcessorModel::Mc68010);
        s.regs.isp = 0x8000;
        s.regs.msp = 0x9000;
        s.sr = StatusRegister::from_word(0x3700);
        s.load_sp();
        assert_eq!(s.regs.a[7], 0x8000);
    }

    #[test]
    fn master_bit_selects_msp_on_68020() {
        let mut s = state(ProcessorModel::Mc68020);
        s.set_sr(0x2000);
        s.regs.a[7] = 0x4000;
        s.regs.msp = 0x6000;

        s.set_sr(0x3000);
        assert_eq!(s.regs.a[7], 0x6000);
        assert_eq!(s.regs.isp, 0x4000);
    }

    #[test]
    fn master_bit_is_ignored_before_68020() {
        let mut s = state(ProcessorModel::Mc68010);
        s.set_sr(0x2000);
        s.regs.a[7] = 0x4000;
        s.regs.msp = 0x6000;

        s.set_sr(0x3000);
        assert_eq!(s.regs.a[7], 0x4000);
    }

    #[test]
    fn read_mem_checks_alignment_before_range() {
        let mut s = state(ProcessorModel::Mc68000);
        assert_eq!(s.read_mem(0x0001, OpSize::Word), Err(Fault::AddressError));
        assert_eq!(s.read_mem(0x2_0001, OpSize::Byte), Err(Fault::BusError));
        assert_eq!(s.read_mem(0x2_0000, OpSize::Long), Err(Fault::BusError));
        assert_eq!(s.read_mem(0x0001, OpSize::Byte), Ok(0));
    }

    #[test]
    fn misaligned_data_is_allowed_from_68020() {
        let mut s = state(ProcessorModel::Mc68020);
        assert!(s.mem.load(0x11, &[0x12, 0x34]));
        assert_eq!(s.read_mem(0x11, OpSize::Word), Ok(0x1234));
    }

    #[test]
    fn prefetch_rejects_odd_pc() {
        let mut s = state(ProcessorModel::Mc68020);
        s.regs.pc = 0x101;
        assert_eq!(s.prefetch_instruction_word(), Err(Fault::AddressError));
        s.regs.pc = 0x2_0000;
        assert_eq!(s.prefetch_instruction_word(), Err(Fault::BusError));
    }

    #[test]
    fn format_0_frame_layout() {
        let mut s = state(ProcessorModel::Mc68000);
        s.set_sr(0x8004);
        s.regs.isp = 0x1000;
        s.regs.pc = 0x0000_0456;
        assert!(s.mem.load(0x10, &[0x00, 0x00, 0x20, 0x00]));
        assert!(s.mem.load(0x2000, &[0x4E, 0x71]));

        assert_eq!(s.take_exception_format_0(0x10), Ok(()));

        assert_eq!(s.regs.a[7], 0x0FF8);
        assert_eq!(s.get_sr(), 0x2004);
        assert_eq!(s.pc(), 0x2000);
        assert_eq!(s.opcode, 0x4E71);
        let frame = &s.mem.as_slice()[0x0FF8..0x1000];
        assert_eq!(frame, &[0x80, 0x04, 0x00, 0x00, 0x04, 0x56, 0x00, 0x10]);
    }

    #[test]
    fn format_2_frame_carries_instruction_address() {
        let mut s = state(ProcessorModel::Mc68020);
        s.set_sr(0x2000);
        s.regs.a[7] = 0x1000;
        s.regs.pc = 0x0000_0106;
        assert!(s.mem.load(0x14, &[0x00, 0x00, 0x30, 0x00]));

        assert_eq!(s.take_exception_format_2(0x14, 0x0000_0100), Ok(()));

        assert_eq!(s.regs.a[7], 0x0FF4);
        let frame = &s.mem.as_slice()[0x0FF4..0x1000];
        assert_eq!(
            frame,
            &[0x20, 0x00, 0x00, 0x00, 0x01, 0x06, 0x20, 0x14, 0x00, 0x00, 0x01, 0x00]
        );
        assert_eq!(s.pc(), 0x3000);
    }

    #[test]
    fn misaligned_supervisor_stack_aborts_delivery() {
        let mut s = state(ProcessorModel::Mc68000);
        s.set_sr(0x0000);
        s.regs.isp = 0x1001;
        s.regs.pc = 0x400;

        assert_eq!(s.take_exception_format_0(0x0C), Err(Fault::AddressError));
        assert_eq!(s.pc(), 0x400);
        assert!(s.is_supervisor());
    }

    #[test]
    fn unmapped_vector_table_is_a_bus_error() {
        let mut s = state(ProcessorModel::Mc68010);
        s.set_sr(0x2000);
        s.regs.a[7] = 0x1000;
        s.regs.vbr = 0x00FF_0000;
        assert_eq!(s.take_exception_format_0(0x10), Err(Fault::BusError));
    }

    #[test]
    fn push_and_pop_use_a7() {
        let mut s = state(ProcessorModel::Mc68000);
        s.set_sr(0x2000);
        s.regs.a[7] = 0x100;
        assert_eq!(s.push_long(0xCAFE_F00D), Ok(()));
        assert_eq!(s.push_word(0x1234), Ok(()));
        assert_eq!(s.regs.a[7], 0xFA);
        assert_eq!(s.pop_word(), Ok(0x1234));
        assert_eq!(s.pop_long(), Ok(0xCAFE_F00D));
        assert_eq!(s.regs.a[7], 0x100);
    }

    #[test]
    fn breakpoint_handler_sees_the_vector() {
        let mut s = state(ProcessorModel::Mc68010);
        assert_eq!(s.call_breakpoint_handler(1), None);

        s.set_breakpoint_handler(Some(Box::new(|s: &mut ProcessorState<FlatMemory>, vector: u8| {
            s.regs.d[0] = u32::from(vector);
            0x4E71
        })));
        assert_eq!(s.call_breakpoint_handler(5), Some(0x4E71));
        assert_eq!(s.regs.d[0], 5);
        assert!(s.has_breakpoint_handler());
    }
}
