//! Instruction loop: reset, single-step, interrupts and exception delivery.

use log::{debug, info, trace, warn};

use crate::config::EmulatorConfig;
use crate::dispatch;
use crate::fault::{Fault, FrameFormat, OpResult, vector};
use crate::flags::{C, N, V, Z};
use crate::memory::{FunctionCode, Memory};
use crate::observe::{Observable, Value};
use crate::registers::Registers;
use crate::state::{BreakpointHandler, ProcessorState, RunCondition};

/// A 68k core wired to `M`.
pub struct Emulator<M: Memory> {
    state: ProcessorState<M>,
    config: EmulatorConfig,
    /// Instructions retired since the last reset.
    instructions: u64,
}

impl<M: Memory> std::fmt::Debug for Emulator<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emulator")
            .field("state", &self.state)
            .field("config", &self.config)
            .field("instructions", &self.instructions)
            .finish()
    }
}

impl<M: Memory> Emulator<M> {
    /// A core in [`RunCondition::Startup`]; call [`Self::reset`] before stepping.
    pub fn new(config: EmulatorConfig, mem: M) -> Self {
        Self {
            state: ProcessorState::new(config.model, mem),
            config,
            instructions: 0,
        }
    }

    #[must_use]
    pub fn config(&self) -> &EmulatorConfig {
        &self.config
    }

    #[must_use]
    pub fn state(&self) -> &ProcessorState<M> {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ProcessorState<M> {
        &mut self.state
    }

    #[must_use]
    pub fn memory(&self) -> &M {
        &self.state.mem
    }

    pub fn memory_mut(&mut self) -> &mut M {
        &mut self.state.mem
    }

    pub fn set_breakpoint_handler(&mut self, handler: Option<BreakpointHandler<M>>) {
        self.state.set_breakpoint_handler(handler);
    }

    #[must_use]
    pub fn condition(&self) -> RunCondition {
        self.state.condition
    }

    /// Instructions retired since the last reset.
    ///
    /// A serviced BKPT counts twice: once for the breakpoint step and once
    /// for the replacement opcode it hands back.
    #[must_use]
    pub fn instructions(&self) -> u64 {
        self.instructions
    }

    /// Power-on reset: clear the register file, enter supervisor mode with
    /// interrupts masked and load SSP and PC from vectors 0 and 1.
    ///
    /// Any fault while fetching the vectors or the first opcode halts.
    pub fn reset(&mut self) {
        let s = &mut self.state;
        s.regs = Registers::new();
        s.sr = crate::flags::StatusRegister::default();
        s.opcode = 0;
        s.set_sr(0x2700);
        self.instructions = 0;

        match self.load_reset_vectors() {
            Ok(()) => {
                self.state.condition = RunCondition::Running;
                info!(
                    "reset: {:?} SSP {:08X} PC {:08X}",
                    self.state.model,
                    self.state.regs.a[7],
                    self.state.regs.pc
                );
            }
            Err(fault) => {
                warn!("reset failed: {fault}");
                self.state.condition = RunCondition::Halted;
            }
        }
    }

    fn load_reset_vectors(&mut self) -> OpResult {
        const FC: FunctionCode = FunctionCode::SupervisorProgram;

        let s = &mut self.state;
        let ssp = s.mem.get_long(u32::from(vector::RESET_SSP) * 4, FC).ok_or(Fault::BusError)?;
        let pc = s.mem.get_long(u32::from(vector::RESET_PC) * 4, FC).ok_or(Fault::BusError)?;
        s.regs.a[7] = ssp;
        s.regs.pc = pc;
        s.prefetch_instruction_word()
    }

    /// Execute one instruction.
    ///
    /// Returns whether the loop should keep going: `false` once the core is
    /// halted, stopped, finished or past the configured instruction limit.
    pub fn step(&mut self) -> bool {
        if self.state.condition != RunCondition::Running || self.limit_reached() {
            return false;
        }

        let s = &mut self.state;
        let instr_addr = s.regs.pc;
        let tracing = s.sr.trace();
        trace!("{instr_addr:08X}: {:04X}", s.opcode);

        s.regs.pc = s.regs.pc.wrapping_add(2);
        match dispatch::execute(s) {
            // The substitute opcode is already in place; the next step runs it.
            Err(Fault::Breakpoint) => {}
            Err(fault) => self.raise(fault, instr_addr),
            Ok(()) if tracing && self.state.condition == RunCondition::Running => {
                let offset = u16::from(vector::TRACE) * 4;
                if let Err(fault) = self.state.take_exception_format_2(offset, instr_addr) {
                    self.double_fault(fault);
                }
            }
            Ok(()) => {
                if self.state.condition == RunCondition::Running {
                    self.prefetch();
                }
            }
        }

        self.instructions += 1;
        self.state.condition == RunCondition::Running && !self.limit_reached()
    }

    /// Step until the loop stops; returns the number of instructions run.
    pub fn run(&mut self) -> u64 {
        let start = self.instructions;
        while self.step() {}
        self.instructions - start
    }

    fn limit_reached(&self) -> bool {
        self.config.instruction_limit.is_some_and(|limit| self.instructions >= limit)
    }

    /// Deliver `fault` raised by the instruction at `instr_addr`.
    fn raise(&mut self, fault: Fault, instr_addr: u32) {
        let Some(offset) = fault.vector_offset() else {
            return;
        };

        if fault.restarts_instruction() {
            self.state.regs.pc = instr_addr;
        }

        let delivered = match fault.frame_format() {
            FrameFormat::Short => self.state.take_exception_format_0(offset),
            FrameFormat::SixWord => self.state.take_exception_format_2(offset, instr_addr),
        };
        if let Err(second) = delivered {
            self.double_fault(second);
        }
    }

    /// Fetch the next opcode, turning a failed fetch into a bus or address
    /// error at the new PC.
    fn prefetch(&mut self) {
        if let Err(fault) = self.state.prefetch_instruction_word() {
            debug!("prefetch at {:08X} failed: {fault}", self.state.regs.pc);
            let pc = self.state.regs.pc;
            self.raise(fault, pc);
        }
    }

    fn double_fault(&mut self, fault: Fault) {
        warn!(
            "double fault ({fault}) at PC {:08X}, SR {:04X}: halted",
            self.state.regs.pc,
            self.state.get_sr()
        );
        self.state.condition = RunCondition::Halted;
    }

    /// Present an autovectored interrupt at `level` (1-7).
    ///
    /// Taken when the level is above the current mask, or is 7. A taken
    /// interrupt raises the mask to `level` and wakes a stopped core.
    /// Returns whether the interrupt was accepted.
    pub fn interrupt(&mut self, level: u8) -> bool {
        let level = level & 7;
        if level == 0 || !matches!(self.state.condition, RunCondition::Running | RunCondition::Stopped) {
            return false;
        }
        if level != 7 && level <= self.state.sr.iii {
            return false;
        }

        let offset = u16::from(vector::AUTOVECTOR_BASE + level) * 4;
        self.state.condition = RunCondition::Running;
        if let Err(fault) = self.state.take_exception_format_0(offset) {
            self.double_fault(fault);
            return false;
        }
        self.state.sr.iii = level;
        true
    }

    /// Current A7 when `slot` is the active stack, otherwise the banked copy.
    fn stack_pointer(&self, slot: Stack) -> u32 {
        let sr = self.state.sr;
        let active = match slot {
            Stack::User => !sr.supervisor(),
            Stack::Interrupt => sr.supervisor() && !sr.master(),
            Stack::Master => sr.supervisor() && sr.master(),
        };
        if active {
            return self.state.regs.a[7];
        }
        match slot {
            Stack::User => self.state.regs.usp,
            Stack::Interrupt => self.state.regs.isp,
            Stack::Master => self.state.regs.msp,
        }
    }
}

#[derive(Clone, Copy)]
enum Stack {
    User,
    Interrupt,
    Master,
}

impl<M: Memory> Observable for Emulator<M> {
    fn query(&self, path: &str) -> Option<Value> {
        let regs = &self.state.regs;
        let ccr = self.state.get_ccr();

        if let Some(n) = path.strip_prefix('d').and_then(register_number) {
            return Some(Value::U32(regs.d[n]));
        }
        if let Some(n) = path.strip_prefix('a').and_then(register_number) {
            return Some(Value::U32(regs.a[n]));
        }

        match path {
            "pc" => Some(Value::U32(regs.pc)),
            "sr" => Some(Value::U16(self.state.get_sr())),
            "ccr" => Some(Value::U8(ccr)),
            "usp" => Some(Value::U32(self.stack_pointer(Stack::User))),
            "isp" => Some(Value::U32(self.stack_pointer(Stack::Interrupt))),
            "msp" => Some(Value::U32(self.stack_pointer(Stack::Master))),
            "vbr" => Some(Value::U32(regs.vbr)),
            "sfc" => Some(Value::U32(regs.sfc)),
            "dfc" => Some(Value::U32(regs.dfc)),
            "cacr" => Some(Value::U32(regs.cacr)),
            "flags.x" => Some(Value::Bool(ccr & 0x10 != 0)),
            "flags.n" => Some(Value::Bool(ccr & N != 0)),
            "flags.z" => Some(Value::Bool(ccr & Z != 0)),
            "flags.v" => Some(Value::Bool(ccr & V != 0)),
            "flags.c" => Some(Value::Bool(ccr & C != 0)),
            "condition" => Some(Value::String(format!("{:?}", self.state.condition))),
            "opcode" => Some(Value::U16(self.state.opcode)),
            "instructions" => Some(Value::U64(self.instructions)),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "d0", "d1", "d2", "d3", "d4", "d5", "d6", "d7",
            "a0", "a1", "a2", "a3", "a4", "a5", "a6", "a7",
            "usp", "isp", "msp", "vbr", "sfc", "dfc", "cacr",
            "pc", "sr", "ccr",
            "flags.x", "flags.n", "flags.z", "flags.v", "flags.c",
            "condition", "opcode", "instructions",
        ]
    }
}

fn register_number(digit: &str) -> Option<usize> {
    match digit.as_bytes() {
        [d @ b'0'..=b'7'] => Some(usize::from(d - b'0')),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::FlatMemory;
    use crate::model::ProcessorModel;

    const SSP: u32 = 0x8000;
    const START: u32 = 0x1000;

    fn boot(model: ProcessorModel, program: &[u16]) -> Emulator<FlatMemory> {
        let mut mem = FlatMemory::new(0x1_0000);
        assert!(mem.load(0, &SSP.to_be_bytes()));
        assert!(mem.load(4, &START.to_be_bytes()));
        let bytes: Vec<u8> = program.iter().flat_map(|w| w.to_be_bytes()).collect();
        assert!(mem.load(START, &bytes));

        let mut emu = Emulator::new(EmulatorConfig::new(model), mem);
        emu.reset();
        emu
    }

    fn set_vector(emu: &mut Emulator<FlatMemory>, number: u8, handler: u32) {
        assert!(emu.memory_mut().load(u32::from(number) * 4, &handler.to_be_bytes()));
    }

    #[test]
    fn starts_in_startup_and_refuses_to_step() {
        let mut emu = Emulator::new(EmulatorConfig::default(), FlatMemory::new(0x100));
        assert_eq!(emu.condition(), RunCondition::Startup);
        assert!(!emu.step());
    }

    #[test]
    fn reset_loads_vectors_and_masks_interrupts() {
        let emu = boot(ProcessorModel::Mc68000, &[0x4E71]);
        assert_eq!(emu.condition(), RunCondition::Running);
        assert_eq!(emu.state().regs.a[7], SSP);
        assert_eq!(emu.state().pc(), START);
        assert_eq!(emu.state().get_sr(), 0x2700);
        assert_eq!(emu.state().opcode, 0x4E71);
    }

    #[test]
    fn reset_with_odd_pc_halts() {
        let mut mem = FlatMemory::new(0x1_0000);
        assert!(mem.load(4, &0x1001u32.to_be_bytes()));
        let mut emu = Emulator::new(EmulatorConfig::default(), mem);
        emu.reset();
        assert_eq!(emu.condition(), RunCondition::Halted);
    }

    #[test]
    fn step_retires_and_prefetches() {
        // MOVEQ #5,D0 ; NOP
        let mut emu = boot(ProcessorModel::Mc68000, &[0x7005, 0x4E71]);
        assert!(emu.step());
        assert_eq!(emu.state().regs.d[0], 5);
        assert_eq!(emu.state().pc(), START + 2);
        assert_eq!(emu.state().opcode, 0x4E71);
        assert_eq!(emu.instructions(), 1);
    }

    #[test]
    fn illegal_instruction_stacks_faulting_pc() {
        let mut emu = boot(ProcessorModel::Mc68000, &[0x4AFC]);
        set_vector(&mut emu, vector::ILLEGAL_INSTRUCTION, 0x2000);
        assert!(emu.step());
        assert_eq!(emu.state().pc(), 0x2000);
        assert_eq!(emu.state().regs.a[7], SSP - 8);
        let stacked = emu.state_mut().read_mem(SSP - 6, crate::params::OpSize::Long);
        assert_eq!(stacked, Ok(START));
    }

    #[test]
    fn divide_by_zero_uses_six_word_frame() {
        // DIVU.W D1,D0 with D1 = 0
        let mut emu = boot(ProcessorModel::Mc68020, &[0x80C1]);
        set_vector(&mut emu, vector::ZERO_DIVIDE, 0x2000);
        assert!(emu.step());
        assert_eq!(emu.state().regs.a[7], SSP - 12);
        let s = emu.state_mut();
        assert_eq!(s.read_mem(SSP - 6, crate::params::OpSize::Word), Ok(0x2014));
        assert_eq!(s.read_mem(SSP - 4, crate::params::OpSize::Long), Ok(START));
    }

    #[test]
    fn unmapped_vector_is_a_double_fault() {
        let mut emu = boot(ProcessorModel::Mc68000, &[0x4AFC]);
        set_vector(&mut emu, vector::ILLEGAL_INSTRUCTION, 0x0002_0000);
        assert!(!emu.step());
        assert_eq!(emu.condition(), RunCondition::Halted);
    }

    #[test]
    fn interrupt_respects_the_mask() {
        let mut emu = boot(ProcessorModel::Mc68000, &[0x4E71]);
        set_vector(&mut emu, vector::AUTOVECTOR_BASE + 3, 0x3000);
        set_vector(&mut emu, vector::AUTOVECTOR_BASE + 7, 0x3100);
        assert!(!emu.interrupt(3));

        assert!(emu.interrupt(7));
        assert_eq!(emu.state().pc(), 0x3100);
        assert_eq!(emu.state().sr.iii, 7);

        emu.state_mut().sr.iii = 2;
        assert!(emu.interrupt(3));
        assert_eq!(emu.state().pc(), 0x3000);
        assert_eq!(emu.state().sr.iii, 3);
    }

    #[test]
    fn instruction_limit_stops_the_loop() {
        let config = EmulatorConfig::default().with_instruction_limit(2);
        let mut mem = FlatMemory::new(0x1_0000);
        assert!(mem.load(0, &SSP.to_be_bytes()));
        assert!(mem.load(4, &START.to_be_bytes()));
        // BRA.S *
        assert!(mem.load(START, &[0x60, 0xFE]));
        let mut emu = Emulator::new(config, mem);
        emu.reset();
        assert_eq!(emu.run(), 2);
        assert_eq!(emu.condition(), RunCondition::Running);
        assert!(!emu.step());
    }

    #[test]
    fn query_reports_registers_and_flags() {
        let mut emu = boot(ProcessorModel::Mc68000, &[0x4E71]);
        emu.state_mut().regs.d[3] = 0xDEAD_BEEF;
        emu.state_mut().regs.a[2] = 0x0010_0000;
        emu.state_mut().set_ccr(Z | 0x10);

        assert_eq!(emu.query("d3"), Some(Value::U32(0xDEAD_BEEF)));
        assert_eq!(emu.query("a2"), Some(Value::U32(0x0010_0000)));
        assert_eq!(emu.query("a7"), Some(Value::U32(SSP)));
        assert_eq!(emu.query("isp"), Some(Value::U32(SSP)));
        assert_eq!(emu.query("sr"), Some(Value::U16(0x2714)));
        assert_eq!(emu.query("flags.z"), Some(Value::Bool(true)));
        assert_eq!(emu.query("flags.x"), Some(Value::Bool(true)));
        assert_eq!(emu.query("flags.c"), Some(Value::Bool(false)));
        assert_eq!(emu.query("condition"), Some(Value::from("Running")));
        assert_eq!(emu.query("d8"), None);
        assert_eq!(emu.query("nonexistent"), None);
    }

    #[test]
    fn every_listed_path_answers() {
        let emu = boot(ProcessorModel::Mc68020, &[0x4E71]);
        for path in emu.query_paths() {
            assert!(emu.query(path).is_some(), "{path}");
        }
    }
}
