//! Motorola 68000-family CPU core: 68000, 68010, 68020, 68030 and the
//! 68040 integer unit.
//!
//! The core is instruction-stepped. A host supplies a [`Memory`]
//! implementation, populates the vector table, then drives an [`Emulator`]
//! with [`Emulator::reset`], [`Emulator::step`] and [`Emulator::interrupt`].
//!
//! ```
//! use motorola_68k::{Emulator, EmulatorConfig, FlatMemory, RunCondition};
//!
//! let mut mem = FlatMemory::new(0x1_0000);
//! mem.load(0, &[0x00, 0x00, 0x80, 0x00, 0x00, 0x00, 0x10, 0x00]);
//! // MOVEQ #1,D0 ; STOP #$FFFF
//! mem.load(0x1000, &[0x70, 0x01, 0x4E, 0x72, 0xFF, 0xFF]);
//!
//! let mut emu = Emulator::new(EmulatorConfig::default(), mem);
//! emu.reset();
//! emu.run();
//! assert_eq!(emu.state().regs.d[0], 1);
//! assert_eq!(emu.condition(), RunCondition::Finished);
//! ```

mod decode;
mod dispatch;
mod ea;
mod microcode;
mod params;

pub mod config;
pub mod emulator;
pub mod fault;
pub mod flags;
pub mod memory;
pub mod model;
pub mod observe;
pub mod registers;
pub mod state;

pub use config::EmulatorConfig;
pub use emulator::Emulator;
pub use fault::{Fault, FrameFormat, OpResult};
pub use flags::StatusRegister;
pub use memory::{Access, FlatMemory, FunctionCode, Memory};
pub use model::{ControlRegister, ProcessorModel};
pub use observe::{Observable, Value};
pub use params::OpSize;
pub use registers::Registers;
pub use state::{BreakpointHandler, ProcessorState, RunCondition};
