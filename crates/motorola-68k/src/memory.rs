//! Memory interface: big-endian byte/word/long access tagged with a
//! function code.
//!
//! The core never checks alignment here. Callers reject odd word/long
//! addresses first, so an out-of-range access (bus error) and a misaligned
//! one (address error) stay distinct.

/// Function code values from the FC0-FC2 pins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionCode {
    /// FC=0 (reserved).
    UserReserved = 0,
    /// User data access (FC=1).
    UserData = 1,
    /// User program access (FC=2).
    UserProgram = 2,
    /// FC=3 (user-defined).
    UserDefined = 3,
    /// FC=4 (reserved).
    SupervisorReserved = 4,
    /// Supervisor data access (FC=5).
    SupervisorData = 5,
    /// Supervisor program access (FC=6).
    SupervisorProgram = 6,
    /// CPU space: interrupt acknowledge, breakpoint cycles (FC=7).
    CpuSpace = 7,
}

impl FunctionCode {
    /// Build a function code from supervisor flag and program/data flag.
    #[must_use]
    pub const fn from_flags(supervisor: bool, program: bool) -> Self {
        match (supervisor, program) {
            (false, false) => Self::UserData,
            (false, true) => Self::UserProgram,
            (true, false) => Self::SupervisorData,
            (true, true) => Self::SupervisorProgram,
        }
    }

    /// Decode the low three bits of SFC/DFC.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        match bits & 7 {
            0 => Self::UserReserved,
            1 => Self::UserData,
            2 => Self::UserProgram,
            3 => Self::UserDefined,
            4 => Self::SupervisorReserved,
            5 => Self::SupervisorData,
            6 => Self::SupervisorProgram,
            _ => Self::CpuSpace,
        }
    }

    /// Returns the 3-bit value for the function code.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub const fn is_supervisor(self) -> bool {
        self.bits() & 4 != 0
    }
}

/// Intent of a [`Memory::translate`] request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

/// Addressable memory seen by the CPU.
///
/// Reads return `None` and writes return `false` when the access fails; the
/// caller reports a bus error and must not assume a failed multi-byte write
/// left memory untouched. Word and long defaults are built big-endian from
/// byte accesses.
pub trait Memory {
    fn get_byte(&mut self, addr: u32, fc: FunctionCode) -> Option<u8>;

    fn put_byte(&mut self, addr: u32, value: u8, fc: FunctionCode) -> bool;

    /// Borrow `len` bytes starting at `addr` for direct access.
    ///
    /// Used for operands that touch a run of bytes at once (MOVEP, MOVES).
    /// Returns `None` when any byte of the run is unmapped or the access is
    /// not allowed in `fc`.
    fn translate(&mut self, addr: u32, len: u32, fc: FunctionCode, access: Access) -> Option<&mut [u8]>;

    fn get_word(&mut self, addr: u32, fc: FunctionCode) -> Option<u16> {
        let hi = self.get_byte(addr, fc)?;
        let lo = self.get_byte(addr.wrapping_add(1), fc)?;
        Some(u16::from_be_bytes([hi, lo]))
    }

    fn get_long(&mut self, addr: u32, fc: FunctionCode) -> Option<u32> {
        let hi = self.get_word(addr, fc)?;
        let lo = self.get_word(addr.wrapping_add(2), fc)?;
        Some(u32::from(hi) << 16 | u32::from(lo))
    }

    fn put_word(&mut self, addr: u32, value: u16, fc: FunctionCode) -> bool {
        let [hi, lo] = value.to_be_bytes();
        self.put_byte(addr, hi, fc) && self.put_byte(addr.wrapping_add(1), lo, fc)
    }

    fn put_long(&mut self, addr: u32, value: u32, fc: FunctionCode) -> bool {
        self.put_word(addr, (value >> 16) as u16, fc) && self.put_word(addr.wrapping_add(2), value as u16, fc)
    }

    /// Opcode and extension-word fetch; separate so hosts can watch the
    /// instruction stream.
    fn get_instruction_word(&mut self, addr: u32, fc: FunctionCode) -> Option<u16> {
        self.get_word(addr, fc)
    }

    /// RESET instruction asserts the reset line.
    fn reset(&mut self) {}
}

impl<T: Memory + ?Sized> Memory for &mut T {
    fn get_byte(&mut self, addr: u32, fc: FunctionCode) -> Option<u8> {
        (**self).get_byte(addr, fc)
    }

    fn put_byte(&mut self, addr: u32, value: u8, fc: FunctionCode) -> bool {
        (**self).put_byte(addr, value, fc)
    }

    fn translate(&mut self, addr: u32, len: u32, fc: FunctionCode, access: Access) -> Option<&mut [u8]> {
        (**self).translate(addr, len, fc, access)
    }

    fn get_word(&mut self, addr: u32, fc: FunctionCode) -> Option<u16> {
        (**self).get_word(addr, fc)
    }

    fn get_long(&mut self, addr: u32, fc: FunctionCode) -> Option<u32> {
        (**self).get_long(addr, fc)
    }

    fn put_word(&mut self, addr: u32, value: u16, fc: FunctionCode) -> bool {
        (**self).put_word(addr, value, fc)
    }

    fn put_long(&mut self, addr: u32, value: u32, fc: FunctionCode) -> bool {
        (**self).put_long(addr, value, fc)
    }

    fn get_instruction_word(&mut self, addr: u32, fc: FunctionCode) -> Option<u16> {
        (**self).get_instruction_word(addr, fc)
    }

    fn reset(&mut self) {
        (**self).reset();
    }
}

/// Flat RAM starting at address 0. Every space sees the same bytes; anything
/// past the end is a bus error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatMemory {
    data: Vec<u8>,
}

impl FlatMemory {
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self { data: vec![0; size] }
    }

    /// Copy `bytes` in at `addr`. Returns `false` (copying nothing) if the
    /// image does not fit.
    pub fn load(&mut self, addr: u32, bytes: &[u8]) -> bool {
        match self.range(addr, bytes.len()) {
            Some(range) => {
                self.data[range].copy_from_slice(bytes);
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    fn range(&self, addr: u32, len: usize) -> Option<std::ops::Range<usize>> {
        let start = usize::try_from(addr).ok()?;
        let end = start.checked_add(len)?;
        (end <= self.data.len()).then_some(start..end)
    }
}

impl Memory for FlatMemory {
    fn get_byte(&mut self, addr: u32, _fc: FunctionCode) -> Option<u8> {
        let index = usize::try_from(addr).ok()?;
        self.data.get(index).copied()
    }

    fn put_byte(&mut self, addr: u32, value: u8, _fc: FunctionCode) -> bool {
        let Ok(index) = usize::try_from(addr) else {
            return false;
        };
        match self.data.get_mut(index) {
            Some(byte) => {
                *byte = value;
                true
            }
            None => false,
        }
    }

    fn translate(&mut self, addr: u32, len: u32, _fc: FunctionCode, _access: Access) -> Option<&mut [u8]> {
        let range = self.range(addr, usize::try_from(len).ok()?)?;
        self.data.get_mut(range)
    }

    fn get_word(&mut self, addr: u32, _fc: FunctionCode) -> Option<u16> {
        let range = self.range(addr, 2)?;
        let bytes = &self.data[range];
        Some(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    fn get_long(&mut self, addr: u32, _fc: FunctionCode) -> Option<u32> {
        let range = self.range(addr, 4)?;
        let bytes = &self.data[range];
        Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn put_word(&mut self, addr: u32, value: u16, _fc: FunctionCode) -> bool {
        self.translate(addr, 2, FunctionCode::SupervisorData, Access::Write)
            .map(|run| run.copy_from_slice(&value.to_be_bytes()))
            .is_some()
    }

    fn put_long(&mut self, addr: u32, value: u32, _fc: FunctionCode) -> bool {
        self.translate(addr, 4, FunctionCode::SupervisorData, Access::Write)
            .map(|run| run.copy_from_slice(&value.to_be_bytes()))
            .is_some()
    }
}
