use std::io;

use thiserror::Error;

/// Everything that can go wrong while loading or running a program.
///
/// Instruction errors are local to a single `step`: the instruction is not
/// committed and the machine can keep running.
#[derive(Debug, Error)]
pub enum Chip8Error {
    #[error("ROM is too large ({size} bytes), max size is {max} bytes")]
    RomTooLarge { size: usize, max: usize },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("stack overflow: call at {pc:#06X} exceeds 16 nested subroutines")]
    StackOverflow { pc: u16 },

    #[error("stack underflow: return at {pc:#06X} with an empty call stack")]
    StackUnderflow { pc: u16 },

    #[error("unknown opcode {opcode:#06X} at {pc:#06X}")]
    UnknownOpcode { opcode: u16, pc: u16 },

    #[error("memory access out of bounds at {address:#06X}")]
    AddressOutOfRange { address: usize },

    #[error("key {0:#04X} is outside the keypad 0x0..0xF")]
    InvalidKey(u8),

    #[error("clock rate must be non-zero, got {hz}Hz")]
    InvalidClockRate { hz: u32 },

    #[error("clocks are already running")]
    AlreadyRunning,

    #[error("machine state lock was poisoned by a panicking thread")]
    Poisoned,

    #[error("clock thread panicked")]
    ClockPanicked,
}

pub type Result<T> = std::result::Result<T, Chip8Error>;
