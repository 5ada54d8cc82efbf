use crate::constants::{KEY_COUNT, MEMORY_SIZE, PROGRAM_START, SPRITE_SHEET, STACK_DEPTH};
use crate::error::{Chip8Error, Result};
use crate::framebuffer::FrameBuffer;
use crate::opcode;

/// A snapshot of the Chip-8 machine state
///
/// ## CPU
/// Registers
/// - (v) 16 8-bit registers (V0..VF)
///     - VF doubles as the carry, borrow and collision flag
/// - (i) a 16-bit index register used to address memory
///
/// Counter
/// - (pc) a 16-bit program counter, starting at 0x200
///
/// Stack
/// - 16 return addresses
/// - (sp) the number of live entries, so `stack[sp - 1]` is the top
///
/// Timers
/// - 2 8-bit timers (delay & sound) that count down to 0 at 60Hz
/// - the tone sounds while the sound timer is non-zero
///
/// ## Memory
/// - 4096 bytes, the sprite sheet at 0x000 and the program from 0x200
/// - a 64x32 frame buffer
///
/// ## Input
/// - the pressed status of keys 0..F
#[derive(Copy, Clone)]
pub struct State {
    pub v: [u8; 16],
    pub i: u16,
    pub pc: u16,
    pub sp: usize,
    pub stack: [u16; STACK_DEPTH],
    pub delay_timer: u8,
    pub sound_timer: u8,
    pub memory: [u8; MEMORY_SIZE],
    pub frame_buffer: FrameBuffer,
    pub keys: [bool; KEY_COUNT],
    pub draw_flag: bool,
}

impl State {
    pub fn new() -> Self {
        let mut memory = [0; MEMORY_SIZE];
        memory[..SPRITE_SHEET.len()].copy_from_slice(&SPRITE_SHEET);

        State {
            v: [0; 16],
            i: 0,
            pc: PROGRAM_START,
            sp: 0,
            stack: [0; STACK_DEPTH],
            delay_timer: 0,
            sound_timer: 0,
            memory,
            frame_buffer: FrameBuffer::new(),
            keys: [false; KEY_COUNT],
            draw_flag: false,
        }
    }

    /// Gets the opcode pointed at by the pc.
    pub fn fetch(&self) -> Result<u16> {
        let pc = self.pc as usize;
        let bytes = self.read(pc, 2)?;
        Ok(opcode::from_bytes(bytes[0], bytes[1]))
    }

    /// Borrows `len` bytes of memory starting at `address`
    pub fn read(&self, address: usize, len: usize) -> Result<&[u8]> {
        check_range(address, len)?;
        Ok(&self.memory[address..address + len])
    }

    /// Mutably borrows `len` bytes of memory starting at `address`
    pub fn write(&mut self, address: usize, len: usize) -> Result<&mut [u8]> {
        check_range(address, len)?;
        Ok(&mut self.memory[address..address + len])
    }

    /// The highest-indexed key currently held down, if any.
    pub fn pressed_key(&self) -> Option<u8> {
        self.keys.iter().rposition(|&pressed| pressed).map(|key| key as u8)
    }

    pub fn is_pressed(&self, key: u8) -> bool {
        self.keys.get(key as usize).copied().unwrap_or(false)
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

fn check_range(address: usize, len: usize) -> Result<()> {
    if address + len > MEMORY_SIZE {
        // report the first byte that falls outside memory
        return Err(Chip8Error::AddressOutOfRange {
            address: address.max(MEMORY_SIZE),
        });
    }
    Ok(())
}

#[cfg(test)]
mod test_state {
    use super::*;

    #[test]
    fn test_new_state_loads_sprite_sheet() {
        let state = State::new();
        assert_eq!(state.memory[..80], SPRITE_SHEET[..]);
        assert!(state.memory[80..].iter().all(|&b| b == 0));
        assert_eq!(state.pc, 0x200);
        assert_eq!(state.sp, 0);
    }

    #[test]
    fn test_fetch_joins_bytes() {
        let mut state = State::new();
        state.memory[0x200..0x202].copy_from_slice(&[0xAA, 0xBB]);
        assert_eq!(state.fetch().unwrap(), 0xAABB);
    }

    #[test]
    fn test_fetch_past_end_of_memory() {
        let mut state = State::new();
        state.pc = 0xFFF;
        assert!(matches!(
            state.fetch(),
            Err(Chip8Error::AddressOutOfRange { address: 0x1000 })
        ));
    }

    #[test]
    fn test_read_and_write_bounds() {
        let mut state = State::new();
        assert!(state.write(0xFFD, 3).is_ok());
        assert!(state.write(0xFFE, 3).is_err());
        assert!(state.read(0x1000, 1).is_err());
    }

    #[test]
    fn test_pressed_key_prefers_highest() {
        let mut state = State::new();
        assert_eq!(state.pressed_key(), None);
        state.keys[0x3] = true;
        state.keys[0xA] = true;
        assert_eq!(state.pressed_key(), Some(0xA));
    }

    #[test]
    fn test_is_pressed_ignores_keys_off_the_pad() {
        let mut state = State::new();
        state.keys[0xF] = true;
        assert!(state.is_pressed(0xF));
        assert!(!state.is_pressed(0x10));
    }
}
