use std::io::Read;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use log::{debug, info, trace};

use crate::config::SpriteWrap;
use crate::constants::{KEY_COUNT, MAX_ROM_SIZE, PROGRAM_START};
use crate::error::{Chip8Error, Result};
use crate::framebuffer::FrameBuffer;
use crate::instruction;
use crate::operations::Transition;
use crate::state::State;

/// A completed instruction, as reported to observers
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Cycle {
    pub opcode: u16,
    /// Address the opcode was fetched from
    pub pc: u16,
    /// Wall time spent decoding and executing it
    pub elapsed: Duration,
}

/// What a call to `step` did
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Step {
    Executed(Cycle),
    /// FX0A is waiting for a key; the same instruction runs again next step
    AwaitingKey,
    /// The machine is paused and nothing ran
    Paused,
}

/// # Chip-8
/// Chip-8 is a virtual machine and corresponding interpreted language.
///
/// Tracks:
///  - current `state`
///  - whether execution is `paused`
///  - `observers` notified after every completed instruction
///
/// Supplies interfaces for:
/// - resetting the machine and loading roms
/// - pressing and releasing keys
/// - advancing the CPU by one instruction
/// - advancing its timers
/// - inspecting its frame buffer for rendering by some display
pub struct Chip8 {
    state: State,
    paused: bool,
    rom_size: usize,
    sprite_wrap: SpriteWrap,
    observers: Vec<Sender<Cycle>>,
}

impl Chip8 {
    pub fn new() -> Self {
        Chip8 {
            state: State::new(),
            paused: false,
            rom_size: 0,
            sprite_wrap: SpriteWrap::default(),
            observers: Vec::new(),
        }
    }

    pub fn with_sprite_wrap(mut self, wrap: SpriteWrap) -> Self {
        self.sprite_wrap = wrap;
        self
    }

    /// Returns the machine to its power-on state: memory zeroed apart from the
    /// sprite sheet, registers, stack, timers, keys and screen cleared, pc at 0x200.
    pub fn reset(&mut self) {
        self.state = State::new();
        self.paused = false;
        self.rom_size = 0;
        debug!("machine reset");
    }

    /// Copies a program image into memory at 0x200
    ///
    /// # Arguments
    /// * `image` raw machine code; at most 3584 bytes
    pub fn load(&mut self, image: &[u8]) -> Result<()> {
        if image.len() > MAX_ROM_SIZE {
            return Err(Chip8Error::RomTooLarge {
                size: image.len(),
                max: MAX_ROM_SIZE,
            });
        }
        self.state
            .write(PROGRAM_START as usize, image.len())?
            .copy_from_slice(image);
        self.rom_size = image.len();
        info!("loaded {} byte ROM at {:#05X}", image.len(), PROGRAM_START);
        Ok(())
    }

    /// Load a rom from a source file
    ///
    /// # Arguments
    /// * `reader` a file reader that contains a ROM
    pub fn load_rom(&mut self, reader: &mut dyn Read) -> Result<()> {
        let mut image = Vec::new();
        reader.read_to_end(&mut image)?;
        self.load(&image)
    }

    /// Size of the last loaded ROM in bytes
    pub fn rom_size(&self) -> usize {
        self.rom_size
    }

    /// Advances the CPU by a single instruction
    /// - does nothing while paused
    /// - gets and executes the next opcode
    /// - commits the new state only if the instruction succeeded
    pub fn step(&mut self) -> Result<Step> {
        if self.paused {
            return Ok(Step::Paused);
        }

        let started = Instant::now();
        let pc = self.state.pc;
        let opcode = self.state.fetch()?;
        trace!(
            "{:04X} v{:02X?} i{:04X} pc{:04X}",
            opcode,
            self.state.v,
            self.state.i,
            pc
        );

        let operation =
            instruction::from_op(&opcode).ok_or(Chip8Error::UnknownOpcode { opcode, pc })?;
        match operation(&opcode, &self.state, self.sprite_wrap)? {
            Transition::Blocked => Ok(Step::AwaitingKey),
            Transition::Next(state) => {
                self.state = state;
                let cycle = Cycle {
                    opcode,
                    pc,
                    elapsed: started.elapsed(),
                };
                self.notify(cycle);
                Ok(Step::Executed(cycle))
            }
        }
    }

    /// Decrements the delay and sound timers once.
    /// Returns true if the tone sounds for this tick, meaning the sound timer was
    /// non-zero before the decrement. With a sound timer of 1 this returns true
    /// and leaves `tone_active()` false.
    /// Timers are frozen while paused.
    pub fn tick_timers(&mut self) -> bool {
        if self.paused {
            return false;
        }
        self.state.delay_timer = self.state.delay_timer.saturating_sub(1);
        let sounding = self.state.sound_timer != 0;
        if sounding {
            self.state.sound_timer -= 1;
        }
        sounding
    }

    /// Whether the tone should currently be playing
    pub fn tone_active(&self) -> bool {
        self.state.sound_timer != 0
    }

    /// Set the pressed status of key
    ///
    /// # Arguments
    /// * `key` the keypad index 0x0..=0xF
    pub fn press(&mut self, key: u8) -> Result<()> {
        *self.key_mut(key)? = true;
        Ok(())
    }

    /// Unset the pressed status of key
    ///
    /// # Arguments
    /// * `key` the keypad index 0x0..=0xF
    pub fn release(&mut self, key: u8) -> Result<()> {
        *self.key_mut(key)? = false;
        Ok(())
    }

    pub fn is_key_pressed(&self, key: u8) -> bool {
        self.state.is_pressed(key)
    }

    fn key_mut(&mut self, key: u8) -> Result<&mut bool> {
        if key as usize >= KEY_COUNT {
            return Err(Chip8Error::InvalidKey(key));
        }
        Ok(&mut self.state.keys[key as usize])
    }

    /// A copy of the current frame
    pub fn read_framebuffer(&self) -> FrameBuffer {
        self.state.frame_buffer
    }

    /// Returns the FrameBuffer if the display should be redrawn, and marks it drawn
    pub fn take_frame(&mut self) -> Option<FrameBuffer> {
        if self.state.draw_flag {
            self.state.draw_flag = false;
            Some(self.state.frame_buffer)
        } else {
            None
        }
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Read-only view of the machine state, for tracing and debuggers
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Receives a `Cycle` for every completed instruction.
    ///
    /// Holds at most `capacity` unread cycles; newer ones are dropped until the
    /// receiver catches up, so a slow observer never holds up the CPU.
    pub fn subscribe(&mut self, capacity: usize) -> Receiver<Cycle> {
        let (tx, rx) = bounded(capacity);
        self.observers.push(tx);
        rx
    }

    fn notify(&mut self, cycle: Cycle) {
        self.observers
            .retain(|tx| !matches!(tx.try_send(cycle), Err(TrySendError::Disconnected(_))));
    }
}

impl Default for Chip8 {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test_chip8 {
    use super::*;
    use crate::constants::SPRITE_SHEET;

    fn with_program(program: &[u8]) -> Chip8 {
        let mut chip8 = Chip8::new();
        chip8.load(program).unwrap();
        chip8
    }

    fn executed(step: Result<Step>) -> Cycle {
        match step {
            Ok(Step::Executed(cycle)) => cycle,
            other => panic!("expected an executed cycle, got {:?}", other),
        }
    }

    #[test]
    fn test_draws_zero_glyph() {
        let mut chip8 = with_program(&[0xA2, 0x28, 0xF0, 0x29, 0xD0, 0x05]);
        for _ in 0..3 {
            executed(chip8.step());
        }
        let frame = chip8.read_framebuffer();
        for (row, bits) in SPRITE_SHEET[..5].iter().enumerate() {
            for col in 0..8 {
                assert_eq!(frame.pixel(col, row), *bits & (0x80u8 >> col) != 0);
            }
        }
        assert_eq!(chip8.state().pc, 0x206);
    }

    #[test]
    fn test_load_largest_rom() {
        let mut chip8 = Chip8::new();
        let image = vec![0xAB; 4096 - 0x200];
        chip8.load(&image).unwrap();
        assert_eq!(chip8.state().memory[0xFFF], 0xAB);
        assert_eq!(chip8.rom_size(), 3584);
    }

    #[test]
    fn test_load_rejects_oversized_rom() {
        let mut chip8 = Chip8::new();
        let image = vec![0xAB; 4096 - 0x200 + 1];
        assert!(matches!(
            chip8.load(&image),
            Err(Chip8Error::RomTooLarge {
                size: 3585,
                max: 3584
            })
        ));
        assert_eq!(chip8.state().memory[0x200], 0x0);
        assert_eq!(chip8.rom_size(), 0);
    }

    #[test]
    fn test_load_rom_from_reader() {
        let mut chip8 = Chip8::new();
        let mut reader: &[u8] = &[0x00, 0xE0];
        chip8.load_rom(&mut reader).unwrap();
        assert_eq!(chip8.state().memory[0x200..0x202], [0x00, 0xE0]);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut chip8 = with_program(&[0x61, 0x05, 0xF1, 0x15, 0x00, 0xE0]);
        chip8.step().unwrap();
        chip8.step().unwrap();
        chip8.press(0x3).unwrap();
        chip8.pause();
        chip8.reset();
        chip8.reset();
        let state = chip8.state();
        assert_eq!(state.pc, 0x200);
        assert_eq!(state.v, [0; 16]);
        assert_eq!(state.delay_timer, 0);
        assert_eq!(state.memory[..80], SPRITE_SHEET[..]);
        assert_eq!(state.memory[0x200], 0x0);
        assert!(!chip8.is_key_pressed(0x3));
        assert!(!chip8.is_paused());
    }

    #[test]
    fn test_step_reports_cycle() {
        let mut chip8 = with_program(&[0x00, 0xE0]);
        let cycle = executed(chip8.step());
        assert_eq!(cycle.opcode, 0x00E0);
        assert_eq!(cycle.pc, 0x200);
    }

    #[test]
    fn test_fx0a_spins_until_key_pressed() {
        let mut chip8 = with_program(&[0xF3, 0x0A]);
        for _ in 0..5 {
            assert_eq!(chip8.step().unwrap(), Step::AwaitingKey);
            assert_eq!(chip8.state().pc, 0x200);
        }
        chip8.press(0xB).unwrap();
        executed(chip8.step());
        assert_eq!(chip8.state().v[0x3], 0xB);
        assert_eq!(chip8.state().pc, 0x202);
    }

    #[test]
    fn test_paused_step_is_noop() {
        let mut chip8 = with_program(&[0x61, 0x05]);
        chip8.pause();
        assert_eq!(chip8.step().unwrap(), Step::Paused);
        assert_eq!(chip8.state().pc, 0x200);
        chip8.resume();
        executed(chip8.step());
        assert_eq!(chip8.state().v[0x1], 0x05);
    }

    #[test]
    fn test_unknown_opcode_doesnt_advance() {
        let mut chip8 = with_program(&[0xFF, 0xFF]);
        for _ in 0..2 {
            assert!(matches!(
                chip8.step(),
                Err(Chip8Error::UnknownOpcode {
                    opcode: 0xFFFF,
                    pc: 0x200
                })
            ));
        }
        assert_eq!(chip8.state().pc, 0x200);
    }

    #[test]
    fn test_stack_overflow_leaves_state_untouched() {
        // 0x200: V0 += 1; call 0x200
        let mut chip8 = with_program(&[0x70, 0x01, 0x22, 0x00]);
        for _ in 0..16 {
            executed(chip8.step());
            executed(chip8.step());
        }
        executed(chip8.step());
        let pc = chip8.state().pc;
        assert!(matches!(
            chip8.step(),
            Err(Chip8Error::StackOverflow { pc: 0x202 })
        ));
        assert_eq!(chip8.state().pc, pc);
        assert_eq!(chip8.state().sp, 16);
        assert_eq!(chip8.state().v[0x0], 17);
    }

    #[test]
    fn test_stack_underflow() {
        let mut chip8 = with_program(&[0x00, 0xEE]);
        assert!(matches!(
            chip8.step(),
            Err(Chip8Error::StackUnderflow { pc: 0x200 })
        ));
        assert_eq!(chip8.state().pc, 0x200);
    }

    #[test]
    fn test_fetch_past_end_of_memory() {
        let mut chip8 = with_program(&[0x1F, 0xFF]);
        executed(chip8.step());
        assert!(matches!(
            chip8.step(),
            Err(Chip8Error::AddressOutOfRange { .. })
        ));
    }

    #[test]
    fn test_invalid_key_is_rejected() {
        let mut chip8 = Chip8::new();
        assert!(matches!(chip8.press(0x10), Err(Chip8Error::InvalidKey(0x10))));
        assert!(matches!(chip8.release(0xFF), Err(Chip8Error::InvalidKey(0xFF))));
        chip8.press(0xF).unwrap();
        assert!(chip8.is_key_pressed(0xF));
        chip8.release(0xF).unwrap();
        assert!(!chip8.is_key_pressed(0xF));
    }

    #[test]
    fn test_tick_timers() {
        // delay = 2, sound = 1
        let mut chip8 = with_program(&[0x60, 0x02, 0xF0, 0x15, 0x61, 0x01, 0xF1, 0x18]);
        for _ in 0..4 {
            chip8.step().unwrap();
        }
        assert!(chip8.tone_active());
        assert!(chip8.tick_timers());
        assert!(!chip8.tone_active());
        assert_eq!(chip8.state().delay_timer, 1);
        assert!(!chip8.tick_timers());
        assert!(!chip8.tick_timers());
        assert_eq!(chip8.state().delay_timer, 0);
    }

    #[test]
    fn test_last_sounding_tick_leaves_tone_off() {
        // sound = 1
        let mut chip8 = with_program(&[0x60, 0x01, 0xF0, 0x18]);
        chip8.step().unwrap();
        chip8.step().unwrap();
        assert!(chip8.tick_timers());
        assert!(!chip8.tone_active());
        assert_eq!(chip8.state().sound_timer, 0);
        assert!(!chip8.tick_timers());
    }

    #[test]
    fn test_timers_freeze_while_paused() {
        let mut chip8 = with_program(&[0x60, 0x02, 0xF0, 0x15]);
        chip8.step().unwrap();
        chip8.step().unwrap();
        chip8.pause();
        chip8.tick_timers();
        assert_eq!(chip8.state().delay_timer, 2);
    }

    #[test]
    fn test_take_frame_only_after_draw() {
        let mut chip8 = with_program(&[0x61, 0x01, 0x00, 0xE0]);
        chip8.step().unwrap();
        assert!(chip8.take_frame().is_none());
        chip8.step().unwrap();
        assert!(chip8.take_frame().unwrap().is_clear());
        assert!(chip8.take_frame().is_none());
    }

    #[test]
    fn test_observers_receive_cycles() {
        let mut chip8 = with_program(&[0x61, 0x01, 0xF1, 0x0A]);
        let cycles = chip8.subscribe(4);
        chip8.step().unwrap();
        chip8.step().unwrap();
        assert_eq!(cycles.try_recv().unwrap().opcode, 0x6101);
        // FX0A spin is not a completed cycle
        assert!(cycles.try_recv().is_err());
    }

    #[test]
    fn test_full_observer_doesnt_block() {
        let mut chip8 = with_program(&[0x12, 0x00]);
        let cycles = chip8.subscribe(1);
        for _ in 0..10 {
            executed(chip8.step());
        }
        assert_eq!(cycles.len(), 1);
    }

    #[test]
    fn test_dropped_observer_is_forgotten() {
        let mut chip8 = with_program(&[0x12, 0x00]);
        drop(chip8.subscribe(1));
        chip8.step().unwrap();
        assert!(chip8.observers.is_empty());
    }

    #[test]
    fn test_toroidal_wrap_is_configurable() {
        // V1 = 62; I = glyph 0; draw 1 row at (V1, V0)
        let mut chip8 =
            with_program(&[0x61, 0x3E, 0xD1, 0x01]).with_sprite_wrap(SpriteWrap::Toroidal);
        chip8.step().unwrap();
        chip8.step().unwrap();
        let frame = chip8.read_framebuffer();
        assert!(frame.pixel(62, 0) && frame.pixel(63, 0));
        assert!(frame.pixel(0, 0) && frame.pixel(1, 0));
        assert!(!frame.pixel(0, 1));
    }
}
