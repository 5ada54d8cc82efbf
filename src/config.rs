//! Runtime configuration for the virtual machine and its clocks.

use crate::constants::{CLOCK_SPEED, DISPLAY_HEIGHT, DISPLAY_SIZE, DISPLAY_WIDTH, TIMER_SPEED};
use crate::error::{Chip8Error, Result};

/// How sprite pixels that fall off the edge of the screen are placed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SpriteWrap {
    /// Address the frame buffer by a single index `x + y * 64` and wrap that
    /// index around the whole buffer. A sprite running off the right edge
    /// continues on the next row; one running off the bottom reappears at the top.
    Flat,
    /// Wrap columns modulo 64 and rows modulo 32 independently.
    Toroidal,
}

impl SpriteWrap {
    /// Frame buffer cell for the sprite pixel at column `x`, row `y`.
    pub fn index(self, x: usize, y: usize) -> usize {
        match self {
            SpriteWrap::Flat => (x + y * DISPLAY_WIDTH) % DISPLAY_SIZE,
            SpriteWrap::Toroidal => x % DISPLAY_WIDTH + (y % DISPLAY_HEIGHT) * DISPLAY_WIDTH,
        }
    }
}

impl Default for SpriteWrap {
    fn default() -> Self {
        SpriteWrap::Flat
    }
}

/// # Config
/// - `instruction_hz` instructions executed per second
/// - `timer_hz` delay/sound timer decrements per second
/// - `sprite_wrap` edge behavior of DXYN
/// - `muted` suppresses every call to the buzzer
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Config {
    pub instruction_hz: u32,
    pub timer_hz: u32,
    pub sprite_wrap: SpriteWrap,
    pub muted: bool,
}

impl Config {
    pub fn instruction_hz(mut self, hz: u32) -> Self {
        self.instruction_hz = hz;
        self
    }

    pub fn timer_hz(mut self, hz: u32) -> Self {
        self.timer_hz = hz;
        self
    }

    pub fn sprite_wrap(mut self, wrap: SpriteWrap) -> Self {
        self.sprite_wrap = wrap;
        self
    }

    pub fn muted(mut self, muted: bool) -> Self {
        self.muted = muted;
        self
    }

    /// Both clocks need a non-zero rate to have a period.
    pub fn validate(&self) -> Result<()> {
        for &hz in &[self.instruction_hz, self.timer_hz] {
            if hz == 0 {
                return Err(Chip8Error::InvalidClockRate { hz });
            }
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            instruction_hz: CLOCK_SPEED,
            timer_hz: TIMER_SPEED,
            sprite_wrap: SpriteWrap::default(),
            muted: false,
        }
    }
}
