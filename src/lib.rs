pub use audio::{Buzzer, Silent};
pub use chip8::{Chip8, Cycle, Step};
pub use config::{Config, SpriteWrap};
pub use constants::CLOCK_SPEED;
pub use error::{Chip8Error, Result};
pub use framebuffer::FrameBuffer;
pub use scheduler::Scheduler;
pub use state::State;

mod audio;
mod chip8;
mod config;
pub mod constants;
mod error;
mod framebuffer;
mod instruction;
mod opcode;
mod operations;
mod scheduler;
pub mod state;
