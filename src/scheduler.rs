//! Drives a `Chip8` from two clocks on a background thread.
//!
//! The instruction clock calls `step` and the timer clock calls `tick_timers`.
//! Both are serviced by the same thread, and every access to the machine goes
//! through one mutex, so readers on other threads see whole instructions only.

use std::io::Read;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, select, tick, Receiver, Sender};
use log::{debug, error, info, warn};

use crate::audio::{Buzzer, Silent};
use crate::chip8::{Chip8, Cycle};
use crate::config::Config;
use crate::error::{Chip8Error, Result};
use crate::framebuffer::FrameBuffer;

/// Handle on the running clock thread.
/// Dropping `control` disconnects the channel, which stops the thread.
struct Worker {
    control: Sender<()>,
    handle: JoinHandle<()>,
}

/// The buzzer outlives any one clock thread, so a restart keeps using it.
type SharedBuzzer = Arc<Mutex<Box<dyn Buzzer>>>;

/// # Scheduler
/// Owns the machine and the two clocks that run it.
///
/// ```text
/// initialize(rom) -> start() -> [pause() / resume()]* -> stop()
/// ```
pub struct Scheduler {
    config: Config,
    core: Arc<Mutex<Chip8>>,
    buzzer: SharedBuzzer,
    worker: Option<Worker>,
}

impl Scheduler {
    pub fn new(config: Config) -> Self {
        Self::with_buzzer(config, Silent)
    }

    pub fn with_buzzer(config: Config, buzzer: impl Buzzer + 'static) -> Self {
        Scheduler {
            config,
            core: Arc::new(Mutex::new(
                Chip8::new().with_sprite_wrap(config.sprite_wrap),
            )),
            buzzer: Arc::new(Mutex::new(Box::new(buzzer) as Box<dyn Buzzer>)),
            worker: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Resets the machine and loads a program. The clocks are not started.
    pub fn initialize(&mut self, image: &[u8]) -> Result<()> {
        self.config.validate()?;
        let mut core = self.lock()?;
        core.reset();
        core.load(image)
    }

    /// Like `initialize`, reading the program from `reader`
    pub fn initialize_from(&mut self, reader: &mut dyn Read) -> Result<()> {
        self.config.validate()?;
        let mut core = self.lock()?;
        core.reset();
        core.load_rom(reader)
    }

    /// Starts both clocks. They run until `stop` is called or the scheduler is dropped.
    pub fn start(&mut self) -> Result<()> {
        if self.worker.is_some() {
            return Err(Chip8Error::AlreadyRunning);
        }
        self.config.validate()?;

        let (control, stopped) = bounded(0);
        let core = Arc::clone(&self.core);
        let config = self.config;
        let buzzer = Arc::clone(&self.buzzer);

        let handle = thread::Builder::new()
            .name("chip8-clock".into())
            .spawn(move || clock_loop(core, config, buzzer, stopped))?;

        self.worker = Some(Worker { control, handle });
        info!(
            "clocks started: {}Hz instructions, {}Hz timers",
            self.config.instruction_hz, self.config.timer_hz
        );
        Ok(())
    }

    /// Stops both clocks and waits for the clock thread to finish.
    /// The machine keeps its state; `start` picks up where it left off.
    ///
    /// Returns `ClockPanicked` if the clock thread died, for example inside the
    /// buzzer. The clocks are stopped either way and can be started again.
    pub fn stop(&mut self) -> Result<()> {
        let worker = match self.worker.take() {
            Some(worker) => worker,
            None => return Ok(()),
        };
        drop(worker.control);
        if worker.handle.join().is_err() {
            error!("clock thread panicked");
            return Err(Chip8Error::ClockPanicked);
        }
        info!("clocks stopped");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Freezes execution and timers without stopping the clocks
    pub fn pause(&self) -> Result<()> {
        self.lock()?.pause();
        debug!("paused");
        Ok(())
    }

    pub fn resume(&self) -> Result<()> {
        self.lock()?.resume();
        debug!("resumed");
        Ok(())
    }

    pub fn is_paused(&self) -> Result<bool> {
        Ok(self.lock()?.is_paused())
    }

    /// A copy of the current frame
    pub fn frame(&self) -> Result<FrameBuffer> {
        Ok(self.lock()?.read_framebuffer())
    }

    /// The current frame if it changed since it was last taken
    pub fn take_frame(&self) -> Result<Option<FrameBuffer>> {
        Ok(self.lock()?.take_frame())
    }

    pub fn press(&self, key: u8) -> Result<()> {
        self.lock()?.press(key)
    }

    pub fn release(&self, key: u8) -> Result<()> {
        self.lock()?.release(key)
    }

    pub fn tone_active(&self) -> Result<bool> {
        Ok(self.lock()?.tone_active())
    }

    /// See `Chip8::subscribe`
    pub fn subscribe(&self, capacity: usize) -> Result<Receiver<Cycle>> {
        Ok(self.lock()?.subscribe(capacity))
    }

    /// Runs `f` against the machine while holding the lock
    pub fn with_core<R>(&self, f: impl FnOnce(&Chip8) -> R) -> Result<R> {
        let core = self.lock()?;
        Ok(f(&*core))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Chip8>> {
        self.core.lock().map_err(|_| Chip8Error::Poisoned)
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            error!("failed to stop clocks: {}", e);
        }
    }
}

fn period(hz: u32) -> Duration {
    Duration::from_nanos(1_000_000_000 / u64::from(hz))
}

/// Services both clocks until `stopped` disconnects.
fn clock_loop(
    core: Arc<Mutex<Chip8>>,
    config: Config,
    buzzer: SharedBuzzer,
    stopped: Receiver<()>,
) {
    let instructions = tick(period(config.instruction_hz));
    let timers = tick(period(config.timer_hz));
    let mut tone = false;
    // pc of the instruction that last failed, so a stuck program logs once
    let mut faulted_at: Option<u16> = None;

    loop {
        select! {
            recv(stopped) -> _ => break,
            recv(instructions) -> _ => {
                let mut chip8 = match core.lock() {
                    Ok(chip8) => chip8,
                    Err(_) => {
                        error!("machine state poisoned; stopping clocks");
                        break;
                    }
                };
                let pc = chip8.state().pc;
                match chip8.step() {
                    Ok(_) => faulted_at = None,
                    Err(e) => {
                        if faulted_at != Some(pc) {
                            warn!("{}", e);
                        }
                        faulted_at = Some(pc);
                    }
                }
            }
            recv(timers) -> _ => {
                let sounding = match core.lock() {
                    Ok(mut chip8) => chip8.tick_timers(),
                    Err(_) => {
                        error!("machine state poisoned; stopping clocks");
                        break;
                    }
                };
                if sounding != tone && !config.muted {
                    set_tone(&buzzer, sounding);
                }
                tone = sounding;
            }
        }
    }

    if tone && !config.muted {
        set_tone(&buzzer, false);
    }
}

/// A buzzer that panicked on an earlier clock thread is still usable.
fn set_tone(buzzer: &SharedBuzzer, active: bool) {
    buzzer
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .set_tone(active);
}
