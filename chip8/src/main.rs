use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use log::info;

use genus::{Config, SpriteWrap, CLOCK_SPEED};

mod run;

/// Runs a Chip-8 ROM headlessly and prints the final frame
#[derive(Parser)]
#[command(version)]
pub struct Args {
    /// Path to ROM file
    pub rom: PathBuf,

    /// Instructions per second
    #[arg(long, default_value_t = CLOCK_SPEED)]
    pub hz: u32,

    /// How long to run for, in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub millis: u64,

    /// Keys (0-F) held down for the whole run
    #[arg(long, value_parser = parse_key)]
    pub hold: Vec<u8>,

    /// Wrap sprites around columns and rows independently
    #[arg(long)]
    pub toroidal: bool,

    /// Print every frame the program draws, not just the last one
    #[arg(long)]
    pub every_frame: bool,
}

impl Args {
    fn config(&self) -> Config {
        let wrap = if self.toroidal {
            SpriteWrap::Toroidal
        } else {
            SpriteWrap::Flat
        };
        Config::default()
            .instruction_hz(self.hz)
            .sprite_wrap(wrap)
            .muted(true)
    }
}

fn parse_key(s: &str) -> Result<u8, String> {
    match u8::from_str_radix(s, 16) {
        Ok(key) if key < 0x10 => Ok(key),
        _ => Err(format!("`{}` isn't a key; expected 0-F", s)),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();

    info!("running {}", args.rom.display());
    let frame = run::run(&args, args.config())?;
    print!("{}", frame);
    Ok(())
}
