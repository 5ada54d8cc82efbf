use std::error::Error;
use std::fs::File;
use std::io::BufReader;
use std::thread;
use std::time::{Duration, Instant};

use log::debug;

use genus::{Config, FrameBuffer, Scheduler};

use crate::Args;

/// Roughly how often a display would poll for a new frame
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

pub fn run(args: &Args, config: Config) -> Result<FrameBuffer, Box<dyn Error>> {
    // Load ROM
    let mut rom = BufReader::new(File::open(&args.rom)?);
    let mut scheduler = Scheduler::new(config);
    scheduler.initialize_from(&mut rom)?;
    for &key in &args.hold {
        scheduler.press(key)?;
    }
    let cycles = scheduler.subscribe(4096)?;
    scheduler.start()?;

    let run_time = Duration::from_millis(args.millis);
    let started = Instant::now();
    let mut executed = 0usize;

    while started.elapsed() < run_time {
        thread::sleep(FRAME_INTERVAL.min(run_time - started.elapsed().min(run_time)));
        executed += cycles.try_iter().count();
        if let Some(frame) = scheduler.take_frame()? {
            debug!("frame updated, {} pixels lit", frame.lit());
            if args.every_frame {
                println!("{}", frame);
            }
        }
    }

    scheduler.stop()?;
    executed += cycles.try_iter().count();
    debug!("{} instructions in {:?}", executed, started.elapsed());
    Ok(scheduler.frame()?)
}
