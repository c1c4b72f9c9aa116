//! air_piano — interactive entry point.

use std::path::PathBuf;

use clap::Parser;

use air_piano::app::{run, run_headless};
use air_piano::config::{default_config_path, load_config, AppConfig};
use air_piano::error::AppError;
use air_piano::source::{ReplayHandSource, Trace};

#[derive(Parser, Debug)]
#[command(author, version, about = "Two-octave virtual piano played with tracked fingertips")]
struct Args {
    /// Config file (default: <config dir>/air_piano/config.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Replay a recorded fingertip trace instead of the mouse simulation
    #[arg(short, long)]
    replay: Option<PathBuf>,

    /// Replay without opening a window; notes are only logged
    #[arg(long)]
    headless: bool,

    /// Write the session's notes to this MIDI file on exit
    #[arg(long)]
    record: Option<PathBuf>,

    /// Ignore the config file and start with defaults
    #[arg(long)]
    quick: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║        Air Piano — two octaves at your fingertips            ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    if let Err(e) = start(args) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn start(args: Args) -> Result<(), AppError> {
    let mut cfg = if args.quick {
        println!("  Quick-start: default window, grand piano, no config file\n");
        AppConfig::default()
    } else {
        let path = args.config.unwrap_or_else(default_config_path);
        load_config(&path)?
    };
    if let Some(path) = args.record {
        cfg.record_path = Some(path);
    }

    let replay = match args.replay {
        Some(path) => Some(ReplayHandSource::new(Trace::load(&path)?)),
        None       => None,
    };

    if args.headless {
        let replay = replay.ok_or(AppError::HeadlessWithoutTrace)?;
        run_headless(cfg, replay)?;
        return Ok(());
    }

    match replay {
        Some(_) => println!("  Mode: trace replay"),
        None    => println!("  Mode: mouse simulation  (hold the left button over a key, Q quits)"),
    }
    println!();
    println!("  Opening keyboard window…");
    println!();

    run(cfg, replay)
}
