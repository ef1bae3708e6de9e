use std::error::Error;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use env_logger::Target;
use log::LevelFilter;

use chip8::display::{MonoTermDisplay, DISPLAY_HEIGHT, DISPLAY_WIDTH};
use chip8::environment::{Environment, EnvironmentConfig};
use chip8::input::StdinInput;
use chip8::interpreter::Chip8Interpreter;
use chip8::sound::{Mute, SimpleBeep, Sound};
use chip8::Quirks;

/// Run a CHIP-8 program in the terminal.
///
/// Keys 1234/qwer/asdf/zxcv are the hex keypad; Esc quits.
///
/// Logging goes to the --log file only, filtered by RUST_LOG (default info);
/// the terminal itself is taken over by the display.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// CHIP-8 program image to run
    rom: PathBuf,

    /// Instructions executed per 1/60s frame
    #[arg(short, long, default_value_t = 11)]
    cycles_per_frame: u32,

    /// Seed the random number generator, for repeatable runs
    #[arg(long)]
    seed: Option<u64>,

    /// Beep the PC speaker while the sound timer runs
    #[arg(long)]
    beep: bool,

    /// 8XY6/8XYE shift VX in place instead of loading VY
    #[arg(long)]
    shift_vx: bool,

    /// BNNN jumps to NNN + VX instead of NNN + V0
    #[arg(long)]
    jump_vx: bool,

    /// 8XY1/8XY2/8XY3 leave VF alone
    #[arg(long)]
    no_vf_reset: bool,

    /// FX55/FX65 leave I unchanged
    #[arg(long)]
    no_i_increment: bool,

    /// Write log messages to this file
    #[arg(long, value_name = "FILE")]
    log: Option<PathBuf>,
}

impl Args {
    fn quirks(&self) -> Quirks {
        Quirks {
            logic_resets_vf: !self.no_vf_reset,
            shift_uses_vy: !self.shift_vx,
            jump_uses_vx: self.jump_vx,
            memory_increments_i: !self.no_i_increment,
        }
    }
}

/// log lines on stderr would land in the middle of the canvas, so without a
/// log file nothing is logged at all
fn init_logging(path: Option<&Path>) -> Result<(), io::Error> {
    if let Some(path) = path {
        let file = File::create(path)?;
        env_logger::Builder::new()
            .filter_level(LevelFilter::Info)
            .parse_default_env()
            .target(Target::Pipe(Box::new(file)))
            .init();
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // --help and --version aren't failures
            e.print()?;
            process::exit(if e.use_stderr() { 1 } else { 0 });
        }
    };
    if let Err(e) = init_logging(args.log.as_deref()) {
        eprintln!("chip8: can't open log file: {}", e);
        process::exit(1);
    }

    // load the program before touching the terminal so errors stay readable
    let mut f = match File::open(&args.rom) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("chip8: can't read {}: {}", args.rom.display(), e);
            process::exit(1);
        }
    };
    let mut interpreter = match args.seed {
        Some(seed) => Chip8Interpreter::with_seed(seed),
        None => Chip8Interpreter::new(),
    }
    .with_quirks(args.quirks());
    if let Err(e) = interpreter.load_program_from(&mut f) {
        eprintln!("chip8: can't load {}: {}", args.rom.display(), e);
        process::exit(1);
    }

    let config = EnvironmentConfig {
        cycles_per_frame: args.cycles_per_frame,
        ..EnvironmentConfig::default()
    };

    let summary = {
        let mut display = MonoTermDisplay::new(DISPLAY_WIDTH, DISPLAY_HEIGHT)?;
        let mut input = StdinInput::new()?;
        let mut sound: Box<dyn Sound> = if args.beep {
            Box::new(SimpleBeep::new())
        } else {
            Box::new(Mute::new())
        };
        let mut env = Environment::new(
            interpreter,
            &mut display,
            &mut input,
            &mut *sound,
            config,
        );
        let result = env.main_loop();
        // terminal restored here, before anything else is printed
        result
    }?;

    println!("Session:");
    println!("Duration: {:.2}s", summary.duration.as_secs_f64());
    println!("Frames: {}", summary.frames);
    println!("Cycles: {}", summary.cycles);
    Ok(())
}
