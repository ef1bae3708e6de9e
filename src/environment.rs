//! The environment sets everything up and runs the main loop:
//!
//! ```text
//! every 1/60s frame:
//!   read input into the keypad
//!   interpreter.step() x cycles_per_frame
//!   interpreter.tick_timers()
//!   sound follows the sound timer; display redrawn if the framebuffer changed
//!   sleep for whatever is left of the frame
//! ```
use crate::display::{Display, DISPLAY_SIZE_BYTES};
use crate::error::Chip8Error;
use crate::input::{HostCommand, Input};
use crate::interpreter::Chip8Interpreter;
use crate::sound::Sound;
use crate::timer::TIMER_HZ;
use std::time::{Duration, Instant};

/// knobs for the host loop, as opposed to the machine itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvironmentConfig {
    /// instructions executed between timer ticks
    pub cycles_per_frame: u32,
    /// frames (and so timer ticks) per second
    pub frame_rate: u32,
    /// sleep out the rest of each frame; off for running flat out
    pub pace: bool,
    /// give up after this many frames
    pub max_frames: Option<u64>,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        EnvironmentConfig {
            cycles_per_frame: 11,
            frame_rate: TIMER_HZ,
            pace: true,
            max_frames: None,
        }
    }
}

/// what happened during a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: u64,
    pub cycles: u64,
    pub duration: Duration,
}

pub struct Environment<'a> {
    interpreter: Chip8Interpreter,
    display: &'a mut dyn Display,
    input: &'a mut dyn Input,
    sound: &'a mut dyn Sound,
    config: EnvironmentConfig,
}

impl<'a> Environment<'a> {
    pub fn new(
        interpreter: Chip8Interpreter,
        display: &'a mut dyn Display,
        input: &'a mut dyn Input,
        sound: &'a mut dyn Sound,
        config: EnvironmentConfig,
    ) -> Environment<'a> {
        Environment {
            interpreter,
            display,
            input,
            sound,
            config,
        }
    }

    pub fn interpreter(&self) -> &Chip8Interpreter {
        &self.interpreter
    }

    fn frame_time(&self) -> Duration {
        Duration::from_secs(1) / self.config.frame_rate.max(1)
    }

    /// run one frame's worth of the machine
    pub fn frame(&mut self) -> Result<HostCommand, Chip8Error> {
        if self.input.update(self.interpreter.keys_mut())? == HostCommand::Quit {
            return Ok(HostCommand::Quit);
        }
        for _ in 0..self.config.cycles_per_frame {
            self.interpreter.step()?;
        }
        self.interpreter.tick_timers();
        self.sound.set(self.interpreter.timers().is_sounding())?;
        Ok(HostCommand::Continue)
    }

    /// run until the input asks to quit, `max_frames` is reached, or the
    /// interpreter fails
    pub fn main_loop(&mut self) -> Result<RunSummary, Chip8Error> {
        let start = Instant::now();
        let frame_time = self.frame_time();
        let mut frames = 0;
        let mut last_drawn: Option<[u8; DISPLAY_SIZE_BYTES]> = None;

        let result = loop {
            if Some(frames) == self.config.max_frames {
                break Ok(());
            }
            let frame_start = Instant::now();
            match self.frame() {
                Ok(HostCommand::Quit) => break Ok(()),
                Ok(HostCommand::Continue) => {}
                Err(e) => break Err(e),
            }
            frames += 1;

            let bitplane = self.interpreter.framebuffer().to_bitplane();
            if last_drawn.as_ref() != Some(&bitplane) {
                if let Err(e) = self.display.draw(&bitplane) {
                    break Err(e.into());
                }
                last_drawn = Some(bitplane);
            }

            if self.config.pace {
                if let Some(rest) = frame_time.checked_sub(frame_start.elapsed()) {
                    spin_sleep::sleep(rest);
                }
            }
        };
        // don't leave the buzzer going; the run's own result takes precedence
        if let Err(e) = self.sound.set(false) {
            log::warn!("couldn't stop sound: {}", e);
        }

        let summary = RunSummary {
            frames,
            cycles: self.interpreter.cycles(),
            duration: start.elapsed(),
        };
        log::info!(
            "ran {} frames, {} cycles in {:.2}s",
            summary.frames,
            summary.cycles,
            summary.duration.as_secs_f64()
        );
        result.map(|_| summary)
    }
}
