///
/// ## Design
///
/// * the interpreter core knows nothing about screens, keyboards or speakers;
///   it owns a framebuffer and a keypad that the host reads and writes
/// * the host calls `step()` as fast as it likes and `tick_timers()` at 60Hz,
///   independently of one another
/// * nothing in the core blocks: the wait-for-key instruction re-runs itself
///   each step until a key has gone down and come back up
/// * behaviours that differ between historical interpreters are `Quirks`
///
/// Model
///
/// Environment
///  |-- display, input, sound, config
///  |-- interpreter(quirks)
///  |    |-- memory map (font, program)
///  |    |-- call stack, timers, framebuffer, keypad
///  |    `-- instruction decoder
///  `-- main loop
///       |-- input.update(keypad)
///       |-- interpreter.step() * cycles_per_frame
///       |-- interpreter.tick_timers(); sound.set(sound timer > 0)
///       |-- display.draw(framebuffer) if it changed
///       `-- sleep out the rest of the frame
pub mod display;
pub mod environment;
pub mod error;
pub mod input;
pub mod instruction;
pub mod interpreter;
pub mod memory;
pub mod quirks;
pub mod sound;
pub mod stack;
pub mod timer;

pub use error::Chip8Error;
pub use interpreter::Chip8Interpreter;
pub use quirks::Quirks;
