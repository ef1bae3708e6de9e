use std::io;
use thiserror::Error;

/// Everything that can stop the interpreter, or its host, from carrying on.
///
/// Stack underflow and unknown opcodes are deliberately absent: the
/// interpreter recovers from those itself and only logs them.
#[derive(Debug, Error)]
pub enum Chip8Error {
    #[error("program is too large ({size} bytes), max size is {max} bytes")]
    ProgramTooLarge { size: usize, max: usize },

    #[error("call stack overflow: {depth} return addresses pushed")]
    StackOverflow { depth: usize },

    #[error("sound device error: {0}")]
    Sound(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}
