use crate::error::Chip8Error;
use beep::beep;

/// The buzzer. CHIP-8 only ever has it on or off.
pub trait Sound {
    fn beep(&mut self) -> Result<(), Chip8Error>;
    fn stop(&mut self) -> Result<(), Chip8Error>;
    fn is_beeping(&self) -> bool;

    /// follow the sound timer, only talking to the device when it changes
    fn set(&mut self, on: bool) -> Result<(), Chip8Error> {
        match (on, self.is_beeping()) {
            (true, false) => self.beep(),
            (false, true) => self.stop(),
            _ => Ok(()),
        }
    }
}

const SIMPLEBEEP_PITCH: u16 = 2093; // C

/// beeps the PC speaker
pub struct SimpleBeep {
    is_beeping: bool,
}

impl SimpleBeep {
    pub fn new() -> Self {
        SimpleBeep { is_beeping: false }
    }
}

impl Default for SimpleBeep {
    fn default() -> Self {
        Self::new()
    }
}

impl Sound for SimpleBeep {
    fn beep(&mut self) -> Result<(), Chip8Error> {
        beep(SIMPLEBEEP_PITCH).map_err(|e| Chip8Error::Sound(e.to_string()))?;
        self.is_beeping = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Chip8Error> {
        beep(0).map_err(|e| Chip8Error::Sound(e.to_string()))?;
        self.is_beeping = false;
        Ok(())
    }

    fn is_beeping(&self) -> bool {
        self.is_beeping
    }
}

impl Drop for SimpleBeep {
    fn drop(&mut self) {
        if self.is_beeping {
            let _ = beep(0);
        }
    }
}

/// silence; remembers whether it would be beeping so the host loop can be tested
#[derive(Default)]
pub struct Mute {
    is_beeping: bool,
    pub beeps: usize,
}

impl Mute {
    pub fn new() -> Self {
        Mute::default()
    }
}

impl Sound for Mute {
    fn beep(&mut self) -> Result<(), Chip8Error> {
        self.is_beeping = true;
        self.beeps += 1;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Chip8Error> {
        self.is_beeping = false;
        Ok(())
    }

    fn is_beeping(&self) -> bool {
        self.is_beeping
    }
}
