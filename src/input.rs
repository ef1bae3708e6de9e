use crossterm::event::{poll, read, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal;
use std::collections::HashMap;
use std::io;
use std::time::Duration;

/// number of keys on the COSMAC hex keypad
pub const KEYPAD_SIZE: usize = 16;

/// Terminals report key presses (and auto-repeats) but not releases, so a key
/// is held down for this many frames after the last press event for it.
pub const KEY_HOLD_FRAMES: u8 = 6;

/// map the left-hand side of a qwerty keyboard onto the hex keypad:
///
/// ```text
///  1 2 3 4      1 2 3 C
///  q w e r  =>  4 5 6 D
///  a s d f      7 8 9 E
///  z x c v      A 0 B F
/// ```
const CHIP8_CONVENTIONAL_KEYMAP: [(char, u8); 16] = [
    ('x', 0x00),
    ('1', 0x01),
    ('2', 0x02),
    ('3', 0x03),
    ('q', 0x04),
    ('w', 0x05),
    ('e', 0x06),
    ('a', 0x07),
    ('s', 0x08),
    ('d', 0x09),
    ('z', 0x0a),
    ('c', 0x0b),
    ('4', 0x0c),
    ('r', 0x0d),
    ('f', 0x0e),
    ('v', 0x0f),
];

/// The 16 key-pressed flags the interpreter polls. Only the host writes these.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keypad {
    pressed: [bool; KEYPAD_SIZE],
}

impl Keypad {
    pub fn new() -> Self {
        Keypad::default()
    }

    /// only the low nibble of `key` is significant
    pub fn is_pressed(&self, key: u8) -> bool {
        self.pressed[(key & 0x0f) as usize]
    }

    pub fn set(&mut self, key: u8, pressed: bool) {
        self.pressed[(key & 0x0f) as usize] = pressed;
    }

    pub fn press(&mut self, key: u8) {
        self.set(key, true);
    }

    pub fn release(&mut self, key: u8) {
        self.set(key, false);
    }

    pub fn release_all(&mut self) {
        self.pressed = [false; KEYPAD_SIZE];
    }

    /// lowest-numbered key currently held, if any
    pub fn first_pressed(&self) -> Option<u8> {
        self.pressed.iter().position(|&p| p).map(|k| k as u8)
    }
}

/// What the host should do after reading input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostCommand {
    Continue,
    Quit,
}

/// reads keypresses and reflects them onto the keypad
pub trait Input {
    /// called once per frame: drain any pending events into `keypad`
    fn update(&mut self, keypad: &mut Keypad) -> Result<HostCommand, io::Error>;
}

/// simple implementation of Input, reading key events from the terminal
pub struct StdinInput {
    keymap: HashMap<char, u8>,
    hold: [u8; KEYPAD_SIZE],
}

impl StdinInput {
    pub fn new() -> Result<Self, io::Error> {
        terminal::enable_raw_mode()?;
        Ok(StdinInput {
            keymap: HashMap::from(CHIP8_CONVENTIONAL_KEYMAP),
            hold: [0; KEYPAD_SIZE],
        })
    }

    fn handle_key(&mut self, evt: KeyEvent) -> HostCommand {
        match evt.code {
            KeyCode::Esc => return HostCommand::Quit,
            KeyCode::Char('c') if evt.modifiers.contains(KeyModifiers::CONTROL) => {
                return HostCommand::Quit
            }
            KeyCode::Char(key) => match self.keymap.get(&key.to_ascii_lowercase()) {
                Some(mapped_key) => self.hold[*mapped_key as usize] = KEY_HOLD_FRAMES,
                None => log::debug!("can't map {:?} to a COSMAC key", key),
            },
            other => log::debug!("ignoring key event {:?}", other),
        }
        HostCommand::Continue
    }
}

impl Drop for StdinInput {
    fn drop(&mut self) {
        if let Err(e) = terminal::disable_raw_mode() {
            log::error!("failed to restore terminal: {}", e);
        }
    }
}

impl Input for StdinInput {
    fn update(&mut self, keypad: &mut Keypad) -> Result<HostCommand, io::Error> {
        // age out keys pressed on earlier frames before reading new presses
        for held in self.hold.iter_mut() {
            *held = held.saturating_sub(1);
        }
        while poll(Duration::from_millis(0))? {
            if let Event::Key(evt) = read()? {
                if self.handle_key(evt) == HostCommand::Quit {
                    return Ok(HostCommand::Quit);
                }
            }
        }
        for (key, held) in self.hold.iter().enumerate() {
            keypad.set(key as u8, *held > 0);
        }
        Ok(HostCommand::Continue)
    }
}

/// dummy Input implementation for testing: holds down a fixed set of keys
/// for a number of frames, then asks the host to quit
pub struct DummyInput {
    keys: Vec<u8>,
    frames_left: usize,
}

impl DummyInput {
    pub fn new(keys: &[u8], frames: usize) -> Self {
        DummyInput {
            keys: Vec::from(keys),
            frames_left: frames,
        }
    }
}

impl Input for DummyInput {
    fn update(&mut self, keypad: &mut Keypad) -> Result<HostCommand, io::Error> {
        if self.frames_left == 0 {
            return Ok(HostCommand::Quit);
        }
        self.frames_left -= 1;
        keypad.release_all();
        for key in &self.keys {
            keypad.press(*key);
        }
        Ok(HostCommand::Continue)
    }
}
