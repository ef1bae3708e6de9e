use crate::error::Chip8Error;

// NB. addresses are u16 as per the chip-8; lengths are usize to stop endless casting

/// how much RAM we have
pub const CHIP8_RAM_SIZE_BYTES: usize = 4096;

/// where the program is loaded
pub const CHIP8_PROGRAM_ADDR: u16 = 0x0200;

/// largest program image that fits between the program address and the top of RAM
pub const CHIP8_MAX_PROGRAM_SIZE: usize = CHIP8_RAM_SIZE_BYTES - CHIP8_PROGRAM_ADDR as usize;

/// where the hex-digit glyphs live
pub const CHIP8_FONT_ADDR: u16 = 0x050;

/// bytes per hex-digit glyph
pub const CHIP8_FONT_GLYPH_BYTES: u16 = 5;

/// Byte-addressable memory. Every address is taken modulo the size of the
/// map, so arithmetic that runs off the end comes back round to 0x000.
pub trait MemoryMap {
    /// the whole of the underlying memory (heap)
    fn bytes(&self) -> &[u8];

    /// the whole of the underlying memory, writable
    fn bytes_mut(&mut self) -> &mut [u8];

    fn wrap(&self, addr: u16) -> usize {
        addr as usize % self.bytes().len()
    }

    fn read_byte(&self, addr: u16) -> u8 {
        self.bytes()[self.wrap(addr)]
    }

    fn write_byte(&mut self, addr: u16, value: u8) {
        let a = self.wrap(addr);
        self.bytes_mut()[a] = value;
    }

    /// get a big-endian two-byte word, e.g. an opcode
    fn get_word(&self, addr: u16) -> u16 {
        ((self.read_byte(addr) as u16) << 8) | self.read_byte(addr.wrapping_add(1)) as u16
    }

    /// write a chunk of bytes, wrapping past the top of memory
    fn write(&mut self, data: &[u8], addr: u16) {
        for (offset, byte) in data.iter().enumerate() {
            self.write_byte(addr.wrapping_add(offset as u16), *byte);
        }
    }

    /// copy `buf.len()` bytes out of memory, wrapping past the top
    fn read(&self, addr: u16, buf: &mut [u8]) {
        for (offset, byte) in buf.iter_mut().enumerate() {
            *byte = self.read_byte(addr.wrapping_add(offset as u16));
        }
    }
}

/// Defines the CHIP-8 standard 4K memory map:
///   0x0000-0x004f  unused by this interpreter
///   0x0050-0x009f  hex-digit font
///   0x00a0-0x01ff  unused by this interpreter
///   0x0200-0x0fff  program
///
/// The stack, timers and display live outside of addressable memory, so a
/// program scribbling over high RAM can't corrupt interpreter state.
#[derive(Clone)]
pub struct Chip8MemoryMap {
    bytes: Box<[u8]>,
}

impl MemoryMap for Chip8MemoryMap {
    fn bytes(&self) -> &[u8] {
        &self.bytes
    }
    fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

impl Chip8MemoryMap {
    /// initialises CHIP-8 memory with the font baked in
    pub fn new() -> Self {
        let mut mm = Chip8MemoryMap {
            bytes: vec![0u8; CHIP8_RAM_SIZE_BYTES].into_boxed_slice(),
        };
        mm.write(&CHIP8_CONTEMPORARY_FONT, CHIP8_FONT_ADDR);
        mm
    }

    /// load a CHIP-8 program at 0x200; anything that won't fit below the top
    /// of RAM is rejected and memory is left as it was
    pub fn load_program(&mut self, program: &[u8]) -> Result<(), Chip8Error> {
        if program.len() > CHIP8_MAX_PROGRAM_SIZE {
            return Err(Chip8Error::ProgramTooLarge {
                size: program.len(),
                max: CHIP8_MAX_PROGRAM_SIZE,
            });
        }
        let start = CHIP8_PROGRAM_ADDR as usize;
        self.bytes[start..].fill(0);
        self.bytes[start..start + program.len()].copy_from_slice(program);
        Ok(())
    }

    /// address of the glyph for a hex digit; only the low nibble counts
    pub fn font_addr(digit: u8) -> u16 {
        CHIP8_FONT_ADDR + (digit & 0x0f) as u16 * CHIP8_FONT_GLYPH_BYTES
    }
}

impl Default for Chip8MemoryMap {
    fn default() -> Self {
        Self::new()
    }
}

const CHIP8_CONTEMPORARY_FONT: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];
