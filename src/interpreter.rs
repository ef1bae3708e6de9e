/// # interpreter
///
/// Machine state for the CHIP-8 virtual CPU, and the fetch/decode/execute
/// cycle that mutates it:
///
///  * V0-VF: 8bit general registers; VF doubles as carry/borrow/collision flag
///  * I: 16bit index register, only ever holding 12bit addresses
///  * PC: program counter, starts at 0x200
///  * call stack, delay and sound timers, framebuffer and keypad live outside
///    addressable memory
///
/// The host drives the machine: `step()` as often as it likes, `tick_timers()`
/// at 60Hz, and writes the keypad in between. Nothing in here blocks; the
/// wait-for-key instruction re-executes itself until a key has been pressed
/// and released.
use crate::display::FrameBuffer;
use crate::error::Chip8Error;
use crate::input::Keypad;
use crate::instruction::Instruction;
use crate::memory::{self, Chip8MemoryMap, MemoryMap};
use crate::quirks::Quirks;
use crate::stack::CallStack;
use crate::timer::Timers;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io;

/// 12bit address space
const ADDR_MASK: u16 = 0x0fff;

/// VF
const FLAG: usize = 0xf;

pub struct Chip8Interpreter {
    memory: Chip8MemoryMap,
    framebuffer: FrameBuffer,
    keypad: Keypad,
    timers: Timers,
    stack: CallStack,
    v: [u8; 16],
    i: u16,
    program_counter: u16,
    /// key seen held down by FX0A, waiting for its release
    awaiting_release: Option<u8>,
    quirks: Quirks,
    rng: StdRng,
    program: Vec<u8>,
    cycles: u64,
}

impl Chip8Interpreter {
    /// a machine with its random number generator seeded from the OS
    pub fn new() -> Chip8Interpreter {
        Self::with_rng(StdRng::from_entropy())
    }

    /// a machine whose CXNN results are reproducible run to run
    pub fn with_seed(seed: u64) -> Chip8Interpreter {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Chip8Interpreter {
        Chip8Interpreter {
            memory: Chip8MemoryMap::new(),
            framebuffer: FrameBuffer::new(),
            keypad: Keypad::new(),
            timers: Timers::new(),
            stack: CallStack::new(),
            v: [0; 16],
            i: 0,
            program_counter: memory::CHIP8_PROGRAM_ADDR,
            awaiting_release: None,
            quirks: Quirks::default(),
            rng,
            program: Vec::new(),
            cycles: 0,
        }
    }

    pub fn with_quirks(mut self, quirks: Quirks) -> Chip8Interpreter {
        self.quirks = quirks;
        self
    }

    /// load a chip8 program at 0x200 into fresh memory (font and all) and
    /// reset the machine to run it; on error the machine is left untouched
    pub fn load_program(&mut self, program: &[u8]) -> Result<(), Chip8Error> {
        let mut memory = Chip8MemoryMap::new();
        memory.load_program(program)?;
        self.memory = memory;
        self.program = program.to_vec();
        self.reset_cpu();
        log::info!("loaded {} byte program", program.len());
        Ok(())
    }

    /// load a chip8 program from e.g. a ROM file
    pub fn load_program_from(&mut self, reader: &mut impl io::Read) -> Result<(), Chip8Error> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        self.load_program(&buf)
    }

    /// back to the state just after the program was loaded; the random
    /// number generator carries on where it was
    pub fn reset(&mut self) {
        self.memory = Chip8MemoryMap::new();
        if let Err(e) = self.memory.load_program(&self.program) {
            // it fitted the first time round
            log::error!("failed to reload program: {}", e);
        }
        self.reset_cpu();
    }

    fn reset_cpu(&mut self) {
        self.framebuffer.clear();
        self.keypad.release_all();
        self.timers = Timers::new();
        self.stack.clear();
        self.v = [0; 16];
        self.i = 0;
        self.program_counter = memory::CHIP8_PROGRAM_ADDR;
        self.awaiting_release = None;
        self.cycles = 0;
    }

    /// fetch, decode and execute one instruction
    pub fn step(&mut self) -> Result<(), Chip8Error> {
        let pc = self.program_counter;
        let opcode = self.memory.get_word(pc);
        self.program_counter = pc.wrapping_add(2) & ADDR_MASK;
        self.cycles += 1;

        match Instruction::decode(opcode) {
            Some(instr) => {
                log::trace!("{:#05x}: {:04x}  {}", pc, opcode, instr);
                self.execute(instr)
            }
            None => {
                log::warn!("unknown opcode {:#06x} at {:#05x}, ignoring", opcode, pc);
                Ok(())
            }
        }
    }

    /// count down the delay and sound timers; call this at 60Hz
    pub fn tick_timers(&mut self) {
        self.timers.tick();
    }

    /// the instruction `step()` would execute next, if it decodes
    pub fn current_instruction(&self) -> Option<Instruction> {
        Instruction::decode(self.memory.get_word(self.program_counter))
    }

    fn skip_if(&mut self, condition: bool) {
        if condition {
            self.program_counter = self.program_counter.wrapping_add(2) & ADDR_MASK;
        }
    }

    /// undo the pc advance so the current instruction runs again next step
    fn repeat(&mut self) {
        self.program_counter = self.program_counter.wrapping_sub(2) & ADDR_MASK;
    }

    fn execute(&mut self, instr: Instruction) -> Result<(), Chip8Error> {
        use Instruction::*;
        match instr {
            Sys(addr) => log::debug!("ignoring machine code routine at {:#05x}", addr),
            Cls => self.framebuffer.clear(),
            Ret => match self.stack.pop() {
                Some(addr) => self.program_counter = addr,
                None => {
                    log::warn!("return with empty call stack, restarting program");
                    self.program_counter = memory::CHIP8_PROGRAM_ADDR;
                }
            },
            Jp(addr) => self.program_counter = addr,
            Call(addr) => {
                self.stack.push(self.program_counter)?;
                self.program_counter = addr;
            }
            SeByte(x, nn) => self.skip_if(self.v[x as usize] == nn),
            SneByte(x, nn) => self.skip_if(self.v[x as usize] != nn),
            SeReg(x, y) => self.skip_if(self.v[x as usize] == self.v[y as usize]),
            SneReg(x, y) => self.skip_if(self.v[x as usize] != self.v[y as usize]),
            LdByte(x, nn) => self.v[x as usize] = nn,
            AddByte(x, nn) => self.v[x as usize] = self.v[x as usize].wrapping_add(nn),
            LdReg(x, y) => self.v[x as usize] = self.v[y as usize],
            Or(x, y) => self.logic(x, y, |a, b| a | b),
            And(x, y) => self.logic(x, y, |a, b| a & b),
            Xor(x, y) => self.logic(x, y, |a, b| a ^ b),
            AddReg(x, y) => {
                let (sum, carry) = self.v[x as usize].overflowing_add(self.v[y as usize]);
                self.set_with_flag(x, sum, carry);
            }
            Sub(x, y) => {
                let (vx, vy) = (self.v[x as usize], self.v[y as usize]);
                self.set_with_flag(x, vx.wrapping_sub(vy), vx >= vy);
            }
            Subn(x, y) => {
                let (vx, vy) = (self.v[x as usize], self.v[y as usize]);
                self.set_with_flag(x, vy.wrapping_sub(vx), vy >= vx);
            }
            Shr(x, y) => {
                let src = self.shift_source(x, y);
                self.set_with_flag(x, src >> 1, src & 0x01 != 0);
            }
            Shl(x, y) => {
                let src = self.shift_source(x, y);
                self.set_with_flag(x, src << 1, src & 0x80 != 0);
            }
            LdI(addr) => self.i = addr,
            JpV0(addr) => {
                let offset = if self.quirks.jump_uses_vx {
                    self.v[(addr >> 8) as usize]
                } else {
                    self.v[0]
                };
                self.program_counter = addr.wrapping_add(offset as u16) & ADDR_MASK;
            }
            Rnd(x, nn) => self.v[x as usize] = self.rng.gen::<u8>() & nn,
            Drw(x, y, n) => self.draw(x, y, n),
            Skp(x) => self.skip_if(self.keypad.is_pressed(self.v[x as usize])),
            Sknp(x) => self.skip_if(!self.keypad.is_pressed(self.v[x as usize])),
            LdRegDt(x) => self.v[x as usize] = self.timers.delay,
            LdKey(x) => self.wait_for_key(x),
            LdDtReg(x) => self.timers.delay = self.v[x as usize],
            LdSt(x) => self.timers.sound = self.v[x as usize],
            AddI(x) => {
                let sum = self.i.wrapping_add(self.v[x as usize] as u16);
                self.i = sum & ADDR_MASK;
                self.v[FLAG] = (sum > ADDR_MASK) as u8;
            }
            LdF(x) => self.i = Chip8MemoryMap::font_addr(self.v[x as usize]),
            LdB(x) => {
                let value = self.v[x as usize];
                self.memory
                    .write(&[value / 100, (value / 10) % 10, value % 10], self.i);
            }
            LdDerefIReg(x) => {
                let count = x as usize + 1;
                self.memory.write(&self.v[..count], self.i);
                self.advance_index(count);
            }
            LdRegDerefI(x) => {
                let count = x as usize + 1;
                self.memory.read(self.i, &mut self.v[..count]);
                self.advance_index(count);
            }
        }
        Ok(())
    }

    fn logic(&mut self, x: u8, y: u8, op: impl Fn(u8, u8) -> u8) {
        self.v[x as usize] = op(self.v[x as usize], self.v[y as usize]);
        if self.quirks.logic_resets_vf {
            self.v[FLAG] = 0;
        }
    }

    /// result first, flag second: if X is F the flag is what sticks
    fn set_with_flag(&mut self, x: u8, value: u8, flag: bool) {
        self.v[x as usize] = value;
        self.v[FLAG] = flag as u8;
    }

    fn shift_source(&self, x: u8, y: u8) -> u8 {
        if self.quirks.shift_uses_vy {
            self.v[y as usize]
        } else {
            self.v[x as usize]
        }
    }

    fn advance_index(&mut self, count: usize) {
        if self.quirks.memory_increments_i {
            self.i = self.i.wrapping_add(count as u16) & ADDR_MASK;
        }
    }

    fn draw(&mut self, x: u8, y: u8, n: u8) {
        let (vx, vy) = (self.v[x as usize], self.v[y as usize]);
        self.v[FLAG] = 0;
        let mut sprite = [0u8; 15];
        let rows = &mut sprite[..n as usize];
        self.memory.read(self.i, rows);
        if self.framebuffer.draw_sprite(vx, vy, rows) {
            self.v[FLAG] = 1;
        }
    }

    /// FX0A takes (at least) two passes: one to see a key go down, then one
    /// to see it come back up. Only then is it stored in VX.
    fn wait_for_key(&mut self, x: u8) {
        match self.awaiting_release {
            None => {
                if let Some(key) = self.keypad.first_pressed() {
                    self.awaiting_release = Some(key);
                }
                self.repeat();
            }
            Some(key) if self.keypad.is_pressed(key) => self.repeat(),
            Some(key) => {
                self.v[x as usize] = key;
                self.awaiting_release = None;
            }
        }
    }

    pub fn framebuffer(&self) -> &FrameBuffer {
        &self.framebuffer
    }

    pub fn keys(&self) -> &Keypad {
        &self.keypad
    }

    /// the host writes key state through this
    pub fn keys_mut(&mut self) -> &mut Keypad {
        &mut self.keypad
    }

    /// true while FX0A has seen a key pressed and is waiting for it to be released
    pub fn is_halted(&self) -> bool {
        self.awaiting_release.is_some()
    }

    pub fn v(&self, reg: u8) -> u8 {
        self.v[(reg & 0x0f) as usize]
    }

    pub fn registers(&self) -> &[u8; 16] {
        &self.v
    }

    pub fn index(&self) -> u16 {
        self.i
    }

    pub fn pc(&self) -> u16 {
        self.program_counter
    }

    pub fn timers(&self) -> &Timers {
        &self.timers
    }

    pub fn delay_timer(&self) -> u8 {
        self.timers.delay
    }

    pub fn sound_timer(&self) -> u8 {
        self.timers.sound
    }

    pub fn stack(&self) -> &CallStack {
        &self.stack
    }

    pub fn memory(&self) -> &Chip8MemoryMap {
        &self.memory
    }

    pub fn quirks(&self) -> Quirks {
        self.quirks
    }

    /// instructions executed since the program was loaded
    pub fn cycles(&self) -> u64 {
        self.cycles
    }
}

impl Default for Chip8Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// load `program` into a fresh, deterministically seeded machine
    fn machine(program: &[u8]) -> Chip8Interpreter {
        let mut m = Chip8Interpreter::with_seed(0x5eed);
        m.load_program(program).unwrap();
        m
    }

    fn run(program: &[u8], steps: usize) -> Chip8Interpreter {
        let mut m = machine(program);
        for _ in 0..steps {
            m.step().unwrap();
        }
        m
    }

    #[test]
    fn test_program_load_ok() -> Result<(), Chip8Error> {
        let mut i = Chip8Interpreter::new();
        let mut prog: &[u8] = &[0x00, 0xe0]; // clear screen
        i.load_program_from(&mut prog)?;
        assert_eq!(i.pc(), 0x200);
        assert_eq!(i.current_instruction(), Some(Instruction::Cls));
        Ok(())
    }

    #[test]
    fn test_initial_state() {
        let m = machine(&[]);
        assert_eq!(m.registers(), &[0; 16]);
        assert_eq!(m.index(), 0);
        assert_eq!(m.pc(), 0x200);
        assert!(m.stack().is_empty());
        assert_eq!(m.delay_timer(), 0);
        assert_eq!(m.sound_timer(), 0);
        assert_eq!(m.framebuffer().lit_count(), 0);
        assert!(!m.is_halted());
    }

    #[test]
    fn test_plain_instructions_advance_pc_by_two() {
        let programs: [&[u8]; 8] = [
            &[0x00, 0xe0],
            &[0x60, 0x12],
            &[0x70, 0x01],
            &[0x81, 0x24],
            &[0xa3, 0x00],
            &[0xc0, 0xff],
            &[0xd0, 0x15],
            &[0xf0, 0x33],
        ];
        for prog in programs {
            let m = run(prog, 1);
            assert_eq!(m.pc(), 0x202, "{:02x?}", prog);
        }
    }

    #[test]
    fn test_unknown_opcode_is_skipped() {
        let m = run(&[0xf0, 0xff, 0x60, 0x07], 2);
        assert_eq!(m.pc(), 0x204);
        assert_eq!(m.v(0), 0x07);
    }

    #[test]
    fn test_sys_is_ignored() {
        let m = run(&[0x03, 0x00], 1);
        assert_eq!(m.pc(), 0x202);
    }

    #[test]
    fn test_jump() {
        let m = run(&[0x13, 0x45], 1);
        assert_eq!(m.pc(), 0x345);
    }

    #[test]
    fn test_call_and_return() {
        // call 0x204; clear; return
        let mut m = machine(&[0x22, 0x04, 0x00, 0xe0, 0x00, 0xee]);
        m.step().unwrap();
        assert_eq!(m.pc(), 0x204);
        assert_eq!(m.stack().peek(), Some(0x202));
        m.step().unwrap();
        assert_eq!(m.pc(), 0x202);
        assert!(m.stack().is_empty());
    }

    #[test]
    fn test_return_underflow_restarts() {
        let mut m = machine(&[0x60, 0x2a, 0x00, 0xee]);
        m.step().unwrap();
        m.step().unwrap();
        assert_eq!(m.pc(), 0x200);
        // nothing else disturbed
        assert_eq!(m.v(0), 0x2a);
        assert!(m.stack().is_empty());
    }

    #[test]
    fn test_runaway_recursion_errors() {
        // 0x200: call 0x200
        let mut m = machine(&[0x22, 0x00]);
        let mut result = Ok(());
        for _ in 0..=crate::stack::STACK_MAX_DEPTH {
            result = m.step();
            if result.is_err() {
                break;
            }
        }
        assert!(matches!(result, Err(Chip8Error::StackOverflow { .. })));
    }

    #[test]
    fn test_skips() {
        // V0 = 5; skip if V0 == 5; (skipped) V1 = 1
        let m = run(&[0x60, 0x05, 0x30, 0x05, 0x61, 0x01], 2);
        assert_eq!(m.pc(), 0x206);
        // V0 = 5; skip if V0 != 5; V1 = 1
        let m = run(&[0x60, 0x05, 0x40, 0x05, 0x61, 0x01], 3);
        assert_eq!(m.pc(), 0x206);
        assert_eq!(m.v(1), 1);
        // V0 == V1 == 0
        let m = run(&[0x50, 0x10], 1);
        assert_eq!(m.pc(), 0x204);
        let m = run(&[0x90, 0x10], 1);
        assert_eq!(m.pc(), 0x202);
    }

    #[test]
    fn test_add_byte_wraps_without_flag() {
        let m = run(&[0x60, 0xff, 0x70, 0x02], 2);
        assert_eq!(m.v(0), 0x01);
        assert_eq!(m.v(0xf), 0);
    }

    #[test]
    fn test_add_registers() {
        let m = run(&[0x60, 250, 0x61, 10, 0x80, 0x14], 3);
        assert_eq!(m.v(0), 4);
        assert_eq!(m.v(0xf), 1);
        let m = run(&[0x60, 1, 0x61, 1, 0x80, 0x14], 3);
        assert_eq!(m.v(0), 2);
        assert_eq!(m.v(0xf), 0);
    }

    #[test]
    fn test_subtract_registers() {
        let m = run(&[0x60, 5, 0x61, 3, 0x80, 0x15], 3);
        assert_eq!(m.v(0), 2);
        assert_eq!(m.v(0xf), 1);
        let m = run(&[0x60, 3, 0x61, 5, 0x80, 0x15], 3);
        assert_eq!(m.v(0), 254);
        assert_eq!(m.v(0xf), 0);
        // equal operands don't borrow
        let m = run(&[0x60, 3, 0x61, 3, 0x80, 0x15], 3);
        assert_eq!(m.v(0), 0);
        assert_eq!(m.v(0xf), 1);
    }

    #[test]
    fn test_reverse_subtract() {
        let m = run(&[0x60, 3, 0x61, 5, 0x80, 0x17], 3);
        assert_eq!(m.v(0), 2);
        assert_eq!(m.v(0xf), 1);
        let m = run(&[0x60, 5, 0x61, 3, 0x80, 0x17], 3);
        assert_eq!(m.v(0), 254);
        assert_eq!(m.v(0xf), 0);
    }

    #[test]
    fn test_flag_wins_over_result_in_vf() {
        // VF = 0xff; V1 = 1; VF += V1 -> carry
        let m = run(&[0x6f, 0xff, 0x61, 0x01, 0x8f, 0x14], 3);
        assert_eq!(m.v(0xf), 1);
    }

    #[test]
    fn test_logic_ops_reset_vf() {
        let m = run(&[0x6f, 0x09, 0x60, 0x0c, 0x61, 0x0a, 0x80, 0x11], 4);
        assert_eq!(m.v(0), 0x0e);
        assert_eq!(m.v(0xf), 0);
        let m = run(&[0x6f, 0x09, 0x60, 0x0c, 0x61, 0x0a, 0x80, 0x12], 4);
        assert_eq!(m.v(0), 0x08);
        assert_eq!(m.v(0xf), 0);
        let m = run(&[0x6f, 0x09, 0x60, 0x0c, 0x61, 0x0a, 0x80, 0x13], 4);
        assert_eq!(m.v(0), 0x06);
        assert_eq!(m.v(0xf), 0);
    }

    #[test]
    fn test_logic_ops_keep_vf_in_modern_mode() {
        let mut m = Chip8Interpreter::with_seed(1).with_quirks(Quirks::modern());
        m.load_program(&[0x6f, 0x09, 0x60, 0x0c, 0x61, 0x0a, 0x80, 0x11])
            .unwrap();
        for _ in 0..4 {
            m.step().unwrap();
        }
        assert_eq!(m.v(0xf), 0x09);
    }

    #[test]
    fn test_move_register() {
        let m = run(&[0x61, 0x42, 0x80, 0x10], 2);
        assert_eq!(m.v(0), 0x42);
    }

    #[test]
    fn test_shifts_read_vy() {
        // V1 = 0b1000_0011; V0 = V1 >> 1
        let m = run(&[0x61, 0x83, 0x80, 0x16], 2);
        assert_eq!(m.v(0), 0x41);
        assert_eq!(m.v(0xf), 1);
        // V0 = V1 << 1
        let m = run(&[0x61, 0x83, 0x80, 0x1e], 2);
        assert_eq!(m.v(0), 0x06);
        assert_eq!(m.v(0xf), 1);
        let m = run(&[0x61, 0x40, 0x80, 0x1e], 2);
        assert_eq!(m.v(0), 0x80);
        assert_eq!(m.v(0xf), 0);
    }

    #[test]
    fn test_shifts_in_place_in_modern_mode() {
        let mut m = Chip8Interpreter::with_seed(1).with_quirks(Quirks::modern());
        m.load_program(&[0x60, 0x02, 0x61, 0xff, 0x80, 0x16]).unwrap();
        for _ in 0..3 {
            m.step().unwrap();
        }
        assert_eq!(m.v(0), 0x01);
        assert_eq!(m.v(0xf), 0);
    }

    #[test]
    fn test_set_index() {
        let m = run(&[0xa1, 0x23], 1);
        assert_eq!(m.index(), 0x123);
    }

    #[test]
    fn test_jump_with_offset() {
        let m = run(&[0x60, 0x10, 0xb3, 0x00], 2);
        assert_eq!(m.pc(), 0x310);
    }

    #[test]
    fn test_jump_with_vx_quirk() {
        let quirks = Quirks {
            jump_uses_vx: true,
            ..Quirks::default()
        };
        let mut m = Chip8Interpreter::with_seed(1).with_quirks(quirks);
        m.load_program(&[0x63, 0x04, 0xb3, 0x00]).unwrap();
        m.step().unwrap();
        m.step().unwrap();
        assert_eq!(m.pc(), 0x304);
    }

    #[test]
    fn test_random_is_masked() {
        let mut m = machine(&[0xc0, 0x0f, 0x12, 0x00]);
        for _ in 0..100 {
            m.step().unwrap();
            assert_eq!(m.v(0) & 0xf0, 0);
            m.step().unwrap();
        }
        let m = run(&[0xc0, 0x00], 1);
        assert_eq!(m.v(0), 0);
    }

    #[test]
    fn test_random_is_reproducible() {
        let prog = [0xc0, 0xff, 0xc1, 0xff, 0xc2, 0xff, 0xc3, 0xff];
        let a = run(&prog, 4);
        let b = run(&prog, 4);
        assert_eq!(a.registers(), b.registers());
    }

    #[test]
    fn test_clear_screen() {
        // I = font '0'; draw 8x5 at (0,0); clear
        let mut m = machine(&[0xa0, 0x50, 0xd0, 0x05, 0x00, 0xe0]);
        m.step().unwrap();
        m.step().unwrap();
        assert!(m.framebuffer().lit_count() > 0);
        m.step().unwrap();
        assert_eq!(m.framebuffer().lit_count(), 0);
    }

    #[test]
    fn test_draw_and_collide() {
        // I = 0x208 (the 0xff byte); draw at (V0, V1) twice
        let prog = [0xa2, 0x08, 0xd0, 0x11, 0xd0, 0x11, 0x12, 0x06, 0xff];
        let mut m = machine(&prog);
        m.step().unwrap();
        m.step().unwrap();
        assert_eq!(m.framebuffer().lit_count(), 8);
        assert!((0..8).all(|x| m.framebuffer().get(x, 0)));
        assert_eq!(m.v(0xf), 0);
        m.step().unwrap();
        assert_eq!(m.framebuffer().lit_count(), 0);
        assert_eq!(m.v(0xf), 1);
    }

    #[test]
    fn test_draw_origin_taken_before_vf_reset() {
        // VF = 3; I = sprite; draw at (VF, V0)
        let prog = [0x6f, 0x03, 0xa2, 0x08, 0xdf, 0x01, 0x12, 0x06, 0x80];
        let m = run(&prog, 3);
        assert!(m.framebuffer().get(3, 0));
        assert_eq!(m.v(0xf), 0);
    }

    #[test]
    fn test_keys() {
        let mut m = machine(&[0x60, 0x0b, 0xe0, 0x9e, 0x00, 0xe0, 0xe0, 0xa1]);
        m.keys_mut().press(0xb);
        m.step().unwrap();
        m.step().unwrap();
        assert_eq!(m.pc(), 0x206);
        m.keys_mut().release(0xb);
        m.step().unwrap();
        assert_eq!(m.pc(), 0x20a);
    }

    #[test]
    fn test_wait_for_key() {
        let mut m = machine(&[0xf3, 0x0a, 0x00, 0xe0]);
        // nothing pressed: spin on the same instruction
        m.step().unwrap();
        m.step().unwrap();
        assert_eq!(m.pc(), 0x200);
        assert!(!m.is_halted());

        m.keys_mut().press(0x7);
        m.keys_mut().press(0x9);
        m.step().unwrap();
        assert_eq!(m.pc(), 0x200);
        assert!(m.is_halted());
        // not stored until the key comes back up
        assert_eq!(m.v(3), 0);

        m.step().unwrap();
        assert_eq!(m.pc(), 0x200);
        assert!(m.is_halted());

        // releasing a different key doesn't count
        m.keys_mut().release(0x9);
        m.step().unwrap();
        assert_eq!(m.pc(), 0x200);

        m.keys_mut().release(0x7);
        m.step().unwrap();
        assert_eq!(m.pc(), 0x202);
        assert_eq!(m.v(3), 0x7);
        assert!(!m.is_halted());
    }

    #[test]
    fn test_timers_from_registers() {
        let mut m = machine(&[0x60, 0x02, 0xf0, 0x15, 0xf0, 0x18, 0xf1, 0x07]);
        for _ in 0..3 {
            m.step().unwrap();
        }
        assert_eq!(m.delay_timer(), 2);
        assert_eq!(m.sound_timer(), 2);
        m.tick_timers();
        m.step().unwrap();
        assert_eq!(m.v(1), 1);
        for _ in 0..5 {
            m.tick_timers();
        }
        assert_eq!(m.delay_timer(), 0);
        assert_eq!(m.sound_timer(), 0);
    }

    #[test]
    fn test_add_index() {
        let m = run(&[0xa1, 0x00, 0x60, 0x20, 0xf0, 0x1e], 3);
        assert_eq!(m.index(), 0x120);
        assert_eq!(m.v(0xf), 0);
    }

    #[test]
    fn test_add_index_overflow() {
        let m = run(&[0xaf, 0xff, 0x60, 0x02, 0xf0, 0x1e], 3);
        assert_eq!(m.index(), 0x001);
        assert_eq!(m.v(0xf), 1);
    }

    #[test]
    fn test_font_digit() {
        let m = run(&[0x60, 0x0a, 0xf0, 0x29], 2);
        assert_eq!(m.index(), 0x50 + 0xa * 5);
        assert_eq!(m.memory().read_byte(m.index()), 0xf0);
    }

    #[test]
    fn test_bcd() {
        let m = run(&[0x60, 234, 0xa3, 0x00, 0xf0, 0x33], 3);
        assert_eq!(m.memory().read_byte(0x300), 2);
        assert_eq!(m.memory().read_byte(0x301), 3);
        assert_eq!(m.memory().read_byte(0x302), 4);
        let m = run(&[0x60, 7, 0xa3, 0x00, 0xf0, 0x33], 3);
        assert_eq!(m.memory().read_byte(0x300), 0);
        assert_eq!(m.memory().read_byte(0x301), 0);
        assert_eq!(m.memory().read_byte(0x302), 7);
        assert_eq!(m.index(), 0x300);
    }

    #[test]
    fn test_store_load_round_trip() {
        let store = [
            0x60, 9, 0x61, 8, 0x62, 7, 0x63, 6, 0xa3, 0x00, 0xf3, 0x55,
        ];
        let m = run(&store, 6);
        assert_eq!(m.index(), 0x304);
        let mut buf = [0u8; 4];
        m.memory().read(0x300, &mut buf);
        assert_eq!(buf, [9, 8, 7, 6]);

        // same memory, registers zeroed
        let mut load = machine(&[0xa2, 0x06, 0xf3, 0x65, 0x12, 0x04, 9, 8, 7, 6]);
        load.step().unwrap();
        load.step().unwrap();
        assert_eq!(&load.registers()[..4], &[9, 8, 7, 6]);
        assert_eq!(load.v(4), 0);
        assert_eq!(load.index(), 0x20a);
    }

    #[test]
    fn test_store_without_increment_quirk() {
        let mut m = Chip8Interpreter::with_seed(1).with_quirks(Quirks::modern());
        m.load_program(&[0xa3, 0x00, 0xf1, 0x55]).unwrap();
        m.step().unwrap();
        m.step().unwrap();
        assert_eq!(m.index(), 0x300);
    }

    #[test]
    fn test_load_restores_overwritten_font() -> Result<(), Chip8Error> {
        // I = 0x50 (glyph '0'); store V0..V3 over it
        let mut m = run(&[0xa0, 0x50, 0xf3, 0x55], 2);
        assert_eq!(m.memory().read_byte(0x50), 0x00);
        m.load_program(&[0x00, 0xe0])?;
        let mut glyph = [0u8; 5];
        m.memory().read(0x50, &mut glyph);
        assert_eq!(glyph, [0xf0, 0x90, 0x90, 0x90, 0xf0]);
        Ok(())
    }

    #[test]
    fn test_failed_load_leaves_machine_alone() {
        let mut m = run(&[0x60, 0x2a, 0x12, 0x02], 1);
        assert!(m.load_program(&[0u8; 4000]).is_err());
        assert_eq!(m.v(0), 0x2a);
        assert_eq!(m.memory().read_byte(0x200), 0x60);
    }

    #[test]
    fn test_reset() {
        let mut m = run(&[0x60, 0x01, 0xa2, 0x00, 0xf0, 0x55, 0x12, 0x06], 4);
        assert_eq!(m.memory().read_byte(0x200), 0x01);
        m.reset();
        assert_eq!(m.pc(), 0x200);
        assert_eq!(m.v(0), 0);
        assert_eq!(m.cycles(), 0);
        // the program image is restored, self-modification and all
        assert_eq!(m.memory().read_byte(0x200), 0x60);
    }
}
