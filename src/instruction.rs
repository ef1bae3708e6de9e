//! Decoding of raw CHIP-8 opcodes into [`Instruction`]s.
use std::fmt;

/// Fixed bit-fields of an opcode. Every instruction is one of a handful of
/// shapes, so it's simplest to pull all of them out up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode(pub u16);

impl Opcode {
    pub fn family(self) -> u8 {
        (self.0 >> 12) as u8
    }
    pub fn x(self) -> u8 {
        ((self.0 >> 8) & 0x0f) as u8
    }
    pub fn y(self) -> u8 {
        ((self.0 >> 4) & 0x0f) as u8
    }
    pub fn n(self) -> u8 {
        (self.0 & 0x000f) as u8
    }
    pub fn nn(self) -> u8 {
        (self.0 & 0x00ff) as u8
    }
    pub fn nnn(self) -> u16 {
        self.0 & 0x0fff
    }
}

/// One CHIP-8 instruction, operands included. Registers are indices 0x0-0xF,
/// addresses are 12 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// 0NNN: call a machine-code routine on the host CPU
    Sys(u16),
    /// 00E0
    Cls,
    /// 00EE
    Ret,
    /// 1NNN
    Jp(u16),
    /// 2NNN
    Call(u16),
    /// 3XNN
    SeByte(u8, u8),
    /// 4XNN
    SneByte(u8, u8),
    /// 5XY0
    SeReg(u8, u8),
    /// 6XNN
    LdByte(u8, u8),
    /// 7XNN
    AddByte(u8, u8),
    /// 8XY0
    LdReg(u8, u8),
    /// 8XY1
    Or(u8, u8),
    /// 8XY2
    And(u8, u8),
    /// 8XY3
    Xor(u8, u8),
    /// 8XY4
    AddReg(u8, u8),
    /// 8XY5
    Sub(u8, u8),
    /// 8XY6
    Shr(u8, u8),
    /// 8XY7
    Subn(u8, u8),
    /// 8XYE
    Shl(u8, u8),
    /// 9XY0
    SneReg(u8, u8),
    /// ANNN
    LdI(u16),
    /// BNNN
    JpV0(u16),
    /// CXNN
    Rnd(u8, u8),
    /// DXYN
    Drw(u8, u8, u8),
    /// EX9E
    Skp(u8),
    /// EXA1
    Sknp(u8),
    /// FX07
    LdRegDt(u8),
    /// FX0A
    LdKey(u8),
    /// FX15
    LdDtReg(u8),
    /// FX18
    LdSt(u8),
    /// FX1E
    AddI(u8),
    /// FX29
    LdF(u8),
    /// FX33
    LdB(u8),
    /// FX55
    LdDerefIReg(u8),
    /// FX65
    LdRegDerefI(u8),
}

impl Instruction {
    /// `None` if the opcode isn't part of the instruction set
    pub fn decode(opcode: u16) -> Option<Instruction> {
        use Instruction::*;
        let op = Opcode(opcode);
        let (x, y, n, nn, nnn) = (op.x(), op.y(), op.n(), op.nn(), op.nnn());
        let instr = match op.family() {
            0x0 => match opcode {
                0x00e0 => Cls,
                0x00ee => Ret,
                _ => Sys(nnn),
            },
            0x1 => Jp(nnn),
            0x2 => Call(nnn),
            0x3 => SeByte(x, nn),
            0x4 => SneByte(x, nn),
            0x5 if n == 0 => SeReg(x, y),
            0x6 => LdByte(x, nn),
            0x7 => AddByte(x, nn),
            0x8 => match n {
                0x0 => LdReg(x, y),
                0x1 => Or(x, y),
                0x2 => And(x, y),
                0x3 => Xor(x, y),
                0x4 => AddReg(x, y),
                0x5 => Sub(x, y),
                0x6 => Shr(x, y),
                0x7 => Subn(x, y),
                0xe => Shl(x, y),
                _ => return None,
            },
            0x9 if n == 0 => SneReg(x, y),
            0xa => LdI(nnn),
            0xb => JpV0(nnn),
            0xc => Rnd(x, nn),
            0xd => Drw(x, y, n),
            0xe => match nn {
                0x9e => Skp(x),
                0xa1 => Sknp(x),
                _ => return None,
            },
            0xf => match nn {
                0x07 => LdRegDt(x),
                0x0a => LdKey(x),
                0x15 => LdDtReg(x),
                0x18 => LdSt(x),
                0x1e => AddI(x),
                0x29 => LdF(x),
                0x33 => LdB(x),
                0x55 => LdDerefIReg(x),
                0x65 => LdRegDerefI(x),
                _ => return None,
            },
            _ => return None,
        };
        Some(instr)
    }
}

/// conventional Cowgod-style mnemonics
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction::*;
        match *self {
            Sys(a) => write!(f, "SYS {:#05x}", a),
            Cls => write!(f, "CLS"),
            Ret => write!(f, "RET"),
            Jp(a) => write!(f, "JP {:#05x}", a),
            Call(a) => write!(f, "CALL {:#05x}", a),
            SeByte(x, nn) => write!(f, "SE V{:X}, {:#04x}", x, nn),
            SneByte(x, nn) => write!(f, "SNE V{:X}, {:#04x}", x, nn),
            SeReg(x, y) => write!(f, "SE V{:X}, V{:X}", x, y),
            LdByte(x, nn) => write!(f, "LD V{:X}, {:#04x}", x, nn),
            AddByte(x, nn) => write!(f, "ADD V{:X}, {:#04x}", x, nn),
            LdReg(x, y) => write!(f, "LD V{:X}, V{:X}", x, y),
            Or(x, y) => write!(f, "OR V{:X}, V{:X}", x, y),
            And(x, y) => write!(f, "AND V{:X}, V{:X}", x, y),
            Xor(x, y) => write!(f, "XOR V{:X}, V{:X}", x, y),
            AddReg(x, y) => write!(f, "ADD V{:X}, V{:X}", x, y),
            Sub(x, y) => write!(f, "SUB V{:X}, V{:X}", x, y),
            Shr(x, y) => write!(f, "SHR V{:X}, V{:X}", x, y),
            Subn(x, y) => write!(f, "SUBN V{:X}, V{:X}", x, y),
            Shl(x, y) => write!(f, "SHL V{:X}, V{:X}", x, y),
            SneReg(x, y) => write!(f, "SNE V{:X}, V{:X}", x, y),
            LdI(a) => write!(f, "LD I, {:#05x}", a),
            JpV0(a) => write!(f, "JP V0, {:#05x}", a),
            Rnd(x, nn) => write!(f, "RND V{:X}, {:#04x}", x, nn),
            Drw(x, y, n) => write!(f, "DRW V{:X}, V{:X}, {}", x, y, n),
            Skp(x) => write!(f, "SKP V{:X}", x),
            Sknp(x) => write!(f, "SKNP V{:X}", x),
            LdRegDt(x) => write!(f, "LD V{:X}, DT", x),
            LdKey(x) => write!(f, "LD V{:X}, K", x),
            LdDtReg(x) => write!(f, "LD DT, V{:X}", x),
            LdSt(x) => write!(f, "LD ST, V{:X}", x),
            AddI(x) => write!(f, "ADD I, V{:X}", x),
            LdF(x) => write!(f, "LD F, V{:X}", x),
            LdB(x) => write!(f, "LD B, V{:X}", x),
            LdDerefIReg(x) => write!(f, "LD [I], V{:X}", x),
            LdRegDerefI(x) => write!(f, "LD V{:X}, [I]", x),
        }
    }
}
