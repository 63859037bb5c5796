mod alu;

use std::fmt;

use crate::core::Bus;

pub use alu::Flags;
use alu::{add8, sub8, zsp};

/// Pending port operation parked by `IN`/`OUT`.
///
/// This is a single-slot mailbox: the host must drain it before the next
/// step or the request is overwritten. The instruction itself never touches
/// peripheral state; for `In` the host writes the port value into `A`, for
/// `Out` it consumes `A`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PortRequest {
    In(u8),
    Out(u8),
}

/// Intel 8080A interpreter.
///
/// One [`step`](Self::step) decodes and executes a single instruction
/// against the bus and returns the machine-cycle count the host uses to
/// throttle real time. Interrupts are serviced by opcode injection: the
/// host parks an opcode (almost always one of the RST instructions) in
/// [`pending_interrupt`](Self::pending_interrupt) and the next step executes
/// it off-stream, without advancing PC past the in-memory instruction.
pub struct I8080 {
    pub a: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
    pub sp: u16,
    pub pc: u16,
    pub flags: Flags,
    pub int_enable: bool,
    /// Opcode to inject at the next step; 0x00 means none pending.
    pub pending_interrupt: u8,
    pub halted: bool,
    /// Most recent `IN`/`OUT`, drained by the host after every step.
    pub port_request: Option<PortRequest>,
}

impl I8080 {
    pub fn new() -> Self {
        Self {
            a: 0,
            b: 0,
            c: 0,
            d: 0,
            e: 0,
            h: 0,
            l: 0,
            sp: 0,
            pc: 0,
            flags: Flags::default(),
            int_enable: false,
            pending_interrupt: 0,
            halted: false,
            port_request: None,
        }
    }

    /// Hardware reset. Clears A, PC, the interrupt and port mailboxes, and
    /// the halt latch. The remaining registers keep whatever they held, as
    /// on the real chip.
    pub fn reset(&mut self) {
        self.a = 0;
        self.pc = 0;
        self.int_enable = false;
        self.pending_interrupt = 0;
        self.halted = false;
        self.port_request = None;
    }

    /// Park an opcode for injection at the top of the next step.
    pub fn request_interrupt(&mut self, opcode: u8) {
        self.pending_interrupt = opcode;
    }

    // 16-bit register pair views (big-endian pairs)
    pub fn bc(&self) -> u16 {
        (self.b as u16) << 8 | self.c as u16
    }
    pub fn set_bc(&mut self, v: u16) {
        self.b = (v >> 8) as u8;
        self.c = v as u8;
    }
    pub fn de(&self) -> u16 {
        (self.d as u16) << 8 | self.e as u16
    }
    pub fn set_de(&mut self, v: u16) {
        self.d = (v >> 8) as u8;
        self.e = v as u8;
    }
    pub fn hl(&self) -> u16 {
        (self.h as u16) << 8 | self.l as u16
    }
    pub fn set_hl(&mut self, v: u16) {
        self.h = (v >> 8) as u8;
        self.l = v as u8;
    }

    /// Execute one instruction and return its machine-cycle count.
    ///
    /// A halted CPU returns 0 cycles unless an enabled interrupt is pending,
    /// which wakes it. An injected opcode executes without the PC fetch, so
    /// an injected RST pushes the address of the interrupted instruction.
    pub fn step<B: Bus + ?Sized>(&mut self, bus: &mut B) -> u32 {
        let injected = self.int_enable && self.pending_interrupt != 0;
        if self.halted && !injected {
            return 0;
        }
        let opcode = if injected {
            let op = self.pending_interrupt;
            self.pending_interrupt = 0;
            self.int_enable = false;
            self.halted = false;
            op
        } else {
            let op = bus.read(self.pc);
            self.pc = self.pc.wrapping_add(1);
            op
        };
        self.execute(opcode, bus)
    }

    fn imm8<B: Bus + ?Sized>(&mut self, bus: &mut B) -> u8 {
        let v = bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        v
    }

    fn imm16<B: Bus + ?Sized>(&mut self, bus: &mut B) -> u16 {
        let lo = self.imm8(bus) as u16;
        let hi = self.imm8(bus) as u16;
        hi << 8 | lo
    }

    /// Register operand by its 3-bit field code (B C D E H L M A);
    /// code 6 is the memory operand at (HL).
    fn reg8<B: Bus + ?Sized>(&mut self, code: u8, bus: &mut B) -> u8 {
        match code & 0x07 {
            0 => self.b,
            1 => self.c,
            2 => self.d,
            3 => self.e,
            4 => self.h,
            5 => self.l,
            6 => bus.read(self.hl()),
            _ => self.a,
        }
    }

    fn set_reg8<B: Bus + ?Sized>(&mut self, code: u8, v: u8, bus: &mut B) {
        match code & 0x07 {
            0 => self.b = v,
            1 => self.c = v,
            2 => self.d = v,
            3 => self.e = v,
            4 => self.h = v,
            5 => self.l = v,
            6 => bus.write(self.hl(), v),
            _ => self.a = v,
        }
    }

    /// Register pair by the 2-bit field in bits 4-5 (B D H SP).
    fn pair(&self, code: u8) -> u16 {
        match code & 0x03 {
            0 => self.bc(),
            1 => self.de(),
            2 => self.hl(),
            _ => self.sp,
        }
    }

    fn set_pair(&mut self, code: u8, v: u16) {
        match code & 0x03 {
            0 => self.set_bc(v),
            1 => self.set_de(v),
            2 => self.set_hl(v),
            _ => self.sp = v,
        }
    }

    fn push<B: Bus + ?Sized>(&mut self, bus: &mut B, word: u16) {
        self.sp = self.sp.wrapping_sub(1);
        bus.write(self.sp, (word >> 8) as u8);
        self.sp = self.sp.wrapping_sub(1);
        bus.write(self.sp, word as u8);
    }

    fn pop<B: Bus + ?Sized>(&mut self, bus: &mut B) -> u16 {
        let lo = bus.read(self.sp) as u16;
        let hi = bus.read(self.sp.wrapping_add(1)) as u16;
        self.sp = self.sp.wrapping_add(2);
        hi << 8 | lo
    }

    /// Branch condition by the 3-bit field code (NZ Z NC C PO PE P M).
    fn condition(&self, code: u8) -> bool {
        match code & 0x07 {
            0 => !self.flags.z,
            1 => self.flags.z,
            2 => !self.flags.cy,
            3 => self.flags.cy,
            4 => !self.flags.p,
            5 => self.flags.p,
            6 => !self.flags.s,
            _ => self.flags.s,
        }
    }

    fn set_logic_flags(&mut self, result: u8) {
        let (z, s, p) = zsp(result);
        self.flags = Flags {
            z,
            s,
            p,
            cy: false,
            ac: false,
        };
    }

    /// ALU operation by the 3-bit group code shared between the register
    /// block 0x80-0xBF and the immediate forms 0xC6/0xCE/...
    fn alu_op(&mut self, group: u8, operand: u8) {
        match group & 0x07 {
            0 => {
                let (r, f) = add8(self.a, operand, false);
                self.a = r;
                self.flags = f;
            }
            1 => {
                let (r, f) = add8(self.a, operand, self.flags.cy);
                self.a = r;
                self.flags = f;
            }
            2 => {
                let (r, f) = sub8(self.a, operand, false);
                self.a = r;
                self.flags = f;
            }
            3 => {
                let (r, f) = sub8(self.a, operand, self.flags.cy);
                self.a = r;
                self.flags = f;
            }
            4 => {
                self.a &= operand;
                self.set_logic_flags(self.a);
            }
            5 => {
                self.a ^= operand;
                self.set_logic_flags(self.a);
            }
            6 => {
                self.a |= operand;
                self.set_logic_flags(self.a);
            }
            _ => {
                // CMP: subtract flags without writeback
                let (_, f) = sub8(self.a, operand, false);
                self.flags = f;
            }
        }
    }

    fn daa(&mut self) {
        // Two-step BCD adjust: low nibble first, then high, with the low
        // correction allowed to ripple into the high check.
        if self.a & 0x0F > 0x09 || self.flags.ac {
            self.a = self.a.wrapping_add(0x06);
            self.flags.ac = true;
        } else {
            self.flags.ac = false;
        }
        if self.a & 0xF0 > 0x90 || self.flags.cy {
            self.a = self.a.wrapping_add(0x60);
            self.flags.cy = true;
        }
        let (z, s, p) = zsp(self.a);
        self.flags.z = z;
        self.flags.s = s;
        self.flags.p = p;
    }

    fn execute<B: Bus + ?Sized>(&mut self, op: u8, bus: &mut B) -> u32 {
        match op {
            // NOP, including the undocumented aliases
            0x00 | 0x08 | 0x10 | 0x18 | 0x20 | 0x28 | 0x30 | 0x38 => 4,

            // LXI rp, d16
            0x01 | 0x11 | 0x21 | 0x31 => {
                let v = self.imm16(bus);
                self.set_pair(op >> 4, v);
                10
            }

            // STAX / LDAX
            0x02 | 0x12 => {
                bus.write(self.pair(op >> 4), self.a);
                7
            }
            0x0A | 0x1A => {
                self.a = bus.read(self.pair(op >> 4));
                7
            }

            // INX / DCX
            0x03 | 0x13 | 0x23 | 0x33 => {
                self.set_pair(op >> 4, self.pair(op >> 4).wrapping_add(1));
                5
            }
            0x0B | 0x1B | 0x2B | 0x3B => {
                self.set_pair(op >> 4, self.pair(op >> 4).wrapping_sub(1));
                5
            }

            // INR / DCR: all flags except CY
            0x04 | 0x0C | 0x14 | 0x1C | 0x24 | 0x2C | 0x34 | 0x3C => {
                let code = op >> 3;
                let (r, mut f) = add8(self.reg8(code, bus), 1, false);
                f.cy = self.flags.cy;
                self.flags = f;
                self.set_reg8(code, r, bus);
                if code & 0x07 == 6 { 10 } else { 5 }
            }
            0x05 | 0x0D | 0x15 | 0x1D | 0x25 | 0x2D | 0x35 | 0x3D => {
                let code = op >> 3;
                let (r, mut f) = sub8(self.reg8(code, bus), 1, false);
                f.cy = self.flags.cy;
                self.flags = f;
                self.set_reg8(code, r, bus);
                if code & 0x07 == 6 { 10 } else { 5 }
            }

            // MVI r, d8
            0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x36 | 0x3E => {
                let v = self.imm8(bus);
                let code = op >> 3;
                self.set_reg8(code, v, bus);
                if code & 0x07 == 6 { 10 } else { 7 }
            }

            // Rotates
            0x07 => {
                // RLC
                self.flags.cy = self.a & 0x80 != 0;
                self.a = self.a.rotate_left(1);
                4
            }
            0x0F => {
                // RRC
                self.flags.cy = self.a & 0x01 != 0;
                self.a = self.a.rotate_right(1);
                4
            }
            0x17 => {
                // RAL: rotate left through carry
                let carry_out = self.a & 0x80 != 0;
                self.a = self.a << 1 | self.flags.cy as u8;
                self.flags.cy = carry_out;
                4
            }
            0x1F => {
                // RAR: rotate right through carry
                let carry_out = self.a & 0x01 != 0;
                self.a = self.a >> 1 | (self.flags.cy as u8) << 7;
                self.flags.cy = carry_out;
                4
            }

            // DAD rp
            0x09 | 0x19 | 0x29 | 0x39 => {
                let sum = self.hl() as u32 + self.pair(op >> 4) as u32;
                self.flags.cy = sum > 0xFFFF;
                self.set_hl(sum as u16);
                10
            }

            // Direct loads/stores
            0x22 => {
                // SHLD
                let addr = self.imm16(bus);
                bus.write(addr, self.l);
                bus.write(addr.wrapping_add(1), self.h);
                16
            }
            0x2A => {
                // LHLD
                let addr = self.imm16(bus);
                self.l = bus.read(addr);
                self.h = bus.read(addr.wrapping_add(1));
                16
            }
            0x32 => {
                // STA
                let addr = self.imm16(bus);
                bus.write(addr, self.a);
                13
            }
            0x3A => {
                // LDA
                let addr = self.imm16(bus);
                self.a = bus.read(addr);
                13
            }

            0x27 => {
                self.daa();
                4
            }
            0x2F => {
                // CMA
                self.a = !self.a;
                4
            }
            0x37 => {
                // STC
                self.flags.cy = true;
                4
            }
            0x3F => {
                // CMC
                self.flags.cy = !self.flags.cy;
                4
            }

            0x76 => {
                // HLT
                self.halted = true;
                7
            }

            // MOV r, r (0x76 carved out above)
            0x40..=0x75 | 0x77..=0x7F => {
                let v = self.reg8(op, bus);
                self.set_reg8(op >> 3, v, bus);
                if op & 0x07 == 6 || (op >> 3) & 0x07 == 6 { 7 } else { 5 }
            }

            // ADD/ADC/SUB/SBB/ANA/XRA/ORA/CMP r
            0x80..=0xBF => {
                let operand = self.reg8(op, bus);
                self.alu_op(op >> 3, operand);
                if op & 0x07 == 6 { 7 } else { 4 }
            }

            // Rcc: 11 cycles regardless of the branch
            0xC0 | 0xC8 | 0xD0 | 0xD8 | 0xE0 | 0xE8 | 0xF0 | 0xF8 => {
                if self.condition(op >> 3) {
                    self.pc = self.pop(bus);
                }
                11
            }

            // POP rp / POP PSW
            0xC1 | 0xD1 | 0xE1 => {
                let v = self.pop(bus);
                self.set_pair(op >> 4, v);
                10
            }
            0xF1 => {
                let v = self.pop(bus);
                self.a = (v >> 8) as u8;
                self.flags = Flags::from_psw(v as u8);
                10
            }

            // Jcc
            0xC2 | 0xCA | 0xD2 | 0xDA | 0xE2 | 0xEA | 0xF2 | 0xFA => {
                let addr = self.imm16(bus);
                if self.condition(op >> 3) {
                    self.pc = addr;
                }
                10
            }

            // JMP (0xCB is the undocumented alias)
            0xC3 | 0xCB => {
                self.pc = self.imm16(bus);
                10
            }

            // Ccc: 11 cycles regardless of the branch
            0xC4 | 0xCC | 0xD4 | 0xDC | 0xE4 | 0xEC | 0xF4 | 0xFC => {
                let addr = self.imm16(bus);
                if self.condition(op >> 3) {
                    self.push(bus, self.pc);
                    self.pc = addr;
                }
                11
            }

            // PUSH rp / PUSH PSW
            0xC5 | 0xD5 | 0xE5 => {
                self.push(bus, self.pair(op >> 4));
                11
            }
            0xF5 => {
                let word = (self.a as u16) << 8 | self.flags.to_psw() as u16;
                self.push(bus, word);
                11
            }

            // Immediate ALU forms
            0xC6 | 0xCE | 0xD6 | 0xDE | 0xE6 | 0xEE | 0xF6 | 0xFE => {
                let operand = self.imm8(bus);
                self.alu_op(op >> 3, operand);
                7
            }

            // RST n: also the shape every injected interrupt takes
            0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => {
                self.push(bus, self.pc);
                self.pc = (op & 0x38) as u16;
                11
            }

            // RET (0xD9 is the undocumented alias)
            0xC9 | 0xD9 => {
                self.pc = self.pop(bus);
                10
            }

            // CALL (0xDD/0xED/0xFD are undocumented aliases)
            0xCD | 0xDD | 0xED | 0xFD => {
                let addr = self.imm16(bus);
                self.push(bus, self.pc);
                self.pc = addr;
                17
            }

            0xD3 => {
                // OUT
                let port = self.imm8(bus);
                self.port_request = Some(PortRequest::Out(port));
                10
            }
            0xDB => {
                // IN
                let port = self.imm8(bus);
                self.port_request = Some(PortRequest::In(port));
                10
            }

            0xE3 => {
                // XTHL: swap HL with the stack top
                let lo = bus.read(self.sp);
                let hi = bus.read(self.sp.wrapping_add(1));
                bus.write(self.sp, self.l);
                bus.write(self.sp.wrapping_add(1), self.h);
                self.l = lo;
                self.h = hi;
                18
            }
            0xE9 => {
                // PCHL
                self.pc = self.hl();
                5
            }
            0xEB => {
                // XCHG
                std::mem::swap(&mut self.h, &mut self.d);
                std::mem::swap(&mut self.l, &mut self.e);
                4
            }
            0xF9 => {
                // SPHL
                self.sp = self.hl();
                5
            }

            0xF3 => {
                // DI
                self.int_enable = false;
                4
            }
            0xFB => {
                // EI
                self.int_enable = true;
                4
            }
        }
    }
}

impl Default for I8080 {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for I8080 {
    /// Status line in the monitor's register-dump style:
    /// `A=3E BC=0000 DE=0000 HL=1234 SP=1400 PC=0C05 zSpCa E`.
    /// Flag letters are upper-case when set; the trailing letter is the
    /// interrupt-enable state.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "A={:02X} BC={:02X}{:02X} DE={:02X}{:02X} HL={:02X}{:02X} SP={:04X} PC={:04X} ",
            self.a, self.b, self.c, self.d, self.e, self.h, self.l, self.sp, self.pc
        )?;
        for (set, ch) in [
            (self.flags.z, 'z'),
            (self.flags.s, 's'),
            (self.flags.p, 'p'),
            (self.flags.cy, 'c'),
            (self.flags.ac, 'a'),
        ] {
            write!(f, "{}", if set { ch.to_ascii_uppercase() } else { ch })?;
        }
        write!(f, " {}", if self.int_enable { 'E' } else { 'D' })?;
        if self.pending_interrupt != 0 {
            write!(f, " pending {:02X}", self.pending_interrupt)?;
        }
        if self.halted {
            write!(f, " (halted)")?;
        }
        Ok(())
    }
}
