//! The 8080 mnemonic table and operand field parsers.
//!
//! Registers encode as B=0, C=1, D=2, E=3, H=4, L=5, M=6, A=7; register
//! pairs as B=0, D=2, H=4, SP/PSW=6 (already doubled, so the pair field
//! shifts left by 3 like the other destination fields).

/// How a mnemonic's operand tokens fold into the opcode byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Encoding {
    /// No operand field in the opcode.
    Implied,
    /// Source register in bits 0-2.
    SrcReg,
    /// Destination register in bits 3-5.
    DstReg,
    /// Destination in bits 3-5, then source in bits 0-2.
    DstSrcReg,
    /// Register pair in bits 4-5.
    Pair,
    /// Restart number in bits 3-5.
    Rst,
}

pub struct Mnemonic {
    pub name: &'static str,
    /// Base opcode before operand fields are folded in.
    pub base: u8,
    pub encoding: Encoding,
    /// Immediate bytes following the opcode.
    pub extra_bytes: u8,
}

macro_rules! mn {
    ($name:literal, $base:literal, $enc:ident, $extra:literal) => {
        Mnemonic {
            name: $name,
            base: $base,
            encoding: Encoding::$enc,
            extra_bytes: $extra,
        }
    };
}

/// All 78 mnemonics. `CC` is both a mnemonic and a plausible hex byte; the
/// assembler decides which from its read mode and emission mood.
pub static MNEMONICS: [Mnemonic; 78] = [
    mn!("ACI", 0xCE, Implied, 1),
    mn!("ADC", 0x88, SrcReg, 0),
    mn!("ADD", 0x80, SrcReg, 0),
    mn!("ADI", 0xC6, Implied, 1),
    mn!("ANA", 0xA0, SrcReg, 0),
    mn!("ANI", 0xE6, Implied, 1),
    mn!("CALL", 0xCD, Implied, 2),
    mn!("CC", 0xDC, Implied, 2),
    mn!("CM", 0xFC, Implied, 2),
    mn!("CMA", 0x2F, Implied, 0),
    mn!("CMC", 0x3F, Implied, 0),
    mn!("CMP", 0xB8, SrcReg, 0),
    mn!("CNC", 0xD4, Implied, 2),
    mn!("CNZ", 0xC4, Implied, 2),
    mn!("CP", 0xF4, Implied, 2),
    mn!("CPE", 0xEC, Implied, 2),
    mn!("CPI", 0xFE, Implied, 1),
    mn!("CPO", 0xE4, Implied, 2),
    mn!("CZ", 0xCC, Implied, 2),
    mn!("DAA", 0x27, Implied, 0),
    mn!("DAD", 0x09, Pair, 0),
    mn!("DCR", 0x05, DstReg, 0),
    mn!("DCX", 0x0B, Pair, 0),
    mn!("DI", 0xF3, Implied, 0),
    mn!("EI", 0xFB, Implied, 0),
    mn!("HLT", 0x76, Implied, 0),
    mn!("IN", 0xDB, Implied, 1),
    mn!("INR", 0x04, DstReg, 0),
    mn!("INX", 0x03, Pair, 0),
    mn!("JC", 0xDA, Implied, 2),
    mn!("JM", 0xFA, Implied, 2),
    mn!("JMP", 0xC3, Implied, 2),
    mn!("JNC", 0xD2, Implied, 2),
    mn!("JNZ", 0xC2, Implied, 2),
    mn!("JP", 0xF2, Implied, 2),
    mn!("JPE", 0xEA, Implied, 2),
    mn!("JPO", 0xE2, Implied, 2),
    mn!("JZ", 0xCA, Implied, 2),
    mn!("LDA", 0x3A, Implied, 2),
    mn!("LDAX", 0x0A, Pair, 0),
    mn!("LHLD", 0x2A, Implied, 2),
    mn!("LXI", 0x01, Pair, 2),
    mn!("MVI", 0x06, DstReg, 1),
    mn!("MOV", 0x40, DstSrcReg, 0),
    mn!("NOP", 0x00, Implied, 0),
    mn!("ORA", 0xB0, SrcReg, 0),
    mn!("ORI", 0xF6, Implied, 1),
    mn!("OUT", 0xD3, Implied, 1),
    mn!("PCHL", 0xE9, Implied, 0),
    mn!("POP", 0xC1, Pair, 0),
    mn!("PUSH", 0xC5, Pair, 0),
    mn!("RAL", 0x17, Implied, 0),
    mn!("RAR", 0x1F, Implied, 0),
    mn!("RC", 0xD8, Implied, 0),
    mn!("RET", 0xC9, Implied, 0),
    mn!("RLC", 0x07, Implied, 0),
    mn!("RM", 0xF8, Implied, 0),
    mn!("RNC", 0xD0, Implied, 0),
    mn!("RNZ", 0xC0, Implied, 0),
    mn!("RP", 0xF0, Implied, 0),
    mn!("RPE", 0xE8, Implied, 0),
    mn!("RPO", 0xE0, Implied, 0),
    mn!("RRC", 0x0F, Implied, 0),
    mn!("RST", 0xC7, Rst, 0),
    mn!("RZ", 0xC8, Implied, 0),
    mn!("SBB", 0x98, SrcReg, 0),
    mn!("SBI", 0xDE, Implied, 1),
    mn!("SHLD", 0x22, Implied, 2),
    mn!("SPHL", 0xF9, Implied, 0),
    mn!("STA", 0x32, Implied, 2),
    mn!("STAX", 0x02, Pair, 0),
    mn!("STC", 0x37, Implied, 0),
    mn!("SUB", 0x90, SrcReg, 0),
    mn!("SUI", 0xD6, Implied, 1),
    mn!("XCHG", 0xEB, Implied, 0),
    mn!("XRA", 0xA8, SrcReg, 0),
    mn!("XRI", 0xEE, Implied, 1),
    mn!("XTHL", 0xE3, Implied, 0),
];

pub fn lookup(name: &str) -> Option<&'static Mnemonic> {
    MNEMONICS.iter().find(|m| m.name == name)
}

/// Register operand code (B C D E H L M A).
pub fn register_code(token: &str) -> Option<u8> {
    match token {
        "B" => Some(0),
        "C" => Some(1),
        "D" => Some(2),
        "E" => Some(3),
        "H" => Some(4),
        "L" => Some(5),
        "M" => Some(6),
        "A" => Some(7),
        _ => None,
    }
}

/// Register pair operand code (B D H SP/PSW), pre-doubled.
pub fn pair_code(token: &str) -> Option<u8> {
    match token {
        "B" => Some(0),
        "D" => Some(2),
        "H" => Some(4),
        "SP" | "PSW" => Some(6),
        _ => None,
    }
}

/// Restart number after RST.
pub fn rst_code(token: &str) -> Option<u8> {
    match token {
        "0" => Some(0),
        "1" => Some(1),
        "2" => Some(2),
        "3" => Some(3),
        "4" => Some(4),
        "5" => Some(5),
        "6" => Some(6),
        "7" => Some(7),
        _ => None,
    }
}
