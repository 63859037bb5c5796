//! Two-pass driver.
//!
//! Pass 1 walks every token, populating the symbol table with label
//! definitions and counting emitted bytes per origin, without emitting.
//! Pass 2 repeats the walk with the sinks attached; forward references
//! resolve from the table built in pass 1, and anything still undefined
//! reads as 0 and is reported afterwards.

use std::fs::OpenOptions;
use std::path::PathBuf;

use colored::Colorize;

use crate::emit::{Emitter, Listing, MAX_REPEAT, Mood};
use crate::mnemonic::{self, Encoding};
use crate::source::{SOURCE_EXT, SourceStack};
use crate::symbol::SymbolTable;
use crate::AsmError;

/// Interpretation of the ambiguous `CC` token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadMode {
    /// Always the hex byte 0xCC.
    Hex,
    /// Always the conditional-call mnemonic.
    Code,
    /// Mnemonic only at an instruction boundary (the default).
    Smart,
}

/// A literal's evaluated value. One or two hex digits make a byte, more
/// make a 16-bit word; the distinction decides whether one or two bytes
/// are emitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Value {
    Byte(u8),
    Word(u16),
}

impl Value {
    pub fn as_u16(self) -> u16 {
        match self {
            Value::Byte(b) => b as u16,
            Value::Word(w) => w,
        }
    }
}

#[derive(Default)]
pub struct Options {
    pub verbose: bool,
    pub extra_space: bool,
    pub org_init: u16,
    pub serial_device: Option<PathBuf>,
}

pub struct Assembler {
    opts: Options,
    symbols: SymbolTable,
    mode: ReadMode,
    pass: usize,
}

impl Assembler {
    pub fn new(opts: Options) -> Self {
        Self {
            opts,
            symbols: SymbolTable::new(),
            mode: ReadMode::Smart,
            pass: 0,
        }
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Run both passes over `text` and return the emitted byte stream.
    pub fn assemble(&mut self, text: &str, file: &str) -> Result<Vec<u8>, AsmError> {
        let mut emit = Emitter::counting();
        self.run_pass(text, file, &mut emit)?;
        let end_addr = emit.address();

        let serial = match &self.opts.serial_device {
            Some(path) => {
                println!("Transmitting down the wires...");
                let device = OpenOptions::new().write(true).open(path).map_err(|e| {
                    AsmError::Output {
                        path: path.display().to_string(),
                        source: e,
                    }
                })?;
                Some(device)
            }
            None => None,
        };
        let listing = self
            .opts
            .verbose
            .then(|| Listing::new(self.opts.extra_space, end_addr));
        let mut emit = Emitter::emitting(serial, listing);
        self.run_pass(text, file, &mut emit)?;
        if self.opts.verbose {
            println!();
        }
        if self.opts.serial_device.is_some() {
            println!("\nFinished transmitting down the wires");
        }
        Ok(emit.into_output())
    }

    fn run_pass(&mut self, text: &str, file: &str, emit: &mut Emitter) -> Result<(), AsmError> {
        let mut src = SourceStack::new(text, file);
        self.mode = ReadMode::Smart;
        self.seed_symbols(emit)?;

        loop {
            let token = match src.next_token()? {
                Some(token) => token,
                None => {
                    if self.pass == 0 && self.opts.verbose {
                        println!("Finished with {} at line {}", src.file(), src.line());
                    }
                    if src.pop() {
                        if self.pass == 0 && self.opts.verbose {
                            println!("Re-entering {} at line {}", src.file(), src.line());
                        }
                        continue;
                    }
                    break;
                }
            };

            if token == "mode" {
                self.read_mode(&mut src)?;
                continue;
            }
            if token == "include" {
                self.include(&mut src)?;
                continue;
            }
            self.token(token, &mut src, emit)?;
        }

        let end = emit.address() as u16;
        self.symbols.set_value("END", end);
        self.pass += 1;
        Ok(())
    }

    fn seed_symbols(&mut self, emit: &mut Emitter) -> Result<(), AsmError> {
        let org = self.opts.org_init;
        self.symbols
            .define("ORG", org, 0, "")
            .map_err(|_| AsmError::SymbolTableFull {
                line: 0,
                file: String::new(),
            })?;
        emit.set_origin(org);
        if self.pass == 0 {
            self.symbols
                .define("END", 0, 0, "")
                .map_err(|_| AsmError::SymbolTableFull {
                    line: 0,
                    file: String::new(),
                })?;
        }
        Ok(())
    }

    fn read_mode(&mut self, src: &mut SourceStack) -> Result<(), AsmError> {
        let token = src.next_token()?.ok_or_else(|| self.eof(src))?;
        self.mode = match token.as_str() {
            "hex" => ReadMode::Hex,
            "code" => ReadMode::Code,
            _ => ReadMode::Smart,
        };
        if self.pass == 0 && self.opts.verbose {
            let desc = match self.mode {
                ReadMode::Hex => "hex, CC always interpreted as hexadecimal",
                ReadMode::Code => "code, CC always interpreted as op code DC",
                ReadMode::Smart => "smart, interpretation of CC depends on context",
            };
            println!("Mode set: {desc} [line {} in {}]", src.line(), src.file());
        }
        Ok(())
    }

    fn include(&mut self, src: &mut SourceStack) -> Result<(), AsmError> {
        let name = src.next_token()?.ok_or_else(|| self.eof(src))?;
        let path = if name.contains('.') {
            name
        } else {
            format!("{name}{SOURCE_EXT}")
        };
        if self.pass == 0 && self.opts.verbose {
            println!(
                "At line {} in {}, including tokens from {path}",
                src.line(),
                src.file()
            );
        }
        let text = std::fs::read_to_string(&path).map_err(|e| AsmError::Source {
            path: path.clone(),
            source: e,
        })?;
        if !src.push(text, path) {
            return Err(AsmError::IncludeDepth {
                line: src.line(),
                file: src.file().to_string(),
            });
        }
        Ok(())
    }

    /// Process one ordinary token: peel the modifiers off the front, then
    /// emit the atom that remains.
    fn token(
        &mut self,
        token: String,
        src: &mut SourceStack,
        emit: &mut Emitter,
    ) -> Result<(), AsmError> {
        let mut tok = token;
        let quoted = tok.starts_with('"') || tok.starts_with('\'');
        if !quoted {
            // name=expr defines and emits nothing
            if let Some(idx) = tok.find('=') {
                let name = tok[..idx].to_string();
                let expr = match &tok[idx + 1..] {
                    "" => src.next_token()?.ok_or_else(|| self.eof(src))?,
                    rest => rest.to_string(),
                };
                let value = self.eval(&expr, src).as_u16();
                self.define(&name, value, src, emit)?;
                return Ok(());
            }
            // name: defines the current address, rest of token continues
            if let Some(idx) = tok.find(':') {
                let name = tok[..idx].to_string();
                let addr = emit.address() as u16;
                self.define(&name, addr, src, emit)?;
                tok = tok[idx + 1..].to_string();
            }
            // count*token repeats the unit the token emits
            if let Some(idx) = tok.find('*') {
                let count = self.repeat_count(&tok[..idx], src);
                emit.set_repeat(count);
                tok = tok[idx + 1..].to_string();
            } else if emit.countdown() == 0 {
                emit.set_repeat(1);
            }
            // target>token fills with the token until the target address
            if let Some(idx) = tok.find('>') {
                let target = tok[..idx].to_string();
                let value = match target.strip_prefix('!') {
                    Some(name) => self.lookup(name, src)?,
                    None => self.eval(&target, src).as_u16(),
                };
                emit.set_fill_target(value);
                tok = tok[idx + 1..].to_string();
            }
        }

        let Some(&first) = tok.as_bytes().first() else {
            return Ok(());
        };
        match first {
            // String in double quotes
            b'"' => {
                if tok.len() < 2 || !tok.ends_with('"') {
                    self.warn("invalid string", src);
                    return Ok(());
                }
                let inner: Vec<u8> = tok.as_bytes()[1..tok.len() - 1]
                    .iter()
                    .copied()
                    .filter(|&b| b != b'"')
                    .collect();
                emit.set_countdown(inner.len());
                for byte in inner {
                    emit.byte(byte, Mood::Ascii);
                }
            }
            // Character in single quotes
            b'\'' => {
                if tok.len() != 3 || !tok.ends_with('\'') {
                    self.warn("invalid character", src);
                } else {
                    emit.byte(tok.as_bytes()[1], Mood::Ascii);
                }
            }
            // Decimal literal
            b'%' => match self.eval(&tok, src) {
                Value::Byte(byte) => emit.byte(byte, Mood::Dec),
                Value::Word(_) => self.warn("decimal number too large, should be < 256", src),
            },
            // Variable dereference: !name emits a little-endian word,
            // !name.H / !name.L (or H.!name / L.!name) a single byte
            b'!' => {
                let body = tok[1..].to_string();
                match body.split_once('.') {
                    Some((name, suffix)) => {
                        let value = self.lookup(name, src)?;
                        let byte = match suffix {
                            "H" => (value >> 8) as u8,
                            "L" => value as u8,
                            _ => {
                                self.warn("invalid byte specification", src);
                                0
                            }
                        };
                        emit.byte(byte, Mood::Var);
                    }
                    None => {
                        let value = self.lookup(&body, src)?;
                        emit.word(value, Mood::Var);
                    }
                }
            }
            _ if tok.starts_with("H.!") || tok.starts_with("L.!") => {
                let value = self.lookup(&tok[3..], src)?;
                let byte = if first == b'H' {
                    (value >> 8) as u8
                } else {
                    value as u8
                };
                emit.byte(byte, Mood::Var);
            }
            // Mnemonic or bare hex
            _ => {
                let mn = mnemonic::lookup(&tok);
                let as_mnemonic = if tok == "CC" {
                    match self.mode {
                        ReadMode::Hex => false,
                        ReadMode::Code => true,
                        ReadMode::Smart => {
                            emit.mood() == Mood::Opcode && emit.countdown() == 0
                        }
                    }
                } else {
                    mn.is_some()
                };
                match (as_mnemonic, mn) {
                    (true, Some(m)) => {
                        let mut value = m.base;
                        match m.encoding {
                            Encoding::Implied => {}
                            Encoding::SrcReg => value |= self.read_register(src)?,
                            Encoding::DstReg => value |= self.read_register(src)? << 3,
                            Encoding::DstSrcReg => {
                                value |= self.read_register(src)? << 3;
                                value |= self.read_register(src)?;
                            }
                            Encoding::Pair => value |= self.read_pair(src)? << 3,
                            Encoding::Rst => value |= self.read_rst(src)? << 3,
                        }
                        emit.set_countdown(m.extra_bytes as usize);
                        emit.byte(value, Mood::Opcode);
                    }
                    _ => match self.eval(&tok, src) {
                        Value::Byte(byte) => emit.byte(byte, Mood::Hex),
                        Value::Word(word) => emit.word(word, Mood::Hex),
                    },
                }
            }
        }
        Ok(())
    }

    fn define(
        &mut self,
        name: &str,
        value: u16,
        src: &SourceStack,
        emit: &mut Emitter,
    ) -> Result<(), AsmError> {
        let previous = self
            .symbols
            .define(name, value, src.line(), src.file())
            .map_err(|_| AsmError::SymbolTableFull {
                line: src.line(),
                file: src.file().to_string(),
            })?;
        if self.pass == 0 {
            if let Some((line, file)) = previous {
                eprintln!(
                    "{}: {name} being redefined at line {} in {}, previous value was defined at line {line} in {file}",
                    "warning".yellow().bold(),
                    src.line(),
                    src.file()
                );
            }
        }
        if name == "ORG" {
            emit.set_origin(value);
        }
        Ok(())
    }

    fn lookup(&mut self, name: &str, src: &SourceStack) -> Result<u16, AsmError> {
        self.symbols
            .lookup(name)
            .map_err(|_| AsmError::SymbolTableFull {
                line: src.line(),
                file: src.file().to_string(),
            })
    }

    /// Value of a literal token: `%nnn` decimal, otherwise hex with an
    /// optional `0x` prefix and optional trailing `H`. Anything
    /// unrecognisable warns and reads as 0.
    fn eval(&mut self, token: &str, src: &SourceStack) -> Value {
        if let Some(dec) = token.strip_prefix('%') {
            return match dec.parse::<i64>() {
                Ok(v) if (0..0x100).contains(&v) => Value::Byte(v as u8),
                Ok(v) if (0..=0xFFFF).contains(&v) => Value::Word(v as u16),
                Ok(_) => {
                    self.warn("invalid number, using 0", src);
                    Value::Byte(0)
                }
                Err(_) => {
                    self.warn(&format!("unrecognised value for {token}, using 0"), src);
                    Value::Byte(0)
                }
            };
        }
        let digits = token.strip_prefix("0x").unwrap_or(token);
        let digits = digits
            .strip_suffix('H')
            .or_else(|| digits.strip_suffix('h'))
            .unwrap_or(digits);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            self.warn(&format!("unrecognised value for {token}, using 0"), src);
            return Value::Byte(0);
        }
        match u32::from_str_radix(digits, 16) {
            Ok(v) if v <= 0xFFFF => {
                if digits.len() <= 2 {
                    Value::Byte(v as u8)
                } else {
                    Value::Word(v as u16)
                }
            }
            _ => {
                self.warn("invalid number, using 0", src);
                Value::Byte(0)
            }
        }
    }

    fn repeat_count(&mut self, text: &str, src: &SourceStack) -> u32 {
        let parsed = match text.strip_prefix("0x") {
            Some(hex) => i64::from_str_radix(hex, 16).ok(),
            None => text.parse::<i64>().ok(),
        };
        match parsed {
            None => {
                self.warn("invalid repeat count, using 0", src);
                0
            }
            Some(v) if v < 0 => {
                self.warn("negative repeat number, setting to zero", src);
                0
            }
            Some(v) if v > MAX_REPEAT => {
                self.warn("repeat number too large, ignoring", src);
                0
            }
            Some(v) => v as u32,
        }
    }

    fn read_register(&mut self, src: &mut SourceStack) -> Result<u8, AsmError> {
        let token = src.next_token()?.ok_or_else(|| self.eof(src))?;
        match mnemonic::register_code(&token) {
            Some(code) => Ok(code),
            None => {
                self.warn("invalid register specification", src);
                Ok(0)
            }
        }
    }

    fn read_pair(&mut self, src: &mut SourceStack) -> Result<u8, AsmError> {
        let token = src.next_token()?.ok_or_else(|| self.eof(src))?;
        match mnemonic::pair_code(&token) {
            Some(code) => Ok(code),
            None => {
                self.warn("invalid register specification", src);
                Ok(0)
            }
        }
    }

    fn read_rst(&mut self, src: &mut SourceStack) -> Result<u8, AsmError> {
        let token = src.next_token()?.ok_or_else(|| self.eof(src))?;
        match mnemonic::rst_code(&token) {
            Some(code) => Ok(code),
            None => {
                self.warn("invalid number in RST N", src);
                Ok(0)
            }
        }
    }

    fn warn(&self, msg: &str, src: &SourceStack) {
        eprintln!(
            "{}: {msg} [line {} in {}]",
            "warning".yellow().bold(),
            src.line(),
            src.file()
        );
    }

    fn eof(&self, src: &SourceStack) -> AsmError {
        AsmError::UnexpectedEof {
            line: src.line(),
            file: src.file().to_string(),
        }
    }
}
