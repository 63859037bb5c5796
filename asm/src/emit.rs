//! Byte emission: instruction buffering, repeats, fill-to-address, and the
//! pass-2 output sinks.
//!
//! Bytes are buffered until the current emission unit completes (an opcode
//! plus its immediates, a string, a bare word) and then flushed as a block,
//! which is what the repeat and fill modifiers multiply. Pass 1 runs the
//! same machinery with the sinks disconnected so only the byte counter and
//! symbol table advance.

use std::fs::File;
use std::io::Write;
use std::time::Duration;

/// Repeat counts above this are rejected as probable mistakes.
pub const MAX_REPEAT: i64 = 0x1000;

/// Pacing for the 300-baud serial sink.
const SERIAL_BYTE_DELAY: Duration = Duration::from_millis(50);

/// Semantic class of the byte being emitted, used to disambiguate `CC`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mood {
    Hex,
    Ascii,
    Dec,
    Var,
    Opcode,
}

/// Verbose pass-2 listing state: 16 bytes per row, addresses in the left
/// column, an optional gap after the eighth byte.
pub struct Listing {
    extra_space: bool,
    end_addr: u32,
    column: usize,
}

impl Listing {
    pub fn new(extra_space: bool, end_addr: u32) -> Self {
        Self {
            extra_space,
            end_addr,
            column: 0,
        }
    }
}

pub struct Emitter {
    buf: Vec<u8>,
    countdown: usize,
    mood: Mood,
    repeat: u32,
    fill_target: Option<u16>,
    origin: u16,
    byte_count: u32,
    emitting: bool,
    out: Vec<u8>,
    serial: Option<File>,
    listing: Option<Listing>,
}

impl Emitter {
    /// Pass-1 emitter: counts bytes, writes nothing.
    pub fn counting() -> Self {
        Self::build(false, None, None)
    }

    /// Pass-2 emitter with the output sinks attached.
    pub fn emitting(serial: Option<File>, listing: Option<Listing>) -> Self {
        Self::build(true, serial, listing)
    }

    fn build(emitting: bool, serial: Option<File>, listing: Option<Listing>) -> Self {
        Self {
            buf: Vec::new(),
            countdown: 0,
            mood: Mood::Opcode,
            repeat: 1,
            fill_target: None,
            origin: 0,
            byte_count: 0,
            emitting,
            out: Vec::new(),
            serial,
            listing,
        }
    }

    /// `ORG=` resets the address counter (and the listing row) without
    /// seeking the output stream.
    pub fn set_origin(&mut self, value: u16) {
        self.origin = value;
        self.byte_count = 0;
        if let Some(listing) = &mut self.listing {
            listing.column = 0;
        }
    }

    pub fn origin(&self) -> u16 {
        self.origin
    }

    pub fn byte_count(&self) -> u32 {
        self.byte_count
    }

    /// Current program counter, `ORG + bytes emitted since`.
    pub fn address(&self) -> u32 {
        self.origin as u32 + self.byte_count
    }

    pub fn mood(&self) -> Mood {
        self.mood
    }

    pub fn countdown(&self) -> usize {
        self.countdown
    }

    /// Arm the immediate-byte countdown for the emission unit being started.
    pub fn set_countdown(&mut self, bytes: usize) {
        self.countdown = bytes;
    }

    pub fn set_repeat(&mut self, count: u32) {
        self.repeat = count;
    }

    pub fn set_fill_target(&mut self, target: u16) {
        self.fill_target = Some(target);
    }

    /// Buffer one byte; flushes the unit when no immediates remain.
    ///
    /// An opcode byte switches the mood to `Opcode` without consuming the
    /// countdown its caller just armed. A literal byte outside any unit
    /// takes its own mood; inside a unit it only counts the immediate down,
    /// leaving the mood at `Opcode`.
    pub fn byte(&mut self, value: u8, mood: Mood) {
        if self.countdown == 0 || mood == Mood::Opcode {
            self.mood = mood;
        } else {
            self.countdown -= 1;
        }
        self.buf.push(value);
        if self.countdown == 0 {
            self.flush();
        }
    }

    /// Buffer a 16-bit word, little-endian. A bare word forms its own
    /// two-byte unit so repeats apply to the pair.
    pub fn word(&mut self, value: u16, mood: Mood) {
        if self.countdown == 0 {
            self.countdown = 2;
        }
        self.byte(value as u8, mood);
        self.byte((value >> 8) as u8, mood);
    }

    fn flush(&mut self) {
        let buf = std::mem::take(&mut self.buf);
        let already_past = self
            .fill_target
            .is_some_and(|target| self.address() >= target as u32);
        if !already_past {
            let mut repeats = self.repeat;
            while repeats > 0 {
                self.write_buffer(&buf);
                match self.fill_target {
                    // Filling: keep going until the target address.
                    Some(target) => {
                        if self.address() >= target as u32 {
                            break;
                        }
                    }
                    None => repeats -= 1,
                }
            }
        }
        self.repeat = 1;
        self.fill_target = None;
    }

    fn write_buffer(&mut self, buf: &[u8]) {
        for &byte in buf {
            if self.emitting {
                self.out.push(byte);
                if let Some(serial) = &mut self.serial {
                    let _ = serial.write_all(&[byte]);
                    std::thread::sleep(SERIAL_BYTE_DELAY);
                }
                if let Some(listing) = &mut self.listing {
                    if listing.column == 0 {
                        let pc = self.origin as u32 + self.byte_count;
                        if pc < listing.end_addr {
                            print!("\n{pc:04X} ");
                        }
                    }
                    if listing.extra_space && listing.column == 8 {
                        print!(" ");
                    }
                    print!(" {byte:02X}");
                }
            }
            self.byte_count += 1;
            if let Some(listing) = &mut self.listing {
                listing.column += 1;
                if listing.column == 16 {
                    listing.column = 0;
                }
            }
        }
    }

    pub fn into_output(self) -> Vec<u8> {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_bytes_flush_immediately() {
        let mut emit = Emitter::emitting(None, None);
        emit.byte(0xAA, Mood::Hex);
        emit.byte(0xBB, Mood::Hex);
        assert_eq!(emit.byte_count(), 2);
        assert_eq!(emit.into_output(), vec![0xAA, 0xBB]);
    }

    #[test]
    fn instruction_unit_buffers_until_immediates_done() {
        let mut emit = Emitter::emitting(None, None);
        emit.set_countdown(2);
        emit.byte(0xC3, Mood::Opcode);
        assert_eq!(emit.byte_count(), 0); // still buffered
        emit.byte(0x00, Mood::Hex);
        emit.byte(0x0C, Mood::Hex);
        assert_eq!(emit.into_output(), vec![0xC3, 0x00, 0x0C]);
    }

    #[test]
    fn repeat_multiplies_the_whole_unit() {
        let mut emit = Emitter::emitting(None, None);
        emit.set_repeat(3);
        emit.set_countdown(1);
        emit.byte(0x3E, Mood::Opcode);
        emit.byte(0x41, Mood::Hex);
        assert_eq!(emit.into_output(), vec![0x3E, 0x41, 0x3E, 0x41, 0x3E, 0x41]);
    }

    #[test]
    fn repeat_resets_after_flush() {
        let mut emit = Emitter::emitting(None, None);
        emit.set_repeat(2);
        emit.byte(0x11, Mood::Hex);
        emit.byte(0x22, Mood::Hex);
        assert_eq!(emit.into_output(), vec![0x11, 0x11, 0x22]);
    }

    #[test]
    fn zero_repeat_emits_nothing() {
        let mut emit = Emitter::emitting(None, None);
        emit.set_repeat(0);
        emit.byte(0x11, Mood::Hex);
        assert_eq!(emit.byte_count(), 0);
        assert!(emit.into_output().is_empty());
    }

    #[test]
    fn bare_word_is_little_endian() {
        let mut emit = Emitter::emitting(None, None);
        emit.word(0x1234, Mood::Hex);
        assert_eq!(emit.into_output(), vec![0x34, 0x12]);
    }

    #[test]
    fn fill_stops_at_target() {
        let mut emit = Emitter::emitting(None, None);
        emit.set_origin(0x1000);
        for _ in 0..3 {
            emit.byte(0x00, Mood::Hex);
        }
        emit.set_fill_target(0x1005);
        emit.byte(0xFF, Mood::Hex);
        assert_eq!(emit.address(), 0x1005);
        assert_eq!(emit.into_output(), vec![0, 0, 0, 0xFF, 0xFF]);
    }

    #[test]
    fn fill_already_past_target_emits_nothing() {
        let mut emit = Emitter::emitting(None, None);
        emit.set_origin(0x1000);
        emit.set_fill_target(0x1000);
        emit.byte(0x00, Mood::Hex);
        assert_eq!(emit.byte_count(), 0);
        assert!(emit.into_output().is_empty());
    }

    #[test]
    fn origin_reset_restarts_the_count() {
        let mut emit = Emitter::emitting(None, None);
        emit.set_origin(0x0100);
        emit.byte(0x01, Mood::Hex);
        assert_eq!(emit.address(), 0x0101);
        emit.set_origin(0x4000);
        assert_eq!(emit.address(), 0x4000);
        emit.byte(0x02, Mood::Hex);
        // the stream keeps both bytes back to back
        assert_eq!(emit.into_output(), vec![0x01, 0x02]);
    }

    #[test]
    fn opcode_mood_survives_immediates() {
        let mut emit = Emitter::emitting(None, None);
        emit.set_countdown(1);
        emit.byte(0x3E, Mood::Opcode);
        assert_eq!(emit.mood(), Mood::Opcode);
        assert_eq!(emit.countdown(), 1);
        emit.byte(0xCC, Mood::Hex);
        assert_eq!(emit.mood(), Mood::Opcode);
        assert_eq!(emit.countdown(), 0);
        // a literal outside any unit takes its own mood
        emit.byte(0x42, Mood::Hex);
        assert_eq!(emit.mood(), Mood::Hex);
    }

    #[test]
    fn counting_pass_produces_no_output() {
        let mut emit = Emitter::counting();
        emit.byte(0x42, Mood::Hex);
        assert_eq!(emit.byte_count(), 1);
        assert!(emit.into_output().is_empty());
    }
}
