use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::core::machine::TapeIndicator;

/// Byte returned by port 4 at end of tape or with no tape file available.
const TAPE_EOF: u8 = 0xFF;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TapeMode {
    Idle,
    Reading,
    Writing,
}

/// Cassette interface backed by a host file of raw bytes, no framing.
///
/// The relay (port 7 bit 7) connects the deck; while it is closed, the
/// first port-4 read opens the file for reading and the first port-2 write
/// opens it for appending. Opening the relay closes whichever file is open.
/// A failed open logs a warning, drops the relay and the guest carries on.
pub struct Tape {
    path: PathBuf,
    relay: bool,
    mode: TapeMode,
    file: Option<File>,
}

impl Tape {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            relay: false,
            mode: TapeMode::Idle,
            file: None,
        }
    }

    pub fn relay(&self) -> bool {
        self.relay
    }

    pub fn mode(&self) -> TapeMode {
        self.mode
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn indicator(&self) -> TapeIndicator {
        if !self.relay {
            TapeIndicator::RelayOff
        } else {
            match self.mode {
                TapeMode::Idle => TapeIndicator::Idle,
                TapeMode::Reading => TapeIndicator::Reading,
                TapeMode::Writing => TapeIndicator::Writing,
            }
        }
    }

    /// Port 7 bit 7. Dropping the relay mid-session closes the tape file.
    pub fn set_relay(&mut self, on: bool) {
        if on && !self.relay {
            self.relay = true;
        }
        if !on && self.relay {
            if self.mode != TapeMode::Idle {
                self.file = None;
                self.mode = TapeMode::Idle;
            }
            self.relay = false;
        }
    }

    /// Port 4: read the next tape byte, opening the file on the first read
    /// of a session. Returns 0xFF at end of tape.
    pub fn read_byte(&mut self) -> u8 {
        if !self.relay {
            return TAPE_EOF;
        }
        if self.mode == TapeMode::Idle {
            match File::open(&self.path) {
                Ok(f) => {
                    self.file = Some(f);
                    self.mode = TapeMode::Reading;
                }
                Err(e) => {
                    warn!("unable to open tape file {} for reading: {e}", self.path.display());
                    self.relay = false;
                    return TAPE_EOF;
                }
            }
        }
        if self.mode == TapeMode::Reading {
            if let Some(f) = &mut self.file {
                let mut byte = [0u8; 1];
                if let Ok(1) = f.read(&mut byte) {
                    return byte[0];
                }
            }
        }
        TAPE_EOF
    }

    /// Port 2: append one byte, opening the file on the first write of a
    /// session.
    pub fn write_byte(&mut self, byte: u8) {
        if !self.relay {
            return;
        }
        if self.mode == TapeMode::Idle {
            match OpenOptions::new().create(true).append(true).open(&self.path) {
                Ok(f) => {
                    self.file = Some(f);
                    self.mode = TapeMode::Writing;
                }
                Err(e) => {
                    warn!("unable to open tape file {} for writing: {e}", self.path.display());
                    self.relay = false;
                    return;
                }
            }
        }
        if self.mode == TapeMode::Writing {
            if let Some(f) = &mut self.file {
                if let Err(e) = f.write_all(&[byte]) {
                    warn!("tape write to {} failed: {e}", self.path.display());
                }
            }
        }
    }
}
