//! ROM loading and validation for the Triton system.
//!
//! Supports loading ROM files from a directory (by convention the working
//! directory) or from programmatic byte slices (for testing). The stock
//! 7.2 ROM set has no published checksums, so only sizes are validated.

use std::collections::HashMap;
use std::path::Path;

use tracing::info;
use triton_core::core::MemoryMap;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can occur when loading a ROM set.
#[derive(Debug)]
pub enum RomLoadError {
    /// Underlying I/O error (file not found, permission denied, etc.)
    Io(std::io::Error),

    /// A required ROM file was not found in the set.
    MissingFile(String),

    /// ROM file size does not match the expected size.
    SizeMismatch {
        file: String,
        expected: usize,
        actual: usize,
    },
}

impl std::fmt::Display for RomLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::MissingFile(name) => write!(f, "missing ROM file: {name}"),
            Self::SizeMismatch {
                file,
                expected,
                actual,
            } => write!(f, "ROM {file}: expected {expected} bytes, got {actual}"),
        }
    }
}

impl std::error::Error for RomLoadError {}

impl From<std::io::Error> for RomLoadError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

// ---------------------------------------------------------------------------
// RomSet
// ---------------------------------------------------------------------------

/// A collection of ROM files loaded from disk or provided programmatically.
pub struct RomSet {
    files: HashMap<String, Vec<u8>>,
}

impl RomSet {
    /// Create a RomSet from a directory of ROM files.
    ///
    /// Reads all files in the directory (non-recursive) and stores
    /// them by filename (without path).
    pub fn from_directory(path: &Path) -> Result<Self, RomLoadError> {
        let mut files = HashMap::new();
        for entry in std::fs::read_dir(path)? {
            let entry = entry?;
            let file_path = entry.path();
            if file_path.is_file() {
                let name = file_path
                    .file_name()
                    .unwrap_or_default()
                    .to_string_lossy()
                    .to_string();
                let data = std::fs::read(&file_path)?;
                files.insert(name, data);
            }
        }
        Ok(Self { files })
    }

    /// Create a RomSet from programmatic byte slices (for testing).
    ///
    /// Each entry is a (filename, data) pair.
    pub fn from_slices(entries: &[(&str, &[u8])]) -> Self {
        let mut files = HashMap::new();
        for (name, data) in entries {
            files.insert(name.to_string(), data.to_vec());
        }
        Self { files }
    }

    /// Get a ROM file's data by name.
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.files.get(name).map(|v| v.as_slice())
    }

    /// Get a ROM file's data, returning an error if missing.
    pub fn require(&self, name: &str) -> Result<&[u8], RomLoadError> {
        self.get(name)
            .ok_or_else(|| RomLoadError::MissingFile(name.to_string()))
    }

    /// Get a ROM file's data, validating its size.
    pub fn require_sized(&self, name: &str, expected_size: usize) -> Result<&[u8], RomLoadError> {
        let data = self.require(name)?;
        if data.len() != expected_size {
            return Err(RomLoadError::SizeMismatch {
                file: name.to_string(),
                expected: expected_size,
                actual: data.len(),
            });
        }
        Ok(data)
    }

    /// List all file names in the set.
    pub fn file_names(&self) -> Vec<&str> {
        self.files.keys().map(|s| s.as_str()).collect()
    }
}

// ---------------------------------------------------------------------------
// RomEntry
// ---------------------------------------------------------------------------

/// Describes one ROM image and where it maps in the address space.
pub struct RomEntry {
    /// Filename in the ROM set.
    pub name: &'static str,
    /// Expected size in bytes.
    pub size: usize,
    /// Load address.
    pub addr: u16,
}

/// The mandatory Triton 7.2 ROM set.
pub static SYSTEM_ROMS: [RomEntry; 4] = [
    RomEntry {
        name: "MONA72_ROM",
        size: 0x0400,
        addr: 0x0000,
    },
    RomEntry {
        name: "MONB72_ROM",
        size: 0x0400,
        addr: 0x0C00,
    },
    RomEntry {
        name: "TRAP_ROM",
        size: 0x2000,
        addr: 0xC000,
    },
    RomEntry {
        name: "BASIC72_ROM",
        size: 0x2000,
        addr: 0xE000,
    },
];

/// User ROM sockets at 0x0400 and 0x0800, 1 KiB each.
pub const USER_ROM_ADDRS: [u16; 2] = [0x0400, 0x0800];
pub const USER_ROM_SIZE: usize = 0x0400;

/// Map one ROM entry into memory, validating its size.
pub fn load_entry(
    mem: &mut MemoryMap,
    rom_set: &RomSet,
    entry: &RomEntry,
) -> Result<(), RomLoadError> {
    let data = rom_set.require_sized(entry.name, entry.size)?;
    mem.load(entry.addr, data);
    info!(
        "{:04X} - {:04X} : {}",
        entry.addr,
        entry.addr as usize + entry.size - 1,
        entry.name
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_slices_creates_romset() {
        let rom_set = RomSet::from_slices(&[
            ("test1.rom", &[0x01, 0x02, 0x03]),
            ("test2.rom", &[0x04, 0x05]),
        ]);
        assert_eq!(rom_set.get("test1.rom"), Some(&[0x01, 0x02, 0x03][..]));
        assert_eq!(rom_set.get("test2.rom"), Some(&[0x04, 0x05][..]));
    }

    #[test]
    fn get_missing_returns_none() {
        let rom_set = RomSet::from_slices(&[("a.rom", &[0x00])]);
        assert!(rom_set.get("missing.rom").is_none());
    }

    #[test]
    fn require_missing_returns_error() {
        let rom_set = RomSet::from_slices(&[]);
        let result = rom_set.require("missing.rom");
        assert!(matches!(result, Err(RomLoadError::MissingFile(_))));
    }

    #[test]
    fn require_sized_correct() {
        let rom_set = RomSet::from_slices(&[("test.rom", &[0u8; 64])]);
        assert!(rom_set.require_sized("test.rom", 64).is_ok());
    }

    #[test]
    fn require_sized_wrong_size() {
        let rom_set = RomSet::from_slices(&[("test.rom", &[0u8; 100])]);
        let result = rom_set.require_sized("test.rom", 64);
        assert!(matches!(result, Err(RomLoadError::SizeMismatch { .. })));
    }

    #[test]
    fn file_names_lists_all() {
        let rom_set = RomSet::from_slices(&[("alpha.rom", &[]), ("beta.rom", &[])]);
        let mut names = rom_set.file_names();
        names.sort();
        assert_eq!(names, vec!["alpha.rom", "beta.rom"]);
    }

    #[test]
    fn load_entry_maps_at_address() {
        static ENTRY: RomEntry = RomEntry {
            name: "MONB72_ROM",
            size: 4,
            addr: 0x0C00,
        };
        let rom_set = RomSet::from_slices(&[("MONB72_ROM", &[0xDE, 0xAD, 0xBE, 0xEF])]);
        let mut mem = MemoryMap::default();
        load_entry(&mut mem, &rom_set, &ENTRY).unwrap();
        assert_eq!(mem.read(0x0C00), 0xDE);
        assert_eq!(mem.read(0x0C03), 0xEF);
    }

    #[test]
    fn load_entry_missing_file() {
        let rom_set = RomSet::from_slices(&[]);
        let mut mem = MemoryMap::default();
        let result = load_entry(&mut mem, &rom_set, &SYSTEM_ROMS[0]);
        assert!(matches!(result, Err(RomLoadError::MissingFile(_))));
    }

    #[test]
    fn from_directory_loads_files() {
        let dir = std::env::temp_dir().join("triton_rom_loader_test");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("test.rom"), [0xAA, 0xBB]).unwrap();

        let rom_set = RomSet::from_directory(&dir).unwrap();
        assert_eq!(rom_set.get("test.rom"), Some(&[0xAA, 0xBB][..]));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
