use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use triton_core::core::machine::{FrontPanel, HostCommand, Machine};
use triton_core::core::memory::MEM_TOP_DEFAULT;
use triton_core::core::MemoryMap;
use triton_core::cpu::i8080::{I8080, PortRequest};
use triton_core::device::keyboard::Key;
use triton_core::device::vdu::{VDU_CELLS, VDU_COLS, VDU_ROWS};
use triton_core::device::{EpromProgrammer, KeyboardLatch, Printer, Tape, Vdu};

use crate::rom_loader::{self, RomLoadError, RomSet, SYSTEM_ROMS, USER_ROM_ADDRS, USER_ROM_SIZE};

// ---------------------------------------------------------------------------
// Timing
// ---------------------------------------------------------------------------
// One microcycle is 1.25 us, an effective clock rate of 800 kHz.
// At 25 frames per second that is 32 000 cycle-units per frame.

pub const CLOCK_HZ: u32 = 800_000;
pub const FRAME_RATE: u32 = 25;
pub const CYCLES_PER_FRAME: u32 = CLOCK_HZ / FRAME_RATE;

/// Fixed UART status byte returned on port 1.
const UART_STATUS: u8 = 0x11;

/// Transam Triton (1978).
///
/// Hardware: Intel 8080A at an effective 800 kHz, 64×16 character VDU
/// (Thomson-CSF controller), keyboard latch, eight-LED output latch,
/// cassette tape via a relay-switched port pair, a bit-banged serial
/// printer, and an 8255-based EPROM programmer.
///
/// The CPU is the sole state mutator; after every step the system drains
/// the CPU's port mailbox and routes the request to the peripheral for
/// that port, per the schematic below.
///
/// | Port | Dir | Peripheral                            |
/// |------|-----|---------------------------------------|
/// | 0    | IN  | keyboard latch (IC 49)                |
/// | 1    | IN  | UART status (fixed 0x11)              |
/// | 2    | OUT | tape data out                         |
/// | 3    | OUT | LED latch (IC 50)                     |
/// | 4    | IN  | tape data in                          |
/// | 5    | OUT | VDU latch (IC 51)                     |
/// | 6    | OUT | serial printer (IC 52)                |
/// | 7    | OUT | oscillator (bit 6), tape relay (bit 7)|
/// | FC-FF| I/O | 8255 EPROM programmer                 |
pub struct TritonSystem {
    cpu: I8080,
    mem: MemoryMap,

    keyboard: KeyboardLatch,
    vdu: Vdu,
    tape: Tape,
    printer: Printer,
    eprom: EpromProgrammer,
    eprom_file: PathBuf,

    led_latch: u8,
    oscillator: bool,
    paused: bool,
}

impl TritonSystem {
    pub fn new(
        mem_top: u32,
        tape_file: impl Into<PathBuf>,
        eprom_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            cpu: I8080::new(),
            mem: MemoryMap::new(mem_top),
            keyboard: KeyboardLatch::new(),
            vdu: Vdu::new(),
            tape: Tape::new(tape_file),
            printer: Printer::new(),
            eprom: EpromProgrammer::new(),
            eprom_file: eprom_file.into(),
            led_latch: 0xFF,
            oscillator: false,
            paused: false,
        }
    }

    /// Map the mandatory system ROMs from a ROM set.
    pub fn load_rom_set(&mut self, rom_set: &RomSet) -> Result<(), RomLoadError> {
        for entry in &SYSTEM_ROMS {
            rom_loader::load_entry(&mut self.mem, rom_set, entry)?;
        }
        Ok(())
    }

    /// Map a user ROM file into socket 0 (0x0400) or 1 (0x0800).
    pub fn load_user_rom(&mut self, path: &Path, socket: usize) -> Result<(), RomLoadError> {
        let addr = USER_ROM_ADDRS[socket];
        let data = std::fs::read(path)?;
        if data.len() > USER_ROM_SIZE {
            return Err(RomLoadError::SizeMismatch {
                file: path.display().to_string(),
                expected: USER_ROM_SIZE,
                actual: data.len(),
            });
        }
        self.mem.load(addr, &data);
        info!(
            "{:04X} - {:04X} : {}",
            addr,
            addr as usize + data.len() - 1,
            path.display()
        );
        Ok(())
    }

    pub fn cpu(&self) -> &I8080 {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut I8080 {
        &mut self.cpu
    }

    pub fn memory(&self) -> &MemoryMap {
        &self.mem
    }

    pub fn memory_mut(&mut self) -> &mut MemoryMap {
        &mut self.mem
    }

    pub fn eprom(&self) -> &EpromProgrammer {
        &self.eprom
    }

    pub fn paused(&self) -> bool {
        self.paused
    }

    /// Execute a single CPU step and route any port request. Returns the
    /// cycle count (0 while halted).
    pub fn step(&mut self) -> u32 {
        let cycles = self.cpu.step(&mut self.mem);
        if let Some(request) = self.cpu.port_request.take() {
            self.dispatch_port(request);
        }
        cycles
    }

    fn dispatch_port(&mut self, request: PortRequest) {
        match request {
            PortRequest::In(port) => self.cpu.a = self.port_in(port),
            PortRequest::Out(port) => self.port_out(port, self.cpu.a),
        }
    }

    fn port_in(&mut self, port: u8) -> u8 {
        match port {
            0x00 => self.keyboard.read(),
            0x01 => UART_STATUS,
            0x04 => {
                if self.tape.relay() {
                    self.tape.read_byte()
                } else {
                    self.cpu.a
                }
            }
            0xFC..=0xFF => self.eprom.read(port & 0x03),
            _ => self.cpu.a, // nothing drives the bus
        }
    }

    fn port_out(&mut self, port: u8, data: u8) {
        match port {
            0x02 => self.tape.write_byte(data),
            0x03 => self.led_latch = data,
            0x05 => self.vdu.write_port(data, &mut self.mem),
            0x06 => self.printer.clock_bit(data),
            0x07 => {
                self.oscillator = data & 0x40 != 0;
                self.tape.set_relay(data & 0x80 != 0);
            }
            0xFC..=0xFF => self.eprom.write(port & 0x03, data),
            _ => {}
        }
    }
}

impl Machine for TritonSystem {
    fn display_cells(&self) -> (u32, u32) {
        (VDU_COLS as u32, VDU_ROWS as u32)
    }

    fn run_frame(&mut self) {
        if self.paused {
            return;
        }
        let mut elapsed = 0;
        while elapsed < CYCLES_PER_FRAME {
            let cycles = self.step();
            if cycles == 0 {
                break; // halted, and no interrupt pending
            }
            elapsed += cycles;
        }
        let printed = self.printer.take_output();
        if !printed.is_empty() {
            print!("{printed}");
            let _ = std::io::stdout().flush();
        }
    }

    fn render_frame(&self, cells: &mut [u8]) {
        debug_assert!(cells.len() >= VDU_CELLS as usize);
        self.vdu.render(&self.mem, cells);
    }

    fn key_event(&mut self, key: Key, shift: bool, ctrl: bool, pressed: bool) {
        self.keyboard.key_event(key, shift, ctrl, pressed);
    }

    fn command(&mut self, cmd: HostCommand) {
        match cmd {
            HostCommand::Interrupt1 => self.cpu.request_interrupt(0xCF),
            HostCommand::Interrupt2 => self.cpu.request_interrupt(0xD7),
            HostCommand::Reset => self.cpu.reset(),
            HostCommand::Halt => {
                self.cpu.int_enable = true;
                self.cpu.request_interrupt(0x76);
            }
            HostCommand::TogglePause => self.paused = !self.paused,
            HostCommand::PrintStatus => info!("{}", self.cpu),
            HostCommand::UvEraseEprom => self.eprom.uv_erase(),
            HostCommand::SaveEprom => {
                if let Err(e) = self.eprom.save(&self.eprom_file) {
                    warn!("unable to save EPROM to {}: {e}", self.eprom_file.display());
                }
            }
        }
    }

    fn front_panel(&self) -> FrontPanel {
        FrontPanel {
            leds: self.led_latch,
            tape: self.tape.indicator(),
            oscillator: self.oscillator,
            cursor: self.vdu.cursor(),
        }
    }

    fn reset(&mut self) {
        self.cpu.reset();
    }
}

impl Default for TritonSystem {
    fn default() -> Self {
        Self::new(MEM_TOP_DEFAULT, "TAPE", "EPROM")
    }
}
