use crate::device::keyboard::Key;

/// Tape deck indicator shown on the panel below the screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TapeIndicator {
    RelayOff,
    Idle,
    Reading,
    Writing,
}

/// Indicator state the front-end renders each frame: the eight LEDs driven
/// by the port-3 latch (a cleared bit lights the LED), the tape deck state,
/// the beep oscillator, and the VDU cursor cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrontPanel {
    pub leds: u8,
    pub tape: TapeIndicator,
    pub oscillator: bool,
    /// Cursor position in `[0, 1024)`, relative to the rolled screen origin.
    pub cursor: u16,
}

/// Host commands, bound to the function keys of the host keyboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostCommand {
    /// F1: jam an RST 1 instruction (clear screen).
    Interrupt1,
    /// F2: jam an RST 2 instruction (print registers and flags).
    Interrupt2,
    /// F3: hardware reset.
    Reset,
    /// F4: jam an HLT instruction.
    Halt,
    /// F5: pause/resume emulation.
    TogglePause,
    /// F6: write the CPU status line.
    PrintStatus,
    /// F7: UV-erase the EPROM image.
    UvEraseEprom,
    /// F8: save the EPROM image to its host file.
    SaveEprom,
}

/// Machine-agnostic interface for the emulated system.
///
/// The front-end is a pure rendering engine: it owns the window, the font
/// texture, the square-wave audio source and the host keyboard, and drives
/// the machine through this trait at the frame rate. It does not know about
/// ports, latches or the VDU controller.
pub trait Machine {
    /// Display size as (columns, rows) of character cells.
    fn display_cells(&self) -> (u32, u32);

    /// Run one frame of emulation (advance the clock by one frame's worth
    /// of cycles, stopping early if the CPU halts).
    fn run_frame(&mut self);

    /// Copy the visible character cells into `cells`, top row first, with
    /// the VDU roll offset applied. Each byte is a 7-bit glyph code the
    /// front-end translates through its font texture. `cells` must hold at
    /// least `cols * rows` bytes.
    fn render_frame(&self, cells: &mut [u8]);

    /// Deliver a host key event. Called per-event, not per-frame; each call
    /// latches the keyboard buffer so the guest ROM can poll it.
    fn key_event(&mut self, key: Key, shift: bool, ctrl: bool, pressed: bool);

    /// Execute a host command (function key).
    fn command(&mut self, cmd: HostCommand);

    /// Indicator state for the front panel.
    fn front_panel(&self) -> FrontPanel;

    /// Reset the machine. Idempotent.
    fn reset(&mut self);
}
