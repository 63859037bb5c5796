pub mod core;
pub mod cpu;
pub mod device;

pub mod prelude {
    pub use crate::core::machine::{FrontPanel, HostCommand, Machine, TapeIndicator};
    pub use crate::core::{Bus, MemoryMap};
    pub use crate::cpu::i8080::{I8080, PortRequest};
    pub use crate::device::keyboard::Key;
}
