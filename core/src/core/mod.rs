pub mod bus;
pub mod machine;
pub mod memory;

pub use bus::Bus;
pub use machine::{FrontPanel, HostCommand, Machine, TapeIndicator};
pub use memory::MemoryMap;
