pub mod eprom;
pub mod keyboard;
pub mod printer;
pub mod tape;
pub mod vdu;

pub use eprom::EpromProgrammer;
pub use keyboard::KeyboardLatch;
pub use printer::Printer;
pub use tape::Tape;
pub use vdu::Vdu;
