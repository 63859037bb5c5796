pub mod i8080;

pub use i8080::{Flags, I8080, PortRequest};
