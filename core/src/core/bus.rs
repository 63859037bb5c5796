/// Byte-wide bus interface the CPU core executes against.
///
/// The Triton has a single bus master, so there is no arbitration here.
/// Port I/O does not go through this trait either: `IN`/`OUT` park a request
/// in the CPU's mailbox, which the host drains between steps.
pub trait Bus {
    fn read(&mut self, addr: u16) -> u8;
    fn write(&mut self, addr: u16, data: u8);
}
