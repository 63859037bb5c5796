use std::path::PathBuf;

use clap::Parser;

/// Command-line surface of the Triton emulator. The window/audio front-end
/// parses these and feeds them to [`TritonSystem`](crate::TritonSystem).
#[derive(Parser, Debug)]
#[command(name = "triton", about = "Transam Triton emulator")]
pub struct TritonArgs {
    /// Top of writable RAM (hex with 0x prefix, or decimal)
    #[arg(short = 'm', value_name = "MEMTOP", value_parser = parse_address, default_value = "0x2000")]
    pub mem_top: u32,

    /// Tape file backing the cassette interface
    #[arg(short = 't', value_name = "TAPEFILE", default_value = "TAPE")]
    pub tape_file: PathBuf,

    /// User ROM for the 0x0400 socket, optionally followed by one for
    /// 0x0800 (comma separated)
    #[arg(short = 'u', value_name = "USER_ROM", value_delimiter = ',')]
    pub user_roms: Vec<PathBuf>,

    /// File the EPROM programmer image is saved to
    #[arg(short = 'z', value_name = "EPROM_FILE", default_value = "EPROM")]
    pub eprom_file: PathBuf,
}

fn parse_address(s: &str) -> Result<u32, String> {
    let value = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16)
    } else {
        s.parse()
    }
    .map_err(|e| format!("invalid address {s:?}: {e}"))?;
    if !(0x1000..=0x10000).contains(&value) {
        return Err(format!("mem_top {value:#X} outside 0x1000..=0x10000"));
    }
    Ok(value)
}
