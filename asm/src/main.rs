use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;

use trimcc::{Assembler, ListOrder, Options};

/// Compile Triton 8080 source and optionally transmit it through a serial
/// device. With no source file, input is taken from stdin.
#[derive(Parser)]
#[command(name = "trimcc", version, about)]
struct Args {
    /// Print the byte stream and variables
    #[arg(short = 'v')]
    verbose: bool,

    /// Sort variables by name rather than by value
    #[arg(short = 'a')]
    alphabetical: bool,

    /// Don't sort variables (list by order of addition)
    #[arg(short = 'u')]
    unsorted: bool,

    /// Add a column of spaces after the 8th byte of each row
    #[arg(short = 's')]
    spaced: bool,

    /// Write the byte stream in binary to stdout (obviates -o)
    #[arg(short = 'p')]
    pipe: bool,

    /// Write the byte stream in binary to a file
    #[arg(short = 'o', value_name = "FILE")]
    output: Option<PathBuf>,

    /// Set the initial value of ORG (hex, default 0)
    #[arg(short = 'g', value_name = "ADDR", value_parser = parse_org)]
    org: Option<u16>,

    /// Transmit the byte stream to a serial device, for example /dev/ttyS0
    #[arg(short = 't', value_name = "DEVICE")]
    serial: Option<PathBuf>,

    /// Source file
    source: Option<PathBuf>,
}

fn parse_org(s: &str) -> Result<u16, String> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    let digits = digits
        .strip_suffix('H')
        .or_else(|| digits.strip_suffix('h'))
        .unwrap_or(digits);
    u16::from_str_radix(digits, 16).map_err(|e| format!("invalid address {s:?}: {e}"))
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {e}", "error".red().bold());
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let (text, name) = match &args.source {
        Some(path) => (
            std::fs::read_to_string(path)
                .map_err(|e| format!("couldn't open the source file {}: {e}", path.display()))?,
            path.display().to_string(),
        ),
        None => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            (text, "/dev/stdin".to_string())
        }
    };

    let list_order = if args.unsorted {
        ListOrder::Unsorted
    } else if args.alphabetical {
        ListOrder::Name
    } else {
        ListOrder::Value
    };
    let mut asm = Assembler::new(Options {
        verbose: args.verbose,
        extra_space: args.spaced,
        org_init: args.org.unwrap_or(0),
        serial_device: args.serial.clone(),
    });

    if args.verbose {
        println!("\nTriton Relocatable Machine Code Compiler\n");
        println!("Parsing tokens from {name}");
    }

    let bytes = asm.assemble(&text, &name)?;

    if args.pipe {
        std::io::stdout().write_all(&bytes)?;
    } else if let Some(path) = &args.output {
        if args.verbose {
            println!("Writing to {}", path.display());
        }
        std::fs::write(path, &bytes)
            .map_err(|e| format!("couldn't open {} for saving: {e}", path.display()))?;
    }

    if args.verbose {
        println!("\nVariables\n");
        asm.symbols().print_listing(list_order);
    } else if asm.symbols().has_undefined() {
        eprintln!(
            "{}: there are undefined variables, run with -v for more info",
            "warning".yellow().bold()
        );
    }
    Ok(())
}
