use std::num::ParseIntError;
use std::path::PathBuf;

use clap::Parser;

/// Runs a raw ARM7TDMI binary headless and logs the final register file.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Raw binary image to load
    pub image: PathBuf,

    /// Where the image is loaded, hexadecimal with an optional 0x prefix
    #[arg(long, default_value = "0x08000000", value_parser = parse_address)]
    pub load_address: u32,

    /// Total cycles to run before stopping
    #[arg(long, default_value_t = 16_780_000)]
    pub cycles: u64,

    /// Cycle budget handed to the core on every call
    #[arg(long, default_value_t = 1232)]
    pub slice: i32,

    /// JSON file with the cpu and wait_control sections
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory receiving tdmi.log
    #[arg(long)]
    pub log_dir: Option<PathBuf>,
}

fn parse_address(value: &str) -> Result<u32, ParseIntError> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    u32::from_str_radix(&digits.replace('_', ""), 16)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn check_parse_address() {
        assert_eq!(parse_address("0x08000000"), Ok(0x0800_0000));
        assert_eq!(parse_address("3000000"), Ok(0x0300_0000));
        assert_eq!(parse_address("0x0300_0000"), Ok(0x0300_0000));
        assert!(parse_address("0xZZ").is_err());
    }

    #[test]
    fn check_defaults() {
        let args = Args::parse_from(["tdmi", "game.bin"]);
        assert_eq!(args.image, PathBuf::from("game.bin"));
        assert_eq!(args.load_address, 0x0800_0000);
        assert_eq!(args.slice, 1232);
        assert!(args.config.is_none());
    }

    #[test]
    fn check_overrides() {
        let args = Args::parse_from([
            "tdmi",
            "demo.bin",
            "--load-address",
            "0x02000000",
            "--cycles",
            "1000",
            "--log-dir",
            "logs",
        ]);
        assert_eq!(args.load_address, 0x0200_0000);
        assert_eq!(args.cycles, 1000);
        assert_eq!(args.log_dir, Some(PathBuf::from("logs")));
    }
}
