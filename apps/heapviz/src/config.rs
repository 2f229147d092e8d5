//! Visualizer settings from the command line

use std::fmt;
use std::path::PathBuf;

pub const USAGE: &str = "Usage: heapviz [--offset ADDR] [--size BYTES] [--width N] \
[--header-size BYTES] [--no-color] [FILE]

Reads stdin when FILE is omitted. Serial ports are not opened directly, pipe
the device in instead, e.g. `stty -F /dev/ttyUSB0 115200 raw && heapviz < /dev/ttyUSB0`.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VizConfig {
    /// Address of the first byte drawn; `None` starts at `data_start`
    pub mem_offset: Option<u64>,
    /// Bytes of RAM drawn
    pub mem_size: u64,
    /// Cells per row
    pub width: usize,
    /// Bytes in front of each free block not counted by its size; `None`
    /// guesses the pointer width from the addresses
    pub header_size: Option<u64>,
    pub color: bool,
    /// Report file, stdin when `None`
    pub input: Option<PathBuf>,
}

impl Default for VizConfig {
    fn default() -> Self {
        VizConfig {
            mem_offset: None,
            mem_size: 2048,
            width: 64,
            header_size: None,
            color: true,
            input: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgError {
    Unknown(String),
    MissingValue(String),
    BadValue { flag: String, value: String },
}

impl fmt::Display for ArgError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgError::Unknown(arg) => write!(f, "Unknown argument: {}", arg),
            ArgError::MissingValue(flag) => write!(f, "Missing value for {}", flag),
            ArgError::BadValue { flag, value } => {
                write!(f, "Invalid value for {}: {}", flag, value)
            }
        }
    }
}

/// Parses `0x`-prefixed hex or decimal
pub fn parse_number(s: &str) -> Option<u64> {
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}

impl VizConfig {
    /// Builds a config from arguments, program name excluded
    pub fn from_args<I>(args: I) -> Result<Self, ArgError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut config = VizConfig::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--offset" => config.mem_offset = Some(number(&arg, args.next())?),
                "--size" => config.mem_size = number(&arg, args.next())?,
                "--width" => {
                    let width = number(&arg, args.next())?;
                    if width == 0 {
                        return Err(ArgError::BadValue {
                            flag: arg,
                            value: "0".into(),
                        });
                    }
                    config.width = width as usize;
                }
                "--header-size" => config.header_size = Some(number(&arg, args.next())?),
                "--no-color" => config.color = false,
                _ if arg.starts_with('-') => return Err(ArgError::Unknown(arg)),
                _ if config.input.is_none() => config.input = Some(PathBuf::from(arg)),
                _ => return Err(ArgError::Unknown(arg)),
            }
        }
        if let Some(offset) = config.mem_offset {
            if offset.checked_add(config.mem_size).is_none() {
                return Err(ArgError::BadValue {
                    flag: "--size".into(),
                    value: format!("{:#x} past offset {:#x}", config.mem_size, offset),
                });
            }
        }
        Ok(config)
    }
}

fn number(flag: &str, value: Option<String>) -> Result<u64, ArgError> {
    let value = value.ok_or_else(|| ArgError::MissingValue(flag.to_string()))?;
    parse_number(&value).ok_or(ArgError::BadValue {
        flag: flag.to_string(),
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn defaults() {
        let config = VizConfig::from_args(args(&[])).unwrap();
        assert_eq!(config, VizConfig::default());
        assert_eq!(config.width, 64);
        assert_eq!(config.mem_size, 2048);
    }

    #[test]
    fn flags_and_file() {
        let config = VizConfig::from_args(args(&[
            "--offset",
            "0x100",
            "--size",
            "512",
            "--width",
            "32",
            "--header-size",
            "8",
            "--no-color",
            "log.txt",
        ]))
        .unwrap();
        assert_eq!(config.mem_offset, Some(0x100));
        assert_eq!(config.mem_size, 512);
        assert_eq!(config.width, 32);
        assert_eq!(config.header_size, Some(8));
        assert!(!config.color);
        assert_eq!(config.input, Some(PathBuf::from("log.txt")));
    }

    #[test]
    fn bad_arguments() {
        assert_eq!(
            VizConfig::from_args(args(&["--width"])),
            Err(ArgError::MissingValue("--width".into()))
        );
        assert!(matches!(
            VizConfig::from_args(args(&["--width", "0"])),
            Err(ArgError::BadValue { .. })
        ));
        assert!(matches!(
            VizConfig::from_args(args(&["--size", "lots"])),
            Err(ArgError::BadValue { .. })
        ));
        assert_eq!(
            VizConfig::from_args(args(&["--loud"])),
            Err(ArgError::Unknown("--loud".into()))
        );
        assert!(VizConfig::from_args(args(&["a", "b"])).is_err());
    }

    #[test]
    fn window_past_the_address_space_is_rejected() {
        assert!(matches!(
            VizConfig::from_args(args(&["--offset", "0xFFFFFFFFFFFFFFF0"])),
            Err(ArgError::BadValue { flag, .. }) if flag == "--size"
        ));
        let config =
            VizConfig::from_args(args(&["--offset", "0xFFFFFFFFFFFFFFF0", "--size", "15"]))
                .unwrap();
        assert_eq!(config.mem_offset, Some(u64::MAX - 15));
    }

    #[test]
    fn numbers() {
        assert_eq!(parse_number("0x8FF"), Some(0x8FF));
        assert_eq!(parse_number("2048"), Some(2048));
        assert_eq!(parse_number("0xZZ"), None);
    }
}
