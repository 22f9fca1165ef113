//! Error type for cartridge loading.

use std::fmt;

use crate::cartridge::HEADER_LEN;

#[derive(Debug)]
pub enum Error {
    /// Provided buffer is shorter than the 16-byte iNES header.
    TooShort { actual: usize },
    /// The `NES\x1A` magic bytes are missing.
    InvalidCartridge,
    /// A ROM section (trainer/PRG/CHR) is shorter than the header claims.
    SectionTooShort {
        section: &'static str,
        expected: usize,
        actual: usize,
    },
    /// The cartridge needs a mapper this machine does not implement.
    UnsupportedMapper(u8),
    /// I/O failure while reading a ROM from disk.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooShort { actual } => {
                write!(f, "header expected {HEADER_LEN} bytes, got {actual}")
            }
            Self::InvalidCartridge => write!(f, "missing NES magic bytes"),
            Self::SectionTooShort {
                section,
                expected,
                actual,
            } => write!(
                f,
                "{section} section expected {expected} bytes, got {actual}"
            ),
            Self::UnsupportedMapper(mapper) => write!(f, "unsupported mapper {mapper}"),
            Self::Io(err) => write!(f, "i/o error while reading cartridge: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}
