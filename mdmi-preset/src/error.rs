//! Preset codec error types

use thiserror::Error;

use crate::format::PresetFormat;
use crate::wopn::BankType;

/// Malformed, truncated or unrecognised preset data
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PresetParseError {
    /// Input shorter than the fixed part of the format
    #[error("{format} data too short: need at least {needed} bytes, got {actual}")]
    TooShort {
        format: PresetFormat,
        needed: usize,
        actual: usize,
    },
    /// Magic string or signature does not match
    #[error("Invalid {0} signature")]
    InvalidSignature(PresetFormat),
    /// DMP version byte other than 8, 9 or 11
    #[error("Unsupported DMP version: {0}")]
    UnsupportedDmpVersion(u8),
    /// WOPN version field outside 1..=2
    #[error("Unsupported WOPN version: {0}")]
    UnsupportedWopnVersion(u16),
    /// Ran out of bytes in the middle of a field
    #[error("Unexpected end of data while reading {0}")]
    UnexpectedEof(&'static str),
    /// A WOPN instrument record could not be read
    #[error("Invalid WOPN {bank_type} instrument {instrument} in bank {bank}")]
    InvalidInstrument {
        bank_type: BankType,
        bank: usize,
        instrument: usize,
    },
    /// Requested WOPN bank does not exist
    #[error("WOPN {bank_type} bank {bank} out of range ({count} available)")]
    BankOutOfRange {
        bank_type: BankType,
        bank: usize,
        count: usize,
    },
    /// Requested WOPN instrument is not in 0..128
    #[error("WOPN instrument {0} out of range (0-127)")]
    InstrumentOutOfRange(usize),
    /// No parser exists for the format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(PresetFormat),
}

/// An operator list that does not hold exactly four operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("An FM voice needs exactly 4 operators, got {0}")]
pub struct OperatorCountError(pub usize);

/// Failure to produce a preset file
#[derive(Debug, Error)]
pub enum PresetWriteError {
    /// No writer exists for the format
    #[error("Cannot write {0} presets")]
    UnsupportedFormat(PresetFormat),
    /// IO error while writing the file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
