//! MDMI-Preset: FM preset codecs for the Mega Drive MIDI Interface
//!
//! This crate reads and writes the third-party instrument formats used to
//! author YM2612 voices and maps each of them onto one canonical model,
//! [`FmPatch`], which the SysEx layer sends to the device.
//!
//! # Supported Formats
//!
//! | Format | Read | Write | Shape |
//! |--------|------|-------|-------|
//! | TFI | yes | yes | flat 42 bytes, one voice |
//! | DMP | yes (v8, v9, v11) | yes (v11) | versioned, one voice |
//! | WOPN | yes (v1, v2) | no | banks of 128 voices |
//!
//! # Operator Order
//!
//! Operators in [`FmPatch`] are always in logical order 1, 2, 3, 4. DMP and
//! WOPN store them as 1, 3, 2, 4 on disk; the codecs swap the middle pair on
//! the way in and on the way out.
//!
//! # Usage
//!
//! ```ignore
//! use mdmi_preset::{ParseOptions, detect_format, parse_preset};
//!
//! let data = std::fs::read("bass.dmp")?;
//! let format = detect_format(&data);
//! let preset = parse_preset(&data, format, &ParseOptions::default())?;
//! println!("{preset}");
//! ```

mod bytes;
mod dmp;
mod error;
mod format;
mod model;
mod tfi;
mod wopn;
mod write;

pub use dmp::{parse_dmp, write_dmp};
pub use error::{OperatorCountError, PresetParseError, PresetWriteError};
pub use format::{ParseOptions, PresetFormat, detect_format, parse_preset};
pub use model::{FmOperator, FmPatch, Preset, PresetSource};
pub use tfi::{parse_tfi, write_tfi};
pub use wopn::{
    BankListing, BankType, InstrumentListing, WopnBank, WopnFile, WopnInstrument, WopnListing,
    WopnSelection, list_wopn_contents, parse_wopn,
};
pub use write::{encode_preset, write_preset_file};

// =============================================================================
// Constants
// =============================================================================

/// Number of operators in a YM2612 voice
pub const OPERATOR_COUNT: usize = 4;

/// Size of a TFI file
pub const TFI_SIZE: usize = 42;

/// Optional signature in front of some DMP files
pub const DMP_SIGNATURE: &[u8; 4] = b".DMP";

/// DMP versions this crate can read
pub const DMP_VERSIONS: [u8; 3] = [8, 9, 11];

/// DMP version produced by [`write_dmp`]
pub const DMP_WRITE_VERSION: u8 = 11;

/// DMP system byte for the Sega Genesis / Mega Drive
pub const DMP_SYSTEM_GENESIS: u8 = 0x02;

/// DMP instrument mode for FM voices
pub const DMP_MODE_FM: u8 = 1;

/// WOPN2 magic (versioned files)
pub const WOPN_MAGIC: &[u8; 11] = b"WOPN2-B2NK\0";

/// WOPN2 magic of the legacy unversioned files
pub const WOPN_LEGACY_MAGIC: &[u8; 11] = b"WOPN2-BANK\0";

/// Newest WOPN version we support
pub const WOPN_LATEST_VERSION: u16 = 2;

/// Instrument slots in every WOPN bank
pub const WOPN_INSTRUMENTS_PER_BANK: usize = 128;
