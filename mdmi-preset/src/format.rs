//! Format detection and parse dispatch

use core::fmt;

use crate::error::PresetParseError;
use crate::model::Preset;
use crate::wopn::{WopnSelection, parse_wopn};
use crate::{DMP_SIGNATURE, DMP_VERSIONS, TFI_SIZE, WOPN_LEGACY_MAGIC, WOPN_MAGIC, dmp, tfi};

/// Preset file formats known to the codec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PresetFormat {
    Tfi,
    Dmp,
    Wopn,
    Unknown,
}

impl PresetFormat {
    /// Conventional file extension, without the dot
    pub fn extension(self) -> Option<&'static str> {
        match self {
            PresetFormat::Tfi => Some("tfi"),
            PresetFormat::Dmp => Some("dmp"),
            PresetFormat::Wopn => Some("wopn"),
            PresetFormat::Unknown => None,
        }
    }
}

impl fmt::Display for PresetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PresetFormat::Tfi => "TFI",
            PresetFormat::Dmp => "DMP",
            PresetFormat::Wopn => "WOPN",
            PresetFormat::Unknown => "UNKNOWN",
        })
    }
}

/// Guess the format of preset data from its content
///
/// Checks run in priority order: WOPN magic, `.DMP` signature, the exact TFI
/// size, then a leading DMP version byte for headerless DMP files. Anything
/// else is [`PresetFormat::Unknown`].
pub fn detect_format(data: &[u8]) -> PresetFormat {
    if data.starts_with(WOPN_MAGIC) || data.starts_with(WOPN_LEGACY_MAGIC) {
        PresetFormat::Wopn
    } else if data.starts_with(DMP_SIGNATURE) {
        PresetFormat::Dmp
    } else if data.len() == TFI_SIZE {
        PresetFormat::Tfi
    } else if data.first().is_some_and(|v| DMP_VERSIONS.contains(v)) {
        PresetFormat::Dmp
    } else {
        PresetFormat::Unknown
    }
}

/// Format-specific parse settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Instrument to pick out of a WOPN bank file
    pub wopn: WopnSelection,
}

/// Parse preset data of a known format into a single preset
pub fn parse_preset(
    data: &[u8],
    format: PresetFormat,
    options: &ParseOptions,
) -> Result<Preset, PresetParseError> {
    match format {
        PresetFormat::Tfi => tfi::parse_tfi(data),
        PresetFormat::Dmp => dmp::parse_dmp(data),
        PresetFormat::Wopn => parse_wopn(data)?.select(&options.wopn),
        PresetFormat::Unknown => Err(PresetParseError::UnsupportedFormat(format)),
    }
}
