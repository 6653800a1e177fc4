//! WOPN2 bank files
//!
//! A WOPN file holds any number of melody and percussion banks, each with
//! exactly 128 instrument slots. This module provides:
//!
//! - `read` - Parsing bank files into a [`WopnFile`] catalog
//! - instrument selection and the serializable listing used by `list-wopn`

mod read;

#[cfg(test)]
mod tests;

use core::fmt;

use serde::{Deserialize, Serialize};

pub use read::parse_wopn;

use crate::WOPN_INSTRUMENTS_PER_BANK;
use crate::error::PresetParseError;
use crate::model::{FmPatch, Preset, PresetSource};

/// Which bank list of a WOPN file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BankType {
    #[default]
    Melody,
    Percussion,
}

impl fmt::Display for BankType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BankType::Melody => "melody",
            BankType::Percussion => "percussion",
        })
    }
}

/// Address of one instrument inside a WOPN file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WopnSelection {
    pub bank_type: BankType,
    pub bank: usize,
    pub instrument: usize,
}

/// Parsed WOPN bank file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WopnFile {
    /// Format version (1 for legacy files)
    pub version: u16,
    pub lfo_enabled: bool,
    /// Global LFO frequency index (0-7)
    pub lfo_frequency: u8,
    pub melody_banks: Vec<WopnBank>,
    pub percussion_banks: Vec<WopnBank>,
}

/// One bank of 128 instrument slots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WopnBank {
    /// Bank name, empty in version 1 files
    pub name: String,
    /// MIDI bank select LSB
    pub lsb: u8,
    /// MIDI bank select MSB
    pub msb: u8,
    pub instruments: Vec<WopnInstrument>,
}

/// One instrument slot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WopnInstrument {
    pub name: String,
    /// Semitone offset applied to played notes
    pub key_offset: i16,
    /// Note the instrument plays in a percussion bank
    pub percussion_key: u8,
    pub patch: FmPatch,
}

impl WopnInstrument {
    /// Unused slots have a blank name
    pub fn is_empty(&self) -> bool {
        self.name.trim().is_empty()
    }
}

impl WopnFile {
    /// Banks of the given type
    pub fn banks(&self, bank_type: BankType) -> &[WopnBank] {
        match bank_type {
            BankType::Melody => &self.melody_banks,
            BankType::Percussion => &self.percussion_banks,
        }
    }

    /// Look up an instrument slot
    ///
    /// Empty slots can be selected; they carry whatever voice data the file
    /// stores for them.
    pub fn instrument(&self, selection: &WopnSelection) -> Result<&WopnInstrument, PresetParseError> {
        let banks = self.banks(selection.bank_type);
        let bank = banks
            .get(selection.bank)
            .ok_or(PresetParseError::BankOutOfRange {
                bank_type: selection.bank_type,
                bank: selection.bank,
                count: banks.len(),
            })?;
        bank.instruments
            .get(selection.instrument)
            .ok_or(PresetParseError::InstrumentOutOfRange(selection.instrument))
    }

    /// Extract one instrument as a standalone preset
    pub fn select(&self, selection: &WopnSelection) -> Result<Preset, PresetParseError> {
        let instrument = self.instrument(selection)?;
        Ok(Preset {
            name: instrument.name.clone(),
            patch: instrument.patch,
            source: PresetSource::Wopn {
                bank_type: selection.bank_type,
                bank: selection.bank,
                instrument: selection.instrument,
                key_offset: instrument.key_offset,
                percussion_key: instrument.percussion_key,
            },
        })
    }

    /// Catalog of every bank and its non-empty instruments
    pub fn listing(&self) -> WopnListing {
        WopnListing {
            version: self.version,
            lfo_enabled: self.lfo_enabled,
            lfo_frequency: self.lfo_frequency,
            melody_banks: list_banks(&self.melody_banks),
            percussion_banks: list_banks(&self.percussion_banks),
        }
    }
}

fn list_banks(banks: &[WopnBank]) -> Vec<BankListing> {
    banks
        .iter()
        .enumerate()
        .map(|(index, bank)| BankListing {
            index,
            name: bank.name.clone(),
            lsb: bank.lsb,
            msb: bank.msb,
            instruments: bank
                .instruments
                .iter()
                .take(WOPN_INSTRUMENTS_PER_BANK)
                .enumerate()
                .filter(|(_, instrument)| !instrument.is_empty())
                .map(|(index, instrument)| InstrumentListing {
                    index,
                    name: instrument.name.clone(),
                    algorithm: instrument.patch.algorithm,
                    feedback: instrument.patch.feedback,
                    key_offset: instrument.key_offset,
                    percussion_key: instrument.percussion_key,
                })
                .collect(),
        })
        .collect()
}

/// Serializable summary of a WOPN file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WopnListing {
    pub version: u16,
    pub lfo_enabled: bool,
    pub lfo_frequency: u8,
    pub melody_banks: Vec<BankListing>,
    pub percussion_banks: Vec<BankListing>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankListing {
    pub index: usize,
    pub name: String,
    pub lsb: u8,
    pub msb: u8,
    /// Non-empty slots only
    pub instruments: Vec<InstrumentListing>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentListing {
    /// Slot index within the bank (0-127)
    pub index: usize,
    pub name: String,
    pub algorithm: u8,
    pub feedback: u8,
    pub key_offset: i16,
    pub percussion_key: u8,
}

impl WopnListing {
    /// Banks of the given type
    pub fn banks(&self, bank_type: BankType) -> &[BankListing] {
        match bank_type {
            BankType::Melody => &self.melody_banks,
            BankType::Percussion => &self.percussion_banks,
        }
    }
}

/// Parse a WOPN file and list its banks and non-empty instruments
pub fn list_wopn_contents(data: &[u8]) -> Result<WopnListing, PresetParseError> {
    Ok(parse_wopn(data)?.listing())
}
