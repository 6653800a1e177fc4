//! Canonical FM voice model shared by every preset format

use core::fmt;

use crate::OPERATOR_COUNT;
use crate::error::OperatorCountError;
use crate::format::PresetFormat;
use crate::wopn::BankType;

/// One YM2612 operator, stored as raw register values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FmOperator {
    /// Frequency multiple (0-15)
    pub mul: u8,
    /// Detune (0-7)
    pub dt: u8,
    /// Attack rate (0-31)
    pub ar: u8,
    /// Rate scaling (0-3)
    pub rs: u8,
    /// First decay rate (0-31)
    pub dr: u8,
    /// Amplitude modulation enable (0-1)
    pub am: u8,
    /// Sustain level (0-15)
    pub sl: u8,
    /// Second decay ("sustain") rate (0-31)
    pub sr: u8,
    /// Release rate (0-15)
    pub rr: u8,
    /// Total level (0-127)
    pub tl: u8,
    /// SSG-EG mode (0-15)
    pub ssg: u8,
}

impl fmt::Display for FmOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DT:{} MUL:{} TL:{} RS:{} AR:{} AM:{} DR:{} SR:{} SL:{} RR:{} SSG:{}",
            self.dt,
            self.mul,
            self.tl,
            self.rs,
            self.ar,
            self.am,
            self.dr,
            self.sr,
            self.sl,
            self.rr,
            self.ssg
        )
    }
}

/// A complete 4-operator FM voice
///
/// Operators are in logical order (operator 1 first) regardless of how the
/// source format laid them out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FmPatch {
    /// Operator routing (0-7)
    pub algorithm: u8,
    /// Operator 1 self-feedback (0-7)
    pub feedback: u8,
    /// LFO amplitude modulation sensitivity (0-3)
    pub lfo_ams: u8,
    /// LFO frequency modulation sensitivity (0-7)
    pub lfo_fms: u8,
    /// Operators 1 to 4
    pub operators: [FmOperator; OPERATOR_COUNT],
}

impl FmPatch {
    /// Build a voice from an operator list that must hold exactly four entries
    pub fn from_operators(
        algorithm: u8,
        feedback: u8,
        lfo_ams: u8,
        lfo_fms: u8,
        operators: &[FmOperator],
    ) -> Result<Self, OperatorCountError> {
        let operators: [FmOperator; OPERATOR_COUNT] = operators
            .try_into()
            .map_err(|_| OperatorCountError(operators.len()))?;
        Ok(Self {
            algorithm,
            feedback,
            lfo_ams,
            lfo_fms,
            operators,
        })
    }
}

/// Swap operators 2 and 3
///
/// DMP and WOPN both store operators as 1, 3, 2, 4. The swap is its own
/// inverse, so the same call converts in either direction.
pub(crate) fn swap_middle_operators(
    operators: [FmOperator; OPERATOR_COUNT],
) -> [FmOperator; OPERATOR_COUNT] {
    [operators[0], operators[2], operators[1], operators[3]]
}

/// Where a preset came from, with the fields only that format carries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PresetSource {
    /// Built in memory or dumped from the device
    #[default]
    Raw,
    /// TFI file
    Tfi,
    /// DMP file
    Dmp {
        /// Format version (8, 9 or 11)
        version: u8,
        /// Target system, only present in version 11
        system: Option<u8>,
        /// 1 for FM, 0 for the non-FM modes
        instrument_mode: u8,
    },
    /// One instrument selected from a WOPN bank file
    Wopn {
        bank_type: BankType,
        bank: usize,
        instrument: usize,
        /// Note offset applied when playing (semitones)
        key_offset: i16,
        /// Note played for percussion instruments
        percussion_key: u8,
    },
}

impl PresetSource {
    /// File format tag, `None` for presets that did not come from a file
    pub fn format(&self) -> Option<PresetFormat> {
        match self {
            PresetSource::Raw => None,
            PresetSource::Tfi => Some(PresetFormat::Tfi),
            PresetSource::Dmp { .. } => Some(PresetFormat::Dmp),
            PresetSource::Wopn { .. } => Some(PresetFormat::Wopn),
        }
    }
}

/// A named FM voice together with its origin
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preset {
    /// Display name, empty when the source has none
    pub name: String,
    pub patch: FmPatch,
    pub source: PresetSource,
}

impl Preset {
    /// Create a preset that did not come from a file
    pub fn new(name: impl Into<String>, patch: FmPatch) -> Self {
        Self {
            name: name.into(),
            patch,
            source: PresetSource::Raw,
        }
    }

    /// File format tag of the source
    pub fn format(&self) -> Option<PresetFormat> {
        self.source.format()
    }

    /// Replace the name if the source did not provide one
    pub fn or_name(mut self, fallback: impl Into<String>) -> Self {
        if self.name.is_empty() {
            self.name = fallback.into();
        }
        self
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Name: {}", self.name)?;
        writeln!(f, "Algorithm: {}", self.patch.algorithm)?;
        writeln!(f, "Feedback: {}", self.patch.feedback)?;
        writeln!(f, "LFO AMS: {}", self.patch.lfo_ams)?;
        writeln!(f, "LFO FMS: {}", self.patch.lfo_fms)?;
        for (i, op) in self.patch.operators.iter().enumerate() {
            writeln!(f, "Operator {}: {}", i + 1, op)?;
        }
        Ok(())
    }
}
