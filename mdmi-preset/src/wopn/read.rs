//! WOPN file parsing
//!
//! ```text
//! magic[11]            "WOPN2-B2NK\0" or legacy "WOPN2-BANK\0"
//! version (u16 LE)     B2NK only
//! melody banks (u16 BE)
//! percussion banks (u16 BE)
//! flags                bit 3: LFO enable, bits 0-2: LFO frequency
//! bank meta[34]        version >= 2, melody then percussion: name[32], lsb, msb
//! instruments          128 per bank, melody banks first
//! ```

use std::io::Cursor;

use tracing::debug;

use super::{BankType, WopnBank, WopnFile, WopnInstrument};
use crate::bytes::{read_array, read_i16_be, read_string, read_u8, read_u16_be, read_u16_le, remaining};
use crate::error::PresetParseError;
use crate::format::PresetFormat;
use crate::model::{FmOperator, FmPatch, swap_middle_operators};
use crate::{OPERATOR_COUNT, WOPN_INSTRUMENTS_PER_BANK, WOPN_LATEST_VERSION, WOPN_LEGACY_MAGIC, WOPN_MAGIC};

const NAME_SIZE: usize = 32;
const OPERATOR_SIZE: usize = 7;
/// Name, key offset, percussion key, two voice bytes and the operators
const INSTRUMENT_SIZE: usize = NAME_SIZE + 2 + 1 + 2 + OPERATOR_COUNT * OPERATOR_SIZE;
const DELAY_SIZE: usize = 4;

/// Size of one instrument record in the given format version
pub(crate) fn instrument_record_size(version: u16) -> usize {
    if version >= 2 {
        INSTRUMENT_SIZE + DELAY_SIZE
    } else {
        INSTRUMENT_SIZE
    }
}

/// Parse a WOPN bank file
///
/// # Example
/// ```ignore
/// let bank = parse_wopn(&std::fs::read("gm.wopn")?)?;
/// for bank in &bank.melody_banks {
///     println!("{}", bank.name);
/// }
/// ```
pub fn parse_wopn(data: &[u8]) -> Result<WopnFile, PresetParseError> {
    let mut cursor = Cursor::new(data);

    let version = if data.starts_with(WOPN_MAGIC) {
        cursor.set_position(WOPN_MAGIC.len() as u64);
        let version = read_u16_le(&mut cursor, "WOPN version")?;
        if version == 0 || version > WOPN_LATEST_VERSION {
            return Err(PresetParseError::UnsupportedWopnVersion(version));
        }
        version
    } else if data.starts_with(WOPN_LEGACY_MAGIC) {
        cursor.set_position(WOPN_LEGACY_MAGIC.len() as u64);
        1
    } else {
        return Err(PresetParseError::InvalidSignature(PresetFormat::Wopn));
    };

    let melody_count = read_u16_be(&mut cursor, "WOPN melody bank count")? as usize;
    let percussion_count = read_u16_be(&mut cursor, "WOPN percussion bank count")? as usize;
    let flags = read_u8(&mut cursor, "WOPN flags")?;
    let lfo_enabled = flags & 0x08 != 0;
    let lfo_frequency = flags & 0x07;

    let (melody_meta, percussion_meta) = if version >= 2 {
        (
            read_bank_meta(&mut cursor, melody_count)?,
            read_bank_meta(&mut cursor, percussion_count)?,
        )
    } else {
        (legacy_bank_meta(melody_count), legacy_bank_meta(percussion_count))
    };

    // Refuse to allocate for bank counts the data cannot back
    let record_size = instrument_record_size(version);
    let needed = (melody_count + percussion_count) * WOPN_INSTRUMENTS_PER_BANK * record_size;
    if remaining(&cursor) < needed {
        return Err(PresetParseError::TooShort {
            format: PresetFormat::Wopn,
            needed: cursor.position() as usize + needed,
            actual: data.len(),
        });
    }

    debug!(version, melody_count, percussion_count, "Parsing WOPN banks");

    let melody_banks = read_banks(&mut cursor, version, BankType::Melody, melody_meta)?;
    let percussion_banks = read_banks(&mut cursor, version, BankType::Percussion, percussion_meta)?;

    Ok(WopnFile {
        version,
        lfo_enabled,
        lfo_frequency,
        melody_banks,
        percussion_banks,
    })
}

struct BankMeta {
    name: String,
    lsb: u8,
    msb: u8,
}

fn read_bank_meta(cursor: &mut Cursor<&[u8]>, count: usize) -> Result<Vec<BankMeta>, PresetParseError> {
    (0..count)
        .map(|_| {
            let name = read_array::<NAME_SIZE>(cursor, "WOPN bank name")?;
            Ok(BankMeta {
                name: read_string(&name),
                lsb: read_u8(cursor, "WOPN bank LSB")?,
                msb: read_u8(cursor, "WOPN bank MSB")?,
            })
        })
        .collect()
}

/// Version 1 files have no bank records; the bank index doubles as the bank number
fn legacy_bank_meta(count: usize) -> Vec<BankMeta> {
    (0..count)
        .map(|index| BankMeta {
            name: String::new(),
            lsb: (index & 0xFF) as u8,
            msb: ((index >> 8) & 0xFF) as u8,
        })
        .collect()
}

fn read_banks(
    cursor: &mut Cursor<&[u8]>,
    version: u16,
    bank_type: BankType,
    meta: Vec<BankMeta>,
) -> Result<Vec<WopnBank>, PresetParseError> {
    meta.into_iter()
        .enumerate()
        .map(|(bank, meta)| {
            let instruments = (0..WOPN_INSTRUMENTS_PER_BANK)
                .map(|instrument| {
                    read_instrument(cursor, version).map_err(|_| PresetParseError::InvalidInstrument {
                        bank_type,
                        bank,
                        instrument,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(WopnBank {
                name: meta.name,
                lsb: meta.lsb,
                msb: meta.msb,
                instruments,
            })
        })
        .collect()
}

pub(crate) fn read_instrument(
    cursor: &mut Cursor<&[u8]>,
    version: u16,
) -> Result<WopnInstrument, PresetParseError> {
    let name = read_array::<NAME_SIZE>(cursor, "WOPN instrument name")?;
    let key_offset = read_i16_be(cursor, "WOPN key offset")?;
    let percussion_key = read_u8(cursor, "WOPN percussion key")?;
    let fb_alg = read_u8(cursor, "WOPN feedback/algorithm")?;
    let lfo = read_u8(cursor, "WOPN LFO sensitivity")?;

    let mut on_disk = [FmOperator::default(); OPERATOR_COUNT];
    for op in &mut on_disk {
        *op = unpack_operator(&read_array(cursor, "WOPN operator")?);
    }

    if version >= 2 {
        read_array::<DELAY_SIZE>(cursor, "WOPN delay")?;
    }

    Ok(WopnInstrument {
        // The last byte of the name field is always a terminator
        name: read_string(&name[..NAME_SIZE - 1]),
        key_offset,
        percussion_key,
        patch: FmPatch {
            algorithm: fb_alg & 0x07,
            feedback: (fb_alg >> 3) & 0x07,
            lfo_ams: (lfo >> 4) & 0x03,
            lfo_fms: lfo & 0x07,
            operators: swap_middle_operators(on_disk),
        },
    })
}

pub(crate) fn unpack_operator(raw: &[u8; OPERATOR_SIZE]) -> FmOperator {
    FmOperator {
        dt: (raw[0] >> 4) & 0x07,
        mul: raw[0] & 0x0F,
        tl: raw[1] & 0x7F,
        rs: (raw[2] >> 6) & 0x03,
        ar: raw[2] & 0x1F,
        am: (raw[3] >> 7) & 0x01,
        dr: raw[3] & 0x1F,
        sr: raw[4] & 0x1F,
        sl: (raw[5] >> 4) & 0x0F,
        rr: raw[5] & 0x0F,
        ssg: raw[6] & 0x0F,
    }
}
