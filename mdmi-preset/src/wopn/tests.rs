//! Tests for WOPN bank parsing and selection

use std::io::Cursor;

use super::read::*;
use super::*;
use crate::format::{ParseOptions, PresetFormat, detect_format, parse_preset};
use crate::model::FmOperator;
use crate::{WOPN_LEGACY_MAGIC, WOPN_MAGIC};

fn pack_operator(op: &FmOperator) -> [u8; 7] {
    [
        (op.dt << 4) | op.mul,
        op.tl,
        (op.rs << 6) | op.ar,
        (op.am << 7) | op.dr,
        op.sr,
        (op.sl << 4) | op.rr,
        op.ssg,
    ]
}

/// Operators with distinct MUL values so reordering is visible
fn test_patch(algorithm: u8) -> FmPatch {
    let mut patch = FmPatch {
        algorithm,
        feedback: 6,
        lfo_ams: 2,
        lfo_fms: 5,
        ..Default::default()
    };
    for (i, op) in patch.operators.iter_mut().enumerate() {
        *op = FmOperator {
            mul: i as u8 + 1,
            dt: 3,
            ar: 31,
            rs: 2,
            dr: 20,
            am: (i % 2) as u8,
            sl: 9,
            sr: 7,
            rr: 12,
            tl: 30 + i as u8,
            ssg: 8,
        };
    }
    patch
}

fn push_instrument(out: &mut Vec<u8>, version: u16, name: &str, key_offset: i16, patch: &FmPatch) {
    let mut name_field = [0u8; 32];
    name_field[..name.len()].copy_from_slice(name.as_bytes());
    out.extend_from_slice(&name_field);
    out.extend_from_slice(&key_offset.to_be_bytes());
    out.push(35); // Percussion key
    out.push((patch.feedback << 3) | patch.algorithm);
    out.push((patch.lfo_ams << 4) | patch.lfo_fms);
    // Stored as 1, 3, 2, 4
    for index in [0, 2, 1, 3] {
        out.extend_from_slice(&pack_operator(&patch.operators[index]));
    }
    if version >= 2 {
        out.extend_from_slice(&[0, 10, 0, 20]);
    }
}

/// Build a bank file whose melody bank `b` slot `i` is named "M{b}-{i}" for
/// `i < named`, with the remaining slots blank. Percussion slots are all named.
fn build_wopn(version: u16, melody: usize, percussion: usize, named: usize) -> Vec<u8> {
    let mut out = Vec::new();
    if version == 1 {
        out.extend_from_slice(WOPN_LEGACY_MAGIC);
    } else {
        out.extend_from_slice(WOPN_MAGIC);
        out.extend_from_slice(&version.to_le_bytes());
    }
    out.extend_from_slice(&(melody as u16).to_be_bytes());
    out.extend_from_slice(&(percussion as u16).to_be_bytes());
    out.push(0x08 | 0x03); // LFO on, frequency 3

    if version >= 2 {
        for (prefix, count) in [("Melody", melody), ("Drums", percussion)] {
            for b in 0..count {
                let mut name = [0u8; 32];
                let text = format!("{prefix} {b}");
                name[..text.len()].copy_from_slice(text.as_bytes());
                out.extend_from_slice(&name);
                out.push(b as u8); // LSB
                out.push(0); // MSB
            }
        }
    }

    for b in 0..melody {
        for i in 0..128 {
            let name = if i < named { format!("M{b}-{i}") } else { "   ".to_string() };
            push_instrument(&mut out, version, &name, -12, &test_patch((i % 8) as u8));
        }
    }
    for b in 0..percussion {
        for i in 0..128 {
            push_instrument(&mut out, version, &format!("* Drum{b}-{i} "), 0, &test_patch(4));
        }
    }
    out
}

#[test]
fn test_unpack_operator_bits() {
    let op = FmOperator {
        mul: 15,
        dt: 7,
        ar: 31,
        rs: 3,
        dr: 31,
        am: 1,
        sl: 15,
        sr: 31,
        rr: 15,
        tl: 127,
        ssg: 15,
    };
    assert_eq!(unpack_operator(&pack_operator(&op)), op);

    // Unused high bits are ignored
    let op = unpack_operator(&[0x8F, 0xFF, 0x3F, 0x60, 0xE0, 0x00, 0xF0]);
    assert_eq!(op.dt, 0);
    assert_eq!(op.mul, 15);
    assert_eq!(op.tl, 127);
    assert_eq!(op.rs, 0);
    assert_eq!(op.ar, 31);
    assert_eq!(op.am, 0);
    assert_eq!(op.dr, 0);
    assert_eq!(op.sr, 0);
    assert_eq!(op.ssg, 0);
}

#[test]
fn test_parse_v2_header_and_banks() {
    let data = build_wopn(2, 2, 1, 5);
    assert_eq!(detect_format(&data), PresetFormat::Wopn);

    let wopn = parse_wopn(&data).unwrap();
    assert_eq!(wopn.version, 2);
    assert!(wopn.lfo_enabled);
    assert_eq!(wopn.lfo_frequency, 3);
    assert_eq!(wopn.melody_banks.len(), 2);
    assert_eq!(wopn.percussion_banks.len(), 1);

    let bank = &wopn.melody_banks[1];
    assert_eq!(bank.name, "Melody 1");
    assert_eq!(bank.lsb, 1);
    assert_eq!(bank.instruments.len(), 128);
    assert_eq!(wopn.percussion_banks[0].name, "Drums 0");
}

#[test]
fn test_parse_instrument_fields() {
    let wopn = parse_wopn(&build_wopn(2, 1, 0, 128)).unwrap();
    let instrument = &wopn.melody_banks[0].instruments[3];

    assert_eq!(instrument.name, "M0-3");
    assert_eq!(instrument.key_offset, -12);
    assert_eq!(instrument.percussion_key, 35);
    assert_eq!(instrument.patch, test_patch(3));
}

#[test]
fn test_parse_restores_logical_operator_order() {
    let wopn = parse_wopn(&build_wopn(2, 1, 0, 1)).unwrap();
    let muls: Vec<u8> = wopn.melody_banks[0].instruments[0]
        .patch
        .operators
        .iter()
        .map(|op| op.mul)
        .collect();
    assert_eq!(muls, [1, 2, 3, 4]);
}

#[test]
fn test_parse_legacy_file() {
    let wopn = parse_wopn(&build_wopn(1, 1, 1, 2)).unwrap();
    assert_eq!(wopn.version, 1);
    assert_eq!(wopn.melody_banks[0].name, "");
    assert_eq!(wopn.melody_banks[0].instruments[1].name, "M0-1");
    assert_eq!(wopn.percussion_banks[0].instruments[127].patch, test_patch(4));
}

#[test]
fn test_instrument_record_size() {
    assert_eq!(instrument_record_size(1), 65);
    assert_eq!(instrument_record_size(2), 69);

    let data = build_wopn(2, 1, 0, 0);
    let mut cursor = Cursor::new(&data[data.len() - 69..]);
    read_instrument(&mut cursor, 2).unwrap();
    assert_eq!(cursor.position(), 69);
}

#[test]
fn test_name_keeps_trailing_spaces() {
    let wopn = parse_wopn(&build_wopn(2, 0, 1, 0)).unwrap();
    assert_eq!(wopn.percussion_banks[0].instruments[0].name, "* Drum0-0 ");
}

#[test]
fn test_parse_rejects_bad_magic_and_version() {
    assert_eq!(
        parse_wopn(b"WOPN3-XXXX\0\0\0\0\0\0\0"),
        Err(PresetParseError::InvalidSignature(PresetFormat::Wopn))
    );

    let mut data = WOPN_MAGIC.to_vec();
    data.extend_from_slice(&3u16.to_le_bytes());
    data.extend_from_slice(&[0, 0, 0, 0, 0]);
    assert_eq!(parse_wopn(&data), Err(PresetParseError::UnsupportedWopnVersion(3)));

    let mut data = WOPN_MAGIC.to_vec();
    data.extend_from_slice(&0u16.to_le_bytes());
    assert_eq!(parse_wopn(&data), Err(PresetParseError::UnsupportedWopnVersion(0)));
}

#[test]
fn test_parse_truncated_header() {
    assert_eq!(
        parse_wopn(WOPN_MAGIC),
        Err(PresetParseError::UnexpectedEof("WOPN version"))
    );
}

#[test]
fn test_parse_truncated_banks() {
    let mut data = build_wopn(2, 1, 0, 0);
    data.truncate(data.len() - 1);
    assert!(matches!(
        parse_wopn(&data),
        Err(PresetParseError::TooShort {
            format: PresetFormat::Wopn,
            ..
        })
    ));

    // Bank counts far beyond the data are rejected before reading instruments
    let mut data = WOPN_LEGACY_MAGIC.to_vec();
    data.extend_from_slice(&[0xFF, 0xFF, 0xFF, 0xFF, 0x00]);
    assert!(matches!(parse_wopn(&data), Err(PresetParseError::TooShort { .. })));
}

#[test]
fn test_select_instrument() {
    let wopn = parse_wopn(&build_wopn(2, 2, 1, 10)).unwrap();
    let selection = WopnSelection {
        bank_type: BankType::Melody,
        bank: 1,
        instrument: 6,
    };

    let preset = wopn.select(&selection).unwrap();
    assert_eq!(preset.name, "M1-6");
    assert_eq!(preset.patch.algorithm, 6);
    assert_eq!(
        preset.source,
        PresetSource::Wopn {
            bank_type: BankType::Melody,
            bank: 1,
            instrument: 6,
            key_offset: -12,
            percussion_key: 35
        }
    );
}

#[test]
fn test_select_empty_slot_is_allowed() {
    let wopn = parse_wopn(&build_wopn(2, 1, 0, 2)).unwrap();
    let preset = wopn
        .select(&WopnSelection {
            instrument: 100,
            ..Default::default()
        })
        .unwrap();
    assert!(preset.name.trim().is_empty());
}

#[test]
fn test_select_out_of_range() {
    let wopn = parse_wopn(&build_wopn(2, 1, 1, 0)).unwrap();
    assert_eq!(
        wopn.select(&WopnSelection {
            bank_type: BankType::Percussion,
            bank: 1,
            instrument: 0
        }),
        Err(PresetParseError::BankOutOfRange {
            bank_type: BankType::Percussion,
            bank: 1,
            count: 1
        })
    );
    assert_eq!(
        wopn.select(&WopnSelection {
            instrument: 128,
            ..Default::default()
        }),
        Err(PresetParseError::InstrumentOutOfRange(128))
    );
}

#[test]
fn test_parse_preset_dispatches_selection() {
    let data = build_wopn(2, 1, 1, 4);
    let options = ParseOptions {
        wopn: WopnSelection {
            bank_type: BankType::Percussion,
            bank: 0,
            instrument: 9,
        },
    };
    let preset = parse_preset(&data, PresetFormat::Wopn, &options).unwrap();
    assert_eq!(preset.name, "* Drum0-9 ");
    assert_eq!(preset.format(), Some(PresetFormat::Wopn));
}

#[test]
fn test_listing_omits_empty_slots() {
    let listing = list_wopn_contents(&build_wopn(2, 2, 1, 3)).unwrap();

    assert_eq!(listing.version, 2);
    assert_eq!(listing.melody_banks.len(), 2);
    let bank = &listing.banks(BankType::Melody)[1];
    assert_eq!(bank.index, 1);
    assert_eq!(bank.name, "Melody 1");
    let indices: Vec<usize> = bank.instruments.iter().map(|i| i.index).collect();
    assert_eq!(indices, [0, 1, 2]);
    assert_eq!(bank.instruments[2].name, "M1-2");
    assert_eq!(bank.instruments[2].algorithm, 2);

    assert_eq!(listing.percussion_banks[0].instruments.len(), 128);
}

#[test]
fn test_bank_type_display() {
    assert_eq!(BankType::Melody.to_string(), "melody");
    assert_eq!(BankType::Percussion.to_string(), "percussion");
    assert_eq!(BankType::default(), BankType::Melody);
}
