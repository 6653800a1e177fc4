//! DMP (DefleMask preset) reading and writing
//!
//! ```text
//! [".DMP"]                  optional signature
//! version                   8, 9 or 11
//!
//! v8/v9:  instrument_mode, reserved
//! v11:    system, instrument_mode, name[32]
//!
//! FM mode only:
//!   lfo_fms, feedback, algorithm, lfo_ams
//!   4 operators x 11 bytes, on-disk order 1, 3, 2, 4:
//!     MUL TL AR DR SL RR AM RS DT SR SSG
//! ```

use std::io::Cursor;

use tracing::debug;

use crate::bytes::{read_array, read_string, read_u8, write_fixed_str};
use crate::error::PresetParseError;
use crate::model::{FmOperator, FmPatch, Preset, PresetSource, swap_middle_operators};
use crate::{DMP_MODE_FM, DMP_SIGNATURE, DMP_SYSTEM_GENESIS, DMP_WRITE_VERSION};

const DMP_NAME_SIZE: usize = 32;
const DMP_OPERATOR_SIZE: usize = 11;

/// Parse a DMP instrument, with or without the `.DMP` signature
///
/// Non-FM instruments parse successfully with an all-zero FM voice.
pub fn parse_dmp(data: &[u8]) -> Result<Preset, PresetParseError> {
    let body = data.strip_prefix(DMP_SIGNATURE).unwrap_or(data);
    let mut cursor = Cursor::new(body);

    let version = read_u8(&mut cursor, "DMP version")?;
    let (system, instrument_mode, name) = match version {
        8 | 9 => {
            let mode = read_u8(&mut cursor, "DMP instrument mode")?;
            read_u8(&mut cursor, "DMP reserved byte")?;
            (None, mode, String::new())
        }
        11 => {
            let system = read_u8(&mut cursor, "DMP system")?;
            let mode = read_u8(&mut cursor, "DMP instrument mode")?;
            let name = read_array::<DMP_NAME_SIZE>(&mut cursor, "DMP name")?;
            (Some(system), mode, read_string(&name))
        }
        other => return Err(PresetParseError::UnsupportedDmpVersion(other)),
    };

    let patch = if instrument_mode == DMP_MODE_FM {
        read_fm_voice(&mut cursor)?
    } else {
        debug!(instrument_mode, "DMP instrument is not FM, using an empty voice");
        FmPatch::default()
    };

    Ok(Preset {
        name,
        patch,
        source: PresetSource::Dmp {
            version,
            system,
            instrument_mode,
        },
    })
}

fn read_fm_voice(cursor: &mut Cursor<&[u8]>) -> Result<FmPatch, PresetParseError> {
    let lfo_fms = read_u8(cursor, "DMP LFO FMS")?;
    let feedback = read_u8(cursor, "DMP feedback")?;
    let algorithm = read_u8(cursor, "DMP algorithm")?;
    let lfo_ams = read_u8(cursor, "DMP LFO AMS")?;

    let mut on_disk = [FmOperator::default(); 4];
    for op in &mut on_disk {
        *op = decode_operator(&read_array(cursor, "DMP operator")?);
    }

    Ok(FmPatch {
        algorithm,
        feedback,
        lfo_ams,
        lfo_fms,
        operators: swap_middle_operators(on_disk),
    })
}

/// Serialize a preset as a version 11 DMP FM instrument
///
/// The system byte is carried over from DMP sources and defaults to the
/// Genesis otherwise. Names longer than 31 bytes are truncated.
pub fn write_dmp(preset: &Preset) -> Vec<u8> {
    let system = match preset.source {
        PresetSource::Dmp {
            system: Some(system),
            ..
        } => system,
        _ => DMP_SYSTEM_GENESIS,
    };
    let patch = &preset.patch;

    let mut out = Vec::with_capacity(3 + DMP_NAME_SIZE + 4 + 4 * DMP_OPERATOR_SIZE);
    out.push(DMP_WRITE_VERSION);
    out.push(system);
    out.push(DMP_MODE_FM);
    write_fixed_str::<DMP_NAME_SIZE>(&mut out, &preset.name);
    out.extend_from_slice(&[patch.lfo_fms, patch.feedback, patch.algorithm, patch.lfo_ams]);
    for op in &swap_middle_operators(patch.operators) {
        out.extend_from_slice(&encode_operator(op));
    }
    out
}

fn decode_operator(raw: &[u8; DMP_OPERATOR_SIZE]) -> FmOperator {
    let [mul, tl, ar, dr, sl, rr, am, rs, dt, sr, ssg] = *raw;
    FmOperator {
        mul,
        dt,
        ar,
        rs,
        dr,
        am,
        sl,
        sr,
        rr,
        tl,
        ssg,
    }
}

fn encode_operator(op: &FmOperator) -> [u8; DMP_OPERATOR_SIZE] {
    [
        op.mul, op.tl, op.ar, op.dr, op.sl, op.rr, op.am, op.rs, op.dt, op.sr, op.ssg,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{PresetFormat, detect_format};

    /// On-disk operator `n` gets MUL = n and TL = 10 * n
    fn operator_bytes(n: u8) -> [u8; DMP_OPERATOR_SIZE] {
        [n, 10 * n, 31, 15, 2, 7, n % 2, 1, 3, 4, 0]
    }

    fn v8_fm_dmp() -> Vec<u8> {
        let mut data = vec![8, 1, 0];
        data.extend_from_slice(&[3, 4, 5, 2]); // FMS, feedback, algorithm, AMS
        for n in 1..=4 {
            data.extend_from_slice(&operator_bytes(n));
        }
        data
    }

    #[test]
    fn test_parse_v8_dmp() {
        let preset = parse_dmp(&v8_fm_dmp()).unwrap();

        assert_eq!(preset.format(), Some(PresetFormat::Dmp));
        assert_eq!(preset.patch.algorithm, 5);
        assert_eq!(preset.patch.feedback, 4);
        assert_eq!(preset.patch.lfo_ams, 2);
        assert_eq!(preset.patch.lfo_fms, 3);
        assert_eq!(preset.name, "");

        let op = preset.patch.operators[0];
        assert_eq!(op.mul, 1);
        assert_eq!(op.tl, 10);
        assert_eq!(op.ar, 31);
        assert_eq!(op.dr, 15);
        assert_eq!(op.sl, 2);
        assert_eq!(op.rr, 7);
        assert_eq!(op.am, 1);
        assert_eq!(op.rs, 1);
        assert_eq!(op.dt, 3);
        assert_eq!(op.sr, 4);
    }

    #[test]
    fn test_parse_reorders_operators() {
        let preset = parse_dmp(&v8_fm_dmp()).unwrap();
        let muls: Vec<u8> = preset.patch.operators.iter().map(|op| op.mul).collect();
        assert_eq!(muls, [1, 3, 2, 4]);
    }

    #[test]
    fn test_parse_v11_with_signature_and_name() {
        let mut data = DMP_SIGNATURE.to_vec();
        data.extend_from_slice(&[11, DMP_SYSTEM_GENESIS, 1]);
        let mut name = [0u8; DMP_NAME_SIZE];
        name[..9].copy_from_slice(b"Slap Bass");
        data.extend_from_slice(&name);
        data.extend_from_slice(&[1, 6, 7, 3]);
        for n in 1..=4 {
            data.extend_from_slice(&operator_bytes(n));
        }

        assert_eq!(detect_format(&data), PresetFormat::Dmp);
        let preset = parse_dmp(&data).unwrap();
        assert_eq!(preset.name, "Slap Bass");
        assert_eq!(preset.patch.algorithm, 7);
        assert_eq!(
            preset.source,
            PresetSource::Dmp {
                version: 11,
                system: Some(DMP_SYSTEM_GENESIS),
                instrument_mode: 1
            }
        );
    }

    #[test]
    fn test_parse_non_fm_instrument() {
        let preset = parse_dmp(&[9, 0, 0]).unwrap();
        assert_eq!(preset.patch, FmPatch::default());
    }

    #[test]
    fn test_parse_unsupported_version() {
        let mut data = DMP_SIGNATURE.to_vec();
        data.extend_from_slice(&[0u8; 40]);
        assert_eq!(parse_dmp(&data), Err(PresetParseError::UnsupportedDmpVersion(0)));
    }

    #[test]
    fn test_parse_truncated_operators() {
        let mut data = v8_fm_dmp();
        data.truncate(data.len() - 1);
        assert_eq!(
            parse_dmp(&data),
            Err(PresetParseError::UnexpectedEof("DMP operator"))
        );
        assert_eq!(
            parse_dmp(&[]),
            Err(PresetParseError::UnexpectedEof("DMP version"))
        );
    }

    #[test]
    fn test_write_restores_on_disk_order() {
        let preset = parse_dmp(&v8_fm_dmp()).unwrap();
        let written = write_dmp(&preset);

        assert_eq!(written[0], DMP_WRITE_VERSION);
        assert_eq!(written[1], DMP_SYSTEM_GENESIS);
        assert_eq!(written[2], DMP_MODE_FM);
        let ops = &written[3 + DMP_NAME_SIZE + 4..];
        assert_eq!(ops.len(), 4 * DMP_OPERATOR_SIZE);
        for (i, chunk) in ops.chunks(DMP_OPERATOR_SIZE).enumerate() {
            assert_eq!(chunk, operator_bytes(i as u8 + 1));
        }
    }

    #[test]
    fn test_write_then_parse_roundtrip() {
        let mut preset = parse_dmp(&v8_fm_dmp()).unwrap();
        preset.name = "Round Trip".to_string();

        let reparsed = parse_dmp(&write_dmp(&preset)).unwrap();
        assert_eq!(reparsed.name, "Round Trip");
        assert_eq!(reparsed.patch, preset.patch);
    }

    #[test]
    fn test_write_keeps_system_of_dmp_source() {
        let preset = Preset {
            source: PresetSource::Dmp {
                version: 11,
                system: Some(0x08),
                instrument_mode: 1,
            },
            ..Default::default()
        };
        assert_eq!(write_dmp(&preset)[1], 0x08);
    }
}
