//! TFI (TFM Music Maker instrument) reading and writing
//!
//! ```text
//! 0x00: algorithm
//! 0x01: feedback
//! 0x02: operator 1 (10 bytes)
//! 0x0C: operator 2
//! 0x16: operator 3
//! 0x20: operator 4
//!
//! Operator: MUL DT TL RS AR DR SR RR SL SSG (1 byte each)
//! ```
//!
//! TFI has no AM flag; it reads as 0 and is dropped on write.

use tracing::warn;

use crate::TFI_SIZE;
use crate::error::PresetParseError;
use crate::format::PresetFormat;
use crate::model::{FmOperator, FmPatch, Preset, PresetSource};

const TFI_HEADER_SIZE: usize = 2;
const TFI_OPERATOR_SIZE: usize = 10;

/// Parse a TFI instrument
///
/// Operator data cut short by a truncated capture is padded with zeros; only
/// a missing algorithm/feedback header is an error.
pub fn parse_tfi(data: &[u8]) -> Result<Preset, PresetParseError> {
    if data.len() < TFI_HEADER_SIZE {
        return Err(PresetParseError::TooShort {
            format: PresetFormat::Tfi,
            needed: TFI_SIZE,
            actual: data.len(),
        });
    }
    if data.len() < TFI_SIZE {
        warn!(len = data.len(), "Truncated TFI data, padding operators with zeros");
    }

    let mut patch = FmPatch {
        algorithm: data[0],
        feedback: data[1],
        ..Default::default()
    };

    for (index, op) in patch.operators.iter_mut().enumerate() {
        let start = TFI_HEADER_SIZE + index * TFI_OPERATOR_SIZE;
        let mut raw = [0u8; TFI_OPERATOR_SIZE];
        if let Some(available) = data.get(start..) {
            let len = available.len().min(TFI_OPERATOR_SIZE);
            raw[..len].copy_from_slice(&available[..len]);
        }
        *op = decode_operator(&raw);
    }

    Ok(Preset {
        name: String::new(),
        patch,
        source: PresetSource::Tfi,
    })
}

/// Serialize a preset as a 42-byte TFI instrument
pub fn write_tfi(preset: &Preset) -> Vec<u8> {
    let patch = &preset.patch;
    let mut out = Vec::with_capacity(TFI_SIZE);
    out.push(patch.algorithm);
    out.push(patch.feedback);
    for op in &patch.operators {
        out.extend_from_slice(&encode_operator(op));
    }
    out
}

fn decode_operator(raw: &[u8; TFI_OPERATOR_SIZE]) -> FmOperator {
    let [mul, dt, tl, rs, ar, dr, sr, rr, sl, ssg] = *raw;
    FmOperator {
        mul,
        dt,
        ar,
        rs,
        dr,
        am: 0,
        sl,
        sr,
        rr,
        tl,
        ssg,
    }
}

fn encode_operator(op: &FmOperator) -> [u8; TFI_OPERATOR_SIZE] {
    [
        op.mul, op.dt, op.tl, op.rs, op.ar, op.dr, op.sr, op.rr, op.sl, op.ssg,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tfi() -> Vec<u8> {
        let mut data = vec![0u8; TFI_SIZE];
        data[0] = 5; // Algorithm
        data[1] = 4; // Feedback
        for i in 0..4 {
            let offset = 2 + i * 10;
            data[offset..offset + 10]
                .copy_from_slice(&[5, 1, 15 + i as u8, 0, 31, 15, 0, 15, 2, 0]);
        }
        data
    }

    #[test]
    fn test_parse_basic_tfi() {
        let preset = parse_tfi(&sample_tfi()).unwrap();

        assert_eq!(preset.format(), Some(PresetFormat::Tfi));
        assert_eq!(preset.patch.algorithm, 5);
        assert_eq!(preset.patch.feedback, 4);

        let op = preset.patch.operators[0];
        assert_eq!(op.mul, 5);
        assert_eq!(op.dt, 1);
        assert_eq!(op.tl, 15);
        assert_eq!(op.ar, 31);
        assert_eq!(op.dr, 15);
        assert_eq!(op.rr, 15);
        assert_eq!(op.sl, 2);
        assert_eq!(op.am, 0);
        assert_eq!(preset.patch.operators[3].tl, 18);
    }

    #[test]
    fn test_parse_truncated_tfi_pads_operators() {
        let mut data = sample_tfi();
        data.truncate(17); // Operator 1 complete, operator 2 cut after 5 bytes

        let preset = parse_tfi(&data).unwrap();
        assert_eq!(preset.patch.operators[0].tl, 15);
        assert_eq!(preset.patch.operators[1].mul, 5);
        assert_eq!(preset.patch.operators[1].ar, 31);
        assert_eq!(preset.patch.operators[1].dr, 0);
        assert_eq!(preset.patch.operators[2], FmOperator::default());
        assert_eq!(preset.patch.operators[3], FmOperator::default());
    }

    #[test]
    fn test_parse_tfi_without_header() {
        assert_eq!(
            parse_tfi(&[3]),
            Err(PresetParseError::TooShort {
                format: PresetFormat::Tfi,
                needed: TFI_SIZE,
                actual: 1
            })
        );
    }

    #[test]
    fn test_write_tfi_roundtrip() {
        let data = sample_tfi();
        let preset = parse_tfi(&data).unwrap();
        assert_eq!(write_tfi(&preset), data);
    }

    #[test]
    fn test_write_tfi_drops_am() {
        let mut preset = parse_tfi(&sample_tfi()).unwrap();
        preset.patch.operators[2].am = 1;

        let written = write_tfi(&preset);
        assert_eq!(written.len(), TFI_SIZE);
        assert_eq!(parse_tfi(&written).unwrap().patch.operators[2].am, 0);
    }
}
