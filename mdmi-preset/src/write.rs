//! Preset serialization to the writable formats

use std::path::Path;

use tracing::debug;

use crate::error::PresetWriteError;
use crate::format::PresetFormat;
use crate::model::Preset;
use crate::{dmp, tfi};

/// Serialize a preset as TFI or DMP
pub fn encode_preset(preset: &Preset, format: PresetFormat) -> Result<Vec<u8>, PresetWriteError> {
    match format {
        PresetFormat::Tfi => Ok(tfi::write_tfi(preset)),
        PresetFormat::Dmp => Ok(dmp::write_dmp(preset)),
        PresetFormat::Wopn | PresetFormat::Unknown => Err(PresetWriteError::UnsupportedFormat(format)),
    }
}

/// Serialize a preset and write it to `path`
pub fn write_preset_file(
    preset: &Preset,
    format: PresetFormat,
    path: impl AsRef<Path>,
) -> Result<(), PresetWriteError> {
    let path = path.as_ref();
    let data = encode_preset(preset, format)?;
    std::fs::write(path, &data)?;
    debug!(path = %path.display(), %format, bytes = data.len(), "Wrote preset");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{ParseOptions, detect_format, parse_preset};
    use crate::model::{FmOperator, FmPatch};
    use crate::{DMP_WRITE_VERSION, TFI_SIZE};

    fn sample_preset() -> Preset {
        let mut patch = FmPatch {
            algorithm: 3,
            feedback: 7,
            lfo_ams: 1,
            lfo_fms: 2,
            ..Default::default()
        };
        for (i, op) in patch.operators.iter_mut().enumerate() {
            *op = FmOperator {
                mul: i as u8,
                tl: 20 + i as u8,
                ar: 28,
                ..Default::default()
            };
        }
        Preset::new("Dumped", patch)
    }

    #[test]
    fn test_encode_tfi() {
        let data = encode_preset(&sample_preset(), PresetFormat::Tfi).unwrap();
        assert_eq!(data.len(), TFI_SIZE);
        assert_eq!(detect_format(&data), PresetFormat::Tfi);
    }

    #[test]
    fn test_encode_dmp() {
        let data = encode_preset(&sample_preset(), PresetFormat::Dmp).unwrap();
        assert_eq!(data[0], DMP_WRITE_VERSION);
        assert_eq!(detect_format(&data), PresetFormat::Dmp);
    }

    #[test]
    fn test_encode_unwritable_formats() {
        for format in [PresetFormat::Wopn, PresetFormat::Unknown] {
            assert!(matches!(
                encode_preset(&sample_preset(), format),
                Err(PresetWriteError::UnsupportedFormat(f)) if f == format
            ));
        }
    }

    #[test]
    fn test_write_preset_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preset_005.dmp");
        let preset = sample_preset();

        write_preset_file(&preset, PresetFormat::Dmp, &path).unwrap();

        let data = std::fs::read(&path).unwrap();
        let parsed = parse_preset(&data, detect_format(&data), &ParseOptions::default()).unwrap();
        assert_eq!(parsed.name, "Dumped");
        assert_eq!(parsed.patch, preset.patch);
    }

    #[test]
    fn test_write_preset_file_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("preset.tfi");
        assert!(matches!(
            write_preset_file(&sample_preset(), PresetFormat::Tfi, &path),
            Err(PresetWriteError::Io(_))
        ));
    }
}
