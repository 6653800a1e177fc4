//! Load command - send a preset file to a program slot

use std::path::PathBuf;

use anyhow::{Context as _, Result, bail};
use clap::{Args, ValueEnum};
use mdmi_preset::{
    BankType, ParseOptions, Preset, PresetFormat, WopnSelection, detect_format, parse_preset,
};
use mdmi_sysex::{Session, Transport};

use super::Context;

/// WOPN bank list selector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum BankTypeArg {
    #[default]
    Melody,
    Percussion,
}

impl From<BankTypeArg> for BankType {
    fn from(value: BankTypeArg) -> Self {
        match value {
            BankTypeArg::Melody => BankType::Melody,
            BankTypeArg::Percussion => BankType::Percussion,
        }
    }
}

/// Arguments for the load-preset command
#[derive(Args)]
pub struct LoadArgs {
    /// Preset file (TFI, DMP or WOPN)
    pub file: PathBuf,

    /// Program slot to store the preset in (0-127)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=127))]
    pub program: u8,

    /// WOPN bank index
    #[arg(long, default_value_t = 0)]
    pub bank: usize,

    /// WOPN instrument index
    #[arg(long, default_value_t = 0)]
    pub instrument: usize,

    /// WOPN bank type
    #[arg(long, value_enum, default_value_t = BankTypeArg::Melody)]
    pub bank_type: BankTypeArg,
}

impl LoadArgs {
    fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            wopn: WopnSelection {
                bank_type: self.bank_type.into(),
                bank: self.bank,
                instrument: self.instrument,
            },
        }
    }
}

/// Execute the load-preset command
pub fn execute(args: LoadArgs, context: &Context) -> Result<()> {
    let (format, preset) = read_preset(&args)?;
    let mut session = context.open()?;
    let message = run(&args, format, &preset, &mut session)?;
    session.close()?;
    println!("{message}");
    Ok(())
}

/// Read, detect and parse the preset file
pub(crate) fn read_preset(args: &LoadArgs) -> Result<(PresetFormat, Preset)> {
    let data = std::fs::read(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    let format = detect_format(&data);
    if format == PresetFormat::Unknown {
        bail!("Unsupported preset format: {}", args.file.display());
    }

    let preset = parse_preset(&data, format, &args.parse_options())
        .with_context(|| format!("Failed to parse {format} preset {}", args.file.display()))?;
    Ok((format, preset))
}

/// Send the preset and return the success message
pub(crate) fn run<T: Transport>(
    args: &LoadArgs,
    format: PresetFormat,
    preset: &Preset,
    session: &mut Session<T>,
) -> Result<String> {
    session.load_preset(&preset.patch, args.program)?;

    Ok(if format == PresetFormat::Wopn {
        format!(
            "Successfully loaded {format} preset '{}' (bank {}, instrument {}) to program {}",
            preset.name, args.bank, args.instrument, args.program
        )
    } else {
        format!("Successfully loaded {format} preset to program {}", args.program)
    })
}
