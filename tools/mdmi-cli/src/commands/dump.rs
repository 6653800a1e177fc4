//! Dump commands - fetch a voice from the device and save it as a file
//!
//! `dump-preset` reads a stored program slot, `dump-channel` reads the voice
//! currently playing on a MIDI channel. Both share the options and the
//! request/wait/save flow below.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result, bail};
use clap::{Args, ValueEnum};
use mdmi_preset::{PresetFormat, write_preset_file};
use mdmi_sysex::{DumpKind, Hex, Outcome, Session, Transport};

use super::Context;

/// File format written by a dump
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Dmp,
    Tfi,
}

impl OutputFormat {
    fn preset_format(self) -> PresetFormat {
        match self {
            OutputFormat::Dmp => PresetFormat::Dmp,
            OutputFormat::Tfi => PresetFormat::Tfi,
        }
    }

    fn extension(self) -> &'static str {
        match self {
            OutputFormat::Dmp => "dmp",
            OutputFormat::Tfi => "tfi",
        }
    }
}

/// Options shared by both dump commands
#[derive(Args)]
pub struct DumpOptions {
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Dmp)]
    pub format: OutputFormat,

    /// Output file (defaults to preset_NNN.<format> or channel_NN.<format>)
    #[arg(long)]
    pub filename: Option<PathBuf>,

    /// Seconds to wait for the dump response
    #[arg(long)]
    pub timeout: Option<f64>,
}

/// Arguments for the dump-preset command
#[derive(Args)]
pub struct DumpPresetArgs {
    /// Program slot to dump (0-127)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=127))]
    pub program: u8,

    #[command(flatten)]
    pub options: DumpOptions,
}

/// Arguments for the dump-channel command
#[derive(Args)]
pub struct DumpChannelArgs {
    /// MIDI channel to dump (0-15)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=15))]
    pub channel: u8,

    #[command(flatten)]
    pub options: DumpOptions,
}

pub fn execute_preset(args: DumpPresetArgs, context: &Context) -> Result<()> {
    execute(DumpKind::Preset, args.program, &args.options, context)
}

pub fn execute_channel(args: DumpChannelArgs, context: &Context) -> Result<()> {
    execute(DumpKind::Channel, args.channel, &args.options, context)
}

fn execute(kind: DumpKind, address: u8, options: &DumpOptions, context: &Context) -> Result<()> {
    let timeout = context.dump_timeout(options.timeout)?;
    let path = output_path(kind, address, options.format, options.filename.as_deref());

    let mut session = context.open()?;
    let result = run(kind, address, options.format, &path, timeout, &mut session);
    session.close()?;
    result
}

fn label(kind: DumpKind) -> &'static str {
    match kind {
        DumpKind::Preset => "program",
        DumpKind::Channel => "FM channel",
    }
}

/// Where the dump goes; the extension always matches the format
pub(crate) fn output_path(
    kind: DumpKind,
    address: u8,
    format: OutputFormat,
    filename: Option<&Path>,
) -> PathBuf {
    let ext = format.extension();
    let path = match filename {
        Some(name) => name.to_path_buf(),
        None => match kind {
            DumpKind::Preset => PathBuf::from(format!("preset_{address:03}.{ext}")),
            DumpKind::Channel => PathBuf::from(format!("channel_{address:02}.{ext}")),
        },
    };

    let matches = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext));
    if matches { path } else { path.with_extension(ext) }
}

/// Request the dump, wait once, and write the file
pub(crate) fn run<T: Transport>(
    kind: DumpKind,
    address: u8,
    format: OutputFormat,
    path: &Path,
    timeout: std::time::Duration,
    session: &mut Session<T>,
) -> Result<()> {
    let transport = session.transport();
    println!(
        "Requesting dump of {} {address} from {}...",
        label(kind),
        transport.port_name()
    );
    if let Some(input) = transport.input_port_name()
        && input != transport.port_name()
    {
        println!("Listening for response on {input}...");
    }
    println!("Waiting for dump response (timeout: {}s)...", timeout.as_secs_f64());

    let response = match session.dump(kind, address, timeout)? {
        Outcome::Matched { value, .. } => value,
        Outcome::TimedOut { .. } => {
            println!("This could mean:");
            println!("  - MDMI is not connected or powered");
            println!("  - MIDI cables are not properly connected");
            println!("  - MIDI interface doesn't support input");
            match kind {
                DumpKind::Preset => println!("  - The requested program slot is empty"),
                DumpKind::Channel => {
                    println!("  - The requested MIDI channel is not assigned to an FM channel")
                }
            }
            bail!(
                "No dump response received within {} seconds",
                timeout.as_secs_f64()
            );
        }
        Outcome::Malformed { raw, error } => {
            println!("Raw response: {}", Hex(&raw));
            bail!("Failed to parse dump response: {error}");
        }
    };

    write_preset_file(&response.preset, format.preset_format(), path).with_context(|| {
        format!(
            "Failed to write {} file {}",
            format.preset_format(),
            path.display()
        )
    })?;

    let patch = &response.preset.patch;
    println!(
        "Successfully dumped {} {address} to {}",
        label(kind),
        path.display()
    );
    println!("Format: {}", format.preset_format());
    println!("Algorithm: {}, Feedback: {}", patch.algorithm, patch.feedback);
    println!("LFO AMS: {}, LFO FMS: {}", patch.lfo_ams, patch.lfo_fms);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use mdmi_preset::{ParseOptions, detect_format, parse_preset};
    use mdmi_sysex::{FakeTransport, simulated_patch};

    #[test]
    fn test_default_filenames() {
        assert_eq!(
            output_path(DumpKind::Preset, 5, OutputFormat::Dmp, None),
            PathBuf::from("preset_005.dmp")
        );
        assert_eq!(
            output_path(DumpKind::Channel, 3, OutputFormat::Tfi, None),
            PathBuf::from("channel_03.tfi")
        );
    }

    #[test]
    fn test_extension_forced_to_format() {
        let cases = [
            ("bass.dmp", OutputFormat::Dmp, "bass.dmp"),
            ("bass.DMP", OutputFormat::Dmp, "bass.DMP"),
            ("bass.txt", OutputFormat::Tfi, "bass.tfi"),
            ("bass", OutputFormat::Tfi, "bass.tfi"),
            ("out/lead.tfi", OutputFormat::Dmp, "out/lead.dmp"),
        ];
        for (name, format, expected) in cases {
            assert_eq!(
                output_path(DumpKind::Preset, 0, format, Some(Path::new(name))),
                PathBuf::from(expected),
                "{name}"
            );
        }
    }

    #[test]
    fn test_dump_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preset_007.dmp");
        let mut session = Session::new(FakeTransport::new());

        run(
            DumpKind::Preset,
            7,
            OutputFormat::Dmp,
            &path,
            Duration::from_secs(1),
            &mut session,
        )
        .unwrap();

        let data = std::fs::read(&path).unwrap();
        assert_eq!(detect_format(&data), PresetFormat::Dmp);
        let preset = parse_preset(&data, PresetFormat::Dmp, &ParseOptions::default()).unwrap();
        assert_eq!(preset.patch, simulated_patch(7));
    }

    #[test]
    fn test_dump_timeout_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("channel_01.tfi");
        let mut session = Session::new(FakeTransport::new().without_responses());

        let error = run(
            DumpKind::Channel,
            1,
            OutputFormat::Tfi,
            &path,
            Duration::from_millis(10),
            &mut session,
        )
        .unwrap_err();
        assert!(error.to_string().contains("No dump response"));
        assert!(!path.exists());
    }

    #[test]
    fn test_dump_malformed_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preset_001.dmp");
        let mut transport = FakeTransport::new();
        transport.push_reply(Some(vec![0xF0, 0x00, 0x22, 0x77, 0x0E, 0x00, 0x01, 0xF7]));
        let mut session = Session::new(transport);

        let error = run(
            DumpKind::Preset,
            1,
            OutputFormat::Dmp,
            &path,
            Duration::from_secs(1),
            &mut session,
        )
        .unwrap_err();
        assert!(error.to_string().starts_with("Failed to parse dump response"));
        assert!(!path.exists());
    }
}
