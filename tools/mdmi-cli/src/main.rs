//! MDMI CLI - preset tool for the Mega Drive MIDI Interface
//!
//! # Commands
//!
//! - `mdmi load-preset` - Send a TFI, DMP or WOPN preset to a program slot
//! - `mdmi clear-preset` - Reset one program slot
//! - `mdmi clear-all-presets` - Reset every program slot
//! - `mdmi dump-preset` - Save a stored program as a DMP or TFI file
//! - `mdmi dump-channel` - Save the voice playing on a MIDI channel
//! - `mdmi ping` - Measure one round trip to the device
//! - `mdmi perf-test` - Repeated pings with latency statistics
//! - `mdmi list-wopn` - Show the contents of a WOPN bank file
//! - `mdmi list-ports` - Show available MIDI ports
//!
//! # Usage
//!
//! ```bash
//! export MDMI_MIDI_PORT="MDMI:MDMI MIDI 1 20:0"
//!
//! # Load instrument 3 of the first melody bank into program 10
//! mdmi load-preset bank.wopn --program 10 --instrument 3
//!
//! # Dump program 10 back as TFI
//! mdmi dump-preset --program 10 --format tfi
//!
//! # Try any command without hardware
//! mdmi --dry-run ping
//! ```
//!
//! # Config (config.toml)
//!
//! ```toml
//! [midi]
//! output_port = "MDMI:MDMI MIDI 1 20:0"
//! timeout_secs = 5.0
//!
//! [perf]
//! interval_secs = 0.05
//! timeout_secs = 2.0
//! ```

mod commands;
mod config;
mod midi;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{Context, clear, clear_all, dump, list_ports, list_wopn, load, perf, ping};

/// MDMI CLI - preset tool for the Mega Drive MIDI Interface
#[derive(Parser)]
#[command(name = "mdmi")]
#[command(about = "Load, dump and test FM presets on the Mega Drive MIDI Interface")]
#[command(version)]
struct Cli {
    /// MIDI output port name
    #[arg(long, global = true, env = "MDMI_MIDI_PORT")]
    port: Option<String>,

    /// MIDI input port name (defaults to the output port name)
    #[arg(long, global = true, env = "MDMI_MIDI_INPUT_PORT")]
    input_port: Option<String>,

    /// Use a simulated device instead of real MIDI ports
    #[arg(long, global = true)]
    dry_run: bool,

    /// Log every SysEx frame sent and received
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a preset file to a program slot
    LoadPreset(load::LoadArgs),

    /// Reset one program slot
    ClearPreset(clear::ClearArgs),

    /// Reset every program slot
    ClearAllPresets(clear_all::ClearAllArgs),

    /// Save a stored program as a DMP or TFI file
    DumpPreset(dump::DumpPresetArgs),

    /// Save the voice playing on a MIDI channel as a DMP or TFI file
    DumpChannel(dump::DumpChannelArgs),

    /// Measure one round trip to the device
    Ping(ping::PingArgs),

    /// Ping repeatedly and report latency statistics
    PerfTest(perf::PerfArgs),

    /// Show the banks and instruments of a WOPN file
    ListWopn(list_wopn::ListWopnArgs),

    /// Show available MIDI ports
    ListPorts(list_ports::ListPortsArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so command output stays clean
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let context = Context {
        port: cli.port,
        input_port: cli.input_port,
        dry_run: cli.dry_run,
        config: config::load(),
    };

    match cli.command {
        Commands::LoadPreset(args) => load::execute(args, &context),
        Commands::ClearPreset(args) => clear::execute(args, &context),
        Commands::ClearAllPresets(args) => clear_all::execute(args, &context),
        Commands::DumpPreset(args) => dump::execute_preset(args, &context),
        Commands::DumpChannel(args) => dump::execute_channel(args, &context),
        Commands::Ping(args) => ping::execute(args, &context),
        Commands::PerfTest(args) => perf::execute(args, &context),
        Commands::ListWopn(args) => list_wopn::execute(args),
        Commands::ListPorts(args) => list_ports::execute(args),
    }
}
