//! Subcommands and the state they share

pub mod clear;
pub mod clear_all;
pub mod dump;
pub mod list_ports;
pub mod list_wopn;
pub mod load;
pub mod perf;
pub mod ping;

use std::time::Duration;

use anyhow::{Context as _, Result};
use mdmi_sysex::{FakeTransport, Session, Transport, TransportError};
use tracing::debug;

use crate::config::{self, Config};
use crate::midi::MidirTransport;

/// Reply delay of the simulated device in dry-run mode
const DRY_RUN_DELAY: Duration = Duration::from_millis(10);

/// Global options plus the loaded config file
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// `--port` or `MDMI_MIDI_PORT`
    pub port: Option<String>,
    /// `--input-port` or `MDMI_MIDI_INPUT_PORT`
    pub input_port: Option<String>,
    pub dry_run: bool,
    pub config: Config,
}

impl Context {
    pub fn output_port(&self) -> Option<&str> {
        self.port
            .as_deref()
            .or(self.config.midi.output_port.as_deref())
    }

    pub fn input_port(&self) -> Option<&str> {
        self.input_port
            .as_deref()
            .or(self.config.midi.input_port.as_deref())
    }

    /// Open the device, or the simulated one in dry-run mode
    pub fn open(&self) -> Result<Session<Box<dyn Transport>>> {
        self.open_with(FakeTransport::new().with_response_delay(DRY_RUN_DELAY))
    }

    /// Like [`Context::open`], using `fake` when dry-running
    pub fn open_with(&self, fake: FakeTransport) -> Result<Session<Box<dyn Transport>>> {
        let transport: Box<dyn Transport> = if self.dry_run {
            debug!("Dry run, using fake transport");
            Box::new(fake)
        } else {
            let port = self.output_port().ok_or(TransportError::NoPort)?;
            Box::new(
                MidirTransport::open(port, self.input_port())
                    .with_context(|| format!("Failed to open MIDI port '{port}'"))?,
            )
        };
        Ok(Session::new(transport))
    }

    /// `--timeout` if given, else the configured dump timeout
    pub fn dump_timeout(&self, flag: Option<f64>) -> Result<Duration> {
        config::secs(flag.unwrap_or(self.config.midi.timeout_secs))
    }
}

#[cfg(test)]
pub(crate) fn dry_run_context() -> Context {
    Context {
        dry_run: true,
        ..Context::default()
    }
}
