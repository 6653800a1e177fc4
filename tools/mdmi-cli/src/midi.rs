//! Hardware MIDI transport backed by `midir`
//!
//! The input callback runs on the backend's thread and feeds raw bytes into a
//! shared [`SysexAssembler`]; `receive` polls that buffer until a complete
//! frame shows up or the timeout passes.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use mdmi_sysex::{SysexAssembler, Transport, TransportError, poll_with_timeout};
use midir::{Ignore, MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};
use tracing::{debug, info};

const CLIENT_NAME: &str = "mdmi";

/// Output and input port names as reported by the MIDI backend
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortList {
    pub outputs: Vec<String>,
    pub inputs: Vec<String>,
}

/// Enumerate the ports the backend can see
pub fn list_ports() -> Result<PortList, TransportError> {
    let midi_out = MidiOutput::new(CLIENT_NAME)
        .map_err(|e| TransportError::Connect(format!("Failed to create MIDI output: {e}")))?;
    let midi_in = MidiInput::new(CLIENT_NAME)
        .map_err(|e| TransportError::Connect(format!("Failed to create MIDI input: {e}")))?;

    Ok(PortList {
        outputs: midi_out
            .ports()
            .iter()
            .filter_map(|port| midi_out.port_name(port).ok())
            .collect(),
        inputs: midi_in
            .ports()
            .iter()
            .filter_map(|port| midi_in.port_name(port).ok())
            .collect(),
    })
}

/// A connection to the device over real MIDI ports
pub struct MidirTransport {
    output: Option<MidiOutputConnection>,
    input: Option<MidiInputConnection<()>>,
    frames: Arc<Mutex<SysexAssembler>>,
    port_name: String,
    input_port_name: Option<String>,
}

impl MidirTransport {
    /// Open `output_name` for sending and, if available, an input port.
    ///
    /// Without an explicit `input_name` the input port with the same name as
    /// the output is used when it exists; otherwise the transport is
    /// send-only and every receive times out. An explicit `input_name` that
    /// does not exist is an error.
    pub fn open(output_name: &str, input_name: Option<&str>) -> Result<Self, TransportError> {
        let midi_out = MidiOutput::new(CLIENT_NAME)
            .map_err(|e| TransportError::Connect(format!("Failed to create MIDI output: {e}")))?;
        let ports = midi_out.ports();
        let names: Vec<String> = ports
            .iter()
            .map(|port| midi_out.port_name(port).unwrap_or_default())
            .collect();
        let Some(index) = names.iter().position(|name| name == output_name) else {
            return Err(TransportError::PortNotFound {
                direction: "output",
                name: output_name.to_string(),
                available: names,
            });
        };
        let output = midi_out
            .connect(&ports[index], "mdmi-out")
            .map_err(|e| TransportError::Connect(format!("{output_name}: {e}")))?;
        info!("Opened MIDI output: {}", output_name);

        let frames = Arc::new(Mutex::new(SysexAssembler::new()));
        let wanted = input_name.unwrap_or(output_name);
        let input = match Self::connect_input(wanted, Arc::clone(&frames))? {
            Some(connection) => Some(connection),
            None if input_name.is_some() => {
                return Err(TransportError::PortNotFound {
                    direction: "input",
                    name: wanted.to_string(),
                    available: list_ports()?.inputs,
                });
            }
            None => {
                debug!("No input port named '{}', replies will not be received", wanted);
                None
            }
        };

        Ok(Self {
            output: Some(output),
            input_port_name: input.as_ref().map(|_| wanted.to_string()),
            input,
            frames,
            port_name: output_name.to_string(),
        })
    }

    /// `Ok(None)` when no input port has that name
    fn connect_input(
        name: &str,
        frames: Arc<Mutex<SysexAssembler>>,
    ) -> Result<Option<MidiInputConnection<()>>, TransportError> {
        let mut midi_in = MidiInput::new(CLIENT_NAME)
            .map_err(|e| TransportError::Connect(format!("Failed to create MIDI input: {e}")))?;
        // SysEx is filtered out by default
        midi_in.ignore(Ignore::None);

        let ports = midi_in.ports();
        let Some(port) = ports
            .iter()
            .find(|port| midi_in.port_name(port).is_ok_and(|n| n == name))
        else {
            return Ok(None);
        };

        let connection = midi_in
            .connect(
                port,
                "mdmi-in",
                move |_timestamp, message, _| {
                    lock(&frames).push(message);
                },
                (),
            )
            .map_err(|e| TransportError::Connect(format!("{name}: {e}")))?;
        info!("Opened MIDI input: {}", name);
        Ok(Some(connection))
    }
}

/// The assembler stays usable even if the callback thread panicked
fn lock(frames: &Mutex<SysexAssembler>) -> MutexGuard<'_, SysexAssembler> {
    match frames.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl Transport for MidirTransport {
    fn send(&mut self, message: &[u8]) -> Result<(), TransportError> {
        let output = self.output.as_mut().ok_or(TransportError::Closed)?;
        // Replies belong to the request about to go out
        lock(&self.frames).clear();
        output
            .send(message)
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    fn receive(&mut self, timeout: Duration) -> Result<Option<Vec<u8>>, TransportError> {
        if self.output.is_none() {
            return Err(TransportError::Closed);
        }
        if self.input.is_none() {
            return Ok(None);
        }
        Ok(poll_with_timeout(timeout, || lock(&self.frames).pop_frame()))
    }

    fn port_name(&self) -> &str {
        &self.port_name
    }

    fn input_port_name(&self) -> Option<&str> {
        self.input_port_name.as_deref()
    }

    fn close(&mut self) -> Result<(), TransportError> {
        if let Some(output) = self.output.take() {
            output.close();
        }
        if let Some(input) = self.input.take() {
            input.close();
        }
        debug!(port = %self.port_name, "Closed MIDI ports");
        Ok(())
    }
}

impl Drop for MidirTransport {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
