//! Request/response round trips over a transport

use std::time::{Duration, Instant};

use mdmi_preset::FmPatch;
use tracing::{debug, warn};

use crate::error::{DecodeError, SessionError, TransportError};
use crate::message::{Hex, SysexMessage};
use crate::protocol::{
    DumpKind, DumpResponse, decode_dump_response, encode_clear_all, encode_clear_preset,
    encode_dump_request, encode_load, is_pong, ping,
};
use crate::transport::Transport;

/// How a single round trip resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// A valid reply arrived
    Matched { value: T, elapsed: Duration },
    /// Nothing arrived within the timeout
    TimedOut { timeout: Duration },
    /// Something arrived but it is not the expected reply
    Malformed { raw: Vec<u8>, error: DecodeError },
}

impl<T> Outcome<T> {
    pub fn is_matched(&self) -> bool {
        matches!(self, Outcome::Matched { .. })
    }

    /// The reply value, discarding the other outcomes
    pub fn matched(self) -> Option<T> {
        match self {
            Outcome::Matched { value, .. } => Some(value),
            _ => None,
        }
    }
}

/// Drives commands against one device
///
/// Each round trip does exactly one send and one bounded wait; retrying is
/// left to the caller.
#[derive(Debug)]
pub struct Session<T> {
    transport: T,
}

impl<T: Transport> Session<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Close the transport
    pub fn close(mut self) -> Result<(), TransportError> {
        self.transport.close()
    }

    /// Send a message without waiting for a reply
    pub fn send(&mut self, message: &SysexMessage) -> Result<(), TransportError> {
        debug!(
            port = self.transport.port_name(),
            len = message.len(),
            bytes = %message,
            "Sending SysEx"
        );
        self.transport.send(message.as_bytes())
    }

    /// Store a voice in a program slot
    pub fn load_preset(&mut self, patch: &FmPatch, program: u8) -> Result<(), SessionError> {
        let message = encode_load(patch, program)?;
        self.send(&message)?;
        Ok(())
    }

    pub fn clear_preset(&mut self, program: u8) -> Result<(), SessionError> {
        let message = encode_clear_preset(program)?;
        self.send(&message)?;
        Ok(())
    }

    pub fn clear_all_presets(&mut self) -> Result<(), SessionError> {
        self.send(&encode_clear_all())?;
        Ok(())
    }

    /// Request a dump and wait for the reply
    pub fn dump(
        &mut self,
        kind: DumpKind,
        address: u8,
        timeout: Duration,
    ) -> Result<Outcome<DumpResponse>, SessionError> {
        let request = encode_dump_request(kind, address)?;
        self.round_trip(&request, timeout, |reply| decode_dump_response(reply, kind))
    }

    pub fn dump_preset(
        &mut self,
        program: u8,
        timeout: Duration,
    ) -> Result<Outcome<DumpResponse>, SessionError> {
        self.dump(DumpKind::Preset, program, timeout)
    }

    pub fn dump_channel(
        &mut self,
        channel: u8,
        timeout: Duration,
    ) -> Result<Outcome<DumpResponse>, SessionError> {
        self.dump(DumpKind::Channel, channel, timeout)
    }

    /// Send a ping; the matched value is the round-trip latency
    pub fn ping(&mut self, timeout: Duration) -> Result<Outcome<()>, SessionError> {
        self.round_trip(&ping(), timeout, |reply| {
            if is_pong(reply) {
                Ok(())
            } else {
                Err(DecodeError::NotPong)
            }
        })
    }

    fn round_trip<R>(
        &mut self,
        request: &SysexMessage,
        timeout: Duration,
        decode: impl FnOnce(&[u8]) -> Result<R, DecodeError>,
    ) -> Result<Outcome<R>, SessionError> {
        let start = Instant::now();
        self.send(request)?;

        let Some(reply) = self.transport.receive(timeout)? else {
            debug!(?timeout, "No reply");
            return Ok(Outcome::TimedOut { timeout });
        };
        let elapsed = start.elapsed();
        debug!(len = reply.len(), bytes = %Hex(&reply), ?elapsed, "Received SysEx");

        Ok(match decode(&reply) {
            Ok(value) => Outcome::Matched { value, elapsed },
            Err(error) => {
                warn!(%error, bytes = %Hex(&reply), "Malformed reply");
                Outcome::Malformed { raw: reply, error }
            }
        })
    }
}
