//! In-process stand-in for the device

use std::collections::VecDeque;
use std::time::Duration;

use mdmi_preset::{FmOperator, FmPatch};
use tracing::debug;

use super::Transport;
use crate::error::TransportError;
use crate::message::Hex;
use crate::protocol::{DumpKind, encode_dump_response, pong};
use crate::{SYSEX_END, SYSEX_START, VENDOR_ID, command};

const FAKE_PORT_NAME: &str = "Fake MIDI Interface";

/// Deterministic fake device
///
/// Records every sent message. Replies are taken from the scripted queue
/// first; otherwise, while simulation is on, the fake answers pings with a
/// pong and dump requests with a voice derived from the requested address
/// (see [`simulated_patch`]).
#[derive(Debug)]
pub struct FakeTransport {
    sent: Vec<Vec<u8>>,
    scripted: VecDeque<Option<Vec<u8>>>,
    simulate_responses: bool,
    response_delay: Duration,
    closed: bool,
}

impl Default for FakeTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeTransport {
    pub fn new() -> Self {
        Self {
            sent: Vec::new(),
            scripted: VecDeque::new(),
            simulate_responses: true,
            response_delay: Duration::ZERO,
            closed: false,
        }
    }

    /// Turn off simulated replies so every unscripted receive times out
    pub fn without_responses(mut self) -> Self {
        self.simulate_responses = false;
        self
    }

    /// Sleep this long before each simulated reply
    pub fn with_response_delay(mut self, delay: Duration) -> Self {
        self.response_delay = delay;
        self
    }

    /// Queue the result of a future receive; `None` scripts a timeout
    pub fn push_reply(&mut self, reply: Option<Vec<u8>>) {
        self.scripted.push_back(reply);
    }

    /// Messages sent so far, oldest first
    pub fn sent(&self) -> &[Vec<u8>] {
        &self.sent
    }

    pub fn last_sent(&self) -> Option<&[u8]> {
        self.sent.last().map(Vec::as_slice)
    }

    pub fn clear_sent(&mut self) {
        self.sent.clear();
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn simulate_reply(&self) -> Option<Vec<u8>> {
        let last = self.sent.last()?;
        if last.len() < 6
            || last[0] != SYSEX_START
            || last[1..4] != VENDOR_ID
            || last[last.len() - 1] != SYSEX_END
        {
            return None;
        }

        let kind = match last[4] {
            command::PING => return Some(pong().into_bytes()),
            command::DUMP_PRESET_REQUEST => DumpKind::Preset,
            command::DUMP_CHANNEL_REQUEST => DumpKind::Channel,
            _ => return None,
        };
        if last.len() < 8 {
            return None;
        }
        let address = last[6];
        encode_dump_response(kind, address, &simulated_patch(address))
            .ok()
            .map(|message| message.into_bytes())
    }
}

impl Transport for FakeTransport {
    fn send(&mut self, message: &[u8]) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        debug!(len = message.len(), bytes = %Hex(message), "Fake transport received message");
        self.sent.push(message.to_vec());
        Ok(())
    }

    fn receive(&mut self, _timeout: Duration) -> Result<Option<Vec<u8>>, TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        if let Some(reply) = self.scripted.pop_front() {
            return Ok(reply);
        }
        if !self.simulate_responses {
            return Ok(None);
        }

        let reply = self.simulate_reply();
        if reply.is_some() && !self.response_delay.is_zero() {
            std::thread::sleep(self.response_delay);
        }
        if let Some(bytes) = &reply {
            debug!(bytes = %Hex(bytes), "Fake transport simulated reply");
        }
        Ok(reply)
    }

    fn port_name(&self) -> &str {
        FAKE_PORT_NAME
    }

    fn input_port_name(&self) -> Option<&str> {
        Some(FAKE_PORT_NAME)
    }

    fn close(&mut self) -> Result<(), TransportError> {
        self.closed = true;
        Ok(())
    }
}

/// Plausible voice derived from a program or channel number
///
/// Values depend only on `seed` and always fit in a MIDI data byte.
pub fn simulated_patch(seed: u8) -> FmPatch {
    let seed = u32::from(seed);
    let mut patch = FmPatch {
        algorithm: (seed % 8) as u8,
        feedback: ((seed * 3) % 8) as u8,
        lfo_ams: (seed % 4) as u8,
        lfo_fms: ((seed * 5) % 8) as u8,
        ..Default::default()
    };
    for (index, op) in patch.operators.iter_mut().enumerate() {
        let index = index as u32;
        let base = (seed + index * 20) % 128;
        *op = FmOperator {
            mul: (1 + base % 15) as u8,
            dt: (base % 8) as u8,
            ar: (20 + base % 12) as u8,
            rs: (base % 4) as u8,
            dr: (8 + base % 12) as u8,
            am: (base % 2) as u8,
            sl: (base % 16) as u8,
            sr: (base % 16) as u8,
            rr: (5 + base % 12) as u8,
            tl: (base % 48 + index * 12) as u8,
            ssg: if base % 4 == 0 { 0 } else { (8 + base % 8) as u8 },
        };
    }
    patch
}
