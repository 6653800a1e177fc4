//! Encoders and decoders for the MDMI command set

use core::fmt;

use mdmi_preset::{FmOperator, FmPatch, Preset};
use tracing::debug;

use crate::error::{DecodeError, EncodeError};
use crate::message::SysexMessage;
use crate::{
    FM_TYPE, MAX_CHANNEL, MAX_PROGRAM, SYSEX_END, SYSEX_START, VENDOR_ID, VOICE_PAYLOAD_SIZE,
    command,
};

/// Header bytes in front of a voice payload: start, vendor, command, type, address
const VOICE_HEADER_SIZE: usize = 1 + VENDOR_ID.len() + 3;

const OPERATOR_FIELDS: [&str; 11] = ["MUL", "DT", "AR", "RS", "DR", "AM", "SL", "SR", "RR", "TL", "SSG"];
const VOICE_FIELDS: [&str; 4] = ["Algorithm", "Feedback", "LFO AMS", "LFO FMS"];

/// What a dump request addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DumpKind {
    /// A stored program slot (0-127)
    Preset,
    /// The voice currently playing on a MIDI channel (0-15)
    Channel,
}

impl DumpKind {
    pub fn request_command(self) -> u8 {
        match self {
            DumpKind::Preset => command::DUMP_PRESET_REQUEST,
            DumpKind::Channel => command::DUMP_CHANNEL_REQUEST,
        }
    }

    pub fn response_command(self) -> u8 {
        match self {
            DumpKind::Preset => command::DUMP_PRESET_RESPONSE,
            DumpKind::Channel => command::DUMP_CHANNEL_RESPONSE,
        }
    }

    /// Name given to a dumped voice, e.g. `Preset_005` or `Channel_03`
    pub fn preset_name(self, address: u8) -> String {
        match self {
            DumpKind::Preset => format!("Preset_{address:03}"),
            DumpKind::Channel => format!("Channel_{address:02}"),
        }
    }

    fn check_address(self, address: u8) -> Result<(), EncodeError> {
        match self {
            DumpKind::Preset => check_program(address),
            DumpKind::Channel if address > MAX_CHANNEL => Err(EncodeError::ChannelOutOfRange(address)),
            DumpKind::Channel => Ok(()),
        }
    }
}

impl fmt::Display for DumpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DumpKind::Preset => "preset",
            DumpKind::Channel => "channel",
        })
    }
}

/// A decoded dump reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpResponse {
    pub kind: DumpKind,
    /// Program or channel echoed by the device
    pub address: u8,
    pub preset: Preset,
}

fn check_program(program: u8) -> Result<(), EncodeError> {
    if program > MAX_PROGRAM {
        return Err(EncodeError::ProgramOutOfRange(program));
    }
    Ok(())
}

fn operator_bytes(op: &FmOperator) -> [u8; 11] {
    [
        op.mul, op.dt, op.ar, op.rs, op.dr, op.am, op.sl, op.sr, op.rr, op.tl, op.ssg,
    ]
}

fn field_name(index: usize) -> String {
    match index.checked_sub(VOICE_FIELDS.len()) {
        None => VOICE_FIELDS[index].to_string(),
        Some(i) => format!("Operator {} {}", i / 11 + 1, OPERATOR_FIELDS[i % 11]),
    }
}

/// Serialize a voice as the shared load/dump payload, checking every byte is 7-bit
fn voice_payload(patch: &FmPatch) -> Result<[u8; VOICE_PAYLOAD_SIZE], EncodeError> {
    let mut payload = [0u8; VOICE_PAYLOAD_SIZE];
    payload[..4].copy_from_slice(&[patch.algorithm, patch.feedback, patch.lfo_ams, patch.lfo_fms]);
    for (chunk, op) in payload[4..].chunks_exact_mut(11).zip(&patch.operators) {
        chunk.copy_from_slice(&operator_bytes(op));
    }

    if let Some((index, &value)) = payload.iter().enumerate().find(|(_, v)| **v > 0x7F) {
        return Err(EncodeError::DataByteOutOfRange {
            field: field_name(index),
            value,
        });
    }
    Ok(payload)
}

fn voice_message(command: u8, address: u8, patch: &FmPatch) -> Result<SysexMessage, EncodeError> {
    let mut body = Vec::with_capacity(2 + VOICE_PAYLOAD_SIZE);
    body.extend_from_slice(&[FM_TYPE, address]);
    body.extend_from_slice(&voice_payload(patch)?);
    Ok(SysexMessage::new(command, &body))
}

/// Build the 56-byte message that stores a voice in a program slot
pub fn encode_load(patch: &FmPatch, program: u8) -> Result<SysexMessage, EncodeError> {
    check_program(program)?;
    voice_message(command::LOAD_PRESET, program, patch)
}

/// Clear one program slot
pub fn encode_clear_preset(program: u8) -> Result<SysexMessage, EncodeError> {
    check_program(program)?;
    Ok(SysexMessage::new(command::CLEAR_PRESET, &[FM_TYPE, program]))
}

/// Clear every program slot
pub fn encode_clear_all() -> SysexMessage {
    SysexMessage::new(command::CLEAR_ALL, &[FM_TYPE])
}

/// Ask the device for a program slot or a channel's live voice
pub fn encode_dump_request(kind: DumpKind, address: u8) -> Result<SysexMessage, EncodeError> {
    kind.check_address(address)?;
    Ok(SysexMessage::new(kind.request_command(), &[FM_TYPE, address]))
}

/// Build the reply the device sends for a dump request
pub fn encode_dump_response(
    kind: DumpKind,
    address: u8,
    patch: &FmPatch,
) -> Result<SysexMessage, EncodeError> {
    kind.check_address(address)?;
    voice_message(kind.response_command(), address, patch)
}

/// Parse a dump reply
///
/// The frame must carry the vendor id, the response command for `kind`, the
/// FM type byte and a full voice payload. Trailing payload bytes past the
/// voice are ignored.
pub fn decode_dump_response(bytes: &[u8], kind: DumpKind) -> Result<DumpResponse, DecodeError> {
    if bytes.len() < VOICE_HEADER_SIZE + 1 {
        return Err(DecodeError::TooShort {
            kind,
            actual: bytes.len(),
        });
    }
    if bytes[0] != SYSEX_START {
        return Err(DecodeError::InvalidHeader {
            kind,
            field: "start byte",
        });
    }
    if bytes[1..4] != VENDOR_ID {
        return Err(DecodeError::InvalidHeader {
            kind,
            field: "vendor id",
        });
    }
    if bytes[4] != kind.response_command() {
        return Err(DecodeError::InvalidHeader {
            kind,
            field: "command",
        });
    }
    if bytes[5] != FM_TYPE {
        return Err(DecodeError::UnsupportedVoiceType {
            kind,
            value: bytes[5],
        });
    }
    if bytes[bytes.len() - 1] != SYSEX_END {
        return Err(DecodeError::MissingEnd { kind });
    }

    let body = &bytes[VOICE_HEADER_SIZE - 1..bytes.len() - 1];
    if let Some((offset, &value)) = body.iter().enumerate().find(|(_, v)| **v > 0x7F) {
        return Err(DecodeError::InvalidDataByte {
            offset: offset + VOICE_HEADER_SIZE - 1,
            value,
        });
    }

    let address = body[0];
    let payload = &body[1..];
    if payload.len() < VOICE_PAYLOAD_SIZE {
        return Err(DecodeError::InsufficientData {
            kind,
            needed: VOICE_PAYLOAD_SIZE,
            actual: payload.len(),
        });
    }
    if payload.len() > VOICE_PAYLOAD_SIZE {
        debug!(extra = payload.len() - VOICE_PAYLOAD_SIZE, "Ignoring trailing dump payload bytes");
    }

    let mut patch = FmPatch {
        algorithm: payload[0],
        feedback: payload[1],
        lfo_ams: payload[2],
        lfo_fms: payload[3],
        ..Default::default()
    };
    for (op, raw) in patch.operators.iter_mut().zip(payload[4..VOICE_PAYLOAD_SIZE].chunks_exact(11)) {
        *op = FmOperator {
            mul: raw[0],
            dt: raw[1],
            ar: raw[2],
            rs: raw[3],
            dr: raw[4],
            am: raw[5],
            sl: raw[6],
            sr: raw[7],
            rr: raw[8],
            tl: raw[9],
            ssg: raw[10],
        };
    }

    Ok(DumpResponse {
        kind,
        address,
        preset: Preset::new(kind.preset_name(address), patch),
    })
}

/// Liveness probe, `F0 00 22 77 01 F7`
pub fn ping() -> SysexMessage {
    SysexMessage::new(command::PING, &[])
}

/// Reply to a ping, `F0 00 22 77 02 F7`
pub fn pong() -> SysexMessage {
    SysexMessage::new(command::PONG, &[])
}

/// True only for the exact pong literal
pub fn is_pong(bytes: &[u8]) -> bool {
    bytes == pong().as_bytes()
}
