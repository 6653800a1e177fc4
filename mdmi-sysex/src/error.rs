//! SysEx error types

use thiserror::Error;

use crate::protocol::DumpKind;

/// A request could not be encoded; raised before any bytes are produced
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("Program must be between 0 and 127, got {0}")]
    ProgramOutOfRange(u8),
    #[error("MIDI channel must be between 0 and 15, got {0}")]
    ChannelOutOfRange(u8),
    /// A voice parameter does not fit in a 7-bit MIDI data byte
    #[error("{field} value {value} does not fit in a MIDI data byte")]
    DataByteOutOfRange { field: String, value: u8 },
}

/// A reply frame that does not follow the dump response grammar
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("SysEx too short for {kind} dump response: got {actual} bytes")]
    TooShort { kind: DumpKind, actual: usize },
    #[error("Invalid MDMI {kind} dump response SysEx: unexpected {field}")]
    InvalidHeader { kind: DumpKind, field: &'static str },
    #[error("Unsupported {kind} type: {value}")]
    UnsupportedVoiceType { kind: DumpKind, value: u8 },
    #[error("Invalid MDMI {kind} dump response SysEx: missing end byte F7")]
    MissingEnd { kind: DumpKind },
    #[error("Insufficient data for FM {kind}: need {needed} payload bytes, got {actual}")]
    InsufficientData {
        kind: DumpKind,
        needed: usize,
        actual: usize,
    },
    #[error("Data byte {value:#04X} at offset {offset} is not a 7-bit value")]
    InvalidDataByte { offset: usize, value: u8 },
    #[error("Expected pong F0 00 22 77 02 F7")]
    NotPong,
}

/// Failure of the underlying MIDI transport
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("MIDI {direction} port '{name}' not found. Available ports: {available:?}")]
    PortNotFound {
        direction: &'static str,
        name: String,
        available: Vec<String>,
    },
    #[error("No MIDI output port given (use --port or MDMI_MIDI_PORT)")]
    NoPort,
    #[error("Failed to open MIDI port: {0}")]
    Connect(String),
    #[error("Failed to send SysEx: {0}")]
    Send(String),
    #[error("Transport is closed")]
    Closed,
}

/// Failure of a session operation (timeouts and bad replies are outcomes, not errors)
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}
