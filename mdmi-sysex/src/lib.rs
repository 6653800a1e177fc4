//! MDMI-SysEx: device protocol for the Mega Drive MIDI Interface
//!
//! Builds and parses the System-Exclusive messages the MDMI understands and
//! drives request/response round trips over an abstract [`Transport`].
//!
//! # Message Grammar
//!
//! | Message | Bytes |
//! |---------|-------|
//! | Load preset | `F0 00 22 77 0A 00 <program> <alg> <fb> <ams> <fms> <44 operator bytes> F7` |
//! | Clear preset | `F0 00 22 77 0B 00 <program> F7` |
//! | Clear all | `F0 00 22 77 0C 00 F7` |
//! | Dump preset | `F0 00 22 77 0D 00 <program> F7`, reply command `0E` |
//! | Dump channel | `F0 00 22 77 0F 00 <channel> F7`, reply command `10` |
//! | Ping / Pong | `F0 00 22 77 01 F7` / `F0 00 22 77 02 F7` |
//!
//! Operators go on the wire in logical order, each as
//! `mul dt ar rs dr am sl sr rr tl ssg`.
//!
//! # Usage
//!
//! ```ignore
//! use mdmi_sysex::{FakeTransport, Outcome, Session};
//!
//! let mut session = Session::new(FakeTransport::new());
//! match session.dump_preset(5, Duration::from_secs(5))? {
//!     Outcome::Matched { value, .. } => println!("{}", value.preset),
//!     Outcome::TimedOut { timeout } => eprintln!("No reply within {timeout:?}"),
//!     Outcome::Malformed { raw, error } => eprintln!("{error}: {}", Hex(&raw)),
//! }
//! ```

mod error;
mod message;
mod perf;
mod protocol;
mod session;
mod transport;

pub use error::{DecodeError, EncodeError, SessionError, TransportError};
pub use message::{Hex, SysexMessage};
pub use perf::{LatencyStats, PerfConfig, PerfLimit, PerfProgress, PerfReport, run_perf_test};
pub use protocol::{
    DumpKind, DumpResponse, decode_dump_response, encode_clear_all, encode_clear_preset,
    encode_dump_request, encode_dump_response, encode_load, is_pong, ping, pong,
};
pub use session::{Outcome, Session};
pub use transport::{FakeTransport, SysexAssembler, Transport, poll_with_timeout, simulated_patch};

// =============================================================================
// Constants
// =============================================================================

/// Start of a System-Exclusive message
pub const SYSEX_START: u8 = 0xF0;

/// End of a System-Exclusive message
pub const SYSEX_END: u8 = 0xF7;

/// MDMI manufacturer id
pub const VENDOR_ID: [u8; 3] = [0x00, 0x22, 0x77];

/// Voice type byte for FM channels
pub const FM_TYPE: u8 = 0x00;

/// Highest program slot on the device
pub const MAX_PROGRAM: u8 = 127;

/// Highest MIDI channel number (zero-based)
pub const MAX_CHANNEL: u8 = 15;

/// Algorithm, feedback, AMS, FMS plus 4 operators of 11 bytes
pub const VOICE_PAYLOAD_SIZE: usize = 4 + 4 * 11;

/// Size of a load-preset message and of a dump response
pub const VOICE_MESSAGE_SIZE: usize = 7 + VOICE_PAYLOAD_SIZE + 1;

/// Command bytes
pub mod command {
    pub const PING: u8 = 0x01;
    pub const PONG: u8 = 0x02;
    pub const LOAD_PRESET: u8 = 0x0A;
    pub const CLEAR_PRESET: u8 = 0x0B;
    pub const CLEAR_ALL: u8 = 0x0C;
    pub const DUMP_PRESET_REQUEST: u8 = 0x0D;
    pub const DUMP_PRESET_RESPONSE: u8 = 0x0E;
    pub const DUMP_CHANNEL_REQUEST: u8 = 0x0F;
    pub const DUMP_CHANNEL_RESPONSE: u8 = 0x10;
}
