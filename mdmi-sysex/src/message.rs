//! Immutable SysEx message value and hex rendering

use core::fmt;

use crate::{SYSEX_END, SYSEX_START, VENDOR_ID};

/// A complete MDMI SysEx message, `F0` through `F7`
///
/// Only the protocol encoders build messages, so every value is well formed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SysexMessage(Box<[u8]>);

impl SysexMessage {
    /// Frame `command` and `body` with the start byte, vendor id and end byte
    pub(crate) fn new(command: u8, body: &[u8]) -> Self {
        let mut bytes = Vec::with_capacity(VENDOR_ID.len() + body.len() + 3);
        bytes.push(SYSEX_START);
        bytes.extend_from_slice(&VENDOR_ID);
        bytes.push(command);
        bytes.extend_from_slice(body);
        bytes.push(SYSEX_END);
        Self(bytes.into_boxed_slice())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for clippy's `len_without_is_empty`
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Command byte following the vendor id
    pub fn command(&self) -> u8 {
        self.0[1 + VENDOR_ID.len()]
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0.into_vec()
    }
}

impl AsRef<[u8]> for SysexMessage {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for SysexMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Hex(&self.0).fmt(f)
    }
}

/// Formats bytes as spaced uppercase hex, e.g. `F0 00 22 77 02 F7`
#[derive(Debug, Clone, Copy)]
pub struct Hex<'a>(pub &'a [u8]);

impl fmt::Display for Hex<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{byte:02X}")?;
        }
        Ok(())
    }
}
