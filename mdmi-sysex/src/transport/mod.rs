//! Transport abstraction
//!
//! - [`Transport`] - what a session needs from a MIDI connection
//! - [`SysexAssembler`] - reassembles `F0..F7` frames from a raw byte stream
//! - `fake` - deterministic in-process device for tests and dry runs

mod fake;

use std::collections::VecDeque;
use std::time::{Duration, Instant};

pub use fake::{FakeTransport, simulated_patch};

use crate::error::TransportError;
use crate::{SYSEX_END, SYSEX_START};

/// Sleep between polls while waiting for a frame
const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// A bidirectional SysEx connection to the device
///
/// A transport belongs to one session at a time and is not shared across
/// threads.
pub trait Transport {
    /// Send one complete message, `F0` through `F7`
    fn send(&mut self, message: &[u8]) -> Result<(), TransportError>;

    /// Wait up to `timeout` for the next complete SysEx frame
    ///
    /// `Ok(None)` means nothing arrived in time.
    fn receive(&mut self, timeout: Duration) -> Result<Option<Vec<u8>>, TransportError>;

    /// Output port name, for display
    fn port_name(&self) -> &str;

    /// Input port name, `None` when the transport cannot receive
    fn input_port_name(&self) -> Option<&str>;

    /// Release the ports; further sends fail
    fn close(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, message: &[u8]) -> Result<(), TransportError> {
        (**self).send(message)
    }

    fn receive(&mut self, timeout: Duration) -> Result<Option<Vec<u8>>, TransportError> {
        (**self).receive(timeout)
    }

    fn port_name(&self) -> &str {
        (**self).port_name()
    }

    fn input_port_name(&self) -> Option<&str> {
        (**self).input_port_name()
    }

    fn close(&mut self) -> Result<(), TransportError> {
        (**self).close()
    }
}

/// Call `poll` until it yields a value or `timeout` elapses
///
/// `poll` always runs at least once, so a zero timeout still picks up data
/// that is already waiting.
pub fn poll_with_timeout<T>(timeout: Duration, mut poll: impl FnMut() -> Option<T>) -> Option<T> {
    let start = Instant::now();
    loop {
        if let Some(value) = poll() {
            return Some(value);
        }
        if start.elapsed() >= timeout {
            return None;
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

/// Collects incoming MIDI bytes into complete SysEx frames
///
/// Real-time bytes (`F8`-`FF`) may be interleaved anywhere and are dropped.
/// Bytes outside a frame are discarded, and any other status byte inside a
/// frame abandons it.
#[derive(Debug, Default)]
pub struct SysexAssembler {
    current: Option<Vec<u8>>,
    frames: VecDeque<Vec<u8>>,
}

impl SysexAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes as they arrive
    pub fn push(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            match byte {
                0xF8..=0xFF => {}
                SYSEX_START => self.current = Some(vec![SYSEX_START]),
                SYSEX_END => {
                    if let Some(mut frame) = self.current.take() {
                        frame.push(SYSEX_END);
                        self.frames.push_back(frame);
                    }
                }
                0x80..=0xEF | 0xF1..=0xF6 => self.current = None,
                _ => {
                    if let Some(frame) = self.current.as_mut() {
                        frame.push(byte);
                    }
                }
            }
        }
    }

    /// Oldest complete frame, if any
    pub fn pop_frame(&mut self) -> Option<Vec<u8>> {
        self.frames.pop_front()
    }

    /// Drop buffered frames and any partial frame
    pub fn clear(&mut self) {
        self.current = None;
        self.frames.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assembler_single_frame() {
        let mut assembler = SysexAssembler::new();
        assembler.push(&[0xF0, 0x00, 0x22, 0x77, 0x02, 0xF7]);
        assert_eq!(assembler.pop_frame(), Some(vec![0xF0, 0x00, 0x22, 0x77, 0x02, 0xF7]));
        assert_eq!(assembler.pop_frame(), None);
    }

    #[test]
    fn test_assembler_split_chunks_and_realtime() {
        let mut assembler = SysexAssembler::new();
        assembler.push(&[0x90, 0x40, 0xF0, 0x00, 0x22]);
        assert_eq!(assembler.pop_frame(), None);
        assembler.push(&[0xF8, 0x77, 0x02, 0xFE, 0xF7, 0x3C]);
        assert_eq!(assembler.pop_frame(), Some(vec![0xF0, 0x00, 0x22, 0x77, 0x02, 0xF7]));
    }

    #[test]
    fn test_assembler_abandons_interrupted_frame() {
        let mut assembler = SysexAssembler::new();
        assembler.push(&[0xF0, 0x00, 0x22, 0x90, 0x40, 0x7F, 0xF7]);
        assert_eq!(assembler.pop_frame(), None);

        assembler.push(&[0xF0, 0x01, 0xF0, 0x02, 0xF7, 0xF0, 0x03, 0xF7]);
        assert_eq!(assembler.pop_frame(), Some(vec![0xF0, 0x02, 0xF7]));
        assert_eq!(assembler.pop_frame(), Some(vec![0xF0, 0x03, 0xF7]));

        assembler.push(&[0xF0, 0x04]);
        assembler.clear();
        assembler.push(&[0x05, 0xF7]);
        assert_eq!(assembler.pop_frame(), None);
    }

    #[test]
    fn test_poll_with_timeout() {
        let mut calls = 0;
        let value = poll_with_timeout(Duration::from_secs(1), || {
            calls += 1;
            (calls == 3).then_some(calls)
        });
        assert_eq!(value, Some(3));

        let start = Instant::now();
        assert_eq!(poll_with_timeout(Duration::from_millis(20), || None::<()>), None);
        assert!(start.elapsed() >= Duration::from_millis(20));

        assert_eq!(poll_with_timeout(Duration::ZERO, || Some(7)), Some(7));
    }
}
