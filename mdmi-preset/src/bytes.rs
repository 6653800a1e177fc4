//! Helper functions for reading and writing fixed-layout preset data

use std::io::{Cursor, Read};

use crate::error::PresetParseError;

pub(crate) fn read_u8(cursor: &mut Cursor<&[u8]>, what: &'static str) -> Result<u8, PresetParseError> {
    let [byte] = read_array::<1>(cursor, what)?;
    Ok(byte)
}

pub(crate) fn read_u16_le(
    cursor: &mut Cursor<&[u8]>,
    what: &'static str,
) -> Result<u16, PresetParseError> {
    Ok(u16::from_le_bytes(read_array(cursor, what)?))
}

pub(crate) fn read_u16_be(
    cursor: &mut Cursor<&[u8]>,
    what: &'static str,
) -> Result<u16, PresetParseError> {
    Ok(u16::from_be_bytes(read_array(cursor, what)?))
}

pub(crate) fn read_i16_be(
    cursor: &mut Cursor<&[u8]>,
    what: &'static str,
) -> Result<i16, PresetParseError> {
    Ok(i16::from_be_bytes(read_array(cursor, what)?))
}

pub(crate) fn read_array<const N: usize>(
    cursor: &mut Cursor<&[u8]>,
    what: &'static str,
) -> Result<[u8; N], PresetParseError> {
    let mut buf = [0u8; N];
    cursor
        .read_exact(&mut buf)
        .map_err(|_| PresetParseError::UnexpectedEof(what))?;
    Ok(buf)
}

/// Bytes left after the cursor position
pub(crate) fn remaining(cursor: &Cursor<&[u8]>) -> usize {
    let len = cursor.get_ref().len() as u64;
    len.saturating_sub(cursor.position()) as usize
}

/// Decode a null-terminated name field
///
/// Trailing spaces are part of the name (bank authors use them for
/// alignment), only the null padding is dropped.
pub(crate) fn read_string(bytes: &[u8]) -> String {
    let len = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..len]).into_owned()
}

/// Write `s` into an `N`-byte field, truncated so a terminating null always fits
pub(crate) fn write_fixed_str<const N: usize>(out: &mut Vec<u8>, s: &str) {
    let mut buf = [0u8; N];
    let bytes = s.as_bytes();
    let copy_len = bytes.len().min(N - 1);
    buf[..copy_len].copy_from_slice(&bytes[..copy_len]);
    out.extend_from_slice(&buf);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_string() {
        assert_eq!(read_string(b"Piano\0\0\0"), "Piano");
        assert_eq!(read_string(b"* BassDrum \0"), "* BassDrum ");
        assert_eq!(read_string(b"No null"), "No null");
        assert_eq!(read_string(b""), "");
    }

    #[test]
    fn test_write_fixed_str_keeps_terminator() {
        let mut out = Vec::new();
        write_fixed_str::<4>(&mut out, "Organ");
        assert_eq!(out, b"Org\0");

        out.clear();
        write_fixed_str::<4>(&mut out, "Hi");
        assert_eq!(out, b"Hi\0\0");
    }

    #[test]
    fn test_read_integers() {
        let data = [0x01, 0x02, 0x01, 0x02, 0xFF, 0xFE];
        let mut cursor = Cursor::new(&data[..]);
        assert_eq!(read_u16_le(&mut cursor, "le").unwrap(), 0x0201);
        assert_eq!(read_u16_be(&mut cursor, "be").unwrap(), 0x0102);
        assert_eq!(read_i16_be(&mut cursor, "signed").unwrap(), -2);
        assert_eq!(remaining(&cursor), 0);
        assert_eq!(
            read_u8(&mut cursor, "tail"),
            Err(PresetParseError::UnexpectedEof("tail"))
        );
    }
}
