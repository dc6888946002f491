//! Float, string, vector and section primitives.

use byteorder::{ByteOrder, LittleEndian};
use wasmling_syntax::error::{error, error_at, Result};

use crate::format::SectionId;
use crate::leb128::write_unsigned;

/// Longest name whose length fits in a single length byte.
pub const MAX_NAME_LEN: usize = 127;

/// IEEE-754 single precision, little-endian. Bit exact, NaN payloads included.
pub fn encode_f32(x: f32) -> [u8; 4] {
    let mut buf = [0u8; 4];
    LittleEndian::write_f32(&mut buf, x);
    buf
}

pub fn decode_f32(bytes: &[u8]) -> Result<f32> {
    if bytes.len() < 4 {
        return error_at(bytes.len(), "truncated f32 immediate");
    }
    Ok(LittleEndian::read_f32(&bytes[..4]))
}

/// One length byte followed by one byte per character.
///
/// Names are limited to 127 characters in the Latin-1 range so that the
/// length byte doubles as a valid one-byte LEB128 count.
pub fn encode_string(s: &str) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(s.len() + 1);
    out.push(0);
    for c in s.chars() {
        let code = c as u32;
        if code > 0xFF {
            return error(format!("cannot encode name '{}': character '{}' is above U+00FF", s, c));
        }
        out.push(code as u8);
    }
    let len = out.len() - 1;
    if len > MAX_NAME_LEN {
        return error(format!("cannot encode name of {} characters (limit {})", len, MAX_NAME_LEN));
    }
    out[0] = len as u8;
    Ok(out)
}

/// Element count followed by the concatenated items.
pub fn encode_vector<I: AsRef<[u8]>>(items: &[I]) -> Vec<u8> {
    let mut out = Vec::new();
    write_unsigned(&mut out, items.len() as u32);
    for item in items {
        out.extend_from_slice(item.as_ref());
    }
    out
}

/// Byte count followed by the bytes, as used for function bodies.
pub fn encode_bytes(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() + 5);
    write_unsigned(&mut out, bytes.len() as u32);
    out.extend_from_slice(bytes);
    out
}

/// Section id byte, payload size, payload.
pub fn make_section(id: SectionId, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 6);
    out.push(id as u8);
    write_unsigned(&mut out, payload.len() as u32);
    out.extend_from_slice(payload);
    out
}
