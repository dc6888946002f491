//! LEB128 variable-length integers: 7 value bits per byte, high bit set on
//! every byte except the last.

use wasmling_syntax::error::{error_at, Result};

const CONTINUATION: u8 = 0x80;
const LOW_BITS: u32 = 0x7F;
const SIGN_BIT: u8 = 0x40;

/// Maximum encoded length of a 32-bit value.
pub const MAX_LEN_32: usize = 5;

pub fn encode_unsigned(n: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(MAX_LEN_32);
    write_unsigned(&mut out, n);
    out
}

pub fn encode_signed(n: i32) -> Vec<u8> {
    let mut out = Vec::with_capacity(MAX_LEN_32);
    write_signed(&mut out, n);
    out
}

/// Appends the unsigned encoding of `n`. Always writes at least one byte.
pub fn write_unsigned(out: &mut Vec<u8>, mut n: u32) {
    loop {
        let mut byte = (n & LOW_BITS) as u8;
        n >>= 7;
        if n != 0 {
            byte |= CONTINUATION;
        }
        out.push(byte);
        if n == 0 {
            break;
        }
    }
}

/// Appends the signed encoding of `n`.
///
/// Stops once the remaining value is pure sign extension of bit 6 of the
/// byte just produced.
pub fn write_signed(out: &mut Vec<u8>, mut n: i32) {
    loop {
        let mut byte = (n as u32 & LOW_BITS) as u8;
        n >>= 7;
        let done = (n == 0 && byte & SIGN_BIT == 0) || (n == -1 && byte & SIGN_BIT != 0);
        if !done {
            byte |= CONTINUATION;
        }
        out.push(byte);
        if done {
            break;
        }
    }
}

/// Decodes an unsigned value from the start of `bytes`.
///
/// Returns the value and the number of bytes consumed. Offsets in errors
/// are relative to `bytes`.
pub fn decode_unsigned(bytes: &[u8]) -> Result<(u32, usize)> {
    let mut result: u32 = 0;
    for (i, &byte) in bytes.iter().enumerate().take(MAX_LEN_32) {
        let shift = 7 * i as u32;
        if i == MAX_LEN_32 - 1 && byte & 0x70 != 0 {
            return error_at(i, "unsigned LEB128 value overflows 32 bits");
        }
        result |= (byte as u32 & LOW_BITS) << shift;
        if byte & CONTINUATION == 0 {
            return Ok((result, i + 1));
        }
    }
    if bytes.len() >= MAX_LEN_32 {
        error_at(MAX_LEN_32 - 1, "unsigned LEB128 value longer than 5 bytes")
    } else {
        error_at(bytes.len(), "truncated LEB128 value")
    }
}

/// Decodes a signed value from the start of `bytes`.
pub fn decode_signed(bytes: &[u8]) -> Result<(i32, usize)> {
    let mut result: i32 = 0;
    for (i, &byte) in bytes.iter().enumerate().take(MAX_LEN_32) {
        let shift = 7 * i as u32;
        if i == MAX_LEN_32 - 1 {
            // Bits above 31 must repeat the sign bit (bit 3 of this byte).
            let high = byte & 0x78;
            if high != 0 && high != 0x78 {
                return error_at(i, "signed LEB128 value overflows 32 bits");
            }
        }
        result |= ((byte as u32 & LOW_BITS) << shift) as i32;
        if byte & CONTINUATION == 0 {
            let consumed = shift + 7;
            if consumed < 32 && byte & SIGN_BIT != 0 {
                result |= -1i32 << consumed;
            }
            return Ok((result, i + 1));
        }
    }
    if bytes.len() >= MAX_LEN_32 {
        error_at(MAX_LEN_32 - 1, "signed LEB128 value longer than 5 bytes")
    } else {
        error_at(bytes.len(), "truncated LEB128 value")
    }
}
