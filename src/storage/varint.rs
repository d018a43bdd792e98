//! SQLite variable-length integers.
//!
//! Big-endian groups of 7 bits, high bit set on every byte except the last.
//! A varint is at most 9 bytes long; the 9th byte contributes all 8 bits.

use crate::types::error::{DatabaseError, Result};

pub const MAX_VARINT_LEN: usize = 9;

const GROUP_MASK: u8 = 0x7f;
const CONTINUE_BIT: u8 = 0x80;

/// Decodes the varint starting at `offset`, returning the value and the
/// number of bytes it occupied.
pub fn decode(buffer: &[u8], offset: usize) -> Result<(u64, usize)> {
    let mut value: u64 = 0;
    for i in 0..MAX_VARINT_LEN - 1 {
        let byte = byte_at(buffer, offset + i)?;
        value = (value << 7) | u64::from(byte & GROUP_MASK);
        if byte & CONTINUE_BIT == 0 {
            return Ok((value, i + 1));
        }
    }
    let last = byte_at(buffer, offset + MAX_VARINT_LEN - 1)?;
    value = (value << 8) | u64::from(last);
    Ok((value, MAX_VARINT_LEN))
}

/// Decodes a varint and reinterprets it as a signed 64-bit integer, the way
/// rowids are stored.
pub fn decode_i64(buffer: &[u8], offset: usize) -> Result<(i64, usize)> {
    let (value, consumed) = decode(buffer, offset)?;
    Ok((value as i64, consumed))
}

pub fn encode(value: u64) -> Vec<u8> {
    if value >> 56 != 0 {
        let mut bytes = vec![0u8; MAX_VARINT_LEN];
        bytes[8] = value as u8;
        let mut rest = value >> 8;
        for i in (0..8).rev() {
            bytes[i] = (rest as u8 & GROUP_MASK) | CONTINUE_BIT;
            rest >>= 7;
        }
        return bytes;
    }

    let mut groups = Vec::with_capacity(8);
    let mut rest = value;
    loop {
        groups.push(rest as u8 & GROUP_MASK);
        rest >>= 7;
        if rest == 0 {
            break;
        }
    }
    let last = groups.len() - 1;
    groups
        .iter()
        .rev()
        .enumerate()
        .map(|(i, group)| if i < last { group | CONTINUE_BIT } else { *group })
        .collect()
}

pub fn encoded_len(value: u64) -> usize {
    if value >> 56 != 0 {
        return MAX_VARINT_LEN;
    }
    let bits = 64 - value.leading_zeros() as usize;
    bits.div_ceil(7).max(1)
}

fn byte_at(buffer: &[u8], offset: usize) -> Result<u8> {
    buffer
        .get(offset)
        .copied()
        .ok_or_else(|| DatabaseError::out_of_bounds("varint", offset, buffer.len()))
}
