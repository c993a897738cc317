//! Numeric view over stack items.
//!
//! Numbers are little-endian sign-magnitude: the high bit of the last byte
//! is the sign, zero is the empty vector.

use crate::error::{Result, TxError};

pub struct ScriptNum;

impl ScriptNum {
    /// Shortest encoding of `n`.
    pub fn encode(n: i64) -> Vec<u8> {
        if n == 0 {
            return Vec::new();
        }
        let negative = n < 0;
        let mut abs = n.unsigned_abs();
        let mut out = Vec::with_capacity(9);
        while abs > 0 {
            out.push((abs & 0xff) as u8);
            abs >>= 8;
        }
        let last = out.len() - 1;
        if out[last] & 0x80 != 0 {
            out.push(if negative { 0x80 } else { 0x00 });
        } else if negative {
            out[last] |= 0x80;
        }
        out
    }

    /// Interpret `bytes` as a number of at most `max_len` bytes, and never
    /// more than eight.
    pub fn decode(bytes: &[u8], max_len: usize) -> Result<i64> {
        if bytes.len() > max_len.min(8) {
            return Err(TxError::NumericOverflow(format!(
                "{}-byte operand exceeds {} bytes",
                bytes.len(),
                max_len
            )));
        }
        let Some((&last, _)) = bytes.split_last() else {
            return Ok(0);
        };
        let mut value: i64 = 0;
        for (i, b) in bytes.iter().enumerate() {
            value |= (*b as i64) << (8 * i);
        }
        if last & 0x80 != 0 {
            value &= !(0x80i64 << (8 * (bytes.len() - 1)));
            return Ok(-value);
        }
        Ok(value)
    }

    /// Fail unless `n` can be encoded in `max_len` bytes.
    pub fn check_range(n: i64, max_len: usize) -> Result<i64> {
        let bound = match max_len {
            0 => 0,
            1..=7 => (1u64 << (8 * max_len - 1)) - 1,
            _ => i64::MAX as u64,
        };
        if n.unsigned_abs() > bound {
            return Err(TxError::NumericOverflow(format!(
                "result {} outside ±{}",
                n, bound
            )));
        }
        Ok(n)
    }
}
