//! Wire codec primitives.
//!
//! Fixed-width integers are little-endian and exact width. Counts and
//! lengths use the compact-size encoding:
//!
//! | value range              | encoding                 |
//! |--------------------------|--------------------------|
//! | `n < 0xfd`               | 1 byte                   |
//! | `n <= 0xffff`            | `0xfd` + u16 LE          |
//! | `n <= 0xffff_ffff`       | `0xfe` + u32 LE          |
//! | otherwise                | `0xff` + u64 LE          |

use crate::config::DecodeOptions;
use crate::error::{Result, TxError};

/// Canonical binary encoding.
pub trait Encodable {
    fn encode(&self, out: &mut Vec<u8>);

    fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode(&mut out);
        out
    }
}

/// Canonical binary decoding.
pub trait Decodable: Sized {
    fn decode(reader: &mut Reader<'_>) -> Result<Self>;

    /// Decode a value that must span the whole of `bytes`.
    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_bytes_with(bytes, DecodeOptions::default())
    }

    fn from_bytes_with(bytes: &[u8], options: DecodeOptions) -> Result<Self> {
        let mut reader = Reader::with_options(bytes, options);
        let value = Self::decode(&mut reader)?;
        reader.finish()?;
        Ok(value)
    }
}

pub fn write_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

pub fn write_u64(out: &mut Vec<u8>, v: u64) {
    out.extend_from_slice(&v.to_le_bytes());
}

pub fn write_compact_size(out: &mut Vec<u8>, n: u64) {
    if n < 0xfd {
        out.push(n as u8);
    } else if n <= 0xffff {
        out.push(0xfd);
        out.extend_from_slice(&(n as u16).to_le_bytes());
    } else if n <= 0xffff_ffff {
        out.push(0xfe);
        out.extend_from_slice(&(n as u32).to_le_bytes());
    } else {
        out.push(0xff);
        out.extend_from_slice(&n.to_le_bytes());
    }
}

/// Length prefix followed by the raw bytes.
pub fn write_var_bytes(out: &mut Vec<u8>, data: &[u8]) {
    write_compact_size(out, data.len() as u64);
    out.extend_from_slice(data);
}

/// Number of bytes `write_compact_size` emits for `n`.
pub fn compact_size_len(n: u64) -> usize {
    match n {
        0..=0xfc => 1,
        0xfd..=0xffff => 3,
        0x1_0000..=0xffff_ffff => 5,
        _ => 9,
    }
}

/// Cursor over a byte slice that never reads past its end.
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
    options: DecodeOptions,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_options(data, DecodeOptions::default())
    }

    pub fn with_options(data: &'a [u8], options: DecodeOptions) -> Self {
        Self {
            data,
            pos: 0,
            options,
        }
    }

    pub fn options(&self) -> DecodeOptions {
        self.options
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(TxError::TruncatedInput {
                needed: n,
                remaining: self.remaining(),
            });
        }
        let out = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    pub fn read_compact_size(&mut self) -> Result<u64> {
        let (value, min) = match self.read_u8()? {
            0xff => (self.read_u64()?, 0x1_0000_0000),
            0xfe => (self.read_u32()? as u64, 0x1_0000),
            0xfd => (self.read_u16()? as u64, 0xfd),
            b => return Ok(b as u64),
        };
        if self.options.strict_compact_size && value < min {
            return Err(TxError::NonCanonicalCompactSize(value));
        }
        Ok(value)
    }

    /// Read a compact-size count and check it against what could possibly
    /// fit in the rest of the input, so a hostile prefix cannot force a huge
    /// allocation.
    pub fn read_count(&mut self, min_item_size: usize) -> Result<usize> {
        let n = self.read_compact_size()?;
        let needed = n.saturating_mul(min_item_size.max(1) as u64);
        if needed > self.remaining() as u64 {
            return Err(TxError::TruncatedInput {
                needed: usize::try_from(needed).unwrap_or(usize::MAX),
                remaining: self.remaining(),
            });
        }
        Ok(n as usize)
    }

    pub fn read_var_bytes(&mut self) -> Result<Vec<u8>> {
        let len = self.read_count(1)?;
        Ok(self.read_bytes(len)?.to_vec())
    }

    /// Fail if any input is left unread.
    pub fn finish(&self) -> Result<()> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(TxError::TrailingBytes(n)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(n: u64) -> (Vec<u8>, u64) {
        let mut out = Vec::new();
        write_compact_size(&mut out, n);
        let mut reader = Reader::new(&out);
        let back = reader.read_compact_size().unwrap();
        reader.finish().unwrap();
        (out, back)
    }

    #[test]
    fn test_compact_size_boundaries() {
        let cases: [(u64, usize); 7] = [
            (0, 1),
            (252, 1),
            (253, 3),
            (65535, 3),
            (65536, 5),
            (0xffff_ffff, 5),
            (0x1_0000_0000, 9),
        ];
        for (n, len) in cases {
            let (bytes, back) = roundtrip(n);
            assert_eq!(bytes.len(), len, "encoded length of {}", n);
            assert_eq!(compact_size_len(n), len);
            assert_eq!(back, n);
        }
    }

    #[test]
    fn test_compact_size_markers() {
        assert_eq!(roundtrip(253).0, vec![0xfd, 0xfd, 0x00]);
        assert_eq!(roundtrip(65536).0, vec![0xfe, 0x00, 0x00, 0x01, 0x00]);
        assert_eq!(roundtrip(0x1_0000_0000).0[0], 0xff);
    }

    #[test]
    fn test_non_canonical_accepted_by_default() {
        let bytes = [0xfd, 0x05, 0x00];
        let mut reader = Reader::new(&bytes);
        assert_eq!(reader.read_compact_size().unwrap(), 5);
    }

    #[test]
    fn test_non_canonical_rejected_when_strict() {
        let bytes = [0xfe, 0xff, 0x00, 0x00, 0x00];
        let mut reader = Reader::with_options(&bytes, DecodeOptions::strict());
        assert_eq!(
            reader.read_compact_size(),
            Err(TxError::NonCanonicalCompactSize(0xff))
        );

        let canonical = [0xfd, 0xfd, 0x00];
        let mut reader = Reader::with_options(&canonical, DecodeOptions::strict());
        assert_eq!(reader.read_compact_size().unwrap(), 0xfd);
    }

    #[test]
    fn test_truncated_compact_size() {
        let bytes = [0xfe, 0x01, 0x02];
        let mut reader = Reader::new(&bytes);
        assert!(matches!(
            reader.read_compact_size(),
            Err(TxError::TruncatedInput { needed: 4, remaining: 2 })
        ));
    }

    #[test]
    fn test_fixed_width_little_endian() {
        let mut out = Vec::new();
        write_u32(&mut out, 0x0403_0201);
        write_u64(&mut out, 0x0807_0605_0403_0201);
        assert_eq!(&out[..4], &[1, 2, 3, 4]);
        assert_eq!(&out[4..], &[1, 2, 3, 4, 5, 6, 7, 8]);

        let mut reader = Reader::new(&out);
        assert_eq!(reader.read_u32().unwrap(), 0x0403_0201);
        assert_eq!(reader.read_u64().unwrap(), 0x0807_0605_0403_0201);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_var_bytes_length_exceeds_input() {
        // declares 0xffff bytes, supplies 2
        let bytes = [0xfd, 0xff, 0xff, 0xaa, 0xbb];
        let mut reader = Reader::new(&bytes);
        assert!(matches!(
            reader.read_var_bytes(),
            Err(TxError::TruncatedInput { .. })
        ));
    }

    #[test]
    fn test_finish_reports_trailing() {
        let bytes = [1, 2, 3];
        let mut reader = Reader::new(&bytes);
        reader.read_u8().unwrap();
        assert_eq!(reader.finish(), Err(TxError::TrailingBytes(2)));
    }
}
