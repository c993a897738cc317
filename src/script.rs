//! Script representation: raw bytes, element parsing and construction

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::error::{Result, TxError};
use crate::interpreter::num::ScriptNum;
use crate::opcodes::Opcode;

/// Script: 𝕊 = 𝔹*
///
/// Raw bytecode. Construction never validates; parsing happens when the
/// script is iterated or executed.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Script(Vec<u8>);

/// One parsed script element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptElement<'a> {
    /// A non-data opcode, including `OP_0`, `OP_1NEGATE` and `OP_1..OP_16`.
    Op(Opcode),
    /// Bytes pushed by a direct push or `OP_PUSHDATA1/2/4`.
    Push(&'a [u8]),
}

impl Script {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        hex::decode(s)
            .map(Script)
            .map_err(|e| TxError::MalformedScript(format!("bad hex: {}", e)))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn instructions(&self) -> Instructions<'_> {
        Instructions::new(&self.0)
    }

    /// Parse the whole script, failing on the first malformed element.
    pub fn elements(&self) -> Result<Vec<ScriptElement<'_>>> {
        self.instructions().collect()
    }

    /// True when every element only pushes data.
    pub fn is_push_only(&self) -> bool {
        self.instructions().all(|el| match el {
            Ok(ScriptElement::Push(_)) => true,
            Ok(ScriptElement::Op(op)) => op.is_push(),
            Err(_) => false,
        })
    }
}

impl From<Vec<u8>> for Script {
    fn from(bytes: Vec<u8>) -> Self {
        Script(bytes)
    }
}

impl From<&[u8]> for Script {
    fn from(bytes: &[u8]) -> Self {
        Script(bytes.to_vec())
    }
}

impl AsRef<[u8]> for Script {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Script({})", self)
    }
}

/// ASM rendering: opcode names separated by spaces, pushes as hex.
impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, el) in self.instructions().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            match el {
                Ok(ScriptElement::Op(op)) => write!(f, "{}", op)?,
                Ok(ScriptElement::Push([])) => f.write_str("OP_0")?,
                Ok(ScriptElement::Push(data)) => f.write_str(&hex::encode(data))?,
                Err(e) => return write!(f, "[{}]", e),
            }
        }
        Ok(())
    }
}

impl Serialize for Script {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Script {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Script::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Iterator over the elements of a script.
///
/// Stops after the first error; a push never reads past the end of the
/// script.
pub struct Instructions<'a> {
    bytes: &'a [u8],
    pos: usize,
    failed: bool,
}

impl<'a> Instructions<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            pos: 0,
            failed: false,
        }
    }

    /// Offset of the next unread byte.
    pub fn position(&self) -> usize {
        self.pos
    }

    fn take(&mut self, n: usize, what: Opcode) -> Result<&'a [u8]> {
        let remaining = self.bytes.len() - self.pos;
        if n > remaining {
            return Err(TxError::MalformedScript(format!(
                "{} declares {} bytes, {} remaining",
                what.name(),
                n,
                remaining
            )));
        }
        let out = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    fn take_len<const N: usize>(&mut self, what: Opcode) -> Result<usize> {
        let raw = self.take(N, what)?;
        let mut buf = [0u8; 8];
        buf[..N].copy_from_slice(raw);
        usize::try_from(u64::from_le_bytes(buf))
            .map_err(|_| TxError::MalformedScript(format!("{} length overflow", what.name())))
    }

    fn next_element(&mut self) -> Result<ScriptElement<'a>> {
        let byte = self.bytes[self.pos];
        self.pos += 1;
        let op = Opcode::from_byte(byte).ok_or(TxError::UnknownOpcode(byte))?;
        let len = match op {
            Opcode::PushBytes(n) => n as usize,
            Opcode::PushData1 => self.take_len::<1>(op)?,
            Opcode::PushData2 => self.take_len::<2>(op)?,
            Opcode::PushData4 => self.take_len::<4>(op)?,
            _ => return Ok(ScriptElement::Op(op)),
        };
        Ok(ScriptElement::Push(self.take(len, op)?))
    }
}

impl<'a> Iterator for Instructions<'a> {
    type Item = Result<ScriptElement<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.bytes.len() {
            return None;
        }
        let el = self.next_element();
        self.failed = el.is_err();
        Some(el)
    }
}

/// Builds scripts using the shortest push encoding for every item.
#[derive(Debug, Default, Clone)]
pub struct ScriptBuilder(Vec<u8>);

impl ScriptBuilder {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push_opcode(mut self, op: Opcode) -> Self {
        self.0.push(op.to_byte());
        self
    }

    /// Push `data`, preferring `OP_0`/`OP_1NEGATE`/`OP_1..OP_16` for the
    /// values they represent.
    pub fn push_slice(mut self, data: &[u8]) -> Self {
        match data {
            [] => self.0.push(Opcode::Zero.to_byte()),
            [n @ 1..=16] => self.0.push(Opcode::PushNum(*n).to_byte()),
            [0x81] => self.0.push(Opcode::OneNegate.to_byte()),
            _ => {
                let len = data.len();
                if len <= 0x4b {
                    self.0.push(len as u8);
                } else if len <= 0xff {
                    self.0.push(Opcode::PushData1.to_byte());
                    self.0.push(len as u8);
                } else if len <= 0xffff {
                    self.0.push(Opcode::PushData2.to_byte());
                    self.0.extend_from_slice(&(len as u16).to_le_bytes());
                } else {
                    self.0.push(Opcode::PushData4.to_byte());
                    self.0.extend_from_slice(&(len as u32).to_le_bytes());
                }
                self.0.extend_from_slice(data);
            }
        }
        self
    }

    pub fn push_int(self, n: i64) -> Self {
        self.push_slice(&ScriptNum::encode(n))
    }

    pub fn into_script(self) -> Script {
        Script(self.0)
    }
}
