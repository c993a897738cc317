//! Value records shared by transactions, the signer and the interpreter

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::codec::{write_u32, write_u64, write_var_bytes, Decodable, Encodable, Reader};
use crate::constants::*;
use crate::error::{Result, TxError};
use crate::script::Script;

/// 20-byte HASH160 of a compressed public key
pub type PubKeyHash = [u8; PUBKEY_HASH_SIZE];

/// HashDigest: 32-byte content address
///
/// Displays and parses as lowercase hex in byte order.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HashDigest(pub [u8; 32]);

impl HashDigest {
    pub const ZERO: HashDigest = HashDigest([0u8; 32]);

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl From<[u8; 32]> for HashDigest {
    fn from(bytes: [u8; 32]) -> Self {
        HashDigest(bytes)
    }
}

impl fmt::Display for HashDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for HashDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HashDigest({})", self)
    }
}

impl FromStr for HashDigest {
    type Err = TxError;

    fn from_str(s: &str) -> Result<Self> {
        let mut out = [0u8; 32];
        hex::decode_to_slice(s, &mut out)
            .map_err(|e| TxError::MalformedTransaction(format!("bad hash digest {:?}: {}", s, e)))?;
        Ok(HashDigest(out))
    }
}

impl Serialize for HashDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for HashDigest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// OutPoint: 𝒪 = ℍ × ℕ₃₂
///
/// The pair (all-zero hash, `0xffffffff`) is the coinbase sentinel and
/// never names a real output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    pub tx_hash: HashDigest,
    pub index: u32,
}

impl OutPoint {
    pub fn new(tx_hash: HashDigest, index: u32) -> Self {
        Self { tx_hash, index }
    }

    pub fn coinbase() -> Self {
        Self {
            tx_hash: HashDigest::ZERO,
            index: COINBASE_OUTPUT_INDEX,
        }
    }

    pub fn is_coinbase(&self) -> bool {
        self.tx_hash.is_zero() && self.index == COINBASE_OUTPUT_INDEX
    }
}

impl fmt::Display for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tx_hash, self.index)
    }
}

impl Encodable for OutPoint {
    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.tx_hash.0);
        write_u32(out, self.index);
    }
}

impl Decodable for OutPoint {
    fn decode(reader: &mut Reader<'_>) -> Result<Self> {
        let tx_hash = HashDigest(reader.read_array()?);
        let index = reader.read_u32()?;
        Ok(Self { tx_hash, index })
    }
}

/// Output: 𝒯 = ℕ₆₄ × 𝕊
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Output {
    pub value: u64,
    pub locking_script: Script,
}

impl Output {
    pub fn new(value: u64, locking_script: Script) -> Self {
        Self {
            value,
            locking_script,
        }
    }
}

impl Encodable for Output {
    fn encode(&self, out: &mut Vec<u8>) {
        write_u64(out, self.value);
        write_var_bytes(out, self.locking_script.as_bytes());
    }
}

impl Decodable for Output {
    fn decode(reader: &mut Reader<'_>) -> Result<Self> {
        let value = reader.read_u64()?;
        let locking_script = Script::from(reader.read_var_bytes()?);
        Ok(Self {
            value,
            locking_script,
        })
    }
}

/// Input: ℐ = 𝒪 × 𝕊 × ℕ₃₂
///
/// Only the wire fields. Signing material lives on the builder side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Input {
    pub outpoint: OutPoint,
    pub unlocking_script: Script,
    pub sequence: u32,
}

impl Input {
    pub fn new(outpoint: OutPoint, unlocking_script: Script, sequence: u32) -> Self {
        Self {
            outpoint,
            unlocking_script,
            sequence,
        }
    }
}

impl Encodable for Input {
    fn encode(&self, out: &mut Vec<u8>) {
        self.outpoint.encode(out);
        write_var_bytes(out, self.unlocking_script.as_bytes());
        write_u32(out, self.sequence);
    }
}

impl Decodable for Input {
    fn decode(reader: &mut Reader<'_>) -> Result<Self> {
        let outpoint = OutPoint::decode(reader)?;
        let unlocking_script = Script::from(reader.read_var_bytes()?);
        let sequence = reader.read_u32()?;
        Ok(Self {
            outpoint,
            unlocking_script,
            sequence,
        })
    }
}

/// Lookup capability for previously created outputs.
///
/// Validation borrows a resolver for the duration of one call and never
/// keeps the resolved outputs.
pub trait OutputResolver {
    fn resolve(&self, outpoint: &OutPoint) -> Option<Output>;
}

/// UTXO Set: 𝒰𝒮 = 𝒪 → 𝒯
pub type UtxoSet = HashMap<OutPoint, Output>;

impl OutputResolver for UtxoSet {
    fn resolve(&self, outpoint: &OutPoint) -> Option<Output> {
        self.get(outpoint).cloned()
    }
}

impl<R: OutputResolver + ?Sized> OutputResolver for &R {
    fn resolve(&self, outpoint: &OutPoint) -> Option<Output> {
        (**self).resolve(outpoint)
    }
}

/// Validation result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    Invalid(String),
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }
}
