//! Base58Check pay-to-public-key-hash addresses.
//!
//! Payload is the version byte `0x00` followed by the 20-byte key hash.

use std::fmt;
use std::str::FromStr;

use crate::constants::{P2PKH_ADDRESS_VERSION, PUBKEY_HASH_SIZE};
use crate::error::{Result, TxError};
use crate::types::PubKeyHash;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address {
    pub pubkey_hash: PubKeyHash,
}

impl Address {
    pub fn new(pubkey_hash: PubKeyHash) -> Self {
        Self { pubkey_hash }
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Address")
            .field("pubkey_hash", &hex::encode(self.pubkey_hash))
            .finish()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut payload = Vec::with_capacity(1 + PUBKEY_HASH_SIZE);
        payload.push(P2PKH_ADDRESS_VERSION);
        payload.extend_from_slice(&self.pubkey_hash);
        f.write_str(&bs58::encode(payload).with_check().into_string())
    }
}

impl FromStr for Address {
    type Err = TxError;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = bs58::decode(s)
            .with_check(None)
            .into_vec()
            .map_err(|e| TxError::InvalidAddress(format!("{}: {}", s, e)))?;
        match bytes.split_first() {
            Some((&P2PKH_ADDRESS_VERSION, hash)) if hash.len() == PUBKEY_HASH_SIZE => {
                let mut pubkey_hash = [0u8; PUBKEY_HASH_SIZE];
                pubkey_hash.copy_from_slice(hash);
                Ok(Self { pubkey_hash })
            }
            Some((&version, hash)) => Err(TxError::InvalidAddress(format!(
                "unsupported version 0x{:02x} with {}-byte payload",
                version,
                hash.len()
            ))),
            None => Err(TxError::InvalidAddress("empty payload".to_string())),
        }
    }
}

/// Public key hash carried by a Base58Check address.
pub fn decode_address(text: &str) -> Result<PubKeyHash> {
    Ok(text.parse::<Address>()?.pubkey_hash)
}

pub fn encode_address(pubkey_hash: &PubKeyHash) -> String {
    Address::new(*pubkey_hash).to_string()
}
