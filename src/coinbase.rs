//! Coinbase transactions
//!
//! One input spending the sentinel outpoint, whose script field carries the
//! block height (u32 LE) plus optional extra bytes, and one output paying
//! the reward. The payload is data, never executed.

use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::debug;

use crate::codec::{Decodable, Encodable, Reader};
use crate::constants::*;
use crate::error::{Result, TxError};
use crate::keys;
use crate::script::Script;
use crate::templates::{p2pkh_lock, p2pkh_lock_from_address};
use crate::transaction::Transaction;
use crate::types::*;

const LOG_TARGET: &str = "bitcointx::coinbase";

/// Serialized in the general transaction form; deserializing re-checks the
/// coinbase shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "Transaction", into = "Transaction")]
pub struct CoinbaseTransaction {
    version: u32,
    payload: Vec<u8>,
    output: Output,
    lock_time: u32,
    hash: OnceLock<HashDigest>,
}

impl PartialEq for CoinbaseTransaction {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version
            && self.payload == other.payload
            && self.output == other.output
            && self.lock_time == other.lock_time
    }
}

impl Eq for CoinbaseTransaction {}

impl CoinbaseTransaction {
    /// Pay `reward` to a P2PKH lock on `pubkey_hash` at `height`.
    pub fn new(height: u32, reward: u64, pubkey_hash: &PubKeyHash) -> Self {
        Self::from_parts(
            COINBASE_VERSION,
            height.to_le_bytes().to_vec(),
            Output::new(reward, p2pkh_lock(pubkey_hash)),
            0,
        )
    }

    /// Pay `reward` to a Base58Check address at `height`.
    pub fn pay_to_address(height: u32, reward: u64, address: &str) -> Result<Self> {
        Ok(Self::from_parts(
            COINBASE_VERSION,
            height.to_le_bytes().to_vec(),
            Output::new(reward, p2pkh_lock_from_address(address)?),
            0,
        ))
    }

    /// Coinbase whose payload carries `extra` after the height.
    pub fn with_extra(height: u32, extra: &[u8], output: Output) -> Result<Self> {
        let mut payload = height.to_le_bytes().to_vec();
        payload.extend_from_slice(extra);
        check_payload(&payload)?;
        Ok(Self::from_parts(COINBASE_VERSION, payload, output, 0))
    }

    fn from_parts(version: u32, payload: Vec<u8>, output: Output, lock_time: u32) -> Self {
        Self {
            version,
            payload,
            output,
            lock_time,
            hash: OnceLock::new(),
        }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn lock_time(&self) -> u32 {
        self.lock_time
    }

    /// Always the sentinel outpoint.
    pub fn outpoint(&self) -> OutPoint {
        OutPoint::coinbase()
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn output(&self) -> &Output {
        &self.output
    }

    pub fn height(&self) -> u32 {
        let mut height = [0u8; 4];
        height.copy_from_slice(&self.payload[..MIN_COINBASE_PAYLOAD_SIZE]);
        u32::from_le_bytes(height)
    }

    /// Single SHA-256 of the wire encoding, computed once.
    pub fn hash(&self) -> HashDigest {
        *self.hash.get_or_init(|| {
            let hash = HashDigest(keys::sha256(&self.to_bytes()));
            debug!(target: LOG_TARGET, %hash, height = self.height(), "computed coinbase hash");
            hash
        })
    }

    /// The same transaction in its general form.
    pub fn to_transaction(&self) -> Transaction {
        Transaction::new(
            self.version,
            vec![Input::new(
                OutPoint::coinbase(),
                Script::from(self.payload.clone()),
                SEQUENCE_FINAL,
            )],
            vec![self.output.clone()],
            self.lock_time,
        )
    }
}

fn check_payload(payload: &[u8]) -> Result<()> {
    if !(MIN_COINBASE_PAYLOAD_SIZE..=MAX_COINBASE_PAYLOAD_SIZE).contains(&payload.len()) {
        return Err(TxError::MalformedTransaction(format!(
            "coinbase payload of {} bytes outside {}..={}",
            payload.len(),
            MIN_COINBASE_PAYLOAD_SIZE,
            MAX_COINBASE_PAYLOAD_SIZE
        )));
    }
    Ok(())
}

/// The sole input and output of `tx`, if it is a well-formed coinbase.
///
/// Shape, sequence and payload violations are `MalformedTransaction`; an
/// input other than the sentinel is `InvalidOutpoint`.
pub(crate) fn coinbase_parts(tx: &Transaction) -> Result<(&Input, &Output)> {
    let (input, output) = match (tx.inputs(), tx.outputs()) {
        ([input], [output]) => (input, output),
        (ins, outs) => {
            return Err(TxError::MalformedTransaction(format!(
                "coinbase needs one input and one output, got {} and {}",
                ins.len(),
                outs.len()
            )))
        }
    };
    if !input.outpoint.is_coinbase() {
        return Err(TxError::InvalidOutpoint(format!(
            "coinbase input spends {}",
            input.outpoint
        )));
    }
    if input.sequence != SEQUENCE_FINAL {
        return Err(TxError::MalformedTransaction(format!(
            "coinbase sequence 0x{:08x}",
            input.sequence
        )));
    }
    check_payload(input.unlocking_script.as_bytes())?;
    Ok((input, output))
}

impl TryFrom<Transaction> for CoinbaseTransaction {
    type Error = TxError;

    fn try_from(tx: Transaction) -> Result<Self> {
        let (input, output) = coinbase_parts(&tx)?;
        Ok(Self::from_parts(
            tx.version(),
            input.unlocking_script.as_bytes().to_vec(),
            output.clone(),
            tx.lock_time(),
        ))
    }
}

impl From<CoinbaseTransaction> for Transaction {
    fn from(cb: CoinbaseTransaction) -> Self {
        cb.to_transaction()
    }
}

impl Encodable for CoinbaseTransaction {
    fn encode(&self, out: &mut Vec<u8>) {
        self.to_transaction().encode(out);
    }
}

impl Decodable for CoinbaseTransaction {
    fn decode(reader: &mut Reader<'_>) -> Result<Self> {
        Self::try_from(Transaction::decode(reader)?)
    }
}
