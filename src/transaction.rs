//! Transactions: immutable values, construction, wire codec and validation

use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::debug;

use crate::codec::{
    compact_size_len, write_compact_size, write_u32, Decodable, Encodable, Reader,
};
use crate::coinbase::coinbase_parts;
use crate::config::ScriptConfig;
use crate::constants::*;
use crate::error::{Result, TxError};
use crate::interpreter::verify_script;
use crate::keys::{self, KeyPair};
use crate::script::Script;
use crate::sighash::{signature_hash, TransactionChecker};
use crate::templates::{p2pkh_lock, p2pkh_pubkey_hash, p2pkh_unlock};
use crate::types::*;

const LOG_TARGET: &str = "bitcointx::transaction";

/// Smallest possible encoded input: outpoint, empty script, sequence.
const MIN_INPUT_SIZE: usize = 32 + 4 + 1 + 4;
/// Smallest possible encoded output: value and empty script.
const MIN_OUTPUT_SIZE: usize = 8 + 1;

/// Transaction: 𝒯𝒳 = ℕ₃₂ × ℐ* × 𝒯* × ℕ₃₂
///
/// Fields are private and there are no setters, so the cached hash can never
/// go stale. Equality ignores the cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    version: u32,
    inputs: Vec<Input>,
    outputs: Vec<Output>,
    lock_time: u32,
    #[serde(skip)]
    hash: OnceLock<HashDigest>,
}

impl PartialEq for Transaction {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version
            && self.inputs == other.inputs
            && self.outputs == other.outputs
            && self.lock_time == other.lock_time
    }
}

impl Eq for Transaction {}

impl Transaction {
    /// Assemble a transaction from already-final parts.
    ///
    /// Use [`TransactionBuilder`] to sign inputs.
    pub fn new(version: u32, inputs: Vec<Input>, outputs: Vec<Output>, lock_time: u32) -> Self {
        Self {
            version,
            inputs,
            outputs,
            lock_time,
            hash: OnceLock::new(),
        }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn inputs(&self) -> &[Input] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    pub fn lock_time(&self) -> u32 {
        self.lock_time
    }

    /// Single SHA-256 of the wire encoding, computed once.
    pub fn hash(&self) -> HashDigest {
        *self.hash.get_or_init(|| {
            let hash = HashDigest(keys::sha256(&self.to_bytes()));
            debug!(target: LOG_TARGET, %hash, "computed transaction hash");
            hash
        })
    }

    /// Outpoint naming output `index` of this transaction.
    pub fn outpoint(&self, index: u32) -> OutPoint {
        OutPoint::new(self.hash(), index)
    }

    /// Encoded size in bytes, without encoding.
    pub fn size(&self) -> usize {
        let script_len = |s: &Script| compact_size_len(s.len() as u64) + s.len();
        let inputs: usize = self
            .inputs
            .iter()
            .map(|i| 36 + script_len(&i.unlocking_script) + 4)
            .sum();
        let outputs: usize = self
            .outputs
            .iter()
            .map(|o| 8 + script_len(&o.locking_script))
            .sum();
        4 + compact_size_len(self.inputs.len() as u64)
            + inputs
            + compact_size_len(self.outputs.len() as u64)
            + outputs
            + 4
    }

    pub fn is_coinbase(&self) -> bool {
        is_coinbase(self)
    }

    /// Σₒ o.value, failing on overflow.
    pub fn total_output_value(&self) -> Result<u64> {
        sum_values(self.outputs.iter().map(|o| o.value), "output")
    }
}

impl Encodable for Transaction {
    fn encode(&self, out: &mut Vec<u8>) {
        write_u32(out, self.version);
        write_compact_size(out, self.inputs.len() as u64);
        for input in &self.inputs {
            input.encode(out);
        }
        write_compact_size(out, self.outputs.len() as u64);
        for output in &self.outputs {
            output.encode(out);
        }
        write_u32(out, self.lock_time);
    }
}

impl Decodable for Transaction {
    fn decode(reader: &mut Reader<'_>) -> Result<Self> {
        let version = reader.read_u32()?;
        let n_inputs = reader.read_count(MIN_INPUT_SIZE)?;
        let inputs = (0..n_inputs)
            .map(|_| Input::decode(reader))
            .collect::<Result<Vec<_>>>()?;
        let n_outputs = reader.read_count(MIN_OUTPUT_SIZE)?;
        let outputs = (0..n_outputs)
            .map(|_| Output::decode(reader))
            .collect::<Result<Vec<_>>>()?;
        let lock_time = reader.read_u32()?;
        Ok(Self::new(version, inputs, outputs, lock_time))
    }
}

fn sum_values(values: impl Iterator<Item = u64>, what: &str) -> Result<u64> {
    values.enumerate().try_fold(0u64, |acc, (i, v)| {
        acc.checked_add(v)
            .ok_or_else(|| TxError::ValueOverflow(format!("{} sum overflows at index {}", what, i)))
    })
}

/// An input waiting to be signed: what it spends and the key that may
/// spend it.
#[derive(Debug, Clone)]
pub struct UnsignedInput {
    pub outpoint: OutPoint,
    pub spent_output: Output,
    pub key_pair: KeyPair,
    pub sequence: u32,
}

impl UnsignedInput {
    pub fn new(outpoint: OutPoint, spent_output: Output, key_pair: KeyPair) -> Self {
        Self {
            outpoint,
            spent_output,
            key_pair,
            sequence: SEQUENCE_FINAL,
        }
    }

    pub fn with_sequence(mut self, sequence: u32) -> Self {
        self.sequence = sequence;
        self
    }
}

/// Collects inputs and outputs, then signs every input and yields an
/// immutable [`Transaction`].
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    version: u32,
    lock_time: u32,
    inputs: Vec<UnsignedInput>,
    outputs: Vec<Output>,
}

impl Default for TransactionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionBuilder {
    pub fn new() -> Self {
        Self {
            version: TX_VERSION,
            lock_time: 0,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    pub fn lock_time(mut self, lock_time: u32) -> Self {
        self.lock_time = lock_time;
        self
    }

    pub fn add_input(mut self, input: UnsignedInput) -> Self {
        self.inputs.push(input);
        self
    }

    pub fn add_output(mut self, output: Output) -> Self {
        self.outputs.push(output);
        self
    }

    /// Add a P2PKH output.
    pub fn pay_to(self, value: u64, pubkey_hash: &PubKeyHash) -> Self {
        self.add_output(Output::new(value, p2pkh_lock(pubkey_hash)))
    }

    /// Sign every input, then freeze the transaction.
    ///
    /// Each signature covers the preimage built from the spent outputs and
    /// the final outputs, with the spent locking script as script code.
    pub fn build(self) -> Result<Transaction> {
        if self.inputs.is_empty() || self.outputs.is_empty() {
            return Err(TxError::MalformedTransaction(
                "transaction needs at least one input and one output".to_string(),
            ));
        }
        let total_out = sum_values(self.outputs.iter().map(|o| o.value), "output")?;

        let spent_outputs: Vec<Output> =
            self.inputs.iter().map(|i| i.spent_output.clone()).collect();
        let total_in = sum_values(spent_outputs.iter().map(|o| o.value), "input")?;
        if total_in < total_out {
            return Err(TxError::MalformedTransaction(format!(
                "outputs total {} but inputs only {}",
                total_out, total_in
            )));
        }

        let mut inputs = Vec::with_capacity(self.inputs.len());
        for (index, unsigned) in self.inputs.iter().enumerate() {
            if unsigned.outpoint.is_coinbase() {
                return Err(TxError::InvalidOutpoint(format!(
                    "input {} spends the coinbase sentinel",
                    index
                )));
            }
            let lock = &unsigned.spent_output.locking_script;
            if let Some(expected) = p2pkh_pubkey_hash(lock) {
                if expected != unsigned.key_pair.pubkey_hash() {
                    return Err(TxError::InvalidKey(format!(
                        "key for input {} does not match the spent output",
                        index
                    )));
                }
            }

            let digest = signature_hash(
                self.version,
                self.lock_time,
                &spent_outputs,
                &self.outputs,
                lock.as_bytes(),
            );
            let signature = unsigned.key_pair.sign(&digest);
            let unlocking_script =
                p2pkh_unlock(&signature, &unsigned.key_pair.public_key_bytes());
            inputs.push(Input::new(unsigned.outpoint, unlocking_script, unsigned.sequence));
        }

        let tx = Transaction::new(self.version, inputs, self.outputs, self.lock_time);
        debug!(
            target: LOG_TARGET,
            hash = %tx.hash(),
            inputs = tx.inputs().len(),
            outputs = tx.outputs().len(),
            "built transaction"
        );
        Ok(tx)
    }
}

/// CheckTransaction: 𝒯𝒳 → {valid, invalid}
///
/// A transaction tx = (v, ins, outs, lt) is valid if and only if:
/// 1. |ins| > 0 ∧ |outs| > 0
/// 2. ∀o ∈ outs: o.value ≤ M_max, and Σ o.value ≤ M_max
/// 3. |ins| ≤ M_max_inputs
/// 4. |outs| ≤ M_max_outputs
/// 5. |tx| ≤ M_max_tx_size
/// 6. a coinbase has one output, a final sequence and a bounded payload;
///    elsewhere the sentinel never appears
pub fn check_transaction(tx: &Transaction) -> Result<ValidationResult> {
    // 1. Check inputs and outputs are not empty
    if tx.inputs.is_empty() || tx.outputs.is_empty() {
        return Ok(ValidationResult::Invalid(
            "Empty inputs or outputs".to_string(),
        ));
    }

    // 2. Check output values are valid
    for (i, output) in tx.outputs.iter().enumerate() {
        if output.value > MAX_MONEY {
            return Ok(ValidationResult::Invalid(format!(
                "Invalid output value {} at index {}",
                output.value, i
            )));
        }
    }
    let total_output_value = tx.total_output_value()?;
    if total_output_value > MAX_MONEY {
        return Ok(ValidationResult::Invalid(format!(
            "Total output value {} exceeds maximum",
            total_output_value
        )));
    }

    // 3. Check input count limit
    if tx.inputs.len() > MAX_INPUTS {
        return Ok(ValidationResult::Invalid(format!(
            "Too many inputs: {}",
            tx.inputs.len()
        )));
    }

    // 4. Check output count limit
    if tx.outputs.len() > MAX_OUTPUTS {
        return Ok(ValidationResult::Invalid(format!(
            "Too many outputs: {}",
            tx.outputs.len()
        )));
    }

    // 5. Check transaction size limit
    let tx_size = tx.size();
    if tx_size > MAX_TX_SIZE {
        return Ok(ValidationResult::Invalid(format!(
            "Transaction too large: {} bytes",
            tx_size
        )));
    }

    // 6. Coinbase shape, or no sentinel outpoint at all
    if tx.is_coinbase() {
        match coinbase_parts(tx) {
            Ok(_) => {}
            Err(TxError::MalformedTransaction(reason)) => {
                return Ok(ValidationResult::Invalid(reason))
            }
            Err(e) => return Err(e),
        }
    } else {
        check_no_sentinel(tx)?;
    }

    Ok(ValidationResult::Valid)
}

fn check_no_sentinel(tx: &Transaction) -> Result<()> {
    match tx.inputs.iter().position(|i| i.outpoint.is_coinbase()) {
        Some(i) => Err(TxError::InvalidOutpoint(format!(
            "input {} uses the coinbase sentinel in a non-coinbase transaction",
            i
        ))),
        None => Ok(()),
    }
}

/// Look up the output spent by every input.
pub fn resolve_spent_outputs<R: OutputResolver + ?Sized>(
    tx: &Transaction,
    resolver: &R,
) -> Result<Vec<Output>> {
    tx.inputs
        .iter()
        .enumerate()
        .map(|(i, input)| {
            resolver
                .resolve(&input.outpoint)
                .ok_or(TxError::MissingOutput(i))
        })
        .collect()
}

/// CheckTxInputs: 𝒯𝒳 × 𝒰𝒮 → {valid, invalid} × ℕ
///
/// For transaction tx with resolver us:
/// 1. If tx is a well-formed coinbase: return (valid, 0)
/// 2. Let total_in = Σᵢ us(i.outpoint).value
/// 3. Let total_out = Σₒ o.value
/// 4. If total_in < total_out: return (invalid, 0)
/// 5. Return (valid, total_in - total_out)
pub fn check_tx_inputs<R: OutputResolver + ?Sized>(
    tx: &Transaction,
    resolver: &R,
) -> Result<(ValidationResult, u64)> {
    if tx.is_coinbase() {
        coinbase_parts(tx)?;
        return Ok((ValidationResult::Valid, 0));
    }
    check_no_sentinel(tx)?;

    let spent = resolve_spent_outputs(tx, resolver)?;
    let total_input_value = sum_values(spent.iter().map(|o| o.value), "input")?;
    let total_output_value = tx.total_output_value()?;

    if total_input_value < total_output_value {
        return Ok((
            ValidationResult::Invalid("Insufficient input value".to_string()),
            0,
        ));
    }

    Ok((ValidationResult::Valid, total_input_value - total_output_value))
}

/// Run the unlocking script of input `index` against the locking script of
/// the output it spends.
///
/// `spent_outputs` must hold the spent output of every input, in input
/// order, because each signature commits to all of them.
pub fn verify_input(
    tx: &Transaction,
    index: usize,
    spent_outputs: &[Output],
    config: &ScriptConfig,
) -> Result<()> {
    let input = tx.inputs.get(index).ok_or_else(|| {
        TxError::MalformedTransaction(format!("no input at index {}", index))
    })?;
    if spent_outputs.len() != tx.inputs.len() {
        return Err(TxError::MalformedTransaction(format!(
            "{} spent outputs for {} inputs",
            spent_outputs.len(),
            tx.inputs.len()
        )));
    }
    if input.outpoint.is_coinbase() {
        return Err(TxError::InvalidOutpoint(format!(
            "input {} carries the coinbase sentinel",
            index
        )));
    }

    let checker = TransactionChecker::new(tx, spent_outputs, index);
    let result = verify_script(
        &input.unlocking_script,
        &spent_outputs[index].locking_script,
        &checker,
        config,
    );
    if let Err(e) = &result {
        debug!(target: LOG_TARGET, tx = %tx.hash(), input = index, error = %e, "input rejected");
    }
    result
}

/// Verify every input of `tx`. A well-formed coinbase has nothing to
/// verify.
pub fn verify_transaction_inputs<R: OutputResolver + ?Sized>(
    tx: &Transaction,
    resolver: &R,
    config: &ScriptConfig,
) -> Result<()> {
    if tx.is_coinbase() {
        coinbase_parts(tx)?;
        return Ok(());
    }
    check_no_sentinel(tx)?;
    let spent = resolve_spent_outputs(tx, resolver)?;
    for index in 0..tx.inputs.len() {
        verify_input(tx, index, &spent, config)?;
    }
    Ok(())
}

/// Check if transaction is coinbase
pub fn is_coinbase(tx: &Transaction) -> bool {
    tx.inputs.len() == 1 && tx.inputs[0].outpoint.is_coinbase()
}
