//! # bitcointx
//!
//! Bitcoin-style transactions: canonical wire encoding, locking and
//! unlocking scripts, and the signature-hash protocol that proves the right
//! to spend a referenced output.
//!
//! ## Architecture
//!
//! The crate is layered bottom-up:
//! - Codec primitives (little-endian integers, compact sizes)
//! - Scripts and the script virtual machine
//! - Outpoints, outputs, inputs and transactions
//! - Signature hashing, signing and verification
//! - Coinbase transactions
//!
//! ## Design Principles
//!
//! 1. **Immutable Transactions**: built once through [`TransactionBuilder`], never mutated
//! 2. **Validation as Values**: malformed input is reported as [`TxError`], never a panic
//! 3. **Exact Version Pinning**: all cryptographic dependencies pinned to exact versions
//! 4. **No Ledger State**: spent outputs are supplied through [`OutputResolver`]
//!
//! ## Usage
//!
//! ```rust
//! use bitcointx::{HashDigest, KeyPair, OutPoint, Output};
//! use bitcointx::{TransactionBuilder, UnsignedInput, UtxoSet};
//! use bitcointx::templates::p2pkh_lock;
//! use bitcointx::TxValidator;
//!
//! let alice = KeyPair::from_secret_bytes(&[0x11; 32]).unwrap();
//! let bob = KeyPair::from_secret_bytes(&[0x22; 32]).unwrap();
//!
//! let funding = OutPoint::new(HashDigest([0x42; 32]), 0);
//! let spent = Output::new(5000, p2pkh_lock(&alice.pubkey_hash()));
//!
//! let tx = TransactionBuilder::new()
//!     .add_input(UnsignedInput::new(funding, spent.clone(), alice))
//!     .pay_to(4900, &bob.pubkey_hash())
//!     .build()
//!     .unwrap();
//!
//! let mut utxos = UtxoSet::new();
//! utxos.insert(funding, spent);
//!
//! let validator = TxValidator::new();
//! validator.verify_transaction_inputs(&tx, &utxos).unwrap();
//! ```

pub mod address;
pub mod codec;
pub mod coinbase;
pub mod config;
pub mod constants;
pub mod error;
pub mod interpreter;
pub mod keys;
pub mod opcodes;
pub mod script;
pub mod sighash;
pub mod templates;
pub mod transaction;
pub mod types;

// Re-export commonly used types
pub use codec::{Decodable, Encodable};
pub use coinbase::CoinbaseTransaction;
pub use config::{DecodeOptions, ScriptConfig};
pub use constants::*;
pub use error::{Result, TxError};
pub use keys::KeyPair;
pub use script::{Script, ScriptBuilder};
pub use transaction::{Transaction, TransactionBuilder, UnsignedInput};
pub use types::*;

/// Entry point bundling the script limits and decoding policy
///
/// # Examples
///
/// ```
/// use bitcointx::{Script, TxValidator};
///
/// let validator = TxValidator::new();
///
/// // unlocking: OP_1, locking: OP_1 OP_EQUAL
/// let unlocking = Script::from(vec![0x51]);
/// let locking = Script::from(vec![0x51, 0x87]);
///
/// assert!(validator.verify_script(&unlocking, &locking).is_ok());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TxValidator {
    script_config: ScriptConfig,
    decode_options: DecodeOptions,
}

impl TxValidator {
    /// Create a validator with the default limits and permissive decoding
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a validator with explicit limits
    ///
    /// # Examples
    ///
    /// ```
    /// use bitcointx::{DecodeOptions, ScriptConfig, TxValidator};
    ///
    /// let config = ScriptConfig::from_json(r#"{"max_ops": 100}"#).unwrap();
    /// let validator = TxValidator::with_config(config, DecodeOptions::strict()).unwrap();
    /// assert_eq!(validator.script_config().max_ops, 100);
    /// ```
    pub fn with_config(
        script_config: ScriptConfig,
        decode_options: DecodeOptions,
    ) -> Result<Self> {
        script_config.validate()?;
        Ok(Self {
            script_config,
            decode_options,
        })
    }

    pub fn script_config(&self) -> &ScriptConfig {
        &self.script_config
    }

    pub fn decode_options(&self) -> DecodeOptions {
        self.decode_options
    }

    /// Decode a transaction under this validator's decoding policy
    pub fn decode_transaction(&self, bytes: &[u8]) -> Result<Transaction> {
        Transaction::from_bytes_with(bytes, self.decode_options)
    }

    /// Decode a coinbase transaction under this validator's decoding policy
    pub fn decode_coinbase(&self, bytes: &[u8]) -> Result<CoinbaseTransaction> {
        CoinbaseTransaction::from_bytes_with(bytes, self.decode_options)
    }

    /// Structural checks that need no spent outputs
    ///
    /// # Examples
    ///
    /// ```
    /// use bitcointx::*;
    ///
    /// let validator = TxValidator::new();
    /// let tx = Transaction::new(
    ///     1,
    ///     vec![Input::new(OutPoint::new(HashDigest([1; 32]), 0), Script::new(), SEQUENCE_FINAL)],
    ///     vec![Output::new(1000, Script::from(vec![0x51]))],
    ///     0,
    /// );
    /// assert_eq!(validator.validate_transaction(&tx).unwrap(), ValidationResult::Valid);
    /// ```
    pub fn validate_transaction(&self, tx: &Transaction) -> Result<ValidationResult> {
        transaction::check_transaction(tx)
    }

    /// Value balance against the spent outputs, returning the fee
    pub fn validate_tx_inputs<R: OutputResolver + ?Sized>(
        &self,
        tx: &Transaction,
        resolver: &R,
    ) -> Result<(ValidationResult, u64)> {
        transaction::check_tx_inputs(tx, resolver)
    }

    /// Run an unlocking/locking script pair with no transaction context;
    /// signature checks always fail.
    pub fn verify_script(&self, unlocking: &Script, locking: &Script) -> Result<()> {
        interpreter::verify_script(
            unlocking,
            locking,
            &interpreter::NoSignatureChecker,
            &self.script_config,
        )
    }

    /// Verify one input against the outputs spent by all inputs
    pub fn verify_input(
        &self,
        tx: &Transaction,
        index: usize,
        spent_outputs: &[Output],
    ) -> Result<()> {
        transaction::verify_input(tx, index, spent_outputs, &self.script_config)
    }

    /// Verify every input, resolving spent outputs through `resolver`
    pub fn verify_transaction_inputs<R: OutputResolver + ?Sized>(
        &self,
        tx: &Transaction,
        resolver: &R,
    ) -> Result<()> {
        transaction::verify_transaction_inputs(tx, resolver, &self.script_config)
    }

    /// Structural, value and script checks in one call, returning the fee
    pub fn validate_spend<R: OutputResolver + ?Sized>(
        &self,
        tx: &Transaction,
        resolver: &R,
    ) -> Result<u64> {
        if let ValidationResult::Invalid(reason) = self.validate_transaction(tx)? {
            return Err(TxError::MalformedTransaction(reason));
        }
        let (result, fee) = self.validate_tx_inputs(tx, resolver)?;
        if let ValidationResult::Invalid(reason) = result {
            return Err(TxError::MalformedTransaction(reason));
        }
        self.verify_transaction_inputs(tx, resolver)?;
        Ok(fee)
    }
}
