//! Error types for transaction decoding, script execution and signing

use thiserror::Error;

/// Every failure the crate reports.
///
/// All variants are recoverable validation outcomes: the caller decides
/// whether to reject the transaction, the block, or nothing at all.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TxError {
    #[error("truncated input: needed {needed} bytes, {remaining} remaining")]
    TruncatedInput { needed: usize, remaining: usize },

    #[error("non-canonical compact size encoding of {0}")]
    NonCanonicalCompactSize(u64),

    #[error("{0} trailing bytes after decoded value")]
    TrailingBytes(usize),

    #[error("malformed script: {0}")]
    MalformedScript(String),

    #[error("unknown opcode 0x{0:02x}")]
    UnknownOpcode(u8),

    #[error("attempt to execute disabled opcode {0}")]
    DisabledOpcode(&'static str),

    #[error("stack underflow: {op} needs {needed} items, stack has {depth}")]
    StackUnderflow {
        op: &'static str,
        needed: usize,
        depth: usize,
    },

    #[error("numeric overflow: {0}")]
    NumericOverflow(String),

    #[error("script validation failed: {0}")]
    ScriptValidationFailed(String),

    #[error("script resource limit exceeded: {0}")]
    ResourceLimit(String),

    #[error("invalid signature: {0}")]
    SignatureInvalid(String),

    #[error("invalid outpoint: {0}")]
    InvalidOutpoint(String),

    #[error("value overflow: {0}")]
    ValueOverflow(String),

    #[error("malformed transaction: {0}")]
    MalformedTransaction(String),

    #[error("spent output not found for input {0}")]
    MissingOutput(usize),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, TxError>;
