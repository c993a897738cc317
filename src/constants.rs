//! Transaction and script constants

/// Maximum money supply: 21,000,000 BTC in satoshis
pub const MAX_MONEY: u64 = 21_000_000 * 100_000_000;

/// Satoshis per BTC
pub const SATOSHIS_PER_BTC: u64 = 100_000_000;

/// Initial block subsidy: 50 BTC
pub const INITIAL_SUBSIDY: u64 = 50 * SATOSHIS_PER_BTC;

/// Maximum number of inputs per transaction
pub const MAX_INPUTS: usize = 1000;

/// Maximum number of outputs per transaction
pub const MAX_OUTPUTS: usize = 1000;

/// Maximum serialized transaction size: 1MB
pub const MAX_TX_SIZE: usize = 1_000_000;

/// Maximum script length
pub const MAX_SCRIPT_SIZE: usize = 10_000;

/// Maximum combined main + alt stack depth during script execution
pub const MAX_STACK_SIZE: usize = 1000;

/// Maximum number of non-push operations in one script
pub const MAX_SCRIPT_OPS: usize = 201;

/// Maximum size of a single pushed element
pub const MAX_SCRIPT_ELEMENT_SIZE: usize = 520;

/// Maximum byte length of a numeric operand
pub const MAX_SCRIPT_NUM_LENGTH: usize = 4;

/// Maximum number of public keys in CHECKMULTISIG
pub const MAX_PUBKEYS_PER_MULTISIG: usize = 20;

/// Sequence number for final transaction
pub const SEQUENCE_FINAL: u32 = 0xffffffff;

/// Output index marking the coinbase sentinel outpoint
pub const COINBASE_OUTPUT_INDEX: u32 = 0xffffffff;

/// Version written into coinbase transactions
pub const COINBASE_VERSION: u32 = 2;

/// Default version for regular transactions
pub const TX_VERSION: u32 = 1;

/// Length of a compressed secp256k1 public key
pub const COMPRESSED_PUBKEY_SIZE: usize = 33;

/// Length of a HASH160 digest
pub const PUBKEY_HASH_SIZE: usize = 20;

/// Version byte of mainnet P2PKH addresses
pub const P2PKH_ADDRESS_VERSION: u8 = 0x00;

/// Coinbase payload bounds: the 4-byte height plus optional extra data
pub const MIN_COINBASE_PAYLOAD_SIZE: usize = 4;
pub const MAX_COINBASE_PAYLOAD_SIZE: usize = 100;
