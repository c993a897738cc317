//! Signature hash construction and transaction-bound signature checks
//!
//! SigHash: ℕ × ℕ × 𝒯* × 𝒯* × 𝕊 → ℍ
//!
//! The preimage for input i is:
//! 1. version (u32 LE), lock time (u32 LE)
//! 2. for each input: value and locking script of the output it spends
//! 3. for each output: value and locking script
//! 4. the script code of input i
//!
//! Scripts are length-prefixed with a compact size. The preimage is hashed
//! once with SHA-256.

use tracing::trace;

use crate::codec::{write_u32, write_u64, write_var_bytes};
use crate::interpreter::SignatureChecker;
use crate::keys;
use crate::transaction::Transaction;
use crate::types::Output;

const LOG_TARGET: &str = "bitcointx::sighash";

fn write_output(out: &mut Vec<u8>, output: &Output) {
    write_u64(out, output.value);
    write_var_bytes(out, output.locking_script.as_bytes());
}

/// Bytes committed to by a signature.
///
/// `spent_outputs[j]` is the output spent by input `j`. For P2PKH the
/// `script_code` is the locking script of the output being spent.
pub fn signature_preimage(
    version: u32,
    lock_time: u32,
    spent_outputs: &[Output],
    outputs: &[Output],
    script_code: &[u8],
) -> Vec<u8> {
    let mut out = Vec::new();
    write_u32(&mut out, version);
    write_u32(&mut out, lock_time);
    for spent in spent_outputs {
        write_output(&mut out, spent);
    }
    for output in outputs {
        write_output(&mut out, output);
    }
    write_var_bytes(&mut out, script_code);
    out
}

pub fn signature_hash(
    version: u32,
    lock_time: u32,
    spent_outputs: &[Output],
    outputs: &[Output],
    script_code: &[u8],
) -> [u8; 32] {
    keys::sha256(&signature_preimage(
        version,
        lock_time,
        spent_outputs,
        outputs,
        script_code,
    ))
}

/// Verifies signatures for one input of a finished transaction.
pub struct TransactionChecker<'a> {
    tx: &'a Transaction,
    spent_outputs: &'a [Output],
    input_index: usize,
}

impl<'a> TransactionChecker<'a> {
    pub fn new(tx: &'a Transaction, spent_outputs: &'a [Output], input_index: usize) -> Self {
        Self {
            tx,
            spent_outputs,
            input_index,
        }
    }

    pub fn sighash(&self, script_code: &[u8]) -> [u8; 32] {
        signature_hash(
            self.tx.version(),
            self.tx.lock_time(),
            self.spent_outputs,
            self.tx.outputs(),
            script_code,
        )
    }
}

impl SignatureChecker for TransactionChecker<'_> {
    fn check_signature(&self, signature: &[u8], pubkey: &[u8], script_code: &[u8]) -> bool {
        let digest = self.sighash(script_code);
        let valid = keys::verify_signature(pubkey, &digest, signature);
        if !valid {
            trace!(
                target: LOG_TARGET,
                input = self.input_index,
                sighash = %hex::encode(digest),
                "signature check failed"
            );
        }
        valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::Script;

    fn out(value: u64, script: &[u8]) -> Output {
        Output::new(value, Script::from(script.to_vec()))
    }

    #[test]
    fn test_preimage_layout() {
        let spent = [out(5000, &[0xaa, 0xbb])];
        let outputs = [out(4900, &[0xcc])];
        let pre = signature_preimage(1, 7, &spent, &outputs, &[0xaa, 0xbb]);

        let mut expected = vec![1, 0, 0, 0, 7, 0, 0, 0];
        expected.extend_from_slice(&5000u64.to_le_bytes());
        expected.extend_from_slice(&[2, 0xaa, 0xbb]);
        expected.extend_from_slice(&4900u64.to_le_bytes());
        expected.extend_from_slice(&[1, 0xcc]);
        expected.extend_from_slice(&[2, 0xaa, 0xbb]);
        assert_eq!(pre, expected);
    }

    #[test]
    fn test_hash_is_single_sha256() {
        let spent = [out(1, &[0x51])];
        let pre = signature_preimage(2, 0, &spent, &[], &[0x51]);
        assert_eq!(signature_hash(2, 0, &spent, &[], &[0x51]), keys::sha256(&pre));
    }

    #[test]
    fn test_hash_commits_to_every_field() {
        let spent = [out(5000, &[0x51])];
        let outputs = [out(4900, &[0x52])];
        let base = signature_hash(1, 0, &spent, &outputs, &[0x51]);
        assert_ne!(base, signature_hash(2, 0, &spent, &outputs, &[0x51]));
        assert_ne!(base, signature_hash(1, 1, &spent, &outputs, &[0x51]));
        assert_ne!(base, signature_hash(1, 0, &[out(5001, &[0x51])], &outputs, &[0x51]));
        assert_ne!(base, signature_hash(1, 0, &spent, &[out(4901, &[0x52])], &[0x51]));
        assert_ne!(base, signature_hash(1, 0, &spent, &outputs, &[0x53]));
    }
}
