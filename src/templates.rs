//! Pay-to-public-key-hash script templates

use crate::address::decode_address;
use crate::constants::PUBKEY_HASH_SIZE;
use crate::error::Result;
use crate::opcodes::Opcode;
use crate::script::{Script, ScriptBuilder, ScriptElement};
use crate::types::PubKeyHash;

/// `OP_DUP OP_HASH160 <hash> OP_EQUALVERIFY OP_CHECKSIG`
pub fn p2pkh_lock(pubkey_hash: &PubKeyHash) -> Script {
    ScriptBuilder::new()
        .push_opcode(Opcode::Dup)
        .push_opcode(Opcode::Hash160)
        .push_slice(pubkey_hash)
        .push_opcode(Opcode::EqualVerify)
        .push_opcode(Opcode::CheckSig)
        .into_script()
}

/// Lock to the key hash carried by a Base58Check address.
pub fn p2pkh_lock_from_address(address: &str) -> Result<Script> {
    Ok(p2pkh_lock(&decode_address(address)?))
}

/// `<signature> <pubkey>`
pub fn p2pkh_unlock(signature: &[u8], pubkey: &[u8]) -> Script {
    ScriptBuilder::new()
        .push_slice(signature)
        .push_slice(pubkey)
        .into_script()
}

/// Key hash of a P2PKH locking script, `None` for any other script.
pub fn p2pkh_pubkey_hash(script: &Script) -> Option<PubKeyHash> {
    use ScriptElement::{Op, Push};

    match script.elements().ok()?.as_slice() {
        [
            Op(Opcode::Dup),
            Op(Opcode::Hash160),
            Push(hash),
            Op(Opcode::EqualVerify),
            Op(Opcode::CheckSig),
        ] if hash.len() == PUBKEY_HASH_SIZE => {
            let mut out = [0u8; PUBKEY_HASH_SIZE];
            out.copy_from_slice(hash);
            Some(out)
        }
        _ => None,
    }
}
