//! Hash primitives and secp256k1 key handling
//!
//! Public keys are 33-byte compressed SEC1 points. Signatures are
//! DER-encoded ECDSA over a 32-byte digest, with no trailing hash-type byte.

use bitcoin_hashes::{sha1 as sha1_hash, sha256d, Hash};
use ripemd::Ripemd160;
use secp256k1::{ecdsa::Signature, Message, PublicKey, Secp256k1, SecretKey};
use sha2::{Digest, Sha256};
use std::fmt;
use tracing::trace;

use crate::error::{Result, TxError};
use crate::types::PubKeyHash;

const LOG_TARGET: &str = "bitcointx::keys";

pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// SHA-256 applied twice.
pub fn hash256(data: &[u8]) -> [u8; 32] {
    sha256d::Hash::hash(data).into_inner()
}

pub fn ripemd160(data: &[u8]) -> [u8; 20] {
    Ripemd160::digest(data).into()
}

pub fn sha1(data: &[u8]) -> [u8; 20] {
    sha1_hash::Hash::hash(data).into_inner()
}

/// RIPEMD-160 of SHA-256.
pub fn hash160(data: &[u8]) -> PubKeyHash {
    ripemd160(&sha256(data))
}

/// A secp256k1 key pair.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyPair {
    secret: SecretKey,
    public: PublicKey,
}

impl KeyPair {
    /// Build a key pair from a 32-byte secret scalar.
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self> {
        let secret = SecretKey::from_slice(bytes).map_err(|e| TxError::InvalidKey(e.to_string()))?;
        let secp = Secp256k1::signing_only();
        let public = PublicKey::from_secret_key(&secp, &secret);
        Ok(Self { secret, public })
    }

    pub fn public_key_bytes(&self) -> [u8; 33] {
        self.public.serialize()
    }

    pub fn pubkey_hash(&self) -> PubKeyHash {
        hash160(&self.public_key_bytes())
    }

    /// DER signature over `digest`.
    pub fn sign(&self, digest: &[u8; 32]) -> Vec<u8> {
        let secp = Secp256k1::signing_only();
        let sig = secp.sign_ecdsa(&Message::from_digest(*digest), &self.secret);
        trace!(target: LOG_TARGET, digest = %hex::encode(digest), "signed digest");
        sig.serialize_der().to_vec()
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &hex::encode(self.public_key_bytes()))
            .finish_non_exhaustive()
    }
}

/// Check a DER signature against a serialized public key. Malformed keys
/// or signatures verify as false.
pub fn verify_signature(pubkey: &[u8], digest: &[u8; 32], signature: &[u8]) -> bool {
    let Ok(pubkey) = PublicKey::from_slice(pubkey) else {
        return false;
    };
    let Ok(sig) = Signature::from_der(signature) else {
        return false;
    };
    let secp = Secp256k1::verification_only();
    secp.verify_ecdsa(&Message::from_digest(*digest), &sig, &pubkey)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_vectors() {
        assert_eq!(
            hex::encode(sha256(b"")),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            hex::encode(ripemd160(b"")),
            "9c1185a5c5e9fc54612808977ee8f548b2258d31"
        );
        assert_eq!(
            hex::encode(sha1(b"abc")),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
        assert_eq!(hash256(b"x"), sha256(&sha256(b"x")));
        assert_eq!(hash160(b"x"), ripemd160(&sha256(b"x")));
    }

    #[test]
    fn test_known_public_key() {
        // secret key 1 maps to the generator point
        let mut secret = [0u8; 32];
        secret[31] = 1;
        let kp = KeyPair::from_secret_bytes(&secret).unwrap();
        assert_eq!(
            hex::encode(kp.public_key_bytes()),
            "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798"
        );
        assert_eq!(
            hex::encode(kp.pubkey_hash()),
            "751e76e8199196d454941c45d1b3a323f1433bd6"
        );
    }

    #[test]
    fn test_invalid_secret() {
        assert!(matches!(
            KeyPair::from_secret_bytes(&[0u8; 32]),
            Err(TxError::InvalidKey(_))
        ));
        assert!(KeyPair::from_secret_bytes(&[1u8; 31]).is_err());
    }

    #[test]
    fn test_sign_verify() {
        let kp = KeyPair::from_secret_bytes(&[0x11; 32]).unwrap();
        let other = KeyPair::from_secret_bytes(&[0x22; 32]).unwrap();
        let digest = sha256(b"message");
        let sig = kp.sign(&digest);

        assert!(verify_signature(&kp.public_key_bytes(), &digest, &sig));
        assert!(!verify_signature(&other.public_key_bytes(), &digest, &sig));
        assert!(!verify_signature(&kp.public_key_bytes(), &sha256(b"other"), &sig));
        assert!(!verify_signature(&kp.public_key_bytes(), &digest, &sig[1..]));
        assert!(!verify_signature(&[0x02; 10], &digest, &sig));
    }

    #[test]
    fn test_signing_is_deterministic() {
        let kp = KeyPair::from_secret_bytes(&[0x11; 32]).unwrap();
        let digest = sha256(b"message");
        assert_eq!(kp.sign(&digest), kp.sign(&digest));
    }

    #[test]
    fn test_debug_hides_secret() {
        let kp = KeyPair::from_secret_bytes(&[0x11; 32]).unwrap();
        let dbg = format!("{:?}", kp);
        assert!(!dbg.contains(&hex::encode([0x11u8; 32])));
    }
}
