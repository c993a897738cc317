//! Hash opcodes and signature checks.

use super::{misrouted, ExecState};
use crate::error::{Result, TxError};
use crate::keys;
use crate::opcodes::Opcode;

impl ExecState<'_> {
    pub(crate) fn exec_crypto(&mut self, op: Opcode) -> Result<()> {
        let name = op.name();
        match op {
            Opcode::Ripemd160
            | Opcode::Sha1
            | Opcode::Sha256
            | Opcode::Hash160
            | Opcode::Hash256 => {
                let item = self.stack.pop(name)?;
                let digest = match op {
                    Opcode::Ripemd160 => keys::ripemd160(&item).to_vec(),
                    Opcode::Sha1 => keys::sha1(&item).to_vec(),
                    Opcode::Sha256 => keys::sha256(&item).to_vec(),
                    Opcode::Hash160 => keys::hash160(&item).to_vec(),
                    _ => keys::hash256(&item).to_vec(),
                };
                self.stack.push(digest);
                Ok(())
            }
            Opcode::CodeSeparator => {
                self.code_start = self.pc;
                Ok(())
            }
            Opcode::CheckSig | Opcode::CheckSigVerify => {
                self.stack.require(name, 2)?;
                let pubkey = self.stack.pop(name)?;
                let signature = self.stack.pop(name)?;
                let valid =
                    self.checker
                        .check_signature(&signature, &pubkey, self.script_code());
                self.finish_check(op, valid, op == Opcode::CheckSigVerify)
            }
            Opcode::CheckMultiSig | Opcode::CheckMultiSigVerify => {
                let valid = self.check_multisig(op)?;
                self.finish_check(op, valid, op == Opcode::CheckMultiSigVerify)
            }
            other => Err(misrouted(other, "crypto")),
        }
    }

    fn script_code(&self) -> &[u8] {
        &self.script[self.code_start..]
    }

    fn finish_check(&mut self, op: Opcode, valid: bool, verify: bool) -> Result<()> {
        if !verify {
            self.stack.push_bool(valid);
            return Ok(());
        }
        if !valid {
            return Err(TxError::SignatureInvalid(format!("{} failed", op.name())));
        }
        Ok(())
    }

    /// Stack layout, top first: `n key_n..key_1 m sig_m..sig_1 dummy`.
    ///
    /// Signatures must match keys in the same relative order. The dummy
    /// element is popped and ignored.
    fn check_multisig(&mut self, op: Opcode) -> Result<bool> {
        let name = op.name();
        let max_keys = self.config.max_pubkeys_per_multisig;

        let n = self.pop_num(op)?;
        let n = usize::try_from(n)
            .ok()
            .filter(|n| *n <= max_keys)
            .ok_or_else(|| {
                TxError::ResourceLimit(format!("{} public keys outside 0..={}", n, max_keys))
            })?;
        self.add_ops(n)?;

        self.stack.require(name, n)?;
        let mut pubkeys = Vec::with_capacity(n);
        for _ in 0..n {
            pubkeys.push(self.stack.pop(name)?);
        }

        let m = self.pop_num(op)?;
        let m = usize::try_from(m)
            .ok()
            .filter(|m| *m <= n)
            .ok_or_else(|| {
                TxError::ScriptValidationFailed(format!("{} signatures for {} keys", m, n))
            })?;

        self.stack.require(name, m + 1)?;
        let mut signatures = Vec::with_capacity(m);
        for _ in 0..m {
            signatures.push(self.stack.pop(name)?);
        }
        self.stack.pop(name)?;

        let script_code = self.script_code();
        let mut key_idx = 0;
        let mut sig_idx = 0;
        while sig_idx < signatures.len() {
            if signatures.len() - sig_idx > pubkeys.len() - key_idx {
                return Ok(false);
            }
            if self
                .checker
                .check_signature(&signatures[sig_idx], &pubkeys[key_idx], script_code)
            {
                sig_idx += 1;
            }
            key_idx += 1;
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::ScriptConfig;
    use crate::error::TxError;
    use crate::interpreter::{eval_script, verify_script, SignatureChecker, Stack};
    use crate::keys;
    use crate::opcodes::Opcode;
    use crate::script::{Script, ScriptBuilder};

    /// Accepts a signature iff it equals `b"sig:" ++ pubkey`, and records the
    /// script code it was asked about.
    struct EchoChecker {
        seen: std::cell::RefCell<Vec<Vec<u8>>>,
    }

    impl EchoChecker {
        fn new() -> Self {
            Self {
                seen: std::cell::RefCell::new(Vec::new()),
            }
        }
    }

    impl SignatureChecker for EchoChecker {
        fn check_signature(&self, signature: &[u8], pubkey: &[u8], script_code: &[u8]) -> bool {
            self.seen.borrow_mut().push(script_code.to_vec());
            let mut expected = b"sig:".to_vec();
            expected.extend_from_slice(pubkey);
            signature == expected.as_slice()
        }
    }

    fn sig_for(pubkey: &[u8]) -> Vec<u8> {
        let mut s = b"sig:".to_vec();
        s.extend_from_slice(pubkey);
        s
    }

    fn run(script: &Script, checker: &dyn SignatureChecker) -> (Result<(), TxError>, Vec<Vec<u8>>) {
        let mut stack = Stack::new();
        let res = eval_script(script, &mut stack, checker, &ScriptConfig::default());
        (res, stack.into_items())
    }

    #[test]
    fn test_hash_opcodes() {
        let data = b"abc".to_vec();
        let cases = [
            (Opcode::Ripemd160, keys::ripemd160(&data).to_vec()),
            (Opcode::Sha1, keys::sha1(&data).to_vec()),
            (Opcode::Sha256, keys::sha256(&data).to_vec()),
            (Opcode::Hash160, keys::hash160(&data).to_vec()),
            (Opcode::Hash256, keys::hash256(&data).to_vec()),
        ];
        for (op, expected) in cases {
            let script = ScriptBuilder::new().push_slice(&data).push_opcode(op).into_script();
            let (res, stack) = run(&script, &EchoChecker::new());
            assert!(res.is_ok());
            assert_eq!(stack, vec![expected], "{}", op);
        }
    }

    #[test]
    fn test_sha256_known_vector() {
        let script = ScriptBuilder::new()
            .push_slice(b"abc")
            .push_opcode(Opcode::Sha256)
            .into_script();
        let (_, stack) = run(&script, &EchoChecker::new());
        assert_eq!(
            hex::encode(&stack[0]),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_checksig_pushes_result() {
        let pk = vec![2u8; 33];
        let good = ScriptBuilder::new()
            .push_slice(&sig_for(&pk))
            .push_slice(&pk)
            .push_opcode(Opcode::CheckSig)
            .into_script();
        assert_eq!(run(&good, &EchoChecker::new()).1, vec![vec![1]]);

        let bad = ScriptBuilder::new()
            .push_slice(b"junk")
            .push_slice(&pk)
            .push_opcode(Opcode::CheckSig)
            .into_script();
        assert_eq!(run(&bad, &EchoChecker::new()).1, vec![Vec::<u8>::new()]);
    }

    #[test]
    fn test_checksigverify_fails_with_signature_invalid() {
        let pk = vec![3u8; 33];
        let script = ScriptBuilder::new()
            .push_slice(b"junk")
            .push_slice(&pk)
            .push_opcode(Opcode::CheckSigVerify)
            .into_script();
        assert!(matches!(
            run(&script, &EchoChecker::new()).0,
            Err(TxError::SignatureInvalid(_))
        ));
    }

    #[test]
    fn test_checksig_underflow() {
        let script = Script::from(vec![0x51, 0xac]);
        assert!(matches!(
            run(&script, &EchoChecker::new()).0,
            Err(TxError::StackUnderflow { op: "OP_CHECKSIG", .. })
        ));
    }

    #[test]
    fn test_codeseparator_sets_script_code() {
        let pk = vec![4u8; 33];
        // lock: OP_NOP OP_CODESEPARATOR OP_CHECKSIG
        let lock = Script::from(vec![0x61, 0xab, 0xac]);
        let unlock = ScriptBuilder::new()
            .push_slice(&sig_for(&pk))
            .push_slice(&pk)
            .into_script();
        let checker = EchoChecker::new();
        verify_script(&unlock, &lock, &checker, &ScriptConfig::default()).unwrap();
        assert_eq!(checker.seen.borrow().as_slice(), &[vec![0xac]]);

        let lock = Script::from(vec![0xac]);
        let checker = EchoChecker::new();
        verify_script(&unlock, &lock, &checker, &ScriptConfig::default()).unwrap();
        assert_eq!(checker.seen.borrow().as_slice(), &[vec![0xac]]);
    }

    fn multisig(sigs: &[Vec<u8>], m: i64, keys: &[Vec<u8>], verify: bool) -> Script {
        let mut b = ScriptBuilder::new().push_opcode(Opcode::Zero); // dummy
        for s in sigs {
            b = b.push_slice(s);
        }
        b = b.push_int(m);
        for k in keys {
            b = b.push_slice(k);
        }
        b.push_int(keys.len() as i64)
            .push_opcode(if verify {
                Opcode::CheckMultiSigVerify
            } else {
                Opcode::CheckMultiSig
            })
            .into_script()
    }

    #[test]
    fn test_checkmultisig_two_of_three() {
        let keys: Vec<Vec<u8>> = (1..=3u8).map(|i| vec![i; 33]).collect();
        let script = multisig(&[sig_for(&keys[0]), sig_for(&keys[2])], 2, &keys, false);
        let (res, stack) = run(&script, &EchoChecker::new());
        assert!(res.is_ok());
        assert_eq!(stack, vec![vec![1]]);
    }

    #[test]
    fn test_checkmultisig_order_matters() {
        let keys: Vec<Vec<u8>> = (1..=3u8).map(|i| vec![i; 33]).collect();
        let script = multisig(&[sig_for(&keys[2]), sig_for(&keys[0])], 2, &keys, false);
        let (res, stack) = run(&script, &EchoChecker::new());
        assert!(res.is_ok());
        assert_eq!(stack, vec![Vec::<u8>::new()]);

        let script = multisig(&[sig_for(&keys[2]), sig_for(&keys[0])], 2, &keys, true);
        assert!(matches!(
            run(&script, &EchoChecker::new()).0,
            Err(TxError::SignatureInvalid(_))
        ));
    }

    #[test]
    fn test_checkmultisig_consumes_dummy() {
        let keys = vec![vec![1u8; 33]];
        let script = multisig(&[sig_for(&keys[0])], 1, &keys, false);
        // drop the leading dummy push: the extra pop now underflows
        let without_dummy = Script::from(script.as_bytes()[1..].to_vec());
        assert!(matches!(
            run(&without_dummy, &EchoChecker::new()).0,
            Err(TxError::StackUnderflow { .. })
        ));
    }

    #[test]
    fn test_checkmultisig_key_limit() {
        let keys: Vec<Vec<u8>> = (0..21u8).map(|i| vec![i; 33]).collect();
        let script = multisig(&[], 0, &keys, false);
        assert!(matches!(
            run(&script, &EchoChecker::new()).0,
            Err(TxError::ResourceLimit(_))
        ));
    }

    #[test]
    fn test_checkmultisig_more_sigs_than_keys() {
        let keys = vec![vec![1u8; 33]];
        let script = multisig(&[sig_for(&keys[0]), sig_for(&keys[0])], 2, &keys, false);
        assert!(matches!(
            run(&script, &EchoChecker::new()).0,
            Err(TxError::ScriptValidationFailed(_))
        ));
    }

    #[test]
    fn test_checkmultisig_counts_keys_as_ops() {
        let keys: Vec<Vec<u8>> = (0..20u8).map(|i| vec![i; 33]).collect();
        let mut bytes = vec![0x61; 185]; // OP_NOP
        bytes.extend_from_slice(multisig(&[], 0, &keys, false).as_bytes());
        let (res, _) = run(&Script::from(bytes), &EchoChecker::new());
        assert!(matches!(res, Err(TxError::ResourceLimit(_))));
    }
}
