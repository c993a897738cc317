//! Script virtual machine
//!
//! VerifyScript: 𝕊 × 𝕊 × 𝒞 → {authorized, error}
//!
//! 1. Execute the unlocking script on an empty stack
//! 2. Execute the locking script on the resulting stack (alt-stack cleared)
//! 3. Authorized iff no step failed and the top item is true
//!
//! The engine never touches a transaction. Signature checks go through the
//! [`SignatureChecker`] seam, which the sighash module implements for a
//! concrete input.

pub mod num;
pub mod stack;

mod ops_crypto;
mod ops_flow;
mod ops_numeric;
mod ops_stack;

pub use num::ScriptNum;
pub use stack::{as_bool, Stack};

use tracing::trace;

use crate::config::ScriptConfig;
use crate::error::{Result, TxError};
use crate::opcodes::{Opcode, OpcodeCategory};
use crate::script::{Instructions, Script, ScriptElement};

const LOG_TARGET: &str = "bitcointx::interpreter";

/// Signature verification capability supplied by the caller.
pub trait SignatureChecker {
    /// `script_code` is the executing script from just after the last
    /// executed `OP_CODESEPARATOR`, or the whole script if there was none.
    fn check_signature(&self, signature: &[u8], pubkey: &[u8], script_code: &[u8]) -> bool;
}

/// Checker for scripts evaluated outside any transaction: every signature
/// check fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSignatureChecker;

impl SignatureChecker for NoSignatureChecker {
    fn check_signature(&self, _signature: &[u8], _pubkey: &[u8], _script_code: &[u8]) -> bool {
        false
    }
}

/// Per-script execution state.
pub(crate) struct ExecState<'a> {
    pub(crate) stack: Stack,
    pub(crate) alt: Stack,
    /// One entry per open IF; false while inside an untaken branch.
    pub(crate) cond: Vec<bool>,
    pub(crate) op_count: usize,
    pub(crate) script: &'a [u8],
    /// Offset just past the opcode being executed.
    pub(crate) pc: usize,
    pub(crate) code_start: usize,
    pub(crate) config: &'a ScriptConfig,
    pub(crate) checker: &'a dyn SignatureChecker,
}

impl<'a> ExecState<'a> {
    fn new(
        stack: Stack,
        script: &'a [u8],
        checker: &'a dyn SignatureChecker,
        config: &'a ScriptConfig,
    ) -> Self {
        Self {
            stack,
            alt: Stack::new(),
            cond: Vec::new(),
            op_count: 0,
            script,
            pc: 0,
            code_start: 0,
            config,
            checker,
        }
    }

    fn executing(&self) -> bool {
        self.cond.iter().all(|taken| *taken)
    }

    pub(crate) fn add_ops(&mut self, n: usize) -> Result<()> {
        self.op_count += n;
        if self.op_count > self.config.max_ops {
            return Err(TxError::ResourceLimit(format!(
                "operation count exceeds {}",
                self.config.max_ops
            )));
        }
        Ok(())
    }

    pub(crate) fn pop_num(&mut self, op: Opcode) -> Result<i64> {
        self.stack.pop_num(op.name(), self.config.max_num_length)
    }

    fn run(&mut self) -> Result<()> {
        if self.script.len() > self.config.max_script_size {
            return Err(TxError::ResourceLimit(format!(
                "script of {} bytes exceeds {}",
                self.script.len(),
                self.config.max_script_size
            )));
        }

        let mut instructions = Instructions::new(self.script);
        while let Some(element) = instructions.next() {
            let element = element?;
            self.pc = instructions.position();
            let executing = self.executing();

            match element {
                ScriptElement::Push(data) => {
                    if data.len() > self.config.max_element_size {
                        return Err(TxError::ResourceLimit(format!(
                            "push of {} bytes exceeds {}",
                            data.len(),
                            self.config.max_element_size
                        )));
                    }
                    if executing {
                        self.stack.push(data.to_vec());
                    }
                }
                ScriptElement::Op(op) => {
                    if !op.is_push() {
                        self.add_ops(1)?;
                    }
                    self.step(op, executing)?;
                }
            }

            if self.stack.len() + self.alt.len() > self.config.max_stack_size {
                return Err(TxError::ResourceLimit(format!(
                    "stack depth exceeds {}",
                    self.config.max_stack_size
                )));
            }
        }

        if !self.cond.is_empty() {
            return Err(TxError::MalformedScript(
                "unbalanced conditional".to_string(),
            ));
        }
        Ok(())
    }

    fn step(&mut self, op: Opcode, executing: bool) -> Result<()> {
        let category = op.category();
        if category == OpcodeCategory::Disabled {
            return Err(TxError::DisabledOpcode(op.name()));
        }
        if !executing && !op.is_conditional() {
            return Ok(());
        }
        match category {
            OpcodeCategory::Push => self.exec_push(op),
            OpcodeCategory::Flow => self.exec_flow(op, executing),
            OpcodeCategory::Stack => self.exec_stack(op),
            OpcodeCategory::Equality => self.exec_equality(op),
            OpcodeCategory::Numeric => self.exec_numeric(op),
            OpcodeCategory::Crypto => self.exec_crypto(op),
            OpcodeCategory::Reserved => Err(TxError::ScriptValidationFailed(format!(
                "reserved opcode {} executed",
                op.name()
            ))),
            OpcodeCategory::Nop => Ok(()),
            OpcodeCategory::Disabled => Err(TxError::DisabledOpcode(op.name())),
        }
    }

    fn exec_push(&mut self, op: Opcode) -> Result<()> {
        match op {
            Opcode::Zero => self.stack.push(Vec::new()),
            Opcode::OneNegate => self.stack.push_num(-1),
            Opcode::PushNum(n) => self.stack.push_num(n as i64),
            Opcode::PushBytes(_) | Opcode::PushData1 | Opcode::PushData2 | Opcode::PushData4 => {
                return Err(TxError::MalformedScript(format!(
                    "{} without payload",
                    op.name()
                )))
            }
            other => return Err(misrouted(other, "push")),
        }
        Ok(())
    }
}

pub(crate) fn misrouted(op: Opcode, group: &str) -> TxError {
    TxError::MalformedScript(format!("{} is not a {} opcode", op.name(), group))
}

/// EvalScript: run one script against `stack`.
///
/// The alt-stack starts empty and is discarded afterwards. On failure the
/// stack is left as it was at the failing opcode.
pub fn eval_script(
    script: &Script,
    stack: &mut Stack,
    checker: &dyn SignatureChecker,
    config: &ScriptConfig,
) -> Result<()> {
    config.validate()?;
    let mut state = ExecState::new(std::mem::take(stack), script.as_bytes(), checker, config);
    let result = state.run();
    *stack = state.stack;
    if let Err(e) = &result {
        trace!(target: LOG_TARGET, %script, error = %e, "script evaluation failed");
    }
    result
}

/// VerifyScript: unlocking script, then locking script on the same stack.
///
/// Returns `Ok(())` only when both ran cleanly and the final top item is
/// true.
pub fn verify_script(
    unlocking: &Script,
    locking: &Script,
    checker: &dyn SignatureChecker,
    config: &ScriptConfig,
) -> Result<()> {
    let mut stack = Stack::new();
    eval_script(unlocking, &mut stack, checker, config)?;
    eval_script(locking, &mut stack, checker, config)?;

    match stack.items().last() {
        Some(top) if as_bool(top) => Ok(()),
        Some(_) => Err(TxError::ScriptValidationFailed(
            "top stack item is false".to_string(),
        )),
        None => Err(TxError::ScriptValidationFailed(
            "stack empty after execution".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(script: Vec<u8>) -> (Result<()>, Stack) {
        let mut stack = Stack::new();
        let res = eval_script(
            &Script::from(script),
            &mut stack,
            &NoSignatureChecker,
            &ScriptConfig::default(),
        );
        (res, stack)
    }

    fn verify(unlock: Vec<u8>, lock: Vec<u8>) -> Result<()> {
        verify_script(
            &Script::from(unlock),
            &Script::from(lock),
            &NoSignatureChecker,
            &ScriptConfig::default(),
        )
    }

    #[test]
    fn test_eval_script_simple() {
        let (res, stack) = run(vec![0x51]); // OP_1
        assert!(res.is_ok());
        assert_eq!(stack.items(), &[vec![1]]);
    }

    #[test]
    fn test_op_1_to_op_16() {
        for i in 1..=16u8 {
            let (res, stack) = run(vec![0x50 + i]);
            assert!(res.is_ok());
            assert_eq!(stack.items(), &[vec![i]]);
        }
    }

    #[test]
    fn test_op_0_and_1negate() {
        let (res, stack) = run(vec![0x00, 0x4f]); // OP_0 OP_1NEGATE
        assert!(res.is_ok());
        assert_eq!(stack.items(), &[vec![], vec![0x81]]);
    }

    #[test]
    fn test_verify_script_unlock_then_lock() {
        // unlock: OP_2 OP_3, lock: OP_ADD OP_5 OP_EQUAL
        assert!(verify(vec![0x52, 0x53], vec![0x93, 0x55, 0x87]).is_ok());
        assert!(matches!(
            verify(vec![0x52, 0x52], vec![0x93, 0x55, 0x87]),
            Err(TxError::ScriptValidationFailed(_))
        ));
    }

    #[test]
    fn test_verify_script_empty_stack_fails() {
        assert!(matches!(
            verify(vec![], vec![]),
            Err(TxError::ScriptValidationFailed(_))
        ));
    }

    #[test]
    fn test_negative_zero_is_false() {
        // unlock pushes 0x80, lock is empty
        assert!(verify(vec![0x01, 0x80], vec![]).is_err());
        assert!(verify(vec![0x02, 0x80, 0x00], vec![]).is_ok());
    }

    #[test]
    fn test_alt_stack_cleared_between_scripts() {
        // unlock: OP_1 OP_TOALTSTACK, lock: OP_FROMALTSTACK
        assert!(matches!(
            verify(vec![0x51, 0x6b], vec![0x6c]),
            Err(TxError::StackUnderflow { op: "OP_FROMALTSTACK", .. })
        ));
    }

    #[test]
    fn test_operation_count_limit() {
        let mut script = vec![0x51];
        script.extend(std::iter::repeat(0x61).take(202)); // OP_NOP
        let (res, _) = run(script);
        assert!(matches!(res, Err(TxError::ResourceLimit(_))));

        let mut script = vec![0x51];
        script.extend(std::iter::repeat(0x61).take(201));
        assert!(run(script).0.is_ok());
    }

    #[test]
    fn test_push_ops_are_not_counted() {
        let (res, _) = run(vec![0x51; 300]);
        assert!(res.is_ok());
    }

    #[test]
    fn test_stack_size_limit() {
        let (res, stack) = run(vec![0x51; 1001]);
        assert!(matches!(res, Err(TxError::ResourceLimit(_))));
        assert_eq!(stack.len(), 1001);
    }

    #[test]
    fn test_script_size_limit() {
        let (res, _) = run(vec![0x61; 10_001]);
        assert!(matches!(res, Err(TxError::ResourceLimit(_))));
    }

    #[test]
    fn test_element_size_limit() {
        let mut script = vec![0x4d, 0x09, 0x02]; // PUSHDATA2 521
        script.extend(vec![0u8; 521]);
        assert!(matches!(run(script).0, Err(TxError::ResourceLimit(_))));
    }

    #[test]
    fn test_malformed_push() {
        let (res, _) = run(vec![0x4c, 0x10, 0x01]);
        assert!(matches!(res, Err(TxError::MalformedScript(_))));
    }

    #[test]
    fn test_unknown_opcode() {
        assert_eq!(run(vec![0x51, 0xba]).0, Err(TxError::UnknownOpcode(0xba)));
    }

    #[test]
    fn test_custom_config_limits_ops() {
        let config = ScriptConfig {
            max_ops: 2,
            ..ScriptConfig::default()
        };
        let mut stack = Stack::new();
        let script = Script::from(vec![0x61, 0x61, 0x61]);
        assert!(matches!(
            eval_script(&script, &mut stack, &NoSignatureChecker, &config),
            Err(TxError::ResourceLimit(_))
        ));
    }
}
