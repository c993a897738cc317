//! Conditionals, VERIFY and RETURN.

use super::{misrouted, ExecState};
use crate::error::{Result, TxError};
use crate::opcodes::Opcode;

impl ExecState<'_> {
    pub(crate) fn exec_flow(&mut self, op: Opcode, executing: bool) -> Result<()> {
        match op {
            Opcode::If | Opcode::NotIf => {
                // inside an untaken branch the condition is not consumed
                let taken = if executing {
                    let v = self.stack.pop_bool(op.name())?;
                    if op == Opcode::NotIf {
                        !v
                    } else {
                        v
                    }
                } else {
                    false
                };
                self.cond.push(taken);
            }
            Opcode::Else => match self.cond.last_mut() {
                Some(top) => *top = !*top,
                None => return Err(unbalanced(op)),
            },
            Opcode::EndIf => {
                if self.cond.pop().is_none() {
                    return Err(unbalanced(op));
                }
            }
            Opcode::Verify => self.verify(op)?,
            Opcode::Return => {
                return Err(TxError::ScriptValidationFailed(
                    "OP_RETURN executed".to_string(),
                ))
            }
            other => return Err(misrouted(other, "flow")),
        }
        Ok(())
    }

    /// Pop the top item and fail unless it is true.
    pub(crate) fn verify(&mut self, op: Opcode) -> Result<()> {
        if !self.stack.pop_bool(op.name())? {
            return Err(TxError::ScriptValidationFailed(format!(
                "{} failed",
                op.name()
            )));
        }
        Ok(())
    }
}

fn unbalanced(op: Opcode) -> TxError {
    TxError::MalformedScript(format!("{} without matching OP_IF", op.name()))
}
