//! Byte equality and arithmetic on numeric stack items.

use super::num::ScriptNum;
use super::{misrouted, ExecState};
use crate::error::{Result, TxError};
use crate::opcodes::Opcode;

impl ExecState<'_> {
    pub(crate) fn exec_equality(&mut self, op: Opcode) -> Result<()> {
        let name = op.name();
        self.stack.require(name, 2)?;
        let b = self.stack.pop(name)?;
        let a = self.stack.pop(name)?;
        self.stack.push_bool(a == b);
        match op {
            Opcode::Equal => Ok(()),
            Opcode::EqualVerify => self.verify(op),
            other => Err(misrouted(other, "equality")),
        }
    }

    pub(crate) fn exec_numeric(&mut self, op: Opcode) -> Result<()> {
        let max_len = self.config.max_num_length;
        match op {
            Opcode::OneAdd
            | Opcode::OneSub
            | Opcode::Negate
            | Opcode::Abs
            | Opcode::Not
            | Opcode::ZeroNotEqual => {
                let a = self.pop_num(op)?;
                let r = match op {
                    Opcode::OneAdd => a.checked_add(1),
                    Opcode::OneSub => a.checked_sub(1),
                    Opcode::Negate => a.checked_neg(),
                    Opcode::Abs => a.checked_abs(),
                    Opcode::Not => Some((a == 0) as i64),
                    _ => Some((a != 0) as i64),
                };
                self.push_result(op, r, max_len)
            }
            Opcode::Within => {
                let name = op.name();
                self.stack.require(name, 3)?;
                let max = self.pop_num(op)?;
                let min = self.pop_num(op)?;
                let x = self.pop_num(op)?;
                self.stack.push_bool(min <= x && x < max);
                Ok(())
            }
            _ => {
                self.stack.require(op.name(), 2)?;
                let b = self.pop_num(op)?;
                let a = self.pop_num(op)?;
                let r = match op {
                    Opcode::Add => a.checked_add(b),
                    Opcode::Sub => a.checked_sub(b),
                    Opcode::BoolAnd => Some((a != 0 && b != 0) as i64),
                    Opcode::BoolOr => Some((a != 0 || b != 0) as i64),
                    Opcode::NumEqual | Opcode::NumEqualVerify => Some((a == b) as i64),
                    Opcode::NumNotEqual => Some((a != b) as i64),
                    Opcode::LessThan => Some((a < b) as i64),
                    Opcode::GreaterThan => Some((a > b) as i64),
                    Opcode::LessThanOrEqual => Some((a <= b) as i64),
                    Opcode::GreaterThanOrEqual => Some((a >= b) as i64),
                    Opcode::Min => Some(a.min(b)),
                    Opcode::Max => Some(a.max(b)),
                    other => return Err(misrouted(other, "numeric")),
                };
                self.push_result(op, r, max_len)?;
                if op == Opcode::NumEqualVerify {
                    self.verify(op)?;
                }
                Ok(())
            }
        }
    }

    fn push_result(&mut self, op: Opcode, r: Option<i64>, max_len: usize) -> Result<()> {
        let r = r.ok_or_else(|| TxError::NumericOverflow(format!("{} overflowed", op.name())))?;
        let r = ScriptNum::check_range(r, max_len)?;
        self.stack.push_num(r);
        Ok(())
    }
}
