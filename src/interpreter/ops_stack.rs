//! Stack rearrangement opcodes.

use super::stack::as_bool;
use super::{misrouted, ExecState};
use crate::error::{Result, TxError};
use crate::opcodes::Opcode;

impl ExecState<'_> {
    pub(crate) fn exec_stack(&mut self, op: Opcode) -> Result<()> {
        let name = op.name();
        match op {
            Opcode::ToAltStack => {
                let item = self.stack.pop(name)?;
                self.alt.push(item);
            }
            Opcode::FromAltStack => {
                let item = self.alt.pop(name)?;
                self.stack.push(item);
            }
            Opcode::TwoDrop => {
                self.stack.require(name, 2)?;
                self.stack.pop(name)?;
                self.stack.pop(name)?;
            }
            Opcode::TwoDup => self.copy_top(name, 2, 2)?,
            Opcode::ThreeDup => self.copy_top(name, 3, 3)?,
            Opcode::TwoOver => self.copy_top(name, 4, 2)?,
            Opcode::TwoRot => {
                self.stack.require(name, 6)?;
                let a = self.stack.remove(name, 5)?;
                let b = self.stack.remove(name, 4)?;
                self.stack.push(a);
                self.stack.push(b);
            }
            Opcode::TwoSwap => {
                self.stack.require(name, 4)?;
                let a = self.stack.remove(name, 3)?;
                let b = self.stack.remove(name, 2)?;
                self.stack.push(a);
                self.stack.push(b);
            }
            Opcode::IfDup => {
                let top = self.stack.top(name)?;
                if as_bool(top) {
                    let copy = top.to_vec();
                    self.stack.push(copy);
                }
            }
            Opcode::Depth => {
                let depth = self.stack.len() as i64;
                self.stack.push_num(depth);
            }
            Opcode::Drop => {
                self.stack.pop(name)?;
            }
            Opcode::Dup => {
                let top = self.stack.top(name)?.to_vec();
                self.stack.push(top);
            }
            Opcode::Nip => {
                self.stack.remove(name, 1)?;
            }
            Opcode::Over => {
                let item = self.stack.peek(name, 1)?.to_vec();
                self.stack.push(item);
            }
            Opcode::Pick | Opcode::Roll => {
                let n = self.pop_num(op)?;
                let depth = usize::try_from(n).map_err(|_| TxError::StackUnderflow {
                    op: name,
                    needed: 0,
                    depth: self.stack.len(),
                })?;
                let item = if op == Opcode::Pick {
                    self.stack.peek(name, depth)?.to_vec()
                } else {
                    self.stack.remove(name, depth)?
                };
                self.stack.push(item);
            }
            Opcode::Rot => {
                let item = self.stack.remove(name, 2)?;
                self.stack.push(item);
            }
            Opcode::Swap => {
                let item = self.stack.remove(name, 1)?;
                self.stack.push(item);
            }
            Opcode::Tuck => {
                self.stack.require(name, 2)?;
                let top = self.stack.top(name)?.to_vec();
                self.stack.insert(name, 2, top)?;
            }
            Opcode::Size => {
                let len = self.stack.top(name)?.len() as i64;
                self.stack.push_num(len);
            }
            other => return Err(misrouted(other, "stack")),
        }
        Ok(())
    }

    /// Push copies of `count` items starting `from` deep, preserving order.
    fn copy_top(&mut self, name: &'static str, from: usize, count: usize) -> Result<()> {
        self.stack.require(name, from)?;
        for _ in 0..count {
            let item = self.stack.peek(name, from - 1)?.to_vec();
            self.stack.push(item);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::config::ScriptConfig;
    use crate::error::TxError;
    use crate::interpreter::{eval_script, NoSignatureChecker, Stack};
    use crate::script::Script;

    fn run_on(initial: Vec<Vec<u8>>, script: Vec<u8>) -> (Result<(), TxError>, Vec<Vec<u8>>) {
        let mut stack = Stack::from(initial);
        let res = eval_script(
            &Script::from(script),
            &mut stack,
            &NoSignatureChecker,
            &ScriptConfig::default(),
        );
        (res, stack.into_items())
    }

    fn items(xs: &[u8]) -> Vec<Vec<u8>> {
        xs.iter().map(|x| vec![*x]).collect()
    }

    #[test]
    fn test_dup_drop_leaves_stack_unchanged() {
        let (res, stack) = run_on(items(&[7]), vec![0x76, 0x75]); // OP_DUP OP_DROP
        assert!(res.is_ok());
        assert_eq!(stack, items(&[7]));
    }

    #[test]
    fn test_drop_empty_stack() {
        let (res, _) = run_on(vec![], vec![0x75]);
        assert_eq!(
            res,
            Err(TxError::StackUnderflow {
                op: "OP_DROP",
                needed: 1,
                depth: 0
            })
        );
    }

    #[test]
    fn test_dup_empty_stack() {
        let (res, _) = run_on(vec![], vec![0x76]);
        assert!(matches!(res, Err(TxError::StackUnderflow { op: "OP_DUP", .. })));
    }

    #[test]
    fn test_swap_rot_over_nip_tuck() {
        assert_eq!(run_on(items(&[1, 2]), vec![0x7c]).1, items(&[2, 1])); // SWAP
        assert_eq!(run_on(items(&[1, 2, 3]), vec![0x7b]).1, items(&[2, 3, 1])); // ROT
        assert_eq!(run_on(items(&[1, 2]), vec![0x78]).1, items(&[1, 2, 1])); // OVER
        assert_eq!(run_on(items(&[1, 2]), vec![0x77]).1, items(&[2])); // NIP
        assert_eq!(run_on(items(&[1, 2]), vec![0x7d]).1, items(&[2, 1, 2])); // TUCK
    }

    #[test]
    fn test_two_item_ops() {
        assert_eq!(run_on(items(&[1, 2]), vec![0x6e]).1, items(&[1, 2, 1, 2])); // 2DUP
        assert_eq!(
            run_on(items(&[1, 2, 3]), vec![0x6f]).1,
            items(&[1, 2, 3, 1, 2, 3])
        ); // 3DUP
        assert_eq!(
            run_on(items(&[1, 2, 3, 4]), vec![0x70]).1,
            items(&[1, 2, 3, 4, 1, 2])
        ); // 2OVER
        assert_eq!(
            run_on(items(&[1, 2, 3, 4, 5, 6]), vec![0x71]).1,
            items(&[3, 4, 5, 6, 1, 2])
        ); // 2ROT
        assert_eq!(
            run_on(items(&[1, 2, 3, 4]), vec![0x72]).1,
            items(&[3, 4, 1, 2])
        ); // 2SWAP
        assert_eq!(run_on(items(&[1, 2, 3]), vec![0x6d]).1, items(&[1])); // 2DROP
    }

    #[test]
    fn test_underflow_reports_requirement() {
        let (res, stack) = run_on(items(&[1]), vec![0x6e]); // 2DUP
        assert_eq!(
            res,
            Err(TxError::StackUnderflow {
                op: "OP_2DUP",
                needed: 2,
                depth: 1
            })
        );
        assert_eq!(stack, items(&[1]));
        assert!(run_on(items(&[1, 2, 3, 4, 5]), vec![0x71]).0.is_err()); // 2ROT
    }

    #[test]
    fn test_pick_and_roll() {
        // OP_2 OP_PICK
        assert_eq!(
            run_on(items(&[9, 8, 7]), vec![0x52, 0x79]).1,
            items(&[9, 8, 7, 9])
        );
        // OP_2 OP_ROLL
        assert_eq!(
            run_on(items(&[9, 8, 7]), vec![0x52, 0x7a]).1,
            items(&[8, 7, 9])
        );
        // OP_3 OP_PICK past the bottom
        assert!(matches!(
            run_on(items(&[9, 8, 7]), vec![0x53, 0x79]).0,
            Err(TxError::StackUnderflow { .. })
        ));
        // OP_1NEGATE OP_PICK
        assert!(run_on(items(&[9]), vec![0x4f, 0x79]).0.is_err());
    }

    #[test]
    fn test_ifdup_depth_size() {
        assert_eq!(run_on(items(&[1]), vec![0x73]).1, items(&[1, 1]));
        assert_eq!(run_on(vec![vec![]], vec![0x73]).1, vec![Vec::<u8>::new()]);
        assert_eq!(run_on(items(&[5, 5]), vec![0x74]).1, items(&[5, 5, 2]));
        assert_eq!(
            run_on(vec![vec![0xaa; 3]], vec![0x82]).1,
            vec![vec![0xaa; 3], vec![3]]
        );
        assert_eq!(run_on(vec![], vec![0x74]).1, vec![Vec::<u8>::new()]);
    }

    #[test]
    fn test_alt_stack_roundtrip() {
        // OP_TOALTSTACK OP_3 OP_FROMALTSTACK
        assert_eq!(
            run_on(items(&[1]), vec![0x6b, 0x53, 0x6c]).1,
            items(&[3, 1])
        );
    }
}
