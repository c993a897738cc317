//! Evaluation stack of byte vectors with numeric and boolean views.

use super::num::ScriptNum;
use crate::error::{Result, TxError};

/// Truthiness of a stack item: any non-zero byte, except a lone sign bit in
/// the last position (negative zero).
pub fn as_bool(item: &[u8]) -> bool {
    for (i, &b) in item.iter().enumerate() {
        if b != 0 {
            return !(i == item.len() - 1 && b == 0x80);
        }
    }
    false
}

pub fn encode_bool(v: bool) -> Vec<u8> {
    if v {
        vec![1]
    } else {
        Vec::new()
    }
}

/// Depths are counted from the top: depth 0 is the top item.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stack {
    items: Vec<Vec<u8>>,
}

impl Stack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items bottom first.
    pub fn items(&self) -> &[Vec<u8>] {
        &self.items
    }

    pub fn into_items(self) -> Vec<Vec<u8>> {
        self.items
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn push(&mut self, item: Vec<u8>) {
        self.items.push(item);
    }

    pub fn push_bool(&mut self, v: bool) {
        self.items.push(encode_bool(v));
    }

    pub fn push_num(&mut self, n: i64) {
        self.items.push(ScriptNum::encode(n));
    }

    pub fn require(&self, op: &'static str, needed: usize) -> Result<()> {
        if self.items.len() < needed {
            return Err(TxError::StackUnderflow {
                op,
                needed,
                depth: self.items.len(),
            });
        }
        Ok(())
    }

    pub fn pop(&mut self, op: &'static str) -> Result<Vec<u8>> {
        self.require(op, 1)?;
        Ok(self.items.pop().unwrap_or_default())
    }

    pub fn pop_bool(&mut self, op: &'static str) -> Result<bool> {
        Ok(as_bool(&self.pop(op)?))
    }

    pub fn pop_num(&mut self, op: &'static str, max_len: usize) -> Result<i64> {
        ScriptNum::decode(&self.pop(op)?, max_len)
    }

    pub fn peek(&self, op: &'static str, depth: usize) -> Result<&[u8]> {
        self.require(op, depth + 1)?;
        Ok(&self.items[self.items.len() - 1 - depth])
    }

    pub fn top(&self, op: &'static str) -> Result<&[u8]> {
        self.peek(op, 0)
    }

    /// Remove and return the item at `depth`.
    pub fn remove(&mut self, op: &'static str, depth: usize) -> Result<Vec<u8>> {
        self.require(op, depth + 1)?;
        let idx = self.items.len() - 1 - depth;
        Ok(self.items.remove(idx))
    }

    /// Insert `item` so that it ends up at `depth`.
    pub fn insert(&mut self, op: &'static str, depth: usize, item: Vec<u8>) -> Result<()> {
        self.require(op, depth)?;
        let idx = self.items.len() - depth;
        self.items.insert(idx, item);
        Ok(())
    }
}

impl From<Vec<Vec<u8>>> for Stack {
    fn from(items: Vec<Vec<u8>>) -> Self {
        Self { items }
    }
}
