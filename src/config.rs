//! Script interpreter limits and decoding policy.

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{Result, TxError};

/// Resource limits applied by the script interpreter.
///
/// The defaults reproduce the classical script rules. A host can load an
/// override from JSON with [`ScriptConfig::from_json`]; fields missing from
/// the document keep their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptConfig {
    pub max_script_size: usize,
    pub max_ops: usize,
    pub max_stack_size: usize,
    pub max_element_size: usize,
    pub max_num_length: usize,
    pub max_pubkeys_per_multisig: usize,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            max_script_size: MAX_SCRIPT_SIZE,
            max_ops: MAX_SCRIPT_OPS,
            max_stack_size: MAX_STACK_SIZE,
            max_element_size: MAX_SCRIPT_ELEMENT_SIZE,
            max_num_length: MAX_SCRIPT_NUM_LENGTH,
            max_pubkeys_per_multisig: MAX_PUBKEYS_PER_MULTISIG,
        }
    }
}

impl ScriptConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let cfg: Self =
            serde_json::from_str(json).map_err(|e| TxError::InvalidConfig(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject limits that would make every script fail or let the step
    /// counter run unbounded.
    pub fn validate(&self) -> Result<()> {
        if self.max_ops == 0 || self.max_stack_size == 0 || self.max_script_size == 0 {
            return Err(TxError::InvalidConfig(
                "script limits must be non-zero".to_string(),
            ));
        }
        if self.max_num_length == 0 || self.max_num_length > 8 {
            return Err(TxError::InvalidConfig(format!(
                "numeric operand length {} outside 1..=8",
                self.max_num_length
            )));
        }
        Ok(())
    }
}

/// Decoding policy for wire data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    /// Reject compact-size integers that use a wider marker than needed.
    pub strict_compact_size: bool,
}

impl DecodeOptions {
    pub fn strict() -> Self {
        Self {
            strict_compact_size: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_constants() {
        let cfg = ScriptConfig::default();
        assert_eq!(cfg.max_ops, MAX_SCRIPT_OPS);
        assert_eq!(cfg.max_num_length, 4);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_from_json_partial_override() {
        let cfg = ScriptConfig::from_json(r#"{"max_ops": 50}"#).unwrap();
        assert_eq!(cfg.max_ops, 50);
        assert_eq!(cfg.max_stack_size, MAX_STACK_SIZE);
    }

    #[test]
    fn test_from_json_rejects_zero_limits() {
        let err = ScriptConfig::from_json(r#"{"max_ops": 0}"#).unwrap_err();
        assert!(matches!(err, TxError::InvalidConfig(_)));
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(
            ScriptConfig::from_json("not json"),
            Err(TxError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_decode_options_default_is_permissive() {
        assert!(!DecodeOptions::default().strict_compact_size);
        assert!(DecodeOptions::strict().strict_compact_size);
    }
}
