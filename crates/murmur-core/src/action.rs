//! Action: a named command invocation flooded through the network.
//!
//! An action is immutable once created. Its hash is computed exactly once
//! at creation from the canonical encoding of (provider, command,
//! parameters, timestamp) and is the action's identity for deduplication:
//! two actions are "the same" iff their hashes are equal.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::canonical::{canonical_bytes, content_hash, ACTION_DOMAIN};
use crate::error::CoreError;
use crate::types::ActionHash;

/// Ordered parameter mapping carried by an action.
///
/// A `BTreeMap` keeps the canonical encoding independent of insertion order.
pub type Parameters = BTreeMap<String, serde_json::Value>;

/// A single command invocation together with its arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Name of the provider the command belongs to.
    pub provider: String,

    /// The command name.
    pub command: String,

    /// Command arguments, keyed by name.
    pub parameters: Parameters,

    /// Creation time (Unix milliseconds).
    pub timestamp: i64,

    /// Content hash, assigned at creation and immutable thereafter.
    pub hash: ActionHash,
}

impl Action {
    /// Create a new action, computing its hash from the content.
    pub fn new(
        provider: impl Into<String>,
        command: impl Into<String>,
        parameters: Parameters,
    ) -> Result<Self, CoreError> {
        let provider = provider.into();
        let command = command.into();
        let timestamp = now_millis();
        let hash = Self::compute_hash(&provider, &command, &parameters, timestamp)?;
        Ok(Self {
            provider,
            command,
            parameters,
            timestamp,
            hash,
        })
    }

    /// Compute the content hash of an action's parts.
    pub fn compute_hash(
        provider: &str,
        command: &str,
        parameters: &Parameters,
        timestamp: i64,
    ) -> Result<ActionHash, CoreError> {
        let bytes = canonical_bytes(&(provider, command, parameters, timestamp))?;
        Ok(ActionHash(content_hash(ACTION_DOMAIN, &bytes)))
    }

    /// Recompute the hash and compare it to the stored one.
    ///
    /// Used when ingesting actions that arrived over the wire.
    pub fn verify_hash(&self) -> Result<(), CoreError> {
        let expected =
            Self::compute_hash(&self.provider, &self.command, &self.parameters, self.timestamp)?;
        if expected != self.hash {
            return Err(CoreError::ActionHashMismatch {
                expected: expected.to_hex(),
                actual: self.hash.to_hex(),
            });
        }
        Ok(())
    }
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_millis() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Parameters {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
            .collect()
    }

    #[test]
    fn test_action_hash_assigned_at_creation() {
        let action = Action::new("test-mod", "test-cmd", Parameters::new()).unwrap();
        assert_ne!(action.hash, ActionHash::ZERO);
    }

    #[test]
    fn test_action_hash_depends_on_content() {
        let a = Action::new("test-mod", "test-cmd", params(&[("key", "one")])).unwrap();
        let b = Action::new("test-mod", "test-cmd", params(&[("key", "two")])).unwrap();
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn test_action_hash_parameter_order_independent() {
        let mut forward = Parameters::new();
        forward.insert("a".into(), serde_json::json!(1));
        forward.insert("b".into(), serde_json::json!(2));

        let mut reversed = Parameters::new();
        reversed.insert("b".into(), serde_json::json!(2));
        reversed.insert("a".into(), serde_json::json!(1));

        let ts = 1_700_000_000_000;
        let h1 = Action::compute_hash("p", "c", &forward, ts).unwrap();
        let h2 = Action::compute_hash("p", "c", &reversed, ts).unwrap();
        assert_eq!(h1, h2);
    }

    #[test]
    fn test_action_verify_hash() {
        let mut action = Action::new("test-mod", "test-cmd", params(&[("key", "val")])).unwrap();
        action.verify_hash().unwrap();

        action.hash = ActionHash::from_bytes([0xff; 32]);
        assert!(action.verify_hash().is_err());
    }

    #[test]
    fn test_action_json_roundtrip_preserves_hash() {
        let action = Action::new("messenger", "create-board", params(&[("name", "general")]))
            .unwrap();
        let json = serde_json::to_string(&action).unwrap();
        let back: Action = serde_json::from_str(&json).unwrap();
        assert_eq!(action, back);
        back.verify_hash().unwrap();
    }
}
