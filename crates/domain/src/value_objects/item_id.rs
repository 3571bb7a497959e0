//! Item identifier for queued work items

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::DomainError;

/// A unique work item identifier
///
/// Rendered as 32 lowercase hex characters (a UUIDv4 in simple form). The hex
/// form is embedded verbatim in store keys, so cohabiting implementations
/// reading the same store see the same addresses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Create a new random item id
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Parse an item id from its 32-character hex form
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not exactly 32 hex characters.
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        if s.len() == 32 && s.bytes().all(|b| b.is_ascii_hexdigit()) {
            Ok(Self(s.to_ascii_lowercase()))
        } else {
            Err(DomainError::InvalidItemId(s.to_string()))
        }
    }

    /// Borrow the hex form
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_item_id_is_unique() {
        let id1 = ItemId::new();
        let id2 = ItemId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn new_item_id_is_32_hex_chars() {
        let id = ItemId::new();
        assert_eq!(id.as_str().len(), 32);
        assert!(id.as_str().bytes().all(|b| b.is_ascii_hexdigit()));
        assert_eq!(id.as_str(), id.as_str().to_ascii_lowercase());
    }

    #[test]
    fn item_id_roundtrips_through_string() {
        let original = ItemId::new();
        let parsed = ItemId::parse(&original.to_string()).unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn parse_uppercase_normalizes() {
        let id = ItemId::parse("0123456789ABCDEF0123456789ABCDEF").unwrap();
        assert_eq!(id.as_str(), "0123456789abcdef0123456789abcdef");
    }

    #[test]
    fn parse_wrong_length_returns_error() {
        assert!(ItemId::parse("abc123").is_err());
        assert!(ItemId::parse("").is_err());
    }

    #[test]
    fn parse_non_hex_returns_error() {
        assert!(ItemId::parse("zzzz456789abcdef0123456789abcdef").is_err());
    }

    #[test]
    fn serde_is_transparent() {
        let id = ItemId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
    }
}
