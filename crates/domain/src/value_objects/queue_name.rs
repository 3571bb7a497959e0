//! Sanitized queue name

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Fallback name when a payload type yields nothing usable
const FALLBACK_NAME: &str = "work";

/// The logical name of a queue, sanitized for use inside store keys
///
/// Sanitization removes whitespace and replaces `:` with `-` so the name
/// cannot collide with the `:`-separated key schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueueName(String);

impl QueueName {
    /// Create a queue name from raw input, applying sanitization
    ///
    /// # Errors
    ///
    /// Returns an error if nothing remains after sanitization.
    pub fn new(raw: &str) -> Result<Self, DomainError> {
        let sanitized: String = raw
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| if c == ':' { '-' } else { c })
            .collect();

        if sanitized.is_empty() {
            return Err(DomainError::InvalidQueueName(raw.to_string()));
        }
        Ok(Self(sanitized))
    }

    /// Derive the default queue name from a payload type
    ///
    /// Uses the last path segment of the type name with any generic
    /// arguments stripped, e.g. `orders::OrderPlaced` becomes `OrderPlaced`.
    #[must_use]
    pub fn for_payload<T>() -> Self {
        let full = std::any::type_name::<T>();
        let base = full.split('<').next().unwrap_or(full);
        let last = base.rsplit("::").next().unwrap_or(base);
        Self::new(last).unwrap_or_else(|_| Self(FALLBACK_NAME.to_string()))
    }

    /// Borrow the sanitized form
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueueName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
