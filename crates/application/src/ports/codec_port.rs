//! Payload codec port
//!
//! Payloads cross the store as opaque bytes; the codec owns the mapping in
//! both directions. The default JSON codec suits most payloads; binary
//! codecs plug in through the same trait.

use serde::{Serialize, de::DeserializeOwned};

use crate::error::ApplicationError;

/// Encodes and decodes one payload type
pub trait PayloadCodec<T>: Send + Sync {
    /// Serialize a payload for storage
    fn encode(&self, payload: &T) -> Result<Vec<u8>, ApplicationError>;

    /// Deserialize a stored payload
    fn decode(&self, bytes: &[u8]) -> Result<T, ApplicationError>;
}

/// JSON codec backed by serde_json
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl<T> PayloadCodec<T> for JsonCodec
where
    T: Serialize + DeserializeOwned,
{
    fn encode(&self, payload: &T) -> Result<Vec<u8>, ApplicationError> {
        serde_json::to_vec(payload).map_err(|e| ApplicationError::Serialization(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<T, ApplicationError> {
        serde_json::from_slice(bytes).map_err(|e| ApplicationError::Serialization(e.to_string()))
    }
}
