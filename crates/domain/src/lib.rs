//! Domain layer for RelayQ
//!
//! Core queue vocabulary: item identifiers, queue names, the store key
//! schema, configuration, and statistics. This layer has no I/O and defines
//! the ubiquitous language.

pub mod config;
pub mod errors;
pub mod key_schema;
pub mod stats;
pub mod value_objects;

pub use config::QueueConfig;
pub use errors::DomainError;
pub use key_schema::KeySchema;
pub use stats::QueueStats;
pub use value_objects::*;
