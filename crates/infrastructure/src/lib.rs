#![forbid(unsafe_code)]
//! Infrastructure layer - Adapters for the queue's collaborators
//!
//! Implements ports defined in the application layer: the in-memory
//! store/bus/lock suite used by tests and single-process embedders, the
//! metrics behavior, configuration loading, and telemetry initialization.

pub mod adapters;
pub mod config;
pub mod telemetry;

pub use adapters::{
    InMemoryMessageBus, InMemoryQueueStore, MetricsQueueBehavior, ThrottledLockProvider,
};
pub use config::QueueSettings;
pub use telemetry::{TelemetryConfig, TelemetryError, init_telemetry};
