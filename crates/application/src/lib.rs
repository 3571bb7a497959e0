//! Application layer - Queue orchestration
//!
//! Contains the port definitions for the queue's external collaborators and
//! the engine that drives them: enqueue/dequeue/complete/abandon, the worker
//! runloop, and the cooperative maintenance loop.

pub mod error;
pub mod ports;
pub mod services;

pub use error::ApplicationError;
pub use ports::*;
pub use services::*;
