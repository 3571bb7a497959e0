//! Adapters implementing the application-layer ports

mod memory_message_bus;
mod memory_store;
mod metrics_behavior;
mod throttled_lock;

pub use memory_message_bus::InMemoryMessageBus;
pub use memory_store::InMemoryQueueStore;
pub use metrics_behavior::MetricsQueueBehavior;
pub use throttled_lock::ThrottledLockProvider;
