//! Port definitions for application layer
//!
//! Ports are the interfaces through which the queue engine reaches its
//! collaborators: the shared store, the notification bus, the distributed
//! lock provider, the payload codec, and user-supplied behaviors. Adapters
//! in the infrastructure layer implement these ports.

mod behavior_port;
mod codec_port;
mod lock_port;
mod message_bus_port;
mod store_port;

pub use behavior_port::QueueBehavior;
pub use codec_port::{JsonCodec, PayloadCodec};
#[cfg(test)]
pub use lock_port::MockDistributedLockPort;
pub use lock_port::{DistributedLockPort, LockLease};
#[cfg(test)]
pub use message_bus_port::MockMessageBusPort;
pub use message_bus_port::{MessageBusPort, NotificationHandler};
#[cfg(test)]
pub use store_port::MockQueueStorePort;
pub use store_port::{QueueStorePort, StoreCommand};
