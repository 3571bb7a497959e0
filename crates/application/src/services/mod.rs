//! Queue services
//!
//! The work queue engine plus its worker runloop and maintenance loop.

mod work_queue;

pub use work_queue::{EnqueueOutcome, HandlerError, QueueEntry, WorkQueue, WorkQueueBuilder};
