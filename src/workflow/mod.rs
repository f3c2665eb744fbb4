pub mod queue_store;
pub mod status;

pub use queue_store::{BatchSummary, QueueCounts, QueueEvent, QueueStore};
pub use status::Transition;
