//! Snapshot collection: point-in-time views of a monitored tree.

pub mod snapshot;
pub mod walker;
