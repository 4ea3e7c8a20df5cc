//! Storage backends implementing the [`EntityStore`] port.
//!
//! [`EntityStore`]: crate::domain::ports::EntityStore

pub mod in_memory;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
