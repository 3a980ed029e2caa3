//! Storage adapters implementing the `EntityStore` port.

pub mod in_memory;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
