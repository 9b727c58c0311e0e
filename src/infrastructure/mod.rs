//! Adapters for the domain ports: in-memory stores, the optional RocksDB
//! persistent store, and the scripted provider used for replays and tests.

pub mod in_memory;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
pub mod scripted;
