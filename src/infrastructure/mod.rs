//! Adapters implementing the domain ports: draft stores and HTTP clients.

pub mod http;
pub mod in_memory;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
