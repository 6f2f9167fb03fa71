// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! On-device key/value storage for in-progress workout sessions.
//!
//! This is the local counterpart of the remote document store: a flat
//! string → string map scoped to one device. Only execution session state
//! lives here.

pub mod file;
pub mod memory;
pub mod progress;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use progress::{ProgressStore, SessionSnapshot};

/// Local storage errors
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error for key {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed value for key {key}: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A flat string key → string value store.
pub trait LocalStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}
