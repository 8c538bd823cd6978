#![forbid(unsafe_code)]

pub mod progress_store;
pub mod repository;
pub mod sqlite;

pub use progress_store::{PROGRESS_KEY, ProgressStore};
pub use repository::{InMemoryStore, KeyValueStore, ProgressRepository, Storage, StorageError};
