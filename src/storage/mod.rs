//! Storage module for persisting chain and wallet snapshots

pub mod persistence;

pub use persistence::{load_from_file, Storage, StorageConfig, StorageError};
