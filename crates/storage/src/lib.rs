// storage/src/lib.rs

//! Persistent Storage Layer
//!
//! This crate provides the RocksDB-backed implementation of the
//! `StateStore` trait the consensus modules run against:
//! - Flat byte-keyed namespace with prefix iteration
//! - Open/create handling with tunable options

pub mod db;

pub use db::{Database, DatabaseConfig};

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}
