// chain-core/src/lib.rs

//! Core runtime layer shared by the PoVB consensus modules
//!
//! This crate provides the pieces every module builds on:
//! - Per-block execution context and event collection
//! - Key-value state store abstraction with an in-memory implementation
//! - Store key layout for all persisted entities
//! - Module parameters and their validation

pub mod context;
pub mod events;
pub mod keys;
pub mod params;
pub mod store;
pub mod types;

pub use context::BlockContext;
pub use events::{Event, EventAttribute, EventManager};
pub use params::Params;
pub use store::{MemoryStore, StateStore};
pub use types::{BlockHeight, Coin, Timestamp, MODULE_NAME};

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in the core runtime layer
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Store error: {0}")]
    Store(String),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),
}
