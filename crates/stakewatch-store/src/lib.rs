//! This is the stakewatch-store crate - persistence for wallet snapshots and the cumulative series

pub mod csv;
pub mod json_store;
pub mod memory;
pub mod traits;

pub use json_store::JsonFileStore;
pub use memory::MemoryStore;
pub use traits::SnapshotStore;

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("State file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Malformed state in {}: {reason}", path.display())]
    Malformed { path: PathBuf, reason: String },

    #[error("Invalid CSV record on line {line}: {reason}")]
    InvalidRecord { line: u64, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;
