//! Error types for fracture
//!
//! Centralized error handling using thiserror. A cancelled picker is not an
//! error; see [`crate::picker::Selection`].

use thiserror::Error;

/// All error types that can occur while managing fractures
#[derive(Debug, Error)]
pub enum FractureError {
    /// Not inside a git repository, or git is unavailable
    #[error("Not a git repository (or git is not installed)")]
    NotARepository,

    /// A named fracture or branch does not exist
    #[error("Fracture not found: {0}")]
    NotFound(String),

    /// The repository has no fractures at all
    #[error("No fractures found")]
    NoFractures,

    /// The repository has no local branches to pick from
    #[error("No branches found")]
    NoBranches,

    /// A fracture with the same id is already on disk
    #[error("Fracture already exists: {0} (one fracture per branch)")]
    AlreadyExists(String),

    /// `git worktree add` failed
    #[error("Failed to create fracture: {0}")]
    Creation(String),

    /// `git worktree remove` failed
    #[error("Failed to delete fracture: {0}")]
    Deletion(String),

    /// A dependency tool exited non-zero
    #[error("Dependency install failed: {0}")]
    Install(String),

    /// A subprocess could not be spawned at all
    #[error("Process error: {0}")]
    Process(String),

    /// Interactive prompt failure other than a user cancel
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for fracture operations
pub type Result<T> = std::result::Result<T, FractureError>;
