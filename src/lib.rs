//! fracture - ephemeral git worktrees
//!
//! A fracture is a git worktree under `~/.fracture/<repo>/<id>` that lets you
//! work on a second branch without disturbing whatever is running in the
//! primary checkout. Environment files and dependency caches are copied in,
//! dependencies are installed, and the user is dropped into a subshell.

pub mod env;
pub mod error;
pub mod factory;
pub mod fracture;
pub mod git;
pub mod install;
pub mod lifecycle;
pub mod picker;
pub mod process;
pub mod registry;
pub mod repository;
pub mod status;

pub use error::{FractureError, Result};
pub use fracture::Fracture;
pub use lifecycle::{Context, CreateOptions, Outcome};
pub use repository::Repository;
