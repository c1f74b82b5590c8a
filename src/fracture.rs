//! The Fracture entity and its enter/delete operations.

use crate::error::{FractureError, Result};
use crate::git::Git;
use crate::process::{CommandSpec, ProcessRunner};
use crate::repository::Repository;
use log::info;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Branch reported when git has no usable record for a fracture
pub const UNKNOWN_BRANCH: &str = "unknown";

/// Shell used when neither config nor `$SHELL` names one
pub const DEFAULT_SHELL: &str = "/bin/sh";

/// A managed worktree living at `<home>/.fracture/<repo>/<id>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fracture {
    pub id: String,
    pub path: PathBuf,
    pub branch: String,
    #[serde(skip)]
    pub repository: Repository,
}

impl Fracture {
    pub fn new(repository: &Repository, home: &Path, id: impl Into<String>, branch: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            path: repository.fractures_dir(home).join(&id),
            id,
            branch: branch.into(),
            repository: repository.clone(),
        }
    }

    /// `<id> <<branch>>`, as printed by `list` and shown in pickers
    pub fn label(&self) -> String {
        format!("{} <{}>", self.id, self.branch)
    }

    pub fn exists(&self) -> bool {
        self.path.is_dir()
    }

    /// Open an interactive shell in the fracture and wait for it to exit.
    pub fn enter(&self, runner: &dyn ProcessRunner, shell: &str) -> Result<Option<i32>> {
        if !self.exists() {
            return Err(FractureError::NotFound(self.id.clone()));
        }
        info!("Entering fracture {} with {}", self.id, shell);
        let spec = CommandSpec::new(shell).current_dir(&self.path);
        runner.interactive(&spec)
    }

    /// Remove the fracture's worktree; `force` allows a dirty tree.
    pub fn delete(&self, runner: &dyn ProcessRunner, force: bool) -> Result<()> {
        info!("Deleting fracture {} (force: {})", self.id, force);
        let output = Git::new(runner, &self.repository.root).worktree_remove(&self.path, force)?;
        if output.success() {
            Ok(())
        } else {
            Err(FractureError::Deletion(output.error_message()))
        }
    }
}

/// Pick the subshell: explicit override, then `$SHELL`, then `/bin/sh`.
pub fn resolve_shell(configured: Option<&str>) -> String {
    configured
        .map(str::to_string)
        .or_else(|| std::env::var("SHELL").ok())
        .filter(|shell| !shell.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_SHELL.to_string())
}
