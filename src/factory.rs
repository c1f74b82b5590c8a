//! Fracture factory: allocate an id, add the worktree, link upstream.
//!
//! Ids are derived from the branch name, so each branch can have at most one
//! fracture per repository. A second request for the same branch fails with
//! [`FractureError::AlreadyExists`] instead of reusing or overwriting.

use crate::error::{FractureError, Result};
use crate::fracture::Fracture;
use crate::git::Git;
use crate::process::ProcessRunner;
use crate::repository::Repository;
use log::{debug, info, warn};
use std::fs;
use std::path::Path;

const UPSTREAM_REMOTE: &str = "origin";

/// Filesystem-safe id for a branch: runs of `/` and `_` become one `-`.
pub fn fracture_id_for_branch(branch: &str) -> String {
    let mut id = String::with_capacity(branch.len());
    let mut in_separator = false;
    for ch in branch.chars() {
        if ch == '/' || ch == '_' {
            if !in_separator {
                id.push('-');
            }
            in_separator = true;
        } else {
            id.push(ch);
            in_separator = false;
        }
    }
    id
}

/// Create a fracture for `branch`.
///
/// With `new_branch` the branch is cut from the primary checkout's HEAD;
/// otherwise the existing branch is checked out and, if it has no upstream,
/// linked to `origin/<branch>` when that exists.
pub fn create(
    runner: &dyn ProcessRunner,
    repository: &Repository,
    home: &Path,
    branch: &str,
    new_branch: bool,
) -> Result<Fracture> {
    let id = fracture_id_for_branch(branch);
    if id.is_empty() || id == "-" || id == "." || id == ".." {
        return Err(FractureError::Creation(format!("invalid branch name: {:?}", branch)));
    }

    let fracture = Fracture::new(repository, home, id, branch);
    if fracture.path.exists() {
        return Err(FractureError::AlreadyExists(fracture.id));
    }

    let dir = repository.fractures_dir(home);
    fs::create_dir_all(&dir)
        .map_err(|e| FractureError::Creation(format!("Failed to create {}: {}", dir.display(), e)))?;

    let git = Git::new(runner, &repository.root);
    info!(
        "Creating fracture {} for {} branch {}",
        fracture.id,
        if new_branch { "new" } else { "existing" },
        branch
    );
    let output = if new_branch {
        git.worktree_add_new_branch(&fracture.path, branch)?
    } else {
        git.worktree_add(&fracture.path, branch)?
    };
    if !output.success() {
        return Err(FractureError::Creation(output.error_message()));
    }

    if !new_branch {
        link_upstream(&git, branch);
    }

    Ok(fracture)
}

/// Best-effort `origin/<branch>` tracking for a branch without an upstream.
fn link_upstream(git: &Git, branch: &str) {
    let configured = |key: String| git.config_get(&key).ok().flatten().is_some();
    if configured(format!("branch.{}.remote", branch)) && configured(format!("branch.{}.merge", branch)) {
        debug!("{} already tracks an upstream", branch);
        return;
    }

    match git.has_remote_branch(UPSTREAM_REMOTE, branch) {
        Ok(true) => {}
        Ok(false) => return,
        Err(e) => {
            warn!("Could not check {}/{}: {}", UPSTREAM_REMOTE, branch, e);
            return;
        }
    }

    let upstream = format!("{}/{}", UPSTREAM_REMOTE, branch);
    match git.set_upstream(branch, &upstream) {
        Ok(output) if output.success() => info!("Linked {} to {}", branch, upstream),
        Ok(output) => warn!("Failed to set upstream {}: {}", upstream, output.error_message()),
        Err(e) => warn!("Failed to set upstream {}: {}", upstream, e),
    }
}
