//! Fracture registry.
//!
//! Recomputed on every call from two stores: the directories under
//! `<home>/.fracture/<repo>/` and git's own worktree list. Nothing is cached.

use crate::error::{FractureError, Result};
use crate::fracture::{Fracture, UNKNOWN_BRANCH};
use crate::git::Git;
use crate::process::ProcessRunner;
use crate::repository::Repository;
use log::{debug, warn};
use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// List the repository's fractures, sorted by id.
///
/// A missing fracture directory is the normal state for a repository that
/// has never been fractured and yields an empty list.
pub fn list_fractures(runner: &dyn ProcessRunner, repository: &Repository, home: &Path) -> Result<Vec<Fracture>> {
    let dir = repository.fractures_dir(home);
    if !dir.is_dir() {
        debug!("No fracture directory at {}", dir.display());
        return Ok(Vec::new());
    }

    let mut ids = Vec::new();
    for entry in fs::read_dir(&dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            ids.push(entry.file_name().to_string_lossy().to_string());
        }
    }
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    ids.sort();

    let branches = worktree_branches(runner, repository, &dir)?;
    Ok(ids
        .into_iter()
        .map(|id| {
            let branch = branches.get(&id).cloned().unwrap_or_else(|| UNKNOWN_BRANCH.to_string());
            Fracture::new(repository, home, id, branch)
        })
        .collect())
}

/// Find one fracture by exact id.
pub fn find_fracture(runner: &dyn ProcessRunner, repository: &Repository, home: &Path, id: &str) -> Result<Fracture> {
    list_fractures(runner, repository, home)?
        .into_iter()
        .find(|fracture| fracture.id == id)
        .ok_or_else(|| FractureError::NotFound(id.to_string()))
}

fn worktree_branches(runner: &dyn ProcessRunner, repository: &Repository, dir: &Path) -> Result<HashMap<String, String>> {
    let output = Git::new(runner, &repository.root).worktree_list()?;
    if !output.success() {
        warn!("git worktree list failed: {}", output.error_message());
        return Ok(HashMap::new());
    }

    // git prints symlink-resolved paths, so match against both spellings
    let mut roots = vec![dir.to_path_buf()];
    if let Ok(canonical) = fs::canonicalize(dir)
        && canonical != dir
    {
        roots.push(canonical);
    }
    Ok(parse_worktree_branches(&output.stdout, &roots))
}

/// Map fracture id to branch from `git worktree list --porcelain` output.
///
/// Only worktrees under one of `roots` are considered. The most recent
/// `branch` line of a record wins; detached records map to `unknown`.
pub fn parse_worktree_branches(porcelain: &str, roots: &[PathBuf]) -> HashMap<String, String> {
    let mut branches = HashMap::new();
    let mut current: Option<String> = None;

    for line in porcelain.lines() {
        if let Some(path) = line.strip_prefix("worktree ") {
            current = fracture_id(Path::new(path), roots);
            if let Some(id) = &current {
                branches.insert(id.clone(), UNKNOWN_BRANCH.to_string());
            }
        } else if line.is_empty() {
            current = None;
        } else if let Some(id) = &current {
            if let Some(reference) = line.strip_prefix("branch ") {
                let branch = reference.strip_prefix("refs/heads/").unwrap_or(reference);
                branches.insert(id.clone(), branch.to_string());
            } else if line == "detached" {
                branches.insert(id.clone(), UNKNOWN_BRANCH.to_string());
            }
        }
    }

    branches
}

/// First path segment below one of `roots`
fn fracture_id(path: &Path, roots: &[PathBuf]) -> Option<String> {
    roots.iter().find_map(|root| {
        let rest = path.strip_prefix(root).ok()?;
        match rest.components().next()? {
            Component::Normal(segment) => Some(segment.to_string_lossy().to_string()),
            _ => None,
        }
    })
}
