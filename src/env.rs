//! Environment replication: `.env*` files and the Node dependency cache.
//!
//! Everything here is convenience copying. Misses are logged and skipped.

use crate::error::Result;
use crate::process::{CommandSpec, ProcessRunner};
use glob::{MatchOptions, Pattern};
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Dependency cache directory that is never searched and copied wholesale
pub const NODE_MODULES: &str = "node_modules";

/// Default depth for the `.env*` search (the root counts as level one)
pub const DEFAULT_ENV_SEARCH_DEPTH: usize = 3;

/// Find `.env*` files under `root`, at most `max_depth` levels deep.
///
/// Returned paths are relative to `root` and sorted. The walk never descends
/// into `node_modules` or hidden directories such as `.git`.
pub fn find_env_files(root: &Path, max_depth: usize) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let mut level = vec![root.to_path_buf()];

    for _ in 0..max_depth {
        let mut next = Vec::new();
        for dir in &level {
            for path in glob_in(dir, ".env*") {
                if path.is_file()
                    && let Ok(relative) = path.strip_prefix(root)
                {
                    found.push(relative.to_path_buf());
                }
            }
            next.extend(
                glob_in(dir, "*")
                    .into_iter()
                    .filter(|path| path.is_dir() && path.file_name().is_some_and(|n| n != NODE_MODULES)),
            );
        }
        level = next;
    }

    found.sort();
    found
}

/// Entries of `dir` matching `pattern`; `*` does not match a leading dot
fn glob_in(dir: &Path, pattern: &str) -> Vec<PathBuf> {
    let full = format!("{}/{}", Pattern::escape(&dir.to_string_lossy()), pattern);
    let options = MatchOptions {
        require_literal_leading_dot: true,
        ..MatchOptions::new()
    };
    match glob::glob_with(&full, options) {
        Ok(entries) => entries.flatten().collect(),
        Err(e) => {
            warn!("Bad env glob {}: {}", full, e);
            Vec::new()
        }
    }
}

/// Copy every `.env*` file from `source` into the same relative spot in `dest`.
///
/// Missing parent directories in `dest` are not created; such files are
/// skipped. Returns how many files were copied.
pub fn copy_env_files(source: &Path, dest: &Path, max_depth: usize) -> usize {
    let mut copied = 0;
    for relative in find_env_files(source, max_depth) {
        let target = dest.join(&relative);
        match fs::copy(source.join(&relative), &target) {
            Ok(_) => {
                debug!("Copied {}", relative.display());
                copied += 1;
            }
            Err(e) => warn!("Skipped {}: {}", relative.display(), e),
        }
    }
    info!("Copied {} env file(s) into {}", copied, dest.display());
    copied
}

/// Copy `source/node_modules` to `dest/node_modules`.
///
/// Tries a copy-on-write clone first and falls back to a plain recursive
/// copy. Returns `false` when there was nothing to copy or the target is
/// already populated.
pub fn copy_dependency_cache(runner: &dyn ProcessRunner, source: &Path, dest: &Path) -> Result<bool> {
    let from = source.join(NODE_MODULES);
    let to = dest.join(NODE_MODULES);
    if !from.is_dir() {
        return Ok(false);
    }
    if to.exists() {
        debug!("{} already present, not copying", to.display());
        return Ok(false);
    }

    for spec in copy_commands(&from, &to) {
        let output = runner.output(&spec)?;
        if output.success() {
            info!("Copied {} with `{}`", NODE_MODULES, spec.program);
            return Ok(true);
        }
        warn!("`{}` failed: {}", spec.display(), output.error_message());
        // a failed clone can leave a partial tree behind
        if to.exists() {
            let _ = fs::remove_dir_all(&to);
        }
    }
    Ok(false)
}

/// Clone-capable copy for this platform, then the plain fallback
fn copy_commands(from: &Path, to: &Path) -> Vec<CommandSpec> {
    let from = from.to_string_lossy().to_string();
    let to = to.to_string_lossy().to_string();
    let plain = CommandSpec::new("cp").args(["-R", from.as_str(), to.as_str()]);

    let clone = if cfg!(target_os = "macos") {
        Some(CommandSpec::new("cp").args(["-c", "-R", from.as_str(), to.as_str()]))
    } else if cfg!(target_os = "linux") {
        Some(CommandSpec::new("cp").args(["-R", "--reflink=auto", from.as_str(), to.as_str()]))
    } else {
        None
    };

    clone.into_iter().chain(std::iter::once(plain)).collect()
}
