//! Repository locator.
//!
//! The canonical name comes from git's common directory so it is the same
//! whether we run from the primary checkout or from inside a fracture.

use crate::error::{FractureError, Result};
use crate::git::Git;
use crate::process::ProcessRunner;
use log::debug;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Directory under the user's home that holds every repository's fractures
pub const FRACTURE_DIR_NAME: &str = ".fracture";

/// The git project a fracture belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Repository {
    /// Stable name shared by the primary checkout and all its worktrees
    pub name: String,
    /// Primary working tree
    pub root: PathBuf,
}

impl Repository {
    /// Detect the repository enclosing `cwd`.
    pub fn detect(runner: &dyn ProcessRunner, cwd: &Path) -> Result<Self> {
        let git = Git::new(runner, cwd);
        let toplevel = git.toplevel()?.ok_or(FractureError::NotARepository)?;
        let common_dir = git.common_dir()?.ok_or(FractureError::NotARepository)?;
        debug!("toplevel={} common_dir={}", toplevel.display(), common_dir.display());

        // older gits print `<repo>/.git/worktrees/<id>/../..` from a linked worktree
        let common_dir = if common_dir.is_absolute() {
            fs::canonicalize(&common_dir).unwrap_or(common_dir)
        } else {
            common_dir
        };
        Self::from_git_paths(&toplevel, &common_dir).ok_or(FractureError::NotARepository)
    }

    /// Derive the repository from git's toplevel and common-dir answers.
    ///
    /// An absolute common dir points back at the primary checkout's `.git`, so
    /// its parent names the repository. A relative one (`.git`) means we are
    /// in the primary checkout already.
    pub fn from_git_paths(toplevel: &Path, common_dir: &Path) -> Option<Self> {
        if common_dir.is_absolute() {
            let parent = common_dir.parent()?;
            let name = parent.file_name()?.to_string_lossy().to_string();
            let root = if common_dir.file_name().is_some_and(|n| n == ".git") {
                parent.to_path_buf()
            } else {
                toplevel.to_path_buf()
            };
            Some(Self { name, root })
        } else {
            let name = toplevel.file_name()?.to_string_lossy().to_string();
            Some(Self {
                name,
                root: toplevel.to_path_buf(),
            })
        }
    }

    /// `<home>/.fracture/<name>`
    pub fn fractures_dir(&self, home: &Path) -> PathBuf {
        home.join(FRACTURE_DIR_NAME).join(&self.name)
    }
}

/// The current user's home directory
pub fn home_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .ok_or_else(|| FractureError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "home directory not found")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{MockRunner, ProcessOutput};

    #[test]
    fn test_relative_common_dir_uses_toplevel() {
        let repo = Repository::from_git_paths(Path::new("/src/myapp"), Path::new(".git")).unwrap();
        assert_eq!(repo.name, "myapp");
        assert_eq!(repo.root, PathBuf::from("/src/myapp"));
    }

    #[test]
    fn test_absolute_common_dir_from_fracture() {
        let repo = Repository::from_git_paths(
            Path::new("/home/u/.fracture/myapp/develop"),
            Path::new("/src/myapp/.git"),
        )
        .unwrap();
        assert_eq!(repo.name, "myapp");
        assert_eq!(repo.root, PathBuf::from("/src/myapp"));
    }

    #[test]
    fn test_same_name_from_primary_and_fracture() {
        let primary = Repository::from_git_paths(Path::new("/src/myapp"), Path::new(".git")).unwrap();
        let fracture = Repository::from_git_paths(
            Path::new("/home/u/.fracture/myapp/feature-x"),
            Path::new("/src/myapp/.git"),
        )
        .unwrap();
        assert_eq!(primary, fracture);
    }

    #[test]
    fn test_fractures_dir() {
        let repo = Repository {
            name: "myapp".to_string(),
            root: PathBuf::from("/src/myapp"),
        };
        assert_eq!(
            repo.fractures_dir(Path::new("/home/u")),
            PathBuf::from("/home/u/.fracture/myapp")
        );
    }

    #[test]
    fn test_detect_outside_repository() {
        let runner = MockRunner::new().on(
            "git rev-parse",
            ProcessOutput::failure(128, "fatal: not a git repository"),
        );
        let result = Repository::detect(&runner, Path::new("/tmp"));
        assert!(matches!(result, Err(FractureError::NotARepository)));
    }

    #[test]
    fn test_detect_with_mock_git() {
        let runner = MockRunner::new()
            .on("git rev-parse --show-toplevel", ProcessOutput::ok("/src/myapp\n"))
            .on("git rev-parse --git-common-dir", ProcessOutput::ok(".git\n"));
        let repo = Repository::detect(&runner, Path::new("/src/myapp")).unwrap();
        assert_eq!(repo.name, "myapp");
    }
}
