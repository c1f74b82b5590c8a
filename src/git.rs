//! Typed git invocations on top of [`ProcessRunner`].

use crate::error::Result;
use crate::process::{CommandSpec, ProcessOutput, ProcessRunner};
use std::path::{Path, PathBuf};

/// Git commands run from a fixed directory.
pub struct Git<'a> {
    runner: &'a dyn ProcessRunner,
    dir: PathBuf,
}

impl<'a> Git<'a> {
    pub fn new(runner: &'a dyn ProcessRunner, dir: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            dir: dir.into(),
        }
    }

    /// Run `git <args>` and capture the result
    pub fn run<I, S>(&self, args: I) -> Result<ProcessOutput>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let spec = CommandSpec::new("git").args(args).current_dir(&self.dir);
        self.runner.output(&spec)
    }

    /// Trimmed stdout of a successful query, `None` if git failed
    fn query(&self, args: &[&str]) -> Result<Option<String>> {
        let output = self.run(args.iter().copied())?;
        if output.success() {
            Ok(Some(output.stdout.trim().to_string()))
        } else {
            Ok(None)
        }
    }

    /// `git rev-parse --show-toplevel`
    pub fn toplevel(&self) -> Result<Option<PathBuf>> {
        Ok(self.query(&["rev-parse", "--show-toplevel"])?.map(PathBuf::from))
    }

    /// `git rev-parse --git-common-dir`, exactly as git prints it (may be relative)
    pub fn common_dir(&self) -> Result<Option<PathBuf>> {
        Ok(self.query(&["rev-parse", "--git-common-dir"])?.map(PathBuf::from))
    }

    /// Local branch names
    pub fn local_branches(&self) -> Result<Vec<String>> {
        let branches = self
            .query(&["branch", "--format=%(refname:short)"])?
            .unwrap_or_default();
        Ok(branches
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// `git worktree list --porcelain`
    pub fn worktree_list(&self) -> Result<ProcessOutput> {
        self.run(["worktree", "list", "--porcelain"])
    }

    /// Add a worktree at `path` on a new branch cut from HEAD
    pub fn worktree_add_new_branch(&self, path: &Path, branch: &str) -> Result<ProcessOutput> {
        self.run([
            "worktree".to_string(),
            "add".to_string(),
            "-b".to_string(),
            branch.to_string(),
            path.to_string_lossy().to_string(),
        ])
    }

    /// Add a worktree at `path` checking out an existing branch
    pub fn worktree_add(&self, path: &Path, branch: &str) -> Result<ProcessOutput> {
        self.run([
            "worktree".to_string(),
            "add".to_string(),
            path.to_string_lossy().to_string(),
            branch.to_string(),
        ])
    }

    /// Remove the worktree at `path`
    pub fn worktree_remove(&self, path: &Path, force: bool) -> Result<ProcessOutput> {
        let mut args = vec!["worktree".to_string(), "remove".to_string()];
        if force {
            args.push("--force".to_string());
        }
        args.push(path.to_string_lossy().to_string());
        self.run(args)
    }

    /// `git config --get <key>`
    pub fn config_get(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .query(&["config", "--get", key])?
            .filter(|value| !value.is_empty()))
    }

    /// Whether `refs/remotes/<remote>/<branch>` exists locally
    pub fn has_remote_branch(&self, remote: &str, branch: &str) -> Result<bool> {
        let reference = format!("refs/remotes/{}/{}", remote, branch);
        let output = self.run(["show-ref", "--verify", "--quiet", reference.as_str()])?;
        Ok(output.success())
    }

    /// `git branch --set-upstream-to=<upstream> <branch>`
    pub fn set_upstream(&self, branch: &str, upstream: &str) -> Result<ProcessOutput> {
        self.run(["branch".to_string(), format!("--set-upstream-to={}", upstream), branch.to_string()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::MockRunner;

    #[test]
    fn test_local_branches_parses_lines() {
        let runner = MockRunner::new().on("git branch --format", ProcessOutput::ok("main\ndevelop\n\n"));
        let git = Git::new(&runner, "/repo");
        assert_eq!(git.local_branches().unwrap(), vec!["main", "develop"]);
    }

    #[test]
    fn test_local_branches_empty_on_failure() {
        let runner = MockRunner::new().on("git branch", ProcessOutput::failure(128, "fatal"));
        let git = Git::new(&runner, "/repo");
        assert!(git.local_branches().unwrap().is_empty());
    }

    #[test]
    fn test_worktree_remove_force_flag() {
        let runner = MockRunner::new();
        let git = Git::new(&runner, "/repo");
        git.worktree_remove(Path::new("/home/u/.fracture/app/x"), true).unwrap();
        git.worktree_remove(Path::new("/home/u/.fracture/app/y"), false).unwrap();
        assert_eq!(
            runner.calls(),
            vec![
                "git worktree remove --force /home/u/.fracture/app/x",
                "git worktree remove /home/u/.fracture/app/y",
            ]
        );
    }

    #[test]
    fn test_commands_run_in_dir() {
        let runner = MockRunner::new();
        Git::new(&runner, "/repo").worktree_list().unwrap();
        assert_eq!(runner.specs()[0].cwd, Some(PathBuf::from("/repo")));
    }

    #[test]
    fn test_config_get_empty_is_none() {
        let runner = MockRunner::new().on("git config --get branch.x.remote", ProcessOutput::ok("\n"));
        let git = Git::new(&runner, "/repo");
        assert_eq!(git.config_get("branch.x.remote").unwrap(), None);
    }

    #[test]
    fn test_set_upstream_args() {
        let runner = MockRunner::new();
        Git::new(&runner, "/repo").set_upstream("develop", "origin/develop").unwrap();
        assert_eq!(runner.calls(), vec!["git branch --set-upstream-to=origin/develop develop"]);
    }
}
