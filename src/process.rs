//! Process runner: the single seam every git and toolchain call goes through.
//!
//! `SystemRunner` spawns real processes; `MockRunner` answers from a script so
//! git and package-manager behaviour can be simulated in tests.

use crate::error::{FractureError, Result};
use log::debug;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// A command to run: program, arguments, working directory and extra env.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
}

impl CommandSpec {
    /// Create a spec for the given program with no arguments
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: Vec::new(),
        }
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set the working directory
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Add an environment variable
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Program and arguments joined by spaces, for logs and mock matching
    pub fn display(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }

    fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }
        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        cmd
    }
}

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code; `None` when the process was killed by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    /// A successful run with the given stdout
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A failed run with the given exit code and stderr
    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Trimmed stderr, or a fallback when the tool printed nothing
    pub fn error_message(&self) -> String {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            "unknown error".to_string()
        } else {
            stderr.to_string()
        }
    }
}

/// Run external processes, capturing or inheriting stdio.
///
/// Children stay in the caller's process group, so a terminal interrupt
/// reaches them as well as us.
pub trait ProcessRunner {
    /// Run to completion with stdout/stderr captured
    fn output(&self, spec: &CommandSpec) -> Result<ProcessOutput>;

    /// Run with the terminal attached, returning the exit code
    fn interactive(&self, spec: &CommandSpec) -> Result<Option<i32>>;

    /// Locate a program on PATH
    fn find_program(&self, name: &str) -> Option<PathBuf> {
        which::which(name).ok()
    }
}

/// Runner backed by `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn output(&self, spec: &CommandSpec) -> Result<ProcessOutput> {
        debug!("running: {} (cwd: {:?})", spec.display(), spec.cwd);
        let output = spec
            .to_command()
            .stdin(Stdio::null())
            .output()
            .map_err(|e| FractureError::Process(format!("Failed to execute {}: {}", spec.program, e)))?;

        let result = ProcessOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };
        debug!("{} exited with {:?}", spec.program, result.code);
        Ok(result)
    }

    fn interactive(&self, spec: &CommandSpec) -> Result<Option<i32>> {
        debug!("running interactively: {} (cwd: {:?})", spec.display(), spec.cwd);
        let status = spec
            .to_command()
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| FractureError::Process(format!("Failed to execute {}: {}", spec.program, e)))?;
        Ok(status.code())
    }
}

/// Scripted runner for unit tests.
///
/// Responses are matched by prefix against [`CommandSpec::display`]; the first
/// registered match wins. Unmatched commands succeed with empty output.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MockRunner {
    responses: Vec<(String, ProcessOutput)>,
    programs: Vec<String>,
    calls: std::cell::RefCell<Vec<CommandSpec>>,
}

#[cfg(test)]
impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer commands starting with `prefix` with `output`
    pub fn on(mut self, prefix: impl Into<String>, output: ProcessOutput) -> Self {
        self.responses.push((prefix.into(), output));
        self
    }

    /// Pretend `name` is installed on PATH
    pub fn with_program(mut self, name: impl Into<String>) -> Self {
        self.programs.push(name.into());
        self
    }

    /// Every command run so far, rendered with `display()`
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().iter().map(CommandSpec::display).collect()
    }

    /// Every command run so far
    pub fn specs(&self) -> Vec<CommandSpec> {
        self.calls.borrow().clone()
    }

    fn respond(&self, spec: &CommandSpec) -> ProcessOutput {
        self.calls.borrow_mut().push(spec.clone());
        let line = spec.display();
        self.responses
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix.as_str()))
            .map(|(_, output)| output.clone())
            .unwrap_or_else(|| ProcessOutput::ok(""))
    }
}

#[cfg(test)]
impl ProcessRunner for MockRunner {
    fn output(&self, spec: &CommandSpec) -> Result<ProcessOutput> {
        Ok(self.respond(spec))
    }

    fn interactive(&self, spec: &CommandSpec) -> Result<Option<i32>> {
        Ok(self.respond(spec).code)
    }

    fn find_program(&self, name: &str) -> Option<PathBuf> {
        self.programs
            .iter()
            .find(|p| p.as_str() == name)
            .map(|p| PathBuf::from("/usr/bin").join(p))
    }
}
