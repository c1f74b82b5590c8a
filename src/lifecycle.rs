//! Command pipelines: create, list, select, delete.
//!
//! Every call re-derives the repository and its fractures from git and the
//! filesystem; nothing survives between invocations.

use crate::env;
use crate::error::{FractureError, Result};
use crate::factory;
use crate::fracture::Fracture;
use crate::git::Git;
use crate::install::{self, InstallOptions};
use crate::picker::{Picker, Selection};
use crate::process::ProcessRunner;
use crate::registry;
use crate::repository::Repository;
use crate::status::StatusSink;
use log::{info, warn};
use std::path::PathBuf;

/// Result of an operation that may stop at an interactive picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Done(T),
    Cancelled,
}

impl<T> From<Selection<T>> for Outcome<T> {
    fn from(selection: Selection<T>) -> Self {
        match selection {
            Selection::Selected(value) => Outcome::Done(value),
            Selection::Cancelled => Outcome::Cancelled,
        }
    }
}

/// Options for creating a fracture.
#[derive(Debug, Clone)]
pub struct CreateOptions {
    /// New branch to cut from HEAD; `None` means pick an existing branch
    pub new_branch: Option<String>,
    pub copy_env_files: bool,
    pub env_search_depth: usize,
    pub install_deps: bool,
    pub install: InstallOptions,
}

impl Default for CreateOptions {
    fn default() -> Self {
        Self {
            new_branch: None,
            copy_env_files: true,
            env_search_depth: env::DEFAULT_ENV_SEARCH_DEPTH,
            install_deps: true,
            install: InstallOptions::default(),
        }
    }
}

/// A freshly created fracture and what happened while preparing it.
#[derive(Debug, Clone)]
pub struct Created {
    pub fracture: Fracture,
    pub env_files_copied: usize,
    /// Installer stderr when dependency installation failed
    pub install_warning: Option<String>,
}

/// Per-fracture results of a bulk delete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteReport {
    pub deleted: Vec<String>,
    /// `(id, error)` for each fracture that could not be removed
    pub failures: Vec<(String, String)>,
}

impl DeleteReport {
    pub fn is_empty(&self) -> bool {
        self.deleted.is_empty() && self.failures.is_empty()
    }
}

/// Where and how commands run: the process seam, the home directory that
/// holds `.fracture/`, and the directory the tool was invoked from.
pub struct Context<'a> {
    pub runner: &'a dyn ProcessRunner,
    pub home: PathBuf,
    pub cwd: PathBuf,
}

impl<'a> Context<'a> {
    pub fn new(runner: &'a dyn ProcessRunner, home: impl Into<PathBuf>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            home: home.into(),
            cwd: cwd.into(),
        }
    }

    pub fn repository(&self) -> Result<Repository> {
        Repository::detect(self.runner, &self.cwd)
    }

    /// Create a fracture, replicate env files and install dependencies.
    ///
    /// Without `options.new_branch` the user picks an existing branch; a
    /// cancel returns before anything is touched.
    pub fn create(
        &self,
        options: &CreateOptions,
        picker: &dyn Picker,
        status: &mut dyn StatusSink,
    ) -> Result<Outcome<Created>> {
        let repository = self.repository()?;

        let (branch, new_branch) = match &options.new_branch {
            Some(branch) => (branch.clone(), true),
            None => {
                let branches = Git::new(self.runner, &repository.root).local_branches()?;
                if branches.is_empty() {
                    return Err(FractureError::NoBranches);
                }
                match picker.pick("Select a branch", &branches)? {
                    Selection::Selected(index) => (branches[index].clone(), false),
                    Selection::Cancelled => return Ok(Outcome::Cancelled),
                }
            }
        };

        let fracture = factory::create(self.runner, &repository, &self.home, &branch, new_branch)?;
        info!("Created fracture {} at {}", fracture.id, fracture.path.display());

        let env_files_copied = if options.copy_env_files {
            env::copy_env_files(&repository.root, &fracture.path, options.env_search_depth)
        } else {
            0
        };

        let install_warning = if options.install_deps {
            match install::install_deps(self.runner, &repository, &fracture, status, options.install) {
                Ok(()) => None,
                Err(FractureError::Install(message)) => Some(message),
                Err(e) => {
                    warn!("Dependency install aborted: {}", e);
                    Some(e.to_string())
                }
            }
        } else {
            None
        };

        Ok(Outcome::Done(Created {
            fracture,
            env_files_copied,
            install_warning,
        }))
    }

    /// Every fracture of the current repository.
    pub fn list(&self) -> Result<Vec<Fracture>> {
        let repository = self.repository()?;
        registry::list_fractures(self.runner, &repository, &self.home)
    }

    /// Resolve a fracture by id, or let the user pick one when `id` is `None`.
    pub fn select(&self, id: Option<&str>, picker: &dyn Picker) -> Result<Outcome<Fracture>> {
        let mut fractures = self.list()?;
        if fractures.is_empty() {
            return Err(FractureError::NoFractures);
        }

        match id {
            Some(id) => fractures
                .into_iter()
                .find(|fracture| fracture.id == id)
                .map(Outcome::Done)
                .ok_or_else(|| FractureError::NotFound(id.to_string())),
            None => {
                let labels: Vec<String> = fractures.iter().map(Fracture::label).collect();
                let selection = picker.pick("Select a fracture", &labels)?;
                Ok(selection.map(|index| fractures.swap_remove(index)).into())
            }
        }
    }

    /// Delete every fracture, continuing past failures.
    ///
    /// With no fractures this returns an empty report without calling git.
    pub fn delete_all(&self, force: bool) -> Result<DeleteReport> {
        let fractures = self.list()?;
        Ok(delete_each(self.runner, &fractures, force))
    }
}

/// Delete fractures in order, collecting one failure entry per error.
pub fn delete_each(runner: &dyn ProcessRunner, fractures: &[Fracture], force: bool) -> DeleteReport {
    let mut report = DeleteReport::default();
    for fracture in fractures {
        match fracture.delete(runner, force) {
            Ok(()) => report.deleted.push(fracture.id.clone()),
            Err(e) => {
                let message = match e {
                    FractureError::Deletion(message) => message,
                    other => other.to_string(),
                };
                warn!("Failed to delete {}: {}", fracture.id, message);
                report.failures.push((fracture.id.clone(), message));
            }
        }
    }
    report
}
