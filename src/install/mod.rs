//! Dependency installer.
//!
//! The project's ecosystem is detected once from marker files in the
//! fracture, then dispatched with an exhaustive match.

pub mod node;

pub use node::{PackageManager, VersionManager};

use crate::env;
use crate::error::{FractureError, Result};
use crate::fracture::Fracture;
use crate::process::{CommandSpec, ProcessRunner};
use crate::repository::Repository;
use crate::status::StatusSink;
use log::{info, warn};
use std::path::Path;

/// Project ecosystem, by marker file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ecosystem {
    Node,
    Rust,
    Go,
    None,
}

impl Ecosystem {
    /// `package.json`, else `Cargo.toml`, else `go.mod`.
    pub fn detect(dir: &Path) -> Self {
        if dir.join("package.json").is_file() {
            Self::Node
        } else if dir.join("Cargo.toml").is_file() {
            Self::Rust
        } else if dir.join("go.mod").is_file() {
            Self::Go
        } else {
            Self::None
        }
    }
}

/// Installer knobs taken from config.
#[derive(Debug, Clone, Copy)]
pub struct InstallOptions {
    /// Seed `node_modules` from the source checkout before installing
    pub copy_dependency_cache: bool,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self {
            copy_dependency_cache: true,
        }
    }
}

/// Install or fetch the fracture's dependencies.
///
/// A tool exiting non-zero yields [`FractureError::Install`] with its
/// stderr; callers treat that as a warning since the fracture stays usable.
pub fn install_deps(
    runner: &dyn ProcessRunner,
    repository: &Repository,
    fracture: &Fracture,
    status: &mut dyn StatusSink,
    options: InstallOptions,
) -> Result<()> {
    let dir = &fracture.path;
    let ecosystem = Ecosystem::detect(dir);
    info!("Detected {:?} project in {}", ecosystem, dir.display());

    let command = match ecosystem {
        Ecosystem::None => return Ok(()),
        Ecosystem::Node => {
            if options.copy_dependency_cache {
                status.update("Copying node_modules");
                if let Err(e) = env::copy_dependency_cache(runner, &repository.root, dir) {
                    warn!("Could not copy node_modules: {}", e);
                }
            }
            let manager = VersionManager::from_env(runner);
            let command = node::install_command(dir, manager.as_ref());
            status.update(&format!(
                "Installing dependencies with {}",
                PackageManager::detect(dir)
            ));
            command
        }
        Ecosystem::Rust => {
            status.update("Fetching crates with cargo");
            CommandSpec::new("cargo").arg("fetch").current_dir(dir)
        }
        Ecosystem::Go => {
            status.update("Downloading Go modules");
            CommandSpec::new("go").args(["mod", "download"]).current_dir(dir)
        }
    };

    let result = run_install(runner, &command);
    status.stop();
    result
}

fn run_install(runner: &dyn ProcessRunner, command: &CommandSpec) -> Result<()> {
    let output = runner
        .output(command)
        .map_err(|e| FractureError::Install(e.to_string()))?;
    if output.success() {
        Ok(())
    } else {
        warn!("`{}` failed: {}", command.display(), output.error_message());
        Err(FractureError::Install(output.error_message()))
    }
}
