//! Node project support: package manager, version pin and version manager.

use crate::process::{CommandSpec, ProcessRunner};
use log::debug;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Version pin files, highest priority first
pub const VERSION_FILES: [&str; 3] = [".nvmrc", ".node-version", ".tool-versions"];

/// Package manager chosen from the lockfile present in the project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Pnpm,
    Yarn,
    Bun,
    Npm,
}

impl PackageManager {
    /// Lockfile priority: pnpm, yarn, bun (binary or text), else npm.
    pub fn detect(dir: &Path) -> Self {
        if dir.join("pnpm-lock.yaml").is_file() {
            Self::Pnpm
        } else if dir.join("yarn.lock").is_file() {
            Self::Yarn
        } else if dir.join("bun.lockb").is_file() || dir.join("bun.lock").is_file() {
            Self::Bun
        } else {
            Self::Npm
        }
    }

    pub fn program(&self) -> &'static str {
        match self {
            Self::Pnpm => "pnpm",
            Self::Yarn => "yarn",
            Self::Bun => "bun",
            Self::Npm => "npm",
        }
    }

    pub fn install_command(&self, dir: &Path) -> CommandSpec {
        CommandSpec::new(self.program()).arg("install").current_dir(dir)
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program())
    }
}

/// Pinned Node version from the first version file that names one.
pub fn version_pin(dir: &Path) -> Option<String> {
    VERSION_FILES.iter().find_map(|name| {
        let content = fs::read_to_string(dir.join(name)).ok()?;
        let version = if *name == ".tool-versions" {
            parse_tool_versions(&content)
        } else {
            first_value(&content)
        };
        if let Some(v) = &version {
            debug!("Node version {} pinned by {}", v, name);
        }
        version
    })
}

/// First non-empty, non-comment line
fn first_value(content: &str) -> Option<String> {
    content
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
}

/// Version token of the `nodejs` (or `node`) entry in a `.tool-versions` file
pub fn parse_tool_versions(content: &str) -> Option<String> {
    content.lines().find_map(|line| {
        let line = line.split('#').next().unwrap_or_default();
        let mut tokens = line.split_whitespace();
        match tokens.next()? {
            "nodejs" | "node" => tokens.next().map(str::to_string),
            _ => None,
        }
    })
}

/// An installed Node version manager that can run a command under a version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionManager {
    /// `fnm exec --using=<version> ...`
    Fnm,
    /// nvm is a shell function; its script must be sourced first
    Nvm { script: PathBuf },
    /// `n exec <version> ...`
    N,
}

impl VersionManager {
    /// Detect a manager: fnm on PATH, then nvm, then n on PATH.
    ///
    /// nvm is found via `nvm_dir` (the `NVM_DIR` variable) or `~/.nvm`.
    pub fn detect(runner: &dyn ProcessRunner, nvm_dir: Option<PathBuf>, home: Option<PathBuf>) -> Option<Self> {
        if runner.find_program("fnm").is_some() {
            return Some(Self::Fnm);
        }

        let nvm_script = nvm_dir
            .into_iter()
            .chain(home.map(|h| h.join(".nvm")))
            .map(|dir| dir.join("nvm.sh"))
            .find(|script| script.is_file());
        if let Some(script) = nvm_script {
            return Some(Self::Nvm { script });
        }

        if runner.find_program("n").is_some() {
            return Some(Self::N);
        }
        None
    }

    /// Detect using the process environment
    pub fn from_env(runner: &dyn ProcessRunner) -> Option<Self> {
        let nvm_dir = std::env::var_os("NVM_DIR").map(PathBuf::from);
        Self::detect(runner, nvm_dir, dirs::home_dir())
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Fnm => "fnm",
            Self::Nvm { .. } => "nvm",
            Self::N => "n",
        }
    }

    /// Rewrite `command` so it runs under `version`.
    pub fn wrap(&self, version: &str, command: CommandSpec) -> CommandSpec {
        let mut wrapped = match self {
            Self::Fnm => CommandSpec::new("fnm")
                .arg("exec")
                .arg(format!("--using={}", version))
                .arg(command.program.clone()),
            Self::Nvm { script } => CommandSpec::new("bash")
                .arg("-c")
                .arg(r#"s="$1"; shift; . "$s" --no-use && nvm exec "$@""#)
                .arg("fracture")
                .arg(script.to_string_lossy().to_string())
                .arg(version)
                .arg(command.program.clone()),
            Self::N => CommandSpec::new("n")
                .arg("exec")
                .arg(version)
                .arg(command.program.clone()),
        };
        wrapped.args.extend(command.args);
        wrapped.cwd = command.cwd;
        wrapped.env = command.env;
        wrapped
    }
}

/// The install command for the Node project in `dir`, routed through a
/// version manager when the project pins a version and one is available.
pub fn install_command(dir: &Path, manager: Option<&VersionManager>) -> CommandSpec {
    let command = PackageManager::detect(dir).install_command(dir);
    match (version_pin(dir), manager) {
        (Some(version), Some(manager)) => {
            debug!("Running install under Node {} via {}", version, manager.name());
            manager.wrap(&version, command)
        }
        _ => command,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::MockRunner;
    use tempfile::TempDir;

    #[test]
    fn test_package_manager_priority() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        assert_eq!(PackageManager::detect(dir), PackageManager::Npm);

        fs::write(dir.join("bun.lock"), "").unwrap();
        assert_eq!(PackageManager::detect(dir), PackageManager::Bun);

        fs::write(dir.join("yarn.lock"), "").unwrap();
        assert_eq!(PackageManager::detect(dir), PackageManager::Yarn);

        fs::write(dir.join("pnpm-lock.yaml"), "").unwrap();
        assert_eq!(PackageManager::detect(dir), PackageManager::Pnpm);
    }

    #[test]
    fn test_binary_bun_lockfile() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("bun.lockb"), [0u8, 1, 2]).unwrap();
        assert_eq!(PackageManager::detect(temp.path()), PackageManager::Bun);
    }

    #[test]
    fn test_version_pin_priority() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        assert_eq!(version_pin(dir), None);

        fs::write(dir.join(".tool-versions"), "ruby 3.3.0\nnodejs 18.17.0\n").unwrap();
        assert_eq!(version_pin(dir).as_deref(), Some("18.17.0"));

        fs::write(dir.join(".node-version"), "20.11.1\n").unwrap();
        assert_eq!(version_pin(dir).as_deref(), Some("20.11.1"));

        fs::write(dir.join(".nvmrc"), "# lts\nlts/iron\n").unwrap();
        assert_eq!(version_pin(dir).as_deref(), Some("lts/iron"));
    }

    #[test]
    fn test_empty_nvmrc_falls_through() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(".nvmrc"), "\n").unwrap();
        fs::write(temp.path().join(".node-version"), "22\n").unwrap();
        assert_eq!(version_pin(temp.path()).as_deref(), Some("22"));
    }

    #[test]
    fn test_parse_tool_versions() {
        assert_eq!(parse_tool_versions("node 20.0.0 # pinned"), Some("20.0.0".to_string()));
        assert_eq!(parse_tool_versions("python 3.12\n"), None);
        assert_eq!(parse_tool_versions("nodejs\n"), None);
    }

    #[test]
    fn test_detect_fnm_first() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join(".nvm")).unwrap();
        fs::write(temp.path().join(".nvm/nvm.sh"), "").unwrap();
        let runner = MockRunner::new().with_program("fnm").with_program("n");

        let manager = VersionManager::detect(&runner, None, Some(temp.path().to_path_buf()));
        assert_eq!(manager, Some(VersionManager::Fnm));
    }

    #[test]
    fn test_detect_nvm_dir_override_before_home() {
        let nvm_dir = TempDir::new().unwrap();
        let home = TempDir::new().unwrap();
        fs::write(nvm_dir.path().join("nvm.sh"), "").unwrap();
        fs::create_dir_all(home.path().join(".nvm")).unwrap();
        fs::write(home.path().join(".nvm/nvm.sh"), "").unwrap();
        let runner = MockRunner::new().with_program("n");

        let manager = VersionManager::detect(
            &runner,
            Some(nvm_dir.path().to_path_buf()),
            Some(home.path().to_path_buf()),
        );
        assert_eq!(
            manager,
            Some(VersionManager::Nvm {
                script: nvm_dir.path().join("nvm.sh")
            })
        );
    }

    #[test]
    fn test_detect_n_last() {
        let home = TempDir::new().unwrap();
        let runner = MockRunner::new().with_program("n");
        let manager = VersionManager::detect(&runner, None, Some(home.path().to_path_buf()));
        assert_eq!(manager, Some(VersionManager::N));

        let none = VersionManager::detect(&MockRunner::new(), None, Some(home.path().to_path_buf()));
        assert_eq!(none, None);
    }

    #[test]
    fn test_wrap_commands() {
        let command = CommandSpec::new("pnpm").arg("install").current_dir("/f");

        let fnm = VersionManager::Fnm.wrap("20", command.clone());
        assert_eq!(fnm.display(), "fnm exec --using=20 pnpm install");
        assert_eq!(fnm.cwd, Some(PathBuf::from("/f")));

        let n = VersionManager::N.wrap("20", command.clone());
        assert_eq!(n.display(), "n exec 20 pnpm install");

        let nvm = VersionManager::Nvm {
            script: PathBuf::from("/home/u/.nvm/nvm.sh"),
        }
        .wrap("20", command);
        assert_eq!(nvm.program, "bash");
        assert_eq!(&nvm.args[2..], ["fracture", "/home/u/.nvm/nvm.sh", "20", "pnpm", "install"]);
    }

    #[test]
    fn test_install_command_without_pin_is_unwrapped() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("yarn.lock"), "").unwrap();
        let command = install_command(temp.path(), Some(&VersionManager::Fnm));
        assert_eq!(command.display(), "yarn install");
    }

    #[test]
    fn test_install_command_with_pin_and_manager() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(".nvmrc"), "18\n").unwrap();
        let command = install_command(temp.path(), Some(&VersionManager::N));
        assert_eq!(command.display(), "n exec 18 npm install");

        let bare = install_command(temp.path(), None);
        assert_eq!(bare.display(), "npm install");
    }
}
