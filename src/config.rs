use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    /// Subshell override; `$SHELL` and then `/bin/sh` otherwise
    pub shell: Option<String>,
    pub copy_env_files: bool,
    pub env_search_depth: usize,
    pub install_deps: bool,
    pub copy_dependency_cache: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            shell: None,
            copy_env_files: true,
            env_search_depth: fracture::env::DEFAULT_ENV_SEARCH_DEPTH,
            install_deps: true,
            copy_dependency_cache: true,
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try primary location: ~/.config/<project>/<project>.yml
        if let Some(config_dir) = dirs::config_dir() {
            let project_name = env!("CARGO_PKG_NAME");
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        // Try fallback location: ./<project>.yml
        let project_name = env!("CARGO_PKG_NAME");
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.copy_env_files);
        assert!(config.install_deps);
        assert!(config.copy_dependency_cache);
        assert_eq!(config.env_search_depth, 3);
        assert!(config.shell.is_none());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("fracture.yml");
        fs::write(&path, "shell: /usr/bin/fish\ninstall_deps: false\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.shell.as_deref(), Some("/usr/bin/fish"));
        assert!(!config.install_deps);
        assert!(config.copy_env_files);
        assert_eq!(config.env_search_depth, 3);
    }

    #[test]
    fn test_explicit_missing_file_fails() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("missing.yml");
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_invalid_yaml_fails() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("fracture.yml");
        fs::write(&path, "env_search_depth: [not, a, number]\n").unwrap();
        assert!(Config::load(Some(&path)).is_err());
    }
}
