//! CLI command definitions using clap.
//!
//! With no subcommand the tool creates a fracture and enters it:
//! - list/ls: list fractures of the current repository
//! - enter: open a shell in a fracture
//! - delete/rm: remove one or all fractures
//! - path: print a fracture's directory

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// fracture - ephemeral git worktrees for working on a second branch
#[derive(Parser, Debug)]
#[command(name = "fracture")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Create a new branch with this name off the current HEAD
    #[arg(short, long)]
    pub branch: Option<String>,

    /// Skip dependency installation in the new fracture
    #[arg(long)]
    pub no_install: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List fractures of the current repository
    #[command(visible_alias = "ls")]
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Open a shell inside a fracture
    Enter {
        /// Fracture id (pick interactively when omitted)
        id: Option<String>,
    },

    /// Delete a fracture
    #[command(visible_alias = "rm")]
    Delete {
        /// Fracture id (pick interactively when omitted)
        id: Option<String>,

        /// Remove even with uncommitted changes
        #[arg(short, long)]
        force: bool,

        /// Delete every fracture of this repository
        #[arg(short, long, conflicts_with = "id")]
        all: bool,
    },

    /// Print the directory of a fracture
    Path {
        /// Fracture id (pick interactively when omitted)
        id: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_structure_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_parse_no_args() {
        // No args means create from a picked branch
        let cli = Cli::try_parse_from(["fracture"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.branch.is_none());
        assert!(!cli.verbose);
        assert!(!cli.no_install);
    }

    #[test]
    fn test_cli_new_branch() {
        let cli = Cli::try_parse_from(["fracture", "-b", "hotfix/urgent"]).unwrap();
        assert_eq!(cli.branch.as_deref(), Some("hotfix/urgent"));

        let cli = Cli::try_parse_from(["fracture", "--branch", "feat", "--no-install"]).unwrap();
        assert_eq!(cli.branch.as_deref(), Some("feat"));
        assert!(cli.no_install);
    }

    #[test]
    fn test_cli_config_option() {
        let cli = Cli::try_parse_from(["fracture", "-c", "/path/to/fracture.yml", "list"]).unwrap();
        assert_eq!(cli.config.as_ref(), Some(&PathBuf::from("/path/to/fracture.yml")));
    }

    #[test]
    fn test_list_and_alias() {
        for name in ["list", "ls"] {
            let cli = Cli::try_parse_from(["fracture", name]).unwrap();
            match cli.command {
                Some(Commands::List { json }) => assert!(!json),
                _ => panic!("Expected list command"),
            }
        }

        let cli = Cli::try_parse_from(["fracture", "ls", "--json"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::List { json: true })));
    }

    #[test]
    fn test_enter_optional_id() {
        let cli = Cli::try_parse_from(["fracture", "enter"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Enter { id: None })));

        let cli = Cli::try_parse_from(["fracture", "enter", "develop"]).unwrap();
        match cli.command {
            Some(Commands::Enter { id }) => assert_eq!(id.as_deref(), Some("develop")),
            _ => panic!("Expected enter command"),
        }
    }

    #[test]
    fn test_delete_flags() {
        let cli = Cli::try_parse_from(["fracture", "delete", "-a", "-f"]).unwrap();
        match cli.command {
            Some(Commands::Delete { id, force, all }) => {
                assert!(id.is_none());
                assert!(force);
                assert!(all);
            }
            _ => panic!("Expected delete command"),
        }

        let cli = Cli::try_parse_from(["fracture", "rm", "develop", "--force"]).unwrap();
        match cli.command {
            Some(Commands::Delete { id, force, all }) => {
                assert_eq!(id.as_deref(), Some("develop"));
                assert!(force);
                assert!(!all);
            }
            _ => panic!("Expected delete command"),
        }
    }

    #[test]
    fn test_delete_all_conflicts_with_id() {
        let result = Cli::try_parse_from(["fracture", "delete", "develop", "--all"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_path_command() {
        let cli = Cli::try_parse_from(["fracture", "path", "develop"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Path { id: Some(_) })));
    }

    #[test]
    fn test_unknown_command_fails() {
        assert!(Cli::try_parse_from(["fracture", "rename"]).is_err());
    }
}
