//! CLI module for fracture - command-line interface and subcommands.

pub mod commands;

pub use commands::Cli;
