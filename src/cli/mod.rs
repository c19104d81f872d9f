//! CLI module for testdriver - command-line interface and subcommands.

pub mod commands;

pub use commands::Cli;
