//! CLI argument definitions using clap

use clap::{ArgAction, Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "reqtree", version, about = "Run request files with chained dependencies", long_about = None)]
pub struct Args {
    /// Workspace root holding the profiles file (default: current directory)
    #[arg(long, global = true, value_name = "DIR", env = "REQTREE_ROOT")]
    pub root: Option<PathBuf>,

    /// Switch to this profile first (clears the session)
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,

    /// Show chain progress and extracted values
    #[arg(short = 'v', long = "verbose", global = true, action = ArgAction::SetTrue)]
    pub verbose: bool,

    /// Debug logging
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    pub debug: bool,

    /// Never prompt; interactive variables use their defaults
    #[arg(long = "no-prompt", global = true, action = ArgAction::SetTrue)]
    pub no_prompt: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run a request file and everything it depends on
    Run(RunArgs),

    /// Show the execution order for a request file without running it
    Plan {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Inspect or edit session variables
    #[command(subcommand)]
    Session(SessionCommand),

    /// List, switch or edit profiles
    #[command(subcommand)]
    Profile(ProfileCommand),
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RunArgs {
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Set a session variable before running (repeatable)
    #[arg(long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment)]
    pub set: Vec<(String, String)>,

    /// Print the plan instead of executing
    #[arg(long = "dry-run", action = ArgAction::SetTrue)]
    pub dry_run: bool,

    /// Exit with an error when the final response is not 2xx
    #[arg(long = "check-status", action = ArgAction::SetTrue)]
    pub check_status: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SessionCommand {
    /// Show session and profile variables
    Show,
    /// Set a session variable
    Set { name: String, value: String },
    /// Remove a session variable
    Unset { name: String },
    /// Remove every session variable
    Clear,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ProfileCommand {
    /// List profiles, marking the active one
    List,
    /// Switch the active profile (clears the session)
    Use { name: String },
    /// Select an option of a multi-value variable in the active profile
    Select {
        variable: String,
        /// Option index, alias or value
        option: String,
    },
}

/// Parses `NAME=VALUE`
pub fn parse_assignment(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected NAME=VALUE, got '{}'", s)),
    }
}
