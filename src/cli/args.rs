//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// Compile hierarchical member selections and drill state into set expressions
#[derive(Parser, Debug)]
#[command(name = "seldrill")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output, repeat for more (-d info, -dd debug, -ddd trace)
    #[arg(short = 'd', long = "debug", action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Config file layered over the global one
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the compiled axis expression
    Compile {
        /// Session file
        #[arg(value_hint = ValueHint::FilePath)]
        session: PathBuf,
        /// Also list the tuples the expression denotes
        #[arg(short, long)]
        members: bool,
    },

    /// Print each hierarchy's selection override tree
    Tree {
        /// Session file
        #[arg(value_hint = ValueHint::FilePath)]
        session: PathBuf,
    },

    /// Print the minimal list of selection actions
    Selections {
        /// Session file
        #[arg(value_hint = ValueHint::FilePath)]
        session: PathBuf,
    },

    /// Print the drilled positions that are currently visible
    Positions {
        /// Session file
        #[arg(value_hint = ValueHint::FilePath)]
        session: PathBuf,
    },

    /// Show the effective configuration
    Config,

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}
