//! Command-line interface definitions and parsing

use clap::{Parser, Subcommand, ValueEnum};
use sentinel_core::DuplicatePolicy;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Pipeline configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay fragment files through the pipeline, one receiver per file
    Replay {
        /// Files with one hex fragment per line
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Fragments a group needs before it resolves
        #[arg(short, long, default_value_t = 3)]
        min_fragments: usize,

        /// Compute workers (overrides the configuration file)
        #[arg(short, long)]
        workers: Option<usize>,

        /// Group id bit position (overrides the configuration file)
        #[arg(long)]
        id_shift: Option<u32>,

        /// What to do when a group resolves more than once
        #[arg(long, value_enum)]
        policy: Option<PolicyArg>,

        /// Also write events as JSON lines to this file
        #[arg(long, value_name = "FILE")]
        json: Option<PathBuf>,
    },
    /// Print the group id of every fragment without running the pipeline
    Groups {
        /// Files with one hex fragment per line
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Group id bit position (overrides the configuration file)
        #[arg(long)]
        id_shift: Option<u32>,
    },
}

/// Command-line spelling of [`DuplicatePolicy`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    KeepFirst,
    SendAll,
}

impl From<PolicyArg> for DuplicatePolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::KeepFirst => DuplicatePolicy::KeepFirst,
            PolicyArg::SendAll => DuplicatePolicy::SendAll,
        }
    }
}
