//! Sentinel CLI library
//!
//! Replays hex fragment files through the pipeline: each file becomes one
//! receiver, results go to the console and optionally to a JSON-lines file.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod input;
pub mod output;

pub use cli::{Cli, Commands, PolicyArg};
pub use commands::{run_replay, write_groups, CommandDispatcher, ReplayOptions};
pub use config::{load_config, parse_config, resolve_config, Overrides};
pub use error::{CliError, Result};
pub use input::{read_fragments, FileReceiver};
pub use output::{ConsoleTransmitter, JsonTransmitter, OutputEvent, SharedWriter, TeeTransmitter};
