//! Command handlers for the Sentinel CLI

use crate::cli::{Cli, Commands};
use crate::config::{load_config, resolve_config, Overrides};
use crate::error::Result;
use crate::input::{read_fragments, FileReceiver};
use crate::output::{ConsoleTransmitter, JsonTransmitter, SharedWriter, TeeTransmitter};
use parking_lot::Mutex;
use sentinel_core::{MaximalSolver, PipelineConfig};
use sentinel_harness::ThresholdSearch;
use sentinel_runtime::{PipelineBuilder, PipelineReport};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Everything a replay needs besides the pipeline configuration
#[derive(Debug, Clone, Default)]
pub struct ReplayOptions {
    pub files: Vec<PathBuf>,
    pub min_fragments: usize,
    pub json: Option<PathBuf>,
}

/// Command dispatcher for handling CLI commands
pub struct CommandDispatcher;

impl CommandDispatcher {
    /// Execute a CLI command
    pub fn execute(cli: Cli) -> Result<()> {
        let base = load_config(cli.config.as_deref())?;

        match cli.command {
            Commands::Replay {
                files,
                min_fragments,
                workers,
                id_shift,
                policy,
                json,
            } => {
                let config = resolve_config(
                    base,
                    Overrides {
                        compute_workers: workers,
                        id_shift,
                        duplicate_policy: policy.map(Into::into),
                    },
                )?;
                let options = ReplayOptions {
                    files,
                    min_fragments,
                    json,
                };
                let console: SharedWriter = Arc::new(Mutex::new(std::io::stdout()));
                let report = run_replay(&options, config, console)?;
                info!(
                    groups = report.groups_seen,
                    delivered = report.groups_delivered,
                    incomplete = report.groups_incomplete(),
                    fragments = report.stats.fragments_accepted,
                    "replay finished"
                );
                Ok(())
            }
            Commands::Groups { files, id_shift } => {
                let config = resolve_config(
                    base,
                    Overrides {
                        id_shift,
                        ..Overrides::default()
                    },
                )?;
                let stdout = std::io::stdout();
                write_groups(&files, config.id_shift, &mut stdout.lock())
            }
        }
    }
}

/// Run every file through a fresh pipeline and wait for it to finish
///
/// Every event goes to `console`; with `options.json` set the same events
/// are also written as JSON lines to that file.
pub fn run_replay(
    options: &ReplayOptions,
    config: PipelineConfig,
    console: SharedWriter,
) -> Result<PipelineReport> {
    let solver = MaximalSolver::new(ThresholdSearch::new(options.min_fragments, config.id_shift));

    let mut sinks = TeeTransmitter::new().with_sink(ConsoleTransmitter::new(console));
    if let Some(path) = &options.json {
        let file: SharedWriter = Arc::new(Mutex::new(BufWriter::new(File::create(path)?)));
        sinks = sinks.with_sink(JsonTransmitter::new(file));
    }

    let mut builder = PipelineBuilder::new(solver)
        .with_config(config)
        .transmitter(sinks);
    for path in &options.files {
        builder = builder.receiver(FileReceiver::open(path)?);
    }

    info!(
        files = options.files.len(),
        min_fragments = options.min_fragments,
        "starting replay"
    );
    let mut pipeline = builder.start()?;
    Ok(pipeline.stop()?)
}

/// Print `<fragment> <group>` for every fragment of every file
pub fn write_groups<W: Write>(files: &[PathBuf], id_shift: u32, out: &mut W) -> Result<()> {
    for path in files {
        for fragment in read_fragments(path)? {
            writeln!(out, "{fragment} {}", fragment.group_id(id_shift))?;
        }
    }
    Ok(())
}
