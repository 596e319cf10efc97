//! Fragment file input
//!
//! A fragment file holds one hex fragment per line, with or without `0x`.
//! Blank lines and lines starting with `#` are skipped.

use crate::error::{CliError, Result};
use sentinel_core::{Fragment, Receiver, SentinelError, SentinelResult};
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Parse one line; `None` for blanks and comments
pub fn parse_line(line: &str) -> Option<SentinelResult<Fragment>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    Some(Fragment::parse_hex(trimmed))
}

/// Read every fragment of a file eagerly
pub fn read_fragments(path: &Path) -> Result<Vec<Fragment>> {
    let reader = BufReader::new(File::open(path)?);
    let mut fragments = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        match parse_line(&line?) {
            Some(Ok(fragment)) => fragments.push(fragment),
            Some(Err(source)) => {
                return Err(CliError::Parse {
                    path: path.to_path_buf(),
                    line: index + 1,
                    source,
                })
            }
            None => {}
        }
    }
    Ok(fragments)
}

// ----------------------------------------------------------------------------
// File Receiver
// ----------------------------------------------------------------------------

/// Receiver streaming fragments from a file line by line
///
/// A malformed line or read error fails the receiver; fragments before it
/// have already been submitted.
pub struct FileReceiver {
    name: String,
    path: PathBuf,
    lines: Lines<BufReader<File>>,
    line: usize,
}

impl FileReceiver {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        debug!(path = %path.display(), "opened fragment file");

        Ok(Self {
            name: path.display().to_string(),
            path,
            lines: BufReader::new(file).lines(),
            line: 0,
        })
    }
}

impl Receiver for FileReceiver {
    fn receive(&mut self) -> SentinelResult<Option<Fragment>> {
        for line in self.lines.by_ref() {
            self.line += 1;
            let line = line.map_err(|e| {
                SentinelError::receiver(format!("{}:{}: {e}", self.path.display(), self.line))
            })?;

            match parse_line(&line) {
                Some(Ok(fragment)) => return Ok(Some(fragment)),
                Some(Err(e)) => {
                    return Err(SentinelError::receiver(format!(
                        "{}:{}: {e}",
                        self.path.display(),
                        self.line
                    )))
                }
                None => continue,
            }
        }
        Ok(None)
    }

    fn name(&self) -> &str {
        &self.name
    }
}
