//! Output sinks
//!
//! Transmitters that write one line per event: a human-readable console
//! format and a JSON-lines format for downstream tooling. The pipeline hands
//! each result to exactly one transmitter, so outputs that must all see every
//! event are combined behind a [`TeeTransmitter`].

use parking_lot::Mutex;
use sentinel_core::{GroupId, SentinelError, SentinelResult, Transmitter};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::sync::Arc;

/// One line of sink output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OutputEvent {
    Sent { group: u64, value: String },
    Incomplete { group: u64 },
}

impl OutputEvent {
    pub fn sent(group: GroupId, value: u128) -> Self {
        OutputEvent::Sent {
            group: group.value(),
            value: format!("{value:#x}"),
        }
    }

    pub fn incomplete(group: GroupId) -> Self {
        OutputEvent::Incomplete {
            group: group.value(),
        }
    }
}

/// Writer shared between a sink and whoever reads its output
pub type SharedWriter = Arc<Mutex<dyn Write + Send>>;

fn write_line(writer: &SharedWriter, group: GroupId, line: &str) -> SentinelResult<()> {
    let mut out = writer.lock();
    writeln!(out, "{line}")
        .and_then(|()| out.flush())
        .map_err(|e| SentinelError::transmitter(group, e.to_string()))
}

// ----------------------------------------------------------------------------
// Console
// ----------------------------------------------------------------------------

/// Human-readable sink: `sent <group> <value>` / `incomplete <group>`
pub struct ConsoleTransmitter {
    writer: SharedWriter,
}

impl ConsoleTransmitter {
    pub fn new(writer: SharedWriter) -> Self {
        Self { writer }
    }

    pub fn stdout() -> Self {
        Self::new(Arc::new(Mutex::new(std::io::stdout())))
    }
}

impl Transmitter<u128> for ConsoleTransmitter {
    fn send(&mut self, group: GroupId, value: &u128) -> SentinelResult<()> {
        write_line(&self.writer, group, &format!("sent {group} {value:#x}"))
    }

    fn incomplete(&mut self, group: GroupId) -> SentinelResult<()> {
        write_line(&self.writer, group, &format!("incomplete {group}"))
    }

    fn name(&self) -> &str {
        "console"
    }
}

// ----------------------------------------------------------------------------
// JSON Lines
// ----------------------------------------------------------------------------

/// Sink writing each event as one JSON object per line
pub struct JsonTransmitter {
    writer: SharedWriter,
}

impl JsonTransmitter {
    pub fn new(writer: SharedWriter) -> Self {
        Self { writer }
    }

    fn emit(&self, group: GroupId, event: &OutputEvent) -> SentinelResult<()> {
        let line = serde_json::to_string(event)
            .map_err(|e| SentinelError::transmitter(group, e.to_string()))?;
        write_line(&self.writer, group, &line)
    }
}

impl Transmitter<u128> for JsonTransmitter {
    fn send(&mut self, group: GroupId, value: &u128) -> SentinelResult<()> {
        self.emit(group, &OutputEvent::sent(group, *value))
    }

    fn incomplete(&mut self, group: GroupId) -> SentinelResult<()> {
        self.emit(group, &OutputEvent::incomplete(group))
    }

    fn name(&self) -> &str {
        "json"
    }
}

// ----------------------------------------------------------------------------
// Fan-out
// ----------------------------------------------------------------------------

/// Forwards every event to each inner sink in order
///
/// All sinks are tried even when one fails; the first error is returned.
pub struct TeeTransmitter {
    sinks: Vec<Box<dyn Transmitter<u128>>>,
}

impl TeeTransmitter {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn with_sink<T: Transmitter<u128> + 'static>(mut self, sink: T) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    fn each<F>(&mut self, mut call: F) -> SentinelResult<()>
    where
        F: FnMut(&mut dyn Transmitter<u128>) -> SentinelResult<()>,
    {
        let mut first_error = None;
        for sink in &mut self.sinks {
            if let Err(e) = call(sink.as_mut()) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl Default for TeeTransmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl Transmitter<u128> for TeeTransmitter {
    fn send(&mut self, group: GroupId, value: &u128) -> SentinelResult<()> {
        self.each(|sink| sink.send(group, value))
    }

    fn incomplete(&mut self, group: GroupId) -> SentinelResult<()> {
        self.each(|sink| sink.incomplete(group))
    }

    fn name(&self) -> &str {
        "tee"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer() -> (Arc<Mutex<Vec<u8>>>, SharedWriter) {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let writer: SharedWriter = buffer.clone();
        (buffer, writer)
    }

    fn text(buffer: &Arc<Mutex<Vec<u8>>>) -> String {
        String::from_utf8(buffer.lock().clone()).unwrap()
    }

    #[test]
    fn test_console_format() {
        let (buffer, writer) = buffer();
        let mut console = ConsoleTransmitter::new(writer);

        console.send(GroupId::new(0x38), &0x1f).unwrap();
        console.incomplete(GroupId::new(0x0b)).unwrap();

        assert_eq!(text(&buffer), "sent 0x38 0x1f\nincomplete 0xb\n");
    }

    #[test]
    fn test_json_lines_parse_back() {
        let (buffer, writer) = buffer();
        let mut json = JsonTransmitter::new(writer);

        json.send(GroupId::new(17), &255).unwrap();
        json.incomplete(GroupId::new(23)).unwrap();

        let events: Vec<OutputEvent> = text(&buffer)
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(
            events,
            vec![
                OutputEvent::Sent {
                    group: 17,
                    value: "0xff".to_string()
                },
                OutputEvent::Incomplete { group: 23 },
            ]
        );
        assert!(text(&buffer).starts_with("{\"event\":\"sent\""));
    }

    /// Rejects every write
    struct BrokenWriter;

    impl Write for BrokenWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("disk full"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_tee_mirrors_every_event() {
        let (console_buffer, console_writer) = buffer();
        let (json_buffer, json_writer) = buffer();
        let mut tee = TeeTransmitter::new()
            .with_sink(ConsoleTransmitter::new(console_writer))
            .with_sink(JsonTransmitter::new(json_writer));
        assert_eq!(tee.len(), 2);

        tee.send(GroupId::new(0x11), &0x2a).unwrap();
        tee.incomplete(GroupId::new(0x17)).unwrap();

        assert_eq!(text(&console_buffer), "sent 0x11 0x2a\nincomplete 0x17\n");
        assert_eq!(text(&json_buffer).lines().count(), 2);
    }

    #[test]
    fn test_tee_reaches_later_sinks_after_failure() {
        let (buffer, writer) = buffer();
        let broken: SharedWriter = Arc::new(Mutex::new(BrokenWriter));
        let mut tee = TeeTransmitter::new()
            .with_sink(JsonTransmitter::new(broken))
            .with_sink(ConsoleTransmitter::new(writer));

        assert!(matches!(
            tee.send(GroupId::new(1), &1),
            Err(SentinelError::Transmitter { .. })
        ));
        assert_eq!(text(&buffer), "sent 0x1 0x1\n");
    }
}
