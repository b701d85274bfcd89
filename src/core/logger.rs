//! Message log shown to the operator
//!
//! The scheduler appends one line per transmitted message and one line per
//! surfaced error. [`MessageLog`] keeps a bounded in-memory history;
//! [`ConsoleSink`] prints each line as it arrives. [`TeeSink`] feeds both.

use chrono::{DateTime, Local};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io::Write;
use std::sync::Arc;

/// Log shared between the scheduler and whatever displays it
pub type SharedLog = Arc<Mutex<MessageLog>>;

/// Receives rendered messages and errors
pub trait MessageSink {
    /// Append the rendering of a transmitted message
    fn append(&mut self, line: &str);

    /// Surface an error
    fn report_error(&mut self, message: &str);
}

/// Kind of log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Direction {
    /// Message handed to the transport
    Sent,
    /// Surfaced error
    Error,
}

/// A single log entry
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LogEntry {
    /// When the line was logged
    pub timestamp: DateTime<Local>,
    /// Line kind
    pub direction: Direction,
    /// Rendered text
    pub text: String,
}

impl LogEntry {
    /// Create new entry stamped now
    pub fn new(direction: Direction, text: &str) -> Self {
        Self {
            timestamp: Local::now(),
            direction,
            text: text.to_string(),
        }
    }

    /// Format as text
    pub fn to_text(&self, show_timestamp: bool) -> String {
        let dir = match self.direction {
            Direction::Sent => "TX",
            Direction::Error => "!!",
        };

        if show_timestamp {
            format!(
                "[{}] {} {}",
                self.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
                dir,
                self.text
            )
        } else {
            format!("{} {}", dir, self.text)
        }
    }

    /// Format as JSON line
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Bounded in-memory log; the oldest lines drop off first
#[derive(Debug, Clone)]
pub struct MessageLog {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl Default for MessageLog {
    fn default() -> Self {
        Self::with_capacity(1000)
    }
}

impl MessageLog {
    /// Create a log holding at most `capacity` lines
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(1024)),
            capacity: capacity.max(1),
        }
    }

    /// Wrap in a shared handle
    pub fn shared(self) -> SharedLog {
        Arc::new(Mutex::new(self))
    }

    fn push(&mut self, entry: LogEntry) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Entries, oldest first
    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// Text of every entry, oldest first
    pub fn lines(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.text.as_str()).collect()
    }

    /// Text of error entries
    pub fn errors(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.direction == Direction::Error)
            .map(|e| e.text.as_str())
            .collect()
    }

    /// Number of entries held
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all entries
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl MessageSink for MessageLog {
    fn append(&mut self, line: &str) {
        self.push(LogEntry::new(Direction::Sent, line));
    }

    fn report_error(&mut self, message: &str) {
        self.push(LogEntry::new(Direction::Error, message));
    }
}

impl MessageSink for SharedLog {
    fn append(&mut self, line: &str) {
        self.lock().append(line);
    }

    fn report_error(&mut self, message: &str) {
        self.lock().report_error(message);
    }
}

/// Console output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsoleFormat {
    /// `[timestamp] TX line`
    #[default]
    Text,
    /// One JSON object per line
    JsonLines,
}

/// Writes each line to an output stream as it arrives
pub struct ConsoleSink<W: Write> {
    out: W,
    format: ConsoleFormat,
    timestamps: bool,
    lines_written: u64,
}

impl ConsoleSink<std::io::Stdout> {
    /// Console sink on standard output
    pub fn stdout(format: ConsoleFormat, timestamps: bool) -> Self {
        Self::new(std::io::stdout(), format, timestamps)
    }
}

impl<W: Write> ConsoleSink<W> {
    /// Console sink on any writer
    pub fn new(out: W, format: ConsoleFormat, timestamps: bool) -> Self {
        Self {
            out,
            format,
            timestamps,
            lines_written: 0,
        }
    }

    /// Lines written so far
    pub fn lines_written(&self) -> u64 {
        self.lines_written
    }

    /// Consume the sink, returning the writer
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_entry(&mut self, entry: &LogEntry) {
        let line = match self.format {
            ConsoleFormat::Text => entry.to_text(self.timestamps),
            ConsoleFormat::JsonLines => entry.to_json(),
        };
        // the display is best effort; a closed stdout must not stop transmission
        if writeln!(self.out, "{line}").and_then(|()| self.out.flush()).is_ok() {
            self.lines_written += 1;
        }
    }
}

impl<W: Write> MessageSink for ConsoleSink<W> {
    fn append(&mut self, line: &str) {
        self.write_entry(&LogEntry::new(Direction::Sent, line));
    }

    fn report_error(&mut self, message: &str) {
        self.write_entry(&LogEntry::new(Direction::Error, message));
    }
}

/// Forwards every line to two sinks, `first` then `second`
pub struct TeeSink<A, B> {
    first: A,
    second: B,
}

impl<A: MessageSink, B: MessageSink> TeeSink<A, B> {
    /// Combine two sinks
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }

    /// Split back into the wrapped sinks
    pub fn into_parts(self) -> (A, B) {
        (self.first, self.second)
    }
}

impl<A: MessageSink, B: MessageSink> MessageSink for TeeSink<A, B> {
    fn append(&mut self, line: &str) {
        self.first.append(line);
        self.second.append(line);
    }

    fn report_error(&mut self, message: &str) {
        self.first.report_error(message);
        self.second.report_error(message);
    }
}
