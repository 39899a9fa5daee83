//! Per-load diagnostics: counters plus a record of every warned skip.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a data line was skipped.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipCause {
    /// Fewer tab-separated fields than the cells layout requires.
    TooFewFields,
    /// The leading timestamp field is not a plain integer.
    BadLeadingTimestamp,
    /// Column family bytes are not valid UTF-8.
    BadColumnFamily,
    /// A null landed on a key or timestamp column.
    NullRequiredField,
    /// A key component's source column is absent from the line.
    MissingKeyField,
    /// The timestamp column is absent from the line.
    MissingTimestampField,
    /// The timestamp column value does not parse.
    BadTimestampFormat,
}

/// One warned skip, in decode order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedLine {
    /// Line number as counted by the decoder.
    pub line: u64,
    pub cause: SkipCause,
}

/// Counters and skip records accumulated while decoding one source.
///
/// Defective lines are never hard errors; they are skipped, optionally
/// warned about on stderr, and recorded here so a caller can audit a load
/// after the fact.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LoadReport {
    /// Physical data lines read (the header is not counted).
    pub lines_read: u64,
    /// Mutations handed to the caller.
    pub records_emitted: u64,
    /// Data lines that produced no records, silent blank-line skips
    /// included.
    pub lines_skipped: u64,
    /// Source bytes consumed by the decoder, skipped lines included. On
    /// compressed input this counts physical (compressed) bytes.
    pub bytes_consumed: u64,
    /// One entry per warned skip.
    pub skips: Vec<SkippedLine>,
}

impl LoadReport {
    pub(crate) fn record_skip(&mut self, line: u64, cause: SkipCause) {
        self.skips.push(SkippedLine { line, cause });
    }

    /// Export the report as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Fold another report's counters and skips into this one.
    ///
    /// Used when per-segment loads run on separate readers; line numbers in
    /// `skips` stay relative to the reader that produced them.
    pub fn merge(&mut self, other: &LoadReport) {
        self.lines_read += other.lines_read;
        self.records_emitted += other.records_emitted;
        self.lines_skipped += other.lines_skipped;
        self.bytes_consumed += other.bytes_consumed;
        self.skips.extend_from_slice(&other.skips);
    }
}

impl fmt::Display for LoadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LoadReport({} lines, {} records, {} skipped, {} bytes)",
            self.lines_read, self.records_emitted, self.lines_skipped, self.bytes_consumed
        )
    }
}
