//! The per-line record decoder.
//!
//! [`TsvDecoder`] pulls physical lines from a [`LineStream`] and turns them
//! into [`Mutation`]s according to the resolved [`TableSchema`]. It works in
//! single-line steps: one internal step reads at most one physical line, so
//! the segmented reader can keep byte-exact cursors around it. Defective
//! lines are skipped with a warning and recorded in the [`LoadReport`];
//! only real I/O failures become errors.
//!
//! In the tabular dialect a single line produces one record per plain
//! column. The first record consumes the line's bytes; the rest are served
//! from retained state on later calls and consume none.

use crate::mutation::{AUTO_ASSIGN, Decoded, Mutation, MutationOp};
use crate::options::LoadOptions;
use crate::report::{LoadReport, SkipCause};
use crate::rowkey::{self, RandomSuffix, SuffixGenerator, build_row_key};
use crate::schema::{Dialect, TableSchema};
use crate::stream::LineStream;
use crate::timestamp::parse_timestamp_ns;
use anyhow::Result;
use std::ops::Range;
use std::str;

/// Outcome of one internal step.
#[derive(Copy, Clone, Debug)]
pub(crate) enum Step {
    /// A record is staged; fetch it with `take_record`.
    Ready { bytes: u64 },
    /// A line was consumed without producing a record.
    Skipped { bytes: u64 },
    /// End of input.
    Eof,
}

/// Where a staged cells-dialect record's row bytes live.
#[derive(Debug)]
enum CellRow {
    /// Byte range of the row field within the current line.
    Inline(Range<usize>),
    /// The key buffer, holding row plus uniquify suffix.
    Uniquified,
}

/// A staged record, described as ranges into the decoder's buffers.
#[derive(Debug)]
enum Emit {
    Cell {
        row: CellRow,
        family: Range<usize>,
        qualifier: Option<Range<usize>>,
        value: Range<usize>,
        timestamp: i64,
    },
    Column {
        column: usize,
        value: Option<Range<usize>>,
        timestamp: i64,
        fresh_line: bool,
    },
}

/// Mid-line fan-out state for the tabular dialect.
#[derive(Debug)]
struct FanOut {
    values: Vec<Option<Range<usize>>>,
    timestamp: i64,
    /// Next column to emit; always below `limit` and never suppressed.
    next_column: usize,
    limit: usize,
}

/// Decodes one line stream into mutations.
///
/// Construct it over an already-positioned stream whose header has been
/// consumed (or was never present), then pull records with
/// [`TsvDecoder::next`].
pub struct TsvDecoder {
    stream: Box<dyn LineStream>,
    schema: TableSchema,
    uniquify_chars: usize,
    duplicate_key_columns: bool,
    log_warnings: bool,
    suffix: Box<dyn SuffixGenerator>,
    compressed: bool,
    /// Physical position at the end of the previous step, compressed input
    /// only.
    raw_mark: u64,
    line_no: u64,
    line: Vec<u8>,
    key: Vec<u8>,
    fanout: Option<FanOut>,
    emit: Option<Emit>,
    report: LoadReport,
}

impl TsvDecoder {
    /// Wrap `stream` with a resolved schema and decode settings.
    ///
    /// Compression is inferred from the stream: a non-seekable stream is
    /// accounted in physical bytes.
    ///
    /// # Errors
    ///
    /// Fails when the stream cannot report its position.
    pub fn new(
        stream: Box<dyn LineStream>,
        schema: TableSchema,
        options: &LoadOptions,
    ) -> Result<Self> {
        let compressed = !stream.seekable();
        let mut decoder = Self {
            stream,
            schema,
            uniquify_chars: options.uniquify_chars,
            duplicate_key_columns: options.duplicate_key_columns,
            log_warnings: options.log_warnings,
            suffix: Box::new(RandomSuffix),
            compressed,
            raw_mark: 0,
            line_no: 1,
            line: Vec::new(),
            key: Vec::new(),
            fanout: None,
            emit: None,
            report: LoadReport::default(),
        };
        if compressed {
            decoder.raw_mark = decoder.stream.raw_position()?;
        }
        Ok(decoder)
    }

    /// Replace the uniquify suffix generator.
    pub fn set_suffix_generator(&mut self, generator: Box<dyn SuffixGenerator>) {
        self.suffix = generator;
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    /// Whether a tabular line is still being fanned out. While true, the
    /// next record comes from retained state without touching the stream.
    pub fn mid_line(&self) -> bool {
        self.fanout.is_some()
    }

    /// Pull the next record.
    ///
    /// Skipped lines are absorbed here: their bytes are folded into the next
    /// record's `bytes_consumed`. `Ok(None)` is the normal end of input.
    ///
    /// # Errors
    ///
    /// Only I/O failures from the underlying stream.
    pub fn next(&mut self) -> Result<Option<Decoded<'_>>> {
        let mut pending = 0u64;
        loop {
            match self.advance()? {
                Step::Ready { bytes } => {
                    pending += bytes;
                    break;
                }
                Step::Skipped { bytes } => pending += bytes,
                Step::Eof => return Ok(None),
            }
        }
        Ok(self.take_record(pending))
    }

    /// Process at most one physical line (or serve retained fan-out state).
    ///
    /// On compressed input the reported byte counts are replaced by the
    /// physical position delta since the previous step.
    pub(crate) fn advance(&mut self) -> Result<Step> {
        let step = if self.fanout.is_some() {
            self.continue_fanout()
        } else {
            self.read_and_decode()?
        };
        if !self.compressed {
            if let Step::Ready { bytes } | Step::Skipped { bytes } = step {
                self.report.bytes_consumed += bytes;
            }
            return Ok(step);
        }
        let mark = self.stream.raw_position()?;
        let delta = mark - self.raw_mark;
        self.raw_mark = mark;
        Ok(match step {
            Step::Ready { .. } => {
                self.report.bytes_consumed += delta;
                Step::Ready { bytes: delta }
            }
            Step::Skipped { .. } => {
                self.report.bytes_consumed += delta;
                Step::Skipped { bytes: delta }
            }
            Step::Eof => Step::Eof,
        })
    }

    /// Build the staged record, attributing `bytes_consumed` to it.
    pub(crate) fn take_record(&mut self, bytes_consumed: u64) -> Option<Decoded<'_>> {
        let emit = self.emit.take()?;
        self.report.records_emitted += 1;
        Some(match emit {
            Emit::Cell { row, family, qualifier, value, timestamp } => {
                let row = match row {
                    CellRow::Inline(range) => &self.line[range],
                    CellRow::Uniquified => self.key.as_slice(),
                };
                Decoded {
                    mutation: Mutation {
                        row,
                        family: str::from_utf8(&self.line[family]).unwrap_or_default(),
                        qualifier: qualifier.map(|range| &self.line[range]),
                        timestamp,
                        value: Some(&self.line[value]),
                        op: MutationOp::Insert,
                    },
                    bytes_consumed,
                    line: &self.line,
                }
            }
            Emit::Column { column, value, timestamp, fresh_line } => {
                let descriptor = &self.schema.columns()[column];
                Decoded {
                    mutation: Mutation {
                        row: &self.key,
                        family: &descriptor.family,
                        qualifier: (!descriptor.qualifier.is_empty())
                            .then_some(descriptor.qualifier.as_bytes()),
                        timestamp,
                        value: value.map(|range| &self.line[range]),
                        op: MutationOp::Insert,
                    },
                    bytes_consumed,
                    line: if fresh_line { &self.line } else { &[] },
                }
            }
        })
    }

    pub(crate) fn seek_stream(&mut self, offset: u64) -> Result<()> {
        self.stream.seek_to(offset)?;
        Ok(())
    }

    /// Reinstall counters from a checkpoint. Line numbering resumes after
    /// the lines already read.
    pub(crate) fn restore_report(&mut self, report: LoadReport) {
        self.line_no = report.lines_read + 1;
        self.report = report;
    }

    fn read_and_decode(&mut self) -> Result<Step> {
        let bytes = self.stream.read_line(&mut self.line)?;
        if bytes == 0 {
            return Ok(Step::Eof);
        }
        self.line_no += 1;
        self.report.lines_read += 1;
        Ok(match self.schema.dialect() {
            Dialect::Cells { leading_timestamps } => {
                self.decode_cell_line(leading_timestamps, bytes)
            }
            Dialect::Tabular => self.decode_tabular_line(bytes),
        })
    }

    /// One `row TAB column TAB value` cell per line, with an optional
    /// leading integer timestamp field. The value is the verbatim remainder
    /// of the line, embedded tabs included.
    fn decode_cell_line(&mut self, leading_timestamps: bool, line_bytes: u64) -> Step {
        let mut at = 0usize;

        let timestamp = if leading_timestamps {
            let Some(tab) = find_byte(&self.line, at, b'\t') else {
                if self.log_warnings {
                    eprintln!("too few fields on line {}, skipping", self.line_no);
                }
                return self.skip_line(SkipCause::TooFewFields, line_bytes);
            };
            let parsed = str::from_utf8(&self.line[at..tab])
                .ok()
                .and_then(|text| text.parse::<i64>().ok());
            let Some(timestamp) = parsed else {
                if self.log_warnings {
                    eprintln!(
                        "invalid timestamp ({}) on line {}, skipping",
                        String::from_utf8_lossy(&self.line[at..tab]),
                        self.line_no
                    );
                }
                return self.skip_line(SkipCause::BadLeadingTimestamp, line_bytes);
            };
            at = tab + 1;
            timestamp
        } else {
            AUTO_ASSIGN
        };

        let Some(tab) = find_byte(&self.line, at, b'\t') else {
            if self.log_warnings {
                eprintln!("too few fields on line {}, skipping", self.line_no);
            }
            return self.skip_line(SkipCause::TooFewFields, line_bytes);
        };
        let row = at..tab;
        at = tab + 1;

        let Some(tab) = find_byte(&self.line, at, b'\t') else {
            if self.log_warnings {
                eprintln!("too few fields on line {}, skipping", self.line_no);
            }
            return self.skip_line(SkipCause::TooFewFields, line_bytes);
        };
        let value = tab + 1..self.line.len();

        // Qualifier is everything after the first colon inside the column
        // field; a trailing colon means no qualifier.
        let (family, qualifier) = match find_byte(&self.line[..tab], at, b':') {
            Some(colon) if colon + 1 < tab => (at..colon, Some(colon + 1..tab)),
            Some(colon) => (at..colon, None),
            None => (at..tab, None),
        };

        if str::from_utf8(&self.line[family.clone()]).is_err() {
            if self.log_warnings {
                eprintln!("non-text column family on line {}, skipping", self.line_no);
            }
            return self.skip_line(SkipCause::BadColumnFamily, line_bytes);
        }

        let row = if self.uniquify_chars > 0 {
            self.key.clear();
            self.key.extend_from_slice(&self.line[row]);
            rowkey::append_suffix(&mut *self.suffix, self.uniquify_chars, &mut self.key);
            CellRow::Uniquified
        } else {
            CellRow::Inline(row)
        };

        self.emit = Some(Emit::Cell { row, family, qualifier, value, timestamp });
        Step::Ready { bytes: line_bytes }
    }

    /// One input row per line: tokenize, build the row key, parse the
    /// timestamp column, then stage the first plain column and retain the
    /// rest for fan-out.
    fn decode_tabular_line(&mut self, line_bytes: u64) -> Step {
        let mut lo = 0usize;
        let mut hi = self.line.len();
        while lo < hi && self.line[lo].is_ascii_whitespace() {
            lo += 1;
        }
        while hi > lo && self.line[hi - 1].is_ascii_whitespace() {
            hi -= 1;
        }
        if lo == hi {
            return self.skip_silent(line_bytes);
        }

        let column_count = self.schema.columns().len();
        let mut values: Vec<Option<Range<usize>>> = Vec::with_capacity(column_count);
        let mut token_start = lo;
        for position in lo..=hi {
            if position < hi && self.line[position] != b'\t' {
                continue;
            }
            let token = &self.line[token_start..position];
            let is_null = token.is_empty() || token == b"NULL" || token == b"\\N";
            let index = values.len();
            if is_null && index < column_count && !self.schema.roles()[index].is_plain() {
                if self.log_warnings {
                    eprintln!(
                        "required key or timestamp field not found on line {}, skipping",
                        self.line_no
                    );
                }
                return self.skip_line(SkipCause::NullRequiredField, line_bytes);
            }
            values.push((!is_null).then_some(token_start..position));
            token_start = position + 1;
        }

        let limit = values.len().min(column_count);

        let key_built = build_row_key(
            self.schema.key_components(),
            |column| {
                values
                    .get(column)
                    .and_then(|value| value.clone())
                    .map(|range| &self.line[range])
            },
            &mut self.key,
        );
        if !key_built {
            if self.log_warnings {
                eprintln!("required key field not found on line {}, skipping", self.line_no);
            }
            return self.skip_line(SkipCause::MissingKeyField, line_bytes);
        }

        let timestamp = match self.schema.timestamp_column() {
            None => AUTO_ASSIGN,
            Some(index) => {
                let Some(range) = values.get(index).and_then(|value| value.clone()) else {
                    if self.log_warnings {
                        eprintln!(
                            "timestamp field not found on line {}, skipping",
                            self.line_no
                        );
                    }
                    return self.skip_line(SkipCause::MissingTimestampField, line_bytes);
                };
                let parsed = str::from_utf8(&self.line[range])
                    .ok()
                    .and_then(parse_timestamp_ns);
                let Some(timestamp) = parsed else {
                    if self.log_warnings {
                        eprintln!(
                            "invalid timestamp format on line {}, skipping",
                            self.line_no
                        );
                    }
                    return self.skip_line(SkipCause::BadTimestampFormat, line_bytes);
                };
                timestamp
            }
        };

        if self.uniquify_chars > 0 {
            rowkey::append_suffix(&mut *self.suffix, self.uniquify_chars, &mut self.key);
        }

        let Some(column) = self.next_plain_column(0, limit) else {
            // Every column went into the key; the line is spent.
            return self.skip_silent(line_bytes);
        };
        let value = values[column].clone();
        if let Some(next) = self.next_plain_column(column + 1, limit) {
            self.fanout = Some(FanOut { values, timestamp, next_column: next, limit });
        }
        self.emit = Some(Emit::Column { column, value, timestamp, fresh_line: true });
        Step::Ready { bytes: line_bytes }
    }

    /// Serve the next retained column of the current tabular line.
    fn continue_fanout(&mut self) -> Step {
        let Some(mut fanout) = self.fanout.take() else {
            return Step::Eof;
        };
        let column = fanout.next_column;
        let value = fanout.values[column].clone();
        let timestamp = fanout.timestamp;
        if let Some(next) = self.next_plain_column(column + 1, fanout.limit) {
            fanout.next_column = next;
            self.fanout = Some(fanout);
        }
        self.emit = Some(Emit::Column { column, value, timestamp, fresh_line: false });
        Step::Ready { bytes: 0 }
    }

    /// First non-suppressed column index in `[from, limit)`.
    fn next_plain_column(&self, from: usize, limit: usize) -> Option<usize> {
        (from..limit).find(|&column| !self.schema.suppressed(column, self.duplicate_key_columns))
    }

    fn skip_line(&mut self, cause: SkipCause, bytes: u64) -> Step {
        self.report.lines_skipped += 1;
        self.report.record_skip(self.line_no, cause);
        Step::Skipped { bytes }
    }

    fn skip_silent(&mut self, bytes: u64) -> Step {
        self.report.lines_skipped += 1;
        Step::Skipped { bytes }
    }
}

fn find_byte(haystack: &[u8], from: usize, needle: u8) -> Option<usize> {
    haystack[from..]
        .iter()
        .position(|&byte| byte == needle)
        .map(|offset| from + offset)
}
