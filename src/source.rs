//! File-backed mutation source.
//!
//! [`LoadSource`] owns the whole pipeline for one load file: it opens the
//! stream, consumes the header, resolves the schema, plans segments, and
//! then serves mutations through a [`TsvDecoder`]. With `parallel` set
//! above one it rotates across the planned segments round-robin, seeking
//! the shared stream between records; the byte-exact cursors make the
//! rotation safe. Compressed files always get exactly one segment and are
//! read straight through.

use crate::decode::{Step, TsvDecoder};
use crate::mutation::{Decoded, OwnedMutation};
use crate::options::LoadOptions;
use crate::report::LoadReport;
use crate::rowkey::SuffixGenerator;
use crate::schema::TableSchema;
use crate::segment::{Segment, plan_segments};
use crate::stream::{LineStream, is_gzip_path, open_line_stream, read_stripped_line};
use anyhow::{Context, Result, bail};
use std::fmt;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

#[cfg(feature = "checkpointing")]
use crate::progress::LoadProgress;

/// A load file opened for decoding.
pub struct LoadSource {
    decoder: TsvDecoder,
    segments: Vec<Segment>,
    current: usize,
    path: PathBuf,
    file_size: u64,
    compressed: bool,
}

impl fmt::Debug for LoadSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadSource")
            .field("segments", &self.segments)
            .field("current", &self.current)
            .field("path", &self.path)
            .field("file_size", &self.file_size)
            .field("compressed", &self.compressed)
            .finish_non_exhaustive()
    }
}

impl LoadSource {
    /// Open `path` and prepare it for loading.
    ///
    /// The header line is consumed here (from the file itself, or from
    /// `options.header_file` when set) and resolved against the requested
    /// key and timestamp columns. Gzip input is detected by the `.gz`
    /// extension.
    ///
    /// # Errors
    ///
    /// Fails on I/O errors, on a missing or malformed header, and when
    /// `options.parallel` asks for more than one segment over compressed
    /// input, which cannot be divided.
    pub fn open(path: impl AsRef<Path>, options: &LoadOptions) -> Result<Self> {
        let path = path.as_ref();
        let file_size = fs::metadata(path)
            .with_context(|| format!("stat {}", path.display()))?
            .len();
        let compressed = is_gzip_path(path);
        if compressed && options.parallel > 1 {
            bail!("parallel loading is not supported for compressed files");
        }
        let mut stream = open_line_stream(path, compressed)?;
        let (header, data_start) = read_header(stream.as_mut(), options)?;
        let schema = TableSchema::resolve(
            &header,
            &options.key_columns,
            options.timestamp_column.as_deref(),
        )?;
        let segments = if compressed {
            // One segment spanning the physical file; only end of stream
            // retires it, since decompressed offsets cannot be compared
            // against physical boundaries.
            let start = stream.raw_position()?;
            vec![Segment { start, cursor: start, end: file_size, retired: false }]
        } else if options.parallel <= 1 {
            vec![Segment::new(data_start, file_size)]
        } else {
            plan_segments(stream.as_mut(), file_size, options.parallel, data_start)?
        };
        let decoder = TsvDecoder::new(stream, schema, options)?;
        Ok(Self {
            decoder,
            segments,
            current: 0,
            path: path.to_path_buf(),
            file_size,
            compressed,
        })
    }

    /// Open a single already-planned segment of `path`.
    ///
    /// Used by the parallel loader, where each worker decodes one segment
    /// through its own file handle.
    #[cfg(feature = "parallel-io")]
    pub(crate) fn open_range(
        path: &Path,
        options: &LoadOptions,
        segment: Segment,
    ) -> Result<Self> {
        let file_size = fs::metadata(path)
            .with_context(|| format!("stat {}", path.display()))?
            .len();
        let mut stream = open_line_stream(path, false)?;
        let (header, _) = read_header(stream.as_mut(), options)?;
        let schema = TableSchema::resolve(
            &header,
            &options.key_columns,
            options.timestamp_column.as_deref(),
        )?;
        let mut decoder = TsvDecoder::new(stream, schema, options)?;
        decoder.seek_stream(segment.cursor)?;
        Ok(Self {
            decoder,
            segments: vec![segment],
            current: 0,
            path: path.to_path_buf(),
            file_size,
            compressed: false,
        })
    }

    /// Pull the next mutation, rotating across live segments.
    ///
    /// An in-flight tabular fan-out is always finished before the source
    /// moves to another segment. `Ok(None)` means every segment is retired.
    ///
    /// # Errors
    ///
    /// Only I/O failures from the underlying stream.
    pub fn next(&mut self) -> Result<Option<Decoded<'_>>> {
        if self.decoder.mid_line() {
            if let Step::Ready { bytes } = self.decoder.advance()? {
                return Ok(self.decoder.take_record(bytes));
            }
        }
        loop {
            let Some(index) = self.pick_segment() else {
                return Ok(None);
            };
            if self.segments.len() > 1 {
                self.decoder.seek_stream(self.segments[index].cursor)?;
            }
            // Bytes of lines skipped on the way to the next record; they are
            // charged to that record's `bytes_consumed`.
            let mut pending = 0u64;
            loop {
                match self.decoder.advance()? {
                    Step::Ready { bytes } => {
                        let segment = &mut self.segments[index];
                        segment.cursor += bytes;
                        if !self.compressed && segment.cursor >= segment.end {
                            segment.retired = true;
                        }
                        self.current = (index + 1) % self.segments.len();
                        let total = pending + bytes;
                        return Ok(self.decoder.take_record(total));
                    }
                    Step::Skipped { bytes } => {
                        let segment = &mut self.segments[index];
                        segment.cursor += bytes;
                        pending += bytes;
                        if !self.compressed && segment.cursor >= segment.end {
                            segment.retired = true;
                            break;
                        }
                    }
                    Step::Eof => {
                        let segment = &mut self.segments[index];
                        segment.cursor = segment.end;
                        segment.retired = true;
                        break;
                    }
                }
            }
            self.current = (index + 1) % self.segments.len();
        }
    }

    /// First non-retired segment at or after the rotation point.
    fn pick_segment(&self) -> Option<usize> {
        let count = self.segments.len();
        if count == 0 {
            return None;
        }
        (0..count)
            .map(|offset| (self.current + offset) % count)
            .find(|&index| !self.segments[index].retired)
    }

    pub fn report(&self) -> &LoadReport {
        self.decoder.report()
    }

    pub fn schema(&self) -> &TableSchema {
        self.decoder.schema()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    /// Replace the uniquify suffix generator.
    pub fn set_suffix_generator(&mut self, generator: Box<dyn SuffixGenerator>) {
        self.decoder.set_suffix_generator(generator);
    }
}

#[cfg(feature = "checkpointing")]
impl LoadSource {
    /// Capture a resumable snapshot of the load position.
    ///
    /// Returns `None` while a tabular line is mid fan-out, since its
    /// retained state cannot be reconstructed from file offsets. Take the
    /// snapshot between records, or after draining the line.
    pub fn snapshot(&self) -> Option<LoadProgress> {
        if self.decoder.mid_line() {
            return None;
        }
        let report = self.decoder.report();
        Some(LoadProgress {
            source_path: self.path.clone(),
            file_size: self.file_size,
            compressed: self.compressed,
            current_segment: self.current,
            segments: self.segments.clone(),
            lines_read: report.lines_read,
            records_emitted: report.records_emitted,
            lines_skipped: report.lines_skipped,
            bytes_consumed: report.bytes_consumed,
            saved_at_ms: crate::progress::unix_millis(),
            checksum: String::new(),
        })
    }

    /// Reopen a load from a snapshot and continue where it left off.
    ///
    /// # Errors
    ///
    /// Fails when the snapshot describes a compressed load (which cannot
    /// be repositioned), when the file has changed size since the snapshot
    /// was taken, or on the same conditions as [`LoadSource::open`].
    pub fn resume(options: &LoadOptions, progress: &LoadProgress) -> Result<Self> {
        if progress.compressed {
            bail!("cannot resume a compressed load");
        }
        if progress.segments.is_empty() {
            bail!("checkpoint contains no segments");
        }
        let path = progress.source_path.as_path();
        let file_size = fs::metadata(path)
            .with_context(|| format!("stat {}", path.display()))?
            .len();
        if file_size != progress.file_size {
            bail!(
                "{} is {} bytes but the checkpoint was taken at {} bytes",
                path.display(),
                file_size,
                progress.file_size
            );
        }
        let mut stream = open_line_stream(path, false)?;
        let (header, _) = read_header(stream.as_mut(), options)?;
        let schema = TableSchema::resolve(
            &header,
            &options.key_columns,
            options.timestamp_column.as_deref(),
        )?;
        let mut decoder = TsvDecoder::new(stream, schema, options)?;
        decoder.restore_report(LoadReport {
            lines_read: progress.lines_read,
            records_emitted: progress.records_emitted,
            lines_skipped: progress.lines_skipped,
            bytes_consumed: progress.bytes_consumed,
            skips: Vec::new(),
        });
        let segments = progress.segments.clone();
        let current = progress.current_segment.min(segments.len() - 1);
        if segments.len() == 1 {
            decoder.seek_stream(segments[0].cursor)?;
        }
        Ok(Self {
            decoder,
            segments,
            current,
            path: path.to_path_buf(),
            file_size,
            compressed: false,
        })
    }
}

/// Read the header line, either from the load file itself or from the
/// configured side file. Returns the header text and the offset where data
/// begins in the load file.
fn read_header(stream: &mut dyn LineStream, options: &LoadOptions) -> Result<(String, u64)> {
    let mut buf = Vec::new();
    let data_start = match &options.header_file {
        Some(header_path) => {
            let file = File::open(header_path)
                .with_context(|| format!("open {}", header_path.display()))?;
            let mut reader = BufReader::new(file);
            read_stripped_line(&mut reader, &mut buf)
                .with_context(|| format!("read {}", header_path.display()))?;
            0
        }
        None => stream.read_line(&mut buf).context("read load file header")?,
    };
    if buf.is_empty() {
        bail!("load file has no header line");
    }
    let header = String::from_utf8(buf).context("load file header is not valid UTF-8")?;
    Ok((header, data_start))
}

/// Decode an entire load file in one call.
///
/// Convenience wrapper around [`LoadSource`] for callers that want the
/// whole file in memory. Mutations come back in file order for a
/// single-segment load; with `options.parallel` above one the segments are
/// interleaved.
///
/// # Errors
///
/// Same conditions as [`LoadSource::open`] and [`LoadSource::next`].
pub fn load_mutations(
    path: impl AsRef<Path>,
    options: &LoadOptions,
) -> Result<(Vec<OwnedMutation>, LoadReport)> {
    let mut source = LoadSource::open(path, options)?;
    let mut mutations = Vec::new();
    while let Some(decoded) = source.next()? {
        mutations.push(decoded.mutation.into_owned());
    }
    let report = source.report().clone();
    Ok((mutations, report))
}
