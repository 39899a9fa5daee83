//! Byte-exact line reading over plain and gzip-compressed files.
//!
//! Segment cursors and checkpoint accounting both need to know exactly how
//! many source bytes each line occupied, so [`LineStream::read_line`]
//! reports the raw count instead of the post-strip buffer length. For
//! compressed files positions are physical (compressed) offsets.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

#[cfg(feature = "compression-gzip")]
use flate2::read::GzDecoder;

/// A positioned source of physical lines.
pub trait LineStream {
    /// Read one line into `buf`, clearing it first and stripping the
    /// trailing `\n` (a `\r` before it is data).
    ///
    /// Returns the number of bytes consumed from the stream, newline
    /// included when present; a final unterminated line counts without it.
    /// Zero means end of input.
    fn read_line(&mut self, buf: &mut Vec<u8>) -> io::Result<u64>;

    /// Reposition to an absolute byte offset.
    fn seek_to(&mut self, offset: u64) -> io::Result<()>;

    /// Current position in the underlying file. For compressed streams this
    /// is the physical offset, coarse to the decoder's read-ahead.
    fn raw_position(&mut self) -> io::Result<u64>;

    /// Whether [`LineStream::seek_to`] works.
    fn seekable(&self) -> bool;
}

/// Seekable line stream over an uncompressed file.
pub struct FileLineStream {
    inner: BufReader<File>,
}

impl FileLineStream {
    /// Open `path` for line reading.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be opened.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
        Ok(Self { inner: BufReader::new(file) })
    }
}

impl LineStream for FileLineStream {
    fn read_line(&mut self, buf: &mut Vec<u8>) -> io::Result<u64> {
        read_stripped_line(&mut self.inner, buf)
    }

    fn seek_to(&mut self, offset: u64) -> io::Result<()> {
        self.inner.seek(SeekFrom::Start(offset)).map(|_| ())
    }

    fn raw_position(&mut self) -> io::Result<u64> {
        self.inner.stream_position()
    }

    fn seekable(&self) -> bool {
        true
    }
}

/// Counts bytes pulled from the wrapped reader.
struct CountingReader<R> {
    inner: R,
    count: u64,
}

impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(out)?;
        self.count += n as u64;
        Ok(n)
    }
}

/// Forward-only line stream over a gzip-compressed file.
#[cfg(feature = "compression-gzip")]
pub struct GzipLineStream {
    inner: BufReader<GzDecoder<CountingReader<File>>>,
}

#[cfg(feature = "compression-gzip")]
impl GzipLineStream {
    /// Open a gzip-compressed `path` for line reading.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be opened. A corrupt gzip body surfaces
    /// later, from `read_line`.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
        let counted = CountingReader { inner: file, count: 0 };
        Ok(Self { inner: BufReader::new(GzDecoder::new(counted)) })
    }
}

#[cfg(feature = "compression-gzip")]
impl LineStream for GzipLineStream {
    fn read_line(&mut self, buf: &mut Vec<u8>) -> io::Result<u64> {
        read_stripped_line(&mut self.inner, buf)
    }

    fn seek_to(&mut self, _offset: u64) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "cannot seek a compressed stream",
        ))
    }

    fn raw_position(&mut self) -> io::Result<u64> {
        Ok(self.inner.get_ref().get_ref().count)
    }

    fn seekable(&self) -> bool {
        false
    }
}

/// Gzip is detected by file name, matching bulk-load conventions.
pub fn is_gzip_path(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "gz")
}

/// Open `path` as a line stream, decompressing when `gzipped`.
///
/// # Errors
///
/// Fails when the file cannot be opened, or when `gzipped` is requested
/// without the `compression-gzip` feature.
pub fn open_line_stream(path: &Path, gzipped: bool) -> Result<Box<dyn LineStream>> {
    if gzipped {
        #[cfg(feature = "compression-gzip")]
        return Ok(Box::new(GzipLineStream::open(path)?));
        #[cfg(not(feature = "compression-gzip"))]
        anyhow::bail!(
            "{} is compressed but gzip support is disabled; enable the compression-gzip feature",
            path.display()
        );
    }
    Ok(Box::new(FileLineStream::open(path)?))
}

pub(crate) fn read_stripped_line<R: BufRead>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<u64> {
    buf.clear();
    let n = reader.read_until(b'\n', buf)?;
    if buf.last() == Some(&b'\n') {
        buf.pop();
    }
    Ok(n as u64)
}
