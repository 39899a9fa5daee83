//! Test helpers for building load files.
//!
//! These utilities back the crate's own tests and are exported for users
//! who want to exercise their load configurations against synthetic
//! files: temporary TSV fixtures (plain or gzip) and a deterministic
//! suffix generator that makes uniquified row keys predictable.

use crate::rowkey::SuffixGenerator;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// A temporary load file that is deleted when dropped.
pub struct TsvFixture {
    temp_file: NamedTempFile,
    path: PathBuf,
}

impl TsvFixture {
    /// Create an empty fixture file.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary file cannot be created.
    pub fn new() -> io::Result<Self> {
        let temp_file = NamedTempFile::new()?;
        let path = temp_file.path().to_path_buf();
        Ok(Self { temp_file, path })
    }

    /// Create an empty fixture file with a specific extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary file cannot be created.
    pub fn with_extension(extension: &str) -> io::Result<Self> {
        let temp_file = tempfile::Builder::new()
            .suffix(&format!(".{extension}"))
            .tempfile()?;
        let path = temp_file.path().to_path_buf();
        Ok(Self { temp_file, path })
    }

    /// Get the path to the fixture file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Create a load file from `lines`, terminating each with a newline.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn mock_load_file(lines: &[&str]) -> io::Result<TsvFixture> {
    let mut fixture = TsvFixture::new()?;
    for line in lines {
        fixture.temp_file.write_all(line.as_bytes())?;
        fixture.temp_file.write_all(b"\n")?;
    }
    fixture.temp_file.flush()?;
    Ok(fixture)
}

/// Create a load file with exact byte contents, newlines included.
///
/// Useful for files whose final line has no terminator.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn mock_load_file_raw(contents: &[u8]) -> io::Result<TsvFixture> {
    let mut fixture = TsvFixture::new()?;
    fixture.temp_file.write_all(contents)?;
    fixture.temp_file.flush()?;
    Ok(fixture)
}

/// Create a gzip-compressed load file from `lines`, with a `.gz` suffix so
/// it is detected as compressed.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
#[cfg(feature = "compression-gzip")]
pub fn mock_gzip_load_file(lines: &[&str]) -> io::Result<TsvFixture> {
    use flate2::Compression;
    use flate2::write::GzEncoder;

    let mut fixture = TsvFixture::with_extension("gz")?;
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    for line in lines {
        encoder.write_all(line.as_bytes())?;
        encoder.write_all(b"\n")?;
    }
    let compressed = encoder.finish()?;
    fixture.temp_file.write_all(&compressed)?;
    fixture.temp_file.flush()?;
    Ok(fixture)
}

/// Deterministic suffix generator that cycles a fixed pattern.
///
/// Substitute it for the random generator when a test needs to predict
/// uniquified row keys exactly.
pub struct PatternSuffix {
    pattern: Vec<u8>,
    at: usize,
}

impl PatternSuffix {
    #[must_use]
    pub fn new(pattern: &str) -> Self {
        assert!(!pattern.is_empty(), "suffix pattern must not be empty");
        Self { pattern: pattern.as_bytes().to_vec(), at: 0 }
    }
}

impl SuffixGenerator for PatternSuffix {
    fn fill(&mut self, buf: &mut [u8]) {
        for byte in buf {
            *byte = self.pattern[self.at % self.pattern.len()];
            self.at += 1;
        }
    }
}
