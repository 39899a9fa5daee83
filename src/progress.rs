//! Persistent load checkpoints.
//!
//! A [`LoadProgress`] freezes the segment cursors and report counters of a
//! running [`LoadSource`](crate::LoadSource) so an interrupted load can be
//! reopened later with [`LoadSource::resume`](crate::LoadSource::resume).
//! Snapshots are written as JSON with a SHA-256 checksum over the fields
//! that matter for repositioning; a checkpoint that fails verification is
//! rejected rather than resumed from a wrong offset.
//!
//! Resuming expects the same [`LoadOptions`](crate::LoadOptions) the
//! original load ran with; the options themselves are not captured.

use crate::segment::Segment;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// A resumable snapshot of one load.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoadProgress {
    /// File the snapshot was taken over.
    pub source_path: PathBuf,
    /// Size of that file when the snapshot was taken.
    pub file_size: u64,
    /// Whether the load read compressed input. Compressed loads cannot be
    /// resumed.
    pub compressed: bool,
    /// Segment the rotation would serve next.
    pub current_segment: usize,
    /// Planned segments with their cursors.
    pub segments: Vec<Segment>,
    /// Data lines read so far.
    pub lines_read: u64,
    /// Records emitted so far.
    pub records_emitted: u64,
    /// Lines skipped so far.
    pub lines_skipped: u64,
    /// Bytes consumed so far.
    pub bytes_consumed: u64,
    /// When the snapshot was taken (milliseconds since epoch).
    pub saved_at_ms: u64,
    /// SHA-256 checksum of the positioning fields.
    pub checksum: String,
}

impl LoadProgress {
    /// Write the snapshot to `path`, sealing it with its checksum.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut sealed = self.clone();
        sealed.checksum = sealed.digest();
        let json = serde_json::to_string_pretty(&sealed).context("serialize checkpoint")?;
        fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    /// Read a snapshot back and verify its checksum.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be read or parsed, or when
    /// the checksum does not match the stored fields.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json =
            fs::read_to_string(path).with_context(|| format!("open {}", path.display()))?;
        let progress: LoadProgress =
            serde_json::from_str(&json).with_context(|| format!("parse {}", path.display()))?;
        if progress.digest() != progress.checksum {
            bail!("checkpoint integrity check failed: checksum mismatch");
        }
        Ok(progress)
    }

    /// Checksum over every field that decides where resuming starts.
    fn digest(&self) -> String {
        let mut text = format!(
            "{}:{}:{}:{}:{}:{}:{}:{}:{}",
            self.source_path.display(),
            self.file_size,
            self.compressed,
            self.current_segment,
            self.lines_read,
            self.records_emitted,
            self.lines_skipped,
            self.bytes_consumed,
            self.saved_at_ms,
        );
        for segment in &self.segments {
            let _ = write!(
                text,
                ":{}-{}-{}-{}",
                segment.start, segment.cursor, segment.end, segment.retired
            );
        }
        compute_checksum(text.as_bytes())
    }
}

/// Compute a hex SHA-256 checksum of data.
fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

pub(crate) fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}
