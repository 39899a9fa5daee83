//! Line-aligned file partitioning.

use crate::stream::LineStream;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// One contiguous byte range of the source file, always starting at a line
/// boundary.
///
/// `start <= cursor <= end` holds throughout a load; `cursor == end` retires
/// the segment permanently.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// First byte of the segment, the start of a line.
    pub start: u64,
    /// Next byte to read.
    pub cursor: u64,
    /// First byte past the segment.
    pub end: u64,
    /// No further reads will be served from this segment.
    pub retired: bool,
}

impl Segment {
    /// A fresh segment covering `[start, end)`. Empty ranges are born
    /// retired.
    #[must_use]
    pub fn new(start: u64, end: u64) -> Self {
        Self {
            start,
            cursor: start,
            end,
            retired: start >= end,
        }
    }

    /// Bytes between the cursor and the end boundary.
    pub fn remaining(&self) -> u64 {
        self.end.saturating_sub(self.cursor)
    }
}

/// Split `[data_start, file_size)` into `parallel` line-aligned segments.
///
/// Candidate boundaries at `i * file_size / parallel` are forced monotone
/// and then snapped forward to the next line start by reading through the
/// newline at the candidate position. A candidate inside the final
/// unterminated line snaps to the file size, leaving that segment empty.
/// The stream is left at an unspecified position.
///
/// # Errors
///
/// Propagates seek and read failures from the stream.
pub fn plan_segments(
    stream: &mut dyn LineStream,
    file_size: u64,
    parallel: usize,
    data_start: u64,
) -> Result<Vec<Segment>> {
    let count = parallel.max(1);
    let mut starts = Vec::with_capacity(count);
    starts.push(data_start.min(file_size));

    let mut scratch = Vec::new();
    for index in 1..count {
        let candidate = (index as u64 * file_size / count as u64).max(starts[index - 1]);
        let snapped = if candidate >= file_size {
            file_size
        } else {
            stream.seek_to(candidate)?;
            let consumed = stream.read_line(&mut scratch)?;
            (candidate + consumed).min(file_size)
        };
        starts.push(snapped);
    }

    let segments = (0..count)
        .map(|index| {
            let end = starts.get(index + 1).copied().unwrap_or(file_size);
            Segment::new(starts[index], end)
        })
        .collect();
    Ok(segments)
}
