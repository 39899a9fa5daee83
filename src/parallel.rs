//! Parallel whole-file loading.
//!
//! Splits a load file into line-aligned segments and decodes them on the
//! rayon pool, one worker per segment with its own file handle. Workers
//! never share decoder state, so output is deterministic: chunks are
//! concatenated in segment order, which is file order, exactly matching a
//! sequential load of the same file.
//!
//! Warnings printed by workers carry segment-relative line numbers, since
//! a worker cannot know how many lines precede its segment.

use crate::mutation::OwnedMutation;
use crate::options::LoadOptions;
use crate::report::LoadReport;
use crate::segment::Segment;
use crate::source::{LoadSource, load_mutations};
use crate::stream::is_gzip_path;
use anyhow::Result;
use rayon::iter::IntoParallelIterator;
use rayon::iter::ParallelIterator;
use std::path::Path;

/// Decode an entire load file across the rayon pool.
///
/// `options.parallel` decides how many segments are planned. Compressed
/// files cannot be divided and fall back to a sequential load (or fail,
/// when more than one segment was requested).
///
/// # Errors
///
/// Same conditions as [`LoadSource::open`]; the first worker error wins.
pub fn load_mutations_par(
    path: impl AsRef<Path>,
    options: &LoadOptions,
) -> Result<(Vec<OwnedMutation>, LoadReport)> {
    let path = path.as_ref();
    if is_gzip_path(path) {
        return load_mutations(path, options);
    }
    let source = LoadSource::open(path, options)?;
    let segments: Vec<Segment> = source.segments().to_vec();
    drop(source);

    let chunks: Vec<(Vec<OwnedMutation>, LoadReport)> = segments
        .into_par_iter()
        .map(|segment| load_segment(path, options, segment))
        .collect::<Result<Vec<_>>>()?;

    let mut mutations = Vec::new();
    let mut report = LoadReport::default();
    for (chunk, worker_report) in chunks {
        mutations.extend(chunk);
        report.merge(&worker_report);
    }
    Ok((mutations, report))
}

/// Drain one segment through its own source.
fn load_segment(
    path: &Path,
    options: &LoadOptions,
    segment: Segment,
) -> Result<(Vec<OwnedMutation>, LoadReport)> {
    let mut source = LoadSource::open_range(path, options, segment)?;
    let mut mutations = Vec::new();
    while let Some(decoded) = source.next()? {
        mutations.push(decoded.mutation.into_owned());
    }
    let report = source.report().clone();
    Ok((mutations, report))
}
