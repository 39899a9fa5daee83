//! # Tabload
//!
//! A **bulk-loading front end** for sorted key-value stores. Tabload reads
//! tab-separated load files and decodes every line into typed cell
//! mutations, ready to be batched into a table: row keys assembled from
//! one or more key columns, per-column values, and nanosecond timestamps
//! parsed from the data itself.
//!
//! ## Key Features
//!
//! - **Two input dialects** - plain tabular files (one record per column
//!   per line) and pre-flattened cell files (`row TAB column TAB value`),
//!   detected from the header
//! - **Composite row keys** - build keys from several columns with
//!   printf-style width, padding, and justification specifiers
//! - **Timestamp columns** - `YYYY-MM-DD HH:MM:SS` values become
//!   nanosecond timestamps; cell files may carry raw nanosecond integers
//! - **Byte-exact segmentation** - split a file into line-aligned
//!   segments and decode them independently, for round-robin reading or
//!   full parallel loading on the rayon pool
//! - **Skip-and-report error handling** - defective lines are skipped
//!   with a warning and tallied in a [`LoadReport`]; only real I/O
//!   failures abort a load
//! - **Gzip input** - `.gz` load files are decompressed on the fly
//!   (feature `compression-gzip`)
//! - **Resumable loads** - checkpoint segment cursors to disk and pick an
//!   interrupted load back up (feature `checkpointing`)
//!
//! ## Quick Start
//!
//! ```no_run
//! use tabload::{LoadOptions, LoadSource};
//!
//! # fn main() -> anyhow::Result<()> {
//! let options = LoadOptions {
//!     key_columns: vec!["host".into()],
//!     timestamp_column: Some("when".into()),
//!     ..LoadOptions::default()
//! };
//!
//! let mut source = LoadSource::open("metrics.tsv", &options)?;
//! while let Some(decoded) = source.next()? {
//!     let mutation = &decoded.mutation;
//!     println!(
//!         "{} {} @ {}",
//!         String::from_utf8_lossy(mutation.row),
//!         mutation.family,
//!         mutation.timestamp,
//!     );
//! }
//! println!("{}", source.report());
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Concepts
//!
//! ### Load files
//!
//! A load file is line-oriented TSV whose first line is a header naming
//! the columns (an optional leading `#` is ignored). The header can also
//! live in a side file, leaving the load file pure data. Everything after
//! the header is decoded according to the detected dialect.
//!
//! ### Mutations
//!
//! Decoding produces [`Mutation`]s: row key, column family, optional
//! qualifier, timestamp, and value, borrowed zero-copy from the decoder's
//! line buffer. [`Mutation::into_owned`] detaches one when it needs to
//! outlive the next read. A missing timestamp gets [`AUTO_ASSIGN`], which
//! tells the receiving store to stamp the cell on arrival.
//!
//! ### Segments
//!
//! For uncompressed input the file can be divided into byte ranges that
//! start and end on line boundaries. Each [`Segment`] tracks its own
//! cursor, so segments can be decoded in any order, interleaved, or
//! handed to separate workers, without ever splitting a line.
//!
//! ## Feature Flags
//!
//! - `compression-gzip` - gzip load files (enabled by default)
//! - `parallel-io` - [`load_mutations_par`], whole-file loading on the
//!   rayon pool (enabled by default)
//! - `checkpointing` - [`LoadProgress`] snapshots for resumable loads
//!   (enabled by default)
//!
//! ## Module Overview
//!
//! - [`mutation`] - mutation types and the decoded-record envelope
//! - [`options`] - load configuration
//! - [`schema`] - header resolution: columns, key components, dialect
//! - [`timestamp`] - timestamp string parsing
//! - [`rowkey`] - composite row key assembly and uniquify suffixes
//! - [`decode`] - the per-line record decoder
//! - [`stream`] - line-oriented input streams, plain and gzip
//! - [`segment`] - segment planning over line boundaries
//! - [`source`] - the file-backed mutation source
//! - [`report`] - load statistics and skip reporting
//! - [`parallel`] - parallel whole-file loading
//! - [`progress`] - persistent checkpoints
//! - [`testing`] - fixtures for exercising load configurations

pub mod mutation;
pub mod options;
pub mod schema;
pub mod timestamp;
pub mod rowkey;
pub mod decode;
pub mod stream;
pub mod segment;
pub mod source;
pub mod report;
pub mod testing;

#[cfg(feature = "parallel-io")]
pub mod parallel;

#[cfg(feature = "checkpointing")]
pub mod progress;

// General re-exports
pub use decode::TsvDecoder;
pub use mutation::{AUTO_ASSIGN, Decoded, Mutation, MutationOp, OwnedMutation};
pub use options::LoadOptions;
pub use report::{LoadReport, SkipCause, SkippedLine};
pub use rowkey::{RandomSuffix, SuffixGenerator};
pub use schema::{ColumnDescriptor, Dialect, KeyComponent, MAX_COLUMNS, Roles, TableSchema};
pub use segment::{Segment, plan_segments};
pub use source::{LoadSource, load_mutations};
pub use stream::{FileLineStream, LineStream, is_gzip_path, open_line_stream};
pub use timestamp::parse_timestamp_ns;

// Gated re-exports
#[cfg(feature = "compression-gzip")]
pub use stream::GzipLineStream;

#[cfg(feature = "parallel-io")]
pub use parallel::load_mutations_par;

#[cfg(feature = "checkpointing")]
pub use progress::LoadProgress;
