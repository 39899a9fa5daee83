//! Loader configuration.

use std::path::PathBuf;

/// Construction-time options for a [`LoadSource`](crate::LoadSource).
///
/// Plain struct with sensible defaults; override fields with struct update
/// syntax:
///
/// ```
/// use tabload::LoadOptions;
///
/// let options = LoadOptions {
///     key_columns: vec!["%09id".into(), "region".into()],
///     timestamp_column: Some("observed".into()),
///     ..LoadOptions::default()
/// };
/// assert_eq!(options.parallel, 1);
/// ```
#[derive(Clone, Debug)]
pub struct LoadOptions {
    /// Columns whose values form the row key, joined in order by single
    /// spaces. Each entry may carry a width prefix: `%7name` right-justifies
    /// to 7 with spaces, `%07name` zero-pads, `%-7name` left-justifies, and
    /// `\%name` escapes a column whose name itself starts with a percent.
    /// When empty, the first column is the row key.
    pub key_columns: Vec<String>,
    /// Column supplying the cell timestamp, parsed as
    /// `YYYY-MM-DD HH:MM:SS` UTC. Only meaningful for the tabular layout.
    pub timestamp_column: Option<String>,
    /// Append a space plus this many random characters to every row key,
    /// so repeated keys stay distinct. Zero disables it.
    pub uniquify_chars: usize,
    /// Also emit key columns as regular records instead of only folding them
    /// into the row key.
    pub duplicate_key_columns: bool,
    /// Number of line-aligned segments the file is split into. Values above
    /// one are rejected for compressed input.
    pub parallel: usize,
    /// Read the header line from this file; the data file then holds data
    /// from its first byte.
    pub header_file: Option<PathBuf>,
    /// Print a warning to stderr for every defective line that gets skipped.
    /// Skips are recorded in the [`LoadReport`](crate::LoadReport) either way.
    pub log_warnings: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            key_columns: Vec::new(),
            timestamp_column: None,
            uniquify_chars: 0,
            duplicate_key_columns: false,
            parallel: 1,
            header_file: None,
            log_warnings: true,
        }
    }
}

impl LoadOptions {
    /// Defaults with `parallel` set to the number of logical CPUs.
    #[must_use]
    pub fn auto_parallel() -> Self {
        Self {
            parallel: num_cpus::get().max(1),
            ..Self::default()
        }
    }
}
