//! Header resolution: column descriptors, roles, key layout, and dialect.
//!
//! The first line of a load file (or of a separate header file) names the
//! columns. Resolution turns that line plus the configured key and timestamp
//! columns into an immutable [`TableSchema`] that the decoder consults on
//! every data line. All configuration mistakes surface here, before any data
//! is read.

use anyhow::{Result, bail};

/// Hard cap on header columns.
pub const MAX_COLUMNS: usize = 255;

/// One header column, split at the first `:` into family and qualifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub family: String,
    /// Empty when the header did not name a qualifier.
    pub qualifier: String,
}

/// Role flags attached to a column position.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Roles(u32);

impl Roles {
    pub const ROW_KEY: Roles = Roles(1 << 0);
    pub const TIMESTAMP: Roles = Roles(1 << 1);

    #[inline]
    pub fn contains(self, other: Roles) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub fn insert(&mut self, other: Roles) {
        self.0 |= other.0;
    }

    /// Neither a key nor a timestamp column.
    #[inline]
    pub fn is_plain(self) -> bool {
        self.0 == 0
    }
}

/// One piece of the row key: a column plus its padding rule.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct KeyComponent {
    /// Index into the resolved columns.
    pub column: usize,
    /// Minimum rendered width; values shorter than this are padded, longer
    /// ones are kept whole.
    pub width: usize,
    /// Padding byte, `b' '` or `b'0'`.
    pub pad: u8,
    /// Pad after the value instead of before it.
    pub left_justify: bool,
}

impl Default for KeyComponent {
    fn default() -> Self {
        Self {
            column: 0,
            width: 0,
            pad: b' ',
            left_justify: false,
        }
    }
}

/// Input layout, detected from the header names.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Dialect {
    /// One input row per line; every non-key, non-timestamp column fans out
    /// to its own record.
    Tabular,
    /// One cell per line: `row TAB column TAB value`, optionally preceded by
    /// a raw integer nanosecond timestamp field.
    Cells { leading_timestamps: bool },
}

/// Resolved header: descriptors, roles, key layout, and dialect.
#[derive(Clone, Debug)]
pub struct TableSchema {
    columns: Vec<ColumnDescriptor>,
    roles: Vec<Roles>,
    key_components: Vec<KeyComponent>,
    timestamp_column: Option<usize>,
    dialect: Dialect,
}

impl TableSchema {
    /// Resolve a header line against the configured key and timestamp
    /// columns.
    ///
    /// A leading `#` on the header is stripped along with the whitespace
    /// after it. Key column entries use the width mini-language described on
    /// [`LoadOptions::key_columns`](crate::LoadOptions::key_columns); each
    /// must name a column family present in the header. With no key columns
    /// configured, the first column becomes the row key.
    ///
    /// # Errors
    ///
    /// Fails when the header has more than 255 columns, when a key or
    /// timestamp column is absent from the header, or when a non-cells
    /// layout has fewer than two columns.
    pub fn resolve(
        header: &str,
        key_columns: &[String],
        timestamp_column: Option<&str>,
    ) -> Result<TableSchema> {
        let header = match header.strip_prefix('#') {
            Some(rest) => rest.trim_start(),
            None => header,
        };

        let mut columns = Vec::new();
        for name in header.split('\t') {
            let descriptor = match name.split_once(':') {
                Some((family, qualifier)) => ColumnDescriptor {
                    family: family.to_string(),
                    qualifier: qualifier.to_string(),
                },
                None => ColumnDescriptor {
                    family: name.to_string(),
                    qualifier: String::new(),
                },
            };
            columns.push(descriptor);
            if columns.len() > MAX_COLUMNS {
                bail!("too many columns in load file (the limit is {MAX_COLUMNS})");
            }
        }

        let mut roles = vec![Roles::default(); columns.len()];

        let mut timestamp_index = None;
        if let Some(wanted) = timestamp_column.filter(|w| !w.is_empty()) {
            for (index, column) in columns.iter().enumerate() {
                if column.family == wanted {
                    roles[index].insert(Roles::TIMESTAMP);
                    timestamp_index = Some(index);
                }
            }
            if timestamp_index.is_none() {
                bail!("timestamp column '{wanted}' not found in input file");
            }
        }

        let mut key_components = Vec::new();
        for spec in key_columns {
            let (name, component) = parse_key_specifier(spec);
            match columns.iter().position(|c| c.family == name) {
                Some(index) => {
                    key_components.push(KeyComponent { column: index, ..component });
                    roles[index].insert(Roles::ROW_KEY);
                }
                None => bail!("key column '{name}' not found in input file"),
            }
        }
        if key_components.is_empty() {
            key_components.push(KeyComponent::default());
            roles[0].insert(Roles::ROW_KEY);
        }

        let dialect = detect_dialect(&columns);

        if dialect == Dialect::Tabular && columns.len() < 2 {
            bail!("no columns specified in load file");
        }

        Ok(TableSchema {
            columns,
            roles,
            key_components,
            timestamp_column: timestamp_index,
            dialect,
        })
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn roles(&self) -> &[Roles] {
        &self.roles
    }

    pub fn key_components(&self) -> &[KeyComponent] {
        &self.key_components
    }

    /// Index of the timestamp column, when one was configured.
    pub fn timestamp_column(&self) -> Option<usize> {
        self.timestamp_column
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Whether a tabular column is folded into the row key instead of being
    /// emitted as its own record. Timestamp columns are always folded; key
    /// columns are folded unless `duplicate_key_columns` is set.
    pub fn suppressed(&self, column: usize, duplicate_key_columns: bool) -> bool {
        let roles = self.roles[column];
        roles.contains(Roles::TIMESTAMP)
            || (roles.contains(Roles::ROW_KEY) && !duplicate_key_columns)
    }
}

/// Split a key column entry into the column name and its padding rule.
///
/// Checked in order: `\%` literal escape, `%0` zero pad, `%-` left justify,
/// `%` right justify, bare name. Width digits bind greedily; the remainder
/// is the column name.
fn parse_key_specifier(spec: &str) -> (String, KeyComponent) {
    if let Some(rest) = spec.strip_prefix("\\%") {
        (format!("%{rest}"), KeyComponent::default())
    } else if let Some(rest) = spec.strip_prefix("%0") {
        let (width, name) = split_width(rest);
        (name.to_string(), KeyComponent { width, pad: b'0', ..KeyComponent::default() })
    } else if let Some(rest) = spec.strip_prefix("%-") {
        let (width, name) = split_width(rest);
        (name.to_string(), KeyComponent { width, left_justify: true, ..KeyComponent::default() })
    } else if let Some(rest) = spec.strip_prefix('%') {
        let (width, name) = split_width(rest);
        (name.to_string(), KeyComponent { width, ..KeyComponent::default() })
    } else {
        (spec.to_string(), KeyComponent::default())
    }
}

fn split_width(text: &str) -> (usize, &str) {
    let digits = text.len() - text.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    let width = text[..digits].parse().unwrap_or(0);
    (width, &text[digits..])
}

/// The cells layout is `row, column, value` by name, with an optional
/// leading `timestamp` column. Anything else is tabular.
fn detect_dialect(columns: &[ColumnDescriptor]) -> Dialect {
    if columns.len() != 3 && columns.len() != 4 {
        return Dialect::Tabular;
    }
    let base = columns.len() - 3;
    let named = |index: usize, names: &[&str]| names.contains(&columns[index].family.as_str());
    if named(base, &["row", "rowkey"])
        && named(base + 1, &["column", "columnkey"])
        && named(base + 2, &["value"])
        && (base == 0 || columns[0].family == "timestamp")
    {
        return Dialect::Cells { leading_timestamps: base == 1 };
    }
    Dialect::Tabular
}
