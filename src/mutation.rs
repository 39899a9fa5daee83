use serde::{Deserialize, Serialize};

/// Timestamp sentinel: let the receiving store assign the write time.
pub const AUTO_ASSIGN: i64 = i64::MIN;

/// Kind of change a decoded record describes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MutationOp {
    /// Set the cell to the given value.
    Insert,
}

/// One decoded key/value mutation.
///
/// All slices borrow from the decoder's internal buffers and stay valid until
/// the next decode call; callers that hold on to a record convert it with
/// [`Mutation::into_owned`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Mutation<'a> {
    /// Assembled row key bytes.
    pub row: &'a [u8],
    /// Column family name.
    pub family: &'a str,
    /// Column qualifier, when the source named one.
    pub qualifier: Option<&'a [u8]>,
    /// Nanoseconds since the UNIX epoch, or [`AUTO_ASSIGN`].
    pub timestamp: i64,
    /// Cell value. `None` is an explicit null, distinct from an empty value.
    pub value: Option<&'a [u8]>,
    pub op: MutationOp,
}

impl Mutation<'_> {
    /// Deep-copy into an [`OwnedMutation`] that outlives the decoder.
    pub fn into_owned(self) -> OwnedMutation {
        OwnedMutation {
            row: self.row.to_vec(),
            family: self.family.to_string(),
            qualifier: self.qualifier.map(<[u8]>::to_vec),
            timestamp: self.timestamp,
            value: self.value.map(<[u8]>::to_vec),
            op: self.op,
        }
    }
}

/// Owning variant of [`Mutation`].
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OwnedMutation {
    pub row: Vec<u8>,
    pub family: String,
    pub qualifier: Option<Vec<u8>>,
    pub timestamp: i64,
    pub value: Option<Vec<u8>>,
    pub op: MutationOp,
}

/// A decoded record together with its byte accounting.
#[derive(Debug)]
pub struct Decoded<'a> {
    pub mutation: Mutation<'a>,
    /// Source bytes this record accounts for: its own line plus any skipped
    /// lines consumed since the previous record. On compressed input this is
    /// the physical (compressed) advance instead.
    pub bytes_consumed: u64,
    /// The physical line the record came from. Empty for the second and later
    /// records fanned out from a single line.
    pub line: &'a [u8],
}
