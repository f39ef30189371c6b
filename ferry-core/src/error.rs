use std::fmt::{self, Display};
use thiserror::Error;

/// Which side of a reconciliation carried the unmatched names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MismatchSide {
    /// Source columns (cursor, or records being written) not found in the destination.
    Source,
    /// Destination fields (record fields, or table columns) not found in the source.
    Destination,
}

impl Display for MismatchSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MismatchSide::Source => "source",
            MismatchSide::Destination => "destination",
        })
    }
}

/// Typed failures of the mapping core.
///
/// The crate-wide [`Result`](crate::Result) is `anyhow` based, these travel inside it
/// and are recovered with `error.downcast_ref::<MappingError>()`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MappingError {
    /// Reconciliation found unmatched names on a side the selector requires to be covered.
    #[error(
        "Field selection mismatch: the {side} has unmatched fields (source: {source_count}, destination: {dest_count}, matched: {matched_count})"
    )]
    FieldSelectionMismatch {
        side: MismatchSide,
        source_count: usize,
        dest_count: usize,
        matched_count: usize,
    },

    /// The same name appears twice on one side under the active case rule.
    #[error("Duplicate {side} name `{name}`")]
    DuplicateName { side: MismatchSide, name: String },

    /// A cell value could not be converted to the type of its target field.
    #[error("Cannot convert column `{column}` into {target}: {message}")]
    Conversion {
        column: String,
        target: String,
        message: String,
    },

    /// A matched field has no setter.
    #[error("Field `{0}` is read only and cannot be assigned from a column")]
    ReadOnlyField(String),

    /// Access to a reader or cursor after it was closed.
    #[error("The reader is closed")]
    ReaderClosed,

    /// A cell was read before the first successful advance.
    #[error("The reader has no current row, call read first")]
    NoCurrentRow,

    #[error("Column ordinal {ordinal} is out of range, the cursor has {count} columns")]
    ColumnOutOfRange { ordinal: usize, count: usize },

    #[error("The operation was cancelled")]
    Cancelled,
}
