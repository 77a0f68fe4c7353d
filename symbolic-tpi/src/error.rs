use std::error::Error;

use thiserror::Error;

use crate::raw::TPI_STREAM_VERSION_80;

/// The kind of a [`TpiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum TpiErrorKind {
    /// The stream header declares a version other than [`TPI_STREAM_VERSION_80`].
    #[error("type stream version was {0}, expected {}", TPI_STREAM_VERSION_80)]
    VersionMismatch(u32),
    /// A header, record or field ends prematurely.
    #[error("type data is truncated")]
    Truncated,
    /// The record blob holds a different number of records than the header claims.
    #[error("type stream declares {expected} records, but contains {found}")]
    RecordCountMismatch {
        /// Number of records derived from the header's type index range.
        expected: u32,
        /// Number of records actually found in the blob.
        found: u32,
    },
    /// A numeric leaf uses a marker that is not one of the extended value kinds.
    #[error("unrecognized extended numeric kind {0:#x}")]
    UnrecognizedExtendedKind(u16),
    /// A field list contains a sub-record other than a member or enumerate.
    #[error("unhandled field kind {0:#x}")]
    UnhandledFieldKind(u16),
    /// A name is not terminated within its record.
    #[error("unterminated name")]
    UnterminatedName,
    /// A record has a leaf kind that cannot be used in this position.
    #[error("unhandled leaf kind {0:#x}")]
    UnhandledLeaf(u16),
    /// A type index below the record range is not a known builtin type.
    #[error("unhandled builtin type {0:#x}")]
    UnhandledBuiltin(u32),
    /// A type index lies beyond the end of the record table.
    #[error("type index {0:#x} is out of bounds")]
    IndexOutOfBounds(u32),
    /// No full definition exists for the forward reference at this type index.
    #[error("unresolved forward reference {0:#x}")]
    UnresolvedForwardRef(u32),
    /// The record uses an encoding that is not supported.
    #[error("unsupported: {0}")]
    Unsupported(&'static str),
    /// The type data is structurally invalid.
    #[error("malformed type data: {0}")]
    Malformed(&'static str),
}

/// An error encountered while decoding a type stream.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct TpiError {
    pub(crate) kind: TpiErrorKind,
    #[source]
    pub(crate) source: Option<Box<dyn Error + Send + Sync + 'static>>,
}

impl TpiError {
    /// Creates a new TpiError error from a known kind of error as well as an
    /// arbitrary error payload.
    pub(crate) fn new<E>(kind: TpiErrorKind, source: E) -> Self
    where
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        let source = Some(source.into());
        Self { kind, source }
    }

    /// Returns the corresponding [`TpiErrorKind`] for this error.
    pub fn kind(&self) -> TpiErrorKind {
        self.kind
    }
}

impl From<TpiErrorKind> for TpiError {
    fn from(kind: TpiErrorKind) -> Self {
        Self { kind, source: None }
    }
}
