use std::error::Error;

use thiserror::Error;

/// The kind of a [`SymsrvError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum SymsrvErrorKind {
    /// The file is not a readable PDB container.
    #[error("invalid PDB file")]
    BadPdb,
    /// The PDB container does not have the requested stream.
    #[error("PDB file has no stream {0}")]
    MissingStream(u16),
    /// The file is not a readable PE image.
    #[error("invalid PE file")]
    BadPe,
    /// The PE image does not reference a PDB file.
    #[error("PE file has no CodeView PDB reference")]
    MissingDebugInfo,
    /// Neither `XDG_CACHE_HOME` nor `HOME` are set.
    #[error("no cache directory available")]
    NoCacheDirectory,
    /// The symbol server could not be reached or did not return the file.
    #[error("failed to download PDB file")]
    DownloadFailed,
    /// The downloaded file could not be stored in the cache.
    #[error("failed to write to the symbol cache")]
    CacheWriteFailed,
}

/// An error encountered while locating, fetching or opening a PDB file.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct SymsrvError {
    kind: SymsrvErrorKind,
    #[source]
    source: Option<Box<dyn Error + Send + Sync + 'static>>,
}

impl SymsrvError {
    /// Creates a new SymsrvError from a known kind of error as well as an
    /// arbitrary error payload.
    pub(crate) fn new<E>(kind: SymsrvErrorKind, source: E) -> Self
    where
        E: Into<Box<dyn Error + Send + Sync>>,
    {
        let source = Some(source.into());
        Self { kind, source }
    }

    /// Returns the corresponding [`SymsrvErrorKind`] for this error.
    pub fn kind(&self) -> SymsrvErrorKind {
        self.kind
    }
}

impl From<SymsrvErrorKind> for SymsrvError {
    fn from(kind: SymsrvErrorKind) -> Self {
        Self { kind, source: None }
    }
}

impl From<pdb_addr2line::pdb::Error> for SymsrvError {
    fn from(e: pdb_addr2line::pdb::Error) -> Self {
        Self::new(SymsrvErrorKind::BadPdb, e)
    }
}

impl From<goblin::error::Error> for SymsrvError {
    fn from(e: goblin::error::Error) -> Self {
        Self::new(SymsrvErrorKind::BadPe, e)
    }
}
