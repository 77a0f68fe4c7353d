//! A local cache of PDB files, filled from a symbol server.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{SymsrvError, SymsrvErrorKind};
use crate::pe::PdbReference;

/// The public Microsoft symbol server.
pub const DEFAULT_SYMBOL_SERVER: &str = "https://msdl.microsoft.com/download/symbols";

/// Environment variable overriding [`DEFAULT_SYMBOL_SERVER`].
pub const SYMBOL_SERVER_ENV: &str = "PDBDUMP_SYMBOL_SERVER";

/// A directory of PDB files, laid out as `<root>/pdb/<name>/<key>/<name>`.
///
/// Files missing from the cache are downloaded from a symbol server using the same
/// `<name>/<key>/<name>` layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SymbolCache {
    root: PathBuf,
    server: String,
}

impl SymbolCache {
    /// Creates a cache in `root` that downloads from `server`.
    pub fn new(root: impl Into<PathBuf>, server: impl Into<String>) -> Self {
        SymbolCache {
            root: root.into(),
            server: server.into(),
        }
    }

    /// Creates a cache in the user's cache directory.
    ///
    /// The root is `$XDG_CACHE_HOME`, or `$HOME/.cache` if that is not set. The server is taken
    /// from [`SYMBOL_SERVER_ENV`] if set.
    pub fn from_env() -> Result<Self, SymsrvError> {
        Self::from_vars(
            env::var_os("XDG_CACHE_HOME"),
            env::var_os("HOME"),
            env::var(SYMBOL_SERVER_ENV).ok(),
        )
    }

    fn from_vars(
        cache_home: Option<OsString>,
        home: Option<OsString>,
        server: Option<String>,
    ) -> Result<Self, SymsrvError> {
        let root = match cache_home.filter(|dir| !dir.is_empty()) {
            Some(dir) => PathBuf::from(dir),
            None => {
                let home = home
                    .filter(|dir| !dir.is_empty())
                    .ok_or(SymsrvErrorKind::NoCacheDirectory)?;
                PathBuf::from(home).join(".cache")
            }
        };

        let server = server
            .filter(|server| !server.is_empty())
            .unwrap_or_else(|| DEFAULT_SYMBOL_SERVER.to_owned());

        Ok(Self::new(root, server))
    }

    /// The cache directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The base URL of the symbol server.
    pub fn server(&self) -> &str {
        &self.server
    }

    fn cache_dir(&self, reference: &PdbReference) -> PathBuf {
        self.root
            .join("pdb")
            .join(&reference.file_name)
            .join(reference.cache_key())
    }

    /// The location of a PDB file in the cache, whether it exists or not.
    pub fn cache_path(&self, reference: &PdbReference) -> PathBuf {
        self.cache_dir(reference).join(&reference.file_name)
    }

    /// The address of a PDB file on the symbol server.
    pub fn download_url(&self, reference: &PdbReference) -> String {
        format!(
            "{}/{name}/{}/{name}",
            self.server.trim_end_matches('/'),
            reference.cache_key(),
            name = reference.file_name,
        )
    }

    /// Returns the path of a PDB file in the cache, downloading it first if necessary.
    ///
    /// Downloads are written to a temporary file next to their destination and moved into place
    /// once complete.
    pub fn fetch(&self, reference: &PdbReference) -> Result<PathBuf, SymsrvError> {
        let dir = self.cache_dir(reference);
        let path = dir.join(&reference.file_name);

        if path.is_file() {
            tracing::debug!(path = %path.display(), "found PDB in symbol cache");
            return Ok(path);
        }

        let url = self.download_url(reference);
        tracing::info!(%url, "downloading PDB");

        let response = ureq::get(url.as_str())
            .call()
            .map_err(|e| SymsrvError::new(SymsrvErrorKind::DownloadFailed, e))?;

        fs::create_dir_all(&dir)
            .map_err(|e| SymsrvError::new(SymsrvErrorKind::CacheWriteFailed, e))?;
        let mut file = NamedTempFile::new_in(&dir)
            .map_err(|e| SymsrvError::new(SymsrvErrorKind::CacheWriteFailed, e))?;

        let mut reader = response.into_body().into_reader();
        let size = io::copy(&mut reader, &mut file)
            .map_err(|e| SymsrvError::new(SymsrvErrorKind::DownloadFailed, e))?;

        file.persist(&path)
            .map_err(|e| SymsrvError::new(SymsrvErrorKind::CacheWriteFailed, e.error))?;

        tracing::debug!(path = %path.display(), size, "stored PDB in symbol cache");
        Ok(path)
    }
}
