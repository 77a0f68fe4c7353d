//! Stream access for PDB files in the MSF 7.00 container format.

use std::fmt;
use std::io::Cursor;

use pdb_addr2line::pdb::{self, PDB};
use symbolic_tpi::StreamSource;

use crate::error::{SymsrvError, SymsrvErrorKind};

const MAGIC_BIG: &[u8] = b"Microsoft C/C++ MSF 7.00\r\n\x1a\x44\x53\x00\x00\x00";

/// The streams of a PDB file.
pub struct PdbStreams<'data> {
    pdb: PDB<'data, Cursor<&'data [u8]>>,
}

impl<'data> PdbStreams<'data> {
    /// Tests whether the buffer could contain a PDB file.
    pub fn test(data: &[u8]) -> bool {
        // "Microsoft C/C++ program database 2.00" is not supported by the pdb crate.
        data.starts_with(MAGIC_BIG)
    }

    /// Opens the PDB container in the given buffer.
    pub fn open(data: &'data [u8]) -> Result<Self, SymsrvError> {
        let pdb = PDB::open(Cursor::new(data))?;
        Ok(PdbStreams { pdb })
    }
}

impl StreamSource for PdbStreams<'_> {
    type Error = SymsrvError;

    fn read_stream(&mut self, index: u16) -> Result<Vec<u8>, Self::Error> {
        let stream = self
            .pdb
            .raw_stream(pdb::StreamIndex(index))?
            .ok_or(SymsrvErrorKind::MissingStream(index))?;

        tracing::debug!(index, len = stream.as_slice().len(), "read PDB stream");
        Ok(stream.as_slice().to_vec())
    }
}

impl fmt::Debug for PdbStreams<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PdbStreams").finish_non_exhaustive()
    }
}
