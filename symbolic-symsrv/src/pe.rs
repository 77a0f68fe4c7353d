//! Locating the PDB file referenced by a Portable Executable.

use goblin::pe;
use scroll::{Pread, LE};
use uuid::Uuid;

use crate::error::{SymsrvError, SymsrvErrorKind};

/// Signature of a CodeView PDB 7.0 debug record (`RSDS`).
pub const CV_SIGNATURE_RSDS: u32 = 0x5344_5352;

/// Tests whether the buffer could contain a PE image.
pub fn is_pe(data: &[u8]) -> bool {
    matches!(data.pread_with::<u16>(0, LE), Ok(pe::header::DOS_MAGIC))
}

/// Identifies the PDB file that belongs to a PE image.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PdbReference {
    /// The GUID of the PDB, with its first three fields stored little endian.
    pub signature: [u8; 16],
    /// The number of times the PDB was written.
    pub age: u32,
    /// The file name of the PDB, without any directories.
    pub file_name: String,
}

impl PdbReference {
    /// Returns the identifier under which symbol servers store this PDB.
    ///
    /// This is the GUID as 32 upper-case hex digits in canonical field order, followed by the age
    /// in upper-case hex without padding.
    pub fn cache_key(&self) -> String {
        let uuid = Uuid::from_bytes_le(self.signature);
        format!("{:X}{:X}", uuid.as_simple(), self.age)
    }
}

/// Returns the last component of a Windows or Unix path, if it is a usable file name.
fn file_name_of(path: &[u8]) -> Option<String> {
    let path = path.split(|&b| b == 0).next().unwrap_or_default();
    let path = String::from_utf8_lossy(path);
    let name = path.rsplit(['\\', '/']).next().unwrap_or_default();

    match name {
        "" | "." | ".." => None,
        name => Some(name.to_owned()),
    }
}

/// Reads the CodeView debug record of a PE image.
pub fn locate_pdb(image: &[u8]) -> Result<PdbReference, SymsrvError> {
    let pe = pe::PE::parse(image)?;

    let debug_info = pe
        .debug_data
        .as_ref()
        .and_then(|debug_data| debug_data.codeview_pdb70_debug_info.as_ref())
        .ok_or(SymsrvErrorKind::MissingDebugInfo)?;

    if debug_info.codeview_signature != CV_SIGNATURE_RSDS {
        return Err(SymsrvErrorKind::MissingDebugInfo.into());
    }

    let file_name = file_name_of(debug_info.filename).ok_or(SymsrvErrorKind::MissingDebugInfo)?;

    Ok(PdbReference {
        signature: debug_info.signature,
        age: debug_info.age,
        file_name,
    })
}
