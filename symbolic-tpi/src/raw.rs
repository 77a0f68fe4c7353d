//! Raw layout of the TPI stream: header, leaf kinds and little-endian field readers.
//!
//! All multi-byte values in the stream are little endian. Record prefixes are never cast into
//! structs; every field is read at an explicit offset and yields [`TpiErrorKind::Truncated`] if
//! the record is too short.

use scroll::{Pread, LE};

use crate::error::{TpiError, TpiErrorKind};

/// The only supported TPI stream version (`V80`).
pub const TPI_STREAM_VERSION_80: u32 = 20040203;

/// The index of the TPI stream within the PDB container.
pub const TPI_STREAM_INDEX: u16 = 2;

/// Leaf kind of a `const`/`volatile` modifier.
pub const LF_MODIFIER: u16 = 0x1001;
/// Leaf kind of a pointer.
pub const LF_POINTER: u16 = 0x1002;
/// Leaf kind of a procedure signature.
pub const LF_PROCEDURE: u16 = 0x1008;
/// Leaf kind of a procedure argument list.
pub const LF_ARGLIST: u16 = 0x1201;
/// Leaf kind of a list of members or enumerators.
pub const LF_FIELDLIST: u16 = 0x1203;
/// Leaf kind of a bitfield member type.
pub const LF_BITFIELD: u16 = 0x1205;
/// Field kind of an enumerator.
pub const LF_ENUMERATE: u16 = 0x1502;
/// Leaf kind of a fixed-size array.
pub const LF_ARRAY: u16 = 0x1503;
/// Leaf kind of a class.
pub const LF_CLASS: u16 = 0x1504;
/// Leaf kind of a structure.
pub const LF_STRUCTURE: u16 = 0x1505;
/// Leaf kind of a union.
pub const LF_UNION: u16 = 0x1506;
/// Leaf kind of an enumeration.
pub const LF_ENUM: u16 = 0x1507;
/// Field kind of a data member.
pub const LF_MEMBER: u16 = 0x150d;

// Markers for numeric leaves that do not fit into the inline 15 bits.
/// Signed 8-bit value.
pub const LF_CHAR: u16 = 0x8000;
/// Signed 16-bit value.
pub const LF_SHORT: u16 = 0x8001;
/// Unsigned 16-bit value.
pub const LF_USHORT: u16 = 0x8002;
/// Signed 32-bit value.
pub const LF_LONG: u16 = 0x8003;
/// Unsigned 32-bit value.
pub const LF_ULONG: u16 = 0x8004;
/// Signed 64-bit value.
pub const LF_QUADWORD: u16 = 0x8009;
/// Unsigned 64-bit value.
pub const LF_UQUADWORD: u16 = 0x800a;

/// First padding byte value. `LF_PAD0..=LF_PAD15` encode the number of bytes to skip in the low
/// nibble.
pub const LF_PAD0: u8 = 0xf0;

/// Header of the TPI stream.
///
/// Only the first five fields are required to decode type records. The hash fields are kept so
/// that the header round-trips for inspection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pread)]
pub struct TpiHeader {
    /// Stream version, must be [`TPI_STREAM_VERSION_80`].
    pub version: u32,
    /// Size of this header; the record blob starts at this offset.
    pub header_size: u32,
    /// First type index that refers to a record, lower indices are builtin types.
    pub type_index_begin: u32,
    /// One past the last valid type index.
    pub type_index_end: u32,
    /// Number of bytes of type records following the header.
    pub type_record_bytes: u32,
    /// Stream holding the hash values of the records.
    pub hash_stream_index: u16,
    /// Stream holding the auxiliary hash table.
    pub hash_aux_stream_index: u16,
    /// Size of a hash value in bytes.
    pub hash_key_size: u32,
    /// Number of buckets of the hash table.
    pub num_hash_buckets: u32,
    /// Offset of the hash values in the hash stream.
    pub hash_value_buffer_offset: u32,
    /// Length of the hash values.
    pub hash_value_buffer_length: u32,
    /// Offset of the index/offset pairs in the hash stream.
    pub index_offset_buffer_offset: u32,
    /// Length of the index/offset pairs.
    pub index_offset_buffer_length: u32,
    /// Offset of the hash adjustment table in the hash stream.
    pub hash_adj_buffer_offset: u32,
    /// Length of the hash adjustment table.
    pub hash_adj_buffer_length: u32,
}

impl TpiHeader {
    /// The encoded size of the header in bytes.
    pub const SIZE: usize = 56;

    /// Reads the header from the start of the stream.
    ///
    /// This does not validate the version, see [`TypeTable::parse`](crate::TypeTable::parse).
    pub fn parse(stream: &[u8]) -> Result<Self, TpiError> {
        stream
            .pread_with::<TpiHeader>(0, LE)
            .map_err(|e| TpiError::new(TpiErrorKind::Truncated, e))
    }
}

pub(crate) fn read_u8(data: &[u8], offset: usize) -> Result<u8, TpiError> {
    data.pread_with::<u8>(offset, LE)
        .map_err(|e| TpiError::new(TpiErrorKind::Truncated, e))
}

pub(crate) fn read_u16(data: &[u8], offset: usize) -> Result<u16, TpiError> {
    data.pread_with::<u16>(offset, LE)
        .map_err(|e| TpiError::new(TpiErrorKind::Truncated, e))
}

pub(crate) fn read_u32(data: &[u8], offset: usize) -> Result<u32, TpiError> {
    data.pread_with::<u32>(offset, LE)
        .map_err(|e| TpiError::new(TpiErrorKind::Truncated, e))
}

/// Reads a NUL-terminated name at `offset`.
///
/// Returns the name without its terminator and the number of bytes consumed including the
/// terminator.
pub(crate) fn read_name(data: &[u8], offset: usize) -> Result<(&[u8], usize), TpiError> {
    let rest = data.get(offset..).ok_or(TpiErrorKind::Truncated)?;
    let len = rest
        .iter()
        .position(|b| *b == 0)
        .ok_or(TpiErrorKind::UnterminatedName)?;
    Ok((&rest[..len], len + 1))
}

/// Checks whether a type name is one of the placeholders the compiler assigns to anonymous
/// structs, unions and enums.
pub fn is_anonymous_name(name: &str) -> bool {
    let last = name.rsplit("::").next().unwrap_or(name);
    last == "<unnamed-tag>"
        || last == "<anonymous-tag>"
        || last.starts_with("<unnamed-type-")
        || last.ends_with("__unnamed")
}
