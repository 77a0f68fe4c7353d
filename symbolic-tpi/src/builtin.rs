//! Builtin types, encoded directly in type indices below the record range.
//!
//! The low byte of such an index selects the primitive type, the next nibble its pointer mode.
//! Only direct values, 32-bit near pointers and 64-bit pointers are supported.

use crate::error::{TpiError, TpiErrorKind};
use crate::TypeIndex;

/// Pointer mode of a builtin type index, stored in bits 8 to 11.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum BuiltinMode {
    Direct,
    Pointer32,
    Pointer64,
}

impl BuiltinMode {
    fn from_index(index: TypeIndex) -> Result<Self, TpiError> {
        match index >> 8 {
            0x0 => Ok(BuiltinMode::Direct),
            0x4 => Ok(BuiltinMode::Pointer32),
            0x6 => Ok(BuiltinMode::Pointer64),
            _ => Err(TpiErrorKind::UnhandledBuiltin(index).into()),
        }
    }
}

/// Returns the name and, if it has one, the size of a primitive type code.
fn primitive(code: u32) -> Option<(&'static str, Option<u64>)> {
    let entry = match code {
        0x03 => ("void", None),
        0x08 => ("HRESULT", Some(4)),
        0x10 => ("signed char", Some(1)),
        0x11 => ("short", Some(2)),
        0x12 => ("long", Some(4)),
        0x13 => ("long long", Some(8)),
        0x20 => ("unsigned char", Some(1)),
        0x21 => ("unsigned short", Some(2)),
        0x22 => ("unsigned long", Some(4)),
        0x23 => ("unsigned long long", Some(8)),
        0x30 => ("bool", Some(1)),
        0x40 => ("float", Some(4)),
        0x41 => ("double", Some(8)),
        0x42 => ("long double", Some(10)),
        0x68 => ("__int8", Some(1)),
        0x69 => ("unsigned __int8", Some(1)),
        0x70 => ("char", Some(1)),
        0x71 => ("wchar_t", Some(2)),
        0x72 => ("__int16", Some(2)),
        0x73 => ("unsigned __int16", Some(2)),
        0x74 => ("int", Some(4)),
        0x75 => ("unsigned int", Some(4)),
        0x76 => ("__int64", Some(8)),
        0x77 => ("unsigned __int64", Some(8)),
        0x78 => ("__int128", Some(16)),
        0x79 => ("unsigned __int128", Some(16)),
        0x7a => ("char16_t", Some(2)),
        0x7b => ("char32_t", Some(4)),
        0x7c => ("char8_t", Some(1)),
        _ => return None,
    };
    Some(entry)
}

/// Returns the source-level name of a builtin type index.
pub fn builtin_name(index: TypeIndex) -> Result<String, TpiError> {
    let mode = BuiltinMode::from_index(index)?;
    let (name, _) = primitive(index & 0xff).ok_or(TpiErrorKind::UnhandledBuiltin(index))?;

    Ok(match mode {
        BuiltinMode::Direct => name.to_owned(),
        BuiltinMode::Pointer32 | BuiltinMode::Pointer64 => format!("{name}*"),
    })
}

/// Returns the size in bytes of a builtin type index.
pub fn builtin_size(index: TypeIndex) -> Result<u64, TpiError> {
    let mode = BuiltinMode::from_index(index)?;
    let (_, size) = primitive(index & 0xff).ok_or(TpiErrorKind::UnhandledBuiltin(index))?;

    match mode {
        BuiltinMode::Direct => size.ok_or_else(|| TpiErrorKind::UnhandledBuiltin(index).into()),
        BuiltinMode::Pointer32 => Ok(4),
        BuiltinMode::Pointer64 => Ok(8),
    }
}
