//! Numeric leaves: values stored inline as `u16` or behind an extended-value marker.

use std::fmt;

use scroll::{Pread, LE};

use crate::error::{TpiError, TpiErrorKind};
use crate::raw::{self, LF_CHAR, LF_LONG, LF_QUADWORD, LF_SHORT, LF_ULONG, LF_UQUADWORD, LF_USHORT};

/// A decoded numeric leaf.
///
/// The signedness follows the marker the value was stored with. Inline values are always
/// unsigned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Numeric {
    /// A value stored with `LF_CHAR`, `LF_SHORT`, `LF_LONG` or `LF_QUADWORD`.
    Signed(i64),
    /// An inline value, or one stored with `LF_USHORT`, `LF_ULONG` or `LF_UQUADWORD`.
    Unsigned(u64),
}

impl Numeric {
    /// Returns the value widened so that signed and unsigned values compare correctly.
    pub fn to_i128(self) -> i128 {
        match self {
            Numeric::Signed(value) => value.into(),
            Numeric::Unsigned(value) => value.into(),
        }
    }

    /// Returns the value as an unsigned quantity such as a size or an offset.
    ///
    /// Negative values cannot describe a size and yield `None`.
    pub fn to_u64(self) -> Option<u64> {
        match self {
            Numeric::Signed(value) => u64::try_from(value).ok(),
            Numeric::Unsigned(value) => Some(value),
        }
    }
}

impl fmt::Display for Numeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Numeric::Signed(value) => value.fmt(f),
            Numeric::Unsigned(value) => value.fmt(f),
        }
    }
}

/// Returns the number of payload bytes following an extended-value marker, or `None` if `kind`
/// is not one of the seven extended kinds.
pub fn extended_width(kind: u16) -> Option<usize> {
    match kind {
        LF_CHAR => Some(1),
        LF_SHORT | LF_USHORT => Some(2),
        LF_LONG | LF_ULONG => Some(4),
        LF_QUADWORD | LF_UQUADWORD => Some(8),
        _ => None,
    }
}

/// Decodes a numeric leaf from its 16-bit `probe` and the bytes following it.
///
/// Returns the value and the number of bytes consumed from `rest`, which is zero for inline
/// values.
pub fn decode_numeric(probe: u16, rest: &[u8]) -> Result<(Numeric, usize), TpiError> {
    if probe < LF_CHAR {
        return Ok((Numeric::Unsigned(probe.into()), 0));
    }

    let width = extended_width(probe).ok_or(TpiErrorKind::UnrecognizedExtendedKind(probe))?;
    let truncated = |e| TpiError::new(TpiErrorKind::Truncated, e);

    let value = match probe {
        LF_CHAR => Numeric::Signed(rest.pread_with::<i8>(0, LE).map_err(truncated)?.into()),
        LF_SHORT => Numeric::Signed(rest.pread_with::<i16>(0, LE).map_err(truncated)?.into()),
        LF_USHORT => Numeric::Unsigned(rest.pread_with::<u16>(0, LE).map_err(truncated)?.into()),
        LF_LONG => Numeric::Signed(rest.pread_with::<i32>(0, LE).map_err(truncated)?.into()),
        LF_ULONG => Numeric::Unsigned(rest.pread_with::<u32>(0, LE).map_err(truncated)?.into()),
        LF_QUADWORD => Numeric::Signed(rest.pread_with::<i64>(0, LE).map_err(truncated)?),
        _ => Numeric::Unsigned(rest.pread_with::<u64>(0, LE).map_err(truncated)?),
    };

    Ok((value, width))
}

/// Reads a numeric leaf at `offset`, returning the value and the total size including the probe.
pub(crate) fn read_numeric(data: &[u8], offset: usize) -> Result<(Numeric, usize), TpiError> {
    let probe = raw::read_u16(data, offset)?;
    let rest = data.get(offset + 2..).ok_or(TpiErrorKind::Truncated)?;
    let (value, consumed) = decode_numeric(probe, rest)?;
    Ok((value, 2 + consumed))
}
