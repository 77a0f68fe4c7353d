//! Walking the members and enumerators of an `LF_FIELDLIST` record.

use std::borrow::Cow;

use crate::error::{TpiError, TpiErrorKind};
use crate::numeric::{self, Numeric};
use crate::raw::{self, LF_ENUMERATE, LF_FIELDLIST, LF_MEMBER, LF_PAD0};
use crate::TypeIndex;

/// Size of the fixed prefix of `LF_MEMBER`, up to and including the offset probe.
const MEMBER_PREFIX: usize = 10;
/// Size of the fixed prefix of `LF_ENUMERATE`, up to and including the value probe.
const ENUMERATE_PREFIX: usize = 6;

/// A data member of a structure or union.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberField<'data> {
    /// Access and property flags.
    pub attributes: u16,
    /// The type of the member.
    pub field_type: TypeIndex,
    /// Byte offset of the member within its parent.
    pub offset: u64,
    /// The member name, empty for anonymous members.
    pub name: Cow<'data, str>,
}

/// A named value of an enumeration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumerateField<'data> {
    /// Access and property flags.
    pub attributes: u16,
    /// The value of the enumerator.
    pub value: Numeric,
    /// The enumerator name.
    pub name: Cow<'data, str>,
}

/// The decoded contents of a field list entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldData<'data> {
    /// An `LF_MEMBER` entry.
    Member(MemberField<'data>),
    /// An `LF_ENUMERATE` entry.
    Enumerate(EnumerateField<'data>),
}

/// A single entry of a field list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field<'data> {
    span: &'data [u8],
    data: FieldData<'data>,
}

impl<'data> Field<'data> {
    /// The raw bytes of this entry, including trailing alignment padding.
    pub fn span(&self) -> &'data [u8] {
        self.span
    }

    /// The decoded entry.
    pub fn data(&self) -> &FieldData<'data> {
        &self.data
    }

    /// Consumes the field and returns the decoded entry.
    pub fn into_data(self) -> FieldData<'data> {
        self.data
    }
}

/// The body of an `LF_FIELDLIST` record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldList<'data> {
    data: &'data [u8],
}

impl<'data> FieldList<'data> {
    /// Wraps a complete record, which must be of kind `LF_FIELDLIST`.
    pub fn parse(record: &'data [u8]) -> Result<Self, TpiError> {
        let kind = raw::read_u16(record, 0)?;
        if kind != LF_FIELDLIST {
            return Err(TpiErrorKind::UnhandledLeaf(kind).into());
        }

        Ok(FieldList { data: &record[2..] })
    }

    /// Iterates the entries in order. The iterator stops after the first error.
    pub fn iter(&self) -> FieldIter<'data> {
        FieldIter {
            data: self.data,
            offset: 0,
            failed: false,
        }
    }
}

impl<'data> IntoIterator for FieldList<'data> {
    type Item = Result<Field<'data>, TpiError>;
    type IntoIter = FieldIter<'data>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the entries of a [`FieldList`].
#[derive(Clone, Debug)]
pub struct FieldIter<'data> {
    data: &'data [u8],
    offset: usize,
    failed: bool,
}

impl<'data> FieldIter<'data> {
    fn skip_padding(&mut self) {
        while let Some(&byte) = self.data.get(self.offset) {
            if byte < LF_PAD0 {
                break;
            }
            let skip = usize::from(byte & 0x0f).max(1);
            self.offset = (self.offset + skip).min(self.data.len());
        }
    }
}

impl<'data> Iterator for FieldIter<'data> {
    type Item = Result<Field<'data>, TpiError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        self.skip_padding();
        let rest = &self.data[self.offset..];
        if rest.is_empty() {
            return None;
        }

        match parse_field(rest) {
            Ok(field) => {
                self.offset += field.span.len();
                Some(Ok(field))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

impl std::iter::FusedIterator for FieldIter<'_> {}

fn parse_field(rest: &[u8]) -> Result<Field<'_>, TpiError> {
    let kind = raw::read_u16(rest, 0)?;

    let (data, len) = match kind {
        LF_MEMBER => {
            if rest.len() < MEMBER_PREFIX {
                return Err(TpiErrorKind::Truncated.into());
            }
            let attributes = raw::read_u16(rest, 2)?;
            let field_type = raw::read_u32(rest, 4)?;
            let (offset, size) = numeric::read_numeric(rest, 8)?;
            let offset = offset
                .to_u64()
                .ok_or(TpiErrorKind::Malformed("negative member offset"))?;
            let (name, name_len) = raw::read_name(rest, 8 + size)?;

            let member = MemberField {
                attributes,
                field_type,
                offset,
                name: String::from_utf8_lossy(name),
            };
            (FieldData::Member(member), 8 + size + name_len)
        }
        LF_ENUMERATE => {
            if rest.len() < ENUMERATE_PREFIX {
                return Err(TpiErrorKind::Truncated.into());
            }
            let attributes = raw::read_u16(rest, 2)?;
            let (value, size) = numeric::read_numeric(rest, 4)?;
            let (name, name_len) = raw::read_name(rest, 4 + size)?;

            let enumerate = EnumerateField {
                attributes,
                value,
                name: String::from_utf8_lossy(name),
            };
            (FieldData::Enumerate(enumerate), 4 + size + name_len)
        }
        other => return Err(TpiErrorKind::UnhandledFieldKind(other).into()),
    };

    // Entries are aligned to four bytes, but the last one may omit its padding.
    let span = ((len + 3) & !3).min(rest.len());
    Ok(Field {
        span: &rest[..span],
        data,
    })
}
