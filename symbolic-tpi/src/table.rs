use std::collections::HashMap;
use std::fmt;

use once_cell::unsync::OnceCell;

use crate::error::{TpiError, TpiErrorKind};
use crate::raw::{self, TpiHeader, TPI_STREAM_VERSION_80};
use crate::types::{self, TypeData};
use crate::TypeIndex;

/// A single record of the type table.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct TypeRecord<'data> {
    index: TypeIndex,
    data: &'data [u8],
}

impl<'data> TypeRecord<'data> {
    /// The type index of this record.
    pub fn index(&self) -> TypeIndex {
        self.index
    }

    /// The raw record, starting with its leaf kind and excluding the length prefix.
    pub fn data(&self) -> &'data [u8] {
        self.data
    }

    /// The leaf kind of this record.
    pub fn kind(&self) -> Result<u16, TpiError> {
        types::leaf_kind(self.data)
    }

    /// Decodes the record.
    pub fn parse(&self) -> Result<TypeData<'data>, TpiError> {
        TypeData::parse(self.data)
    }
}

impl fmt::Debug for TypeRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRecord")
            .field("index", &format_args!("{:#x}", self.index))
            .field("kind", &self.kind().ok())
            .field("len", &self.data.len())
            .finish()
    }
}

/// Lookup key for full definitions of classes, structures and unions.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct DefinitionKey {
    pub is_union: bool,
    pub unique: bool,
    pub name: String,
}

/// The records of a TPI stream, in type index order.
///
/// The table is built once and never modified. Definitions for forward references are looked
/// up through an index that is built on first use.
pub struct TypeTable<'data> {
    header: TpiHeader,
    records: Vec<&'data [u8]>,
    definitions: OnceCell<HashMap<DefinitionKey, TypeIndex>>,
}

impl<'data> TypeTable<'data> {
    /// Parses the complete contents of a TPI stream.
    ///
    /// The header version must be [`TPI_STREAM_VERSION_80`]. The record blob starts at the
    /// header's `header_size` and consists of records prefixed with their `u16` length.
    pub fn parse(stream: &'data [u8]) -> Result<Self, TpiError> {
        let header = TpiHeader::parse(stream)?;
        if header.version != TPI_STREAM_VERSION_80 {
            return Err(TpiErrorKind::VersionMismatch(header.version).into());
        }

        if header.type_index_end < header.type_index_begin {
            return Err(TpiErrorKind::Malformed("type index range is inverted").into());
        }

        let start = header.header_size as usize;
        let end = start
            .checked_add(header.type_record_bytes as usize)
            .ok_or(TpiErrorKind::Truncated)?;
        let blob = stream.get(start..end).ok_or(TpiErrorKind::Truncated)?;

        let expected = header.type_index_end - header.type_index_begin;
        let mut records = Vec::with_capacity(expected as usize);
        let mut offset = 0;

        while offset < blob.len() {
            let len = raw::read_u16(blob, offset)? as usize;
            let record = blob
                .get(offset + 2..offset + 2 + len)
                .ok_or(TpiErrorKind::Truncated)?;
            records.push(record);
            offset += 2 + len;
        }

        if records.len() != expected as usize {
            return Err(TpiErrorKind::RecordCountMismatch {
                expected,
                found: records.len() as u32,
            }
            .into());
        }

        tracing::debug!(
            begin = header.type_index_begin,
            end = header.type_index_end,
            "parsed type table"
        );

        Ok(TypeTable {
            header,
            records,
            definitions: OnceCell::new(),
        })
    }

    /// The stream header.
    pub fn header(&self) -> &TpiHeader {
        &self.header
    }

    /// The first type index that refers to a record.
    pub fn type_index_begin(&self) -> TypeIndex {
        self.header.type_index_begin
    }

    /// One past the last valid type index.
    pub fn type_index_end(&self) -> TypeIndex {
        self.header.type_index_end
    }

    /// The number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the stream holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Checks whether the index denotes a builtin type rather than a record.
    pub fn is_builtin(&self, index: TypeIndex) -> bool {
        index < self.header.type_index_begin
    }

    /// Returns the record for a type index.
    ///
    /// Builtin indices and indices past the end of the table yield
    /// [`TpiErrorKind::IndexOutOfBounds`].
    pub fn record(&self, index: TypeIndex) -> Result<TypeRecord<'data>, TpiError> {
        let data = index
            .checked_sub(self.header.type_index_begin)
            .and_then(|position| self.records.get(position as usize).copied())
            .ok_or(TpiErrorKind::IndexOutOfBounds(index))?;

        Ok(TypeRecord { index, data })
    }

    /// Iterates all records in type index order.
    pub fn records(&self) -> impl Iterator<Item = TypeRecord<'data>> + '_ {
        let begin = self.header.type_index_begin;
        self.records
            .iter()
            .zip(begin..)
            .map(|(&data, index)| TypeRecord { index, data })
    }

    /// Returns the first full definition registered under `key`.
    pub(crate) fn definition(&self, key: &DefinitionKey) -> Option<TypeIndex> {
        self.definitions
            .get_or_init(|| self.build_definitions())
            .get(key)
            .copied()
    }

    fn build_definitions(&self) -> HashMap<DefinitionKey, TypeIndex> {
        let mut definitions = HashMap::new();

        for record in self.records() {
            let class = match record.parse() {
                Ok(TypeData::Class(class)) => class,
                _ => continue,
            };

            if class.properties.forward_reference() {
                continue;
            }

            let is_union = class.kind.is_union();
            if let Some(unique_name) = class.unique_name {
                let key = DefinitionKey {
                    is_union,
                    unique: true,
                    name: unique_name.into_owned(),
                };
                definitions.entry(key).or_insert(record.index());
            }

            let key = DefinitionKey {
                is_union,
                unique: false,
                name: class.name.into_owned(),
            };
            definitions.entry(key).or_insert(record.index());
        }

        tracing::debug!(count = definitions.len(), "indexed type definitions");
        definitions
    }
}

impl fmt::Debug for TypeTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeTable")
            .field("header", &self.header)
            .field("records", &self.records.len())
            .finish()
    }
}
