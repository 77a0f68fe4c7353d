//! Typed decoding of individual type records.

use std::borrow::Cow;

use crate::error::{TpiError, TpiErrorKind};
use crate::fields::FieldList;
use crate::numeric::{self, Numeric};
use crate::raw::{self, *};
use crate::TypeIndex;

/// Property flags shared by classes, structures, unions and enumerations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TypeProperties(pub u16);

impl TypeProperties {
    /// The record only declares the name; the definition is a separate record.
    pub fn forward_reference(self) -> bool {
        self.0 & 0x0080 != 0
    }

    /// The record carries a decorated unique name after its name.
    pub fn has_unique_name(self) -> bool {
        self.0 & 0x0200 != 0
    }
}

/// Modifier attributes of an `LF_MODIFIER` record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ModifierAttributes(pub u16);

impl ModifierAttributes {
    /// The type is `const`.
    pub fn is_const(self) -> bool {
        self.0 & 0x1 != 0
    }

    /// The type is `volatile`.
    pub fn is_volatile(self) -> bool {
        self.0 & 0x2 != 0
    }

    /// The type is `__unaligned`.
    pub fn is_unaligned(self) -> bool {
        self.0 & 0x4 != 0
    }
}

/// An `LF_MODIFIER` record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModifierType {
    /// The modified type.
    pub underlying_type: TypeIndex,
    /// The qualifiers applied to it.
    pub attributes: ModifierAttributes,
}

/// An `LF_POINTER` record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PointerType {
    /// The type pointed to.
    pub underlying_type: TypeIndex,
    /// Pointer kind, mode, qualifiers and size.
    pub attributes: u32,
}

impl PointerType {
    /// The size of the pointer in bytes, stored in bits 13 to 18 of the attributes.
    pub fn size(&self) -> u64 {
        u64::from((self.attributes >> 13) & 0x3f)
    }
}

/// An `LF_PROCEDURE` record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProcedureType {
    /// The return type.
    pub return_type: TypeIndex,
    /// The CodeView calling convention code.
    pub calling_convention: u8,
    /// Function attributes.
    pub attributes: u8,
    /// The number of parameters.
    pub parameter_count: u16,
    /// The `LF_ARGLIST` record with the parameter types.
    pub argument_list: TypeIndex,
}

/// An `LF_ARGLIST` record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArgumentList {
    /// The argument types. `0` marks a variadic tail.
    pub arguments: Vec<TypeIndex>,
}

/// An `LF_BITFIELD` record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BitfieldType {
    /// The integer type holding the bits.
    pub underlying_type: TypeIndex,
    /// Width in bits.
    pub length: u8,
    /// Position of the lowest bit within the storage unit.
    pub position: u8,
}

/// An `LF_ARRAY` record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArrayType<'data> {
    /// The type of the elements.
    pub element_type: TypeIndex,
    /// The type used to index the array.
    pub indexing_type: TypeIndex,
    /// Total size of the array in bytes.
    pub size: u64,
    /// The array name, usually empty.
    pub name: Cow<'data, str>,
}

/// The flavor of a [`ClassType`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClassKind {
    /// `LF_CLASS`
    Class,
    /// `LF_STRUCTURE`
    Struct,
    /// `LF_UNION`
    Union,
}

impl ClassKind {
    /// The keyword used when declaring this kind in C.
    pub fn keyword(self) -> &'static str {
        match self {
            ClassKind::Class | ClassKind::Struct => "struct",
            ClassKind::Union => "union",
        }
    }

    /// Classes and structures only differ in default visibility and refer to each other.
    pub(crate) fn is_union(self) -> bool {
        self == ClassKind::Union
    }
}

/// A class, structure or union record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassType<'data> {
    /// Whether this is a class, structure or union.
    pub kind: ClassKind,
    /// The number of fields.
    pub count: u16,
    /// Property flags.
    pub properties: TypeProperties,
    /// The field list, or `0` for forward references.
    pub fields: TypeIndex,
    /// The size in bytes.
    pub size: u64,
    /// The qualified name.
    pub name: Cow<'data, str>,
    /// The decorated name, if [`TypeProperties::has_unique_name`] is set.
    pub unique_name: Option<Cow<'data, str>>,
}

impl ClassType<'_> {
    /// Checks whether the name is a compiler placeholder for an anonymous type.
    pub fn is_anonymous(&self) -> bool {
        raw::is_anonymous_name(&self.name)
    }
}

/// An `LF_ENUM` record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumerationType<'data> {
    /// The number of enumerators.
    pub count: u16,
    /// Property flags.
    pub properties: TypeProperties,
    /// The integer type of the values.
    pub underlying_type: TypeIndex,
    /// The field list with the enumerators.
    pub fields: TypeIndex,
    /// The qualified name.
    pub name: Cow<'data, str>,
    /// The decorated name, if [`TypeProperties::has_unique_name`] is set.
    pub unique_name: Option<Cow<'data, str>>,
}

impl EnumerationType<'_> {
    /// Checks whether the name is a compiler placeholder for an anonymous type.
    pub fn is_anonymous(&self) -> bool {
        raw::is_anonymous_name(&self.name)
    }
}

/// A decoded type record.
#[derive(Clone, Debug)]
pub enum TypeData<'data> {
    /// `LF_MODIFIER`
    Modifier(ModifierType),
    /// `LF_POINTER`
    Pointer(PointerType),
    /// `LF_PROCEDURE`
    Procedure(ProcedureType),
    /// `LF_ARGLIST`
    ArgumentList(ArgumentList),
    /// `LF_FIELDLIST`
    FieldList(FieldList<'data>),
    /// `LF_BITFIELD`
    Bitfield(BitfieldType),
    /// `LF_ARRAY`
    Array(ArrayType<'data>),
    /// `LF_CLASS`, `LF_STRUCTURE` or `LF_UNION`
    Class(ClassType<'data>),
    /// `LF_ENUM`
    Enumeration(EnumerationType<'data>),
}

/// Returns the leaf kind at the start of a record.
pub fn leaf_kind(record: &[u8]) -> Result<u16, TpiError> {
    raw::read_u16(record, 0)
}

fn name_at(data: &[u8], offset: usize) -> Result<(Cow<'_, str>, usize), TpiError> {
    let (name, size) = raw::read_name(data, offset)?;
    Ok((String::from_utf8_lossy(name), size))
}

fn names_at(
    data: &[u8],
    offset: usize,
    properties: TypeProperties,
) -> Result<(Cow<'_, str>, Option<Cow<'_, str>>), TpiError> {
    let (name, size) = name_at(data, offset)?;
    let unique_name = if properties.has_unique_name() {
        Some(name_at(data, offset + size)?.0)
    } else {
        None
    };
    Ok((name, unique_name))
}

fn aggregate_size(data: &[u8], offset: usize) -> Result<(u64, usize), TpiError> {
    let (size, consumed) = numeric::read_numeric(data, offset)?;
    let size = size
        .to_u64()
        .ok_or(TpiErrorKind::Malformed("negative aggregate size"))?;
    Ok((size, consumed))
}

impl<'data> TypeData<'data> {
    /// Decodes a record, including its leading leaf kind.
    pub fn parse(record: &'data [u8]) -> Result<Self, TpiError> {
        let kind = leaf_kind(record)?;

        let data = match kind {
            LF_MODIFIER => TypeData::Modifier(ModifierType {
                underlying_type: raw::read_u32(record, 2)?,
                attributes: ModifierAttributes(raw::read_u16(record, 6)?),
            }),
            LF_POINTER => TypeData::Pointer(PointerType {
                underlying_type: raw::read_u32(record, 2)?,
                attributes: raw::read_u32(record, 6)?,
            }),
            LF_PROCEDURE => TypeData::Procedure(ProcedureType {
                return_type: raw::read_u32(record, 2)?,
                calling_convention: raw::read_u8(record, 6)?,
                attributes: raw::read_u8(record, 7)?,
                parameter_count: raw::read_u16(record, 8)?,
                argument_list: raw::read_u32(record, 10)?,
            }),
            LF_ARGLIST => {
                let count = raw::read_u32(record, 2)? as usize;
                let end = count
                    .checked_mul(4)
                    .and_then(|len| len.checked_add(6))
                    .ok_or(TpiErrorKind::Truncated)?;
                if end > record.len() {
                    return Err(TpiErrorKind::Truncated.into());
                }
                let arguments = (0..count)
                    .map(|i| raw::read_u32(record, 6 + i * 4))
                    .collect::<Result<_, _>>()?;
                TypeData::ArgumentList(ArgumentList { arguments })
            }
            LF_FIELDLIST => TypeData::FieldList(FieldList::parse(record)?),
            LF_BITFIELD => TypeData::Bitfield(BitfieldType {
                underlying_type: raw::read_u32(record, 2)?,
                length: raw::read_u8(record, 6)?,
                position: raw::read_u8(record, 7)?,
            }),
            LF_ARRAY => {
                let element_type = raw::read_u32(record, 2)?;
                let indexing_type = raw::read_u32(record, 6)?;
                let size = raw::read_u16(record, 10)?;
                if size >= LF_CHAR {
                    return Err(TpiErrorKind::Unsupported("extended array length").into());
                }
                let (name, _) = name_at(record, 12)?;
                TypeData::Array(ArrayType {
                    element_type,
                    indexing_type,
                    size: size.into(),
                    name,
                })
            }
            LF_CLASS | LF_STRUCTURE | LF_UNION => {
                let count = raw::read_u16(record, 2)?;
                let properties = TypeProperties(raw::read_u16(record, 4)?);
                let fields = raw::read_u32(record, 6)?;

                let (class_kind, size_offset) = match kind {
                    LF_CLASS => (ClassKind::Class, 18),
                    LF_STRUCTURE => (ClassKind::Struct, 18),
                    _ => (ClassKind::Union, 10),
                };

                // derived and vshape are not used, but must be present.
                if class_kind != ClassKind::Union {
                    raw::read_u32(record, 14)?;
                }

                let (size, consumed) = aggregate_size(record, size_offset)?;
                let (name, unique_name) = names_at(record, size_offset + consumed, properties)?;

                TypeData::Class(ClassType {
                    kind: class_kind,
                    count,
                    properties,
                    fields,
                    size,
                    name,
                    unique_name,
                })
            }
            LF_ENUM => {
                let properties = TypeProperties(raw::read_u16(record, 4)?);
                let (name, unique_name) = names_at(record, 14, properties)?;
                TypeData::Enumeration(EnumerationType {
                    count: raw::read_u16(record, 2)?,
                    properties,
                    underlying_type: raw::read_u32(record, 6)?,
                    fields: raw::read_u32(record, 10)?,
                    name,
                    unique_name,
                })
            }
            other => return Err(TpiErrorKind::UnhandledLeaf(other).into()),
        };

        Ok(data)
    }
}
