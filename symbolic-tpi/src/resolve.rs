//! Resolution of type names and sizes across records.

use crate::builtin;
use crate::error::{TpiError, TpiErrorKind};
use crate::table::{DefinitionKey, TypeTable};
use crate::types::{ClassType, TypeData};
use crate::TypeIndex;

/// Maximum number of nested resolutions before a type graph is considered cyclic.
pub const MAX_RECURSION_DEPTH: usize = 64;

/// Nesting depth of a resolution in progress.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Depth(usize);

impl Depth {
    /// Descends one level, failing once [`MAX_RECURSION_DEPTH`] is exceeded.
    pub fn enter(self) -> Result<Self, TpiError> {
        if self.0 >= MAX_RECURSION_DEPTH {
            return Err(TpiErrorKind::Malformed("recursion limit exceeded").into());
        }
        Ok(Depth(self.0 + 1))
    }
}

impl<'data> TypeTable<'data> {
    /// Returns the source-level name of a type.
    ///
    /// Pointers append `*` to the name of their target, modifiers prefix `const ` and
    /// `volatile `. Classes, structures, unions and enumerations yield their stored name. Other
    /// records have no name on their own and yield [`TpiErrorKind::UnhandledLeaf`].
    pub fn type_name(&self, index: TypeIndex) -> Result<String, TpiError> {
        self.type_name_at(index, Depth::default())
    }

    /// Returns the size of a type in bytes.
    ///
    /// Forward references to classes, structures and unions are resolved to their full
    /// definition first.
    pub fn type_size(&self, index: TypeIndex) -> Result<u64, TpiError> {
        self.type_size_at(index, Depth::default())
    }

    /// Returns the index of the full definition for a forward reference.
    ///
    /// Indices of records that are not forward references are returned unchanged. A forward
    /// reference with a unique name matches a definition with the same unique name, or else one
    /// with the same name. Classes and structures match each other. If several definitions
    /// match, the first one in index order wins.
    pub fn resolve_forward(&self, index: TypeIndex) -> Result<TypeIndex, TpiError> {
        if self.is_builtin(index) {
            return Ok(index);
        }

        match self.record(index)?.parse()? {
            TypeData::Class(class) if class.properties.forward_reference() => {
                let is_union = class.kind.is_union();
                let by_unique_name = class.unique_name.and_then(|unique_name| {
                    self.definition(&DefinitionKey {
                        is_union,
                        unique: true,
                        name: unique_name.into_owned(),
                    })
                });

                // Fall back to the plain name.
                by_unique_name
                    .or_else(|| {
                        self.definition(&DefinitionKey {
                            is_union,
                            unique: false,
                            name: class.name.into_owned(),
                        })
                    })
                    .ok_or_else(|| TpiErrorKind::UnresolvedForwardRef(index).into())
            }
            _ => Ok(index),
        }
    }

    /// Returns the full definition of a class, structure or union at `index`.
    pub(crate) fn class_definition(
        &self,
        index: TypeIndex,
    ) -> Result<(TypeIndex, ClassType<'data>), TpiError> {
        let index = self.resolve_forward(index)?;
        match self.record(index)?.parse()? {
            TypeData::Class(class) => Ok((index, class)),
            _ => Err(TpiErrorKind::Malformed("expected a class, structure or union").into()),
        }
    }

    pub(crate) fn type_name_at(&self, index: TypeIndex, depth: Depth) -> Result<String, TpiError> {
        let depth = depth.enter()?;
        if self.is_builtin(index) {
            return builtin::builtin_name(index);
        }

        let record = self.record(index)?;
        match record.parse()? {
            TypeData::Pointer(pointer) => {
                let name = self.type_name_at(pointer.underlying_type, depth)?;
                Ok(format!("{name}*"))
            }
            TypeData::Modifier(modifier) => {
                let mut name = String::new();
                if modifier.attributes.is_const() {
                    name.push_str("const ");
                }
                if modifier.attributes.is_volatile() {
                    name.push_str("volatile ");
                }
                name.push_str(&self.type_name_at(modifier.underlying_type, depth)?);
                Ok(name)
            }
            TypeData::Class(class) => Ok(class.name.into_owned()),
            TypeData::Enumeration(enumeration) => Ok(enumeration.name.into_owned()),
            _ => Err(TpiErrorKind::UnhandledLeaf(record.kind()?).into()),
        }
    }

    pub(crate) fn type_size_at(&self, index: TypeIndex, depth: Depth) -> Result<u64, TpiError> {
        let depth = depth.enter()?;
        if self.is_builtin(index) {
            return builtin::builtin_size(index);
        }

        let record = self.record(index)?;
        match record.parse()? {
            TypeData::Pointer(pointer) => Ok(pointer.size()),
            TypeData::Modifier(modifier) => self.type_size_at(modifier.underlying_type, depth),
            TypeData::Array(array) => Ok(array.size),
            TypeData::Enumeration(enumeration) => {
                self.type_size_at(enumeration.underlying_type, depth)
            }
            TypeData::Class(class) if class.properties.forward_reference() => {
                let (_, definition) = self.class_definition(index)?;
                Ok(definition.size)
            }
            TypeData::Class(class) => Ok(class.size),
            _ => Err(TpiErrorKind::UnhandledLeaf(record.kind()?).into()),
        }
    }
}
