//! Rendering of member declarations.

use crate::builtin;
use crate::error::{TpiError, TpiErrorKind};
use crate::resolve::Depth;
use crate::table::TypeTable;
use crate::types::{ArrayType, PointerType, ProcedureType, TypeData};
use crate::TypeIndex;

/// Joins a type name and a declarator, omitting the separator for unnamed declarators.
fn declare(type_name: &str, name: &str) -> String {
    if name.is_empty() {
        type_name.to_owned()
    } else {
        format!("{type_name} {name}")
    }
}

impl<'data> TypeTable<'data> {
    /// Renders the declaration of a member named `name` with type `index`.
    ///
    /// The result has neither leading indentation nor a trailing semicolon. Anonymous nested
    /// aggregates are inlined with their members indented one level deeper than `prefix`, and
    /// their closing brace placed at `prefix`.
    pub fn format_member(
        &self,
        index: TypeIndex,
        name: &str,
        prefix: &str,
    ) -> Result<String, TpiError> {
        self.format_member_at(index, name, prefix, Depth::default())
    }

    pub(crate) fn format_member_at(
        &self,
        index: TypeIndex,
        name: &str,
        prefix: &str,
        depth: Depth,
    ) -> Result<String, TpiError> {
        let depth = depth.enter()?;
        if self.is_builtin(index) {
            return Ok(declare(&builtin::builtin_name(index)?, name));
        }

        match self.record(index)?.parse()? {
            TypeData::Array(array) => self.format_array(&array, name, prefix, depth),
            TypeData::Bitfield(bitfield) => {
                let member = self.format_member_at(bitfield.underlying_type, name, prefix, depth)?;
                Ok(format!("{member} : {}", bitfield.length))
            }
            TypeData::Pointer(pointer) => match self.pointer_to_procedure(&pointer, depth)? {
                Some((procedure, indirection)) => {
                    let declarator = format!("({}{name})", "*".repeat(indirection));
                    self.format_procedure(&procedure, &declarator, depth)
                }
                None => Ok(declare(&self.type_name_at(index, depth)?, name)),
            },
            TypeData::Procedure(procedure) => self.format_procedure(&procedure, name, depth),
            TypeData::Class(class) if class.is_anonymous() => {
                let (_, definition) = self.class_definition(index)?;
                let inner = format!("{prefix}    ");
                let body = self.format_members(&definition, &inner, depth)?;
                Ok(format!(
                    "{} {{\n{body}{prefix}}}{}",
                    definition.kind.keyword(),
                    if name.is_empty() { String::new() } else { format!(" {name}") }
                ))
            }
            _ => Ok(declare(&self.type_name_at(index, depth)?, name)),
        }
    }

    /// Renders the types of an argument list, separated by commas.
    ///
    /// An empty list renders as `void`, a variadic tail as `...`.
    pub fn format_arguments(&self, index: TypeIndex) -> Result<String, TpiError> {
        self.format_arguments_at(index, Depth::default())
    }

    fn format_arguments_at(&self, index: TypeIndex, depth: Depth) -> Result<String, TpiError> {
        let depth = depth.enter()?;
        let record = self.record(index)?;
        let list = match record.parse()? {
            TypeData::ArgumentList(list) => list,
            _ => return Err(TpiErrorKind::UnhandledLeaf(record.kind()?).into()),
        };

        if list.arguments.is_empty() {
            return Ok("void".to_owned());
        }

        let arguments = list
            .arguments
            .iter()
            .map(|&argument| match argument {
                0 => Ok("...".to_owned()),
                _ => self.format_member_at(argument, "", "", depth),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(arguments.join(", "))
    }

    fn format_procedure(
        &self,
        procedure: &ProcedureType,
        declarator: &str,
        depth: Depth,
    ) -> Result<String, TpiError> {
        let return_type = self.type_name_at(procedure.return_type, depth)?;
        let arguments = self.format_arguments_at(procedure.argument_list, depth)?;
        Ok(format!("{return_type} {declarator}({arguments})"))
    }

    /// Follows a chain of pointers and returns the procedure at its end, along with the number
    /// of indirections.
    fn pointer_to_procedure(
        &self,
        pointer: &PointerType,
        depth: Depth,
    ) -> Result<Option<(ProcedureType, usize)>, TpiError> {
        let mut depth = depth;
        let mut indirection = 1;
        let mut target = pointer.underlying_type;

        loop {
            depth = depth.enter()?;
            if self.is_builtin(target) {
                return Ok(None);
            }

            match self.record(target)?.parse()? {
                TypeData::Pointer(next) => {
                    indirection += 1;
                    target = next.underlying_type;
                }
                TypeData::Procedure(procedure) => return Ok(Some((procedure, indirection))),
                _ => return Ok(None),
            }
        }
    }

    /// Renders an array, collapsing arrays of arrays into chained dimensions.
    fn format_array(
        &self,
        array: &ArrayType<'_>,
        name: &str,
        prefix: &str,
        depth: Depth,
    ) -> Result<String, TpiError> {
        let mut depth = depth;
        let mut declarator = name.to_owned();
        let mut size = array.size;
        let mut element = array.element_type;

        loop {
            depth = depth.enter()?;
            let element_size = self.type_size_at(element, depth)?;
            if element_size == 0 {
                return Err(TpiErrorKind::Malformed("zero-sized array element").into());
            }
            declarator.push_str(&format!("[{}]", size / element_size));

            if self.is_builtin(element) {
                break;
            }
            match self.record(element)?.parse()? {
                TypeData::Array(inner) => {
                    size = inner.size;
                    element = inner.element_type;
                }
                _ => break,
            }
        }

        self.format_member_at(element, &declarator, prefix, depth)
    }
}
