//! Synthesis of C declarations and layout assertions for aggregates and enumerations.

use std::fmt;
use std::ops::Range;

use crate::error::{TpiError, TpiErrorKind};
use crate::fields::{FieldData, FieldList};
use crate::resolve::Depth;
use crate::table::TypeTable;
use crate::types::{ClassType, EnumerationType, TypeData};
use crate::TypeIndex;

/// A layout fact about a declared type, rendered as a `static_assert`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Assertion {
    /// The total size of a type.
    Size {
        /// The name of the type.
        type_name: String,
        /// The size in bytes.
        size: u64,
    },
    /// The byte offset of a member, addressed by its dotted path.
    Offset {
        /// The name of the outermost type.
        type_name: String,
        /// The member path, with components joined by `.`.
        path: String,
        /// The byte offset from the start of the outermost type.
        offset: u64,
    },
}

impl fmt::Display for Assertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Assertion::Size { type_name, size } => {
                write!(f, "static_assert(sizeof({type_name}) == {size});")
            }
            Assertion::Offset {
                type_name,
                path,
                offset,
            } => write!(f, "static_assert(offsetof({type_name}, {path}) == {offset});"),
        }
    }
}

/// The synthesized declaration of one top-level type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Declaration {
    /// The type index the declaration was synthesized from.
    pub index: TypeIndex,
    /// The declaration, ending with `};` and no trailing newline.
    pub text: String,
    /// Layout assertions, in member order. Empty for enumerations.
    pub assertions: Vec<Assertion>,
}

/// A data member collected from a field list.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Member {
    name: String,
    field_type: TypeIndex,
    offset: u64,
    bit_position: Option<u8>,
}

impl Member {
    fn bit_offset(&self) -> Result<u64, TpiError> {
        self.offset
            .checked_mul(8)
            .and_then(|bits| bits.checked_add(self.bit_position.map_or(0, u64::from)))
            .ok_or_else(|| TpiErrorKind::Malformed("member offset overflows").into())
    }
}

/// A run of consecutive members, optionally wrapped in a synthesized block.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Run {
    members: Range<usize>,
    block: Option<&'static str>,
}

/// Groups members of a structure that share a bit offset into nested unions.
fn struct_runs(bit_offsets: &[u64]) -> Vec<Run> {
    let mut runs = Vec::new();
    let mut start = 0;

    while start < bit_offsets.len() {
        let end = start
            + bit_offsets[start..]
                .iter()
                .take_while(|&&offset| offset == bit_offsets[start])
                .count();
        let block = if end - start > 1 { Some("union") } else { None };
        runs.push(Run {
            members: start..end,
            block,
        });
        start = end;
    }

    runs
}

/// Groups members of a union that follow at non-zero offsets into nested structures.
fn union_runs(bit_offsets: &[u64]) -> Vec<Run> {
    let mut runs = Vec::new();
    let mut start = 0;

    while start < bit_offsets.len() {
        if bit_offsets[start] == 0 {
            runs.push(Run {
                members: start..start + 1,
                block: None,
            });
            start += 1;
            continue;
        }

        let end = start
            + bit_offsets[start..]
                .iter()
                .take_while(|&&offset| offset != 0)
                .count();
        runs.push(Run {
            members: start..end,
            block: Some("struct"),
        });
        start = end;
    }

    runs
}

/// Joins a member path and a member name with a dot, skipping empty components.
fn join_path(base: &str, name: &str) -> String {
    match (base.is_empty(), name.is_empty()) {
        (true, _) => name.to_owned(),
        (false, true) => base.to_owned(),
        (false, false) => format!("{base}.{name}"),
    }
}

impl<'data> TypeTable<'data> {
    /// Synthesizes the declaration of a structure, union or enumeration record.
    ///
    /// Forward references and anonymous types yield `None`, as do records of any other kind.
    pub fn synthesize(&self, index: TypeIndex) -> Result<Option<Declaration>, TpiError> {
        let depth = Depth::default();

        match self.record(index)?.parse()? {
            TypeData::Class(class) => {
                if class.properties.forward_reference() || class.is_anonymous() {
                    return Ok(None);
                }
                self.synthesize_class(index, &class, depth).map(Some)
            }
            TypeData::Enumeration(enumeration) => {
                if enumeration.properties.forward_reference() || enumeration.is_anonymous() {
                    return Ok(None);
                }
                self.synthesize_enum(index, &enumeration, depth).map(Some)
            }
            _ => Ok(None),
        }
    }

    fn synthesize_class(
        &self,
        index: TypeIndex,
        class: &ClassType<'_>,
        depth: Depth,
    ) -> Result<Declaration, TpiError> {
        let body = self.format_members(class, "    ", depth)?;
        let text = format!("{} {} {{\n{body}}};", class.kind.keyword(), class.name);

        let mut assertions = vec![Assertion::Size {
            type_name: class.name.clone().into_owned(),
            size: class.size,
        }];
        self.collect_assertions(&class.name, class.fields, "", 0, &mut assertions, depth)?;

        Ok(Declaration {
            index,
            text,
            assertions,
        })
    }

    fn synthesize_enum(
        &self,
        index: TypeIndex,
        enumeration: &EnumerationType<'_>,
        depth: Depth,
    ) -> Result<Declaration, TpiError> {
        let depth = depth.enter()?;
        let list = self.field_list(enumeration.fields)?;

        let mut entries = Vec::new();
        let mut expected = 0i128;
        for field in list {
            let enumerate = match field?.into_data() {
                FieldData::Enumerate(enumerate) => enumerate,
                FieldData::Member(_) => {
                    return Err(TpiErrorKind::Malformed("member in enumeration").into())
                }
            };

            let value = enumerate.value.to_i128();
            if value == expected {
                entries.push(format!("    {}", enumerate.name));
            } else {
                entries.push(format!("    {} = {}", enumerate.name, enumerate.value));
            }
            expected = value + 1;
        }

        let body = entries.join(",\n");
        let text = if body.is_empty() {
            format!("enum {} {{\n}};", enumeration.name)
        } else {
            format!("enum {} {{\n{body}\n}};", enumeration.name)
        };

        Ok(Declaration {
            index,
            text,
            assertions: Vec::new(),
        })
    }

    /// Renders the member block of a structure or union, one line per member at `prefix`.
    pub(crate) fn format_members(
        &self,
        class: &ClassType<'_>,
        prefix: &str,
        depth: Depth,
    ) -> Result<String, TpiError> {
        let depth = depth.enter()?;
        let members = self.collect_members(class.fields, depth)?;
        let bit_offsets = members
            .iter()
            .map(Member::bit_offset)
            .collect::<Result<Vec<_>, _>>()?;
        let runs = if class.kind.is_union() {
            union_runs(&bit_offsets)
        } else {
            struct_runs(&bit_offsets)
        };

        let mut out = String::new();
        for run in runs {
            let members = &members[run.members];
            match run.block {
                None => {
                    for member in members {
                        let line =
                            self.format_member_at(member.field_type, &member.name, prefix, depth)?;
                        out.push_str(&format!("{prefix}{line};\n"));
                    }
                }
                Some(keyword) => {
                    let inner = format!("{prefix}    ");
                    out.push_str(&format!("{prefix}{keyword} {{\n"));
                    for member in members {
                        let line =
                            self.format_member_at(member.field_type, &member.name, &inner, depth)?;
                        out.push_str(&format!("{inner}{line};\n"));
                    }
                    out.push_str(&format!("{prefix}}};\n"));
                }
            }
        }

        Ok(out)
    }

    /// Accumulates offset assertions for the members of a field list.
    ///
    /// Bitfields are skipped. Members of anonymous nested aggregates are addressed through the
    /// path of their parent, with offsets relative to the outermost type.
    fn collect_assertions(
        &self,
        type_name: &str,
        fields: TypeIndex,
        base_path: &str,
        base_offset: u64,
        assertions: &mut Vec<Assertion>,
        depth: Depth,
    ) -> Result<(), TpiError> {
        let depth = depth.enter()?;

        for member in self.collect_members(fields, depth)? {
            if member.bit_position.is_some() {
                continue;
            }

            let path = join_path(base_path, &member.name);
            let offset = base_offset
                .checked_add(member.offset)
                .ok_or(TpiErrorKind::Malformed("member offset overflows"))?;

            match self.anonymous_aggregate(member.field_type)? {
                Some(nested) => {
                    self.collect_assertions(type_name, nested, &path, offset, assertions, depth)?
                }
                None => assertions.push(Assertion::Offset {
                    type_name: type_name.to_owned(),
                    path,
                    offset,
                }),
            }
        }

        Ok(())
    }

    /// Returns the field list of an anonymous aggregate type, or `None` for any other type.
    fn anonymous_aggregate(&self, index: TypeIndex) -> Result<Option<TypeIndex>, TpiError> {
        if self.is_builtin(index) {
            return Ok(None);
        }

        match self.record(index)?.parse()? {
            TypeData::Class(class) if class.is_anonymous() => {
                let (_, definition) = self.class_definition(index)?;
                Ok(Some(definition.fields))
            }
            _ => Ok(None),
        }
    }

    fn collect_members(&self, fields: TypeIndex, depth: Depth) -> Result<Vec<Member>, TpiError> {
        let depth = depth.enter()?;
        let mut members = Vec::new();

        for field in self.field_list(fields)? {
            let member = match field?.into_data() {
                FieldData::Member(member) => member,
                FieldData::Enumerate(_) => {
                    return Err(TpiErrorKind::Malformed("enumerate in aggregate").into())
                }
            };

            let bit_position = self.bit_position(member.field_type, depth)?;
            members.push(Member {
                name: member.name.into_owned(),
                field_type: member.field_type,
                offset: member.offset,
                bit_position,
            });
        }

        Ok(members)
    }

    fn bit_position(&self, index: TypeIndex, depth: Depth) -> Result<Option<u8>, TpiError> {
        depth.enter()?;
        if self.is_builtin(index) {
            return Ok(None);
        }

        match self.record(index)?.parse()? {
            TypeData::Bitfield(bitfield) => Ok(Some(bitfield.position)),
            _ => Ok(None),
        }
    }

    fn field_list(&self, index: TypeIndex) -> Result<FieldList<'data>, TpiError> {
        let record = self.record(index)?;
        match record.parse()? {
            TypeData::FieldList(list) => Ok(list),
            _ => Err(TpiErrorKind::UnhandledLeaf(record.kind()?).into()),
        }
    }
}
