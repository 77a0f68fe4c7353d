//! Writing all declarations of a type table.

use std::io::{self, Write};

use crate::printer::Assertion;
use crate::raw::{LF_CLASS, LF_ENUM, LF_STRUCTURE, LF_UNION};
use crate::table::TypeTable;

/// Statistics of a [`dump_types`] pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DumpSummary {
    /// Number of declarations written.
    pub declarations: usize,
    /// Number of forward references and anonymous types that were skipped.
    pub skipped: usize,
    /// Number of types that could not be synthesized.
    pub failed: usize,
}

impl DumpSummary {
    /// Returns `true` if types failed and none could be written.
    pub fn is_total_failure(&self) -> bool {
        self.declarations == 0 && self.failed > 0
    }
}

/// Writes the declarations of all structures, unions and enumerations in `table`.
///
/// Declarations are written in type index order, each followed by an empty line, and are followed
/// by all layout assertions in the same order. A type that fails to synthesize is logged and
/// omitted, without affecting the others. Only errors of the writer are returned.
pub fn dump_types<W: Write>(table: &TypeTable<'_>, writer: &mut W) -> io::Result<DumpSummary> {
    let mut summary = DumpSummary::default();
    let mut assertions: Vec<Assertion> = Vec::new();

    for record in table.records() {
        let index = record.index();
        match record.kind() {
            Ok(LF_CLASS | LF_STRUCTURE | LF_UNION | LF_ENUM) => (),
            _ => continue,
        }

        match table.synthesize(index) {
            Ok(Some(declaration)) => {
                writeln!(writer, "{}", declaration.text)?;
                writeln!(writer)?;
                assertions.extend(declaration.assertions);
                summary.declarations += 1;
            }
            Ok(None) => {
                tracing::debug!(type_index = %format_args!("{index:#x}"), "skipped type");
                summary.skipped += 1;
            }
            Err(err) => {
                let err: &dyn std::error::Error = &err;
                tracing::warn!(
                    type_index = %format_args!("{index:#x}"),
                    error = err,
                    "failed to synthesize type"
                );
                summary.failed += 1;
            }
        }
    }

    for assertion in &assertions {
        writeln!(writer, "{assertion}")?;
    }

    tracing::debug!(
        declarations = summary.declarations,
        skipped = summary.skipped,
        failed = summary.failed,
        "dumped types"
    );

    Ok(summary)
}
