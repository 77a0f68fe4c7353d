//! Provides support for reading the type information (TPI) stream of Microsoft PDB files,
//! and for synthesizing C declarations from it.
//!
//! The TPI stream is stream `2` of a PDB file. It holds CodeView type records describing the
//! structures, unions, enumerations, pointers, arrays, bitfields and procedures of a program.
//! Records reference each other through type indices, where indices below the first record
//! denote builtin types encoded directly in the index.
//!
//! # Functionality
//!
//! * Parse a TPI stream into a [`TypeTable`] with [`TypeTable::parse`].
//! * Resolve names and sizes of types with [`TypeTable::type_name`] and
//!   [`TypeTable::type_size`], including forward references.
//! * Render member declarations with [`TypeTable::format_member`].
//! * Synthesize the declaration of a single type with [`TypeTable::synthesize`], or write all of
//!   them followed by their layout assertions with [`dump_types`].
//!
//! ## Example
//! ```no_run
//! use symbolic_tpi::{dump_types, TypeTable};
//!
//! let stream = std::fs::read("types.tpi").unwrap();
//! let table = TypeTable::parse(&stream).unwrap();
//!
//! let mut out = Vec::new();
//! let summary = dump_types(&table, &mut out).unwrap();
//! println!("{} declarations", summary.declarations);
//! ```
//!
//! # Output
//!
//! Structures and classes are declared with `struct`, unions with `union`. Members sharing an
//! offset in a structure are wrapped in a nested anonymous `union`, and members of a union at a
//! non-zero offset in a nested anonymous `struct`. Anonymous aggregates are inlined into their
//! parent. Each aggregate contributes a `sizeof` assertion and one `offsetof` assertion per
//! member:
//!
//! ```c
//! struct Point {
//!     int x;
//!     int y;
//! };
//!
//! static_assert(sizeof(Point) == 8);
//! static_assert(offsetof(Point, x) == 0);
//! static_assert(offsetof(Point, y) == 4);
//! ```

#![warn(missing_docs)]

mod builtin;
mod dump;
mod error;
mod fields;
mod member;
mod numeric;
mod printer;
pub mod raw;
mod resolve;
mod source;
mod table;
mod types;

/// A reference to a type, either a builtin type or a record of the [`TypeTable`].
pub type TypeIndex = u32;

pub use builtin::{builtin_name, builtin_size};
pub use dump::{dump_types, DumpSummary};
pub use error::{TpiError, TpiErrorKind};
pub use fields::{EnumerateField, Field, FieldData, FieldIter, FieldList, MemberField};
pub use numeric::{decode_numeric, extended_width, Numeric};
pub use printer::{Assertion, Declaration};
pub use raw::{TpiHeader, TPI_STREAM_INDEX, TPI_STREAM_VERSION_80};
pub use resolve::MAX_RECURSION_DEPTH;
pub use source::{read_type_stream, StreamSource};
pub use table::{TypeRecord, TypeTable};
pub use types::{
    leaf_kind, ArgumentList, ArrayType, BitfieldType, ClassKind, ClassType, EnumerationType,
    ModifierAttributes, ModifierType, PointerType, ProcedureType, TypeData, TypeProperties,
};
