#[macro_use]
mod utils;

use similar_asserts::assert_eq;
use symbolic_tpi::raw::{LF_CLASS, LF_STRUCTURE, LF_UNION};
use symbolic_tpi::{read_type_stream, StreamSource, TpiErrorKind, TypeData, TypeTable};

use utils::*;

#[test]
fn test_parse_table() {
    let mut builder = TpiBuilder::new();
    let pointer = builder.pointer(T_INT4, 8);
    let constant = builder.modifier(T_INT4, 1);
    let stream = builder.build();

    let table = TypeTable::parse(&stream).unwrap();
    assert_eq!(table.type_index_begin(), BEGIN);
    assert_eq!(table.type_index_end(), BEGIN + 2);
    assert_eq!(table.len(), 2);
    assert!(table.is_builtin(T_INT4));
    assert!(!table.is_builtin(pointer));

    let indices: Vec<_> = table.records().map(|record| record.index()).collect();
    assert_eq!(indices, [pointer, constant]);

    assert!(matches!(
        table.record(constant).unwrap().parse().unwrap(),
        TypeData::Modifier(_)
    ));
}

#[test]
fn test_version_mismatch() {
    let stream = TpiBuilder::new().build_with_version(19990903);
    let err = TypeTable::parse(&stream).unwrap_err();
    assert_eq!(err.kind(), TpiErrorKind::VersionMismatch(19990903));
    assert_eq!(
        err.to_string(),
        "type stream version was 19990903, expected 20040203"
    );
}

#[test]
fn test_truncated_stream() {
    let mut builder = TpiBuilder::new();
    builder.pointer(T_INT4, 8);
    let stream = builder.build();

    // record payload cut short
    let err = TypeTable::parse(&stream[..stream.len() - 1]).unwrap_err();
    assert_eq!(err.kind(), TpiErrorKind::Truncated);

    // header cut short
    let err = TypeTable::parse(&stream[..20]).unwrap_err();
    assert_eq!(err.kind(), TpiErrorKind::Truncated);
}

#[test]
fn test_length_prefix_past_blob() {
    let mut builder = TpiBuilder::new();
    builder.pointer(T_INT4, 8);
    let mut stream = builder.build();

    // claim a longer payload than the blob holds
    let prefix = 56;
    stream[prefix] = 0x20;

    let err = TypeTable::parse(&stream).unwrap_err();
    assert_eq!(err.kind(), TpiErrorKind::Truncated);
}

#[test]
fn test_record_count_mismatch() {
    let mut builder = TpiBuilder::new();
    builder.pointer(T_INT4, 8);
    let mut stream = builder.build();

    // type_index_end
    stream[12..16].copy_from_slice(&(BEGIN + 3).to_le_bytes());

    let err = TypeTable::parse(&stream).unwrap_err();
    assert_eq!(
        err.kind(),
        TpiErrorKind::RecordCountMismatch {
            expected: 3,
            found: 1
        }
    );
}

#[test]
fn test_type_names() {
    let mut builder = TpiBuilder::new();
    let pointer = builder.pointer(T_INT4, 8);
    let constant = builder.modifier(T_CHAR, 1);
    let const_pointer = builder.pointer(constant, 8);
    let both = builder.modifier(T_INT4, 3);
    let fields = builder.field_list(&[]);
    let point = builder.structure(fields, 0, "Point");
    let point_pointer = builder.pointer(point, 4);
    let color = builder.enumeration(T_INT4, fields, "Color");
    let stream = builder.build();
    let table = TypeTable::parse(&stream).unwrap();

    assert_eq!(table.type_name(T_INT4).unwrap(), "int");
    assert_eq!(table.type_name(T_64PRCHAR).unwrap(), "char*");
    assert_eq!(table.type_name(pointer).unwrap(), "int*");
    assert_eq!(table.type_name(constant).unwrap(), "const char");
    assert_eq!(table.type_name(const_pointer).unwrap(), "const char*");
    assert_eq!(table.type_name(both).unwrap(), "const volatile int");
    assert_eq!(table.type_name(point).unwrap(), "Point");
    assert_eq!(table.type_name(point_pointer).unwrap(), "Point*");
    assert_eq!(table.type_name(color).unwrap(), "Color");

    let err = table.type_name(fields).unwrap_err();
    assert_eq!(err.kind(), TpiErrorKind::UnhandledLeaf(0x1203));
}

#[test]
fn test_type_sizes() {
    let mut builder = TpiBuilder::new();
    let pointer = builder.pointer(T_INT4, 4);
    let constant = builder.modifier(T_REAL32, 1);
    let array = builder.array(T_INT4, 40);
    let fields = builder.field_list(&[]);
    let color = builder.enumeration(T_CHAR, fields, "Color");
    let big = builder.structure(fields, 0x12345, "Big");
    let stream = builder.build();
    let table = TypeTable::parse(&stream).unwrap();

    assert_eq!(table.type_size(T_INT4).unwrap(), 4);
    assert_eq!(table.type_size(T_64PRCHAR).unwrap(), 8);
    assert_eq!(table.type_size(pointer).unwrap(), 4);
    assert_eq!(table.type_size(constant).unwrap(), 4);
    assert_eq!(table.type_size(array).unwrap(), 40);
    assert_eq!(table.type_size(color).unwrap(), 1);
    assert_eq!(table.type_size(big).unwrap(), 0x12345);

    let err = table.type_size(T_VOID).unwrap_err();
    assert_eq!(err.kind(), TpiErrorKind::UnhandledBuiltin(T_VOID));
}

#[test]
fn test_out_of_bounds() {
    let mut builder = TpiBuilder::new();
    let pointer = builder.pointer(BEGIN + 10, 8);
    let stream = builder.build();
    let table = TypeTable::parse(&stream).unwrap();

    let end = table.type_index_end();
    assert_eq!(
        table.type_name(end).unwrap_err().kind(),
        TpiErrorKind::IndexOutOfBounds(end)
    );
    assert_eq!(
        table.type_size(end).unwrap_err().kind(),
        TpiErrorKind::IndexOutOfBounds(end)
    );
    assert_eq!(
        table.type_name(pointer).unwrap_err().kind(),
        TpiErrorKind::IndexOutOfBounds(BEGIN + 10)
    );
    assert_eq!(
        table.record(T_INT4).unwrap_err().kind(),
        TpiErrorKind::IndexOutOfBounds(T_INT4)
    );
}

#[test]
fn test_cyclic_pointer() {
    let mut builder = TpiBuilder::new();
    let index = builder.next_index();
    builder.pointer(index, 8);
    let stream = builder.build();
    let table = TypeTable::parse(&stream).unwrap();

    let err = table.type_name(index).unwrap_err();
    assert_eq!(err.kind(), TpiErrorKind::Malformed("recursion limit exceeded"));
}

#[test]
fn test_forward_reference_size() {
    let mut builder = TpiBuilder::new();
    let forward = builder.forward_structure("Node");
    let fields = builder.field_list(&[member(T_INT4, 0, "value")]);
    let definition = builder.structure(fields, 24, "Node");
    let stream = builder.build();
    let table = TypeTable::parse(&stream).unwrap();

    assert_eq!(table.resolve_forward(forward).unwrap(), definition);
    assert_eq!(table.resolve_forward(definition).unwrap(), definition);
    assert_eq!(table.type_size(forward).unwrap(), 24);
}

#[test]
fn test_unresolved_forward_reference() {
    let mut builder = TpiBuilder::new();
    let forward = builder.forward_structure("Missing");
    let fields = builder.field_list(&[]);
    builder.union(fields, 4, "Missing");
    let stream = builder.build();
    let table = TypeTable::parse(&stream).unwrap();

    let err = table.type_size(forward).unwrap_err();
    assert_eq!(err.kind(), TpiErrorKind::UnresolvedForwardRef(forward));
}

#[test]
fn test_forward_reference_matching() {
    let mut builder = TpiBuilder::new();
    let fields = builder.field_list(&[]);
    let first = builder.aggregate(LF_CLASS, 0, fields, 8, "Shape", Some(".?AVShape@a@@"));
    let second = builder.aggregate(LF_STRUCTURE, 0, fields, 16, "Shape", Some(".?AUShape@b@@"));
    builder.aggregate(LF_STRUCTURE, 0, fields, 32, "Shape", None);
    let by_unique = builder.aggregate(
        LF_STRUCTURE,
        FORWARD_REF,
        0,
        0,
        "Shape",
        Some(".?AUShape@b@@"),
    );
    let by_name = builder.forward_structure("Shape");
    let union_fields = builder.field_list(&[]);
    let union = builder.union(union_fields, 2, "Shape");
    let union_forward = builder.aggregate(LF_UNION, FORWARD_REF, 0, 0, "Shape", None);
    let stream = builder.build();
    let table = TypeTable::parse(&stream).unwrap();

    assert_eq!(table.resolve_forward(by_unique).unwrap(), second);
    assert_eq!(table.type_size(by_unique).unwrap(), 16);

    // classes and structures match each other, the first definition wins
    assert_eq!(table.resolve_forward(by_name).unwrap(), first);
    assert_eq!(table.type_size(by_name).unwrap(), 8);

    assert_eq!(table.resolve_forward(union_forward).unwrap(), union);
    assert_eq!(table.type_size(union_forward).unwrap(), 2);
}

#[test]
fn test_forward_reference_unique_name_fallback() {
    let mut builder = TpiBuilder::new();
    let forward = builder.aggregate(
        LF_STRUCTURE,
        FORWARD_REF,
        0,
        0,
        "Thread",
        Some(".?AUThread@@"),
    );
    let fields = builder.field_list(&[member(T_INT4, 0, "id")]);
    let definition = builder.structure(fields, 4, "Thread");
    let stream = builder.build();
    let table = TypeTable::parse(&stream).unwrap();

    assert_eq!(table.resolve_forward(forward).unwrap(), definition);
    assert_eq!(table.type_size(forward).unwrap(), 4);
}

#[test]
fn test_format_members() {
    let mut builder = TpiBuilder::new();
    let int_args = builder.arglist(&[T_INT4, T_64PRCHAR]);
    let callback = builder.procedure(T_VOID, int_args, 2);
    let callback_pointer = builder.pointer(callback, 8);

    let no_args = builder.arglist(&[]);
    let handler = builder.procedure(T_INT4, no_args, 0);
    let handler_pointer = builder.pointer(handler, 8);
    let handler_pointer_pointer = builder.pointer(handler_pointer, 8);

    let variadic_args = builder.arglist(&[T_64PRCHAR, 0]);
    let printf = builder.procedure(T_INT4, variadic_args, 1);
    let printf_pointer = builder.pointer(printf, 8);

    let row = builder.array(T_INT4, 12);
    let matrix = builder.array(row, 24);
    let buffer = builder.array(T_CHAR, 16);
    let callbacks = builder.array(callback_pointer, 32);

    let constant = builder.modifier(T_INT4, 1);
    let const_pointer = builder.pointer(constant, 8);
    let stream = builder.build();
    let table = TypeTable::parse(&stream).unwrap();

    assert_members!(table, {
        T_INT4, "count" => "int count",
        T_INT4, "" => "int",
        callback_pointer, "callback" => "void (*callback)(int, char*)",
        handler_pointer_pointer, "handler" => "int (**handler)(void)",
        printf_pointer, "log" => "int (*log)(char*, ...)",
        matrix, "matrix" => "int matrix[2][3]",
        buffer, "name" => "char name[16]",
        callbacks, "table" => "void (*table[4])(int, char*)",
        const_pointer, "value" => "const int* value",
    });

    assert_eq!(table.format_arguments(int_args).unwrap(), "int, char*");
    assert_eq!(table.format_arguments(no_args).unwrap(), "void");
}

#[test]
fn test_zero_sized_array_element() {
    let mut builder = TpiBuilder::new();
    let fields = builder.field_list(&[]);
    let empty = builder.structure(fields, 0, "Empty");
    let array = builder.array(empty, 0);
    let stream = builder.build();
    let table = TypeTable::parse(&stream).unwrap();

    let err = table.format_member(array, "items", "").unwrap_err();
    assert_eq!(err.kind(), TpiErrorKind::Malformed("zero-sized array element"));
}

#[test]
fn test_forward_reference_member() {
    let mut builder = TpiBuilder::new();
    let forward = builder.forward_structure("Node");
    let next = builder.pointer(forward, 8);
    let fields = builder.field_list(&[member(next, 0, "next"), member(T_INT4, 8, "value")]);
    let node = builder.structure(fields, 16, "Node");
    let stream = builder.build();
    let table = TypeTable::parse(&stream).unwrap();

    let declaration = table.synthesize(node).unwrap().unwrap();
    assert_eq!(
        declaration.text,
        "struct Node {\n    Node* next;\n    int value;\n};"
    );
}

struct Archive(Vec<Vec<u8>>);

impl StreamSource for Archive {
    type Error = String;

    fn read_stream(&mut self, index: u16) -> Result<Vec<u8>, Self::Error> {
        self.0
            .get(usize::from(index))
            .cloned()
            .ok_or_else(|| format!("no stream {index}"))
    }
}

#[test]
fn test_read_from_stream_source() {
    let mut builder = TpiBuilder::new();
    let fields = builder.field_list(&[member(T_INT4, 0, "x")]);
    builder.structure(fields, 4, "Single");
    let mut archive = Archive(vec![vec![], vec![], builder.build()]);

    let stream = read_type_stream(&mut archive).unwrap();
    let table = TypeTable::parse(&stream).unwrap();
    assert_eq!(table.len(), 2);

    let mut empty = Archive(vec![]);
    assert_eq!(read_type_stream(&mut empty).unwrap_err(), "no stream 2");
}
