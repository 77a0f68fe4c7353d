//! Builds synthetic TPI streams for tests.

#![allow(dead_code)]

use symbolic_tpi::raw::*;

/// The first record index of streams produced by [`TpiBuilder`].
pub const BEGIN: u32 = 0x1000;

pub const T_INT4: u32 = 0x74;
pub const T_UINT4: u32 = 0x75;
pub const T_CHAR: u32 = 0x70;
pub const T_REAL32: u32 = 0x40;
pub const T_VOID: u32 = 0x03;
pub const T_64PRCHAR: u32 = 0x0670;

pub const FORWARD_REF: u16 = 0x0080;
pub const HAS_UNIQUE_NAME: u16 = 0x0200;

#[macro_export]
macro_rules! assert_members {
    ($table:expr, { $($ty:expr, $name:expr => $decl:expr),* $(,)? }) => {{
        let mut __failures: Vec<String> = Vec::new();

        $({
            let __actual = match $table.format_member($ty, $name, "") {
                Ok(decl) => decl,
                Err(e) => format!("<error: {e}>"),
            };

            if __actual != $decl {
                __failures.push(format!(
                    "{:#x} {}\n   expected: {}\n   actual:   {}",
                    $ty, $name, $decl, __actual
                ));
            }
        })*

        if !__failures.is_empty() {
            panic!("formatting failed: \n\n{}\n", __failures.join("\n\n"));
        }
    }};
}

/// Encodes a numeric leaf, using the smallest unsigned representation.
pub fn numeric(value: u64) -> Vec<u8> {
    if value < 0x8000 {
        (value as u16).to_le_bytes().to_vec()
    } else if let Ok(value) = u16::try_from(value) {
        let mut bytes = LF_USHORT.to_le_bytes().to_vec();
        bytes.extend_from_slice(&value.to_le_bytes());
        bytes
    } else if let Ok(value) = u32::try_from(value) {
        let mut bytes = LF_ULONG.to_le_bytes().to_vec();
        bytes.extend_from_slice(&value.to_le_bytes());
        bytes
    } else {
        let mut bytes = LF_UQUADWORD.to_le_bytes().to_vec();
        bytes.extend_from_slice(&value.to_le_bytes());
        bytes
    }
}

/// Encodes a negative numeric leaf with `LF_LONG`.
pub fn signed_numeric(value: i32) -> Vec<u8> {
    let mut bytes = LF_LONG.to_le_bytes().to_vec();
    bytes.extend_from_slice(&value.to_le_bytes());
    bytes
}

fn name(bytes: &mut Vec<u8>, name: &str) {
    bytes.extend_from_slice(name.as_bytes());
    bytes.push(0);
}

fn pad(bytes: &mut Vec<u8>) {
    while bytes.len() % 4 != 0 {
        bytes.push(LF_PAD0 + (4 - bytes.len() % 4) as u8);
    }
}

/// An `LF_MEMBER` field list entry.
pub fn member(field_type: u32, offset: u64, member_name: &str) -> Vec<u8> {
    let mut bytes = LF_MEMBER.to_le_bytes().to_vec();
    bytes.extend_from_slice(&3u16.to_le_bytes());
    bytes.extend_from_slice(&field_type.to_le_bytes());
    bytes.extend_from_slice(&numeric(offset));
    name(&mut bytes, member_name);
    pad(&mut bytes);
    bytes
}

/// An `LF_ENUMERATE` field list entry with an encoded value.
pub fn enumerate_raw(value: &[u8], enumerate_name: &str) -> Vec<u8> {
    let mut bytes = LF_ENUMERATE.to_le_bytes().to_vec();
    bytes.extend_from_slice(&3u16.to_le_bytes());
    bytes.extend_from_slice(value);
    name(&mut bytes, enumerate_name);
    pad(&mut bytes);
    bytes
}

pub fn enumerate(value: u64, enumerate_name: &str) -> Vec<u8> {
    enumerate_raw(&numeric(value), enumerate_name)
}

/// Assembles type records into a TPI stream.
#[derive(Debug, Default)]
pub struct TpiBuilder {
    records: Vec<Vec<u8>>,
}

impl TpiBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The index the next record will receive.
    pub fn next_index(&self) -> u32 {
        BEGIN + self.records.len() as u32
    }

    /// Appends a raw record, starting with its leaf kind.
    pub fn push(&mut self, record: Vec<u8>) -> u32 {
        let index = self.next_index();
        self.records.push(record);
        index
    }

    pub fn build(&self) -> Vec<u8> {
        self.build_with_version(TPI_STREAM_VERSION_80)
    }

    pub fn build_with_version(&self, version: u32) -> Vec<u8> {
        let mut blob = Vec::new();
        for record in &self.records {
            blob.extend_from_slice(&(record.len() as u16).to_le_bytes());
            blob.extend_from_slice(record);
        }

        let mut stream = Vec::new();
        stream.extend_from_slice(&version.to_le_bytes());
        stream.extend_from_slice(&(TpiHeader::SIZE as u32).to_le_bytes());
        stream.extend_from_slice(&BEGIN.to_le_bytes());
        stream.extend_from_slice(&self.next_index().to_le_bytes());
        stream.extend_from_slice(&(blob.len() as u32).to_le_bytes());
        stream.extend_from_slice(&[0xff; 4]);
        stream.resize(TpiHeader::SIZE, 0);
        stream.extend_from_slice(&blob);
        stream
    }

    pub fn modifier(&mut self, underlying: u32, attributes: u16) -> u32 {
        let mut record = LF_MODIFIER.to_le_bytes().to_vec();
        record.extend_from_slice(&underlying.to_le_bytes());
        record.extend_from_slice(&attributes.to_le_bytes());
        self.push(record)
    }

    /// A near pointer of the given size in bytes.
    pub fn pointer(&mut self, underlying: u32, size: u32) -> u32 {
        let attributes = (size << 13) | 0x0c;
        let mut record = LF_POINTER.to_le_bytes().to_vec();
        record.extend_from_slice(&underlying.to_le_bytes());
        record.extend_from_slice(&attributes.to_le_bytes());
        self.push(record)
    }

    pub fn arglist(&mut self, arguments: &[u32]) -> u32 {
        let mut record = LF_ARGLIST.to_le_bytes().to_vec();
        record.extend_from_slice(&(arguments.len() as u32).to_le_bytes());
        for argument in arguments {
            record.extend_from_slice(&argument.to_le_bytes());
        }
        self.push(record)
    }

    pub fn procedure(&mut self, return_type: u32, arglist: u32, parameters: u16) -> u32 {
        let mut record = LF_PROCEDURE.to_le_bytes().to_vec();
        record.extend_from_slice(&return_type.to_le_bytes());
        record.extend_from_slice(&[0, 0]);
        record.extend_from_slice(&parameters.to_le_bytes());
        record.extend_from_slice(&arglist.to_le_bytes());
        self.push(record)
    }

    pub fn bitfield(&mut self, underlying: u32, length: u8, position: u8) -> u32 {
        let mut record = LF_BITFIELD.to_le_bytes().to_vec();
        record.extend_from_slice(&underlying.to_le_bytes());
        record.extend_from_slice(&[length, position]);
        self.push(record)
    }

    pub fn array(&mut self, element: u32, size: u16) -> u32 {
        let mut record = LF_ARRAY.to_le_bytes().to_vec();
        record.extend_from_slice(&element.to_le_bytes());
        record.extend_from_slice(&0x23u32.to_le_bytes());
        record.extend_from_slice(&size.to_le_bytes());
        name(&mut record, "");
        self.push(record)
    }

    pub fn field_list(&mut self, fields: &[Vec<u8>]) -> u32 {
        let mut record = LF_FIELDLIST.to_le_bytes().to_vec();
        for field in fields {
            record.extend_from_slice(field);
        }
        self.push(record)
    }

    /// A class, structure or union record. `kind` is one of `LF_CLASS`, `LF_STRUCTURE` and
    /// `LF_UNION`.
    pub fn aggregate(
        &mut self,
        kind: u16,
        properties: u16,
        fields: u32,
        size: u64,
        type_name: &str,
        unique_name: Option<&str>,
    ) -> u32 {
        let properties = match unique_name {
            Some(_) => properties | HAS_UNIQUE_NAME,
            None => properties,
        };

        let mut record = kind.to_le_bytes().to_vec();
        record.extend_from_slice(&0u16.to_le_bytes());
        record.extend_from_slice(&properties.to_le_bytes());
        record.extend_from_slice(&fields.to_le_bytes());
        if kind != LF_UNION {
            record.extend_from_slice(&[0; 8]);
        }
        record.extend_from_slice(&numeric(size));
        name(&mut record, type_name);
        if let Some(unique_name) = unique_name {
            name(&mut record, unique_name);
        }
        self.push(record)
    }

    pub fn structure(&mut self, fields: u32, size: u64, type_name: &str) -> u32 {
        self.aggregate(LF_STRUCTURE, 0, fields, size, type_name, None)
    }

    pub fn union(&mut self, fields: u32, size: u64, type_name: &str) -> u32 {
        self.aggregate(LF_UNION, 0, fields, size, type_name, None)
    }

    /// A forward reference to a structure.
    pub fn forward_structure(&mut self, type_name: &str) -> u32 {
        self.aggregate(LF_STRUCTURE, FORWARD_REF, 0, 0, type_name, None)
    }

    pub fn enumeration(&mut self, underlying: u32, fields: u32, type_name: &str) -> u32 {
        let mut record = LF_ENUM.to_le_bytes().to_vec();
        record.extend_from_slice(&0u16.to_le_bytes());
        record.extend_from_slice(&0u16.to_le_bytes());
        record.extend_from_slice(&underlying.to_le_bytes());
        record.extend_from_slice(&fields.to_le_bytes());
        name(&mut record, type_name);
        self.push(record)
    }
}
