//! Self-describing row encoding: a field count, one type tag per column,
//! then the column payloads back to back.
//!
//! Column payloads are pre-encoded with the primitive codec; the type tag is
//! what tells the decoder how wide each one is (`Null` 0 bytes, `Boolean` 1,
//! `Int` 4, `String` 4 + length, `Overflow` 4 + 4).  Schema entries are
//! ordinary tuples with a fixed four-column shape, stored in Schema pages.

use std::io::Cursor;

use crate::page::{PageId, PageType};
use crate::serialization::{self, put_bool, put_int, put_string, read_bool, read_int, read_string};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Null,
    Boolean,
    Int,
    String,
    /// A string too large to inline: the payload is `{total_length,
    /// first_overflow_page_id}`.
    Overflow,
}

impl ColumnType {
    pub fn from_i32(v: i32) -> Result<Self, serialization::Error> {
        match v {
            0 => Ok(ColumnType::Null),
            1 => Ok(ColumnType::Boolean),
            2 => Ok(ColumnType::Int),
            3 => Ok(ColumnType::String),
            4 => Ok(ColumnType::Overflow),
            _ => Err(serialization::Error::Corrupt(format!(
                "invalid column type: {v}"
            ))),
        }
    }

    pub fn as_i32(&self) -> i32 {
        match self {
            ColumnType::Null => 0,
            ColumnType::Boolean => 1,
            ColumnType::Int => 2,
            ColumnType::String => 3,
            ColumnType::Overflow => 4,
        }
    }
}

/// One encoded row.  `types` and `columns` always have the same length and
/// the column order matches the table schema order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tuple {
    pub types: Vec<ColumnType>,
    /// Per-column payloads, each already in primitive-codec form.
    pub columns: Vec<Vec<u8>>,
}

impl Tuple {
    pub fn field_count(&self) -> usize {
        self.types.len()
    }

    pub fn push_null(&mut self) {
        self.types.push(ColumnType::Null);
        self.columns.push(vec![]);
    }

    pub fn push_bool(&mut self, v: bool) {
        let mut payload = vec![];
        put_bool(&mut payload, v);
        self.types.push(ColumnType::Boolean);
        self.columns.push(payload);
    }

    pub fn push_int(&mut self, v: i32) {
        let mut payload = vec![];
        put_int(&mut payload, v);
        self.types.push(ColumnType::Int);
        self.columns.push(payload);
    }

    pub fn push_string(&mut self, v: &str) {
        let mut payload = vec![];
        put_string(&mut payload, v);
        self.types.push(ColumnType::String);
        self.columns.push(payload);
    }

    pub fn push_overflow(&mut self, total_length: i32, first_page: PageId) {
        let mut payload = vec![];
        put_int(&mut payload, total_length);
        put_int(&mut payload, first_page);
        self.types.push(ColumnType::Overflow);
        self.columns.push(payload);
    }

    pub fn bool_at(&self, i: usize) -> Result<bool, serialization::Error> {
        read_bool(&mut Cursor::new(&self.columns[i][..]))
    }

    pub fn int_at(&self, i: usize) -> Result<i32, serialization::Error> {
        read_int(&mut Cursor::new(&self.columns[i][..]))
    }

    pub fn string_at(&self, i: usize) -> Result<String, serialization::Error> {
        read_string(&mut Cursor::new(&self.columns[i][..]))
    }

    /// `(total_length, first_overflow_page_id)` of an overflow column.
    pub fn overflow_at(&self, i: usize) -> Result<(i32, PageId), serialization::Error> {
        let mut c = Cursor::new(&self.columns[i][..]);
        Ok((read_int(&mut c)?, read_int(&mut c)?))
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = vec![];
        put_int(&mut out, self.types.len() as i32);
        for t in &self.types {
            put_int(&mut out, t.as_i32());
        }
        for c in &self.columns {
            out.extend_from_slice(c);
        }
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, serialization::Error> {
        let mut c = Cursor::new(bytes);
        let field_count = read_int(&mut c)?;
        if field_count < 0 {
            return Err(serialization::Error::Corrupt(format!(
                "negative field count: {field_count}"
            )));
        }
        let mut types = Vec::with_capacity(field_count as usize);
        for _ in 0..field_count {
            types.push(ColumnType::from_i32(read_int(&mut c)?)?);
        }
        let mut columns = Vec::with_capacity(field_count as usize);
        for t in &types {
            let mut payload = vec![];
            match t {
                ColumnType::Null => {}
                ColumnType::Boolean => put_bool(&mut payload, read_bool(&mut c)?),
                ColumnType::Int => put_int(&mut payload, read_int(&mut c)?),
                ColumnType::String => put_string(&mut payload, &read_string(&mut c)?),
                ColumnType::Overflow => {
                    put_int(&mut payload, read_int(&mut c)?);
                    put_int(&mut payload, read_int(&mut c)?);
                }
            }
            columns.push(payload);
        }
        Ok(Tuple { types, columns })
    }
}

/// One entry of the catalog, stored as a tuple in the schema chain.  The
/// schema itself is the verbatim `CREATE TABLE` text, re-parsed at read
/// time, which keeps the on-disk catalog human-inspectable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaTuple {
    pub page_type: PageType,
    pub starting_page: PageId,
    pub name: String,
    pub create_sql: String,
}

impl SchemaTuple {
    pub fn to_tuple(&self) -> Tuple {
        let mut t = Tuple::default();
        t.push_int(self.page_type.as_i32());
        t.push_int(self.starting_page);
        t.push_string(&self.name);
        t.push_string(&self.create_sql);
        t
    }

    pub fn from_tuple(t: &Tuple) -> Result<Self, serialization::Error> {
        if t.field_count() != 4 {
            return Err(serialization::Error::Corrupt(format!(
                "schema tuple has {} fields, expected 4",
                t.field_count()
            )));
        }
        Ok(SchemaTuple {
            page_type: PageType::from_i32(t.int_at(0)?)?,
            starting_page: t.int_at(1)?,
            name: t.string_at(2)?,
            create_sql: t.string_at(3)?,
        })
    }
}
