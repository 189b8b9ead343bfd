//! Lazy traversal of page chains: pages → cells → typed rows.
//!
//! Three cooperating pull-based iterators.  `PageChainIter` follows
//! `next_page` links until 0 (or past the end of the image), checking that
//! every page has the chain's declared type.  `CellIter` flattens pages into
//! their slot-order cells.  `RowIter` decodes each cell as a tuple and
//! matches it against the table schema, chasing overflow chains to
//! reassemble large strings.  All three are single-pass; a fresh pipeline is
//! built per query.

use std::collections::VecDeque;

use crate::catalog::TableSchema;
use crate::field_type::FieldType;
use crate::field_value::FieldValue;
use crate::page::{Page, PageId, PageType, TablePage};
use crate::pager::Pager;
use crate::serialization;
use crate::slotted_page;
use crate::tuple::{ColumnType, Tuple};
use crate::typed_row::Row;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Pager(#[from] crate::pager::Error),
    #[error(transparent)]
    Slotted(#[from] slotted_page::Error),
    #[error(transparent)]
    Codec(#[from] serialization::Error),
    #[error("page {id} has type {actual:?}, expected {expected:?}")]
    WrongPageType {
        id: PageId,
        actual: PageType,
        expected: PageType,
    },
    #[error("tuple does not match schema of table {table}: {reason}")]
    SchemaMismatch { table: String, reason: String },
}

/// Walks a page chain from `start`, yielding each page with its id.
pub struct PageChainIter<'p> {
    pager: &'p Pager,
    expected: PageType,
    next: PageId,
}

impl<'p> PageChainIter<'p> {
    pub fn new(pager: &'p Pager, expected: PageType, start: PageId) -> Self {
        PageChainIter {
            pager,
            expected,
            next: start,
        }
    }
}

impl Iterator for PageChainIter<'_> {
    type Item = Result<(PageId, TablePage), Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next == 0 || self.next >= self.pager.number_of_pages() {
            return None;
        }
        let id = self.next;
        self.next = 0; // stop after an error
        let page = match self.pager.get_page(id) {
            Ok(Page::Table(p)) if p.header.page_type == self.expected => p,
            Ok(other) => {
                return Some(Err(Error::WrongPageType {
                    id,
                    actual: other.page_type(),
                    expected: self.expected,
                }))
            }
            Err(e) => return Some(Err(e.into())),
        };
        self.next = page.header.next_page;
        Some(Ok((id, page)))
    }
}

/// Flattens a page chain into its cells, page by page in slot order.
pub struct CellIter<'p> {
    chain: PageChainIter<'p>,
    pending: VecDeque<Vec<u8>>,
}

impl<'p> CellIter<'p> {
    pub fn new(pager: &'p Pager, expected: PageType, start: PageId) -> Self {
        CellIter {
            chain: PageChainIter::new(pager, expected, start),
            pending: VecDeque::new(),
        }
    }
}

impl Iterator for CellIter<'_> {
    type Item = Result<Vec<u8>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(cell) = self.pending.pop_front() {
                return Some(Ok(cell));
            }
            let (_, page) = match self.chain.next()? {
                Ok(p) => p,
                Err(e) => return Some(Err(e)),
            };
            for cell in page.body.iter() {
                match cell {
                    Ok(c) => self.pending.push_back(c),
                    Err(e) => return Some(Err(e.into())),
                }
            }
        }
    }
}

/// Decodes a table's data chain into `Row`s in insertion order.
pub struct RowIter<'p> {
    pager: &'p Pager,
    schema: TableSchema,
    cells: CellIter<'p>,
}

impl<'p> RowIter<'p> {
    pub fn new(pager: &'p Pager, schema: TableSchema) -> Self {
        let cells = CellIter::new(pager, PageType::Data, schema.starting_page);
        RowIter {
            pager,
            schema,
            cells,
        }
    }
}

impl Iterator for RowIter<'_> {
    type Item = Result<Row, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let cell = match self.cells.next()? {
            Ok(c) => c,
            Err(e) => return Some(Err(e)),
        };
        let tuple = match Tuple::decode(&cell) {
            Ok(t) => t,
            Err(e) => return Some(Err(e.into())),
        };
        Some(build_row(self.pager, &self.schema, &tuple))
    }
}

/// Matches a decoded tuple against the schema, column by column in schema
/// order, resolving overflow columns through their page chains.
fn build_row(pager: &Pager, schema: &TableSchema, tuple: &Tuple) -> Result<Row, Error> {
    let mismatch = |reason: String| Error::SchemaMismatch {
        table: schema.name.clone(),
        reason,
    };
    if tuple.field_count() != schema.fields.len() {
        return Err(mismatch(format!(
            "tuple has {} fields, schema has {}",
            tuple.field_count(),
            schema.fields.len()
        )));
    }
    let mut row = Row::new();
    for (i, (name, field_type)) in schema.fields.iter().enumerate() {
        let value = match (tuple.types[i], field_type) {
            (ColumnType::Null, _) => FieldValue::Null,
            (ColumnType::Int, FieldType::Int) => FieldValue::Int(tuple.int_at(i)?),
            (ColumnType::Boolean, FieldType::Boolean) => FieldValue::Bool(tuple.bool_at(i)?),
            (ColumnType::String, FieldType::String) => FieldValue::Text(tuple.string_at(i)?),
            (ColumnType::Overflow, FieldType::String) => {
                let (length, first_page) = tuple.overflow_at(i)?;
                let payload = pager.read_overflow(first_page, length as usize)?;
                FieldValue::Text(String::from_utf8(payload).map_err(|e| {
                    serialization::Error::Corrupt(format!("overflow string not utf-8: {e}"))
                })?)
            }
            (column_type, _) => {
                return Err(mismatch(format!(
                    "column {name} stored as {column_type:?} but declared {field_type}"
                )))
            }
        };
        row.push(name, value);
    }
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn data_page(cells: &[&[u8]], next: PageId) -> Page {
        let mut p = TablePage::new(PageType::Data);
        for c in cells {
            p.add(c).unwrap();
        }
        p.header.next_page = next;
        Page::Table(p)
    }

    #[test]
    fn test_chain_iter_visits_in_link_order() {
        let mut pager = Pager::new();
        // Build the chain 1 -> 2 -> 0.
        pager.append_page(&data_page(&[b"a"], 2));
        pager.append_page(&data_page(&[b"b", b"c"], 0));

        let ids: Vec<PageId> = PageChainIter::new(&pager, PageType::Data, 1)
            .map(|r| r.unwrap().0)
            .collect();
        assert_eq!(ids, vec![1, 2]);

        let cells: Vec<Vec<u8>> = CellIter::new(&pager, PageType::Data, 1)
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(cells, vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
    }

    #[test]
    fn test_chain_iter_empty_start() {
        let pager = Pager::new();
        assert_eq!(
            PageChainIter::new(&pager, PageType::Data, 0).count(),
            0
        );
    }

    #[test]
    fn test_chain_iter_stops_at_image_end() {
        let mut pager = Pager::new();
        // next_page points past the image; iteration just ends.
        pager.append_page(&data_page(&[b"a"], 40));
        let ids: Vec<PageId> = PageChainIter::new(&pager, PageType::Data, 1)
            .map(|r| r.unwrap().0)
            .collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn test_chain_iter_rejects_wrong_page_type() {
        let mut pager = Pager::new();
        pager.append_page(&data_page(&[b"a"], 0));
        let mut it = PageChainIter::new(&pager, PageType::Schema, 1);
        assert!(matches!(
            it.next(),
            Some(Err(Error::WrongPageType {
                id: 1,
                actual: PageType::Data,
                expected: PageType::Schema
            }))
        ));
        assert!(it.next().is_none());
    }

    #[test]
    fn test_build_row_resolves_overflow() {
        let mut pager = Pager::new();
        let long = "x".repeat(5000);
        let first = pager.allocate_overflow(long.as_bytes());

        let mut tuple = Tuple::default();
        tuple.push_int(1);
        tuple.push_overflow(long.len() as i32, first);

        let schema = TableSchema {
            name: "t".to_string(),
            starting_page: 0,
            fields: vec![
                ("id".to_string(), FieldType::Int),
                ("body".to_string(), FieldType::String),
            ],
        };
        let row = build_row(&pager, &schema, &tuple).unwrap();
        assert_eq!(row.get("id"), Some(&FieldValue::Int(1)));
        assert_eq!(row.get("body"), Some(&FieldValue::Text(long)));
    }

    #[test]
    fn test_build_row_rejects_arity_mismatch() {
        let pager = Pager::new();
        let mut tuple = Tuple::default();
        tuple.push_int(1);
        let schema = TableSchema {
            name: "t".to_string(),
            starting_page: 0,
            fields: vec![
                ("a".to_string(), FieldType::Int),
                ("b".to_string(), FieldType::Int),
            ],
        };
        assert!(matches!(
            build_row(&pager, &schema, &tuple),
            Err(Error::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_build_row_rejects_type_drift() {
        let pager = Pager::new();
        let mut tuple = Tuple::default();
        tuple.push_string("not an int");
        let schema = TableSchema {
            name: "t".to_string(),
            starting_page: 0,
            fields: vec![("a".to_string(), FieldType::Int)],
        };
        assert!(matches!(
            build_row(&pager, &schema, &tuple),
            Err(Error::SchemaMismatch { .. })
        ));
    }
}
