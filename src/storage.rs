//! The storage façade: the only place pages are mutated, and the home of
//! the three statement entry points.
//!
//! `create_table` allocates a table's first data page and appends a schema
//! entry to the schema chain.  `insert` types the statement's values against
//! the schema, spills large strings to overflow chains and appends the tuple
//! to the table's data chain.  `select` streams the data chain through
//! filter and projection combinators.
//!
//! Every entry point validates completely before touching a page, so a
//! statement that fails validation leaves the image byte-identical.

use crate::algebra;
use crate::ast::{CreateStatement, Expr, InsertStatement, SelectStatement};
use crate::catalog::{Catalog, TableSchema};
use crate::field_type::FieldType;
use crate::page::{Page, PageId, PageType, TablePage, PAGE_SIZE};
use crate::pager::Pager;
use crate::predicate;
use crate::scan::{PageChainIter, RowIter};
use crate::slotted_page;
use crate::tuple::{SchemaTuple, Tuple};
use crate::typed_row::Row;

/// Name of the schema chain in `allocate`-style lookups.  The chain start
/// itself lives in the root page.
const SCHEMA_CHAIN_NAME: &str = "catalog_schema";

/// Strings at least this long go to an overflow chain instead of inline.
const OVERFLOW_THRESHOLD: usize = PAGE_SIZE / 2;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("table {0} already present")]
    DuplicateTable(String),
    #[error("table {0} has no columns")]
    EmptySchema(String),
    #[error("unknown column type {0}")]
    UnknownType(String),
    #[error("table {0} does not exist")]
    UnknownTable(String),
    #[error("unknown column {column} in table {table}")]
    UnknownColumn { column: String, table: String },
    #[error("columns of insert into {0} do not match its schema")]
    ColumnArityMismatch(String),
    #[error("invalid {expected} literal: {value:?}")]
    BadLiteral { value: String, expected: FieldType },
    #[error(transparent)]
    Pager(#[from] crate::pager::Error),
    #[error(transparent)]
    Catalog(#[from] crate::catalog::Error),
    #[error(transparent)]
    Scan(#[from] crate::scan::Error),
    #[error(transparent)]
    Predicate(#[from] predicate::Error),
    #[error(transparent)]
    Slotted(#[from] slotted_page::Error),
}

/// A drained query: rendered values only, ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResult {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

pub struct Storage {
    pager: Pager,
}

impl Storage {
    pub fn new() -> Self {
        Storage {
            pager: Pager::new(),
        }
    }

    pub fn create_table(&mut self, stmt: &CreateStatement) -> Result<(), Error> {
        let catalog = Catalog::load(&self.pager)?;
        if catalog.table(&stmt.table).is_some() {
            return Err(Error::DuplicateTable(stmt.table.clone()));
        }
        if stmt.columns.is_empty() {
            return Err(Error::EmptySchema(stmt.table.clone()));
        }
        for col in &stmt.columns {
            match col.type_name.parse::<FieldType>() {
                Ok(FieldType::Float) => {
                    // Declared but has no encoding path yet.
                    return Err(Error::UnknownType(col.type_name.clone()));
                }
                Ok(_) => {}
                Err(_) => return Err(Error::UnknownType(col.type_name.clone())),
            }
        }

        let data_page_id = self.allocate_chain_page(&catalog, PageType::Data, &stmt.table)?;
        let entry = SchemaTuple {
            page_type: PageType::Data,
            starting_page: data_page_id,
            name: stmt.table.clone(),
            create_sql: stmt.to_string(),
        };
        self.add_tuple_to_chain(
            &catalog,
            PageType::Schema,
            SCHEMA_CHAIN_NAME,
            &entry.to_tuple(),
        )
    }

    pub fn insert(&mut self, stmt: &InsertStatement) -> Result<(), Error> {
        let catalog = Catalog::load(&self.pager)?;
        let schema = catalog
            .table(&stmt.table)
            .ok_or_else(|| Error::UnknownTable(stmt.table.clone()))?
            .clone();
        if stmt.columns.len() != stmt.values.len()
            || stmt.columns.len() != schema.fields.len()
        {
            return Err(Error::ColumnArityMismatch(stmt.table.clone()));
        }

        // Type every value against the schema, in schema column order,
        // before any page is touched.
        enum Parsed {
            Int(i32),
            Bool(bool),
            Str(String),
        }
        let mut parsed = vec![];
        for (name, field_type) in &schema.fields {
            let pos = stmt
                .columns
                .iter()
                .position(|c| c == name)
                .ok_or_else(|| Error::ColumnArityMismatch(stmt.table.clone()))?;
            let raw = &stmt.values[pos];
            let bad = || Error::BadLiteral {
                value: raw.clone(),
                expected: *field_type,
            };
            parsed.push(match field_type {
                FieldType::Int => Parsed::Int(raw.parse::<i32>().map_err(|_| bad())?),
                FieldType::Boolean => {
                    Parsed::Bool(raw.to_lowercase().parse::<bool>().map_err(|_| bad())?)
                }
                FieldType::String => Parsed::Str(raw.clone()),
                FieldType::Float => return Err(Error::UnknownType(field_type.to_string())),
            });
        }

        let mut tuple = Tuple::default();
        for p in &parsed {
            match p {
                Parsed::Int(v) => tuple.push_int(*v),
                Parsed::Bool(v) => tuple.push_bool(*v),
                Parsed::Str(v) if v.len() < OVERFLOW_THRESHOLD => tuple.push_string(v),
                Parsed::Str(v) => {
                    let first = self.pager.allocate_overflow(v.as_bytes());
                    tuple.push_overflow(v.len() as i32, first);
                }
            }
        }
        self.add_tuple_to_chain(&catalog, PageType::Data, &stmt.table, &tuple)
    }

    pub fn select(&self, stmt: &SelectStatement) -> Result<QueryResult, Error> {
        let catalog = Catalog::load(&self.pager)?;
        let schema = catalog
            .table(&stmt.table)
            .ok_or_else(|| Error::UnknownTable(stmt.table.clone()))?
            .clone();

        let columns = if stmt.has_wildcard {
            schema.field_names()
        } else {
            for c in &stmt.columns {
                if schema.field_type(c).is_none() {
                    return Err(Error::UnknownColumn {
                        column: c.clone(),
                        table: stmt.table.clone(),
                    });
                }
            }
            stmt.columns.clone()
        };
        if let Some(expr) = &stmt.where_clause {
            validate_predicate_columns(expr, &schema, &stmt.table)?;
        }

        let rows = RowIter::new(&self.pager, schema).map(|r| r.map_err(Error::from));
        let filtered: Box<dyn Iterator<Item = Result<Row, Error>> + '_> =
            match &stmt.where_clause {
                Some(expr) => Box::new(algebra::select(rows, move |row| {
                    predicate::eval_predicate(expr, row).map_err(Error::from)
                })),
                None => Box::new(rows),
            };
        let projected = algebra::project(filtered, columns.clone());

        let mut rendered = vec![];
        for row in projected {
            let row = row?;
            rendered.push(row.iter().map(|(_, v)| v.to_string()).collect());
        }
        Ok(QueryResult {
            header: columns,
            rows: rendered,
        })
    }

    /// The catalog as currently stored, for the `schema` command.
    pub fn schema(&self) -> Result<Vec<TableSchema>, Error> {
        Ok(Catalog::load(&self.pager)?.tables().to_vec())
    }

    /// The whole page image, for `dump_db`.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.pager.to_bytes()
    }

    /// A storage over a previously dumped image, for `load_db`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        Ok(Storage {
            pager: Pager::from_bytes(bytes)?,
        })
    }

    /// Appends a fresh empty page to the `(page_type, name)` chain and
    /// returns its id.  The new page is persisted before the old tail's
    /// `next_page` starts pointing at it.
    fn allocate_chain_page(
        &mut self,
        catalog: &Catalog,
        page_type: PageType,
        name: &str,
    ) -> Result<PageId, Error> {
        let start = self.chain_start(catalog, page_type, name);
        let tail = self.chain_tail(page_type, start)?;
        let new_id = self
            .pager
            .append_page(&Page::Table(TablePage::new(page_type)));
        match tail {
            Some((tail_id, mut tail_page)) => {
                tail_page.header.next_page = new_id;
                self.pager.persist_page(tail_id, &Page::Table(tail_page))?;
            }
            None => {
                // A brand-new chain.  The schema chain is rooted in page 0;
                // data chains are rooted in the schema entry the caller is
                // about to write.
                if page_type == PageType::Schema {
                    self.pager.set_schema_page_start(new_id);
                }
            }
        }
        Ok(new_id)
    }

    /// Appends an encoded tuple to the tail of the `(page_type, name)`
    /// chain, growing the chain by one page when the tail is full.
    fn add_tuple_to_chain(
        &mut self,
        catalog: &Catalog,
        page_type: PageType,
        name: &str,
        tuple: &Tuple,
    ) -> Result<(), Error> {
        let encoded = tuple.encode();
        let start = self.chain_start(catalog, page_type, name);
        let (tail_id, mut tail_page) = match self.chain_tail(page_type, start)? {
            Some(tail) => tail,
            None => {
                let id = self.allocate_chain_page(catalog, page_type, name)?;
                (id, self.table_page(id)?)
            }
        };
        match tail_page.add(&encoded) {
            Ok(_) => {
                self.pager.persist_page(tail_id, &Page::Table(tail_page))?;
                Ok(())
            }
            Err(slotted_page::Error::NoSpace) => {
                let new_id = self.allocate_chain_page(catalog, page_type, name)?;
                let mut new_page = self.table_page(new_id)?;
                new_page.add(&encoded)?;
                self.pager.persist_page(new_id, &Page::Table(new_page))?;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn chain_start(&self, catalog: &Catalog, page_type: PageType, name: &str) -> PageId {
        match page_type {
            PageType::Schema => self.pager.root().schema_page_start,
            _ => catalog.starting_page_for(page_type, name).unwrap_or(0),
        }
    }

    fn chain_tail(
        &self,
        page_type: PageType,
        start: PageId,
    ) -> Result<Option<(PageId, TablePage)>, Error> {
        let mut tail = None;
        for item in PageChainIter::new(&self.pager, page_type, start) {
            tail = Some(item?);
        }
        Ok(tail)
    }

    fn table_page(&self, id: PageId) -> Result<TablePage, Error> {
        match self.pager.get_page(id)? {
            Page::Table(p) => Ok(p),
            Page::Overflow(p) => Err(crate::scan::Error::WrongPageType {
                id,
                actual: p.header.page_type,
                expected: PageType::Data,
            }
            .into()),
        }
    }
}

impl Default for Storage {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_predicate_columns(
    expr: &Expr,
    schema: &TableSchema,
    table: &str,
) -> Result<(), Error> {
    match expr {
        Expr::Column(name) => {
            if schema.field_type(name).is_none() {
                return Err(Error::UnknownColumn {
                    column: name.clone(),
                    table: table.to_string(),
                });
            }
            Ok(())
        }
        Expr::Infix { left, right, .. } => {
            validate_predicate_columns(left, schema, table)?;
            validate_predicate_columns(right, schema, table)
        }
        Expr::Literal(_) => Ok(()),
    }
}
