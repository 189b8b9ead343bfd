// System layers, leaves first.
//
// "serialization" - big-endian encoding of the primitive atoms (bools, ints,
// length-prefixed bytes and strings) everything else is built from.
pub mod serialization;
// "slotted_page" - in-page tuple storage: slot index at the front, cells
// packed from the back.
pub mod slotted_page;
// "page" - fixed-size page layouts: slotted Data/Schema pages, Overflow
// pages, and the root.
pub mod page;
// "pager" - the flat page image: reads, writes, allocation, and whole-image
// dump/load.
pub mod pager;
// "tuple" - self-describing row encoding with per-column type tags.
pub mod tuple;
// "catalog" - table schemas, recovered by re-parsing the CREATE statements
// stored in the schema chain.
pub mod catalog;
// "scan" - lazy page-chain / cell / row iterators.
pub mod scan;
// "algebra" - select, project and product combinators over row sequences.
pub mod algebra;
// "predicate" - evaluates WHERE expression trees against rows.
pub mod predicate;
// "storage" - the facade binding statements to pages: create, insert, select.
pub mod storage;
// "parser" - SQL statements to AST, using the pest parser generator.
pub mod parser;
pub mod ast;
pub mod field_type;
pub mod field_value;
pub mod typed_row;
pub mod formatting;

extern crate pest;
#[macro_use]
extern crate pest_derive;

use ast::Statement;
use storage::{QueryResult, Storage};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] parser::Error),
    #[error(transparent)]
    Storage(#[from] storage::Error),
}

/// What a successfully executed statement produced.
#[derive(Debug, PartialEq, Eq)]
pub enum StatementOutcome {
    /// CREATE TABLE: the table's name.
    Created(String),
    /// INSERT: the table's name.
    Inserted(String),
    /// SELECT: the drained result.
    Rows(QueryResult),
}

/// Parses and runs one SQL statement against `storage`.
pub fn run_statement(storage: &mut Storage, input: &str) -> Result<StatementOutcome, Error> {
    match parser::parse_statement(input)? {
        Statement::Create(stmt) => {
            storage.create_table(&stmt)?;
            Ok(StatementOutcome::Created(stmt.table))
        }
        Statement::Insert(stmt) => {
            storage.insert(&stmt)?;
            Ok(StatementOutcome::Inserted(stmt.table))
        }
        Statement::Select(stmt) => Ok(StatementOutcome::Rows(storage.select(&stmt)?)),
    }
}
