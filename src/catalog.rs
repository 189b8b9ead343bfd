//! The catalog: every table's schema, derived on demand from the schema
//! page chain.
//!
//! Nothing here is persisted separately.  Each schema entry stores the
//! verbatim `CREATE TABLE` text, which is re-parsed when the catalog is
//! loaded and the parsed result cached for the life of the catalog, so a
//! query re-parses each schema at most once however many rows it touches.

use std::str::FromStr;

use crate::field_type::FieldType;
use crate::page::{PageId, PageType};
use crate::pager::Pager;
use crate::parser;
use crate::scan::CellIter;
use crate::serialization;
use crate::tuple::{SchemaTuple, Tuple};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Scan(#[from] crate::scan::Error),
    #[error(transparent)]
    Codec(#[from] serialization::Error),
    #[error("stored schema for {table} failed to parse: {source}")]
    SchemaSql {
        table: String,
        source: parser::Error,
    },
    #[error("corrupt schema entry: {0}")]
    CorruptEntry(String),
}

/// One table's schema, with columns in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub name: String,
    pub starting_page: PageId,
    pub fields: Vec<(String, FieldType)>,
}

impl TableSchema {
    pub fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn field_type(&self, name: &str) -> Option<FieldType> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| *t)
    }
}

pub struct Catalog {
    entries: Vec<SchemaTuple>,
    tables: Vec<TableSchema>,
}

impl Catalog {
    /// Reads every schema entry from the schema chain and parses the stored
    /// CREATE statements.
    pub fn load(pager: &Pager) -> Result<Self, Error> {
        let mut entries = vec![];
        let mut tables = vec![];
        let start = pager.root().schema_page_start;
        for cell in CellIter::new(pager, PageType::Schema, start) {
            let entry = SchemaTuple::from_tuple(&Tuple::decode(&cell?)?)?;
            tables.push(table_schema_from_entry(&entry)?);
            entries.push(entry);
        }
        Ok(Catalog { entries, tables })
    }

    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.iter().find(|t| t.name == name)
    }

    pub fn tables(&self) -> &[TableSchema] {
        &self.tables
    }

    /// Where the `(page_type, name)` chain starts, if the catalog knows it.
    pub fn starting_page_for(&self, page_type: PageType, name: &str) -> Option<PageId> {
        self.entries
            .iter()
            .find(|e| e.page_type == page_type && e.name == name)
            .map(|e| e.starting_page)
    }
}

fn table_schema_from_entry(entry: &SchemaTuple) -> Result<TableSchema, Error> {
    let stmt = parser::parse_statement(&entry.create_sql).map_err(|e| Error::SchemaSql {
        table: entry.name.clone(),
        source: e,
    })?;
    let create = match stmt {
        crate::ast::Statement::Create(c) => c,
        _ => {
            return Err(Error::CorruptEntry(format!(
                "schema entry for {} does not hold a CREATE statement",
                entry.name
            )))
        }
    };
    let mut fields = vec![];
    for col in &create.columns {
        let field_type = FieldType::from_str(&col.type_name).map_err(|_| {
            Error::CorruptEntry(format!(
                "schema entry for {} declares unknown type {}",
                entry.name, col.type_name
            ))
        })?;
        fields.push((col.name.clone(), field_type));
    }
    Ok(TableSchema {
        name: entry.name.clone(),
        starting_page: entry.starting_page,
        fields,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{Page, TablePage};
    use pretty_assertions::assert_eq;

    fn pager_with_schema(entries: &[SchemaTuple]) -> Pager {
        let mut pager = Pager::new();
        let mut page = TablePage::new(PageType::Schema);
        for e in entries {
            page.add(&e.to_tuple().encode()).unwrap();
        }
        let id = pager.append_page(&Page::Table(page));
        pager.set_schema_page_start(id);
        pager
    }

    fn entry(name: &str, starting_page: PageId, create_sql: &str) -> SchemaTuple {
        SchemaTuple {
            page_type: PageType::Data,
            starting_page,
            name: name.to_string(),
            create_sql: create_sql.to_string(),
        }
    }

    #[test]
    fn test_empty_catalog() {
        let catalog = Catalog::load(&Pager::new()).unwrap();
        assert!(catalog.tables().is_empty());
        assert_eq!(catalog.table("foobar"), None);
    }

    #[test]
    fn test_load_parses_stored_create_sql() {
        let pager = pager_with_schema(&[entry(
            "foobar",
            2,
            "create table foobar(id int, name string, alive boolean)",
        )]);
        let catalog = Catalog::load(&pager).unwrap();
        let t = catalog.table("foobar").unwrap();
        assert_eq!(t.starting_page, 2);
        assert_eq!(
            t.fields,
            vec![
                ("id".to_string(), FieldType::Int),
                ("name".to_string(), FieldType::String),
                ("alive".to_string(), FieldType::Boolean),
            ]
        );
        assert_eq!(t.field_type("name"), Some(FieldType::String));
        assert_eq!(t.field_type("nope"), None);
    }

    #[test]
    fn test_starting_page_for() {
        let pager = pager_with_schema(&[
            entry("a", 2, "create table a(x int)"),
            entry("b", 5, "create table b(y int)"),
        ]);
        let catalog = Catalog::load(&pager).unwrap();
        assert_eq!(catalog.starting_page_for(PageType::Data, "b"), Some(5));
        assert_eq!(catalog.starting_page_for(PageType::Data, "c"), None);
        assert_eq!(catalog.starting_page_for(PageType::Schema, "a"), None);
    }

    #[test]
    fn test_unparseable_schema_entry_is_an_error() {
        let pager = pager_with_schema(&[entry("bad", 2, "definitely not sql")]);
        assert!(matches!(
            Catalog::load(&pager),
            Err(Error::SchemaSql { .. })
        ));
    }
}
