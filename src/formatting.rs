//! formatting renders query results as text tables.

use itertools::Itertools;

use crate::catalog::TableSchema;
use crate::storage::QueryResult;

/// Header row, separator, one line per row, then a row count.
pub fn format_query_result(result: &QueryResult) -> String {
    let mut out = String::new();
    out.push_str(&result.header.iter().join("\t"));
    out.push('\n');
    out.push_str("------------------\n");
    for row in &result.rows {
        out.push_str(&row.iter().join("\t"));
        out.push('\n');
    }
    out.push_str(&format!("{} rows found", result.rows.len()));
    out
}

/// One table's schema as a two-column name/type listing.
pub fn format_table_schema(schema: &TableSchema) -> String {
    let mut out = format!("{}:\n", schema.name);
    out.push_str(&format_query_result(&QueryResult {
        header: vec!["column name".to_string(), "column type".to_string()],
        rows: schema
            .fields
            .iter()
            .map(|(name, t)| vec![name.clone(), t.to_string()])
            .collect(),
    }));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_format_query_result() {
        let r = QueryResult {
            header: vec!["id".to_string(), "name".to_string()],
            rows: vec![
                vec!["123".to_string(), "asdf".to_string()],
                vec!["456".to_string(), "baz".to_string()],
            ],
        };
        assert_eq!(
            format_query_result(&r),
            "id\tname\n------------------\n123\tasdf\n456\tbaz\n2 rows found"
        );
    }

    #[test]
    fn test_format_empty_result() {
        let r = QueryResult {
            header: vec!["id".to_string()],
            rows: vec![],
        };
        assert_eq!(
            format_query_result(&r),
            "id\n------------------\n0 rows found"
        );
    }
}
