//! The executor's row representation: column values keyed by field name,
//! iterating in table-schema order.
//!
//! Rows are built once per tuple by the scan layer and then flow through the
//! algebra combinators by value.  Lookup by name is a linear scan; rows are
//! a handful of columns wide, so a map would cost more than it saves.

use crate::field_value::FieldValue;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Row {
    items: Vec<(String, FieldValue)>,
}

impl Row {
    pub fn new() -> Self {
        Row { items: vec![] }
    }

    pub fn push(&mut self, name: &str, value: FieldValue) {
        self.items.push((name.to_string(), value));
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.items
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.items.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// A new row holding only `fields`, in the order given.  Names the row
    /// does not have are dropped silently.
    pub fn project(&self, fields: &[String]) -> Row {
        let mut out = Row::new();
        for f in fields {
            if let Some(v) = self.get(f) {
                out.push(f, v.clone());
            }
        }
        out
    }

    /// Concatenation of two rows, for the product combinator.
    pub fn merge(&self, other: &Row) -> Row {
        let mut out = self.clone();
        out.items.extend(other.items.iter().cloned());
        out
    }
}
