//! Relational-algebra combinators over lazy row sequences.
//!
//! Each combinator wraps an iterator of `Result<Row, E>` and yields another;
//! errors from the input (or from predicate evaluation) pass straight
//! through, and downstream consumers stop iteration simply by not asking for
//! more rows.

use crate::typed_row::Row;

/// Yields rows for which `predicate` returns true.
pub fn select<I, P, E>(input: I, predicate: P) -> Select<I, P>
where
    I: Iterator<Item = Result<Row, E>>,
    P: FnMut(&Row) -> Result<bool, E>,
{
    Select { input, predicate }
}

pub struct Select<I, P> {
    input: I,
    predicate: P,
}

impl<I, P, E> Iterator for Select<I, P>
where
    I: Iterator<Item = Result<Row, E>>,
    P: FnMut(&Row) -> Result<bool, E>,
{
    type Item = Result<Row, E>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.input.next()? {
                Err(e) => return Some(Err(e)),
                Ok(row) => match (self.predicate)(&row) {
                    Err(e) => return Some(Err(e)),
                    Ok(true) => return Some(Ok(row)),
                    Ok(false) => continue,
                },
            }
        }
    }
}

/// Yields each row narrowed to `fields`, in the order given.  Fields a row
/// does not have are dropped silently.
pub fn project<I, E>(input: I, fields: Vec<String>) -> Project<I>
where
    I: Iterator<Item = Result<Row, E>>,
{
    Project { input, fields }
}

pub struct Project<I> {
    input: I,
    fields: Vec<String>,
}

impl<I, E> Iterator for Project<I>
where
    I: Iterator<Item = Result<Row, E>>,
{
    type Item = Result<Row, E>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.input.next()?.map(|row| row.project(&self.fields)))
    }
}

/// Nested-loop Cartesian product.  Row iterators are single-pass, so the
/// right side is materialized once up front and replayed per left row.
pub fn product<L, R, E>(left: L, right: R) -> Result<Product<L>, E>
where
    L: Iterator<Item = Result<Row, E>>,
    R: Iterator<Item = Result<Row, E>>,
{
    let right: Vec<Row> = right.collect::<Result<_, E>>()?;
    Ok(Product {
        left,
        right,
        current: None,
        right_idx: 0,
    })
}

pub struct Product<L> {
    left: L,
    right: Vec<Row>,
    current: Option<Row>,
    right_idx: usize,
}

impl<L, E> Iterator for Product<L>
where
    L: Iterator<Item = Result<Row, E>>,
{
    type Item = Result<Row, E>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.right.is_empty() {
            return None;
        }
        loop {
            if let Some(outer) = &self.current {
                if self.right_idx < self.right.len() {
                    let merged = outer.merge(&self.right[self.right_idx]);
                    self.right_idx += 1;
                    return Some(Ok(merged));
                }
                self.current = None;
            }
            match self.left.next()? {
                Err(e) => return Some(Err(e)),
                Ok(row) => {
                    self.current = Some(row);
                    self.right_idx = 0;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field_value::FieldValue::*;
    use pretty_assertions::assert_eq;

    fn row(pairs: &[(&str, i32)]) -> Row {
        let mut r = Row::new();
        for (name, v) in pairs {
            r.push(name, Int(*v));
        }
        r
    }

    fn rows(input: Vec<Row>) -> impl Iterator<Item = Result<Row, String>> {
        input.into_iter().map(Ok)
    }

    #[test]
    fn test_select_filters() {
        let input = rows(vec![
            row(&[("a", 1)]),
            row(&[("a", 2)]),
            row(&[("a", 3)]),
        ]);
        let got: Vec<Row> = select(input, |r| Ok(matches!(r.get("a"), Some(Int(v)) if v % 2 == 1)))
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(got, vec![row(&[("a", 1)]), row(&[("a", 3)])]);
    }

    #[test]
    fn test_select_propagates_predicate_error() {
        let input = rows(vec![row(&[("a", 1)])]);
        let mut it = select(input, |_| Err("boom".to_string()));
        assert_eq!(it.next(), Some(Err("boom".to_string())));
    }

    #[test]
    fn test_project_subsets_and_orders() {
        let input = rows(vec![row(&[("a", 1), ("b", 2)])]);
        let got: Vec<Row> = project(input, vec!["b".to_string(), "a".to_string()])
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(got, vec![row(&[("b", 2), ("a", 1)])]);
    }

    #[test]
    fn test_product_pairs_every_row() {
        let left = rows(vec![row(&[("l", 1)]), row(&[("l", 2)])]);
        let right = rows(vec![row(&[("r", 10)]), row(&[("r", 20)])]);
        let got: Vec<Row> = product(left, right)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(
            got,
            vec![
                row(&[("l", 1), ("r", 10)]),
                row(&[("l", 1), ("r", 20)]),
                row(&[("l", 2), ("r", 10)]),
                row(&[("l", 2), ("r", 20)]),
            ]
        );
    }

    #[test]
    fn test_product_with_empty_side() {
        let left = rows(vec![row(&[("l", 1)])]);
        let right = rows(vec![]);
        let mut it = product(left, right).unwrap();
        assert_eq!(it.next(), None);
    }

    #[test]
    fn test_combinators_stack() {
        let input = rows(vec![
            row(&[("a", 1), ("b", 10)]),
            row(&[("a", 2), ("b", 20)]),
        ]);
        let filtered = select(input, |r| Ok(matches!(r.get("a"), Some(Int(2)))));
        let projected = project(filtered, vec!["b".to_string()]);
        let got: Vec<Row> = projected.collect::<Result<_, _>>().unwrap();
        assert_eq!(got, vec![row(&[("b", 20)])]);
    }
}
