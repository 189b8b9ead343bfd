//! SQL parsing: a pest grammar over the three statement shapes plus a Pratt
//! parser for WHERE expressions.
//!
//! The grammar lives in `sql.pest`.  Keywords are case-insensitive; string
//! literals are double-quoted; WHERE operators are `= != < <= > >= and or`
//! with conventional precedence (`or` lowest, comparisons highest).

use lazy_static::lazy_static;
use pest::iterators::{Pair, Pairs};
use pest::pratt_parser::{Assoc, Op as PrattOp, PrattParser};
use pest::Parser;

use crate::ast::{
    ColumnDef, Constant, CreateStatement, Expr, InsertStatement, Op, SelectStatement, Statement,
};

#[derive(Parser)]
#[grammar = "sql.pest"]
pub struct SQLParser;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("syntax error: {0}")]
    Syntax(Box<pest::error::Error<Rule>>),
    #[error("invalid literal: {0}")]
    BadLiteral(String),
}

impl From<pest::error::Error<Rule>> for Error {
    fn from(e: pest::error::Error<Rule>) -> Self {
        Error::Syntax(Box::new(e))
    }
}

lazy_static! {
    static ref PRATT_PARSER: PrattParser<Rule> = PrattParser::new()
        .op(PrattOp::infix(Rule::or_op, Assoc::Left))
        .op(PrattOp::infix(Rule::and_op, Assoc::Left))
        .op(PrattOp::infix(Rule::eq_op, Assoc::Left) | PrattOp::infix(Rule::neq_op, Assoc::Left))
        .op(PrattOp::infix(Rule::lt_op, Assoc::Left)
            | PrattOp::infix(Rule::le_op, Assoc::Left)
            | PrattOp::infix(Rule::gt_op, Assoc::Left)
            | PrattOp::infix(Rule::ge_op, Assoc::Left));
}

/// Parses one SQL statement into its AST.
pub fn parse_statement(input: &str) -> Result<Statement, Error> {
    let stmt = SQLParser::parse(Rule::stmt, input)?.next().unwrap();
    let inner = stmt.into_inner().next().unwrap();
    match inner.as_rule() {
        Rule::create_stmt => Ok(Statement::Create(parse_create(inner))),
        Rule::insert_stmt => Ok(Statement::Insert(parse_insert(inner))),
        Rule::select_stmt => Ok(Statement::Select(parse_select(inner)?)),
        _ => unreachable!(),
    }
}

fn parse_create(pair: Pair<Rule>) -> CreateStatement {
    let mut table = String::new();
    let mut columns = vec![];
    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::table_identifier => table = p.as_str().to_string(),
            Rule::column_defs => {
                for def in p.into_inner() {
                    use itertools::Itertools;
                    let (name, type_name) = def
                        .into_inner()
                        .map(|e| e.as_str().to_string())
                        .collect_tuple()
                        .unwrap();
                    columns.push(ColumnDef { name, type_name });
                }
            }
            _ => unreachable!(),
        }
    }
    CreateStatement { table, columns }
}

fn parse_insert(pair: Pair<Rule>) -> InsertStatement {
    let mut table = String::new();
    let mut columns = vec![];
    let mut values = vec![];
    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::table_identifier => table = p.as_str().to_string(),
            Rule::column_list => {
                columns = p.into_inner().map(|c| c.as_str().to_string()).collect();
            }
            Rule::value_list => {
                values = p.into_inner().map(literal_lexeme).collect();
            }
            _ => unreachable!(),
        }
    }
    InsertStatement {
        table,
        columns,
        values,
    }
}

/// The raw text of a literal: quotes stripped from strings, everything else
/// verbatim.  Typing against the schema happens at execution time.
fn literal_lexeme(pair: Pair<Rule>) -> String {
    let inner = pair.into_inner().next().unwrap();
    match inner.as_rule() {
        Rule::string_literal => inner.into_inner().next().unwrap().as_str().to_string(),
        _ => inner.as_str().to_string(),
    }
}

fn parse_select(pair: Pair<Rule>) -> Result<SelectStatement, Error> {
    let mut stmt = SelectStatement {
        table: String::new(),
        columns: vec![],
        has_wildcard: false,
        where_clause: None,
    };
    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::select_items => {
                let items = p.into_inner().next().unwrap();
                match items.as_rule() {
                    Rule::star => stmt.has_wildcard = true,
                    Rule::column_list => {
                        stmt.columns =
                            items.into_inner().map(|c| c.as_str().to_string()).collect();
                    }
                    _ => unreachable!(),
                }
            }
            Rule::table_identifier => stmt.table = p.as_str().to_string(),
            Rule::where_clause => {
                let expr = p.into_inner().next().unwrap();
                stmt.where_clause = Some(parse_expr(expr.into_inner())?);
            }
            _ => unreachable!(),
        }
    }
    Ok(stmt)
}

/// Folds the flat `operand (op operand)*` parse into an expression tree
/// using the precedence table above.
pub fn parse_expr(pairs: Pairs<Rule>) -> Result<Expr, Error> {
    PRATT_PARSER
        .map_primary(parse_operand)
        .map_infix(|left, op, right| {
            let op = match op.as_rule() {
                Rule::eq_op => Op::Eq,
                Rule::neq_op => Op::Neq,
                Rule::lt_op => Op::Lt,
                Rule::le_op => Op::Le,
                Rule::gt_op => Op::Gt,
                Rule::ge_op => Op::Ge,
                Rule::and_op => Op::And,
                Rule::or_op => Op::Or,
                _ => unreachable!(),
            };
            Ok(Expr::Infix {
                op,
                left: Box::new(left?),
                right: Box::new(right?),
            })
        })
        .parse(pairs)
}

fn parse_operand(pair: Pair<Rule>) -> Result<Expr, Error> {
    let inner = pair.into_inner().next().unwrap();
    match inner.as_rule() {
        Rule::column_name => Ok(Expr::Column(inner.as_str().to_string())),
        Rule::literal => {
            let lit = inner.into_inner().next().unwrap();
            let c = match lit.as_rule() {
                Rule::integer_literal => Constant::Int(
                    lit.as_str()
                        .parse::<i32>()
                        .map_err(|_| Error::BadLiteral(lit.as_str().to_string()))?,
                ),
                Rule::boolean_literal => Constant::Bool(lit.as_str().eq_ignore_ascii_case("true")),
                Rule::string_literal => {
                    Constant::Str(lit.into_inner().next().unwrap().as_str().to_string())
                }
                _ => unreachable!(),
            };
            Ok(Expr::Literal(c))
        }
        _ => unreachable!(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn infix(op: Op, left: Expr, right: Expr) -> Expr {
        Expr::Infix {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    #[test]
    fn test_parse_create_statement() {
        let stmt = parse_statement("create table foobar(abc int, asdf boolean, xxx string)")
            .unwrap()
            .into_create()
            .unwrap();
        assert_eq!(stmt.table, "foobar");
        assert_eq!(
            stmt.columns,
            vec![
                ColumnDef {
                    name: "abc".to_string(),
                    type_name: "int".to_string()
                },
                ColumnDef {
                    name: "asdf".to_string(),
                    type_name: "boolean".to_string()
                },
                ColumnDef {
                    name: "xxx".to_string(),
                    type_name: "string".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_parse_create_statement_case_insensitive_keywords() {
        let stmt = parse_statement("CREATE TABLE t(a int)").unwrap();
        assert_eq!(stmt.as_create().unwrap().table, "t");
    }

    #[test]
    fn test_parse_insert_statement() {
        let stmt = parse_statement(r#"insert into foobar(id, name) values (123, "asdf")"#)
            .unwrap()
            .into_insert()
            .unwrap();
        assert_eq!(stmt.table, "foobar");
        assert_eq!(stmt.columns, vec!["id", "name"]);
        assert_eq!(stmt.values, vec!["123", "asdf"]);
    }

    #[test]
    fn test_parse_insert_statement_bool_and_negative() {
        let stmt = parse_statement("insert into t(a, b) values (true, -7)")
            .unwrap()
            .into_insert()
            .unwrap();
        assert_eq!(stmt.values, vec!["true", "-7"]);
    }

    #[test]
    fn test_parse_select_wildcard() {
        let stmt = parse_statement("select * from foobar")
            .unwrap()
            .into_select()
            .unwrap();
        assert_eq!(stmt.table, "foobar");
        assert!(stmt.has_wildcard);
        assert!(stmt.columns.is_empty());
        assert!(stmt.where_clause.is_none());
    }

    #[test]
    fn test_parse_select_columns() {
        let stmt = parse_statement("select name, id from foobar")
            .unwrap()
            .into_select()
            .unwrap();
        assert!(!stmt.has_wildcard);
        assert_eq!(stmt.columns, vec!["name", "id"]);
    }

    #[test]
    fn test_parse_select_where_comparison() {
        let stmt = parse_statement(r#"select * from t where name = "baz""#)
            .unwrap()
            .into_select()
            .unwrap();
        assert_eq!(
            stmt.where_clause,
            Some(infix(
                Op::Eq,
                Expr::Column("name".to_string()),
                Expr::Literal(Constant::Str("baz".to_string()))
            ))
        );
    }

    #[test]
    fn test_where_and_binds_tighter_than_comparisons_chain() {
        let stmt = parse_statement(r#"select * from t where name = "baz" and age = 20"#)
            .unwrap()
            .into_select()
            .unwrap();
        assert_eq!(
            stmt.where_clause,
            Some(infix(
                Op::And,
                infix(
                    Op::Eq,
                    Expr::Column("name".to_string()),
                    Expr::Literal(Constant::Str("baz".to_string()))
                ),
                infix(
                    Op::Eq,
                    Expr::Column("age".to_string()),
                    Expr::Literal(Constant::Int(20))
                ),
            ))
        );
    }

    #[test]
    fn test_where_or_binds_looser_than_and() {
        let stmt = parse_statement("select * from t where a = 1 or b = 2 and c = 3")
            .unwrap()
            .into_select()
            .unwrap();
        let one = |col: &str, n: i32| {
            infix(
                Op::Eq,
                Expr::Column(col.to_string()),
                Expr::Literal(Constant::Int(n)),
            )
        };
        assert_eq!(
            stmt.where_clause,
            Some(infix(
                Op::Or,
                one("a", 1),
                infix(Op::And, one("b", 2), one("c", 3)),
            ))
        );
    }

    #[test]
    fn test_where_inequality_operators() {
        for (q, op) in [
            ("select * from t where a < 1", Op::Lt),
            ("select * from t where a <= 1", Op::Le),
            ("select * from t where a > 1", Op::Gt),
            ("select * from t where a >= 1", Op::Ge),
            ("select * from t where a != 1", Op::Neq),
        ] {
            let stmt = parse_statement(q).unwrap().into_select().unwrap();
            match stmt.where_clause {
                Some(Expr::Infix { op: got, .. }) => assert_eq!(got, op),
                other => panic!("expected infix expression, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_keywords_rejected_as_identifiers() {
        assert!(parse_statement("select from from where").is_err());
        assert!(parse_statement("select * from").is_err());
    }

    #[test]
    fn test_garbage_is_a_syntax_error() {
        assert!(matches!(
            parse_statement("explain plan for select 1"),
            Err(Error::Syntax(_))
        ));
    }
}
