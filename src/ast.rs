//! Statement and expression types produced by the SQL parser.
//!
//! One tagged enum per hierarchy: `Statement` for the three statement
//! shapes, `Expr` for WHERE trees.  `INSERT` values stay raw literal
//! strings here; they are typed against the table schema at execution time.

use enum_as_inner::EnumAsInner;
use itertools::Itertools;

#[derive(Debug, Clone, PartialEq, EnumAsInner)]
pub enum Statement {
    Create(CreateStatement),
    Insert(InsertStatement),
    Select(SelectStatement),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    /// Type name as written; validated against `FieldType` at CREATE time.
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateStatement {
    pub table: String,
    pub columns: Vec<ColumnDef>,
}

impl std::fmt::Display for CreateStatement {
    /// Renders back to parseable SQL; this is the form stored in the schema
    /// chain.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "create table {}({})",
            self.table,
            self.columns
                .iter()
                .map(|c| format!("{} {}", c.name, c.type_name))
                .join(", ")
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertStatement {
    pub table: String,
    pub columns: Vec<String>,
    /// Raw literal lexemes, parallel to `columns`.
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    pub table: String,
    pub columns: Vec<String>,
    pub has_wildcard: bool,
    pub where_clause: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Infix {
        op: Op,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Literal(Constant),
    Column(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Int(i32),
    Str(String),
    Bool(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Neq,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl std::fmt::Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Op::Eq => write!(f, "="),
            Op::Neq => write!(f, "!="),
            Op::Lt => write!(f, "<"),
            Op::Le => write!(f, "<="),
            Op::Gt => write!(f, ">"),
            Op::Ge => write!(f, ">="),
            Op::And => write!(f, "and"),
            Op::Or => write!(f, "or"),
        }
    }
}
