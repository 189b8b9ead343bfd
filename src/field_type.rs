//! Defines an enum of the column types a table schema can declare and
//! routines for conversion to and from string.

use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// The column types accepted in a `CREATE TABLE` column list.
/// `Float` is declared for forward compatibility but has no encoding path;
/// table creation rejects it.
pub enum FieldType {
    Int,
    String,
    Boolean,
    Float,
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldType::Int => write!(f, "int"),
            FieldType::String => write!(f, "string"),
            FieldType::Boolean => write!(f, "boolean"),
            FieldType::Float => write!(f, "float"),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ParseFieldTypeError;

impl FromStr for FieldType {
    type Err = ParseFieldTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "int" => Ok(FieldType::Int),
            "string" => Ok(FieldType::String),
            "boolean" => Ok(FieldType::Boolean),
            "float" => Ok(FieldType::Float),
            _ => Err(ParseFieldTypeError),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str() {
        assert_eq!("int".parse(), Ok(FieldType::Int));
        assert_eq!("STRING".parse(), Ok(FieldType::String));
        assert_eq!("boolean".parse(), Ok(FieldType::Boolean));
        assert_eq!("float".parse(), Ok(FieldType::Float));
        assert_eq!("blob".parse::<FieldType>(), Err(ParseFieldTypeError));
    }
}
