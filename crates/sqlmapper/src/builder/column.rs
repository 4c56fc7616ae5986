//! Column tokens and their resolution to SQL text.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{MapperError, MapperResult};
use crate::ident::{Quote, quote_identifier};
use crate::meta::{Field, TableInfo};

/// A column reference: either raw text or a typed field of `T`.
pub enum Column<T> {
    Raw(String),
    Field(Field<T>),
}

impl<T> Column<T> {
    /// The token as written, before resolution.
    pub fn token(&self) -> &str {
        match self {
            Column::Raw(s) => s,
            Column::Field(f) => f.name(),
        }
    }
}

impl<T> Clone for Column<T> {
    fn clone(&self) -> Self {
        match self {
            Column::Raw(s) => Column::Raw(s.clone()),
            Column::Field(f) => Column::Field(*f),
        }
    }
}

impl<T> fmt::Debug for Column<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Column::Raw(s) => f.debug_tuple("Raw").field(s).finish(),
            Column::Field(field) => f.debug_tuple("Field").field(&field.name()).finish(),
        }
    }
}

impl<T> From<&str> for Column<T> {
    fn from(s: &str) -> Self {
        Column::Raw(s.to_string())
    }
}

impl<T> From<String> for Column<T> {
    fn from(s: String) -> Self {
        Column::Raw(s)
    }
}

impl<T> From<&String> for Column<T> {
    fn from(s: &String) -> Self {
        Column::Raw(s.clone())
    }
}

impl<T> From<Field<T>> for Column<T> {
    fn from(f: Field<T>) -> Self {
        Column::Field(f)
    }
}

fn function_call() -> &'static Regex {
    static FUNCTION_CALL: OnceLock<Regex> = OnceLock::new();
    FUNCTION_CALL.get_or_init(|| {
        Regex::new(r"(?s)^[a-zA-Z_]+\s*\((.*)\)$").expect("valid function call regex")
    })
}

/// Turn a column token into SQL text.
///
/// - Raw tokens shaped like a function call (`COUNT(*)`) pass through as is.
/// - With metadata, the token must name a field or column of the table.
/// - Without metadata, the token is quoted for the dialect.
///
/// Blank or unknown tokens are errors.
pub(crate) fn resolve_column<T>(
    column: &Column<T>,
    table: Option<&TableInfo>,
    quote: Option<Quote>,
) -> MapperResult<String> {
    let token = column.token().trim();
    if token.is_empty() {
        return Err(MapperError::unknown_column(column.token()));
    }
    if matches!(column, Column::Raw(_)) && function_call().is_match(token) {
        return Ok(token.to_string());
    }
    match table {
        Some(table) => table
            .lookup(token)
            .map(|c| c.wrapped.clone())
            .ok_or_else(|| MapperError::unknown_column(format!("{}.{}", table.entity(), token))),
        None => Ok(quote_identifier(token, quote)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapperConfig;
    use crate::meta::{FieldDef, TableDef};

    struct Person;

    fn table() -> TableInfo {
        TableInfo::resolve(
            TableDef::of::<Person>()
                .field(FieldDef::new("id"))
                .field(FieldDef::text("firstName")),
            &MapperConfig::new(),
        )
    }

    #[test]
    fn function_calls_pass_through() {
        let col: Column<Person> = "COUNT(*)".into();
        assert_eq!(resolve_column(&col, Some(&table()), None).unwrap(), "COUNT(*)");
        let col: Column<Person> = "date_format (created, '%Y')".into();
        assert!(resolve_column(&col, None, Some(Quote::BACKTICK)).is_ok());
    }

    #[test]
    fn metadata_lookup_by_field_and_column() {
        let t = table();
        let by_field: Column<Person> = "firstName".into();
        let by_column: Column<Person> = "first_name".into();
        let typed: Column<Person> = Field::new("firstName").into();
        assert_eq!(resolve_column(&by_field, Some(&t), None).unwrap(), "`first_name`");
        assert_eq!(resolve_column(&by_column, Some(&t), None).unwrap(), "`first_name`");
        assert_eq!(resolve_column(&typed, Some(&t), None).unwrap(), "`first_name`");
    }

    #[test]
    fn untyped_tokens_are_auto_wrapped() {
        let col: Column<()> = "age".into();
        assert_eq!(resolve_column(&col, None, Some(Quote::DOUBLE)).unwrap(), r#""age""#);
        assert_eq!(resolve_column(&col, None, None).unwrap(), "age");
    }

    #[test]
    fn blank_and_unknown_tokens_fail() {
        let blank: Column<Person> = "  ".into();
        assert!(resolve_column(&blank, None, None).unwrap_err().is_unknown_column());
        let unknown: Column<Person> = Field::new("nope").into();
        assert!(
            resolve_column(&unknown, Some(&table()), None)
                .unwrap_err()
                .is_unknown_column()
        );
    }
}
