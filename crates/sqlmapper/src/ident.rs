//! SQL identifier quoting.
//!
//! [`Ident`] splits a (possibly dotted) table or column name into parts so that
//! each part can be wrapped with the quote characters of the target dialect.
//! Parts that already carry quotes (`"x"`, `` `x` `` or `[x]`) are unwrapped
//! first, so re-quoting a quoted name never doubles the quotes.
//!
//! - Unquoted parts are validated against: `[A-Za-z_][A-Za-z0-9_$]*`
//! - Quoted parts allow any characters except NUL
//!
//! # Example
//! ```
//! use sqlmapper::{Ident, Quote};
//!
//! let t = Ident::parse("public.user_info")?;
//! assert_eq!(t.to_sql(Some(Quote::BACKTICK)), "`public`.`user_info`");
//! assert_eq!(t.to_sql(None), "public.user_info");
//! # Ok::<(), sqlmapper::MapperError>(())
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{MapperError, MapperResult};

/// Opening and closing characters used to wrap an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Quote {
    pub open: char,
    pub close: char,
}

impl Quote {
    /// MySQL / MariaDB style.
    pub const BACKTICK: Quote = Quote::symmetric('`');
    /// ANSI style (Postgres, Oracle).
    pub const DOUBLE: Quote = Quote::symmetric('"');
    /// SQL Server / SQLite style.
    pub const BRACKET: Quote = Quote {
        open: '[',
        close: ']',
    };

    /// A quote that uses the same character on both sides.
    pub const fn symmetric(c: char) -> Self {
        Self { open: c, close: c }
    }

    fn closing_for(open: char) -> Option<char> {
        match open {
            '"' => Some('"'),
            '`' => Some('`'),
            '[' => Some(']'),
            _ => None,
        }
    }
}

/// A part of a SQL identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentPart {
    /// Unquoted identifier: must match `[A-Za-z_][A-Za-z0-9_$]*`.
    Unquoted(String),
    /// Part that arrived wrapped in quotes; holds the unwrapped name.
    Quoted(String),
}

impl IdentPart {
    pub fn name(&self) -> &str {
        match self {
            IdentPart::Unquoted(s) | IdentPart::Quoted(s) => s,
        }
    }
}

/// A SQL identifier (column, table, or schema name).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub parts: Vec<IdentPart>,
}

impl Ident {
    /// Parse an identifier string, supporting dotted and quoted forms.
    ///
    /// - Dotted: `schema.table`
    /// - Quoted: `"CamelCase"`, `` `order` ``, `[User Table]`
    /// - Mixed: `public."UserTable"`
    pub fn parse(s: &str) -> MapperResult<Self> {
        if s.trim().is_empty() {
            return Err(MapperError::validation("Identifier cannot be empty"));
        }
        if s.contains('\0') {
            return Err(MapperError::validation(
                "Identifier cannot contain NUL character",
            ));
        }

        let mut parts = Vec::new();
        let mut chars = s.chars().peekable();

        while chars.peek().is_some() {
            if !parts.is_empty() {
                match chars.next() {
                    Some('.') => {
                        if chars.peek().is_none() {
                            return Err(MapperError::validation("Trailing '.' in identifier"));
                        }
                    }
                    Some(c) => {
                        return Err(MapperError::validation(format!(
                            "Expected '.' between identifier parts, got '{c}'"
                        )));
                    }
                    None => break,
                }
            }

            if let Some(close) = chars.peek().copied().and_then(Quote::closing_for) {
                chars.next();
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some(c) if c == close => {
                            // Doubled closing character is an escape.
                            if chars.peek() == Some(&close) {
                                chars.next();
                                name.push(close);
                            } else {
                                break;
                            }
                        }
                        Some(c) => name.push(c),
                        None => {
                            return Err(MapperError::validation("Unclosed quoted identifier"));
                        }
                    }
                }
                if name.is_empty() {
                    return Err(MapperError::validation("Empty quoted identifier"));
                }
                parts.push(IdentPart::Quoted(name));
                continue;
            }

            let mut name = String::new();
            while let Some(&c) = chars.peek() {
                if c == '.' {
                    break;
                }
                let valid = if name.is_empty() {
                    c == '_' || c.is_ascii_alphabetic()
                } else {
                    c == '_' || c == '$' || c.is_ascii_alphanumeric()
                };
                if !valid {
                    return Err(MapperError::validation(format!(
                        "Invalid character in identifier '{s}': '{c}'"
                    )));
                }
                name.push(c);
                chars.next();
            }
            if name.is_empty() {
                return Err(MapperError::validation("Empty identifier segment"));
            }
            parts.push(IdentPart::Unquoted(name));
        }

        Ok(Self { parts })
    }

    /// Render the identifier, wrapping every part with `quote` when given.
    pub fn to_sql(&self, quote: Option<Quote>) -> String {
        let mut out = String::new();
        self.write_sql(&mut out, quote);
        out
    }

    pub(crate) fn write_sql(&self, out: &mut String, quote: Option<Quote>) {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            match quote {
                None => out.push_str(part.name()),
                Some(q) => {
                    out.push(q.open);
                    for ch in part.name().chars() {
                        out.push(ch);
                        if ch == q.close {
                            out.push(ch);
                        }
                    }
                    out.push(q.close);
                }
            }
        }
    }
}

/// Wrap `name` with `quote`, part by part.
///
/// Names that do not parse as identifiers (expressions, names with spaces)
/// are wrapped whole.
pub fn quote_identifier(name: &str, quote: Option<Quote>) -> String {
    match (Ident::parse(name), quote) {
        (Ok(ident), q) => ident.to_sql(q),
        (Err(_), Some(q)) => format!("{}{}{}", q.open, name, q.close),
        (Err(_), None) => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ident_simple() {
        let ident = Ident::parse("users").unwrap();
        assert_eq!(ident.to_sql(None), "users");
        assert_eq!(ident.to_sql(Some(Quote::BACKTICK)), "`users`");
    }

    #[test]
    fn ident_dotted_quotes_each_part() {
        let ident = Ident::parse("public.users").unwrap();
        assert_eq!(ident.to_sql(Some(Quote::DOUBLE)), r#""public"."users""#);
    }

    #[test]
    fn ident_requoting_does_not_double() {
        let ident = Ident::parse("`order`").unwrap();
        assert_eq!(ident.to_sql(Some(Quote::BRACKET)), "[order]");
    }

    #[test]
    fn ident_bracket_with_space() {
        let ident = Ident::parse("[User Table]").unwrap();
        assert_eq!(ident.to_sql(Some(Quote::DOUBLE)), r#""User Table""#);
    }

    #[test]
    fn ident_escapes_closing_quote() {
        let ident = Ident::parse(r#""has""quote""#).unwrap();
        assert_eq!(ident.parts, vec![IdentPart::Quoted(r#"has"quote"#.into())]);
        assert_eq!(ident.to_sql(Some(Quote::DOUBLE)), r#""has""quote""#);
    }

    #[test]
    fn ident_rejects_bad_input() {
        assert!(Ident::parse("").is_err());
        assert!(Ident::parse("1table").is_err());
        assert!(Ident::parse("schema..table").is_err());
        assert!(Ident::parse("schema.").is_err());
        assert!(Ident::parse(r#""unclosed"#).is_err());
    }

    #[test]
    fn quote_identifier_falls_back_to_whole_name() {
        assert_eq!(quote_identifier("my table", Some(Quote::BACKTICK)), "`my table`");
        assert_eq!(quote_identifier("my table", None), "my table");
        assert_eq!(quote_identifier("t.c", Some(Quote::BACKTICK)), "`t`.`c`");
    }
}
