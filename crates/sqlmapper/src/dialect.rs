//! Database families and the syntax that differs between them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ident::Quote;

/// Target database family.
///
/// Selects identifier quoting, the upsert syntax family, LIKE pattern
/// concatenation, pagination and bind placeholder rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    MySql,
    MariaDb,
    Postgres,
    Oracle,
    SqlServer,
    Sqlite,
    /// Unspecified family: no quoting, MySQL-style upserts.
    Generic,
}

/// Conflict clause family used by upserts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertStyle {
    /// `ON DUPLICATE KEY UPDATE col = VALUES(col)`
    DuplicateKey,
    /// `ON CONFLICT (...) DO UPDATE SET col = EXCLUDED.col`
    OnConflict,
}

/// How a neutral `#{n}` token is rendered for a driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// `?`
    Question,
    /// `$1`, `$2`, ...
    Dollar,
    /// `@p1`, `@p2`, ...
    AtP,
    /// `:1`, `:2`, ...
    Colon,
    /// `?0`, `?1`, ... (zero-based)
    Indexed,
}

impl PlaceholderStyle {
    pub(crate) fn write(self, out: &mut String, index: usize) {
        use std::fmt::Write;
        // Writing into a String cannot fail.
        let _ = match self {
            PlaceholderStyle::Question => write!(out, "?"),
            PlaceholderStyle::Dollar => write!(out, "${}", index + 1),
            PlaceholderStyle::AtP => write!(out, "@p{}", index + 1),
            PlaceholderStyle::Colon => write!(out, ":{}", index + 1),
            PlaceholderStyle::Indexed => write!(out, "?{index}"),
        };
    }
}

impl Dialect {
    /// Resolve a dialect from a driver identifier.
    ///
    /// Accepts both JDBC-style driver class names (`org.postgresql.Driver`)
    /// and short names (`postgres`, `mysql`).
    pub fn from_driver(driver: &str) -> Option<Self> {
        let d = driver.trim().to_ascii_lowercase();
        if d.is_empty() {
            return None;
        }
        let dialect = if d.contains("mariadb") {
            Dialect::MariaDb
        } else if d.contains("mysql") {
            Dialect::MySql
        } else if d.contains("postgres") || d == "pg" {
            Dialect::Postgres
        } else if d.contains("oracle") {
            Dialect::Oracle
        } else if d.contains("sqlserver") || d.contains("mssql") {
            Dialect::SqlServer
        } else if d.contains("sqlite") {
            Dialect::Sqlite
        } else {
            return None;
        };
        Some(dialect)
    }

    /// Resolve a dialect from a connection URL (`postgres://...`, `jdbc:mysql://...`).
    pub fn from_url(url: &str) -> Option<Self> {
        let url = url.trim();
        let url = url.strip_prefix("jdbc:").unwrap_or(url);
        let scheme = url.split(':').next()?;
        Self::from_driver(scheme)
    }

    /// Identifier quote characters, or `None` when the family does not quote.
    pub fn quote(self) -> Option<Quote> {
        match self {
            Dialect::MySql | Dialect::MariaDb => Some(Quote::BACKTICK),
            Dialect::Postgres | Dialect::Oracle => Some(Quote::DOUBLE),
            Dialect::SqlServer | Dialect::Sqlite => Some(Quote::BRACKET),
            Dialect::Generic => None,
        }
    }

    pub fn upsert_style(self) -> UpsertStyle {
        match self {
            Dialect::Postgres | Dialect::Sqlite => UpsertStyle::OnConflict,
            _ => UpsertStyle::DuplicateKey,
        }
    }

    pub fn placeholder_style(self) -> PlaceholderStyle {
        match self {
            Dialect::MySql | Dialect::MariaDb | Dialect::Sqlite => PlaceholderStyle::Question,
            Dialect::Postgres => PlaceholderStyle::Dollar,
            Dialect::SqlServer => PlaceholderStyle::AtP,
            Dialect::Oracle => PlaceholderStyle::Colon,
            Dialect::Generic => PlaceholderStyle::Indexed,
        }
    }

    /// Build a LIKE pattern around `token`, anchored as requested.
    ///
    /// `leading` puts `%` before the value, `trailing` after it.
    pub fn like_pattern(self, token: &str, leading: bool, trailing: bool) -> String {
        match self {
            Dialect::Sqlite | Dialect::Oracle => {
                let mut out = String::new();
                if leading {
                    out.push_str("'%' || ");
                }
                out.push_str(token);
                if trailing {
                    out.push_str(" || '%'");
                }
                out
            }
            _ => {
                let mut parts = Vec::with_capacity(3);
                if leading {
                    parts.push("'%'");
                }
                parts.push(token);
                if trailing {
                    parts.push("'%'");
                }
                format!("CONCAT({})", parts.join(", "))
            }
        }
    }

    /// Render a row window for this family.
    pub fn limit_clause(self, limit: Option<u64>, offset: Option<u64>) -> Option<String> {
        match self {
            Dialect::SqlServer | Dialect::Oracle => {
                if limit.is_none() && offset.is_none() {
                    return None;
                }
                let mut out = format!("OFFSET {} ROWS", offset.unwrap_or(0));
                if let Some(n) = limit {
                    out.push_str(&format!(" FETCH NEXT {n} ROWS ONLY"));
                }
                Some(out)
            }
            _ => match (limit, offset) {
                (None, None) => None,
                (Some(n), None) => Some(format!("LIMIT {n}")),
                (Some(n), Some(m)) => Some(format!("LIMIT {n} OFFSET {m}")),
                (None, Some(m)) => Some(format!("OFFSET {m}")),
            },
        }
    }

    /// SQL Server only accepts `OFFSET ... FETCH` after an ORDER BY.
    pub fn window_needs_order(self) -> bool {
        matches!(self, Dialect::SqlServer)
    }

    /// Statement that takes an exclusive table lock ahead of a batch.
    pub fn lock_table(self, table: &str) -> Option<String> {
        match self {
            Dialect::MySql | Dialect::MariaDb | Dialect::Generic => {
                Some(format!("LOCK TABLES {table} WRITE"))
            }
            Dialect::Postgres => Some(format!("LOCK TABLE {table} IN EXCLUSIVE MODE")),
            _ => None,
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dialect::MySql => "mysql",
            Dialect::MariaDb => "mariadb",
            Dialect::Postgres => "postgres",
            Dialect::Oracle => "oracle",
            Dialect::SqlServer => "sqlserver",
            Dialect::Sqlite => "sqlite",
            Dialect::Generic => "generic",
        };
        f.write_str(name)
    }
}
