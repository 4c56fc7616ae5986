use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use super::placeholder;
use crate::dialect::{Dialect, PlaceholderStyle};
use crate::value::Value;

/// Generated SQL text plus its bound values.
///
/// The text uses `#{n}` placeholders, zero-based, appearing left to right in
/// the same order as `values`. Use [`render`](Self::render) to convert to a
/// driver's placeholder syntax.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SqlInfo {
    entity: Option<&'static str>,
    sql: String,
    values: Vec<Value>,
}

fn where_pattern() -> &'static Regex {
    static WHERE: OnceLock<Regex> = OnceLock::new();
    WHERE.get_or_init(|| Regex::new(r"(?is)\s+WHERE\s+(?P<where>.*)").expect("valid WHERE regex"))
}

impl SqlInfo {
    pub(crate) fn new(entity: Option<&'static str>, sql: String, values: Vec<Value>) -> Self {
        Self { entity, sql, values }
    }

    /// Simple type name of the entity the statement was built for.
    pub fn entity(&self) -> Option<&'static str> {
        self.entity
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.sql, self.values)
    }

    pub fn is_empty(&self) -> bool {
        self.sql.trim().is_empty()
    }

    /// Everything after the first `WHERE` keyword, or `""`.
    pub fn condition(&self) -> String {
        if self.is_empty() {
            return String::new();
        }
        let sql = placeholder::normalize(&self.sql);
        where_pattern()
            .captures(&sql)
            .and_then(|c| c.name("where"))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default()
    }

    /// Text with placeholders in the given style.
    pub fn render(&self, style: PlaceholderStyle) -> String {
        placeholder::render(&self.sql, style)
    }

    /// Text with placeholders for `dialect`'s drivers.
    pub fn render_for(&self, dialect: Dialect) -> String {
        self.render(dialect.placeholder_style())
    }

    /// Join independent statements into one script.
    ///
    /// Every statement's placeholders are renumbered to continue after the
    /// previous one, keeping the combined values aligned.
    pub fn join(statements: Vec<SqlInfo>, separator: &str) -> SqlInfo {
        let entity = statements.first().and_then(|s| s.entity);
        let mut sql = String::new();
        let mut values = Vec::new();
        let mut next = 0;
        for (i, stmt) in statements.into_iter().enumerate() {
            if i > 0 {
                sql.push_str(separator);
            }
            sql.push_str(&placeholder::renumber(&stmt.sql, stmt.values.len(), &mut next));
            values.extend(stmt.values);
        }
        SqlInfo::new(entity, sql, values)
    }

    /// Prefix a statement without placeholders.
    pub(crate) fn prepend(mut self, prefix: &str) -> SqlInfo {
        self.sql = format!("{prefix}{}", self.sql);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn condition_strips_through_where() {
        let info = SqlInfo::new(
            None,
            "SELECT *\n FROM t\n where a = #{0}".into(),
            vec![Value::from(1)],
        );
        assert_eq!(info.condition(), "a = #{0}");
        let info = SqlInfo::new(None, "SELECT * FROM t".into(), vec![]);
        assert_eq!(info.condition(), "");
    }

    #[test]
    fn join_renumbers_each_statement() {
        let a = SqlInfo::new(None, "INSERT INTO t (a) VALUES (#{0})".into(), vec![1.into()]);
        let b = SqlInfo::new(None, "INSERT INTO t (a) VALUES (#{0})".into(), vec![2.into()]);
        let joined = SqlInfo::join(vec![a, b], "; ");
        assert_eq!(
            joined.sql(),
            "INSERT INTO t (a) VALUES (#{0}); INSERT INTO t (a) VALUES (#{1})"
        );
        assert_eq!(joined.values(), &[Value::Int(1), Value::Int(2)]);
    }

    #[test]
    fn render_for_dialect() {
        let info = SqlInfo::new(None, "a = #{0}".into(), vec![1.into()]);
        assert_eq!(info.render_for(Dialect::Postgres), "a = $1");
        assert_eq!(info.render_for(Dialect::MySql), "a = ?");
    }
}
