//! Shared WHERE accumulator for query, update and delete statements.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use super::column::{Column, resolve_column};
use super::placeholder::{push_token, renumber};
use super::select::QueryBuilder;
use super::sql_info::SqlInfo;
use crate::dialect::Dialect;
use crate::error::{MapperError, MapperResult};
use crate::meta::{Entity, Registry, SqlCondition, TableInfo};
use crate::value::Value;

/// Registry and (optional) table metadata a builder resolves columns against.
#[derive(Clone)]
pub(crate) struct Scope {
    pub(crate) registry: Arc<Registry>,
    pub(crate) table: Option<Arc<TableInfo>>,
}

impl Scope {
    pub(crate) fn untyped(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            table: None,
        }
    }

    pub(crate) fn of<T: Entity>(registry: Arc<Registry>) -> Self {
        let table = registry.resolve::<T>();
        Self {
            registry,
            table: Some(table),
        }
    }

    pub(crate) fn dialect(&self) -> Dialect {
        self.registry.dialect()
    }

    pub(crate) fn entity(&self) -> Option<&'static str> {
        self.table.as_ref().map(|t| t.entity())
    }

    pub(crate) fn resolve<T>(&self, column: &Column<T>) -> MapperResult<String> {
        resolve_column(column, self.table.as_deref(), self.registry.config().quote())
    }
}

/// Connector for the next predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Junction {
    #[default]
    And,
    Or,
}

impl Junction {
    fn as_sql(self) -> &'static str {
        match self {
            Junction::And => " AND ",
            Junction::Or => " OR ",
        }
    }
}

/// Factory handed to subquery callbacks.
pub struct SubQuery {
    registry: Arc<Registry>,
}

impl SubQuery {
    /// A query over entity `M`.
    pub fn of<M: Entity>(&self) -> QueryBuilder<M> {
        QueryBuilder::new(Scope::of::<M>(self.registry.clone()))
    }

    /// A query over a table without metadata. The name is used verbatim.
    pub fn table(&self, name: impl Into<String>) -> QueryBuilder<()> {
        QueryBuilder::new(Scope::untyped(self.registry.clone())).table(name)
    }
}

/// Accumulates predicates and their bound values.
///
/// Every predicate is written with a leading junction (`AND` unless
/// [`or`](super::Conditions::or) was called) and allocates its placeholders
/// from a counter that only moves forward. [`where_sql`](Self::where_sql)
/// strips the first junction.
pub struct ConditionBuilder<T> {
    scope: Scope,
    sql: String,
    values: Vec<Value>,
    next_index: usize,
    junction: Junction,
    error: Option<MapperError>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: 'static> ConditionBuilder<T> {
    pub(crate) fn new(scope: Scope) -> Self {
        Self::starting_at(scope, 0)
    }

    /// A fresh builder whose first placeholder is `#{index}`.
    pub(crate) fn starting_at(scope: Scope, index: usize) -> Self {
        Self {
            scope,
            sql: String::new(),
            values: Vec::new(),
            next_index: index,
            junction: Junction::And,
            error: None,
            _marker: PhantomData,
        }
    }

    /// Index the next placeholder will get.
    pub fn next_index(&self) -> usize {
        self.next_index
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// First error recorded by a predicate, if any.
    pub fn error(&self) -> Option<&MapperError> {
        self.error.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.sql.trim().is_empty()
    }

    /// Accumulated conditions without the leading junction, or `""`.
    pub fn where_sql(&self) -> String {
        let sql = self.sql.trim();
        let sql = strip_prefix_ignore_case(sql, "AND ")
            .or_else(|| strip_prefix_ignore_case(sql, "OR "))
            .unwrap_or(sql);
        sql.trim_start().to_string()
    }

    /// Finish with the condition text and its values.
    pub fn build(self) -> MapperResult<SqlInfo> {
        let entity = self.scope.entity();
        let (sql, values) = self.finish()?;
        Ok(SqlInfo::new(entity, sql, values))
    }

    pub(crate) fn finish(self) -> MapperResult<(String, Vec<Value>)> {
        if let Some(err) = self.error {
            return Err(err);
        }
        let sql = self.where_sql();
        Ok((sql, self.values))
    }

    pub(crate) fn scope(&self) -> &Scope {
        &self.scope
    }

    pub(crate) fn record(&mut self, err: MapperError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    /// Resolve a column, recording the error on failure.
    pub(crate) fn column(&mut self, column: &Column<T>) -> Option<String> {
        match self.scope.resolve(column) {
            Ok(c) => Some(c),
            Err(e) => {
                self.record(e);
                None
            }
        }
    }

    fn alloc(&mut self, value: Value) -> String {
        let mut token = String::new();
        push_token(&mut token, self.next_index);
        self.next_index += 1;
        self.values.push(value);
        token
    }

    fn push(&mut self, fragment: &str) {
        self.sql.push_str(self.junction.as_sql());
        self.sql.push_str(fragment);
        self.junction = Junction::And;
    }

    /// Splice a built subquery, renumbering its placeholders after ours.
    fn splice(&mut self, sub: MapperResult<SqlInfo>) -> Option<String> {
        match sub {
            Ok(info) => {
                let (sql, values) = info.into_parts();
                let sql = renumber(&sql, values.len(), &mut self.next_index);
                self.values.extend(values);
                Some(sql)
            }
            Err(e) => {
                self.record(e);
                None
            }
        }
    }

    // ==================== Predicates ====================

    pub(crate) fn set_junction(&mut self, gate: bool, junction: Junction) {
        if gate {
            self.junction = junction;
        }
    }

    pub(crate) fn push_compare(&mut self, gate: bool, column: Column<T>, op: &str, value: Value) {
        if !gate {
            return;
        }
        if let Some(col) = self.column(&column) {
            self.emit_compare(&col, op, value);
        }
    }

    fn emit_compare(&mut self, col: &str, op: &str, value: Value) {
        let token = self.alloc(value);
        self.push(&format!("{col} {op} {token}"));
    }

    pub(crate) fn push_like(
        &mut self,
        gate: bool,
        column: Column<T>,
        negate: bool,
        leading: bool,
        trailing: bool,
        value: Value,
    ) {
        if !gate {
            return;
        }
        if let Some(col) = self.column(&column) {
            self.emit_like(&col, negate, leading, trailing, value);
        }
    }

    fn emit_like(&mut self, col: &str, negate: bool, leading: bool, trailing: bool, value: Value) {
        let token = self.alloc(value);
        let pattern = self.scope.dialect().like_pattern(&token, leading, trailing);
        let op = if negate { "NOT LIKE" } else { "LIKE" };
        self.push(&format!("{col} {op} {pattern}"));
    }

    pub(crate) fn push_in(&mut self, gate: bool, column: Column<T>, negate: bool, values: Vec<Value>) {
        if !gate {
            return;
        }
        let Some(col) = self.column(&column) else {
            return;
        };
        if values.is_empty() {
            // IN () is not valid SQL.
            self.push(if negate { "1=1" } else { "1=0" });
            return;
        }
        let tokens: Vec<String> = values.into_iter().map(|v| self.alloc(v)).collect();
        let op = if negate { "NOT IN" } else { "IN" };
        self.push(&format!("{col} {op} ({})", tokens.join(", ")));
    }

    pub(crate) fn push_in_query<M: 'static>(
        &mut self,
        gate: bool,
        column: Column<T>,
        negate: bool,
        f: impl FnOnce(SubQuery) -> QueryBuilder<M>,
    ) {
        if !gate {
            return;
        }
        let Some(col) = self.column(&column) else {
            return;
        };
        let sub = f(self.sub_query()).build();
        if let Some(sql) = self.splice(sub) {
            let op = if negate { "NOT IN" } else { "IN" };
            self.push(&format!("{col} {op} ({sql})"));
        }
    }

    pub(crate) fn push_exists<M: 'static>(
        &mut self,
        gate: bool,
        negate: bool,
        f: impl FnOnce(SubQuery) -> QueryBuilder<M>,
    ) {
        if !gate {
            return;
        }
        let sub = f(self.sub_query()).build();
        if let Some(sql) = self.splice(sub) {
            let op = if negate { "NOT EXISTS" } else { "EXISTS" };
            self.push(&format!("{op} ({sql})"));
        }
    }

    pub(crate) fn push_null(&mut self, gate: bool, columns: Vec<Column<T>>, negate: bool) {
        if !gate {
            return;
        }
        let op = if negate { "IS NOT NULL" } else { "IS NULL" };
        for column in columns {
            if let Some(col) = self.column(&column) {
                self.push(&format!("{col} {op}"));
            }
        }
    }

    pub(crate) fn push_between(
        &mut self,
        gate: bool,
        column: Column<T>,
        negate: bool,
        start: Value,
        end: Value,
    ) {
        if !gate {
            return;
        }
        let Some(col) = self.column(&column) else {
            return;
        };
        let start = self.alloc(start);
        let end = self.alloc(end);
        let op = if negate { "NOT BETWEEN" } else { "BETWEEN" };
        self.push(&format!("{col} {op} {start} AND {end}"));
    }

    /// Run `f` on a fresh builder that continues our numbering and splice
    /// its output as `<junction> (...)`.
    pub(crate) fn push_nested(
        &mut self,
        gate: bool,
        junction: Junction,
        f: impl FnOnce(ConditionBuilder<T>) -> ConditionBuilder<T>,
    ) {
        if !gate {
            return;
        }
        let child = f(ConditionBuilder::starting_at(
            self.scope.clone(),
            self.next_index,
        ));
        if let Some(err) = child.error {
            self.record(err);
            return;
        }
        let body = child.where_sql();
        if body.is_empty() {
            return;
        }
        self.sql.push_str(junction.as_sql());
        self.sql.push('(');
        self.sql.push_str(&body);
        self.sql.push(')');
        self.values.extend(child.values);
        self.next_index = child.next_index;
        self.junction = Junction::And;
    }

    fn sub_query(&self) -> SubQuery {
        SubQuery {
            registry: self.scope.registry.clone(),
        }
    }
}

impl<T: Entity> ConditionBuilder<T> {
    /// Emit one predicate per column of `entity` whose where-policy admits
    /// its current value, using the column's declared operator.
    pub(crate) fn seed(&mut self, entity: &T) {
        let Some(table) = self.scope.table.clone() else {
            return;
        };
        for col in table.columns() {
            let value = entity.get_field(&col.field);
            if !col.where_strategy.admits(&value) {
                continue;
            }
            let c = col.wrapped.as_str();
            match col.condition {
                SqlCondition::Eq => self.emit_compare(c, "=", value),
                SqlCondition::Ne => self.emit_compare(c, "!=", value),
                SqlCondition::Gt => self.emit_compare(c, ">", value),
                SqlCondition::Ge => self.emit_compare(c, ">=", value),
                SqlCondition::Lt => self.emit_compare(c, "<", value),
                SqlCondition::Le => self.emit_compare(c, "<=", value),
                SqlCondition::Like => self.emit_like(c, false, true, true, value),
                SqlCondition::NotLike => self.emit_like(c, true, true, true, value),
                SqlCondition::LikeLeft => self.emit_like(c, false, true, false, value),
                SqlCondition::LikeRight => self.emit_like(c, false, false, true, value),
            }
        }
    }
}

impl<T> Clone for ConditionBuilder<T> {
    fn clone(&self) -> Self {
        Self {
            scope: self.scope.clone(),
            sql: self.sql.clone(),
            values: self.values.clone(),
            next_index: self.next_index,
            junction: self.junction,
            error: self.error.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for ConditionBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConditionBuilder")
            .field("sql", &self.sql)
            .field("values", &self.values)
            .field("next_index", &self.next_index)
            .field("junction", &self.junction)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &s[prefix.len()..])
}
