use std::fmt;

use super::column::Column;
use super::placeholder::{normalize, push_token, renumber};
use super::sql_info::SqlInfo;
use super::traits::Conditions;
use super::where_builder::{ConditionBuilder, Scope};
use crate::error::{MapperError, MapperResult};
use crate::value::Value;

/// UPDATE builder.
///
/// SET assignments keep their own placeholder list. On build, all SET values
/// come first and the WHERE placeholders are renumbered to follow them, so
/// `set` and predicate calls can be interleaved freely.
pub struct UpdateBuilder<T> {
    cond: ConditionBuilder<T>,
    table: Option<String>,
    sets: Vec<String>,
    set_values: Vec<Value>,
}

impl<T: 'static> UpdateBuilder<T> {
    pub(crate) fn new(scope: Scope) -> Self {
        let table = scope.table.as_ref().map(|t| t.wrapped_table().to_string());
        Self {
            cond: ConditionBuilder::new(scope),
            table,
            sets: Vec::new(),
            set_values: Vec::new(),
        }
    }

    /// Table used verbatim, replacing the metadata name.
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn table_name(&self) -> Option<&str> {
        self.table.as_deref()
    }

    /// `col = <value>`
    pub fn set(self, col: impl Into<Column<T>>, value: impl Into<Value>) -> Self {
        self.set_if(true, col, value)
    }

    pub fn set_if(mut self, gate: bool, col: impl Into<Column<T>>, value: impl Into<Value>) -> Self {
        if !gate {
            return self;
        }
        if let Some(col) = self.cond.column(&col.into()) {
            let mut assignment = format!("{col} = ");
            push_token(&mut assignment, self.set_values.len());
            self.sets.push(assignment);
            self.set_values.push(value.into());
        }
        self
    }

    /// `col = <expr>` with a raw SQL expression and no bound value.
    pub fn set_raw(self, col: impl Into<Column<T>>, expr: impl Into<String>) -> Self {
        self.set_raw_if(true, col, expr)
    }

    pub fn set_raw_if(mut self, gate: bool, col: impl Into<Column<T>>, expr: impl Into<String>) -> Self {
        if !gate {
            return self;
        }
        if let Some(col) = self.cond.column(&col.into()) {
            self.sets.push(format!("{col} = {}", expr.into()));
        }
        self
    }

    pub fn where_sql(&self) -> String {
        self.cond.where_sql()
    }

    /// `UPDATE t SET ... [WHERE ...]`
    ///
    /// Fails on an empty SET list or a missing table name.
    pub fn build(self) -> MapperResult<SqlInfo> {
        let entity = self.cond.scope().entity();
        let (where_sql, where_values) = self.cond.finish()?;
        let label = entity.unwrap_or("update").to_string();
        let table = self
            .table
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| MapperError::MissingTable(label.clone()))?;
        if self.sets.is_empty() {
            return Err(MapperError::EmptySet(label));
        }

        let mut sql = format!("UPDATE {table} SET {}", self.sets.join(", "));
        let mut values = self.set_values;
        if !where_sql.is_empty() {
            let mut next = values.len();
            sql.push_str(" WHERE ");
            sql.push_str(&renumber(&where_sql, where_values.len(), &mut next));
        }
        values.extend(where_values);

        Ok(SqlInfo::new(entity, normalize(&sql), values))
    }
}

impl<T: 'static> Conditions for UpdateBuilder<T> {
    type Entity = T;

    fn conditions(&mut self) -> &mut ConditionBuilder<T> {
        &mut self.cond
    }
}

impl<T> fmt::Debug for UpdateBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateBuilder")
            .field("table", &self.table)
            .field("sets", &self.sets)
            .field("set_values", &self.set_values)
            .field("conditions", &self.cond)
            .finish()
    }
}
