use std::fmt;

use super::column::Column;
use super::placeholder::{normalize, renumber};
use super::sql_info::SqlInfo;
use super::traits::Conditions;
use super::where_builder::{ConditionBuilder, Scope};
use crate::error::{MapperError, MapperResult};
use crate::value::Value;

/// One ORDER BY item with its column already resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub asc: bool,
}

impl OrderBy {
    pub(crate) fn to_sql(&self) -> String {
        format!("{} {}", self.column, if self.asc { "ASC" } else { "DESC" })
    }
}

/// SELECT builder.
///
/// Adds the column list, GROUP BY, HAVING, ORDER BY, a row window and a raw
/// trailing suffix on top of the shared predicates in [`Conditions`].
///
/// ```ignore
/// let info = registry
///     .query::<User>()
///     .eq("status", "active")
///     .or_nested(|c| c.gt("age", 18).lt("age", 65))
///     .order_by_desc(["createdAt"])
///     .build()?;
/// ```
pub struct QueryBuilder<T> {
    cond: ConditionBuilder<T>,
    table: Option<String>,
    select: Option<String>,
    distinct: bool,
    group_by: Vec<String>,
    having: Option<(String, Vec<Value>)>,
    order_by: Vec<OrderBy>,
    limit: Option<u64>,
    offset: Option<u64>,
    last: Option<String>,
}

impl<T: 'static> QueryBuilder<T> {
    pub(crate) fn new(scope: Scope) -> Self {
        let table = scope.table.as_ref().map(|t| t.wrapped_table().to_string());
        Self {
            cond: ConditionBuilder::new(scope),
            table,
            select: None,
            distinct: false,
            group_by: Vec::new(),
            having: None,
            order_by: Vec::new(),
            limit: None,
            offset: None,
            last: None,
        }
    }

    /// Table (or any FROM item) used verbatim, replacing the metadata name.
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn table_name(&self) -> Option<&str> {
        self.table.as_deref()
    }

    /// Replace the select list.
    pub fn select<C: Into<Column<T>>>(self, cols: impl IntoIterator<Item = C>) -> Self {
        self.select_if(true, cols)
    }

    pub fn select_if<C: Into<Column<T>>>(
        mut self,
        gate: bool,
        cols: impl IntoIterator<Item = C>,
    ) -> Self {
        if gate {
            let cols = self.resolve_all(cols);
            if !cols.is_empty() {
                self.select = Some(cols.join(", "));
            }
        }
        self
    }

    /// `SELECT DISTINCT ...`
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Replace the GROUP BY list.
    pub fn group_by<C: Into<Column<T>>>(self, cols: impl IntoIterator<Item = C>) -> Self {
        self.group_by_if(true, cols)
    }

    pub fn group_by_if<C: Into<Column<T>>>(
        mut self,
        gate: bool,
        cols: impl IntoIterator<Item = C>,
    ) -> Self {
        if gate {
            let cols = self.resolve_all(cols);
            if !cols.is_empty() {
                self.group_by = cols;
            }
        }
        self
    }

    /// Replace the HAVING clause with the conditions built by `f`.
    ///
    /// HAVING placeholders are numbered after every WHERE placeholder when
    /// the statement is built, whatever the call order.
    pub fn having(self, f: impl FnOnce(ConditionBuilder<T>) -> ConditionBuilder<T>) -> Self {
        self.having_if(true, f)
    }

    pub fn having_if(
        mut self,
        gate: bool,
        f: impl FnOnce(ConditionBuilder<T>) -> ConditionBuilder<T>,
    ) -> Self {
        if !gate {
            return self;
        }
        let child = f(ConditionBuilder::new(self.cond.scope().clone()));
        match child.finish() {
            Ok((sql, values)) if !sql.is_empty() => self.having = Some((sql, values)),
            Ok(_) => {}
            Err(e) => self.cond.record(e),
        }
        self
    }

    /// Append ascending ORDER BY items.
    pub fn order_by_asc<C: Into<Column<T>>>(self, cols: impl IntoIterator<Item = C>) -> Self {
        self.order_by_if(true, true, cols)
    }

    /// Append descending ORDER BY items.
    pub fn order_by_desc<C: Into<Column<T>>>(self, cols: impl IntoIterator<Item = C>) -> Self {
        self.order_by_if(true, false, cols)
    }

    /// Append ORDER BY items. Repeated calls accumulate.
    pub fn order_by_if<C: Into<Column<T>>>(
        mut self,
        gate: bool,
        asc: bool,
        cols: impl IntoIterator<Item = C>,
    ) -> Self {
        if gate {
            let cols = self.resolve_all(cols);
            self.order_by
                .extend(cols.into_iter().map(|column| OrderBy { column, asc }));
        }
        self
    }

    pub fn order_bys(&self) -> &[OrderBy] {
        &self.order_by
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Page-based window. `page` starts at 1; 0 is treated as 1.
    pub fn paginate(self, page: u64, per_page: u64) -> Self {
        let offset = page.saturating_sub(1).saturating_mul(per_page);
        self.limit(per_page).offset(offset)
    }

    /// Raw SQL appended at the very end, e.g. `FOR UPDATE`.
    pub fn last(self, sql: impl Into<String>) -> Self {
        self.last_if(true, sql)
    }

    pub fn last_if(mut self, gate: bool, sql: impl Into<String>) -> Self {
        if gate {
            self.last = Some(sql.into());
        }
        self
    }

    /// WHERE conditions without the leading junction.
    pub fn where_sql(&self) -> String {
        self.cond.where_sql()
    }

    /// Assemble `SELECT ... FROM ... [WHERE] [GROUP BY] [HAVING] [ORDER BY] [window] [last]`.
    pub fn build(self) -> MapperResult<SqlInfo> {
        let entity = self.cond.scope().entity();
        let dialect = self.cond.scope().dialect();
        let default_select = self
            .cond
            .scope()
            .table
            .as_ref()
            .map(|t| t.select_columns())
            .unwrap_or_else(|| "*".to_string());

        let (where_sql, mut values) = self.cond.finish()?;
        let table = self
            .table
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| MapperError::MissingTable(entity.unwrap_or("query").to_string()))?;

        let mut sql = String::from("SELECT ");
        if self.distinct {
            sql.push_str("DISTINCT ");
        }
        sql.push_str(self.select.as_deref().unwrap_or(&default_select));
        sql.push_str(" FROM ");
        sql.push_str(&table);

        if !where_sql.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_sql);
        }
        if !self.group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&self.group_by.join(", "));
        }
        if let Some((having, having_values)) = self.having {
            let mut next = values.len();
            sql.push_str(" HAVING ");
            sql.push_str(&renumber(&having, having_values.len(), &mut next));
            values.extend(having_values);
        }
        if !self.order_by.is_empty() {
            let items: Vec<String> = self.order_by.iter().map(OrderBy::to_sql).collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&items.join(", "));
        }
        if let Some(window) = dialect.limit_clause(self.limit, self.offset) {
            if self.order_by.is_empty() && dialect.window_needs_order() {
                sql.push_str(" ORDER BY (SELECT NULL)");
            }
            sql.push(' ');
            sql.push_str(&window);
        }
        if let Some(last) = self.last {
            sql.push(' ');
            sql.push_str(&last);
        }

        Ok(SqlInfo::new(entity, normalize(&sql), values))
    }

    /// `SELECT COUNT(*) FROM (<this query>) cnt`
    ///
    /// ORDER BY is dropped unless a row window depends on it.
    pub fn build_count(mut self) -> MapperResult<SqlInfo> {
        let entity = self.cond.scope().entity();
        if self.limit.is_none() && self.offset.is_none() {
            self.order_by.clear();
        }
        let (sql, values) = self.build()?.into_parts();
        Ok(SqlInfo::new(
            entity,
            format!("SELECT COUNT(*) FROM ({sql}) cnt"),
            values,
        ))
    }

    pub(crate) fn scope(&self) -> &Scope {
        self.cond.scope()
    }

    /// Whether a row window or raw suffix is set.
    pub(crate) fn has_window(&self) -> bool {
        self.limit.is_some() || self.offset.is_some() || self.last.is_some()
    }

    /// Whether counting must wrap the whole query instead of reusing its WHERE.
    pub(crate) fn needs_wrapped_count(&self) -> bool {
        self.distinct || !self.group_by.is_empty() || self.having.is_some() || self.has_window()
    }

    /// Table and conditions only, for statements that reuse the filter.
    pub(crate) fn into_filter(self) -> (Option<String>, ConditionBuilder<T>) {
        (self.table, self.cond)
    }

    /// Column list resolution shared by select/group/order.
    fn resolve_all<C: Into<Column<T>>>(&mut self, cols: impl IntoIterator<Item = C>) -> Vec<String> {
        cols.into_iter()
            .filter_map(|c| self.cond.column(&c.into()))
            .collect()
    }
}

impl<T: 'static> Conditions for QueryBuilder<T> {
    type Entity = T;

    fn conditions(&mut self) -> &mut ConditionBuilder<T> {
        &mut self.cond
    }
}

impl<T> Clone for QueryBuilder<T> {
    fn clone(&self) -> Self {
        Self {
            cond: self.cond.clone(),
            table: self.table.clone(),
            select: self.select.clone(),
            distinct: self.distinct,
            group_by: self.group_by.clone(),
            having: self.having.clone(),
            order_by: self.order_by.clone(),
            limit: self.limit,
            offset: self.offset,
            last: self.last.clone(),
        }
    }
}

impl<T> fmt::Debug for QueryBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("table", &self.table)
            .field("select", &self.select)
            .field("conditions", &self.cond)
            .field("group_by", &self.group_by)
            .field("having", &self.having)
            .field("order_by", &self.order_by)
            .field("last", &self.last)
            .finish_non_exhaustive()
    }
}
