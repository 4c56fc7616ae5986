use super::{Key, Mapper, StatementKind, equalities, key_filter};
use crate::builder::{QueryBuilder, SqlInfo};
use crate::error::{MapperError, MapperResult};
use crate::meta::Entity;
use crate::page::{Page, PageStatements};

impl<T: Entity> Mapper<T> {
    /// `SELECT <cols> FROM t`
    pub fn select_all(&self) -> MapperResult<SqlInfo> {
        let sql = self.template(StatementKind::SelectAll, Vec::new(), || {
            Ok(format!(
                "SELECT {} FROM {}",
                self.table.select_columns(),
                self.table.wrapped_table()
            ))
        })?;
        Ok(self.finish("select_all", &sql, Vec::new()))
    }

    /// `SELECT <cols> FROM t WHERE <id> = ...`
    pub fn select_by_id(&self, key: impl Into<Key>) -> MapperResult<SqlInfo> {
        let ids = self.table.require_ids()?;
        let values = self.key_values(&ids, key.into())?;
        let sql = self.template(StatementKind::SelectById, Vec::new(), || {
            Ok(format!(
                "SELECT {} FROM {} WHERE {}",
                self.table.select_columns(),
                self.table.wrapped_table(),
                equalities(&ids, &mut 0)
            ))
        })?;
        Ok(self.finish("select_by_id", &sql, values))
    }

    /// Rows matching any of `keys`.
    pub fn select_by_ids<K: Into<Key>>(
        &self,
        keys: impl IntoIterator<Item = K>,
    ) -> MapperResult<SqlInfo> {
        let ids = self.table.require_ids()?;
        let mut values = Vec::new();
        let mut count = 0;
        for key in keys {
            values.extend(self.key_values(&ids, key.into())?);
            count += 1;
        }
        if count == 0 {
            return Err(MapperError::EmptyBatch(self.entity().to_string()));
        }
        let sql = self.template(StatementKind::SelectByIds, vec![count], || {
            Ok(format!(
                "SELECT {} FROM {} WHERE {}",
                self.table.select_columns(),
                self.table.wrapped_table(),
                key_filter(&ids, count)
            ))
        })?;
        Ok(self.finish("select_by_ids", &sql, values))
    }

    /// The SELECT described by `query`.
    pub fn select_list(&self, query: QueryBuilder<T>) -> MapperResult<SqlInfo> {
        let info = query.build()?;
        Ok(self.traced("select_list", info))
    }

    /// Like [`select_list`](Self::select_list), limited to one row unless
    /// the query already sets a window or suffix.
    pub fn select_one(&self, query: QueryBuilder<T>) -> MapperResult<SqlInfo> {
        let query = if query.has_window() { query } else { query.limit(1) };
        let info = query.build()?;
        Ok(self.traced("select_one", info))
    }

    /// `SELECT COUNT(*) FROM t [WHERE ...]`.
    ///
    /// Queries with DISTINCT, grouping, a window or a raw suffix are counted
    /// as a derived table instead. ORDER BY is dropped.
    pub fn count(&self, query: Option<QueryBuilder<T>>) -> MapperResult<SqlInfo> {
        let query = query.unwrap_or_else(|| self.query());
        if query.needs_wrapped_count() {
            let info = query.build_count()?;
            return Ok(self.traced("count", info));
        }

        let (table, cond) = query.into_filter();
        let (where_sql, values) = cond.finish()?;
        let table = table
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| MapperError::MissingTable(self.entity().to_string()))?;
        let mut sql = format!("SELECT COUNT(*) FROM {table}");
        if !where_sql.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_sql);
        }
        Ok(self.finish("count", &sql, values))
    }

    /// Count and record statements for `page`.
    ///
    /// The count is built from the query before page ordering is applied.
    /// The query's own ORDER BY items come first, the page's follow.
    pub fn page(&self, page: &Page, query: Option<QueryBuilder<T>>) -> MapperResult<PageStatements> {
        let query = query.unwrap_or_else(|| self.query());
        let count = self.count(Some(query.clone()))?;

        let mut records = query;
        for item in &page.orders {
            records = records.order_by_if(true, item.asc, [item.column.as_str()]);
        }
        let records = records.paginate(page.current, page.size).build()?;
        Ok(PageStatements {
            count,
            records: self.traced("page", records),
        })
    }
}
