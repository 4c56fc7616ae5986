use super::{Key, Mapper, StatementKind, equalities, key_filter};
use crate::builder::{QueryBuilder, SqlInfo};
use crate::error::{MapperError, MapperResult};
use crate::meta::Entity;

impl<T: Entity> Mapper<T> {
    /// `DELETE FROM t WHERE <id> = ...`, one value per id column.
    pub fn delete_by_id(&self, key: impl Into<Key>) -> MapperResult<SqlInfo> {
        let ids = self.table.require_ids()?;
        let values = self.key_values(&ids, key.into())?;
        let sql = self.template(StatementKind::DeleteById, Vec::new(), || {
            Ok(format!(
                "DELETE FROM {} WHERE {}",
                self.table.wrapped_table(),
                equalities(&ids, &mut 0)
            ))
        })?;
        Ok(self.finish("delete_by_id", &sql, values))
    }

    /// Delete every row matching one of `keys`.
    pub fn delete_by_ids<K: Into<Key>>(
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
        let sql = self.template(StatementKind::DeleteByIds, vec![count], || {
            Ok(format!(
                "DELETE FROM {} WHERE {}",
                self.table.wrapped_table(),
                key_filter(&ids, count)
            ))
        })?;
        Ok(self.finish("delete_by_ids", &sql, values))
    }

    /// `DELETE FROM t [WHERE ...]` reusing the conditions of `query`.
    ///
    /// Only the table and the WHERE conditions of the query are used.
    pub fn delete(&self, query: QueryBuilder<T>) -> MapperResult<SqlInfo> {
        let (table, cond) = query.into_filter();
        let (where_sql, values) = cond.finish()?;
        let table = table
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| MapperError::MissingTable(self.entity().to_string()))?;
        let mut sql = format!("DELETE FROM {table}");
        if !where_sql.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_sql);
        }
        Ok(self.finish("delete", &sql, values))
    }
}
