use super::{Mapper, StatementKind, equalities};
use crate::builder::placeholder::push_token;
use crate::builder::{SqlInfo, UpdateBuilder};
use crate::error::{MapperError, MapperResult};
use crate::meta::Entity;

impl<T: Entity> Mapper<T> {
    /// `UPDATE t SET ... WHERE <id> = ...`.
    ///
    /// Every non-id column whose update policy admits its value is set. All
    /// id fields must carry a value.
    pub fn update_by_id(&self, entity: &T) -> MapperResult<SqlInfo> {
        let ids = self.table.require_ids()?;
        let mut id_values = Vec::with_capacity(ids.len());
        for id in &ids {
            let value = entity.get_field(&id.field);
            if value.is_null() {
                return Err(MapperError::MissingIdValue {
                    field: id.field.clone(),
                });
            }
            id_values.push(value);
        }

        let mut shape = Vec::new();
        let mut values = Vec::new();
        for (i, col) in self.table.columns().iter().enumerate() {
            if col.is_id() {
                continue;
            }
            let value = entity.get_field(&col.field);
            if col.update.admits(&value) {
                shape.push(i);
                values.push(value);
            }
        }
        if shape.is_empty() {
            return Err(MapperError::EmptySet(self.entity().to_string()));
        }
        values.extend(id_values);

        let sql = self.template(StatementKind::UpdateById, shape.clone(), || {
            let columns = self.table.columns();
            let mut sql = format!("UPDATE {} SET ", self.table.wrapped_table());
            for (n, &i) in shape.iter().enumerate() {
                if n > 0 {
                    sql.push_str(", ");
                }
                sql.push_str(&columns[i].wrapped);
                sql.push_str(" = ");
                push_token(&mut sql, n);
            }
            let mut next = shape.len();
            sql.push_str(" WHERE ");
            sql.push_str(&equalities(&ids, &mut next));
            Ok(sql)
        })?;
        Ok(self.finish("update_by_id", &sql, values))
    }

    /// Build a filtered UPDATE from `builder`.
    pub fn update(&self, builder: UpdateBuilder<T>) -> MapperResult<SqlInfo> {
        let info = builder.build()?;
        Ok(self.traced("update", info))
    }
}
