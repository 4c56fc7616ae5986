use super::{Mapper, StatementKind};
use crate::builder::SqlInfo;
use crate::builder::placeholder::push_token;
use crate::dialect::{Dialect, UpsertStyle};
use crate::error::{MapperError, MapperResult};
use crate::id::assign_ids;
use crate::meta::{ColumnInfo, Entity};
use crate::value::Value;

/// Separates the inserted and updated column lists in an upsert shape.
const SHAPE_SPLIT: usize = usize::MAX;

impl<T: Entity> Mapper<T> {
    /// `INSERT INTO t (cols) VALUES (...)`.
    ///
    /// Ids are assigned first. A column is written when its insert policy
    /// admits the current value; auto-increment ids never are.
    pub fn insert(&self, entity: &mut T) -> MapperResult<SqlInfo> {
        self.prepare(entity)?;
        let info = self.insert_statement(entity)?;
        Ok(self.traced("insert", info))
    }

    /// Insert, or update the row on a key conflict.
    ///
    /// MySQL family: `ON DUPLICATE KEY UPDATE` over every non-id column whose
    /// update policy admits its value. Inserted columns read `VALUES(col)`;
    /// the rest bind their value after the insert values. Falls back to
    /// `INSERT IGNORE` when nothing is updatable. Postgres family:
    /// `ON CONFLICT (ids) DO UPDATE SET col = EXCLUDED.col` over the inserted
    /// columns only, or `DO NOTHING`.
    pub fn upsert(&self, entity: &mut T) -> MapperResult<SqlInfo> {
        self.prepare(entity)?;
        let info = self.upsert_statement(entity)?;
        Ok(self.traced("upsert", info))
    }

    /// One insert per entity, joined into a `;` separated script.
    pub fn batch_insert(&self, entities: &mut [T]) -> MapperResult<SqlInfo> {
        let info = self.batch(entities, Self::insert_statement)?;
        Ok(self.traced("batch_insert", info))
    }

    /// One upsert per entity, joined into a `;` separated script.
    pub fn batch_upsert(&self, entities: &mut [T]) -> MapperResult<SqlInfo> {
        let info = self.batch(entities, Self::upsert_statement)?;
        Ok(self.traced("batch_upsert", info))
    }

    /// [`batch_upsert`](Self::batch_upsert) behind an exclusive table lock.
    ///
    /// Only MySQL, MariaDB, Postgres and the generic dialect can express
    /// the lock.
    pub fn lock_batch_upsert(&self, entities: &mut [T]) -> MapperResult<SqlInfo> {
        let dialect = self.dialect();
        let lock = dialect
            .lock_table(self.table.wrapped_table())
            .ok_or_else(|| MapperError::unsupported(dialect, "table lock ahead of a batch upsert"))?;
        let info = self
            .batch(entities, Self::upsert_statement)?
            .prepend(&format!("{lock}; "));
        Ok(self.traced("lock_batch_upsert", info))
    }

    /// [`batch_insert`](Self::batch_insert) per chunk of `batch_size` entities.
    pub fn batch_insert_chunks(&self, entities: &mut [T]) -> MapperResult<Vec<SqlInfo>> {
        self.require_items(entities)?;
        entities
            .chunks_mut(self.registry.config().batch_size)
            .map(|chunk| self.batch_insert(chunk))
            .collect()
    }

    /// [`batch_upsert`](Self::batch_upsert) per chunk of `batch_size` entities.
    pub fn batch_upsert_chunks(&self, entities: &mut [T]) -> MapperResult<Vec<SqlInfo>> {
        self.require_items(entities)?;
        entities
            .chunks_mut(self.registry.config().batch_size)
            .map(|chunk| self.batch_upsert(chunk))
            .collect()
    }

    fn prepare(&self, entity: &mut T) -> MapperResult<()> {
        if !self.table.has_id() {
            return Ok(());
        }
        assign_ids(&self.table, self.registry.id_generator(), entity)
    }

    fn require_items(&self, entities: &[T]) -> MapperResult<()> {
        if entities.is_empty() {
            return Err(MapperError::EmptyBatch(self.entity().to_string()));
        }
        Ok(())
    }

    fn batch(
        &self,
        entities: &mut [T],
        statement: fn(&Self, &T) -> MapperResult<SqlInfo>,
    ) -> MapperResult<SqlInfo> {
        self.require_items(entities)?;
        let mut statements = Vec::with_capacity(entities.len());
        for entity in entities.iter_mut() {
            self.prepare(entity)?;
            statements.push(statement(self, entity)?);
        }
        Ok(SqlInfo::join(statements, "; "))
    }

    /// Indexes and values of the columns an insert writes.
    fn inserted(&self, entity: &T) -> (Vec<usize>, Vec<Value>) {
        let mut shape = Vec::new();
        let mut values = Vec::new();
        for (i, col) in self.table.columns().iter().enumerate() {
            let value = entity.get_field(&col.field);
            if col.insert_strategy().admits(&value) {
                shape.push(i);
                values.push(value);
            }
        }
        (shape, values)
    }

    fn insert_statement(&self, entity: &T) -> MapperResult<SqlInfo> {
        let (shape, values) = self.inserted(entity);
        let sql = self.template(StatementKind::Insert, shape.clone(), || {
            Ok(self.insert_sql(&shape, false))
        })?;
        Ok(SqlInfo::new(Some(self.entity()), sql.to_string(), values))
    }

    fn upsert_statement(&self, entity: &T) -> MapperResult<SqlInfo> {
        let (inserted, mut values) = self.inserted(entity);
        let columns = self.table.columns();
        let mut updated = Vec::new();
        match self.dialect().upsert_style() {
            // Columns left out of the insert are bound after the insert values.
            UpsertStyle::DuplicateKey => {
                for (i, col) in columns.iter().enumerate() {
                    if col.is_id() {
                        continue;
                    }
                    let value = entity.get_field(&col.field);
                    if !col.update.admits(&value) {
                        continue;
                    }
                    if !inserted.contains(&i) {
                        values.push(value);
                    }
                    updated.push(i);
                }
            }
            // EXCLUDED only carries the inserted row.
            UpsertStyle::OnConflict => {
                updated.extend(
                    inserted
                        .iter()
                        .zip(&values)
                        .filter(|&(&i, value)| !columns[i].is_id() && columns[i].update.admits(value))
                        .map(|(&i, _)| i),
                );
            }
        }

        let mut shape = inserted.clone();
        shape.push(SHAPE_SPLIT);
        shape.extend(&updated);
        let sql = self.template(StatementKind::Upsert, shape, || {
            Ok(self.upsert_sql(&inserted, &updated))
        })?;
        Ok(SqlInfo::new(Some(self.entity()), sql.to_string(), values))
    }

    fn insert_sql(&self, shape: &[usize], ignore: bool) -> String {
        let verb = if ignore { "INSERT IGNORE INTO" } else { "INSERT INTO" };
        let table = self.table.wrapped_table();
        if shape.is_empty() {
            return match self.dialect() {
                Dialect::MySql | Dialect::MariaDb | Dialect::Generic => {
                    format!("{verb} {table} () VALUES ()")
                }
                _ => format!("{verb} {table} DEFAULT VALUES"),
            };
        }

        let names = wrapped_names(self.table.columns(), shape);
        let mut tokens = String::new();
        for i in 0..shape.len() {
            if i > 0 {
                tokens.push_str(", ");
            }
            push_token(&mut tokens, i);
        }
        format!("{verb} {table} ({}) VALUES ({tokens})", names.join(", "))
    }

    fn upsert_sql(&self, inserted: &[usize], updated: &[usize]) -> String {
        let columns = self.table.columns();
        match self.dialect().upsert_style() {
            UpsertStyle::DuplicateKey => {
                if updated.is_empty() {
                    return self.insert_sql(inserted, true);
                }
                let mut next = inserted.len();
                let mut sets = Vec::with_capacity(updated.len());
                for &i in updated {
                    let c = &columns[i].wrapped;
                    let mut set = format!("{c} = ");
                    if inserted.contains(&i) {
                        set.push_str(&format!("VALUES({c})"));
                    } else {
                        push_token(&mut set, next);
                        next += 1;
                    }
                    sets.push(set);
                }
                format!(
                    "{} ON DUPLICATE KEY UPDATE {}",
                    self.insert_sql(inserted, false),
                    sets.join(", ")
                )
            }
            UpsertStyle::OnConflict => {
                let target: Vec<&str> = if self.table.has_id() {
                    self.table.id_columns().map(|c| c.wrapped.as_str()).collect()
                } else {
                    wrapped_names(columns, inserted)
                };
                let mut sql = self.insert_sql(inserted, false);
                sql.push_str(" ON CONFLICT");
                if !target.is_empty() {
                    sql.push_str(&format!(" ({})", target.join(", ")));
                }
                if updated.is_empty() {
                    sql.push_str(" DO NOTHING");
                } else {
                    let sets: Vec<String> = wrapped_names(columns, updated)
                        .into_iter()
                        .map(|c| format!("{c} = EXCLUDED.{c}"))
                        .collect();
                    sql.push_str(" DO UPDATE SET ");
                    sql.push_str(&sets.join(", "));
                }
                sql
            }
        }
    }
}

fn wrapped_names<'a>(columns: &'a [ColumnInfo], indexes: &[usize]) -> Vec<&'a str> {
    indexes.iter().map(|&i| columns[i].wrapped.as_str()).collect()
}
