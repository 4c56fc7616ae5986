//! Metadata-driven statements for the generic data-access surface.
//!
//! [`Mapper<T>`] produces the statements a base mapper offers for every
//! entity: inserts and upserts (single and batched), id based updates,
//! deletes and selects, plus thin wrappers over the builders for filtered
//! statements. It never executes anything; every method returns
//! [`SqlInfo`](crate::SqlInfo) for the host runtime to run.
//!
//! Statement text that only depends on metadata and on which columns are
//! included is generated once and memoized in the registry.

mod cache;
mod delete;
mod insert;
mod select;
mod update;

use std::any::TypeId;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::trace;

pub(crate) use cache::{StatementKind, TemplateCache, TemplateKey};

use crate::builder::{QueryBuilder, SqlInfo, UpdateBuilder};
use crate::builder::placeholder::push_token;
use crate::dialect::Dialect;
use crate::error::{MapperError, MapperResult};
use crate::meta::{ColumnInfo, Entity, GeneratedKeys, Registry, TableInfo};
use crate::value::Value;

/// Primary key value: a single value or one value per id column.
#[derive(Debug, Clone, PartialEq)]
pub enum Key {
    Single(Value),
    Composite(Vec<Value>),
}

impl Key {
    pub fn single(value: impl Into<Value>) -> Self {
        Key::Single(value.into())
    }

    pub fn composite<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Self {
        Key::Composite(values.into_iter().map(Into::into).collect())
    }

    pub fn len(&self) -> usize {
        match self {
            Key::Single(_) => 1,
            Key::Composite(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_values(self) -> Vec<Value> {
        match self {
            Key::Single(v) => vec![v],
            Key::Composite(v) => v,
        }
    }
}

macro_rules! impl_key_from {
    ($($t:ty),* $(,)?) => {
        $(
            impl From<$t> for Key {
                fn from(v: $t) -> Self {
                    Key::Single(v.into())
                }
            }
        )*
    };
}

impl_key_from!(i16, i32, i64, u8, u16, u32, String, &str, uuid::Uuid, Value);

impl From<Vec<Value>> for Key {
    fn from(v: Vec<Value>) -> Self {
        Key::Composite(v)
    }
}

impl<A: Into<Value>, B: Into<Value>> From<(A, B)> for Key {
    fn from((a, b): (A, B)) -> Self {
        Key::Composite(vec![a.into(), b.into()])
    }
}

impl<A: Into<Value>, B: Into<Value>, C: Into<Value>> From<(A, B, C)> for Key {
    fn from((a, b, c): (A, B, C)) -> Self {
        Key::Composite(vec![a.into(), b.into(), c.into()])
    }
}

/// Statement provider bound to one entity type.
///
/// ```ignore
/// let users = registry.mapper::<User>();
/// let info = users.insert(&mut user)?;
/// let info = users.delete_by_id(42)?;
/// let info = users.select_list(users.query().eq("status", "active"))?;
/// ```
pub struct Mapper<T> {
    registry: Arc<Registry>,
    table: Arc<TableInfo>,
    _marker: PhantomData<fn() -> T>,
}

impl Registry {
    /// Statement provider for `T`.
    pub fn mapper<T: Entity>(self: &Arc<Self>) -> Mapper<T> {
        Mapper {
            registry: self.clone(),
            table: self.resolve::<T>(),
            _marker: PhantomData,
        }
    }
}

impl<T: Entity> Mapper<T> {
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn table(&self) -> &TableInfo {
        &self.table
    }

    pub fn dialect(&self) -> Dialect {
        self.registry.dialect()
    }

    /// Ordered id properties and columns for generated-key read back.
    pub fn generated_keys(&self) -> GeneratedKeys {
        self.table.generated_keys()
    }

    /// Fresh SELECT builder over `T`.
    pub fn query(&self) -> QueryBuilder<T> {
        self.registry.query::<T>()
    }

    /// Fresh UPDATE builder over `T`.
    pub fn updater(&self) -> UpdateBuilder<T> {
        self.registry.update::<T>()
    }

    fn entity(&self) -> &'static str {
        self.table.entity()
    }

    /// Memoized template text for `kind` and `shape`.
    fn template(
        &self,
        kind: StatementKind,
        shape: Vec<usize>,
        build: impl FnOnce() -> MapperResult<String>,
    ) -> MapperResult<Arc<str>> {
        self.registry
            .templates()
            .get_or_try_insert(TemplateKey::new(TypeId::of::<T>(), kind, shape), build)
    }

    fn finish(&self, op: &'static str, sql: &str, values: Vec<Value>) -> SqlInfo {
        self.traced(op, SqlInfo::new(Some(self.entity()), sql.to_string(), values))
    }

    fn traced(&self, op: &'static str, info: SqlInfo) -> SqlInfo {
        trace!(
            target: "sqlmapper::sql",
            entity = self.entity(),
            op,
            sql = info.sql(),
            binds = info.values().len(),
            "generated statement"
        );
        info
    }

    /// Key values, checked against the number of id columns.
    fn key_values(&self, ids: &[&ColumnInfo], key: Key) -> MapperResult<Vec<Value>> {
        let values = key.into_values();
        if values.len() != ids.len() {
            return Err(MapperError::KeyArity {
                expected: ids.len(),
                actual: values.len(),
            });
        }
        Ok(values)
    }
}

impl<T> Clone for Mapper<T> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            table: self.table.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Mapper<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mapper")
            .field("entity", &self.table.entity())
            .field("table", &self.table.wrapped_table())
            .finish_non_exhaustive()
    }
}

/// `a = #{n} AND b = #{n+1} ...` over `cols`, advancing `next`.
fn equalities(cols: &[&ColumnInfo], next: &mut usize) -> String {
    let mut sql = String::new();
    for (i, col) in cols.iter().enumerate() {
        if i > 0 {
            sql.push_str(" AND ");
        }
        sql.push_str(&col.wrapped);
        sql.push_str(" = ");
        push_token(&mut sql, *next);
        *next += 1;
    }
    sql
}

/// WHERE body matching any of `count` keys.
///
/// A single id column becomes `id IN (...)`; composite ids become an OR of
/// parenthesized equality groups.
fn key_filter(ids: &[&ColumnInfo], count: usize) -> String {
    let mut next = 0;
    if let [id] = ids {
        let mut sql = format!("{} IN (", id.wrapped);
        for i in 0..count {
            if i > 0 {
                sql.push_str(", ");
            }
            push_token(&mut sql, next);
            next += 1;
        }
        sql.push(')');
        return sql;
    }
    (0..count)
        .map(|_| format!("({})", equalities(ids, &mut next)))
        .collect::<Vec<_>>()
        .join(" OR ")
}

#[cfg(test)]
mod tests;
