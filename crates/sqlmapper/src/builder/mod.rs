//! Fluent condition, query and update builders.
//!
//! ## Design
//!
//! - Builders are single-owner values: every call consumes and returns the
//!   builder, nested groups and subqueries run on fresh builders whose output
//!   is merged back.
//! - Placeholders are neutral `#{n}` tokens, zero-based, always in the same
//!   left-to-right order as the bound values. Merged fragments are renumbered
//!   so this holds under any composition.
//! - Errors (unknown columns, missing table, empty SET) are recorded when
//!   they happen and returned by `build()`. No partial SQL is returned.

mod column;
pub(crate) mod placeholder;
mod select;
mod sql_info;
mod traits;
mod update;
mod where_builder;

use std::sync::Arc;

pub use column::Column;
pub use select::{OrderBy, QueryBuilder};
pub use sql_info::SqlInfo;
pub use traits::Conditions;
pub use update::UpdateBuilder;
pub use where_builder::{ConditionBuilder, Junction, SubQuery};

pub(crate) use where_builder::Scope;

use crate::meta::{Entity, Registry};

impl Registry {
    /// SELECT builder over `T`.
    pub fn query<T: Entity>(self: &Arc<Self>) -> QueryBuilder<T> {
        QueryBuilder::new(Scope::of::<T>(self.clone()))
    }

    /// SELECT builder seeded with one predicate per column of `entity`
    /// admitted by the column's where-policy.
    pub fn query_from<T: Entity>(self: &Arc<Self>, entity: &T) -> QueryBuilder<T> {
        let mut qb = self.query::<T>();
        qb.conditions().seed(entity);
        qb
    }

    /// SELECT builder over a table without metadata. The name is used verbatim.
    pub fn query_table(self: &Arc<Self>, table: impl Into<String>) -> QueryBuilder<()> {
        QueryBuilder::new(Scope::untyped(self.clone())).table(table)
    }

    /// UPDATE builder over `T`.
    pub fn update<T: Entity>(self: &Arc<Self>) -> UpdateBuilder<T> {
        UpdateBuilder::new(Scope::of::<T>(self.clone()))
    }

    /// UPDATE builder whose WHERE clause is seeded from `entity`.
    pub fn update_from<T: Entity>(self: &Arc<Self>, entity: &T) -> UpdateBuilder<T> {
        let mut ub = self.update::<T>();
        ub.conditions().seed(entity);
        ub
    }

    /// UPDATE builder over a table without metadata.
    pub fn update_table(self: &Arc<Self>, table: impl Into<String>) -> UpdateBuilder<()> {
        UpdateBuilder::new(Scope::untyped(self.clone())).table(table)
    }

    /// Bare condition builder over `T`.
    pub fn conditions<T: Entity>(self: &Arc<Self>) -> ConditionBuilder<T> {
        ConditionBuilder::new(Scope::of::<T>(self.clone()))
    }

    /// Bare condition builder seeded from `entity`.
    pub fn conditions_from<T: Entity>(self: &Arc<Self>, entity: &T) -> ConditionBuilder<T> {
        let mut cb = self.conditions::<T>();
        cb.seed(entity);
        cb
    }
}
