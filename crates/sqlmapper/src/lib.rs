//! # sqlmapper
//!
//! Metadata-driven dynamic SQL generation for generic data-access layers.
//!
//! Entities declare their table once; the crate turns that declaration into
//! parameterized statements. Nothing is executed here: every operation
//! returns [`SqlInfo`] (SQL text with neutral `#{n}` placeholders plus the
//! bound values in the same order) for a host runtime to run.
//!
//! ## Features
//!
//! - **Fluent builders**: conditions, SELECT and UPDATE builders with an
//!   `_if` gate on every predicate, nested groups and subqueries
//! - **Placeholder safety**: bound values always line up with placeholders,
//!   however builders are composed
//! - **Generic mapper**: insert, upsert, batch, by-id and paged statements
//!   for any [`Entity`] through [`Mapper`]
//! - **Dialects**: MySQL, MariaDB, Postgres, Oracle, SQL Server and SQLite
//!   quoting, upserts, LIKE patterns and pagination
//! - **Client ids**: snowflake and UUID assignment before inserts
//!
//! ## Example
//!
//! ```ignore
//! use sqlmapper::prelude::*;
//!
//! let registry = Registry::new(MapperConfig::new().dialect(Dialect::Postgres))?;
//!
//! // SELECT ... WHERE "name" = #{0} OR "age" >= #{1}
//! let info = registry
//!     .query::<User>()
//!     .eq("name", "Ann")
//!     .or()
//!     .ge("age", 30)
//!     .build()?;
//!
//! // INSERT with the id assigned client side
//! let info = registry.mapper::<User>().insert(&mut user)?;
//! let sql = info.render_for(Dialect::Postgres);
//! ```

pub mod builder;
pub mod config;
pub mod dialect;
pub mod error;
pub mod id;
pub mod ident;
pub mod meta;
pub mod page;
pub mod prelude;
pub mod provider;
pub mod value;

#[cfg(feature = "postgres")]
pub mod pg;

use std::sync::Arc;

pub use builder::{
    Column, ConditionBuilder, Conditions, Junction, OrderBy, QueryBuilder, SqlInfo, SubQuery,
    UpdateBuilder,
};
pub use config::{DEFAULT_BATCH_SIZE, MapperConfig};
pub use dialect::{Dialect, PlaceholderStyle, UpsertStyle};
pub use error::{MapperError, MapperResult};
pub use id::{IdGenerator, Snowflake, assign_ids};
pub use ident::{Ident, Quote, quote_identifier};
pub use meta::{
    ColumnInfo, Entity, EntityRegistration, Field, FieldDef, FieldKind, FieldStrategy,
    GeneratedKeys, IdType, Registry, SqlCondition, TableDef, TableInfo, WrapMode,
};
pub use page::{OrderItem, Page, PageStatements};
pub use provider::{Key, Mapper};
pub use value::Value;

#[doc(hidden)]
pub use inventory;

/// [`Mapper`] for `T` on the global registry.
pub fn mapper<T: Entity>() -> Mapper<T> {
    Registry::global().mapper::<T>()
}

/// SELECT builder for `T` on the global registry.
pub fn query<T: Entity>() -> QueryBuilder<T> {
    Registry::global().query::<T>()
}

/// UPDATE builder for `T` on the global registry.
pub fn update<T: Entity>() -> UpdateBuilder<T> {
    Registry::global().update::<T>()
}

/// SELECT builder over a table without metadata, on the global registry.
pub fn query_table(table: impl Into<String>) -> QueryBuilder<()> {
    Registry::global().query_table(table)
}

/// UPDATE builder over a table without metadata, on the global registry.
pub fn update_table(table: impl Into<String>) -> UpdateBuilder<()> {
    Registry::global().update_table(table)
}

/// The global registry.
pub fn registry() -> Arc<Registry> {
    Registry::global()
}
