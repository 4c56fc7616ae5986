//! Convenient imports for typical `sqlmapper` usage.
//!
//! ```ignore
//! use sqlmapper::prelude::*;
//! ```

pub use crate::{
    Conditions, Dialect, Entity, Field, FieldDef, FieldKind, FieldStrategy, IdType, Key, Mapper,
    MapperConfig, MapperError, MapperResult, OrderItem, Page, QueryBuilder, Registry,
    SqlCondition, SqlInfo, TableDef, UpdateBuilder, Value,
};
pub use crate::register_entity;
