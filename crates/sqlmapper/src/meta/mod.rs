//! Entity metadata: declarations, resolved table descriptors and the registry.

mod entity;
mod registry;
mod table;

pub use entity::{
    Entity, Field, FieldDef, FieldKind, FieldStrategy, IdType, SqlCondition, TableDef, WrapMode,
};
pub use registry::{EntityRegistration, Registry};
pub use table::{ColumnInfo, GeneratedKeys, TableInfo};
