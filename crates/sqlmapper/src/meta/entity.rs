//! Declarative entity metadata.
//!
//! An entity describes its table once through [`Entity::table_def`]. The
//! declaration is resolved into a [`TableInfo`](super::TableInfo) by the
//! [`Registry`](super::Registry) and never consulted again.
//!
//! ```
//! use sqlmapper::prelude::*;
//!
//! struct User {
//!     id: Option<i64>,
//!     user_name: String,
//! }
//!
//! impl Entity for User {
//!     fn table_def() -> TableDef {
//!         TableDef::of::<Self>()
//!             .name("users")
//!             .field(FieldDef::id("id", IdType::Auto))
//!             .field(FieldDef::text("userName"))
//!     }
//!
//!     fn get_field(&self, field: &str) -> Value {
//!         match field {
//!             "id" => self.id.into(),
//!             "userName" => self.user_name.as_str().into(),
//!             _ => Value::Null,
//!         }
//!     }
//!
//!     fn set_field(&mut self, field: &str, value: Value) -> MapperResult<()> {
//!         match field {
//!             "id" => self.id = value.as_i64(),
//!             _ => return Err(MapperError::unknown_field("User", field)),
//!         }
//!         Ok(())
//!     }
//! }
//! ```

use std::fmt;
use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

use crate::error::MapperResult;
use crate::ident::Quote;
use crate::value::Value;

/// A record type mapped to a table.
pub trait Entity: Send + Sync + 'static {
    /// Declare the table and its fields, in column order.
    fn table_def() -> TableDef;

    /// Read a field by its declared name. Unknown names read as `Null`.
    fn get_field(&self, field: &str) -> Value;

    /// Write a field by its declared name. Used for id assignment.
    fn set_field(&mut self, field: &str, value: Value) -> MapperResult<()>;
}

/// Inclusion policy for one column in one kind of statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldStrategy {
    /// Include when the value is present.
    NotNull,
    /// Include when the value is present and, for text, not blank.
    NotEmpty,
    /// Always include.
    Always,
    /// Never include.
    Never,
    /// `NotEmpty` for text fields, `NotNull` otherwise. Resolved at registration.
    #[default]
    Default,
}

impl FieldStrategy {
    pub(crate) fn resolve(self, kind: FieldKind) -> Self {
        match (self, kind) {
            (FieldStrategy::Default, FieldKind::Text) => FieldStrategy::NotEmpty,
            (FieldStrategy::Default, FieldKind::Other) => FieldStrategy::NotNull,
            (s, _) => s,
        }
    }

    /// Whether a column holding `value` passes this gate.
    pub fn admits(self, value: &Value) -> bool {
        match self {
            FieldStrategy::NotNull | FieldStrategy::Default => !value.is_null(),
            FieldStrategy::NotEmpty => !value.is_blank(),
            FieldStrategy::Always => true,
            FieldStrategy::Never => false,
        }
    }
}

/// Operator used when a predicate is derived from an entity instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SqlCondition {
    #[default]
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Like,
    NotLike,
    LikeLeft,
    LikeRight,
}

/// Whether a field holds text. Drives `FieldStrategy::Default`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    #[default]
    Other,
}

/// Identifier quoting for a table or column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WrapMode {
    /// Use the dialect's quote characters (unless wrapping is disabled globally).
    #[default]
    Auto,
    /// Never quote this column.
    Disable,
    /// Quote with these characters regardless of dialect.
    Enable(Quote),
}

impl WrapMode {
    /// Quote pair in effect given the registry's default.
    pub fn apply(self, default: Option<Quote>) -> Option<Quote> {
        match self {
            WrapMode::Auto => default,
            WrapMode::Disable => None,
            WrapMode::Enable(q) => Some(q),
        }
    }
}

/// Primary key value strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdType {
    /// Database generated. Any client value is cleared before insert.
    Auto,
    /// Client generated UUID text, assigned when absent or blank.
    AssignUuid,
    /// Distributed numeric id, assigned when absent or blank.
    #[default]
    AssignId,
}

impl IdType {
    /// Parse a strategy name. `none` and `input` fall back to [`IdType::AssignId`].
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "auto" => Some(IdType::Auto),
            "assign_uuid" | "uuid" => Some(IdType::AssignUuid),
            "assign_id" | "none" | "input" => Some(IdType::AssignId),
            _ => None,
        }
    }
}

/// Table-level declaration.
#[derive(Debug, Clone)]
pub struct TableDef {
    pub(crate) type_name: &'static str,
    pub(crate) name: Option<String>,
    pub(crate) wrap: WrapMode,
    pub(crate) fields: Vec<FieldDef>,
}

impl TableDef {
    /// Start a declaration for `T`; the table name defaults to the type name.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_name: simple_type_name(std::any::type_name::<T>()),
            name: None,
            wrap: WrapMode::Auto,
            fields: Vec::new(),
        }
    }

    /// Explicit table name. May be dotted (`schema.table`).
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Quoting for the table name only. Columns keep their own mode.
    pub fn wrap(mut self, mode: WrapMode) -> Self {
        self.wrap = mode;
        self
    }

    /// Append a field. Declaration order is column order.
    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    pub fn fields(mut self, fields: impl IntoIterator<Item = FieldDef>) -> Self {
        self.fields.extend(fields);
        self
    }
}

/// Per-field declaration.
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub(crate) name: String,
    pub(crate) column: Option<String>,
    pub(crate) exist: bool,
    pub(crate) kind: FieldKind,
    pub(crate) insert: FieldStrategy,
    pub(crate) update: FieldStrategy,
    pub(crate) where_strategy: FieldStrategy,
    pub(crate) condition: SqlCondition,
    pub(crate) select: bool,
    pub(crate) map_underscore: Option<bool>,
    pub(crate) wrap: WrapMode,
    pub(crate) id: Option<IdType>,
}

impl FieldDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column: None,
            exist: true,
            kind: FieldKind::Other,
            insert: FieldStrategy::Default,
            update: FieldStrategy::Default,
            where_strategy: FieldStrategy::Default,
            condition: SqlCondition::Eq,
            select: true,
            map_underscore: None,
            wrap: WrapMode::Auto,
            id: None,
        }
    }

    /// A text field.
    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name).kind(FieldKind::Text)
    }

    /// An id field with the given value strategy.
    pub fn id(name: impl Into<String>, id_type: IdType) -> Self {
        let kind = match id_type {
            IdType::AssignUuid => FieldKind::Text,
            _ => FieldKind::Other,
        };
        Self {
            id: Some(id_type),
            ..Self::new(name).kind(kind)
        }
    }

    /// Column name override.
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    /// Mark the field as not backed by a column. It is excluded entirely.
    pub fn not_exist(mut self) -> Self {
        self.exist = false;
        self
    }

    pub fn kind(mut self, kind: FieldKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn insert_strategy(mut self, strategy: FieldStrategy) -> Self {
        self.insert = strategy;
        self
    }

    pub fn update_strategy(mut self, strategy: FieldStrategy) -> Self {
        self.update = strategy;
        self
    }

    pub fn where_strategy(mut self, strategy: FieldStrategy) -> Self {
        self.where_strategy = strategy;
        self
    }

    /// Same policy for insert, update and entity-derived predicates.
    pub fn strategy(self, strategy: FieldStrategy) -> Self {
        self.insert_strategy(strategy)
            .update_strategy(strategy)
            .where_strategy(strategy)
    }

    /// Operator used for predicates derived from an entity instance.
    pub fn condition(mut self, condition: SqlCondition) -> Self {
        self.condition = condition;
        self
    }

    /// Exclude the column from default select lists.
    pub fn hidden(mut self) -> Self {
        self.select = false;
        self
    }

    /// Override the global camel-to-underscore setting for this field.
    pub fn map_underscore(mut self, enabled: bool) -> Self {
        self.map_underscore = Some(enabled);
        self
    }

    pub fn wrap(mut self, mode: WrapMode) -> Self {
        self.wrap = mode;
        self
    }
}

/// Typed column token for `T`.
///
/// Declared as associated constants so column references are checked
/// against the entity they belong to:
///
/// ```ignore
/// impl User {
///     pub const NAME: Field<User> = Field::new("userName");
/// }
/// ```
pub struct Field<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Field<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for Field<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Field<T> {}

impl<T> fmt::Debug for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Field").field(&self.name).finish()
    }
}

/// `a::b::User<c::D>` -> `User`
fn simple_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_strategy_resolves_by_kind() {
        assert_eq!(
            FieldStrategy::Default.resolve(FieldKind::Text),
            FieldStrategy::NotEmpty
        );
        assert_eq!(
            FieldStrategy::Default.resolve(FieldKind::Other),
            FieldStrategy::NotNull
        );
        assert_eq!(
            FieldStrategy::Always.resolve(FieldKind::Text),
            FieldStrategy::Always
        );
    }

    #[test]
    fn strategy_gates() {
        let blank = Value::from(" ");
        assert!(FieldStrategy::NotNull.admits(&blank));
        assert!(!FieldStrategy::NotEmpty.admits(&blank));
        assert!(FieldStrategy::Always.admits(&Value::Null));
        assert!(!FieldStrategy::Never.admits(&Value::from(1)));
    }

    #[test]
    fn id_type_names() {
        assert_eq!(IdType::from_name("AUTO"), Some(IdType::Auto));
        assert_eq!(IdType::from_name("none"), Some(IdType::AssignId));
        assert_eq!(IdType::from_name("input"), Some(IdType::AssignId));
        assert_eq!(IdType::from_name("bogus"), None);
    }

    #[test]
    fn simple_type_names() {
        struct Order;
        assert_eq!(TableDef::of::<Order>().type_name, "Order");
        assert_eq!(simple_type_name("a::b::Wrapper<c::D>"), "Wrapper");
    }
}
