use heck::ToSnakeCase;
use tracing::{debug, warn};

use super::entity::{FieldDef, FieldKind, FieldStrategy, IdType, SqlCondition, TableDef};
use crate::config::MapperConfig;
use crate::error::{MapperError, MapperResult};
use crate::ident::{Quote, quote_identifier};

/// Resolved metadata for one column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnInfo {
    pub field: String,
    pub column: String,
    pub wrapped: String,
    pub kind: FieldKind,
    pub insert: FieldStrategy,
    pub update: FieldStrategy,
    pub where_strategy: FieldStrategy,
    pub condition: SqlCondition,
    pub select: bool,
    pub id_type: Option<IdType>,
}

impl ColumnInfo {
    pub fn is_id(&self) -> bool {
        self.id_type.is_some()
    }

    /// Insert policy in effect; database generated ids are never inserted.
    pub fn insert_strategy(&self) -> FieldStrategy {
        match self.id_type {
            Some(IdType::Auto) => FieldStrategy::Never,
            _ => self.insert,
        }
    }
}

/// Id bindings exposed to hosts that read back generated keys.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GeneratedKeys {
    /// Entity field names, in declaration order.
    pub properties: Vec<String>,
    /// Raw column names, aligned with `properties`.
    pub columns: Vec<String>,
}

impl GeneratedKeys {
    pub fn key_property(&self) -> String {
        self.properties.join(",")
    }

    pub fn key_column(&self) -> String {
        self.columns.join(",")
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

/// Resolved metadata for an entity type.
///
/// Built once per type by the [`Registry`](super::Registry); column order is
/// the declaration order and never changes afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct TableInfo {
    entity: &'static str,
    table: String,
    wrapped_table: String,
    quote: Option<Quote>,
    columns: Vec<ColumnInfo>,
    id_indexes: Vec<usize>,
}

impl TableInfo {
    pub(crate) fn resolve(def: TableDef, config: &MapperConfig) -> Self {
        let quote = config.quote();
        let table = match def.name {
            Some(name) if !name.trim().is_empty() => name,
            _ if config.map_table_underscore => def.type_name.to_snake_case(),
            _ => def.type_name.to_string(),
        };
        let wrapped_table = quote_identifier(&table, def.wrap.apply(quote));

        let columns: Vec<ColumnInfo> = def
            .fields
            .into_iter()
            .filter(|f| f.exist)
            .map(|f| resolve_column(f, config, quote))
            .collect();
        let id_indexes = columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_id())
            .map(|(i, _)| i)
            .collect::<Vec<_>>();

        if id_indexes.is_empty() {
            warn!(
                target: "sqlmapper::meta",
                entity = def.type_name,
                table = %table,
                "entity declares no id columns; id-dependent statements will fail"
            );
        }
        debug!(
            target: "sqlmapper::meta",
            entity = def.type_name,
            table = %wrapped_table,
            columns = columns.len(),
            ids = id_indexes.len(),
            "resolved table metadata"
        );

        Self {
            entity: def.type_name,
            table,
            wrapped_table,
            quote,
            columns,
            id_indexes,
        }
    }

    /// Simple type name of the entity.
    pub fn entity(&self) -> &'static str {
        self.entity
    }

    /// Unwrapped table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Table name as it appears in SQL.
    pub fn wrapped_table(&self) -> &str {
        &self.wrapped_table
    }

    pub fn quote(&self) -> Option<Quote> {
        self.quote
    }

    pub fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }

    pub fn id_columns(&self) -> impl Iterator<Item = &ColumnInfo> {
        self.id_indexes.iter().map(|&i| &self.columns[i])
    }

    pub fn has_id(&self) -> bool {
        !self.id_indexes.is_empty()
    }

    /// Id columns, or [`MapperError::MissingId`] when there are none.
    pub fn require_ids(&self) -> MapperResult<Vec<&ColumnInfo>> {
        if self.id_indexes.is_empty() {
            return Err(MapperError::missing_id(self.entity));
        }
        Ok(self.id_columns().collect())
    }

    /// Find a column by field name, then by raw column name.
    pub fn lookup(&self, token: &str) -> Option<&ColumnInfo> {
        self.columns
            .iter()
            .find(|c| c.field == token)
            .or_else(|| self.columns.iter().find(|c| c.column == token))
    }

    /// Default select list: selectable columns, or `*`.
    pub fn select_columns(&self) -> String {
        let cols: Vec<&str> = self
            .columns
            .iter()
            .filter(|c| c.select)
            .map(|c| c.wrapped.as_str())
            .collect();
        if cols.is_empty() {
            "*".to_string()
        } else {
            cols.join(", ")
        }
    }

    /// `(column, field)` pairs for mapping result rows onto the entity.
    pub fn result_map(&self) -> Vec<(&str, &str)> {
        self.columns
            .iter()
            .filter(|c| c.select)
            .map(|c| (c.column.as_str(), c.field.as_str()))
            .collect()
    }

    pub fn generated_keys(&self) -> GeneratedKeys {
        let (properties, columns) = self
            .id_columns()
            .map(|c| (c.field.clone(), c.column.clone()))
            .unzip();
        GeneratedKeys {
            properties,
            columns,
        }
    }
}

fn resolve_column(def: FieldDef, config: &MapperConfig, quote: Option<Quote>) -> ColumnInfo {
    let column = match def.column {
        Some(c) if !c.trim().is_empty() => c,
        _ if def.map_underscore.unwrap_or(config.map_underscore_case) => {
            def.name.to_snake_case()
        }
        _ => def.name.clone(),
    };
    let wrapped = quote_identifier(&column, def.wrap.apply(quote));

    ColumnInfo {
        field: def.name,
        column,
        wrapped,
        kind: def.kind,
        insert: def.insert.resolve(def.kind),
        update: def.update.resolve(def.kind),
        where_strategy: def.where_strategy.resolve(def.kind),
        condition: def.condition,
        select: def.select,
        id_type: def.id,
    }
}
