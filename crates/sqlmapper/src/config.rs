use serde::{Deserialize, Serialize};

use crate::dialect::Dialect;
use crate::error::{MapperError, MapperResult};

/// Default number of items per batch chunk.
pub const DEFAULT_BATCH_SIZE: usize = 200;

/// Default number of memoized statement templates per registry.
pub const DEFAULT_TEMPLATE_CACHE_CAPACITY: usize = 256;

/// Configuration shared by a [`Registry`](crate::Registry) and everything it builds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    /// Target database family.
    pub dialect: Dialect,
    /// Wrap table and column names with the dialect's quote characters.
    pub wrap_identifiers: bool,
    /// Map `camelCase` field names to `snake_case` columns unless a field opts out.
    pub map_underscore_case: bool,
    /// Snake-case undeclared table names. Off keeps the type name as written.
    pub map_table_underscore: bool,
    /// Items per statement for chunked batch helpers.
    pub batch_size: usize,
    /// Worker id for distributed ids (0..=31).
    pub worker_id: u8,
    /// Datacenter id for distributed ids (0..=31).
    pub datacenter_id: u8,
    /// Statement templates kept per registry (LRU). `0` disables memoization.
    pub template_cache_capacity: usize,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            wrap_identifiers: true,
            map_underscore_case: true,
            map_table_underscore: false,
            batch_size: DEFAULT_BATCH_SIZE,
            worker_id: 0,
            datacenter_id: 0,
            template_cache_capacity: DEFAULT_TEMPLATE_CACHE_CAPACITY,
        }
    }
}

impl MapperConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the target dialect.
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Pick the dialect from a driver identifier such as `org.postgresql.Driver`.
    pub fn driver(self, driver: &str) -> MapperResult<Self> {
        let dialect = Dialect::from_driver(driver)
            .ok_or_else(|| MapperError::validation(format!("Unknown database driver '{driver}'")))?;
        Ok(self.dialect(dialect))
    }

    /// Pick the dialect from a connection URL.
    pub fn database_url(self, url: &str) -> MapperResult<Self> {
        let dialect = Dialect::from_url(url)
            .ok_or_else(|| MapperError::validation("Cannot infer dialect from database URL"))?;
        Ok(self.dialect(dialect))
    }

    /// Disable identifier quoting.
    pub fn no_wrap(mut self) -> Self {
        self.wrap_identifiers = false;
        self
    }

    /// Enable or disable camel-to-underscore column mapping.
    pub fn map_underscore_case(mut self, enabled: bool) -> Self {
        self.map_underscore_case = enabled;
        self
    }

    /// Enable or disable snake-casing of type names used as table names.
    pub fn map_table_underscore(mut self, enabled: bool) -> Self {
        self.map_table_underscore = enabled;
        self
    }

    /// Set the batch chunk size. Zero is rejected by [`validate`](Self::validate).
    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    /// Set worker and datacenter ids for the distributed id generator.
    pub fn node(mut self, worker_id: u8, datacenter_id: u8) -> Self {
        self.worker_id = worker_id;
        self.datacenter_id = datacenter_id;
        self
    }

    /// Set how many statement templates are memoized.
    pub fn template_cache_capacity(mut self, capacity: usize) -> Self {
        self.template_cache_capacity = capacity;
        self
    }

    pub fn validate(&self) -> MapperResult<()> {
        if self.batch_size == 0 {
            return Err(MapperError::validation("batch_size must be at least 1"));
        }
        if self.worker_id > 31 || self.datacenter_id > 31 {
            return Err(MapperError::validation(
                "worker_id and datacenter_id must be in 0..=31",
            ));
        }
        Ok(())
    }

    /// Quote characters in effect, honoring `wrap_identifiers`.
    pub(crate) fn quote(&self) -> Option<crate::ident::Quote> {
        if self.wrap_identifiers {
            self.dialect.quote()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = MapperConfig::new();
        assert_eq!(cfg.dialect, Dialect::MySql);
        assert_eq!(cfg.batch_size, 200);
        assert!(cfg.wrap_identifiers);
        assert!(!cfg.map_table_underscore);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn driver_and_url_pick_dialect() {
        let cfg = MapperConfig::new().driver("org.postgresql.Driver").unwrap();
        assert_eq!(cfg.dialect, Dialect::Postgres);
        let cfg = MapperConfig::new().database_url("sqlite://app.db").unwrap();
        assert_eq!(cfg.dialect, Dialect::Sqlite);
        assert!(MapperConfig::new().driver("nope").is_err());
    }

    #[test]
    fn validation_rejects_out_of_range() {
        assert!(MapperConfig::new().batch_size(0).validate().is_err());
        assert!(MapperConfig::new().node(32, 0).validate().is_err());
    }

    #[test]
    fn deserializes_partial_config() {
        let cfg: MapperConfig = serde_json::from_str(r#"{"dialect":"postgres"}"#).unwrap();
        assert_eq!(cfg.dialect, Dialect::Postgres);
        assert_eq!(cfg.batch_size, DEFAULT_BATCH_SIZE);
    }
}
