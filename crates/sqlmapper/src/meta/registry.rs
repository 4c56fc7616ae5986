use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use super::entity::Entity;
use super::table::TableInfo;
use crate::config::MapperConfig;
use crate::dialect::Dialect;
use crate::error::{MapperError, MapperResult};
use crate::id::{IdGenerator, Snowflake};
use crate::provider::TemplateCache;

type TableSlot = Arc<OnceLock<Arc<TableInfo>>>;

/// Process-wide metadata and template store.
///
/// Each entity type is resolved at most once, even when several threads ask
/// for it at the same time. After that, lookups only take a shared read lock.
pub struct Registry {
    config: MapperConfig,
    tables: RwLock<HashMap<TypeId, TableSlot>>,
    templates: TemplateCache,
    ids: Arc<dyn IdGenerator>,
}

static GLOBAL: OnceLock<Arc<Registry>> = OnceLock::new();

impl Registry {
    /// Create a registry using a [`Snowflake`] generator for the configured node.
    pub fn new(config: MapperConfig) -> MapperResult<Arc<Self>> {
        config.validate()?;
        let ids = Arc::new(Snowflake::new(config.worker_id, config.datacenter_id));
        Ok(Arc::new(Self::build(config, ids)))
    }

    /// Create a registry with a custom id generator.
    pub fn with_id_generator(
        config: MapperConfig,
        ids: impl IdGenerator + 'static,
    ) -> MapperResult<Arc<Self>> {
        config.validate()?;
        Ok(Arc::new(Self::build(config, Arc::new(ids))))
    }

    fn build(config: MapperConfig, ids: Arc<dyn IdGenerator>) -> Self {
        let templates = TemplateCache::new(config.template_cache_capacity);
        Self {
            config,
            tables: RwLock::new(HashMap::new()),
            templates,
            ids,
        }
    }

    /// The process-wide registry. Uses the default configuration unless
    /// [`Registry::init_global`] ran first.
    pub fn global() -> Arc<Registry> {
        GLOBAL
            .get_or_init(|| {
                let config = MapperConfig::default();
                let ids = Arc::new(Snowflake::new(config.worker_id, config.datacenter_id));
                Arc::new(Self::build(config, ids))
            })
            .clone()
    }

    /// Configure the process-wide registry. Fails if it is already in use.
    pub fn init_global(config: MapperConfig) -> MapperResult<Arc<Registry>> {
        let registry = Registry::new(config)?;
        GLOBAL
            .set(registry.clone())
            .map_err(|_| MapperError::validation("global registry is already initialized"))?;
        Ok(registry)
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    pub fn dialect(&self) -> Dialect {
        self.config.dialect
    }

    pub fn id_generator(&self) -> &dyn IdGenerator {
        self.ids.as_ref()
    }

    pub(crate) fn templates(&self) -> &TemplateCache {
        &self.templates
    }

    /// Resolve `T` to its table metadata, building it on first use.
    pub fn resolve<T: Entity>(&self) -> Arc<TableInfo> {
        let slot = self.slot(TypeId::of::<T>());
        slot.get_or_init(|| Arc::new(TableInfo::resolve(T::table_def(), &self.config)))
            .clone()
    }

    /// Whether `T` has been resolved already.
    pub fn is_resolved<T: Entity>(&self) -> bool {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        tables
            .get(&TypeId::of::<T>())
            .is_some_and(|slot| slot.get().is_some())
    }

    /// Resolve every entity submitted with [`register_entity!`](crate::register_entity).
    ///
    /// Returns the number of registrations seen.
    pub fn register_all(&self) -> usize {
        let mut count = 0;
        for reg in inventory::iter::<EntityRegistration> {
            (reg.resolve)(self);
            count += 1;
        }
        count
    }

    fn slot(&self, id: TypeId) -> TableSlot {
        {
            let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(slot) = tables.get(&id) {
                return slot.clone();
            }
        }
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        tables.entry(id).or_default().clone()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tables = self
            .tables
            .read()
            .map(|t| t.len())
            .unwrap_or_default();
        f.debug_struct("Registry")
            .field("config", &self.config)
            .field("tables", &tables)
            .field("templates", &self.templates.len())
            .finish_non_exhaustive()
    }
}

/// Registration entry for the eager resolution pass.
///
/// Submitted by [`register_entity!`](crate::register_entity) and collected
/// by [`Registry::register_all`].
pub struct EntityRegistration {
    pub resolve: fn(&Registry) -> Arc<TableInfo>,
}

impl EntityRegistration {
    pub const fn of<T: Entity>() -> Self {
        Self {
            resolve: resolve_erased::<T>,
        }
    }
}

fn resolve_erased<T: Entity>(registry: &Registry) -> Arc<TableInfo> {
    registry.resolve::<T>()
}

inventory::collect!(EntityRegistration);

/// Submit entity types for [`Registry::register_all`].
///
/// ```ignore
/// sqlmapper::register_entity!(User, Order);
/// ```
#[macro_export]
macro_rules! register_entity {
    ($($ty:ty),+ $(,)?) => {
        $(
            $crate::inventory::submit! {
                $crate::EntityRegistration::of::<$ty>()
            }
        )+
    };
}
