use std::any::TypeId;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use crate::error::MapperResult;

/// Statement families whose text only depends on metadata and the
/// parameter shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum StatementKind {
    Insert,
    Upsert,
    UpdateById,
    DeleteById,
    DeleteByIds,
    SelectById,
    SelectByIds,
    SelectAll,
}

/// Memo key: entity type, statement family and parameter shape.
///
/// The shape is whatever varies between calls for the same family: the
/// indexes of the included columns for inserts and updates, the key count
/// for multi-key statements.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct TemplateKey {
    pub(crate) entity: TypeId,
    pub(crate) kind: StatementKind,
    pub(crate) shape: Vec<usize>,
}

impl TemplateKey {
    pub(crate) fn new(entity: TypeId, kind: StatementKind, shape: Vec<usize>) -> Self {
        Self { entity, kind, shape }
    }
}

/// Bounded LRU of generated statement templates.
#[derive(Debug)]
pub(crate) struct TemplateCache {
    inner: Mutex<TemplateCacheInner>,
}

#[derive(Debug)]
struct TemplateCacheInner {
    capacity: usize,
    map: HashMap<TemplateKey, Arc<str>>,
    order: VecDeque<TemplateKey>,
}

impl TemplateCache {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(TemplateCacheInner {
                capacity,
                map: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().map.len()
    }

    /// Return the cached template for `key`, building it on a miss.
    ///
    /// The lock is not held while `build` runs; when two callers race on the
    /// same key the first stored template wins.
    pub(crate) fn get_or_try_insert(
        &self,
        key: TemplateKey,
        build: impl FnOnce() -> MapperResult<String>,
    ) -> MapperResult<Arc<str>> {
        {
            let mut inner = self.lock();
            if inner.capacity == 0 {
                drop(inner);
                return build().map(Arc::from);
            }
            if let Some(sql) = inner.map.get(&key).cloned() {
                inner.touch(&key);
                return Ok(sql);
            }
        }

        let sql: Arc<str> = Arc::from(build()?);
        debug!(
            target: "sqlmapper::provider",
            kind = ?key.kind,
            sql = %sql,
            "built statement template"
        );

        let mut inner = self.lock();
        if let Some(existing) = inner.map.get(&key).cloned() {
            inner.touch(&key);
            return Ok(existing);
        }
        inner.map.insert(key.clone(), sql.clone());
        inner.order.push_back(key);
        inner.evict_if_needed();
        Ok(sql)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TemplateCacheInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TemplateCacheInner {
    fn touch(&mut self, key: &TemplateKey) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            if let Some(k) = self.order.remove(pos) {
                self.order.push_back(k);
            }
        }
    }

    fn evict_if_needed(&mut self) {
        while self.map.len() > self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            let _ = self.map.remove(&oldest);
        }
    }
}
