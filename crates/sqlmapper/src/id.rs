//! Primary key assignment ahead of inserts.

use std::sync::{Mutex, PoisonError};

use uuid::Uuid;

use crate::error::MapperResult;
use crate::meta::{Entity, IdType, TableInfo};
use crate::value::Value;

/// Source of client-side identifiers.
pub trait IdGenerator: Send + Sync {
    /// Next distributed numeric id.
    fn next_id(&self) -> i64;

    /// Next UUID, rendered without hyphens.
    fn next_uuid(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}

const EPOCH_MS: i64 = 1_288_834_974_657;
const WORKER_BITS: u32 = 5;
const DATACENTER_BITS: u32 = 5;
const SEQUENCE_BITS: u32 = 12;
const SEQUENCE_MASK: i64 = (1 << SEQUENCE_BITS) - 1;

/// Snowflake style generator: 41 bits of milliseconds, 5 bits datacenter,
/// 5 bits worker, 12 bits sequence.
///
/// Never blocks. When the clock stalls, runs backwards or a millisecond's
/// sequence is exhausted, the generator borrows the next millisecond.
#[derive(Debug)]
pub struct Snowflake {
    worker_id: i64,
    datacenter_id: i64,
    state: Mutex<SnowflakeState>,
}

#[derive(Debug, Default)]
struct SnowflakeState {
    last_ms: i64,
    sequence: i64,
}

impl Snowflake {
    /// Ids are masked to 5 bits each.
    pub fn new(worker_id: u8, datacenter_id: u8) -> Self {
        let mask = (1 << WORKER_BITS) - 1;
        Self {
            worker_id: i64::from(worker_id) & mask,
            datacenter_id: i64::from(datacenter_id) & ((1 << DATACENTER_BITS) - 1),
            state: Mutex::new(SnowflakeState::default()),
        }
    }
}

impl Default for Snowflake {
    fn default() -> Self {
        Self::new(0, 0)
    }
}

impl IdGenerator for Snowflake {
    fn next_id(&self) -> i64 {
        let mut st = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let mut now = chrono::Utc::now().timestamp_millis().max(st.last_ms);
        if now == st.last_ms {
            st.sequence = (st.sequence + 1) & SEQUENCE_MASK;
            if st.sequence == 0 {
                now += 1;
            }
        } else {
            st.sequence = 0;
        }
        st.last_ms = now;

        ((now - EPOCH_MS) << (SEQUENCE_BITS + WORKER_BITS + DATACENTER_BITS))
            | (self.datacenter_id << (SEQUENCE_BITS + WORKER_BITS))
            | (self.worker_id << SEQUENCE_BITS)
            | st.sequence
    }
}

/// Fill in id fields of `entity` according to each column's [`IdType`].
///
/// - `Auto`: clears any client value, the database assigns one.
/// - `AssignUuid`: assigns a UUID when the value is absent or blank.
/// - `AssignId`: assigns a distributed numeric id when absent or blank.
///
/// Fails with [`MissingId`](crate::MapperError::MissingId) when the entity
/// declares no id columns.
pub fn assign_ids<T: Entity>(
    table: &TableInfo,
    ids: &dyn IdGenerator,
    entity: &mut T,
) -> MapperResult<()> {
    for col in table.require_ids()? {
        let current = entity.get_field(&col.field);
        let next = match col.id_type.unwrap_or_default() {
            IdType::Auto if !current.is_null() => Value::Null,
            IdType::AssignUuid if current.is_blank() => Value::Text(ids.next_uuid()),
            IdType::AssignId if current.is_blank() => Value::Int(ids.next_id()),
            _ => continue,
        };
        entity.set_field(&col.field, next)?;
    }
    Ok(())
}
