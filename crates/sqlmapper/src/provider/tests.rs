use std::sync::Arc;

use super::*;
use crate::builder::Conditions;
use crate::config::MapperConfig;
use crate::meta::{FieldDef, FieldStrategy, IdType, TableDef};
use crate::page::{OrderItem, Page};

#[derive(Debug, Clone, Default)]
struct Account {
    id: Option<i64>,
    name: Option<String>,
    age: Option<i32>,
    created_at: Option<String>,
}

impl Entity for Account {
    fn table_def() -> TableDef {
        TableDef::of::<Self>()
            .name("account")
            .field(FieldDef::id("id", IdType::Auto))
            .field(FieldDef::text("name"))
            .field(FieldDef::new("age"))
            .field(FieldDef::text("createdAt").update_strategy(FieldStrategy::Never))
    }

    fn get_field(&self, field: &str) -> Value {
        match field {
            "id" => self.id.into(),
            "name" => self.name.clone().into(),
            "age" => self.age.into(),
            "createdAt" => self.created_at.clone().into(),
            _ => Value::Null,
        }
    }

    fn set_field(&mut self, field: &str, value: Value) -> MapperResult<()> {
        match field {
            "id" => self.id = value.as_i64(),
            _ => return Err(MapperError::unknown_field("Account", field)),
        }
        Ok(())
    }
}

fn account(name: &str, age: Option<i32>) -> Account {
    Account {
        name: Some(name.to_string()),
        age,
        ..Account::default()
    }
}

#[derive(Debug, Clone, Default)]
struct Membership {
    tenant: Option<i64>,
    id: Option<i64>,
    role: Option<String>,
}

impl Entity for Membership {
    fn table_def() -> TableDef {
        TableDef::of::<Self>()
            .name("membership")
            .field(FieldDef::id("tenant", IdType::AssignId))
            .field(FieldDef::id("id", IdType::AssignId))
            .field(FieldDef::text("role"))
    }

    fn get_field(&self, field: &str) -> Value {
        match field {
            "tenant" => self.tenant.into(),
            "id" => self.id.into(),
            "role" => self.role.clone().into(),
            _ => Value::Null,
        }
    }

    fn set_field(&mut self, field: &str, value: Value) -> MapperResult<()> {
        match field {
            "tenant" => self.tenant = value.as_i64(),
            "id" => self.id = value.as_i64(),
            _ => return Err(MapperError::unknown_field("Membership", field)),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
struct Document {
    id: Option<String>,
    title: String,
}

impl Entity for Document {
    fn table_def() -> TableDef {
        TableDef::of::<Self>()
            .name("documents")
            .field(FieldDef::id("id", IdType::AssignUuid).kind(crate::meta::FieldKind::Text))
            .field(FieldDef::text("title"))
    }

    fn get_field(&self, field: &str) -> Value {
        match field {
            "id" => self.id.clone().into(),
            "title" => self.title.as_str().into(),
            _ => Value::Null,
        }
    }

    fn set_field(&mut self, field: &str, value: Value) -> MapperResult<()> {
        match field {
            "id" => self.id = value.as_str().map(str::to_string),
            _ => return Err(MapperError::unknown_field("Document", field)),
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
struct AuditLog {
    message: String,
}

impl Entity for AuditLog {
    fn table_def() -> TableDef {
        TableDef::of::<Self>().field(FieldDef::text("message"))
    }

    fn get_field(&self, field: &str) -> Value {
        match field {
            "message" => self.message.as_str().into(),
            _ => Value::Null,
        }
    }

    fn set_field(&mut self, field: &str, _value: Value) -> MapperResult<()> {
        Err(MapperError::unknown_field("AuditLog", field))
    }
}

#[derive(Debug, Clone, Default)]
struct Counter {
    id: Option<i64>,
    name: Option<String>,
    touched: Option<i64>,
    note: Option<String>,
}

impl Entity for Counter {
    fn table_def() -> TableDef {
        TableDef::of::<Self>()
            .name("counter")
            .field(FieldDef::id("id", IdType::AssignId))
            .field(FieldDef::text("name"))
            .field(
                FieldDef::new("touched")
                    .insert_strategy(FieldStrategy::Never)
                    .update_strategy(FieldStrategy::Always),
            )
            .field(FieldDef::text("note").insert_strategy(FieldStrategy::Always))
    }

    fn get_field(&self, field: &str) -> Value {
        match field {
            "id" => self.id.into(),
            "name" => self.name.clone().into(),
            "touched" => self.touched.into(),
            "note" => self.note.clone().into(),
            _ => Value::Null,
        }
    }

    fn set_field(&mut self, field: &str, value: Value) -> MapperResult<()> {
        match field {
            "id" => self.id = value.as_i64(),
            _ => return Err(MapperError::unknown_field("Counter", field)),
        }
        Ok(())
    }
}

fn counter() -> Counter {
    Counter {
        id: Some(1),
        name: Some("a".into()),
        touched: Some(5),
        note: None,
    }
}

fn registry(dialect: Dialect) -> Arc<Registry> {
    Registry::new(MapperConfig::new().dialect(dialect)).unwrap()
}

// ==================== Insert ====================

#[test]
fn test_insert_skips_auto_id_and_null_columns() {
    let accounts = registry(Dialect::Generic).mapper::<Account>();
    let mut a = account("Ann", Some(30));
    a.id = Some(99);
    let info = accounts.insert(&mut a).unwrap();
    assert_eq!(info.sql(), "INSERT INTO account (name, age) VALUES (#{0}, #{1})");
    assert_eq!(info.values(), &[Value::from("Ann"), Value::from(30)]);
    assert_eq!(a.id, None);
}

#[test]
fn test_insert_column_and_value_lists_have_equal_arity() {
    let accounts = registry(Dialect::MySql).mapper::<Account>();
    let samples = [
        account("Ann", Some(30)),
        account("Bob", None),
        account(" ", Some(1)),
        Account::default(),
    ];
    for mut a in samples {
        let info = accounts.insert(&mut a).unwrap();
        let sql = info.sql();
        if let Some(start) = sql.find(" (") {
            let cols = &sql[start + 2..sql.find(") VALUES").unwrap()];
            let cols = if cols.is_empty() { 0 } else { cols.split(", ").count() };
            assert_eq!(cols, info.values().len(), "{sql}");
        }
        assert_eq!(sql.matches("#{").count(), info.values().len());
    }
}

#[test]
fn test_empty_insert_per_dialect() {
    let info = registry(Dialect::MySql)
        .mapper::<Account>()
        .insert(&mut Account::default())
        .unwrap();
    assert_eq!(info.sql(), "INSERT INTO `account` () VALUES ()");

    let info = registry(Dialect::Postgres)
        .mapper::<Account>()
        .insert(&mut Account::default())
        .unwrap();
    assert_eq!(info.sql(), r#"INSERT INTO "account" DEFAULT VALUES"#);
}

#[test]
fn test_insert_assigns_client_ids() {
    let reg = registry(Dialect::Generic);
    let mut m = Membership {
        role: Some("admin".into()),
        ..Membership::default()
    };
    let info = reg.mapper::<Membership>().insert(&mut m).unwrap();
    assert!(m.tenant.is_some() && m.id.is_some());
    assert_eq!(
        info.sql(),
        "INSERT INTO membership (tenant, id, role) VALUES (#{0}, #{1}, #{2})"
    );
    assert_eq!(info.values()[1], Value::Int(m.id.unwrap()));

    let mut d = Document {
        id: Some(String::new()),
        title: "notes".into(),
    };
    reg.mapper::<Document>().insert(&mut d).unwrap();
    let id = d.id.unwrap();
    assert_eq!(id.len(), 32);
    assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn test_insert_keeps_present_client_ids() {
    let mut m = Membership {
        tenant: Some(7),
        id: Some(9),
        role: None,
    };
    let info = registry(Dialect::Generic)
        .mapper::<Membership>()
        .insert(&mut m)
        .unwrap();
    assert_eq!(info.values(), &[Value::Int(7), Value::Int(9)]);
}

#[test]
fn test_insert_always_policy_writes_null() {
    let info = registry(Dialect::MySql)
        .mapper::<Counter>()
        .insert(&mut counter())
        .unwrap();
    assert_eq!(
        info.sql(),
        "INSERT INTO `counter` (`id`, `name`, `note`) VALUES (#{0}, #{1}, #{2})"
    );
    assert_eq!(info.values(), &[Value::from(1), Value::from("a"), Value::Null]);
}

// ==================== Upsert ====================

#[test]
fn test_upsert_mysql_family() {
    let mut a = account("Ann", Some(30));
    a.created_at = Some("2024-01-01".into());
    let info = registry(Dialect::MySql).mapper::<Account>().upsert(&mut a).unwrap();
    assert_eq!(
        info.sql(),
        "INSERT INTO `account` (`name`, `age`, `created_at`) VALUES (#{0}, #{1}, #{2}) \
         ON DUPLICATE KEY UPDATE `name` = VALUES(`name`), `age` = VALUES(`age`)"
    );
    assert_eq!(info.values().len(), 3);
}

#[test]
fn test_upsert_mysql_updates_columns_left_out_of_insert() {
    let counters = registry(Dialect::MySql).mapper::<Counter>();
    let info = counters.upsert(&mut counter()).unwrap();
    assert_eq!(
        info.sql(),
        "INSERT INTO `counter` (`id`, `name`, `note`) VALUES (#{0}, #{1}, #{2}) \
         ON DUPLICATE KEY UPDATE `name` = VALUES(`name`), `touched` = #{3}"
    );
    assert_eq!(
        info.values(),
        &[Value::from(1), Value::from("a"), Value::Null, Value::from(5)]
    );

    let mut items = vec![counter(), counter()];
    let info = counters.batch_upsert(&mut items).unwrap();
    assert!(info.sql().contains("; INSERT INTO `counter` (`id`, `name`, `note`) VALUES (#{4}, #{5}, #{6})"));
    assert!(info.sql().ends_with("`touched` = #{7}"));
    assert_eq!(info.values().len(), 8);

    let info = registry(Dialect::Postgres)
        .mapper::<Counter>()
        .upsert(&mut counter())
        .unwrap();
    assert_eq!(
        info.sql(),
        r#"INSERT INTO "counter" ("id", "name", "note") VALUES (#{0}, #{1}, #{2}) ON CONFLICT ("id") DO UPDATE SET "name" = EXCLUDED."name""#
    );
    assert_eq!(info.values().len(), 3);
}

#[test]
fn test_upsert_postgres_family() {
    let mut a = account("Ann", Some(30));
    a.created_at = Some("2024-01-01".into());
    let info = registry(Dialect::Postgres)
        .mapper::<Account>()
        .upsert(&mut a)
        .unwrap();
    assert_eq!(
        info.sql(),
        r#"INSERT INTO "account" ("name", "age", "created_at") VALUES (#{0}, #{1}, #{2}) ON CONFLICT ("id") DO UPDATE SET "name" = EXCLUDED."name", "age" = EXCLUDED."age""#
    );
}

#[test]
fn test_upsert_without_updatable_columns() {
    let a = Account {
        created_at: Some("2024-01-01".into()),
        ..Account::default()
    };
    let info = registry(Dialect::MySql)
        .mapper::<Account>()
        .upsert(&mut a.clone())
        .unwrap();
    assert_eq!(info.sql(), "INSERT IGNORE INTO `account` (`created_at`) VALUES (#{0})");

    let info = registry(Dialect::Postgres)
        .mapper::<Account>()
        .upsert(&mut a.clone())
        .unwrap();
    assert_eq!(
        info.sql(),
        r#"INSERT INTO "account" ("created_at") VALUES (#{0}) ON CONFLICT ("id") DO NOTHING"#
    );
}

#[test]
fn test_upsert_conflict_target_without_ids() {
    let mut log = AuditLog {
        message: "boot".into(),
    };
    let info = registry(Dialect::Sqlite)
        .mapper::<AuditLog>()
        .upsert(&mut log)
        .unwrap();
    assert_eq!(
        info.sql(),
        "INSERT INTO [AuditLog] ([message]) VALUES (#{0}) ON CONFLICT ([message]) \
         DO UPDATE SET [message] = EXCLUDED.[message]"
    );
}

#[test]
fn test_generic_dialect_upserts_like_mysql() {
    let info = registry(Dialect::Generic)
        .mapper::<Account>()
        .upsert(&mut account("Ann", None))
        .unwrap();
    assert_eq!(
        info.sql(),
        "INSERT INTO account (name) VALUES (#{0}) ON DUPLICATE KEY UPDATE name = VALUES(name)"
    );
}

// ==================== Batches ====================

#[test]
fn test_batch_insert_renumbers_items() {
    let accounts = registry(Dialect::Generic).mapper::<Account>();
    let mut items = vec![account("Ann", Some(30)), account("Bob", None)];
    let info = accounts.batch_insert(&mut items).unwrap();
    assert_eq!(
        info.sql(),
        "INSERT INTO account (name, age) VALUES (#{0}, #{1}); INSERT INTO account (name) VALUES (#{2})"
    );
    assert_eq!(
        info.values(),
        &[Value::from("Ann"), Value::from(30), Value::from("Bob")]
    );
}

#[test]
fn test_batch_assigns_ids_per_item() {
    let mut items = vec![Membership::default(), Membership::default()];
    registry(Dialect::Generic)
        .mapper::<Membership>()
        .batch_upsert(&mut items)
        .unwrap();
    assert!(items.iter().all(|m| m.id.is_some()));
    assert_ne!(items[0].id, items[1].id);
}

#[test]
fn test_empty_batch_is_rejected() {
    let accounts = registry(Dialect::Generic).mapper::<Account>();
    assert!(matches!(
        accounts.batch_insert(&mut []),
        Err(MapperError::EmptyBatch(_))
    ));
    assert!(accounts.batch_upsert_chunks(&mut []).is_err());
}

#[test]
fn test_batch_chunks_follow_batch_size() {
    let reg = Registry::new(MapperConfig::new().dialect(Dialect::Generic).batch_size(2)).unwrap();
    let mut items: Vec<Account> = (0..5).map(|i| account(&format!("u{i}"), None)).collect();
    let chunks = reg.mapper::<Account>().batch_insert_chunks(&mut items).unwrap();
    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[0].values().len(), 2);
    assert_eq!(chunks[2].sql(), "INSERT INTO account (name) VALUES (#{0})");
}

#[test]
fn test_lock_batch_upsert() {
    let mut items = vec![account("Ann", None)];
    let info = registry(Dialect::MySql)
        .mapper::<Account>()
        .lock_batch_upsert(&mut items)
        .unwrap();
    assert!(info.sql().starts_with("LOCK TABLES `account` WRITE; INSERT INTO `account`"));

    let info = registry(Dialect::Postgres)
        .mapper::<Account>()
        .lock_batch_upsert(&mut items)
        .unwrap();
    assert!(info.sql().starts_with(r#"LOCK TABLE "account" IN EXCLUSIVE MODE; INSERT"#));

    let err = registry(Dialect::Sqlite)
        .mapper::<Account>()
        .lock_batch_upsert(&mut items)
        .unwrap_err();
    assert!(matches!(err, MapperError::Unsupported { .. }));
}

// ==================== Update ====================

#[test]
fn test_update_by_id() {
    let mut a = account("Bob", None);
    a.id = Some(1);
    a.created_at = Some("ignored".into());
    let info = registry(Dialect::Generic)
        .mapper::<Account>()
        .update_by_id(&a)
        .unwrap();
    assert_eq!(info.sql(), "UPDATE account SET name = #{0} WHERE id = #{1}");
    assert_eq!(info.values(), &[Value::from("Bob"), Value::from(1i64)]);
}

#[test]
fn test_update_by_id_failures() {
    let accounts = registry(Dialect::Generic).mapper::<Account>();
    let err = accounts.update_by_id(&account("Bob", None)).unwrap_err();
    assert!(matches!(err, MapperError::MissingIdValue { .. }));

    let only_id = Account {
        id: Some(1),
        ..Account::default()
    };
    assert!(matches!(
        accounts.update_by_id(&only_id),
        Err(MapperError::EmptySet(_))
    ));

    let logs = registry(Dialect::Generic).mapper::<AuditLog>();
    assert!(logs.update_by_id(&AuditLog::default()).unwrap_err().is_missing_id());
}

#[test]
fn test_update_with_builder() {
    let accounts = registry(Dialect::Generic).mapper::<Account>();
    let info = accounts
        .update(accounts.updater().eq("id", 1).set("age", 31))
        .unwrap();
    assert_eq!(info.sql(), "UPDATE account SET age = #{0} WHERE id = #{1}");
}

// ==================== Delete ====================

#[test]
fn test_delete_by_composite_id() {
    let info = registry(Dialect::Generic)
        .mapper::<Membership>()
        .delete_by_id((7, 9))
        .unwrap();
    assert_eq!(info.sql(), "DELETE FROM membership WHERE tenant = #{0} AND id = #{1}");
    assert_eq!(info.render_for(Dialect::Generic), "DELETE FROM membership WHERE tenant = ?0 AND id = ?1");
    assert_eq!(info.values(), &[Value::from(7), Value::from(9)]);
}

#[test]
fn test_delete_key_arity_and_missing_ids() {
    let err = registry(Dialect::Generic)
        .mapper::<Membership>()
        .delete_by_id(7)
        .unwrap_err();
    assert!(matches!(err, MapperError::KeyArity { expected: 2, actual: 1 }));

    let err = registry(Dialect::Generic)
        .mapper::<AuditLog>()
        .delete_by_id(1)
        .unwrap_err();
    assert!(err.is_missing_id());
}

#[test]
fn test_delete_by_ids() {
    let reg = registry(Dialect::Generic);
    let info = reg.mapper::<Account>().delete_by_ids([1, 2, 3]).unwrap();
    assert_eq!(info.sql(), "DELETE FROM account WHERE id IN (#{0}, #{1}, #{2})");

    let info = reg.mapper::<Membership>().delete_by_ids([(1, 2), (3, 4)]).unwrap();
    assert_eq!(
        info.sql(),
        "DELETE FROM membership WHERE (tenant = #{0} AND id = #{1}) OR (tenant = #{2} AND id = #{3})"
    );
    assert_eq!(info.values().len(), 4);

    let err = reg.mapper::<Account>().delete_by_ids(Vec::<i64>::new()).unwrap_err();
    assert!(matches!(err, MapperError::EmptyBatch(_)));
}

#[test]
fn test_delete_with_query() {
    let accounts = registry(Dialect::Generic).mapper::<Account>();
    let info = accounts
        .delete(accounts.query().eq("name", "x").order_by_asc(["id"]))
        .unwrap();
    assert_eq!(info.sql(), "DELETE FROM account WHERE name = #{0}");

    let info = accounts.delete(accounts.query().table("account_archive")).unwrap();
    assert_eq!(info.sql(), "DELETE FROM account_archive");
}

// ==================== Select ====================

#[test]
fn test_select_statements() {
    let reg = registry(Dialect::Generic);
    let accounts = reg.mapper::<Account>();
    assert_eq!(
        accounts.select_all().unwrap().sql(),
        "SELECT id, name, age, created_at FROM account"
    );
    assert_eq!(
        accounts.select_by_id(5).unwrap().sql(),
        "SELECT id, name, age, created_at FROM account WHERE id = #{0}"
    );
    assert_eq!(
        reg.mapper::<Membership>()
            .select_by_ids([(1, 2)])
            .unwrap()
            .sql(),
        "SELECT tenant, id, role FROM membership WHERE (tenant = #{0} AND id = #{1})"
    );
    assert_eq!(
        accounts
            .select_one(accounts.query().eq("name", "Ann"))
            .unwrap()
            .sql(),
        "SELECT id, name, age, created_at FROM account WHERE name = #{0} LIMIT 1"
    );
}

#[test]
fn test_count() {
    let accounts = registry(Dialect::Generic).mapper::<Account>();
    assert_eq!(accounts.count(None).unwrap().sql(), "SELECT COUNT(*) FROM account");

    let info = accounts
        .count(Some(accounts.query().eq("age", 3).order_by_desc(["id"])))
        .unwrap();
    assert_eq!(info.sql(), "SELECT COUNT(*) FROM account WHERE age = #{0}");

    let info = accounts
        .count(Some(accounts.query().select(["age"]).group_by(["age"])))
        .unwrap();
    assert_eq!(
        info.sql(),
        "SELECT COUNT(*) FROM (SELECT age FROM account GROUP BY age) cnt"
    );
}

#[test]
fn test_count_drops_order_in_derived_table() {
    let accounts = registry(Dialect::SqlServer).mapper::<Account>();
    let info = accounts
        .count(Some(accounts.query().distinct().select(["name"]).order_by_asc(["name"])))
        .unwrap();
    assert_eq!(
        info.sql(),
        "SELECT COUNT(*) FROM (SELECT DISTINCT [name] FROM [account]) cnt"
    );
}

#[test]
fn test_select_one_on_sqlserver_orders_window() {
    let accounts = registry(Dialect::SqlServer).mapper::<Account>();
    let info = accounts.select_one(accounts.query().eq("name", "Ann")).unwrap();
    assert_eq!(
        info.sql(),
        "SELECT [id], [name], [age], [created_at] FROM [account] WHERE [name] = #{0} \
         ORDER BY (SELECT NULL) OFFSET 0 ROWS FETCH NEXT 1 ROWS ONLY"
    );
}

#[test]
fn test_page_offset_saturates() {
    let accounts = registry(Dialect::Generic).mapper::<Account>();
    let statements = accounts.page(&Page::new(u64::MAX, 10), None).unwrap();
    assert_eq!(
        statements.records.sql(),
        format!(
            "SELECT id, name, age, created_at FROM account LIMIT 10 OFFSET {}",
            u64::MAX
        )
    );
}

#[test]
fn test_page_merges_orders() {
    let accounts = registry(Dialect::Generic).mapper::<Account>();
    let page = Page::new(2, 10).order(OrderItem::asc("name"));
    let statements = accounts
        .page(&page, Some(accounts.query().eq("age", 30).order_by_desc(["id"])))
        .unwrap();
    assert_eq!(statements.count.sql(), "SELECT COUNT(*) FROM account WHERE age = #{0}");
    assert_eq!(
        statements.records.sql(),
        "SELECT id, name, age, created_at FROM account WHERE age = #{0} \
         ORDER BY id DESC, name ASC LIMIT 10 OFFSET 10"
    );
}

#[test]
fn test_page_rejects_unknown_order_column() {
    let accounts = registry(Dialect::Generic).mapper::<Account>();
    let page = Page::new(1, 10).order(OrderItem::desc("nope"));
    assert!(accounts.page(&page, None).unwrap_err().is_unknown_column());
}

// ==================== Templates ====================

#[test]
fn test_templates_memoized_per_shape() {
    let reg = registry(Dialect::Generic);
    let accounts = reg.mapper::<Account>();
    accounts.insert(&mut account("Ann", Some(1))).unwrap();
    accounts.insert(&mut account("Bob", Some(2))).unwrap();
    assert_eq!(reg.templates().len(), 1);

    let info = accounts.insert(&mut account("Cid", None)).unwrap();
    assert_eq!(reg.templates().len(), 2);
    assert_eq!(info.sql(), "INSERT INTO account (name) VALUES (#{0})");
}

#[test]
fn test_generated_keys() {
    let keys = registry(Dialect::Generic).mapper::<Membership>().generated_keys();
    assert_eq!(keys.key_property(), "tenant,id");
    assert_eq!(keys.key_column(), "tenant,id");
    assert!(registry(Dialect::Generic).mapper::<AuditLog>().generated_keys().is_empty());
}
