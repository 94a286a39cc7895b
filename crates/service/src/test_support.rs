#![cfg(test)]
use tokio::sync::OnceCell;
use sea_orm::DatabaseConnection;
use migration::MigratorTrait;
use serde_json::Value;
use models::db::{connect_with_config, DatabaseConfig};

use configs::RosterConfig;

use crate::record::{Fields, Record};
use crate::session::Session;
use crate::store::{file::JsonDocumentStore, DocTypeRegistry, DocTypeSpec, DocumentStore};

// Ensure migrations run only once across the entire test process
static MIGRATED: OnceCell<bool> = OnceCell::const_new();

fn db_config() -> DatabaseConfig {
    let mut cfg = configs::load_default().map(|c| c.database).unwrap_or_default();
    cfg.normalize_from_env();
    cfg.max_connections = cfg.max_connections.max(10);
    cfg.min_connections = 1;
    cfg.connect_timeout_secs = cfg.connect_timeout_secs.clamp(1, 5);
    cfg.acquire_timeout_secs = cfg.acquire_timeout_secs.clamp(1, 10);
    cfg
}

/// Fresh connection to the test database, or `None` when DB tests are skipped or no
/// database is reachable.
pub async fn get_db() -> Option<DatabaseConnection> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return None;
    }
    let migrated = *MIGRATED
        .get_or_init(|| async {
            let db = match connect_with_config(&db_config()).await {
                Ok(db) => db,
                Err(e) => {
                    eprintln!("skip: cannot connect to db: {}", e);
                    return false;
                }
            };
            if let Err(e) = migration::Migrator::up(&db, None).await {
                eprintln!("skip: migrate up failed: {}", e);
                return false;
            }
            true
        })
        .await;
    if !migrated {
        return None;
    }
    connect_with_config(&db_config()).await.ok()
}

pub fn fields(v: Value) -> Fields {
    v.as_object().cloned().unwrap_or_default()
}

/// In-memory store with the built-in doctypes plus an open `Note` doctype
/// requiring `title`.
pub fn memory_store() -> JsonDocumentStore {
    let mut reg = DocTypeRegistry::builtin(&RosterConfig::default());
    reg.register(DocTypeSpec::open("Note").required(["title"]));
    JsonDocumentStore::in_memory(reg)
}

pub async fn seed(store: &JsonDocumentStore, doctype: &str, v: Value) -> Record {
    store.insert(&Session::system(), doctype, fields(v)).await.expect("seed record")
}
