//! Startup wiring shared by the binaries and the HTTP layer.

use std::sync::Arc;

use anyhow::Context;
use migration::MigratorTrait;
use tracing::{info, instrument};

use configs::{AppConfig, StoreBackend};

use crate::errors::ServiceError;
use crate::session::{Session, SessionTokens, ADMINISTRATOR};
use crate::store::{file::JsonDocumentStore, seaorm::SeaOrmDocumentStore, DocTypeRegistry, DocumentStore};
use crate::user::{self, USER_DOCTYPE};

/// Open the configured document store.
pub async fn open_store(cfg: &AppConfig) -> anyhow::Result<Arc<dyn DocumentStore>> {
    let registry = DocTypeRegistry::from_config(cfg);
    match cfg.store.backend {
        StoreBackend::File => {
            common::env::ensure_store_dir(&cfg.store.path).await?;
            if cfg.store.path.trim().is_empty() {
                return Ok(Arc::new(JsonDocumentStore::in_memory(registry)));
            }
            let store = JsonDocumentStore::open(cfg.store.path.as_str(), registry)
                .await
                .with_context(|| format!("open store file {}", cfg.store.path))?;
            info!(path = %cfg.store.path, "file store opened");
            Ok(Arc::new(store))
        }
        StoreBackend::Database => {
            let db = models::db::connect_with_config(&cfg.database).await.context("connect database")?;
            migration::Migrator::up(&db, None).await.context("run migrations")?;
            info!("database store ready");
            Ok(Arc::new(SeaOrmDocumentStore::new(db, registry)))
        }
    }
}

/// Turn a bearer token into the session of the user it names.
///
/// The user record is read with system rights; unknown or disabled users are
/// rejected. `Administrator` needs no record.
#[instrument(skip(store, tokens, token))]
pub async fn resolve_session(
    store: &dyn DocumentStore,
    tokens: &SessionTokens,
    token: &str,
) -> Result<Session, ServiceError> {
    let claims = tokens.verify(token)?;
    match store.get(&Session::system(), USER_DOCTYPE, &claims.sub).await {
        Ok(record) if user::is_enabled(&record) => Ok(Session::for_user(&record)),
        Ok(_) => Err(ServiceError::Unauthorized("user is disabled".into())),
        Err(ServiceError::NotFound(_)) if claims.sub == ADMINISTRATOR => Ok(Session::system()),
        Err(ServiceError::NotFound(_)) => Err(ServiceError::Unauthorized("unknown user".into())),
        Err(e) => Err(e),
    }
}
