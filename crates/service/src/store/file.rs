use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::errors::ServiceError;
use crate::record::{Fields, Record};
use crate::session::Session;
use crate::storage::json_map_store::JsonMapStore;

use super::{apply_query, matches, DocTypeRegistry, DocumentStore, Filters, ListQuery};

/// doctype -> name -> record
type Tables = JsonMapStore<String, BTreeMap<String, Record>>;

/// Document store kept in a single JSON file (or only in memory).
#[derive(Clone)]
pub struct JsonDocumentStore {
    tables: Arc<Tables>,
    registry: Arc<DocTypeRegistry>,
}

impl JsonDocumentStore {
    pub async fn open<P: Into<PathBuf>>(path: P, registry: DocTypeRegistry) -> Result<Self, ServiceError> {
        let tables = JsonMapStore::new(path).await?;
        Ok(Self { tables, registry: Arc::new(registry) })
    }

    pub fn in_memory(registry: DocTypeRegistry) -> Self {
        Self { tables: JsonMapStore::in_memory(), registry: Arc::new(registry) }
    }

    async fn rows(&self, doctype: &str) -> Vec<Record> {
        self.tables
            .read_map(|m| m.get(doctype).map(|t| t.values().cloned().collect()).unwrap_or_default())
            .await
    }
}

#[async_trait]
impl DocumentStore for JsonDocumentStore {
    fn registry(&self) -> &DocTypeRegistry {
        &self.registry
    }

    async fn get(&self, session: &Session, doctype: &str, name: &str) -> Result<Record, ServiceError> {
        if !self.registry.can_read(session, doctype)? {
            debug!(%doctype, %name, user = %session.user, "read denied");
            return Err(ServiceError::not_found(doctype, name));
        }
        self.tables
            .read_map(|m| m.get(doctype).and_then(|t| t.get(name)).cloned())
            .await
            .ok_or_else(|| ServiceError::not_found(doctype, name))
    }

    async fn find(&self, session: &Session, doctype: &str, filters: &Filters) -> Result<Option<Record>, ServiceError> {
        if !self.registry.can_read(session, doctype)? {
            return Ok(None);
        }
        let query = ListQuery { doctype: doctype.to_string(), filters: filters.clone(), ..Default::default() };
        Ok(apply_query(self.rows(doctype).await, &query).into_iter().next())
    }

    async fn list(&self, session: &Session, query: &ListQuery) -> Result<Vec<Record>, ServiceError> {
        self.registry.check_read(session, &query.doctype)?;
        Ok(apply_query(self.rows(&query.doctype).await, query))
    }

    #[instrument(skip(self, session, fields), fields(user = %session.user))]
    async fn insert(&self, session: &Session, doctype: &str, fields: Fields) -> Result<Record, ServiceError> {
        let record = self.registry.prepare_insert(session, doctype, fields)?;
        let stored = record.clone();
        self.tables
            .update_map(move |m| {
                let table = m.entry(stored.doctype.clone()).or_default();
                if table.contains_key(&stored.name) {
                    return Err(ServiceError::Duplicate(format!("{} {} already exists", stored.doctype, stored.name)));
                }
                table.insert(stored.name.clone(), stored);
                Ok(())
            })
            .await?;
        debug!(name = %record.name, "record inserted");
        Ok(record)
    }

    #[instrument(skip(self, session, record), fields(user = %session.user, doctype = %record.doctype, name = %record.name))]
    async fn save(&self, session: &Session, record: Record) -> Result<Record, ServiceError> {
        let registry = Arc::clone(&self.registry);
        let session = session.clone();
        self.tables
            .update_map(move |m| {
                let existing = m
                    .get(&record.doctype)
                    .and_then(|t| t.get(&record.name))
                    .ok_or_else(|| ServiceError::not_found(&record.doctype, &record.name))?;
                let saved = registry.prepare_save(&session, existing, record)?;
                m.entry(saved.doctype.clone()).or_default().insert(saved.name.clone(), saved.clone());
                Ok(saved)
            })
            .await
    }

    #[instrument(skip(self, session), fields(user = %session.user))]
    async fn delete(&self, session: &Session, doctype: &str, name: &str) -> Result<(), ServiceError> {
        self.registry.check_write(session, doctype)?;
        let (doctype, name) = (doctype.to_string(), name.to_string());
        self.tables
            .update_map(move |m| {
                m.get_mut(&doctype)
                    .and_then(|t| t.remove(&name))
                    .map(|_| ())
                    .ok_or_else(|| ServiceError::not_found(&doctype, &name))
            })
            .await
    }

    async fn exists(&self, session: &Session, doctype: &str, filters: &Filters) -> Result<bool, ServiceError> {
        if !self.registry.can_read(session, doctype)? {
            return Ok(false);
        }
        Ok(self.rows(doctype).await.iter().any(|r| matches(r, filters)))
    }
}
