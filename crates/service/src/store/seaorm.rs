use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde_json::Value;
use tracing::{debug, instrument};

use models::document;

use crate::errors::ServiceError;
use crate::record::{Fields, Record};
use crate::session::Session;

use super::{apply_query, DocTypeRegistry, DocumentStore, Filters, ListQuery};

/// Postgres-backed store over the `document` table.
pub struct SeaOrmDocumentStore {
    pub db: DatabaseConnection,
    registry: Arc<DocTypeRegistry>,
}

impl SeaOrmDocumentStore {
    pub fn new(db: DatabaseConnection, registry: DocTypeRegistry) -> Self {
        Self { db, registry: Arc::new(registry) }
    }

    async fn rows(&self, doctype: &str) -> Result<Vec<Record>, ServiceError> {
        let rows = document::list_by_doctype(&self.db, doctype).await?;
        Ok(rows.into_iter().map(to_record).collect())
    }
}

fn to_record(m: document::Model) -> Record {
    let fields = match m.data {
        Value::Object(map) => map,
        _ => Fields::new(),
    };
    Record {
        doctype: m.doctype,
        name: m.name,
        owner: m.owner,
        creation: m.created_at.with_timezone(&Utc),
        modified: m.updated_at.with_timezone(&Utc),
        fields,
    }
}

#[async_trait]
impl DocumentStore for SeaOrmDocumentStore {
    fn registry(&self) -> &DocTypeRegistry {
        &self.registry
    }

    async fn get(&self, session: &Session, doctype: &str, name: &str) -> Result<Record, ServiceError> {
        if !self.registry.can_read(session, doctype)? {
            debug!(%doctype, %name, user = %session.user, "read denied");
            return Err(ServiceError::not_found(doctype, name));
        }
        document::find(&self.db, doctype, name)
            .await?
            .map(to_record)
            .ok_or_else(|| ServiceError::not_found(doctype, name))
    }

    async fn find(&self, session: &Session, doctype: &str, filters: &Filters) -> Result<Option<Record>, ServiceError> {
        if !self.registry.can_read(session, doctype)? {
            return Ok(None);
        }
        let query = ListQuery { doctype: doctype.to_string(), filters: filters.clone(), ..Default::default() };
        Ok(apply_query(self.rows(doctype).await?, &query).into_iter().next())
    }

    async fn list(&self, session: &Session, query: &ListQuery) -> Result<Vec<Record>, ServiceError> {
        self.registry.check_read(session, &query.doctype)?;
        Ok(apply_query(self.rows(&query.doctype).await?, query))
    }

    #[instrument(skip(self, session, fields), fields(user = %session.user))]
    async fn insert(&self, session: &Session, doctype: &str, fields: Fields) -> Result<Record, ServiceError> {
        let record = self.registry.prepare_insert(session, doctype, fields)?;
        let created = document::create(
            &self.db,
            &record.doctype,
            &record.name,
            Value::Object(record.fields),
            &record.owner,
        )
        .await?;
        Ok(to_record(created))
    }

    #[instrument(skip(self, session, record), fields(user = %session.user, doctype = %record.doctype, name = %record.name))]
    async fn save(&self, session: &Session, record: Record) -> Result<Record, ServiceError> {
        let existing = document::find(&self.db, &record.doctype, &record.name)
            .await?
            .map(to_record)
            .ok_or_else(|| ServiceError::not_found(&record.doctype, &record.name))?;
        let saved = self.registry.prepare_save(session, &existing, record)?;
        let updated = document::update_data(&self.db, &saved.doctype, &saved.name, Value::Object(saved.fields)).await?;
        Ok(to_record(updated))
    }

    #[instrument(skip(self, session), fields(user = %session.user))]
    async fn delete(&self, session: &Session, doctype: &str, name: &str) -> Result<(), ServiceError> {
        self.registry.check_write(session, doctype)?;
        if document::delete(&self.db, doctype, name).await? {
            Ok(())
        } else {
            Err(ServiceError::not_found(doctype, name))
        }
    }
}
