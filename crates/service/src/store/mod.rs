//! Document store capability.
//!
//! Every call carries the caller's [`Session`]; implementations enforce doctype
//! permissions and schema validation themselves (see [`schema::DocTypeRegistry`]),
//! so callers above this layer hold no permission logic.

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::ServiceError;
use crate::record::{compare_values, Fields, Record};
use crate::session::Session;

pub mod schema;
pub mod file;
pub mod seaorm;

pub use schema::{DocTypeRegistry, DocTypeSpec};

/// Equality filters, all of which must match.
pub type Filters = Vec<(String, Value)>;

#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub doctype: String,
    pub filters: Filters,
    /// Attributes to keep; empty keeps everything.
    pub fields: Vec<String>,
    /// Ascending sort key.
    pub order_by: Option<String>,
}

impl ListQuery {
    pub fn new(doctype: impl Into<String>) -> Self {
        Self { doctype: doctype.into(), ..Default::default() }
    }

    pub fn filter(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push((field.into(), value.into()));
        self
    }

    pub fn fields<I, F>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn order_by(mut self, field: impl Into<String>) -> Self {
        self.order_by = Some(field.into());
        self
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Doctype schemas and permissions this store enforces.
    fn registry(&self) -> &DocTypeRegistry;

    /// Load one record. Absent and unreadable records both yield `NotFound`.
    async fn get(&self, session: &Session, doctype: &str, name: &str) -> Result<Record, ServiceError>;

    /// First record matching every filter, if the caller may read the doctype.
    async fn find(&self, session: &Session, doctype: &str, filters: &Filters) -> Result<Option<Record>, ServiceError>;

    async fn list(&self, session: &Session, query: &ListQuery) -> Result<Vec<Record>, ServiceError>;

    /// Validate and persist a new record; `fields["name"]` becomes its id when given.
    async fn insert(&self, session: &Session, doctype: &str, fields: Fields) -> Result<Record, ServiceError>;

    /// Persist an existing record's attributes.
    async fn save(&self, session: &Session, record: Record) -> Result<Record, ServiceError>;

    async fn delete(&self, session: &Session, doctype: &str, name: &str) -> Result<(), ServiceError>;

    async fn exists(&self, session: &Session, doctype: &str, filters: &Filters) -> Result<bool, ServiceError> {
        Ok(self.find(session, doctype, filters).await?.is_some())
    }
}

pub(crate) fn matches(record: &Record, filters: &Filters) -> bool {
    filters.iter().all(|(field, value)| &record.value_of(field) == value)
}

/// Filter, order and project an unordered candidate set.
pub(crate) fn apply_query<I>(records: I, query: &ListQuery) -> Vec<Record>
where
    I: IntoIterator<Item = Record>,
{
    let mut rows: Vec<Record> = records.into_iter().filter(|r| matches(r, &query.filters)).collect();
    // creation keeps the unsorted output stable across backends
    rows.sort_by(|a, b| a.creation.cmp(&b.creation).then_with(|| a.name.cmp(&b.name)));
    if let Some(key) = &query.order_by {
        rows.sort_by(|a, b| compare_values(&a.value_of(key), &b.value_of(key)));
    }
    if query.fields.is_empty() {
        rows
    } else {
        rows.iter().map(|r| r.project(&query.fields)).collect()
    }
}
