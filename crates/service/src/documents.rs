//! Document operations: get/create/update/delete, their batch forms and file
//! attachment, passed straight through to a [`DocumentStore`].
//!
//! Nothing here checks permissions or validates fields; the store does both per
//! call. Batch operations run sequentially and stop at the first error without
//! undoing the items already written.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument};

use crate::errors::ServiceError;
use crate::record::{Fields, Record};
use crate::session::Session;
use crate::store::{schema::FILE_DOCTYPE, DocumentStore};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentResult {
    pub document_id: String,
    pub message: String,
    pub doctype: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentsCreated {
    pub documents: Vec<String>,
    pub message: String,
    pub doctype: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentsResult {
    pub document_ids: Vec<String>,
    pub message: String,
    pub doctype: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileAttached {
    pub document_id: String,
    pub message: String,
    pub file_id: String,
}

pub async fn get_document<S>(store: &S, session: &Session, doctype: &str, document_id: &str) -> Result<Record, ServiceError>
where
    S: DocumentStore + ?Sized,
{
    store.get(session, doctype, document_id).await
}

pub async fn get_documents<S>(store: &S, session: &Session, doctype: &str, document_ids: &[String]) -> Result<Vec<Record>, ServiceError>
where
    S: DocumentStore + ?Sized,
{
    let mut docs = Vec::with_capacity(document_ids.len());
    for id in document_ids {
        docs.push(store.get(session, doctype, id).await?);
    }
    Ok(docs)
}

#[instrument(skip(store, session, data), fields(user = %session.user))]
pub async fn create_document<S>(store: &S, session: &Session, doctype: &str, data: Fields) -> Result<DocumentResult, ServiceError>
where
    S: DocumentStore + ?Sized,
{
    let doc = store.insert(session, doctype, data).await?;
    info!(document_id = %doc.name, "document created");
    Ok(DocumentResult { document_id: doc.name, message: "Document created".into(), doctype: doctype.to_string() })
}

#[instrument(skip(store, session, data), fields(user = %session.user, count = data.len()))]
pub async fn create_documents<S>(store: &S, session: &Session, doctype: &str, data: Vec<Fields>) -> Result<DocumentsCreated, ServiceError>
where
    S: DocumentStore + ?Sized,
{
    let mut documents = Vec::with_capacity(data.len());
    for item in data {
        let doc = store.insert(session, doctype, item).await?;
        documents.push(doc.name);
    }
    info!(created = documents.len(), "documents created");
    Ok(DocumentsCreated { documents, message: "Documents created".into(), doctype: doctype.to_string() })
}

async fn load_merge_save<S>(store: &S, session: &Session, doctype: &str, document_id: &str, data: &Fields) -> Result<Record, ServiceError>
where
    S: DocumentStore + ?Sized,
{
    let mut doc = store.get(session, doctype, document_id).await?;
    doc.merge(data);
    store.save(session, doc).await
}

#[instrument(skip(store, session, data), fields(user = %session.user))]
pub async fn update_document<S>(store: &S, session: &Session, doctype: &str, document_id: &str, data: Fields) -> Result<DocumentResult, ServiceError>
where
    S: DocumentStore + ?Sized,
{
    let doc = load_merge_save(store, session, doctype, document_id, &data).await?;
    info!("document updated");
    Ok(DocumentResult { document_id: doc.name, message: "Document updated".into(), doctype: doctype.to_string() })
}

#[instrument(skip(store, session, data), fields(user = %session.user, count = document_ids.len()))]
pub async fn update_documents<S>(store: &S, session: &Session, doctype: &str, document_ids: Vec<String>, data: Fields) -> Result<DocumentsResult, ServiceError>
where
    S: DocumentStore + ?Sized,
{
    for id in &document_ids {
        load_merge_save(store, session, doctype, id, &data).await?;
    }
    info!("documents updated");
    Ok(DocumentsResult { document_ids, message: "Documents updated".into(), doctype: doctype.to_string() })
}

#[instrument(skip(store, session), fields(user = %session.user))]
pub async fn delete_document<S>(store: &S, session: &Session, doctype: &str, document_id: &str) -> Result<DocumentResult, ServiceError>
where
    S: DocumentStore + ?Sized,
{
    store.delete(session, doctype, document_id).await?;
    info!("document deleted");
    Ok(DocumentResult { document_id: document_id.to_string(), message: "Document deleted".into(), doctype: doctype.to_string() })
}

#[instrument(skip(store, session), fields(user = %session.user, count = document_ids.len()))]
pub async fn delete_documents<S>(store: &S, session: &Session, doctype: &str, document_ids: Vec<String>) -> Result<DocumentsResult, ServiceError>
where
    S: DocumentStore + ?Sized,
{
    for id in &document_ids {
        store.delete(session, doctype, id).await?;
    }
    info!("documents deleted");
    Ok(DocumentsResult { document_ids, message: "Documents deleted".into(), doctype: doctype.to_string() })
}

/// Attach an already uploaded file (located by `file_url`) to a record by
/// creating a second `File` pointing at it.
#[instrument(skip(store, session), fields(user = %session.user))]
pub async fn attach_file_to_document<S>(store: &S, session: &Session, doctype: &str, document_id: &str, file_url: &str) -> Result<FileAttached, ServiceError>
where
    S: DocumentStore + ?Sized,
{
    let source = store
        .find(session, FILE_DOCTYPE, &vec![("file_url".to_string(), Value::String(file_url.to_string()))])
        .await?
        .ok_or_else(|| ServiceError::Validation("File not found".into()))?;

    let copied = |field: &str| source.get(field).cloned().unwrap_or(Value::Null);
    let mut fields = Fields::new();
    fields.insert("file_url".into(), Value::String(file_url.to_string()));
    fields.insert("attached_to_doctype".into(), Value::String(doctype.to_string()));
    fields.insert("attached_to_name".into(), Value::String(document_id.to_string()));
    fields.insert("folder".into(), copied("folder"));
    fields.insert("file_name".into(), copied("file_name"));
    fields.insert("is_private".into(), copied("is_private"));

    let file = store.insert(session, FILE_DOCTYPE, fields).await?;
    info!(file_id = %file.name, source_file = %source.name, "file attached");
    Ok(FileAttached { document_id: document_id.to_string(), message: "File attached".into(), file_id: file.name })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;
    use crate::test_support::{fields, memory_store, seed};
    use serde_json::json;

    #[tokio::test]
    async fn create_then_get_contains_supplied_fields() -> Result<(), anyhow::Error> {
        let store = memory_store();
        let s = Session::system();
        let data = fields(json!({"title": "hello", "priority": 3, "tags": ["a"]}));
        let created = create_document(&store, &s, "Note", data.clone()).await?;
        assert_eq!(created.message, "Document created");
        assert_eq!(created.doctype, "Note");

        let doc = get_document(&store, &s, "Note", &created.document_id).await?;
        for (k, v) in &data {
            assert_eq!(doc.get(k), Some(v), "field {k}");
        }
        Ok(())
    }

    #[tokio::test]
    async fn update_then_get_reflects_value() -> Result<(), anyhow::Error> {
        let store = memory_store();
        let s = Session::system();
        seed(&store, "Note", json!({"name": "n1", "title": "old", "body": "keep"})).await;

        let res = update_document(&store, &s, "Note", "n1", fields(json!({"title": "new"}))).await?;
        assert_eq!(res, DocumentResult { document_id: "n1".into(), message: "Document updated".into(), doctype: "Note".into() });

        let doc = get_document(&store, &s, "Note", "n1").await?;
        assert_eq!(doc.get_str("title"), Some("new"));
        assert_eq!(doc.get_str("body"), Some("keep"));
        Ok(())
    }

    #[tokio::test]
    async fn update_missing_is_not_found() {
        let store = memory_store();
        let err = update_document(&store, &Session::system(), "Note", "nope", fields(json!({"title": "x"}))).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() -> Result<(), anyhow::Error> {
        let store = memory_store();
        let s = Session::system();
        seed(&store, "Note", json!({"name": "n1", "title": "t"})).await;
        let res = delete_document(&store, &s, "Note", "n1").await?;
        assert_eq!(res.message, "Document deleted");
        let err = get_document(&store, &s, "Note", "n1").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        Ok(())
    }

    #[tokio::test]
    async fn get_documents_preserves_order_and_fails_fast() -> Result<(), anyhow::Error> {
        let store = memory_store();
        let s = Session::system();
        seed(&store, "Note", json!({"name": "a", "title": "A"})).await;
        seed(&store, "Note", json!({"name": "b", "title": "B"})).await;

        let docs = get_documents(&store, &s, "Note", &["b".to_string(), "a".to_string()]).await?;
        assert_eq!(docs.iter().map(|d| d.name.as_str()).collect::<Vec<_>>(), vec!["b", "a"]);

        let err = get_documents(&store, &s, "Note", &["a".to_string(), "missing".to_string()]).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        Ok(())
    }

    #[tokio::test]
    async fn create_documents_stops_at_first_invalid_without_rollback() -> Result<(), anyhow::Error> {
        let store = memory_store();
        let s = Session::system();
        let batch = vec![
            fields(json!({"name": "ok-1", "title": "fine"})),
            fields(json!({"name": "bad", "body": "no title"})),
            fields(json!({"name": "ok-2", "title": "never reached"})),
        ];
        let err = create_documents(&store, &s, "Note", batch).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        assert!(get_document(&store, &s, "Note", "ok-1").await.is_ok());
        assert!(get_document(&store, &s, "Note", "ok-2").await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn create_documents_returns_ids_in_order() -> Result<(), anyhow::Error> {
        let store = memory_store();
        let res = create_documents(
            &store,
            &Session::system(),
            "Note",
            vec![fields(json!({"name": "x", "title": "1"})), fields(json!({"name": "y", "title": "2"}))],
        )
        .await?;
        assert_eq!(res.documents, vec!["x".to_string(), "y".to_string()]);
        assert_eq!(res.message, "Documents created");
        Ok(())
    }

    #[tokio::test]
    async fn update_and_delete_many() -> Result<(), anyhow::Error> {
        let store = memory_store();
        let s = Session::system();
        for n in ["a", "b"] {
            seed(&store, "Note", json!({"name": n, "title": n, "status": "Open"})).await;
        }
        let ids = vec!["a".to_string(), "b".to_string()];
        let res = update_documents(&store, &s, "Note", ids.clone(), fields(json!({"status": "Closed"}))).await?;
        assert_eq!(res.document_ids, ids);
        for d in get_documents(&store, &s, "Note", &ids).await? {
            assert_eq!(d.get_str("status"), Some("Closed"));
        }

        let res = delete_documents(&store, &s, "Note", ids.clone()).await?;
        assert_eq!(res.message, "Documents deleted");
        assert!(get_document(&store, &s, "Note", "a").await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn delete_many_stops_at_missing_target() -> Result<(), anyhow::Error> {
        let store = memory_store();
        let s = Session::system();
        seed(&store, "Note", json!({"name": "a", "title": "t"})).await;
        seed(&store, "Note", json!({"name": "c", "title": "t"})).await;
        let err = delete_documents(&store, &s, "Note", vec!["a".into(), "gone".into(), "c".into()]).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
        assert!(get_document(&store, &s, "Note", "a").await.is_err());
        assert!(get_document(&store, &s, "Note", "c").await.is_ok());
        Ok(())
    }

    #[tokio::test]
    async fn attach_file_copies_source_metadata() -> Result<(), anyhow::Error> {
        let store = memory_store();
        let s = Session::system();
        seed(&store, "Note", json!({"name": "n1", "title": "t"})).await;
        seed(
            &store,
            "File",
            json!({"file_url": "/private/files/report.pdf", "folder": "Home", "file_name": "report.pdf", "is_private": 1}),
        )
        .await;

        let res = attach_file_to_document(&store, &s, "Note", "n1", "/private/files/report.pdf").await?;
        assert_eq!(res.document_id, "n1");
        assert_eq!(res.message, "File attached");

        let file = get_document(&store, &s, "File", &res.file_id).await?;
        assert_eq!(file.get_str("attached_to_doctype"), Some("Note"));
        assert_eq!(file.get_str("attached_to_name"), Some("n1"));
        assert_eq!(file.get_str("folder"), Some("Home"));
        assert_eq!(file.get_str("file_name"), Some("report.pdf"));
        assert_eq!(file.get("is_private"), Some(&json!(1)));
        Ok(())
    }

    #[tokio::test]
    async fn attach_file_without_source_is_validation_error() {
        let store = memory_store();
        let err = attach_file_to_document(&store, &Session::system(), "Note", "n1", "/files/missing.png").await.unwrap_err();
        assert_eq!(err, ServiceError::Validation("File not found".into()));
    }

    #[tokio::test]
    async fn store_permission_errors_pass_through() {
        let store = memory_store();
        let outsider = Session::guest();
        let err = create_document(&store, &outsider, "Note", fields(json!({"title": "t"}))).await.unwrap_err();
        assert!(matches!(err, ServiceError::Permission { .. }));
    }
}
