//! Tool-call dispatcher: maps a named function call with JSON arguments onto the
//! document operations.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::documents;
use crate::errors::ServiceError;
use crate::record::Fields;
use crate::session::Session;
use crate::store::DocumentStore;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "function", content = "arguments", rename_all = "snake_case")]
pub enum FunctionCall {
    GetDocument { doctype: String, document_id: String },
    GetDocuments { doctype: String, document_ids: Vec<String> },
    CreateDocument { doctype: String, data: Fields },
    CreateDocuments { doctype: String, data: Vec<Fields> },
    UpdateDocument { doctype: String, document_id: String, data: Fields },
    UpdateDocuments { doctype: String, document_ids: Vec<String>, data: Fields },
    DeleteDocument { doctype: String, document_id: String },
    DeleteDocuments { doctype: String, document_ids: Vec<String> },
    AttachFileToDocument { doctype: String, document_id: String, file_path: String },
}

impl FunctionCall {
    pub fn name(&self) -> &'static str {
        match self {
            FunctionCall::GetDocument { .. } => "get_document",
            FunctionCall::GetDocuments { .. } => "get_documents",
            FunctionCall::CreateDocument { .. } => "create_document",
            FunctionCall::CreateDocuments { .. } => "create_documents",
            FunctionCall::UpdateDocument { .. } => "update_document",
            FunctionCall::UpdateDocuments { .. } => "update_documents",
            FunctionCall::DeleteDocument { .. } => "delete_document",
            FunctionCall::DeleteDocuments { .. } => "delete_documents",
            FunctionCall::AttachFileToDocument { .. } => "attach_file_to_document",
        }
    }

    /// Parse `{"function": ..., "arguments": {...}}`.
    pub fn from_value(v: Value) -> Result<Self, ServiceError> {
        serde_json::from_value(v).map_err(|e| ServiceError::Validation(format!("invalid function call: {}", e)))
    }
}

fn to_json<T: Serialize>(v: T) -> Result<Value, ServiceError> {
    serde_json::to_value(v).map_err(|e| ServiceError::Internal(e.to_string()))
}

#[instrument(skip(store, session, call), fields(user = %session.user, function = call.name()))]
pub async fn execute<S>(store: &S, session: &Session, call: FunctionCall) -> Result<Value, ServiceError>
where
    S: DocumentStore + ?Sized,
{
    debug!("executing function call");
    match call {
        FunctionCall::GetDocument { doctype, document_id } => {
            to_json(documents::get_document(store, session, &doctype, &document_id).await?)
        }
        FunctionCall::GetDocuments { doctype, document_ids } => {
            to_json(documents::get_documents(store, session, &doctype, &document_ids).await?)
        }
        FunctionCall::CreateDocument { doctype, data } => {
            to_json(documents::create_document(store, session, &doctype, data).await?)
        }
        FunctionCall::CreateDocuments { doctype, data } => {
            to_json(documents::create_documents(store, session, &doctype, data).await?)
        }
        FunctionCall::UpdateDocument { doctype, document_id, data } => {
            to_json(documents::update_document(store, session, &doctype, &document_id, data).await?)
        }
        FunctionCall::UpdateDocuments { doctype, document_ids, data } => {
            to_json(documents::update_documents(store, session, &doctype, document_ids, data).await?)
        }
        FunctionCall::DeleteDocument { doctype, document_id } => {
            to_json(documents::delete_document(store, session, &doctype, &document_id).await?)
        }
        FunctionCall::DeleteDocuments { doctype, document_ids } => {
            to_json(documents::delete_documents(store, session, &doctype, document_ids).await?)
        }
        FunctionCall::AttachFileToDocument { doctype, document_id, file_path } => {
            to_json(documents::attach_file_to_document(store, session, &doctype, &document_id, &file_path).await?)
        }
    }
}
