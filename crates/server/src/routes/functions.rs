use axum::{extract::State, Json};
use serde_json::Value;

use common::types::Message;
use service::functions::{self, FunctionCall};

use super::auth::{CurrentSession, ServerState};
use crate::errors::JsonApiError;

#[utoipa::path(
    post, path = "/api/functions/call", tag = "documents",
    request_body = crate::openapi::FunctionCallDoc,
    responses(
        (status = 200, description = "Function result under `message`"),
        (status = 400, description = "Unknown function or invalid arguments"),
        (status = 403, description = "Not permitted"),
        (status = 404, description = "Document not found")
    )
)]
pub async fn call(
    State(state): State<ServerState>,
    CurrentSession(session): CurrentSession,
    Json(body): Json<Value>,
) -> Result<Json<Message<Value>>, JsonApiError> {
    let call = FunctionCall::from_value(body)?;
    let out = functions::execute(state.store.as_ref(), &session, call).await?;
    Ok(Json(Message::new(out)))
}
