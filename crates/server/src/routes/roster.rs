use axum::{extract::State, Json};
use serde::Deserialize;
use tracing::info;

use common::types::Message;
use service::roster::domain::{OnboardOutcome, RosterEntry, UsersParam};

use super::auth::{CurrentSession, ServerState};
use crate::errors::JsonApiError;

#[derive(Debug, Deserialize)]
pub struct OnboardRequest {
    pub users: UsersParam,
}

#[utoipa::path(
    get, path = "/api/method/roster.users.list", tag = "roster",
    responses(
        (status = 200, description = "Roster entries ordered by full name", body = crate::openapi::RosterListDoc),
        (status = 401, description = "Not signed in"),
        (status = 403, description = "Missing designated role or roster profile")
    )
)]
pub async fn list_users(
    State(state): State<ServerState>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<Message<Vec<RosterEntry>>>, JsonApiError> {
    let users = state.roster.list_users(&session).await?;
    Ok(Json(Message::new(users)))
}

#[utoipa::path(
    post, path = "/api/method/roster.users.onboard", tag = "roster",
    request_body = crate::openapi::OnboardRequestDoc,
    responses(
        (status = 200, description = "Per-user outcome", body = crate::openapi::OnboardOutcomeDoc),
        (status = 400, description = "Malformed users list"),
        (status = 401, description = "Not signed in"),
        (status = 403, description = "Not permitted to change users")
    )
)]
pub async fn onboard_users(
    State(state): State<ServerState>,
    CurrentSession(session): CurrentSession,
    Json(req): Json<OnboardRequest>,
) -> Result<Json<Message<OnboardOutcome>>, JsonApiError> {
    let users = req.users.into_list().map_err(|e| JsonApiError::bad_request(format!("users: {e}")))?;
    info!(caller = %session.user, count = users.len(), "onboarding users");
    let outcome = state.roster.onboard_users(&session, users).await?;
    Ok(Json(Message::new(outcome)))
}
