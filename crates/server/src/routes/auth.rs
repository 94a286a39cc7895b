use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts, HeaderMap};
use axum_extra::extract::cookie::CookieJar;

use configs::RosterConfig;
use service::roster::RosterService;
use service::{runtime, DocumentStore, Session, SessionTokens};

use crate::errors::JsonApiError;

/// Cookie carrying the session token for browser clients.
pub const AUTH_COOKIE: &str = "auth_token";

#[derive(Clone)]
pub struct ServerState {
    pub store: Arc<dyn DocumentStore>,
    pub tokens: SessionTokens,
    pub roster: Arc<RosterService<dyn DocumentStore>>,
}

impl ServerState {
    pub fn new(store: Arc<dyn DocumentStore>, tokens: SessionTokens, roster: RosterConfig) -> Self {
        let roster = Arc::new(RosterService::new(Arc::clone(&store), roster));
        Self { store, tokens, roster }
    }
}

/// Session of the signed-in caller, resolved from `Authorization: Bearer` or the
/// `auth_token` cookie.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Session);

fn bearer(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    value.strip_prefix("Bearer ").map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

#[async_trait]
impl FromRequestParts<ServerState> for CurrentSession {
    type Rejection = JsonApiError;

    async fn from_request_parts(parts: &mut Parts, state: &ServerState) -> Result<Self, Self::Rejection> {
        let token = bearer(&parts.headers)
            .or_else(|| CookieJar::from_headers(&parts.headers).get(AUTH_COOKIE).map(|c| c.value().to_string()))
            .ok_or_else(|| JsonApiError::unauthorized("missing bearer token or auth_token cookie"))?;
        let session = runtime::resolve_session(state.store.as_ref(), &state.tokens, &token).await?;
        Ok(CurrentSession(session))
    }
}
