//! Caller identity passed explicitly into every store call, and the signed
//! tokens the HTTP layer turns into one.

use std::collections::HashSet;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::ServiceError;
use crate::record::Record;
use crate::user;

pub const ADMINISTRATOR: &str = "Administrator";
pub const GUEST: &str = "Guest";
pub const SYSTEM_MANAGER: &str = "System Manager";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user: String,
    pub roles: HashSet<String>,
}

impl Session {
    pub fn new<I, R>(user: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        Self { user: user.into(), roles: roles.into_iter().map(Into::into).collect() }
    }

    /// Identity used for internal lookups (session resolution, seeding).
    pub fn system() -> Self {
        Self::new(ADMINISTRATOR, [ADMINISTRATOR, SYSTEM_MANAGER])
    }

    pub fn guest() -> Self {
        Self::new(GUEST, [GUEST])
    }

    /// Build the session for a loaded `User` record.
    pub fn for_user(record: &Record) -> Self {
        if record.name == ADMINISTRATOR {
            return Self::system();
        }
        Self::new(record.name.clone(), user::roles(record))
    }

    pub fn is_guest(&self) -> bool {
        self.user == GUEST
    }

    /// Administrator holds every role.
    pub fn has_role(&self, role: &str) -> bool {
        self.user == ADMINISTRATOR || self.roles.contains(role)
    }

    /// Bypasses doctype permissions.
    pub fn is_privileged(&self) -> bool {
        self.user == ADMINISTRATOR || self.roles.contains(SYSTEM_MANAGER)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub iat: usize,
}

/// HS256 token issuer/verifier.
#[derive(Clone)]
pub struct SessionTokens {
    secret: String,
    ttl: Duration,
}

impl SessionTokens {
    pub fn new(secret: impl Into<String>, ttl_hours: i64) -> Self {
        Self { secret: secret.into(), ttl: Duration::hours(ttl_hours) }
    }

    pub fn issue(&self, user: &str) -> Result<String, ServiceError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.to_string(),
            iat: now.timestamp() as usize,
            exp: (now + self.ttl).timestamp() as usize,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(self.secret.as_bytes()))
            .map_err(|e| ServiceError::Internal(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, ServiceError> {
        let data = decode::<Claims>(token, &DecodingKey::from_secret(self.secret.as_bytes()), &Validation::default())
            .map_err(|e| {
                debug!(error = %e, "token rejected");
                ServiceError::Unauthorized("invalid or expired token".into())
            })?;
        Ok(data.claims)
    }
}
