//! Bearer sessions: the transport's mapping from a token to a caller identity.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use crate::api::response::ApiError;
use crate::storage::models::Identity;
use crate::AppState;

/// Ten years; longer TTLs are clamped.
const MAX_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

struct Session {
    identity: Identity,
    expires_at: DateTime<Utc>,
}

pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl: Duration::seconds(ttl_secs.min(MAX_TTL_SECS) as i64),
        }
    }

    /// Open a session for `identity`, returning its token and expiry.
    pub async fn create(&self, identity: Identity) -> (String, DateTime<Utc>) {
        let token = uuid::Uuid::new_v4().simple().to_string();
        let now = Utc::now();
        let expires_at = now + self.ttl;

        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, s| s.expires_at > now);
        sessions.insert(
            token.clone(),
            Session {
                identity,
                expires_at,
            },
        );

        (token, expires_at)
    }

    /// Identity behind a live token
    pub async fn resolve(&self, token: &str) -> Option<Identity> {
        let sessions = self.sessions.read().await;
        sessions
            .get(token)
            .filter(|s| s.expires_at > Utc::now())
            .map(|s| s.identity.clone())
    }

    pub async fn revoke(&self, token: &str) -> bool {
        self.sessions.write().await.remove(token).is_some()
    }
}

/// The caller of a request. Without an `Authorization` header the caller is
/// anonymous; a bearer token must name a live session.
pub struct Caller {
    pub identity: Identity,
    pub token: Option<String>,
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, ApiError> {
        let Some(value) = parts.headers.get(header::AUTHORIZATION) else {
            return Ok(Caller {
                identity: Identity::anonymous(),
                token: None,
            });
        };

        let token = value
            .to_str()
            .ok()
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                ApiError::unauthenticated("Malformed Authorization header, expected 'Bearer <token>'")
            })?;

        let identity = state
            .sessions
            .resolve(token)
            .await
            .ok_or_else(|| ApiError::unauthenticated("Session is invalid or has expired"))?;

        Ok(Caller {
            identity,
            token: Some(token.to_string()),
        })
    }
}
