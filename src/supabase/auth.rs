//! GoTrue auth client
//!
//! Email/password sign-in, token refresh, and sign-out against the
//! project's `/auth/v1` endpoints. `IdentityProvider` is the seam
//! between the session service and the backend, mirroring `LoanStore`:
//! the production implementation talks to GoTrue, tests substitute a
//! canned one.

use async_trait::async_trait;
use serde_json::json;
use url::Url;

use super::models::Session;
use super::{check_response, endpoint};
use crate::config::{Config, DEFAULT_TOKEN_TTL_SECS, USER_AGENT};
use crate::error::Result;

/// Token grants and revocation, as the session service consumes them.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchange email/password credentials for a session.
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session>;

    /// Trade a refresh token for a fresh session.
    async fn refresh(&self, refresh_token: &str) -> Result<Session>;

    /// Revoke the session server side. Failures are logged and swallowed:
    /// the local session is cleared either way.
    async fn sign_out(&self, access_token: &str);
}

/// `IdentityProvider` backed by the Supabase auth endpoints.
#[derive(Debug, Clone)]
pub struct AuthClient {
    http: reqwest::Client,
    base: Url,
    anon_key: String,
}

impl AuthClient {
    pub fn new(http: reqwest::Client, config: &Config) -> Self {
        Self {
            http,
            base: config.supabase_url.clone(),
            anon_key: config.supabase_anon_key.clone(),
        }
    }

    /// GoTrue does not always include `expires_at`; derive it from
    /// `expires_in` so expiry checks have something to work with.
    fn resolve_expiry(&self, mut session: Session) -> Session {
        if session.expires_at.is_none() {
            let ttl = session.expires_in.unwrap_or(DEFAULT_TOKEN_TTL_SECS);
            session.expires_at = Some(chrono::Utc::now().timestamp() + ttl);
        }
        session
    }
}

#[async_trait]
impl IdentityProvider for AuthClient {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        tracing::debug!("requesting password grant for {}", email);

        let mut url = endpoint(&self.base, "auth/v1/token")?;
        url.set_query(Some("grant_type=password"));

        let response = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .header("User-Agent", USER_AGENT)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        let session: Session = check_response(response).await?.json().await?;
        tracing::info!("signed in as user {}", session.user.id);
        Ok(self.resolve_expiry(session))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Session> {
        tracing::debug!("refreshing access token");

        let mut url = endpoint(&self.base, "auth/v1/token")?;
        url.set_query(Some("grant_type=refresh_token"));

        let response = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .header("User-Agent", USER_AGENT)
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await?;

        let session: Session = check_response(response).await?.json().await?;
        Ok(self.resolve_expiry(session))
    }

    async fn sign_out(&self, access_token: &str) {
        let url = match endpoint(&self.base, "auth/v1/logout") {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("skipping remote sign-out: {}", e);
                return;
            }
        };

        let result = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .header("User-Agent", USER_AGENT)
            .bearer_auth(access_token)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                tracing::debug!("remote session revoked");
            }
            Ok(response) => {
                tracing::warn!("remote sign-out returned {}", response.status());
            }
            Err(e) => {
                tracing::warn!("remote sign-out failed: {}", e);
            }
        }
    }
}
