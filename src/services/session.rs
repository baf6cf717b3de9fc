//! Session lifecycle
//!
//! The Supabase session is kept in the OS keyring between runs so
//! signing in is a one-time affair. Loading the session transparently
//! refreshes it when the access token is close to expiry.

use std::sync::Arc;

use keyring::Entry;

use crate::config::SESSION_REFRESH_MARGIN_SECS;
use crate::error::{AppError, Result};
use crate::supabase::{IdentityProvider, Session};

const SERVICE_NAME: &str = "lekbank";
const SESSION_KEY: &str = "session";

/// Where the session lives between runs.
pub trait SessionCache: Send + Sync {
    /// The stored session, if any.
    fn load(&self) -> Result<Option<Session>>;

    fn save(&self, session: &Session) -> Result<()>;

    fn clear(&self) -> Result<()>;
}

/// `SessionCache` backed by the platform credential store.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionStore;

impl SessionStore {
    fn entry(&self) -> Result<Entry> {
        Entry::new(SERVICE_NAME, SESSION_KEY).map_err(|e| AppError::Session(e.to_string()))
    }
}

impl SessionCache for SessionStore {
    // A stored value that no longer parses is discarded rather than
    // wedging every future command.
    fn load(&self) -> Result<Option<Session>> {
        let entry = self.entry()?;
        match entry.get_password() {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(session) => Ok(Some(session)),
                Err(e) => {
                    tracing::warn!("discarding unreadable stored session: {}", e);
                    let _ = entry.delete_credential();
                    Ok(None)
                }
            },
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(AppError::Session(e.to_string())),
        }
    }

    fn save(&self, session: &Session) -> Result<()> {
        let raw = serde_json::to_string(session)?;
        self.entry()?
            .set_password(&raw)
            .map_err(|e| AppError::Session(e.to_string()))
    }

    fn clear(&self) -> Result<()> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(AppError::Session(e.to_string())),
        }
    }
}

/// Sign-in, sign-out and session retrieval on top of the identity
/// provider and the session cache.
pub struct SessionService {
    auth: Arc<dyn IdentityProvider>,
    store: Arc<dyn SessionCache>,
}

impl SessionService {
    pub fn new(auth: Arc<dyn IdentityProvider>, store: Arc<dyn SessionCache>) -> Self {
        Self { auth, store }
    }

    /// Sign in with email and password and persist the session.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let session = self.auth.sign_in_with_password(email, password).await?;
        self.store.save(&session)?;
        Ok(session)
    }

    /// Revoke the session remotely (best effort) and forget it locally.
    pub async fn sign_out(&self) -> Result<()> {
        if let Some(session) = self.store.load()? {
            self.auth.sign_out(&session.access_token).await;
            tracing::info!("signed out user {}", session.user.id);
        }
        self.store.clear()
    }

    /// The current session, refreshing it first when the access token is
    /// within the expiry margin. Returns `None` when nobody is signed in
    /// or the server rejects the refresh token; transient errors (network,
    /// server trouble) propagate instead of discarding the session.
    pub async fn current(&self) -> Result<Option<Session>> {
        let Some(session) = self.store.load()? else {
            return Ok(None);
        };

        if !session.expires_within(SESSION_REFRESH_MARGIN_SECS) {
            return Ok(Some(session));
        }

        tracing::debug!("access token near expiry, refreshing");
        match self.auth.refresh(&session.refresh_token).await {
            Ok(fresh) => {
                self.store.save(&fresh)?;
                Ok(Some(fresh))
            }
            Err(AppError::Api { status, message }) => {
                tracing::warn!("refresh rejected ({}): {}; signing out locally", status, message);
                self.store.clear()?;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
