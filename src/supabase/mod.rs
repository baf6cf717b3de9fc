//! Supabase backend
//!
//! Thin clients for the two Supabase surfaces this app touches: GoTrue
//! (email/password auth, token refresh) and PostgREST (the `loans` and
//! `payments` tables). All requests carry the project's anon key; data
//! requests additionally carry the signed-in user's access token so
//! row-level security scopes every query to that user.

pub mod auth;
pub mod models;
pub mod store;

pub use auth::{AuthClient, IdentityProvider};
pub use models::{AuthUser, Loan, NewLoan, NewPaymentMark, PaymentMark, Session};
pub use store::{LoanStore, SupabaseStore};

use serde::Deserialize;
use url::Url;

use crate::error::{AppError, Result};

/// Join a path onto the project base URL, tolerating a missing trailing
/// slash on the configured base.
pub(crate) fn endpoint(base: &Url, path: &str) -> Result<Url> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        base.set_path(&format!("{}/", base.path()));
    }
    Ok(base.join(path)?)
}

/// Error body shapes returned by GoTrue and PostgREST. The two services
/// disagree on the field name, so try each in turn.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
}

impl ApiErrorBody {
    fn into_message(self) -> Option<String> {
        self.message
            .or(self.msg)
            .or(self.error_description)
            .or(self.error)
    }
}

/// Turn a non-2xx response into `AppError::Api`, salvaging whatever error
/// message the body carries.
pub(crate) async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&text)
        .ok()
        .and_then(ApiErrorBody::into_message)
        .unwrap_or(text);

    Err(AppError::Api {
        status: status.as_u16(),
        message,
    })
}
