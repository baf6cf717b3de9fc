//! Rows and payloads exchanged with Supabase
//!
//! Field names match the remote columns one to one so serde needs no
//! renaming. Monetary values stay `f64` end to end; formatting happens
//! only at the display edge.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A loan row from the `loans` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loan {
    pub id: String,
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub principal: f64,
    pub annual_rate: f64,
    pub months: u32,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Insert payload for the `loans` table. The id is generated client side
/// so callers can refer to the loan before the round trip completes.
#[derive(Debug, Clone, Serialize)]
pub struct NewLoan {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub phone: Option<String>,
    pub principal: f64,
    pub annual_rate: f64,
    pub months: u32,
    pub start_date: NaiveDate,
}

/// A row from the `payments` table: installment `index` of loan `loan_id`
/// has been settled. Presence of the row is the whole signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentMark {
    pub id: String,
    pub loan_id: String,
    pub index: u32,
}

/// Insert payload for the `payments` table.
#[derive(Debug, Clone, Serialize)]
pub struct NewPaymentMark {
    pub id: String,
    pub loan_id: String,
    pub index: u32,
}

/// User-supplied fields for a new loan, before validation.
#[derive(Debug, Clone)]
pub struct CreateLoanRequest {
    pub name: String,
    pub phone: String,
    pub principal: f64,
    pub annual_rate: f64,
    pub months: u32,
    pub start_date: Option<NaiveDate>,
}

/// The signed-in user, as GoTrue reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// A GoTrue session: the pair of tokens plus their expiry. Serialized as
/// is into the OS keyring between runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: AuthUser,
}

impl Session {
    /// True when the access token expires within `margin_secs` from now
    /// (or the expiry is unknown, which is treated as already stale).
    pub fn expires_within(&self, margin_secs: i64) -> bool {
        match self.expires_at {
            Some(at) => Utc::now().timestamp() + margin_secs >= at,
            None => true,
        }
    }
}
