//! Loan persistence via PostgREST
//!
//! `LoanStore` is the seam between the services and the backend: the
//! production implementation talks to `/rest/v1/loans` and
//! `/rest/v1/payments`, tests substitute an in-memory store. Row-level
//! security enforces per-user scoping server side; the `user_id` filter
//! on reads keeps queries honest even without it.

use async_trait::async_trait;
use url::Url;

use super::models::{Loan, NewLoan, NewPaymentMark, PaymentMark};
use super::{check_response, endpoint};
use crate::config::{Config, USER_AGENT};
use crate::error::{AppError, Result};

/// Storage contract for loans and their payment marks.
#[async_trait]
pub trait LoanStore: Send + Sync {
    /// All loans belonging to `user_id`, newest first.
    async fn list_loans(&self, user_id: &str) -> Result<Vec<Loan>>;

    /// Persist a new loan and return the stored row.
    async fn insert_loan(&self, new: NewLoan) -> Result<Loan>;

    /// Delete a loan by id. `LoanNotFound` when no row matched.
    async fn delete_loan(&self, id: &str) -> Result<()>;

    /// The mark for one installment of one loan, if present.
    async fn find_payment_mark(&self, loan_id: &str, index: u32) -> Result<Option<PaymentMark>>;

    /// Every mark recorded for a loan.
    async fn list_payment_marks(&self, loan_id: &str) -> Result<Vec<PaymentMark>>;

    /// Record an installment as paid and return the stored row.
    async fn insert_payment_mark(&self, new: NewPaymentMark) -> Result<PaymentMark>;

    /// Remove a mark by id, flipping its installment back to unpaid.
    async fn delete_payment_mark(&self, id: &str) -> Result<()>;
}

/// `LoanStore` backed by the Supabase REST API, authenticated as one user.
#[derive(Debug, Clone)]
pub struct SupabaseStore {
    http: reqwest::Client,
    loans_url: Url,
    payments_url: Url,
    anon_key: String,
    access_token: String,
}

impl SupabaseStore {
    pub fn new(http: reqwest::Client, config: &Config, access_token: &str) -> Result<Self> {
        Ok(Self {
            http,
            loans_url: endpoint(&config.supabase_url, "rest/v1/loans")?,
            payments_url: endpoint(&config.supabase_url, "rest/v1/payments")?,
            anon_key: config.supabase_anon_key.clone(),
            access_token: access_token.to_string(),
        })
    }

    fn with_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("apikey", &self.anon_key)
            .header("User-Agent", USER_AGENT)
            .bearer_auth(&self.access_token)
    }
}

#[async_trait]
impl LoanStore for SupabaseStore {
    async fn list_loans(&self, user_id: &str) -> Result<Vec<Loan>> {
        let mut url = self.loans_url.clone();
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("user_id", &format!("eq.{}", user_id))
            .append_pair("order", "created_at.desc");

        let response = self.with_auth(self.http.get(url)).send().await?;
        let loans: Vec<Loan> = check_response(response).await?.json().await?;
        tracing::debug!("fetched {} loans", loans.len());
        Ok(loans)
    }

    async fn insert_loan(&self, new: NewLoan) -> Result<Loan> {
        let response = self
            .with_auth(self.http.post(self.loans_url.clone()))
            .header("Prefer", "return=representation")
            .json(&[&new])
            .send()
            .await?;

        let mut rows: Vec<Loan> = check_response(response).await?.json().await?;
        rows.pop()
            .ok_or_else(|| AppError::Generic("loan insert returned no rows".to_string()))
    }

    async fn delete_loan(&self, id: &str) -> Result<()> {
        let mut url = self.loans_url.clone();
        url.query_pairs_mut()
            .append_pair("id", &format!("eq.{}", id));

        let response = self
            .with_auth(self.http.delete(url))
            .header("Prefer", "return=representation")
            .send()
            .await?;

        let rows: Vec<Loan> = check_response(response).await?.json().await?;
        if rows.is_empty() {
            return Err(AppError::LoanNotFound(id.to_string()));
        }
        Ok(())
    }

    async fn find_payment_mark(&self, loan_id: &str, index: u32) -> Result<Option<PaymentMark>> {
        let mut url = self.payments_url.clone();
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("loan_id", &format!("eq.{}", loan_id))
            .append_pair("index", &format!("eq.{}", index))
            .append_pair("limit", "1");

        let response = self.with_auth(self.http.get(url)).send().await?;
        let marks: Vec<PaymentMark> = check_response(response).await?.json().await?;
        Ok(marks.into_iter().next())
    }

    async fn list_payment_marks(&self, loan_id: &str) -> Result<Vec<PaymentMark>> {
        let mut url = self.payments_url.clone();
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("loan_id", &format!("eq.{}", loan_id));

        let response = self.with_auth(self.http.get(url)).send().await?;
        let marks = check_response(response).await?.json().await?;
        Ok(marks)
    }

    async fn insert_payment_mark(&self, new: NewPaymentMark) -> Result<PaymentMark> {
        let response = self
            .with_auth(self.http.post(self.payments_url.clone()))
            .header("Prefer", "return=representation")
            .json(&[&new])
            .send()
            .await?;

        let mut rows: Vec<PaymentMark> = check_response(response).await?.json().await?;
        rows.pop()
            .ok_or_else(|| AppError::Generic("payment insert returned no rows".to_string()))
    }

    async fn delete_payment_mark(&self, id: &str) -> Result<()> {
        let mut url = self.payments_url.clone();
        url.query_pairs_mut()
            .append_pair("id", &format!("eq.{}", id));

        let response = self
            .with_auth(self.http.delete(url))
            .header("Prefer", "return=representation")
            .send()
            .await?;

        let rows: Vec<PaymentMark> = check_response(response).await?.json().await?;
        if rows.is_empty() {
            return Err(AppError::Generic("payment mark not found".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            supabase_url: Url::parse("https://example.supabase.co").unwrap(),
            supabase_anon_key: "anon".to_string(),
            country_code: "55".to_string(),
        }
    }

    #[test]
    fn test_store_builds_table_endpoints() {
        let store = SupabaseStore::new(reqwest::Client::new(), &test_config(), "token").unwrap();
        assert_eq!(
            store.loans_url.as_str(),
            "https://example.supabase.co/rest/v1/loans"
        );
        assert_eq!(
            store.payments_url.as_str(),
            "https://example.supabase.co/rest/v1/payments"
        );
    }

    #[test]
    fn test_filter_query_encoding() {
        let mut url = Url::parse("https://example.supabase.co/rest/v1/loans").unwrap();
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("user_id", "eq.user-1")
            .append_pair("order", "created_at.desc");

        assert_eq!(
            url.query(),
            Some("select=*&user_id=eq.user-1&order=created_at.desc")
        );
    }
}
