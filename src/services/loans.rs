//! Loan management
//!
//! Validation, creation, search and payment toggling for one signed-in
//! user's loans. Every write goes straight to the store; callers refresh
//! their view from the store afterwards rather than patching local state.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::config::{MAX_NAME_LENGTH, MAX_PHONE_DIGITS, MAX_TERM_MONTHS, MIN_TERM_MONTHS};
use crate::error::{AppError, Result};
use crate::supabase::models::CreateLoanRequest;
use crate::supabase::{Loan, LoanStore, NewLoan, NewPaymentMark};

/// Where an installment ended up after a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentState {
    Paid,
    Unpaid,
}

/// Loan operations scoped to a single user.
pub struct LoansService {
    store: Arc<dyn LoanStore>,
    user_id: String,
}

impl LoansService {
    pub fn new(store: Arc<dyn LoanStore>, user_id: impl Into<String>) -> Self {
        Self {
            store,
            user_id: user_id.into(),
        }
    }

    /// All of the user's loans, newest first.
    pub async fn list(&self) -> Result<Vec<Loan>> {
        self.store.list_loans(&self.user_id).await
    }

    /// Loans whose name or phone matches `query`. An empty query matches
    /// everything.
    pub async fn search(&self, query: &str) -> Result<Vec<Loan>> {
        let loans = self.list().await?;
        Ok(filter_loans(&loans, query).into_iter().cloned().collect())
    }

    /// Validate and persist a new loan, returning the stored row.
    pub async fn create(&self, request: CreateLoanRequest) -> Result<Loan> {
        validate_loan_request(&request)?;

        let digits = normalize_phone(&request.phone);
        let new = NewLoan {
            id: Uuid::new_v4().to_string(),
            user_id: self.user_id.clone(),
            name: request.name.trim().to_string(),
            phone: if digits.is_empty() { None } else { Some(digits) },
            principal: request.principal,
            annual_rate: request.annual_rate,
            months: request.months,
            start_date: request.start_date.unwrap_or_else(|| Utc::now().date_naive()),
        };

        tracing::info!("creating loan for {}", new.name);
        self.store.insert_loan(new).await
    }

    /// Delete a loan. Its payment marks go with it (the backend cascades).
    pub async fn delete(&self, id: &str) -> Result<()> {
        tracing::info!("deleting loan {}", id);
        self.store.delete_loan(id).await
    }

    /// Flip one installment between paid and unpaid. The mark's presence
    /// in the store is the source of truth, so toggling twice always
    /// lands back where it started.
    pub async fn toggle_payment(&self, loan: &Loan, index: u32) -> Result<PaymentState> {
        if index < MIN_TERM_MONTHS || index > loan.months {
            return Err(AppError::Validation(format!(
                "installment index must be between 1 and {}",
                loan.months
            )));
        }

        match self.store.find_payment_mark(&loan.id, index).await? {
            Some(mark) => {
                self.store.delete_payment_mark(&mark.id).await?;
                tracing::info!("installment {} of loan {} is unpaid again", index, loan.id);
                Ok(PaymentState::Unpaid)
            }
            None => {
                let new = NewPaymentMark {
                    id: Uuid::new_v4().to_string(),
                    loan_id: loan.id.clone(),
                    index,
                };
                self.store.insert_payment_mark(new).await?;
                tracing::info!("installment {} of loan {} marked paid", index, loan.id);
                Ok(PaymentState::Paid)
            }
        }
    }

    /// Indexes of every paid installment of a loan, in order.
    pub async fn paid_installments(&self, loan_id: &str) -> Result<BTreeSet<u32>> {
        let marks = self.store.list_payment_marks(loan_id).await?;
        Ok(marks.into_iter().map(|mark| mark.index).collect())
    }
}

/// Case-insensitive substring match on the borrower name, plus a raw
/// substring match on the stored phone digits. The query is taken
/// verbatim: surrounding whitespace counts, and an empty query matches
/// everything.
pub fn filter_loans<'a>(loans: &'a [Loan], query: &str) -> Vec<&'a Loan> {
    if query.is_empty() {
        return loans.iter().collect();
    }

    let needle = query.to_lowercase();
    loans
        .iter()
        .filter(|loan| {
            loan.name.to_lowercase().contains(&needle)
                || loan
                    .phone
                    .as_deref()
                    .map(|phone| phone.contains(query))
                    .unwrap_or(false)
        })
        .collect()
}

/// Strip everything but digits, accepting whatever punctuation people
/// type into phone fields.
pub fn normalize_phone(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Reject a loan request before anything touches the store. Non-finite
/// numbers stop here so the schedule math never sees them.
pub fn validate_loan_request(request: &CreateLoanRequest) -> Result<()> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("name cannot be empty".to_string()));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(AppError::Validation(format!(
            "name cannot exceed {} characters",
            MAX_NAME_LENGTH
        )));
    }

    if !request.principal.is_finite() {
        return Err(AppError::Validation(
            "principal must be a finite number".to_string(),
        ));
    }
    if request.principal <= 0.0 {
        return Err(AppError::Validation(
            "principal must be greater than zero".to_string(),
        ));
    }

    if !request.annual_rate.is_finite() {
        return Err(AppError::Validation(
            "interest rate must be a finite number".to_string(),
        ));
    }
    if request.annual_rate < 0.0 {
        return Err(AppError::Validation(
            "interest rate cannot be negative".to_string(),
        ));
    }

    if request.months < MIN_TERM_MONTHS || request.months > MAX_TERM_MONTHS {
        return Err(AppError::Validation(format!(
            "term must be between {} and {} months",
            MIN_TERM_MONTHS, MAX_TERM_MONTHS
        )));
    }

    if normalize_phone(&request.phone).len() > MAX_PHONE_DIGITS {
        return Err(AppError::Validation(format!(
            "phone number can have at most {} digits",
            MAX_PHONE_DIGITS
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn named_loan(name: &str, phone: Option<&str>) -> Loan {
        Loan {
            id: format!("loan-{}", name.to_lowercase()),
            user_id: "user-1".to_string(),
            name: name.to_string(),
            phone: phone.map(str::to_string),
            principal: 1000.0,
            annual_rate: 0.0,
            months: 10,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            created_at: None,
        }
    }

    fn request() -> CreateLoanRequest {
        CreateLoanRequest {
            name: "Ana".to_string(),
            phone: "(11) 98765-4321".to_string(),
            principal: 1000.0,
            annual_rate: 12.0,
            months: 12,
            start_date: None,
        }
    }

    #[test]
    fn test_filter_matches_name_case_insensitively() {
        let loans = vec![
            named_loan("Ana", None),
            named_loan("Bruno", None),
            named_loan("Mariana", None),
        ];

        let hits = filter_loans(&loans, "an");
        let names: Vec<&str> = hits.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["Ana", "Mariana"]);

        assert_eq!(filter_loans(&loans, "BRUNO").len(), 1);
    }

    #[test]
    fn test_filter_matches_phone_digits() {
        let loans = vec![
            named_loan("Ana", Some("11987654321")),
            named_loan("Bruno", Some("21912345678")),
        ];

        let hits = filter_loans(&loans, "219");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Bruno");
    }

    #[test]
    fn test_empty_query_matches_all() {
        let loans = vec![named_loan("Ana", None), named_loan("Bruno", None)];
        assert_eq!(filter_loans(&loans, "").len(), 2);
    }

    #[test]
    fn test_filter_takes_the_query_verbatim() {
        let loans = vec![named_loan("Ana", None), named_loan("Ana Souza", None)];

        // whitespace is part of the query, not trimmed away
        let hits = filter_loans(&loans, "ana ");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Ana Souza");

        assert!(filter_loans(&loans, " ana").is_empty());
    }

    #[test]
    fn test_normalize_phone_strips_punctuation() {
        assert_eq!(normalize_phone("(11) 98765-4321"), "11987654321");
        assert_eq!(normalize_phone("+55 11 9.8765.4321"), "5511987654321");
        assert_eq!(normalize_phone("abc"), "");
    }

    #[test]
    fn test_validation_accepts_sound_request() {
        assert!(validate_loan_request(&request()).is_ok());
    }

    #[test]
    fn test_validation_rejects_blank_name() {
        let mut bad = request();
        bad.name = "   ".to_string();
        assert!(matches!(
            validate_loan_request(&bad),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_validation_rejects_non_positive_principal() {
        let mut bad = request();
        bad.principal = 0.0;
        assert!(validate_loan_request(&bad).is_err());
        bad.principal = -500.0;
        assert!(validate_loan_request(&bad).is_err());
    }

    #[test]
    fn test_validation_rejects_non_finite_numbers() {
        let mut bad = request();
        bad.principal = f64::NAN;
        assert!(validate_loan_request(&bad).is_err());

        let mut bad = request();
        bad.annual_rate = f64::INFINITY;
        assert!(validate_loan_request(&bad).is_err());
    }

    #[test]
    fn test_validation_rejects_bad_terms() {
        let mut bad = request();
        bad.months = 0;
        assert!(validate_loan_request(&bad).is_err());
        bad.months = MAX_TERM_MONTHS + 1;
        assert!(validate_loan_request(&bad).is_err());
    }

    #[test]
    fn test_validation_rejects_negative_rate() {
        let mut bad = request();
        bad.annual_rate = -1.0;
        assert!(validate_loan_request(&bad).is_err());
    }

    #[test]
    fn test_validation_rejects_overlong_phone() {
        let mut bad = request();
        bad.phone = "1".repeat(MAX_PHONE_DIGITS + 1);
        assert!(validate_loan_request(&bad).is_err());
    }
}
