//! Service-level tests against an in-memory store.
//!
//! `FakeStore` implements `LoanStore` with the same observable behavior
//! as the REST backend (newest-first listing, not-found on empty
//! deletes, cascading removal of payment marks), so the services can be
//! exercised end to end without a network.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};

use lekbank::error::{AppError, Result};
use lekbank::services::loans::LoansService;
use lekbank::services::PaymentState;
use lekbank::supabase::models::CreateLoanRequest;
use lekbank::supabase::{Loan, LoanStore, NewLoan, NewPaymentMark, PaymentMark};

#[derive(Default)]
struct FakeState {
    loans: Vec<Loan>,
    marks: Vec<PaymentMark>,
    loan_inserts: usize,
}

/// In-memory stand-in for the Supabase tables.
#[derive(Default)]
struct FakeStore {
    state: Mutex<FakeState>,
}

impl FakeStore {
    fn loan_inserts(&self) -> usize {
        self.state.lock().unwrap().loan_inserts
    }

    fn mark_count(&self) -> usize {
        self.state.lock().unwrap().marks.len()
    }
}

#[async_trait]
impl LoanStore for FakeStore {
    async fn list_loans(&self, user_id: &str) -> Result<Vec<Loan>> {
        let state = self.state.lock().unwrap();
        let mut loans: Vec<Loan> = state
            .loans
            .iter()
            .filter(|loan| loan.user_id == user_id)
            .cloned()
            .collect();
        // stored oldest first; the backend orders by created_at desc
        loans.reverse();
        Ok(loans)
    }

    async fn insert_loan(&self, new: NewLoan) -> Result<Loan> {
        let mut state = self.state.lock().unwrap();
        state.loan_inserts += 1;

        let loan = Loan {
            id: new.id,
            user_id: new.user_id,
            name: new.name,
            phone: new.phone,
            principal: new.principal,
            annual_rate: new.annual_rate,
            months: new.months,
            start_date: new.start_date,
            created_at: Some(Utc::now()),
        };
        state.loans.push(loan.clone());
        Ok(loan)
    }

    async fn delete_loan(&self, id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let before = state.loans.len();
        state.loans.retain(|loan| loan.id != id);
        if state.loans.len() == before {
            return Err(AppError::LoanNotFound(id.to_string()));
        }
        state.marks.retain(|mark| mark.loan_id != id);
        Ok(())
    }

    async fn find_payment_mark(&self, loan_id: &str, index: u32) -> Result<Option<PaymentMark>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .marks
            .iter()
            .find(|mark| mark.loan_id == loan_id && mark.index == index)
            .cloned())
    }

    async fn list_payment_marks(&self, loan_id: &str) -> Result<Vec<PaymentMark>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .marks
            .iter()
            .filter(|mark| mark.loan_id == loan_id)
            .cloned()
            .collect())
    }

    async fn insert_payment_mark(&self, new: NewPaymentMark) -> Result<PaymentMark> {
        let mut state = self.state.lock().unwrap();
        let mark = PaymentMark {
            id: new.id,
            loan_id: new.loan_id,
            index: new.index,
        };
        state.marks.push(mark.clone());
        Ok(mark)
    }

    async fn delete_payment_mark(&self, id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let before = state.marks.len();
        state.marks.retain(|mark| mark.id != id);
        if state.marks.len() == before {
            return Err(AppError::Generic("payment mark not found".to_string()));
        }
        Ok(())
    }
}

fn service(store: &Arc<FakeStore>, user_id: &str) -> LoansService {
    LoansService::new(store.clone() as Arc<dyn LoanStore>, user_id)
}

fn request(name: &str, phone: &str) -> CreateLoanRequest {
    CreateLoanRequest {
        name: name.to_string(),
        phone: phone.to_string(),
        principal: 1000.0,
        annual_rate: 12.0,
        months: 12,
        start_date: NaiveDate::from_ymd_opt(2024, 1, 15),
    }
}

#[tokio::test]
async fn test_create_stores_normalized_loan() {
    let store = Arc::new(FakeStore::default());
    let loans = service(&store, "user-1");

    let created = loans
        .create(request("  Ana  ", "(11) 98765-4321"))
        .await
        .unwrap();

    assert_eq!(created.name, "Ana");
    assert_eq!(created.phone.as_deref(), Some("11987654321"));
    assert_eq!(created.user_id, "user-1");
    assert_eq!(
        created.start_date,
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    );

    let listed = loans.list().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, created.id);
}

#[tokio::test]
async fn test_create_defaults_start_date_to_today() {
    let store = Arc::new(FakeStore::default());
    let loans = service(&store, "user-1");

    let mut req = request("Ana", "");
    req.start_date = None;
    let created = loans.create(req).await.unwrap();

    assert_eq!(created.start_date, Utc::now().date_naive());
    assert!(created.phone.is_none(), "empty phone stays unset");
}

#[tokio::test]
async fn test_list_is_newest_first() {
    let store = Arc::new(FakeStore::default());
    let loans = service(&store, "user-1");

    loans.create(request("Ana", "")).await.unwrap();
    loans.create(request("Bruno", "")).await.unwrap();

    let listed = loans.list().await.unwrap();
    let names: Vec<&str> = listed.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, vec!["Bruno", "Ana"]);
}

#[tokio::test]
async fn test_loans_are_scoped_per_user() {
    let store = Arc::new(FakeStore::default());
    let mine = service(&store, "user-1");
    let theirs = service(&store, "user-2");

    mine.create(request("Ana", "")).await.unwrap();
    theirs.create(request("Bruno", "")).await.unwrap();

    let my_loans = mine.list().await.unwrap();
    assert_eq!(my_loans.len(), 1);
    assert_eq!(my_loans[0].name, "Ana");

    let their_loans = theirs.list().await.unwrap();
    assert_eq!(their_loans.len(), 1);
    assert_eq!(their_loans[0].name, "Bruno");
}

#[tokio::test]
async fn test_search_matches_names_and_phones() {
    let store = Arc::new(FakeStore::default());
    let loans = service(&store, "user-1");

    loans.create(request("Ana", "11911111111")).await.unwrap();
    loans.create(request("Bruno", "21922222222")).await.unwrap();
    loans.create(request("Mariana", "")).await.unwrap();

    let hits = loans.search("an").await.unwrap();
    let names: Vec<&str> = hits.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, vec!["Mariana", "Ana"]);

    let hits = loans.search("219").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name, "Bruno");

    assert_eq!(loans.search("").await.unwrap().len(), 3);
    assert_eq!(loans.search("zelda").await.unwrap().len(), 0);
}

#[tokio::test]
async fn test_toggle_payment_roundtrip() {
    let store = Arc::new(FakeStore::default());
    let loans = service(&store, "user-1");
    let loan = loans.create(request("Ana", "")).await.unwrap();

    let state = loans.toggle_payment(&loan, 3).await.unwrap();
    assert_eq!(state, PaymentState::Paid);

    let paid = loans.paid_installments(&loan.id).await.unwrap();
    assert!(paid.contains(&3));
    assert_eq!(paid.len(), 1);

    let state = loans.toggle_payment(&loan, 3).await.unwrap();
    assert_eq!(state, PaymentState::Unpaid);

    let paid = loans.paid_installments(&loan.id).await.unwrap();
    assert!(paid.is_empty(), "double toggle must leave no residue");
    assert_eq!(store.mark_count(), 0);
}

#[tokio::test]
async fn test_toggle_rejects_out_of_range_indexes() {
    let store = Arc::new(FakeStore::default());
    let loans = service(&store, "user-1");
    let loan = loans.create(request("Ana", "")).await.unwrap();

    assert!(matches!(
        loans.toggle_payment(&loan, 0).await,
        Err(AppError::Validation(_))
    ));
    assert!(matches!(
        loans.toggle_payment(&loan, loan.months + 1).await,
        Err(AppError::Validation(_))
    ));
    assert_eq!(store.mark_count(), 0);
}

#[tokio::test]
async fn test_validation_failure_never_reaches_the_store() {
    let store = Arc::new(FakeStore::default());
    let loans = service(&store, "user-1");

    let mut bad = request("Ana", "");
    bad.principal = f64::NAN;
    assert!(loans.create(bad).await.is_err());

    let mut bad = request("", "");
    bad.name = "".to_string();
    assert!(loans.create(bad).await.is_err());

    assert_eq!(store.loan_inserts(), 0);
}

#[tokio::test]
async fn test_delete_loan_and_its_marks() {
    let store = Arc::new(FakeStore::default());
    let loans = service(&store, "user-1");
    let loan = loans.create(request("Ana", "")).await.unwrap();

    loans.toggle_payment(&loan, 1).await.unwrap();
    loans.toggle_payment(&loan, 2).await.unwrap();
    assert_eq!(store.mark_count(), 2);

    loans.delete(&loan.id).await.unwrap();
    assert!(loans.list().await.unwrap().is_empty());
    assert_eq!(store.mark_count(), 0, "marks cascade with the loan");
}

#[tokio::test]
async fn test_delete_missing_loan_is_an_error() {
    let store = Arc::new(FakeStore::default());
    let loans = service(&store, "user-1");

    assert!(matches!(
        loans.delete("no-such-loan").await,
        Err(AppError::LoanNotFound(_))
    ));
}
