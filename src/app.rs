//! Application state and orchestration
//!
//! `App` wires configuration, auth, storage and reminders together and
//! owns the in-memory `AppState`. State never mutates ad hoc: every
//! change is a discrete `AppEvent` applied in one place, which keeps the
//! session/loan lifecycle easy to follow. After any write the loan list
//! is reloaded from the backend rather than patched locally, so the
//! state always mirrors what the server holds.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::services::loans::filter_loans;
use crate::services::reminders::ReminderView;
use crate::services::schedule::{self, Schedule};
use crate::services::{LoansService, PaymentState, ReminderService, SessionService, SessionStore};
use crate::supabase::models::CreateLoanRequest;
use crate::supabase::{AuthClient, AuthUser, Loan, Session, SupabaseStore};

/// A state transition. Everything that can change `AppState` is named
/// here.
#[derive(Debug)]
pub enum AppEvent {
    SessionAcquired(Session),
    SessionCleared,
    LoansLoaded(Vec<Loan>),
}

/// What the app knows right now: who is signed in and their loans.
#[derive(Debug, Default)]
pub struct AppState {
    session: Option<Session>,
    loans: Vec<Loan>,
}

impl AppState {
    pub fn apply(&mut self, event: AppEvent) {
        match event {
            AppEvent::SessionAcquired(session) => {
                self.session = Some(session);
            }
            AppEvent::SessionCleared => {
                self.session = None;
                self.loans.clear();
            }
            AppEvent::LoansLoaded(loans) => {
                self.loans = loans;
            }
        }
    }

    pub fn session(&self) -> Result<&Session> {
        self.session.as_ref().ok_or(AppError::NotSignedIn)
    }

    pub fn loans(&self) -> &[Loan] {
        &self.loans
    }

    pub fn find_loan(&self, id: &str) -> Option<&Loan> {
        self.loans.iter().find(|loan| loan.id == id)
    }
}

/// A loan with its computed schedule and the set of paid installment
/// indexes, ready for rendering.
#[derive(Debug, Serialize)]
pub struct LoanScheduleView {
    pub loan: Loan,
    pub schedule: Schedule,
    pub paid: BTreeSet<u32>,
}

/// The application root. Commands drive everything through here.
pub struct App {
    config: Config,
    http: reqwest::Client,
    sessions: SessionService,
    reminders: ReminderService,
    state: AppState,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let http = reqwest::Client::builder().build()?;
        let auth = AuthClient::new(http.clone(), &config);
        let sessions = SessionService::new(Arc::new(auth), Arc::new(SessionStore));
        let reminders = ReminderService::new(config.country_code.clone());

        Ok(Self {
            config,
            http,
            sessions,
            reminders,
            state: AppState::default(),
        })
    }

    /// Pick up the stored session, if there is a usable one, and load
    /// the user's loans. Returns whether someone is signed in.
    pub async fn restore_session(&mut self) -> Result<bool> {
        match self.sessions.current().await? {
            Some(session) => {
                self.state.apply(AppEvent::SessionAcquired(session));
                self.reload_loans().await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Sign in and immediately load the user's loans.
    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<()> {
        let session = self.sessions.sign_in(email, password).await?;
        self.state.apply(AppEvent::SessionAcquired(session));
        self.reload_loans().await?;
        Ok(())
    }

    /// Sign out and drop everything the session was showing.
    pub async fn sign_out(&mut self) -> Result<()> {
        self.sessions.sign_out().await?;
        self.state.apply(AppEvent::SessionCleared);
        Ok(())
    }

    pub fn current_user(&self) -> Result<&AuthUser> {
        Ok(&self.state.session()?.user)
    }

    /// Loans currently in state, filtered by `query`.
    pub fn list_view(&self, query: &str) -> Vec<&Loan> {
        filter_loans(self.state.loans(), query)
    }

    /// Fetch the loan list from the backend and swap it into state.
    pub async fn reload_loans(&mut self) -> Result<()> {
        let loans = self.loans_service()?.list().await?;
        self.state.apply(AppEvent::LoansLoaded(loans));
        Ok(())
    }

    /// A fresh copy of one loan, straight from the backend.
    pub async fn lookup_loan(&mut self, loan_id: &str) -> Result<Loan> {
        self.reload_loans().await?;
        self.state
            .find_loan(loan_id)
            .cloned()
            .ok_or_else(|| AppError::LoanNotFound(loan_id.to_string()))
    }

    pub async fn add_loan(&mut self, request: CreateLoanRequest) -> Result<Loan> {
        let loan = self.loans_service()?.create(request).await?;
        self.reload_loans().await?;
        Ok(loan)
    }

    pub async fn remove_loan(&mut self, loan_id: &str) -> Result<()> {
        self.loans_service()?.delete(loan_id).await?;
        self.reload_loans().await?;
        Ok(())
    }

    pub async fn toggle_payment(&mut self, loan_id: &str, index: u32) -> Result<PaymentState> {
        let loan = self.lookup_loan(loan_id).await?;
        let outcome = self.loans_service()?.toggle_payment(&loan, index).await?;
        self.reload_loans().await?;
        Ok(outcome)
    }

    /// Everything needed to print a loan's schedule.
    pub async fn schedule_view(&mut self, loan_id: &str) -> Result<LoanScheduleView> {
        let loan = self.lookup_loan(loan_id).await?;
        let paid = self.loans_service()?.paid_installments(&loan.id).await?;
        let schedule = schedule::compute_schedule(&loan);
        Ok(LoanScheduleView {
            loan,
            schedule,
            paid,
        })
    }

    pub async fn payment_reminder(&mut self, loan_id: &str) -> Result<ReminderView> {
        let loan = self.lookup_loan(loan_id).await?;
        self.reminders.payment_reminder(&loan)
    }

    /// A loans service bound to the signed-in user's token.
    fn loans_service(&self) -> Result<LoansService> {
        let session = self.state.session()?;
        let store = SupabaseStore::new(self.http.clone(), &self.config, &session.access_token)?;
        Ok(LoansService::new(Arc::new(store), session.user.id.clone()))
    }
}
