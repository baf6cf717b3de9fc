//! Service layer
//!
//! Business logic between the CLI commands and the Supabase backend:
//! schedule math, loan management, session lifecycle, and reminder
//! message building.

pub mod loans;
pub mod reminders;
pub mod schedule;
pub mod session;

pub use loans::{LoansService, PaymentState};
pub use reminders::ReminderService;
pub use session::{SessionCache, SessionService, SessionStore};
