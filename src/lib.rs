//! Personal loan tracking with WhatsApp reminders.
//!
//! Loans live in a Supabase project (auth plus two tables); this crate
//! is the client side: schedule math, payment marks, reminder links and
//! the CLI that drives it all.

pub mod app;
pub mod commands;
pub mod config;
pub mod error;
pub mod money;
pub mod services;
pub mod supabase;

pub use app::App;
pub use config::Config;
pub use error::{AppError, Result};
