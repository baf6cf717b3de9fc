//! CLI surface
//!
//! One subcommand per user action, each a thin wrapper that drives the
//! `App` and prints the outcome. Anything beyond argument handling and
//! output belongs in the services.

pub mod auth;
pub mod loans;
pub mod payments;
pub mod reminders;

use clap::{Parser, Subcommand};

use crate::app::App;
use crate::config::Config;
use crate::error::{AppError, Result};

#[derive(Debug, Parser)]
#[command(
    name = "lekbank",
    version,
    about = "Track personal loans and nudge late payers on WhatsApp"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in with your email and password
    Login(auth::LoginArgs),
    /// Sign out and forget the stored session
    Logout,
    /// Show who is signed in
    Whoami,
    /// Register a new loan
    Add(loans::AddArgs),
    /// List loans, optionally filtered by name or phone
    List(loans::ListArgs),
    /// Print a loan's installment schedule
    Schedule(loans::ScheduleArgs),
    /// Toggle an installment between paid and unpaid
    Mark(payments::MarkArgs),
    /// Remove a loan and its payment history
    Remove(loans::RemoveArgs),
    /// Build the WhatsApp reminder for a loan
    Remind(reminders::RemindArgs),
}

/// Dispatch a parsed command line.
pub async fn run(cli: Cli) -> Result<()> {
    let config = Config::from_env()?;
    let mut app = App::new(config)?;

    match cli.command {
        Command::Login(args) => auth::login(&mut app, args).await,
        Command::Logout => auth::logout(&mut app).await,
        Command::Whoami => auth::whoami(&mut app).await,
        Command::Add(args) => loans::add(&mut app, args).await,
        Command::List(args) => loans::list(&mut app, args).await,
        Command::Schedule(args) => loans::schedule(&mut app, args).await,
        Command::Mark(args) => payments::mark(&mut app, args).await,
        Command::Remove(args) => loans::remove(&mut app, args).await,
        Command::Remind(args) => reminders::remind(&mut app, args).await,
    }
}

/// Restore the stored session or bail out with a sign-in hint.
pub(crate) async fn ensure_signed_in(app: &mut App) -> Result<()> {
    if app.restore_session().await? {
        Ok(())
    } else {
        Err(AppError::NotSignedIn)
    }
}

/// Ask a yes/no question on the terminal. Defaults to no.
pub(crate) fn confirm(prompt: &str) -> Result<bool> {
    use std::io::Write;

    print!("{} [y/N] ", prompt);
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
