//! Loan commands: add, list, schedule, remove.

use chrono::NaiveDate;
use clap::Args;
use serde::Serialize;

use super::{confirm, ensure_signed_in};
use crate::app::App;
use crate::error::Result;
use crate::money::format_brl;
use crate::services::schedule::compute_schedule;
use crate::supabase::models::CreateLoanRequest;
use crate::supabase::Loan;

#[derive(Debug, Args)]
pub struct AddArgs {
    /// Borrower name
    #[arg(long)]
    pub name: String,

    /// Borrower phone; punctuation is fine, only digits are kept
    #[arg(long)]
    pub phone: Option<String>,

    /// Amount lent
    #[arg(long)]
    pub principal: f64,

    /// Yearly interest rate in percent
    #[arg(long, default_value_t = 0.0)]
    pub rate: f64,

    /// Number of monthly installments
    #[arg(long)]
    pub months: u32,

    /// First day of the loan (YYYY-MM-DD); defaults to today
    #[arg(long)]
    pub start_date: Option<NaiveDate>,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Filter by borrower name (case-insensitive) or phone digits
    pub query: Option<String>,

    /// Emit JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ScheduleArgs {
    /// Loan id, as shown by `lekbank list`
    pub loan_id: String,

    /// Emit JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct RemoveArgs {
    /// Loan id, as shown by `lekbank list`
    pub loan_id: String,

    /// Skip the confirmation prompt
    #[arg(long)]
    pub yes: bool,
}

/// A loan plus its derived costs, for `list --json`.
#[derive(Serialize)]
struct LoanSummary<'a> {
    #[serde(flatten)]
    loan: &'a Loan,
    installment: f64,
    total_payback: f64,
}

pub async fn add(app: &mut App, args: AddArgs) -> Result<()> {
    ensure_signed_in(app).await?;

    let request = CreateLoanRequest {
        name: args.name,
        phone: args.phone.unwrap_or_default(),
        principal: args.principal,
        annual_rate: args.rate,
        months: args.months,
        start_date: args.start_date,
    };

    let loan = app.add_loan(request).await?;
    println!("Created loan {}", loan.id);
    print_loan(&loan);
    Ok(())
}

pub async fn list(app: &mut App, args: ListArgs) -> Result<()> {
    ensure_signed_in(app).await?;

    let query = args.query.unwrap_or_default();
    let loans = app.list_view(&query);

    if args.json {
        let summaries: Vec<LoanSummary> = loans
            .iter()
            .map(|&loan| {
                let schedule = compute_schedule(loan);
                LoanSummary {
                    loan,
                    installment: schedule.installment,
                    total_payback: schedule.total_payback,
                }
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    if loans.is_empty() {
        if query.is_empty() {
            println!("No loans yet. Add one with `lekbank add`.");
        } else {
            println!("No loans match {:?}.", query);
        }
        return Ok(());
    }

    for loan in &loans {
        print_loan(loan);
    }
    println!("{} loan(s).", loans.len());
    Ok(())
}

pub async fn schedule(app: &mut App, args: ScheduleArgs) -> Result<()> {
    ensure_signed_in(app).await?;

    let view = app.schedule_view(&args.loan_id).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    print_loan(&view.loan);
    println!();
    for row in &view.schedule.installments {
        let marker = if view.paid.contains(&row.index) { "x" } else { " " };
        println!(
            "  [{}] #{:<3} due {}  {}",
            marker,
            row.index,
            row.due_date,
            format_brl(row.amount)
        );
    }
    println!();
    println!(
        "{} of {} installments paid.",
        view.paid.len(),
        view.loan.months
    );
    Ok(())
}

pub async fn remove(app: &mut App, args: RemoveArgs) -> Result<()> {
    ensure_signed_in(app).await?;

    let loan = app.lookup_loan(&args.loan_id).await?;
    if !args.yes && !confirm(&format!("Remove the loan for {}?", loan.name))? {
        println!("Kept.");
        return Ok(());
    }

    app.remove_loan(&loan.id).await?;
    println!("Removed loan for {}.", loan.name);
    Ok(())
}

fn print_loan(loan: &Loan) {
    let schedule = compute_schedule(loan);
    println!(
        "{}  {} ({})",
        loan.id,
        loan.name,
        loan.phone.as_deref().unwrap_or("no phone")
    );
    println!(
        "    {} at {}% a year over {} months, starting {}",
        format_brl(loan.principal),
        loan.annual_rate,
        loan.months,
        loan.start_date
    );
    println!(
        "    installment {}, total payback {}",
        format_brl(schedule.installment),
        format_brl(schedule.total_payback)
    );
}
