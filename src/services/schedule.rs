//! Amortization schedule engine
//!
//! Fixed-payment (price table) loans: every installment costs the same,
//! computed from principal, yearly rate and term. All math stays in f64
//! with no intermediate rounding; values are rounded once, at display.

use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;

use crate::supabase::Loan;

/// One row of a schedule. `index` is 1-based, matching how people count
/// installments.
#[derive(Debug, Clone, Serialize)]
pub struct Installment {
    pub index: u32,
    pub due_date: NaiveDate,
    pub amount: f64,
}

/// Full repayment picture for one loan.
#[derive(Debug, Clone, Serialize)]
pub struct Schedule {
    pub installment: f64,
    pub total_payback: f64,
    pub installments: Vec<Installment>,
}

/// Fixed monthly payment for a loan of `principal` at `annual_rate_pct`
/// percent per year over `months` installments.
///
/// The yearly rate converts to a monthly one by plain division by 12.
/// A zero-month term yields 0 and a zero rate degenerates to an even
/// split of the principal.
pub fn installment_amount(principal: f64, annual_rate_pct: f64, months: u32) -> f64 {
    if months == 0 {
        return 0.0;
    }

    let r = annual_rate_pct / 100.0 / 12.0;
    let n = months as f64;

    if r == 0.0 {
        return principal / n;
    }

    let pow = (1.0 + r).powf(n);
    principal * r * pow / (pow - 1.0)
}

/// Build the full schedule for a loan: one installment per month, the
/// first due on `start_date` itself and each following one a calendar
/// month later.
pub fn compute_schedule(loan: &Loan) -> Schedule {
    let installment = installment_amount(loan.principal, loan.annual_rate, loan.months);

    let installments = (1..=loan.months)
        .map(|index| Installment {
            index,
            due_date: add_calendar_months(loan.start_date, index - 1),
            amount: installment,
        })
        .collect();

    Schedule {
        installment,
        total_payback: installment * loan.months as f64,
        installments,
    }
}

/// Advance a date by whole calendar months, keeping the day of month.
/// When the target month is shorter than the day asks for, the excess
/// days spill into the following month (Jan 31 + 1 month lands on
/// Mar 2 or Mar 3 depending on February's length).
pub fn add_calendar_months(date: NaiveDate, months: u32) -> NaiveDate {
    let zero_based = date.year() * 12 + date.month0() as i32 + months as i32;
    let year = zero_based.div_euclid(12);
    let month = zero_based.rem_euclid(12) as u32 + 1;
    let day = date.day();

    match NaiveDate::from_ymd_opt(year, month, day) {
        Some(due) => due,
        None => {
            let last = days_in_month(year, month);
            let excess = (day - last) as u64;
            NaiveDate::from_ymd_opt(year, month, last)
                .and_then(|d| d.checked_add_days(Days::new(excess)))
                .unwrap_or(date)
        }
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };

    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(28)
}
