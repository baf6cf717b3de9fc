//! Payment mark command.

use clap::Args;

use super::ensure_signed_in;
use crate::app::App;
use crate::error::Result;
use crate::services::PaymentState;

#[derive(Debug, Args)]
pub struct MarkArgs {
    /// Loan id, as shown by `lekbank list`
    pub loan_id: String,

    /// Installment number, starting at 1
    pub index: u32,
}

pub async fn mark(app: &mut App, args: MarkArgs) -> Result<()> {
    ensure_signed_in(app).await?;

    match app.toggle_payment(&args.loan_id, args.index).await? {
        PaymentState::Paid => println!("Installment {} marked paid.", args.index),
        PaymentState::Unpaid => println!("Installment {} is unpaid again.", args.index),
    }
    Ok(())
}
