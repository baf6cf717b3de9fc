//! WhatsApp reminder command.

use clap::Args;

use super::ensure_signed_in;
use crate::app::App;
use crate::error::Result;
use crate::services::reminders::open_in_browser;

#[derive(Debug, Args)]
pub struct RemindArgs {
    /// Loan id, as shown by `lekbank list`
    pub loan_id: String,

    /// Open the link in the default browser instead of just printing it
    #[arg(long)]
    pub open: bool,
}

pub async fn remind(app: &mut App, args: RemindArgs) -> Result<()> {
    ensure_signed_in(app).await?;

    let reminder = app.payment_reminder(&args.loan_id).await?;
    println!("{}", reminder.message);
    println!("{}", reminder.link);

    if args.open {
        open_in_browser(&reminder.link)?;
    }
    Ok(())
}
