//! WhatsApp payment reminders
//!
//! Builds the reminder text and the `wa.me` deep link for a loan. The
//! link carries the country code plus the stored phone digits and the
//! prefilled message as its `text` parameter.

use serde::Serialize;
use url::Url;

use super::loans::normalize_phone;
use super::schedule;
use crate::error::{AppError, Result};
use crate::money::format_brl;
use crate::supabase::Loan;

/// A ready-to-send reminder: the message and the link that opens it in
/// a WhatsApp conversation.
#[derive(Debug, Clone, Serialize)]
pub struct ReminderView {
    pub message: String,
    pub link: Url,
}

/// Builds reminders with a fixed country calling code.
pub struct ReminderService {
    country_code: String,
}

impl ReminderService {
    pub fn new(country_code: impl Into<String>) -> Self {
        Self {
            country_code: country_code.into(),
        }
    }

    /// The reminder for a loan's monthly installment. Fails when the
    /// loan has no phone on file, since there is nowhere to send it.
    pub fn payment_reminder(&self, loan: &Loan) -> Result<ReminderView> {
        let amount = schedule::installment_amount(loan.principal, loan.annual_rate, loan.months);
        let message = reminder_message(&loan.name, amount);
        let link = self.whatsapp_link(loan.phone.as_deref().unwrap_or(""), &message)?;
        Ok(ReminderView { message, link })
    }

    /// `https://wa.me/<country><digits>?text=<message>`. The phone is
    /// reduced to digits first; anything short of one digit is an error.
    pub fn whatsapp_link(&self, phone: &str, text: &str) -> Result<Url> {
        let digits = normalize_phone(phone);
        if digits.is_empty() {
            return Err(AppError::Validation(
                "loan has no phone number on file".to_string(),
            ));
        }

        let mut link = Url::parse(&format!("https://wa.me/{}{}", self.country_code, digits))?;
        link.query_pairs_mut().append_pair("text", text);
        Ok(link)
    }
}

/// The message template, pt-BR like the audience it goes to.
pub fn reminder_message(name: &str, installment: f64) -> String {
    format!(
        "Fala {}! Sua parcela de {} está pendente. Avisa quando pagar.",
        name,
        format_brl(installment)
    )
}

/// Hand a link to the platform's URL opener.
pub fn open_in_browser(link: &Url) -> Result<()> {
    let mut command = if cfg!(target_os = "windows") {
        let mut c = std::process::Command::new("cmd");
        c.args(["/C", "start", ""]).arg(link.as_str());
        c
    } else if cfg!(target_os = "macos") {
        let mut c = std::process::Command::new("open");
        c.arg(link.as_str());
        c
    } else {
        let mut c = std::process::Command::new("xdg-open");
        c.arg(link.as_str());
        c
    };

    command.spawn()?;
    Ok(())
}
