//! Application configuration
//!
//! Runtime settings come from environment variables (a `.env` file is read
//! when present). Fixed validation boundaries and limits used throughout
//! the application live here as constants.

use crate::error::{AppError, Result};
use url::Url;

/// User-Agent sent on every Supabase request
pub const USER_AGENT: &str = concat!("lekbank/", env!("CARGO_PKG_VERSION"));

// ===== Loan Form Boundaries =====

/// Shortest accepted loan term
pub const MIN_TERM_MONTHS: u32 = 1;

/// Longest accepted loan term (100 years of monthly installments).
/// The annuity factor `(1+r)^n` loses all meaning in f64 far beyond this.
pub const MAX_TERM_MONTHS: u32 = 1200;

/// Maximum length for a borrower name
pub const MAX_NAME_LENGTH: usize = 120;

/// Maximum digits in a phone number (E.164 allows at most 15)
pub const MAX_PHONE_DIGITS: usize = 15;

// ===== Session Limits =====

/// Refresh the access token when it expires within this window,
/// so a token never goes stale mid-operation.
pub const SESSION_REFRESH_MARGIN_SECS: i64 = 60;

/// Token lifetime assumed when the auth server omits `expires_at`
/// (GoTrue issues one-hour access tokens by default).
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;

// ===== Reminders =====

/// Country calling code prefixed to reminder phone numbers
pub const DEFAULT_COUNTRY_CODE: &str = "55";

/// Runtime configuration resolved from the environment
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the Supabase project (e.g. `https://xyz.supabase.co`)
    pub supabase_url: Url,
    /// The project's public anon key, sent as the `apikey` header
    pub supabase_anon_key: String,
    /// Country calling code used when building WhatsApp links
    pub country_code: String,
}

impl Config {
    /// Load configuration from the environment, reading `.env` first.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let raw_url = std::env::var("SUPABASE_URL")
            .map_err(|_| AppError::Config("SUPABASE_URL is not set".to_string()))?;
        let supabase_url = Url::parse(&raw_url)
            .map_err(|e| AppError::Config(format!("invalid SUPABASE_URL: {}", e)))?;

        let supabase_anon_key = std::env::var("SUPABASE_ANON_KEY")
            .map_err(|_| AppError::Config("SUPABASE_ANON_KEY is not set".to_string()))?;

        let country_code = std::env::var("LEKBANK_COUNTRY_CODE")
            .unwrap_or_else(|_| DEFAULT_COUNTRY_CODE.to_string());

        Ok(Self {
            supabase_url,
            supabase_anon_key,
            country_code,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Environment variables are process-global, so every scenario runs in
    // one test to keep the harness threads from stepping on each other.
    #[test]
    fn test_config_from_env() {
        std::env::remove_var("SUPABASE_URL");
        std::env::remove_var("SUPABASE_ANON_KEY");
        std::env::remove_var("LEKBANK_COUNTRY_CODE");

        assert!(matches!(Config::from_env(), Err(AppError::Config(_))));

        std::env::set_var("SUPABASE_URL", "not a url");
        std::env::set_var("SUPABASE_ANON_KEY", "anon-key");
        assert!(matches!(Config::from_env(), Err(AppError::Config(_))));

        std::env::set_var("SUPABASE_URL", "https://example.supabase.co");
        let config = Config::from_env().unwrap();
        assert_eq!(config.supabase_url.as_str(), "https://example.supabase.co/");
        assert_eq!(config.supabase_anon_key, "anon-key");
        assert_eq!(config.country_code, DEFAULT_COUNTRY_CODE);

        std::env::set_var("LEKBANK_COUNTRY_CODE", "351");
        let config = Config::from_env().unwrap();
        assert_eq!(config.country_code, "351");

        std::env::remove_var("SUPABASE_URL");
        std::env::remove_var("SUPABASE_ANON_KEY");
        std::env::remove_var("LEKBANK_COUNTRY_CODE");
    }
}
