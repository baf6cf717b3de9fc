//! Sign-in, sign-out and session inspection.

use clap::Args;

use super::ensure_signed_in;
use crate::app::App;
use crate::error::Result;

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Account email
    #[arg(long)]
    pub email: String,

    /// Account password. Prefer the environment variable so the value
    /// stays out of shell history.
    #[arg(long, env = "LEKBANK_PASSWORD", hide_env_values = true)]
    pub password: String,
}

pub async fn login(app: &mut App, args: LoginArgs) -> Result<()> {
    app.sign_in(&args.email, &args.password).await?;

    let user = app.current_user()?;
    println!(
        "Signed in as {} ({} loans on file)",
        user.email.as_deref().unwrap_or(&user.id),
        app.list_view("").len()
    );
    Ok(())
}

pub async fn logout(app: &mut App) -> Result<()> {
    app.sign_out().await?;
    println!("Signed out.");
    Ok(())
}

pub async fn whoami(app: &mut App) -> Result<()> {
    ensure_signed_in(app).await?;

    let user = app.current_user()?;
    match &user.email {
        Some(email) => println!("{} ({})", email, user.id),
        None => println!("{}", user.id),
    }
    Ok(())
}
