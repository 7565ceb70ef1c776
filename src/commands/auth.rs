use super::{CommandContext, CommandResult};
use chrono::Utc;
use clap::Subcommand;
use lifedesk::components::google_calendar::{load_credential, store_credential, Credential};
use lifedesk::error::{validation_error, DeskResult};

#[derive(Subcommand)]
pub enum AuthAction {
    /// Store an access token for the calendar API
    SetToken {
        /// OAuth access token
        token: String,
        /// Seconds until the token expires
        #[arg(long)]
        expires_in: Option<i64>,
    },
    /// Check whether a usable credential is available
    Status,
}

pub async fn run(ctx: &CommandContext, action: AuthAction) -> CommandResult {
    match action {
        AuthAction::SetToken { token, expires_in } => {
            let mut credential = Credential::bearer(token)?;
            if let Some(secs) = expires_in {
                credential = credential.with_expiry(expiry_from(Utc::now().timestamp(), secs)?);
            }
            store_credential(&ctx.redis, &credential).await?;
            println!("Calendar credential stored");
        }
        AuthAction::Status => {
            let config = ctx.config.read().await;
            match load_credential(&config, &ctx.redis).await {
                Ok(_) => println!("Calendar credential is available"),
                Err(e) => println!("{}", e),
            }
        }
    }
    Ok(())
}

/// Unix time `secs` after `now`
fn expiry_from(now: i64, secs: i64) -> DeskResult<i64> {
    if secs <= 0 {
        return Err(validation_error("--expires-in must be a positive number of seconds"));
    }
    now.checked_add(secs)
        .ok_or_else(|| validation_error(&format!("--expires-in {} is too large", secs)))
}
