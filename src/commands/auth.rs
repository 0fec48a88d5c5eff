// Login and registration against the auth service
use crate::client::{AuthClient, AuthOutcome, LoginRequest, RegisterRequest};
use crate::commands::CommandContext;
use anyhow::{Context, Result};

fn auth_client(ctx: &CommandContext) -> Result<AuthClient> {
    AuthClient::new(ctx.config.services.auth_url.clone(), ctx.request_timeout())
        .context("Failed to create auth client")
}

/// Print a granted outcome. A denial becomes the command's error so `main`
/// reports it and exits non-zero.
fn report(ctx: &CommandContext, outcome: &AuthOutcome) -> Result<()> {
    if !outcome.is_granted() {
        anyhow::bail!("{}", outcome.message());
    }
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
    } else {
        println!("{}", outcome.message());
        if let AuthOutcome::Granted { token: Some(token), .. } = outcome {
            println!("Token: {}", token);
        }
    }
    Ok(())
}

pub async fn handle_login_command(ctx: &CommandContext, username: String, password: String) -> Result<()> {
    let outcome = auth_client(ctx)?.login(&LoginRequest { username, password }).await;
    report(ctx, &outcome)
}

pub async fn handle_register_command(ctx: &CommandContext, request: RegisterRequest) -> Result<()> {
    let outcome = auth_client(ctx)?.register(&request).await;
    report(ctx, &outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::path::PathBuf;

    fn context() -> CommandContext {
        CommandContext::new(Config::default(), PathBuf::new(), Some("UTC"), true, false, false).unwrap()
    }

    #[test]
    fn test_denied_outcome_is_an_error() {
        let denied = AuthOutcome::Denied {
            message: "Access denied. Security violation detected.".to_string(),
        };
        let err = report(&context(), &denied).unwrap_err();
        assert_eq!(err.to_string(), "Access denied. Security violation detected.");
    }

    #[test]
    fn test_granted_outcome_succeeds() {
        let granted = AuthOutcome::Granted {
            message: "Login successful".to_string(),
            token: Some("abc".to_string()),
        };
        assert!(report(&context(), &granted).is_ok());
    }
}
