use clap::Subcommand;
use serde_json::json;

use crate::cli::{utils, ApiClient, OutputFormat};
use crate::config::AppConfig;
use crate::identity::TokenIssuer;

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Ask the server whether a token is a valid session")]
    Verify {
        #[arg(help = "Token to check (defaults to --token)")]
        token: Option<String>,
    },

    #[command(about = "Issue a development token signed with SECURITY_JWT_SECRET")]
    Issue {
        #[arg(help = "Subject id")]
        subject: String,
        #[arg(help = "Email the token is issued for")]
        email: String,
        #[arg(long, help = "Token lifetime in hours")]
        expiry_hours: Option<u64>,
    },
}

pub async fn handle(cmd: AuthCommands, client: &ApiClient, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        AuthCommands::Verify { token } => {
            let token = token
                .or_else(|| client.token().map(str::to_string))
                .ok_or_else(|| anyhow::anyhow!("no token to verify"))?;
            let is_logged_in = client.verify_user(&token).await?;
            let message = if is_logged_in { "Token is valid" } else { "Token is not valid" };
            utils::output_success(&output_format, message, Some(json!({ "isLoggedIn": is_logged_in })))
        }
        AuthCommands::Issue {
            subject,
            email,
            expiry_hours,
        } => {
            let mut security = AppConfig::from_env().security;
            if let Some(hours) = expiry_hours {
                security.jwt_expiry_hours = hours;
            }
            let token = TokenIssuer::from_config(&security)?.issue(&subject, &email)?;
            match output_format {
                OutputFormat::Json => utils::output_success(
                    &output_format,
                    "Token issued",
                    Some(json!({ "token": token, "expires_in_hours": security.jwt_expiry_hours })),
                ),
                OutputFormat::Text => {
                    println!("{}", token);
                    Ok(())
                }
            }
        }
    }
}
