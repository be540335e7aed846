use clap::Subcommand;
use serde_json::json;

use crate::cli::{utils, ApiClient, OutputFormat};

#[derive(Subcommand)]
pub enum ProfileCommands {
    #[command(about = "Show the profile of the token's owner")]
    Show,

    #[command(about = "Update the token owner's profile with a partial JSON document")]
    Update {
        #[arg(help = "JSON patch, e.g. '{\"age\": 31}' (reads stdin when omitted or '-')")]
        patch: Option<String>,
    },

    #[command(about = "Create a profile from a JSON document")]
    Create {
        #[arg(help = "Profile JSON (reads stdin when omitted or '-')")]
        profile: Option<String>,
    },

    #[command(about = "List profiles in ranking order")]
    Ranked {
        #[arg(long, default_value_t = 10, help = "Profiles per page")]
        page_size: u32,
        #[arg(long, help = "Continue after this profile id")]
        after: Option<String>,
        #[arg(long, help = "Follow the cursor until the listing is exhausted")]
        all: bool,
    },
}

pub async fn handle(cmd: ProfileCommands, client: &ApiClient, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ProfileCommands::Show => {
            let profile = client.fetch_profile().await?;
            utils::output_value(&output_format, "Current profile:", &profile)
        }
        ProfileCommands::Update { patch } => {
            let patch = utils::read_json_arg(patch)?;
            client.update_profile(&patch).await?;
            utils::output_success(&output_format, "User updated successfully", None)
        }
        ProfileCommands::Create { profile } => {
            let fields = utils::read_json_arg(profile)?;
            let user_id = client.create_profile(&fields).await?;
            utils::output_success(
                &output_format,
                &format!("Created profile {}", user_id),
                Some(json!({ "userId": user_id })),
            )
        }
        ProfileCommands::Ranked { page_size, after, all } => {
            let mut cursor = after;
            loop {
                let page = client.grouped_users(page_size, cursor.as_deref()).await?;
                utils::output_profiles(&output_format, &page.profiles, page.next_cursor_id.as_deref())?;

                if !all || page.next_cursor_id.is_none() {
                    return Ok(());
                }
                cursor = page.next_cursor_id;
            }
        }
    }
}
