use std::io::Read;

use anyhow::Context;
use serde::Serialize;
use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::profile::Profile;

/// Output a success message in the appropriate format
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({ "message": message });
            if let (Some(Value::Object(extra)), Some(object)) = (data, response.as_object_mut()) {
                object.extend(extra);
            }
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Print `value` as JSON, or a headline plus its pretty form in text mode
pub fn output_value<T: Serialize>(output_format: &OutputFormat, headline: &str, value: &T) -> anyhow::Result<()> {
    let rendered = serde_json::to_string_pretty(value)?;
    match output_format {
        OutputFormat::Json => println!("{}", rendered),
        OutputFormat::Text => {
            println!("{}", headline);
            println!("{}", rendered);
        }
    }
    Ok(())
}

/// One line per profile in text mode
pub fn output_profiles(output_format: &OutputFormat, profiles: &[Profile], cursor: Option<&str>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({ "profiles": profiles, "lastVisibleId": cursor }))?
            );
        }
        OutputFormat::Text => {
            if profiles.is_empty() {
                println!("No more profiles");
                return Ok(());
            }
            for profile in profiles {
                println!("{}", profile_line(profile));
            }
            if let Some(id) = cursor {
                println!("Next page: --after {}", id);
            }
        }
    }
    Ok(())
}

fn profile_line(profile: &Profile) -> String {
    let f = &profile.fields;
    let show = |v: Option<String>| v.unwrap_or_else(|| "-".to_string());
    format!(
        "{}  {:<24} {:<32} rating={} rents={} active={}",
        profile.id,
        f.name.as_deref().unwrap_or("-"),
        f.email.as_deref().unwrap_or("-"),
        show(f.total_average_weight_ratings.map(|r| r.to_string())),
        show(f.number_of_rents.map(|r| r.to_string())),
        show(f.recently_active.map(|r| r.to_string())),
    )
}

/// Parse a JSON argument, or read it from stdin when absent or `-`
pub fn read_json_arg(arg: Option<String>) -> anyhow::Result<Value> {
    let raw = match arg.as_deref() {
        None | Some("-") => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read JSON from stdin")?;
            buffer
        }
        Some(text) => text.to_string(),
    };
    serde_json::from_str(&raw).context("argument is not valid JSON")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::ProfileFields;

    #[test]
    fn parses_inline_json() {
        let value = read_json_arg(Some(r#"{"age": 30}"#.to_string())).unwrap();
        assert_eq!(value["age"], 30);
        assert!(read_json_arg(Some("{oops".to_string())).is_err());
    }

    #[test]
    fn profile_line_marks_missing_values() {
        let profile = Profile {
            id: "p1".to_string(),
            fields: ProfileFields {
                name: Some("Ana".to_string()),
                number_of_rents: Some(4),
                ..Default::default()
            },
        };
        let line = profile_line(&profile);
        assert!(line.starts_with("p1  Ana"));
        assert!(line.contains("rating=- rents=4 active=-"));
    }
}
