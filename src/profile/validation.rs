//! Field rules for profile writes.
//!
//! Two passes: [`parse_fields`] turns a JSON body into typed fields and
//! rejects wrong types, [`validate_fields`] applies value constraints. The
//! repository always runs the second pass, whatever the caller did.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

use super::model::ProfileFields;
use crate::config::ProfileRules;

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

/// Fields a client may send. `id` is store-owned and handled separately.
const KNOWN_FIELDS: [&str; 7] = [
    "name",
    "email",
    "age",
    "achievements",
    "totalAverageWeightRatings",
    "numberOfRents",
    "recentlyActive",
];

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    fn failed(field: &str, reason: &str) -> Self {
        Self::new(field, format!("Validation failed: {}", reason))
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Check the value constraints of every present field, stopping at the first
/// violation. Order: name, age, numberOfRents, email.
pub fn validate_fields(fields: &ProfileFields, rules: &ProfileRules) -> Result<(), ValidationError> {
    if let Some(name) = &fields.name {
        if name.trim().is_empty() {
            return Err(ValidationError::failed("name", "Name cannot be empty."));
        }
    }

    if let Some(age) = fields.age {
        if !(age.is_finite() && age > 0.0) {
            return Err(ValidationError::failed("age", "Age must be a positive number."));
        }
    }

    if let Some(rents) = fields.number_of_rents {
        if rents > rules.max_number_of_rents {
            return Err(rents_error(rules));
        }
    }

    if let Some(email) = &fields.email {
        if !is_valid_email(email) {
            return Err(ValidationError::failed("email", "Invalid email format."));
        }
    }

    if let Some(ratings) = fields.total_average_weight_ratings {
        if !ratings.is_finite() {
            return Err(ValidationError::failed(
                "totalAverageWeightRatings",
                "Total average weight ratings must be a number.",
            ));
        }
    }

    Ok(())
}

/// Parse a JSON object into typed profile fields. Only type errors are
/// reported here; a present `null` counts as the wrong type.
pub fn parse_fields(body: &Value, rules: &ProfileRules) -> Result<ProfileFields, ValidationError> {
    let object = body
        .as_object()
        .ok_or_else(|| ValidationError::new("body", "Request body must be a JSON object"))?;

    if object.contains_key("id") {
        return Err(ValidationError::new("id", "System field 'id' cannot be set via API"));
    }
    if let Some(unknown) = object.keys().find(|k| !KNOWN_FIELDS.contains(&k.as_str())) {
        return Err(ValidationError::new(unknown.clone(), format!("Unknown field '{}'", unknown)));
    }

    Ok(ProfileFields {
        name: parse_string(object, "name", "Name must be a string.")?,
        age: parse_number(object, "age", "Age must be a positive number.")?,
        number_of_rents: parse_rents(object, rules)?,
        email: parse_string(object, "email", "Invalid email format.")?,
        achievements: parse_achievements(object)?,
        total_average_weight_ratings: parse_number(
            object,
            "totalAverageWeightRatings",
            "Total average weight ratings must be a number.",
        )?,
        recently_active: parse_timestamp(object)?,
    })
}

fn rents_error(rules: &ProfileRules) -> ValidationError {
    ValidationError::failed(
        "numberOfRents",
        &format!(
            "Number of rents must be a number between 0 and {}.",
            rules.max_number_of_rents
        ),
    )
}

fn parse_string(object: &Map<String, Value>, field: &str, reason: &str) -> Result<Option<String>, ValidationError> {
    match object.get(field) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(ValidationError::failed(field, reason)),
    }
}

fn parse_number(object: &Map<String, Value>, field: &str, reason: &str) -> Result<Option<f64>, ValidationError> {
    match object.get(field) {
        None => Ok(None),
        Some(Value::Number(n)) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| ValidationError::failed(field, reason)),
        Some(_) => Err(ValidationError::failed(field, reason)),
    }
}

fn parse_rents(object: &Map<String, Value>, rules: &ProfileRules) -> Result<Option<u32>, ValidationError> {
    match object.get("numberOfRents") {
        None => Ok(None),
        Some(Value::Number(n)) => {
            // Whole numbers only; 3.0 is accepted, 3.5 is not.
            let whole = n.as_u64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= u32::MAX as f64)
                    .map(|f| f as u64)
            });
            whole
                .and_then(|v| u32::try_from(v).ok())
                .map(Some)
                .ok_or_else(|| rents_error(rules))
        }
        Some(_) => Err(rents_error(rules)),
    }
}

fn parse_achievements(object: &Map<String, Value>) -> Result<Option<Vec<String>>, ValidationError> {
    let reason = "Achievements must be a list of strings.";
    match object.get("achievements") {
        None => Ok(None),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| ValidationError::failed("achievements", reason))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        Some(_) => Err(ValidationError::failed("achievements", reason)),
    }
}

fn parse_timestamp(object: &Map<String, Value>) -> Result<Option<i64>, ValidationError> {
    let reason = "Recently active must be a Unix timestamp in seconds.";
    match object.get("recentlyActive") {
        None => Ok(None),
        Some(Value::Number(n)) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| ValidationError::failed("recentlyActive", reason)),
        Some(_) => Err(ValidationError::failed("recentlyActive", reason)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rules() -> ProfileRules {
        ProfileRules::default()
    }

    #[test]
    fn email_pattern() {
        assert!(is_valid_email("ana@example.com"));
        assert!(is_valid_email("a.b+c@sub.example.co"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("ana@example"));
        assert!(!is_valid_email("ana @example.com"));
        assert!(!is_valid_email("ana@@example.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn parses_full_body() {
        let body = json!({
            "name": "Ana",
            "email": "ana@example.com",
            "age": 29,
            "achievements": ["first-rent", "five-stars"],
            "totalAverageWeightRatings": 4.7,
            "numberOfRents": 12,
            "recentlyActive": 1_738_000_000
        });
        let fields = parse_fields(&body, &rules()).unwrap();
        assert_eq!(fields.name.as_deref(), Some("Ana"));
        assert_eq!(fields.age, Some(29.0));
        assert_eq!(fields.number_of_rents, Some(12));
        assert_eq!(fields.recently_active, Some(1_738_000_000));
        assert_eq!(fields.achievements.as_ref().map(Vec::len), Some(2));
    }

    #[test]
    fn rejects_id_and_unknown_fields() {
        let err = parse_fields(&json!({ "id": "x" }), &rules()).unwrap_err();
        assert_eq!(err.field, "id");

        let err = parse_fields(&json!({ "nickname": "x" }), &rules()).unwrap_err();
        assert_eq!(err.message, "Unknown field 'nickname'");
    }

    #[test]
    fn rejects_non_object_body() {
        let err = parse_fields(&json!([1, 2]), &rules()).unwrap_err();
        assert_eq!(err.field, "body");
    }

    #[test]
    fn wrong_types_name_the_field() {
        let err = parse_fields(&json!({ "age": "thirty" }), &rules()).unwrap_err();
        assert_eq!(err.message, "Validation failed: Age must be a positive number.");

        let err = parse_fields(&json!({ "name": null }), &rules()).unwrap_err();
        assert_eq!(err.field, "name");

        let err = parse_fields(&json!({ "achievements": ["ok", 3] }), &rules()).unwrap_err();
        assert_eq!(err.field, "achievements");

        let err = parse_fields(&json!({ "recentlyActive": 1.5 }), &rules()).unwrap_err();
        assert_eq!(err.field, "recentlyActive");
    }

    #[test]
    fn rents_must_be_whole_and_non_negative() {
        assert_eq!(parse_fields(&json!({ "numberOfRents": 3.0 }), &rules()).unwrap().number_of_rents, Some(3));
        assert!(parse_fields(&json!({ "numberOfRents": 3.5 }), &rules()).is_err());
        let err = parse_fields(&json!({ "numberOfRents": -1 }), &rules()).unwrap_err();
        assert_eq!(err.message, "Validation failed: Number of rents must be a number between 0 and 999.");
    }

    #[test]
    fn validates_value_constraints() {
        let empty_name = ProfileFields { name: Some("   ".into()), ..Default::default() };
        assert_eq!(
            validate_fields(&empty_name, &rules()).unwrap_err().message,
            "Validation failed: Name cannot be empty."
        );

        let zero_age = ProfileFields { age: Some(0.0), ..Default::default() };
        assert_eq!(validate_fields(&zero_age, &rules()).unwrap_err().field, "age");

        let bad_email = ProfileFields { email: Some("not-an-email".into()), ..Default::default() };
        assert_eq!(
            validate_fields(&bad_email, &rules()).unwrap_err().message,
            "Validation failed: Invalid email format."
        );

        assert!(validate_fields(&ProfileFields::default(), &rules()).is_ok());
    }

    #[test]
    fn rents_bound_comes_from_rules() {
        let fields = ProfileFields { number_of_rents: Some(150), ..Default::default() };
        assert!(validate_fields(&fields, &rules()).is_ok());

        let strict = ProfileRules { max_number_of_rents: 99 };
        let err = validate_fields(&fields, &strict).unwrap_err();
        assert_eq!(err.message, "Validation failed: Number of rents must be a number between 0 and 99.");
    }

    #[test]
    fn stops_at_first_violation() {
        let fields = ProfileFields {
            name: Some(String::new()),
            age: Some(-4.0),
            email: Some("nope".into()),
            ..Default::default()
        };
        assert_eq!(validate_fields(&fields, &rules()).unwrap_err().field, "name");
    }
}
