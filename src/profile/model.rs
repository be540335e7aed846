use serde::{Deserialize, Serialize};

/// Stored profile document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    #[serde(flatten)]
    pub fields: ProfileFields,
}

/// Every client-writable profile field. Used as the body of a create and as
/// a partial patch: `None` means "not present".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub achievements: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_average_weight_ratings: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_rents: Option<u32>,
    /// Unix timestamp, seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recently_active: Option<i64>,
}

impl ProfileFields {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Overwrite the fields that are present in `patch`, leave the rest alone.
    pub fn merge(&mut self, patch: &ProfileFields) {
        if let Some(name) = &patch.name {
            self.name = Some(name.clone());
        }
        if let Some(email) = &patch.email {
            self.email = Some(email.clone());
        }
        if let Some(age) = patch.age {
            self.age = Some(age);
        }
        if let Some(achievements) = &patch.achievements {
            self.achievements = Some(achievements.clone());
        }
        if let Some(ratings) = patch.total_average_weight_ratings {
            self.total_average_weight_ratings = Some(ratings);
        }
        if let Some(rents) = patch.number_of_rents {
            self.number_of_rents = Some(rents);
        }
        if let Some(active) = patch.recently_active {
            self.recently_active = Some(active);
        }
    }

    /// JSON names of the fields present, in declaration order.
    pub fn present_fields(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.name.is_some() {
            names.push("name");
        }
        if self.email.is_some() {
            names.push("email");
        }
        if self.age.is_some() {
            names.push("age");
        }
        if self.achievements.is_some() {
            names.push("achievements");
        }
        if self.total_average_weight_ratings.is_some() {
            names.push("totalAverageWeightRatings");
        }
        if self.number_of_rents.is_some() {
            names.push("numberOfRents");
        }
        if self.recently_active.is_some() {
            names.push("recentlyActive");
        }
        names
    }
}

/// One page of the ranked listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedPage {
    pub profiles: Vec<Profile>,
    /// Id of the last profile on this page; `None` once the listing is exhausted.
    #[serde(rename = "lastVisibleId")]
    pub next_cursor_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_with_camel_case_and_skips_absent_fields() {
        let profile = Profile {
            id: "p1".to_string(),
            fields: ProfileFields {
                name: Some("Ana".to_string()),
                number_of_rents: Some(3),
                ..Default::default()
            },
        };
        assert_eq!(
            serde_json::to_value(&profile).unwrap(),
            json!({ "id": "p1", "name": "Ana", "numberOfRents": 3 })
        );
    }

    #[test]
    fn merge_keeps_fields_missing_from_patch() {
        let mut stored = ProfileFields {
            name: Some("Ana".to_string()),
            age: Some(30.0),
            ..Default::default()
        };
        stored.merge(&ProfileFields {
            age: Some(31.0),
            achievements: Some(vec!["top-renter".to_string()]),
            ..Default::default()
        });
        assert_eq!(stored.name.as_deref(), Some("Ana"));
        assert_eq!(stored.age, Some(31.0));
        assert_eq!(stored.achievements, Some(vec!["top-renter".to_string()]));
    }

    #[test]
    fn empty_patch_is_empty() {
        assert!(ProfileFields::default().is_empty());
        assert!(ProfileFields::default().present_fields().is_empty());
    }

    #[test]
    fn ranked_page_uses_last_visible_id() {
        let page = RankedPage { profiles: vec![], next_cursor_id: None };
        assert_eq!(serde_json::to_value(&page).unwrap(), json!({ "profiles": [], "lastVisibleId": null }));
    }
}
