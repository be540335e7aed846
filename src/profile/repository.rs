use std::sync::Arc;
use tracing::{debug, info, warn};

use super::error::ProfileError;
use super::model::{Profile, ProfileFields, RankedPage};
use super::validation::{is_valid_email, validate_fields, ValidationError};
use crate::config::ProfileRules;
use crate::store::ProfileStore;

/// Email-addressed access to stored profiles.
#[derive(Clone)]
pub struct ProfileRepository {
    store: Arc<dyn ProfileStore>,
    rules: ProfileRules,
}

impl ProfileRepository {
    pub fn new(store: Arc<dyn ProfileStore>, rules: ProfileRules) -> Self {
        Self { store, rules }
    }

    pub fn rules(&self) -> &ProfileRules {
        &self.rules
    }

    pub fn backend_tag(&self) -> &'static str {
        self.store.backend_tag()
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Profile, ProfileError> {
        self.store
            .find_by_email(email)
            .await?
            .ok_or_else(|| ProfileError::NotFound(format!("User with Email {} does not exist.", email)))
    }

    /// Validate `patch` and merge it into the profile owned by `email`.
    ///
    /// Nothing is written unless every present field passes. An empty patch
    /// still requires the profile to exist but writes nothing.
    pub async fn update_by_email(&self, email: &str, patch: &ProfileFields) -> Result<(), ProfileError> {
        if !is_valid_email(email) {
            return Err(ValidationError::new("email", "Invalid email address provided.").into());
        }
        validate_fields(patch, &self.rules)?;

        let current = self.get_by_email(email).await?;

        if let Some(new_email) = patch.email.as_deref() {
            if current.fields.email.as_deref() != Some(new_email) {
                self.ensure_email_free(new_email, Some(&current.id)).await?;
            }
        }

        if patch.is_empty() {
            debug!("Empty patch for profile {}, nothing to write", current.id);
            return Ok(());
        }

        self.store.update(&current.id, patch).await?;
        debug!("Updated profile {} fields {:?}", current.id, patch.present_fields());
        Ok(())
    }

    /// Insert a new profile. Email is required and must not belong to an existing profile.
    pub async fn create(&self, fields: ProfileFields) -> Result<String, ProfileError> {
        let email = match fields.email.as_deref() {
            Some(email) => email,
            None => return Err(ValidationError::new("email", "Validation failed: Email is required.").into()),
        };
        validate_fields(&fields, &self.rules)?;
        self.ensure_email_free(email, None).await?;

        let id = self.store.insert(fields).await?;
        info!("Created profile {}", id);
        Ok(id)
    }

    /// One page of profiles in ranking order, starting strictly after `cursor_id`.
    pub async fn list_ranked(&self, cursor_id: Option<&str>, page_size: u32) -> Result<RankedPage, ProfileError> {
        if page_size == 0 {
            return Err(ValidationError::new(
                "pageSize",
                "Invalid pageSize. It must be a positive number.",
            )
            .into());
        }

        let cursor = match cursor_id {
            Some(id) => Some(
                self.store
                    .get(id)
                    .await?
                    .ok_or_else(|| ProfileError::NotFound(format!("Document with ID {} does not exist.", id)))?,
            ),
            None => None,
        };

        let profiles = self.store.list_ranked(cursor.as_ref(), page_size as usize).await?;
        let next_cursor_id = profiles.last().map(|p| p.id.clone());

        Ok(RankedPage {
            profiles,
            next_cursor_id,
        })
    }

    pub async fn health_check(&self) -> Result<(), ProfileError> {
        self.store.ping().await.map_err(ProfileError::from)
    }

    /// Release store resources. Called once on shutdown.
    pub async fn close(&self) {
        self.store.close().await;
    }

    async fn ensure_email_free(&self, email: &str, owner_id: Option<&str>) -> Result<(), ProfileError> {
        if let Some(existing) = self.store.find_by_email(email).await? {
            if Some(existing.id.as_str()) != owner_id {
                warn!("Rejected write: email {} already belongs to profile {}", email, existing.id);
                return Err(ProfileError::Conflict(format!("User with Email {} already exists.", email)));
            }
        }
        Ok(())
    }
}
