use async_trait::async_trait;
use std::cmp::Ordering;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{ranking_order, ProfileStore, StoreError};
use crate::profile::{Profile, ProfileFields};

/// Process-local store. Documents keep insertion order, so email lookups
/// return the earliest match.
#[derive(Default)]
pub struct MemoryProfileStore {
    profiles: RwLock<Vec<Profile>>,
    write_calls: AtomicU64,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed documents as-is, bypassing validation and uniqueness.
    pub async fn with_profiles(profiles: impl IntoIterator<Item = Profile>) -> Self {
        let store = Self::new();
        store.profiles.write().await.extend(profiles);
        store
    }

    /// Number of successful `insert` and `update` calls.
    pub fn write_calls(&self) -> u64 {
        self.write_calls.load(AtomicOrdering::Relaxed)
    }

    pub async fn len(&self) -> usize {
        self.profiles.read().await.len()
    }

    fn email_taken(profiles: &[Profile], email: &str, except_id: Option<&str>) -> bool {
        profiles
            .iter()
            .any(|p| p.fields.email.as_deref() == Some(email) && Some(p.id.as_str()) != except_id)
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Profile>, StoreError> {
        let profiles = self.profiles.read().await;
        Ok(profiles
            .iter()
            .find(|p| p.fields.email.as_deref() == Some(email))
            .cloned())
    }

    async fn get(&self, id: &str) -> Result<Option<Profile>, StoreError> {
        let profiles = self.profiles.read().await;
        Ok(profiles.iter().find(|p| p.id == id).cloned())
    }

    async fn insert(&self, fields: ProfileFields) -> Result<String, StoreError> {
        let mut profiles = self.profiles.write().await;
        if let Some(email) = fields.email.as_deref() {
            if Self::email_taken(&profiles, email, None) {
                return Err(StoreError::Conflict(format!("email {} already in use", email)));
            }
        }

        let id = Uuid::new_v4().to_string();
        profiles.push(Profile {
            id: id.clone(),
            fields,
        });
        self.write_calls.fetch_add(1, AtomicOrdering::Relaxed);
        Ok(id)
    }

    async fn update(&self, id: &str, patch: &ProfileFields) -> Result<(), StoreError> {
        let mut profiles = self.profiles.write().await;
        if let Some(email) = patch.email.as_deref() {
            if Self::email_taken(&profiles, email, Some(id)) {
                return Err(StoreError::Conflict(format!("email {} already in use", email)));
            }
        }

        let profile = profiles
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("document {}", id)))?;
        profile.fields.merge(patch);
        self.write_calls.fetch_add(1, AtomicOrdering::Relaxed);
        Ok(())
    }

    async fn list_ranked(&self, after: Option<&Profile>, limit: usize) -> Result<Vec<Profile>, StoreError> {
        let mut ranked = self.profiles.read().await.clone();
        ranked.sort_by(ranking_order);

        Ok(ranked
            .into_iter()
            .filter(|p| after.map_or(true, |cursor| ranking_order(p, cursor) == Ordering::Greater))
            .take(limit)
            .collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
