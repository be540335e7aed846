//! Profile document storage.
//!
//! A store keeps profile documents keyed by generated ids. It answers
//! equality lookups by email and the fixed ranking query used for paging.

use async_trait::async_trait;
use std::cmp::Ordering;
use thiserror::Error;

use crate::profile::{Profile, ProfileFields};

pub mod memory;
pub mod postgres;

pub use memory::MemoryProfileStore;
pub use postgres::PgProfileStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid stored document: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    fn backend_tag(&self) -> &'static str;

    /// First document whose email equals `email`.
    async fn find_by_email(&self, email: &str) -> Result<Option<Profile>, StoreError>;

    async fn get(&self, id: &str) -> Result<Option<Profile>, StoreError>;

    /// Insert a new document and return its generated id.
    async fn insert(&self, fields: ProfileFields) -> Result<String, StoreError>;

    /// Atomically merge the present fields of `patch` into document `id`.
    /// Fails with `NotFound` when no such document exists.
    async fn update(&self, id: &str, patch: &ProfileFields) -> Result<(), StoreError>;

    /// Up to `limit` documents in ranking order, strictly after `after` when given.
    async fn list_ranked(&self, after: Option<&Profile>, limit: usize) -> Result<Vec<Profile>, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;

    async fn close(&self) {}
}

/// Ranking used for listings: ratings, rents, then recent activity, all
/// descending with missing values last; full ties fall back to id descending.
///
/// `Ordering::Less` means `a` is listed before `b`.
pub fn ranking_order(a: &Profile, b: &Profile) -> Ordering {
    desc_missing_last(
        a.fields.total_average_weight_ratings,
        b.fields.total_average_weight_ratings,
        f64::total_cmp,
    )
    .then_with(|| desc_missing_last(a.fields.number_of_rents, b.fields.number_of_rents, u32::cmp))
    .then_with(|| desc_missing_last(a.fields.recently_active, b.fields.recently_active, i64::cmp))
    .then_with(|| b.id.as_bytes().cmp(a.id.as_bytes()))
}

fn desc_missing_last<T: Copy>(a: Option<T>, b: Option<T>, cmp: impl Fn(&T, &T) -> Ordering) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => cmp(&y, &x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
