//! Runs the Postgres store against `DATABASE_URL`; skipped when it is unset.
//! Each test works in its own throwaway schema.

use std::str::FromStr;

use anyhow::{Context, Result};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;

use axum::http::StatusCode;

use profile_api::error::ApiError;
use profile_api::profile::{Profile, ProfileError, ProfileFields};
use profile_api::store::{PgProfileStore, ProfileStore, StoreError};

struct ScratchStore {
    store: PgProfileStore,
    admin: PgPool,
    schema: String,
}

impl ScratchStore {
    async fn open() -> Result<Option<Self>> {
        let url = match std::env::var("DATABASE_URL") {
            Ok(url) if !url.trim().is_empty() => url,
            _ => {
                eprintln!("DATABASE_URL not set, skipping Postgres store test");
                return Ok(None);
            }
        };

        let schema = format!("profile_test_{}", uuid::Uuid::new_v4().simple());
        let admin = PgPoolOptions::new().max_connections(1).connect(&url).await?;
        sqlx::query(&format!("CREATE SCHEMA \"{}\"", schema)).execute(&admin).await?;

        let options = PgConnectOptions::from_str(&url)?.options([("search_path", schema.as_str())]);
        let pool = PgPoolOptions::new().max_connections(2).connect_with(options).await?;
        let store = PgProfileStore::from_pool(pool);
        store.ensure_schema().await.context("schema bootstrap")?;

        Ok(Some(Self { store, admin, schema }))
    }

    async fn drop_schema(self) -> Result<()> {
        self.store.close().await;
        sqlx::query(&format!("DROP SCHEMA \"{}\" CASCADE", self.schema))
            .execute(&self.admin)
            .await?;
        Ok(())
    }
}

fn fields(email: &str, ratings: Option<f64>, rents: Option<u32>, active: Option<i64>) -> ProfileFields {
    ProfileFields {
        name: Some(email.split('@').next().unwrap_or_default().to_string()),
        email: Some(email.to_string()),
        age: Some(30.0),
        achievements: Some(vec!["first-rent".to_string()]),
        total_average_weight_ratings: ratings,
        number_of_rents: rents,
        recently_active: active,
    }
}

fn emails(profiles: &[Profile]) -> Vec<String> {
    profiles
        .iter()
        .filter_map(|p| p.fields.email.clone())
        .map(|e| e.split('@').next().unwrap_or_default().to_string())
        .collect()
}

#[tokio::test]
async fn ranking_pages_follow_cursor_with_missing_values_last() -> Result<()> {
    let Some(scratch) = ScratchStore::open().await? else {
        return Ok(());
    };
    let store = &scratch.store;

    store.insert(fields("a@example.com", Some(5.0), Some(1), Some(100))).await?;
    store.insert(fields("b@example.com", Some(5.0), Some(2), Some(100))).await?;
    store.insert(fields("c@example.com", None, Some(9), Some(100))).await?;
    store.insert(fields("d@example.com", Some(3.0), Some(1), Some(100))).await?;
    store.insert(fields("e@example.com", Some(4.0), None, None)).await?;

    let all = store.list_ranked(None, 10).await?;
    assert_eq!(emails(&all), vec!["b", "a", "e", "d", "c"]);

    let first = store.list_ranked(None, 2).await?;
    assert_eq!(emails(&first), vec!["b", "a"]);

    let second = store.list_ranked(first.last(), 2).await?;
    assert_eq!(emails(&second), vec!["e", "d"]);

    let third = store.list_ranked(second.last(), 2).await?;
    assert_eq!(emails(&third), vec!["c"]);

    let done = store.list_ranked(third.last(), 2).await?;
    assert!(done.is_empty());

    scratch.drop_schema().await
}

#[tokio::test]
async fn partial_update_keeps_other_fields() -> Result<()> {
    let Some(scratch) = ScratchStore::open().await? else {
        return Ok(());
    };
    let store = &scratch.store;

    let id = store.insert(fields("ana@example.com", Some(4.5), Some(3), Some(1_700_000_000))).await?;
    let before = store.get(&id).await?.context("inserted profile missing")?;

    let patch = ProfileFields {
        age: Some(41.0),
        ..Default::default()
    };
    store.update(&id, &patch).await?;

    let after = store.find_by_email("ana@example.com").await?.context("profile missing after update")?;
    assert_eq!(after.id, id);
    assert_eq!(after.fields.age, Some(41.0));

    let mut expected = before.fields.clone();
    expected.age = Some(41.0);
    assert_eq!(after.fields, expected);

    let missing = store.update("no-such-id", &patch).await;
    assert!(matches!(missing, Err(StoreError::NotFound(_))));

    scratch.drop_schema().await
}

#[tokio::test]
async fn duplicate_email_conflicts() -> Result<()> {
    let Some(scratch) = ScratchStore::open().await? else {
        return Ok(());
    };
    let store = &scratch.store;

    let first = store.insert(fields("ana@example.com", None, None, None)).await?;
    let dup = store.insert(fields("ana@example.com", None, None, None)).await;
    let err = match dup {
        Err(err @ StoreError::Conflict(_)) => err,
        other => anyhow::bail!("expected conflict, got {:?}", other.map(|_| ())),
    };
    let api: ApiError = ProfileError::from(err).into();
    assert_eq!(api.status_code(), StatusCode::CONFLICT);

    let other = store.insert(fields("bo@example.com", None, None, None)).await?;
    let steal = ProfileFields {
        email: Some("ana@example.com".to_string()),
        ..Default::default()
    };
    assert!(matches!(store.update(&other, &steal).await, Err(StoreError::Conflict(_))));
    assert!(store.get(&first).await?.is_some());

    store.ping().await?;
    scratch.drop_schema().await
}
