use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use super::{ProfileStore, StoreError};
use crate::config::StoreConfig;
use crate::profile::{Profile, ProfileFields};

const COLUMNS: &str = "id, name, email, age, achievements, total_average_weight_ratings, number_of_rents, recently_active";

// Sentinels put missing ranking values below every stored value.
const RANK_KEYS: &str = "COALESCE(total_average_weight_ratings, '-Infinity'::float8), \
     COALESCE(number_of_rents, -1), \
     COALESCE(recently_active, '-9223372036854775808'::bigint), \
     id COLLATE \"C\"";

const RANK_ORDER: &str = "COALESCE(total_average_weight_ratings, '-Infinity'::float8) DESC, \
     COALESCE(number_of_rents, -1) DESC, \
     COALESCE(recently_active, '-9223372036854775808'::bigint) DESC, \
     id COLLATE \"C\" DESC";

const SCHEMA: [&str; 3] = [
    r#"
    CREATE TABLE IF NOT EXISTS profiles (
        id TEXT PRIMARY KEY,
        name TEXT,
        email TEXT,
        age DOUBLE PRECISION,
        achievements TEXT[],
        total_average_weight_ratings DOUBLE PRECISION,
        number_of_rents INTEGER,
        recently_active BIGINT
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS profiles_email_key ON profiles (email)",
    r#"
    CREATE INDEX IF NOT EXISTS profiles_ranking_idx ON profiles (
        COALESCE(total_average_weight_ratings, '-Infinity'::float8) DESC,
        COALESCE(number_of_rents, -1) DESC,
        COALESCE(recently_active, '-9223372036854775808'::bigint) DESC,
        id COLLATE "C" DESC
    )
    "#,
];

#[derive(Debug, FromRow)]
struct ProfileRow {
    id: String,
    name: Option<String>,
    email: Option<String>,
    age: Option<f64>,
    achievements: Option<Vec<String>>,
    total_average_weight_ratings: Option<f64>,
    number_of_rents: Option<i32>,
    recently_active: Option<i64>,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = StoreError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        let number_of_rents = row
            .number_of_rents
            .map(u32::try_from)
            .transpose()
            .map_err(|_| StoreError::Corrupt(format!("negative number_of_rents on {}", row.id)))?;

        Ok(Profile {
            id: row.id,
            fields: ProfileFields {
                name: row.name,
                email: row.email,
                age: row.age,
                achievements: row.achievements,
                total_average_weight_ratings: row.total_average_weight_ratings,
                number_of_rents,
                recently_active: row.recently_active,
            },
        })
    }
}

/// PostgreSQL-backed store; one `profiles` table, one row per document.
pub struct PgProfileStore {
    pool: PgPool,
}

impl PgProfileStore {
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let url = config
            .database_url
            .as_deref()
            .ok_or(StoreError::ConfigMissing("DATABASE_URL"))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;

        info!("Connected profile store pool (max_connections={})", config.max_connections);
        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the profiles table and its indexes if they are missing.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("Profile store schema ready");
        Ok(())
    }

    fn number_of_rents_column(value: Option<u32>) -> Result<Option<i32>, StoreError> {
        value
            .map(i32::try_from)
            .transpose()
            .map_err(|_| StoreError::Corrupt("number_of_rents exceeds column range".to_string()))
    }
}

fn map_write_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Conflict("email already in use".to_string())
        }
        _ => StoreError::Sqlx(err),
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    fn backend_tag(&self) -> &'static str {
        "postgres"
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Profile>, StoreError> {
        let sql = format!("SELECT {} FROM profiles WHERE email = $1 LIMIT 1", COLUMNS);
        let row = sqlx::query_as::<_, ProfileRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Profile::try_from).transpose()
    }

    async fn get(&self, id: &str) -> Result<Option<Profile>, StoreError> {
        let sql = format!("SELECT {} FROM profiles WHERE id = $1", COLUMNS);
        let row = sqlx::query_as::<_, ProfileRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Profile::try_from).transpose()
    }

    async fn insert(&self, fields: ProfileFields) -> Result<String, StoreError> {
        let id = Uuid::new_v4().to_string();
        let sql = format!(
            "INSERT INTO profiles ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            COLUMNS
        );

        sqlx::query(&sql)
            .bind(&id)
            .bind(&fields.name)
            .bind(&fields.email)
            .bind(fields.age)
            .bind(&fields.achievements)
            .bind(fields.total_average_weight_ratings)
            .bind(Self::number_of_rents_column(fields.number_of_rents)?)
            .bind(fields.recently_active)
            .execute(&self.pool)
            .await
            .map_err(map_write_error)?;

        Ok(id)
    }

    async fn update(&self, id: &str, patch: &ProfileFields) -> Result<(), StoreError> {
        // Single statement: absent fields bind NULL and keep their stored value.
        let sql = r#"
            UPDATE profiles SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                age = COALESCE($4, age),
                achievements = COALESCE($5, achievements),
                total_average_weight_ratings = COALESCE($6, total_average_weight_ratings),
                number_of_rents = COALESCE($7, number_of_rents),
                recently_active = COALESCE($8, recently_active)
            WHERE id = $1
        "#;

        let result = sqlx::query(sql)
            .bind(id)
            .bind(&patch.name)
            .bind(&patch.email)
            .bind(patch.age)
            .bind(&patch.achievements)
            .bind(patch.total_average_weight_ratings)
            .bind(Self::number_of_rents_column(patch.number_of_rents)?)
            .bind(patch.recently_active)
            .execute(&self.pool)
            .await
            .map_err(map_write_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("document {}", id)));
        }
        Ok(())
    }

    async fn list_ranked(&self, after: Option<&Profile>, limit: usize) -> Result<Vec<Profile>, StoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let rows = match after {
            None => {
                let sql = format!("SELECT {} FROM profiles ORDER BY {} LIMIT $1", COLUMNS, RANK_ORDER);
                sqlx::query_as::<_, ProfileRow>(&sql)
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await?
            }
            Some(cursor) => {
                // Every key sorts descending, so "after" is a plain row comparison.
                let sql = format!(
                    "SELECT {} FROM profiles \
                     WHERE ({}) < (COALESCE($1, '-Infinity'::float8), COALESCE($2, -1), COALESCE($3, '-9223372036854775808'::bigint), $4::text COLLATE \"C\") \
                     ORDER BY {} LIMIT $5",
                    COLUMNS, RANK_KEYS, RANK_ORDER
                );
                sqlx::query_as::<_, ProfileRow>(&sql)
                    .bind(cursor.fields.total_average_weight_ratings)
                    .bind(Self::number_of_rents_column(cursor.fields.number_of_rents)?)
                    .bind(cursor.fields.recently_active)
                    .bind(&cursor.id)
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        rows.into_iter().map(Profile::try_from).collect()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("Closed profile store pool");
    }
}
