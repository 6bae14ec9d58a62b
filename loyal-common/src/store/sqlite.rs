//! Local sqlite copy of the `people` table
//!
//! Same columns as the hosted table; used for development without a
//! hosted project and for tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::path::Path;
use tracing::info;
use uuid::Uuid;

use super::PersonStore;
use crate::error::StoreError;
use crate::geo::GeoPoint;
use crate::model::{NewPerson, Person, VotePatch};

/// sqlx-backed store
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `db_path` and ensure the table exists
    pub async fn open(db_path: &Path) -> crate::Result<Self> {
        let newly_created = !db_path.exists();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&db_url)
            .await
            .map_err(StoreError::from)?;

        if newly_created {
            info!("Initialized new database: {}", db_path.display());
        } else {
            info!("Opened existing database: {}", db_path.display());
        }

        let store = Self { pool };
        store.create_people_table().await?;
        Ok(store)
    }

    /// Wrap an existing pool (table is created if missing)
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        let store = Self { pool };
        store.create_people_table().await?;
        Ok(store)
    }

    async fn create_people_table(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS people (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                gender TEXT NOT NULL CHECK (gender IN ('boy', 'girl')),
                area TEXT NOT NULL,
                quote TEXT NOT NULL,
                social_media_link TEXT,
                lat REAL NOT NULL,
                lng REAL NOT NULL,
                real_votes INTEGER NOT NULL DEFAULT 0 CHECK (real_votes >= 0),
                fake_votes INTEGER NOT NULL DEFAULT 0 CHECK (fake_votes >= 0),
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    fn person_from_row(row: &SqliteRow) -> Result<Person, StoreError> {
        let gender: String = row.try_get("gender")?;
        let real_votes: i64 = row.try_get("real_votes")?;
        let fake_votes: i64 = row.try_get("fake_votes")?;
        let social_media_link: Option<String> = row.try_get("social_media_link")?;

        Ok(Person {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            gender: gender.parse().map_err(StoreError::Decode)?,
            area: row.try_get("area")?,
            quote: row.try_get("quote")?,
            social_media_link: social_media_link.filter(|s| !s.trim().is_empty()),
            location: GeoPoint::new(row.try_get("lat")?, row.try_get("lng")?),
            real_votes: u32::try_from(real_votes)
                .map_err(|_| StoreError::Decode(format!("real_votes out of range: {}", real_votes)))?,
            fake_votes: u32::try_from(fake_votes)
                .map_err(|_| StoreError::Decode(format!("fake_votes out of range: {}", fake_votes)))?,
            created_at: row.try_get::<Option<DateTime<Utc>>, _>("created_at")?,
        })
    }
}

#[async_trait]
impl PersonStore for SqliteStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn list_all(&self) -> Result<Vec<Person>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, name, gender, area, quote, social_media_link, lat, lng,
                    real_votes, fake_votes, created_at
             FROM people
             ORDER BY created_at ASC, rowid ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::person_from_row).collect()
    }

    async fn insert(&self, person: &NewPerson) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO people (id, name, gender, area, quote, social_media_link, lat, lng, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&person.name)
        .bind(person.gender.as_str())
        .bind(&person.area)
        .bind(&person.quote)
        .bind(&person.social_media_link)
        .bind(person.location.lat)
        .bind(person.location.lng)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_votes(&self, id: &str, patch: VotePatch) -> Result<(), StoreError> {
        if patch.is_empty() {
            return Ok(());
        }

        let result = sqlx::query(
            "UPDATE people
             SET real_votes = COALESCE(?, real_votes),
                 fake_votes = COALESCE(?, fake_votes)
             WHERE id = ?",
        )
        .bind(patch.real_votes.map(i64::from))
        .bind(patch.fake_votes.map(i64::from))
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Api {
                status: 404,
                message: format!("no row with id {}", id),
            });
        }
        Ok(())
    }
}
