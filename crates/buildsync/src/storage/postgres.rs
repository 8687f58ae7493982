//! PostgreSQL storage implementation

use super::traits::*;
use crate::error::{StorageError, StorageResult};
use crate::project::ProjectRecord;
use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::time::Duration;

/// Key of the single access token row
const ACCESS_TOKEN_ID: &str = "github";

/// PostgreSQL-backed storage
#[derive(Debug, Clone)]
pub struct PostgresStorage {
    pool: PgPool,
}

impl PostgresStorage {
    /// Connect to PostgreSQL and initialize schema
    pub async fn new(
        url: &str,
        max_connections: u32,
        connect_timeout_secs: u64,
    ) -> StorageResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(connect_timeout_secs))
            .connect(url)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let storage = Self { pool };
        storage.initialize_schema().await?;
        Ok(storage)
    }

    async fn initialize_schema(&self) -> StorageResult<()> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS projects (
                name TEXT PRIMARY KEY,
                schedule TEXT NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            );
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS git_auth (
                id TEXT PRIMARY KEY,
                access_token TEXT NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            );
            "#,
        ];

        for stmt in statements {
            sqlx::query(stmt)
                .execute(&self.pool)
                .await
                .map_err(|e| StorageError::Query(e.to_string()))?;
        }

        Ok(())
    }

    fn project_from_row(row: &PgRow) -> StorageResult<ProjectRecord> {
        Ok(ProjectRecord {
            name: row
                .try_get("name")
                .map_err(|e| StorageError::InvalidData(e.to_string()))?,
            schedule: row
                .try_get("schedule")
                .map_err(|e| StorageError::InvalidData(e.to_string()))?,
        })
    }
}

#[async_trait]
impl ProjectStorage for PostgresStorage {
    async fn get_project(&self, name: &str) -> StorageResult<Option<ProjectRecord>> {
        let row = sqlx::query("SELECT name, schedule FROM projects WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Query(e.to_string()))?;

        row.as_ref().map(Self::project_from_row).transpose()
    }

    async fn list_projects(&self) -> StorageResult<Vec<ProjectRecord>> {
        let rows = sqlx::query("SELECT name, schedule FROM projects ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::Query(e.to_string()))?;

        rows.iter().map(Self::project_from_row).collect()
    }

    async fn upsert_project(&self, project: ProjectRecord) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO projects (name, schedule, updated_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (name) DO UPDATE
            SET schedule = EXCLUDED.schedule, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(&project.name)
        .bind(&project.schedule)
        .bind(chrono::Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Query(e.to_string()))?;

        Ok(())
    }

    async fn delete_project(&self, name: &str) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM projects WHERE name = $1")
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Query(e.to_string()))?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl SecretStorage for PostgresStorage {
    async fn get_access_token(&self) -> StorageResult<Option<String>> {
        let row = sqlx::query("SELECT access_token FROM git_auth WHERE id = $1")
            .bind(ACCESS_TOKEN_ID)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::Query(e.to_string()))?;

        row.map(|row| {
            row.try_get("access_token")
                .map_err(|e| StorageError::InvalidData(e.to_string()))
        })
        .transpose()
    }

    async fn set_access_token(&self, token: &str) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO git_auth (id, access_token, updated_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE
            SET access_token = EXCLUDED.access_token, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(ACCESS_TOKEN_ID)
        .bind(token)
        .bind(chrono::Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Query(e.to_string()))?;

        Ok(())
    }
}
