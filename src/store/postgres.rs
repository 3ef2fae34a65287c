use async_trait::async_trait;
use deadpool_postgres::{ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime};
use tokio_postgres::error::SqlState;
use tokio_postgres::config::Host;
use tokio_postgres::{NoTls, Row};
use uuid::Uuid;

use std::time::Duration;

use crate::error::{AppError, Result};
use crate::models::user::{Dean, Student};
use crate::store::UserStore;

/// Production store backend.
///
/// Students and deans are kept as JSONB documents in one table per
/// collection. The `university_id` column mirrors the document field so
/// the per-collection UNIQUE constraint and the findOne lookup stay in
/// SQL; `seq` fixes record order; `version` on deans backs the
/// conditional save.
#[derive(Clone)]
pub struct PostgresStore {
    pool: Pool,
}

/// Creates a new database connection pool.
fn create_pool(database_url: &str) -> Result<Pool> {
    let mut cfg = deadpool_postgres::Config::new();
    let pg_config: tokio_postgres::Config = database_url
        .parse()
        .map_err(AppError::Database)?;

    if let Some(Host::Tcp(hostname)) = pg_config.get_hosts().first() {
        cfg.host = Some(hostname.to_string());
    }
    if let Some(port) = pg_config.get_ports().first() {
        cfg.port = Some(*port);
    }

    if let Some(dbname) = pg_config.get_dbname() {
        cfg.dbname = Some(dbname.to_string());
    }

    if let Some(user) = pg_config.get_user() {
        cfg.user = Some(user.to_string());
    }

    if let Some(password) = pg_config.get_password() {
        cfg.password = Some(String::from_utf8_lossy(password).to_string());
    }

    cfg.manager = Some(ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    });

    cfg.pool = Some(PoolConfig {
        max_size: 100,
        timeouts: deadpool_postgres::Timeouts {
            wait: Some(Duration::from_secs(5)),
            create: Some(Duration::from_secs(2)),
            recycle: Some(Duration::from_secs(1)),
        },
        queue_mode: Default::default(),
    });

    cfg.create_pool(Some(Runtime::Tokio1), NoTls)
        .map_err(|e| AppError::Persistence(format!("Failed to create pool: {}", e)))
}

fn row_to_student(row: &Row) -> Result<Student> {
    let doc: serde_json::Value = row
        .try_get("doc")
        .map_err(|_| AppError::Persistence("Missing student document".to_string()))?;
    serde_json::from_value(doc)
        .map_err(|e| AppError::Persistence(format!("Malformed student document: {}", e)))
}

fn row_to_dean(row: &Row) -> Result<Dean> {
    let doc: serde_json::Value = row
        .try_get("doc")
        .map_err(|_| AppError::Persistence("Missing dean document".to_string()))?;
    let mut dean: Dean = serde_json::from_value(doc)
        .map_err(|e| AppError::Persistence(format!("Malformed dean document: {}", e)))?;
    // The version column is authoritative over the copy in the document.
    dean.version = row
        .try_get("version")
        .map_err(|_| AppError::Persistence("Missing dean version".to_string()))?;
    Ok(dean)
}

fn map_insert_error(e: tokio_postgres::Error) -> AppError {
    if e.code() == Some(&SqlState::UNIQUE_VIOLATION) {
        AppError::Validation("University ID is already registered".to_string())
    } else {
        AppError::Database(e)
    }
}

impl PostgresStore {
    /// Connects to the database and ensures the schema exists.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = create_pool(database_url)?;
        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    async fn ensure_schema(&self) -> Result<()> {
        let client = self.pool.get().await?;
        client
            .batch_execute(
                r#"
                CREATE TABLE IF NOT EXISTS students (
                    id UUID PRIMARY KEY,
                    seq BIGSERIAL,
                    university_id TEXT NOT NULL UNIQUE,
                    doc JSONB NOT NULL
                );
                CREATE TABLE IF NOT EXISTS deans (
                    id UUID PRIMARY KEY,
                    seq BIGSERIAL,
                    university_id TEXT NOT NULL UNIQUE,
                    doc JSONB NOT NULL,
                    version BIGINT NOT NULL DEFAULT 0
                );
                "#,
            )
            .await?;
        tracing::debug!("Schema ensured");
        Ok(())
    }
}

#[async_trait]
impl UserStore for PostgresStore {
    async fn insert_student(&self, student: &Student) -> Result<()> {
        let doc = serde_json::to_value(student)
            .map_err(|e| AppError::Persistence(format!("Student encode error: {}", e)))?;
        let client = self.pool.get().await?;
        client
            .execute(
                r#"
                INSERT INTO students (id, university_id, doc)
                VALUES ($1, $2, $3)
                "#,
                &[&student.id, &student.university_id, &doc],
            )
            .await
            .map_err(map_insert_error)?;
        Ok(())
    }

    async fn insert_dean(&self, dean: &Dean) -> Result<()> {
        let doc = serde_json::to_value(dean)
            .map_err(|e| AppError::Persistence(format!("Dean encode error: {}", e)))?;
        let client = self.pool.get().await?;
        client
            .execute(
                r#"
                INSERT INTO deans (id, university_id, doc, version)
                VALUES ($1, $2, $3, $4)
                "#,
                &[&dean.id, &dean.university_id, &doc, &dean.version],
            )
            .await
            .map_err(map_insert_error)?;
        Ok(())
    }

    async fn find_student_by_id(&self, id: Uuid) -> Result<Option<Student>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                r#"
                SELECT doc
                FROM students
                WHERE id = $1
                "#,
                &[&id],
            )
            .await?;
        row.map(|r| row_to_student(&r)).transpose()
    }

    async fn find_dean_by_id(&self, id: Uuid) -> Result<Option<Dean>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                r#"
                SELECT doc, version
                FROM deans
                WHERE id = $1
                "#,
                &[&id],
            )
            .await?;
        row.map(|r| row_to_dean(&r)).transpose()
    }

    async fn find_student_by_university_id(
        &self,
        university_id: &str,
    ) -> Result<Option<Student>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                r#"
                SELECT doc
                FROM students
                WHERE university_id = $1
                "#,
                &[&university_id],
            )
            .await?;
        row.map(|r| row_to_student(&r)).transpose()
    }

    async fn find_dean_by_university_id(&self, university_id: &str) -> Result<Option<Dean>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                r#"
                SELECT doc, version
                FROM deans
                WHERE university_id = $1
                "#,
                &[&university_id],
            )
            .await?;
        row.map(|r| row_to_dean(&r)).transpose()
    }

    async fn list_deans(&self) -> Result<Vec<Dean>> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                r#"
                SELECT doc, version
                FROM deans
                ORDER BY seq
                "#,
                &[],
            )
            .await?;
        rows.iter().map(row_to_dean).collect()
    }

    async fn save_student(&self, student: &Student) -> Result<()> {
        let doc = serde_json::to_value(student)
            .map_err(|e| AppError::Persistence(format!("Student encode error: {}", e)))?;
        let client = self.pool.get().await?;
        let updated = client
            .execute(
                r#"
                UPDATE students
                SET doc = $2
                WHERE id = $1
                "#,
                &[&student.id, &doc],
            )
            .await?;
        if updated == 0 {
            return Err(AppError::Persistence(format!(
                "Student {} no longer exists",
                student.id
            )));
        }
        Ok(())
    }

    async fn save_dean_checked(&self, dean: &Dean) -> Result<bool> {
        let mut bumped = dean.clone();
        bumped.version = dean.version + 1;
        let doc = serde_json::to_value(&bumped)
            .map_err(|e| AppError::Persistence(format!("Dean encode error: {}", e)))?;
        let client = self.pool.get().await?;
        let updated = client
            .execute(
                r#"
                UPDATE deans
                SET doc = $2, version = version + 1
                WHERE id = $1 AND version = $3
                "#,
                &[&dean.id, &doc, &dean.version],
            )
            .await?;
        Ok(updated == 1)
    }
}
