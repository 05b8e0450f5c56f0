// SQLite implementation of the AccountStore trait

use crate::core::accounts::{AccountError, AccountStore, Doctor, NewDoctor, NewUser, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::future::Future;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

const WRITE_ATTEMPTS: u32 = 3;
const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

/// Pool sizing and wait bounds.
#[derive(Debug, Clone)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub min_connections: u32,
    /// How long a request waits for a free connection.
    pub acquire_timeout: Duration,
    /// How long a statement waits on a locked database.
    pub busy_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 20,
            min_connections: 5,
            acquire_timeout: Duration::from_secs(10),
            busy_timeout: Duration::from_secs(30),
        }
    }
}

pub struct SqliteAccountStore {
    pool: SqlitePool,
}

impl SqliteAccountStore {
    /// Opens (and creates if needed) the database and runs migrations.
    pub async fn new(database_url: &str, settings: &PoolSettings) -> anyhow::Result<Self> {
        let in_memory = database_url.contains(":memory:");

        if !in_memory {
            let path_str = database_url
                .trim_start_matches("sqlite://")
                .trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
        }

        let conn_str = if database_url.starts_with("sqlite:") {
            database_url.to_string()
        } else {
            format!("sqlite://{}", database_url)
        };

        let options = SqliteConnectOptions::from_str(&conn_str)?
            .create_if_missing(true)
            .busy_timeout(settings.busy_timeout);

        // Every connection to :memory: is its own database, so keep exactly one alive.
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
                .max_connections(settings.max_connections.max(1))
                .min_connections(settings.min_connections.min(settings.max_connections))
        };

        let pool = pool_options
            .acquire_timeout(settings.acquire_timeout)
            .connect_with(options)
            .await?;

        tracing::info!(
            max_connections = settings.max_connections,
            min_connections = settings.min_connections,
            "Account database pool ready"
        );

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Run database migrations to create tables.
    async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                full_name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                phone TEXT NOT NULL,
                landmark TEXT NOT NULL DEFAULT '',
                location TEXT NOT NULL DEFAULT '',
                password TEXT NOT NULL,
                age INTEGER NOT NULL,
                gender TEXT NOT NULL DEFAULT '',
                condition TEXT NOT NULL DEFAULT '',
                medications TEXT NOT NULL DEFAULT '',
                allergies TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS doctors (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                full_name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                phone TEXT NOT NULL,
                password TEXT NOT NULL,
                specialization TEXT NOT NULL,
                license_number TEXT NOT NULL,
                location TEXT NOT NULL DEFAULT '',
                affiliation TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn row_to_user(row: &SqliteRow) -> Result<User, sqlx::Error> {
        Ok(User {
            id: row.try_get("id")?,
            full_name: row.try_get("full_name")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            landmark: row.try_get("landmark")?,
            location: row.try_get("location")?,
            password: row.try_get("password")?,
            age: row.try_get::<i64, _>("age")?.clamp(0, u32::MAX as i64) as u32,
            gender: row.try_get("gender")?,
            condition: row.try_get("condition")?,
            medications: row.try_get("medications")?,
            allergies: row.try_get("allergies")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_doctor(row: &SqliteRow) -> Result<Doctor, sqlx::Error> {
        Ok(Doctor {
            id: row.try_get("id")?,
            full_name: row.try_get("full_name")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            password: row.try_get("password")?,
            specialization: row.try_get("specialization")?,
            license_number: row.try_get("license_number")?,
            location: row.try_get("location")?,
            affiliation: row.try_get("affiliation")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// SQLITE_BUSY (5) and SQLITE_LOCKED (6), including their extended codes.
fn is_transient(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => true,
        sqlx::Error::Database(db) => db
            .code()
            .and_then(|code| code.parse::<i32>().ok())
            .is_some_and(|code| matches!(code & 0xff, 5 | 6)),
        _ => false,
    }
}

fn storage_error(err: sqlx::Error) -> AccountError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => AccountError::DuplicateEmail,
        _ => AccountError::Storage(err.to_string()),
    }
}

/// Runs a write, retrying transient failures with exponential backoff.
async fn with_write_retry<T, F, Fut>(operation: &str, mut write: F) -> Result<T, sqlx::Error>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, sqlx::Error>>,
{
    let mut attempt = 1;
    loop {
        match write().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < WRITE_ATTEMPTS && is_transient(&err) => {
                let delay = RETRY_BASE_DELAY * 2u32.pow(attempt);
                tracing::warn!(operation, attempt, ?delay, "Transient database error: {}", err);
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => {
                tracing::error!(operation, attempt, "Database write failed: {}", err);
                return Err(err);
            }
        }
    }
}

#[async_trait]
impl AccountStore for SqliteAccountStore {
    async fn insert_user(
        &self,
        user: &NewUser,
        created_at: DateTime<Utc>,
    ) -> Result<User, AccountError> {
        let pool = &self.pool;
        let result = with_write_retry("insert_user", || async move {
            sqlx::query(
                r#"
                INSERT INTO users (full_name, email, phone, landmark, location, password,
                                   age, gender, condition, medications, allergies, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&user.full_name)
            .bind(&user.email)
            .bind(&user.phone)
            .bind(&user.landmark)
            .bind(&user.location)
            .bind(&user.password)
            .bind(user.age as i64)
            .bind(&user.gender)
            .bind(&user.condition)
            .bind(&user.medications)
            .bind(&user.allergies)
            .bind(created_at)
            .execute(pool)
            .await
        })
        .await
        .map_err(storage_error)?;

        Ok(User {
            id: result.last_insert_rowid(),
            full_name: user.full_name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            landmark: user.landmark.clone(),
            location: user.location.clone(),
            password: user.password.clone(),
            age: user.age,
            gender: user.gender.clone(),
            condition: user.condition.clone(),
            medications: user.medications.clone(),
            allergies: user.allergies.clone(),
            created_at,
        })
    }

    async fn insert_doctor(
        &self,
        doctor: &NewDoctor,
        created_at: DateTime<Utc>,
    ) -> Result<Doctor, AccountError> {
        let pool = &self.pool;
        let result = with_write_retry("insert_doctor", || async move {
            sqlx::query(
                r#"
                INSERT INTO doctors (full_name, email, phone, password, specialization,
                                     license_number, location, affiliation, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&doctor.full_name)
            .bind(&doctor.email)
            .bind(&doctor.phone)
            .bind(&doctor.password)
            .bind(&doctor.specialization)
            .bind(&doctor.license_number)
            .bind(&doctor.location)
            .bind(&doctor.affiliation)
            .bind(created_at)
            .execute(pool)
            .await
        })
        .await
        .map_err(storage_error)?;

        Ok(Doctor {
            id: result.last_insert_rowid(),
            full_name: doctor.full_name.clone(),
            email: doctor.email.clone(),
            phone: doctor.phone.clone(),
            password: doctor.password.clone(),
            specialization: doctor.specialization.clone(),
            license_number: doctor.license_number.clone(),
            location: doctor.location.clone(),
            affiliation: doctor.affiliation.clone(),
            created_at,
        })
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AccountError> {
        let row = sqlx::query("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;

        row.as_ref()
            .map(Self::row_to_user)
            .transpose()
            .map_err(storage_error)
    }

    async fn find_doctor_by_email(&self, email: &str) -> Result<Option<Doctor>, AccountError> {
        let row = sqlx::query("SELECT * FROM doctors WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;

        row.as_ref()
            .map(Self::row_to_doctor)
            .transpose()
            .map_err(storage_error)
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>, AccountError> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;

        row.as_ref()
            .map(Self::row_to_user)
            .transpose()
            .map_err(storage_error)
    }

    async fn get_doctor(&self, id: i64) -> Result<Option<Doctor>, AccountError> {
        let row = sqlx::query("SELECT * FROM doctors WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;

        row.as_ref()
            .map(Self::row_to_doctor)
            .transpose()
            .map_err(storage_error)
    }
}
