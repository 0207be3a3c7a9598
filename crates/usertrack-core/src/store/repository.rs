//! `SQLite`-backed user store.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqliteRow};
use sqlx::{ConnectOptions, Connection, Row};
use tracing::{debug, warn};

use super::model::{NewUser, User};
use crate::{Error, Result};

/// How long a writer waits for another process holding the lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// `CURRENT_TIMESTAMP` text, as written by older stores.
const SQLITE_TIMESTAMP: &str = "%Y-%m-%d %H:%M:%S";

/// A single connection to the user table.
///
/// The connection is closed by [`UserStore::close`] or when the store is
/// dropped.
pub struct UserStore {
    conn: SqliteConnection,
}

impl UserStore {
    /// Opens the store at `path`, creating the file and schema if missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or schema creation fails.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT)
            .connect()
            .await?;
        debug!(path = %path.display(), "opened user store");

        let mut store = Self { conn };
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Create an in-memory store for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn in_memory() -> Result<Self> {
        let conn = SqliteConnection::connect("sqlite::memory:").await?;
        let mut store = Self { conn };
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Creates the `users` table if it does not exist. Safe to call repeatedly.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement fails.
    pub async fn ensure_schema(&mut self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                email TEXT,
                city TEXT,
                country TEXT,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&mut self.conn)
        .await?;

        Ok(())
    }

    /// Inserts `user` unless a user with the same name exists.
    ///
    /// Returns the number of rows written: 1 for a new user, 0 for a
    /// duplicate. The transaction is committed before returning.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUser`] for a blank name or one containing
    /// control characters, or the database error.
    pub async fn add_user(&mut self, user: &NewUser) -> Result<u64> {
        let name = user.name.trim();
        if name.is_empty() {
            return Err(Error::InvalidUser("name must not be blank".into()));
        }
        if name.chars().any(char::is_control) {
            return Err(Error::InvalidUser(format!(
                "name must not contain control characters: {name:?}"
            )));
        }

        let mut tx = self.conn.begin().await?;
        let result = sqlx::query(
            r"
            INSERT INTO users (name, email, city, country, created_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(name) DO NOTHING
            ",
        )
        .bind(name)
        .bind(user.email.as_deref())
        .bind(user.city.as_deref())
        .bind(user.country.as_deref())
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        let written = result.rows_affected();
        debug!(name, rows_written = written, "insert attempted");
        Ok(written)
    }

    /// Looks up a user by exact name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_name(&mut self, name: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            r"
            SELECT id, name, email, city, country, created_at
            FROM users
            WHERE name = ?
            ",
        )
        .bind(name.trim())
        .fetch_optional(&mut self.conn)
        .await?;

        Ok(row.as_ref().and_then(row_to_user))
    }

    /// Returns every user, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_users(&mut self) -> Result<Vec<User>> {
        let rows = sqlx::query(
            r"
            SELECT id, name, email, city, country, created_at
            FROM users
            ORDER BY id ASC
            ",
        )
        .fetch_all(&mut self.conn)
        .await?;

        Ok(rows.iter().filter_map(row_to_user).collect())
    }

    /// Returns the number of stored users.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count(&mut self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&mut self.conn)
            .await?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// Closes the connection, flushing the WAL.
    ///
    /// # Errors
    ///
    /// Returns an error if the close handshake fails.
    pub async fn close(self) -> Result<()> {
        self.conn.close().await?;
        Ok(())
    }
}

fn row_to_user(row: &SqliteRow) -> Option<User> {
    let id: i64 = row.get("id");
    let created_at: String = row.get("created_at");
    let Some(created_at) = parse_timestamp(&created_at) else {
        warn!(id, created_at, "skipping user with unreadable timestamp");
        return None;
    };

    Some(User {
        id,
        name: row.get("name"),
        email: row.get("email"),
        city: row.get("city"),
        country: row.get("country"),
        created_at,
    })
}

/// Accepts RFC 3339 and SQLite's `CURRENT_TIMESTAMP` form (UTC).
fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|ts| ts.with_timezone(&Utc))
        .or_else(|_| NaiveDateTime::parse_from_str(text, SQLITE_TIMESTAMP).map(|ts| ts.and_utc()))
        .ok()
}
