//! SQLite connection pool and schema.
//!
//! Table operations live in `db::tables`, one `impl Database` block per table.

use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::path::Path;

pub type DbConn = r2d2::PooledConnection<SqliteConnectionManager>;
pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("could not find a free position in note {note_id} after renormalizing")]
    PositionsExhausted { note_id: String },
}

/// True when the error is a UNIQUE constraint violation.
pub fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

/// Current time as epoch milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        username TEXT NOT NULL,
        email TEXT NOT NULL,
        created_at INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS folders (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        name TEXT NOT NULL,
        last_modified INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_folders_user ON folders(user_id);

    CREATE TABLE IF NOT EXISTS notes (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        folder_id TEXT REFERENCES folders(id) ON DELETE SET NULL,
        title TEXT NOT NULL,
        content TEXT NOT NULL,
        last_modified INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_notes_user ON notes(user_id);
    CREATE INDEX IF NOT EXISTS idx_notes_folder ON notes(folder_id);

    CREATE TABLE IF NOT EXISTS note_items (
        id TEXT PRIMARY KEY,
        note_id TEXT NOT NULL REFERENCES notes(id) ON DELETE CASCADE,
        content TEXT NOT NULL,
        is_checked INTEGER NOT NULL DEFAULT 0,
        indents INTEGER NOT NULL DEFAULT 0,
        position INTEGER NOT NULL,
        last_modified INTEGER NOT NULL,
        UNIQUE(note_id, position)
    );

    CREATE TABLE IF NOT EXISTS note_references (
        id TEXT PRIMARY KEY,
        parent_note_id TEXT NOT NULL REFERENCES notes(id) ON DELETE CASCADE,
        referenced_note_id TEXT NOT NULL,
        position INTEGER NOT NULL DEFAULT 0,
        created_at INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_note_references_parent ON note_references(parent_note_id);
    CREATE INDEX IF NOT EXISTS idx_note_references_target ON note_references(referenced_note_id);
";

/// Pooled SQLite database
pub struct Database {
    pool: r2d2::Pool<SqliteConnectionManager>,
}

impl Database {
    /// Open (or create) the database at `database_url`. `":memory:"` gives a
    /// private in-memory database backed by a single connection.
    pub fn new(database_url: &str, pool_size: u32) -> DbResult<Self> {
        if database_url == crate::config::MEMORY_DATABASE_URL {
            return Self::open_in_memory();
        }

        if let Some(parent) = Path::new(database_url).parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    log::warn!("Could not create database directory {:?}: {}", parent, e);
                }
            }
        }

        let manager = SqliteConnectionManager::file(database_url).with_init(|conn| {
            conn.execute_batch(
                "PRAGMA foreign_keys = ON;
                 PRAGMA journal_mode = WAL;
                 PRAGMA busy_timeout = 5000;",
            )
        });
        let pool = r2d2::Pool::builder().max_size(pool_size).build(manager)?;

        let db = Self { pool };
        db.init_schema()?;
        log::info!("Opened database at {} (pool size {})", database_url, pool_size);
        Ok(db)
    }

    /// Every in-memory connection is its own database, so the pool holds exactly one.
    pub fn open_in_memory() -> DbResult<Self> {
        let manager = SqliteConnectionManager::memory()
            .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));
        let pool = r2d2::Pool::builder()
            .max_size(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .build(manager)?;

        let db = Self { pool };
        db.init_schema()?;
        Ok(db)
    }

    /// Check a connection out of the pool
    pub fn conn(&self) -> DbResult<DbConn> {
        Ok(self.pool.get()?)
    }

    fn init_schema(&self) -> DbResult<()> {
        let conn = self.conn()?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Cheap round trip used by the health endpoint
    pub fn ping(&self) -> DbResult<()> {
        let conn = self.conn()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }

    /// Insert a demo user with three notes. Skipped when the demo user exists.
    pub fn seed_demo_data(&self) -> DbResult<bool> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        if user_exists(&tx, DEMO_USER_ID)? {
            return Ok(false);
        }

        let now = now_millis();
        tx.execute(
            "INSERT INTO users (id, username, email, created_at) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![DEMO_USER_ID, "Test User", "test@example.com", now],
        )?;

        let day_ms: i64 = 86_400_000;
        let notes = [
            ("note1", "My first note", r#"{"lines": [{"id": "l1", "text": "This is my first note"}]}"#, now),
            (
                "note2",
                "Shopping list",
                r#"{"lines": [{"id": "l1", "text": "Milk"}, {"id": "l2", "text": "Bread"}, {"id": "l3", "text": "Butter"}]}"#,
                now - day_ms,
            ),
            (
                "note3",
                "To-do",
                r#"{"lines": [{"id": "l1", "text": "Finish the project"}, {"id": "l2", "text": "Call the doctor"}]}"#,
                now - 2 * day_ms,
            ),
        ];
        for (id, title, content, last_modified) in notes {
            tx.execute(
                "INSERT INTO notes (id, user_id, folder_id, title, content, last_modified)
                 VALUES (?1, ?2, NULL, ?3, ?4, ?5)",
                rusqlite::params![id, DEMO_USER_ID, title, content, last_modified],
            )?;
        }

        tx.commit()?;
        log::info!("Seeded demo user '{}' with {} notes", DEMO_USER_ID, notes.len());
        Ok(true)
    }
}

pub const DEMO_USER_ID: &str = "user1";

fn user_exists(conn: &Connection, user_id: &str) -> rusqlite::Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM users WHERE id = ?1",
        [user_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}
