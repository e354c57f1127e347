use anyhow::{Context, Result};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use std::path::Path;
use std::time::Duration;

use super::repositories::EngagementRepository;
use super::schema::{SCHEMA, SEED_DATA};

/// SQLite in-memory database identifier
const MEMORY_DB_PATH: &str = ":memory:";

/// How long a writer waits on a locked database before giving up
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Database wrapper with connection pooling support
#[derive(Clone)]
pub struct Database {
    pub pool: DbPool,
}

impl Database {
    /// Create a new database connection pool
    ///
    /// Every `:memory:` connection is its own database, so in-memory pools are
    /// limited to a single connection.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let (manager, in_memory) = Self::create_connection_manager(path);
        let manager = manager.with_init(|conn| {
            conn.busy_timeout(BUSY_TIMEOUT)?;
            conn.execute_batch("PRAGMA foreign_keys = ON;")
        });

        let mut builder = Pool::builder();
        if in_memory {
            builder = builder.max_size(1);
        }
        let pool = builder
            .build(manager)
            .context("Failed to create database connection pool")?;
        Ok(Self { pool })
    }

    /// Create appropriate connection manager based on path
    fn create_connection_manager<P: AsRef<Path>>(path: P) -> (SqliteConnectionManager, bool) {
        let path_str = path.as_ref().to_string_lossy();
        if path_str.trim().eq_ignore_ascii_case(MEMORY_DB_PATH) {
            (SqliteConnectionManager::memory(), true)
        } else {
            (SqliteConnectionManager::file(path), false)
        }
    }

    /// Create an in-memory database pool (useful for testing)
    pub fn in_memory() -> Result<Self> {
        Self::new(MEMORY_DB_PATH)
    }

    /// Initialize the database schema
    pub fn initialize(&self) -> Result<()> {
        let conn = self.connection()?;
        conn.execute_batch(SCHEMA)
            .context("Failed to initialize database schema")?;
        Ok(())
    }

    /// Seed the database with demo data and bring counters in line with it
    pub fn seed_demo_data(&self) -> Result<()> {
        {
            let conn = self.connection()?;
            conn.execute_batch(SEED_DATA)
                .context("Failed to seed demo data")?;
        }
        EngagementRepository::new(self.pool.clone()).reconcile_counters()?;
        Ok(())
    }

    /// Get a connection from the pool
    pub fn connection(&self) -> Result<DbConnection> {
        self.pool
            .get()
            .context("Failed to get database connection from pool")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_names(db: &Database) -> Vec<String> {
        let conn = db.connection().expect("Failed to get connection");
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table'")
            .expect("Failed to prepare statement");
        let tables = stmt
            .query_map([], |row| row.get(0))
            .expect("Failed to query tables")
            .collect::<Result<Vec<String>, _>>()
            .expect("Failed to collect tables");
        tables
    }

    #[test]
    fn test_database_creation() {
        let db = Database::in_memory().expect("Failed to create database");
        db.initialize().expect("Failed to initialize schema");

        let tables = table_names(&db);
        for expected in [
            "users",
            "posts",
            "likes",
            "saves",
            "comments",
            "follows",
            "message_threads",
            "messages",
            "notifications",
            "jobs",
            "saved_jobs",
            "portal_system",
            "sessions",
        ] {
            assert!(tables.contains(&expected.to_string()), "missing table {expected}");
        }
    }

    #[test]
    fn test_initialize_is_repeatable() {
        let db = Database::in_memory().expect("Failed to create database");
        db.initialize().expect("first initialize");
        db.initialize().expect("second initialize");
    }

    #[test]
    fn test_seed_demo_data() {
        let db = Database::in_memory().expect("Failed to create database");
        db.initialize().expect("Failed to initialize schema");
        db.seed_demo_data().expect("Failed to seed demo data");
        // Seeding twice must not duplicate rows or drift counters
        db.seed_demo_data().expect("Failed to reseed demo data");

        let conn = db.connection().expect("Failed to get connection");
        let portal: i64 = conn
            .query_row("SELECT COUNT(*) FROM users WHERE username = 'portal'", [], |row| {
                row.get(0)
            })
            .expect("Failed to count portal user");
        assert_eq!(portal, 1);

        let drift: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM posts p
                 WHERE p.likes_count != (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id)
                    OR p.comments_count != (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id)",
                [],
                |row| row.get(0),
            )
            .expect("Failed to check counters");
        assert_eq!(drift, 0);
    }

    #[test]
    fn test_foreign_keys_enforced() {
        let db = Database::in_memory().expect("Failed to create database");
        db.initialize().expect("Failed to initialize schema");

        let conn = db.connection().expect("Failed to get connection");
        let result = conn.execute(
            "INSERT INTO likes (user_id, post_id, created_at) VALUES ('nope', 'nope', '2024-01-01T00:00:00.000000Z')",
            [],
        );
        assert!(result.is_err(), "dangling like should violate foreign keys");
    }

    #[test]
    fn test_memory_database_detection() {
        for path in [":memory:", " :memory: ", ":MEMORY:"] {
            let db = Database::new(path).expect("Failed to create memory database");
            db.initialize().expect("Failed to initialize schema");
            assert_eq!(db.pool.max_size(), 1);
        }

        let temp_path = std::env::temp_dir().join(format!("portal_{}.db", uuid::Uuid::new_v4()));
        let db = Database::new(&temp_path).expect("Failed to create file database");
        db.initialize().expect("Failed to initialize file schema");
        assert!(db.pool.max_size() > 1);

        drop(db);
        let _ = std::fs::remove_file(temp_path);
    }
}
