use anyhow::{Context, Result};
use rusqlite::{OptionalExtension, Row};
use uuid::Uuid;

use portal_types::User;

use crate::db::{now, row_datetime, row_uuid, timestamp, DbPool};

const USER_COLUMNS: &str =
    "id, email, username, bio, avatar_url, followers_count, following_count, created_at";

fn map_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row_uuid(row, 0)?,
        email: row.get(1)?,
        username: row.get(2)?,
        bio: row.get(3)?,
        avatar_url: row.get(4)?,
        followers_count: row.get(5)?,
        following_count: row.get(6)?,
        created_at: row_datetime(row, 7)?,
    })
}

pub struct UserRepository {
    pool: DbPool,
}

impl UserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a user; counters start at zero
    pub fn create(&self, email: &str, username: &str, bio: Option<&str>) -> Result<User> {
        let user = User {
            id: Uuid::new_v4(),
            email: email.trim().to_string(),
            username: username.to_string(),
            bio: bio.map(str::to_string),
            avatar_url: None,
            followers_count: 0,
            following_count: 0,
            created_at: now(),
        };

        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO users (id, email, username, bio, avatar_url, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            (
                user.id.to_string(),
                &user.email,
                &user.username,
                &user.bio,
                &user.avatar_url,
                timestamp(&user.created_at),
            ),
        )
        .context("Failed to create user")?;

        Ok(user)
    }

    /// Get user by ID
    pub fn get_by_id(&self, user_id: &Uuid) -> Result<Option<User>> {
        let conn = self.pool.get()?;
        let user = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"),
                [user_id.to_string()],
                map_user,
            )
            .optional()?;
        Ok(user)
    }

    /// Get user by username
    pub fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = self.pool.get()?;
        let user = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?"),
                [username],
                map_user,
            )
            .optional()?;
        Ok(user)
    }

    /// True when either the username or the email is already registered
    pub fn is_taken(&self, username: &str, email: &str) -> Result<bool> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM users WHERE username = ?1 OR email = ?2",
            (username, email.trim()),
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    fn setup_test_db() -> (Database, UserRepository) {
        let db = Database::in_memory().expect("Failed to create test database");
        db.initialize().expect("Failed to initialize schema");
        let repo = UserRepository::new(db.pool.clone());
        (db, repo)
    }

    #[test]
    fn test_create_and_lookup() {
        let (_db, repo) = setup_test_db();
        let user = repo
            .create("dev@portal.com", "dev", Some("hello"))
            .expect("Failed to create user");

        let by_id = repo.get_by_id(&user.id).unwrap().expect("user by id");
        assert_eq!(by_id.username, "dev");
        assert_eq!(by_id.followers_count, 0);
        assert_eq!(by_id.created_at, user.created_at);

        let by_name = repo.get_by_username("dev").unwrap().expect("user by name");
        assert_eq!(by_name.id, user.id);

        assert!(repo.get_by_username("nobody").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_username_rejected() {
        let (_db, repo) = setup_test_db();
        repo.create("a@portal.com", "dev", None).unwrap();

        assert!(repo.is_taken("dev", "other@portal.com").unwrap());
        assert!(repo.is_taken("other", "a@portal.com").unwrap());
        assert!(!repo.is_taken("other", "other@portal.com").unwrap());
        assert!(repo.create("b@portal.com", "dev", None).is_err());
    }
}
