use anyhow::{Context, Result};

use crate::db::DbPool;

/// One-shot flags in `portal_system`
pub struct SystemRepository {
    pool: DbPool,
}

impl SystemRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Set `key` only if it is absent. Returns true for the single caller that set it.
    pub fn claim(&self, key: &str, value: &serde_json::Value) -> Result<bool> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute(
                "INSERT INTO portal_system (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO NOTHING",
                (key, value.to_string()),
            )
            .context("Failed to claim portal_system key")?;
        Ok(rows == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use serde_json::json;

    fn setup() -> (Database, SystemRepository) {
        let db = Database::in_memory().expect("Failed to create test database");
        db.initialize().expect("Failed to initialize schema");
        let repo = SystemRepository::new(db.pool.clone());
        (db, repo)
    }

    #[test]
    fn test_claim_only_once() {
        let (_db, repo) = setup();
        assert!(repo.claim("first-like-sent:x", &json!(true)).unwrap());
        assert!(!repo.claim("first-like-sent:x", &json!(true)).unwrap());
        assert!(repo.claim("first-like-sent:y", &json!(true)).unwrap());
    }
}
