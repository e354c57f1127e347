use anyhow::{Context, Result};
use rusqlite::TransactionBehavior;
use uuid::Uuid;

use portal_types::ToggleOutcome;

use crate::db::{now, timestamp, DbPool};

/// One-way follow relationships and the user counters that mirror them
pub struct FollowRepository {
    pool: DbPool,
}

impl FollowRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Check if user A is following user B
    pub fn is_following(&self, follower_id: &Uuid, following_id: &Uuid) -> Result<bool> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM follows WHERE follower_id = ? AND following_id = ?",
            (follower_id.to_string(), following_id.to_string()),
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Follow a user; both users' counters move only when the edge is new
    pub fn follow(&self, follower_id: &Uuid, following_id: &Uuid) -> Result<ToggleOutcome> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let inserted = tx
            .execute(
                "INSERT INTO follows (follower_id, following_id, created_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(follower_id, following_id) DO NOTHING",
                (
                    follower_id.to_string(),
                    following_id.to_string(),
                    timestamp(&now()),
                ),
            )
            .context("Failed to follow user")?;

        if inserted == 1 {
            tx.execute(
                "UPDATE users SET following_count = following_count + 1 WHERE id = ?",
                [follower_id.to_string()],
            )?;
            tx.execute(
                "UPDATE users SET followers_count = followers_count + 1 WHERE id = ?",
                [following_id.to_string()],
            )?;
        }
        tx.commit()?;

        Ok(ToggleOutcome::from_rows_affected(inserted))
    }

    /// Unfollow a user
    pub fn unfollow(&self, follower_id: &Uuid, following_id: &Uuid) -> Result<ToggleOutcome> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let deleted = tx
            .execute(
                "DELETE FROM follows WHERE follower_id = ? AND following_id = ?",
                (follower_id.to_string(), following_id.to_string()),
            )
            .context("Failed to unfollow user")?;

        if deleted == 1 {
            tx.execute(
                "UPDATE users SET following_count = MAX(following_count - 1, 0) WHERE id = ?",
                [follower_id.to_string()],
            )?;
            tx.execute(
                "UPDATE users SET followers_count = MAX(followers_count - 1, 0) WHERE id = ?",
                [following_id.to_string()],
            )?;
        }
        tx.commit()?;

        Ok(ToggleOutcome::from_rows_affected(deleted))
    }
}
