use anyhow::{Context, Result};
use rusqlite::TransactionBehavior;
use uuid::Uuid;

use portal_types::{Comment, CommentWithAuthor, ToggleOutcome, UserSummary};

use crate::db::{now, row_datetime, row_uuid, timestamp, DbPool};

/// Junction tables whose rows are mirrored by a counter on `posts`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostRelation {
    Like,
    Save,
}

impl PostRelation {
    fn table(&self) -> &'static str {
        match self {
            PostRelation::Like => "likes",
            PostRelation::Save => "saves",
        }
    }

    fn counter(&self) -> &'static str {
        match self {
            PostRelation::Like => "likes_count",
            PostRelation::Save => "saves_count",
        }
    }
}

/// Likes, saves and comments on posts, with their denormalized counters.
///
/// The junction row's primary key decides whether a toggle happened: the
/// counter only moves in the same transaction as a row that was actually
/// inserted or deleted.
pub struct EngagementRepository {
    pool: DbPool,
}

impl EngagementRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn like(&self, user_id: &Uuid, post_id: &Uuid) -> Result<ToggleOutcome> {
        self.insert_relation(PostRelation::Like, user_id, post_id)
    }

    pub fn unlike(&self, user_id: &Uuid, post_id: &Uuid) -> Result<ToggleOutcome> {
        self.delete_relation(PostRelation::Like, user_id, post_id)
    }

    pub fn save(&self, user_id: &Uuid, post_id: &Uuid) -> Result<ToggleOutcome> {
        self.insert_relation(PostRelation::Save, user_id, post_id)
    }

    pub fn unsave(&self, user_id: &Uuid, post_id: &Uuid) -> Result<ToggleOutcome> {
        self.delete_relation(PostRelation::Save, user_id, post_id)
    }

    pub fn has_relation(&self, relation: PostRelation, user_id: &Uuid, post_id: &Uuid) -> Result<bool> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM {} WHERE user_id = ?1 AND post_id = ?2",
                relation.table()
            ),
            (user_id.to_string(), post_id.to_string()),
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn insert_relation(
        &self,
        relation: PostRelation,
        user_id: &Uuid,
        post_id: &Uuid,
    ) -> Result<ToggleOutcome> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let inserted = tx
            .execute(
                &format!(
                    "INSERT INTO {} (user_id, post_id, created_at) VALUES (?1, ?2, ?3)
                     ON CONFLICT(user_id, post_id) DO NOTHING",
                    relation.table()
                ),
                (user_id.to_string(), post_id.to_string(), timestamp(&now())),
            )
            .with_context(|| format!("Failed to insert into {}", relation.table()))?;

        if inserted == 1 {
            tx.execute(
                &format!(
                    "UPDATE posts SET {counter} = {counter} + 1 WHERE id = ?1",
                    counter = relation.counter()
                ),
                [post_id.to_string()],
            )
            .with_context(|| format!("Failed to increment {}", relation.counter()))?;
        }
        tx.commit()?;

        let outcome = ToggleOutcome::from_rows_affected(inserted);
        tracing::debug!(relation = relation.table(), %user_id, %post_id, ?outcome, "relation added");
        Ok(outcome)
    }

    fn delete_relation(
        &self,
        relation: PostRelation,
        user_id: &Uuid,
        post_id: &Uuid,
    ) -> Result<ToggleOutcome> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let deleted = tx
            .execute(
                &format!(
                    "DELETE FROM {} WHERE user_id = ?1 AND post_id = ?2",
                    relation.table()
                ),
                (user_id.to_string(), post_id.to_string()),
            )
            .with_context(|| format!("Failed to delete from {}", relation.table()))?;

        if deleted == 1 {
            tx.execute(
                &format!(
                    "UPDATE posts SET {counter} = MAX({counter} - 1, 0) WHERE id = ?1",
                    counter = relation.counter()
                ),
                [post_id.to_string()],
            )
            .with_context(|| format!("Failed to decrement {}", relation.counter()))?;
        }
        tx.commit()?;

        let outcome = ToggleOutcome::from_rows_affected(deleted);
        tracing::debug!(relation = relation.table(), %user_id, %post_id, ?outcome, "relation removed");
        Ok(outcome)
    }

    /// Add a comment and bump `comments_count` atomically
    pub fn add_comment(&self, post_id: &Uuid, author_id: &Uuid, body: &str) -> Result<Comment> {
        let comment = Comment {
            id: Uuid::new_v4(),
            post_id: *post_id,
            author_id: *author_id,
            body: body.to_string(),
            created_at: now(),
        };

        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO comments (id, post_id, author_id, body, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            (
                comment.id.to_string(),
                comment.post_id.to_string(),
                comment.author_id.to_string(),
                &comment.body,
                timestamp(&comment.created_at),
            ),
        )
        .context("Failed to create comment")?;
        tx.execute(
            "UPDATE posts SET comments_count = comments_count + 1 WHERE id = ?1",
            [post_id.to_string()],
        )
        .context("Failed to increment comments_count")?;
        tx.commit()?;

        Ok(comment)
    }

    /// Comments on a post with their authors, oldest first
    pub fn comments(&self, post_id: &Uuid) -> Result<Vec<CommentWithAuthor>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT c.id, c.post_id, c.author_id, c.body, c.created_at, u.username, u.avatar_url
             FROM comments c
             JOIN users u ON u.id = c.author_id
             WHERE c.post_id = ?
             ORDER BY c.created_at ASC, c.id ASC",
        )?;

        let comments = stmt
            .query_map([post_id.to_string()], |row| {
                let comment = Comment {
                    id: row_uuid(row, 0)?,
                    post_id: row_uuid(row, 1)?,
                    author_id: row_uuid(row, 2)?,
                    body: row.get(3)?,
                    created_at: row_datetime(row, 4)?,
                };
                let author = UserSummary {
                    id: comment.author_id,
                    username: row.get(5)?,
                    avatar_url: row.get(6)?,
                };
                Ok(CommentWithAuthor { comment, author })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(comments)
    }

    /// Recompute every denormalized counter from its junction rows.
    ///
    /// Returns the number of posts and users whose counters had drifted.
    pub fn reconcile_counters(&self) -> Result<usize> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let posts = tx
            .execute(
                "UPDATE posts SET
                    likes_count = (SELECT COUNT(*) FROM likes WHERE likes.post_id = posts.id),
                    saves_count = (SELECT COUNT(*) FROM saves WHERE saves.post_id = posts.id),
                    comments_count = (SELECT COUNT(*) FROM comments WHERE comments.post_id = posts.id)
                 WHERE likes_count != (SELECT COUNT(*) FROM likes WHERE likes.post_id = posts.id)
                    OR saves_count != (SELECT COUNT(*) FROM saves WHERE saves.post_id = posts.id)
                    OR comments_count != (SELECT COUNT(*) FROM comments WHERE comments.post_id = posts.id)",
                [],
            )
            .context("Failed to reconcile post counters")?;

        let users = tx
            .execute(
                "UPDATE users SET
                    followers_count = (SELECT COUNT(*) FROM follows WHERE follows.following_id = users.id),
                    following_count = (SELECT COUNT(*) FROM follows WHERE follows.follower_id = users.id)
                 WHERE followers_count != (SELECT COUNT(*) FROM follows WHERE follows.following_id = users.id)
                    OR following_count != (SELECT COUNT(*) FROM follows WHERE follows.follower_id = users.id)",
                [],
            )
            .context("Failed to reconcile user counters")?;

        tx.commit()?;

        if posts + users > 0 {
            tracing::info!("Reconciled counters on {} posts and {} users", posts, users);
        }
        Ok(posts + users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::post_repository::tests::sample_post;
    use crate::db::repositories::{PostRepository, UserRepository};
    use crate::db::Database;

    struct Fixture {
        db: Database,
        repo: EngagementRepository,
        posts: PostRepository,
        reader: Uuid,
        post_id: Uuid,
    }

    fn setup() -> Fixture {
        let db = Database::in_memory().expect("Failed to create test database");
        db.initialize().expect("Failed to initialize schema");
        let users = UserRepository::new(db.pool.clone());
        let author = users.create("author@portal.com", "author", None).unwrap();
        let reader = users.create("reader@portal.com", "reader", None).unwrap();

        let posts = PostRepository::new(db.pool.clone());
        let post = sample_post(author.id, now());
        posts.create(&post).unwrap();

        Fixture {
            repo: EngagementRepository::new(db.pool.clone()),
            posts,
            db,
            reader: reader.id,
            post_id: post.id,
        }
    }

    impl Fixture {
        fn post_counts(&self) -> (i64, i64, i64) {
            let post = self.posts.get_by_id(&self.post_id).unwrap().unwrap();
            (post.likes_count, post.saves_count, post.comments_count)
        }
    }

    #[test]
    fn test_like_is_idempotent() {
        let f = setup();
        assert_eq!(f.repo.like(&f.reader, &f.post_id).unwrap(), ToggleOutcome::Applied);
        assert_eq!(f.repo.like(&f.reader, &f.post_id).unwrap(), ToggleOutcome::Unchanged);

        assert_eq!(f.post_counts().0, 1);
        assert!(f.repo.has_relation(PostRelation::Like, &f.reader, &f.post_id).unwrap());
    }

    #[test]
    fn test_like_then_unlike_restores_count() {
        let f = setup();
        let before = f.post_counts().0;
        f.repo.like(&f.reader, &f.post_id).unwrap();
        assert_eq!(f.repo.unlike(&f.reader, &f.post_id).unwrap(), ToggleOutcome::Applied);
        assert_eq!(f.post_counts().0, before);
    }

    #[test]
    fn test_unlike_without_like_is_noop() {
        let f = setup();
        assert_eq!(f.repo.unlike(&f.reader, &f.post_id).unwrap(), ToggleOutcome::Unchanged);
        assert_eq!(f.post_counts().0, 0);
    }

    #[test]
    fn test_decrement_never_goes_negative() {
        let f = setup();
        f.repo.like(&f.reader, &f.post_id).unwrap();
        {
            // Simulate a counter that drifted below the true row count
            let conn = f.db.connection().unwrap();
            conn.execute(
                "UPDATE posts SET likes_count = 0 WHERE id = ?",
                [f.post_id.to_string()],
            )
            .unwrap();
        }

        f.repo.unlike(&f.reader, &f.post_id).unwrap();
        assert_eq!(f.post_counts().0, 0);
    }

    #[test]
    fn test_save_and_unsave() {
        let f = setup();
        f.repo.save(&f.reader, &f.post_id).unwrap();
        f.repo.save(&f.reader, &f.post_id).unwrap();
        assert_eq!(f.post_counts().1, 1);

        f.repo.unsave(&f.reader, &f.post_id).unwrap();
        f.repo.unsave(&f.reader, &f.post_id).unwrap();
        assert_eq!(f.post_counts().1, 0);
        assert!(!f.repo.has_relation(PostRelation::Save, &f.reader, &f.post_id).unwrap());
    }

    #[test]
    fn test_like_on_missing_post_fails() {
        let f = setup();
        assert!(f.repo.like(&f.reader, &Uuid::new_v4()).is_err());
    }

    #[test]
    fn test_comments_bump_counter() {
        let f = setup();
        f.repo.add_comment(&f.post_id, &f.reader, "first").unwrap();
        f.repo.add_comment(&f.post_id, &f.reader, "second").unwrap();

        let comments = f.repo.comments(&f.post_id).unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].author.username, "reader");
        assert_eq!(f.post_counts().2, 2);
    }

    #[test]
    fn test_reconcile_repairs_drift() {
        let f = setup();
        f.repo.like(&f.reader, &f.post_id).unwrap();
        {
            let conn = f.db.connection().unwrap();
            conn.execute(
                "UPDATE posts SET likes_count = 42, saves_count = 3 WHERE id = ?",
                [f.post_id.to_string()],
            )
            .unwrap();
        }

        assert_eq!(f.repo.reconcile_counters().unwrap(), 1);
        assert_eq!(f.post_counts(), (1, 0, 0));
        assert_eq!(f.repo.reconcile_counters().unwrap(), 0);
    }
}
