use anyhow::{Context, Result};
use rusqlite::{params_from_iter, OptionalExtension, Row};
use uuid::Uuid;

use portal_types::{FeedPost, Post, UserSummary};

use crate::db::{row_datetime, row_json, row_uuid, timestamp, DbPool};
use crate::feed::FeedQuery;

/// Column list understood by `map_post`; callers alias `posts` as `p`
pub(crate) const POST_COLUMNS: &str = "p.id, p.author_id, p.title, p.description, p.body, p.tags, \
     p.category, p.sponsored, p.is_draft, p.created_at, p.updated_at, \
     p.likes_count, p.comments_count, p.saves_count, p.shares_count";

const POST_COLUMN_COUNT: usize = 15;

pub(crate) fn map_post(row: &Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row_uuid(row, 0)?,
        author_id: row_uuid(row, 1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        body: row.get(4)?,
        tags: row_json(row, 5)?,
        category: row.get(6)?,
        sponsored: row.get(7)?,
        is_draft: row.get(8)?,
        created_at: row_datetime(row, 9)?,
        updated_at: row_datetime(row, 10)?,
        likes_count: row.get(11)?,
        comments_count: row.get(12)?,
        saves_count: row.get(13)?,
        shares_count: row.get(14)?,
    })
}

fn map_feed_post(row: &Row<'_>) -> rusqlite::Result<FeedPost> {
    let post = map_post(row)?;
    let author = UserSummary {
        id: post.author_id,
        username: row.get(POST_COLUMN_COUNT)?,
        avatar_url: row.get(POST_COLUMN_COUNT + 1)?,
    };
    Ok(FeedPost { post, author })
}

pub struct PostRepository {
    pool: DbPool,
}

impl PostRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a new post
    pub fn create(&self, post: &Post) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO posts (id, author_id, title, description, body, tags, category, sponsored,
                                is_draft, created_at, updated_at, likes_count, comments_count,
                                saves_count, shares_count)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
            rusqlite::params![
                post.id.to_string(),
                post.author_id.to_string(),
                &post.title,
                &post.description,
                &post.body,
                serde_json::to_string(&post.tags)?,
                &post.category,
                post.sponsored,
                post.is_draft,
                timestamp(&post.created_at),
                timestamp(&post.updated_at),
                post.likes_count,
                post.comments_count,
                post.saves_count,
                post.shares_count,
            ],
        )
        .context("Failed to create post")?;
        Ok(())
    }

    /// Get a single post by ID (drafts included)
    pub fn get_by_id(&self, post_id: &Uuid) -> Result<Option<Post>> {
        let conn = self.pool.get()?;
        let post = conn
            .query_row(
                &format!("SELECT {POST_COLUMNS} FROM posts p WHERE p.id = ?"),
                [post_id.to_string()],
                map_post,
            )
            .optional()?;
        Ok(post)
    }

    /// One page of the published feed, ordered and filtered by `query`
    pub fn feed(&self, query: &FeedQuery) -> Result<Vec<FeedPost>> {
        let conn = self.pool.get()?;

        let mut values = Vec::new();
        let mut sql = format!(
            "SELECT {POST_COLUMNS}, u.username, u.avatar_url
             FROM posts p
             JOIN users u ON u.id = p.author_id
             WHERE p.is_draft = 0"
        );
        if let Some((predicate, cursor_values)) = query.cursor_predicate() {
            sql.push_str(" AND ");
            sql.push_str(predicate);
            values.extend(cursor_values);
        }
        sql.push(' ');
        sql.push_str(query.order_by());
        sql.push_str(" LIMIT ?");
        values.push(rusqlite::types::Value::Integer(i64::from(query.limit)));

        let mut stmt = conn.prepare(&sql)?;
        let posts = stmt
            .query_map(params_from_iter(values.iter()), map_feed_post)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to load feed")?;

        tracing::debug!(
            sort = query.sort.as_str(),
            limit = query.limit,
            returned = posts.len(),
            "feed page loaded"
        );
        Ok(posts)
    }

    /// Published posts by one author, newest first
    pub fn published_by_author(&self, author_id: &Uuid, limit: u32) -> Result<Vec<Post>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {POST_COLUMNS} FROM posts p
             WHERE p.author_id = ? AND p.is_draft = 0
             ORDER BY p.created_at DESC, p.id DESC
             LIMIT ?"
        ))?;

        let posts = stmt
            .query_map((author_id.to_string(), limit), map_post)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(posts)
    }

    /// Number of published posts by one author
    pub fn published_count(&self, author_id: &Uuid) -> Result<i64> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM posts WHERE author_id = ? AND is_draft = 0",
            [author_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Delete a post; likes, saves and comments cascade with it
    pub fn delete(&self, post_id: &Uuid) -> Result<usize> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute("DELETE FROM posts WHERE id = ?", [post_id.to_string()])
            .context("Failed to delete post")?;
        Ok(rows)
    }
}
