use anyhow::{Context, Result};
use rusqlite::{OptionalExtension, Row, TransactionBehavior};
use uuid::Uuid;

use portal_types::{Message, MessageThread, ThreadSummary, UserSummary};

use crate::db::{now, row_datetime, row_uuid, timestamp, DbPool};

const THREAD_COLUMNS: &str = "t.id, t.user_a_id, t.user_b_id, t.created_at, t.updated_at, \
     t.unread_for_user_a, t.unread_for_user_b";

fn map_thread(row: &Row<'_>) -> rusqlite::Result<MessageThread> {
    Ok(MessageThread {
        id: row_uuid(row, 0)?,
        user_a_id: row_uuid(row, 1)?,
        user_b_id: row_uuid(row, 2)?,
        created_at: row_datetime(row, 3)?,
        updated_at: row_datetime(row, 4)?,
        unread_for_user_a: row.get(5)?,
        unread_for_user_b: row.get(6)?,
    })
}

/// Message columns starting at `offset`
fn map_message_at(row: &Row<'_>, offset: usize) -> rusqlite::Result<Message> {
    Ok(Message {
        id: row_uuid(row, offset)?,
        thread_id: row_uuid(row, offset + 1)?,
        sender_id: row_uuid(row, offset + 2)?,
        body: row.get(offset + 3)?,
        created_at: row_datetime(row, offset + 4)?,
    })
}

fn map_summary(row: &Row<'_>) -> rusqlite::Result<ThreadSummary> {
    let thread = map_thread(row)?;
    let other_user = UserSummary {
        id: row_uuid(row, 7)?,
        username: row.get(8)?,
        avatar_url: row.get(9)?,
    };
    let last_message = match row.get::<_, Option<String>>(10)? {
        Some(_) => Some(map_message_at(row, 10)?),
        None => None,
    };
    Ok(ThreadSummary {
        thread,
        other_user,
        last_message,
    })
}

/// Two-party message threads. Each side keeps its own unread counter.
pub struct ThreadRepository {
    pool: DbPool,
}

impl ThreadRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn get_by_id(&self, thread_id: &Uuid) -> Result<Option<MessageThread>> {
        let conn = self.pool.get()?;
        let thread = conn
            .query_row(
                &format!("SELECT {THREAD_COLUMNS} FROM message_threads t WHERE t.id = ?"),
                [thread_id.to_string()],
                map_thread,
            )
            .optional()?;
        Ok(thread)
    }

    /// Threads where the user sits on either side
    pub fn list_for_user(&self, user_id: &Uuid) -> Result<Vec<MessageThread>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {THREAD_COLUMNS} FROM message_threads t
             WHERE t.user_a_id = ?1 OR t.user_b_id = ?1
             ORDER BY t.updated_at DESC, t.id DESC"
        ))?;

        let threads = stmt
            .query_map([user_id.to_string()], map_thread)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(threads)
    }

    /// Inbox listing: each thread with the other participant and its latest message
    pub fn summaries_for_user(&self, user_id: &Uuid) -> Result<Vec<ThreadSummary>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {THREAD_COLUMNS}, u.id, u.username, u.avatar_url,
                    m.id, m.thread_id, m.sender_id, m.body, m.created_at
             FROM message_threads t
             JOIN users u
               ON u.id = CASE WHEN t.user_a_id = ?1 THEN t.user_b_id ELSE t.user_a_id END
             LEFT JOIN messages m
               ON m.id = (SELECT id FROM messages
                          WHERE thread_id = t.id
                          ORDER BY created_at DESC, id DESC
                          LIMIT 1)
             WHERE t.user_a_id = ?1 OR t.user_b_id = ?1
             ORDER BY t.updated_at DESC, t.id DESC"
        ))?;

        let summaries = stmt
            .query_map([user_id.to_string()], map_summary)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to load inbox threads")?;
        Ok(summaries)
    }

    /// Find the thread between two users in either direction, creating it if needed.
    ///
    /// Returns the thread and whether it was created by this call.
    pub fn get_or_create(&self, user_id: &Uuid, other_user_id: &Uuid) -> Result<(MessageThread, bool)> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing = tx
            .query_row(
                &format!(
                    "SELECT {THREAD_COLUMNS} FROM message_threads t
                     WHERE (t.user_a_id = ?1 AND t.user_b_id = ?2)
                        OR (t.user_a_id = ?2 AND t.user_b_id = ?1)
                     ORDER BY t.created_at ASC
                     LIMIT 1"
                ),
                (user_id.to_string(), other_user_id.to_string()),
                map_thread,
            )
            .optional()?;

        if let Some(thread) = existing {
            tx.commit()?;
            return Ok((thread, false));
        }

        let created_at = now();
        let thread = MessageThread {
            id: Uuid::new_v4(),
            user_a_id: *user_id,
            user_b_id: *other_user_id,
            created_at,
            updated_at: created_at,
            unread_for_user_a: 0,
            unread_for_user_b: 0,
        };
        tx.execute(
            "INSERT INTO message_threads (id, user_a_id, user_b_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            (
                thread.id.to_string(),
                thread.user_a_id.to_string(),
                thread.user_b_id.to_string(),
                timestamp(&created_at),
            ),
        )
        .context("Failed to create thread")?;
        tx.commit()?;

        tracing::debug!(thread_id = %thread.id, "thread created");
        Ok((thread, true))
    }

    /// Messages in a thread, oldest first. Reading clears the viewer's unread counter.
    pub fn read_messages(&self, thread: &MessageThread, viewer_id: &Uuid) -> Result<Vec<Message>> {
        let column = if thread.user_a_id == *viewer_id {
            "unread_for_user_a"
        } else if thread.user_b_id == *viewer_id {
            "unread_for_user_b"
        } else {
            anyhow::bail!("user {} is not a participant of thread {}", viewer_id, thread.id);
        };

        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;
        tx.execute(
            &format!("UPDATE message_threads SET {column} = 0 WHERE id = ?"),
            [thread.id.to_string()],
        )
        .context("Failed to clear unread counter")?;

        let messages = {
            let mut stmt = tx.prepare(
                "SELECT id, thread_id, sender_id, body, created_at
                 FROM messages
                 WHERE thread_id = ?
                 ORDER BY created_at ASC, id ASC",
            )?;
            let rows = stmt
                .query_map([thread.id.to_string()], |row| map_message_at(row, 0))?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };
        tx.commit()?;

        Ok(messages)
    }

    /// Append a message, bump the thread and the recipient's unread counter
    pub fn send(&self, thread: &MessageThread, sender_id: &Uuid, body: &str) -> Result<Message> {
        let recipient_column = if thread.user_a_id == *sender_id {
            "unread_for_user_b"
        } else if thread.user_b_id == *sender_id {
            "unread_for_user_a"
        } else {
            anyhow::bail!("user {} is not a participant of thread {}", sender_id, thread.id);
        };

        let message = Message {
            id: Uuid::new_v4(),
            thread_id: thread.id,
            sender_id: *sender_id,
            body: body.trim().to_string(),
            created_at: now(),
        };

        let mut conn = self.pool.get()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO messages (id, thread_id, sender_id, body, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            (
                message.id.to_string(),
                message.thread_id.to_string(),
                message.sender_id.to_string(),
                &message.body,
                timestamp(&message.created_at),
            ),
        )
        .context("Failed to create message")?;
        tx.execute(
            &format!(
                "UPDATE message_threads SET updated_at = ?1, {recipient_column} = {recipient_column} + 1
                 WHERE id = ?2"
            ),
            (timestamp(&message.created_at), thread.id.to_string()),
        )
        .context("Failed to update thread")?;
        tx.commit()?;

        Ok(message)
    }
}
