use anyhow::{Context, Result};
use rusqlite::Row;
use uuid::Uuid;

use portal_types::{Notification, NotificationType};

use crate::db::{now, row_datetime, row_json, row_uuid, timestamp, DbPool};

fn map_notification(row: &Row<'_>) -> rusqlite::Result<Notification> {
    let raw_kind: String = row.get(2)?;
    let kind = NotificationType::parse(&raw_kind).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            format!("unknown notification type '{raw_kind}'").into(),
        )
    })?;

    Ok(Notification {
        id: row_uuid(row, 0)?,
        user_id: row_uuid(row, 1)?,
        kind,
        data: row_json(row, 3)?,
        is_read: row.get(4)?,
        created_at: row_datetime(row, 5)?,
    })
}

pub struct NotificationRepository {
    pool: DbPool,
}

impl NotificationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn create(
        &self,
        user_id: &Uuid,
        kind: NotificationType,
        data: serde_json::Value,
    ) -> Result<Notification> {
        let notification = Notification {
            id: Uuid::new_v4(),
            user_id: *user_id,
            kind,
            data,
            is_read: false,
            created_at: now(),
        };

        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO notifications (id, user_id, type, data, is_read, created_at)
             VALUES (?1, ?2, ?3, ?4, 0, ?5)",
            (
                notification.id.to_string(),
                notification.user_id.to_string(),
                notification.kind.as_str(),
                notification.data.to_string(),
                timestamp(&notification.created_at),
            ),
        )
        .context("Failed to create notification")?;

        tracing::debug!(user_id = %user_id, kind = kind.as_str(), "notification created");
        Ok(notification)
    }

    /// All notifications for a user, newest first
    pub fn list_for_user(&self, user_id: &Uuid) -> Result<Vec<Notification>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, type, data, is_read, created_at
             FROM notifications
             WHERE user_id = ?
             ORDER BY created_at DESC, id DESC",
        )?;

        let notifications = stmt
            .query_map([user_id.to_string()], map_notification)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(notifications)
    }

    /// Mark one of the user's notifications read. Other users' rows are untouched.
    pub fn mark_read(&self, user_id: &Uuid, notification_id: &Uuid) -> Result<usize> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute(
                "UPDATE notifications SET is_read = 1 WHERE id = ? AND user_id = ? AND is_read = 0",
                (notification_id.to_string(), user_id.to_string()),
            )
            .context("Failed to mark notification read")?;
        Ok(rows)
    }

    pub fn mark_all_read(&self, user_id: &Uuid) -> Result<usize> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute(
                "UPDATE notifications SET is_read = 1 WHERE user_id = ? AND is_read = 0",
                [user_id.to_string()],
            )
            .context("Failed to mark notifications read")?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::UserRepository;
    use crate::db::Database;
    use serde_json::json;

    fn setup() -> (Database, NotificationRepository, Uuid, Uuid) {
        let db = Database::in_memory().expect("Failed to create test database");
        db.initialize().expect("Failed to initialize schema");
        let users = UserRepository::new(db.pool.clone());
        let alice = users.create("alice@portal.com", "alice", None).unwrap();
        let bob = users.create("bob@portal.com", "bob", None).unwrap();
        let repo = NotificationRepository::new(db.pool.clone());
        (db, repo, alice.id, bob.id)
    }

    #[test]
    fn test_create_and_list() {
        let (_db, repo, alice, _bob) = setup();
        repo.create(&alice, NotificationType::Like, json!({"username": "bob"}))
            .unwrap();
        let latest = repo
            .create(&alice, NotificationType::Follow, json!({"username": "carol"}))
            .unwrap();

        let list = repo.list_for_user(&alice).unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].id, latest.id);
        assert_eq!(list[0].kind, NotificationType::Follow);
        assert_eq!(list[1].data["username"], "bob");
        assert!(list.iter().all(|n| !n.is_read));
    }

    #[test]
    fn test_mark_read_is_scoped_to_owner() {
        let (_db, repo, alice, bob) = setup();
        let n = repo
            .create(&alice, NotificationType::System, json!({}))
            .unwrap();

        assert_eq!(repo.mark_read(&bob, &n.id).unwrap(), 0);
        assert!(!repo.list_for_user(&alice).unwrap()[0].is_read);

        assert_eq!(repo.mark_read(&alice, &n.id).unwrap(), 1);
        assert!(repo.list_for_user(&alice).unwrap()[0].is_read);
    }

    #[test]
    fn test_mark_all_read() {
        let (_db, repo, alice, bob) = setup();
        repo.create(&alice, NotificationType::Like, json!({})).unwrap();
        repo.create(&alice, NotificationType::Comment, json!({})).unwrap();
        repo.create(&bob, NotificationType::Like, json!({})).unwrap();

        assert_eq!(repo.mark_all_read(&alice).unwrap(), 2);
        assert!(!repo.list_for_user(&bob).unwrap()[0].is_read);
    }
}
