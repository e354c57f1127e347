use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{MessageThread, Notification};

/// Badge counts for the inbox
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreadCounts {
    pub unread_notification_count: i64,
    pub unread_message_count: i64,
    pub total_unread_count: i64,
}

impl UnreadCounts {
    /// Combine already-loaded notifications and threads into unread counts for `viewer`.
    ///
    /// Each thread contributes the counter on the viewer's side; a thread the
    /// viewer is not part of contributes nothing. `welcome_unread` adds the
    /// built-in welcome conversation when it has not been opened yet.
    pub fn aggregate(
        viewer: &Uuid,
        notifications: &[Notification],
        threads: &[MessageThread],
        welcome_unread: bool,
    ) -> Self {
        let unread_notification_count =
            notifications.iter().filter(|n| !n.is_read).count() as i64;

        let unread_message_count = threads
            .iter()
            .map(|t| t.unread_for(viewer).max(0))
            .sum::<i64>()
            + i64::from(welcome_unread);

        Self {
            unread_notification_count,
            unread_message_count,
            total_unread_count: unread_notification_count + unread_message_count,
        }
    }
}
