use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use uuid::Uuid;

/// Read state of the built-in welcome conversation every member starts with.
///
/// The conversation is not stored as a thread row; it counts as one unread
/// message until the member opens it. Clones share the same set.
#[derive(Clone, Default)]
pub struct WelcomeInbox {
    read_by: Arc<RwLock<HashSet<Uuid>>>,
}

impl WelcomeInbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_unread(&self, user_id: &Uuid) -> bool {
        match self.read_by.read() {
            Ok(set) => !set.contains(user_id),
            Err(poisoned) => !poisoned.into_inner().contains(user_id),
        }
    }

    pub fn mark_read(&self, user_id: Uuid) {
        match self.read_by.write() {
            Ok(mut set) => {
                set.insert(user_id);
            }
            Err(poisoned) => {
                poisoned.into_inner().insert(user_id);
            }
        }
    }

    pub fn mark_unread(&self, user_id: &Uuid) {
        match self.read_by.write() {
            Ok(mut set) => {
                set.remove(user_id);
            }
            Err(poisoned) => {
                poisoned.into_inner().remove(user_id);
            }
        }
    }
}
